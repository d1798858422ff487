// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::directory::{is_iata_code, AirportDirectory, AirportRecord, SharedDirectory};
use log::debug;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// How many fuzzy hits the resolver asks the directory for.
const RESOLVE_CANDIDATES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    /// The input was already a code (or a labelled code).
    Exact,
    /// A single fuzzy hit, or a top hit that strictly outscores the runner-up.
    HighConfidence,
    /// Top hits tied; the caller must ask the user to pick.
    Ambiguous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAirport {
    pub code: String,
    pub confidence: Confidence,
    /// Directory records consulted, best first. Empty for `Exact`.
    pub candidates: Vec<AirportRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedAirport),
    Unresolved,
}

impl Resolution {
    /// The code, but only when it is safe to act on without asking.
    pub fn confident_code(&self) -> Option<&str> {
        match self {
            Resolution::Resolved(r) if r.confidence != Confidence::Ambiguous => Some(&r.code),
            _ => None,
        }
    }

    pub fn confidence(&self) -> Option<Confidence> {
        match self {
            Resolution::Resolved(r) => Some(r.confidence),
            Resolution::Unresolved => None,
        }
    }
}

/// Turns free-text airport input into a canonical code.
#[derive(Debug, Clone)]
pub struct ResolutionService {
    directory: SharedDirectory,
}

impl ResolutionService {
    pub fn new(directory: SharedDirectory) -> Self {
        Self { directory }
    }

    pub fn resolve(&self, input: &str) -> Resolution {
        resolve_in(&self.directory.current(), input)
    }
}

/// Resolves `input` against `directory`. Pure; never fails.
///
/// Anything shaped like a code is trusted verbatim without checking that the
/// directory knows it, so airports missing from the dataset still work.
pub fn resolve_in(directory: &AirportDirectory, input: &str) -> Resolution {
    if let Some(code) = direct_code(input) {
        return Resolution::Resolved(ResolvedAirport {
            code,
            confidence: Confidence::Exact,
            candidates: Vec::new(),
        });
    }

    let hits = directory.search_scored(input, RESOLVE_CANDIDATES);
    let confidence = match hits.as_slice() {
        [] => {
            debug!("Unresolved airport input — input={:?}", input);
            return Resolution::Unresolved;
        }
        [_] => Confidence::HighConfidence,
        [top, runner_up, ..] if top.score > runner_up.score => Confidence::HighConfidence,
        _ => Confidence::Ambiguous,
    };

    debug!(
        "Resolved airport input — input={:?} code={} confidence={:?} hits={}",
        input,
        hits[0].record.code,
        confidence,
        hits.len()
    );

    Resolution::Resolved(ResolvedAirport {
        code: hits[0].record.code.clone(),
        confidence,
        candidates: hits.iter().map(|h| h.record.clone()).collect(),
    })
}

/// Extracts a code from `"BOS"`, `"BOS - Boston Logan ..."` or `"Boston (BOS)"`.
fn direct_code(input: &str) -> Option<String> {
    let upper = input.trim().to_uppercase();
    if is_iata_code(&upper) {
        return Some(upper);
    }

    static LABELLED: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = LABELLED.get_or_init(|| {
        [r"^([A-Z]{3})\s+-\s+\S", r"\(([A-Z]{3})\)\s*$"]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect()
    });

    patterns
        .iter()
        .find_map(|re| re.captures(&upper))
        .map(|caps| caps[1].to_string())
}
