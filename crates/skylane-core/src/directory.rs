// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

// OpenFlights airports.dat columns:
// 0 id, 1 name, 2 city, 3 country, 4 IATA, 5 ICAO, 6 lat, 7 lon, 8 alt, ...
const COL_NAME: usize = 1;
const COL_CITY: usize = 2;
const COL_COUNTRY: usize = 3;
const COL_IATA: usize = 4;
const COL_ICAO: usize = 5;
const COL_LAT: usize = 6;
const COL_LON: usize = 7;

/// A row must reach the IATA column to be usable at all.
const MIN_FIELDS: usize = COL_IATA + 1;
/// Dataset rows are a few hundred bytes; the reader refills for longer ones.
const LINE_BUFFER_CAPACITY: usize = 512;

/// Queries shorter than this never produce fuzzy results.
pub const MIN_QUERY_LEN: usize = 2;

pub const DEFAULT_SEARCH_LIMIT: usize = 10;

const SCORE_CODE_EXACT: u32 = 300;
const SCORE_CODE_PREFIX: u32 = 250;
const SCORE_CITY_PREFIX: u32 = 160;
const SCORE_NAME_PREFIX: u32 = 140;
const SCORE_CITY_CONTAINS: u32 = 60;
const SCORE_NAME_CONTAINS: u32 = 45;
const SCORE_COUNTRY_CONTAINS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    pub code: String,
    pub city: String,
    pub country: String,
    pub name: String,
    #[serde(default)]
    pub icao: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl AirportRecord {
    /// `(lat, lon)` when both coordinates are known.
    pub fn coords(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Returns true for exactly three ASCII uppercase letters.
pub fn is_iata_code(s: &str) -> bool {
    s.len() == 3 && s.bytes().all(|b| b.is_ascii_uppercase())
}

/// Lowercase, trim and collapse runs of whitespace.
pub fn normalize_query(s: &str) -> String {
    s.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A directory hit together with the score that ranked it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredAirport<'a> {
    pub record: &'a AirportRecord,
    pub score: u32,
}

struct SearchKeys {
    code: String,
    city: String,
    name: String,
    country: String,
}

impl SearchKeys {
    fn new(record: &AirportRecord) -> Self {
        Self {
            code: record.code.to_lowercase(),
            city: normalize_query(&record.city),
            name: normalize_query(&record.name),
            country: normalize_query(&record.country),
        }
    }

    /// Each field contributes its best tier; field contributions add up.
    fn score(&self, q: &str) -> u32 {
        let code = if self.code == q {
            SCORE_CODE_EXACT
        } else if self.code.starts_with(q) {
            SCORE_CODE_PREFIX
        } else {
            0
        };

        let city = if self.city.starts_with(q) {
            SCORE_CITY_PREFIX
        } else if self.city.contains(q) {
            SCORE_CITY_CONTAINS
        } else {
            0
        };

        let name = if self.name.starts_with(q) {
            SCORE_NAME_PREFIX
        } else if self.name.contains(q) {
            SCORE_NAME_CONTAINS
        } else {
            0
        };

        let country = if self.country.contains(q) {
            SCORE_COUNTRY_CONTAINS
        } else {
            0
        };

        code + city + name + country
    }
}

/// Immutable airport table keyed by IATA code.
///
/// Built once from dataset text and never mutated afterwards; a refresh
/// builds a new directory and swaps it in through [`SharedDirectory`].
#[derive(Default)]
pub struct AirportDirectory {
    records: Vec<AirportRecord>,
    keys: Vec<SearchKeys>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for AirportDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirportDirectory")
            .field("len", &self.records.len())
            .finish()
    }
}

impl AirportDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses OpenFlights-style dataset text. Bad lines are skipped, never fatal.
    pub fn build(raw_text: &str) -> Self {
        let mut directory = Self::new();
        let mut skipped = 0usize;
        let mut duplicates = 0usize;

        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .buffer_capacity(LINE_BUFFER_CAPACITY);
        let mut row = csv::StringRecord::new();

        for line in raw_text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(&builder, &mut row, line) {
                Some(record) => {
                    if !directory.insert(record) {
                        duplicates += 1;
                    }
                }
                None => skipped += 1,
            }
        }

        debug!(
            "Built airport directory — airports={} skipped_lines={} duplicate_codes={}",
            directory.len(),
            skipped,
            duplicates
        );
        directory
    }

    /// Builds from already-shaped records, applying the same code gate and
    /// first-wins dedup as [`AirportDirectory::build`].
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = AirportRecord>,
    {
        let mut directory = Self::new();
        for mut record in records {
            record.code = record.code.trim().to_uppercase();
            if is_iata_code(&record.code) {
                directory.insert(record);
            }
        }
        directory
    }

    fn insert(&mut self, record: AirportRecord) -> bool {
        if self.index.contains_key(&record.code) {
            return false;
        }
        self.index.insert(record.code.clone(), self.records.len());
        self.keys.push(SearchKeys::new(&record));
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in dataset order.
    pub fn iter(&self) -> impl Iterator<Item = &AirportRecord> {
        self.records.iter()
    }

    /// O(1) lookup by IATA code. The code must already be canonical.
    pub fn lookup_exact(&self, code: &str) -> Option<&AirportRecord> {
        self.index.get(code).map(|&i| &self.records[i])
    }

    pub fn search_fuzzy(&self, query: &str, limit: usize) -> Vec<&AirportRecord> {
        self.search_scored(query, limit)
            .into_iter()
            .map(|hit| hit.record)
            .collect()
    }

    /// Ranked fuzzy search: score descending, ties by code.
    pub fn search_scored(&self, query: &str, limit: usize) -> Vec<ScoredAirport<'_>> {
        let q = normalize_query(query);
        if q.chars().count() < MIN_QUERY_LEN || limit == 0 {
            return Vec::new();
        }

        let mut hits: Vec<ScoredAirport<'_>> = self
            .keys
            .iter()
            .zip(&self.records)
            .filter_map(|(keys, record)| {
                let score = keys.score(&q);
                (score > 0).then_some(ScoredAirport { record, score })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.record.code.cmp(&b.record.code))
        });
        hits.truncate(limit);
        hits
    }
}

/// Handle to the current directory. Readers take an `Arc` snapshot; a rebuild
/// replaces the whole directory at once.
#[derive(Debug, Clone, Default)]
pub struct SharedDirectory {
    current: Arc<RwLock<Arc<AirportDirectory>>>,
}

impl SharedDirectory {
    pub fn new(directory: AirportDirectory) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(directory))),
        }
    }

    pub fn current(&self) -> Arc<AirportDirectory> {
        let guard = self
            .current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swaps in a freshly built directory; returns the one it replaced.
    pub fn replace(&self, directory: AirportDirectory) -> Arc<AirportDirectory> {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        std::mem::replace(&mut *guard, Arc::new(directory))
    }
}

/// Reads one line on its own so an unbalanced quote cannot swallow the rows
/// after it. `row` is reused across lines.
fn parse_line(
    builder: &csv::ReaderBuilder,
    row: &mut csv::StringRecord,
    line: &str,
) -> Option<AirportRecord> {
    let mut reader = builder.from_reader(line.as_bytes());
    match reader.read_record(row) {
        Ok(true) => {}
        _ => return None,
    }
    if row.len() < MIN_FIELDS {
        return None;
    }

    let code = text_field(row, COL_IATA).to_uppercase();
    if !is_iata_code(&code) {
        return None;
    }

    let icao = Some(text_field(row, COL_ICAO).to_uppercase()).filter(|s| !s.is_empty());

    Some(AirportRecord {
        code,
        city: text_field(row, COL_CITY).to_string(),
        country: text_field(row, COL_COUNTRY).to_string(),
        name: text_field(row, COL_NAME).to_string(),
        icao,
        lat: coord_field(row, COL_LAT, 90.0),
        lon: coord_field(row, COL_LON, 180.0),
    })
}

/// Field text with the dataset's `\N` null marker mapped to "".
fn text_field(row: &csv::StringRecord, idx: usize) -> &str {
    match row.get(idx) {
        Some("\\N") | None => "",
        Some(s) => s,
    }
}

fn coord_field(row: &csv::StringRecord, idx: usize, limit: f64) -> Option<f64> {
    text_field(row, idx)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && v.abs() <= limit)
}
