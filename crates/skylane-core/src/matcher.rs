// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::directory::{is_iata_code, SharedDirectory};
use crate::feed::{FeedError, LiveAircraft};
use crate::geo::corridor_distance_km;
use crate::snapshot::LiveSnapshotCache;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_CORRIDOR_RADIUS_KM: f64 = 500.0;
pub const DEFAULT_MAX_CORRIDOR_RESULTS: usize = 40;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error("'{0}' is not a resolved airport code")]
    AmbiguousEndpoint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchKind {
    /// Aircraft tagged with exactly this origin and destination.
    Strict,
    /// Untagged-route fallback: aircraft near the corridor, nearest first.
    Corridor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub kind: MatchKind,
    /// When the underlying snapshot was taken.
    pub fetched_at: DateTime<Utc>,
    pub flights: Vec<LiveAircraft>,
}

/// Corridor fallback limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorridorLimits {
    pub radius_km: f64,
    pub max_results: usize,
}

impl Default for CorridorLimits {
    fn default() -> Self {
        Self {
            radius_km: DEFAULT_CORRIDOR_RADIUS_KM,
            max_results: DEFAULT_MAX_CORRIDOR_RESULTS,
        }
    }
}

#[derive(Clone)]
pub struct RouteMatcher {
    cache: LiveSnapshotCache,
    directory: SharedDirectory,
    limits: CorridorLimits,
}

impl RouteMatcher {
    pub fn new(cache: LiveSnapshotCache, directory: SharedDirectory) -> Self {
        Self::with_limits(cache, directory, CorridorLimits::default())
    }

    pub fn with_limits(
        cache: LiveSnapshotCache,
        directory: SharedDirectory,
        limits: CorridorLimits,
    ) -> Self {
        Self {
            cache,
            directory,
            limits,
        }
    }

    /// Flights relevant to `origin → dest`, most relevant first.
    ///
    /// Exact origin/destination tags win outright, in snapshot order. Only when
    /// none match does the corridor fallback run.
    pub async fn match_route(&self, origin: &str, dest: &str) -> Result<RouteMatch, MatchError> {
        for code in [origin, dest] {
            if !is_iata_code(code) {
                return Err(MatchError::AmbiguousEndpoint(code.to_string()));
            }
        }

        let snapshot = self.cache.get_snapshot().await?;

        let strict: Vec<LiveAircraft> = snapshot
            .aircraft
            .iter()
            .filter(|a| a.flies(origin, dest))
            .cloned()
            .collect();

        if !strict.is_empty() {
            debug!(
                "Strict route match — route={}-{} flights={}",
                origin,
                dest,
                strict.len()
            );
            return Ok(RouteMatch {
                kind: MatchKind::Strict,
                fetched_at: snapshot.fetched_at,
                flights: strict,
            });
        }

        let flights = self.corridor(origin, dest, &snapshot.aircraft);
        debug!(
            "Corridor route match — route={}-{} flights={} radius_km={}",
            origin,
            dest,
            flights.len(),
            self.limits.radius_km
        );
        Ok(RouteMatch {
            kind: MatchKind::Corridor,
            fetched_at: snapshot.fetched_at,
            flights,
        })
    }

    fn corridor(&self, origin: &str, dest: &str, aircraft: &[LiveAircraft]) -> Vec<LiveAircraft> {
        let directory = self.directory.current();
        let endpoints = directory
            .lookup_exact(origin)
            .and_then(|a| a.coords())
            .zip(directory.lookup_exact(dest).and_then(|b| b.coords()));

        let Some((a, b)) = endpoints else {
            debug!(
                "Corridor fallback skipped; endpoint coordinates unknown — route={}-{}",
                origin, dest
            );
            return Vec::new();
        };

        let mut ranked: Vec<(f64, &LiveAircraft)> = aircraft
            .iter()
            .filter_map(|ac| {
                let d = corridor_distance_km(ac.position()?, a, b);
                (d <= self.limits.radius_km).then_some((d, ac))
            })
            .collect();

        ranked.sort_by(|x, y| x.0.total_cmp(&y.0));
        ranked.truncate(self.limits.max_results);
        ranked.into_iter().map(|(_, ac)| ac.clone()).collect()
    }
}
