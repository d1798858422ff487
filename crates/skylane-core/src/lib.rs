// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod config;
pub mod dataset;
pub mod directory;
pub mod feed;
pub mod format;
pub mod geo;
pub mod matcher;
pub mod resolve;
pub mod session;
pub mod snapshot;

pub use directory::{AirportDirectory, AirportRecord, SharedDirectory};
pub use feed::{AircraftFeed, FeedError, LiveAircraft};
pub use matcher::{MatchError, MatchKind, RouteMatch, RouteMatcher};
pub use resolve::{Confidence, Resolution, ResolutionService, ResolvedAirport};
pub use session::{FlightView, SearchOutcome, SearchRequest, SessionError, SessionPhase, TrackingSession};
pub use snapshot::{LiveSnapshotCache, Snapshot};

use std::path::PathBuf;

/// Per-user config directory, falling back to the working directory.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "skylane", "Skylane")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
