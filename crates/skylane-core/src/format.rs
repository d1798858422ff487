// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Display strings for flight cards and console tables.

use crate::feed::LiveAircraft;

const MISSING: &str = "—";
const KM_PER_NM: f64 = 1.852;

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|v| v.is_finite())
}

/// `"35k ft"` at or above 1000 ft, plain feet below.
pub fn altitude(feet: Option<f64>) -> String {
    match finite(feet).map(f64::round) {
        Some(ft) if ft >= 1000.0 => format!("{}k ft", (ft / 1000.0).round()),
        Some(ft) => format!("{} ft", ft),
        None => MISSING.to_string(),
    }
}

/// Knots rendered as km/h.
pub fn speed(knots: Option<f64>) -> String {
    finite(knots)
        .map(|kt| format!("{} km/h", (kt * KM_PER_NM).round()))
        .unwrap_or_else(|| MISSING.to_string())
}

pub fn heading(degrees: Option<f64>) -> String {
    finite(degrees)
        .map(|deg| format!("{}°", deg.round()))
        .unwrap_or_else(|| MISSING.to_string())
}

/// Flight number, falling back to the feed id.
pub fn label(aircraft: &LiveAircraft) -> &str {
    if aircraft.flight_number.trim().is_empty() {
        &aircraft.id
    } else {
        &aircraft.flight_number
    }
}

/// `"BOS → JFK"` using the aircraft's own tags where present.
pub fn route(aircraft: &LiveAircraft, origin: &str, dest: &str) -> String {
    format!(
        "{} → {}",
        aircraft.origin_code.as_deref().unwrap_or(origin),
        aircraft.dest_code.as_deref().unwrap_or(dest)
    )
}
