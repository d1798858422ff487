// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Great-circle helpers. Positions are `(lat, lon)` in degrees.

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometres.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lon1) = from;
    let (lat2, lon2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair past 1.0 for antipodal points.
    2.0 * EARTH_RADIUS_KM * a.clamp(0.0, 1.0).sqrt().asin()
}

/// Great-circle midpoint of two positions, longitude normalised to [-180, 180).
pub fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let lat1 = a.0.to_radians();
    let lon1 = a.1.to_radians();
    let lat2 = b.0.to_radians();
    let delta_lon = (b.1 - a.1).to_radians();

    let bx = lat2.cos() * delta_lon.cos();
    let by = lat2.cos() * delta_lon.sin();

    let lat = (lat1.sin() + lat2.sin()).atan2(((lat1.cos() + bx).powi(2) + by.powi(2)).sqrt());
    let lon = lon1 + by.atan2(lat1.cos() + bx);

    (lat.to_degrees(), normalize_lon(lon.to_degrees()))
}

fn normalize_lon(lon: f64) -> f64 {
    (lon + 540.0).rem_euclid(360.0) - 180.0
}

/// Coarse distance from a point to the A→B corridor: the nearest of the two
/// endpoints and their midpoint. Not a cross-track distance.
pub fn corridor_distance_km(point: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let mid = midpoint(a, b);
    haversine_km(point, a)
        .min(haversine_km(point, b))
        .min(haversine_km(point, mid))
}
