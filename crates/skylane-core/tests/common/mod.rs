// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

#![allow(dead_code)]

use skylane_core::{AirportDirectory, AirportRecord, LiveAircraft};

pub fn airport(code: &str, city: &str, name: &str, lat: f64, lon: f64) -> AirportRecord {
    AirportRecord {
        code: code.to_string(),
        city: city.to_string(),
        country: "United States".to_string(),
        name: name.to_string(),
        icao: None,
        lat: Some(lat),
        lon: Some(lon),
    }
}

/// BOS and JFK with coordinates, plus a coordinate-less record.
pub fn east_coast() -> AirportDirectory {
    let mut nowhere = airport("NWH", "Nowhere", "Nowhere Field", 0.0, 0.0);
    nowhere.lat = None;
    nowhere.lon = None;
    AirportDirectory::from_records(vec![
        airport("BOS", "Boston", "Boston Logan", 42.36, -71.01),
        airport("JFK", "New York", "Kennedy", 40.64, -73.78),
        nowhere,
    ])
}

pub fn aircraft(id: &str, lat: f64, lon: f64) -> LiveAircraft {
    LiveAircraft {
        id: id.to_string(),
        flight_number: String::new(),
        airline_code: String::new(),
        lat,
        lon,
        altitude_ft: Some(30_000.0),
        ground_speed_kt: Some(420.0),
        heading_deg: Some(225.0),
        origin_code: None,
        dest_code: None,
    }
}

pub fn tagged(id: &str, origin: &str, dest: &str, lat: f64, lon: f64) -> LiveAircraft {
    LiveAircraft {
        origin_code: Some(origin.to_string()),
        dest_code: Some(dest.to_string()),
        ..aircraft(id, lat, lon)
    }
}
