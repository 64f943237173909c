//! Coordinate parsing and great-circle distance.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoordinateError;

/// Mean earth radius in meters (spherical model).
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Degree-minute notation: `DD-MM.MMM<dir>` with dir in N/S/E/W.
static DEGREE_MINUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3})-(\d{1,2}(?:\.\d+)?)\s*([NSEWnsew])$").unwrap());

// ── GeoPoint ────────────────────────────────────────────────────────

/// A validated latitude/longitude pair in decimal degrees.
///
/// The origin `(0, 0)` is the forms' "unset" sentinel and is never a
/// valid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Build a point, returning `None` unless both components are
    /// finite, in range, and not the origin sentinel.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        if latitude == 0.0 && longitude == 0.0 {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }

    /// Parse both components from raw form values.
    ///
    /// Any parse failure or invalid pair yields `None` — callers decide
    /// whether absence is a rejection.
    pub fn from_raw(lat: &str, lon: &str) -> Option<Self> {
        let latitude = parse_coordinate(lat).ok()?;
        let longitude = parse_coordinate(lon).ok()?;
        Self::new(latitude, longitude)
    }
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Parse one coordinate component into decimal degrees.
///
/// Accepts plain decimal degrees (`"47.53717"`) or degree-minute
/// notation (`"47-32.23N"`, degrees + minutes/60, negated for S/W).
/// The result is rounded to 5 decimal places toward positive infinity,
/// so repeated runs produce byte-identical output.
pub fn parse_coordinate(raw: &str) -> Result<f64, CoordinateError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoordinateError::Empty);
    }

    if let Some(caps) = DEGREE_MINUTE.captures(trimmed) {
        let degrees: f64 = caps[1]
            .parse()
            .map_err(|_| CoordinateError::Malformed(trimmed.to_string()))?;
        let minutes: f64 = caps[2]
            .parse()
            .map_err(|_| CoordinateError::Malformed(trimmed.to_string()))?;
        let mut value = degrees + minutes / 60.0;
        if matches!(&caps[3], "S" | "s" | "W" | "w") {
            value = -value;
        }
        return Ok(round_up_5(value));
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| CoordinateError::Malformed(trimmed.to_string()))?;
    if !value.is_finite() {
        return Err(CoordinateError::NonFinite(trimmed.to_string()));
    }
    Ok(round_up_5(value))
}

/// Round to 5 decimal places toward positive infinity.
fn round_up_5(value: f64) -> f64 {
    (value * 1e5).ceil() / 1e5
}

// ── Distance ────────────────────────────────────────────────────────

/// Haversine great-circle distance between two points, in meters.
///
/// Symmetric, zero for identical points, and total over all valid
/// inputs.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_M * c
}
