//! Coordinate handling that keeps precise positions out of logs.
//!
//! Nothing in this crate logs a raw latitude/longitude. Log lines carry a
//! city-level geohash tag produced by [`log_tag`] instead.

use super::types::Coordinate;

/// Geohash length used in log lines (~2.4 km cells).
pub const LOG_GEOHASH_LEN: u8 = 5;

/// Converts latitude/longitude to a geohash string.
///
/// | Length | Cell Width | Use Case |
/// |--------|-----------|----------|
/// | 5      | ±2.4 km   | City-level (log tags) |
/// | 6      | ±0.61 km  | Neighborhood |
/// | 8      | ±0.019 km | Building |
///
/// # Examples
///
/// ```
/// use vevent_core::location::location_to_geohash;
///
/// let geohash = location_to_geohash(15.2993, 74.1240, 5);
/// assert_eq!(geohash.len(), 5);
/// ```
///
/// Returns an empty string if encoding fails, which only happens for NaN,
/// infinite or out-of-range input. [`Coordinate`] values never fail.
#[must_use]
pub fn location_to_geohash(lat: f64, lon: f64, precision: u8) -> String {
    geohash::encode(geohash::Coord { x: lon, y: lat }, precision as usize)
        .unwrap_or_else(|_| String::new())
}

/// Approximate error radius in meters for a geohash of the given length.
#[must_use]
pub const fn geohash_error_radius(precision: u8) -> f64 {
    match precision {
        1 => 2_500_000.0,
        2 => 630_000.0,
        3 => 78_000.0,
        4 => 20_000.0,
        5 => 2_400.0,
        6 => 610.0,
        7 => 76.0,
        8 => 19.0,
        9 => 2.4,
        10 => 0.6,
        _ => 0.0,
    }
}

/// Renders a coordinate for log output, e.g. `tdr1v(±2400m)`.
#[must_use]
pub fn log_tag(coordinate: &Coordinate) -> String {
    format!(
        "{}(±{}m)",
        coordinate.geohash(LOG_GEOHASH_LEN),
        geohash_error_radius(LOG_GEOHASH_LEN)
    )
}
