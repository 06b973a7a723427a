//! Error types for location operations.
//!
//! Asynchronous failures never escape the coordinator: they are turned into
//! sentinel display names. These types describe what went wrong on the way.

use thiserror::Error;

/// Errors reported by a geocoding lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeocodeError {
    /// The service returned no placemark for the request.
    #[error("No matching location found")]
    NotFound,

    /// The service failed (network, quota, malformed response).
    #[error("Geocoding service error: {0}")]
    Service(String),
}

/// Errors for synchronous location operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// Coordinate was NaN, infinite or out of range.
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

/// Result type alias for location operations.
pub type Result<T> = std::result::Result<T, LocationError>;
