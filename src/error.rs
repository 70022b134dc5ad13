//! Unified error handling for the gpx-summary library.
//!
//! Every fallible operation returns [`SummaryError`]. Errors carry enough
//! context (offending point index, region name, source key) to diagnose a
//! failure without re-running the summarization. The type is `Clone` so the
//! single-flight stop cache can hand the same failure to every waiter.

use thiserror::Error;

/// Unified error type for gpx-summary operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SummaryError {
    /// The track input could not be parsed, or contained no points.
    #[error("malformed track: {message}")]
    MalformedTrack { message: String },

    /// A point's coordinates could not be reprojected. Aborts the whole
    /// summarization; no partial summary is produced.
    #[error("projection failed at point {point}: {message}")]
    Projection { point: usize, message: String },

    /// The first point's nearest region does not contain it within the
    /// configured tolerance.
    #[error("start point out of range of {place}")]
    StartOutOfRange { place: String },

    /// The condenser was given an inconsistent constraint.
    #[error("invalid constraint: {message}")]
    InvalidConstraint { message: String },

    /// Reference place data could not be loaded or cached.
    #[error("gazetteer error: {message}")]
    Gazetteer { message: String },

    /// A refreshment stop list could not be read or built.
    #[error("stop data error: {message}")]
    StopData { message: String },

    /// The requested refreshment stop source is not known.
    #[error("unknown refreshment stop source: {name}")]
    UnknownStopSource { name: String },

    /// Filesystem error while reading input or writing results.
    #[error("I/O error: {message}")]
    Io { message: String },

    /// HTTP/network error while fetching remote data.
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        status_code: Option<u16>,
    },

    /// The remote track with this route id does not exist.
    #[error("route {route_id} not found")]
    RouteNotFound { route_id: u64 },
}

/// Result type alias for gpx-summary operations.
pub type Result<T> = std::result::Result<T, SummaryError>;

impl SummaryError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        SummaryError::MalformedTrack {
            message: message.into(),
        }
    }

    pub(crate) fn gazetteer(message: impl Into<String>) -> Self {
        SummaryError::Gazetteer {
            message: message.into(),
        }
    }

    pub(crate) fn stop_data(message: impl Into<String>) -> Self {
        SummaryError::StopData {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SummaryError::Projection {
            point: 17,
            message: "latitude out of range".to_string(),
        };
        assert!(err.to_string().contains("point 17"));
        assert!(err.to_string().contains("latitude out of range"));
    }

    #[test]
    fn test_start_out_of_range_names_place() {
        let err = SummaryError::StartOutOfRange {
            place: "Cambridge".to_string(),
        };
        assert!(err.to_string().contains("Cambridge"));
    }
}
