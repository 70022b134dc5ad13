//! # GPX Summary
//!
//! Human-readable trip summaries from GPS tracks.
//!
//! This library provides:
//! - Track summarization: distance, climbing, compass direction, places
//!   passed, refreshment stops near the route and administrative areas
//!   traversed, in one pass over the track
//! - POI condensation: reduce a summary's place list to a target count or
//!   minimum spacing for short trip titles
//! - Gazetteer and stop-list ingest to build the spatial indices
//!
//! ## Features
//!
//! - **`http`** - Enable fetchers for remote tracks and stop sources
//!
//! ## Quick Start
//!
//! ```rust
//! use gpx_summary::{NamedRegion, PlaceIndex, PlanarGrid, TrackSummarizer};
//! use gpx_summary::track::{RawTrack, TrackMetadata, TrackPoint};
//!
//! // Reference data: one named region around the grid origin.
//! let places = PlaceIndex::from_regions(vec![NamedRegion {
//!     name: "Ely".to_string(),
//!     kind: "City".to_string(),
//!     admin_area: "Cambridgeshire".to_string(),
//!     xmin: -1000.0,
//!     ymin: -1000.0,
//!     xmax: 1000.0,
//!     ymax: 1000.0,
//! }]);
//!
//! let summarizer = TrackSummarizer::new(places, PlanarGrid::new(0.25, 52.4));
//! let track = RawTrack {
//!     metadata: TrackMetadata {
//!         name: "Evening loop".to_string(),
//!         ..TrackMetadata::default()
//!     },
//!     points: vec![
//!         TrackPoint { lon: 0.25, lat: 52.4, elevation: Some(20.0) },
//!         TrackPoint { lon: 0.25, lat: 52.405, elevation: Some(25.0) },
//!     ],
//! };
//!
//! let summary = summarizer.summarize_track(&track, None).unwrap();
//! assert_eq!(summary.start, "Ely");
//! assert_eq!(summary.direction, "north");
//! assert!(summary.distance > 0.0);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, SummaryError};

// Coordinate projection seam
pub mod projection;
pub use projection::{PlanarGrid, Projection, ProjectionError};

// GPX track input
pub mod track;
pub use track::{read_track, RawTrack, TrackMetadata, TrackPoint};

// Named places and the place index
pub mod places;
pub use places::{NamedRegion, PlaceIndex, SettlementRanks};

// Gazetteer ingest and binary cache
pub mod gazetteer;

// Refreshment stops and the stop index
pub mod stops;
pub use stops::{
    stops_from_cafe_json, stops_from_waypoints, RefreshmentStop, StopIndex, STOP_RECT_SIZE,
};

// Track summarization (core algorithm)
pub mod summarize;
pub use summarize::{Poi, RefreshmentStopHit, SummaryConfig, TrackSummarizer, TrackSummary};

// POI condensation (core algorithm)
pub mod condense;
pub use condense::{condense, CondenseOptions};

// Remote fetchers and the single-flight stop cache
#[cfg(feature = "http")]
pub mod http;
#[cfg(feature = "http")]
pub use http::{fetch_route, fetch_stop_source, StopCache, STOP_SOURCES};

// ============================================================================
// Core Types
// ============================================================================

/// A point in local planar coordinates.
///
/// `x`/`y` are easting/northing in metres; `z` is elevation in metres when
/// the source data supplied one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanarPoint {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl PlanarPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }
}
