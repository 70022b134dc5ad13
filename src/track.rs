//! GPX track input.
//!
//! Parsing produces a [`RawTrack`]: document metadata plus one ordered
//! sequence of raw geographic points, with every track and segment in the
//! file flattened in document order. The summarizer consumes the sequence
//! without caring where segment boundaries were.

use std::io::Read;

use crate::error::{Result, SummaryError};

/// A raw track point straight from the GPX file, before projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub lon: f64,
    pub lat: f64,
    /// Elevation in metres, when the recording device supplied one.
    pub elevation: Option<f64>,
}

/// Document-level metadata carried into the summary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub name: String,
    /// Track start time as an ISO-8601 string, when present.
    pub time: Option<String>,
    /// First `http(s)` link found in the metadata, when present.
    pub link: Option<String>,
}

/// A parsed track: metadata plus the ordered point sequence.
#[derive(Debug, Clone, Default)]
pub struct RawTrack {
    pub metadata: TrackMetadata,
    pub points: Vec<TrackPoint>,
}

/// Read a GPX document into a [`RawTrack`].
///
/// Fails with [`SummaryError::MalformedTrack`] when the document cannot be
/// parsed. An empty document parses successfully here; the summarizer
/// rejects tracks without points.
pub fn read_track<R: Read>(reader: R) -> Result<RawTrack> {
    let gpx = gpx::read(reader).map_err(|e| SummaryError::malformed(e.to_string()))?;

    let mut metadata = TrackMetadata::default();
    if let Some(meta) = gpx.metadata {
        metadata.name = meta.name.unwrap_or_default();
        if let Some(time) = meta.time {
            metadata.time = time.format().ok();
        }
        metadata.link = meta
            .links
            .iter()
            .map(|l| l.href.clone())
            .find(|href| href.starts_with("http"));
    }

    let mut points = Vec::new();
    for track in &gpx.tracks {
        for segment in &track.segments {
            for wp in &segment.points {
                let point = wp.point();
                points.push(TrackPoint {
                    lon: point.x(),
                    lat: point.y(),
                    elevation: wp.elevation,
                });
            }
        }
    }

    Ok(RawTrack { metadata, points })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata>
    <name>Morning loop</name>
    <link href="https://example.org/routes/42"><text>route</text></link>
    <time>2021-06-12T08:30:00Z</time>
  </metadata>
  <trk>
    <trkseg>
      <trkpt lat="52.20" lon="0.12"><ele>14.0</ele></trkpt>
      <trkpt lat="52.21" lon="0.13"><ele>18.5</ele></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="52.22" lon="0.14"/>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_read_track_metadata_and_points() {
        let track = read_track(SAMPLE.as_bytes()).unwrap();
        assert_eq!(track.metadata.name, "Morning loop");
        assert_eq!(
            track.metadata.link.as_deref(),
            Some("https://example.org/routes/42")
        );
        assert!(track.metadata.time.as_deref().unwrap().contains("2021-06-12"));

        // Segments are flattened in order.
        assert_eq!(track.points.len(), 3);
        assert_eq!(track.points[0].elevation, Some(14.0));
        assert_eq!(track.points[2].elevation, None);
        assert!((track.points[2].lat - 52.22).abs() < 1e-9);
    }

    #[test]
    fn test_read_track_rejects_garbage() {
        let err = read_track("not a gpx document".as_bytes()).unwrap_err();
        assert!(matches!(err, SummaryError::MalformedTrack { .. }));
    }
}
