//! Summarization integration tests.
//!
//! Uses a synthetic gazetteer and a pass-through projection (coordinates are
//! already planar metres) so every scenario is deterministic and offline.

use gpx_summary::track::{RawTrack, TrackMetadata, TrackPoint};
use gpx_summary::{
    NamedRegion, PlaceIndex, PlanarGrid, PlanarPoint, Projection, ProjectionError,
    RefreshmentStop, StopIndex, SummaryConfig, SummaryError, TrackSummarizer,
};

/// Treats (lon, lat) as planar (x, y) metres directly.
struct PassThrough;

impl Projection for PassThrough {
    fn project(
        &self,
        lon: f64,
        lat: f64,
        elevation: Option<f64>,
    ) -> Result<PlanarPoint, ProjectionError> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(ProjectionError("non-finite coordinate".to_string()));
        }
        Ok(PlanarPoint {
            x: lon,
            y: lat,
            z: elevation,
        })
    }
}

fn region(name: &str, kind: &str, admin: &str, xmin: f64, xmax: f64) -> NamedRegion {
    NamedRegion {
        name: name.to_string(),
        kind: kind.to_string(),
        admin_area: admin.to_string(),
        xmin,
        ymin: -500.0,
        xmax,
        ymax: 500.0,
    }
}

fn track(points: &[(f64, f64)]) -> RawTrack {
    RawTrack {
        metadata: TrackMetadata::default(),
        points: points
            .iter()
            .map(|&(x, y)| TrackPoint {
                lon: x,
                lat: y,
                elevation: None,
            })
            .collect(),
    }
}

fn summarizer(regions: Vec<NamedRegion>, config: SummaryConfig) -> TrackSummarizer<PassThrough> {
    TrackSummarizer::with_config(PlaceIndex::from_regions(regions), PassThrough, config)
}

// ============================================================================
// POI emission and deduplication
// ============================================================================

#[test]
fn test_out_and_back_reemits_place_outside_window() {
    let regions = vec![
        region("A", "Town", "Northshire", -200.0, 200.0),
        region("B", "Village", "Southshire", 400.0, 800.0),
    ];
    let s = summarizer(regions, SummaryConfig::default());

    // A -> B -> back to A; the second visit to A is 1.2km along the track,
    // outside the 1.0km duplicate window of the first A entry.
    let summary = s
        .summarize_track(&track(&[(0.0, 0.0), (600.0, 0.0), (0.0, 0.0)]), None)
        .unwrap();

    assert_eq!(summary.start, "A");
    assert_eq!(summary.finish, "A");
    assert!((summary.distance - 1.2).abs() < 1e-9);

    let names: Vec<(&str, f64)> = summary
        .points_of_interest
        .iter()
        .map(|p| (p.name.as_str(), p.distance))
        .collect();
    assert_eq!(names.len(), 3);
    assert_eq!(names[0], ("A", 0.0));
    assert_eq!(names[1].0, "B");
    assert!((names[1].1 - 0.6).abs() < 1e-9);
    assert_eq!(names[2].0, "A");
    assert!((names[2].1 - 1.2).abs() < 1e-9);

    // Distances are non-decreasing.
    for pair in summary.points_of_interest.windows(2) {
        assert!(pair[1].distance >= pair[0].distance);
    }
}

#[test]
fn test_wider_window_suppresses_reentry() {
    let regions = vec![
        region("A", "Town", "Northshire", -200.0, 200.0),
        region("B", "Village", "Southshire", 400.0, 800.0),
    ];
    let config = SummaryConfig {
        poi_duplicate_window_km: 1.5,
        ..SummaryConfig::default()
    };
    let s = summarizer(regions, config);

    let summary = s
        .summarize_track(&track(&[(0.0, 0.0), (600.0, 0.0), (0.0, 0.0)]), None)
        .unwrap();
    let names: Vec<&str> = summary
        .points_of_interest
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["A", "B"]);
}

#[test]
fn test_min_spacing_suppresses_distinct_place() {
    let regions = vec![
        region("A", "Town", "Northshire", -200.0, 200.0),
        region("C", "Village", "Northshire", 250.0, 650.0),
    ];
    let config = SummaryConfig {
        poi_min_spacing_km: 0.5,
        ..SummaryConfig::default()
    };
    let s = summarizer(regions, config);

    // C is only 0.4km from the start place point, inside the 0.5km minimum
    // spacing, so it is suppressed even though the name differs.
    let summary = s
        .summarize_track(&track(&[(0.0, 0.0), (400.0, 0.0)]), None)
        .unwrap();
    assert_eq!(summary.points_of_interest.len(), 1);
    assert_eq!(summary.finish, "A");
}

#[test]
fn test_settlement_rank_filter() {
    let regions = vec![
        region("A", "Town", "Northshire", -200.0, 200.0),
        region("H", "Hamlet", "Southshire", 400.0, 800.0),
    ];
    let config = SummaryConfig {
        min_settlement_rank: 4,
        ..SummaryConfig::default()
    };
    let s = summarizer(regions, config);

    let summary = s
        .summarize_track(&track(&[(0.0, 0.0), (600.0, 0.0)]), None)
        .unwrap();
    // The hamlet is below rank 4: no POI, and no admin-area count either.
    assert_eq!(summary.points_of_interest.len(), 1);
    assert!(!summary.admin_areas.contains_key("Southshire"));
}

// ============================================================================
// Admin areas, direction, distance
// ============================================================================

#[test]
fn test_admin_area_percentages() {
    let regions = vec![
        region("A", "Town", "Northshire", -200.0, 200.0),
        region("B", "Village", "Southshire", 400.0, 800.0),
    ];
    let s = summarizer(regions, SummaryConfig::default());

    let summary = s
        .summarize_track(&track(&[(0.0, 0.0), (600.0, 0.0), (0.0, 0.0)]), None)
        .unwrap();
    // Three counted points: two in Northshire, one in Southshire.
    assert_eq!(summary.admin_areas.get("Northshire"), Some(&66));
    assert_eq!(summary.admin_areas.get("Southshire"), Some(&33));
}

#[test]
fn test_direction_east() {
    let regions = vec![region("A", "Town", "Northshire", -200.0, 200.0)];
    let s = summarizer(regions, SummaryConfig::default());
    let summary = s
        .summarize_track(&track(&[(0.0, 0.0), (100.0, 0.0), (200.0, 0.0)]), None)
        .unwrap();
    assert_eq!(summary.direction, "east");
}

#[test]
fn test_distance_is_sum_of_segments() {
    let regions = vec![region("A", "Town", "Northshire", -200.0, 200.0)];
    let s = summarizer(regions, SummaryConfig::default());
    let summary = s
        .summarize_track(
            &track(&[(0.0, 0.0), (300.0, 0.0), (300.0, 400.0), (0.0, 400.0)]),
            None,
        )
        .unwrap();
    // 300 + 400 + 300 metres.
    assert!((summary.distance - 1.0).abs() < 1e-9);
}

// ============================================================================
// Refreshment stops
// ============================================================================

fn stop(name: &str, x: f64, y: f64) -> RefreshmentStop {
    RefreshmentStop {
        name: name.to_string(),
        url: format!("https://example.org/{name}"),
        x,
        y,
    }
}

#[test]
fn test_stop_hits_deduplicated_and_reemitted() {
    let regions = vec![region("A", "Town", "Northshire", -500.0, 3500.0)];
    let s = summarizer(regions, SummaryConfig::default());
    let stops = StopIndex::from_stops(vec![
        stop("Cafe X", 300.0, 0.0),
        stop("Cafe Y", 2700.0, 0.0),
    ]);

    // Out past both stops and back again. Each stop is emitted once on the
    // way out; on the way back, Cafe X is more than the 2km duplicate
    // window past its first entry and reappears.
    let mut points: Vec<(f64, f64)> = (0..=30).map(|i| (i as f64 * 100.0, 0.0)).collect();
    points.extend((0..=27).map(|i| (2900.0 - i as f64 * 100.0, 0.0)));
    let summary = s.summarize_track(&track(&points), Some(&stops)).unwrap();

    let names: Vec<&str> = summary
        .refreshment_stops
        .iter()
        .map(|h| h.name.as_str())
        .collect();
    assert_eq!(names, vec!["Cafe X", "Cafe Y", "Cafe X"]);
    assert!(
        summary.refreshment_stops[2].distance - summary.refreshment_stops[0].distance
            > s.config().stop_duplicate_window_km
    );
    for pair in summary.refreshment_stops.windows(2) {
        assert!(pair[1].distance >= pair[0].distance);
    }
}

#[test]
fn test_no_stop_index_means_no_hits() {
    let regions = vec![region("A", "Town", "Northshire", -500.0, 3500.0)];
    let s = summarizer(regions, SummaryConfig::default());
    let summary = s
        .summarize_track(&track(&[(0.0, 0.0), (100.0, 0.0)]), None)
        .unwrap();
    assert!(summary.refreshment_stops.is_empty());
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_start_out_of_range() {
    let regions = vec![region("Faraway", "Town", "Northshire", 10_000.0, 10_400.0)];
    let s = summarizer(regions, SummaryConfig::default());
    let err = s
        .summarize_track(&track(&[(0.0, 0.0), (100.0, 0.0)]), None)
        .unwrap_err();
    assert_eq!(
        err,
        SummaryError::StartOutOfRange {
            place: "Faraway".to_string()
        }
    );
}

#[test]
fn test_start_check_can_be_disabled() {
    let regions = vec![region("Faraway", "Town", "Northshire", 10_000.0, 10_400.0)];
    let config = SummaryConfig {
        start_range_m: None,
        ..SummaryConfig::default()
    };
    let s = summarizer(regions, config);
    let summary = s
        .summarize_track(&track(&[(0.0, 0.0), (100.0, 0.0)]), None)
        .unwrap();
    assert_eq!(summary.start, "Faraway");
}

#[test]
fn test_empty_track_is_malformed() {
    let regions = vec![region("A", "Town", "Northshire", -200.0, 200.0)];
    let s = summarizer(regions, SummaryConfig::default());
    let err = s.summarize_track(&track(&[]), None).unwrap_err();
    assert!(matches!(err, SummaryError::MalformedTrack { .. }));
}

#[test]
fn test_projection_failure_aborts_with_point_index() {
    let regions = vec![region("A", "Town", "Northshire", -200.0, 200.0)];
    let s = summarizer(regions, SummaryConfig::default());
    let err = s
        .summarize_track(&track(&[(0.0, 0.0), (f64::NAN, 0.0)]), None)
        .unwrap_err();
    match err {
        SummaryError::Projection { point, .. } => assert_eq!(point, 1),
        other => panic!("expected projection error, got {other:?}"),
    }
}

// ============================================================================
// End-to-end from GPX
// ============================================================================

#[test]
fn test_summarize_gpx_document() {
    let gpx_doc = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <metadata>
    <name>River loop</name>
    <link href="https://example.org/routes/7"><text>route</text></link>
    <time>2021-06-12T08:30:00Z</time>
  </metadata>
  <trk>
    <trkseg>
      <trkpt lat="52.000" lon="0.000"><ele>10.0</ele></trkpt>
      <trkpt lat="52.001" lon="0.000"><ele>20.0</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    let places = PlaceIndex::from_regions(vec![NamedRegion {
        name: "Somewhere".to_string(),
        kind: "Village".to_string(),
        admin_area: "Northshire".to_string(),
        xmin: -500.0,
        ymin: -500.0,
        xmax: 500.0,
        ymax: 500.0,
    }]);
    let s = TrackSummarizer::new(places, PlanarGrid::new(0.0, 52.0));

    let summary = s.summarize(gpx_doc.as_bytes(), None).unwrap();
    assert_eq!(summary.name, "River loop");
    assert_eq!(summary.link.as_deref(), Some("https://example.org/routes/7"));
    assert!(summary.time.as_deref().unwrap().contains("2021"));
    assert_eq!(summary.start, "Somewhere");
    assert_eq!(summary.direction, "north");
    // One degree of latitude is ~111km; a thousandth is ~111m.
    assert!((summary.distance - 0.1112).abs() < 0.001);
    assert!((summary.ascent - 10.0).abs() < 1e-9);
    assert_eq!(summary.descent, 0.0);
}

#[test]
fn test_summarize_rejects_malformed_gpx() {
    let places = PlaceIndex::from_regions(vec![region("A", "Town", "Northshire", -200.0, 200.0)]);
    let s = TrackSummarizer::new(places, PassThrough);
    let err = s.summarize("<not-gpx/>".as_bytes(), None).unwrap_err();
    assert!(matches!(err, SummaryError::MalformedTrack { .. }));
}
