//! Track summarization.
//!
//! A [`TrackSummarizer`] turns an ordered GPS point stream into a
//! [`TrackSummary`]: total distance, climbing, overall compass direction,
//! the places passed, nearby refreshment stops and a breakdown of
//! administrative areas traversed. The pass is single-threaded and strictly
//! sequential; every step depends on the running distance and on what was
//! already emitted.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SummaryError};
use crate::places::{PlaceIndex, SettlementRanks};
use crate::projection::Projection;
use crate::stops::StopIndex;
use crate::track::{read_track, RawTrack};
use crate::PlanarPoint;

/// Configuration for the track summarization pass.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// Side (in metres) of the square search window around each track point
    /// used to find nearby refreshment stops. Default: 500.
    pub stop_search_rect_size: f64,

    /// Distance (in km) to look back along the route when suppressing a
    /// repeated refreshment stop. Should be at least
    /// `2 * stop_search_rect_size / 1000`. Default: 2.0.
    pub stop_duplicate_window_km: f64,

    /// Distance (in km) to look back along the route when suppressing a
    /// repeated point of interest. Default: 1.0.
    pub poi_duplicate_window_km: f64,

    /// Minimum straight-line distance (in km) from the last emitted point
    /// of interest before another may be emitted, even under a different
    /// name. Default: 0 (no suppression).
    pub poi_min_spacing_km: f64,

    /// Minimum settlement rank for a region to be eligible as a point of
    /// interest. Default: 1 ("Other Settlement" and up).
    pub min_settlement_rank: i32,

    /// Maximum distance (in metres) the first point may lie outside its
    /// nearest region's bounding box. `None` disables the check.
    /// Default: 500.
    pub start_range_m: Option<f64>,

    /// Settlement ranking used for POI eligibility.
    pub ranks: SettlementRanks,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            stop_search_rect_size: 500.0,
            stop_duplicate_window_km: 2.0,
            poi_duplicate_window_km: 1.0,
            poi_min_spacing_km: 0.0,
            min_settlement_rank: 1,
            start_range_m: Some(500.0),
            ranks: SettlementRanks::poi_filter(),
        }
    }
}

/// A named place passed along the track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Poi {
    pub name: String,
    /// Settlement classification of the place.
    pub kind: String,
    /// Along-track distance (km) at which the place was first confirmed.
    pub distance: f64,
}

/// A refreshment stop found near the track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshmentStopHit {
    pub name: String,
    pub url: String,
    /// Along-track distance (km) at which the stop was first seen.
    pub distance: f64,
}

/// Aggregated result of summarizing one track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Name of the place nearest the first track point.
    pub start: String,
    /// Name of the last place confirmed along the track.
    pub finish: String,
    /// Overall 8-point compass direction of travel.
    pub direction: String,
    /// Cumulative along-track distance in km.
    pub distance: f64,
    /// Total climbing in metres, from the smoothed elevation series.
    pub ascent: f64,
    /// Total descent in metres, from the smoothed elevation series.
    pub descent: f64,
    pub points_of_interest: Vec<Poi>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub refreshment_stops: Vec<RefreshmentStopHit>,
    /// Percentage of counted track points per administrative area. Entries
    /// that round to zero are dropped; values sum to at most 100.
    pub admin_areas: BTreeMap<String, u64>,
}

/// Summarizes tracks against a place index.
///
/// One summarizer is built per place index and shared read-only across any
/// number of summarizations; all methods take `&self`.
#[derive(Debug)]
pub struct TrackSummarizer<P> {
    places: PlaceIndex,
    projection: P,
    config: SummaryConfig,
}

impl<P: Projection> TrackSummarizer<P> {
    pub fn new(places: PlaceIndex, projection: P) -> Self {
        Self::with_config(places, projection, SummaryConfig::default())
    }

    pub fn with_config(places: PlaceIndex, projection: P, config: SummaryConfig) -> Self {
        Self {
            places,
            projection,
            config,
        }
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Parse a GPX document and summarize it.
    pub fn summarize<R: Read>(&self, reader: R, stops: Option<&StopIndex>) -> Result<TrackSummary> {
        let track = read_track(reader)?;
        self.summarize_track(&track, stops)
    }

    /// Summarize an already-parsed track in a single pass over its points.
    pub fn summarize_track(
        &self,
        track: &RawTrack,
        stops: Option<&StopIndex>,
    ) -> Result<TrackSummary> {
        let mut summary = TrackSummary {
            name: track.metadata.name.clone(),
            time: track.metadata.time.clone(),
            link: track.metadata.link.clone(),
            ..TrackSummary::default()
        };

        let first = track
            .points
            .first()
            .ok_or_else(|| SummaryError::malformed("track contains no points"))?;

        let mut elevations: Vec<f64> = Vec::with_capacity(track.points.len());
        let mut admin_visits: HashMap<String, u64> = HashMap::new();

        // Running state seeded from the first point.
        let start = self.project(0, first)?;
        elevations.push(first.elevation.unwrap_or(0.0));
        let nn = self.nearest(&start)?;
        if let Some(tolerance) = self.config.start_range_m {
            if !nn.near_enough(&start, tolerance) {
                return Err(SummaryError::StartOutOfRange {
                    place: nn.name.clone(),
                });
            }
        }
        summary.start = nn.name.clone();
        summary.points_of_interest.push(Poi {
            name: nn.name.clone(),
            kind: nn.kind.clone(),
            distance: 0.0,
        });
        count_admin_visit(&mut admin_visits, &nn.admin_area);

        let mut prev_place = nn.name.clone();
        let mut prev_place_point = start;
        let mut prev_point = start;
        let mut d_east = 0.0;
        let mut d_north = 0.0;

        for (index, raw) in track.points.iter().enumerate().skip(1) {
            let point = self.project(index, raw)?;
            elevations.push(raw.elevation.unwrap_or(0.0));

            summary.distance += distance_km(&point, &prev_point);
            d_east += point.x - start.x;
            d_north += point.y - start.y;

            let nn = self.nearest(&point)?;
            if nn.contains(&point) && self.config.ranks.rank(&nn.kind) >= self.config.min_settlement_rank
            {
                count_admin_visit(&mut admin_visits, &nn.admin_area);
                let seen = poi_seen_recently(
                    &summary.points_of_interest,
                    summary.distance,
                    self.config.poi_duplicate_window_km,
                    &nn.name,
                );
                if !seen
                    && distance_km(&point, &prev_place_point) > self.config.poi_min_spacing_km
                {
                    summary.points_of_interest.push(Poi {
                        name: nn.name.clone(),
                        kind: nn.kind.clone(),
                        distance: summary.distance,
                    });
                    prev_place = nn.name.clone();
                    prev_place_point = point;
                }
            }

            if let Some(stops) = stops {
                for stop in stops.nearby(&point, self.config.stop_search_rect_size) {
                    let seen = stop_seen_recently(
                        &summary.refreshment_stops,
                        summary.distance,
                        self.config.stop_duplicate_window_km,
                        &stop.name,
                    );
                    if !seen {
                        summary.refreshment_stops.push(RefreshmentStopHit {
                            name: stop.name.clone(),
                            url: stop.url.clone(),
                            distance: summary.distance,
                        });
                    }
                }
            }

            prev_point = point;
        }

        summary.finish = prev_place;
        summary.direction = compass_direction(d_east, d_north).to_string();
        let (ascent, descent) = elevation_gain(&elevations);
        summary.ascent = ascent;
        summary.descent = descent;
        summary.admin_areas = to_percentages(admin_visits);
        Ok(summary)
    }

    fn project(&self, index: usize, raw: &crate::track::TrackPoint) -> Result<PlanarPoint> {
        self.projection
            .project(raw.lon, raw.lat, raw.elevation)
            .map_err(|e| SummaryError::Projection {
                point: index,
                message: e.to_string(),
            })
    }

    fn nearest(&self, p: &PlanarPoint) -> Result<&crate::places::NamedRegion> {
        self.places
            .nearest(p)
            .ok_or_else(|| SummaryError::gazetteer("place index is empty"))
    }
}

/// Straight-line planar distance in kilometres.
fn distance_km(a: &PlanarPoint, b: &PlanarPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt() / 1000.0
}

fn count_admin_visit(visits: &mut HashMap<String, u64>, admin_area: &str) {
    if admin_area.is_empty() {
        return;
    }
    *visits.entry(admin_area.to_string()).or_insert(0) += 1;
}

// The most recent emission is always compared by name, whatever the gap;
// the distance window applies from the second-most-recent entry backwards.
// Adjacent entries therefore never share a name.
fn poi_seen_recently(pois: &[Poi], total_km: f64, window_km: f64, name: &str) -> bool {
    for (i, poi) in pois.iter().enumerate().rev() {
        if i + 1 < pois.len() && total_km - poi.distance > window_km {
            break;
        }
        if poi.name == name {
            return true;
        }
    }
    false
}

fn stop_seen_recently(
    hits: &[RefreshmentStopHit],
    total_km: f64,
    window_km: f64,
    name: &str,
) -> bool {
    for (i, hit) in hits.iter().enumerate().rev() {
        if i + 1 < hits.len() && total_km - hit.distance > window_km {
            break;
        }
        if hit.name == name {
            return true;
        }
    }
    false
}

/// Classify accumulated displacement into an 8-point compass direction.
fn compass_direction(d_east: f64, d_north: f64) -> &'static str {
    if d_north == 0.0 {
        return if d_east >= 0.0 { "east" } else { "west" };
    }
    let tan_22_5 = (std::f64::consts::PI / 8.0).tan();
    let tan_67_5 = (3.0 * std::f64::consts::PI / 8.0).tan();
    let t = d_east.abs() / d_north.abs();
    if d_north > 0.0 {
        if t < tan_22_5 {
            "north"
        } else if t < tan_67_5 {
            if d_east > 0.0 {
                "north-east"
            } else {
                "north-west"
            }
        } else if d_east > 0.0 {
            "east"
        } else {
            "west"
        }
    } else if t < tan_22_5 {
        "south"
    } else if t < tan_67_5 {
        if d_east > 0.0 {
            "south-east"
        } else {
            "south-west"
        }
    } else if d_east > 0.0 {
        "east"
    } else {
        "west"
    }
}

/// Total ascent and descent from a raw elevation series.
///
/// A 3-tap weighted moving average (0.3 / 0.4 / 0.3, endpoints unsmoothed)
/// filters GPS elevation noise before the deltas are summed.
fn elevation_gain(elevations: &[f64]) -> (f64, f64) {
    if elevations.is_empty() {
        return (0.0, 0.0);
    }

    let n = elevations.len();
    let mut smoothed = Vec::with_capacity(n);
    for (i, &elevation) in elevations.iter().enumerate() {
        if i > 0 && i < n - 1 {
            smoothed.push(elevations[i - 1] * 0.3 + elevation * 0.4 + elevations[i + 1] * 0.3);
        } else {
            smoothed.push(elevation);
        }
    }

    let mut ascent = 0.0;
    let mut descent = 0.0;
    for window in smoothed.windows(2) {
        let delta = window[1] - window[0];
        if delta > 0.0 {
            ascent += delta;
        } else {
            descent -= delta;
        }
    }
    (ascent, descent)
}

/// Convert visit counts to integer percentages of the counted total,
/// dropping entries that come out at zero.
fn to_percentages(visits: HashMap<String, u64>) -> BTreeMap<String, u64> {
    let total: u64 = visits.values().sum();
    if total == 0 {
        return BTreeMap::new();
    }
    visits
        .into_iter()
        .filter_map(|(name, count)| {
            let percent = count * 100 / total;
            (percent > 0).then_some((name, percent))
        })
        .collect()
}
