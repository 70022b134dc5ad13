//! Refreshment stops and the spatial stop index.
//!
//! A [`RefreshmentStop`] is a named point (cafe, pub, garden centre) with a
//! fixed-size square tolerance rectangle around it; "near enough to the
//! route" means the route's search window intersects that square. Stop
//! lists come either from a GPX waypoint file or from a JSON cafe feed;
//! both are reprojected into the local grid at build time.

use std::io::Read;

use rstar::{RTree, RTreeObject, AABB};
use serde::Deserialize;

use crate::error::{Result, SummaryError};
use crate::projection::Projection;
use crate::PlanarPoint;

/// Side, in metres, of the tolerance square around a stop.
pub const STOP_RECT_SIZE: f64 = 500.0;

/// A refreshment stop in planar coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshmentStop {
    pub name: String,
    pub url: String,
    pub x: f64,
    pub y: f64,
}

impl RefreshmentStop {
    /// True when the point lies inside the stop's tolerance square.
    pub fn contains(&self, p: &PlanarPoint) -> bool {
        let half = STOP_RECT_SIZE / 2.0;
        (p.x - self.x).abs() <= half && (p.y - self.y).abs() <= half
    }
}

impl RTreeObject for RefreshmentStop {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        let half = STOP_RECT_SIZE / 2.0;
        AABB::from_corners(
            [self.x - half, self.y - half],
            [self.x + half, self.y + half],
        )
    }
}

/// Read-only spatial index over refreshment stops.
///
/// Built once per source and shared read-only across summarizations.
#[derive(Debug)]
pub struct StopIndex {
    tree: RTree<RefreshmentStop>,
}

impl StopIndex {
    pub fn from_stops(stops: Vec<RefreshmentStop>) -> Self {
        Self {
            tree: RTree::bulk_load(stops),
        }
    }

    /// Stops whose tolerance square intersects a square search window of
    /// side `rect_size` metres centred on the point.
    pub fn nearby<'a>(
        &'a self,
        p: &PlanarPoint,
        rect_size: f64,
    ) -> impl Iterator<Item = &'a RefreshmentStop> + 'a {
        let half = rect_size / 2.0;
        let window = AABB::from_corners([p.x - half, p.y - half], [p.x + half, p.y + half]);
        self.tree.locate_in_envelope_intersecting(&window)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

/// Build a stop list from a GPX file of waypoints (name + link per point).
pub fn stops_from_waypoints<R: Read, P: Projection>(
    reader: R,
    projection: &P,
) -> Result<Vec<RefreshmentStop>> {
    let gpx = gpx::read(reader).map_err(|e| SummaryError::stop_data(e.to_string()))?;
    let mut stops = Vec::with_capacity(gpx.waypoints.len());
    for wp in &gpx.waypoints {
        let point = wp.point();
        let projected = projection
            .project(point.x(), point.y(), None)
            .map_err(|e| SummaryError::stop_data(e.to_string()))?;
        stops.push(RefreshmentStop {
            name: wp.name.clone().unwrap_or_default(),
            url: wp
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default(),
            x: projected.x,
            y: projected.y,
        });
    }
    Ok(stops)
}

#[derive(Debug, Deserialize)]
struct CafeRecord {
    #[serde(default, alias = "Name")]
    name: String,
    #[serde(default, alias = "Website")]
    website: String,
    #[serde(alias = "Lat")]
    lat: f64,
    #[serde(alias = "Lng")]
    lng: f64,
}

/// Build a stop list from a JSON cafe feed (array of name/website/lat/lng
/// records). Records that fail projection are logged and skipped so one bad
/// entry does not lose the whole feed.
pub fn stops_from_cafe_json<R: Read, P: Projection>(
    reader: R,
    projection: &P,
) -> Result<Vec<RefreshmentStop>> {
    let cafes: Vec<CafeRecord> =
        serde_json::from_reader(reader).map_err(|e| SummaryError::stop_data(e.to_string()))?;
    let mut stops = Vec::with_capacity(cafes.len());
    for cafe in cafes {
        match projection.project(cafe.lng, cafe.lat, None) {
            Ok(p) => stops.push(RefreshmentStop {
                name: cafe.name,
                url: cafe.website,
                x: p.x,
                y: p.y,
            }),
            Err(e) => {
                log::warn!("skipping cafe {:?}: {e}", cafe.name);
            }
        }
    }
    Ok(stops)
}
