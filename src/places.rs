//! Named places and the spatial place index.
//!
//! A [`NamedRegion`] is a populated place from the gazetteer: a rectangular
//! bounding area with a name, a settlement classification and the
//! administrative area it belongs to, all in local planar coordinates.
//! [`PlaceIndex`] wraps an R-tree over these regions and exposes the one
//! query the summarizer needs: nearest region to a point.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

use crate::PlanarPoint;

/// A named rectangular region in planar coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedRegion {
    pub name: String,
    /// Settlement classification, e.g. "City", "Town", "Village".
    pub kind: String,
    /// County or district the place belongs to.
    pub admin_area: String,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl NamedRegion {
    /// True when the point lies inside the region's bounding box.
    pub fn contains(&self, p: &PlanarPoint) -> bool {
        p.x >= self.xmin && p.x <= self.xmax && p.y >= self.ymin && p.y <= self.ymax
    }

    /// True when the point lies within `tolerance` metres of the bounding
    /// box on both axes. Used for the start-in-range check.
    pub fn near_enough(&self, p: &PlanarPoint, tolerance: f64) -> bool {
        p.x >= self.xmin - tolerance
            && p.x <= self.xmax + tolerance
            && p.y >= self.ymin - tolerance
            && p.y <= self.ymax + tolerance
    }

    fn is_degenerate(&self) -> bool {
        self.xmax <= self.xmin || self.ymax <= self.ymin
    }
}

impl RTreeObject for NamedRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners([self.xmin, self.ymin], [self.xmax, self.ymax])
    }
}

impl PointDistance for NamedRegion {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = (self.xmin - point[0]).max(point[0] - self.xmax).max(0.0);
        let dy = (self.ymin - point[1]).max(point[1] - self.ymax).max(0.0);
        dx * dx + dy * dy
    }
}

static POI_FILTER_RANKS: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    HashMap::from([
        ("City", 5),
        ("Town", 4),
        ("Village", 3),
        ("Hamlet", 3),
        ("Other Settlement", 1),
    ])
});

static CONDENSE_PRIORITY_RANKS: Lazy<HashMap<&'static str, i32>> = Lazy::new(|| {
    HashMap::from([
        ("City", 5),
        ("Town", 4),
        ("Village", 3),
        ("Hamlet", 2),
        ("Other Settlement", 1),
    ])
});

/// Ordinal ranking of settlement classifications.
///
/// Two built-in tables exist: [`SettlementRanks::poi_filter`] decides which
/// regions are eligible as points of interest, and
/// [`SettlementRanks::condense_priority`] breaks ties when condensing a POI
/// list. Custom tables can be supplied for deterministic tests.
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementRanks {
    ranks: HashMap<String, i32>,
}

impl SettlementRanks {
    /// Build a table from explicit (kind, rank) pairs.
    pub fn new(pairs: impl IntoIterator<Item = (String, i32)>) -> Self {
        Self {
            ranks: pairs.into_iter().collect(),
        }
    }

    /// Ranking used to filter POI-eligible regions.
    pub fn poi_filter() -> Self {
        Self {
            ranks: POI_FILTER_RANKS
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    /// Ranking used as deletion priority during condensation.
    pub fn condense_priority() -> Self {
        Self {
            ranks: CONDENSE_PRIORITY_RANKS
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    /// Rank of a settlement kind; unranked kinds are 0.
    pub fn rank(&self, kind: &str) -> i32 {
        self.ranks.get(kind).copied().unwrap_or(0)
    }
}

/// Read-only spatial index over named regions.
///
/// Built once and shared across any number of summarizations; no interior
/// mutability, so sharing needs no locks.
#[derive(Debug)]
pub struct PlaceIndex {
    tree: RTree<NamedRegion>,
}

impl PlaceIndex {
    /// Build an index, dropping degenerate regions (zero-width or
    /// zero-height bounding boxes) up front so queries never see them.
    pub fn from_regions(regions: Vec<NamedRegion>) -> Self {
        let valid: Vec<NamedRegion> = regions
            .into_iter()
            .filter(|r| {
                if r.is_degenerate() {
                    log::debug!("dropping degenerate region {}", r.name);
                    false
                } else {
                    true
                }
            })
            .collect();
        Self {
            tree: RTree::bulk_load(valid),
        }
    }

    /// Nearest region to the point, or `None` for an empty index.
    pub fn nearest(&self, p: &PlanarPoint) -> Option<&NamedRegion> {
        self.tree.nearest_neighbor(&[p.x, p.y])
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
