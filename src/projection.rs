//! Coordinate projection seam.
//!
//! The summarizer works in a local planar (easting/northing) coordinate
//! system measured in metres. How geographic coordinates get there is a
//! collaborator concern: implement [`Projection`] to plug in a real datum
//! transformation. [`PlanarGrid`] is the bundled implementation, an
//! equirectangular local grid that is accurate enough for track summaries
//! over a few hundred kilometres, not for survey work.

use crate::PlanarPoint;

/// Mean earth radius in metres.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Failure to project a single coordinate pair.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ProjectionError(pub String);

/// Pure projection from geographic to local planar coordinates.
///
/// Implementations must be deterministic and side-effect free; the
/// summarizer calls `project` once per track point.
pub trait Projection {
    fn project(
        &self,
        lon: f64,
        lat: f64,
        elevation: Option<f64>,
    ) -> Result<PlanarPoint, ProjectionError>;
}

/// Equirectangular local grid centred on a reference coordinate.
///
/// Eastings grow with longitude, northings with latitude, both in metres.
/// A false origin can be added so that grid values match an existing
/// national grid approximately.
#[derive(Debug, Clone, Copy)]
pub struct PlanarGrid {
    origin_lon: f64,
    origin_lat: f64,
    false_easting: f64,
    false_northing: f64,
    cos_origin_lat: f64,
}

impl PlanarGrid {
    /// Grid centred on `(origin_lon, origin_lat)` with no false origin.
    pub fn new(origin_lon: f64, origin_lat: f64) -> Self {
        Self::with_false_origin(origin_lon, origin_lat, 0.0, 0.0)
    }

    /// Grid with a false origin added to every projected coordinate.
    pub fn with_false_origin(
        origin_lon: f64,
        origin_lat: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        Self {
            origin_lon,
            origin_lat,
            false_easting,
            false_northing,
            cos_origin_lat: origin_lat.to_radians().cos(),
        }
    }
}

fn in_range(lon: f64, lat: f64) -> bool {
    lon.is_finite() && lat.is_finite() && (-180.0..=180.0).contains(&lon) && (-90.0..=90.0).contains(&lat)
}

impl Projection for PlanarGrid {
    fn project(
        &self,
        lon: f64,
        lat: f64,
        elevation: Option<f64>,
    ) -> Result<PlanarPoint, ProjectionError> {
        if !in_range(lon, lat) {
            return Err(ProjectionError(format!(
                "coordinates ({lon}, {lat}) outside valid range"
            )));
        }
        let x = EARTH_RADIUS_M * (lon - self.origin_lon).to_radians() * self.cos_origin_lat
            + self.false_easting;
        let y = EARTH_RADIUS_M * (lat - self.origin_lat).to_radians() + self.false_northing;
        Ok(PlanarPoint {
            x,
            y,
            z: elevation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_projects_to_false_origin() {
        let grid = PlanarGrid::with_false_origin(-2.0, 49.0, 400_000.0, -100_000.0);
        let p = grid.project(-2.0, 49.0, None).unwrap();
        assert_eq!(p.x, 400_000.0);
        assert_eq!(p.y, -100_000.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let grid = PlanarGrid::new(0.0, 52.0);
        let p = grid.project(0.0, 53.0, Some(10.0)).unwrap();
        // One degree of latitude is roughly 111 km on a spherical earth.
        assert!((p.y - 111_194.9).abs() < 1.0);
        assert_eq!(p.x, 0.0);
        assert_eq!(p.z, Some(10.0));
    }

    #[test]
    fn test_rejects_out_of_range_coordinates() {
        let grid = PlanarGrid::new(0.0, 52.0);
        assert!(grid.project(181.0, 0.0, None).is_err());
        assert!(grid.project(0.0, 91.0, None).is_err());
        assert!(grid.project(f64::NAN, 0.0, None).is_err());
    }
}
