//! Path/centerline helpers: elevation lookup, flow direction, split point.

use crate::error::{AnalysisError, Result};
use crate::params::InterpMethod;
use crate::raster::{Polyline, Profile, RasterGrid};
use crate::resample::resample_points;

/// Bilinear DEM elevation at every vertex of `line`.
pub fn project_on_raster(dem: &RasterGrid, line: &Polyline) -> Vec<Option<f64>> {
    resample_points(dem, &line.x, &line.y, InterpMethod::Bilinear).0
}

/// Return `path` oriented so that it runs downhill on `dem`.
///
/// If either end has no elevation the path is returned unchanged.
pub fn orient_downhill(dem: &RasterGrid, path: &Polyline) -> Polyline {
    let z = project_on_raster(dem, path);
    match (z.first().copied().flatten(), z.last().copied().flatten()) {
        (Some(z0), Some(zn)) if zn > z0 => {
            tracing::info!("Path runs uphill ({z0:.1} m → {zn:.1} m), reversing it");
            path.reversed()
        }
        (Some(_), Some(_)) => path.clone(),
        _ => {
            tracing::warn!("Path end points lie outside the DEM, flow direction not checked");
            path.clone()
        }
    }
}

/// Index of the centerline sample closest to any of `points`.
///
/// When several split points are given, the one nearest to the centerline wins.
pub fn find_split_point(centerline: &Profile, points: &Polyline) -> Result<usize> {
    if points.is_empty() {
        return Err(AnalysisError::shape("split points", "at least one split point is required"));
    }
    if centerline.is_empty() {
        return Err(AnalysisError::shape("centerline", "profile has no samples"));
    }

    let mut best = (f64::INFINITY, 0usize);
    for (&px, &py) in points.x.iter().zip(&points.y) {
        for (i, (&x, &y)) in centerline.x.iter().zip(&centerline.y).enumerate() {
            let d = (x - px).hypot(y - py);
            if d < best.0 {
                best = (d, i);
            }
        }
    }
    Ok(best.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::RasterHeader;

    /// Plane dipping east: z = 1000 − x.
    fn east_dipping_dem() -> RasterGrid {
        let header = RasterHeader {
            ncols: 21,
            nrows: 21,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 10.0,
            nodata_value: -9999.0,
        };
        let values = (0..21).flat_map(|_| (0..21).map(|c| 1000.0 - 10.0 * c as f64)).collect();
        RasterGrid::from_values(header, values).unwrap()
    }

    #[test]
    fn uphill_path_is_reversed() {
        let dem = east_dipping_dem();
        let uphill = Polyline::new(vec![150.0, 20.0], vec![100.0, 100.0]).unwrap();
        let oriented = orient_downhill(&dem, &uphill);
        assert_eq!(oriented.x, vec![20.0, 150.0]);

        let downhill = Polyline::new(vec![20.0, 150.0], vec![50.0, 50.0]).unwrap();
        assert_eq!(orient_downhill(&dem, &downhill), downhill);
    }

    #[test]
    fn path_off_the_dem_is_left_alone() {
        let dem = east_dipping_dem();
        let path = Polyline::new(vec![150.0, 500.0], vec![100.0, 100.0]).unwrap();
        assert_eq!(orient_downhill(&dem, &path), path);
    }

    #[test]
    fn closest_of_several_split_points_wins() {
        let centerline = Profile {
            x: (0..10).map(|i| i as f64 * 10.0).collect(),
            y: vec![0.0; 10],
            z: vec![None; 10],
            s: (0..10).map(|i| i as f64 * 10.0).collect(),
        };
        let points = Polyline::new(vec![20.0, 61.0], vec![50.0, 2.0]).unwrap();
        assert_eq!(find_split_point(&centerline, &points).unwrap(), 6);
    }

    #[test]
    fn empty_split_point_set_is_rejected() {
        let centerline = Profile { x: vec![0.0], y: vec![0.0], z: vec![None], s: vec![0.0] };
        let err = find_split_point(&centerline, &Polyline::default()).unwrap_err();
        assert!(matches!(err, AnalysisError::InputShape { what: "split points", .. }));
    }
}
