use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Georeferencing of a regular axis-aligned raster.
///
/// Sample nodes sit at `(xllcorner + col·cellsize, yllcorner + row·cellsize)`;
/// row 0 is the southern edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterHeader {
    pub ncols: usize,
    pub nrows: usize,
    pub xllcorner: f64,
    pub yllcorner: f64,
    pub cellsize: f64,
    pub nodata_value: f64,
}

impl RasterHeader {
    /// Fractional (column, row) of a world coordinate.
    #[inline]
    pub fn to_cell(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.xllcorner) / self.cellsize, (y - self.yllcorner) / self.cellsize)
    }

    /// World coordinate of node `(row, col)`.
    #[inline]
    pub fn node(&self, row: usize, col: usize) -> (f64, f64) {
        (
            self.xllcorner + col as f64 * self.cellsize,
            self.yllcorner + row as f64 * self.cellsize,
        )
    }

    /// Same extent and resolution. The no-data sentinel is not compared.
    pub fn same_geometry(&self, other: &RasterHeader) -> bool {
        self.ncols == other.ncols
            && self.nrows == other.nrows
            && self.xllcorner == other.xllcorner
            && self.yllcorner == other.yllcorner
            && self.cellsize == other.cellsize
    }
}

/// A decoded raster. No-data cells are stored as `None`, never as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    pub header: RasterHeader,
    /// Row-major values, row 0 at `yllcorner`.
    data: Vec<Option<f64>>,
}

impl RasterGrid {
    /// Build from raw row-major values, mapping `nodata_value` (and NaN) to `None`.
    pub fn from_values(header: RasterHeader, values: Vec<f64>) -> Result<Self> {
        if values.len() != header.ncols * header.nrows {
            return Err(AnalysisError::shape(
                "raster",
                format!(
                    "{} values for a {}×{} grid",
                    values.len(),
                    header.ncols,
                    header.nrows
                ),
            ));
        }
        if !(header.cellsize > 0.0) {
            return Err(AnalysisError::InvalidParameter {
                name: "cellsize",
                value: header.cellsize,
            });
        }
        let nodata = header.nodata_value;
        let data = values
            .into_iter()
            .map(|v| if v == nodata || v.is_nan() { None } else { Some(v) })
            .collect();
        Ok(Self { header, data })
    }

    /// A raster where every cell holds `value`.
    pub fn constant(header: RasterHeader, value: f64) -> Self {
        Self { header, data: vec![Some(value); header.ncols * header.nrows] }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.data[row * self.header.ncols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: Option<f64>) {
        self.data[row * self.header.ncols + col] = val;
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.data
    }
}

/// Ordered `(x, y)` vertices, e.g. a user-drawn flow path or a split-point set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Polyline {
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(AnalysisError::shape(
                "polyline",
                format!("x has {} entries, y has {}", x.len(), y.len()),
            ));
        }
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn reversed(&self) -> Self {
        Self {
            x: self.x.iter().rev().copied().collect(),
            y: self.y.iter().rev().copied().collect(),
        }
    }
}

/// A polyline carrying elevation `z` (missing where off the DEM) and
/// cumulative along-line distance `s`. All four arrays have equal length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<Option<f64>>,
    pub s: Vec<f64>,
}

impl Profile {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(ncols: usize, nrows: usize) -> RasterHeader {
        RasterHeader {
            ncols,
            nrows,
            xllcorner: 100.0,
            yllcorner: 50.0,
            cellsize: 5.0,
            nodata_value: -9999.0,
        }
    }

    #[test]
    fn nodata_cells_become_missing() {
        let r = RasterGrid::from_values(header(2, 2), vec![1.0, -9999.0, f64::NAN, 4.0]).unwrap();
        assert_eq!(r.get(0, 0), Some(1.0));
        assert_eq!(r.get(0, 1), None);
        assert_eq!(r.get(1, 0), None);
        assert_eq!(r.get(1, 1), Some(4.0));
    }

    #[test]
    fn wrong_value_count_is_a_shape_error() {
        let err = RasterGrid::from_values(header(3, 2), vec![0.0; 5]).unwrap_err();
        assert!(matches!(err, AnalysisError::InputShape { what: "raster", .. }), "got {err:?}");
    }

    #[test]
    fn node_and_to_cell_are_inverse() {
        let h = header(10, 10);
        let (x, y) = h.node(3, 7);
        assert_eq!(h.to_cell(x, y), (7.0, 3.0));
    }

    #[test]
    fn geometry_ignores_the_nodata_sentinel() {
        let h = header(4, 3);
        assert!(h.same_geometry(&RasterHeader { nodata_value: -1.0, ..h }));
        assert!(!h.same_geometry(&RasterHeader { xllcorner: 102.5, ..h }));
        assert!(!h.same_geometry(&RasterHeader { cellsize: 10.0, ..h }));
    }

    #[test]
    fn polyline_rejects_mismatched_lengths() {
        assert!(Polyline::new(vec![0.0, 1.0], vec![0.0]).is_err());
    }
}
