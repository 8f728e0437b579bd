use serde::{Deserialize, Serialize};

/// Row-major 2D container. Rows run along the path (`s`), columns across it (`l`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    pub data: Vec<T>,
    pub rows: usize,
    pub cols: usize,
}

/// A source raster projected onto the sampling grid. `None` marks samples that
/// were out of bounds or read no-data.
pub type ResampledField = Grid<Option<f64>>;

impl<T: Clone> Grid<T> {
    /// Create a `rows × cols` grid filled with `fill`.
    pub fn filled(rows: usize, cols: usize, fill: T) -> Self {
        Self { data: vec![fill; rows * cols], rows, cols }
    }
}

impl<T> Grid<T> {
    /// Wrap an existing row-major buffer. Returns `None` on a length mismatch.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == rows * cols).then_some(Self { data, rows, cols })
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, val: T) {
        self.data[row * self.cols + col] = val;
    }

    /// One cross-section.
    #[inline]
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Apply `f` to every cell, keeping the shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid<U> {
        Grid { data: self.data.iter().map(f).collect(), rows: self.rows, cols: self.cols }
    }
}
