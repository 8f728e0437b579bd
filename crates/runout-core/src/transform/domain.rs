//! Domain boundary: the path offset by ±w/2 along its local normal.
//!
//! Tangent at vertex i:
//!   first  → p[1] − p[0]
//!   middle → (p[i+1] − p[i−1]) / 2
//!   last   → p[n−1] − p[n−2]
//! The normal is the unit tangent rotated +90°; `left` lies on the normal side.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::raster::Polyline;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainBoundary {
    pub left: Polyline,
    pub right: Polyline,
}

impl DomainBoundary {
    /// Number of vertices on each edge.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }
}

/// Unit normal at every vertex of `path`.
pub(crate) fn vertex_normals(path: &Polyline) -> Result<Vec<(f64, f64)>> {
    let n = path.len();
    if n < 2 {
        return Err(AnalysisError::shape("path", format!("{n} vertices, at least 2 required")));
    }
    for i in 0..n - 1 {
        let len = (path.x[i + 1] - path.x[i]).hypot(path.y[i + 1] - path.y[i]);
        if !(len > 0.0) {
            return Err(AnalysisError::geometry(format!(
                "zero-length path segment between vertices {i} and {}",
                i + 1
            )));
        }
    }

    (0..n)
        .map(|i| {
            let (dx, dy) = if i == 0 {
                (path.x[1] - path.x[0], path.y[1] - path.y[0])
            } else if i == n - 1 {
                (path.x[n - 1] - path.x[n - 2], path.y[n - 1] - path.y[n - 2])
            } else {
                ((path.x[i + 1] - path.x[i - 1]) / 2.0, (path.y[i + 1] - path.y[i - 1]) / 2.0)
            };
            let len = dx.hypot(dy);
            if !(len > 0.0) {
                return Err(AnalysisError::geometry(format!(
                    "path folds back on itself at vertex {i}, tangent is undefined"
                )));
            }
            Ok((-dy / len, dx / len))
        })
        .collect()
}

/// Build the left/right edges of a domain of total width `width` around `path`.
pub fn path_to_domain(path: &Polyline, width: f64) -> Result<DomainBoundary> {
    let normals = vertex_normals(path)?;
    let half = width / 2.0;

    let mut left =
        Polyline { x: Vec::with_capacity(path.len()), y: Vec::with_capacity(path.len()) };
    let mut right = left.clone();
    for (i, &(nx, ny)) in normals.iter().enumerate() {
        left.x.push(path.x[i] + half * nx);
        left.y.push(path.y[i] + half * ny);
        right.x.push(path.x[i] - half * nx);
        right.y.push(path.y[i] - half * ny);
    }
    Ok(DomainBoundary { left, right })
}
