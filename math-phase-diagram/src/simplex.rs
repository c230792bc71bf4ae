//! Simplex geometry
//!
//! A facet of an N-element phase diagram is a simplex of N points in the
//! (N-1)-dimensional composition space. Membership is decided from the
//! barycentric coordinates of the query point.

use ndarray::{Array1, Array2, ArrayView1, s};
use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::linalg::lu_solve;
use crate::{PhaseDiagramError, Result};

/// An ordered set of points, one per row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simplex {
    coords: Array2<f64>,
}

impl Simplex {
    pub fn new(coords: Array2<f64>) -> Self {
        Self { coords }
    }

    /// Build from a list of points of equal length
    pub fn from_points(points: &[Vec<f64>]) -> Result<Self> {
        let space_dim = points.first().map_or(0, Vec::len);
        let mut coords = Array2::zeros((points.len(), space_dim));
        for (i, p) in points.iter().enumerate() {
            if p.len() != space_dim {
                return Err(PhaseDiagramError::DimensionMismatch {
                    expected: space_dim,
                    got: p.len(),
                });
            }
            coords.row_mut(i).assign(&ArrayView1::from(p.as_slice()));
        }
        Ok(Self { coords })
    }

    pub fn coords(&self) -> &Array2<f64> {
        &self.coords
    }

    pub fn num_points(&self) -> usize {
        self.coords.nrows()
    }

    /// Dimension of the space the points live in
    pub fn space_dim(&self) -> usize {
        self.coords.ncols()
    }

    /// Barycentric coordinates of `point`
    ///
    /// Only defined for full-dimensional simplices (`space_dim + 1` points).
    pub fn bary_coords(&self, point: &Array1<f64>, singular_threshold: f64) -> Result<Array1<f64>> {
        let n = self.num_points();
        if n != self.space_dim() + 1 {
            return Err(PhaseDiagramError::DimensionMismatch {
                expected: self.space_dim() + 1,
                got: n,
            });
        }
        if point.len() != self.space_dim() {
            return Err(PhaseDiagramError::DimensionMismatch {
                expected: self.space_dim(),
                got: point.len(),
            });
        }

        // Row i of the transposed augmented matrix is coordinate i of every
        // vertex; the last row enforces that the weights sum to one.
        let mut aug_t = Array2::ones((n, n));
        aug_t
            .slice_mut(s![..n - 1, ..])
            .assign(&self.coords.t());
        let mut rhs = Array1::ones(n);
        rhs.slice_mut(s![..n - 1]).assign(point);

        Ok(lu_solve(&aug_t, &rhs, singular_threshold)?)
    }

    /// Whether `point` lies inside the simplex or within `config.tolerance`
    /// of its boundary
    pub fn in_simplex(&self, point: &Array1<f64>, config: &AnalyzerConfig) -> Result<bool> {
        let bary = self.bary_coords(point, config.singular_threshold)?;
        Ok(bary.iter().all(|&w| w >= -config.tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn triangle() -> Simplex {
        Simplex::new(array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]])
    }

    #[test]
    fn test_bary_coords() {
        let bary = triangle()
            .bary_coords(&array![0.25, 0.5], 1e-12)
            .unwrap();
        assert_relative_eq!(bary[0], 0.25, epsilon = 1e-12);
        assert_relative_eq!(bary[1], 0.25, epsilon = 1e-12);
        assert_relative_eq!(bary[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_in_simplex() {
        let config = AnalyzerConfig::default();
        let tri = triangle();
        assert!(tri.in_simplex(&array![0.2, 0.2], &config).unwrap());
        assert!(tri.in_simplex(&array![0.5, 0.5], &config).unwrap());
        assert!(tri.in_simplex(&array![0.0, 0.0], &config).unwrap());
        assert!(!tri.in_simplex(&array![0.6, 0.6], &config).unwrap());
        assert!(!tri.in_simplex(&array![-0.1, 0.5], &config).unwrap());
    }

    #[test]
    fn test_boundary_tolerance() {
        let config = AnalyzerConfig::default();
        let tri = triangle();
        // Slightly outside an edge, but within tolerance
        assert!(tri.in_simplex(&array![-1e-10, 0.5], &config).unwrap());
        assert!(!tri.in_simplex(&array![-1e-6, 0.5], &config).unwrap());
    }

    #[test]
    fn test_segment() {
        let config = AnalyzerConfig::default();
        let seg = Simplex::new(array![[0.0], [0.5]]);
        assert!(seg.in_simplex(&array![0.25], &config).unwrap());
        assert!(!seg.in_simplex(&array![0.75], &config).unwrap());
    }

    #[test]
    fn test_degenerate_is_singular() {
        let config = AnalyzerConfig::default();
        let flat = Simplex::new(array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert!(matches!(
            flat.in_simplex(&array![0.5, 0.5], &config),
            Err(PhaseDiagramError::SingularFacet)
        ));
    }

    #[test]
    fn test_dimension_checks() {
        let config = AnalyzerConfig::default();
        let line = Simplex::from_points(&[vec![0.0, 1.0], vec![1.0, 0.0]]).unwrap();
        assert_eq!(line.num_points(), 2);
        assert_eq!(line.space_dim(), 2);
        assert!(line.in_simplex(&array![0.5, 0.5], &config).is_err());

        assert!(triangle().in_simplex(&array![0.5], &config).is_err());
        assert!(Simplex::from_points(&[vec![0.0, 1.0], vec![1.0]]).is_err());
    }
}
