//! Lower convex hull construction
//!
//! Hull construction is a collaborator of the analyzer: anything
//! implementing [`HullBuilder`] can supply the facets. [`LowerHullBuilder`]
//! is a reference implementation for the small point sets of phase
//! diagrams (tens of entries, a handful of elements). It tests every
//! `dim`-subset of points as a candidate facet, so it is exhaustive and
//! deterministic but scales as `O(n^dim)`.

use ndarray::{Array1, Array2, s};

use crate::config::AnalyzerConfig;
use crate::linalg::{LuError, lu_solve};
use crate::{PhaseDiagramError, Result};

/// Supplies the lower-hull facets of a point set
pub trait HullBuilder {
    /// Compute lower-hull facets
    ///
    /// Each row of `points` is `[x_1, .., x_{dim-1}, energy]`: composition
    /// coordinates (first element's fraction dropped) followed by the
    /// energy per atom. Each returned facet lists `dim` row indices in
    /// ascending order. Must be deterministic for identical input.
    fn build_facets(&self, points: &Array2<f64>) -> Result<Vec<Vec<usize>>>;
}

impl<T: HullBuilder + ?Sized> HullBuilder for &T {
    fn build_facets(&self, points: &Array2<f64>) -> Result<Vec<Vec<usize>>> {
        (**self).build_facets(points)
    }
}

/// Exhaustive lower-hull builder
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LowerHullBuilder {
    /// Points this far below a candidate plane still count as on it
    pub tolerance: f64,
    /// Smallest acceptable LU pivot for the plane solve
    pub singular_threshold: f64,
}

impl Default for LowerHullBuilder {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

impl LowerHullBuilder {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            singular_threshold: config.singular_threshold,
        }
    }

    /// Plane `energy = a·x + b` through the candidate points, as `[a.., b]`
    ///
    /// Returns `None` when the candidate's composition simplex is degenerate.
    fn supporting_plane(&self, points: &Array2<f64>, facet: &[usize]) -> Result<Option<Array1<f64>>> {
        let dim = facet.len();
        let mut m = Array2::ones((dim, dim));
        let mut energies = Array1::zeros(dim);
        for (row, &idx) in facet.iter().enumerate() {
            m.slice_mut(s![row, ..dim - 1])
                .assign(&points.slice(s![idx, ..dim - 1]));
            energies[row] = points[[idx, dim - 1]];
        }
        match lu_solve(&m, &energies, self.singular_threshold) {
            Ok(plane) => Ok(Some(plane)),
            Err(LuError::SingularMatrix) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Signed height of a point above the plane (positive = above)
    fn height_above(plane: &Array1<f64>, point: ndarray::ArrayView1<f64>) -> f64 {
        let dim = point.len();
        let predicted = point
            .slice(s![..dim - 1])
            .dot(&plane.slice(s![..dim - 1]))
            + plane[dim - 1];
        point[dim - 1] - predicted
    }
}

impl HullBuilder for LowerHullBuilder {
    fn build_facets(&self, points: &Array2<f64>) -> Result<Vec<Vec<usize>>> {
        let n = points.nrows();
        let dim = points.ncols();
        if dim == 0 {
            return Err(PhaseDiagramError::EmptyElementSet);
        }
        if n < dim {
            return Err(PhaseDiagramError::InvalidFacet {
                reason: format!("{} points cannot span a {}-element hull", n, dim),
            });
        }

        if dim == 1 {
            let lowest = (0..n)
                .min_by(|&a, &b| points[[a, 0]].total_cmp(&points[[b, 0]]))
                .ok_or(PhaseDiagramError::EmptyElementSet)?;
            return Ok(vec![vec![lowest]]);
        }

        let mut facets = Vec::new();
        let mut degenerate = 0usize;
        for candidate in Combinations::new(n, dim) {
            let Some(plane) = self.supporting_plane(points, &candidate)? else {
                degenerate += 1;
                continue;
            };
            let supported = (0..n)
                .filter(|i| !candidate.contains(i))
                .all(|i| Self::height_above(&plane, points.row(i)) >= -self.tolerance);
            if supported {
                log::trace!("Lower hull facet {:?}", candidate);
                facets.push(candidate);
            }
        }

        log::debug!(
            "Lower hull over {} points in {} dimensions: {} facets ({} degenerate candidates)",
            n,
            dim,
            facets.len(),
            degenerate
        );

        if facets.is_empty() {
            return Err(PhaseDiagramError::InvalidFacet {
                reason: "points do not span a lower hull".to_string(),
            });
        }
        Ok(facets)
    }
}

/// Lexicographic k-combinations of `0..n`
struct Combinations {
    n: usize,
    indices: Vec<usize>,
    done: bool,
}

impl Combinations {
    fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            indices: (0..k).collect(),
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let current = self.indices.clone();

        let k = self.indices.len();
        // Rightmost index that can still move forward
        match (0..k).rev().find(|&i| self.indices[i] < self.n - k + i) {
            Some(i) => {
                self.indices[i] += 1;
                for j in (i + 1)..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
            }
            None => self.done = true,
        }

        Some(current)
    }
}
