//! Analyzer configuration

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_TOLERANCE, PhaseDiagramError, Result};

/// Numerical thresholds shared by every analyzer query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Tolerance for facet membership, potential dedupe and amount pruning
    pub tolerance: f64,
    /// Offset below each transition potential when sampling the element profile
    pub chempot_offset: f64,
    /// Minimum amount for a phase to count as part of a profile decomposition
    pub decomposition_cutoff: f64,
    /// Smallest acceptable LU pivot
    pub singular_threshold: f64,
    /// Formation energy (eV/atom) an entry must undercut to be a hull candidate
    pub formation_energy_tol: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            chempot_offset: 0.01,
            decomposition_cutoff: 1e-5,
            singular_threshold: 1e-12,
            formation_energy_tol: 1e-11,
        }
    }
}

impl AnalyzerConfig {
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_chempot_offset(mut self, offset: f64) -> Self {
        self.chempot_offset = offset;
        self
    }

    pub fn with_decomposition_cutoff(mut self, cutoff: f64) -> Self {
        self.decomposition_cutoff = cutoff;
        self
    }

    pub fn with_singular_threshold(mut self, threshold: f64) -> Self {
        self.singular_threshold = threshold;
        self
    }

    pub fn with_formation_energy_tol(mut self, tol: f64) -> Self {
        self.formation_energy_tol = tol;
        self
    }

    /// Check that every threshold is finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        let values = [
            ("tolerance", self.tolerance),
            ("chempot_offset", self.chempot_offset),
            ("decomposition_cutoff", self.decomposition_cutoff),
            ("singular_threshold", self.singular_threshold),
            ("formation_energy_tol", self.formation_energy_tol),
        ];
        for (name, value) in values {
            if !value.is_finite() || value <= 0.0 {
                return Err(PhaseDiagramError::InvalidConfig {
                    reason: format!("{} must be finite and > 0, got {}", name, value),
                });
            }
        }
        Ok(())
    }
}
