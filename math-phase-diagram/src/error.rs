//! Error types for phase diagram construction and analysis.
//!
//! A single `thiserror` enum covers the whole crate. Variants are grouped by
//! the helper predicates below: malformed hull data, bad caller input, and
//! failures reported by a collaborator (hull rebuild, reaction balancing).

use thiserror::Error;

use crate::linalg::LuError;

/// Errors that can occur while building or analyzing a phase diagram.
#[derive(Debug, Error)]
pub enum PhaseDiagramError {
    /// No facet of the hull contains the composition.
    #[error("no facet found for composition {composition}")]
    NoFacetFound {
        /// Formula of the composition that was looked up
        composition: String,
    },

    /// A facet (or simplex) matrix could not be inverted.
    #[error("facet matrix is singular or nearly singular")]
    SingularFacet,

    /// Equilibrium reaction energy was requested for an unstable entry.
    #[error("equilibrium reaction energy is only available for stable entries, {entry} is not stable")]
    NotStable {
        /// Name of the offending entry
        entry: String,
    },

    /// The element is not part of the phase diagram.
    #[error("element {element} is not in the phase diagram")]
    UnknownElement {
        /// Symbol of the missing element
        element: String,
    },

    /// The symbol does not name a known element.
    #[error("unknown element symbol: {symbol}")]
    UnknownSymbol {
        /// The unrecognized symbol
        symbol: String,
    },

    /// A formula string could not be parsed.
    #[error("invalid formula: {formula}")]
    InvalidFormula {
        /// The formula as given
        formula: String,
    },

    /// A composition amount was negative.
    #[error("negative amount {amount} for element {element}")]
    NegativeAmount {
        /// Element symbol
        element: String,
        /// The negative amount
        amount: f64,
    },

    /// No pure-element entry exists for one of the diagram elements.
    #[error("missing terminal entry for element {element}")]
    MissingElementReference {
        /// Element without a reference entry
        element: String,
    },

    /// A hull was requested over an empty element set.
    #[error("phase diagram needs at least one element")]
    EmptyElementSet,

    /// A facet breaks the size or index invariants.
    #[error("invalid facet: {reason}")]
    InvalidFacet {
        /// What is wrong with the facet
        reason: String,
    },

    /// Vector or matrix dimensions do not agree.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Expected dimension
        expected: usize,
        /// Actual dimension
        got: usize,
    },

    /// The reaction balancer could not find coefficients.
    #[error("reaction cannot be balanced: {reason}")]
    Unbalanceable {
        /// Why balancing failed
        reason: String,
    },

    /// An analyzer configuration value is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Which value is invalid
        reason: String,
    },

    /// A collaborator call failed while serving a query.
    #[error("{context}: {source}")]
    Collaborator {
        /// The entry or element that triggered the call
        context: String,
        /// The underlying failure
        #[source]
        source: Box<PhaseDiagramError>,
    },
}

/// A specialized `Result` type for phase diagram operations.
pub type Result<T> = std::result::Result<T, PhaseDiagramError>;

impl PhaseDiagramError {
    /// Wrap a collaborator failure with the entry or element that caused it.
    pub fn collaborator(context: impl Into<String>, source: PhaseDiagramError) -> Self {
        PhaseDiagramError::Collaborator {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Returns `true` if the error points at malformed or degenerate hull data.
    pub fn is_hull_error(&self) -> bool {
        matches!(
            self,
            PhaseDiagramError::NoFacetFound { .. }
                | PhaseDiagramError::SingularFacet
                | PhaseDiagramError::InvalidFacet { .. }
                | PhaseDiagramError::MissingElementReference { .. }
                | PhaseDiagramError::EmptyElementSet
        )
    }

    /// Returns `true` if the caller supplied invalid input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PhaseDiagramError::UnknownElement { .. }
                | PhaseDiagramError::UnknownSymbol { .. }
                | PhaseDiagramError::InvalidFormula { .. }
                | PhaseDiagramError::NegativeAmount { .. }
                | PhaseDiagramError::DimensionMismatch { .. }
                | PhaseDiagramError::NotStable { .. }
                | PhaseDiagramError::InvalidConfig { .. }
        )
    }

    /// Returns `true` if a collaborator (hull builder, balancer) failed.
    pub fn is_collaborator_error(&self) -> bool {
        matches!(self, PhaseDiagramError::Collaborator { .. })
    }
}

impl From<LuError> for PhaseDiagramError {
    fn from(err: LuError) -> Self {
        match err {
            LuError::SingularMatrix => PhaseDiagramError::SingularFacet,
            LuError::DimensionMismatch { expected, got } => {
                PhaseDiagramError::DimensionMismatch { expected, got }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PhaseDiagramError::NoFacetFound {
            composition: "Li2O".to_string(),
        };
        assert_eq!(err.to_string(), "no facet found for composition Li2O");
    }

    #[test]
    fn test_collaborator_display_keeps_context() {
        let err = PhaseDiagramError::collaborator(
            "rebuilding hull without Li2O",
            PhaseDiagramError::MissingElementReference {
                element: "Li".to_string(),
            },
        );
        assert_eq!(
            err.to_string(),
            "rebuilding hull without Li2O: missing terminal entry for element Li"
        );
        assert!(err.is_collaborator_error());
        assert!(!err.is_hull_error());
    }

    #[test]
    fn test_categories() {
        let hull_err = PhaseDiagramError::SingularFacet;
        let input_err = PhaseDiagramError::UnknownElement {
            element: "Xe".to_string(),
        };

        assert!(hull_err.is_hull_error());
        assert!(!hull_err.is_input_error());
        assert!(input_err.is_input_error());
        assert!(!input_err.is_hull_error());
    }

    #[test]
    fn test_from_lu_error() {
        let err: PhaseDiagramError = LuError::SingularMatrix.into();
        assert!(matches!(err, PhaseDiagramError::SingularFacet));

        let err: PhaseDiagramError = LuError::DimensionMismatch {
            expected: 3,
            got: 2,
        }
        .into();
        assert!(matches!(
            err,
            PhaseDiagramError::DimensionMismatch {
                expected: 3,
                got: 2
            }
        ));
    }
}
