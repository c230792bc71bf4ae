//! Phase Diagram Hull Analysis
//!
//! This library analyzes the lower convex hull of (composition, energy)
//! points, the thermodynamic "phase diagram" of a chemical system. Given a
//! hull it answers which phases a composition decomposes into, how far an
//! entry sits above the hull, the chemical potentials implied by each facet
//! and how a decomposition evolves as one element's potential is swept.
//!
//! Hull construction and reaction balancing are collaborators behind the
//! [`HullBuilder`] and [`ReactionBalancer`] traits; reference
//! implementations are provided.
//!
//! # Example
//! ```
//! use math_phase_diagram::{Composition, Element, PdAnalyzer, PdEntry, PhaseDiagram};
//!
//! let na = Element::from_symbol("Na").unwrap();
//! let cl = Element::from_symbol("Cl").unwrap();
//! let entries = vec![
//!     PdEntry::from_energy_per_atom(Composition::from_formula("Na").unwrap(), 0.0),
//!     PdEntry::from_energy_per_atom(Composition::from_formula("Cl").unwrap(), 0.0),
//!     PdEntry::from_energy_per_atom(Composition::from_formula("NaCl").unwrap(), -1.0),
//! ];
//!
//! let pd = PhaseDiagram::new(entries, &[na, cl]).unwrap();
//! let analyzer = PdAnalyzer::new(&pd);
//!
//! let metastable = PdEntry::from_energy_per_atom(Composition::from_formula("NaCl").unwrap(), -0.5);
//! let e_above_hull = analyzer.get_e_above_hull(&metastable).unwrap();
//! assert!((e_above_hull - 0.5).abs() < 1e-10);
//! ```

mod analyzer;
mod composition;
mod config;
mod entry;
mod error;
mod grand_potential;
mod hull;
mod linalg;
mod phase_diagram;
mod reaction;
mod simplex;

// Fixture systems shared by unit and integration tests
pub mod testdata;

pub use analyzer::{ChempotRange, ChempotRangeMap, Decomposition, ElementProfileStep, PdAnalyzer};
pub use composition::{Composition, Element};
pub use config::AnalyzerConfig;
pub use entry::{EntryId, HullEntry, PdEntry};
pub use error::{PhaseDiagramError, Result};
pub use grand_potential::{GrandPotentialEntry, to_grand_potential};
pub use hull::{HullBuilder, LowerHullBuilder};
pub use linalg::{LuError, LuFactorization, lu_factorize, lu_solve};
pub use phase_diagram::PhaseDiagram;
pub use reaction::{LeastSquaresBalancer, Reaction, ReactionBalancer};
pub use simplex::Simplex;

/// Default numerical tolerance
///
/// Shared by simplex membership, decomposition pruning and the
/// de-duplication of transition chemical potentials.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;
