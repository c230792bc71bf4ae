//! Reaction balancing
//!
//! Balancing is a collaborator of the element-profile analysis. A
//! [`Reaction`] stores one coefficient per composition, negative for
//! reactants and positive for products, so that `Σ coeff · composition = 0`.

use ndarray::{Array1, Array2};
use std::collections::BTreeSet;
use std::fmt;

use crate::composition::{Composition, Element};
use crate::config::AnalyzerConfig;
use crate::linalg::{LuError, lu_solve};
use crate::{PhaseDiagramError, Result};

/// Finds coefficients that balance reactants against products
pub trait ReactionBalancer {
    fn balance(&self, reactants: &[Composition], products: &[Composition]) -> Result<Reaction>;
}

impl<T: ReactionBalancer + ?Sized> ReactionBalancer for &T {
    fn balance(&self, reactants: &[Composition], products: &[Composition]) -> Result<Reaction> {
        (**self).balance(reactants, products)
    }
}

/// A balanced reaction
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    reactants: Vec<Composition>,
    products: Vec<Composition>,
    coeffs: Vec<f64>,
}

impl Reaction {
    /// Assemble a reaction from explicit coefficients (reactants first)
    pub fn new(reactants: Vec<Composition>, products: Vec<Composition>, coeffs: Vec<f64>) -> Result<Self> {
        let expected = reactants.len() + products.len();
        if coeffs.len() != expected {
            return Err(PhaseDiagramError::DimensionMismatch {
                expected,
                got: coeffs.len(),
            });
        }
        Ok(Self {
            reactants,
            products,
            coeffs,
        })
    }

    pub fn reactants(&self) -> &[Composition] {
        &self.reactants
    }

    pub fn products(&self) -> &[Composition] {
        &self.products
    }

    /// Reactants followed by products
    pub fn all_comp(&self) -> impl Iterator<Item = &Composition> {
        self.reactants.iter().chain(self.products.iter())
    }

    /// Coefficients in [`Reaction::all_comp`] order
    pub fn coeffs(&self) -> &[f64] {
        &self.coeffs
    }

    /// Coefficient of a composition, if it takes part in the reaction
    pub fn coefficient(&self, comp: &Composition) -> Option<f64> {
        self.all_comp()
            .position(|c| c == comp)
            .map(|i| self.coeffs[i])
    }

    /// Scale all coefficients so that `comp` has unit amount
    pub fn normalize_to(self, comp: &Composition) -> Result<Self> {
        self.normalize_to_factor(comp, 1.0)
    }

    /// Scale all coefficients so that `comp` has amount `factor`
    pub fn normalize_to_factor(mut self, comp: &Composition, factor: f64) -> Result<Self> {
        let coeff = self
            .coefficient(comp)
            .ok_or_else(|| PhaseDiagramError::Unbalanceable {
                reason: format!("{} does not take part in the reaction", comp),
            })?;
        if coeff == 0.0 {
            return Err(PhaseDiagramError::Unbalanceable {
                reason: format!("{} has a zero coefficient", comp),
            });
        }
        let scale = (factor / coeff).abs();
        self.coeffs.iter_mut().for_each(|c| *c *= scale);
        Ok(self)
    }
}

impl fmt::Display for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |comps: &[Composition], coeffs: &[f64]| {
            comps
                .iter()
                .zip(coeffs)
                .map(|(comp, c)| {
                    let c = c.abs();
                    if (c - 1.0).abs() < 1e-8 {
                        comp.reduced_formula()
                    } else {
                        let text = format!("{:.4}", c);
                        format!(
                            "{} {}",
                            text.trim_end_matches('0').trim_end_matches('.'),
                            comp.formula()
                        )
                    }
                })
                .collect::<Vec<_>>()
                .join(" + ")
        };
        let n = self.reactants.len();
        write!(
            f,
            "{} -> {}",
            side(&self.reactants, &self.coeffs[..n]),
            side(&self.products, &self.coeffs[n..])
        )
    }
}

/// Balances by least squares with the first reactant fixed at one unit
///
/// The remaining coefficients solve the normal equations of the element
/// balance; a solution whose element residual exceeds `tolerance` is
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeastSquaresBalancer {
    pub tolerance: f64,
    pub singular_threshold: f64,
}

impl Default for LeastSquaresBalancer {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

impl LeastSquaresBalancer {
    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            singular_threshold: config.singular_threshold,
        }
    }
}

impl ReactionBalancer for LeastSquaresBalancer {
    fn balance(&self, reactants: &[Composition], products: &[Composition]) -> Result<Reaction> {
        let all: Vec<&Composition> = reactants.iter().chain(products).collect();
        let Some((first, others)) = all.split_first() else {
            return Err(PhaseDiagramError::Unbalanceable {
                reason: "reaction has no compositions".to_string(),
            });
        };
        if reactants.is_empty() || others.is_empty() {
            return Err(PhaseDiagramError::Unbalanceable {
                reason: "reaction needs a reactant and at least one other composition".to_string(),
            });
        }

        let elements: Vec<Element> = all
            .iter()
            .flat_map(|c| c.elements().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        // Columns are the amounts of every composition but the first
        let mut a = Array2::zeros((elements.len(), others.len()));
        for (col, comp) in others.iter().enumerate() {
            for (row, el) in elements.iter().enumerate() {
                a[[row, col]] = comp.amount(el);
            }
        }
        let b = Array1::from_iter(elements.iter().map(|el| first.amount(el)));

        let ata = a.t().dot(&a);
        let atb = a.t().dot(&b);
        let x = lu_solve(&ata, &atb, self.singular_threshold).map_err(|err| match err {
            LuError::SingularMatrix => PhaseDiagramError::Unbalanceable {
                reason: "compositions are linearly dependent".to_string(),
            },
            other => other.into(),
        })?;

        let residual = (&a.dot(&x) - &b)
            .iter()
            .fold(0.0_f64, |acc, r| acc.max(r.abs()));
        if residual > self.tolerance {
            return Err(PhaseDiagramError::Unbalanceable {
                reason: format!("element balance residual {:.3e}", residual),
            });
        }

        let mut coeffs = Vec::with_capacity(all.len());
        coeffs.push(-1.0);
        coeffs.extend(x.iter().copied());
        Reaction::new(reactants.to_vec(), products.to_vec(), coeffs)
    }
}
