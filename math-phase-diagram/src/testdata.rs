//! Fixture systems for phase diagram tests
//!
//! Small hand-built systems with known hulls, plus a seeded generator of
//! random ternary systems for property tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::Result;
use crate::composition::{Composition, Element};
use crate::entry::PdEntry;

fn elements(symbols: &[&str]) -> Result<Vec<Element>> {
    symbols.iter().map(|s| Element::from_symbol(s)).collect()
}

fn entries(data: &[(&str, f64)]) -> Result<Vec<PdEntry>> {
    data.iter()
        .map(|&(formula, e)| Ok(PdEntry::from_energy_per_atom(Composition::from_formula(formula)?, e)))
        .collect()
}

/// Na-Cl binary
///
/// Na and Cl at 0 eV/atom, NaCl at -1 eV/atom on the hull and NaCl2 at
/// -0.5 eV/atom, 1/6 eV/atom above it. Hull facets: Na-NaCl and Cl-NaCl.
pub fn binary_system() -> Result<(Vec<Element>, Vec<PdEntry>)> {
    Ok((
        elements(&["Na", "Cl"])?,
        entries(&[("Na", 0.0), ("Cl", 0.0), ("NaCl", -1.0), ("NaCl2", -0.5)])?,
    ))
}

/// Li-Fe-O ternary
///
/// Stable: Li, Fe, O, Li2O, Fe2O3 and LiFeO2 (which sits on the Li2O-Fe2O3
/// tie line). Above the hull: Li2O2 (0.825), FeO (73/60) and a second Li
/// polymorph (0.2), all in eV/atom.
pub fn ternary_system() -> Result<(Vec<Element>, Vec<PdEntry>)> {
    Ok((
        elements(&["Li", "Fe", "O"])?,
        entries(&[
            ("Li", -1.9),
            ("Fe", -8.3),
            ("O", -4.9),
            ("Li2O", -4.8),
            ("Fe2O3", -7.0),
            ("LiFeO2", -6.4),
            ("Li2O2", -4.0),
            ("FeO", -6.0),
            ("Li", -1.7),
        ])?,
    ))
}

/// Random Li-Fe-O system with `n_compounds` compounds
///
/// Elemental references get energies in [-5, -1) eV/atom. Compounds have
/// integral amounts in 1..=4 of two or three elements and a formation
/// energy in [-1, 0.3) eV/atom, so roughly a quarter lie above the
/// reference plane.
pub fn random_ternary_system(seed: u64, n_compounds: usize) -> Result<(Vec<Element>, Vec<PdEntry>)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let elements = elements(&["Li", "Fe", "O"])?;

    let ref_energies: Vec<f64> = elements
        .iter()
        .map(|_| rng.random_range(-5.0..-1.0))
        .collect();

    let mut entries = Vec::with_capacity(elements.len() + n_compounds);
    for (el, &e) in elements.iter().zip(&ref_energies) {
        entries.push(PdEntry::from_energy_per_atom(Composition::new([(*el, 1.0)])?, e));
    }

    while entries.len() < elements.len() + n_compounds {
        let amounts: Vec<f64> = elements
            .iter()
            .map(|_| rng.random_range(0..=4) as f64)
            .collect();
        let comp = Composition::new(elements.iter().copied().zip(amounts.iter().copied()))?;
        if comp.elements().count() < 2 {
            continue;
        }

        let reference: f64 = elements
            .iter()
            .zip(&ref_energies)
            .map(|(el, e)| comp.get_atomic_fraction(el) * e)
            .sum();
        let formation = rng.random_range(-1.0..0.3);
        entries.push(PdEntry::from_energy_per_atom(comp, reference + formation));
    }

    Ok((elements, entries))
}
