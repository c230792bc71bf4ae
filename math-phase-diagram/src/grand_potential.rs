//! Grand-potential transform
//!
//! Fixing the chemical potential of some elements turns the energy of every
//! entry into a grand potential `E - Σ n_el μ_el` and removes those elements
//! from the compositional space. The transformed entries keep the id of the
//! entry they came from so results can be mapped back by lookup.

use std::collections::BTreeMap;
use std::fmt;

use crate::composition::{Composition, Element};
use crate::config::AnalyzerConfig;
use crate::entry::{EntryId, HullEntry};
use crate::hull::HullBuilder;
use crate::phase_diagram::PhaseDiagram;
use crate::{PhaseDiagramError, Result};

/// An entry re-expressed at fixed chemical potentials
#[derive(Debug, Clone)]
pub struct GrandPotentialEntry {
    id: EntryId,
    original_id: EntryId,
    original_name: String,
    composition: Composition,
    energy: f64,
    chempots: BTreeMap<Element, f64>,
}

impl GrandPotentialEntry {
    /// Transform `original` at the given fixed potentials
    ///
    /// Returns `None` when the original consists only of fixed elements,
    /// since nothing is left of its composition.
    pub fn new<E: HullEntry>(original: &E, chempots: &BTreeMap<Element, f64>) -> Option<Self> {
        let original_comp = original.composition();
        let composition = chempots
            .keys()
            .fold(original_comp.clone(), |comp, el| comp.without(el));
        if composition.is_empty() {
            return None;
        }
        let energy = original.energy()
            - chempots
                .iter()
                .map(|(el, mu)| original_comp.amount(el) * mu)
                .sum::<f64>();
        Some(Self {
            id: EntryId::next(),
            original_id: original.id(),
            original_name: original.name(),
            composition,
            energy,
            chempots: chempots.clone(),
        })
    }

    /// Id of the entry this one was derived from
    pub fn original_id(&self) -> EntryId {
        self.original_id
    }

    /// The fixed chemical potentials
    pub fn chempots(&self) -> &BTreeMap<Element, f64> {
        &self.chempots
    }
}

impl HullEntry for GrandPotentialEntry {
    fn id(&self) -> EntryId {
        self.id
    }

    fn composition(&self) -> &Composition {
        &self.composition
    }

    fn energy(&self) -> f64 {
        self.energy
    }

    fn name(&self) -> String {
        self.original_name.clone()
    }
}

impl fmt::Display for GrandPotentialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pots: Vec<String> = self
            .chempots
            .iter()
            .map(|(el, mu)| format!("u{} = {:.4}", el, mu))
            .collect();
        write!(
            f,
            "GrandPotentialEntry {} with {} and energy = {:.4}",
            self.original_name,
            pots.join(", "),
            self.energy
        )
    }
}

/// Build the grand-potential phase diagram of `entries` with the elements of
/// `chempots` held at fixed potential
pub fn to_grand_potential<'a, E, B>(
    entries: impl IntoIterator<Item = &'a E>,
    chempots: &BTreeMap<Element, f64>,
    elements: &[Element],
    builder: &B,
    config: &AnalyzerConfig,
) -> Result<PhaseDiagram<GrandPotentialEntry>>
where
    E: HullEntry + 'a,
    B: HullBuilder + ?Sized,
{
    let free_elements: Vec<Element> = elements
        .iter()
        .filter(|el| !chempots.contains_key(el))
        .copied()
        .collect();
    if free_elements.is_empty() {
        return Err(PhaseDiagramError::EmptyElementSet);
    }

    let gp_entries: Vec<GrandPotentialEntry> = entries
        .into_iter()
        .filter_map(|e| GrandPotentialEntry::new(e, chempots))
        .collect();

    PhaseDiagram::with_builder(gp_entries, &free_elements, builder, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::PdEntry;
    use crate::hull::LowerHullBuilder;
    use approx::assert_relative_eq;

    fn el(symbol: &str) -> Element {
        Element::from_symbol(symbol).unwrap()
    }

    fn entry(formula: &str, energy_per_atom: f64) -> PdEntry {
        PdEntry::from_energy_per_atom(Composition::from_formula(formula).unwrap(), energy_per_atom)
    }

    #[test]
    fn test_grand_potential_energy() {
        let li2o = entry("Li2O", -5.0);
        let chempots = BTreeMap::from([(el("O"), -6.0)]);
        let gp = GrandPotentialEntry::new(&li2o, &chempots).unwrap();

        assert_eq!(gp.composition().formula(), "Li2");
        // -15 - 1 * (-6)
        assert_relative_eq!(gp.energy(), -9.0, epsilon = 1e-12);
        assert_relative_eq!(gp.energy_per_atom(), -4.5, epsilon = 1e-12);
        assert_eq!(gp.original_id(), li2o.id());
        assert_eq!(gp.name(), "Li2O");
        assert_ne!(gp.id(), li2o.id());
    }

    #[test]
    fn test_pure_fixed_element_dropped() {
        let o2 = entry("O2", -4.0);
        let chempots = BTreeMap::from([(el("O"), -6.0)]);
        assert!(GrandPotentialEntry::new(&o2, &chempots).is_none());
    }

    #[test]
    fn test_grand_potential_diagram() {
        let entries = vec![
            entry("Li", -2.0),
            entry("O", -4.0),
            entry("Fe", -8.0),
            entry("Li2O", -5.0),
            entry("Fe2O3", -7.0),
        ];
        let elements = [el("Li"), el("Fe"), el("O")];
        let chempots = BTreeMap::from([(el("O"), -5.0)]);
        let config = AnalyzerConfig::default();

        let gpd = to_grand_potential(
            &entries,
            &chempots,
            &elements,
            &LowerHullBuilder::default(),
            &config,
        )
        .unwrap();

        assert_eq!(gpd.elements(), &[el("Li"), el("Fe")]);
        assert_eq!(gpd.dim(), 2);
        assert_eq!(gpd.all_entries().len(), 4);
    }

    #[test]
    fn test_all_elements_fixed() {
        let entries = vec![entry("O", -4.0)];
        let chempots = BTreeMap::from([(el("O"), -5.0)]);
        let result = to_grand_potential(
            &entries,
            &chempots,
            &[el("O")],
            &LowerHullBuilder::default(),
            &AnalyzerConfig::default(),
        );
        assert!(matches!(result, Err(PhaseDiagramError::EmptyElementSet)));
    }
}
