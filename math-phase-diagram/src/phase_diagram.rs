//! Phase diagram: the lower convex hull of (composition, energy) points
//!
//! A [`PhaseDiagram`] is immutable once built. It can be computed from a
//! list of entries with a [`HullBuilder`], or assembled from facets that
//! were computed elsewhere.

use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet};

use crate::composition::Element;
use crate::config::AnalyzerConfig;
use crate::entry::{EntryId, HullEntry};
use crate::hull::{HullBuilder, LowerHullBuilder};
use crate::{PhaseDiagramError, Result};

/// A phase diagram over a fixed, ordered set of elements
#[derive(Debug, Clone)]
pub struct PhaseDiagram<E: HullEntry> {
    elements: Vec<Element>,
    all_entries: Vec<E>,
    qhull_entries: Vec<E>,
    /// One row per hull entry: fractions of elements[1..], then energy per atom
    qhull_data: Array2<f64>,
    facets: Vec<Vec<usize>>,
    stable_indices: Vec<usize>,
    el_refs: BTreeMap<Element, E>,
}

impl<E: HullEntry> PhaseDiagram<E> {
    /// Build a phase diagram with the reference lower-hull builder and
    /// default thresholds
    pub fn new(entries: Vec<E>, elements: &[Element]) -> Result<Self> {
        let config = AnalyzerConfig::default();
        Self::with_builder(entries, elements, &LowerHullBuilder::from_config(&config), &config)
    }

    /// Build a phase diagram, delegating facet computation to `builder`
    ///
    /// Only entries with a formation energy below
    /// `-config.formation_energy_tol` and the elemental references are
    /// handed to the builder; everything else is above the hull already.
    pub fn with_builder<B: HullBuilder + ?Sized>(
        entries: Vec<E>,
        elements: &[Element],
        builder: &B,
        config: &AnalyzerConfig,
    ) -> Result<Self> {
        config.validate()?;
        let all_entries = filter_entries(entries, elements)?;
        let el_refs = find_element_references(&all_entries, elements)?;

        let ref_ids: BTreeSet<EntryId> = el_refs.values().map(|e| e.id()).collect();
        let qhull_entries: Vec<E> = all_entries
            .iter()
            .filter(|e| {
                ref_ids.contains(&e.id())
                    || formation_energy_per_atom(*e, &el_refs) < -config.formation_energy_tol
            })
            .cloned()
            .collect();

        let qhull_data = hull_coordinates(&qhull_entries, elements);
        let facets = builder.build_facets(&qhull_data)?;

        log::debug!(
            "Phase diagram {:?}: {} entries, {} hull candidates, {} facets",
            elements.iter().map(Element::symbol).collect::<Vec<_>>(),
            all_entries.len(),
            qhull_entries.len(),
            facets.len()
        );

        Self::assemble(elements, all_entries, qhull_entries, qhull_data, facets, el_refs)
    }

    /// Assemble a phase diagram from facets computed elsewhere
    ///
    /// `facets` index into `entries`, which become the hull entries.
    pub fn from_facets(entries: Vec<E>, elements: &[Element], facets: Vec<Vec<usize>>) -> Result<Self> {
        let all_entries = filter_entries(entries, elements)?;
        let el_refs = find_element_references(&all_entries, elements)?;
        let qhull_data = hull_coordinates(&all_entries, elements);
        Self::assemble(
            elements,
            all_entries.clone(),
            all_entries,
            qhull_data,
            facets,
            el_refs,
        )
    }

    fn assemble(
        elements: &[Element],
        all_entries: Vec<E>,
        qhull_entries: Vec<E>,
        qhull_data: Array2<f64>,
        facets: Vec<Vec<usize>>,
        el_refs: BTreeMap<Element, E>,
    ) -> Result<Self> {
        let dim = elements.len();
        for facet in &facets {
            if facet.len() != dim {
                return Err(PhaseDiagramError::InvalidFacet {
                    reason: format!("facet {:?} has {} vertices, expected {}", facet, facet.len(), dim),
                });
            }
            if let Some(&bad) = facet.iter().find(|&&i| i >= qhull_entries.len()) {
                return Err(PhaseDiagramError::InvalidFacet {
                    reason: format!(
                        "facet {:?} references entry {} of {}",
                        facet,
                        bad,
                        qhull_entries.len()
                    ),
                });
            }
        }

        let stable_indices: Vec<usize> = facets
            .iter()
            .flatten()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self {
            elements: elements.to_vec(),
            all_entries,
            qhull_entries,
            qhull_data,
            facets,
            stable_indices,
            el_refs,
        })
    }

    /// Number of elements
    pub fn dim(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn all_entries(&self) -> &[E] {
        &self.all_entries
    }

    /// Entries the facets index into
    pub fn qhull_entries(&self) -> &[E] {
        &self.qhull_entries
    }

    /// Hull coordinates, one row per hull entry
    pub fn qhull_data(&self) -> &Array2<f64> {
        &self.qhull_data
    }

    pub fn facets(&self) -> &[Vec<usize>] {
        &self.facets
    }

    /// Entries on the hull, in hull order
    pub fn stable_entries(&self) -> impl Iterator<Item = &E> {
        self.stable_indices.iter().map(|&i| &self.qhull_entries[i])
    }

    /// Entries above the hull
    pub fn unstable_entries(&self) -> impl Iterator<Item = &E> {
        self.all_entries.iter().filter(|e| !self.is_stable(*e))
    }

    pub fn is_stable(&self, entry: &E) -> bool {
        let id = entry.id();
        self.stable_indices
            .iter()
            .any(|&i| self.qhull_entries[i].id() == id)
    }

    /// Lowest-energy pure entry for every element
    pub fn el_refs(&self) -> &BTreeMap<Element, E> {
        &self.el_refs
    }

    pub fn el_ref(&self, el: &Element) -> Result<&E> {
        self.el_refs
            .get(el)
            .ok_or_else(|| PhaseDiagramError::UnknownElement {
                element: el.symbol().to_string(),
            })
    }

    /// Look an entry up by id among all entries
    pub fn entry_by_id(&self, id: EntryId) -> Option<&E> {
        self.all_entries.iter().find(|e| e.id() == id)
    }

    /// Formation energy of an entry relative to the elemental references
    pub fn get_form_energy(&self, entry: &E) -> f64 {
        let comp = entry.composition();
        entry.energy()
            - comp
                .iter()
                .map(|(el, amount)| {
                    amount * self.el_refs.get(el).map_or(0.0, |r| r.energy_per_atom())
                })
                .sum::<f64>()
    }

    pub fn get_form_energy_per_atom(&self, entry: &E) -> f64 {
        self.get_form_energy(entry) / entry.composition().num_atoms()
    }
}

/// Keep entries made only of diagram elements
fn filter_entries<E: HullEntry>(entries: Vec<E>, elements: &[Element]) -> Result<Vec<E>> {
    if elements.is_empty() {
        return Err(PhaseDiagramError::EmptyElementSet);
    }
    let total = entries.len();
    let kept: Vec<E> = entries
        .into_iter()
        .filter(|e| {
            let comp = e.composition();
            !comp.is_empty() && comp.elements().all(|el| elements.contains(el))
        })
        .collect();
    if kept.len() < total {
        log::debug!(
            "Ignoring {} entries outside the phase diagram elements",
            total - kept.len()
        );
    }
    Ok(kept)
}

fn find_element_references<E: HullEntry>(
    entries: &[E],
    elements: &[Element],
) -> Result<BTreeMap<Element, E>> {
    let mut el_refs = BTreeMap::new();
    for el in elements {
        let reference = entries
            .iter()
            .filter(|e| e.composition().is_element() && e.composition().contains(el))
            .min_by(|a, b| a.energy_per_atom().total_cmp(&b.energy_per_atom()))
            .ok_or_else(|| PhaseDiagramError::MissingElementReference {
                element: el.symbol().to_string(),
            })?;
        el_refs.insert(*el, reference.clone());
    }
    Ok(el_refs)
}

fn formation_energy_per_atom<E: HullEntry>(entry: &E, el_refs: &BTreeMap<Element, E>) -> f64 {
    let comp = entry.composition();
    entry.energy_per_atom()
        - comp
            .elements()
            .map(|el| {
                comp.get_atomic_fraction(el) * el_refs.get(el).map_or(0.0, |r| r.energy_per_atom())
            })
            .sum::<f64>()
}

fn hull_coordinates<E: HullEntry>(entries: &[E], elements: &[Element]) -> Array2<f64> {
    let dim = elements.len();
    let mut data = Array2::zeros((entries.len(), dim));
    for (row, entry) in entries.iter().enumerate() {
        let comp = entry.composition();
        for (col, el) in elements.iter().skip(1).enumerate() {
            data[[row, col]] = comp.get_atomic_fraction(el);
        }
        data[[row, dim - 1]] = entry.energy_per_atom();
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::Composition;
    use crate::entry::PdEntry;
    use approx::assert_relative_eq;

    fn el(symbol: &str) -> Element {
        Element::from_symbol(symbol).unwrap()
    }

    fn entry(formula: &str, energy_per_atom: f64) -> PdEntry {
        PdEntry::from_energy_per_atom(Composition::from_formula(formula).unwrap(), energy_per_atom)
    }

    #[test]
    fn test_binary_stable_set() {
        let entries = vec![
            entry("Li", -2.0),
            entry("O", -4.0),
            entry("Li2O", -5.0),
            entry("LiO", -3.0),
            entry("Li", -1.5),
        ];
        let pd = PhaseDiagram::new(entries, &[el("Li"), el("O")]).unwrap();

        let stable: Vec<String> = pd.stable_entries().map(|e| e.name()).collect();
        assert_eq!(stable, vec!["Li", "O", "Li2O"]);
        assert_eq!(pd.unstable_entries().count(), 2);
        assert_relative_eq!(pd.el_ref(&el("Li")).unwrap().energy_per_atom(), -2.0);
        assert_eq!(pd.facets().len(), 2);
        assert_eq!(pd.qhull_data().ncols(), 2);
    }

    #[test]
    fn test_formation_energy() {
        let entries = vec![entry("Li", -2.0), entry("O", -4.0), entry("Li2O", -5.0)];
        let pd = PhaseDiagram::new(entries.clone(), &[el("Li"), el("O")]).unwrap();
        // 3 * -5 - (2 * -2 + 1 * -4)
        assert_relative_eq!(pd.get_form_energy(&entries[2]), -7.0, epsilon = 1e-12);
        assert_relative_eq!(pd.get_form_energy_per_atom(&entries[2]), -7.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_missing_reference() {
        let entries = vec![entry("Li", -2.0), entry("Li2O", -5.0)];
        let result = PhaseDiagram::new(entries, &[el("Li"), el("O")]);
        assert!(matches!(
            result,
            Err(PhaseDiagramError::MissingElementReference { .. })
        ));
    }

    #[test]
    fn test_empty_elements() {
        let result = PhaseDiagram::new(vec![entry("Li", -2.0)], &[]);
        assert!(matches!(result, Err(PhaseDiagramError::EmptyElementSet)));
    }

    #[test]
    fn test_foreign_entries_ignored() {
        let entries = vec![entry("Li", -2.0), entry("O", -4.0), entry("Fe2O3", -7.0)];
        let pd = PhaseDiagram::new(entries, &[el("Li"), el("O")]).unwrap();
        assert_eq!(pd.all_entries().len(), 2);
    }

    #[test]
    fn test_from_facets_validates() {
        let entries = vec![entry("Li", -2.0), entry("O", -4.0), entry("Li2O", -5.0)];
        let elements = [el("Li"), el("O")];

        let pd = PhaseDiagram::from_facets(entries.clone(), &elements, vec![vec![0, 2], vec![1, 2]])
            .unwrap();
        assert_eq!(pd.stable_entries().count(), 3);

        let result = PhaseDiagram::from_facets(entries.clone(), &elements, vec![vec![0, 1, 2]]);
        assert!(matches!(result, Err(PhaseDiagramError::InvalidFacet { .. })));

        let result = PhaseDiagram::from_facets(entries, &elements, vec![vec![0, 7]]);
        assert!(matches!(result, Err(PhaseDiagramError::InvalidFacet { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let entries = vec![entry("Li", -2.0), entry("O", -4.0)];
        let config = AnalyzerConfig::default().with_tolerance(-1.0);
        let result = PhaseDiagram::with_builder(
            entries,
            &[el("Li"), el("O")],
            &LowerHullBuilder::default(),
            &config,
        );
        assert!(matches!(result, Err(PhaseDiagramError::InvalidConfig { .. })));
    }
}
