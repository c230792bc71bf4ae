//! Phase diagram analysis
//!
//! [`PdAnalyzer`] answers stability questions against a fixed
//! [`PhaseDiagram`]:
//!
//! - which facet contains a composition and how it decomposes,
//! - energy above hull and equilibrium reaction energy,
//! - chemical potentials per facet and the transition potentials of an element,
//! - how a composition's decomposition evolves as one potential is lowered,
//! - the chemical-potential range of every stable entry.
//!
//! The diagram is never mutated. Queries that need another hull (the diagram
//! without one entry, or a grand-potential diagram) rebuild it through the
//! analyzer's [`HullBuilder`].

use ndarray::{Array1, Array2, s};
use std::collections::{BTreeMap, BTreeSet};

use crate::composition::{Composition, Element};
use crate::config::AnalyzerConfig;
use crate::entry::{EntryId, HullEntry};
use crate::grand_potential::to_grand_potential;
use crate::hull::{HullBuilder, LowerHullBuilder};
use crate::linalg::lu_solve;
use crate::phase_diagram::PhaseDiagram;
use crate::reaction::{LeastSquaresBalancer, Reaction, ReactionBalancer};
use crate::simplex::Simplex;
use crate::{PhaseDiagramError, Result};

/// Amounts of hull entries that reproduce a composition
#[derive(Debug, Clone)]
pub struct Decomposition<E: HullEntry> {
    entries: Vec<(E, f64)>,
}

impl<E: HullEntry> Decomposition<E> {
    /// (entry, amount) pairs in facet vertex order
    pub fn iter(&self) -> impl Iterator<Item = (&E, f64)> {
        self.entries.iter().map(|(e, amount)| (e, *amount))
    }

    pub fn entries(&self) -> impl Iterator<Item = &E> {
        self.entries.iter().map(|(e, _)| e)
    }

    pub fn amount(&self, id: EntryId) -> Option<f64> {
        self.entries
            .iter()
            .find(|(e, _)| e.id() == id)
            .map(|(_, amount)| *amount)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.amount(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all amounts (1 for a composition inside the hull)
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, amount)| amount).sum()
    }
}

/// One change of decomposition along an element profile
#[derive(Debug, Clone)]
pub struct ElementProfileStep<E: HullEntry> {
    /// Transition potential at which the decomposition changes
    pub chempot: f64,
    /// Negated reaction coefficient of the element: negative when the
    /// composition releases it, positive when it takes it up
    pub evolution: f64,
    /// Pure-element reference entry of the swept element
    pub element_reference: E,
    /// Composition -> element + phases, normalized to one unit of composition
    pub reaction: Reaction,
    /// Phases the composition decomposes into below this potential
    pub entries: Vec<E>,
}

/// Boundaries of one stable entry's region in chemical-potential space
#[derive(Debug, Clone)]
pub struct ChempotRange<E: HullEntry> {
    pub entry: E,
    /// Each boundary joins the potentials of two adjacent facets
    pub boundaries: Vec<Simplex>,
}

/// Stable entries keyed by id with their chemical-potential boundaries
pub type ChempotRangeMap<E> = BTreeMap<EntryId, ChempotRange<E>>;

/// Analyzer over a borrowed phase diagram
#[derive(Debug, Clone)]
pub struct PdAnalyzer<'a, E, B = LowerHullBuilder, R = LeastSquaresBalancer>
where
    E: HullEntry,
{
    pd: &'a PhaseDiagram<E>,
    config: AnalyzerConfig,
    builder: B,
    balancer: R,
}

impl<'a, E: HullEntry> PdAnalyzer<'a, E> {
    /// Analyzer with default thresholds and the reference collaborators
    pub fn new(pd: &'a PhaseDiagram<E>) -> Self {
        Self::with_config(pd, AnalyzerConfig::default())
    }

    pub fn with_config(pd: &'a PhaseDiagram<E>, config: AnalyzerConfig) -> Self {
        Self {
            pd,
            config,
            builder: LowerHullBuilder::from_config(&config),
            balancer: LeastSquaresBalancer::from_config(&config),
        }
    }
}

impl<'a, E, B, R> PdAnalyzer<'a, E, B, R>
where
    E: HullEntry,
    B: HullBuilder,
    R: ReactionBalancer,
{
    /// Analyzer with caller-supplied hull builder and reaction balancer
    pub fn with_collaborators(pd: &'a PhaseDiagram<E>, config: AnalyzerConfig, builder: B, balancer: R) -> Self {
        Self {
            pd,
            config,
            builder,
            balancer,
        }
    }

    pub fn phase_diagram(&self) -> &'a PhaseDiagram<E> {
        self.pd
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn require_element(&self, element: &Element) -> Result<()> {
        if self.pd.elements().contains(element) {
            Ok(())
        } else {
            Err(PhaseDiagramError::UnknownElement {
                element: element.symbol().to_string(),
            })
        }
    }

    /// Fraction matrix, one row per composition, over the diagram elements
    fn make_comp_matrix<'c>(&self, comps: impl ExactSizeIterator<Item = &'c Composition>) -> Array2<f64> {
        let elements = self.pd.elements();
        let mut m = Array2::zeros((comps.len(), elements.len()));
        for (row, comp) in comps.enumerate() {
            m.row_mut(row).assign(&comp.fractions(elements));
        }
        m
    }

    fn facet_entries(&self, facet: &[usize]) -> Result<Vec<&'a E>> {
        let qhull_entries = self.pd.qhull_entries();
        if facet.len() != self.pd.dim() {
            return Err(PhaseDiagramError::InvalidFacet {
                reason: format!("facet {:?} has {} vertices, expected {}", facet, facet.len(), self.pd.dim()),
            });
        }
        facet
            .iter()
            .map(|&i| {
                qhull_entries.get(i).ok_or_else(|| PhaseDiagramError::InvalidFacet {
                    reason: format!("facet {:?} references entry {} of {}", facet, i, qhull_entries.len()),
                })
            })
            .collect()
    }

    /// Composition coordinates with the first element dropped
    fn comp_point(&self, comp: &Composition) -> Result<Array1<f64>> {
        let elements = self.pd.elements();
        if comp.is_empty() || comp.elements().any(|el| !elements.contains(el)) {
            return Err(PhaseDiagramError::NoFacetFound {
                composition: comp.formula(),
            });
        }
        Ok(Array1::from_iter(
            elements.iter().skip(1).map(|el| comp.get_atomic_fraction(el)),
        ))
    }

    fn in_facet(&self, facet: &[usize], point: &Array1<f64>) -> Result<bool> {
        let dim = self.pd.dim();
        if dim == 1 {
            // A unary diagram has nothing to discriminate
            return Ok(true);
        }
        let data = self.pd.qhull_data();
        let mut coords = Array2::zeros((facet.len(), dim - 1));
        for (row, &i) in facet.iter().enumerate() {
            coords
                .row_mut(row)
                .assign(&data.slice(s![i, ..dim - 1]));
        }
        Simplex::new(coords).in_simplex(point, &self.config)
    }

    fn facet_indices(&self, comp: &Composition) -> Result<Vec<usize>> {
        let point = self.comp_point(comp)?;
        let mut found = Vec::new();
        for (i, facet) in self.pd.facets().iter().enumerate() {
            if self.in_facet(facet, &point)? {
                found.push(i);
            }
        }
        Ok(found)
    }

    /// First facet, in hull order, that contains `comp`
    ///
    /// This is a first-fit search: on a shared boundary the earliest facet
    /// wins, not the best-conditioned one.
    pub fn get_facet(&self, comp: &Composition) -> Result<&'a [usize]> {
        let point = self.comp_point(comp)?;
        for facet in self.pd.facets() {
            if self.in_facet(facet, &point)? {
                log::trace!("Facet {:?} contains {}", facet, comp);
                return Ok(facet.as_slice());
            }
        }
        Err(PhaseDiagramError::NoFacetFound {
            composition: comp.formula(),
        })
    }

    /// All facets that contain `comp`, in hull order
    pub fn get_facets(&self, comp: &Composition) -> Result<Vec<&'a [usize]>> {
        let facets = self.pd.facets();
        Ok(self
            .facet_indices(comp)?
            .into_iter()
            .map(|i| facets[i].as_slice())
            .collect())
    }

    /// Decomposition of `comp` into the entries of its facet
    pub fn get_decomposition(&self, comp: &Composition) -> Result<Decomposition<E>> {
        let facet = self.get_facet(comp)?;
        let facet_entries = self.facet_entries(facet)?;

        let m = self.make_comp_matrix(facet_entries.iter().map(|e| e.composition()));
        let target = comp.fractions(self.pd.elements());
        let amounts = lu_solve(&m.t().to_owned(), &target, self.config.singular_threshold)?;

        let entries: Vec<(E, f64)> = facet_entries
            .into_iter()
            .zip(amounts.iter())
            .filter(|(_, amount)| amount.abs() > self.config.tolerance)
            .map(|(e, &amount)| (e.clone(), amount))
            .collect();

        log::debug!(
            "Decomposition of {}: {} phases on facet {:?}",
            comp,
            entries.len(),
            facet
        );
        Ok(Decomposition { entries })
    }

    /// Decomposition and energy above hull of an entry
    ///
    /// Entries with an energy per atom indistinguishable from zero get a
    /// hull distance of exactly zero.
    pub fn get_decomp_and_e_above_hull<T: HullEntry>(&self, entry: &T) -> Result<(Decomposition<E>, f64)> {
        let decomp = self.get_decomposition(entry.composition())?;
        let e_per_atom = entry.energy_per_atom();
        let hull_energy: f64 = decomp
            .iter()
            .map(|(e, amount)| amount * e.energy_per_atom())
            .sum();
        if e_per_atom.abs() < self.config.tolerance {
            return Ok((decomp, 0.0));
        }
        let e_above_hull = e_per_atom - hull_energy;
        if decomp.contains(entry.id()) && e_above_hull.abs() > self.config.tolerance {
            log::warn!(
                "Hull entry {} is {:.3e} eV/atom off its own facet",
                entry.name(),
                e_above_hull
            );
        }
        Ok((decomp, e_above_hull))
    }

    /// Energy above hull of an entry; 0 for stable entries
    pub fn get_e_above_hull<T: HullEntry>(&self, entry: &T) -> Result<f64> {
        Ok(self.get_decomp_and_e_above_hull(entry)?.1)
    }

    /// Reaction energy of a stable entry from its neighbouring stable phases
    ///
    /// The hull is rebuilt without the entry and the entry's distance to that
    /// hull is returned; it is at most zero for a genuinely stable entry.
    pub fn get_equilibrium_reaction_energy(&self, entry: &E) -> Result<f64> {
        if !self.pd.is_stable(entry) {
            return Err(PhaseDiagramError::NotStable { entry: entry.name() });
        }

        let id = entry.id();
        let entries: Vec<E> = self
            .pd
            .all_entries()
            .iter()
            .filter(|e| e.id() != id)
            .cloned()
            .collect();
        let reduced = PhaseDiagram::with_builder(entries, self.pd.elements(), &self.builder, &self.config)
            .map_err(|err| {
                PhaseDiagramError::collaborator(format!("rebuilding hull without {}", entry.name()), err)
            })?;

        let analyzer = PdAnalyzer::with_collaborators(&reduced, self.config, &self.builder, &self.balancer);
        let energy = analyzer.get_e_above_hull(entry)?;
        if energy > self.config.tolerance {
            log::warn!(
                "Equilibrium reaction energy of stable entry {} is positive: {:.6}",
                entry.name(),
                energy
            );
        }
        Ok(energy)
    }

    /// Chemical potentials implied by the entries of one facet
    pub fn get_facet_chempots(&self, facet: &[usize]) -> Result<BTreeMap<Element, f64>> {
        let facet_entries = self.facet_entries(facet)?;
        let m = self.make_comp_matrix(facet_entries.iter().map(|e| e.composition()));
        let energies = Array1::from_iter(facet_entries.iter().map(|e| e.energy_per_atom()));
        let chempots = lu_solve(&m, &energies, self.config.singular_threshold)?;

        Ok(self
            .pd
            .elements()
            .iter()
            .copied()
            .zip(chempots.iter().copied())
            .collect())
    }

    /// Critical chemical potentials of `element`, from least to most negative
    ///
    /// Facet potentials are sorted ascending, runs closer than the tolerance
    /// are collapsed onto their first value, and the result is reversed.
    pub fn get_transition_chempots(&self, element: &Element) -> Result<Vec<f64>> {
        self.require_element(element)?;

        let mut critical = Vec::with_capacity(self.pd.facets().len());
        for facet in self.pd.facets() {
            let chempots = self.get_facet_chempots(facet)?;
            if let Some(&mu) = chempots.get(element) {
                critical.push(mu);
            }
        }
        critical.sort_by(f64::total_cmp);

        let mut clean: Vec<f64> = Vec::with_capacity(critical.len());
        for c in critical {
            match clean.last() {
                Some(&last) if (c - last).abs() <= self.config.tolerance => {}
                _ => clean.push(c),
            }
        }
        clean.reverse();

        log::debug!(
            "{} transition chemical potentials for {}",
            clean.len(),
            element
        );
        Ok(clean)
    }

    /// Decomposition changes of `comp` as the potential of `element` is lowered
    ///
    /// At every transition potential the grand-potential hull is built just
    /// below it, and a step is recorded whenever the set of phases differs
    /// from the previous step. A composition made only of `element` has no
    /// free part to decompose and yields no steps.
    pub fn get_element_profile(&self, element: &Element, comp: &Composition) -> Result<Vec<ElementProfileStep<E>>> {
        self.require_element(element)?;
        let chempots = self.get_transition_chempots(element)?;

        let gc_comp = comp.without(element);
        if gc_comp.is_empty() {
            return Ok(Vec::new());
        }
        let el_ref = self.pd.el_ref(element)?.clone();
        let el_comp = Composition::new([(*element, 1.0)])?;

        let mut prev_ids: Vec<EntryId> = Vec::new();
        let mut evolution = Vec::new();

        for c in chempots {
            let mu = c - self.config.chempot_offset;
            let context = || format!("element profile of {} at u{} = {:.4}", comp, element, mu);

            let gpd = to_grand_potential(
                self.pd.stable_entries(),
                &BTreeMap::from([(*element, mu)]),
                self.pd.elements(),
                &self.builder,
                &self.config,
            )
            .map_err(|err| PhaseDiagramError::collaborator(context(), err))?;

            let analyzer = PdAnalyzer::with_collaborators(&gpd, self.config, &self.builder, &self.balancer);
            let decomp = analyzer.get_decomposition(&gc_comp)?;

            let members: Vec<E> = decomp
                .iter()
                .filter(|(_, amount)| *amount > self.config.decomposition_cutoff)
                .map(|(gp_entry, _)| {
                    self.pd
                        .entry_by_id(gp_entry.original_id())
                        .cloned()
                        .ok_or_else(|| PhaseDiagramError::InvalidFacet {
                            reason: format!("grand-potential entry {} has no original", gp_entry.name()),
                        })
                })
                .collect::<Result<_>>()?;

            if members.iter().all(|e| prev_ids.contains(&e.id())) {
                continue;
            }

            let mut products = vec![el_comp.clone()];
            products.extend(
                members
                    .iter()
                    .map(|e| e.composition().clone())
                    .filter(|p| !p.almost_equals(&el_comp, self.config.tolerance)),
            );
            let reaction = self
                .balancer
                .balance(std::slice::from_ref(comp), &products)
                .and_then(|rxn| rxn.normalize_to(comp))
                .map_err(|err| PhaseDiagramError::collaborator(context(), err))?;
            let released = -reaction.coefficient(&el_comp).unwrap_or(0.0);

            log::debug!(
                "u{} = {:.4}: {} ({} phases)",
                element,
                c,
                reaction,
                members.len()
            );

            prev_ids = members.iter().map(|e| e.id()).collect();
            evolution.push(ElementProfileStep {
                chempot: c,
                evolution: released,
                element_reference: el_ref.clone(),
                reaction,
                entries: members,
            });
        }

        Ok(evolution)
    }

    /// Chemical-potential boundaries of every stable entry
    ///
    /// Potentials are reported relative to the pure-element references of
    /// `elements`, in the order given.
    pub fn get_chempot_range_map(&self, elements: &[Element]) -> Result<ChempotRangeMap<E>> {
        for el in elements {
            self.require_element(el)?;
        }
        let refs: Vec<f64> = elements
            .iter()
            .map(|el| self.pd.el_ref(el).map(|r| r.energy_per_atom()))
            .collect::<Result<_>>()?;

        let facets = self.pd.facets();
        let mut facet_chempots: BTreeMap<usize, BTreeMap<Element, f64>> = BTreeMap::new();
        let mut ranges = ChempotRangeMap::new();

        for entry in self.pd.stable_entries() {
            let member_facets = self.facet_indices(entry.composition())?;
            let mut boundaries = Vec::new();

            for (a, &fi) in member_facets.iter().enumerate() {
                for &fj in &member_facets[a + 1..] {
                    let vi: BTreeSet<usize> = facets[fi].iter().copied().collect();
                    let shared = facets[fj].iter().filter(|&v| vi.contains(v)).count();
                    if shared != self.pd.dim() - 1 {
                        continue;
                    }

                    let mut points = Vec::with_capacity(2);
                    for f in [fi, fj] {
                        if !facet_chempots.contains_key(&f) {
                            facet_chempots.insert(f, self.get_facet_chempots(&facets[f])?);
                        }
                        let chempots = &facet_chempots[&f];
                        points.push(
                            elements
                                .iter()
                                .zip(&refs)
                                .map(|(el, e_ref)| chempots[el] - e_ref)
                                .collect::<Vec<f64>>(),
                        );
                    }
                    boundaries.push(Simplex::from_points(&points)?);
                }
            }

            if !boundaries.is_empty() {
                log::trace!("{}: {} chemical potential boundaries", entry.name(), boundaries.len());
                ranges.insert(
                    entry.id(),
                    ChempotRange {
                        entry: entry.clone(),
                        boundaries,
                    },
                );
            }
        }

        Ok(ranges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::PdEntry;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::array;

    fn el(symbol: &str) -> Element {
        Element::from_symbol(symbol).unwrap()
    }

    fn comp(formula: &str) -> Composition {
        Composition::from_formula(formula).unwrap()
    }

    fn entry(formula: &str, energy_per_atom: f64) -> PdEntry {
        PdEntry::from_energy_per_atom(comp(formula), energy_per_atom)
    }

    /// Na, Cl at 0 eV and NaCl at -1 eV/atom, facets given explicitly
    fn binary() -> PhaseDiagram<PdEntry> {
        let entries = vec![entry("Na", 0.0), entry("Cl", 0.0), entry("NaCl", -1.0)];
        PhaseDiagram::from_facets(entries, &[el("Na"), el("Cl")], vec![vec![0, 2], vec![1, 2]]).unwrap()
    }

    #[test]
    fn test_decomposition_on_vertex() {
        let pd = binary();
        let analyzer = PdAnalyzer::new(&pd);
        let decomp = analyzer.get_decomposition(&comp("Na0.5Cl0.5")).unwrap();

        assert_eq!(decomp.len(), 1);
        let nacl = &pd.all_entries()[2];
        assert_relative_eq!(decomp.amount(nacl.id()).unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_decomposition_between_phases() {
        let pd = binary();
        let analyzer = PdAnalyzer::new(&pd);
        let decomp = analyzer.get_decomposition(&comp("Na3Cl")).unwrap();

        let [na, _, nacl] = [&pd.all_entries()[0], &pd.all_entries()[1], &pd.all_entries()[2]];
        assert_relative_eq!(decomp.amount(na.id()).unwrap(), 0.5, epsilon = 1e-10);
        assert_relative_eq!(decomp.amount(nacl.id()).unwrap(), 0.5, epsilon = 1e-10);
        assert_relative_eq!(decomp.total(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_e_above_hull() {
        let pd = binary();
        let analyzer = PdAnalyzer::new(&pd);
        let metastable = entry("NaCl", -0.5);
        assert_relative_eq!(analyzer.get_e_above_hull(&metastable).unwrap(), 0.5, epsilon = 1e-10);

        for stable in pd.stable_entries() {
            assert_abs_diff_eq!(analyzer.get_e_above_hull(stable).unwrap(), 0.0, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_zero_energy_entry_forced_to_zero() {
        let pd = binary();
        let analyzer = PdAnalyzer::new(&pd);
        // Far above the hull, but its energy is numerically zero
        let entry = entry("NaCl", 1e-12);
        assert_eq!(analyzer.get_e_above_hull(&entry).unwrap(), 0.0);
    }

    #[test]
    fn test_first_fit_facet() {
        let pd = binary();
        let analyzer = PdAnalyzer::new(&pd);
        // NaCl sits on both facets; the first one wins
        assert_eq!(analyzer.get_facet(&comp("NaCl")).unwrap(), &[0usize, 2]);
        assert_eq!(analyzer.get_facets(&comp("NaCl")).unwrap().len(), 2);
        assert_eq!(analyzer.get_facets(&comp("Na3Cl")).unwrap(), vec![&[0usize, 2][..]]);
    }

    #[test]
    fn test_composition_outside_diagram() {
        let pd = binary();
        let analyzer = PdAnalyzer::new(&pd);
        let err = analyzer.get_facet(&comp("NaO")).unwrap_err();
        assert!(matches!(err, PhaseDiagramError::NoFacetFound { .. }));
        assert!(err.is_hull_error());
    }

    #[test]
    fn test_missing_facet_coverage() {
        // Only the Na-NaCl side of the hull is supplied
        let entries = vec![entry("Na", 0.0), entry("Cl", 0.0), entry("NaCl", -1.0)];
        let pd = PhaseDiagram::from_facets(entries, &[el("Na"), el("Cl")], vec![vec![0, 2]]).unwrap();
        let analyzer = PdAnalyzer::new(&pd);
        assert!(matches!(
            analyzer.get_decomposition(&comp("NaCl3")),
            Err(PhaseDiagramError::NoFacetFound { .. })
        ));
    }

    #[test]
    fn test_singular_facet() {
        // Two vertices with the same composition
        let entries = vec![entry("Na", 0.0), entry("Cl", 0.0), entry("NaCl", -1.0), entry("NaCl", -0.9)];
        let pd = PhaseDiagram::from_facets(entries, &[el("Na"), el("Cl")], vec![vec![2, 3]]).unwrap();
        let analyzer = PdAnalyzer::new(&pd);
        assert!(matches!(
            analyzer.get_facet_chempots(&[2, 3]),
            Err(PhaseDiagramError::SingularFacet)
        ));
    }

    #[test]
    fn test_facet_chempots_match_direct_solve() {
        let pd = binary();
        let analyzer = PdAnalyzer::new(&pd);
        let chempots = analyzer.get_facet_chempots(&[0, 2]).unwrap();

        // [1 0; 0.5 0.5] [uNa uCl]^T = [0 -1]^T
        let m = array![[1.0, 0.0], [0.5, 0.5]];
        let expected = lu_solve(&m, &array![0.0, -1.0], 1e-12).unwrap();
        assert_relative_eq!(chempots[&el("Na")], expected[0], epsilon = 1e-12);
        assert_relative_eq!(chempots[&el("Cl")], expected[1], epsilon = 1e-12);
        assert_abs_diff_eq!(chempots[&el("Na")], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transition_chempots_order() {
        let pd = binary();
        let analyzer = PdAnalyzer::new(&pd);
        // Facet Na-NaCl gives uCl = -2, facet NaCl-Cl gives uCl = 0
        let pots = analyzer.get_transition_chempots(&el("Cl")).unwrap();
        assert_eq!(pots.len(), 2);
        assert_relative_eq!(pots[0], 0.0, epsilon = 1e-10);
        assert_relative_eq!(pots[1], -2.0, epsilon = 1e-10);

        assert!(matches!(
            analyzer.get_transition_chempots(&el("O")),
            Err(PhaseDiagramError::UnknownElement { .. })
        ));
    }

    #[test]
    fn test_unary_always_inside() {
        let entries = vec![entry("Na", -1.0), entry("Na", -1.2)];
        let pd = PhaseDiagram::new(entries, &[el("Na")]).unwrap();
        let analyzer = PdAnalyzer::new(&pd);

        assert_eq!(pd.facets().len(), 1);
        assert_eq!(analyzer.get_facets(&comp("Na2")).unwrap().len(), 1);
        let decomp = analyzer.get_decomposition(&comp("Na")).unwrap();
        assert_relative_eq!(decomp.total(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            analyzer.get_e_above_hull(&pd.all_entries()[0]).unwrap(),
            0.2,
            epsilon = 1e-12
        );
        assert!(analyzer.get_chempot_range_map(&[el("Na")]).unwrap().is_empty());
    }

    #[test]
    fn test_not_stable() {
        let entries = vec![entry("Na", 0.0), entry("Cl", 0.0), entry("NaCl", -1.0), entry("NaCl", -0.5)];
        let pd = PhaseDiagram::new(entries, &[el("Na"), el("Cl")]).unwrap();
        let analyzer = PdAnalyzer::new(&pd);
        let err = analyzer
            .get_equilibrium_reaction_energy(&pd.all_entries()[3])
            .unwrap_err();
        assert!(matches!(err, PhaseDiagramError::NotStable { .. }));
    }

    #[test]
    fn test_equilibrium_reaction_energy() {
        let entries = vec![entry("Na", 0.0), entry("Cl", 0.0), entry("NaCl", -1.0)];
        let pd = PhaseDiagram::new(entries, &[el("Na"), el("Cl")]).unwrap();
        let analyzer = PdAnalyzer::new(&pd);
        // Without NaCl the hull is the Na-Cl tie line at 0 eV
        let energy = analyzer
            .get_equilibrium_reaction_energy(&pd.all_entries()[2])
            .unwrap();
        assert_relative_eq!(energy, -1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_equilibrium_reaction_energy_wraps_rebuild_failure() {
        let entries = vec![entry("Na", -1.0), entry("Cl", -1.0), entry("NaCl", -2.0)];
        let pd = PhaseDiagram::new(entries, &[el("Na"), el("Cl")]).unwrap();
        let analyzer = PdAnalyzer::new(&pd);
        // Removing the only Na entry leaves no Na reference
        let err = analyzer
            .get_equilibrium_reaction_energy(&pd.all_entries()[0])
            .unwrap_err();
        assert!(err.is_collaborator_error());
        assert!(err.to_string().contains("Na"));
    }
}
