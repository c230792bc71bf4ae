//! Entries: compositions with an energy
//!
//! The analyzer is written against the [`HullEntry`] capability trait so that
//! plain entries and grand-potential entries go through the same code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::composition::Composition;

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(0);

/// Stable identity of an entry
///
/// Assigned once at construction and shared by clones, so it can serve as a
/// mapping key in place of reference identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId(u64);

impl EntryId {
    /// Allocate a fresh, process-unique id
    pub fn next() -> Self {
        EntryId(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything the hull analysis can place in a phase diagram
pub trait HullEntry: Clone + fmt::Debug {
    /// Stable identity
    fn id(&self) -> EntryId;

    fn composition(&self) -> &Composition;

    /// Total energy of the composition as given
    fn energy(&self) -> f64;

    fn energy_per_atom(&self) -> f64 {
        self.energy() / self.composition().num_atoms()
    }

    /// Display name, the reduced formula unless overridden
    fn name(&self) -> String {
        self.composition().reduced_formula()
    }
}

/// A composition with a total energy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdEntry {
    #[serde(skip, default = "EntryId::next")]
    id: EntryId,
    composition: Composition,
    energy: f64,
    name: Option<String>,
}

impl PdEntry {
    /// Create an entry from a composition and its total energy
    pub fn new(composition: Composition, energy: f64) -> Self {
        Self {
            id: EntryId::next(),
            composition,
            energy,
            name: None,
        }
    }

    /// Create an entry from a composition and an energy per atom
    pub fn from_energy_per_atom(composition: Composition, energy_per_atom: f64) -> Self {
        let energy = energy_per_atom * composition.num_atoms();
        Self::new(composition, energy)
    }

    /// Attach a display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl HullEntry for PdEntry {
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
        self.name
            .clone()
            .unwrap_or_else(|| self.composition.reduced_formula())
    }
}

impl fmt::Display for PdEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PdEntry {} with energy = {:.4}", self.name(), self.energy)
    }
}
