//! Elements and compositions
//!
//! A [`Composition`] maps elements to non-negative amounts. The analyzer only
//! ever needs atomic fractions over a fixed element ordering, which
//! [`Composition::fractions`] provides.

use ndarray::Array1;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{PhaseDiagramError, Result};

/// Amounts below this magnitude are treated as absent
const AMOUNT_TOLERANCE: f64 = 1e-8;

/// (symbol, atomic number, Pauling electronegativity)
const ELEMENT_TABLE: &[(&str, u32, f64)] = &[
    ("H", 1, 2.20),
    ("Li", 3, 0.98),
    ("Be", 4, 1.57),
    ("B", 5, 2.04),
    ("C", 6, 2.55),
    ("N", 7, 3.04),
    ("O", 8, 3.44),
    ("F", 9, 3.98),
    ("Na", 11, 0.93),
    ("Mg", 12, 1.31),
    ("Al", 13, 1.61),
    ("Si", 14, 1.90),
    ("P", 15, 2.19),
    ("S", 16, 2.58),
    ("Cl", 17, 3.16),
    ("K", 19, 0.82),
    ("Ca", 20, 1.00),
    ("Sc", 21, 1.36),
    ("Ti", 22, 1.54),
    ("V", 23, 1.63),
    ("Cr", 24, 1.66),
    ("Mn", 25, 1.55),
    ("Fe", 26, 1.83),
    ("Co", 27, 1.88),
    ("Ni", 28, 1.91),
    ("Cu", 29, 1.90),
    ("Zn", 30, 1.65),
    ("Ga", 31, 1.81),
    ("Ge", 32, 2.01),
    ("As", 33, 2.18),
    ("Se", 34, 2.55),
    ("Br", 35, 2.96),
    ("Rb", 37, 0.82),
    ("Sr", 38, 0.95),
    ("Y", 39, 1.22),
    ("Zr", 40, 1.33),
    ("Nb", 41, 1.60),
    ("Mo", 42, 2.16),
    ("Ru", 44, 2.20),
    ("Pd", 46, 2.20),
    ("Ag", 47, 1.93),
    ("Cd", 48, 1.69),
    ("In", 49, 1.78),
    ("Sn", 50, 1.96),
    ("Sb", 51, 2.05),
    ("Te", 52, 2.10),
    ("I", 53, 2.66),
    ("Cs", 55, 0.79),
    ("Ba", 56, 0.89),
    ("La", 57, 1.10),
    ("Ce", 58, 1.12),
    ("Hf", 72, 1.30),
    ("Ta", 73, 1.50),
    ("W", 74, 2.36),
    ("Ir", 77, 2.20),
    ("Pt", 78, 2.28),
    ("Au", 79, 2.54),
    ("Pb", 82, 2.33),
    ("Bi", 83, 2.02),
];

/// A chemical element
///
/// Elements are identity tokens: equality and hashing use the atomic number,
/// ordering uses electronegativity (then atomic number), which is also the
/// order formulas are written in.
#[derive(Debug, Clone, Copy)]
pub struct Element {
    symbol: &'static str,
    z: u32,
    x: f64,
}

impl Element {
    /// Look up an element by its symbol
    pub fn from_symbol(symbol: &str) -> Result<Self> {
        ELEMENT_TABLE
            .iter()
            .find(|(s, _, _)| *s == symbol)
            .map(|&(symbol, z, x)| Element { symbol, z, x })
            .ok_or_else(|| PhaseDiagramError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
    }

    /// Element symbol, e.g. "Li"
    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    /// Atomic number
    pub fn atomic_number(&self) -> u32 {
        self.z
    }

    /// Pauling electronegativity
    pub fn electronegativity(&self) -> f64 {
        self.x
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.z == other.z
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.z.hash(state);
    }
}

impl PartialOrd for Element {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Element {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x.total_cmp(&other.x).then(self.z.cmp(&other.z))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol)
    }
}

// Elements travel as their symbol
impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol)
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let symbol = String::deserialize(deserializer)?;
        Element::from_symbol(&symbol).map_err(de::Error::custom)
    }
}

/// An immutable mapping from elements to amounts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    amounts: BTreeMap<Element, f64>,
}

impl Composition {
    /// Build a composition from (element, amount) pairs
    ///
    /// Repeated elements are summed and near-zero amounts dropped. Negative
    /// amounts are rejected.
    pub fn new(pairs: impl IntoIterator<Item = (Element, f64)>) -> Result<Self> {
        let mut amounts: BTreeMap<Element, f64> = BTreeMap::new();
        for (el, amount) in pairs {
            *amounts.entry(el).or_insert(0.0) += amount;
        }
        if let Some((el, &amount)) = amounts.iter().find(|(_, a)| **a < -AMOUNT_TOLERANCE) {
            return Err(PhaseDiagramError::NegativeAmount {
                element: el.symbol.to_string(),
                amount,
            });
        }
        amounts.retain(|_, a| *a >= AMOUNT_TOLERANCE);
        Ok(Self { amounts })
    }

    /// Parse a simple formula such as "Li2O" or "Fe0.5O0.5"
    ///
    /// Parentheses and hydrates are not supported.
    pub fn from_formula(formula: &str) -> Result<Self> {
        let invalid = || PhaseDiagramError::InvalidFormula {
            formula: formula.to_string(),
        };

        let chars: Vec<char> = formula.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.is_empty() {
            return Err(invalid());
        }

        let mut pairs = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            if !chars[i].is_ascii_uppercase() {
                return Err(invalid());
            }
            let start = i;
            i += 1;
            while i < chars.len() && chars[i].is_ascii_lowercase() {
                i += 1;
            }
            let symbol: String = chars[start..i].iter().collect();

            let num_start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            let amount = if num_start == i {
                1.0
            } else {
                let digits: String = chars[num_start..i].iter().collect();
                digits.parse::<f64>().map_err(|_| invalid())?
            };

            pairs.push((Element::from_symbol(&symbol)?, amount));
        }

        Self::new(pairs)
    }

    /// Amount of an element (0 if absent)
    pub fn amount(&self, el: &Element) -> f64 {
        self.amounts.get(el).copied().unwrap_or(0.0)
    }

    /// Total number of atoms
    pub fn num_atoms(&self) -> f64 {
        self.amounts.values().sum()
    }

    /// Atomic fraction of an element relative to this composition's total
    pub fn get_atomic_fraction(&self, el: &Element) -> f64 {
        let total = self.num_atoms();
        if total == 0.0 {
            0.0
        } else {
            self.amount(el) / total
        }
    }

    /// Atomic-fraction vector over a fixed element ordering
    pub fn fractions(&self, elements: &[Element]) -> Array1<f64> {
        Array1::from_iter(elements.iter().map(|el| self.get_atomic_fraction(el)))
    }

    /// Elements present, in formula order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.amounts.keys()
    }

    /// Iterate over (element, amount) pairs in formula order
    pub fn iter(&self) -> impl Iterator<Item = (&Element, &f64)> {
        self.amounts.iter()
    }

    pub fn contains(&self, el: &Element) -> bool {
        self.amounts.contains_key(el)
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// True for a composition made of a single element
    pub fn is_element(&self) -> bool {
        self.amounts.len() == 1
    }

    /// A copy with `el` removed
    pub fn without(&self, el: &Element) -> Self {
        let mut amounts = self.amounts.clone();
        amounts.remove(el);
        Self { amounts }
    }

    /// Compare atomic fractions element by element
    pub fn almost_equals(&self, other: &Composition, tolerance: f64) -> bool {
        self.amounts
            .keys()
            .chain(other.amounts.keys())
            .all(|el| (self.get_atomic_fraction(el) - other.get_atomic_fraction(el)).abs() <= tolerance)
    }

    /// Formula with amounts as given, e.g. "Li4O2"
    pub fn formula(&self) -> String {
        write_formula(self.amounts.iter().map(|(el, a)| (el, *a)))
    }

    /// Formula divided by the greatest common divisor of integral amounts,
    /// e.g. "Li2O" for Li4O2
    pub fn reduced_formula(&self) -> String {
        let integral = self
            .amounts
            .values()
            .all(|a| (a - a.round()).abs() < AMOUNT_TOLERANCE);
        if !integral {
            return self.formula();
        }
        let divisor = self
            .amounts
            .values()
            .map(|a| a.round() as u64)
            .fold(0, gcd)
            .max(1) as f64;
        write_formula(self.amounts.iter().map(|(el, a)| (el, a / divisor)))
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formula())
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn write_formula<'a>(pairs: impl Iterator<Item = (&'a Element, f64)>) -> String {
    let mut out = String::new();
    for (el, amount) in pairs {
        out.push_str(el.symbol);
        if (amount - 1.0).abs() < AMOUNT_TOLERANCE {
            continue;
        }
        if (amount - amount.round()).abs() < AMOUNT_TOLERANCE {
            out.push_str(&format!("{}", amount.round() as i64));
        } else {
            let text = format!("{:.4}", amount);
            out.push_str(text.trim_end_matches('0').trim_end_matches('.'));
        }
    }
    out
}
