//! Boolean formulas over canonical feature symbols.
//!
//! Every dialect lowers its surface syntax into this one algebra, so the
//! presence condition engine never needs to know where a condition came
//! from. The smart constructors ([`Formula::and`], [`Formula::or`],
//! [`Formula::not`]) keep formulas in a small normal form:
//!
//! - nested conjunctions / disjunctions are flattened
//! - `true` / `false` operands are absorbed or dominate
//! - duplicate operands are removed (first occurrence wins)
//! - `x && !x` collapses to `false`, `x || !x` to `true`
//! - `!!x` collapses to `x`
//!
//! As a consequence a region nested in a single `#ifdef X` has exactly the
//! condition `X`, with no `true &&` residue.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::assignment::Assignment;

/// Truth tables are only built up to this many atoms.
pub const MAX_TRUTH_TABLE_ATOMS: usize = 16;

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// A canonical feature symbol reference.
///
/// `file` is set for file-local symbols: spellings the resolver refused to
/// unify project-wide because of an alias ambiguity.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct Symbol {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Symbol {
    #[must_use]
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
        }
    }

    #[must_use]
    pub fn file_local(name: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: Some(file.into()),
        }
    }

    #[must_use]
    pub const fn is_file_local(&self) -> bool {
        self.file.is_some()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}@{file}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

/// A boolean formula in terms of canonical feature symbols.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Formula {
    True,
    False,
    Var(Symbol),
    /// A sub-expression the lexical engine does not interpret
    /// (comparisons, arithmetic). Acts as a free boolean atom.
    Opaque(String),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
}

/// A leaf of a formula that can take a truth value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Atom<'a> {
    Var(&'a Symbol),
    Opaque(&'a str),
}

impl Formula {
    /// A global symbol reference.
    #[must_use]
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var(Symbol::global(name))
    }

    #[must_use]
    pub const fn constant(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }

    /// Negation with double-negation and constant folding.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Self) -> Self {
        match operand {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }

    /// Conjunction of `operands` in normal form. The empty conjunction is `true`.
    #[must_use]
    pub fn and(operands: impl IntoIterator<Item = Self>) -> Self {
        let mut flat: Vec<Self> = Vec::new();
        for operand in operands {
            match operand {
                Self::True => {}
                Self::False => return Self::False,
                Self::And(inner) => {
                    for item in inner {
                        push_unique(&mut flat, item);
                    }
                }
                other => push_unique(&mut flat, other),
            }
        }
        if has_complementary_pair(&flat) {
            return Self::False;
        }
        match flat.len() {
            0 => Self::True,
            1 => flat.swap_remove(0),
            _ => Self::And(flat),
        }
    }

    /// Disjunction of `operands` in normal form. The empty disjunction is `false`.
    #[must_use]
    pub fn or(operands: impl IntoIterator<Item = Self>) -> Self {
        let mut flat: Vec<Self> = Vec::new();
        for operand in operands {
            match operand {
                Self::False => {}
                Self::True => return Self::True,
                Self::Or(inner) => {
                    for item in inner {
                        push_unique(&mut flat, item);
                    }
                }
                other => push_unique(&mut flat, other),
            }
        }
        if has_complementary_pair(&flat) {
            return Self::True;
        }
        match flat.len() {
            0 => Self::False,
            1 => flat.swap_remove(0),
            _ => Self::Or(flat),
        }
    }

    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    #[must_use]
    pub const fn is_false(&self) -> bool {
        matches!(self, Self::False)
    }

    /// All symbols referenced anywhere in the formula, sorted.
    #[must_use]
    pub fn symbols(&self) -> BTreeSet<&Symbol> {
        let mut out = BTreeSet::new();
        self.collect_atoms(&mut |atom| {
            if let Atom::Var(symbol) = atom {
                out.insert(symbol);
            }
        });
        out
    }

    /// All atoms (symbols and opaque sub-expressions), sorted.
    #[must_use]
    pub fn atoms(&self) -> BTreeSet<Atom<'_>> {
        let mut out = BTreeSet::new();
        self.collect_atoms(&mut |atom| {
            out.insert(atom);
        });
        out
    }

    fn collect_atoms<'a>(&'a self, sink: &mut impl FnMut(Atom<'a>)) {
        match self {
            Self::True | Self::False => {}
            Self::Var(symbol) => sink(Atom::Var(symbol)),
            Self::Opaque(text) => sink(Atom::Opaque(text)),
            Self::Not(inner) => inner.collect_atoms(sink),
            Self::And(items) | Self::Or(items) => {
                for item in items {
                    item.collect_atoms(sink);
                }
            }
        }
    }

    /// Literals that every satisfying assignment must contain.
    ///
    /// Only the top-level conjunction is inspected: `A && !B && (C || D)`
    /// yields `[(A, true), (B, false)]`.
    #[must_use]
    pub fn required_literals(&self) -> Vec<(&Symbol, bool)> {
        match self {
            Self::Var(symbol) => vec![(symbol, true)],
            Self::Not(inner) => match inner.as_ref() {
                Self::Var(symbol) => vec![(symbol, false)],
                _ => Vec::new(),
            },
            Self::And(items) => items.iter().flat_map(Self::required_literals).collect(),
            _ => Vec::new(),
        }
    }

    /// Evaluate with a caller-supplied valuation for atoms.
    pub fn eval_with(&self, valuation: &impl Fn(Atom<'_>) -> bool) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::Var(symbol) => valuation(Atom::Var(symbol)),
            Self::Opaque(text) => valuation(Atom::Opaque(text)),
            Self::Not(inner) => !inner.eval_with(valuation),
            Self::And(items) => items.iter().all(|item| item.eval_with(valuation)),
            Self::Or(items) => items.iter().any(|item| item.eval_with(valuation)),
        }
    }

    /// Evaluate under a concrete configuration.
    ///
    /// A symbol counts as enabled when it is `y` or `m`. File-local symbols,
    /// unknown symbols and opaque atoms are disabled.
    #[must_use]
    pub fn evaluate(&self, assignment: &Assignment) -> bool {
        self.eval_with(&|atom| match atom {
            Atom::Var(symbol) if !symbol.is_file_local() => assignment.is_enabled(&symbol.name),
            Atom::Var(_) | Atom::Opaque(_) => false,
        })
    }

    /// Whether every assignment satisfying `self` also satisfies `other`.
    ///
    /// Decided by truth table; returns `None` when the two formulas mention
    /// more than [`MAX_TRUTH_TABLE_ATOMS`] atoms together.
    #[must_use]
    pub fn implies(&self, other: &Self) -> Option<bool> {
        let mut atoms = self.atoms();
        atoms.extend(other.atoms());
        let atoms: Vec<Atom<'_>> = atoms.into_iter().collect();
        if atoms.len() > MAX_TRUTH_TABLE_ATOMS {
            return None;
        }
        let holds = (0u32..(1 << atoms.len())).all(|bits| {
            let valuation = |atom: Atom<'_>| {
                atoms
                    .iter()
                    .position(|candidate| *candidate == atom)
                    .is_some_and(|idx| bits & (1 << idx) != 0)
            };
            !self.eval_with(&valuation) || other.eval_with(&valuation)
        });
        Some(holds)
    }

    /// Whether the formula has no satisfying assignment (truth table).
    #[must_use]
    pub fn is_unsatisfiable(&self) -> Option<bool> {
        self.implies(&Self::False)
    }

    /// Rebuild the formula with every symbol replaced by `f(symbol)`.
    #[must_use]
    pub fn map_symbols(&self, f: &mut impl FnMut(&Symbol) -> Self) -> Self {
        match self {
            Self::True => Self::True,
            Self::False => Self::False,
            Self::Var(symbol) => f(symbol),
            Self::Opaque(text) => Self::Opaque(text.clone()),
            Self::Not(inner) => Self::not(inner.map_symbols(f)),
            Self::And(items) => Self::and(items.iter().map(|item| item.map_symbols(f))),
            Self::Or(items) => Self::or(items.iter().map(|item| item.map_symbols(f))),
        }
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Or(_) => 1,
            Self::And(_) => 2,
            _ => 3,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parent: u8) -> fmt::Result {
        if self.precedence() < parent {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

fn push_unique(items: &mut Vec<Formula>, item: Formula) {
    if !items.contains(&item) {
        items.push(item);
    }
}

fn has_complementary_pair(items: &[Formula]) -> bool {
    items.iter().any(|item| match item {
        Formula::Not(inner) => items.contains(inner.as_ref()),
        _ => false,
    })
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
            Self::Var(symbol) => write!(f, "{symbol}"),
            Self::Opaque(text) => write!(f, "`{text}`"),
            Self::Not(inner) => {
                f.write_str("!")?;
                inner.fmt_operand(f, 3)
            }
            Self::And(items) | Self::Or(items) => {
                let (separator, own) = if matches!(self, Self::And(_)) {
                    (" && ", 2)
                } else {
                    (" || ", 1)
                };
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(separator)?;
                    }
                    item.fmt_operand(f, own + 1)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v(name: &str) -> Formula {
        Formula::var(name)
    }

    #[test]
    fn and_drops_true_and_flattens() {
        let f = Formula::and([Formula::True, v("A"), Formula::and([v("B"), v("C")])]);
        assert_eq!(f, Formula::And(vec![v("A"), v("B"), v("C")]));
    }

    #[test]
    fn single_operand_is_unwrapped() {
        assert_eq!(Formula::and([Formula::True, v("X")]), v("X"));
        assert_eq!(Formula::or([Formula::False, v("X")]), v("X"));
    }

    #[test]
    fn empty_operators_are_neutral() {
        assert_eq!(Formula::and([]), Formula::True);
        assert_eq!(Formula::or([]), Formula::False);
    }

    #[test]
    fn complementary_literals_collapse() {
        assert_eq!(
            Formula::and([v("A"), Formula::not(v("A"))]),
            Formula::False
        );
        assert_eq!(Formula::or([v("A"), Formula::not(v("A"))]), Formula::True);
    }

    #[test]
    fn double_negation_collapses() {
        assert_eq!(Formula::not(Formula::not(v("A"))), v("A"));
        assert_eq!(Formula::not(Formula::True), Formula::False);
    }

    #[test]
    fn display_uses_minimal_parens() {
        let f = Formula::and([
            v("A"),
            Formula::not(Formula::or([v("B"), v("C")])),
            Formula::or([v("D"), v("E")]),
        ]);
        assert_eq!(f.to_string(), "A && !(B || C) && (D || E)");
    }

    #[test]
    fn display_marks_file_local_and_opaque() {
        let f = Formula::and([
            Formula::Var(Symbol::file_local("TEST", "src/main.c")),
            Formula::Opaque("VERSION > 2".into()),
        ]);
        assert_eq!(f.to_string(), "TEST@src/main.c && `VERSION > 2`");
    }

    #[test]
    fn required_literals_only_look_at_top_conjunction() {
        let f = Formula::and([v("A"), Formula::not(v("B")), Formula::or([v("C"), v("D")])]);
        let lits: Vec<(String, bool)> = f
            .required_literals()
            .into_iter()
            .map(|(s, p)| (s.name.clone(), p))
            .collect();
        assert_eq!(lits, vec![("A".into(), true), ("B".into(), false)]);
    }

    #[test]
    fn implication_by_truth_table() {
        let ab = Formula::and([v("A"), v("B")]);
        assert_eq!(ab.implies(&v("A")), Some(true));
        assert_eq!(v("A").implies(&ab), Some(false));
        assert_eq!(Formula::False.implies(&v("Z")), Some(true));
    }

    #[test]
    fn unsatisfiable_detects_hidden_contradiction() {
        let f = Formula::and([
            Formula::or([v("A"), v("B")]),
            Formula::not(v("A")),
            Formula::not(v("B")),
        ]);
        assert_eq!(f.is_unsatisfiable(), Some(true));
        assert_eq!(v("A").is_unsatisfiable(), Some(false));
    }

    #[test]
    fn map_symbols_renormalizes() {
        let f = Formula::and([v("CONFIG_A"), v("B")]);
        let mapped = f.map_symbols(&mut |s| {
            if s.name == "B" {
                Formula::True
            } else {
                Formula::var(s.name.trim_start_matches("CONFIG_"))
            }
        });
        assert_eq!(mapped, v("A"));
    }

    #[test]
    fn serde_roundtrip_preserves_structure() {
        let f = Formula::or([
            Formula::and([v("A"), Formula::not(v("B"))]),
            Formula::Var(Symbol::file_local("X", "a.c")),
            Formula::Opaque("N == 3".into()),
        ]);
        let json = serde_json::to_string(&f).unwrap();
        let back: Formula = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }
}
