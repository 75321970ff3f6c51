//! Presence Condition Engine: per-file scope stack to per-line conditions.
//!
//! Scopes live in an arena indexed by [`ScopeId`]; the active stack only
//! holds ids plus the bookkeeping of open `#if` chains. Every line of the
//! file is tagged with the conjunction of the active scopes' formulas, and
//! runs of lines with the same condition and innermost scope are merged
//! into [`Region`]s.
//!
//! ```text
//! #if A            line tagged with the enclosing condition
//!   ...            A
//! #elif B          enclosing condition
//!   ...            B && !A
//! #else            enclosing condition
//!   ...            !(A || B)
//! #endif           enclosing condition
//! ```

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use varimap_core::{Diagnostic, DiagnosticKind, Formula, Location};
use varimap_dialect::Placement;

use crate::satisfiability::SatisfiabilityCheck;

// ---------------------------------------------------------------------------
// Scope records
// ---------------------------------------------------------------------------

/// Index of a scope in its file's arena.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(transparent)]
pub struct ScopeId(pub u32);

impl ScopeId {
    const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    If,
    Elif,
    Else,
    /// A labelled section of an interface/implementation file.
    Section,
}

impl ScopeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::If => "if",
            Self::Elif => "elif",
            Self::Else => "else",
            Self::Section => "section",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conditional scope as it was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScopeRecord {
    pub id: ScopeId,
    pub kind: ScopeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ScopeId>,
    /// Line of the directive or label that opened the scope.
    pub line: u32,
    /// This scope's own formula (`B && !A` for an `#elif B`).
    pub formula: Formula,
    /// Conjunction of the formulas from the outermost scope down to this one.
    pub condition: Formula,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unsatisfiable: bool,
}

/// A run of consecutive lines sharing one presence condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Region {
    pub start_line: u32,
    pub end_line: u32,
    pub condition: Formula,
    /// Innermost scope the lines belong to; `None` at file level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeId>,
}

impl Region {
    #[must_use]
    pub const fn contains(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// Everything the engine learned about one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceTable {
    pub scopes: Vec<ScopeRecord>,
    pub regions: Vec<Region>,
    pub diagnostics: Vec<Diagnostic>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Bookkeeping for an open `#if` / `#elif` / `#else` chain.
#[derive(Debug)]
struct Chain {
    opened_at: u32,
    /// Formulas of the branches already taken at this level.
    priors: Vec<Formula>,
    seen_else: bool,
}

#[derive(Debug)]
struct Frame {
    scope: ScopeId,
    /// `None` for section frames.
    chain: Option<Chain>,
}

/// State machine for one file's scope events.
#[derive(Debug)]
pub struct PresenceEngine<'a> {
    file: String,
    satisfiability: Option<&'a SatisfiabilityCheck<'a>>,
    scopes: Vec<ScopeRecord>,
    stack: Vec<Frame>,
    regions: Vec<Region>,
    /// First line not yet assigned to a region.
    cursor: u32,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> PresenceEngine<'a> {
    /// Engine for `file`. Without a satisfiability check no
    /// `UnsatisfiableScope` diagnostics are produced.
    #[must_use]
    pub fn new(
        file: impl Into<String>,
        satisfiability: Option<&'a SatisfiabilityCheck<'a>>,
    ) -> Self {
        Self {
            file: file.into(),
            satisfiability,
            scopes: Vec::new(),
            stack: Vec::new(),
            regions: Vec::new(),
            cursor: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Cumulative condition of the innermost active scope.
    #[must_use]
    pub fn condition(&self) -> Formula {
        self.stack
            .last()
            .map_or(Formula::True, |frame| self.scope(frame.scope).condition.clone())
    }

    /// Number of active scopes, sections included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn enter_if(&mut self, line: u32, placement: Placement, formula: Formula) {
        self.tag_until(line.saturating_sub(1));
        if placement == Placement::Directive {
            self.tag_until(line);
        }
        let chain = Chain {
            opened_at: line,
            priors: vec![formula.clone()],
            seen_else: false,
        };
        self.push(ScopeKind::If, line, formula, Some(chain));
    }

    pub fn enter_elif(&mut self, line: u32, formula: Formula) {
        self.tag_until(line.saturating_sub(1));
        let Some(mut chain) = self.pop_chain(line, "#elif") else {
            return;
        };
        self.tag_until(line);
        if chain.seen_else {
            self.report(
                DiagnosticKind::UnbalancedDirective,
                line,
                format!("#elif after #else in the chain opened at line {}", chain.opened_at),
            );
        }
        let branch = Formula::and([formula.clone(), Formula::not(Formula::or(chain.priors.clone()))]);
        chain.priors.push(formula);
        self.push(ScopeKind::Elif, line, branch, Some(chain));
    }

    pub fn enter_else(&mut self, line: u32) {
        self.tag_until(line.saturating_sub(1));
        let Some(mut chain) = self.pop_chain(line, "#else") else {
            return;
        };
        self.tag_until(line);
        if chain.seen_else {
            self.report(
                DiagnosticKind::UnbalancedDirective,
                line,
                format!("second #else in the chain opened at line {}", chain.opened_at),
            );
        }
        let branch = Formula::not(Formula::or(chain.priors.clone()));
        // Anything after an `#else` is unreachable.
        chain.priors.push(Formula::True);
        chain.seen_else = true;
        self.push(ScopeKind::Else, line, branch, Some(chain));
    }

    pub fn exit(&mut self, line: u32, placement: Placement) {
        self.tag_until(line.saturating_sub(1));
        if placement == Placement::Inline && self.top_is_chain() {
            self.tag_until(line);
        }
        if self.pop_chain(line, "#endif").is_some() {
            self.tag_until(line);
        }
    }

    /// Start a labelled section. Closes the previous section together with
    /// any `#if` chain still open inside it.
    pub fn section(&mut self, line: u32, formula: Formula) {
        self.tag_until(line.saturating_sub(1));
        self.close_all();
        self.tag_until(line);
        self.push(ScopeKind::Section, line, formula, None);
    }

    /// Tag the remaining lines, force-close open scopes and hand back the
    /// table.
    #[must_use]
    pub fn finish(mut self, line_count: u32) -> PresenceTable {
        self.tag_until(line_count);
        self.close_all();
        PresenceTable {
            scopes: self.scopes,
            regions: self.regions,
            diagnostics: self.diagnostics,
        }
    }

    // ── Stack handling ──────────────────────────────────────────────────

    fn scope(&self, id: ScopeId) -> &ScopeRecord {
        &self.scopes[id.index()]
    }

    fn top_is_chain(&self) -> bool {
        self.stack.last().is_some_and(|frame| frame.chain.is_some())
    }

    fn push(&mut self, kind: ScopeKind, line: u32, formula: Formula, chain: Option<Chain>) {
        let parent = self.stack.last().map(|frame| frame.scope);
        let (outer, outer_unsat) = parent.map_or((Formula::True, false), |id| {
            let record = self.scope(id);
            (record.condition.clone(), record.unsatisfiable)
        });
        let condition = Formula::and([outer, formula.clone()]);

        let mut unsatisfiable = outer_unsat;
        if !outer_unsat
            && let Some(reason) = self.satisfiability.and_then(|check| check.check(&condition))
        {
            unsatisfiable = true;
            let message = reason.describe(&condition);
            self.report(DiagnosticKind::UnsatisfiableScope, line, message);
        }

        let id = ScopeId(u32::try_from(self.scopes.len()).unwrap_or(u32::MAX));
        self.scopes.push(ScopeRecord {
            id,
            kind,
            parent,
            line,
            formula,
            condition,
            unsatisfiable,
        });
        self.stack.push(Frame { scope: id, chain });
    }

    /// Pop the innermost `#if` chain, or report `directive` as unbalanced.
    fn pop_chain(&mut self, line: u32, directive: &str) -> Option<Chain> {
        if self.top_is_chain() {
            return self.stack.pop().and_then(|frame| frame.chain);
        }
        self.report(
            DiagnosticKind::UnbalancedDirective,
            line,
            format!("{directive} without a matching #if"),
        );
        None
    }

    fn close_all(&mut self) {
        while let Some(frame) = self.stack.pop() {
            if let Some(chain) = frame.chain {
                self.report(
                    DiagnosticKind::UnterminatedScope,
                    chain.opened_at,
                    format!(
                        "conditional opened at line {} is never closed",
                        chain.opened_at
                    ),
                );
            }
        }
    }

    // ── Line tagging ────────────────────────────────────────────────────

    /// Assign lines `cursor..=end` the current condition.
    fn tag_until(&mut self, end: u32) {
        if self.cursor > end {
            return;
        }
        let condition = self.condition();
        let scope = self.stack.last().map(|frame| frame.scope);
        match self.regions.last_mut() {
            Some(last)
                if last.end_line + 1 == self.cursor
                    && last.scope == scope
                    && last.condition == condition =>
            {
                last.end_line = end;
            }
            _ => self.regions.push(Region {
                start_line: self.cursor,
                end_line: end,
                condition,
                scope,
            }),
        }
        self.cursor = end + 1;
    }

    fn report(&mut self, kind: DiagnosticKind, line: u32, message: String) {
        self.diagnostics
            .push(Diagnostic::new(kind, Location::at(self.file.clone(), line), message));
    }
}
