//! Second-phase analysis of one file: resolve its events and run them
//! through the Presence Condition Engine.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};
use varimap_core::{Diagnostic, DiagnosticKind, DialectKind, Formula, Location};
use varimap_dialect::{Condition, Detection, RawEvent, Resolver, SourceFile, scan};
use varimap_model::FeatureStore;

use crate::presence::PresenceEngine;
use crate::report::{FileReport, ReferenceRecord};
use crate::satisfiability::SatisfiabilityCheck;

/// Shared, read-only state for the second phase.
pub(crate) struct FileContext<'a> {
    pub resolver: &'a Resolver<'a>,
    pub satisfiability: Option<&'a SatisfiabilityCheck<'a>>,
    /// Receives plain-dialect implicit registrations.
    pub store: &'a FeatureStore,
    pub threshold: f64,
}

/// Per-file output: the presence table slice and the file's own findings.
pub(crate) struct FileOutcome {
    pub report: FileReport,
    pub diagnostics: Vec<Diagnostic>,
}

struct FileAnalysis<'c, 'a> {
    ctx: &'c FileContext<'a>,
    path: &'c str,
    dialect: DialectKind,
    diagnostics: Vec<Diagnostic>,
    ambiguous: BTreeSet<String>,
}

pub(crate) fn analyze_file(
    ctx: &FileContext<'_>,
    file: &SourceFile,
    detection: Detection,
) -> FileOutcome {
    let mut analysis = FileAnalysis {
        ctx,
        path: &file.path,
        dialect: detection.dialect,
        diagnostics: Vec::new(),
        ambiguous: BTreeSet::new(),
    };
    let object = build_object(&file.path);
    let mut engine = PresenceEngine::new(file.path.as_str(), ctx.satisfiability);
    let mut references = Vec::new();
    let mut rules = Vec::new();

    for event in scan(detection.dialect, &file.path, &file.content) {
        let line = event.line;
        match event.event {
            RawEvent::Declare(_) => {}
            RawEvent::EnterIf(condition) => {
                let formula = analysis.lower(line, &condition);
                engine.enter_if(line, event.placement, formula);
            }
            RawEvent::EnterElif(condition) => {
                let formula = analysis.lower(line, &condition);
                engine.enter_elif(line, formula);
            }
            RawEvent::EnterElse => engine.enter_else(line),
            RawEvent::Exit => engine.exit(line, event.placement),
            RawEvent::Section(condition) => {
                let formula = condition.map_or(Formula::True, |c| analysis.lower(line, &c));
                engine.section(line, formula);
            }
            RawEvent::Reference(token) => {
                let resolution = ctx.resolver.canonicalize(&token, detection.dialect, &file.path);
                if let Some(message) = resolution.ambiguity {
                    analysis.ambiguity(line, &token, message);
                }
                references.push(ReferenceRecord {
                    line,
                    token,
                    symbol: resolution.symbol,
                    condition: engine.condition(),
                });
            }
            RawEvent::BuildRule { object: targets, condition } => {
                if targets.split_whitespace().any(|t| Some(t) == object.as_deref()) {
                    rules.push(analysis.lower(line, &condition));
                }
            }
            RawEvent::Malformed { text, reason } => {
                analysis.report(
                    DiagnosticKind::MalformedCondition,
                    line,
                    format!("cannot interpret '{text}': {reason}"),
                );
            }
        }
    }

    let table = engine.finish(file.line_count());
    let mut diagnostics = analysis.diagnostics;
    diagnostics.extend(table.diagnostics);

    if detection.fallback {
        warn!(
            path = %file.path,
            confidence = detection.confidence,
            "no dialect reached the confidence threshold; using plain"
        );
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::LowConfidence,
            Location::file(file.path.clone()),
            format!(
                "no dialect reached confidence {:.2} (best {:.2}); analysed as plain",
                ctx.threshold, detection.confidence
            ),
        ));
        for diagnostic in &mut diagnostics {
            diagnostic.low_confidence = true;
        }
    }

    debug!(
        path = %file.path,
        dialect = %detection.dialect,
        scopes = table.scopes.len(),
        regions = table.regions.len(),
        diagnostics = diagnostics.len(),
        "file analysed"
    );

    FileOutcome {
        report: FileReport {
            path: file.path.clone(),
            dialect: detection.dialect,
            confidence: detection.confidence,
            fallback: detection.fallback,
            file_condition: if rules.is_empty() {
                Formula::True
            } else {
                Formula::or(rules)
            },
            scopes: table.scopes,
            regions: table.regions,
            references,
        },
        diagnostics,
    }
}

/// `src/io-file.c` is built as `io-file.o`.
fn build_object(path: &str) -> Option<String> {
    Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| format!("{stem}.o"))
}

impl FileAnalysis<'_, '_> {
    /// Resolve a condition into a formula, reporting parse failures and
    /// alias ambiguities, and registering plain-dialect symbols.
    fn lower(&mut self, line: u32, condition: &Condition) -> Formula {
        if let Some(failure) = &condition.malformed {
            self.report(
                DiagnosticKind::MalformedCondition,
                line,
                format!("cannot parse condition '{}': {failure}", condition.text),
            );
        }

        let mut ambiguous = Vec::new();
        let formula = self.ctx.resolver.condition(
            condition,
            self.dialect,
            self.path,
            &mut |token, resolution| {
                if let Some(message) = &resolution.ambiguity {
                    ambiguous.push((token.to_string(), message.clone()));
                }
            },
        );
        for (token, message) in ambiguous {
            self.ambiguity(line, &token, message);
        }

        if self.dialect == DialectKind::Plain {
            for symbol in formula.symbols() {
                if !symbol.is_file_local() {
                    self.ctx
                        .store
                        .declare_implicit(&symbol.name, Location::at(self.path, line));
                }
            }
        }
        formula
    }

    /// One `AliasAmbiguity` per token and file.
    fn ambiguity(&mut self, line: u32, token: &str, message: String) {
        if self.ambiguous.insert(token.to_string()) {
            self.report(DiagnosticKind::AliasAmbiguity, line, message);
        }
    }

    fn report(&mut self, kind: DiagnosticKind, line: u32, message: String) {
        self.diagnostics
            .push(Diagnostic::new(kind, Location::at(self.path, line), message));
    }
}
