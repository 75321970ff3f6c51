//! The two-phase parallel analysis pipeline.
//!
//! ```text
//! phase 1 (rayon)   detect dialect, harvest declarations -> FeatureStore
//! barrier           snapshot the store, find dependency cycles
//! phase 2 (rayon)   resolve events, run the presence engine per file
//! barrier           final snapshot, Consistency Checker
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use varimap_config::{DialectOverrides, VarimapConfig};
use varimap_core::{AliasPolicy, Diagnostic};
use varimap_dialect::{Detection, RawEvent, Resolver, SourceFile, detect, scan};
use varimap_model::FeatureStore;

use crate::checker::ConsistencyChecker;
use crate::error::EngineError;
use crate::file::{FileContext, FileOutcome, analyze_file};
use crate::report::AnalysisReport;
use crate::satisfiability::SatisfiabilityCheck;

// ---------------------------------------------------------------------------
// CancellationToken
// ---------------------------------------------------------------------------

/// Whole-run cancellation flag, checked before each file is scheduled.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn check(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisOptions
// ---------------------------------------------------------------------------

/// Run-time knobs, usually built from a [`VarimapConfig`].
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub policy: AliasPolicy,
    pub threshold: f64,
    pub check_satisfiability: bool,
    /// Explicit `token -> symbol` aliases.
    pub aliases: Vec<(String, String)>,
    pub overrides: DialectOverrides,
    /// Worker threads; `0` uses the global rayon pool.
    pub threads: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        let config = VarimapConfig::default();
        Self {
            policy: config.analysis.alias_policy,
            threshold: config.analysis.confidence_threshold,
            check_satisfiability: config.analysis.check_satisfiability,
            aliases: Vec::new(),
            overrides: DialectOverrides::default(),
            threads: config.engine.threads,
        }
    }
}

impl AnalysisOptions {
    /// Validate `config` and compile its dialect overrides.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] for out-of-range values, conflicting
    /// aliases or malformed override globs.
    pub fn from_config(config: &VarimapConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            policy: config.analysis.alias_policy,
            threshold: config.analysis.confidence_threshold,
            check_satisfiability: config.analysis.check_satisfiability,
            aliases: config
                .aliases
                .iter()
                .map(|alias| (alias.token.clone(), alias.symbol.clone()))
                .collect(),
            overrides: config.dialects.compile()?,
            threads: config.engine.threads,
        })
    }

    /// The dialect for `file`: a configured override, else auto-detection.
    #[must_use]
    pub fn detect(&self, file: &SourceFile) -> Detection {
        self.overrides.lookup(&file.path).map_or_else(
            || detect(&file.content, self.threshold),
            Detection::forced,
        )
    }
}

// ---------------------------------------------------------------------------
// Analyzer
// ---------------------------------------------------------------------------

/// Runs the full pipeline over a set of source files.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: AnalysisOptions,
    cancel: CancellationToken,
}

impl Analyzer {
    #[must_use]
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// # Errors
    ///
    /// Returns [`EngineError::Config`] when `config` is invalid.
    pub fn from_config(config: &VarimapConfig) -> Result<Self, EngineError> {
        Ok(Self::new(AnalysisOptions::from_config(config)?))
    }

    /// Share `token` with the caller so the run can be cancelled from
    /// another thread.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    #[must_use]
    pub const fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Analyse `files` and return the full report.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] when the token was triggered
    /// (no partial report), or [`EngineError::ThreadPool`] when a sized
    /// worker pool cannot be built.
    pub fn analyze(&self, files: &[SourceFile]) -> Result<AnalysisReport, EngineError> {
        if self.options.threads == 0 {
            return self.run(files);
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.threads)
            .build()?;
        pool.install(|| self.run(files))
    }

    fn run(&self, files: &[SourceFile]) -> Result<AnalysisReport, EngineError> {
        let mut files: Vec<&SourceFile> = files.iter().collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));

        // ── Phase 1: declarations ───────────────────────────────────────
        info!(files = files.len(), "phase 1: harvesting declarations");
        let store = FeatureStore::new();
        let detections: Vec<Detection> = files
            .par_iter()
            .map(|file| {
                self.cancel.check()?;
                let detection = self.options.detect(file);
                debug!(
                    path = %file.path,
                    dialect = %detection.dialect,
                    confidence = detection.confidence,
                    "dialect selected"
                );
                for event in scan(detection.dialect, &file.path, &file.content) {
                    if let RawEvent::Declare(feature) = event.event {
                        store.declare(*feature);
                    }
                }
                Ok(detection)
            })
            .collect::<Result<_, EngineError>>()?;

        let declared = store.snapshot();
        let cycles = declared.cycles();
        if !cycles.is_empty() {
            warn!(count = cycles.len(), "dependency cycles in the feature model");
        }
        info!(
            features = declared.len(),
            conflicts = declared.conflicts().len(),
            "phase 1 complete"
        );

        // ── Phase 2: presence conditions ────────────────────────────────
        let satisfiability = self
            .options
            .check_satisfiability
            .then(|| SatisfiabilityCheck::new(&declared));
        let resolver = Resolver::new(&declared, self.options.policy)
            .with_aliases(self.options.aliases.iter().cloned());
        let ctx = FileContext {
            resolver: &resolver,
            satisfiability: satisfiability.as_ref(),
            store: &store,
            threshold: self.options.threshold,
        };

        info!("phase 2: presence conditions");
        let outcomes: Vec<FileOutcome> = files
            .par_iter()
            .zip(detections.par_iter())
            .map(|(file, detection)| {
                self.cancel.check()?;
                Ok(analyze_file(&ctx, file, *detection))
            })
            .collect::<Result<_, EngineError>>()?;

        // ── Consistency check ───────────────────────────────────────────
        let model = store.snapshot();
        let mut reports = Vec::with_capacity(outcomes.len());
        let mut collected: Vec<Diagnostic> = Vec::new();
        for outcome in outcomes {
            reports.push(outcome.report);
            collected.extend(outcome.diagnostics);
        }
        let diagnostics = ConsistencyChecker::new(&model).finalize(&reports, collected);

        let fatal = diagnostics.iter().filter(|d| d.is_fatal()).count();
        if fatal > 0 {
            warn!(fatal, "feature model is inconsistent");
        }
        info!(
            features = model.len(),
            files = reports.len(),
            diagnostics = diagnostics.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            features: model.features().cloned().collect(),
            files: reports,
            diagnostics,
        })
    }
}
