use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};
use varimap_config::VarimapConfig;
use varimap_engine::{AnalysisReport, Analyzer};

use crate::cli::GlobalFlags;
use crate::walk;

/// Loaded configuration plus the analyzer built from it.
pub struct AppContext {
    pub analyzer: Analyzer,
}

impl AppContext {
    /// Load `.env`, the layered configuration and the command-line overrides.
    pub fn init(flags: &GlobalFlags) -> anyhow::Result<Self> {
        let project_root = resolve_project_root(flags.project.as_deref())?;
        load_project_dotenv(&project_root)?;

        let mut config = VarimapConfig::load_from(&project_root).with_context(|| {
            format!(
                "failed to load configuration for {}",
                project_root.display()
            )
        })?;
        apply_flags(&mut config, flags);

        let analyzer = Analyzer::from_config(&config).context("invalid analysis options")?;
        debug!(
            root = %project_root.display(),
            policy = %config.analysis.alias_policy,
            threshold = config.analysis.confidence_threshold,
            "configuration loaded"
        );

        Ok(Self { analyzer })
    }

    /// Discover the sources under `paths` and run the full pipeline.
    pub fn analyze(&self, paths: &[PathBuf]) -> anyhow::Result<AnalysisReport> {
        let files = walk::collect_sources(paths)?;
        if files.is_empty() {
            warn!("no C/C++ sources found under the given paths");
        }
        self.analyzer
            .analyze(&files)
            .context("analysis did not complete")
    }
}

/// Command-line values win over every configuration layer.
fn apply_flags(config: &mut VarimapConfig, flags: &GlobalFlags) {
    if let Some(policy) = flags.policy {
        config.analysis.alias_policy = policy;
    }
    if let Some(threshold) = flags.threshold {
        config.analysis.confidence_threshold = threshold;
    }
}

fn resolve_project_root(project_override: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(path) = project_override {
        let explicit = PathBuf::from(path);
        if explicit
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == ".varimap")
        {
            return explicit
                .parent()
                .map(Path::to_path_buf)
                .context("invalid --project path: '.varimap' directory has no parent");
        }
        if explicit.is_dir() {
            return Ok(explicit);
        }
        anyhow::bail!(
            "invalid --project '{}': directory does not exist",
            explicit.display()
        );
    }

    std::env::current_dir().context("failed to read current directory")
}

/// Load `<root>/.env` when present so `VARIMAP_*` values from it reach the
/// environment layer.
fn load_project_dotenv(root: &Path) -> anyhow::Result<()> {
    let env_path = root.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }
    Ok(())
}
