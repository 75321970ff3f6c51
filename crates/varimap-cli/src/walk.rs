//! Source discovery for the analysis commands.
//!
//! Directories are walked with the `ignore` crate, so `.gitignore` and a
//! project-level `.varimapignore` are respected. Files named explicitly on
//! the command line are always analysed, whatever their extension.

use std::path::{Path, PathBuf};

use anyhow::Context;
use ignore::WalkBuilder;
use tracing::debug;
use varimap_dialect::SourceFile;

/// Extensions of C and C++ translation units and headers.
const SOURCE_EXTENSIONS: &[&str] = &["c", "h", "cc", "cpp", "cxx", "hh", "hpp", "hxx", "inc"];

/// Collect the sources under `paths`, sorted and deduplicated by path.
pub fn collect_sources(paths: &[PathBuf]) -> anyhow::Result<Vec<SourceFile>> {
    let mut found: Vec<PathBuf> = Vec::new();
    for path in paths {
        if path.is_file() {
            found.push(path.clone());
        } else if path.is_dir() {
            found.extend(walk_dir(path)?);
        } else {
            anyhow::bail!("'{}' does not exist", path.display());
        }
    }
    found.sort();
    found.dedup();

    found
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            SourceFile::from_bytes(display_path(path), bytes).map_err(anyhow::Error::from)
        })
        .collect()
}

fn walk_dir(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(root);
    builder.hidden(false);
    builder.add_custom_ignore_filename(".varimapignore");
    builder.filter_entry(|entry| {
        let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
        !(is_dir && matches!(entry.file_name().to_str(), Some(".git" | ".varimap")))
    });

    let mut out = Vec::new();
    for entry in builder.build() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_some_and(|ft| ft.is_file()) && is_source(entry.path()) {
            out.push(entry.into_path());
        }
    }
    debug!(root = %root.display(), files = out.len(), "walked source directory");
    Ok(out)
}

fn is_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Forward-slash path without a leading `./`, so dialect override globs and
/// report paths look the same on every platform.
fn display_path(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    text.strip_prefix("./").map_or_else(|| text.clone(), str::to_string)
}
