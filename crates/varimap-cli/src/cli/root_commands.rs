use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Analyse sources and print the full report.
    Analyze(PathArgs),
    /// Print the feature model declared by the sources.
    Model(PathArgs),
    /// Print the transitive `depends on` closure of one feature.
    Closure(ClosureArgs),
    /// Report which lines are compiled under a Kconfig `.config`.
    Eval(EvalArgs),
    /// Print the JSON Schema of an output type.
    Schema(SchemaArgs),
}

#[derive(Clone, Debug, Args)]
pub struct PathArgs {
    /// Source files or directories to analyse.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct ClosureArgs {
    /// Canonical feature name, e.g. `PERFORM_CHMOD`.
    pub symbol: String,

    /// Source files or directories to analyse.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct EvalArgs {
    /// Path to a `.config` file (`CONFIG_X=y`, `# CONFIG_Y is not set`).
    #[arg(short, long)]
    pub config: PathBuf,

    /// Source files or directories to analyse.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct SchemaArgs {
    /// Output type to describe.
    #[arg(value_enum, default_value = "report")]
    pub kind: SchemaKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SchemaKind {
    /// `vmap analyze` output.
    Report,
    /// `vmap eval` output.
    Evaluation,
    /// One feature of `vmap model`.
    Feature,
    Diagnostic,
}
