use clap::Parser;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat, PolicyArg};
pub use root_commands::Commands;

/// Top-level CLI parser for the `vmap` binary.
#[derive(Debug, Parser)]
#[command(
    name = "vmap",
    version,
    about = "varimap - presence conditions and feature-model checks for configurable C/C++"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root holding `.varimap/config.toml` (defaults to the current directory)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Alias policy, overriding `analysis.alias_policy`
    #[arg(long, global = true)]
    pub policy: Option<PolicyArg>,

    /// Dialect confidence threshold, overriding `analysis.confidence_threshold`
    #[arg(long, global = true)]
    pub threshold: Option<f64>,

    /// Exit with status 1 when the report holds a fatal diagnostic
    #[arg(long, global = true)]
    pub deny_fatal: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            quiet: self.quiet,
            verbose: self.verbose,
            project: self.project.clone(),
            policy: self.policy.map(Into::into),
            threshold: self.threshold,
            deny_fatal: self.deny_fatal,
        }
    }
}
