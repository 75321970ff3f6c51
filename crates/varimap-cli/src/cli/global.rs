use clap::ValueEnum;
use varimap_core::AliasPolicy;

/// Shared output mode across all commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Raw,
}

/// `--policy` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PolicyArg {
    /// Prefixed spellings unify only through declared names.
    Strict,
    /// `CONFIG_`, `ENABLE_` and `CFG_` always map to the bare name.
    Unify,
}

impl From<PolicyArg> for AliasPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Strict => Self::Strict,
            PolicyArg::Unify => Self::Unify,
        }
    }
}

/// Global flags available before or after subcommands.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub quiet: bool,
    pub verbose: bool,
    pub project: Option<String>,
    pub policy: Option<AliasPolicy>,
    pub threshold: Option<f64>,
    pub deny_fatal: bool,
}
