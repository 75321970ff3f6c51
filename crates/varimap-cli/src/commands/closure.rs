use anyhow::Context;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::ClosureArgs;
use crate::commands::enforce_deny_fatal;
use crate::context::AppContext;
use crate::output::output;

#[derive(Debug, Serialize)]
struct ClosureResponse {
    symbol: String,
    /// Every feature `symbol` transitively depends on.
    depends_on: Vec<String>,
    /// Literals that must hold for `symbol` to be enabled.
    requires: Vec<RequiredLiteral>,
    cyclic: bool,
}

#[derive(Debug, Serialize)]
struct RequiredLiteral {
    symbol: String,
    enabled: bool,
}

/// Handle `vmap closure`.
pub fn handle(args: &ClosureArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = ctx.analyze(&args.paths)?;
    let model = report.model();

    let depends_on = model
        .dependency_closure(&args.symbol)
        .with_context(|| format!("cannot compute the closure of '{}'", args.symbol))?;
    let requires = model
        .required_literals(&args.symbol)
        .into_iter()
        .map(|(symbol, enabled)| RequiredLiteral { symbol, enabled })
        .collect();

    let response = ClosureResponse {
        cyclic: model.cyclic_symbols().contains(&args.symbol),
        symbol: args.symbol.clone(),
        depends_on: depends_on.into_iter().collect(),
        requires,
    };
    output(&response, flags.format)?;

    enforce_deny_fatal(&report, flags)
}
