//! Terminal preferences for `--format table`: whether cells are coloured and
//! how wide a table may grow.
//!
//! `VARIMAP_COLOR=always|never` overrides terminal detection and `NO_COLOR`.
//! `VARIMAP_TABLE_WIDTH` takes precedence over `COLUMNS`.

use std::io::IsTerminal;
use std::sync::OnceLock;

use crate::cli::{GlobalFlags, OutputFormat};

/// Narrower terminals get unclipped tables.
const MIN_TABLE_WIDTH: usize = 40;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiPrefs {
    pub table_color: bool,
    pub table_width: Option<usize>,
}

impl UiPrefs {
    fn detect(flags: &GlobalFlags, stdout_tty: bool, env: impl Fn(&str) -> Option<String>) -> Self {
        let tables = flags.format == OutputFormat::Table;
        let table_color = match env("VARIMAP_COLOR").as_deref() {
            Some("always") => tables,
            Some("never") => false,
            _ => tables && stdout_tty && !flags.quiet && env("NO_COLOR").is_none(),
        };
        let table_width = ["VARIMAP_TABLE_WIDTH", "COLUMNS"]
            .into_iter()
            .find_map(|key| env(key).and_then(|value| value.trim().parse::<usize>().ok()))
            .filter(|width| *width >= MIN_TABLE_WIDTH);
        Self {
            table_color,
            table_width,
        }
    }
}

static UI_PREFS: OnceLock<UiPrefs> = OnceLock::new();

pub fn init(flags: &GlobalFlags) {
    let prefs = UiPrefs::detect(flags, std::io::stdout().is_terminal(), |key| {
        std::env::var(key).ok()
    });
    let _ = UI_PREFS.set(prefs);
}

#[must_use]
pub fn prefs() -> UiPrefs {
    UI_PREFS.get().copied().unwrap_or_default()
}

/// ANSI colour for a table cell: severities by weight, presence and
/// evaluation booleans green or red. Other cells stay uncoloured.
#[must_use]
pub fn cell_color(cell: &str) -> Option<&'static str> {
    match cell {
        "fatal" => Some("1;31"),
        "error" | "false" => Some("31"),
        "warning" => Some("33"),
        "info" => Some("36"),
        "true" => Some("32"),
        _ if cell.ends_with("(low confidence)") => Some("2"),
        _ => None,
    }
}
