//! Kconfig fragment parser shared by the kbuild and toybox dialects.
//!
//! ```text
//! config PERFORM_CHMOD
//!     bool "Run chmod on a path"
//!     default false
//!     depends INCLUDE_IO_FILE
//!     help
//!       Longer description.
//! ```
//!
//! Supported: `config` / `menuconfig`, `bool` / `boolean` / `tristate` with
//! an optional prompt, `prompt`, `def_bool`, `def_tristate`,
//! `default V [if E]` (first one wins), `depends on E` and the busybox short
//! form `depends E`, `select S [if E]`, `help` / `---help---`, and
//! `if E` ... `endif` blocks. Everything else is skipped.

use varimap_core::{DefaultValue, FeatureKind, FeatureSymbol, Formula, Location, Tristate};

use crate::event::{RawEvent, SourceEvent};
use crate::expr::{RawExpr, Syntax, parse_lenient};

/// Collects the lines of one fragment, then turns them into `Declare`
/// events (plus `Malformed` for expressions that failed to parse).
#[derive(Debug, Default)]
pub struct KconfigFragment {
    lines: Vec<(u32, String)>,
}

impl KconfigFragment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: u32, text: impl Into<String>) {
        self.lines.push((line, text.into()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Parse the collected lines and reset the buffer.
    pub fn flush(&mut self, file: &str) -> Vec<SourceEvent> {
        let lines = std::mem::take(&mut self.lines);
        parse_fragment(&lines, file)
    }
}

struct Entry {
    line: u32,
    feature: FeatureSymbol,
    has_default: bool,
}

/// Parse a whole fragment.
#[must_use]
pub fn parse_fragment(lines: &[(u32, String)], file: &str) -> Vec<SourceEvent> {
    let mut events = Vec::new();
    let mut current: Option<Entry> = None;
    let mut if_stack: Vec<Formula> = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let (number, text) = (lines[idx].0, lines[idx].1.as_str());
        idx += 1;

        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (keyword, rest) = split_keyword(trimmed);

        match keyword {
            "config" | "menuconfig" => {
                finish(current.take(), &if_stack, &mut events);
                let name = rest.split_whitespace().next().unwrap_or_default();
                if name.is_empty() {
                    events.push(malformed(number, trimmed, "config without a name"));
                    continue;
                }
                current = Some(Entry {
                    line: number,
                    feature: FeatureSymbol::boolean(name, Location::at(file, number)),
                    has_default: false,
                });
            }
            "if" => {
                finish(current.take(), &if_stack, &mut events);
                let condition = expression(rest, number, &mut events);
                if_stack.push(condition);
            }
            "endif" => {
                finish(current.take(), &if_stack, &mut events);
                if if_stack.pop().is_none() {
                    events.push(malformed(number, trimmed, "endif without if"));
                }
            }
            "menu" | "endmenu" | "choice" | "endchoice" | "comment" | "source" | "mainmenu" => {
                finish(current.take(), &if_stack, &mut events);
            }
            _ => {
                let Some(entry) = current.as_mut() else {
                    continue;
                };
                if matches!(keyword, "help" | "---help---") {
                    let (help, consumed) = help_text(&lines[idx..]);
                    idx += consumed;
                    if !help.is_empty() {
                        entry.feature.help = Some(help);
                    }
                    continue;
                }
                attribute(entry, keyword, rest, number, &mut events);
            }
        }
    }
    finish(current, &if_stack, &mut events);
    events
}

fn attribute(
    entry: &mut Entry,
    keyword: &str,
    rest: &str,
    line: u32,
    events: &mut Vec<SourceEvent>,
) {
    let feature = &mut entry.feature;
    match keyword {
        "bool" | "boolean" | "tristate" => {
            feature.kind = kind_of(keyword);
            if let Some(prompt) = prompt_text(rest) {
                feature.prompt = Some(prompt);
            }
        }
        "prompt" => feature.prompt = prompt_text(rest),
        "def_bool" | "def_tristate" => {
            feature.kind = kind_of(keyword);
            if !entry.has_default {
                feature.default = default_value(rest, line, events);
                entry.has_default = true;
            }
        }
        "default" => {
            if !entry.has_default {
                feature.default = default_value(rest, line, events);
                entry.has_default = true;
            }
        }
        "depends" => {
            let text = rest
                .strip_prefix("on")
                .filter(|r| r.starts_with(char::is_whitespace))
                .unwrap_or(rest);
            let condition = expression(text, line, events);
            feature.depends = Some(match feature.depends.take() {
                Some(existing) => Formula::and([existing, condition]),
                None => condition,
            });
        }
        "select" => {
            if let Some(target) = rest.split_whitespace().next() {
                feature.selects.push(target.to_string());
            }
        }
        _ => {}
    }
}

fn finish(entry: Option<Entry>, if_stack: &[Formula], events: &mut Vec<SourceEvent>) {
    let Some(mut entry) = entry else {
        return;
    };
    if !if_stack.is_empty() {
        let enclosing = Formula::and(if_stack.iter().cloned());
        entry.feature.depends = Some(match entry.feature.depends.take() {
            Some(own) => Formula::and([enclosing, own]),
            None => enclosing,
        });
    }
    events.push(SourceEvent::directive(
        entry.line,
        RawEvent::Declare(Box::new(entry.feature)),
    ));
}

fn kind_of(keyword: &str) -> FeatureKind {
    match keyword {
        "tristate" | "def_tristate" => FeatureKind::Tristate,
        _ => FeatureKind::Boolean,
    }
}

fn split_keyword(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(pos) => (&text[..pos], text[pos..].trim()),
        None => (text, ""),
    }
}

/// `"quoted prompt" [if E]` or an unquoted word list.
fn prompt_text(rest: &str) -> Option<String> {
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    if let Some(quoted) = rest.strip_prefix('"') {
        let end = quoted.find('"').unwrap_or(quoted.len());
        return Some(quoted[..end].to_string());
    }
    let text = rest.split(" if ").next().unwrap_or(rest).trim();
    Some(text.to_string())
}

/// `V [if E]`, where `V` is a literal or an expression.
fn default_value(rest: &str, line: u32, events: &mut Vec<SourceEvent>) -> DefaultValue {
    let (value_text, guard_text) = match rest.split_once(" if ") {
        Some((value, guard)) => (value.trim(), Some(guard.trim())),
        None => (rest.trim(), None),
    };
    let value = match Tristate::from_literal(value_text) {
        Some(literal) => DefaultValue::Value(literal),
        None => DefaultValue::Expr(expression(value_text, line, events)),
    };
    let Some(guard_text) = guard_text else {
        return value;
    };
    let guard = expression(guard_text, line, events);
    match value {
        DefaultValue::Value(Tristate::No) => value,
        DefaultValue::Value(_) => DefaultValue::Expr(guard),
        DefaultValue::Expr(expr) => DefaultValue::Expr(Formula::and([expr, guard])),
    }
}

/// Parse a Kconfig expression into a formula over feature names.
fn expression(text: &str, line: u32, events: &mut Vec<SourceEvent>) -> Formula {
    let (expr, failure) = parse_lenient(text, Syntax::Kconfig);
    if let Some(failure) = failure {
        events.push(malformed(line, text, &failure.reason));
    }
    lower_feature_ref(&expr)
}

/// Lower an expression whose identifiers are already feature names.
#[must_use]
pub fn lower_feature_ref(expr: &RawExpr) -> Formula {
    expr.lower(&mut |name| Formula::var(name))
}

/// Help text: lines indented at least as deep as the first non-blank one.
fn help_text(lines: &[(u32, String)]) -> (String, usize) {
    let mut indent: Option<usize> = None;
    let mut collected: Vec<&str> = Vec::new();
    let mut consumed = 0;

    for (_, text) in lines {
        if text.trim().is_empty() {
            collected.push("");
            consumed += 1;
            continue;
        }
        let width = indentation(text);
        let required = *indent.get_or_insert(width);
        if width < required || (width == 0 && is_entry_start(text)) {
            break;
        }
        collected.push(text.trim());
        consumed += 1;
    }

    while collected.last().is_some_and(|l| l.is_empty()) {
        collected.pop();
    }
    (collected.join("\n"), consumed)
}

fn is_entry_start(text: &str) -> bool {
    matches!(
        split_keyword(text.trim()).0,
        "config" | "menuconfig" | "if" | "endif" | "menu" | "endmenu" | "choice" | "source"
    )
}

fn indentation(text: &str) -> usize {
    text.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 8 } else { 1 })
        .sum()
}

fn malformed(line: u32, text: &str, reason: &str) -> SourceEvent {
    SourceEvent::directive(
        line,
        RawEvent::Malformed {
            text: text.trim().to_string(),
            reason: reason.to_string(),
        },
    )
}
