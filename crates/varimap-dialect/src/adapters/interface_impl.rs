//! Interface/implementation dialect (Fiasco preprocess).
//!
//! Files are split by label lines:
//!
//! ```text
//! INTERFACE:
//! IMPLEMENTATION[define_useless_function]:
//! PUBLIC IMPLEMENTATION[ia32-debug]:
//! IMPLEMENTATION:
//! ```
//!
//! A bracketed label guards the whole section with a feature-reference
//! expression; an unbracketed label is unconditional.

use std::collections::VecDeque;

use crate::event::{Condition, RawEvent, SourceEvent};
use crate::lexer::{Lexer, Line};

use super::directive_event;

pub const PREFIXES: &[&str] = &["CONFIG_"];

/// A recognized section label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<'a> {
    pub section: &'a str,
    /// Bracket contents, if any and non-empty.
    pub expr: Option<&'a str>,
}

/// Parse a label line such as `PUBLIC IMPLEMENTATION[x]:`.
#[must_use]
pub fn parse_label(code: &str) -> Option<Label<'_>> {
    let mut text = code.trim();
    for visibility in ["PUBLIC", "PRIVATE"] {
        if let Some(rest) = text.strip_prefix(visibility)
            && rest.starts_with(char::is_whitespace)
        {
            text = rest.trim_start();
        }
    }
    let section = ["INTERFACE", "IMPLEMENTATION"]
        .into_iter()
        .find(|keyword| text.starts_with(keyword))?;
    let mut rest = text[section.len()..].trim_start();

    let mut expr = None;
    if let Some(inner) = rest.strip_prefix('[') {
        let close = inner.find(']')?;
        let body = inner[..close].trim();
        expr = (!body.is_empty()).then_some(body);
        rest = inner[close + 1..].trim_start();
    }
    (rest == ":").then_some(Label { section, expr })
}

pub(super) fn confidence(content: &str) -> f64 {
    let mut any_label = false;
    let mut interface = false;
    let mut implementation = false;
    let mut bracketed = false;

    for line in Lexer::new(content) {
        if let Some(label) = parse_label(&line.code) {
            any_label = true;
            interface |= label.section == "INTERFACE";
            implementation |= label.section == "IMPLEMENTATION";
            bracketed |= label.expr.is_some();
        }
    }

    let mut score = 0.0;
    if any_label {
        score += 0.6;
    }
    if interface && implementation {
        score += 0.3;
    }
    if bracketed {
        score += 0.1;
    }
    score
}

pub(super) fn line(line: &Line<'_>, out: &mut VecDeque<SourceEvent>) {
    if let Some(event) = directive_event(line) {
        out.push_back(event);
        return;
    }
    if let Some(label) = parse_label(&line.code) {
        let condition = label.expr.map(Condition::section);
        out.push_back(SourceEvent::directive(line.number, RawEvent::Section(condition)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scan;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use varimap_core::DialectKind;

    #[rstest]
    #[case("INTERFACE:", Some(("INTERFACE", None)))]
    #[case("IMPLEMENTATION:", Some(("IMPLEMENTATION", None)))]
    #[case("IMPLEMENTATION[define_useless_function]:", Some(("IMPLEMENTATION", Some("define_useless_function"))))]
    #[case("PUBLIC IMPLEMENTATION [ia32-debug] :", Some(("IMPLEMENTATION", Some("ia32-debug"))))]
    #[case("IMPLEMENTATION[]:", Some(("IMPLEMENTATION", None)))]
    #[case("IMPLEMENTATION_DETAIL:", None)]
    #[case("INTERFACE: int x;", None)]
    #[case("printf(\"INTERFACE:\");", None)]
    fn labels(#[case] code: &str, #[case] expected: Option<(&str, Option<&str>)>) {
        let parsed = parse_label(code).map(|label| (label.section, label.expr));
        assert_eq!(parsed, expected);
    }

    #[test]
    fn fiasco_sample_sections() {
        let src = "INTERFACE:\n\n#define BUF_SIZE 25\n\nIMPLEMENTATION[define_useless_function]:\n\nvoid f() {}\n\nIMPLEMENTATION:\n";
        assert!((confidence(src) - 1.0).abs() < 1e-9);
        let events: Vec<SourceEvent> = scan(DialectKind::InterfaceImpl, "main.cpp", src).collect();
        let sections: Vec<(u32, Option<String>)> = events
            .iter()
            .filter_map(|e| match &e.event {
                RawEvent::Section(c) => Some((e.line, c.as_ref().map(|c| c.text.clone()))),
                _ => None,
            })
            .collect();
        assert_eq!(
            sections,
            vec![
                (1, None),
                (5, Some("define_useless_function".to_string())),
                (9, None),
            ]
        );
    }
}
