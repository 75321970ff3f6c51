//! The closed set of dialect adapters behind one `scan` capability.
//!
//! Each adapter contributes a confidence score for auto-detection, its
//! prefix alias rules, and a line scanner that feeds an [`EventStream`].

pub mod interface_impl;
pub mod kbuild;
pub mod plain;
pub mod toybox;

use std::collections::VecDeque;

use varimap_core::DialectKind;

use crate::event::{Condition, RawEvent, SourceEvent};
use crate::lexer::{DirectiveKind, Lexer, Line};

/// Confidence in `[0, 1]` that `content` is written in `dialect`.
#[must_use]
pub fn confidence(dialect: DialectKind, content: &str) -> f64 {
    let score = match dialect {
        DialectKind::Kbuild => kbuild::confidence(content),
        DialectKind::Toybox => toybox::confidence(content),
        DialectKind::InterfaceImpl => interface_impl::confidence(content),
        DialectKind::Plain => plain::CONFIDENCE,
    };
    score.clamp(0.0, 1.0)
}

/// Macro prefixes the dialect's alias rules strip.
#[must_use]
pub const fn prefix_rules(dialect: DialectKind) -> &'static [&'static str] {
    match dialect {
        DialectKind::Kbuild => kbuild::PREFIXES,
        DialectKind::Toybox => toybox::PREFIXES,
        DialectKind::InterfaceImpl => interface_impl::PREFIXES,
        DialectKind::Plain => &[],
    }
}

/// Start a lazy scan of `content`.
#[must_use]
pub fn scan<'a>(dialect: DialectKind, path: &'a str, content: &'a str) -> EventStream<'a> {
    let scanner = match dialect {
        DialectKind::Kbuild => Scanner::Kbuild(kbuild::Scanner::default()),
        DialectKind::Toybox => Scanner::Toybox(toybox::Scanner::default()),
        DialectKind::InterfaceImpl => Scanner::InterfaceImpl,
        DialectKind::Plain => Scanner::Plain,
    };
    EventStream {
        path,
        lexer: Lexer::new(content),
        scanner,
        pending: VecDeque::new(),
        finished: false,
    }
}

enum Scanner {
    Kbuild(kbuild::Scanner),
    Toybox(toybox::Scanner),
    InterfaceImpl,
    Plain,
}

/// Lazy sequence of [`SourceEvent`]s. Lines are lexed only as events are
/// pulled.
pub struct EventStream<'a> {
    path: &'a str,
    lexer: Lexer<'a>,
    scanner: Scanner,
    pending: VecDeque<SourceEvent>,
    finished: bool,
}

impl Iterator for EventStream<'_> {
    type Item = SourceEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }
            match self.lexer.next() {
                Some(line) => match &mut self.scanner {
                    Scanner::Kbuild(scanner) => scanner.line(&line, self.path, &mut self.pending),
                    Scanner::Toybox(scanner) => scanner.line(&line, self.path, &mut self.pending),
                    Scanner::InterfaceImpl => interface_impl::line(&line, &mut self.pending),
                    Scanner::Plain => plain::line(&line, &mut self.pending),
                },
                None => {
                    self.finished = true;
                    match &mut self.scanner {
                        Scanner::Kbuild(scanner) => scanner.finish(self.path, &mut self.pending),
                        Scanner::Toybox(scanner) => scanner.finish(self.path, &mut self.pending),
                        Scanner::InterfaceImpl | Scanner::Plain => {}
                    }
                }
            }
        }
    }
}

// ── Shared helpers ─────────────────────────────────────────────────

/// Translate a conditional directive into its event.
pub(crate) fn directive_event(line: &Line<'_>) -> Option<SourceEvent> {
    let directive = line.directive.as_ref()?;
    let arg = directive.argument.as_str();
    let event = match directive.kind {
        DirectiveKind::If => RawEvent::EnterIf(Condition::preprocessor(arg)),
        DirectiveKind::Elif => RawEvent::EnterElif(Condition::preprocessor(arg)),
        DirectiveKind::Ifdef => RawEvent::EnterIf(macro_condition(arg, false)),
        DirectiveKind::Ifndef => RawEvent::EnterIf(macro_condition(arg, true)),
        DirectiveKind::Elifdef => RawEvent::EnterElif(macro_condition(arg, false)),
        DirectiveKind::Elifndef => RawEvent::EnterElif(macro_condition(arg, true)),
        DirectiveKind::Else => RawEvent::EnterElse,
        DirectiveKind::Endif => RawEvent::Exit,
    };
    Some(SourceEvent::directive(line.number, event))
}

fn macro_condition(argument: &str, negated: bool) -> Condition {
    match argument.split_whitespace().next() {
        Some(name) if is_identifier(name) => {
            if negated {
                Condition::not_macro_name(name)
            } else {
                Condition::macro_name(name)
            }
        }
        // Let the expression parser produce the diagnostic.
        _ => Condition::preprocessor(argument),
    }
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Identifiers in `code` with their byte offsets, skipping string and
/// character literals.
pub(crate) fn identifiers(code: &str) -> Vec<(usize, &str)> {
    let bytes = code.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' || b == b'\'' {
            i += 1;
            while i < bytes.len() && bytes[i] != b {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i += 1;
        } else if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            out.push((start, &code[start..i]));
        } else if b.is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
        } else {
            i += 1;
        }
    }
    out
}
