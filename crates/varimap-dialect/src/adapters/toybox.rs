//! toybox dialect.
//!
//! The leading block comment holds the command's Kconfig entries and its
//! `USE_X(NEWTOY(...))` registration. A `USE_X(...)` call anywhere is an
//! inline conditional scope equivalent to `#ifdef CFG_X` around its
//! argument, closing on the line that holds the matching `)`.

use std::collections::VecDeque;

use crate::event::{Condition, RawEvent, SourceEvent};
use crate::kconfig::KconfigFragment;
use crate::lexer::{Lexer, Line};

use super::directive_event;

pub const PREFIXES: &[&str] = &["CFG_"];

const USE_PREFIX: &str = "USE_";

pub(super) fn confidence(content: &str) -> f64 {
    let mut header_config = false;
    let mut use_call = false;
    let mut newtoy = false;
    let mut toys_header = false;
    let mut cfg_directive = false;

    for line in Lexer::new(content) {
        let raw = line.raw.trim();
        if line.starts_in_comment && (raw.starts_with("config ") || raw.starts_with("menuconfig ")) {
            header_config = true;
        }
        use_call |= find_use_call(line.raw).is_some();
        newtoy |= raw.contains("NEWTOY(") || raw.contains("OLDTOY(");
        toys_header |= raw.contains("\"toys.h\"") || raw.starts_with("GLOBALS(");
        if let Some(directive) = &line.directive {
            cfg_directive |= directive.argument.contains("CFG_");
        }
    }

    let mut score = 0.0;
    if header_config {
        score += 0.4;
    }
    if use_call {
        score += 0.3;
    }
    if newtoy {
        score += 0.2;
    }
    if toys_header {
        score += 0.1;
    }
    if cfg_directive {
        score += 0.1;
    }
    score
}

fn find_use_call(text: &str) -> Option<usize> {
    let start = text.find(USE_PREFIX)?;
    let rest = &text[start + USE_PREFIX.len()..];
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    (name_len > 0 && rest[name_len..].trim_start().starts_with('(')).then_some(start)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Header {
    #[default]
    Pending,
    Inside,
    Done,
}

#[derive(Debug, Default)]
pub(crate) struct Scanner {
    header: Header,
    fragment: KconfigFragment,
    /// Parenthesis depth across the whole file.
    depth: usize,
    /// Depth at which each open `USE_X(` call returns.
    open_calls: Vec<usize>,
}

impl Scanner {
    pub(super) fn line(&mut self, line: &Line<'_>, path: &str, out: &mut VecDeque<SourceEvent>) {
        match self.header {
            Header::Pending if line.raw.trim().is_empty() => return,
            Header::Pending => {
                if let Some(text) = line.raw.trim_start().strip_prefix("/*") {
                    self.header = Header::Inside;
                    self.header_line(line.number, text, path, out);
                    return;
                }
                self.header = Header::Done;
            }
            Header::Inside => {
                self.header_line(line.number, line.raw, path, out);
                return;
            }
            Header::Done => {}
        }

        if let Some(event) = directive_event(line) {
            out.push_back(event);
            return;
        }
        self.calls(line.number, &line.code, true, out);
    }

    fn header_line(&mut self, number: u32, text: &str, path: &str, out: &mut VecDeque<SourceEvent>) {
        let (text, closes) = match text.find("*/") {
            Some(end) => (&text[..end], true),
            None => (text, false),
        };
        self.fragment.push(number, text);
        self.calls(number, text, false, out);
        if closes {
            self.header = Header::Done;
            out.extend(self.fragment.flush(path));
        }
    }

    pub(super) fn finish(&mut self, path: &str, out: &mut VecDeque<SourceEvent>) {
        out.extend(self.fragment.flush(path));
    }

    /// Track `USE_X(` calls and parentheses on one line of text.
    fn calls(&mut self, number: u32, text: &str, references: bool, out: &mut VecDeque<SourceEvent>) {
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            match b {
                b'"' | b'\'' => {
                    i += 1;
                    while i < bytes.len() && bytes[i] != b {
                        if bytes[i] == b'\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                    i += 1;
                }
                b'(' => {
                    self.depth += 1;
                    i += 1;
                }
                b')' => {
                    self.depth = self.depth.saturating_sub(1);
                    while self.open_calls.last() == Some(&self.depth) {
                        self.open_calls.pop();
                        out.push_back(SourceEvent::inline(number, RawEvent::Exit));
                    }
                    i += 1;
                }
                _ if b.is_ascii_alphabetic() || b == b'_' => {
                    let start = i;
                    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                        i += 1;
                    }
                    let ident = &text[start..i];
                    let next_paren = text[i..].trim_start().starts_with('(');
                    match ident.strip_prefix(USE_PREFIX) {
                        Some(name) if !name.is_empty() && next_paren => {
                            let condition = Condition::macro_name(&format!("{}{name}", PREFIXES[0]));
                            out.push_back(SourceEvent::inline(number, RawEvent::EnterIf(condition)));
                            self.open_calls.push(self.depth);
                        }
                        _ if references && ident.starts_with(PREFIXES[0]) && ident.len() > PREFIXES[0].len() => {
                            out.push_back(SourceEvent::directive(
                                number,
                                RawEvent::Reference(ident.to_string()),
                            ));
                        }
                        _ => {}
                    }
                }
                _ if b.is_ascii_digit() => {
                    while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scan;
    use pretty_assertions::assert_eq;
    use varimap_core::DialectKind;

    const GETS: &str = "/*
USE_GETS(NEWTOY(gets, 0, TOYFLAG_USR|TOYFLAG_BIN))

config GETS
  bool gets
  default n
  help
    usage: gets

config USE_GETS
  bool \"Use gets()\"
  default n
  depends on GETS
*/

#define FOR_gets
#include \"toys.h\"

void gets_main(void)
{
#ifdef CFG_USE_GETS
        gets(buf);
#endif
  if (CFG_TOYBOX_DEBUG) USE_GETS(puts(\"a\"),
    puts(\"b\"));
}
";

    fn summary(events: &[SourceEvent]) -> Vec<(u32, String)> {
        events
            .iter()
            .map(|e| {
                let label = match &e.event {
                    RawEvent::Declare(f) => format!("declare {}", f.name),
                    RawEvent::EnterIf(c) => format!("if {}", c.text),
                    RawEvent::Exit => "exit".to_string(),
                    RawEvent::Reference(t) => format!("ref {t}"),
                    other => format!("{other:?}"),
                };
                (e.line, label)
            })
            .collect()
    }

    #[test]
    fn gets_scores_high() {
        assert!(confidence(GETS) >= 0.9);
    }

    #[test]
    fn gets_events() {
        let events: Vec<SourceEvent> = scan(DialectKind::Toybox, "toys/example/gets.c", GETS).collect();
        let expected: Vec<(u32, String)> = vec![
            (2, "if CFG_GETS".into()),
            (2, "exit".into()),
            (4, "declare GETS".into()),
            (10, "declare USE_GETS".into()),
            (21, "if CFG_USE_GETS".into()),
            (23, "exit".into()),
            (24, "ref CFG_TOYBOX_DEBUG".into()),
            (24, "if CFG_GETS".into()),
            (25, "exit".into()),
        ];
        assert_eq!(summary(&events), expected);
        assert!(events[0].placement == crate::event::Placement::Inline);
    }

    #[test]
    fn use_call_detection_requires_paren() {
        assert_eq!(find_use_call("USE_GETS(x)"), Some(0));
        assert_eq!(find_use_call("int USE_GETS = 1;"), None);
    }
}
