//! kbuild / busybox dialect.
//!
//! ```c
//! //config:config PERFORM_CHMOD
//! //config:   bool "Run chmod on a path"
//! //config:   depends INCLUDE_IO_FILE
//!
//! //kbuild:obj-$(CONFIG_INCLUDE_IO_FILE) += io-file.o
//!
//! #ifdef CONFIG_PERFORM_CHMOD
//! ```

use std::collections::{BTreeSet, VecDeque};

use crate::event::{Condition, RawEvent, SourceEvent};
use crate::kconfig::KconfigFragment;
use crate::lexer::{Lexer, Line};

use super::{directive_event, identifiers};

pub const PREFIXES: &[&str] = &["CONFIG_", "ENABLE_"];

const CONFIG_MARKER: &str = "//config:";
const KBUILD_MARKER: &str = "//kbuild:";

pub(super) fn confidence(content: &str) -> f64 {
    let mut config_block = false;
    let mut build_rule = false;
    let mut config_directive = false;
    let mut enable_use = false;

    for line in Lexer::new(content) {
        let raw = line.raw.trim_start();
        config_block |= raw.starts_with(CONFIG_MARKER);
        build_rule |= raw.starts_with(KBUILD_MARKER);
        if let Some(directive) = &line.directive {
            config_directive |= directive.argument.contains("CONFIG_");
        }
        enable_use |= identifiers(&line.code)
            .iter()
            .any(|(_, ident)| ident.starts_with("ENABLE_") || ident.starts_with("IF_"));
    }

    let mut score = 0.0;
    if config_block {
        score += 0.6;
    }
    if build_rule {
        score += 0.3;
    }
    if config_directive {
        score += 0.2;
    }
    if enable_use {
        score += 0.1;
    }
    score
}

#[derive(Debug, Default)]
pub(crate) struct Scanner {
    fragment: KconfigFragment,
}

impl Scanner {
    pub(super) fn line(&mut self, line: &Line<'_>, path: &str, out: &mut VecDeque<SourceEvent>) {
        let raw = line.raw.trim_start();
        if let Some(text) = raw.strip_prefix(CONFIG_MARKER) {
            self.fragment.push(line.number, text);
            return;
        }
        if !self.fragment.is_empty() {
            out.extend(self.fragment.flush(path));
        }

        if let Some(rule) = raw.strip_prefix(KBUILD_MARKER) {
            out.push_back(build_rule(line.number, rule));
            return;
        }
        if let Some(event) = directive_event(line) {
            out.push_back(event);
            return;
        }
        let mut seen = BTreeSet::new();
        for (_, ident) in identifiers(&line.code) {
            if let Some(token) = reference_token(ident)
                && seen.insert(token.clone())
            {
                out.push_back(SourceEvent::directive(line.number, RawEvent::Reference(token)));
            }
        }
    }

    pub(super) fn finish(&mut self, path: &str, out: &mut VecDeque<SourceEvent>) {
        out.extend(self.fragment.flush(path));
    }
}

/// `CONFIG_X` and `ENABLE_X` are used as-is; busybox's `IF_X(...)` and
/// `IF_NOT_X(...)` wrappers refer to `CONFIG_X`.
fn reference_token(ident: &str) -> Option<String> {
    if PREFIXES.iter().any(|prefix| ident.len() > prefix.len() && ident.starts_with(prefix)) {
        return Some(ident.to_string());
    }
    let name = ident.strip_prefix("IF_")?;
    let name = name.strip_prefix("NOT_").unwrap_or(name);
    (!name.is_empty()).then(|| format!("CONFIG_{name}"))
}

/// `obj-$(CONFIG_X) += a.o b.o`, `lib-y += c.o`.
fn build_rule(line: u32, text: &str) -> SourceEvent {
    let text = text.trim();
    let Some((lhs, rhs)) = text.split_once("+=").or_else(|| text.split_once(":=")) else {
        return SourceEvent::directive(
            line,
            RawEvent::Malformed {
                text: text.to_string(),
                reason: "build rule without '+='".to_string(),
            },
        );
    };
    let lhs = lhs.trim();
    let condition = match lhs.find("$(").zip(lhs.rfind(')')) {
        Some((open, close)) if open + 2 < close => Condition::macro_name(lhs[open + 2..close].trim()),
        _ => Condition::always(),
    };
    SourceEvent::directive(
        line,
        RawEvent::BuildRule {
            object: rhs.split_whitespace().collect::<Vec<_>>().join(" "),
            condition,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::scan;
    use pretty_assertions::assert_eq;
    use varimap_core::{DialectKind, Formula};

    const IO_FILE: &str = "\
//config:config INCLUDE_IO_FILE
//config:   bool \"Include a file that contains a method performing I/O operations\"
//config:   default true
//config:config PERFORM_CHMOD
//config:   bool \"Run chmod on a path\"
//config:   default false
//config:   depends INCLUDE_IO_FILE

//kbuild:obj-$(CONFIG_INCLUDE_IO_FILE) += io-file.o

void insecure_race(char *path) {
#ifdef CONFIG_PERFORM_CHMOD
    chmod(path, 0);
#endif
    if (ENABLE_PERFORM_CHMOD) IF_PERFORM_RENAME(rename(path, \"x\"));
}
";

    #[test]
    fn io_file_scores_full_confidence() {
        assert!((confidence(IO_FILE) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn ifdef_only_file_scores_low() {
        let main = "#ifdef CONFIG_TEST\nx();\n#endif\n#if ENABLE_TEST\ny();\n#endif\n";
        assert!(confidence(main) < 0.5);
    }

    #[test]
    fn io_file_events() {
        let events: Vec<SourceEvent> = scan(DialectKind::Kbuild, "src/io-file.c", IO_FILE).collect();

        let declared: Vec<(u32, String)> = events
            .iter()
            .filter_map(|e| match &e.event {
                RawEvent::Declare(f) => Some((e.line, f.name.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            declared,
            vec![(1, "INCLUDE_IO_FILE".to_string()), (4, "PERFORM_CHMOD".to_string())]
        );

        let rule = events
            .iter()
            .find_map(|e| match &e.event {
                RawEvent::BuildRule { object, condition } => Some((e.line, object, condition)),
                _ => None,
            })
            .unwrap();
        assert_eq!(rule.0, 9);
        assert_eq!(rule.1, "io-file.o");
        assert_eq!(rule.2.text, "CONFIG_INCLUDE_IO_FILE");

        let references: Vec<&str> = events
            .iter()
            .filter_map(|e| match &e.event {
                RawEvent::Reference(token) => Some(token.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(references, vec!["ENABLE_PERFORM_CHMOD", "CONFIG_PERFORM_RENAME"]);
    }

    #[test]
    fn unconditional_build_rule() {
        let event = build_rule(1, "lib-y += a.o  b.o");
        let RawEvent::BuildRule { object, condition } = event.event else {
            panic!("expected build rule");
        };
        assert_eq!(object, "a.o b.o");
        assert_eq!(crate::kconfig::lower_feature_ref(&condition.expr), Formula::True);
    }
}
