//! The normalized event stream every dialect produces.

use varimap_core::FeatureSymbol;

use crate::expr::{ParseFailure, RawExpr, Syntax, parse_lenient};

/// How an identifier in a condition reaches the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A preprocessor macro spelling: dialect prefix rules apply.
    Macro,
    /// Already a feature name (section label, Kconfig expression).
    FeatureRef,
}

/// A parsed but unresolved condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Source text as written.
    pub text: String,
    pub expr: RawExpr,
    pub tokens: TokenKind,
    /// Set when the text could not be parsed and `expr` is a single opaque
    /// atom standing in for it.
    pub malformed: Option<ParseFailure>,
}

impl Condition {
    /// Parse preprocessor condition text (`#if`, `#elif`).
    #[must_use]
    pub fn preprocessor(text: &str) -> Self {
        Self::parse(text, Syntax::Preprocessor, TokenKind::Macro)
    }

    /// A single macro name (`#ifdef X`, `USE_X(...)`, `obj-$(CONFIG_X)`).
    #[must_use]
    pub fn macro_name(name: &str) -> Self {
        Self {
            text: name.to_string(),
            expr: RawExpr::Ident(name.to_string()),
            tokens: TokenKind::Macro,
            malformed: None,
        }
    }

    /// Negated macro name (`#ifndef X`).
    #[must_use]
    pub fn not_macro_name(name: &str) -> Self {
        Self {
            text: format!("!{name}"),
            expr: RawExpr::Not(Box::new(RawExpr::Ident(name.to_string()))),
            tokens: TokenKind::Macro,
            malformed: None,
        }
    }

    /// Feature-reference expression in a section label.
    #[must_use]
    pub fn section(text: &str) -> Self {
        Self::parse(text, Syntax::Section, TokenKind::FeatureRef)
    }

    /// Always-true condition.
    #[must_use]
    pub fn always() -> Self {
        Self {
            text: "1".to_string(),
            expr: RawExpr::Const(true),
            tokens: TokenKind::FeatureRef,
            malformed: None,
        }
    }

    fn parse(text: &str, syntax: Syntax, tokens: TokenKind) -> Self {
        let (expr, malformed) = parse_lenient(text, syntax);
        Self {
            text: text.trim().to_string(),
            expr,
            tokens,
            malformed,
        }
    }
}

/// Dialect-neutral events. Each carries its line in [`SourceEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// A feature declaration found inline (Kconfig fragment).
    Declare(Box<FeatureSymbol>),
    EnterIf(Condition),
    EnterElif(Condition),
    EnterElse,
    Exit,
    /// A symbol use outside any conditional directive.
    Reference(String),
    /// Start of a labelled section; `None` means unconditional.
    Section(Option<Condition>),
    /// A build rule compiling this file under `condition`.
    BuildRule { object: String, condition: Condition },
    /// Text in a declaration block that could not be interpreted.
    Malformed { text: String, reason: String },
}

/// Where an event sits relative to the lines it governs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The event occupies its own line, which belongs to the enclosing
    /// scope (`#ifdef` ... `#endif`, section labels).
    Directive,
    /// The scope covers the line the event sits on (`USE_X(...)` calls).
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEvent {
    pub line: u32,
    pub placement: Placement,
    pub event: RawEvent,
}

impl SourceEvent {
    #[must_use]
    pub const fn directive(line: u32, event: RawEvent) -> Self {
        Self {
            line,
            placement: Placement::Directive,
            event,
        }
    }

    #[must_use]
    pub const fn inline(line: u32, event: RawEvent) -> Self {
        Self {
            line,
            placement: Placement::Inline,
            event,
        }
    }
}
