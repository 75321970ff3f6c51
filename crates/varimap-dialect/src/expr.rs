//! Condition expressions over raw (not yet canonical) tokens.
//!
//! Three surface syntaxes share one tree:
//!
//! - [`Syntax::Preprocessor`]: `#if` arguments. Identifiers, integer
//!   literals, `defined X`, `defined(X)`, `!`, `&&`, `||`, parentheses.
//!   Comparisons, arithmetic and function-like macro calls are kept as
//!   opaque atoms.
//! - [`Syntax::Kconfig`]: `depends on` / `default ... if` expressions. `y`,
//!   `n` and `m` are literals; `A=y`, `A!=n` and friends fold to literals of
//!   `A`.
//! - [`Syntax::Section`]: bracketed section labels, where `-` means AND and
//!   `,` means OR.

use std::fmt;

use varimap_core::Formula;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    Preprocessor,
    Kconfig,
    Section,
}

/// A parsed condition whose identifiers still carry their surface spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawExpr {
    Const(bool),
    Ident(String),
    Opaque(String),
    Not(Box<RawExpr>),
    And(Vec<RawExpr>),
    Or(Vec<RawExpr>),
}

impl RawExpr {
    /// Lower into the formula algebra, mapping each identifier through
    /// `resolve`.
    pub fn lower(&self, resolve: &mut impl FnMut(&str) -> Formula) -> Formula {
        match self {
            Self::Const(value) => Formula::constant(*value),
            Self::Ident(token) => resolve(token),
            Self::Opaque(text) => Formula::Opaque(text.clone()),
            Self::Not(inner) => Formula::not(inner.lower(resolve)),
            Self::And(items) => Formula::and(items.iter().map(|item| item.lower(resolve))),
            Self::Or(items) => Formula::or(items.iter().map(|item| item.lower(resolve))),
        }
    }

    /// Identifiers in order of appearance.
    #[must_use]
    pub fn idents(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_idents(&mut out);
        out
    }

    fn collect_idents<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Ident(token) => out.push(token),
            Self::Not(inner) => inner.collect_idents(out),
            Self::And(items) | Self::Or(items) => {
                for item in items {
                    item.collect_idents(out);
                }
            }
            Self::Const(_) | Self::Opaque(_) => {}
        }
    }
}

/// A parse failure, with the reason shown in `MalformedCondition`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFailure {
    pub reason: String,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Parse `text` under `syntax`.
///
/// # Errors
///
/// Returns [`ParseFailure`] for empty input, unbalanced parentheses,
/// characters outside the syntax or trailing tokens.
pub fn parse(text: &str, syntax: Syntax) -> Result<RawExpr, ParseFailure> {
    let tokens = tokenize(text, syntax)?;
    if tokens.is_empty() {
        return Err(failure("empty condition"));
    }
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        syntax,
        depth: 0,
    };
    let expr = parser.parse_or()?;
    if let Some(extra) = parser.tokens.get(parser.pos) {
        return Err(failure(&format!("unexpected '{}'", extra.text())));
    }
    Ok(expr)
}

/// Parse, degrading to a single opaque atom on failure.
///
/// The failure is returned alongside so the caller can report it.
#[must_use]
pub fn parse_lenient(text: &str, syntax: Syntax) -> (RawExpr, Option<ParseFailure>) {
    match parse(text, syntax) {
        Ok(expr) => (expr, None),
        Err(err) => (RawExpr::Opaque(text.trim().to_string()), Some(err)),
    }
}

fn failure(reason: &str) -> ParseFailure {
    ParseFailure {
        reason: reason.to_string(),
    }
}

// ── Tokens ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Int(String),
    LParen,
    RParen,
    Not,
    And,
    Or,
    Comma,
    /// Any other operator: comparisons, arithmetic, `=`.
    Op(String),
}

impl Token {
    fn text(&self) -> &str {
        match self {
            Self::Ident(text) | Self::Int(text) | Self::Op(text) => text,
            Self::LParen => "(",
            Self::RParen => ")",
            Self::Not => "!",
            Self::And => "&&",
            Self::Or => "||",
            Self::Comma => ",",
        }
    }

    fn is_operator(&self) -> bool {
        matches!(self, Self::Op(_))
    }
}

fn tokenize(text: &str, syntax: Syntax) -> Result<Vec<Token>, ParseFailure> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }
        if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Int(chars[start..i].iter().collect()));
            continue;
        }
        let (token, width) = match (c, next) {
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('&', Some('&')) => (Token::And, 2),
            ('|', Some('|')) => (Token::Or, 2),
            ('!', Some('=')) => (Token::Op("!=".into()), 2),
            ('!', _) => (Token::Not, 1),
            (',', _) if syntax == Syntax::Section => (Token::Or, 1),
            (',', _) => (Token::Comma, 1),
            ('-', _) if syntax == Syntax::Section => (Token::And, 1),
            ('=' | '<' | '>', Some('=')) => (Token::Op(format!("{c}=")), 2),
            ('<', Some('<')) | ('>', Some('>')) => (Token::Op(format!("{c}{c}")), 2),
            ('=' | '<' | '>' | '+' | '-' | '*' | '/' | '%' | '&' | '|' | '^' | '~' | '?' | ':', _) => {
                (Token::Op(c.to_string()), 1)
            }
            _ => return Err(failure(&format!("unexpected character '{c}'"))),
        };
        if syntax == Syntax::Section && matches!(token, Token::Op(_)) {
            return Err(failure(&format!("operator '{}' in section label", token.text())));
        }
        tokens.push(token);
        i += width;
    }
    Ok(tokens)
}

// ── Parser ─────────────────────────────────────────────────────────

/// Deepest `!` / parenthesis nesting accepted before a condition is
/// reported as malformed.
pub const MAX_NESTING: usize = 256;

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    syntax: Syntax,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ParseFailure> {
        match self.bump() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(failure(&format!(
                "expected '{}', found '{}'",
                expected.text(),
                token.text()
            ))),
            None => Err(failure(&format!("expected '{}'", expected.text()))),
        }
    }

    fn parse_or(&mut self) -> Result<RawExpr, ParseFailure> {
        let mut items = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            items.push(self.parse_and()?);
        }
        Ok(if items.len() == 1 {
            items.swap_remove(0)
        } else {
            RawExpr::Or(items)
        })
    }

    fn parse_and(&mut self) -> Result<RawExpr, ParseFailure> {
        let mut items = vec![self.parse_unary()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            items.push(self.parse_unary()?);
        }
        Ok(if items.len() == 1 {
            items.swap_remove(0)
        } else {
            RawExpr::And(items)
        })
    }

    fn parse_unary(&mut self) -> Result<RawExpr, ParseFailure> {
        if self.depth == MAX_NESTING {
            return Err(failure(&format!("nested deeper than {MAX_NESTING} levels")));
        }
        self.depth += 1;
        let expr = self.parse_operand();
        self.depth -= 1;
        expr
    }

    fn parse_operand(&mut self) -> Result<RawExpr, ParseFailure> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(RawExpr::Not(Box::new(self.parse_unary()?)));
        }

        let end = self.operand_end()?;
        let operand = &self.tokens[self.pos..end];
        if operand.is_empty() {
            return Err(match self.peek() {
                Some(token) => failure(&format!("unexpected '{}'", token.text())),
                None => failure("missing operand"),
            });
        }

        if self.syntax == Syntax::Kconfig
            && let Some(expr) = kconfig_comparison(operand)
        {
            self.pos = end;
            return Ok(expr);
        }

        if has_top_level_operator(operand) {
            self.pos = end;
            return Ok(RawExpr::Opaque(join(operand)));
        }

        self.parse_primary()
    }

    /// Index one past the operand starting at `pos`: the first `&&`, `||`,
    /// or unmatched `)` at nesting depth zero.
    fn operand_end(&self) -> Result<usize, ParseFailure> {
        let mut depth = 0usize;
        for (offset, token) in self.tokens[self.pos..].iter().enumerate() {
            match token {
                Token::LParen => depth += 1,
                Token::RParen if depth == 0 => return Ok(self.pos + offset),
                Token::RParen => depth -= 1,
                Token::And | Token::Or if depth == 0 => return Ok(self.pos + offset),
                _ => {}
            }
        }
        if depth > 0 {
            return Err(failure("unbalanced parentheses"));
        }
        Ok(self.tokens.len())
    }

    fn parse_primary(&mut self) -> Result<RawExpr, ParseFailure> {
        let start = self.pos;
        let Some(token) = self.bump().cloned() else {
            return Err(failure("missing operand"));
        };
        match token {
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::Int(text) if self.syntax == Syntax::Preprocessor => Ok(RawExpr::Const(
                int_value(&text).ok_or_else(|| failure(&format!("bad integer '{text}'")))? != 0,
            )),
            Token::Ident(name) if self.syntax == Syntax::Preprocessor && name == "defined" => {
                self.parse_defined()
            }
            Token::Ident(name) if self.syntax == Syntax::Kconfig => {
                // `m` counts as enabled for presence purposes.
                Ok(match name.as_str() {
                    "y" | "m" => RawExpr::Const(true),
                    "n" => RawExpr::Const(false),
                    _ => RawExpr::Ident(name),
                })
            }
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) && self.syntax == Syntax::Preprocessor {
                    return self.parse_macro_call(start, name);
                }
                Ok(RawExpr::Ident(name))
            }
            other => Err(failure(&format!("unexpected '{}'", other.text()))),
        }
    }

    fn parse_defined(&mut self) -> Result<RawExpr, ParseFailure> {
        let parenthesized = self.peek() == Some(&Token::LParen);
        if parenthesized {
            self.pos += 1;
        }
        let name = match self.bump() {
            Some(Token::Ident(name)) => name.clone(),
            _ => return Err(failure("'defined' needs a macro name")),
        };
        if parenthesized {
            self.expect(&Token::RParen)?;
        }
        Ok(RawExpr::Ident(name))
    }

    /// `IS_ENABLED(CONFIG_X)` and friends test a symbol; any other
    /// function-like macro is opaque.
    fn parse_macro_call(&mut self, start: usize, name: String) -> Result<RawExpr, ParseFailure> {
        self.pos += 1;
        let mut depth = 1usize;
        let args_start = self.pos;
        while depth > 0 {
            match self.bump() {
                Some(Token::LParen) => depth += 1,
                Some(Token::RParen) => depth -= 1,
                Some(_) => {}
                None => return Err(failure("unbalanced parentheses")),
            }
        }
        let args = &self.tokens[args_start..self.pos - 1];
        if matches!(name.as_str(), "IS_ENABLED" | "IS_BUILTIN" | "IS_REACHABLE")
            && let [Token::Ident(arg)] = args
        {
            return Ok(RawExpr::Ident(arg.clone()));
        }
        Ok(RawExpr::Opaque(join(&self.tokens[start..self.pos])))
    }
}

/// Whether `operand` has a comparison or arithmetic operator outside any
/// parentheses.
fn has_top_level_operator(operand: &[Token]) -> bool {
    let mut depth = 0usize;
    operand.iter().any(|token| {
        match token {
            Token::LParen => depth += 1,
            Token::RParen => depth = depth.saturating_sub(1),
            _ => {}
        }
        depth == 0 && token.is_operator()
    })
}

/// `A=y`, `A!=n`, `A=n`, `A!=y` (and `m`) in Kconfig expressions.
fn kconfig_comparison(operand: &[Token]) -> Option<RawExpr> {
    let [Token::Ident(lhs), Token::Op(op), Token::Ident(rhs)] = operand else {
        return None;
    };
    let (symbol, value) = match (lhs.as_str(), rhs.as_str()) {
        (_, "y" | "m") => (lhs, true),
        (_, "n") => (lhs, false),
        ("y" | "m", _) => (rhs, true),
        ("n", _) => (rhs, false),
        _ => return None,
    };
    let positive = match op.as_str() {
        "=" => value,
        "!=" => !value,
        _ => return None,
    };
    let ident = RawExpr::Ident(symbol.clone());
    Some(if positive {
        ident
    } else {
        RawExpr::Not(Box::new(ident))
    })
}

fn int_value(text: &str) -> Option<i64> {
    let digits = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        return i64::from_str_radix(hex, 16).ok();
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return i64::from_str_radix(&digits[1..], 8).ok();
    }
    digits.parse().ok()
}

fn join(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (idx, token) in tokens.iter().enumerate() {
        let glue = idx > 0
            && !matches!(token, Token::RParen | Token::Comma)
            && !matches!(tokens[idx - 1], Token::LParen | Token::Not)
            && !(matches!(token, Token::LParen) && matches!(tokens[idx - 1], Token::Ident(_)));
        if glue {
            out.push(' ');
        }
        out.push_str(token.text());
    }
    out
}
