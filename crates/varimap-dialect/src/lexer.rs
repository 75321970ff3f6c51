//! Line-level lexer shared by every dialect.
//!
//! Splits a file into numbered lines, tracks `/* */` comment state across
//! lines, strips comments from the code text and recognizes conditional
//! preprocessor directives. A directive ending in `\` absorbs the following
//! lines; those are not yielded separately.

use std::fmt;

/// Conditional directive keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    If,
    Ifdef,
    Ifndef,
    Elif,
    Elifdef,
    Elifndef,
    Else,
    Endif,
}

impl DirectiveKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "if" => Some(Self::If),
            "ifdef" => Some(Self::Ifdef),
            "ifndef" => Some(Self::Ifndef),
            "elif" => Some(Self::Elif),
            "elifdef" => Some(Self::Elifdef),
            "elifndef" => Some(Self::Elifndef),
            "else" => Some(Self::Else),
            "endif" => Some(Self::Endif),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::If => "#if",
            Self::Ifdef => "#ifdef",
            Self::Ifndef => "#ifndef",
            Self::Elif => "#elif",
            Self::Elifdef => "#elifdef",
            Self::Elifndef => "#elifndef",
            Self::Else => "#else",
            Self::Endif => "#endif",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conditional directive with its comment-free argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub kind: DirectiveKind,
    pub argument: String,
}

/// One logical line.
#[derive(Debug, Clone)]
pub struct Line<'a> {
    /// 1-based number of the first physical line.
    pub number: u32,
    /// Physical text of the first line, comments included.
    pub raw: &'a str,
    /// Text outside comments, continuation lines joined for directives.
    pub code: String,
    /// The line started inside a block comment.
    pub starts_in_comment: bool,
    pub directive: Option<Directive>,
}

/// Iterator over the logical lines of a file.
pub struct Lexer<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    in_block_comment: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(content: &'a str) -> Self {
        Self {
            lines: content.lines().enumerate(),
            in_block_comment: false,
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (idx, raw) = self.lines.next()?;
        let starts_in_comment = self.in_block_comment;
        let mut code = strip_comments(raw, &mut self.in_block_comment);

        let is_directive = code.trim_start().starts_with('#');
        if is_directive {
            while code.trim_end().ends_with('\\') {
                let Some((_, next)) = self.lines.next() else {
                    break;
                };
                let trimmed = code.trim_end();
                code.truncate(trimmed.len() - 1);
                code.push(' ');
                code.push_str(&strip_comments(next, &mut self.in_block_comment));
            }
        }

        let directive = if is_directive {
            parse_directive(&code)
        } else {
            None
        };

        Some(Line {
            number: line_number(idx),
            raw,
            code,
            starts_in_comment,
            directive,
        })
    }
}

/// Convert a 0-based line index to a 1-based line number.
#[must_use]
pub fn line_number(idx: usize) -> u32 {
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}

/// Remove `//` and `/* */` comments, keeping string and char literals.
fn strip_comments(raw: &str, in_block_comment: &mut bool) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        if *in_block_comment {
            if c == '*' && chars.peek() == Some(&'/') {
                chars.next();
                *in_block_comment = false;
                out.push(' ');
            }
            continue;
        }
        if let Some(q) = quote {
            out.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                *in_block_comment = true;
            }
            _ => out.push(c),
        }
    }
    out
}

fn parse_directive(code: &str) -> Option<Directive> {
    let rest = code.trim_start().strip_prefix('#')?.trim_start();
    let keyword_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let kind = DirectiveKind::from_keyword(&rest[..keyword_len])?;
    Some(Directive {
        kind,
        argument: rest[keyword_len..].trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn directives(content: &str) -> Vec<(u32, DirectiveKind, String)> {
        Lexer::new(content)
            .filter_map(|line| {
                line.directive
                    .map(|d| (line.number, d.kind, d.argument))
            })
            .collect()
    }

    #[test]
    fn recognizes_conditional_directives_only() {
        let src = "#include <stdio.h>\n#ifdef CONFIG_A\nx();\n#  elif B\n#else\n#endif\n";
        assert_eq!(
            directives(src),
            vec![
                (2, DirectiveKind::Ifdef, "CONFIG_A".to_string()),
                (4, DirectiveKind::Elif, "B".to_string()),
                (5, DirectiveKind::Else, String::new()),
                (6, DirectiveKind::Endif, String::new()),
            ]
        );
    }

    #[test]
    fn strips_trailing_comments() {
        let src = "#if A && B // both\n#endif /* A */\n";
        assert_eq!(directives(src)[0].2, "A && B");
        assert_eq!(directives(src)[1].2, "");
    }

    #[test]
    fn ignores_directives_inside_block_comments() {
        let src = "/*\n#ifdef HIDDEN\n*/\n#ifdef SHOWN\n#endif\n";
        let found = directives(src);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], (4, DirectiveKind::Ifdef, "SHOWN".to_string()));
    }

    #[test]
    fn joins_backslash_continuations() {
        let src = "#if defined(A) && \\\n    defined(B)\nint x;\n#endif\n";
        let lines: Vec<_> = Lexer::new(src).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0].directive.as_ref().unwrap().argument,
            "defined(A) &&      defined(B)"
        );
        assert_eq!(lines[1].number, 3);
    }

    #[test]
    fn keeps_comment_markers_inside_strings() {
        let mut in_comment = false;
        let code = strip_comments(r#"printf("/* not a comment */"); // gone"#, &mut in_comment);
        assert_eq!(code, r#"printf("/* not a comment */"); "#);
        assert!(!in_comment);
    }
}
