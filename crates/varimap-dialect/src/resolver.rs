//! Symbol Resolver: macro spellings to canonical feature symbols.
//!
//! Resolution order for a macro token:
//!
//! 1. An explicit configured alias (exact token) wins.
//! 2. The dialect's prefix rules, longest prefix first. Under
//!    [`AliasPolicy::Strict`] a prefix is stripped only when the remaining
//!    name is declared in the Feature Model; under [`AliasPolicy::Unify`]
//!    every known prefix is stripped unconditionally.
//! 3. Otherwise the token stands for itself. If it equals the name of a
//!    declared feature, or another dialect's prefix rule would map it to
//!    one, it collides with that feature's naming family: the resolver
//!    reports an alias ambiguity and keeps the token local to the file
//!    instead of guessing.
//!
//! Feature-reference tokens (section labels, Kconfig expressions) are
//! already canonical and skip all of the above.

use std::collections::BTreeMap;

use varimap_core::{AliasPolicy, DialectKind, Formula, Symbol};
use varimap_model::FeatureModel;

use crate::adapters::prefix_rules;
use crate::event::{Condition, TokenKind};

/// Every prefix any dialect knows, longest first.
const ALL_PREFIXES: &[&str] = &["CONFIG_", "ENABLE_", "CFG_"];

/// A raw token pattern and what it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasRule {
    /// `token` denotes `symbol` exactly.
    Exact { token: String, symbol: String },
    /// `PREFIX_NAME` denotes `NAME`.
    Prefix(String),
}

impl AliasRule {
    /// The name this rule maps `token` to, if it applies.
    #[must_use]
    pub fn apply(&self, token: &str) -> Option<String> {
        match self {
            Self::Exact { token: t, symbol } => (t == token).then(|| symbol.clone()),
            Self::Prefix(prefix) => token
                .strip_prefix(prefix.as_str())
                .filter(|rest| !rest.is_empty())
                .map(str::to_string),
        }
    }

    /// The prefix rules a dialect owns, longest prefix first.
    #[must_use]
    pub fn for_dialect(dialect: DialectKind) -> Vec<Self> {
        let mut prefixes: Vec<&str> = prefix_rules(dialect).to_vec();
        prefixes.sort_by_key(|prefix| std::cmp::Reverse(prefix.len()));
        prefixes.into_iter().map(|p| Self::Prefix(p.to_string())).collect()
    }
}

/// Outcome of canonicalizing one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub symbol: Symbol,
    /// Set when the token collided with a declared feature and was made
    /// file-local; holds the diagnostic message.
    pub ambiguity: Option<String>,
}

impl Resolution {
    const fn global(symbol: Symbol) -> Self {
        Self {
            symbol,
            ambiguity: None,
        }
    }
}

/// Resolves tokens against a read-only Feature Model snapshot.
#[derive(Debug, Clone)]
pub struct Resolver<'m> {
    model: &'m FeatureModel,
    policy: AliasPolicy,
    explicit: BTreeMap<String, String>,
}

impl<'m> Resolver<'m> {
    #[must_use]
    pub const fn new(model: &'m FeatureModel, policy: AliasPolicy) -> Self {
        Self {
            model,
            policy,
            explicit: BTreeMap::new(),
        }
    }

    /// Add explicit `token -> symbol` aliases.
    #[must_use]
    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = (String, String)>) -> Self {
        self.explicit.extend(aliases);
        self
    }

    #[must_use]
    pub const fn policy(&self) -> AliasPolicy {
        self.policy
    }

    /// Canonicalize a macro token seen in `file`, written in `dialect`.
    #[must_use]
    pub fn canonicalize(&self, token: &str, dialect: DialectKind, file: &str) -> Resolution {
        if let Some(symbol) = self.explicit.get(token) {
            return Resolution::global(Symbol::global(symbol.clone()));
        }

        match self.policy {
            AliasPolicy::Unify => {
                let name = ALL_PREFIXES
                    .iter()
                    .find_map(|prefix| AliasRule::Prefix((*prefix).to_string()).apply(token))
                    .unwrap_or_else(|| token.to_string());
                Resolution::global(Symbol::global(name))
            }
            AliasPolicy::Strict => {
                for rule in AliasRule::for_dialect(dialect) {
                    if let Some(name) = rule.apply(token)
                        && self.model.is_declared(&name)
                    {
                        return Resolution::global(Symbol::global(name));
                    }
                }
                let Some(name) = self.colliding_feature(token) else {
                    return Resolution::global(Symbol::global(token));
                };
                Resolution {
                    symbol: Symbol::file_local(token, file),
                    ambiguity: Some(format!(
                        "'{token}' matches declared feature {name} without a {dialect} alias rule; \
                         treated as local to {file}"
                    )),
                }
            }
        }
    }

    /// The declared feature `token` would denote in some naming family the
    /// current dialect's rules did not apply: the bare name itself, or any
    /// known prefix stripped.
    fn colliding_feature(&self, token: &str) -> Option<String> {
        if self.model.is_declared(token) {
            return Some(token.to_string());
        }
        ALL_PREFIXES
            .iter()
            .filter_map(|prefix| AliasRule::Prefix((*prefix).to_string()).apply(token))
            .find(|name| self.model.is_declared(name))
    }

    /// Lower a condition into a formula, reporting every ambiguous token
    /// through `on_ambiguity`.
    pub fn condition(
        &self,
        condition: &Condition,
        dialect: DialectKind,
        file: &str,
        on_ambiguity: &mut impl FnMut(&str, &Resolution),
    ) -> Formula {
        condition.expr.lower(&mut |token| match condition.tokens {
            TokenKind::FeatureRef => Formula::var(token),
            TokenKind::Macro => {
                let resolution = self.canonicalize(token, dialect, file);
                if resolution.ambiguity.is_some() {
                    on_ambiguity(token, &resolution);
                }
                Formula::Var(resolution.symbol)
            }
        })
    }
}
