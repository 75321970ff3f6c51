//! # varimap-dialect
//!
//! Everything between raw file text and canonical formulas:
//!
//! - [`lexer`]: numbered lines, comment state, conditional directives
//! - [`expr`]: condition expressions in preprocessor, Kconfig and section
//!   label syntax
//! - [`kconfig`]: Kconfig fragment parsing into feature declarations
//! - [`adapters`]: the kbuild, toybox, interface/implementation and plain
//!   dialects, each producing a lazy [`EventStream`]
//! - [`detect`]: confidence-based dialect selection
//! - [`resolver`]: alias rules mapping macro spellings to feature symbols

pub mod adapters;
pub mod detect;
pub mod error;
pub mod event;
pub mod expr;
pub mod kconfig;
pub mod lexer;
pub mod resolver;
pub mod source;

pub use adapters::{EventStream, confidence, scan};
pub use detect::{Detection, detect};
pub use error::DialectError;
pub use event::{Condition, Placement, RawEvent, SourceEvent, TokenKind};
pub use resolver::{AliasRule, Resolution, Resolver};
pub use source::SourceFile;
