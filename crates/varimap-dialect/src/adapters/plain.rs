//! Plain bare-macro dialect: the fallback when no other dialect is
//! recognized. Only conditional directives produce events; every symbol
//! they mention is registered implicitly by the engine.

use std::collections::VecDeque;

use crate::event::SourceEvent;
use crate::lexer::Line;

use super::directive_event;

/// Reported when the plain dialect is chosen by fallback.
pub const CONFIDENCE: f64 = 0.0;

pub(super) fn line(line: &Line<'_>, out: &mut VecDeque<SourceEvent>) {
    if let Some(event) = directive_event(line) {
        out.push_back(event);
    }
}
