//! SMT-LIB 2 rendering of presence conditions, for handing them to an
//! external solver.

use std::fmt::Write as _;

use crate::formula::{Atom, Formula};

impl Formula {
    /// Render as an SMT-LIB 2 script: one `declare-const` per atom followed
    /// by a single `assert`.
    ///
    /// Symbols become quoted identifiers (`|CONFIG_A|`); opaque atoms are
    /// declared as `|opaque:<text>|`.
    #[must_use]
    pub fn to_smtlib(&self) -> String {
        let mut out = String::new();
        for atom in self.atoms() {
            let _ = writeln!(out, "(declare-const {} Bool)", atom_name(atom));
        }
        let _ = writeln!(out, "(assert {})", self.smtlib_term());
        out
    }

    fn smtlib_term(&self) -> String {
        match self {
            Self::True => "true".to_string(),
            Self::False => "false".to_string(),
            Self::Var(symbol) => atom_name(Atom::Var(symbol)),
            Self::Opaque(text) => atom_name(Atom::Opaque(text)),
            Self::Not(inner) => format!("(not {})", inner.smtlib_term()),
            Self::And(items) | Self::Or(items) => {
                let op = if matches!(self, Self::And(_)) { "and" } else { "or" };
                let args: Vec<String> = items.iter().map(Self::smtlib_term).collect();
                format!("({op} {})", args.join(" "))
            }
        }
    }
}

fn atom_name(atom: Atom<'_>) -> String {
    // `|` and `\` are the only characters a quoted symbol cannot hold.
    let raw = match atom {
        Atom::Var(symbol) => symbol.to_string(),
        Atom::Opaque(text) => format!("opaque:{text}"),
    };
    format!("|{}|", raw.replace(['|', '\\'], "_"))
}
