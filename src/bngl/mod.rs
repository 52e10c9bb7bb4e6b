//! Reading and writing the BNGL text form of species and patterns.
//!
//! Grammar accepted by [`from_bngl`]:
//!
//! ```text
//! species   := [ '@' comp ':' [':'] ] molecule ( '.' molecule )*
//! molecule  := [ '@' comp ':' [':'] ] ( name | '*' ) [ '(' components ')' ] ( '@' comp | '%' label )*
//! component := name ( '~' state )* ( '!' ( digits | '+' | '-' | '?' ) )*
//! ```
//!
//! A bond label used on two sites becomes a bond; used on one site it stays
//! dangling, which a pattern reads as "bound to something outside".

mod error;
mod parser;
mod writer;

pub use error::BnglError;
pub use writer::to_bngl;

pub(crate) use writer::write_species_graph;

use crate::graph::SpeciesGraph;

/// Parses a BNGL species or pattern string.
///
/// ```
/// let g = bngcrab::from_bngl("EGFR(L!1,Y1068~P).EGF(R!1)").unwrap();
/// assert_eq!(g.molecule_count(), 2);
/// assert_eq!(g.bond_count(), 1);
/// assert_eq!(g.to_string(), "EGFR(L!1,Y1068~P).EGF(R!1)");
/// ```
pub fn from_bngl(s: &str) -> Result<SpeciesGraph, BnglError> {
    parser::parse(s)
}

/// Like [`from_bngl`], but rejects pattern-only syntax: wildcards, open
/// states, `*` molecules and dangling bonds.
pub fn parse_species_graph(s: &str) -> Result<SpeciesGraph, BnglError> {
    let graph = parser::parse(s)?;
    for molecule in graph.molecules() {
        if molecule.is_wildcard() {
            return Err(BnglError::PatternSyntax {
                what: "wildcard molecule '*'",
            });
        }
        for comp in &molecule.components {
            if comp.wildcard.is_some() {
                return Err(BnglError::PatternSyntax {
                    what: "bond wildcard",
                });
            }
            if comp.state.as_deref() == Some(crate::component::ANY_STATE) {
                return Err(BnglError::PatternSyntax {
                    what: "open state '~?'",
                });
            }
            if comp.has_dangling_bond() {
                return Err(BnglError::PatternSyntax {
                    what: "dangling bond",
                });
            }
        }
    }
    Ok(graph)
}

/// Checks that `s` parses as a pattern.
pub fn validate_pattern(s: &str) -> Result<(), BnglError> {
    parser::parse(s).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn species_rejects_pattern_syntax() {
        assert!(parse_species_graph("A(b!1).B(a!1)").is_ok());
        for s in ["A(b!+)", "A(b~?)", "*(b)", "A(b!1)"] {
            assert!(
                matches!(parse_species_graph(s), Err(BnglError::PatternSyntax { .. })),
                "{s} should be rejected"
            );
        }
    }

    #[test]
    fn validate() {
        assert_eq!(validate_pattern("A(b!+,c~?)"), Ok(()));
        assert_eq!(validate_pattern("@EC:L(r!1).R(l!1)"), Ok(()));
        assert_eq!(validate_pattern("A(b"), Err(BnglError::UnclosedParen { pos: 1 }));
        assert_eq!(validate_pattern(""), Err(BnglError::EmptyInput));
        assert!(matches!(
            validate_pattern("A(b!1).B(a!1).C(c!1)"),
            Err(BnglError::BondArity { .. })
        ));
    }
}
