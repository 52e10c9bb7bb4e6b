use std::collections::{BTreeMap, BTreeSet};

use crate::bond::{BondLabel, Site};
use crate::component::{BondWildcard, Component, ANY_STATE};
use crate::graph::SpeciesGraph;
use crate::molecule::{Molecule, ANY_MOLECULE};

use super::error::BnglError;

struct Parser<'a> {
    chars: Vec<char>,
    pos: usize,
    input: &'a str,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            input,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn unexpected(&self, expected: &'static str) -> BnglError {
        match self.peek() {
            Some(ch) => BnglError::UnexpectedChar { pos: self.pos, ch },
            None => BnglError::UnexpectedEnd {
                pos: self.pos,
                expected,
            },
        }
    }

    fn take_word(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// A molecule or compartment name: `[A-Za-z_][A-Za-z0-9_]*`.
    fn parse_name(&mut self) -> Result<String, BnglError> {
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => Ok(self.take_word()),
            Some(_) => Err(BnglError::InvalidName { pos: self.pos }),
            None => Err(BnglError::UnexpectedEnd {
                pos: self.pos,
                expected: "a name",
            }),
        }
    }

    /// `@name:` or `@name::` in front of a species or molecule.
    fn parse_compartment_prefix(&mut self) -> Result<Option<String>, BnglError> {
        if !self.eat('@') {
            return Ok(None);
        }
        let name = self.parse_name()?;
        if !self.eat(':') {
            return Err(self.unexpected("':'"));
        }
        self.eat(':');
        Ok(Some(name))
    }

    fn parse_species(&mut self) -> Result<SpeciesGraph, BnglError> {
        self.skip_ws();
        if self.at_end() {
            return Err(BnglError::EmptyInput);
        }
        let species_compartment = self.parse_compartment_prefix()?;

        let mut molecules = Vec::new();
        loop {
            self.skip_ws();
            if self.at_end() || self.peek() == Some('.') {
                return Err(BnglError::EmptyMolecule { pos: self.pos });
            }
            let mut molecule = self.parse_molecule()?;
            if molecule.compartment.is_none() {
                molecule.compartment = species_compartment.clone();
            }
            molecules.push(molecule);
            self.skip_ws();
            if self.at_end() {
                break;
            }
            if !self.eat('.') {
                return Err(self.unexpected("'.'"));
            }
        }

        build_graph(molecules, species_compartment)
    }

    fn parse_molecule(&mut self) -> Result<Molecule, BnglError> {
        let prefix = self.parse_compartment_prefix()?;
        let name = if self.eat('*') {
            ANY_MOLECULE.to_string()
        } else {
            self.parse_name()?
        };
        let mut molecule = Molecule::new(name);
        molecule.compartment = prefix;

        self.skip_ws();
        if self.peek() == Some('(') {
            let open = self.pos;
            self.pos += 1;
            molecule.components = self.parse_component_list(open)?;
            molecule.explicit_empty = molecule.components.is_empty();
        }

        loop {
            self.skip_ws();
            if self.eat('@') {
                molecule.compartment = Some(self.parse_name()?);
            } else if self.eat('%') {
                let label = self.take_word();
                if label.is_empty() {
                    return Err(self.unexpected("a molecule label"));
                }
                molecule.label = Some(label);
            } else {
                break;
            }
        }
        Ok(molecule)
    }

    fn parse_component_list(&mut self, open: usize) -> Result<Vec<Component>, BnglError> {
        let mut components = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(BnglError::UnclosedParen { pos: open }),
                Some(')') => {
                    self.pos += 1;
                    return Ok(components);
                }
                // empty entries such as `a,,b` are skipped
                Some(',') => {
                    self.pos += 1;
                }
                Some(_) => {
                    components.push(self.parse_component()?);
                    self.skip_ws();
                    match self.peek() {
                        Some(',') => self.pos += 1,
                        Some(')') => {}
                        None => return Err(BnglError::UnclosedParen { pos: open }),
                        Some(ch) => return Err(BnglError::UnexpectedChar { pos: self.pos, ch }),
                    }
                }
            }
        }
    }

    fn parse_component(&mut self) -> Result<Component, BnglError> {
        let name = self.take_word();
        if name.is_empty() {
            return Err(self.unexpected("a component name"));
        }
        let mut component = Component::new(name);

        while self.eat('~') {
            let state = if self.eat('?') || self.eat('*') {
                ANY_STATE.to_string()
            } else {
                self.take_word()
            };
            if state.is_empty() {
                return Err(self.unexpected("a state"));
            }
            // the first state is the current one, the rest are alternatives
            if component.state.is_none() {
                component.state = Some(state);
            }
        }

        while self.eat('!') {
            let start = self.pos;
            if let Some(wildcard) = self.peek().and_then(BondWildcard::from_symbol) {
                self.pos += 1;
                component.wildcard = Some(wildcard);
                continue;
            }
            let digits = self.take_word();
            match digits.parse::<BondLabel>() {
                Ok(label) if label > 0 => {
                    if component.bonds.insert(label, None).is_some() {
                        return Err(BnglError::SelfBond { label });
                    }
                }
                _ => return Err(BnglError::InvalidBondLabel { pos: start }),
            }
        }
        Ok(component)
    }
}

/// Resolves bond labels: a label on two sites becomes a bond, a label on one
/// site stays dangling.
fn build_graph(
    molecules: Vec<Molecule>,
    compartment: Option<String>,
) -> Result<SpeciesGraph, BnglError> {
    let mut endpoints: BTreeMap<BondLabel, Vec<Site>> = BTreeMap::new();
    for (mol, molecule) in molecules.iter().enumerate() {
        for (comp, component) in molecule.components.iter().enumerate() {
            for label in component.bond_labels() {
                endpoints.entry(label).or_default().push(Site::new(mol, comp));
            }
        }
    }

    let mut graph = SpeciesGraph::from_molecules(molecules);
    graph.set_compartment(compartment);
    let mut joined: BTreeSet<(Site, Site)> = BTreeSet::new();
    for (label, sites) in endpoints {
        match sites.as_slice() {
            [_] => {}
            [a, b] => {
                if !joined.insert((*a.min(b), *a.max(b))) {
                    return Err(BnglError::ParallelBond { label });
                }
                graph.add_bond(*a, *b, Some(label));
            }
            _ => {
                return Err(BnglError::BondArity {
                    label,
                    count: sites.len(),
                })
            }
        }
    }
    Ok(graph)
}

pub(crate) fn parse(s: &str) -> Result<SpeciesGraph, BnglError> {
    let mut parser = Parser::new(s);
    let graph = parser.parse_species()?;
    debug_assert_eq!(parser.input.chars().count(), parser.pos);
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_molecule_with_states() {
        let g = parse("RAF(phos1~U,phos2~P)").unwrap();
        assert_eq!(g.molecule_count(), 1);
        let m = g.molecule(0);
        assert_eq!(m.name, "RAF");
        assert_eq!(m.components.len(), 2);
        assert_eq!(m.components[0].state.as_deref(), Some("U"));
        assert_eq!(m.components[1].state.as_deref(), Some("P"));
        assert!(!m.explicit_empty);
    }

    #[test]
    fn bonds_are_resolved() {
        let g = parse("A(b!1).B(a!1)").unwrap();
        assert_eq!(g.bond_count(), 1);
        assert!(g.has_bond(Site::new(0, 0), Site::new(1, 0)));
        assert_eq!(g.component(Site::new(0, 0)).partner(1), Some(Site::new(1, 0)));
    }

    #[test]
    fn multi_site_bond_labels() {
        let g = parse("H(h!1!2).A(a!1).B(b!2)").unwrap();
        assert_eq!(g.bond_count(), 2);
        assert_eq!(g.component(Site::new(0, 0)).bond_count(), 2);
    }

    #[test]
    fn wildcards() {
        let g = parse("A(a!+,b!?,c!-,d)").unwrap();
        let comps = &g.molecule(0).components;
        assert_eq!(comps[0].wildcard, Some(BondWildcard::Bound));
        assert_eq!(comps[1].wildcard, Some(BondWildcard::Any));
        assert_eq!(comps[2].wildcard, Some(BondWildcard::Unbound));
        assert_eq!(comps[3].wildcard, None);
    }

    #[test]
    fn any_state_spellings() {
        let g = parse("A(a~?,b~*)").unwrap();
        let comps = &g.molecule(0).components;
        assert_eq!(comps[0].state.as_deref(), Some(ANY_STATE));
        assert_eq!(comps[1].state.as_deref(), Some(ANY_STATE));
    }

    #[test]
    fn first_state_is_current() {
        let g = parse("A(y~U~P)").unwrap();
        assert_eq!(g.molecule(0).components[0].state.as_deref(), Some("U"));
    }

    #[test]
    fn explicit_empty_versus_bare() {
        let g = parse("A().B").unwrap();
        assert!(g.molecule(0).explicit_empty);
        assert!(!g.molecule(1).explicit_empty);
        assert!(g.molecule(1).components.is_empty());
    }

    #[test]
    fn molecule_compartment_suffix_and_label() {
        let g = parse("R(l)@PM%r1.L(r)").unwrap();
        assert_eq!(g.molecule(0).compartment.as_deref(), Some("PM"));
        assert_eq!(g.molecule(0).label.as_deref(), Some("r1"));
        assert_eq!(g.molecule(1).compartment, None);
        assert_eq!(g.compartment(), None);
    }

    #[test]
    fn species_prefix_is_inherited() {
        for s in ["@CYT:A(b!1).B(a!1)@NUC", "@CYT::A(b!1).B(a!1)@NUC"] {
            let g = parse(s).unwrap();
            assert_eq!(g.compartment(), Some("CYT"));
            assert_eq!(g.molecule(0).compartment.as_deref(), Some("CYT"));
            assert_eq!(g.molecule(1).compartment.as_deref(), Some("NUC"));
        }
    }

    #[test]
    fn molecule_prefix_compartment() {
        let g = parse("@EC:L(r!1).@PM::R(l!1)").unwrap();
        assert_eq!(g.compartment(), Some("EC"));
        assert_eq!(g.molecule(1).compartment.as_deref(), Some("PM"));
    }

    #[test]
    fn wildcard_molecule() {
        let g = parse("*(a!+)").unwrap();
        assert!(g.molecule(0).is_wildcard());
    }

    #[test]
    fn whitespace_is_tolerated() {
        let g = parse("  A( a!1 , b ) . B(c!1)  ").unwrap();
        assert_eq!(g.molecule_count(), 2);
        assert_eq!(g.bond_count(), 1);
    }

    #[test]
    fn dangling_label_is_kept() {
        let g = parse("A(b!1)").unwrap();
        assert_eq!(g.bond_count(), 0);
        assert!(g.component(Site::new(0, 0)).has_dangling_bond());
    }

    #[test]
    fn error_empty() {
        assert_eq!(parse("   "), Err(BnglError::EmptyInput));
    }

    #[test]
    fn error_unclosed_paren() {
        assert_eq!(parse("A(b,c"), Err(BnglError::UnclosedParen { pos: 1 }));
    }

    #[test]
    fn error_bad_molecule_name() {
        assert_eq!(parse("1A(b)"), Err(BnglError::InvalidName { pos: 0 }));
    }

    #[test]
    fn error_bad_bond_label() {
        assert!(matches!(parse("A(b!x)"), Err(BnglError::InvalidBondLabel { .. })));
        assert!(matches!(parse("A(b!0)"), Err(BnglError::InvalidBondLabel { .. })));
    }

    #[test]
    fn error_empty_molecule() {
        assert!(matches!(parse("A..B"), Err(BnglError::EmptyMolecule { .. })));
        assert!(matches!(parse("A."), Err(BnglError::EmptyMolecule { .. })));
    }

    #[test]
    fn error_three_endpoints() {
        assert_eq!(
            parse("A(a!1).B(b!1).C(c!1)"),
            Err(BnglError::BondArity { label: 1, count: 3 })
        );
    }

    #[test]
    fn error_self_bond() {
        assert_eq!(parse("A(a!1!1)"), Err(BnglError::SelfBond { label: 1 }));
    }

    #[test]
    fn error_second_bond_between_same_sites() {
        assert_eq!(
            parse("A(a!1!2).B(b!1!2)"),
            Err(BnglError::ParallelBond { label: 2 })
        );
        assert!(parse("A(a!1,c!2).B(b!1,d!2)").is_ok());
    }

    #[test]
    fn error_junk_after_molecule() {
        assert!(matches!(parse("A(b) B(c)"), Err(BnglError::UnexpectedChar { ch: 'B', .. })));
    }
}
