//! Reaction rules: reactant and product patterns, the structural edits that
//! turn one into the other, and per-reactant include/exclude constraints.

mod constraint;
pub mod error;

pub use constraint::{ConstraintKind, ReactantConstraint};
pub use error::RuleError;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::warn;

use crate::bond::Site;
use crate::graph::SpeciesGraph;
use crate::matcher::GraphMatcher;
use crate::molecule::Molecule;

/// One structural edit of a rule. Sites and molecule indices refer to the
/// reactant patterns taken together, molecule by molecule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    AddBond { a: Site, b: Site },
    DeleteBond { a: Site, b: Site },
    ChangeState { site: Site, state: String },
    DeleteMolecule { mol: usize },
    /// A product molecule with no reactant counterpart.
    AddMolecule { product_mol: usize, molecule: Molecule },
    ChangeCompartment { mol: usize, compartment: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RxnRule {
    pub name: String,
    pub reactants: Vec<SpeciesGraph>,
    pub products: Vec<SpeciesGraph>,
    pub rate_constant: f64,
    /// Rate law text, written instead of the constant when present.
    pub rate_expression: Option<String>,
    pub allows_intramolecular: bool,
    pub edits: Vec<EditOp>,
    constraints: Vec<ReactantConstraint>,
}

impl RxnRule {
    pub fn new(
        name: impl Into<String>,
        reactants: Vec<SpeciesGraph>,
        products: Vec<SpeciesGraph>,
        rate_constant: f64,
    ) -> Self {
        Self {
            name: name.into(),
            reactants,
            products,
            rate_constant,
            rate_expression: None,
            allows_intramolecular: true,
            edits: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_rate_expression(mut self, expression: impl Into<String>) -> Self {
        self.rate_expression = Some(expression.into());
        self
    }

    pub fn with_edit(mut self, edit: EditOp) -> Self {
        self.edits.push(edit);
        self
    }

    pub fn constraints(&self) -> &[ReactantConstraint] {
        &self.constraints
    }

    /// Adds a constraint written as `exclude_reactants(1, A(b~P))` or
    /// `include_reactants(2, B(x))`. Reactants are numbered from 1.
    ///
    /// ```
    /// use bngcrab::{from_bngl, GraphMatcher, RxnRule};
    ///
    /// let mut rule = RxnRule::new(
    ///     "bind",
    ///     vec![from_bngl("A(b)").unwrap(), from_bngl("B(a)").unwrap()],
    ///     vec![from_bngl("A(b!1).B(a!1)").unwrap()],
    ///     1.0,
    /// );
    /// rule.add_constraint("exclude_reactants(1, A(y~P))").unwrap();
    ///
    /// let matcher = GraphMatcher::new();
    /// assert!(rule.reactant_allowed(&matcher, 0, &from_bngl("A(b,y~U)").unwrap()));
    /// assert!(!rule.reactant_allowed(&matcher, 0, &from_bngl("A(b,y~P)").unwrap()));
    /// ```
    pub fn add_constraint(&mut self, constraint: &str) -> Result<(), RuleError> {
        let parsed = constraint::parse_constraint(constraint, self.reactants.len())?;
        self.constraints.push(parsed);
        Ok(())
    }

    /// Adds every well-formed constraint and logs the rest.
    pub fn apply_constraints<'s>(&mut self, constraints: impl IntoIterator<Item = &'s str>) {
        for constraint in constraints {
            if let Err(e) = self.add_constraint(constraint) {
                warn!("rule {}: ignoring constraint {constraint}: {e}", self.name);
            }
        }
    }

    /// Whether `species` may fill reactant slot `index` (0-based): it matches
    /// every include pattern and no exclude pattern for that slot.
    pub fn reactant_allowed(&self, matcher: &GraphMatcher, index: usize, species: &SpeciesGraph) -> bool {
        self.constraints
            .iter()
            .filter(|c| c.reactant == index)
            .all(|c| c.allows(matcher, species))
    }

    /// Whether some molecule type appears in the reactants and the products
    /// with different compartment sets, i.e. the rule moves it. A molecule
    /// without its own compartment takes the species one.
    pub fn is_transport_rule(&self) -> bool {
        let reactant_compartments = compartments_by_type(&self.reactants);
        let product_compartments = compartments_by_type(&self.products);
        reactant_compartments.iter().any(|(name, before)| {
            product_compartments
                .get(name)
                .is_some_and(|after| before != after)
        })
    }
}

fn compartments_by_type(graphs: &[SpeciesGraph]) -> BTreeMap<&str, BTreeSet<Option<&str>>> {
    let mut out: BTreeMap<&str, BTreeSet<Option<&str>>> = BTreeMap::new();
    for graph in graphs {
        for (mol, molecule) in graph.molecules().iter().enumerate() {
            out.entry(molecule.name.as_str())
                .or_default()
                .insert(graph.molecule_compartment(mol));
        }
    }
    out
}

impl fmt::Display for RxnRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_side(f, &self.reactants)?;
        f.write_str(" -> ")?;
        write_side(f, &self.products)?;
        match &self.rate_expression {
            Some(expr) => write!(f, " {expr}"),
            None => write!(f, " {}", self.rate_constant),
        }
    }
}

fn write_side(f: &mut fmt::Formatter<'_>, side: &[SpeciesGraph]) -> fmt::Result {
    for (i, graph) in side.iter().enumerate() {
        if i > 0 {
            f.write_str(" + ")?;
        }
        write!(f, "{graph}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bngl::from_bngl;

    fn g(s: &str) -> SpeciesGraph {
        from_bngl(s).unwrap()
    }

    fn binding_rule() -> RxnRule {
        RxnRule::new("bind", vec![g("A(b)"), g("B(a)")], vec![g("A(b!1).B(a!1)")], 0.5)
            .with_edit(EditOp::AddBond {
                a: Site::new(0, 0),
                b: Site::new(1, 0),
            })
    }

    #[test]
    fn display() {
        assert_eq!(binding_rule().to_string(), "A(b) + B(a) -> A(b!1).B(a!1) 0.5");
        let rule = binding_rule().with_rate_expression("kon*f(t)");
        assert_eq!(rule.to_string(), "A(b) + B(a) -> A(b!1).B(a!1) kon*f(t)");
    }

    #[test]
    fn defaults() {
        let rule = binding_rule();
        assert!(rule.allows_intramolecular);
        assert!(rule.constraints().is_empty());
        assert_eq!(rule.edits.len(), 1);
    }

    #[test]
    fn include_and_exclude() {
        let mut rule = binding_rule();
        rule.add_constraint("include_reactants(2, B(s~P))").unwrap();
        rule.add_constraint("exclude_reactants(2, B(t!+))").unwrap();
        let matcher = GraphMatcher::uncached();

        assert!(rule.reactant_allowed(&matcher, 1, &g("B(a,s~P,t)")));
        assert!(!rule.reactant_allowed(&matcher, 1, &g("B(a,s~U,t)")));
        assert!(!rule.reactant_allowed(&matcher, 1, &g("B(a,s~P,t!1).C(b!1)")));
        // other slot is unconstrained
        assert!(rule.reactant_allowed(&matcher, 0, &g("A(b)")));
    }

    #[test]
    fn apply_constraints_skips_bad_ones() {
        let mut rule = binding_rule();
        rule.apply_constraints(["exclude_reactants(1, A(y~P))", "nonsense", "exclude_reactants(5, A)"]);
        assert_eq!(rule.constraints().len(), 1);
    }

    #[test]
    fn transport_rule_detection() {
        let transport = RxnRule::new("move", vec![g("A(x)@cyto")], vec![g("A(x)@nuc")], 1.0);
        assert!(transport.is_transport_rule());

        assert!(!binding_rule().is_transport_rule());

        let same = RxnRule::new("stay", vec![g("A(x)@cyto")], vec![g("A(x~P)@cyto")], 1.0);
        assert!(!same.is_transport_rule());

        let species_level = RxnRule::new("import", vec![g("@EC:L(r)")], vec![g("@CP:L(r)")], 1.0);
        assert!(species_level.is_transport_rule());

        let degradation = RxnRule::new("deg", vec![g("A(x)@cyto")], vec![], 1.0)
            .with_edit(EditOp::DeleteMolecule { mol: 0 });
        assert!(!degradation.is_transport_rule());
    }
}
