use crate::component::Component;

/// Molecule name that matches any molecule type in a pattern (`*`).
pub const ANY_MOLECULE: &str = "*";

/// A typed node of a species graph: a molecule type name plus its ordered
/// binding sites.
///
/// Molecules carry no id. Their identity is their index inside the owning
/// [`SpeciesGraph`](crate::SpeciesGraph), and cloning deep-copies the
/// component list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Molecule {
    pub name: String,
    pub components: Vec<Component>,
    /// Compartment of this molecule. When unset the species compartment
    /// applies. A pattern molecule with neither matches targets in any
    /// compartment.
    pub compartment: Option<String>,
    /// Rule label written as `%label`, used to tie reactant and product
    /// molecules together.
    pub label: Option<String>,
    /// `A()` rather than bare `A`. The two serialize differently.
    pub explicit_empty: bool,
}

impl Molecule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        self.components.extend(components);
        self
    }

    pub fn with_compartment(mut self, compartment: impl Into<String>) -> Self {
        self.compartment = Some(compartment.into());
        self
    }

    pub fn with_explicit_empty(mut self) -> Self {
        self.explicit_empty = true;
        self
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == ANY_MOLECULE
    }

    /// Type and compartment compatibility of this pattern molecule with a
    /// target molecule. Component-level compatibility is a separate check.
    pub fn accepts(&self, target: &Molecule) -> bool {
        self.accepts_in(
            self.compartment.as_deref(),
            target,
            target.compartment.as_deref(),
        )
    }

    /// [`Molecule::accepts`] with both compartments supplied by the caller,
    /// for molecules whose compartment is inherited from their species.
    pub fn accepts_in(
        &self,
        compartment: Option<&str>,
        target: &Molecule,
        target_compartment: Option<&str>,
    ) -> bool {
        if !self.is_wildcard() && self.name != target.name {
            return false;
        }
        match compartment {
            Some(c) => target_compartment == Some(c),
            None => true,
        }
    }

    /// Whether `target` has at least as many sites of every name as this
    /// molecule asks for.
    pub fn component_names_fit(&self, target: &Molecule) -> bool {
        if target.components.len() < self.components.len() {
            return false;
        }
        let mut needed: Vec<(&str, usize)> = Vec::new();
        for comp in &self.components {
            match needed.iter_mut().find(|(name, _)| *name == comp.name) {
                Some((_, count)) => *count += 1,
                None => needed.push((&comp.name, 1)),
            }
        }
        needed.iter().all(|&(name, count)| {
            target.components.iter().filter(|c| c.name == name).count() >= count
        })
    }
}
