use std::collections::BTreeMap;

use crate::bond::{BondLabel, Site};

/// State label meaning "any internal state" in a pattern (`~?` or `~*`).
pub const ANY_STATE: &str = "?";

/// Pattern-only bond requirement written after `!` in BNGL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondWildcard {
    /// `!+`: the site must carry at least one bond.
    Bound,
    /// `!-`: the site must be free.
    Unbound,
    /// `!?`: bonded or free.
    Any,
}

impl BondWildcard {
    pub fn from_symbol(ch: char) -> Option<Self> {
        match ch {
            '+' => Some(Self::Bound),
            '-' => Some(Self::Unbound),
            '?' => Some(Self::Any),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Self::Bound => '+',
            Self::Unbound => '-',
            Self::Any => '?',
        }
    }
}

/// A named binding site on one molecule instance.
///
/// Concrete species always carry a concrete state (or none, for stateless
/// sites) and never a wildcard. Patterns may leave the state open and may
/// loosen the bond requirement with a [`BondWildcard`].
///
/// A pattern component with neither a wildcard nor an explicit bond requires
/// the matched site to be **unbound**. `A(s)` does not match `A(s!1).B(a!1)`;
/// write `A(s!?)` for the permissive form.
///
/// # Examples
///
/// ```
/// use bngcrab::{BondWildcard, Component};
///
/// let phospho = Component::new("Y1068").with_state("P").with_wildcard(BondWildcard::Bound);
/// assert_eq!(phospho.state.as_deref(), Some("P"));
/// assert!(phospho.accepts_bond_status(true));
/// assert!(!phospho.accepts_bond_status(false));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Component {
    /// Site name. Not unique: a molecule may repeat a name (`B(y,y)`).
    pub name: String,
    /// Internal state such as `P` or `U`. `None` (or [`ANY_STATE`]) in a
    /// pattern accepts every state.
    pub state: Option<String>,
    /// Bond wildcard, meaningful only in patterns.
    pub wildcard: Option<BondWildcard>,
    /// Bond label -> partner site. `None` marks a dangling bond whose
    /// partner lies outside the graph. Kept in step with the owning graph's
    /// site adjacency by [`SpeciesGraph`](crate::SpeciesGraph).
    pub(crate) bonds: BTreeMap<BondLabel, Option<Site>>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_wildcard(mut self, wildcard: BondWildcard) -> Self {
        self.wildcard = Some(wildcard);
        self
    }

    /// Marks the site as bonded under `label` to a partner that is not part
    /// of the graph, as in the pattern `A(b!1)` written without its partner.
    pub fn with_dangling_bond(mut self, label: BondLabel) -> Self {
        self.bonds.insert(label, None);
        self
    }

    pub fn bond_labels(&self) -> impl Iterator<Item = BondLabel> + '_ {
        self.bonds.keys().copied()
    }

    pub fn bond_count(&self) -> usize {
        self.bonds.len()
    }

    /// Partner site of the bond `label`, if the bond is resolved.
    pub fn partner(&self, label: BondLabel) -> Option<Site> {
        self.bonds.get(&label).copied().flatten()
    }

    pub fn has_explicit_bond(&self) -> bool {
        !self.bonds.is_empty()
    }

    pub fn has_dangling_bond(&self) -> bool {
        self.bonds.values().any(Option::is_none)
    }

    pub fn has_open_state(&self) -> bool {
        matches!(self.state.as_deref(), None | Some(ANY_STATE))
    }

    /// State compatibility of this pattern site with a target site.
    pub fn accepts_state(&self, target: &Component) -> bool {
        self.has_open_state() || self.state == target.state
    }

    /// Bond requirement of this pattern site against whether the target site
    /// is bound.
    ///
    /// | pattern                 | target must be |
    /// |-------------------------|----------------|
    /// | `!+`                    | bound          |
    /// | `!-`                    | unbound        |
    /// | `!?`                    | either         |
    /// | explicit bond `!1`      | bound          |
    /// | nothing                 | unbound        |
    pub fn accepts_bond_status(&self, target_bound: bool) -> bool {
        match self.wildcard {
            Some(BondWildcard::Bound) => target_bound,
            Some(BondWildcard::Unbound) => !target_bound,
            Some(BondWildcard::Any) => true,
            None if self.has_explicit_bond() => target_bound,
            None => !target_bound,
        }
    }

    /// Name, state and bond-status compatibility. Bond *topology* (which
    /// partner the bond lands on) is checked by the callers that know the
    /// molecule mapping.
    pub fn accepts(&self, target: &Component, target_bound: bool) -> bool {
        self.name == target.name
            && self.accepts_state(target)
            && self.accepts_bond_status(target_bound)
    }

    /// Search priority: sites with more constraints are tried first.
    pub(crate) fn constraint_score(&self) -> u32 {
        let mut score = self.bonds.len() as u32 * 10;
        score += match self.wildcard {
            Some(BondWildcard::Bound) => 5,
            Some(BondWildcard::Unbound) => 4,
            Some(BondWildcard::Any) => 1,
            None if self.bonds.is_empty() => 2,
            None => 0,
        };
        if !self.has_open_state() {
            score += 3;
        }
        score
    }

    /// Drops resolved bonds and keeps dangling ones. Used when a molecule is
    /// copied into a new graph whose bonds are rebuilt from adjacency.
    pub(crate) fn clear_resolved_bonds(&mut self) {
        self.bonds.retain(|_, partner| partner.is_none());
    }
}
