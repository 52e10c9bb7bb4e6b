use std::collections::HashMap;

use crate::graph::SpeciesGraph;

/// Molecule-level core of the search: the partial pattern -> target mapping
/// plus the counters that define both frontiers.
///
/// `push` and `pop` are exact inverses. Every counter `push` increments is
/// decremented by the matching `pop`, so backtracking never leaves residue.
pub(crate) struct SearchState<'a> {
    pattern: &'a SpeciesGraph,
    target: &'a SpeciesGraph,
    pub(crate) pattern_adj: Vec<Vec<usize>>,
    pub(crate) target_adj: Vec<Vec<usize>>,
    core_pattern: Vec<Option<usize>>,
    core_target: Vec<Option<usize>>,
    /// Component map per pattern molecule, empty while unmapped.
    component_maps: Vec<Vec<usize>>,
    /// Number of mapped neighbors per molecule.
    pattern_touch: Vec<usize>,
    target_touch: Vec<usize>,
    mapped: usize,
}

impl<'a> SearchState<'a> {
    pub(crate) fn new(pattern: &'a SpeciesGraph, target: &'a SpeciesGraph) -> Self {
        let np = pattern.molecule_count();
        let nt = target.molecule_count();
        Self {
            pattern,
            target,
            pattern_adj: (0..np).map(|m| pattern.neighbor_molecules(m)).collect(),
            target_adj: (0..nt).map(|m| target.neighbor_molecules(m)).collect(),
            core_pattern: vec![None; np],
            core_target: vec![None; nt],
            component_maps: vec![Vec::new(); np],
            pattern_touch: vec![0; np],
            target_touch: vec![0; nt],
            mapped: 0,
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.mapped == self.core_pattern.len()
    }

    pub(crate) fn core_pattern(&self) -> &[Option<usize>] {
        &self.core_pattern
    }

    pub(crate) fn core_target(&self) -> &[Option<usize>] {
        &self.core_target
    }

    pub(crate) fn component_maps(&self) -> &[Vec<usize>] {
        &self.component_maps
    }

    pub(crate) fn push(&mut self, p: usize, t: usize, components: Vec<usize>) {
        debug_assert!(self.core_pattern[p].is_none() && self.core_target[t].is_none());
        self.core_pattern[p] = Some(t);
        self.core_target[t] = Some(p);
        self.component_maps[p] = components;
        for &n in &self.pattern_adj[p] {
            self.pattern_touch[n] += 1;
        }
        for &n in &self.target_adj[t] {
            self.target_touch[n] += 1;
        }
        self.mapped += 1;
    }

    pub(crate) fn pop(&mut self, p: usize) {
        let Some(t) = self.core_pattern[p].take() else {
            return;
        };
        self.core_target[t] = None;
        self.component_maps[p].clear();
        for &n in &self.pattern_adj[p] {
            self.pattern_touch[n] -= 1;
        }
        for &n in &self.target_adj[t] {
            self.target_touch[n] -= 1;
        }
        self.mapped -= 1;
    }

    fn in_pattern_frontier(&self, p: usize) -> bool {
        self.core_pattern[p].is_none() && self.pattern_touch[p] > 0
    }

    /// The next molecule to decide: the first frontier molecule in `order`,
    /// or the first unmapped one when the frontier is empty.
    pub(crate) fn next_pattern_node(&self, order: &[usize]) -> Option<usize> {
        order
            .iter()
            .copied()
            .find(|&p| self.in_pattern_frontier(p))
            .or_else(|| order.iter().copied().find(|&p| self.core_pattern[p].is_none()))
    }

    /// Target molecules worth trying for `p`, ascending. A frontier molecule
    /// can only land next to what is already mapped. A molecule from a
    /// disconnected part of the pattern may land anywhere.
    pub(crate) fn target_candidates(&self, p: usize) -> Vec<usize> {
        let frontier_only = self.in_pattern_frontier(p);
        (0..self.core_target.len())
            .filter(|&t| self.core_target[t].is_none())
            .filter(|&t| !frontier_only || self.target_touch[t] > 0)
            .collect()
    }

    /// Name, compartment and component-name multiset.
    pub(crate) fn quick_feasible(&self, p: usize, t: usize) -> bool {
        self.pattern.molecule_accepts(p, self.target, t)
            && self
                .pattern
                .molecule(p)
                .component_names_fit(self.target.molecule(t))
    }

    /// Treating `(p, t)` as mapped, every labelled molecule the pattern still
    /// needs next to its mapped part must be available next to the target's
    /// mapped part. Wildcard molecules are not counted.
    pub(crate) fn label_consistent(&self, p: usize, t: usize) -> bool {
        let mut exact: HashMap<(&str, &str), usize> = HashMap::new();
        let mut by_name: HashMap<&str, usize> = HashMap::new();
        let pattern_sources = self.mapped_pattern_nodes().chain(std::iter::once(p));
        for source in pattern_sources {
            for &n in &self.pattern_adj[source] {
                if n == p || self.core_pattern[n].is_some() {
                    continue;
                }
                let molecule = self.pattern.molecule(n);
                if molecule.is_wildcard() {
                    continue;
                }
                match self.pattern.molecule_compartment(n) {
                    Some(c) => *exact.entry((molecule.name.as_str(), c)).or_default() += 1,
                    None => *by_name.entry(molecule.name.as_str()).or_default() += 1,
                }
            }
        }
        if exact.is_empty() && by_name.is_empty() {
            return true;
        }

        let mut target_exact: HashMap<(&str, &str), usize> = HashMap::new();
        let mut target_by_name: HashMap<&str, usize> = HashMap::new();
        let target_sources = self.mapped_target_nodes().chain(std::iter::once(t));
        for source in target_sources {
            for &n in &self.target_adj[source] {
                if n == t || self.core_target[n].is_some() {
                    continue;
                }
                let molecule = self.target.molecule(n);
                if let Some(c) = self.target.molecule_compartment(n) {
                    *target_exact.entry((molecule.name.as_str(), c)).or_default() += 1;
                }
                *target_by_name.entry(molecule.name.as_str()).or_default() += 1;
            }
        }

        exact
            .iter()
            .all(|(key, &need)| target_exact.get(key).copied().unwrap_or(0) >= need)
            && by_name
                .iter()
                .all(|(name, &need)| target_by_name.get(name).copied().unwrap_or(0) >= need)
    }

    /// `p` cannot have more unmapped neighbors than `t`.
    pub(crate) fn neighbor_counts_fit(&self, p: usize, t: usize) -> bool {
        let pattern_open = self.pattern_adj[p]
            .iter()
            .filter(|&&n| self.core_pattern[n].is_none())
            .count();
        let target_open = self.target_adj[t]
            .iter()
            .filter(|&&n| self.core_target[n].is_none())
            .count();
        pattern_open <= target_open
    }

    fn mapped_pattern_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.core_pattern.len()).filter(|&m| self.core_pattern[m].is_some())
    }

    fn mapped_target_nodes(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.core_target.len()).filter(|&m| self.core_target[m].is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bngl::from_bngl;

    fn graphs(pattern: &str, target: &str) -> (SpeciesGraph, SpeciesGraph) {
        (from_bngl(pattern).unwrap(), from_bngl(target).unwrap())
    }

    #[test]
    fn push_pop_restores_frontiers() {
        let (p, t) = graphs("A(b!1).B(a!1)", "A(b!1).B(a!1).C");
        let mut state = SearchState::new(&p, &t);
        let order = vec![0, 1];
        assert_eq!(state.next_pattern_node(&order), Some(0));
        assert_eq!(state.target_candidates(0), vec![0, 1, 2]);

        state.push(0, 0, vec![0]);
        assert_eq!(state.next_pattern_node(&order), Some(1));
        assert_eq!(state.target_candidates(1), vec![1]);

        state.pop(0);
        assert_eq!(state.target_candidates(0), vec![0, 1, 2]);
        assert!(state.core_pattern().iter().all(Option::is_none));
        assert!(state.core_target().iter().all(Option::is_none));
        assert!(state.component_maps().iter().all(Vec::is_empty));
    }

    #[test]
    fn disconnected_node_may_land_anywhere() {
        let (p, t) = graphs("A.B", "A(x!1).C(y!1).B");
        let mut state = SearchState::new(&p, &t);
        state.push(0, 0, vec![]);
        assert_eq!(state.next_pattern_node(&[0, 1]), Some(1));
        assert_eq!(state.target_candidates(1), vec![1, 2]);
    }

    #[test]
    fn quick_check_uses_names_and_compartments() {
        let (p, t) = graphs("R(l,l)@PM", "R(l,l)@PM.R(l)@PM.R(l,l)@EC");
        let state = SearchState::new(&p, &t);
        assert!(state.quick_feasible(0, 0));
        assert!(!state.quick_feasible(0, 1));
        assert!(!state.quick_feasible(0, 2));
    }

    #[test]
    fn label_cut_rejects_missing_neighbor_type() {
        // pattern needs a B next to A; first target A only has a C next to it
        let (p, t) = graphs("A(x!1).B(y!1)", "A(x!1).C(y!1).A(x!2).B(y!2)");
        let state = SearchState::new(&p, &t);
        assert!(!state.label_consistent(0, 0));
        assert!(state.label_consistent(0, 2));
    }

    #[test]
    fn label_cut_respects_compartments() {
        let (p, t) = graphs("A(x!1).B(y!1)@PM", "A(x!1).B(y!1)@EC");
        let state = SearchState::new(&p, &t);
        assert!(!state.label_consistent(0, 0));
    }

    #[test]
    fn species_compartment_counts_as_molecule_compartment() {
        let pattern = from_bngl("A(x)@PM").unwrap();
        let target = SpeciesGraph::from_molecules(vec![crate::Molecule::new("A")
            .with_components(vec![crate::Component::new("x")])])
        .with_compartment("PM");
        let state = SearchState::new(&pattern, &target);
        assert!(state.quick_feasible(0, 0));

        let (p, mut t) = graphs("A(x!1).B(y!1)@PM", "A(x!1).B(y!1)");
        t.set_compartment(Some("PM".into()));
        let state = SearchState::new(&p, &t);
        assert!(state.label_consistent(0, 0));
    }

    #[test]
    fn label_cut_ignores_wildcard_neighbors() {
        let (p, t) = graphs("A(x!1).*(y!1)", "A(x!1).C(y!1)");
        let state = SearchState::new(&p, &t);
        assert!(state.label_consistent(0, 0));
    }

    #[test]
    fn neighbor_count_check() {
        let (p, t) = graphs("A(x!1,y!2).B(a!1).C(a!2)", "A(x!1,y).B(a!1)");
        let state = SearchState::new(&p, &t);
        assert!(!state.neighbor_counts_fit(0, 0));
        assert!(state.neighbor_counts_fit(1, 1));
    }
}
