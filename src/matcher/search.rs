use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::bond::Site;
use crate::graph::SpeciesGraph;

use super::components::{Assignment, ComponentSolver, Core, JointAssigner};
use super::ordering::node_ordering;
use super::state::SearchState;
use super::{MatchLimits, MatchMap, MatchOutcome, SearchStatus};

/// One molecule-level backtracking search over a (pattern, target) pair.
pub(crate) struct Search<'a> {
    pattern: &'a SpeciesGraph,
    target: &'a SpeciesGraph,
    limits: MatchLimits,
    state: SearchState<'a>,
    solver: ComponentSolver<'a>,
    order: Vec<usize>,
    steps: usize,
    molecule_budget_hit: bool,
    component_budget_hit: bool,
    first_only: bool,
    maps: Vec<MatchMap>,
}

impl<'a> Search<'a> {
    pub(crate) fn new(pattern: &'a SpeciesGraph, target: &'a SpeciesGraph, limits: MatchLimits) -> Self {
        let state = SearchState::new(pattern, target);
        let order = node_ordering(pattern, target, &state.pattern_adj);
        Self {
            pattern,
            target,
            limits,
            state,
            solver: ComponentSolver::new(pattern, target, limits.max_component_steps),
            order,
            steps: 0,
            molecule_budget_hit: false,
            component_budget_hit: false,
            first_only: false,
            maps: Vec::new(),
        }
    }

    pub(crate) fn run_all(mut self) -> MatchOutcome {
        self.recurse();
        self.finish()
    }

    pub(crate) fn run_first(mut self) -> MatchOutcome {
        self.first_only = true;
        self.recurse();
        self.finish()
    }

    fn finish(self) -> MatchOutcome {
        if self.molecule_budget_hit {
            warn!(
                "molecule-level step budget ({}) exhausted matching {} in {}; returning {} partial matches",
                self.limits.max_molecule_steps,
                self.pattern,
                self.target,
                self.maps.len()
            );
        }
        if self.component_budget_hit {
            warn!(
                "component-level step budget ({}) exhausted matching {} in {}",
                self.limits.max_component_steps, self.pattern, self.target
            );
        }
        let status = if self.molecule_budget_hit || self.component_budget_hit {
            SearchStatus::Bounded
        } else {
            SearchStatus::Complete
        };
        MatchOutcome {
            maps: self.maps,
            status,
        }
    }

    fn done(&self) -> bool {
        self.molecule_budget_hit || (self.first_only && !self.maps.is_empty())
    }

    fn recurse(&mut self) {
        self.steps += 1;
        if self.steps > self.limits.max_molecule_steps {
            self.molecule_budget_hit = true;
            return;
        }
        if self.state.is_complete() {
            if let Some(map) = self.complete_match() {
                self.maps.push(map);
            }
            return;
        }

        let Some(p) = self.state.next_pattern_node(&self.order) else {
            return;
        };
        for t in self.state.target_candidates(p) {
            if self.done() {
                return;
            }
            let Some(components) = self.feasible(p, t) else {
                continue;
            };
            self.state.push(p, t, components);
            self.recurse();
            self.state.pop(p);
        }
    }

    fn feasible(&mut self, p: usize, t: usize) -> Option<Vec<usize>> {
        if !self.state.quick_feasible(p, t) || !self.state.label_consistent(p, t) {
            return None;
        }
        let core = Core {
            pattern: self.state.core_pattern(),
            target: self.state.core_target(),
        };
        let components = match self.solver.solve(p, t, core) {
            Assignment::Found(components) => components,
            Assignment::Infeasible => {
                debug!("no component assignment for pattern molecule {p} on target molecule {t}");
                return None;
            }
            Assignment::Exhausted => {
                self.component_budget_hit = true;
                return None;
            }
        };
        self.state.neighbor_counts_fit(p, t).then_some(components)
    }

    /// Builds the match for a complete molecule mapping. The component maps
    /// stored during descent are kept when they satisfy every pattern bond,
    /// otherwise all sites are re-assigned jointly.
    fn complete_match(&mut self) -> Option<MatchMap> {
        let molecule_map: Vec<usize> = self.state.core_pattern().iter().flatten().copied().collect();
        let stored = self.state.component_maps();
        let stored_ok = self.pattern.bonds().all(|(a, b, _)| {
            let ta = Site::new(molecule_map[a.mol], stored[a.mol][a.comp]);
            let tb = Site::new(molecule_map[b.mol], stored[b.mol][b.comp]);
            self.target.has_bond(ta, tb)
        });

        let component_maps = if stored_ok {
            stored.to_vec()
        } else {
            let mut joint = JointAssigner::new(
                self.pattern,
                self.target,
                &molecule_map,
                self.limits.max_component_steps,
            );
            match joint.first() {
                Assignment::Found(maps) => maps,
                Assignment::Infeasible => return None,
                Assignment::Exhausted => {
                    self.component_budget_hit = true;
                    return None;
                }
            }
        };

        let mut component_map = BTreeMap::new();
        for (p_mol, comps) in component_maps.iter().enumerate() {
            for (pc, &tc) in comps.iter().enumerate() {
                component_map.insert(Site::new(p_mol, pc), Site::new(molecule_map[p_mol], tc));
            }
        }
        Some(MatchMap {
            molecule_map,
            component_map,
        })
    }
}
