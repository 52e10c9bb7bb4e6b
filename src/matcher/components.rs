//! Component-level assignment: which target site each pattern site lands on.
//!
//! During the molecule search one molecule pair is solved at a time
//! ([`ComponentSolver`]). Bonds to molecules that are not mapped yet can only
//! be checked loosely there, so a complete molecule mapping is confirmed
//! with [`JointAssigner`], which assigns every pattern site at once and
//! checks every pattern bond exactly. The degeneracy counter enumerates
//! with the same assigner.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::rc::Rc;

use crate::bond::Site;
use crate::graph::SpeciesGraph;

/// Result of a bounded assignment search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Assignment<T> {
    Found(T),
    Infeasible,
    /// The step budget ran out before the search finished.
    Exhausted,
}

enum Flow {
    Done,
    Dead,
    Exhausted,
}

/// Molecule-level mapping the per-pair solver may consult.
#[derive(Clone, Copy)]
pub(crate) struct Core<'c> {
    pub(crate) pattern: &'c [Option<usize>],
    pub(crate) target: &'c [Option<usize>],
}

type CandidateKey = (usize, usize, usize, u64);

struct PairFrame {
    p_mol: usize,
    t_mol: usize,
    assignment: Vec<Option<usize>>,
    used: Vec<bool>,
    /// Bitmask of `used`, valid when the target molecule has at most 64 sites.
    mask: u64,
    remaining: Vec<usize>,
    steps: usize,
}

impl PairFrame {
    fn set(&mut self, pc: usize, tc: usize) {
        self.assignment[pc] = Some(tc);
        self.used[tc] = true;
        if tc < 64 {
            self.mask |= 1 << tc;
        }
    }

    fn unset(&mut self, pc: usize, tc: usize) {
        self.assignment[pc] = None;
        self.used[tc] = false;
        if tc < 64 {
            self.mask &= !(1 << tc);
        }
    }
}

/// Solves one (pattern molecule, target molecule) pair. Candidate lists are
/// memoized per used-site set and survive across sibling attempts of the
/// same search.
pub(crate) struct ComponentSolver<'a> {
    pattern: &'a SpeciesGraph,
    target: &'a SpeciesGraph,
    max_steps: usize,
    memo: HashMap<CandidateKey, Rc<[usize]>>,
}

impl<'a> ComponentSolver<'a> {
    pub(crate) fn new(pattern: &'a SpeciesGraph, target: &'a SpeciesGraph, max_steps: usize) -> Self {
        Self {
            pattern,
            target,
            max_steps,
            memo: HashMap::new(),
        }
    }

    pub(crate) fn solve(&mut self, p_mol: usize, t_mol: usize, core: Core<'_>) -> Assignment<Vec<usize>> {
        let components = &self.pattern.molecule(p_mol).components;
        if components.is_empty() {
            return Assignment::Found(Vec::new());
        }
        let mut remaining: Vec<usize> = (0..components.len()).collect();
        remaining.sort_by_key(|&c| Reverse(components[c].constraint_score()));

        let mut frame = PairFrame {
            p_mol,
            t_mol,
            assignment: vec![None; components.len()],
            used: vec![false; self.target.molecule(t_mol).components.len()],
            mask: 0,
            remaining,
            steps: 0,
        };
        match self.assign(&mut frame, core) {
            Flow::Done => Assignment::Found(frame.assignment.into_iter().flatten().collect()),
            Flow::Dead => Assignment::Infeasible,
            Flow::Exhausted => Assignment::Exhausted,
        }
    }

    fn assign(&mut self, frame: &mut PairFrame, core: Core<'_>) -> Flow {
        frame.steps += 1;
        if frame.steps > self.max_steps {
            return Flow::Exhausted;
        }
        if frame.remaining.is_empty() {
            return Flow::Done;
        }

        // most constrained first; ties keep priority order
        let mut best = 0;
        let mut best_candidates: Option<Rc<[usize]>> = None;
        for i in 0..frame.remaining.len() {
            let candidates = self.candidates(frame, frame.remaining[i]);
            let fewer = best_candidates
                .as_ref()
                .map_or(true, |b| candidates.len() < b.len());
            if fewer {
                best = i;
                let empty = candidates.is_empty();
                best_candidates = Some(candidates);
                if empty {
                    break;
                }
            }
        }
        let Some(candidates) = best_candidates else {
            return Flow::Dead;
        };
        if candidates.is_empty() {
            return Flow::Dead;
        }

        let pc = frame.remaining.remove(best);
        for &tc in candidates.iter() {
            if frame.used[tc] || !self.bonds_consistent(frame, pc, tc, core) {
                continue;
            }
            frame.set(pc, tc);
            match self.assign(frame, core) {
                Flow::Done => return Flow::Done,
                Flow::Exhausted => return Flow::Exhausted,
                Flow::Dead => frame.unset(pc, tc),
            }
        }
        frame.remaining.insert(best, pc);
        Flow::Dead
    }

    /// Unused target sites passing name, state and bond-status checks.
    fn candidates(&mut self, frame: &PairFrame, pc: usize) -> Rc<[usize]> {
        let target_components = &self.target.molecule(frame.t_mol).components;
        let key = (target_components.len() <= 64).then_some((frame.p_mol, frame.t_mol, pc, frame.mask));
        if let Some(hit) = key.and_then(|k| self.memo.get(&k)) {
            return Rc::clone(hit);
        }

        let p_comp = self.pattern.component(Site::new(frame.p_mol, pc));
        let computed: Rc<[usize]> = (0..target_components.len())
            .filter(|&tc| !frame.used[tc])
            .filter(|&tc| {
                let site = Site::new(frame.t_mol, tc);
                p_comp.accepts(self.target.component(site), self.target.is_bound(site))
            })
            .collect();
        if let Some(k) = key {
            self.memo.insert(k, Rc::clone(&computed));
        }
        computed
    }

    fn bonds_consistent(&self, frame: &PairFrame, pc: usize, tc: usize, core: Core<'_>) -> bool {
        let t_site = Site::new(frame.t_mol, tc);
        let p_comp = self.pattern.component(Site::new(frame.p_mol, pc));

        for label in p_comp.bond_labels() {
            let Some(partner) = p_comp.partner(label) else {
                continue;
            };
            let ok = if partner.mol == frame.p_mol {
                match frame.assignment[partner.comp] {
                    Some(tc2) => self.target.has_bond(t_site, Site::new(frame.t_mol, tc2)),
                    None => self
                        .target
                        .partners(t_site)
                        .any(|s| s.mol == frame.t_mol && s.comp != tc),
                }
            } else {
                let partner_comp = self.pattern.component(partner);
                match core.pattern[partner.mol] {
                    Some(t_partner_mol) => self.target.partners(t_site).any(|s| {
                        s.mol == t_partner_mol
                            && partner_comp.accepts(self.target.component(s), true)
                    }),
                    None => {
                        self.target.partners(t_site).any(|s| {
                            s.mol != frame.t_mol
                                && core.target[s.mol].is_none()
                                && self.pattern.molecule_accepts(partner.mol, self.target, s.mol)
                                && partner_comp.name == self.target.component(s).name
                        })
                    }
                }
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

/// Assigns every pattern site under a fixed molecule mapping.
///
/// Variables are visited most-constrained first. A bond is checked as soon
/// as both of its ends are assigned, and a complete assignment is checked
/// against every pattern bond once more before it counts.
pub(crate) struct JointAssigner<'a> {
    pattern: &'a SpeciesGraph,
    target: &'a SpeciesGraph,
    molecule_map: &'a [usize],
    vars: Vec<Site>,
    domains: Vec<Vec<usize>>,
    assigned: Vec<Vec<Option<usize>>>,
    used: Vec<Vec<bool>>,
    steps: usize,
    max_steps: usize,
}

impl<'a> JointAssigner<'a> {
    /// `molecule_map[p]` is the target molecule of pattern molecule `p`.
    pub(crate) fn new(
        pattern: &'a SpeciesGraph,
        target: &'a SpeciesGraph,
        molecule_map: &'a [usize],
        max_steps: usize,
    ) -> Self {
        let mut vars = Vec::new();
        let mut domains = Vec::new();
        for (p_mol, &t_mol) in molecule_map.iter().enumerate() {
            let target_components = &target.molecule(t_mol).components;
            for (pc, p_comp) in pattern.molecule(p_mol).components.iter().enumerate() {
                vars.push(Site::new(p_mol, pc));
                domains.push(
                    (0..target_components.len())
                        .filter(|&tc| {
                            let site = Site::new(t_mol, tc);
                            p_comp.accepts(target.component(site), target.is_bound(site))
                        })
                        .collect::<Vec<_>>(),
                );
            }
        }

        let mut order: Vec<usize> = (0..vars.len()).collect();
        order.sort_by_key(|&i| {
            let comp = pattern.component(vars[i]);
            (domains[i].len(), Reverse(comp.constraint_score()), vars[i])
        });
        let vars: Vec<Site> = order.iter().map(|&i| vars[i]).collect();
        let domains: Vec<Vec<usize>> = order.iter().map(|&i| std::mem::take(&mut domains[i])).collect();

        Self {
            pattern,
            target,
            molecule_map,
            vars,
            domains,
            assigned: pattern
                .molecules()
                .iter()
                .map(|m| vec![None; m.components.len()])
                .collect(),
            used: molecule_map
                .iter()
                .map(|&t| vec![false; target.molecule(t).components.len()])
                .collect(),
            steps: 0,
            max_steps,
        }
    }

    /// The first consistent assignment, as one component map per pattern
    /// molecule.
    pub(crate) fn first(&mut self) -> Assignment<Vec<Vec<usize>>> {
        let mut found = 0;
        match self.walk(0, true, &mut found) {
            Flow::Done => Assignment::Found(
                self.assigned
                    .iter()
                    .map(|m| m.iter().flatten().copied().collect())
                    .collect(),
            ),
            Flow::Dead => Assignment::Infeasible,
            Flow::Exhausted => Assignment::Exhausted,
        }
    }

    /// Number of consistent assignments, and whether the count stopped short
    /// because the step budget ran out.
    pub(crate) fn count(&mut self) -> (usize, bool) {
        let mut found = 0;
        let exhausted = matches!(self.walk(0, false, &mut found), Flow::Exhausted);
        (found, exhausted)
    }

    fn walk(&mut self, depth: usize, first_only: bool, found: &mut usize) -> Flow {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Flow::Exhausted;
        }
        if depth == self.vars.len() {
            if self.all_bonds_hold() {
                *found += 1;
                if first_only {
                    return Flow::Done;
                }
            }
            return Flow::Dead;
        }

        let site = self.vars[depth];
        for i in 0..self.domains[depth].len() {
            let tc = self.domains[depth][i];
            if self.used[site.mol][tc] || !self.assigned_bonds_hold(site, tc) {
                continue;
            }
            self.assigned[site.mol][site.comp] = Some(tc);
            self.used[site.mol][tc] = true;
            let flow = self.walk(depth + 1, first_only, found);
            if matches!(flow, Flow::Done) {
                return flow;
            }
            self.assigned[site.mol][site.comp] = None;
            self.used[site.mol][tc] = false;
            if matches!(flow, Flow::Exhausted) {
                return flow;
            }
        }
        Flow::Dead
    }

    fn target_site(&self, site: Site, tc: usize) -> Site {
        Site::new(self.molecule_map[site.mol], tc)
    }

    fn assigned_bonds_hold(&self, site: Site, tc: usize) -> bool {
        let p_comp = self.pattern.component(site);
        let t_site = self.target_site(site, tc);
        p_comp.bond_labels().all(|label| {
            let Some(partner) = p_comp.partner(label) else {
                return true;
            };
            match self.assigned[partner.mol][partner.comp] {
                Some(tc2) => self.target.has_bond(t_site, self.target_site(partner, tc2)),
                None => true,
            }
        })
    }

    fn all_bonds_hold(&self) -> bool {
        self.pattern.bonds().all(|(a, b, _)| {
            match (self.assigned[a.mol][a.comp], self.assigned[b.mol][b.comp]) {
                (Some(ta), Some(tb)) => self
                    .target
                    .has_bond(self.target_site(a, ta), self.target_site(b, tb)),
                _ => false,
            }
        })
    }
}
