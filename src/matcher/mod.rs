//! Subgraph matching of BNGL patterns against species graphs.
//!
//! The search is a VF2++-style backtracking over molecules. Each candidate
//! molecule pair must pass a quick type check, a label-count cut on the
//! frontier, a component assignment and a neighbor-count check before it is
//! committed. Results are cached by the BNGL text of both graphs.

mod cache;
mod components;
mod ordering;
mod search;
mod state;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::bond::Site;
use crate::graph::SpeciesGraph;

pub use cache::{BoundedMatchCache, MatchCache, NoMatchCache, DEFAULT_CACHE_CAPACITY};

pub(crate) use components::JointAssigner;

use search::Search;

/// One embedding of a pattern into a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatchMap {
    /// `molecule_map[p]` is the target molecule of pattern molecule `p`.
    pub molecule_map: Vec<usize>,
    /// Pattern site -> target site, for every pattern component.
    pub component_map: BTreeMap<Site, Site>,
}

impl MatchMap {
    pub fn target_molecule(&self, pattern_mol: usize) -> Option<usize> {
        self.molecule_map.get(pattern_mol).copied()
    }

    pub fn target_site(&self, pattern_site: Site) -> Option<Site> {
        self.component_map.get(&pattern_site).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStatus {
    /// Every embedding was found.
    Complete,
    /// A step budget ran out; the maps found so far are returned.
    Bounded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub maps: Vec<MatchMap>,
    pub status: SearchStatus,
}

impl MatchOutcome {
    fn none() -> Self {
        Self {
            maps: Vec::new(),
            status: SearchStatus::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == SearchStatus::Complete
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

/// Step budgets for one search. Steps are counted, not timed, so a bounded
/// result is the same on every machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLimits {
    /// Molecule-level recursion steps per `find_all_maps` call.
    pub max_molecule_steps: usize,
    /// Component-level steps per component assignment.
    pub max_component_steps: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            max_molecule_steps: 100_000,
            max_component_steps: 10_000,
        }
    }
}

/// Finds embeddings of pattern graphs in target graphs.
///
/// Cloning a matcher shares its cache. A cache handed to
/// [`with_cache`](Self::with_cache) should only be shared between matchers
/// with the same limits, since a bounded search may find fewer maps.
///
/// ```
/// use bngcrab::{from_bngl, GraphMatcher};
///
/// let matcher = GraphMatcher::new();
/// let pattern = from_bngl("EGFR(Y1068~P!+)").unwrap();
/// let species = from_bngl("EGFR(L!1,Y1068~P!2).EGF(R!1).Grb2(SH2!2)").unwrap();
/// let outcome = matcher.find_all_maps(&pattern, &species);
/// assert_eq!(outcome.maps.len(), 1);
/// assert!(outcome.is_complete());
/// ```
#[derive(Clone)]
pub struct GraphMatcher {
    limits: MatchLimits,
    cache: Arc<dyn MatchCache>,
}

impl GraphMatcher {
    pub fn new() -> Self {
        Self {
            limits: MatchLimits::default(),
            cache: Arc::new(BoundedMatchCache::default()),
        }
    }

    /// A matcher that never caches results.
    pub fn uncached() -> Self {
        Self {
            limits: MatchLimits::default(),
            cache: Arc::new(NoMatchCache),
        }
    }

    pub fn with_limits(mut self, limits: MatchLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn MatchCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn limits(&self) -> MatchLimits {
        self.limits
    }

    pub fn cache(&self) -> &dyn MatchCache {
        self.cache.as_ref()
    }

    /// Every embedding of `pattern` in `target`. An empty pattern has exactly
    /// one, the empty map.
    pub fn find_all_maps(&self, pattern: &SpeciesGraph, target: &SpeciesGraph) -> MatchOutcome {
        if !can_possibly_match(pattern, target) {
            return MatchOutcome::none();
        }
        if let Some(hit) = self.cache.get(pattern.text(), target.text()) {
            return hit;
        }
        let outcome = Search::new(pattern, target, self.limits).run_all();
        self.cache.insert(pattern.text(), target.text(), &outcome);
        outcome
    }

    /// The first embedding found, stopping the search there. Uses a cached
    /// `find_all_maps` result when one exists.
    pub fn find_first_map(&self, pattern: &SpeciesGraph, target: &SpeciesGraph) -> Option<MatchMap> {
        if !can_possibly_match(pattern, target) {
            return None;
        }
        if let Some(hit) = self.cache.get(pattern.text(), target.text()) {
            return hit.maps.into_iter().next();
        }
        Search::new(pattern, target, self.limits)
            .run_first()
            .maps
            .into_iter()
            .next()
    }

    pub fn matches_pattern(&self, pattern: &SpeciesGraph, target: &SpeciesGraph) -> bool {
        self.find_first_map(pattern, target).is_some()
    }

    /// Drops every cached result, e.g. between network generation runs.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

impl Default for GraphMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GraphMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphMatcher")
            .field("limits", &self.limits)
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Cheap necessary condition for a match: the target has at least as many
/// molecules of every named type as the pattern, and at least as many
/// molecules overall. `*` molecules only count toward the total.
pub fn can_possibly_match(pattern: &SpeciesGraph, target: &SpeciesGraph) -> bool {
    if target.molecule_count() < pattern.molecule_count() {
        return false;
    }
    let mut needed: HashMap<&str, usize> = HashMap::new();
    for molecule in pattern.molecules() {
        if !molecule.is_wildcard() {
            *needed.entry(molecule.name.as_str()).or_default() += 1;
        }
    }
    if needed.is_empty() {
        return true;
    }
    let mut available: HashMap<&str, usize> = HashMap::new();
    for molecule in target.molecules() {
        *available.entry(molecule.name.as_str()).or_default() += 1;
    }
    needed
        .iter()
        .all(|(name, &count)| available.get(name).copied().unwrap_or(0) >= count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bngl::from_bngl;

    fn g(s: &str) -> SpeciesGraph {
        from_bngl(s).unwrap()
    }

    fn count(pattern: &str, target: &str) -> usize {
        GraphMatcher::uncached()
            .find_all_maps(&g(pattern), &g(target))
            .maps
            .len()
    }

    #[test]
    fn prefilter_counts_types() {
        assert!(can_possibly_match(&g("A.B"), &g("A(x!1).B(y!1)")));
        assert!(!can_possibly_match(&g("A.A"), &g("A(x!1).B(y!1)")));
        assert!(!can_possibly_match(&g("C"), &g("A(x!1).B(y!1)")));
        assert!(can_possibly_match(&g("*.*"), &g("A(x!1).B(y!1)")));
        assert!(!can_possibly_match(&g("*.*.*"), &g("A(x!1).B(y!1)")));
    }

    #[test]
    fn single_molecule() {
        assert_eq!(count("A", "A"), 1);
        assert_eq!(count("A", "B"), 0);
        assert_eq!(count("A(b)", "A(b,c)"), 1);
        assert_eq!(count("A(b,c)", "A(b)"), 0);
    }

    #[test]
    fn bond_must_be_present() {
        assert_eq!(count("A(b!1).B(a!1)", "A(b!1).B(a!1)"), 1);
        assert_eq!(count("A(b!1).B(a!1)", "A(b).B(a)"), 0);
        assert_eq!(count("A(b!+)", "A(b!1).B(a!1)"), 1);
        assert_eq!(count("A(b!+)", "A(b)"), 0);
    }

    #[test]
    fn dot_without_bond_means_same_complex() {
        assert_eq!(count("A.C", "A(b!1).B(a!1,c!2).C(b!2)"), 1);
    }

    #[test]
    fn chain_of_same_type() {
        // two embeddings: either end can play the first molecule
        assert_eq!(count("A(l!1).A(r!1)", "A(r!1).A(l!1,r!2).A(l!2)"), 2);
    }

    #[test]
    fn ring_pattern() {
        let ring = "A(l!3,r!1).A(l!1,r!2).A(l!2,r!3)";
        assert_eq!(count("A(l!1,r!2).A(l!2,r!1)", ring), 0);
        assert_eq!(count(ring, ring), 3);
    }

    #[test]
    fn maps_cover_every_pattern_site() {
        let outcome = GraphMatcher::uncached()
            .find_all_maps(&g("A(b!1,c).B(a!1)"), &g("B(a!1).A(c,b!1)"));
        assert_eq!(outcome.maps.len(), 1);
        let map = &outcome.maps[0];
        assert_eq!(map.molecule_map, vec![1, 0]);
        assert_eq!(map.target_site(Site::new(0, 0)), Some(Site::new(1, 1)));
        assert_eq!(map.target_site(Site::new(0, 1)), Some(Site::new(1, 0)));
        assert_eq!(map.target_site(Site::new(1, 0)), Some(Site::new(0, 0)));
        assert_eq!(map.target_molecule(1), Some(0));
    }

    #[test]
    fn cache_hit_returns_same_outcome() {
        let matcher = GraphMatcher::new();
        let p = g("A(b!1).B(a!1)");
        let t = g("A(b!1).B(a!1).A(b)");
        let first = matcher.find_all_maps(&p, &t);
        assert_eq!(matcher.cache().len(), 1);
        let second = matcher.find_all_maps(&p, &t);
        assert_eq!(first, second);
        matcher.clear_cache();
        assert!(matcher.cache().is_empty());
    }

    #[test]
    fn prefiltered_pairs_are_not_cached() {
        let matcher = GraphMatcher::new();
        matcher.find_all_maps(&g("C"), &g("A"));
        assert!(matcher.cache().is_empty());
    }

    #[test]
    fn clones_share_the_cache() {
        let matcher = GraphMatcher::new();
        let clone = matcher.clone();
        clone.find_all_maps(&g("A"), &g("A"));
        assert_eq!(matcher.cache().len(), 1);
    }

    #[test]
    fn tiny_molecule_budget_is_bounded() {
        let matcher = GraphMatcher::uncached().with_limits(MatchLimits {
            max_molecule_steps: 3,
            max_component_steps: 10_000,
        });
        let outcome = matcher.find_all_maps(&g("A.A"), &g("A.A.A.A"));
        assert_eq!(outcome.status, SearchStatus::Bounded);
        assert!(outcome.maps.len() < 12);
    }

    #[test]
    fn first_map_agrees_with_all_maps() {
        let matcher = GraphMatcher::uncached();
        let p = g("A(b!1).B(a!1)");
        let t = g("A(b).B(a).A(b!1).B(a!1)");
        let all = matcher.find_all_maps(&p, &t);
        let first = matcher.find_first_map(&p, &t).unwrap();
        assert!(all.maps.contains(&first));
        assert!(matcher.find_first_map(&p, &g("A(b).B(a)")).is_none());
    }

    #[test]
    fn empty_pattern_has_one_empty_map() {
        let outcome = GraphMatcher::uncached().find_all_maps(&SpeciesGraph::new(), &g("A"));
        assert_eq!(outcome.maps, vec![MatchMap::default()]);
    }
}
