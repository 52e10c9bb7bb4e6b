use tracing::warn;

use crate::graph::SpeciesGraph;
use crate::matcher::{JointAssigner, MatchLimits, MatchMap};

/// Number of component-level completions of one molecule-level embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Degeneracy {
    /// Every completion was counted. Always at least 1.
    Exact(usize),
    /// The step budget ran out; at least this many completions exist.
    Bounded(usize),
    /// The embedding admits no completion, so it did not come from the
    /// matcher for this pattern and target.
    Inconsistent,
}

impl Degeneracy {
    /// The count as a stoichiometric weight. A search that could not produce
    /// a count weighs 1, so callers never stall on it; this is logged.
    pub fn weight(self) -> usize {
        match self {
            Self::Exact(n) => n,
            Self::Bounded(n) if n > 0 => n,
            Self::Bounded(_) | Self::Inconsistent => {
                warn!("embedding degeneracy unavailable ({self:?}), weighting as 1");
                1
            }
        }
    }

    pub fn is_exact(self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

/// Counts the component-level completions of `map`'s molecule mapping,
/// without searching for other molecule mappings. Cost depends on the
/// matched molecules only.
///
/// ```
/// use bngcrab::{count_embedding_degeneracy, from_bngl, Degeneracy, GraphMatcher};
///
/// let pattern = from_bngl("A(s)").unwrap();
/// let target = from_bngl("A(s,s)").unwrap();
/// let map = GraphMatcher::new().find_first_map(&pattern, &target).unwrap();
/// assert_eq!(count_embedding_degeneracy(&pattern, &target, &map), Degeneracy::Exact(2));
/// ```
pub fn count_embedding_degeneracy(
    pattern: &SpeciesGraph,
    target: &SpeciesGraph,
    map: &MatchMap,
) -> Degeneracy {
    count_embedding_degeneracy_with_limit(
        pattern,
        target,
        map,
        MatchLimits::default().max_component_steps,
    )
}

pub fn count_embedding_degeneracy_with_limit(
    pattern: &SpeciesGraph,
    target: &SpeciesGraph,
    map: &MatchMap,
    max_steps: usize,
) -> Degeneracy {
    if !molecule_map_is_valid(pattern, target, &map.molecule_map) {
        warn!(
            "molecule map {:?} is not an embedding of {pattern} in {target}",
            map.molecule_map
        );
        return Degeneracy::Inconsistent;
    }

    let (count, exhausted) =
        JointAssigner::new(pattern, target, &map.molecule_map, max_steps).count();
    match (count, exhausted) {
        (n, true) => {
            warn!("degeneracy count of {pattern} in {target} stopped at {n} after {max_steps} steps");
            Degeneracy::Bounded(n)
        }
        (0, false) => {
            warn!("no component completion of {pattern} in {target} for {:?}", map.molecule_map);
            Degeneracy::Inconsistent
        }
        (n, false) => Degeneracy::Exact(n),
    }
}

fn molecule_map_is_valid(pattern: &SpeciesGraph, target: &SpeciesGraph, molecule_map: &[usize]) -> bool {
    if molecule_map.len() != pattern.molecule_count() {
        return false;
    }
    let mut seen = vec![false; target.molecule_count()];
    molecule_map.iter().enumerate().all(|(p, &t)| {
        if t >= seen.len() || seen[t] {
            return false;
        }
        seen[t] = true;
        pattern.molecule_accepts(p, target, t)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bngl::from_bngl;
    use crate::matcher::GraphMatcher;

    fn degeneracies(pattern: &str, target: &str) -> Vec<Degeneracy> {
        let p = from_bngl(pattern).unwrap();
        let t = from_bngl(target).unwrap();
        GraphMatcher::uncached()
            .find_all_maps(&p, &t)
            .maps
            .iter()
            .map(|m| count_embedding_degeneracy(&p, &t, m))
            .collect()
    }

    #[test]
    fn unique_sites_have_degeneracy_one() {
        assert_eq!(degeneracies("A(b!1).B(a!1)", "A(b!1).B(a!1)"), vec![Degeneracy::Exact(1)]);
    }

    #[test]
    fn repeated_free_sites_multiply() {
        assert_eq!(degeneracies("A(s)", "A(s,s,s)"), vec![Degeneracy::Exact(3)]);
        assert_eq!(degeneracies("A(s,s)", "A(s,s,s)"), vec![Degeneracy::Exact(6)]);
    }

    #[test]
    fn bonds_pin_sites() {
        // only the bonded s of A can carry the pattern bond
        assert_eq!(
            degeneracies("A(s!1).B(t!1)", "A(s!1,s).B(t!1)"),
            vec![Degeneracy::Exact(1)]
        );
    }

    #[test]
    fn question_wildcard_accepts_either() {
        assert_eq!(
            degeneracies("A(s!?)", "A(s!1,s).B(t!1)"),
            vec![Degeneracy::Exact(2)]
        );
    }

    #[test]
    fn state_filters_sites() {
        assert_eq!(degeneracies("A(y~P)", "A(y~P,y~U,y~P)"), vec![Degeneracy::Exact(2)]);
    }

    #[test]
    fn foreign_map_is_inconsistent() {
        let p = from_bngl("A(b!1).B(a!1)").unwrap();
        let t = from_bngl("A(b).B(a)").unwrap();
        let map = MatchMap {
            molecule_map: vec![0, 1],
            ..Default::default()
        };
        let d = count_embedding_degeneracy(&p, &t, &map);
        assert_eq!(d, Degeneracy::Inconsistent);
        assert_eq!(d.weight(), 1);

        let wrong_length = MatchMap {
            molecule_map: vec![0],
            ..Default::default()
        };
        assert_eq!(count_embedding_degeneracy(&p, &t, &wrong_length), Degeneracy::Inconsistent);
        let wrong_type = MatchMap {
            molecule_map: vec![1, 0],
            ..Default::default()
        };
        assert_eq!(count_embedding_degeneracy(&p, &t, &wrong_type), Degeneracy::Inconsistent);
    }

    #[test]
    fn budget_gives_bounded() {
        let p = from_bngl("A(s,s,s,s)").unwrap();
        let t = from_bngl("A(s,s,s,s)").unwrap();
        let map = MatchMap {
            molecule_map: vec![0],
            ..Default::default()
        };
        let d = count_embedding_degeneracy_with_limit(&p, &t, &map, 10);
        assert!(matches!(d, Degeneracy::Bounded(_)));
        assert_eq!(count_embedding_degeneracy(&p, &t, &map), Degeneracy::Exact(24));
    }

    #[test]
    fn weights() {
        assert_eq!(Degeneracy::Exact(4).weight(), 4);
        assert_eq!(Degeneracy::Bounded(7).weight(), 7);
        assert_eq!(Degeneracy::Bounded(0).weight(), 1);
        assert!(Degeneracy::Exact(1).is_exact());
        assert!(!Degeneracy::Inconsistent.is_exact());
    }
}
