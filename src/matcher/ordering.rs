use std::cmp::Reverse;
use std::collections::HashMap;

use crate::graph::SpeciesGraph;

/// Order in which pattern molecules are decided.
///
/// Each connected part of the pattern is walked breadth-first from the
/// molecule with the highest degree, ties going to the type that is rarest in
/// the target. Within a level, molecules bonded to more already-ordered
/// molecules come first, then higher degree, then rarer type, then lower
/// index. The order affects speed only.
pub(crate) fn node_ordering(
    pattern: &SpeciesGraph,
    target: &SpeciesGraph,
    adjacency: &[Vec<usize>],
) -> Vec<usize> {
    let n = pattern.molecule_count();
    let mut frequency: HashMap<&str, usize> = HashMap::new();
    for molecule in target.molecules() {
        *frequency.entry(molecule.name.as_str()).or_default() += 1;
    }
    let rarity = |mol: usize| -> usize {
        let molecule = pattern.molecule(mol);
        if molecule.is_wildcard() {
            target.molecule_count()
        } else {
            frequency.get(molecule.name.as_str()).copied().unwrap_or(0)
        }
    };

    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);

    for group in pattern.connected_components() {
        let Some(&root) = group
            .iter()
            .min_by_key(|&&m| (Reverse(adjacency[m].len()), rarity(m), m))
        else {
            continue;
        };
        visited[root] = true;
        order.push(root);

        let mut level = vec![root];
        while !level.is_empty() {
            let mut next: Vec<usize> = Vec::new();
            for &node in &level {
                for &nb in &adjacency[node] {
                    if !visited[nb] && !next.contains(&nb) {
                        next.push(nb);
                    }
                }
            }
            next.sort_by_key(|&m| {
                let covered = adjacency[m].iter().filter(|&&x| visited[x]).count();
                (Reverse(covered), Reverse(adjacency[m].len()), rarity(m), m)
            });
            for &m in &next {
                visited[m] = true;
                order.push(m);
            }
            level = next;
        }
    }
    order
}
