use tracing::warn;

use crate::bngl::from_bngl;
use crate::graph::SpeciesGraph;
use crate::matcher::GraphMatcher;

/// A parsed energy pattern with its precomputed symmetry factor.
#[derive(Debug, Clone)]
pub struct EnergyPattern {
    pub graph: SpeciesGraph,
    pub value: f64,
    /// Number of embeddings of the pattern in itself, at least 1.
    pub symmetry: usize,
}

/// Energy of species and free-energy change of reactions from a library of
/// energy patterns.
///
/// ```
/// use bngcrab::{from_bngl, EnergyService};
///
/// let service = EnergyService::new([("A(b!1).B(a!1)", -2.0)]);
/// let complex = from_bngl("A(b!1).B(a!1)").unwrap();
/// let a = from_bngl("A(b)").unwrap();
/// let b = from_bngl("B(a)").unwrap();
/// assert_eq!(service.calculate_energy(&complex), -2.0);
/// assert_eq!(service.calculate_delta_g(&[a, b], &[complex]), -2.0);
/// ```
#[derive(Debug, Clone)]
pub struct EnergyService {
    matcher: GraphMatcher,
    patterns: Vec<EnergyPattern>,
}

impl EnergyService {
    /// Parses every `(pattern, value)` pair. Patterns that fail to parse or
    /// carry a non-finite value are logged and left out.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        Self::with_matcher(GraphMatcher::new(), patterns)
    }

    /// Like [`new`](Self::new), matching with `matcher` (and its cache).
    pub fn with_matcher<I, S>(matcher: GraphMatcher, patterns: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut compiled = Vec::new();
        for (text, value) in patterns {
            let text = text.as_ref();
            if !value.is_finite() {
                warn!("skipping energy pattern {text}: value {value} is not finite");
                continue;
            }
            let graph = match from_bngl(text) {
                Ok(graph) => graph,
                Err(e) => {
                    warn!("skipping energy pattern {text}: {e}");
                    continue;
                }
            };
            let symmetry = symmetry_factor(&matcher, &graph);
            compiled.push(EnergyPattern {
                graph,
                value,
                symmetry,
            });
        }
        Self {
            matcher,
            patterns: compiled,
        }
    }

    pub fn patterns(&self) -> &[EnergyPattern] {
        &self.patterns
    }

    pub fn matcher(&self) -> &GraphMatcher {
        &self.matcher
    }

    /// Sum over patterns of `embeddings / symmetry * value`.
    pub fn calculate_energy(&self, species: &SpeciesGraph) -> f64 {
        self.patterns
            .iter()
            .map(|p| self.weight(p, species) * p.value)
            .sum()
    }

    /// Products minus reactants, accumulated per pattern before the value is
    /// applied.
    pub fn calculate_delta_g(&self, reactants: &[SpeciesGraph], products: &[SpeciesGraph]) -> f64 {
        self.patterns
            .iter()
            .map(|p| {
                let produced: f64 = products.iter().map(|s| self.weight(p, s)).sum();
                let consumed: f64 = reactants.iter().map(|s| self.weight(p, s)).sum();
                (produced - consumed) * p.value
            })
            .sum()
    }

    fn weight(&self, pattern: &EnergyPattern, species: &SpeciesGraph) -> f64 {
        let embeddings = self.matcher.find_all_maps(&pattern.graph, species).maps.len();
        embeddings as f64 / pattern.symmetry as f64
    }
}

/// Embeddings of `graph` in itself, at least 1.
pub fn symmetry_factor(matcher: &GraphMatcher, graph: &SpeciesGraph) -> usize {
    let outcome = matcher.find_all_maps(graph, graph);
    if !outcome.is_complete() {
        warn!("symmetry factor of {graph} is a lower bound");
    }
    outcome.maps.len().max(1)
}
