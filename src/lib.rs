pub mod bitset;
pub mod bngl;
pub mod bond;
pub mod component;
pub mod degeneracy;
pub mod energy;
pub mod graph;
pub mod matcher;
pub mod molecule;
pub mod rule;

pub use bitset::AdjacencyBitset;
pub use bngl::{from_bngl, parse_species_graph, to_bngl, validate_pattern, BnglError};
pub use bond::{BondLabel, Site};
pub use component::{BondWildcard, Component, ANY_STATE};
pub use degeneracy::{count_embedding_degeneracy, count_embedding_degeneracy_with_limit, Degeneracy};
pub use energy::{symmetry_factor, EnergyPattern, EnergyService};
pub use graph::SpeciesGraph;
pub use matcher::{
    can_possibly_match, BoundedMatchCache, GraphMatcher, MatchCache, MatchLimits, MatchMap,
    MatchOutcome, NoMatchCache, SearchStatus, DEFAULT_CACHE_CAPACITY,
};
pub use molecule::{Molecule, ANY_MOLECULE};
pub use rule::{ConstraintKind, EditOp, ReactantConstraint, RuleError, RxnRule};
