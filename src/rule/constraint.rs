use crate::bngl::from_bngl;
use crate::graph::SpeciesGraph;
use crate::matcher::GraphMatcher;

use super::error::RuleError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// The reactant must match the pattern.
    Include,
    /// The reactant must not match the pattern.
    Exclude,
}

impl ConstraintKind {
    fn keyword(self) -> &'static str {
        match self {
            Self::Include => "include_reactants",
            Self::Exclude => "exclude_reactants",
        }
    }
}

/// A pattern that one reactant of a rule must, or must not, match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactantConstraint {
    pub kind: ConstraintKind,
    /// 0-based reactant index.
    pub reactant: usize,
    pub pattern: SpeciesGraph,
}

impl ReactantConstraint {
    pub fn allows(&self, matcher: &GraphMatcher, species: &SpeciesGraph) -> bool {
        let matched = matcher.matches_pattern(&self.pattern, species);
        match self.kind {
            ConstraintKind::Include => matched,
            ConstraintKind::Exclude => !matched,
        }
    }
}

impl std::fmt::Display for ReactantConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}, {})", self.kind.keyword(), self.reactant + 1, self.pattern)
    }
}

/// Parses `exclude_reactants(N, pattern)` or `include_reactants(N, pattern)`
/// with a 1-based reactant number. The pattern runs to the closing paren and
/// may itself contain commas.
pub(crate) fn parse_constraint(s: &str, reactants: usize) -> Result<ReactantConstraint, RuleError> {
    let malformed = || RuleError::MalformedConstraint {
        constraint: s.to_string(),
    };
    let trimmed = s.trim();
    let (keyword, rest) = trimmed.split_once('(').ok_or_else(malformed)?;
    let kind = match keyword.trim() {
        "include_reactants" => ConstraintKind::Include,
        "exclude_reactants" => ConstraintKind::Exclude,
        _ => return Err(malformed()),
    };
    let body = rest.strip_suffix(')').ok_or_else(malformed)?;
    let (index, pattern) = body.split_once(',').ok_or_else(malformed)?;
    let index: usize = index.trim().parse().map_err(|_| malformed())?;
    if index == 0 || index > reactants {
        return Err(RuleError::ReactantIndex { index, reactants });
    }
    let pattern = from_bngl(pattern.trim())?;
    Ok(ReactantConstraint {
        kind,
        reactant: index - 1,
        pattern,
    })
}
