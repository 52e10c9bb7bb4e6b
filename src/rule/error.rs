use std::fmt;

use crate::bngl::BnglError;

/// Error returned when attaching a reactant constraint to a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Not of the form `include_reactants(N, pattern)` or
    /// `exclude_reactants(N, pattern)`.
    MalformedConstraint { constraint: String },
    /// The 1-based reactant number is 0 or beyond the rule's reactants.
    ReactantIndex { index: usize, reactants: usize },
    /// The constraint pattern failed to parse.
    Pattern(BnglError),
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedConstraint { constraint } => {
                write!(f, "malformed reactant constraint: {constraint}")
            }
            Self::ReactantIndex { index, reactants } => write!(
                f,
                "reactant {index} out of range for a rule with {reactants} reactants"
            ),
            Self::Pattern(e) => write!(f, "invalid constraint pattern: {e}"),
        }
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pattern(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BnglError> for RuleError {
    fn from(e: BnglError) -> Self {
        Self::Pattern(e)
    }
}
