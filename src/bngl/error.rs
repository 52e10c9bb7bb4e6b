use std::fmt;

use crate::bond::BondLabel;

/// Errors produced when parsing a BNGL species or pattern string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BnglError {
    /// The input string was empty or only whitespace.
    EmptyInput,
    /// An unexpected character was encountered at the given position.
    UnexpectedChar { pos: usize, ch: char },
    /// The input ended where more was required.
    UnexpectedEnd { pos: usize, expected: &'static str },
    /// A `(` was never closed.
    UnclosedParen { pos: usize },
    /// A molecule or compartment name was missing or started with a digit.
    InvalidName { pos: usize },
    /// A `!` was followed by something other than a positive integer or one
    /// of `+`, `?`, `-`.
    InvalidBondLabel { pos: usize },
    /// Two `.` with nothing in between, or a leading/trailing `.`.
    EmptyMolecule { pos: usize },
    /// A bond label was used by more than two sites.
    BondArity { label: BondLabel, count: usize },
    /// A bond label was used twice on the same site.
    SelfBond { label: BondLabel },
    /// A second bond label joins the same two sites.
    ParallelBond { label: BondLabel },
    /// Pattern-only syntax in a string that must describe a concrete species.
    PatternSyntax { what: &'static str },
}

impl fmt::Display for BnglError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "empty BNGL string"),
            Self::UnexpectedChar { pos, ch } => {
                write!(f, "unexpected character '{ch}' at position {pos}")
            }
            Self::UnexpectedEnd { pos, expected } => {
                write!(f, "expected {expected} at position {pos}, got end of input")
            }
            Self::UnclosedParen { pos } => {
                write!(f, "unclosed parenthesis starting at position {pos}")
            }
            Self::InvalidName { pos } => write!(
                f,
                "invalid name at position {pos}: must start with a letter or underscore"
            ),
            Self::InvalidBondLabel { pos } => write!(
                f,
                "invalid bond at position {pos}: expected a positive integer, '+', '?' or '-'"
            ),
            Self::EmptyMolecule { pos } => write!(f, "empty molecule at position {pos}"),
            Self::BondArity { label, count } => {
                write!(f, "bond {label} has {count} endpoints, expected at most 2")
            }
            Self::SelfBond { label } => write!(f, "bond {label} joins a site to itself"),
            Self::ParallelBond { label } => {
                write!(f, "bond {label} joins two sites that are already bonded")
            }
            Self::PatternSyntax { what } => write!(f, "{what} is not allowed in a species"),
        }
    }
}

impl std::error::Error for BnglError {}
