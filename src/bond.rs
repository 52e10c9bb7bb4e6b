use std::fmt;

/// Integer label naming a bond inside one graph. Labels are positive and
/// unique within a graph; the same label appears on both endpoints.
pub type BondLabel = u32;

/// A binding site address: component `comp` of molecule `mol`.
///
/// Molecules have no identity beyond their position in the owning
/// [`SpeciesGraph`](crate::SpeciesGraph), so a `Site` is only meaningful
/// together with the graph it was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Site {
    pub mol: usize,
    pub comp: usize,
}

impl Site {
    pub const fn new(mol: usize, comp: usize) -> Self {
        Self { mol, comp }
    }
}

/// Written as `mol.comp`, the key format used in match maps and logs.
impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.mol, self.comp)
    }
}

impl From<(usize, usize)> for Site {
    fn from((mol, comp): (usize, usize)) -> Self {
        Self { mol, comp }
    }
}
