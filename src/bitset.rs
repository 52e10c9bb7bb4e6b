use crate::bond::Site;

const WORD_BITS: usize = u64::BITS as usize;

/// Packed boolean matrix over every component of a graph, answering
/// "are these two sites bonded" in O(1).
///
/// Row/column `i` is the site whose flat index is `offsets[mol] + comp`.
/// The matrix is symmetric because graph adjacency is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyBitset {
    offsets: Vec<usize>,
    size: usize,
    words: Vec<u64>,
}

impl AdjacencyBitset {
    /// Builds the matrix from flat-index pairs. Each pair is stored in both
    /// orientations.
    pub fn from_pairs(
        offsets: Vec<usize>,
        size: usize,
        pairs: impl IntoIterator<Item = (usize, usize)>,
    ) -> Self {
        let words = vec![0u64; (size * size).div_ceil(WORD_BITS)];
        let mut bitset = Self {
            offsets,
            size,
            words,
        };
        for (a, b) in pairs {
            bitset.set(a, b);
            bitset.set(b, a);
        }
        bitset
    }

    fn set(&mut self, a: usize, b: usize) {
        let bit = a * self.size + b;
        self.words[bit / WORD_BITS] |= 1u64 << (bit % WORD_BITS);
    }

    fn get(&self, a: usize, b: usize) -> bool {
        let bit = a * self.size + b;
        self.words
            .get(bit / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (bit % WORD_BITS)) != 0)
    }

    /// Flat index of `site`, or `None` if it lies outside the graph.
    pub fn flat_index(&self, site: Site) -> Option<usize> {
        let start = *self.offsets.get(site.mol)?;
        let end = self.offsets.get(site.mol + 1).copied().unwrap_or(self.size);
        (start + site.comp < end).then_some(start + site.comp)
    }

    pub fn site_count(&self) -> usize {
        self.size
    }

    pub fn contains(&self, a: Site, b: Site) -> bool {
        match (self.flat_index(a), self.flat_index(b)) {
            (Some(i), Some(j)) => self.get(i, j),
            _ => false,
        }
    }

    /// Whether `site` is bonded to any other site in the graph.
    pub fn row_any(&self, site: Site) -> bool {
        let Some(row) = self.flat_index(site) else {
            return false;
        };
        let mut bit = row * self.size;
        let end = bit + self.size;
        while bit < end {
            let offset = bit % WORD_BITS;
            let chunk = (WORD_BITS - offset).min(end - bit);
            let word = self.words[bit / WORD_BITS] >> offset;
            let mask = if chunk == WORD_BITS {
                u64::MAX
            } else {
                (1u64 << chunk) - 1
            };
            if word & mask != 0 {
                return true;
            }
            bit += chunk;
        }
        false
    }
}
