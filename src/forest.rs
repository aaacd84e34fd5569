//! One `IntervalIndex` per chromosome.
//!
//! Intervals of different chromosomes never match each other, so each chromosome name gets
//! its own tree, created by its first insertion. Queries on a chromosome nothing was
//! inserted for find nothing.
//!
//! # Example
//!
//! ```rust
//! use centered_interval_index::{Interval, IntervalForest, Tolerance};
//!
//! let mut forest = IntervalForest::new();
//! forest.insert("chr1", Interval::new(1000, 2000));
//! forest.insert("chr1", Interval::new(5000, 6000));
//! forest.insert("chr2", Interval::new(1000, 3000));
//!
//! assert_eq!(forest.len(), 3);
//! assert!(forest.contains("chr2", &Interval::new(2500, 2600)));
//! assert!(!forest.contains("chr3", &Interval::new(2500, 2600)));
//! assert!(forest.overlaps("chrX", &Interval::new(0, 10), Tolerance::EXACT).is_empty());
//! ```

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::index::{DefaultIx, IndexType};
use crate::interval::Interval1D;
use crate::intervalindex::IntervalIndex;
use crate::tolerance::Tolerance;

/// Interval indexes keyed by chromosome name.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(bound(
        deserialize = "K: Interval1D + Deserialize<'de>, Ix: IndexType + Deserialize<'de>"
    ))
)]
pub struct IntervalForest<K, Ix = DefaultIx> {
    trees: HashMap<String, IntervalIndex<K, Ix>>,
}

impl<K> IntervalForest<K>
where
    K: Interval1D,
{
    /// Create an empty `IntervalForest`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            trees: HashMap::new(),
        }
    }
}

impl<K> Default for IntervalForest<K>
where
    K: Interval1D,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, Ix> IntervalForest<K, Ix>
where
    K: Interval1D,
    Ix: IndexType,
{
    /// Insert an interval into the index of its chromosome, creating the index if needed.
    pub fn insert(&mut self, chrom: &str, key: K) {
        match self.trees.get_mut(chrom) {
            Some(index) => index.insert(key),
            None => {
                debug!(chrom, "add chromosome");
                let mut index = IntervalIndex::with_capacity(1);
                index.insert(key);
                let _ignore = self.trees.insert(chrom.to_owned(), index);
            }
        }
    }

    /// Find all intervals of a chromosome matching the query, none for an unknown chromosome.
    #[must_use]
    pub fn overlaps<Q>(&self, chrom: &str, query: &Q, tolerance: Tolerance) -> Vec<&K>
    where
        Q: Interval1D + ?Sized,
    {
        self.trees
            .get(chrom)
            .map_or_else(Vec::new, |index| index.overlaps(query, tolerance))
    }

    /// Check if any interval of a chromosome matches the query, `false` for an unknown chromosome.
    #[must_use]
    pub fn contains_any<Q>(&self, chrom: &str, query: &Q, tolerance: Tolerance) -> bool
    where
        Q: Interval1D + ?Sized,
    {
        self.trees
            .get(chrom)
            .is_some_and(|index| index.contains_any(query, tolerance))
    }

    /// Check if any interval of a chromosome shares a position with the query.
    #[inline]
    #[must_use]
    pub fn contains<Q>(&self, chrom: &str, query: &Q) -> bool
    where
        Q: Interval1D + ?Sized,
    {
        self.contains_any(chrom, query, Tolerance::EXACT)
    }

    /// The index of a chromosome
    #[inline]
    #[must_use]
    pub fn get(&self, chrom: &str) -> Option<&IntervalIndex<K, Ix>> {
        self.trees.get(chrom)
    }

    /// Names of the chromosomes holding at least one interval, in no particular order
    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.trees.keys().map(String::as_str)
    }

    /// Total number of inserted intervals over all chromosomes
    #[must_use]
    pub fn len(&self) -> usize {
        self.trees.values().map(IntervalIndex::len).sum()
    }

    /// Return `true` if no interval was inserted.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Deepest tree over all chromosomes, zero when empty.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.trees
            .values()
            .map(IntervalIndex::max_depth)
            .max()
            .unwrap_or(0)
    }

    /// Remove every chromosome
    #[inline]
    pub fn clear(&mut self) {
        self.trees.clear();
    }
}

impl<K, Ix, S> Extend<(S, K)> for IntervalForest<K, Ix>
where
    K: Interval1D,
    Ix: IndexType,
    S: AsRef<str>,
{
    fn extend<I: IntoIterator<Item = (S, K)>>(&mut self, iter: I) {
        for (chrom, key) in iter {
            self.insert(chrom.as_ref(), key);
        }
    }
}

impl<K, Ix, S> FromIterator<(S, K)> for IntervalForest<K, Ix>
where
    K: Interval1D,
    Ix: IndexType,
    S: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (S, K)>>(iter: I) -> Self {
        let mut forest = Self {
            trees: HashMap::new(),
        };
        forest.extend(iter);
        forest
    }
}
