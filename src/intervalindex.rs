use std::collections::VecDeque;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::index::{DefaultIx, IndexType, NodeIndex};
use crate::interval::{Interval, Interval1D};
use crate::iter::{Iter, OverlapIter};
use crate::node::{Node, Side};
use crate::tolerance::Tolerance;

/// A centered interval tree, balanced as an AVL tree.
///
/// Every node owns a fixed center cut and the bucket of stored intervals covering it.
/// Intervals entirely before the cut live in the left subtree, intervals entirely after it
/// in the right subtree. Duplicates are kept, nothing is ever removed.
///
/// With the `serde` feature a deserialized index is checked to be a valid tree first.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(
        try_from = "crate::snapshot::RawIntervalIndex<K, Ix>",
        bound(deserialize = "K: Interval1D + Deserialize<'de>, Ix: IndexType + Deserialize<'de>")
    )
)]
pub struct IntervalIndex<K, Ix = DefaultIx> {
    /// Vector that stores nodes
    pub(crate) nodes: Vec<Node<K, Ix>>,
    /// Root of the interval tree
    pub(crate) root: Option<NodeIndex<Ix>>,
    /// Number of inserted intervals
    pub(crate) len: usize,
}

impl<K, Ix> IntervalIndex<K, Ix>
where
    K: Interval1D,
    Ix: IndexType,
{
    /// Creates a new `IntervalIndex` with estimated node capacity.
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        IntervalIndex {
            nodes: Vec::with_capacity(capacity),
            root: None,
            len: 0,
        }
    }

    /// Insert an interval into the index, rebalancing on the way back up.
    ///
    /// # Panics
    ///
    /// This method panics when the index is at the maximum number of nodes for its index type
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_index::{Interval, IntervalIndex};
    ///
    /// let mut index = IntervalIndex::new();
    /// index.insert(Interval::new(1, 3));
    /// index.insert(Interval::new(1, 3));
    /// assert_eq!(index.len(), 2);
    /// ```
    #[inline]
    pub fn insert(&mut self, key: K) {
        match self.root {
            None => self.root = Some(self.push_node(key)),
            Some(root) => {
                let _growth = self.insert_at(root, None, key);
            }
        }
        self.len += 1;
    }

    /// Find all stored intervals matching the query under the given tolerance.
    ///
    /// The result is unordered.
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_index::{Interval, IntervalIndex, Tolerance};
    ///
    /// let mut index = IntervalIndex::new();
    /// index.insert(Interval::new(0, 10));
    /// index.insert(Interval::new(11, 20));
    /// let query = Interval::new(5, 15);
    /// assert_eq!(index.overlaps(&query, Tolerance::EXACT).len(), 2);
    /// let strict = Tolerance::reciprocal(0.5).unwrap();
    /// assert_eq!(index.overlaps(&query, strict), vec![&Interval::new(0, 10)]);
    /// ```
    #[inline]
    #[must_use]
    pub fn overlaps<Q>(&self, query: &Q, tolerance: Tolerance) -> Vec<&K>
    where
        Q: Interval1D + ?Sized,
    {
        self.overlaps_iter(query, tolerance).collect()
    }

    /// Lazily walk the stored intervals matching the query.
    #[inline]
    pub fn overlaps_iter<'a, 'q, Q>(
        &'a self,
        query: &'q Q,
        tolerance: Tolerance,
    ) -> OverlapIter<'a, 'q, K, Q, Ix>
    where
        Q: Interval1D + ?Sized,
    {
        OverlapIter::new(self, query, tolerance)
    }

    /// Find all stored intervals sharing at least one position with the query.
    #[inline]
    #[must_use]
    pub fn overlaps_exact<Q>(&self, query: &Q) -> Vec<&K>
    where
        Q: Interval1D + ?Sized,
    {
        self.overlaps(query, Tolerance::EXACT)
    }

    /// Check if any stored interval matches the query, stopping at the first match.
    ///
    /// # Example
    /// ```rust
    /// use centered_interval_index::{Interval, IntervalIndex, Tolerance};
    ///
    /// let mut index = IntervalIndex::new();
    /// index.insert(Interval::new(0, 10));
    /// let shifted = Interval::new(11, 20);
    /// assert!(!index.contains_any(&shifted, Tolerance::reciprocal(0.5).unwrap()));
    /// assert!(index.contains_any(&shifted, Tolerance::new(0.5, 6).unwrap()));
    /// ```
    #[inline]
    #[must_use]
    pub fn contains_any<Q>(&self, query: &Q, tolerance: Tolerance) -> bool
    where
        Q: Interval1D + ?Sized,
    {
        self.overlaps_iter(query, tolerance).next().is_some()
    }

    /// Check if any stored interval shares at least one position with the query.
    #[inline]
    #[must_use]
    pub fn contains<Q>(&self, query: &Q) -> bool
    where
        Q: Interval1D + ?Sized,
    {
        self.contains_any(query, Tolerance::EXACT)
    }

    /// Check if any stored interval covers the point.
    #[inline]
    #[must_use]
    pub fn contains_point(&self, point: i64) -> bool {
        self.contains(&Interval::point(point))
    }

    /// Get an iterator over every stored interval.
    ///
    /// Nodes are visited by ascending center cut, a bucket is yielded in insertion order.
    #[inline]
    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, Ix> {
        Iter::new(self)
    }

    /// Number of nodes on the longest root to leaf path, zero when empty.
    ///
    /// Counted as `usize` like [`IntervalIndex::len`].
    #[must_use]
    pub fn max_depth(&self) -> usize {
        let mut depth = 0;
        let mut queue = VecDeque::new();
        queue.extend(self.root.map(|root| (root, 1)));
        while let Some((x, level)) = queue.pop_front() {
            depth = level;
            queue.extend(self.node_ref(x, Node::left).map(|l| (l, level + 1)));
            queue.extend(self.node_ref(x, Node::right).map(|r| (r, level + 1)));
        }
        depth
    }

    /// Remove all intervals from the index
    #[inline]
    pub fn clear(&mut self) {
        debug!(len = self.len, nodes = self.nodes.len(), "clearing interval index");
        self.nodes.clear();
        self.root = None;
        self.len = 0;
    }

    /// Return the number of inserted intervals, duplicates included.
    ///
    /// Counted as `usize`, the width of the arena, rather than a fixed 64 bits.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Return `true` if the index contains no intervals.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K> IntervalIndex<K>
where
    K: Interval1D,
{
    /// Create an empty `IntervalIndex`
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }
}

impl<K> Default for IntervalIndex<K>
where
    K: Interval1D,
{
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<K, Ix> FromIterator<K> for IntervalIndex<K, Ix>
where
    K: Interval1D,
    Ix: IndexType,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut index = Self::with_capacity(0);
        index.extend(iter);
        index
    }
}

impl<K, Ix> Extend<K> for IntervalIndex<K, Ix>
where
    K: Interval1D,
    Ix: IndexType,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<'a, K, Ix> IntoIterator for &'a IntervalIndex<K, Ix>
where
    K: Interval1D,
    Ix: IndexType,
{
    type Item = &'a K;
    type IntoIter = Iter<'a, K, Ix>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, Ix> IntervalIndex<K, Ix>
where
    K: Interval1D,
    Ix: IndexType,
{
    /// Append a new leaf to the arena
    fn push_node(&mut self, key: K) -> NodeIndex<Ix> {
        let node_idx = NodeIndex::new(self.nodes.len());
        // check for max capacity, except if we use usize
        assert!(
            <Ix as IndexType>::max().index() == !0 || NodeIndex::end() != node_idx,
            "Reached maximum number of nodes"
        );
        let node = Node::new(key);
        debug!(cut = node.center_cut(), index = node_idx.index(), "create node");
        self.nodes.push(node);
        node_idx
    }

    /// Insert below `head`, `parent` being `None` when `head` is the root.
    ///
    /// Returns how much the height of the subtree at `head` grew, 0 or 1.
    fn insert_at(&mut self, head: NodeIndex<Ix>, parent: Option<NodeIndex<Ix>>, key: K) -> i32 {
        let mut left_growth = 0;
        let mut right_growth = 0;
        match self.node_ref(head, |h| h.classify(&key)) {
            Side::Center => {
                self.node_mut(head, Node::push(key));
                return 0;
            }
            Side::Left => match self.node_ref(head, Node::left) {
                Some(left) => left_growth = self.insert_at(left, Some(head), key),
                None => {
                    let leaf = self.push_node(key);
                    self.node_mut(head, Node::set_left(Some(leaf)));
                    left_growth = 1;
                }
            },
            Side::Right => match self.node_ref(head, Node::right) {
                Some(right) => right_growth = self.insert_at(right, Some(head), key),
                None => {
                    let leaf = self.push_node(key);
                    self.node_mut(head, Node::set_right(Some(leaf)));
                    right_growth = 1;
                }
            },
        }

        // a subtree only grows when the change reaches past its current imbalance
        let prev = self.node_ref(head, Node::balance_factor);
        let mut growth = 0;
        if left_growth != 0 {
            self.node_mut(head, Node::add_balance_factor(-left_growth));
            growth = if prev < 0 {
                prev.max(left_growth)
            } else {
                (left_growth - prev).max(0)
            };
        } else if right_growth != 0 {
            self.node_mut(head, Node::add_balance_factor(right_growth));
            growth = if prev > 0 {
                (-prev).max(right_growth)
            } else {
                (right_growth + prev).max(0)
            };
        }

        let balance_factor = self.node_ref(head, Node::balance_factor);
        if balance_factor > 1 {
            let child = self.node_ref(head, Node::right_child);
            let child_bf = self.node_ref(child, Node::balance_factor);
            if child_bf < 0 {
                let pivot = self.rotate_right(child);
                self.node_mut(head, Node::set_right(Some(pivot)));
            }
            if child_bf != 0 {
                growth -= 1;
            }
            let top = self.rotate_left(head);
            self.replace_child(parent, head, top);
        } else if balance_factor < -1 {
            let child = self.node_ref(head, Node::left_child);
            let child_bf = self.node_ref(child, Node::balance_factor);
            if child_bf > 0 {
                let pivot = self.rotate_left(child);
                self.node_mut(head, Node::set_left(Some(pivot)));
            }
            if child_bf != 0 {
                growth -= 1;
            }
            let top = self.rotate_right(head);
            self.replace_child(parent, head, top);
        }

        growth
    }

    /// Binary tree right rotate, returns the new subtree root.
    ///
    /// The returned node must be put in place of `head` by the caller.
    fn rotate_right(&mut self, head: NodeIndex<Ix>) -> NodeIndex<Ix> {
        let top = self.node_ref(head, Node::left_child);
        let (top_bf, head_bf) = right_rotated_factors(
            self.node_ref(head, Node::balance_factor),
            self.node_ref(top, Node::balance_factor),
        );
        let inner = self.node_ref(top, Node::right);
        self.node_mut(head, Node::set_left(inner));
        self.node_mut(top, Node::set_right(Some(head)));
        self.node_mut(top, Node::set_balance_factor(top_bf));
        self.node_mut(head, Node::set_balance_factor(head_bf));
        trace!(
            head = self.node_ref(head, Node::center_cut),
            top = self.node_ref(top, Node::center_cut),
            "rotate right"
        );
        self.bubble_up(top, head);
        top
    }

    /// Binary tree left rotate, returns the new subtree root.
    ///
    /// The returned node must be put in place of `head` by the caller.
    fn rotate_left(&mut self, head: NodeIndex<Ix>) -> NodeIndex<Ix> {
        let top = self.node_ref(head, Node::right_child);
        let (top_bf, head_bf) = left_rotated_factors(
            self.node_ref(head, Node::balance_factor),
            self.node_ref(top, Node::balance_factor),
        );
        let inner = self.node_ref(top, Node::left);
        self.node_mut(head, Node::set_right(inner));
        self.node_mut(top, Node::set_left(Some(head)));
        self.node_mut(top, Node::set_balance_factor(top_bf));
        self.node_mut(head, Node::set_balance_factor(head_bf));
        trace!(
            head = self.node_ref(head, Node::center_cut),
            top = self.node_ref(top, Node::center_cut),
            "rotate left"
        );
        self.bubble_up(top, head);
        top
    }

    /// Move the intervals of `demoted` that cover the cut of `top` into `top`.
    fn bubble_up(&mut self, top: NodeIndex<Ix>, demoted: NodeIndex<Ix>) {
        let cut = self.node_ref(top, Node::center_cut);
        let (moved, kept): (Vec<K>, Vec<K>) = self
            .node_mut(demoted, Node::take_bucket)
            .into_iter()
            .partition(|key| key.contains(cut));
        if !moved.is_empty() {
            trace!(cut, moved = moved.len(), "bubble intervals up");
            self.node_mut(top, Node::extend_bucket(moved));
        }
        self.node_mut(demoted, Node::set_bucket(kept));
    }

    /// Put `new` in the slot of `parent` that holds `old`, or in the root slot.
    fn replace_child(
        &mut self,
        parent: Option<NodeIndex<Ix>>,
        old: NodeIndex<Ix>,
        new: NodeIndex<Ix>,
    ) {
        let Some(parent) = parent else {
            assert_eq!(self.root, Some(old), "replaced node is not the root");
            self.root = Some(new);
            return;
        };
        if self.node_ref(parent, Node::left) == Some(old) {
            self.node_mut(parent, Node::set_left(Some(new)));
        } else if self.node_ref(parent, Node::right) == Some(old) {
            self.node_mut(parent, Node::set_right(Some(new)));
        } else {
            panic!("tried to replace {old:?}, which is not a child of {parent:?}");
        }
    }
}

/// Balance factors `(top, head)` after rotating `head` right around its left child `top`.
fn right_rotated_factors(head_bf: i32, child_bf: i32) -> (i32, i32) {
    if child_bf >= 0 {
        let head = head_bf + 1;
        let top = if head >= 0 {
            head_bf + child_bf + 2
        } else {
            child_bf + 1
        };
        (top, head)
    } else {
        let head = head_bf - child_bf + 1;
        let top = if head >= 0 { head_bf + 2 } else { child_bf + 1 };
        (top, head)
    }
}

/// Balance factors `(top, head)` after rotating `head` left around its right child `top`.
fn left_rotated_factors(head_bf: i32, child_bf: i32) -> (i32, i32) {
    if child_bf <= 0 {
        let head = head_bf - 1;
        let top = if head >= 0 {
            child_bf - 1
        } else {
            head_bf + child_bf - 2
        };
        (top, head)
    } else {
        let head = head_bf - child_bf - 1;
        let top = if head >= 0 { child_bf - 1 } else { head_bf - 2 };
        (top, head)
    }
}

#[cfg(feature = "graphviz")]
impl<K, Ix> IntervalIndex<K, Ix>
where
    K: Interval1D + std::fmt::Display,
    Ix: IndexType,
{
    /// Write the tree as a graphviz dot file
    ///
    /// # Errors
    ///
    /// Any I/O error of creating or writing the file.
    pub fn draw(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        use std::io::Write;

        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        self.write_dot(&mut file)?;
        file.flush()
    }

    /// Render the tree in the graphviz dot language, one record per node
    ///
    /// # Errors
    ///
    /// Any error of the underlying writer.
    pub fn write_dot<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "digraph {{")?;
        for (i, node) in self.nodes.iter().enumerate() {
            writeln!(out, "    {i} [shape=box, label=\"{node}\"];")?;
            if let Some(left) = node.left() {
                writeln!(out, "    {i} -> {} [label=\"L\"];", left.index())?;
            }
            if let Some(right) = node.right() {
                writeln!(out, "    {i} -> {} [label=\"R\"];", right.index())?;
            }
        }
        writeln!(out, "}}")
    }
}

// Convenient methods for reference or mutate a node
impl<'a, K, Ix> IntervalIndex<K, Ix>
where
    Ix: IndexType,
{
    pub(crate) fn node_ref<F, R>(&'a self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a Node<K, Ix>) -> R,
    {
        op(&self.nodes[node.index()])
    }

    pub(crate) fn node_mut<F, R>(&'a mut self, node: NodeIndex<Ix>, op: F) -> R
    where
        R: 'a,
        F: FnOnce(&'a mut Node<K, Ix>) -> R,
    {
        op(&mut self.nodes[node.index()])
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Height of a subtree of heights `(l, r)`
    fn height(l: i32, r: i32) -> i32 {
        l.max(r) + 1
    }

    #[test]
    fn rotation_factors_match_recomputed_heights() {
        for a in 0..5 {
            for b in 0..5 {
                for c in 0..5 {
                    // right rotation: child (a, b) on the left of head, c on the right
                    let got = right_rotated_factors(c - height(a, b), b - a);
                    let expect = (height(b, c) - a, c - b);
                    assert_eq!(got, expect, "right a={a} b={b} c={c}");

                    // left rotation: c on the left of head, child (a, b) on the right
                    let got = left_rotated_factors(height(a, b) - c, b - a);
                    let expect = (b - height(c, a), a - c);
                    assert_eq!(got, expect, "left a={a} b={b} c={c}");
                }
            }
        }
    }

    fn sorted(found: Vec<&Interval>) -> Vec<Interval> {
        let mut found: Vec<_> = found.into_iter().copied().collect();
        found.sort_unstable();
        found
    }

    fn small_index() -> IntervalIndex<Interval> {
        [(10, 20), (5, 10), (5, 20), (15, 20)]
            .into_iter()
            .map(|(l, r)| Interval::new(l, r))
            .collect()
    }

    #[test]
    fn point_query_skips_interval_past_the_point() {
        let index = small_index();
        assert_eq!(
            sorted(index.overlaps_exact(&Interval::new(10, 10))),
            vec![
                Interval::new(5, 10),
                Interval::new(5, 20),
                Interval::new(10, 20)
            ]
        );
    }

    #[test]
    fn query_spanning_the_cut_visits_both_sides() {
        let index = small_index();
        assert_eq!(
            sorted(index.overlaps_exact(&Interval::new(11, 15))),
            vec![
                Interval::new(5, 20),
                Interval::new(10, 20),
                Interval::new(15, 20)
            ]
        );
    }

    #[test]
    fn contains_after_small_inserts() {
        let index = small_index();
        assert!(index.contains(&Interval::new(20, 20)));
        assert!(!index.contains(&Interval::new(21, 22)));
        assert!(index.contains_point(5));
        assert!(!index.contains_point(4));
    }

    #[test]
    fn empty_index_finds_nothing() {
        let index: IntervalIndex<Interval> = IntervalIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.max_depth(), 0);
        assert!(index.overlaps_exact(&Interval::new(0, 100)).is_empty());
        assert!(!index.contains_point(0));
        assert_eq!(index.iter().count(), 0);
    }

    #[test]
    fn mixed_inserts_stay_balanced_and_searchable() {
        let mut index = small_index();
        let more = [
            (-15, 10),
            (15, 20),
            (40, 60),
            (70, 70),
            (20, 20),
            (30, 34),
            (35, 35),
            (45, 45),
            (55, 55),
            (65, 65),
            (75, 75),
            (85, 85),
            (55, 55),
            (50, 50),
            (51, 51),
            (52, 52),
            (53, 53),
            (54, 54),
            (-10, -10),
            (-20, -20),
            (-30, -30),
            (-40, -40),
            (-50, -50),
            (-60, -60),
            (-70, -70),
        ];
        index.extend(more.iter().map(|&(l, r)| Interval::new(l, r)));
        assert_eq!(index.len(), 4 + more.len());
        // an AVL tree needs 33 nodes to reach 7 levels
        assert!(index.max_depth() <= 6, "depth {}", index.max_depth());

        assert_eq!(
            sorted(index.overlaps_exact(&Interval::new(20, 20))),
            vec![
                Interval::new(5, 20),
                Interval::new(10, 20),
                Interval::new(15, 20),
                Interval::new(15, 20),
                Interval::new(20, 20)
            ]
        );
        assert!(index.overlaps_exact(&Interval::new(21, 22)).is_empty());
        assert_eq!(
            sorted(index.overlaps_exact(&Interval::new(30, 31))),
            vec![Interval::new(30, 34)]
        );
        assert!(!index.contains(&Interval::new(-45, -45)));
        assert!(index.contains(&Interval::new(-40, -40)));
    }

    #[test]
    fn ascending_points_rotate_left() {
        let index: IntervalIndex<Interval> = (0..3).map(Interval::point).collect();
        let root = index.root.unwrap();
        assert_eq!(index.node_ref(root, Node::center_cut), 1);
        assert_eq!(index.node_ref(root, Node::balance_factor), 0);
        assert_eq!(index.max_depth(), 2);
    }

    #[test]
    fn zig_zag_is_double_rotated() {
        let index: IntervalIndex<Interval> =
            [0, 10, 5].into_iter().map(Interval::point).collect();
        let root = index.root.unwrap();
        assert_eq!(index.node_ref(root, Node::center_cut), 5);
        assert_eq!(index.node_ref(root, Node::balance_factor), 0);
        let left = index.node_ref(root, Node::left_child);
        let right = index.node_ref(root, Node::right_child);
        assert_eq!(index.node_ref(left, Node::center_cut), 0);
        assert_eq!(index.node_ref(right, Node::center_cut), 10);
    }

    #[test]
    fn rotation_bubbles_covering_intervals_up() {
        let mut index: IntervalIndex<Interval> = IntervalIndex::new();
        // cut 10, then [20, 30] opens a right child cut 25, [5, 30] stays at the root
        index.insert(Interval::point(10));
        index.insert(Interval::new(20, 30));
        index.insert(Interval::new(5, 30));
        // [26, 40] lands right of 25: cut 33 two levels below the root, rotate left
        index.insert(Interval::new(26, 40));
        let root = index.root.unwrap();
        assert_eq!(index.node_ref(root, Node::center_cut), 25);
        // [5, 30] covers 25 and left the demoted root
        let bucket: HashSet<_> = index.node_ref(root, Node::bucket).iter().copied().collect();
        assert_eq!(
            bucket,
            HashSet::from([Interval::new(20, 30), Interval::new(5, 30)])
        );
        let left = index.node_ref(root, Node::left_child);
        assert_eq!(index.node_ref(left, Node::bucket), &[Interval::point(10)]);
    }

    #[test]
    #[should_panic(expected = "not a child of")]
    fn replacing_a_stranger_panics() {
        let mut index: IntervalIndex<Interval> =
            [0, 10, 20].into_iter().map(Interval::point).collect();
        let root = index.root.unwrap();
        index.replace_child(Some(root), root, root);
    }

    #[test]
    fn clear_drops_everything() {
        let mut index = small_index();
        index.clear();
        assert!(index.is_empty());
        assert!(index.nodes.is_empty());
        assert!(index.root.is_none());
        index.insert(Interval::new(1, 1));
        assert_eq!(index.len(), 1);
    }
}
