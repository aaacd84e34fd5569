use std::slice;

use crate::index::{IndexType, NodeIndex};
use crate::interval::Interval1D;
use crate::intervalindex::IntervalIndex;
use crate::node::{Node, Side};
use crate::tolerance::Tolerance;

/// Pushes a link of nodes on the left to stack.
fn left_link<K, Ix>(
    index_ref: &IntervalIndex<K, Ix>,
    mut x: Option<NodeIndex<Ix>>,
) -> Vec<NodeIndex<Ix>>
where
    Ix: IndexType,
{
    let mut nodes = vec![];
    while let Some(idx) = x {
        nodes.push(idx);
        x = index_ref.node_ref(idx, Node::left);
    }
    nodes
}

/// An iterator over the intervals of an `IntervalIndex`.
#[derive(Debug)]
pub struct Iter<'a, K, Ix> {
    /// Reference to the index
    index_ref: &'a IntervalIndex<K, Ix>,
    /// Stack for iteration
    stack: Vec<NodeIndex<Ix>>,
    /// Remaining intervals of the current node
    bucket: slice::Iter<'a, K>,
}

impl<'a, K, Ix> Iter<'a, K, Ix>
where
    Ix: IndexType,
{
    pub fn new(index_ref: &'a IntervalIndex<K, Ix>) -> Self {
        Iter {
            index_ref,
            stack: left_link(index_ref, index_ref.root),
            bucket: <&[K]>::default().iter(),
        }
    }
}

impl<'a, K, Ix> Iterator for Iter<'a, K, Ix>
where
    Ix: IndexType,
{
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(key) = self.bucket.next() {
                return Some(key);
            }
            let x = self.stack.pop()?;
            let index_ref = self.index_ref;
            self.stack
                .extend(left_link(index_ref, index_ref.node_ref(x, Node::right)));
            self.bucket = index_ref.node_ref(x, Node::bucket).iter();
        }
    }
}

/// A lazy iterator over the intervals of an `IntervalIndex` matching a query.
///
/// Subtrees are pruned by where the query itself lies against each center cut.
#[derive(Debug)]
pub struct OverlapIter<'a, 'q, K, Q, Ix>
where
    Q: ?Sized,
{
    /// Reference to the index
    index_ref: &'a IntervalIndex<K, Ix>,
    query: &'q Q,
    tolerance: Tolerance,
    /// Nodes still to be visited
    stack: Vec<NodeIndex<Ix>>,
    /// Unchecked intervals of the current node
    bucket: slice::Iter<'a, K>,
}

impl<'a, 'q, K, Q, Ix> OverlapIter<'a, 'q, K, Q, Ix>
where
    Q: ?Sized,
    Ix: IndexType,
{
    pub fn new(index_ref: &'a IntervalIndex<K, Ix>, query: &'q Q, tolerance: Tolerance) -> Self {
        OverlapIter {
            index_ref,
            query,
            tolerance,
            stack: index_ref.root.into_iter().collect(),
            bucket: <&[K]>::default().iter(),
        }
    }
}

impl<'a, 'q, K, Q, Ix> Iterator for OverlapIter<'a, 'q, K, Q, Ix>
where
    K: Interval1D,
    Q: Interval1D + ?Sized,
    Ix: IndexType,
{
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let (query, tolerance) = (self.query, self.tolerance);
        loop {
            if let Some(key) = self.bucket.find(|key| key.matches(query, tolerance)) {
                return Some(key);
            }
            let x = self.stack.pop()?;
            let index_ref = self.index_ref;
            let node = &index_ref.nodes[x.index()];
            match node.classify(query) {
                Side::Center => self.stack.extend(node.left().into_iter().chain(node.right())),
                Side::Left => self.stack.extend(node.left()),
                Side::Right => self.stack.extend(node.right()),
            }
            self.bucket = node.bucket().iter();
        }
    }
}
