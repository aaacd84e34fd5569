//! Deserialized `IntervalIndex` snapshots are only accepted once their arena is a valid tree.

use serde::Deserialize;
use tracing::debug;

use crate::error::IntervalError;
use crate::index::{IndexType, NodeIndex};
use crate::interval::Interval1D;
use crate::intervalindex::IntervalIndex;
use crate::node::Node;

/// Serialized layout of an `IntervalIndex`, before any check
#[derive(Deserialize)]
pub struct RawIntervalIndex<K, Ix> {
    nodes: Vec<Node<K, Ix>>,
    root: Option<NodeIndex<Ix>>,
    len: usize,
}

impl<K, Ix> TryFrom<RawIntervalIndex<K, Ix>> for IntervalIndex<K, Ix>
where
    K: Interval1D,
    Ix: IndexType,
{
    type Error = IntervalError;

    fn try_from(raw: RawIntervalIndex<K, Ix>) -> Result<Self, Self::Error> {
        let order = check_placement(&raw)?;
        check_balance(&raw.nodes, &order)?;
        debug!(nodes = raw.nodes.len(), len = raw.len, "accepted index snapshot");
        Ok(IntervalIndex {
            nodes: raw.nodes,
            root: raw.root,
            len: raw.len,
        })
    }
}

/// Walk down from the root, checking every handle and every bucket on the way.
///
/// Each node has to be linked exactly once, every interval has to cover its node's cut and
/// lie strictly between the cuts of the ancestors it was sent left or right of.
/// Returns the nodes in pre-order.
fn check_placement<K, Ix>(raw: &RawIntervalIndex<K, Ix>) -> Result<Vec<usize>, IntervalError>
where
    K: Interval1D,
    Ix: IndexType,
{
    let mut linked = vec![false; raw.nodes.len()];
    let mut order = Vec::with_capacity(raw.nodes.len());
    let mut stored = 0;
    // node with the exclusive bounds inherited from its ancestors
    let mut stack: Vec<_> = raw.root.into_iter().map(|r| (r, None, None)).collect();
    while let Some((x, after, before)) = stack.pop() {
        let i = x.index();
        let Some(node) = raw.nodes.get(i) else {
            return Err(IntervalError::InvalidSnapshot(format!(
                "node {i} is out of range"
            )));
        };
        if std::mem::replace(&mut linked[i], true) {
            return Err(IntervalError::InvalidSnapshot(format!(
                "node {i} is linked more than once"
            )));
        }
        let cut = node.center_cut();
        if !after.map_or(true, |a: i64| a < cut) || !before.map_or(true, |b: i64| cut < b) {
            return Err(IntervalError::InvalidSnapshot(format!(
                "cut {cut} of node {i} is out of order"
            )));
        }
        let misplaced = node.bucket().iter().any(|key| {
            !key.contains(cut)
                || !after.map_or(true, |a| a < key.left())
                || !before.map_or(true, |b| key.right() < b)
        });
        if misplaced {
            return Err(IntervalError::InvalidSnapshot(format!(
                "an interval of node {i} is misplaced"
            )));
        }
        stored += node.bucket().len();
        order.push(i);
        stack.extend(node.left().map(|l| (l, after, Some(cut))));
        stack.extend(node.right().map(|r| (r, Some(cut), before)));
    }
    if let Some(i) = linked.iter().position(|l| !l) {
        return Err(IntervalError::InvalidSnapshot(format!(
            "node {i} is unreachable from the root"
        )));
    }
    if stored != raw.len {
        return Err(IntervalError::InvalidSnapshot(format!(
            "len {} does not match {stored} stored intervals",
            raw.len
        )));
    }
    Ok(order)
}

/// Recompute heights bottom-up, `order` lists parents before their children.
fn check_balance<K, Ix>(nodes: &[Node<K, Ix>], order: &[usize]) -> Result<(), IntervalError>
where
    Ix: IndexType,
{
    let mut heights = vec![0_i32; nodes.len()];
    for &i in order.iter().rev() {
        let node = &nodes[i];
        let height = |child: Option<NodeIndex<Ix>>| child.map_or(0, |c| heights[c.index()]);
        let (left, right) = (height(node.left()), height(node.right()));
        if node.balance_factor() != right - left {
            return Err(IntervalError::InvalidSnapshot(format!(
                "balance factor of node {i} does not match its subtrees"
            )));
        }
        if !(-1..=1).contains(&node.balance_factor()) {
            return Err(IntervalError::InvalidSnapshot(format!(
                "node {i} is unbalanced"
            )));
        }
        heights[i] = left.max(right) + 1;
    }
    Ok(())
}
