use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::index::NodeIndex;
use crate::interval::Interval1D;

/// Where an interval falls relative to a node's center cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Entirely before the cut
    Left,
    /// Covers the cut
    Center,
    /// Entirely after the cut
    Right,
}

/// Node of the interval index
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node<K, Ix> {
    /// Left children
    pub left: Option<NodeIndex<Ix>>,
    /// Right children
    pub right: Option<NodeIndex<Ix>>,
    /// Intervals covering this point stay in the bucket, fixed for the node's lifetime
    pub center_cut: i64,
    /// Height of the right subtree minus height of the left subtree
    pub balance_factor: i32,
    /// Intervals covering `center_cut`
    pub bucket: Vec<K>,
}

impl<K, Ix> Node<K, Ix>
where
    K: Interval1D,
{
    /// Create a leaf cut at the center of its first interval
    pub fn new(key: K) -> Self {
        Node {
            left: None,
            right: None,
            center_cut: key.center(),
            balance_factor: 0,
            bucket: vec![key],
        }
    }
}

impl<K, Ix> Node<K, Ix> {
    pub fn classify<Q>(&self, key: &Q) -> Side
    where
        Q: Interval1D + ?Sized,
    {
        if key.contains(self.center_cut) {
            Side::Center
        } else if key.right() < self.center_cut {
            Side::Left
        } else {
            Side::Right
        }
    }
}

// Convenient getter/setter methods
impl<K, Ix> Node<K, Ix>
where
    Ix: Copy,
{
    pub fn left(&self) -> Option<NodeIndex<Ix>> {
        self.left
    }

    pub fn right(&self) -> Option<NodeIndex<Ix>> {
        self.right
    }

    /// Left child of a node that has to have one
    pub fn left_child(&self) -> NodeIndex<Ix> {
        match self.left {
            Some(left) => left,
            None => panic!("node cut at {} has no left child", self.center_cut),
        }
    }

    /// Right child of a node that has to have one
    pub fn right_child(&self) -> NodeIndex<Ix> {
        match self.right {
            Some(right) => right,
            None => panic!("node cut at {} has no right child", self.center_cut),
        }
    }

    pub fn center_cut(&self) -> i64 {
        self.center_cut
    }

    pub fn balance_factor(&self) -> i32 {
        self.balance_factor
    }

    pub fn bucket(&self) -> &[K] {
        &self.bucket
    }

    pub fn take_bucket(&mut self) -> Vec<K> {
        std::mem::take(&mut self.bucket)
    }

    pub fn push(key: K) -> impl FnOnce(&mut Node<K, Ix>) {
        move |node: &mut Node<K, Ix>| node.bucket.push(key)
    }

    pub fn set_bucket(bucket: Vec<K>) -> impl FnOnce(&mut Node<K, Ix>) {
        move |node: &mut Node<K, Ix>| {
            node.bucket = bucket;
        }
    }

    pub fn extend_bucket(keys: Vec<K>) -> impl FnOnce(&mut Node<K, Ix>) {
        move |node: &mut Node<K, Ix>| node.bucket.extend(keys)
    }

    pub fn set_balance_factor(balance_factor: i32) -> impl FnOnce(&mut Node<K, Ix>) {
        move |node: &mut Node<K, Ix>| {
            node.balance_factor = balance_factor;
        }
    }

    pub fn add_balance_factor(delta: i32) -> impl FnOnce(&mut Node<K, Ix>) {
        move |node: &mut Node<K, Ix>| {
            node.balance_factor += delta;
        }
    }

    pub fn set_left(left: Option<NodeIndex<Ix>>) -> impl FnOnce(&mut Node<K, Ix>) {
        move |node: &mut Node<K, Ix>| {
            node.left = left;
        }
    }

    pub fn set_right(right: Option<NodeIndex<Ix>>) -> impl FnOnce(&mut Node<K, Ix>) {
        move |node: &mut Node<K, Ix>| {
            node.right = right;
        }
    }
}

impl<K, Ix> fmt::Display for Node<K, Ix>
where
    K: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cut: {} bf: {} --", self.center_cut, self.balance_factor)?;
        for key in &self.bucket {
            write!(f, " {key}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interval::Interval;

    #[test]
    fn new_node_is_cut_at_the_center() {
        let node: Node<Interval, u32> = Node::new(Interval::new(10, 20));
        assert_eq!(node.center_cut(), 15);
        assert_eq!(node.bucket(), &[Interval::new(10, 20)]);
        assert_eq!(node.balance_factor(), 0);
        assert!(node.left().is_none() && node.right().is_none());
    }

    #[test]
    fn classify_against_cut() {
        let node: Node<Interval, u32> = Node::new(Interval::new(10, 20));
        assert_eq!(node.classify(&Interval::new(15, 15)), Side::Center);
        assert_eq!(node.classify(&Interval::new(-3, 30)), Side::Center);
        assert_eq!(node.classify(&Interval::new(5, 14)), Side::Left);
        assert_eq!(node.classify(&Interval::new(16, 40)), Side::Right);
    }

    #[test]
    #[should_panic(expected = "has no left child")]
    fn missing_required_child_panics() {
        let node: Node<Interval, u32> = Node::new(Interval::new(1, 2));
        let _ignore = node.left_child();
    }

    #[test]
    fn display_lists_bucket() {
        let mut node: Node<Interval, u32> = Node::new(Interval::new(10, 20));
        Node::push(Interval::new(5, 20))(&mut node);
        assert_eq!(node.to_string(), "cut: 15 bf: 0 -- [10, 20] [5, 20]");
    }
}
