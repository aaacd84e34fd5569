//! `centered_interval_index` is an insert-only interval index based on a centered interval tree.
//!
//! Every node owns a fixed center cut and stores the intervals covering it, intervals entirely
//! before or after the cut go to the left or right subtree. The tree is kept balanced with
//! AVL rotations, each of which moves the intervals covering the new subtree root up into it.
//!
//! Queries can be loosened with a [`Tolerance`]: a reciprocal overlap ratio both intervals have
//! to reach, and a wiggle by which a stored interval may be shifted to reach it.
//!
//! Nodes are kept in a vector and addressed by index, so the index is `Send` and `Unpin`.
//!
//! # Example
//!
//! ```rust
//! use centered_interval_index::{Interval, IntervalIndex, Tolerance};
//!
//! let mut index = IntervalIndex::new();
//! index.insert(Interval::new(10, 20));
//! index.insert(Interval::new(5, 10));
//! index.insert(Interval::new(5, 20));
//! index.insert(Interval::new(15, 20));
//!
//! assert_eq!(index.overlaps(&Interval::new(10, 10), Tolerance::EXACT).len(), 3);
//! assert!(index.contains_point(20));
//! assert!(!index.contains(&Interval::new(21, 22)));
//! ```
//!

mod error;
mod forest;
mod index;
mod interval;
mod intervalindex;
mod iter;
mod node;
#[cfg(feature = "serde")]
mod snapshot;
mod tolerance;


pub use error::IntervalError;
pub use forest::IntervalForest;
pub use index::{DefaultIx, IndexType};
pub use interval::{Interval, Interval1D, ValueInterval, MAX_SPAN};
pub use intervalindex::IntervalIndex;
pub use iter::{Iter, OverlapIter};
pub use tolerance::Tolerance;
