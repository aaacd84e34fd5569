//! The closed intervals stored in `IntervalIndex`, represented as [left, right]
//!
//! Both end-points are inclusive, so `[5, 5]` is a single position and has a length of 1.
//! Intervals are ordered by their left end-point first and by their right end-point second:
//! - [1,4]<[2,5], because 1<2
//! - [1,4]<[1,5], because 4<5
//!
//! Besides the plain overlap test, intervals can be matched with a reciprocal overlap ratio
//! and a positional wiggle, see [`Interval1D::intersects_within`].

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::IntervalError;
use crate::tolerance::Tolerance;

/// Widest span, `right - left`, an [`Interval`] may cover.
///
/// Keeps `length()` and every doubled span inside `i64`.
pub const MAX_SPAN: i64 = i64::MAX / 2 - 1;

/// The contract an interval type has to fulfil to be stored in an `IntervalIndex`.
///
/// Implementors only provide the two end-points and must uphold the same bounds as
/// [`Interval`]: `left <= right` and `right - left <= MAX_SPAN`. Every predicate is
/// derived from the end-points.
pub trait Interval1D {
    /// Left end-point, inclusive
    fn left(&self) -> i64;

    /// Right end-point, inclusive
    fn right(&self) -> i64;

    /// Number of positions covered, end-points included
    #[inline]
    fn length(&self) -> i64 {
        self.right() - self.left() + 1
    }

    /// Floor of the midpoint.
    ///
    /// Each end-point is halved on its own so there is no `left + right` intermediate, the
    /// carry of two odd end-points is added back afterwards. The result always lies inside
    /// the interval.
    #[inline]
    fn center(&self) -> i64 {
        let (left, right) = (self.left(), self.right());
        (left >> 1) + (right >> 1) + (left & right & 1)
    }

    /// Checks if the point lies within the interval, bounds included
    #[inline]
    fn contains(&self, point: i64) -> bool {
        self.left() <= point && point <= self.right()
    }

    /// Checks if self shares at least one position with other
    #[inline]
    fn intersects<O>(&self, other: &O) -> bool
    where
        O: Interval1D + ?Sized,
    {
        !(other.right() < self.left() || self.right() < other.left())
    }

    /// Reciprocal overlap: the shared span has to cover `ratio` of both intervals.
    ///
    /// The required length of each side is rounded up and is never below one position.
    /// A ratio of zero is the plain [`Interval1D::intersects`].
    #[inline]
    fn intersects_ratio<O>(&self, other: &O, ratio: f64) -> bool
    where
        O: Interval1D + ?Sized,
    {
        if ratio == 0.0 {
            return self.intersects(other);
        }
        let required = required_overlap(self.length(), ratio)
            .max(required_overlap(other.length(), ratio));
        overlap_length(self.left(), self.right(), other.left(), other.right()) >= required
    }

    /// Reciprocal overlap after sliding self by at most `wiggle` positions.
    ///
    /// Only two placements are tried: self anchored by its right end-point as close to
    /// `other.right()` as the wiggle allows, then anchored by its left end-point as close to
    /// `other.left()`. The better of the two overlaps has to reach the reciprocal
    /// requirement. Placements in between are never searched.
    ///
    /// A wiggle of zero is [`Interval1D::intersects_ratio`].
    fn intersects_within<O>(&self, other: &O, ratio: f64, wiggle: i64) -> bool
    where
        O: Interval1D + ?Sized,
    {
        if wiggle == 0 {
            return self.intersects_ratio(other, ratio);
        }
        let length = self.length();
        let required =
            required_overlap(length, ratio).max(required_overlap(other.length(), ratio));

        let right_lim = if self.right() < other.right() {
            other.right().min(self.right().saturating_add(wiggle))
        } else {
            other.right().max(self.right().saturating_sub(wiggle))
        };
        let left_lim = right_lim.saturating_sub(length).saturating_add(1);
        let by_right = overlap_length(left_lim, right_lim, other.left(), other.right());

        let left_lim = if self.left() < other.left() {
            other.left().min(self.left().saturating_add(wiggle))
        } else {
            other.left().max(self.left().saturating_sub(wiggle))
        };
        let right_lim = left_lim.saturating_add(length).saturating_sub(1);
        let by_left = overlap_length(left_lim, right_lim, other.left(), other.right());

        by_right.max(by_left).max(0) >= required
    }

    /// Matches other under the given tolerance
    #[inline]
    fn matches<O>(&self, other: &O, tolerance: Tolerance) -> bool
    where
        O: Interval1D + ?Sized,
    {
        self.intersects_within(other, tolerance.ratio(), tolerance.wiggle())
    }
}

/// Positions one side must share for a reciprocal match.
fn required_overlap(length: i64, ratio: f64) -> i64 {
    // a full ratio is exact, `ceil` of the product loses precision on long intervals
    if ratio == 1.0 {
        return length;
    }
    ((length as f64 * ratio).ceil() as i64).max(1)
}

/// Length of the shared span, zero or negative when disjoint.
fn overlap_length(left: i64, right: i64, other_left: i64, other_right: i64) -> i64 {
    right
        .min(other_right)
        .saturating_sub(left.max(other_left))
        .saturating_add(1)
}

/// The interval stored in `IntervalIndex`, represents [left, right]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "(i64, i64)", into = "(i64, i64)")
)]
pub struct Interval {
    /// Left end-point
    left: i64,
    /// Right end-point
    right: i64,
}

impl Interval {
    /// Create a new `Interval`
    ///
    /// # Panics
    ///
    /// This method panics when left > right or when the span exceeds [`MAX_SPAN`]
    #[inline]
    #[must_use]
    pub fn new(left: i64, right: i64) -> Self {
        match Self::try_new(left, right) {
            Ok(interval) => interval,
            Err(err) => panic!("{err}"),
        }
    }

    /// Create a new `Interval`, rejecting reversed or oversized bounds
    ///
    /// # Errors
    ///
    /// [`IntervalError::InvalidBounds`] when left > right, [`IntervalError::SpanTooLarge`]
    /// when the span exceeds [`MAX_SPAN`].
    #[inline]
    pub fn try_new(left: i64, right: i64) -> Result<Self, IntervalError> {
        if left > right {
            return Err(IntervalError::InvalidBounds { left, right });
        }
        match right.checked_sub(left) {
            Some(span) if span <= MAX_SPAN => Ok(Self { left, right }),
            _ => Err(IntervalError::SpanTooLarge { left, right }),
        }
    }

    /// Create a single position interval `[point, point]`
    #[inline]
    #[must_use]
    pub fn point(point: i64) -> Self {
        Self {
            left: point,
            right: point,
        }
    }

    /// Smallest interval enclosing both self and other.
    ///
    /// This is not a set union: the gap between two disjoint intervals is covered too.
    ///
    /// # Errors
    ///
    /// [`IntervalError::SpanTooLarge`] when the enclosing interval is too wide.
    #[inline]
    pub fn union<O>(&self, other: &O) -> Result<Self, IntervalError>
    where
        O: Interval1D + ?Sized,
    {
        Self::try_new(self.left.min(other.left()), self.right.max(other.right()))
    }
}

impl Interval1D for Interval {
    #[inline]
    fn left(&self) -> i64 {
        self.left
    }

    #[inline]
    fn right(&self) -> i64 {
        self.right
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.left, self.right)
    }
}

impl TryFrom<(i64, i64)> for Interval {
    type Error = IntervalError;

    #[inline]
    fn try_from((left, right): (i64, i64)) -> Result<Self, Self::Error> {
        Self::try_new(left, right)
    }
}

impl From<Interval> for (i64, i64) {
    #[inline]
    fn from(interval: Interval) -> Self {
        (interval.left, interval.right)
    }
}

/// An interval carrying a payload.
///
/// Matching and placement only look at the interval, equality also compares the payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ValueInterval<V> {
    interval: Interval,
    value: V,
}

impl<V> ValueInterval<V> {
    /// Create a new `ValueInterval`
    ///
    /// # Errors
    ///
    /// Same as [`Interval::try_new`].
    #[inline]
    pub fn new(left: i64, right: i64, value: V) -> Result<Self, IntervalError> {
        Ok(Self::from_interval(Interval::try_new(left, right)?, value))
    }

    /// Attach a payload to an already validated interval
    #[inline]
    #[must_use]
    pub fn from_interval(interval: Interval, value: V) -> Self {
        Self { interval, value }
    }

    /// The bare interval
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Interval {
        self.interval
    }

    /// Reference to the payload
    #[inline]
    pub fn get(&self) -> &V {
        &self.value
    }

    /// Mutable reference to the payload
    #[inline]
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Replace the payload, returning the previous one
    #[inline]
    pub fn set(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }

    /// Split into the interval and the payload
    #[inline]
    pub fn into_inner(self) -> (Interval, V) {
        (self.interval, self.value)
    }
}

impl<V> Interval1D for ValueInterval<V> {
    #[inline]
    fn left(&self) -> i64 {
        self.interval.left
    }

    #[inline]
    fn right(&self) -> i64 {
        self.interval.right
    }
}

impl<V: fmt::Display> fmt::Display for ValueInterval<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.interval, self.value)
    }
}
