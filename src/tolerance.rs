//! Matching tolerance shared by every query of an `IntervalIndex`.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::IntervalError;

/// How loosely a stored interval may match a query.
///
/// `ratio` is the reciprocal overlap both intervals need, `wiggle` the number of positions
/// a stored interval may be shifted by before the overlap is measured. The default,
/// [`Tolerance::EXACT`], accepts any shared position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "(f64, i64)", into = "(f64, i64)")
)]
pub struct Tolerance {
    ratio: f64,
    wiggle: i64,
}

impl Tolerance {
    /// Plain overlap, at least one shared position
    pub const EXACT: Self = Self {
        ratio: 0.0,
        wiggle: 0,
    };

    /// Create a tolerance from a ratio in `[0, 1]` and a non-negative wiggle
    ///
    /// # Errors
    ///
    /// [`IntervalError::InvalidRatio`] or [`IntervalError::NegativeWiggle`].
    #[inline]
    pub fn new(ratio: f64, wiggle: i64) -> Result<Self, IntervalError> {
        Self::reciprocal(ratio)?.with_wiggle(wiggle)
    }

    /// Reciprocal overlap without wiggle
    ///
    /// # Errors
    ///
    /// [`IntervalError::InvalidRatio`] when the ratio is NaN or outside of `[0, 1]`.
    #[inline]
    pub fn reciprocal(ratio: f64) -> Result<Self, IntervalError> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(IntervalError::InvalidRatio(ratio));
        }
        Ok(Self { ratio, wiggle: 0 })
    }

    /// Same ratio, allowing shifts of up to `wiggle` positions
    ///
    /// # Errors
    ///
    /// [`IntervalError::NegativeWiggle`] when `wiggle < 0`.
    #[inline]
    pub fn with_wiggle(self, wiggle: i64) -> Result<Self, IntervalError> {
        if wiggle < 0 {
            return Err(IntervalError::NegativeWiggle(wiggle));
        }
        Ok(Self { wiggle, ..self })
    }

    /// Reciprocal overlap ratio
    #[inline]
    #[must_use]
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Allowed positional shift
    #[inline]
    #[must_use]
    pub fn wiggle(&self) -> i64 {
        self.wiggle
    }

    /// Returns `true` when this is a plain overlap test
    #[inline]
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.ratio == 0.0 && self.wiggle == 0
    }
}

impl TryFrom<(f64, i64)> for Tolerance {
    type Error = IntervalError;

    #[inline]
    fn try_from((ratio, wiggle): (f64, i64)) -> Result<Self, Self::Error> {
        Self::new(ratio, wiggle)
    }
}

impl From<Tolerance> for (f64, i64) {
    #[inline]
    fn from(tolerance: Tolerance) -> Self {
        (tolerance.ratio, tolerance.wiggle)
    }
}

#[cfg(test)]
mod test {
    use rstest::rstest;

    use super::*;

    #[test]
    fn default_is_exact() {
        assert_eq!(Tolerance::default(), Tolerance::EXACT);
        assert!(Tolerance::EXACT.is_exact());
        assert!(!Tolerance::new(0.5, 0).unwrap().is_exact());
        assert!(!Tolerance::new(0.0, 2).unwrap().is_exact());
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.01)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn ratio_out_of_range_is_rejected(#[case] ratio: f64) {
        assert!(matches!(
            Tolerance::reciprocal(ratio),
            Err(IntervalError::InvalidRatio(_))
        ));
    }

    #[test]
    fn negative_wiggle_is_rejected() {
        assert_eq!(
            Tolerance::new(0.5, -1),
            Err(IntervalError::NegativeWiggle(-1))
        );
    }

    #[test]
    fn builder_keeps_ratio() {
        let tolerance = Tolerance::reciprocal(0.8)
            .and_then(|t| t.with_wiggle(10))
            .unwrap();
        assert_eq!(tolerance.ratio(), 0.8);
        assert_eq!(tolerance.wiggle(), 10);
        assert_eq!(<(f64, i64)>::from(tolerance), (0.8, 10));
    }
}
