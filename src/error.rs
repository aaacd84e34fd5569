use thiserror::Error;

/// Errors raised while building intervals, query tolerances or index snapshots.
///
/// These are rejections at the value boundary: nothing is clamped, the caller
/// gets the offending input back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntervalError {
    /// The left end-point lies after the right one.
    #[error("illegal interval (negative range): {left}-{right}")]
    InvalidBounds {
        /// Left end-point
        left: i64,
        /// Right end-point
        right: i64,
    },
    /// The span is wide enough to overflow length or midpoint arithmetic.
    #[error("illegal interval (too large range): {left}-{right}")]
    SpanTooLarge {
        /// Left end-point
        left: i64,
        /// Right end-point
        right: i64,
    },
    /// A reciprocal overlap ratio outside of `[0, 1]`, or NaN.
    #[error("reciprocal ratio must lie within [0, 1], got {0}")]
    InvalidRatio(f64),
    /// A negative positional wiggle.
    #[error("wiggle must not be negative, got {0}")]
    NegativeWiggle(i64),
    /// A deserialized index whose arena is not a valid tree.
    #[error("invalid index snapshot: {0}")]
    InvalidSnapshot(String),
}
