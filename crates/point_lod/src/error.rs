//! Error type for index construction.
//!
//! Per-frame queries never fail; their degraded modes are part of the
//! returned values. Only building an index, or attaching data that must
//! match it, can error.

use thiserror::Error;

/// Errors raised while building or validating a [`SpatialIndex`](crate::SpatialIndex).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
	/// A build was requested over zero points.
	#[error("point set is empty")]
	EmptyPointSet,

	/// Position or color buffer length does not describe the same point count.
	#[error("buffer length mismatch: {positions} position floats vs {colors} color bytes")]
	MismatchedBuffers { positions: usize, colors: usize },

	/// More points than `u32` indices can address.
	#[error("point set has {count} points, at most {max} are supported")]
	TooManyPoints { count: usize, max: usize },

	/// Dimension level outside 1..=3.
	#[error("invalid dimension level {0}, expected 1, 2 or 3")]
	InvalidDimensionLevel(u8),

	/// Configuration value that cannot produce a tree.
	#[error("invalid index configuration: {0}")]
	InvalidConfig(&'static str),

	/// Leaves do not account for every input point exactly once.
	///
	/// This is an internal consistency failure of the builder, never a user
	/// error. An index that fails this check is never handed out.
	#[error("leaf point count {found} does not match input point count {expected}")]
	PointCountMismatch { expected: usize, found: usize },

	/// A per-point filter does not cover the indexed point count.
	#[error("point filter has {found} entries, index has {expected} points")]
	FilterLength { expected: usize, found: usize },
}
