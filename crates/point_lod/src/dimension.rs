//! DimensionLevel - how many axes participate in partitioning.
//!
//! 1 = binary tree over X, 2 = quadtree over X/Y, 3 = octree over X/Y/Z.
//! The same axes drive Morton coding and characteristic-size computation.

use crate::IndexError;

/// Number of spatial axes the index splits on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u8", into = "u8"))]
pub enum DimensionLevel {
  /// Split on X only (binary tree).
  Linear = 1,
  /// Split on X and Y (quadtree).
  Planar = 2,
  /// Split on X, Y and Z (octree).
  #[default]
  Volumetric = 3,
}

impl DimensionLevel {
  /// Number of active axes (1, 2 or 3).
  #[inline]
  pub fn axes(self) -> usize {
    self as usize
  }

  /// Children per internal node: 2^axes.
  #[inline]
  pub fn child_count(self) -> usize {
    1 << self.axes()
  }

  /// Whether `axis` (0 = X, 1 = Y, 2 = Z) participates at this level.
  #[inline]
  pub fn is_active(self, axis: usize) -> bool {
    axis < self.axes()
  }
}

impl TryFrom<u8> for DimensionLevel {
  type Error = IndexError;

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      1 => Ok(Self::Linear),
      2 => Ok(Self::Planar),
      3 => Ok(Self::Volumetric),
      other => Err(IndexError::InvalidDimensionLevel(other)),
    }
  }
}

impl From<DimensionLevel> for u8 {
  fn from(level: DimensionLevel) -> Self {
    level as u8
  }
}
