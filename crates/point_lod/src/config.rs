//! Engine configuration: tree construction, LOD selection and culling.
//!
//! All values are tunable constants. Defaults reproduce the behavior the
//! engine was calibrated against; presets cover the common alternatives.

use crate::{DimensionLevel, IndexError};

/// Deepest subdivision `IndexConfig::validate` accepts. Midpoint splits of
/// an f32 box stop separating points well before this depth.
pub const MAX_DEPTH_LIMIT: u32 = 32;

/// Tree construction and LOD table parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IndexConfig {
  /// Axes used for partitioning and Morton ordering.
  pub dimension_level: DimensionLevel,

  /// A node holding more points than this is split (unless at max depth).
  pub max_points_per_node: usize,

  /// Maximum subdivision depth (root = 0), at most [`MAX_DEPTH_LIMIT`].
  pub max_depth: u32,

  /// Smallest point count any reduced LOD level may have.
  pub min_lod_points: usize,
}

impl IndexConfig {
  /// Default octree parameters.
  pub const DEFAULT: Self = Self {
    dimension_level: DimensionLevel::Volumetric,
    max_points_per_node: 1000,
    max_depth: 16,
    min_lod_points: 1000,
  };

  /// Default parameters with a different dimension level.
  pub const fn with_dimension(dimension_level: DimensionLevel) -> Self {
    Self {
      dimension_level,
      ..Self::DEFAULT
    }
  }

  /// Reject values that cannot produce a tree.
  pub fn validate(&self) -> Result<(), IndexError> {
    if self.max_points_per_node == 0 {
      return Err(IndexError::InvalidConfig("max_points_per_node must be > 0"));
    }
    if self.max_depth > MAX_DEPTH_LIMIT {
      return Err(IndexError::InvalidConfig("max_depth must be <= 32"));
    }
    if self.min_lod_points == 0 {
      return Err(IndexError::InvalidConfig("min_lod_points must be > 0"));
    }
    Ok(())
  }
}

impl Default for IndexConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Distance-based LOD level selection parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LodSelectConfig {
  /// `distance / data_size` at or below which full detail is selected.
  pub min_ratio: f32,

  /// `distance / data_size` at or above which the coarsest level is selected.
  pub max_ratio: f32,

  /// Dead zone, in levels, that the continuous target must leave before the
  /// selected level moves.
  pub hysteresis: f32,
}

impl LodSelectConfig {
  pub const DEFAULT: Self = Self {
    min_ratio: 0.3,
    max_ratio: 3.0,
    hysteresis: 0.7,
  };

  /// Selection without a dead zone. Useful for tests and offline tools.
  pub const NO_HYSTERESIS: Self = Self {
    hysteresis: 0.0,
    ..Self::DEFAULT
  };
}

impl Default for LodSelectConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Frustum culling parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CullConfig {
  /// Above this visible fraction the culled index list is not built and the
  /// whole level is drawn.
  pub full_visibility_ratio: f32,

  /// Outward plane push, as a fraction of the data's bounding-sphere radius.
  pub plane_margin_fraction: f32,

  /// Summed squared matrix element difference below which the camera is
  /// considered unchanged.
  pub camera_epsilon_sq: f32,
}

impl CullConfig {
  pub const DEFAULT: Self = Self {
    full_visibility_ratio: 0.98,
    plane_margin_fraction: 0.01,
    camera_epsilon_sq: 1e-10,
  };
}

impl Default for CullConfig {
  fn default() -> Self {
    Self::DEFAULT
  }
}

/// Complete engine configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
  pub index: IndexConfig,
  pub select: LodSelectConfig,
  pub cull: CullConfig,
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
