//! LOD table generation: progressively coarser prefixes of the hierarchical
//! order.

use std::sync::Arc;

use crate::PointSet;

/// Reduction factor per level, coarsest first, ending at full detail.
///
/// Empirical √2 steps. Treat as a tunable constant.
pub const REDUCTION_FACTORS: [f32; 13] = [
  64.0, 45.25, 32.0, 22.63, 16.0, 11.31, 8.0, 5.66, 4.0, 2.83, 2.0, 1.41, 1.0,
];

/// Point size compensation so sparser levels do not read as a thinner cloud.
#[inline]
pub fn size_multiplier(factor: f32) -> f32 {
  factor.sqrt() * 0.5 + 0.5
}

/// One level of detail.
#[derive(Clone, Debug)]
pub struct LodLevel {
  /// Ordinal, 0 = coarsest.
  pub depth: usize,
  /// Number of points drawn at this level.
  pub point_count: usize,
  /// Reduction factor relative to the full set (1.0 = full detail).
  pub factor: f32,
  /// Rendered point size multiplier.
  pub size_multiplier: f32,
  /// Original indices sampled for this level; `None` means identity.
  pub indices: Option<Arc<[u32]>>,
  /// Positions gathered for `indices`; `None` at full detail.
  pub positions: Option<Arc<[f32]>>,
  /// Colors gathered for `indices`; `None` at full detail.
  pub colors: Option<Arc<[u8]>>,
}

impl LodLevel {
  /// Whether this level draws every point.
  #[inline]
  pub fn is_full(&self) -> bool {
    self.indices.is_none()
  }

  /// Map a level-local vertex index to the original point index.
  #[inline]
  pub fn to_original(&self, local: u32) -> u32 {
    match &self.indices {
      Some(indices) => indices[local as usize],
      None => local,
    }
  }

  /// Vertex positions for this level, borrowing the source at full detail.
  pub fn positions<'a>(&'a self, points: &'a PointSet) -> &'a [f32] {
    match &self.positions {
      Some(positions) => &positions[..],
      None => &points.positions()[..],
    }
  }

  /// Vertex colors for this level, borrowing the source at full detail.
  pub fn colors<'a>(&'a self, points: &'a PointSet) -> &'a [u8] {
    match &self.colors {
      Some(colors) => &colors[..],
      None => &points.colors()[..],
    }
  }
}

/// Ordered LOD levels, coarsest first, always ending with full detail.
#[derive(Clone, Debug, Default)]
pub struct LodTable {
  levels: Vec<LodLevel>,
  total_points: usize,
}

impl LodTable {
  /// Build levels as prefixes of `order`.
  ///
  /// Each reduced level holds `clamp(ceil(N / factor), min_points, N)` points.
  /// Levels that would not grow over the previous one are skipped, and a
  /// level that reaches N becomes the full-detail level.
  pub fn generate(points: &PointSet, order: &[u32], min_points: usize) -> Self {
    let total = order.len();
    let mut levels = Vec::new();
    let mut previous = 0usize;

    for &factor in &REDUCTION_FACTORS {
      let target = if factor <= 1.0 {
        total
      } else {
        ((total as f64 / factor as f64).ceil() as usize)
          .max(min_points)
          .min(total)
      };

      if target >= total {
        break;
      }
      if target <= previous {
        continue;
      }

      let indices: Arc<[u32]> = Arc::from(&order[..target]);
      let (positions, colors) = points.gather(&indices);
      levels.push(LodLevel {
        depth: levels.len(),
        point_count: target,
        factor,
        size_multiplier: size_multiplier(factor),
        indices: Some(indices),
        positions: Some(positions.into()),
        colors: Some(colors.into()),
      });
      previous = target;
    }

    levels.push(LodLevel {
      depth: levels.len(),
      point_count: total,
      factor: 1.0,
      size_multiplier: size_multiplier(1.0),
      indices: None,
      positions: None,
      colors: None,
    });

    Self {
      levels,
      total_points: total,
    }
  }

  /// Number of levels (at least 1).
  #[inline]
  pub fn len(&self) -> usize {
    self.levels.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.levels.is_empty()
  }

  #[inline]
  pub fn level(&self, depth: usize) -> Option<&LodLevel> {
    self.levels.get(depth)
  }

  pub fn levels(&self) -> &[LodLevel] {
    &self.levels
  }

  /// Full-detail level index.
  #[inline]
  pub fn finest(&self) -> usize {
    self.levels.len().saturating_sub(1)
  }

  /// Number of points in the full set.
  #[inline]
  pub fn total_points(&self) -> usize {
    self.total_points
  }

  /// Map from original point index to level-local index (`u32::MAX` = absent).
  ///
  /// Returns `None` for the full level, where the mapping is the identity.
  pub fn reverse_map(&self, depth: usize) -> Option<Vec<u32>> {
    let indices = self.levels.get(depth)?.indices.as_ref()?;
    let mut map = vec![u32::MAX; self.total_points];
    for (local, &original) in indices.iter().enumerate() {
      map[original as usize] = local as u32;
    }
    Some(map)
  }

  /// Write a 1.0/0.0 per original point mask of membership in `depth`.
  ///
  /// An out-of-range depth clears every entry.
  pub fn visibility_mask(&self, depth: usize, mask: &mut Vec<f32>) {
    mask.clear();
    match self.levels.get(depth) {
      Some(level) if level.is_full() => mask.resize(self.total_points, 1.0),
      Some(level) => {
        mask.resize(self.total_points, 0.0);
        if let Some(indices) = &level.indices {
          for &i in indices.iter() {
            mask[i as usize] = 1.0;
          }
        }
      }
      None => mask.resize(self.total_points, 0.0),
    }
  }
}

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;
