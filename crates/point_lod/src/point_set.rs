//! PointSet - shared, read-only view of the caller's point buffers.

use std::sync::Arc;

use glam::Vec3;

use crate::IndexError;

/// Largest supported point count. Point indices are `u32` and `u32::MAX`
/// marks "absent" in level reverse maps.
pub const MAX_POINTS: usize = u32::MAX as usize;

/// Interleaved positions (`xyz` per point) and colors (`rgba` per point).
///
/// Buffers are reference counted so the engine and its background builds can
/// read them without copying. A new point set means a full index rebuild.
#[derive(Clone, Debug)]
pub struct PointSet {
  positions: Arc<[f32]>,
  colors: Arc<[u8]>,
  len: usize,
}

impl PointSet {
  /// Wrap position and color buffers.
  ///
  /// `positions.len()` must be `3 * N` and `colors.len()` must be `4 * N`.
  pub fn new(
    positions: impl Into<Arc<[f32]>>,
    colors: impl Into<Arc<[u8]>>,
  ) -> Result<Self, IndexError> {
    let positions = positions.into();
    let colors = colors.into();
    if positions.len() % 3 != 0 || colors.len() % 4 != 0 || positions.len() / 3 != colors.len() / 4 {
      return Err(IndexError::MismatchedBuffers {
        positions: positions.len(),
        colors: colors.len(),
      });
    }
    let len = check_point_count(positions.len() / 3)?;
    Ok(Self {
      positions,
      colors,
      len,
    })
  }

  /// Wrap positions only; every point gets opaque white.
  pub fn from_positions(positions: impl Into<Arc<[f32]>>) -> Result<Self, IndexError> {
    let positions = positions.into();
    let colors = vec![255u8; positions.len() / 3 * 4];
    Self::new(positions, colors)
  }

  /// Number of points.
  #[inline]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Position of point `i`.
  #[inline]
  pub fn position(&self, i: usize) -> Vec3 {
    Vec3::from_slice(&self.positions[i * 3..i * 3 + 3])
  }

  /// RGBA color of point `i`.
  #[inline]
  pub fn color(&self, i: usize) -> [u8; 4] {
    let c = &self.colors[i * 4..i * 4 + 4];
    [c[0], c[1], c[2], c[3]]
  }

  /// Raw position buffer (`3 * len` floats).
  pub fn positions(&self) -> &Arc<[f32]> {
    &self.positions
  }

  /// Raw color buffer (`4 * len` bytes).
  pub fn colors(&self) -> &Arc<[u8]> {
    &self.colors
  }

  /// Copy positions and colors for `indices`, in order.
  pub fn gather(&self, indices: &[u32]) -> (Vec<f32>, Vec<u8>) {
    let mut positions = Vec::with_capacity(indices.len() * 3);
    let mut colors = Vec::with_capacity(indices.len() * 4);
    for &i in indices {
      let i = i as usize;
      positions.extend_from_slice(&self.positions[i * 3..i * 3 + 3]);
      colors.extend_from_slice(&self.colors[i * 4..i * 4 + 4]);
    }
    (positions, colors)
  }
}

fn check_point_count(count: usize) -> Result<usize, IndexError> {
  if count > MAX_POINTS {
    return Err(IndexError::TooManyPoints {
      count,
      max: MAX_POINTS,
    });
  }
  Ok(count)
}
