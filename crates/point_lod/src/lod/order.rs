//! Hierarchical point ordering via bit-reversed Morton codes.
//!
//! Every prefix of the ordering is a spatially well-spread sample, and a
//! longer prefix contains every shorter one. LOD levels are prefixes of this
//! single permutation, which is what makes them subset-monotone.

use crate::{Bounds, DimensionLevel, PointSet};

/// Quantization bits per active axis.
pub const MORTON_BITS: u32 = 10;

const GRID_MAX: u32 = (1 << MORTON_BITS) - 1;

/// Quantize `position` to the `MORTON_BITS` grid spanning `bounds`.
///
/// Inactive axes quantize to zero.
#[inline]
pub fn quantize(position: glam::Vec3, bounds: &Bounds, dimension: DimensionLevel) -> [u32; 3] {
  let normalized = (position - bounds.min) / bounds.size();
  let mut cell = [0u32; 3];
  for (axis, c) in cell.iter_mut().enumerate().take(dimension.axes()) {
    let t = normalized[axis].clamp(0.0, 1.0);
    *c = ((t * GRID_MAX as f32) as u32).min(GRID_MAX);
  }
  cell
}

/// Interleave the bits of the active axes, X in the lowest position.
#[inline]
pub fn morton_code(cell: [u32; 3], dimension: DimensionLevel) -> u32 {
  let axes = dimension.axes() as u32;
  let mut code = 0u32;
  for bit in 0..MORTON_BITS {
    for axis in 0..axes {
      code |= ((cell[axis as usize] >> bit) & 1) << (bit * axes + axis);
    }
  }
  code
}

/// Reverse a Morton code within its `MORTON_BITS * axes` bit width.
///
/// The coarsest spatial split becomes the fastest-varying bit, so consecutive
/// keys jump between distant cells.
#[inline]
pub fn reverse_code(code: u32, dimension: DimensionLevel) -> u32 {
  let width = MORTON_BITS * dimension.axes() as u32;
  code.reverse_bits() >> (32 - width)
}

/// Sort every point index by its reversed Morton key.
///
/// Ties (points in the same grid cell) keep ascending index order, so the
/// result is deterministic.
pub fn hierarchical_order(points: &PointSet, bounds: &Bounds, dimension: DimensionLevel) -> Vec<u32> {
  let mut keyed: Vec<(u32, u32)> = (0..points.len())
    .map(|i| {
      let cell = quantize(points.position(i), bounds, dimension);
      (reverse_code(morton_code(cell, dimension), dimension), i as u32)
    })
    .collect();
  keyed.sort_unstable();
  keyed.into_iter().map(|(_, i)| i).collect()
}
