//! Axis-aligned bounding box for the index and its nodes.

use glam::Vec3;

use crate::{DimensionLevel, PointSet};

/// Axes whose extent is below this fraction of the largest one are "flat".
const FLAT_AXIS_FRACTION: f32 = 0.01;
/// Per-side padding for flat axes, as a fraction of the largest extent.
const FLAT_AXIS_PADDING: f32 = 0.25;
/// Per-side padding for regular axes, as a fraction of the largest extent.
const REGULAR_AXIS_PADDING: f32 = 0.001;
/// Per-side padding when every axis collapses to a point.
const POINT_PADDING: f32 = 0.5;

/// Single-precision axis-aligned bounding box.
///
/// Boxes produced by [`Bounds::from_points`] never have a zero-extent axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Minimum corner (inclusive).
	pub min: Vec3,
	/// Maximum corner (inclusive).
	pub max: Vec3,
}

impl Bounds {
	/// Create a new AABB from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: Vec3, max: Vec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"AABB min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Create a new AABB from center and half-extents.
	pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Tight box around every point, without padding.
	///
	/// Returns `None` for an empty set.
	pub fn tight(points: &PointSet) -> Option<Self> {
		if points.is_empty() {
			return None;
		}
		let mut min = Vec3::splat(f32::INFINITY);
		let mut max = Vec3::splat(f32::NEG_INFINITY);
		for i in 0..points.len() {
			let p = points.position(i);
			min = min.min(p);
			max = max.max(p);
		}
		Some(Self { min, max })
	}

	/// Padded box around every point.
	///
	/// Flat axes (extent under 1% of the largest) are padded by half the
	/// largest extent in total so 1-D and 2-D layouts still yield a volume
	/// that culls correctly. Returns `None` for an empty set.
	pub fn from_points(points: &PointSet) -> Option<Self> {
		Self::tight(points).map(|tight| tight.padded())
	}

	/// Apply the degenerate-axis padding rules to this box.
	pub fn padded(&self) -> Self {
		let extent = self.size();
		let max_extent = extent.max_element();
		if max_extent <= f32::EPSILON * self.min.abs().max(self.max.abs()).max_element().max(1.0) {
			let pad = Vec3::splat(POINT_PADDING);
			return Self {
				min: self.min - pad,
				max: self.max + pad,
			};
		}

		let pad = Vec3::from_array(extent.to_array().map(|e| {
			if e < max_extent * FLAT_AXIS_FRACTION {
				max_extent * FLAT_AXIS_PADDING
			} else {
				max_extent * REGULAR_AXIS_PADDING
			}
		}));
		Self {
			min: self.min - pad,
			max: self.max + pad,
		}
	}

	/// Check if this AABB contains a point.
	#[inline]
	pub fn contains(&self, point: Vec3) -> bool {
		point.cmpge(self.min).all() && point.cmple(self.max).all()
	}

	/// Get the size of the AABB (max - min).
	#[inline]
	pub fn size(&self) -> Vec3 {
		self.max - self.min
	}

	/// Get the center of the AABB.
	#[inline]
	pub fn center(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}

	/// Largest single-axis extent.
	#[inline]
	pub fn max_extent(&self) -> f32 {
		self.size().max_element()
	}

	/// Radius of the bounding sphere (half the diagonal).
	#[inline]
	pub fn radius(&self) -> f32 {
		self.size().length() * 0.5
	}

	/// Size of the data as seen along the active axes.
	///
	/// 1-D: the largest extent. 2-D: hypotenuse of the two largest extents.
	/// 3-D: the full diagonal.
	pub fn characteristic_size(&self, dimension: DimensionLevel) -> f32 {
		let mut extents = self.size().to_array();
		extents.sort_by(|a, b| b.total_cmp(a));
		match dimension {
			DimensionLevel::Linear => extents[0],
			DimensionLevel::Planar => extents[0].hypot(extents[1]),
			DimensionLevel::Volumetric => self.size().length(),
		}
	}

	/// Bounds of child `slot` when split at the midpoint of the active axes.
	///
	/// Bit `a` of `slot` selects the upper half along axis `a`. Inactive axes
	/// keep the parent's full range.
	pub fn child(&self, slot: usize, dimension: DimensionLevel) -> Self {
		let center = self.center();
		let mut min = self.min;
		let mut max = self.max;
		for axis in 0..dimension.axes() {
			if slot & (1 << axis) != 0 {
				min[axis] = center[axis];
			} else {
				max[axis] = center[axis];
			}
		}
		Self { min, max }
	}

	/// Squared distance from `point` to the closest point of the box.
	#[inline]
	pub fn distance_sq_to(&self, point: Vec3) -> f32 {
		point.clamp(self.min, self.max).distance_squared(point)
	}

	/// Whether a sphere touches the box.
	#[inline]
	pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
		self.distance_sq_to(center) <= radius * radius
	}

	/// Corner furthest along `normal`.
	#[inline]
	pub fn positive_vertex(&self, normal: Vec3) -> Vec3 {
		Vec3::select(normal.cmpge(Vec3::ZERO), self.max, self.min)
	}

	/// Corner furthest against `normal`.
	#[inline]
	pub fn negative_vertex(&self, normal: Vec3) -> Vec3 {
		Vec3::select(normal.cmpge(Vec3::ZERO), self.min, self.max)
	}

	/// Box scaled about the origin.
	pub fn scaled(&self, factor: f32) -> Self {
		let a = self.min * factor;
		let b = self.max * factor;
		Self {
			min: a.min(b),
			max: a.max(b),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cloud(positions: Vec<f32>) -> PointSet {
		PointSet::from_positions(positions).unwrap()
	}

	#[test]
	fn test_tight_bounds() {
		let points = cloud(vec![-1.0, 2.0, 0.0, 3.0, -2.0, 5.0]);
		let tight = Bounds::tight(&points).unwrap();
		assert_eq!(tight.min, Vec3::new(-1.0, -2.0, 0.0));
		assert_eq!(tight.max, Vec3::new(3.0, 2.0, 5.0));
	}

	#[test]
	fn test_empty_has_no_bounds() {
		let points = cloud(Vec::new());
		assert!(Bounds::from_points(&points).is_none());
	}

	#[test]
	fn test_flat_axis_gets_large_padding() {
		// All points on the z = 0 plane.
		let points = cloud(vec![0.0, 0.0, 0.0, 10.0, 0.0, 0.0, 0.0, 10.0, 0.0]);
		let bounds = Bounds::from_points(&points).unwrap();
		let size = bounds.size();
		assert!((size.z - 5.0).abs() < 1e-4, "flat axis should span half the max extent, got {}", size.z);
		assert!(size.x > 10.0 && size.x < 10.1);
		assert!(bounds.contains(Vec3::ZERO));
	}

	#[test]
	fn test_single_point_is_padded_on_every_axis() {
		let points = cloud(vec![4.0, 4.0, 4.0]);
		let bounds = Bounds::from_points(&points).unwrap();
		assert_eq!(bounds.size(), Vec3::ONE);
		assert_eq!(bounds.center(), Vec3::splat(4.0));
	}

	#[test]
	fn test_characteristic_size_uses_active_axes() {
		let bounds = Bounds::new(Vec3::ZERO, Vec3::new(3.0, 4.0, 12.0));
		assert_eq!(bounds.characteristic_size(DimensionLevel::Linear), 12.0);
		assert_eq!(bounds.characteristic_size(DimensionLevel::Planar), 12.0f32.hypot(4.0));
		assert_eq!(bounds.characteristic_size(DimensionLevel::Volumetric), 13.0);
	}

	#[test]
	fn test_child_splits_only_active_axes() {
		let bounds = Bounds::new(Vec3::ZERO, Vec3::splat(2.0));

		let quad = bounds.child(0b11, DimensionLevel::Planar);
		assert_eq!(quad.min, Vec3::new(1.0, 1.0, 0.0));
		assert_eq!(quad.max, Vec3::new(2.0, 2.0, 2.0));

		let oct = bounds.child(0b100, DimensionLevel::Volumetric);
		assert_eq!(oct.min, Vec3::new(0.0, 0.0, 1.0));
		assert_eq!(oct.max, Vec3::new(1.0, 1.0, 2.0));

		let bin = bounds.child(1, DimensionLevel::Linear);
		assert_eq!(bin.min, Vec3::new(1.0, 0.0, 0.0));
		assert_eq!(bin.max, Vec3::splat(2.0));
	}

	#[test]
	fn test_distance_and_sphere() {
		let bounds = Bounds::new(Vec3::ZERO, Vec3::ONE);
		assert_eq!(bounds.distance_sq_to(Vec3::splat(0.5)), 0.0);
		assert_eq!(bounds.distance_sq_to(Vec3::new(3.0, 0.5, 0.5)), 4.0);
		assert!(bounds.intersects_sphere(Vec3::new(3.0, 0.5, 0.5), 2.0));
		assert!(!bounds.intersects_sphere(Vec3::new(3.0, 0.5, 0.5), 1.9));
	}

	#[test]
	fn test_positive_negative_vertex() {
		let bounds = Bounds::new(Vec3::ZERO, Vec3::ONE);
		let normal = Vec3::new(1.0, -1.0, 0.5);
		assert_eq!(bounds.positive_vertex(normal), Vec3::new(1.0, 0.0, 1.0));
		assert_eq!(bounds.negative_vertex(normal), Vec3::new(0.0, 1.0, 0.0));
	}

	#[test]
	fn test_scaled() {
		let bounds = Bounds::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::new(1.0, 2.0, 3.0));
		let scaled = bounds.scaled(4.0);
		assert_eq!(scaled.min, Vec3::new(-4.0, 0.0, 4.0));
		assert_eq!(scaled.max, Vec3::new(4.0, 8.0, 12.0));
	}
}
