//! View frustum planes and AABB classification.
//!
//! Planes are extracted from a projection × view matrix with the
//! Gribb/Hartmann row combinations (OpenGL clip space, `-w <= z <= w`):
//!
//! ```text
//! left   = row3 + row0      right = row3 - row0
//! bottom = row3 + row1      top   = row3 - row1
//! near   = row3 + row2      far   = row3 - row2
//! ```
//!
//! Every plane is normalized and its normal points into the frustum, so a
//! point is inside when `normal · p + d >= 0` for all six.

mod collect;

use glam::{Mat4, Vec3, Vec4};

use crate::Bounds;

/// A plane `normal · p + d = 0` with a unit normal facing the inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
	pub normal: Vec3,
	pub d: f32,
}

impl Plane {
	/// Normalize a raw `(a, b, c, d)` row combination.
	///
	/// A zero normal (degenerate matrix) is kept as is; such a plane then only
	/// rejects when `d < 0`.
	fn from_row(row: Vec4) -> Self {
		let normal = row.truncate();
		let length = normal.length();
		if length > f32::EPSILON {
			Self {
				normal: normal / length,
				d: row.w / length,
			}
		} else {
			Self { normal, d: row.w }
		}
	}

	/// Signed distance; positive on the inside.
	#[inline]
	pub fn distance(&self, point: Vec3) -> f32 {
		self.normal.dot(point) + self.d
	}
}

/// Classification of a box against a frustum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Containment {
	/// Entirely behind at least one plane.
	Outside,
	/// Entirely in front of every plane.
	Inside,
	/// Straddles at least one plane.
	Partial,
}

/// Per-call culling statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CullCounters {
	pub nodes_tested: u32,
	pub nodes_inside: u32,
	pub nodes_partial: u32,
	pub nodes_outside: u32,
	/// Leaves appended to the output.
	pub leaves_visible: u32,
	/// Original points held by those leaves.
	pub points_visible: u64,
}

/// Six view planes: left, right, bottom, top, near, far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frustum {
	pub planes: [Plane; 6],
}

impl Frustum {
	/// Planes of `proj_view` without margin.
	pub fn from_matrix(proj_view: &Mat4) -> Self {
		Self::from_matrix_with_margin(proj_view, 0.0)
	}

	/// Planes of `proj_view`, each pushed outward by `margin` world units.
	pub fn from_matrix_with_margin(proj_view: &Mat4, margin: f32) -> Self {
		let r0 = proj_view.row(0);
		let r1 = proj_view.row(1);
		let r2 = proj_view.row(2);
		let r3 = proj_view.row(3);

		let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r3 + r2, r3 - r2].map(|row| {
			let mut plane = Plane::from_row(row);
			plane.d += margin;
			plane
		});
		Self { planes }
	}

	/// Classify an AABB with the p-vertex / n-vertex test.
	pub fn classify(&self, bounds: &Bounds) -> Containment {
		let mut straddles = false;
		for plane in &self.planes {
			if plane.distance(bounds.positive_vertex(plane.normal)) < 0.0 {
				return Containment::Outside;
			}
			if plane.distance(bounds.negative_vertex(plane.normal)) < 0.0 {
				straddles = true;
			}
		}
		if straddles {
			Containment::Partial
		} else {
			Containment::Inside
		}
	}

	#[inline]
	pub fn contains_point(&self, point: Vec3) -> bool {
		self.planes.iter().all(|plane| plane.distance(point) >= 0.0)
	}

	/// Conservative: may report `true` for spheres just outside a corner.
	#[inline]
	pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
		self.planes.iter().all(|plane| plane.distance(center) >= -radius)
	}

	/// Whether the whole sphere lies inside every plane.
	#[inline]
	pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
		self.planes.iter().all(|plane| plane.distance(center) >= radius)
	}
}
