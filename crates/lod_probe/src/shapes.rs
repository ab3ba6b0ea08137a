//! Synthetic point cloud generation.

use anyhow::{Context, Result};
use glam::Vec3;
use point_lod::PointSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::scenario::Shape;

/// Generate `count` points of `shape` spanning `extent` world units.
///
/// Colors are a position gradient so screenshots of the cloud stay readable.
pub fn generate(shape: Shape, count: usize, extent: f32, seed: u64) -> Result<PointSet> {
	let mut rng = StdRng::seed_from_u64(seed);
	let mut positions = Vec::with_capacity(count * 3);
	let mut colors = Vec::with_capacity(count * 4);

	for _ in 0..count {
		let p = match shape {
			Shape::Cube => Vec3::new(rng.random(), rng.random(), rng.random()),
			Shape::Plane => Vec3::new(rng.random(), rng.random(), 0.0),
			Shape::Line => Vec3::new(rng.random(), 0.0, 0.0),
			Shape::Sphere => unit_sphere_point(&mut rng) * 0.5 + Vec3::splat(0.5),
		};
		positions.extend_from_slice(&(p * extent).to_array());
		let c = (p.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).to_array();
		colors.extend_from_slice(&[c[0] as u8, c[1] as u8, c[2] as u8, 255]);
	}

	PointSet::new(positions, colors).context("Generated buffers do not describe a point set")
}

/// Uniform direction by rejection sampling the unit ball.
fn unit_sphere_point(rng: &mut StdRng) -> Vec3 {
	loop {
		let v = Vec3::new(
			rng.random_range(-1.0..=1.0),
			rng.random_range(-1.0..=1.0),
			rng.random_range(-1.0..=1.0),
		);
		let length_sq = v.length_squared();
		if length_sq > 1e-6 && length_sq <= 1.0 {
			return v / length_sq.sqrt();
		}
	}
}
