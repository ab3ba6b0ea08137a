//! Shared fixtures for unit tests: seeded synthetic clouds and cameras.

use glam::{Mat4, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::PointSet;

fn random_colors(rng: &mut StdRng, n: usize) -> Vec<u8> {
  (0..n * 4).map(|_| rng.random::<u8>()).collect()
}

/// `n` uniform points in the unit cube.
pub fn random_cube(n: usize, seed: u64) -> PointSet {
  scaled_cube(n, seed, 1.0)
}

/// `n` uniform points in `[0, scale]^3`. Same seed, same points up to scale.
pub fn scaled_cube(n: usize, seed: u64, scale: f32) -> PointSet {
  let mut rng = StdRng::seed_from_u64(seed);
  let positions: Vec<f32> = (0..n * 3).map(|_| rng.random::<f32>() * scale).collect();
  let colors = random_colors(&mut rng, n);
  PointSet::new(positions, colors).unwrap()
}

/// `n` uniform points on the `z = z_value` plane, unit square in X/Y.
pub fn random_plane(n: usize, seed: u64, z_value: f32) -> PointSet {
  let mut rng = StdRng::seed_from_u64(seed);
  let mut positions = Vec::with_capacity(n * 3);
  for _ in 0..n {
    positions.push(rng.random::<f32>());
    positions.push(rng.random::<f32>());
    positions.push(z_value);
  }
  let colors = random_colors(&mut rng, n);
  PointSet::new(positions, colors).unwrap()
}

/// `n` uniform points along the X axis in `[0, 1]`.
pub fn random_line(n: usize, seed: u64) -> PointSet {
  let mut rng = StdRng::seed_from_u64(seed);
  let mut positions = Vec::with_capacity(n * 3);
  for _ in 0..n {
    positions.push(rng.random::<f32>());
    positions.push(0.0);
    positions.push(0.0);
  }
  let colors = random_colors(&mut rng, n);
  PointSet::new(positions, colors).unwrap()
}

/// OpenGL-convention projection × view for a camera at `eye` looking at `target`.
pub fn camera(eye: Vec3, target: Vec3, fov_y_degrees: f32, near: f32, far: f32) -> Mat4 {
  let projection = Mat4::perspective_rh_gl(fov_y_degrees.to_radians(), 1.0, near, far);
  let view = Mat4::look_at_rh(eye, target, Vec3::Y);
  projection * view
}
