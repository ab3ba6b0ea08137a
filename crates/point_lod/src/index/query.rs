//! Radius queries for picking and collision collaborators.
//!
//! Not part of the per-frame render path and uncached.

use glam::Vec3;

use super::{NodeKind, SpatialIndex};

/// A point found by [`SpatialIndex::query_radius`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusHit {
  /// Original point index.
  pub index: u32,
  pub position: Vec3,
}

impl SpatialIndex {
  /// Points within `radius` of `center`, at most `max_results` of them.
  ///
  /// Stack-based descent; subtrees whose box does not touch the query sphere
  /// are skipped. Result order follows the traversal, not the distance.
  pub fn query_radius(&self, center: Vec3, radius: f32, max_results: usize) -> Vec<RadiusHit> {
    let mut hits = Vec::new();
    if max_results == 0 || !(radius >= 0.0) {
      return hits;
    }
    let radius_sq = radius * radius;

    let mut stack = vec![self.root()];
    while let Some(id) = stack.pop() {
      let node = self.node(id);
      if !node.bounds.intersects_sphere(center, radius) {
        continue;
      }
      match &node.kind {
        NodeKind::Internal { children } => stack.extend(children.iter().flatten().copied()),
        NodeKind::Leaf(leaf) => {
          for &index in &leaf.indices {
            let position = self.points().position(index as usize);
            if position.distance_squared(center) <= radius_sq {
              hits.push(RadiusHit { index, position });
              if hits.len() >= max_results {
                return hits;
              }
            }
          }
        }
      }
    }
    hits
  }
}
