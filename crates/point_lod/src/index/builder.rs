//! Recursive midpoint partitioning of the point index array.

use glam::Vec3;
use smallvec::SmallVec;

use super::node::{ChildSlots, LeafData, NodeId, NodeKind, SpatialIndexNode};
use crate::{Bounds, DimensionLevel, IndexConfig, PointSet};

/// Output of [`partition`].
pub(super) struct Partition {
  pub nodes: Vec<SpatialIndexNode>,
  pub root: NodeId,
  pub leaves: Vec<NodeId>,
  pub max_depth_reached: u32,
}

/// Build the node arena for `points` inside `bounds`.
///
/// Nodes are appended in post-order, so children always precede their
/// parent and the root is the last node.
pub(super) fn partition(points: &PointSet, bounds: Bounds, config: &IndexConfig) -> Partition {
  let mut builder = TreeBuilder {
    points,
    dimension: config.dimension_level,
    max_points: config.max_points_per_node,
    max_depth: config.max_depth,
    nodes: Vec::new(),
    leaves: Vec::new(),
    max_depth_reached: 0,
  };
  // PointSet::new caps the count at MAX_POINTS, so indices fit in u32.
  let indices: Vec<u32> = (0..points.len() as u32).collect();
  let root = builder.build_node(bounds, indices, 0);
  Partition {
    nodes: builder.nodes,
    root,
    leaves: builder.leaves,
    max_depth_reached: builder.max_depth_reached,
  }
}

struct TreeBuilder<'a> {
  points: &'a PointSet,
  dimension: DimensionLevel,
  max_points: usize,
  max_depth: u32,
  nodes: Vec<SpatialIndexNode>,
  leaves: Vec<NodeId>,
  max_depth_reached: u32,
}

impl TreeBuilder<'_> {
  fn build_node(&mut self, bounds: Bounds, indices: Vec<u32>, depth: u32) -> NodeId {
    self.max_depth_reached = self.max_depth_reached.max(depth);

    if indices.len() <= self.max_points || depth >= self.max_depth {
      return self.push_leaf(bounds, indices, depth);
    }

    let first_leaf = self.leaves.len() as u32;
    let buckets = self.split(&bounds, indices);
    let mut children: ChildSlots = SmallVec::with_capacity(buckets.len());
    for (slot, bucket) in buckets.into_iter().enumerate() {
      if bucket.is_empty() {
        children.push(None);
        continue;
      }
      let child_bounds = bounds.child(slot, self.dimension);
      children.push(Some(self.build_node(child_bounds, bucket, depth + 1)));
    }
    let leaf_count = self.leaves.len() as u32 - first_leaf;
    self.push_internal(bounds, children, depth, first_leaf, leaf_count)
  }

  /// Bucket indices by which side of each active midpoint they fall on.
  fn split(&self, bounds: &Bounds, indices: Vec<u32>) -> SmallVec<[Vec<u32>; 8]> {
    let center = bounds.center();
    let axes = self.dimension.axes();
    let expected = indices.len() / self.dimension.child_count() + 1;
    let mut buckets: SmallVec<[Vec<u32>; 8]> = (0..self.dimension.child_count())
      .map(|_| Vec::with_capacity(expected))
      .collect();

    for i in indices {
      let p = self.points.position(i as usize);
      let mut slot = 0usize;
      for axis in 0..axes {
        if p[axis] >= center[axis] {
          slot |= 1 << axis;
        }
      }
      buckets[slot].push(i);
    }
    buckets
  }

  fn push_leaf(&mut self, bounds: Bounds, indices: Vec<u32>, depth: u32) -> NodeId {
    let mut position_sum = Vec3::ZERO;
    let mut color_sum = Vec3::ZERO;
    let mut alpha_sum = 0.0f32;
    for &i in &indices {
      position_sum += self.points.position(i as usize);
      let [r, g, b, a] = self.points.color(i as usize);
      color_sum += Vec3::new(r as f32, g as f32, b as f32);
      alpha_sum += a as f32;
    }

    let count = indices.len() as u32;
    let inv = if count > 0 { 1.0 / count as f32 } else { 0.0 };
    let first_leaf = self.leaves.len() as u32;
    let id = self.push(SpatialIndexNode {
      bounds,
      depth,
      centroid: if count > 0 { position_sum * inv } else { bounds.center() },
      avg_color: color_sum * inv / 255.0,
      avg_alpha: alpha_sum * inv / 255.0,
      point_count: count,
      first_leaf,
      leaf_count: 1,
      kind: NodeKind::Leaf(LeafData {
        indices,
        lod_indices: Vec::new(),
      }),
    });
    self.leaves.push(id);
    id
  }

  /// Aggregates are point-count-weighted means of the children's.
  fn push_internal(
    &mut self,
    bounds: Bounds,
    children: ChildSlots,
    depth: u32,
    first_leaf: u32,
    leaf_count: u32,
  ) -> NodeId {
    let mut count = 0u32;
    let mut centroid = Vec3::ZERO;
    let mut color = Vec3::ZERO;
    let mut alpha = 0.0f32;
    for child in children.iter().flatten() {
      let node = &self.nodes[child.index()];
      let weight = node.point_count as f32;
      count += node.point_count;
      centroid += node.centroid * weight;
      color += node.avg_color * weight;
      alpha += node.avg_alpha * weight;
    }

    let inv = if count > 0 { 1.0 / count as f32 } else { 0.0 };
    self.push(SpatialIndexNode {
      bounds,
      depth,
      centroid: centroid * inv,
      avg_color: color * inv,
      avg_alpha: alpha * inv,
      point_count: count,
      first_leaf,
      leaf_count,
      kind: NodeKind::Internal { children },
    })
  }

  fn push(&mut self, node: SpatialIndexNode) -> NodeId {
    let id = NodeId(self.nodes.len() as u32);
    self.nodes.push(node);
    id
  }
}
