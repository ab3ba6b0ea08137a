//! Spatial index over a point set.
//!
//! The index owns the partition tree, the padded bounds and the LOD table of
//! one [`PointSet`]. It is built once, synchronously, and is read-only
//! afterwards; new data or a new dimension level means a new index.
//!
//! # Build phases
//!
//! ```text
//! bounds      padded AABB of every point
//! partition   midpoint split while count > max_points_per_node && depth < max_depth
//! validate    Σ leaf indices == N                      (fatal on mismatch)
//! order       bit-reversed Morton sort of all points
//! lod table   prefixes of the order, coarsest first
//! leaf maps   per leaf, per level: level-local indices owned by the leaf
//! ```
//!
//! # Module Structure
//!
//! - [`node`]: `SpatialIndexNode` and the leaf/internal tag
//! - `builder`: recursive partitioning and bottom-up aggregates
//! - `query`: radius queries for picking and collision collaborators

mod builder;
pub mod node;
mod query;

use tracing::debug;
use web_time::Instant;

pub use node::{ChildSlots, LeafData, NodeId, NodeKind, SpatialIndexNode};
pub use query::RadiusHit;

use crate::lod::{self, LodTable};
use crate::{Bounds, DimensionLevel, IndexConfig, IndexError, LodSelectConfig, PointSet};

/// Result of a successful conservation check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointCountReport {
  /// Number of leaves visited.
  pub leaf_count: usize,
  /// Sum of leaf index counts (equals the input point count).
  pub count: usize,
}

/// Timings of the last build, in microseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildTimings {
  pub partition_us: u64,
  pub order_us: u64,
  pub lod_us: u64,
  pub leaf_map_us: u64,
}

impl BuildTimings {
  #[inline]
  pub fn total_us(&self) -> u64 {
    self.partition_us + self.order_us + self.lod_us + self.leaf_map_us
  }
}

/// Partition tree, bounds and LOD table for one point set.
#[derive(Clone, Debug)]
pub struct SpatialIndex {
  points: PointSet,
  config: IndexConfig,
  bounds: Bounds,
  nodes: Vec<SpatialIndexNode>,
  root: NodeId,
  leaves: Vec<NodeId>,
  lod: LodTable,
  max_depth_reached: u32,
  timings: BuildTimings,
}

impl SpatialIndex {
  /// Build the tree, validate it, and generate the LOD table.
  ///
  /// A cloud no larger than `max_points_per_node` yields a single leaf.
  /// Returns [`IndexError::PointCountMismatch`] if the partition lost or
  /// duplicated points; such an index is never returned.
  #[tracing::instrument(skip_all, name = "index::build", fields(points = points.len()))]
  pub fn build(points: PointSet, config: IndexConfig) -> Result<Self, IndexError> {
    config.validate()?;
    let bounds = Bounds::from_points(&points).ok_or(IndexError::EmptyPointSet)?;
    let mut timings = BuildTimings::default();

    let partition = {
      let _span = tracing::info_span!("partition").entered();
      let start = Instant::now();
      let partition = builder::partition(&points, bounds, &config);
      timings.partition_us = start.elapsed().as_micros() as u64;
      partition
    };

    let mut index = Self {
      points,
      config,
      bounds,
      nodes: partition.nodes,
      root: partition.root,
      leaves: partition.leaves,
      lod: LodTable::default(),
      max_depth_reached: partition.max_depth_reached,
      timings,
    };
    index.validate_point_count()?;

    let order = {
      let _span = tracing::info_span!("hierarchical_order").entered();
      let start = Instant::now();
      let order = lod::hierarchical_order(&index.points, &index.bounds, config.dimension_level);
      index.timings.order_us = start.elapsed().as_micros() as u64;
      order
    };

    {
      let _span = tracing::info_span!("lod_table").entered();
      let start = Instant::now();
      index.lod = LodTable::generate(&index.points, &order, config.min_lod_points);
      index.timings.lod_us = start.elapsed().as_micros() as u64;
    }

    {
      let _span = tracing::info_span!("leaf_lod_maps").entered();
      let start = Instant::now();
      index.assign_leaf_lod_indices();
      index.timings.leaf_map_us = start.elapsed().as_micros() as u64;
    }

    debug!(
      points = index.points.len(),
      nodes = index.nodes.len(),
      leaves = index.leaves.len(),
      depth = index.max_depth_reached,
      levels = index.lod.len(),
      total_us = index.timings.total_us(),
      "spatial index built"
    );
    Ok(index)
  }

  /// Walk every leaf reachable from the root and check that together they
  /// hold exactly the input point count.
  pub fn validate_point_count(&self) -> Result<PointCountReport, IndexError> {
    let mut report = PointCountReport {
      leaf_count: 0,
      count: 0,
    };
    let mut stack = vec![self.root];
    while let Some(id) = stack.pop() {
      match &self.nodes[id.index()].kind {
        NodeKind::Leaf(leaf) => {
          report.leaf_count += 1;
          report.count += leaf.indices.len();
        }
        NodeKind::Internal { children } => stack.extend(children.iter().flatten().copied()),
      }
    }

    if report.count != self.points.len() {
      return Err(IndexError::PointCountMismatch {
        expected: self.points.len(),
        found: report.count,
      });
    }
    Ok(report)
  }

  /// For every leaf and level, record the level-local indices the leaf owns.
  ///
  /// One reverse map is alive at a time.
  fn assign_leaf_lod_indices(&mut self) {
    let level_count = self.lod.len();
    for &leaf_id in &self.leaves {
      if let NodeKind::Leaf(leaf) = &mut self.nodes[leaf_id.index()].kind {
        leaf.lod_indices = Vec::with_capacity(level_count);
      }
    }

    for level in 0..level_count {
      let map = self.lod.reverse_map(level);
      for &leaf_id in &self.leaves {
        let NodeKind::Leaf(leaf) = &mut self.nodes[leaf_id.index()].kind else {
          continue;
        };
        let local = match &map {
          Some(map) => leaf
            .indices
            .iter()
            .map(|&i| map[i as usize])
            .filter(|&local| local != u32::MAX)
            .collect(),
          None => leaf.indices.clone(),
        };
        leaf.lod_indices.push(local);
      }
    }
  }

  /// Select the LOD level for a camera.
  ///
  /// `override_bounds` replaces the index bounds when the positions on screen
  /// are a derived projection of the indexed ones.
  pub fn select_level(
    &self,
    distance: f32,
    viewport_height: f32,
    previous: Option<usize>,
    dimension: DimensionLevel,
    override_bounds: Option<&Bounds>,
    config: &LodSelectConfig,
  ) -> usize {
    let bounds = override_bounds.unwrap_or(&self.bounds);
    lod::select_level(
      distance,
      viewport_height,
      previous,
      self.lod.len(),
      bounds.characteristic_size(dimension),
      config,
    )
  }

  // ---------------------------------------------------------------------------
  // Accessors
  // ---------------------------------------------------------------------------

  pub fn points(&self) -> &PointSet {
    &self.points
  }

  pub fn config(&self) -> &IndexConfig {
    &self.config
  }

  #[inline]
  pub fn dimension_level(&self) -> DimensionLevel {
    self.config.dimension_level
  }

  #[inline]
  pub fn bounds(&self) -> &Bounds {
    &self.bounds
  }

  #[inline]
  pub fn point_count(&self) -> usize {
    self.points.len()
  }

  #[inline]
  pub fn root(&self) -> NodeId {
    self.root
  }

  #[inline]
  pub fn node(&self, id: NodeId) -> &SpatialIndexNode {
    &self.nodes[id.index()]
  }

  pub fn nodes(&self) -> &[SpatialIndexNode] {
    &self.nodes
  }

  /// Leaf ids in depth-first order.
  pub fn leaves(&self) -> &[NodeId] {
    &self.leaves
  }

  #[inline]
  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  #[inline]
  pub fn leaf_count(&self) -> usize {
    self.leaves.len()
  }

  #[inline]
  pub fn max_depth_reached(&self) -> u32 {
    self.max_depth_reached
  }

  pub fn lod_table(&self) -> &LodTable {
    &self.lod
  }

  pub fn timings(&self) -> &BuildTimings {
    &self.timings
  }

  /// Level-local indices owned by `leaf` at `level` (empty if out of range).
  pub fn leaf_lod_indices(&self, leaf: NodeId, level: usize) -> &[u32] {
    self.nodes[leaf.index()]
      .leaf()
      .and_then(|data| data.lod_indices.get(level))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod index_test;
