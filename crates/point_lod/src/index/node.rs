//! SpatialIndexNode - one node of the partition tree.
//!
//! Nodes live in an arena owned by [`SpatialIndex`](super::SpatialIndex) and
//! reference their children by [`NodeId`]. Leaf vs internal is an explicit
//! tag; every traversal matches on it.

use glam::Vec3;
use smallvec::SmallVec;

use crate::Bounds;

/// Index of a node in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
  /// Arena slot.
  #[inline]
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

/// Child slots of an internal node. Empty octants are `None`.
pub type ChildSlots = SmallVec<[Option<NodeId>; 8]>;

/// Payload stored at a leaf.
#[derive(Clone, Debug, Default)]
pub struct LeafData {
  /// Original point indices owned by this leaf.
  pub indices: Vec<u32>,
  /// For each LOD level, the level-local vertex indices owned by this leaf.
  ///
  /// Filled once the LOD table exists; concatenating the entries of the
  /// visible leaves yields the draw list for that level.
  pub lod_indices: Vec<Vec<u32>>,
}

/// Leaf vs internal node.
#[derive(Clone, Debug)]
pub enum NodeKind {
  Leaf(LeafData),
  Internal { children: ChildSlots },
}

/// Node of the spatial partition tree.
#[derive(Clone, Debug)]
pub struct SpatialIndexNode {
  /// Region covered by this node.
  pub bounds: Bounds,
  /// Depth in the tree (0 = root).
  pub depth: u32,
  /// Mean position of the points below this node.
  pub centroid: Vec3,
  /// Mean RGB color, each channel in 0..=1.
  pub avg_color: Vec3,
  /// Mean alpha in 0..=1.
  pub avg_alpha: f32,
  /// Number of points below this node.
  pub point_count: u32,
  /// Position of this node's first descendant leaf in the index's leaf list.
  ///
  /// Leaves are listed in depth-first order, so a subtree's leaves occupy
  /// `first_leaf..first_leaf + leaf_count`.
  pub first_leaf: u32,
  pub leaf_count: u32,
  pub kind: NodeKind,
}

impl SpatialIndexNode {
  #[inline]
  pub fn is_leaf(&self) -> bool {
    matches!(self.kind, NodeKind::Leaf(_))
  }

  /// Leaf payload, if this is a leaf.
  #[inline]
  pub fn leaf(&self) -> Option<&LeafData> {
    match &self.kind {
      NodeKind::Leaf(data) => Some(data),
      NodeKind::Internal { .. } => None,
    }
  }

  /// Range of this subtree's leaves in the index's leaf list.
  #[inline]
  pub fn leaf_range(&self) -> std::ops::Range<usize> {
    self.first_leaf as usize..(self.first_leaf + self.leaf_count) as usize
  }

  /// Occupied child ids (empty for a leaf).
  pub fn children(&self) -> impl Iterator<Item = NodeId> + '_ {
    let slots: &[Option<NodeId>] = match &self.kind {
      NodeKind::Leaf(_) => &[],
      NodeKind::Internal { children } => children,
    };
    slots.iter().flatten().copied()
  }
}
