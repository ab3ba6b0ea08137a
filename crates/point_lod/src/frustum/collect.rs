//! Visible-leaf collection over the spatial index.

use super::{Containment, CullCounters, Frustum};
use crate::index::{NodeId, NodeKind, SpatialIndex};

impl SpatialIndex {
  /// Append every leaf that may be visible through `frustum` to `out`.
  ///
  /// Outside subtrees are pruned, inside subtrees contribute their whole
  /// contiguous leaf range without further tests, partial nodes recurse.
  /// Leaves are appended in depth-first order. `out` is not cleared.
  pub fn collect_visible(&self, frustum: &Frustum, out: &mut Vec<NodeId>) -> CullCounters {
    let mut counters = CullCounters::default();
    let mut stack = vec![self.root()];

    while let Some(id) = stack.pop() {
      let node = self.node(id);
      counters.nodes_tested += 1;
      match frustum.classify(&node.bounds) {
        Containment::Outside => counters.nodes_outside += 1,
        Containment::Inside => {
          counters.nodes_inside += 1;
          let range = node.leaf_range();
          counters.leaves_visible += range.len() as u32;
          counters.points_visible += node.point_count as u64;
          out.extend_from_slice(&self.leaves()[range]);
        }
        Containment::Partial => {
          counters.nodes_partial += 1;
          match &node.kind {
            NodeKind::Leaf(_) => {
              counters.leaves_visible += 1;
              counters.points_visible += node.point_count as u64;
              out.push(id);
            }
            // Reversed so the lowest slot is popped first.
            NodeKind::Internal { children } => stack.extend(children.iter().rev().flatten().copied()),
          }
        }
      }
    }
    counters
  }
}
