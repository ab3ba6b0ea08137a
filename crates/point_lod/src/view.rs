//! Per-viewport render state.
//!
//! Every viewport keeps its own LOD hysteresis and its own two-tier cache:
//! the visible-leaf set (recomputed when the camera moves) and the
//! concatenated index list (rebuilt when the camera, the level or the point
//! filter changes). States are keyed by [`ViewId`] and never shared.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;

use crate::{CullCounters, DimensionLevel, IndexBuffer, NodeId};

// =============================================================================
// ViewId - stable viewport key
// =============================================================================

/// Atomic counter for generating unique ViewIds. Starts high so generated
/// ids stay clear of small caller-chosen ones.
static VIEW_ID_COUNTER: AtomicU64 = AtomicU64::new(1 << 32);

/// Viewport identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ViewId(u64);

impl ViewId {
  /// Generate a new unique ViewId.
  pub fn new() -> Self {
    Self(VIEW_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
  }

  /// Caller-chosen id, e.g. a window or canvas handle.
  pub const fn from_raw(raw: u64) -> Self {
    Self(raw)
  }

  pub fn raw(&self) -> u64 {
    self.0
  }
}

impl Default for ViewId {
  fn default() -> Self {
    Self::new()
  }
}

// =============================================================================
// ViewRenderState
// =============================================================================

/// What the cached index list of a view stands for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum CachedDraw {
  /// Nothing cached yet.
  #[default]
  Empty,
  /// Draw the whole level unculled.
  All,
  /// Draw `cached_visible_indices`.
  Subset,
  /// Nothing was visible; draw the full-detail level.
  NothingVisible,
}

/// Mutable state of one viewport.
#[derive(Debug, Default)]
pub struct ViewRenderState {
  /// Projection × view of the last culled frame, column-major copy.
  pub(crate) last_frustum_matrix: Option<[f32; 16]>,
  /// Level selected last frame; `None` until the first frame.
  pub(crate) last_lod_level: Option<usize>,
  pub(crate) last_dimension_level: Option<DimensionLevel>,

  /// Tier one: leaves visible through `last_frustum_matrix`.
  pub(crate) visible_leaves: Vec<NodeId>,
  pub(crate) last_counters: CullCounters,

  /// Tier two: level-local indices of `cached_level` owned by the visible leaves.
  pub(crate) cached_visible_indices: IndexBuffer,
  pub(crate) cached_level: Option<usize>,
  pub(crate) cached_draw: CachedDraw,
  /// Points of `cached_level` inside the visible leaves (before filtering).
  pub(crate) cached_culled_count: usize,

  pub(crate) filter_generation: u64,
  pub(crate) data_generation: u64,
  /// The empty-frustum warning fired and nothing has been visible since.
  pub(crate) warned_empty: bool,
}

impl ViewRenderState {
  pub fn new() -> Self {
    Self::default()
  }

  /// Fresh state reusing a recycled index buffer.
  pub fn with_buffer(buffer: IndexBuffer) -> Self {
    Self {
      cached_visible_indices: buffer,
      ..Self::default()
    }
  }

  /// Whether `proj_view` differs from the last culled matrix by more than
  /// `epsilon_sq` (sum of squared element differences).
  pub fn camera_changed(&self, proj_view: &Mat4, epsilon_sq: f32) -> bool {
    let Some(last) = &self.last_frustum_matrix else {
      return true;
    };
    let diff: f32 = last
      .iter()
      .zip(proj_view.to_cols_array())
      .map(|(a, b)| (a - b) * (a - b))
      .sum();
    diff > epsilon_sq
  }

  /// Drop every cached result, keeping the allocated index buffer.
  pub fn invalidate(&mut self) {
    self.last_frustum_matrix = None;
    self.last_lod_level = None;
    self.visible_leaves.clear();
    self.last_counters = CullCounters::default();
    self.cached_visible_indices.clear();
    self.cached_level = None;
    self.cached_draw = CachedDraw::Empty;
    self.cached_culled_count = 0;
  }

  pub fn last_lod_level(&self) -> Option<usize> {
    self.last_lod_level
  }

  pub fn last_dimension_level(&self) -> Option<DimensionLevel> {
    self.last_dimension_level
  }

  /// Leaves found visible the last time the camera moved.
  pub fn visible_leaves(&self) -> &[NodeId] {
    &self.visible_leaves
  }

  pub fn last_counters(&self) -> &CullCounters {
    &self.last_counters
  }

  pub fn cached_culled_count(&self) -> usize {
    self.cached_culled_count
  }

  pub fn filter_generation(&self) -> u64 {
    self.filter_generation
  }

  pub fn data_generation(&self) -> u64 {
    self.data_generation
  }

  /// Capacity of this view's index buffer.
  pub fn buffer_capacity(&self) -> usize {
    self.cached_visible_indices.capacity()
  }

  pub(crate) fn into_buffer(self) -> IndexBuffer {
    self.cached_visible_indices
  }
}

// =============================================================================
// ViewStates - keyed map
// =============================================================================

/// `ViewId → ViewRenderState` map. States are created lazily.
#[derive(Debug, Default)]
pub struct ViewStates {
  states: HashMap<ViewId, ViewRenderState>,
}

impl ViewStates {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get_or_create(&mut self, id: ViewId) -> &mut ViewRenderState {
    self.get_or_insert_with(id, ViewRenderState::new)
  }

  pub fn get_or_insert_with(
    &mut self,
    id: ViewId,
    create: impl FnOnce() -> ViewRenderState,
  ) -> &mut ViewRenderState {
    self.states.entry(id).or_insert_with(create)
  }

  pub fn get(&self, id: ViewId) -> Option<&ViewRenderState> {
    self.states.get(&id)
  }

  pub fn contains(&self, id: ViewId) -> bool {
    self.states.contains_key(&id)
  }

  pub fn remove(&mut self, id: ViewId) -> Option<ViewRenderState> {
    self.states.remove(&id)
  }

  /// Remove every state, yielding them for buffer recycling.
  pub fn drain(&mut self) -> impl Iterator<Item = (ViewId, ViewRenderState)> + '_ {
    self.states.drain()
  }

  pub fn clear(&mut self) {
    self.states.clear();
  }

  pub fn len(&self) -> usize {
    self.states.len()
  }

  pub fn is_empty(&self) -> bool {
    self.states.is_empty()
  }

  pub fn ids(&self) -> impl Iterator<Item = ViewId> + '_ {
    self.states.keys().copied()
  }
}

#[cfg(test)]
mod tests {
  use glam::Vec3;

  use super::*;

  #[test]
  fn test_view_ids_are_unique() {
    let a = ViewId::new();
    let b = ViewId::new();
    assert_ne!(a, b);
    assert_eq!(ViewId::from_raw(7).raw(), 7);
  }

  #[test]
  fn test_camera_changed() {
    let mut state = ViewRenderState::new();
    let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    assert!(state.camera_changed(&m, 1e-10));

    state.last_frustum_matrix = Some(m.to_cols_array());
    assert!(!state.camera_changed(&m, 1e-10));

    let nudged = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.001));
    assert!(state.camera_changed(&nudged, 1e-10));
    assert!(!state.camera_changed(&nudged, 1e-4));
  }

  #[test]
  fn test_invalidate_keeps_buffer() {
    let mut state = ViewRenderState::with_buffer(IndexBuffer::with_capacity(32));
    state.last_lod_level = Some(3);
    state.cached_level = Some(3);
    state.last_frustum_matrix = Some(Mat4::IDENTITY.to_cols_array());
    state.invalidate();

    assert_eq!(state.last_lod_level(), None);
    assert_eq!(state.cached_level, None);
    assert!(state.last_frustum_matrix.is_none());
    assert_eq!(state.buffer_capacity(), 32);
  }

  #[test]
  fn test_states_are_per_view() {
    let mut views = ViewStates::new();
    views.get_or_create(ViewId::from_raw(1)).last_lod_level = Some(2);
    views.get_or_create(ViewId::from_raw(2)).last_lod_level = Some(9);
    assert_eq!(views.len(), 2);
    assert_eq!(views.get(ViewId::from_raw(1)).and_then(|s| s.last_lod_level()), Some(2));

    // Existing state is returned, not replaced.
    assert_eq!(views.get_or_create(ViewId::from_raw(1)).last_lod_level(), Some(2));

    assert!(views.remove(ViewId::from_raw(1)).is_some());
    assert!(!views.contains(ViewId::from_raw(1)));
    views.clear();
    assert!(views.is_empty());
  }
}
