//! Per-frame facade: LOD selection, culling and index list caching for every
//! viewport of one point cloud.
//!
//! # Frame pipeline
//!
//! ```text
//! FrameRequest
//!   │
//!   ├─ dimension / data generation check      mismatch → reset view
//!   ├─ select_level (per-view hysteresis)
//!   ├─ camera moved?  → collect_visible        tier 1: visible leaves
//!   ├─ camera, level or filter changed?
//!   │     → concatenate leaf lod_indices        tier 2: index list
//!   └─ FrameOutput { level, draw: All | Subset(&[u32]), ... }
//! ```
//!
//! Per-frame work is O(visible nodes); nothing here touches the tree except
//! through read-only traversal.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use tracing::{debug, warn};
use web_time::Instant;

use crate::metrics::EngineMetrics;
use crate::view::CachedDraw;
use crate::{
  Bounds, BufferPool, DimensionLevel, EngineConfig, Frustum, IndexError, LodTable, PointSet, RadiusHit,
  SpatialIndex, ViewId, ViewRenderState, ViewStates,
};

/// Inputs for one view and one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameRequest {
  pub view_id: ViewId,
  /// Camera distance to the data, in world units.
  pub camera_distance: f32,
  /// Viewport height in pixels. Zero or negative means "not visible".
  pub viewport_height: f32,
  pub proj_view: Mat4,
  /// Dimension level the caller renders at; `None` means the index's own.
  pub dimension_level: Option<DimensionLevel>,
  /// Bounds of the positions actually shown, when they are a derived
  /// projection of the indexed ones.
  pub override_bounds: Option<Bounds>,
}

impl FrameRequest {
  pub fn new(view_id: ViewId, camera_distance: f32, viewport_height: f32, proj_view: Mat4) -> Self {
    Self {
      view_id,
      camera_distance,
      viewport_height,
      proj_view,
      dimension_level: None,
      override_bounds: None,
    }
  }

  pub fn with_dimension_level(mut self, dimension_level: DimensionLevel) -> Self {
    self.dimension_level = Some(dimension_level);
    self
  }

  pub fn with_override_bounds(mut self, bounds: Bounds) -> Self {
    self.override_bounds = Some(bounds);
    self
  }
}

/// Points to draw for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawSet<'a> {
  /// Every vertex of the selected level.
  All,
  /// Level-local vertex indices of the selected level.
  Subset(&'a [u32]),
}

impl DrawSet<'_> {
  /// Number of indices drawn, given the level's vertex count.
  pub fn len(&self, level_points: usize) -> usize {
    match self {
      DrawSet::All => level_points,
      DrawSet::Subset(indices) => indices.len(),
    }
  }
}

/// Why a frame was answered with an unculled full-detail draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fallback {
  /// The frustum contained no node.
  NothingVisible,
  /// The request's dimension level does not match the index.
  DimensionMismatch,
}

/// Result of [`LodEngine::prepare_frame`].
#[derive(Clone, Copy, Debug)]
pub struct FrameOutput<'a> {
  /// LOD level whose vertex buffers `draw` indexes into.
  pub level: usize,
  /// Point size compensation for `level`.
  pub size_multiplier: f32,
  pub draw: DrawSet<'a>,
  /// Points drawn this frame.
  pub visible_points: usize,
  /// Total points of `level`.
  pub level_points: usize,
  /// Fraction of `level` inside the visible leaves.
  pub visible_ratio: f32,
  /// Leaves found visible.
  pub visible_nodes: usize,
  pub fallback: Option<Fallback>,
  /// The frustum was re-traversed this frame.
  pub leaves_recomputed: bool,
  /// The index list was rebuilt this frame.
  pub indices_rebuilt: bool,
  /// The view's index buffer was reallocated; device mirrors must be recreated.
  pub buffer_reallocated: bool,
}

/// Spatial index plus per-view state for one point cloud.
pub struct LodEngine {
  index: SpatialIndex,
  config: EngineConfig,
  views: ViewStates,
  pool: BufferPool,
  /// Per original point: drawable or not.
  filter: Option<Arc<[bool]>>,
  filter_generation: u64,
  data_generation: u64,
  metrics: EngineMetrics,
}

impl LodEngine {
  /// Build the index over `points` and wrap it.
  pub fn build(points: PointSet, config: EngineConfig) -> Result<Self, IndexError> {
    let index = SpatialIndex::build(points, config.index)?;
    Ok(Self::from_index(index, config))
  }

  /// Wrap an index built elsewhere, e.g. by [`AsyncIndexBuild`](crate::AsyncIndexBuild).
  ///
  /// `config.index` is replaced by the index's own configuration.
  pub fn from_index(index: SpatialIndex, config: EngineConfig) -> Self {
    let mut engine = Self {
      config: EngineConfig {
        index: *index.config(),
        ..config
      },
      index,
      views: ViewStates::new(),
      pool: BufferPool::new(),
      filter: None,
      filter_generation: 0,
      data_generation: 0,
      metrics: EngineMetrics::new(),
    };
    engine.metrics.record_build(engine.index.timings(), engine.index.lod_table());
    engine
  }

  /// Replace the index. Every view recomputes on its next frame.
  ///
  /// A filter whose length no longer matches is dropped.
  pub fn set_index(&mut self, index: SpatialIndex) {
    self.config.index = *index.config();
    self.index = index;
    self.data_generation += 1;
    if self.filter.as_ref().is_some_and(|f| f.len() != self.index.point_count()) {
      self.filter = None;
      self.filter_generation += 1;
    }
    self.metrics.record_build(self.index.timings(), self.index.lod_table());
    debug!(
      generation = self.data_generation,
      points = self.index.point_count(),
      "index replaced"
    );
  }

  /// Restrict drawing to points whose entry is `true`.
  pub fn set_point_filter(&mut self, drawable: impl Into<Arc<[bool]>>) -> Result<(), IndexError> {
    let drawable = drawable.into();
    if drawable.len() != self.index.point_count() {
      return Err(IndexError::FilterLength {
        expected: self.index.point_count(),
        found: drawable.len(),
      });
    }
    self.filter = Some(drawable);
    self.filter_generation += 1;
    Ok(())
  }

  pub fn clear_point_filter(&mut self) {
    if self.filter.take().is_some() {
      self.filter_generation += 1;
    }
  }

  /// Select, cull and assemble the draw for one view.
  pub fn prepare_frame(&mut self, request: &FrameRequest) -> FrameOutput<'_> {
    let Self {
      index,
      config,
      views,
      pool,
      filter,
      filter_generation,
      data_generation,
      metrics,
    } = self;
    let index: &SpatialIndex = index;
    let config: &EngineConfig = config;
    let table = index.lod_table();
    let dimension = request.dimension_level.unwrap_or(index.dimension_level());

    let state = views.get_or_insert_with(request.view_id, || ViewRenderState::with_buffer(pool.acquire(0)));

    if dimension != index.dimension_level() {
      if state.last_dimension_level != Some(dimension) {
        debug!(
          view = request.view_id.raw(),
          requested = ?dimension,
          indexed = ?index.dimension_level(),
          "dimension level mismatch, drawing full detail until rebuilt"
        );
      }
      state.invalidate();
      state.last_dimension_level = Some(dimension);
      return full_detail(table, Fallback::DimensionMismatch);
    }

    if state.data_generation != *data_generation || state.last_dimension_level != Some(dimension) {
      state.invalidate();
      state.data_generation = *data_generation;
      state.last_dimension_level = Some(dimension);
    }

    // LOD level with this view's hysteresis.
    let level = index.select_level(
      request.camera_distance,
      request.viewport_height,
      state.last_lod_level,
      dimension,
      request.override_bounds.as_ref(),
      &config.select,
    );
    state.last_lod_level = Some(level);

    // Tier 1: visible leaves.
    let camera_changed = state.camera_changed(&request.proj_view, config.cull.camera_epsilon_sq);
    if camera_changed {
      let margin = config.cull.plane_margin_fraction * index.bounds().radius();
      let frustum = Frustum::from_matrix_with_margin(&request.proj_view, margin);
      let start = Instant::now();
      state.visible_leaves.clear();
      state.last_counters = index.collect_visible(&frustum, &mut state.visible_leaves);
      metrics.record_cull_timing(start.elapsed().as_micros() as u64);
      state.last_frustum_matrix = Some(request.proj_view.to_cols_array());
    }
    metrics.record_leaf_cache(!camera_changed);

    // Tier 2: index list for the selected level.
    let rebuild = camera_changed || state.cached_level != Some(level) || state.filter_generation != *filter_generation;
    let mut buffer_reallocated = false;
    if rebuild {
      buffer_reallocated = rebuild_indices(index, state, level, filter.as_deref(), config.cull.full_visibility_ratio);
      state.cached_level = Some(level);
      state.filter_generation = *filter_generation;

      if state.cached_draw == CachedDraw::NothingVisible {
        metrics.record_empty_fallback();
        if !state.warned_empty {
          warn!(
            view = request.view_id.raw(),
            "no spatial index nodes visible, falling back to full detail"
          );
          state.warned_empty = true;
        }
      } else {
        state.warned_empty = false;
      }
    }
    metrics.record_index_cache(!rebuild);
    metrics.record_frame(state.visible_leaves.len() as u32, state.cached_visible_indices.len() as u64);

    let state = &*state;
    let visible_nodes = state.visible_leaves.len();
    let (level_points, size_multiplier) = table
      .level(level)
      .map_or((index.point_count(), 1.0), |l| (l.point_count, l.size_multiplier));
    let visible_ratio = if level_points > 0 {
      state.cached_culled_count as f32 / level_points as f32
    } else {
      0.0
    };

    match state.cached_draw {
      CachedDraw::NothingVisible | CachedDraw::Empty => {
        let mut output: FrameOutput<'_> = full_detail(table, Fallback::NothingVisible);
        if filter.is_some() && state.cached_draw == CachedDraw::NothingVisible {
          output.draw = DrawSet::Subset(state.cached_visible_indices.as_slice());
          output.visible_points = state.cached_visible_indices.len();
        }
        output.visible_ratio = 0.0;
        output.leaves_recomputed = camera_changed;
        output.indices_rebuilt = rebuild;
        output.buffer_reallocated = buffer_reallocated;
        output
      }
      CachedDraw::All => FrameOutput {
        level,
        size_multiplier,
        draw: DrawSet::All,
        visible_points: level_points,
        level_points,
        visible_ratio,
        visible_nodes,
        fallback: None,
        leaves_recomputed: camera_changed,
        indices_rebuilt: rebuild,
        buffer_reallocated,
      },
      CachedDraw::Subset => FrameOutput {
        level,
        size_multiplier,
        draw: DrawSet::Subset(state.cached_visible_indices.as_slice()),
        visible_points: state.cached_visible_indices.len(),
        level_points,
        visible_ratio,
        visible_nodes,
        fallback: None,
        leaves_recomputed: camera_changed,
        indices_rebuilt: rebuild,
        buffer_reallocated,
      },
    }
  }

  /// Forget a view and recycle its index buffer.
  pub fn remove_view(&mut self, id: ViewId) -> bool {
    match self.views.remove(id) {
      Some(state) => {
        self.pool.release(state.into_buffer());
        true
      }
      None => false,
    }
  }

  /// Forget every view.
  pub fn clear_views(&mut self) {
    for (_, state) in self.views.drain() {
      self.pool.release(state.into_buffer());
    }
  }

  pub fn view_count(&self) -> usize {
    self.views.len()
  }

  pub fn view(&self, id: ViewId) -> Option<&ViewRenderState> {
    self.views.get(id)
  }

  /// 1.0 for every original point present in `level`, 0.0 elsewhere.
  pub fn visibility_mask(&self, level: usize, mask: &mut Vec<f32>) {
    self.index.lod_table().visibility_mask(level, mask);
  }

  /// Points within `radius` of `center`; see [`SpatialIndex::query_radius`].
  pub fn query_radius(&self, center: Vec3, radius: f32, max_results: usize) -> Vec<RadiusHit> {
    self.index.query_radius(center, radius, max_results)
  }

  pub fn index(&self) -> &SpatialIndex {
    &self.index
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn data_generation(&self) -> u64 {
    self.data_generation
  }

  pub fn filter_generation(&self) -> u64 {
    self.filter_generation
  }

  pub fn buffer_pool(&self) -> &BufferPool {
    &self.pool
  }

  pub fn metrics(&self) -> &EngineMetrics {
    &self.metrics
  }

  pub fn metrics_mut(&mut self) -> &mut EngineMetrics {
    &mut self.metrics
  }
}

/// Unculled draw of the finest level.
fn full_detail(table: &LodTable, fallback: Fallback) -> FrameOutput<'static> {
  let finest = table.finest();
  let (level_points, size_multiplier) = table
    .level(finest)
    .map_or((table.total_points(), 1.0), |l| (l.point_count, l.size_multiplier));
  FrameOutput {
    level: finest,
    size_multiplier,
    draw: DrawSet::All,
    visible_points: level_points,
    level_points,
    visible_ratio: 1.0,
    visible_nodes: 0,
    fallback: Some(fallback),
    leaves_recomputed: false,
    indices_rebuilt: false,
    buffer_reallocated: false,
  }
}

/// Refill the view's index list from its visible leaves.
///
/// Returns whether the index buffer was reallocated.
fn rebuild_indices(
  index: &SpatialIndex,
  state: &mut ViewRenderState,
  level: usize,
  filter: Option<&[bool]>,
  full_visibility_ratio: f32,
) -> bool {
  state.cached_visible_indices.clear();

  if state.visible_leaves.is_empty() {
    state.cached_draw = CachedDraw::NothingVisible;
    state.cached_culled_count = 0;
    let Some(filter) = filter else {
      return false;
    };
    // The full-detail fallback still hides filtered points.
    let table = index.lod_table();
    let Some(finest) = table.level(table.finest()) else {
      return false;
    };
    let drawable = filter.iter().filter(|&&keep| keep).count();
    let reallocated = state.cached_visible_indices.ensure_capacity(drawable);
    for local in 0..finest.point_count as u32 {
      if filter.get(finest.to_original(local) as usize).copied().unwrap_or(false) {
        state.cached_visible_indices.push(local);
      }
    }
    return reallocated;
  }

  let culled: usize = state
    .visible_leaves
    .iter()
    .map(|&leaf| index.leaf_lod_indices(leaf, level).len())
    .sum();
  state.cached_culled_count = culled;

  let level_points = index.lod_table().level(level).map_or(0, |l| l.point_count);
  let ratio = if level_points > 0 {
    culled as f32 / level_points as f32
  } else {
    1.0
  };

  let Some(filter) = filter else {
    if ratio > full_visibility_ratio {
      state.cached_draw = CachedDraw::All;
      return false;
    }
    let reallocated = state.cached_visible_indices.ensure_capacity(culled);
    for &leaf in &state.visible_leaves {
      state.cached_visible_indices.extend_from_slice(index.leaf_lod_indices(leaf, level));
    }
    state.cached_draw = CachedDraw::Subset;
    return reallocated;
  };

  // A filter always yields an explicit list, even at full visibility.
  let reallocated = state.cached_visible_indices.ensure_capacity(culled);
  if let Some(lod) = index.lod_table().level(level) {
    for &leaf in &state.visible_leaves {
      for &local in index.leaf_lod_indices(leaf, level) {
        if filter.get(lod.to_original(local) as usize).copied().unwrap_or(false) {
          state.cached_visible_indices.push(local);
        }
      }
    }
  }
  state.cached_draw = CachedDraw::Subset;
  reallocated
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;
