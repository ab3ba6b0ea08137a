//! Engine-agnostic metrics for index builds and per-frame culling.
//!
//! Feature-gated and runtime-toggled to ensure zero overhead when disabled.
//!
//! # Usage
//!
//! ```ignore
//! use point_lod::metrics::COLLECT_METRICS;
//!
//! // Compile with --features metrics
//! // Runtime toggle:
//! COLLECT_METRICS.store(false, Ordering::Relaxed);
//!
//! let metrics = engine.metrics();
//! println!("avg cull: {:.1} us", metrics.avg_cull_timing_us());
//! ```

use std::collections::VecDeque;
#[cfg(feature = "metrics")]
use std::sync::atomic::Ordering;
use std::sync::atomic::AtomicBool;

use crate::index::BuildTimings;
use crate::LodTable;

/// Runtime toggle for metrics collection.
pub static COLLECT_METRICS: AtomicBool = AtomicBool::new(true);

/// Check if metrics collection is enabled (both compile-time and runtime).
#[inline]
pub fn is_enabled() -> bool {
    #[cfg(feature = "metrics")]
    {
        COLLECT_METRICS.load(Ordering::Relaxed)
    }
    #[cfg(not(feature = "metrics"))]
    {
        false
    }
}

/// Fixed-capacity window of the most recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    buffer: VecDeque<T>,
    capacity: usize,
}

impl<T> RollingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new value, evicting the oldest if at capacity.
    pub fn push(&mut self, value: T) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buffer.iter()
    }

    pub fn last(&self) -> Option<&T> {
        self.buffer.back()
    }
}

impl RollingWindow<u64> {
    pub fn sum(&self) -> u64 {
        self.buffer.iter().sum()
    }

    pub fn average(&self) -> f64 {
        if self.buffer.is_empty() {
            0.0
        } else {
            self.sum() as f64 / self.buffer.len() as f64
        }
    }

    pub fn min_max(&self) -> Option<(u64, u64)> {
        let min = *self.buffer.iter().min()?;
        let max = *self.buffer.iter().max()?;
        Some((min, max))
    }
}

impl Default for RollingWindow<u64> {
    fn default() -> Self {
        Self::new(128) // ~2 seconds of frames at 60fps
    }
}

/// Build and per-frame statistics of one [`LodEngine`](crate::LodEngine).
#[derive(Debug, Clone, Default)]
pub struct EngineMetrics {
    // Build
    /// Rolling window of full build times in microseconds.
    pub build_timings: RollingWindow<u64>,
    /// Phase breakdown of the last build.
    pub last_build: BuildTimings,
    /// Point count of each LOD level of the current index.
    pub points_per_level: Vec<u64>,

    // Culling
    /// Rolling window of `collect_visible` times in microseconds.
    pub cull_timings: RollingWindow<u64>,
    pub last_cull_us: u64,
    /// Visible leaves in the last prepared frame.
    pub visible_nodes: u32,
    /// Drawn points in the last prepared frame.
    pub visible_points: u64,

    // View cache
    /// Frames that reused the view's visible-leaf set.
    pub leaf_cache_hits: u64,
    pub leaf_cache_misses: u64,
    /// Frames that reused the view's index list.
    pub index_cache_hits: u64,
    pub index_cache_misses: u64,
    /// Frames answered at full detail because nothing was visible.
    pub empty_fallbacks: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-session values. The level table snapshot is kept.
    pub fn reset(&mut self) {
        self.build_timings.clear();
        self.cull_timings.clear();
        self.last_cull_us = 0;
        self.visible_nodes = 0;
        self.visible_points = 0;
        self.leaf_cache_hits = 0;
        self.leaf_cache_misses = 0;
        self.index_cache_hits = 0;
        self.index_cache_misses = 0;
        self.empty_fallbacks = 0;
    }

    pub fn record_build(&mut self, timings: &BuildTimings, table: &LodTable) {
        if !is_enabled() {
            return;
        }
        self.build_timings.push(timings.total_us());
        self.last_build = *timings;
        self.points_per_level = table.levels().iter().map(|l| l.point_count as u64).collect();
    }

    pub fn record_cull_timing(&mut self, timing_us: u64) {
        if is_enabled() {
            self.cull_timings.push(timing_us);
            self.last_cull_us = timing_us;
        }
    }

    pub fn record_frame(&mut self, visible_nodes: u32, visible_points: u64) {
        if is_enabled() {
            self.visible_nodes = visible_nodes;
            self.visible_points = visible_points;
        }
    }

    pub fn record_leaf_cache(&mut self, hit: bool) {
        if !is_enabled() {
            return;
        }
        if hit {
            self.leaf_cache_hits += 1;
        } else {
            self.leaf_cache_misses += 1;
        }
    }

    pub fn record_index_cache(&mut self, hit: bool) {
        if !is_enabled() {
            return;
        }
        if hit {
            self.index_cache_hits += 1;
        } else {
            self.index_cache_misses += 1;
        }
    }

    pub fn record_empty_fallback(&mut self) {
        if is_enabled() {
            self.empty_fallbacks += 1;
        }
    }

    pub fn avg_build_timing_us(&self) -> f64 {
        self.build_timings.average()
    }

    pub fn avg_cull_timing_us(&self) -> f64 {
        self.cull_timings.average()
    }

    /// Fraction of frames that skipped the tree traversal.
    pub fn leaf_cache_hit_rate(&self) -> f64 {
        let total = self.leaf_cache_hits + self.leaf_cache_misses;
        if total == 0 {
            0.0
        } else {
            self.leaf_cache_hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window() {
        let mut window = RollingWindow::new(3);
        assert!(window.is_empty());
        assert_eq!(window.min_max(), None);

        window.push(10u64);
        window.push(20);
        window.push(30);
        assert_eq!(window.sum(), 60);
        assert_eq!(window.average(), 20.0);

        window.push(40);
        assert_eq!(window.len(), 3);
        assert_eq!(window.sum(), 90);
        assert_eq!(window.min_max(), Some((20, 40)));
        assert_eq!(window.last(), Some(&40));
    }

    #[test]
    fn test_zero_capacity_window_stays_empty() {
        let mut window = RollingWindow::new(0);
        window.push(1u64);
        assert!(window.is_empty());
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_cache_counters() {
        let mut metrics = EngineMetrics::new();
        metrics.record_leaf_cache(true);
        metrics.record_leaf_cache(true);
        metrics.record_leaf_cache(false);
        metrics.record_index_cache(false);
        metrics.record_cull_timing(120);
        metrics.record_cull_timing(80);

        assert_eq!(metrics.leaf_cache_hits, 2);
        assert_eq!(metrics.index_cache_misses, 1);
        assert!((metrics.leaf_cache_hit_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(metrics.avg_cull_timing_us(), 100.0);
        assert_eq!(metrics.last_cull_us, 80);

        metrics.reset();
        assert_eq!(metrics.leaf_cache_hits, 0);
        assert!(metrics.cull_timings.is_empty());
    }

    #[cfg(not(feature = "metrics"))]
    #[test]
    fn test_recording_is_noop_without_feature() {
        let mut metrics = EngineMetrics::new();
        metrics.record_leaf_cache(true);
        metrics.record_cull_timing(50);
        assert_eq!(metrics.leaf_cache_hits, 0);
        assert!(metrics.cull_timings.is_empty());
    }
}
