//! Distance-based LOD level selection with hysteresis.
//!
//! ```text
//! ratio  = clamp(distance / data_size, min_ratio, max_ratio)
//! t      = ln(ratio / min_ratio) / ln(max_ratio / min_ratio)     0 = near, 1 = far
//! target = (levels - 1) * (1 - t)                                 continuous level
//! ```
//!
//! Near cameras get full detail, far cameras the coarsest level. The selected
//! level only moves, one step at a time, once the continuous target leaves the
//! dead zone around the previous selection.

use crate::LodSelectConfig;

/// Continuous target level in `[0, level_count - 1]`.
pub fn target_level(distance: f32, data_size: f32, level_count: usize, config: &LodSelectConfig) -> f32 {
  if level_count <= 1 {
    return 0.0;
  }
  let max_level = (level_count - 1) as f32;
  if !(data_size > 0.0) || !distance.is_finite() {
    return 0.0;
  }

  let min_ratio = config.min_ratio.max(f32::MIN_POSITIVE);
  let max_ratio = config.max_ratio.max(min_ratio);
  let ratio = (distance.max(0.0) / data_size).clamp(min_ratio, max_ratio);
  let span = (max_ratio / min_ratio).ln();
  let t = if span > 0.0 {
    (ratio / min_ratio).ln() / span
  } else {
    0.0
  };
  max_level * (1.0 - t.clamp(0.0, 1.0))
}

/// Pick the level to draw.
///
/// `previous` is the level this view drew last frame (`None` on first use).
/// A view with no visible area (`viewport_height <= 0`) gets the coarsest
/// level.
pub fn select_level(
  distance: f32,
  viewport_height: f32,
  previous: Option<usize>,
  level_count: usize,
  data_size: f32,
  config: &LodSelectConfig,
) -> usize {
  if level_count <= 1 || !(viewport_height > 0.0) {
    return 0;
  }
  let max_level = level_count - 1;
  let target = target_level(distance, data_size, level_count, config);

  match previous {
    None => (target.round() as usize).min(max_level),
    Some(previous) => {
      let previous = previous.min(max_level);
      let delta = target - previous as f32;
      if delta.abs() <= config.hysteresis {
        previous
      } else if delta > 0.0 {
        (previous + 1).min(max_level)
      } else {
        previous.saturating_sub(1)
      }
    }
  }
}

#[cfg(test)]
#[path = "select_test.rs"]
mod select_test;
