use super::*;

const LEVELS: usize = 13;

fn pick(distance: f32, previous: Option<usize>) -> usize {
  select_level(distance, 1080.0, previous, LEVELS, 1.0, &LodSelectConfig::DEFAULT)
}

/// Distance that yields continuous target `level` for a unit data size.
fn distance_for_target(level: f32) -> f32 {
  let config = LodSelectConfig::DEFAULT;
  let t = 1.0 - level / (LEVELS - 1) as f32;
  config.min_ratio * (config.max_ratio / config.min_ratio).powf(t)
}

#[test]
fn test_near_is_full_detail_far_is_coarsest() {
  assert_eq!(pick(0.01, None), LEVELS - 1);
  assert_eq!(pick(0.3, None), LEVELS - 1);
  assert_eq!(pick(3.0, None), 0);
  assert_eq!(pick(1000.0, None), 0);
}

/// Larger distance / size ratios never select finer levels.
#[test]
fn test_selection_is_monotonic_in_ratio() {
  let mut last = usize::MAX;
  for step in 0..200 {
    let distance = 0.1 + step as f32 * 0.025;
    let level = pick(distance, None);
    assert!(level <= last, "level rose from {} to {} at distance {}", last, level, distance);
    last = level;
  }
}

#[test]
fn test_target_roundtrip() {
  let config = LodSelectConfig::DEFAULT;
  for level in [0.0f32, 3.5, 6.0, 11.25, 12.0] {
    let target = target_level(distance_for_target(level), 1.0, LEVELS, &config);
    assert!((target - level).abs() < 1e-3, "expected {}, got {}", level, target);
  }
}

/// Oscillating inside the dead zone must never change the selection.
#[test]
fn test_hysteresis_holds_level() {
  let previous = 6;
  let mut level = previous;
  for step in 0..100 {
    let offset = if step % 2 == 0 { 0.65 } else { -0.65 };
    level = pick(distance_for_target(previous as f32 + offset), Some(level));
    assert_eq!(level, previous, "level changed at step {}", step);
  }
}

/// Oscillating across a boundary (x.5) stays put once selected.
#[test]
fn test_hysteresis_across_boundary() {
  let mut level = pick(distance_for_target(5.4), None);
  assert_eq!(level, 5);
  for step in 0..50 {
    let target = if step % 2 == 0 { 5.6 } else { 5.4 };
    level = pick(distance_for_target(target), Some(level));
    assert_eq!(level, 5);
  }
}

#[test]
fn test_moves_one_level_per_call() {
  let far = distance_for_target(0.0);
  assert_eq!(pick(far, Some(8)), 7);
  assert_eq!(pick(far, Some(7)), 6);

  let near = distance_for_target(12.0);
  assert_eq!(pick(near, Some(3)), 4);
}

#[test]
fn test_no_hysteresis_still_steps() {
  let config = LodSelectConfig::NO_HYSTERESIS;
  let level = select_level(distance_for_target(9.2), 720.0, Some(8), LEVELS, 1.0, &config);
  assert_eq!(level, 9);
}

/// Same ratio, different absolute scale, same level.
#[test]
fn test_scale_invariance() {
  let config = LodSelectConfig::DEFAULT;
  for distance in [0.2f32, 0.5, 1.0, 1.7, 2.9] {
    let unit = select_level(distance, 900.0, None, LEVELS, 1.0, &config);
    let scaled = select_level(distance * 4.0, 900.0, None, LEVELS, 4.0, &config);
    assert_eq!(unit, scaled);
  }
}

#[test]
fn test_degenerate_inputs() {
  let config = LodSelectConfig::DEFAULT;
  assert_eq!(select_level(1.0, 900.0, None, 1, 1.0, &config), 0);
  assert_eq!(select_level(1.0, 0.0, Some(5), LEVELS, 1.0, &config), 0);
  assert_eq!(select_level(f32::NAN, 900.0, None, LEVELS, 1.0, &config), 0);
  // Out-of-range previous is clamped before stepping toward the target.
  assert_eq!(select_level(1.0, 900.0, Some(40), LEVELS, 1.0, &config), LEVELS - 2);
}
