use std::collections::HashSet;

use glam::Vec3;

use super::*;
use crate::test_utils::{random_cube, random_line, random_plane};

fn config(dimension_level: DimensionLevel, max_points_per_node: usize) -> IndexConfig {
  IndexConfig {
    dimension_level,
    max_points_per_node,
    min_lod_points: 100,
    ..Default::default()
  }
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn test_conservation_octree() {
  let index = SpatialIndex::build(random_cube(20_000, 1), config(DimensionLevel::Volumetric, 256)).unwrap();
  let report = index.validate_point_count().unwrap();
  assert_eq!(report.count, 20_000);
  assert_eq!(report.leaf_count, index.leaf_count());
  assert!(index.leaf_count() > 1);
}

/// Every point index appears in exactly one leaf.
#[test]
fn test_leaves_partition_points() {
  let index = SpatialIndex::build(random_cube(5_000, 2), config(DimensionLevel::Volumetric, 100)).unwrap();
  let mut seen = HashSet::new();
  for &leaf in index.leaves() {
    for &i in &index.node(leaf).leaf().unwrap().indices {
      assert!(seen.insert(i), "index {} stored twice", i);
    }
  }
  assert_eq!(seen.len(), 5_000);
}

#[test]
fn test_leaf_points_inside_leaf_bounds() {
  let index = SpatialIndex::build(random_cube(5_000, 3), config(DimensionLevel::Volumetric, 64)).unwrap();
  for &leaf in index.leaves() {
    let node = index.node(leaf);
    for &i in &node.leaf().unwrap().indices {
      assert!(node.bounds.contains(index.points().position(i as usize)));
    }
  }
}

#[test]
fn test_small_cloud_is_single_leaf() {
  let index = SpatialIndex::build(random_cube(50, 4), config(DimensionLevel::Volumetric, 100)).unwrap();
  assert_eq!(index.node_count(), 1);
  assert_eq!(index.leaf_count(), 1);
  assert!(index.node(index.root()).is_leaf());
  assert_eq!(index.validate_point_count().unwrap().count, 50);
}

#[test]
fn test_empty_cloud_rejected() {
  let points = PointSet::from_positions(Vec::<f32>::new()).unwrap();
  let result = SpatialIndex::build(points, IndexConfig::default());
  assert_eq!(result.err(), Some(IndexError::EmptyPointSet));
}

#[test]
fn test_invalid_config_rejected() {
  let bad = IndexConfig {
    max_points_per_node: 0,
    ..Default::default()
  };
  assert!(matches!(
    SpatialIndex::build(random_cube(10, 5), bad),
    Err(IndexError::InvalidConfig(_))
  ));
}

/// Coincident points cannot be separated; depth limit must stop the split.
#[test]
fn test_coincident_points_stop_at_max_depth() {
  let points = PointSet::from_positions(vec![0.5f32; 3 * 500]).unwrap();
  let index = SpatialIndex::build(
    points,
    IndexConfig {
      max_points_per_node: 10,
      max_depth: 6,
      ..Default::default()
    },
  )
  .unwrap();
  assert_eq!(index.max_depth_reached(), 6);
  assert_eq!(index.leaf_count(), 1);
  assert_eq!(index.validate_point_count().unwrap().count, 500);
}

#[test]
fn test_coincident_points_with_huge_max_depth_rejected() {
  let points = PointSet::from_positions([0.25f32; 3].repeat(8)).unwrap();
  let config = IndexConfig {
    max_points_per_node: 1,
    max_depth: 50_000,
    ..Default::default()
  };
  assert!(matches!(
    SpatialIndex::build(points, config),
    Err(crate::IndexError::InvalidConfig(_))
  ));
}

#[test]
fn test_coincident_points_at_depth_limit() {
  let points = PointSet::from_positions([0.25f32; 3].repeat(8)).unwrap();
  let index = SpatialIndex::build(
    points,
    IndexConfig {
      max_points_per_node: 1,
      max_depth: crate::MAX_DEPTH_LIMIT,
      min_lod_points: 1,
      ..Default::default()
    },
  )
  .unwrap();
  assert_eq!(index.max_depth_reached(), crate::MAX_DEPTH_LIMIT);
  assert_eq!(index.leaf_count(), 1);
  assert_eq!(index.validate_point_count().unwrap().count, 8);
}

#[test]
fn test_child_count_follows_dimension() {
  for (dimension, expected) in [
    (DimensionLevel::Linear, 2),
    (DimensionLevel::Planar, 4),
    (DimensionLevel::Volumetric, 8),
  ] {
    let index = SpatialIndex::build(random_cube(4_000, 6), config(dimension, 100)).unwrap();
    match &index.node(index.root()).kind {
      NodeKind::Internal { children } => assert_eq!(children.len(), expected),
      NodeKind::Leaf(_) => panic!("root should be internal"),
    }
  }
}

/// A 2-D index over a perfectly flat cloud must still have volume.
#[test]
fn test_flat_cloud_planar_index() {
  let index = SpatialIndex::build(random_plane(10_000, 7, 2.0), config(DimensionLevel::Planar, 200)).unwrap();
  let size = index.bounds().size();
  assert!(size.min_element() > 0.0);
  assert!(size.z >= 0.49 * size.max_element());
  assert_eq!(index.validate_point_count().unwrap().count, 10_000);
}

#[test]
fn test_line_cloud_linear_index() {
  let index = SpatialIndex::build(random_line(10_000, 8), config(DimensionLevel::Linear, 200)).unwrap();
  assert!(index.bounds().size().min_element() > 0.0);
  assert!(index.leaf_count() >= 10_000 / 200);
  assert_eq!(index.validate_point_count().unwrap().count, 10_000);
}

// =========================================================================
// Aggregates
// =========================================================================

#[test]
fn test_internal_point_count_is_sum_of_children() {
  let index = SpatialIndex::build(random_cube(10_000, 9), config(DimensionLevel::Volumetric, 128)).unwrap();
  for node in index.nodes() {
    match &node.kind {
      NodeKind::Leaf(leaf) => assert_eq!(node.point_count as usize, leaf.indices.len()),
      NodeKind::Internal { .. } => {
        let sum: u32 = node.children().map(|c| index.node(c).point_count).sum();
        assert_eq!(node.point_count, sum);
      }
    }
  }
  assert_eq!(index.node(index.root()).point_count, 10_000);
}

#[test]
fn test_root_centroid_matches_mean() {
  let points = random_cube(4_000, 10);
  let mean = (0..points.len()).map(|i| points.position(i)).sum::<Vec3>() / points.len() as f32;
  let index = SpatialIndex::build(points, config(DimensionLevel::Volumetric, 64)).unwrap();
  let root = index.node(index.root());
  assert!(root.centroid.distance(mean) < 1e-3);
  assert!(root.avg_alpha > 0.0 && root.avg_alpha < 1.0);
  assert!(root.avg_color.max_element() <= 1.0);
}

#[test]
fn test_leaf_ranges_cover_subtrees() {
  let index = SpatialIndex::build(random_cube(8_000, 11), config(DimensionLevel::Volumetric, 64)).unwrap();
  let root = index.node(index.root());
  assert_eq!(root.leaf_range(), 0..index.leaf_count());

  for node in index.nodes() {
    let points: u32 = index.leaves()[node.leaf_range()]
      .iter()
      .map(|&l| index.node(l).point_count)
      .sum();
    assert_eq!(points, node.point_count);
  }
}

// =========================================================================
// Per-leaf LOD maps
// =========================================================================

/// Concatenating every leaf's entries for a level yields that level exactly.
#[test]
fn test_leaf_lod_indices_cover_each_level() {
  let index = SpatialIndex::build(random_cube(20_000, 12), config(DimensionLevel::Volumetric, 200)).unwrap();
  let table = index.lod_table();
  assert!(table.len() > 3);

  for level in 0..table.len() {
    let mut all: Vec<u32> = index
      .leaves()
      .iter()
      .flat_map(|&leaf| index.leaf_lod_indices(leaf, level).iter().copied())
      .collect();
    all.sort_unstable();
    let expected: Vec<u32> = (0..table.level(level).unwrap().point_count as u32).collect();
    assert_eq!(all, expected, "level {}", level);
  }
}

#[test]
fn test_every_leaf_has_one_entry_per_level() {
  let index = SpatialIndex::build(random_cube(20_000, 14), config(DimensionLevel::Volumetric, 200)).unwrap();
  let levels = index.lod_table().len();
  for &leaf in index.leaves() {
    let data = index.node(leaf).leaf().unwrap();
    assert_eq!(data.lod_indices.len(), levels);
    // The finest level is the identity map.
    assert_eq!(data.lod_indices[levels - 1], data.indices);
  }
}

#[test]
fn test_leaf_lod_indices_point_back_into_leaf() {
  let index = SpatialIndex::build(random_cube(5_000, 13), config(DimensionLevel::Volumetric, 100)).unwrap();
  let level = index.lod_table().level(0).unwrap();
  for &leaf in index.leaves() {
    let owned: HashSet<u32> = index.node(leaf).leaf().unwrap().indices.iter().copied().collect();
    for &local in index.leaf_lod_indices(leaf, 0) {
      assert!(owned.contains(&level.to_original(local)));
    }
  }
  assert!(index.leaf_lod_indices(index.leaves()[0], 99).is_empty());
}

// =========================================================================
// Radius query
// =========================================================================

#[test]
fn test_query_radius_matches_brute_force() {
  let points = random_cube(10_000, 14);
  let index = SpatialIndex::build(points.clone(), config(DimensionLevel::Volumetric, 64)).unwrap();
  let center = Vec3::new(0.4, 0.6, 0.5);
  let radius = 0.1;

  let mut found: Vec<u32> = index
    .query_radius(center, radius, usize::MAX)
    .into_iter()
    .map(|hit| hit.index)
    .collect();
  found.sort_unstable();

  let expected: Vec<u32> = (0..points.len())
    .filter(|&i| points.position(i).distance_squared(center) <= radius * radius)
    .map(|i| i as u32)
    .collect();
  assert!(!expected.is_empty());
  assert_eq!(found, expected);
}

#[test]
fn test_query_radius_respects_max_results() {
  let index = SpatialIndex::build(random_cube(10_000, 15), config(DimensionLevel::Volumetric, 64)).unwrap();
  let hits = index.query_radius(Vec3::splat(0.5), 0.5, 17);
  assert_eq!(hits.len(), 17);
  for hit in hits {
    assert_eq!(hit.position, index.points().position(hit.index as usize));
  }
}

#[test]
fn test_query_radius_outside_cloud() {
  let index = SpatialIndex::build(random_cube(1_000, 16), config(DimensionLevel::Volumetric, 64)).unwrap();
  assert!(index.query_radius(Vec3::splat(10.0), 1.0, 100).is_empty());
  assert!(index.query_radius(Vec3::splat(0.5), 1.0, 0).is_empty());
}

// =========================================================================
// Level selection through the index
// =========================================================================

#[test]
fn test_override_bounds_changes_data_size() {
  let index = SpatialIndex::build(random_cube(20_000, 17), config(DimensionLevel::Volumetric, 200)).unwrap();
  let select = LodSelectConfig::DEFAULT;
  let size = index.bounds().characteristic_size(DimensionLevel::Volumetric);

  let own = index.select_level(size * 3.0, 800.0, None, DimensionLevel::Volumetric, None, &select);
  assert_eq!(own, 0);

  // Same camera distance against a ten times larger derived layout: near.
  let larger = index.bounds().scaled(10.0);
  let derived = index.select_level(size * 3.0, 800.0, None, DimensionLevel::Volumetric, Some(&larger), &select);
  assert_eq!(derived, index.lod_table().finest());
}
