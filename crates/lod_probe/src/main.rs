//! Diagnostic probe for the point_lod engine.
//!
//! Generates a synthetic cloud from a TOML scenario, builds the engine over
//! it, prints the LOD table, checks point conservation, and reports the level
//! and culling result for a series of camera distances.

mod scenario;
mod shapes;

use anyhow::{Context, Result};
use clap::Parser;
use glam::{Mat4, Vec3};
use point_lod::{DrawSet, FrameRequest, LodEngine, ViewId};
use std::path::PathBuf;
use web_time::Instant;

use scenario::Scenario;

/// Point cloud LOD / culling probe.
#[derive(Parser, Debug)]
#[command(name = "lod_probe")]
#[command(about = "Builds a point_lod engine over a synthetic cloud and reports LOD and culling results")]
struct Args {
	/// Path to the scenario TOML file.
	#[arg(short, long)]
	scenario: PathBuf,

	/// Print per-level buffer sizes and engine metrics.
	#[arg(short, long)]
	verbose: bool,
}

/// Viewing direction used for every probe camera. Not parallel to +Y, the
/// camera up vector.
const VIEW_DIRECTION: Vec3 = Vec3::new(0.3, 0.4, 1.0);

fn main() -> Result<()> {
	let args = Args::parse();

	println!("Loading scenario from: {}", args.scenario.display());
	let scenario = Scenario::load(&args.scenario)?;

	println!(
		"Generating {} {:?} points (extent {}, seed {})",
		scenario.points, scenario.shape, scenario.extent, scenario.seed
	);
	let points = shapes::generate(scenario.shape, scenario.points, scenario.extent, scenario.seed)?;

	let start = Instant::now();
	let mut engine = LodEngine::build(points, scenario.engine_config()).context("Building spatial index")?;
	let index = engine.index();
	println!(
		"Built index in {:.1} ms: {} nodes, {} leaves, depth {}, dimension {:?}",
		start.elapsed().as_secs_f64() * 1000.0,
		index.node_count(),
		index.leaf_count(),
		index.max_depth_reached(),
		index.dimension_level()
	);

	let report = index
		.validate_point_count()
		.context("Point conservation check failed")?;
	println!("  ✓ {} points across {} leaves", report.count, report.leaf_count);

	print_lod_table(&engine, args.verbose);

	let bounds = *engine.index().bounds();
	let data_size = bounds.characteristic_size(engine.index().dimension_level());
	let center = bounds.center();
	let direction = VIEW_DIRECTION.normalize();
	let aspect = 16.0 / 9.0;

	println!("\nCameras (data size {:.4}):", data_size);
	println!(
		"  {:>8} {:>10} {:>6} {:>6} {:>8} {:>12} {:>12} {:>8} {:>8}",
		"ratio", "distance", "level", "size", "mode", "drawn", "of level", "visible", "leaves"
	);
	for (i, &multiple) in scenario.camera_distances.iter().enumerate() {
		let distance = multiple * data_size;
		let eye = center + direction * distance;
		let near = (distance * 1e-3).max(1e-5);
		let far = distance + data_size * 4.0;
		let proj_view = Mat4::perspective_rh_gl(scenario.fov_degrees.to_radians(), aspect, near, far)
			* Mat4::look_at_rh(eye, center, Vec3::Y);

		let request = FrameRequest::new(ViewId::from_raw(i as u64), distance, scenario.viewport_height, proj_view);
		let frame = engine.prepare_frame(&request);
		let mode = match (frame.fallback, frame.draw) {
			(Some(_), _) => "fallback",
			(None, DrawSet::All) => "all",
			(None, DrawSet::Subset(_)) => "subset",
		};
		println!(
			"  {:>8.2} {:>10.4} {:>6} {:>6.2} {:>8} {:>12} {:>12} {:>7.1}% {:>8}",
			multiple,
			distance,
			frame.level,
			frame.size_multiplier,
			mode,
			frame.visible_points,
			frame.level_points,
			frame.visible_ratio * 100.0,
			frame.visible_nodes
		);
	}

	if args.verbose {
		print_metrics(&engine);
	}

	Ok(())
}

fn print_lod_table(engine: &LodEngine, verbose: bool) {
	let table = engine.index().lod_table();
	println!("\nLOD table ({} levels):", table.len());
	println!("  {:>5} {:>8} {:>12} {:>8}", "level", "factor", "points", "size");
	for level in table.levels() {
		println!(
			"  {:>5} {:>8.2} {:>12} {:>8.3}",
			level.depth, level.factor, level.point_count, level.size_multiplier
		);
	}

	if verbose {
		let timings = engine.index().timings();
		println!(
			"  build phases: partition {} us, order {} us, lod {} us, leaf maps {} us",
			timings.partition_us, timings.order_us, timings.lod_us, timings.leaf_map_us
		);
		let copied: usize = table
			.levels()
			.iter()
			.filter(|l| !l.is_full())
			.map(|l| l.point_count * (3 * 4 + 4))
			.sum();
		println!("  reduced level buffers: {:.2} MB", copied as f64 / 1_048_576.0);
	}
}

fn print_metrics(engine: &LodEngine) {
	let metrics = engine.metrics();
	println!("\nMetrics:");
	println!("  avg cull: {:.1} us over {} frames", metrics.avg_cull_timing_us(), metrics.cull_timings.len());
	if let Some((min, max)) = metrics.cull_timings.min_max() {
		println!("  cull range: {} - {} us", min, max);
	}
	println!(
		"  leaf cache: {} hits / {} misses, index cache: {} hits / {} misses",
		metrics.leaf_cache_hits, metrics.leaf_cache_misses, metrics.index_cache_hits, metrics.index_cache_misses
	);
	println!("  empty-frustum fallbacks: {}", metrics.empty_fallbacks);
	println!("  views: {}", engine.view_count());
}
