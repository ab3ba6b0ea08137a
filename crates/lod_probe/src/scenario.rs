//! Scenario file parsing.

use anyhow::{Context, Result};
use point_lod::{CullConfig, DimensionLevel, EngineConfig, IndexConfig, LodSelectConfig};
use serde::Deserialize;
use std::path::Path;

/// Synthetic cloud layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
	/// Uniform in a cube.
	#[default]
	Cube,
	/// Uniform on the `z = 0` plane.
	Plane,
	/// Uniform along the X axis.
	Line,
	/// Uniform on a sphere surface.
	Sphere,
}

/// Root configuration of one probe run.
#[derive(Debug, Deserialize)]
pub struct Scenario {
	/// Number of points to generate.
	pub points: usize,
	#[serde(default)]
	pub shape: Shape,
	#[serde(default = "default_seed")]
	pub seed: u64,
	/// Edge length (cube, plane, line) or diameter (sphere) in world units.
	#[serde(default = "default_extent")]
	pub extent: f32,
	/// Shortcut for `index.dimension_level`.
	pub dimension_level: Option<DimensionLevel>,
	#[serde(default)]
	pub index: IndexConfig,
	#[serde(default)]
	pub select: LodSelectConfig,
	#[serde(default)]
	pub cull: CullConfig,
	/// Camera distances as multiples of the data's characteristic size.
	pub camera_distances: Vec<f32>,
	#[serde(default = "default_fov")]
	pub fov_degrees: f32,
	#[serde(default = "default_viewport_height")]
	pub viewport_height: f32,
}

fn default_seed() -> u64 {
	42
}

fn default_extent() -> f32 {
	1.0
}

fn default_fov() -> f32 {
	60.0
}

fn default_viewport_height() -> f32 {
	1080.0
}

impl Scenario {
	/// Load a scenario from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read scenario file: {}", path.display()))?;
		let mut scenario: Scenario =
			toml::from_str(&content).with_context(|| "Failed to parse scenario TOML")?;

		if let Some(dimension_level) = scenario.dimension_level {
			scenario.index.dimension_level = dimension_level;
		}

		if scenario.points == 0 {
			anyhow::bail!("points must be > 0");
		}
		if !(scenario.extent > 0.0) {
			anyhow::bail!("extent must be positive, got {}", scenario.extent);
		}
		if scenario.camera_distances.is_empty() {
			anyhow::bail!("Scenario must list at least one camera distance");
		}
		if let Some(bad) = scenario.camera_distances.iter().find(|d| !(**d > 0.0)) {
			anyhow::bail!("camera distances must be positive, got {}", bad);
		}
		if !(scenario.fov_degrees > 0.0 && scenario.fov_degrees < 180.0) {
			anyhow::bail!("fov_degrees must be in (0, 180), got {}", scenario.fov_degrees);
		}
		scenario
			.index
			.validate()
			.with_context(|| "Invalid [index] section")?;

		Ok(scenario)
	}

	pub fn engine_config(&self) -> EngineConfig {
		EngineConfig {
			index: self.index,
			select: self.select,
			cull: self.cull,
		}
	}
}
