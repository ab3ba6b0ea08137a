//! point_lod - Framework/engine independent point cloud LOD and culling
//!
//! This crate decides, every frame and per viewport, which points of a very
//! large point cloud to draw and at what density. It owns no GPU state: it
//! consumes position/color buffers by reference and produces index lists,
//! LOD levels and visibility masks for a rendering collaborator.
//!
//! # Features
//!
//! - **Spatial Index**: binary/quad/octree partition selected by a
//!   [`DimensionLevel`], with per-node aggregates
//! - **Subset-monotone LOD**: every coarser level is a prefix of a single
//!   bit-reversed Morton ordering, so levels never pop points in or out
//!   inconsistently
//! - **Frustum Culling**: Gribb/Hartmann planes with a scale-aware margin and
//!   inside/outside/partial subtree classification
//! - **Per-view caching**: each viewport keeps its own LOD hysteresis and a
//!   two-tier visible-set cache
//!
//! # Example
//!
//! ```ignore
//! use point_lod::{EngineConfig, FrameRequest, LodEngine, PointSet, ViewId};
//!
//! let points = PointSet::new(positions, colors)?;
//! let mut engine = LodEngine::build(points, EngineConfig::default())?;
//!
//! let view = ViewId::from_raw(0);
//! let frame = engine.prepare_frame(&FrameRequest::new(view, distance, height, proj_view));
//! println!("level {} draws {} points", frame.level, frame.visible_points);
//! ```

pub mod bounds;
pub mod config;
pub mod dimension;
pub mod error;
pub mod point_set;

pub use bounds::Bounds;
pub use config::{CullConfig, EngineConfig, IndexConfig, LodSelectConfig, MAX_DEPTH_LIMIT};
pub use dimension::DimensionLevel;
pub use error::IndexError;
pub use point_set::{PointSet, MAX_POINTS};

// Spatial partition tree, radius queries and validation
pub mod index;
pub use index::{NodeId, NodeKind, PointCountReport, RadiusHit, SpatialIndex, SpatialIndexNode};

// LOD table generation and level selection
pub mod lod;
pub use lod::{select_level, LodLevel, LodTable};

// Frustum plane extraction and node classification
pub mod frustum;
pub use frustum::{Containment, CullCounters, Frustum, Plane};

// Per-viewport render state
pub mod view;
pub use view::{ViewId, ViewRenderState, ViewStates};

// Capacity-managed index buffers
pub mod buffer;
pub use buffer::{BufferPool, IndexBuffer};

// Per-frame facade tying index, LOD and culling together
pub mod engine;
pub use engine::{DrawSet, Fallback, FrameOutput, FrameRequest, LodEngine};

// One-shot background builds
pub mod async_build;
pub use async_build::AsyncIndexBuild;

pub mod metrics;

#[cfg(test)]
pub(crate) mod test_utils;
