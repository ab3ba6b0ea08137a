//! Level-of-detail module.
//!
//! # LOD Convention
//!
//! Level 0 = coarsest (fewest points), the last level = full detail.
//!
//! ```text
//! order      = sort(points, by = reverse_bits(morton(quantize(p))))
//! level[i]   = order[..count(i)]         count strictly increasing
//! level[i] ⊆ level[j]  for all i < j
//! ```
//!
//! # Module Structure
//!
//! - [`order`]: bit-reversed Morton ordering shared by every level
//! - [`table`]: `LodTable` / `LodLevel` generation and visibility masks
//! - [`select`]: distance-based level selection with hysteresis

pub mod order;
pub mod select;
pub mod table;

// Re-exports
pub use order::hierarchical_order;
pub use select::{select_level, target_level};
pub use table::{size_multiplier, LodLevel, LodTable, REDUCTION_FACTORS};
