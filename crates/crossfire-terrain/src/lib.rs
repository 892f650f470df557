//! Reference battlefield geometry for CROSSFIRE.
//!
//! Box-brush maps, segment traces with surface normals, line-of-sight,
//! field-of-view tests and the throw-arc solver, packaged as a
//! [`TraceService`](crossfire_core::trace::TraceService) implementation.

pub use crossfire_core as core;

pub mod ballistics;
pub mod map;

// Re-export key types for convenience.
pub use ballistics::solve_arc;
pub use map::{BattleMap, Brush};
