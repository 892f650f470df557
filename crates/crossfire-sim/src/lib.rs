//! Combat resolution for CROSSFIRE.
//!
//! Owns the hecs ECS world of units and breakables and resolves shots,
//! throws, damage, morale and reaction fire against a caller-supplied
//! [`TraceService`](crossfire_core::trace::TraceService). Every effect is
//! reported as a team-masked `BattleEvent`.

pub mod engine;
pub mod level;
pub mod systems;
pub mod world_setup;

pub use crossfire_core as core;
pub use engine::{CombatEngine, ShotReport, ShotRequest, SimConfig, UnitView};
pub use systems::mock::ShotMock;
