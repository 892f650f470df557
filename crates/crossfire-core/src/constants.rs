//! Simulation constants shared by all crates.
//!
//! Tunable balance values live in [`crate::config::CombatConfig`]; the values
//! here are fixed properties of the grid and the physics model.

// --- Grid geometry ---

/// Horizontal edge length of a grid cell (map units).
pub const UNIT_SIZE: f32 = 32.0;

/// Vertical height of a grid cell (map units).
pub const UNIT_HEIGHT: f32 = 64.0;

/// Number of teams addressable by visibility masks.
pub const MAX_TEAMS: usize = 8;

// --- Actor body ---

/// Half width of an actor's bounding box.
pub const PLAYER_WIDTH: f32 = 9.0;

/// Top of a standing actor relative to its origin.
pub const PLAYER_STAND: f32 = 20.0;

/// Top of a crouched actor relative to its origin.
pub const PLAYER_CROUCH: f32 = 5.0;

/// Height of a corpse relative to its origin.
pub const PLAYER_DEAD: f32 = -12.0;

/// Bottom of an actor relative to its origin.
pub const PLAYER_MIN: f32 = -24.0;

/// Eye height of a standing actor.
pub const EYE_STAND: f32 = 15.0;

/// Eye height of a crouched or panicking actor.
pub const EYE_CROUCH: f32 = 3.0;

/// Visibility fraction an actor must exceed to be fired upon reactively.
pub const REACTION_MIN_VISIBILITY: f32 = 0.2;

/// Spotting range for reaction fire.
pub const MAX_SPOT_DIST: f32 = 4096.0;

/// Half angle of the field of view used by frustum tests (radians, 60°).
pub const FRUSTUM_HALF_ANGLE: f32 = std::f32::consts::FRAC_PI_3;

// --- Skills ---

/// Maximum value of any ability or skill score.
pub const MAX_SKILL: i32 = 100;

// --- Projectiles ---

/// Gravity acting on thrown projectiles (units/s²).
pub const GRAVITY: f32 = 500.0;

/// Integration step for thrown projectiles (seconds).
pub const GRENADE_DT: f32 = 0.1;

/// Below this speed a thrown projectile comes to rest.
pub const GRENADE_STOPSPEED: f32 = 60.0;

/// Flight time after which a thrown projectile detonates regardless.
pub const GRENADE_MAX_TIME: f32 = 4.0;

/// Grenades are aimed this far below the target cell centre.
pub const GROUND_DELTA: f32 = 28.0;

/// Detonation point is lifted this far off the impact surface.
pub const GRENADE_DETONATION_LIFT: f32 = 10.0;

/// Dropped straight-line throwables are lowered by this much before the
/// landing cell is computed.
pub const THROWN_DROP_LOWERING: f32 = 20.0;

/// Fixed launch angle used for rolled throws (degrees).
pub const ROLL_ANGLE_DEG: f32 = 3.0;

/// Upper bound on ballistic trace iterations per projectile.
pub const MAX_SEGMENTS_PER_SHOT: usize = 64;

// --- Reaction fire ---

/// TU reserved at end of turn for a single reaction shot.
pub const TU_REACTION_SINGLE: i32 = 7;

/// TU reserved at end of turn for multiple reaction shots.
pub const TU_REACTION_MULTI: i32 = 14;

/// Default minimum number of expected enemy hits (out of the mock trials)
/// before a reaction shot is authorised.
pub const DEFAULT_REACTION_MIN_HIT: u32 = 30;

// --- Derived stat formulas ---

/// Maximum health derived from the power ability.
pub fn max_hp_for_power(power: i32) -> i32 {
    (80 + power * 90 / MAX_SKILL).min(255)
}

/// Maximum morale derived from the mind ability.
pub fn max_morale_for_mind(mind: i32) -> i32 {
    (100 + mind * 150 / MAX_SKILL).min(255)
}

/// Inaccuracy factor from accuracy ability and weapon skill (1.0 = worst).
pub fn inaccuracy(accuracy: i32, weapon_skill: i32) -> f32 {
    1.0 - ((accuracy as f32 / MAX_SKILL as f32) + (weapon_skill as f32 / MAX_SKILL as f32)) / 2.0
}
