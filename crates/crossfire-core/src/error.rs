//! Error types for shot resolution, engine operations and configuration.

use thiserror::Error;

use crate::types::EntityNumber;

/// A rejected firing action. No state was mutated.
///
/// The `Display` strings are the status messages shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShotError {
    #[error("Can't perform action - not enough TUs!")]
    InsufficientTimeUnits { required: i32, available: i32 },

    #[error("Can't shoot yourself!")]
    SelfTarget,

    #[error("Can't perform action - target out of range!")]
    OutOfRange { distance: u32, range: u32 },

    #[error("Can't perform action - weapon requires both hands!")]
    TwoHandedWeapon,

    #[error("Can't perform action - no ammo!")]
    NoAmmo,

    #[error("Can't perform action - not enough ammo!")]
    NotEnoughAmmo,

    #[error("Can't perform action - no weapon or firemode!")]
    NoWeapon,

    #[error("Can't perform action - impossible throw!")]
    ImpossibleThrow,

    #[error("Can't perform action - shooter is out of action!")]
    ShooterIncapacitated,
}

/// Failure of an engine operation.
#[derive(Debug, Error)]
pub enum CombatError {
    #[error(transparent)]
    Shot(#[from] ShotError),

    #[error("Entity not found: {0:?}")]
    EntityNotFound(EntityNumber),

    #[error("Unit {0:?} is not on the active team")]
    NotActiveTeam(EntityNumber),

    #[error("Internal invariant violated: {0}")]
    Internal(String),
}

/// Failure while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type CombatResult<T> = std::result::Result<T, CombatError>;
