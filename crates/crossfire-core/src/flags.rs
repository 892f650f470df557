//! Bit sets: unit state, surface contents, team visibility, shot flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::enums::{MentalState, ReactionMode};
use crate::types::TeamId;

bitflags! {
    /// Per-unit state bits.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct StateFlags: u16 {
        const DEAD          = 1 << 0;
        const STUNNED       = 1 << 1;
        const CROUCHED      = 1 << 2;
        const PANIC         = 1 << 3;
        const RAGE          = 1 << 4;
        const INSANE        = 1 << 5;
        const DAZED         = 1 << 6;
        const REACTION_ONCE = 1 << 7;
        const REACTION_MANY = 1 << 8;
        const SHAKEN        = 1 << 9;

        const OUT_OF_ACTION = Self::DEAD.bits() | Self::STUNNED.bits();
        const REACTION = Self::REACTION_ONCE.bits() | Self::REACTION_MANY.bits();
    }
}

impl StateFlags {
    /// Dead or knocked out.
    pub fn is_out_of_action(self) -> bool {
        self.intersects(Self::OUT_OF_ACTION)
    }

    /// Crouched and panicking actors keep their eyes low.
    pub fn is_low(self) -> bool {
        self.intersects(Self::CROUCHED | Self::PANIC)
    }

    pub fn reaction_mode(self) -> ReactionMode {
        if self.contains(Self::REACTION_MANY) {
            ReactionMode::Many
        } else if self.contains(Self::REACTION_ONCE) {
            ReactionMode::Once
        } else {
            ReactionMode::Off
        }
    }

    pub fn set_reaction_mode(&mut self, mode: ReactionMode) {
        self.remove(Self::REACTION);
        match mode {
            ReactionMode::Off => {}
            ReactionMode::Once => self.insert(Self::REACTION_ONCE),
            ReactionMode::Many => self.insert(Self::REACTION_MANY),
        }
    }

    /// Most severe mental condition currently flagged.
    pub fn mental_state(self) -> MentalState {
        if self.contains(Self::INSANE) {
            MentalState::Insane
        } else if self.contains(Self::RAGE) {
            MentalState::Raging
        } else if self.contains(Self::PANIC) {
            MentalState::Panicked
        } else if self.contains(Self::SHAKEN) {
            MentalState::Shaken
        } else {
            MentalState::Calm
        }
    }
}

bitflags! {
    /// Content bits of a traced surface.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ContentFlags: u16 {
        /// Blocks projectiles and sight.
        const SOLID  = 1 << 0;
        /// Blocks projectiles but not sight.
        const WINDOW = 1 << 1;
        /// Combustible; fire and blast hits set it burning.
        const BURN   = 1 << 2;
        /// Entity bounding box.
        const BODY   = 1 << 3;
    }
}

bitflags! {
    /// Set of teams an event is delivered to.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TeamMask: u8 {
        const _ = !0;
    }
}

impl TeamMask {
    pub const ALL: TeamMask = TeamMask::from_bits_retain(u8::MAX);

    pub fn of(team: TeamId) -> Self {
        Self::from_bits_retain(1u8 << (team.0 & 7))
    }

    pub fn contains_team(self, team: TeamId) -> bool {
        self.contains(Self::of(team))
    }

    pub fn with(self, team: TeamId) -> Self {
        self | Self::of(team)
    }

    /// Every team not in this mask.
    pub fn inverse(self) -> Self {
        Self::from_bits_retain(!self.bits())
    }
}

bitflags! {
    /// Presentation hints attached to shot and throw events.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ShotFlags: u8 {
        const BODY     = 1 << 0;
        const IMPACT   = 1 << 1;
        const BOUNCING = 1 << 2;
        const BOUNCED  = 1 << 3;
    }
}
