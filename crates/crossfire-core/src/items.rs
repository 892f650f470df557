//! Weapon, ammunition and armour definitions.
//!
//! Definitions are immutable game data shared by every battle; units carry
//! lightweight [`Item`] instances that refer to them by [`ItemId`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::enums::{DamageKind, WeaponSkill};

/// Index of an item definition in the [`ItemCatalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u16);

/// One firing mode of one weapon/ammo pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireDefinition {
    pub name: String,
    /// TU cost of one trigger pull.
    pub time: i32,
    /// Direct damage: mean and variance.
    pub damage: [f32; 2],
    /// Splash damage: mean and variance.
    pub splash_damage: [f32; 2],
    pub damage_kind: DamageKind,
    /// Index into armour protection tables.
    pub damage_weight: usize,
    /// Angular spread, pitch and yaw (degrees).
    pub spread: [f32; 2],
    /// Multiplier on the skill-derived inaccuracy.
    pub modif: f32,
    /// Spread multiplier while crouched; zero means no crouch bonus.
    pub crouch: f32,
    pub shots: u32,
    /// Ammo consumed per projectile; zero for weapons without ammo.
    pub ammo: u32,
    pub splash_radius: f32,
    pub bounce: u32,
    /// Restitution applied to thrown projectiles on each bounce.
    pub bounce_factor: f32,
    pub through_wall: u32,
    /// Thrown along a ballistic arc rather than fired in a straight line.
    pub gravity: bool,
    pub launched: bool,
    pub rolled: bool,
    /// Fused: does not detonate on touching an actor.
    pub delay: bool,
    pub range: f32,
    /// Muzzle offset: sideways and height above the cell centre.
    pub shot_origin: [f32; 2],
    pub weapon_skill: WeaponSkill,
    /// Usable for reaction fire.
    pub reaction: bool,
    /// Reveals units inside the splash radius instead of damaging them.
    pub irgoggles: bool,
}

impl Default for FireDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            time: 0,
            damage: [0.0, 0.0],
            splash_damage: [0.0, 0.0],
            damage_kind: DamageKind::Normal,
            damage_weight: 0,
            spread: [0.0, 0.0],
            modif: 0.0,
            crouch: 0.0,
            shots: 1,
            ammo: 0,
            splash_radius: 0.0,
            bounce: 0,
            bounce_factor: 0.0,
            through_wall: 0,
            gravity: false,
            launched: false,
            rolled: false,
            delay: false,
            range: 0.0,
            shot_origin: [0.0, 0.0],
            weapon_skill: WeaponSkill::None,
            reaction: false,
            irgoggles: false,
        }
    }
}

impl FireDefinition {
    pub fn has_splash(&self) -> bool {
        self.splash_radius > 0.0
    }

    pub fn consumes_ammo(&self) -> bool {
        self.ammo > 0
    }
}

/// Static description of an item type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub is_weapon: bool,
    /// Weapon fired by throwing it.
    pub thrown: bool,
    /// Single use.
    pub oneshot: bool,
    /// Destroyed when used up.
    pub deplete: bool,
    pub two_handed: bool,
    /// Must be loaded with ammunition to fire.
    pub reload: bool,
    /// Firemodes, used when this item is the weapon and needs no ammo,
    /// or when this item is the ammunition loaded into a weapon.
    pub fire_defs: Vec<FireDefinition>,
    /// Armour protection per damage weight; empty for non-armour.
    pub protection: Vec<i32>,
}

impl ItemDef {
    pub fn is_armour(&self) -> bool {
        !self.protection.is_empty()
    }

    pub fn protection_against(&self, weight: usize) -> i32 {
        self.protection.get(weight).copied().unwrap_or(0)
    }
}

/// An item instance carried by a unit or lying on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub def: ItemId,
    /// Loaded ammunition type, if the weapon takes ammo.
    pub ammo_def: Option<ItemId>,
    /// Rounds remaining in the loaded ammunition.
    pub ammo: u32,
}

impl Item {
    pub fn new(def: ItemId) -> Self {
        Self {
            def,
            ammo_def: None,
            ammo: 0,
        }
    }

    pub fn loaded(def: ItemId, ammo_def: ItemId, ammo: u32) -> Self {
        Self {
            def,
            ammo_def: Some(ammo_def),
            ammo,
        }
    }
}

/// Registry of item definitions for a battle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemCatalog {
    defs: Vec<ItemDef>,
    #[serde(skip)]
    by_name: HashMap<String, ItemId>,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition and return its id.
    pub fn insert(&mut self, def: ItemDef) -> ItemId {
        let id = ItemId(self.defs.len() as u16);
        self.by_name.insert(def.id.clone(), id);
        self.defs.push(def);
        id
    }

    pub fn get(&self, id: ItemId) -> Option<&ItemDef> {
        self.defs.get(id.0 as usize)
    }

    pub fn find(&self, name: &str) -> Option<ItemId> {
        self.by_name.get(name).copied().or_else(|| {
            self.defs
                .iter()
                .position(|d| d.id == name)
                .map(|idx| ItemId(idx as u16))
        })
    }

    /// Firemodes usable with an item instance: the loaded ammo's modes,
    /// or the weapon's own modes when it takes no ammo.
    pub fn fire_defs_for(&self, item: &Item) -> Option<&[FireDefinition]> {
        let source = match item.ammo_def {
            Some(ammo) => self.get(ammo)?,
            None => self.get(item.def)?,
        };
        if source.fire_defs.is_empty() {
            None
        } else {
            Some(&source.fire_defs)
        }
    }

    /// A single firemode of an item instance.
    pub fn fire_def(&self, item: &Item, firemode: usize) -> Option<&FireDefinition> {
        self.fire_defs_for(item)?.get(firemode)
    }
}
