#[cfg(test)]
mod tests {
    use glam::Vec3;

    use crate::config::CombatConfig;
    use crate::constants::*;
    use crate::enums::*;
    use crate::error::{ConfigError, ShotError};
    use crate::events::{BattleEvent, EventRecord};
    use crate::flags::{StateFlags, TeamMask};
    use crate::items::{FireDefinition, Item, ItemCatalog, ItemDef};
    use crate::types::{Angles, Direction, EntityNumber, GridPos, TeamId};

    /// Verify all enums round-trip through serde_json.
    #[test]
    fn test_damage_kind_serde() {
        let variants = vec![
            DamageKind::Normal,
            DamageKind::Stun,
            DamageKind::Shock,
            DamageKind::Fire,
            DamageKind::Blast,
        ];
        for v in variants {
            let json = serde_json::to_string(&v).unwrap();
            let back: DamageKind = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_mental_state_serde_and_order() {
        let variants = vec![
            MentalState::Calm,
            MentalState::Shaken,
            MentalState::Panicked,
            MentalState::Raging,
            MentalState::Insane,
        ];
        for v in &variants {
            let json = serde_json::to_string(v).unwrap();
            let back: MentalState = serde_json::from_str(&json).unwrap();
            assert_eq!(*v, back);
        }
        assert!(variants.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_reaction_mode_serde() {
        for v in [ReactionMode::Off, ReactionMode::Once, ReactionMode::Many] {
            let json = serde_json::to_string(&v).unwrap();
            let back: ReactionMode = serde_json::from_str(&json).unwrap();
            assert_eq!(v, back);
        }
    }

    #[test]
    fn test_material_break_sounds() {
        assert_eq!(Material::Glass.break_sound(), Some("misc/breakglass"));
        assert_eq!(Material::Metal.break_sound(), Some("misc/breakmetal"));
        assert_eq!(Material::None.break_sound(), None);
    }

    // ---- Flags ----

    #[test]
    fn test_state_flags_reaction_mode() {
        let mut flags = StateFlags::CROUCHED;
        assert_eq!(flags.reaction_mode(), ReactionMode::Off);
        flags.set_reaction_mode(ReactionMode::Once);
        assert_eq!(flags.reaction_mode(), ReactionMode::Once);
        flags.set_reaction_mode(ReactionMode::Many);
        assert_eq!(flags.reaction_mode(), ReactionMode::Many);
        assert!(!flags.contains(StateFlags::REACTION_ONCE));
        flags.set_reaction_mode(ReactionMode::Off);
        assert!(!flags.intersects(StateFlags::REACTION));
        assert!(flags.contains(StateFlags::CROUCHED));
    }

    #[test]
    fn test_state_flags_mental_state_picks_worst() {
        let flags = StateFlags::SHAKEN | StateFlags::PANIC;
        assert_eq!(flags.mental_state(), MentalState::Panicked);
        assert_eq!(StateFlags::empty().mental_state(), MentalState::Calm);
        assert_eq!((flags | StateFlags::INSANE).mental_state(), MentalState::Insane);
    }

    #[test]
    fn test_out_of_action() {
        assert!(StateFlags::DEAD.is_out_of_action());
        assert!(StateFlags::STUNNED.is_out_of_action());
        assert!(!StateFlags::DAZED.is_out_of_action());
    }

    #[test]
    fn test_team_mask() {
        let mask = TeamMask::of(TeamId::PHALANX).with(TeamId::ALIEN);
        assert!(mask.contains_team(TeamId::PHALANX));
        assert!(mask.contains_team(TeamId::ALIEN));
        assert!(!mask.contains_team(TeamId::CIVILIAN));
        let inverse = mask.inverse();
        assert!(inverse.contains_team(TeamId::CIVILIAN));
        assert!(!inverse.contains_team(TeamId::ALIEN));
        assert_eq!(mask | inverse, TeamMask::ALL);
    }

    // ---- Geometry ----

    #[test]
    fn test_grid_center_and_containing() {
        let cell = GridPos::new(3, 5, 1);
        let center = cell.center();
        assert_eq!(center, Vec3::new(112.0, 176.0, 96.0));
        assert_eq!(GridPos::containing(center), cell);
    }

    #[test]
    fn test_direction_towards() {
        let from = GridPos::new(0, 0, 0);
        assert_eq!(Direction::towards(from, GridPos::new(5, 0, 0)), Direction::EAST);
        assert_eq!(Direction::towards(from, GridPos::new(0, 5, 0)), Direction::NORTH);
        assert_eq!(Direction::towards(from, GridPos::new(-5, 0, 0)), Direction::WEST);
        assert_eq!(Direction::towards(from, GridPos::new(0, -5, 0)), Direction::SOUTH);
        assert_eq!(Direction::towards(from, GridPos::new(3, 3, 0)), Direction(1));
    }

    #[test]
    fn test_angles_round_trip() {
        let dir = Vec3::new(1.0, 1.0, 0.5).normalize();
        let back = Angles::from_vec(dir).forward();
        assert!((dir - back).length() < 1e-5);
    }

    // ---- Derived stats ----

    #[test]
    fn test_derived_stat_caps() {
        assert_eq!(max_hp_for_power(0), 80);
        assert_eq!(max_hp_for_power(100), 170);
        assert_eq!(max_hp_for_power(300), 255);
        assert_eq!(max_morale_for_mind(0), 100);
        assert_eq!(max_morale_for_mind(100), 250);
    }

    #[test]
    fn test_inaccuracy() {
        assert!((inaccuracy(0, 0) - 1.0).abs() < 1e-6);
        assert!((inaccuracy(100, 100) - 0.0).abs() < 1e-6);
        assert!((inaccuracy(50, 30) - 0.6).abs() < 1e-6);
    }

    // ---- Items ----

    #[test]
    fn test_catalog_fire_defs_prefer_loaded_ammo() {
        let mut catalog = ItemCatalog::new();
        let rifle = catalog.insert(ItemDef {
            id: "rifle".into(),
            is_weapon: true,
            reload: true,
            ..Default::default()
        });
        let mag = catalog.insert(ItemDef {
            id: "rifle_ammo".into(),
            fire_defs: vec![
                FireDefinition {
                    name: "snap".into(),
                    time: 8,
                    ..Default::default()
                },
                FireDefinition {
                    name: "burst".into(),
                    time: 14,
                    shots: 3,
                    ammo: 1,
                    ..Default::default()
                },
            ],
            ..Default::default()
        });

        assert_eq!(catalog.find("rifle_ammo"), Some(mag));
        let empty = Item::new(rifle);
        assert!(catalog.fire_defs_for(&empty).is_none());

        let loaded = Item::loaded(rifle, mag, 20);
        assert_eq!(catalog.fire_def(&loaded, 1).map(|fd| fd.shots), Some(3));
        assert!(catalog.fire_def(&loaded, 2).is_none());
    }

    #[test]
    fn test_armour_protection_lookup() {
        let armour = ItemDef {
            id: "armour".into(),
            protection: vec![10, 4],
            ..Default::default()
        };
        assert!(armour.is_armour());
        assert_eq!(armour.protection_against(0), 10);
        assert_eq!(armour.protection_against(1), 4);
        assert_eq!(armour.protection_against(7), 0);
    }

    #[test]
    fn test_fire_definition_from_partial_json() {
        let fd: FireDefinition =
            serde_json::from_str(r#"{"name":"throw","time":12,"gravity":true,"bounce":3}"#).unwrap();
        assert!(fd.gravity);
        assert_eq!(fd.bounce, 3);
        assert_eq!(fd.shots, 1);
        assert!(!fd.has_splash());
    }

    // ---- Events ----

    #[test]
    fn test_event_record_serde() {
        let record = EventRecord::new(
            TeamMask::of(TeamId::ALIEN),
            BattleEvent::StateChanged {
                entity: EntityNumber(4),
                flags: StateFlags::DEAD | StateFlags::CROUCHED,
            },
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("StateChanged"));
        let back: EventRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn test_broadcast_reaches_everyone() {
        let record = EventRecord::broadcast(BattleEvent::EntityDestroyed {
            entity: EntityNumber(1),
        });
        for team in 0..MAX_TEAMS as u8 {
            assert!(record.mask.contains_team(TeamId(team)));
        }
    }

    // ---- Errors ----

    #[test]
    fn test_shot_error_messages() {
        assert_eq!(ShotError::SelfTarget.to_string(), "Can't shoot yourself!");
        let err = ShotError::InsufficientTimeUnits {
            required: 8,
            available: 3,
        };
        assert!(err.to_string().contains("not enough TUs"));
    }

    // ---- Configuration ----

    #[test]
    fn test_config_defaults() {
        let config = CombatConfig::default();
        assert_eq!(config.mock_trials, 100);
        assert_eq!(config.collateral.for_state(MentalState::Calm), 5);
        assert_eq!(config.collateral.for_state(MentalState::Insane), 100);
        assert!((config.morale.mof_watching - 1.7).abs() < 1e-6);
        assert!((config.morale.mor_shaken - 50.0).abs() < 1e-6);
        assert!((config.morale.mor_panic - 30.0).abs() < 1e-6);
        assert!((config.morale.m_rage_stop - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_config_partial_toml_override() {
        let text = r#"
            reaction_leftover = 2
            difficulty = 3

            [morale]
            mob_death = 20.0

            [collateral]
            panicked = 40
        "#;
        let config = CombatConfig::from_toml_str(text).unwrap();
        assert_eq!(config.reaction_leftover, 2);
        assert_eq!(config.difficulty, 3);
        assert!((config.morale.mob_death - 20.0).abs() < 1e-6);
        assert!((config.morale.mob_wound - 0.1).abs() < 1e-6);
        assert_eq!(config.collateral.panicked, 40);
        assert_eq!(config.collateral.calm, 5);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let mut config = CombatConfig::default();
        config.no_damage = true;
        config.morale.mor_pain = 2.5;
        let text = config.to_toml_string().unwrap();
        let back = CombatConfig::from_toml_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        let err = CombatConfig::from_toml_str("mock_trials = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "mock_trials", .. }));
        let err = CombatConfig::from_toml_str("[morale]\nmor_panic = -1.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "morale.mor_panic", .. }));
        let err = CombatConfig::from_toml_str("mock_trials = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_difficulty_factor() {
        let mut config = CombatConfig::default();
        assert_eq!(config.difficulty_factor(true, false), 1.0);
        config.difficulty = 2;
        assert!((config.difficulty_factor(true, false) - 1.69).abs() < 1e-4);
        assert!((config.difficulty_factor(false, true) - 1.0 / 1.69).abs() < 1e-4);
        assert_eq!(config.difficulty_factor(true, true), 1.0);
        config.single_player = false;
        assert_eq!(config.difficulty_factor(true, false), 1.0);
    }
}
