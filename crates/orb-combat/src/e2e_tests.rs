//! End-to-end tests for the combat engine.
//!
//! These drive [`CombatEngine`] the way the frame loop does: spawn, equip,
//! apply, cast and advance, then check what a player would observe.

#![cfg(test)]

use std::sync::Arc;

use orb_common::{AbilityId, EffectId, EntityId, LoadoutId};

use crate::cast::{CastOutcome, TargetHint};
use crate::catalog::{
    AbilityDefinition, Catalog, EffectDefinition, EquipSlot, EquipmentPiece, LoadoutDefinition,
    TargetType,
};
use crate::config::EngineConfig;
use crate::content::builtin_catalog;
use crate::effects::AppliedOutcome;
use crate::engine::CombatEngine;
use crate::entity::EntityKind;
use crate::error::{CastError, EffectError};
use crate::events::CombatEvent;
use crate::loadout::Rarity;
use crate::stats::{BaseStats, Modifier, Stat};

fn builtin_engine() -> CombatEngine {
    let config = EngineConfig {
        regen_enabled: false,
        ..EngineConfig::default()
    };
    CombatEngine::new(Arc::new(builtin_catalog().unwrap()), config)
}

fn spawn_dummy(engine: &mut CombatEngine) -> EntityId {
    engine.spawn(
        EntityKind::Enemy,
        "Training Dummy",
        BaseStats::new().with_hp(1000.0),
    )
}

/// Effect store behavior seen through the engine
mod effect_tests {
    use super::*;

    #[test]
    fn e2e_stack_cap_is_never_exceeded() {
        let mut engine = builtin_engine();
        let dummy = spawn_dummy(&mut engine);
        let slow = EffectId::new("slow");

        let outcomes: Vec<_> = (0..5)
            .map(|_| engine.apply_effect(dummy, &slow, None).unwrap())
            .collect();

        assert_eq!(outcomes[4], AppliedOutcome::StackCapped);
        let active = engine.list_active(dummy).unwrap();
        assert_eq!(active.len(), 1, "Stacks live on one instance");
        assert_eq!(active.get(&slow).unwrap().stacks(), 4);
    }

    #[test]
    fn e2e_refresh_resets_duration_without_duplicating() {
        let mut engine = builtin_engine();
        let dummy = spawn_dummy(&mut engine);
        let haste = EffectId::new("haste");

        engine.apply_effect(dummy, &haste, None).unwrap();
        engine.advance(2.0);
        let remaining = engine.list_active(dummy).unwrap().get(&haste).unwrap().remaining();
        assert_eq!(remaining, Some(3.0));

        let outcome = engine.apply_effect(dummy, &haste, None).unwrap();
        assert_eq!(outcome, AppliedOutcome::Refreshed);
        let active = engine.list_active(dummy).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active.get(&haste).unwrap().remaining(), Some(5.0));
    }

    #[test]
    fn e2e_removal_releases_all_instances() {
        let mut engine = builtin_engine();
        let dummy = spawn_dummy(&mut engine);
        for effect in ["slow", "bleed", "weakness"] {
            engine
                .apply_effect(dummy, &EffectId::new(effect), None)
                .unwrap();
        }

        let released = engine.remove_entity(dummy).unwrap();
        assert_eq!(released.len(), 3);
        assert!(engine.list_active(dummy).is_none());
        assert_eq!(
            engine.apply_effect(dummy, &EffectId::new("slow"), None),
            Err(EffectError::UnknownEntity(dummy))
        );
    }

    #[test]
    fn e2e_cleanse_wave_strips_debuffs_only() {
        let mut engine = builtin_engine();
        let hero = engine.spawn(EntityKind::Player, "Hero", BaseStats::new());
        engine
            .set_abilities(hero, vec![AbilityId::new("cleanse_wave")])
            .unwrap();
        engine
            .apply_effect(hero, &EffectId::new("poison"), None)
            .unwrap();
        engine
            .apply_effect(hero, &EffectId::new("haste"), None)
            .unwrap();

        engine
            .cast_ability(hero, &AbilityId::new("cleanse_wave"), TargetHint::SelfOnly)
            .unwrap();
        engine.advance(1.0);

        let active = engine.list_active(hero).unwrap();
        assert!(!active.contains(&EffectId::new("poison")));
        assert!(active.contains(&EffectId::new("haste")));
    }
}

/// Frame stepping: periodic ticks, expiry and shields
mod scheduler_tests {
    use super::*;

    #[test]
    fn e2e_dot_ticks_floor_of_duration_over_interval() {
        let mut engine = builtin_engine();
        let dummy = spawn_dummy(&mut engine);
        let burn = EffectId::new("arcane_burn");
        engine.apply_effect(dummy, &burn, None).unwrap();
        engine.events().drain();

        // 3 s at 0.5 s intervals, stepped at 4 fps
        for _ in 0..12 {
            engine.advance(0.25);
        }

        let ticks = engine
            .events()
            .drain()
            .into_iter()
            .filter(|e| matches!(e, CombatEvent::PeriodicDamage { effect, .. } if *effect == burn))
            .count();
        assert_eq!(ticks, 6);
        assert!(
            !engine.list_active(dummy).unwrap().contains(&burn),
            "DoT should be gone once its duration has elapsed"
        );
    }

    #[test]
    fn e2e_single_long_frame_ticks_the_same() {
        let mut engine = builtin_engine();
        let dummy = spawn_dummy(&mut engine);
        engine
            .apply_effect(dummy, &EffectId::new("arcane_burn"), None)
            .unwrap();

        let report = engine.advance(3.0);
        assert_eq!(report.ticks, 6);
        assert_eq!(report.expired, 1);
    }

    #[test]
    fn e2e_shield_absorbs_before_hp() {
        let mut engine = builtin_engine();
        let dummy = spawn_dummy(&mut engine);
        engine
            .apply_effect(dummy, &EffectId::new("fortified"), None)
            .unwrap();
        engine
            .apply_effect(dummy, &EffectId::new("bleed"), None)
            .unwrap();

        engine.advance(1.0);

        let pools = engine.resources(dummy).unwrap();
        assert_eq!(pools.hp, 1000.0, "Shield should soak the bleed tick");
        assert!(pools.shield < 300.0);
    }

    #[test]
    fn e2e_dot_kill_reports_death() {
        let mut engine = builtin_engine();
        let victim = engine.spawn(EntityKind::Creature, "Rat", BaseStats::new().with_hp(30.0));
        engine
            .apply_effect(victim, &EffectId::new("arcane_burn"), None)
            .unwrap();

        engine.advance(1.0);

        assert!(!engine.entity(victim).unwrap().is_alive());
        assert!(engine.list_active(victim).unwrap().is_empty());
        assert!(engine
            .events()
            .drain()
            .iter()
            .any(|e| matches!(e, CombatEvent::Died { entity, .. } if *entity == victim)));
    }
}

/// Stat aggregation through the engine
mod stats_tests {
    use super::*;

    fn stat_catalog() -> Arc<Catalog> {
        let mut builder = Catalog::builder();
        builder
            .add_effect(
                EffectDefinition::buff("might", "Might")
                    .with_duration(10.0)
                    .with_modifiers([Modifier::percent(Stat::Attack, 0.10)]),
            )
            .unwrap()
            .add_effect(
                EffectDefinition::buff("valor", "Valor")
                    .with_duration(10.0)
                    .with_modifiers([Modifier::percent(Stat::Attack, 0.10)]),
            )
            .unwrap()
            .add_effect(
                EffectDefinition::buff("quicken", "Quicken")
                    .with_duration(10.0)
                    .with_modifiers([Modifier::flat(Stat::CooldownReduction, 0.20)]),
            )
            .unwrap()
            .add_ability(AbilityDefinition::passive(
                "swift_mind",
                "Swift Mind",
                [Modifier::flat(Stat::CooldownReduction, 0.20)],
            ))
            .unwrap()
            .add_ability(
                AbilityDefinition::new("blink", "Blink", TargetType::Target)
                    .with_costs(0.0, 10.0, 0.0),
            )
            .unwrap()
            .add_loadout(
                LoadoutDefinition::new("swift_kit", "Swift Kit", Rarity::Common)
                    .with_piece(
                        EquipmentPiece::new(EquipSlot::Neck, "Hourglass")
                            .with_bonus(Stat::CooldownReduction, 0.20),
                    )
                    .with_abilities(["blink"])
                    .with_passives(["swift_mind"]),
            )
            .unwrap()
            .add_loadout(
                LoadoutDefinition::new("epic_blade", "Epic Blade", Rarity::Common).with_piece(
                    EquipmentPiece::new(EquipSlot::Weapon, "Blade").with_bonus(Stat::Attack, 4.0),
                ),
            )
            .unwrap();
        Arc::new(builder.build().unwrap())
    }

    fn stat_engine() -> CombatEngine {
        CombatEngine::new(stat_catalog(), EngineConfig::default())
    }

    #[test]
    fn e2e_percent_sources_sum_before_applying() {
        let mut engine = stat_engine();
        let hero = engine.spawn(
            EntityKind::Player,
            "Hero",
            BaseStats::zeroed().with_attack(100.0),
        );
        engine
            .apply_effect(hero, &EffectId::new("might"), None)
            .unwrap();
        engine
            .apply_effect(hero, &EffectId::new("valor"), None)
            .unwrap();

        let attack = engine.effective_stats(hero).unwrap().attack();
        assert!(
            (attack - 120.0).abs() < 1e-3,
            "Two +10% sources give 120, not 121 (got {attack})"
        );
    }

    #[test]
    fn e2e_repeated_reads_hit_the_cache() {
        let mut engine = stat_engine();
        let hero = engine.spawn(EntityKind::Player, "Hero", BaseStats::new());
        engine
            .apply_effect(hero, &EffectId::new("might"), None)
            .unwrap();

        let first = engine.effective_stats(hero).unwrap().clone();
        let count = engine.entity(hero).unwrap().recompute_count();
        let second = engine.effective_stats(hero).unwrap().clone();

        assert_eq!(first, second);
        assert_eq!(engine.entity(hero).unwrap().recompute_count(), count);
        assert!(engine.entity(hero).unwrap().is_cached());
    }

    #[test]
    fn e2e_cdr_from_all_sources_is_capped() {
        let mut engine = stat_engine();
        let hero = engine.spawn(EntityKind::Player, "Hero", BaseStats::new());
        engine
            .equip_loadout(hero, &LoadoutId::new("swift_kit"), 1, None)
            .unwrap();
        engine
            .apply_effect(hero, &EffectId::new("quicken"), None)
            .unwrap();

        assert_eq!(engine.effective_stats(hero).unwrap().cdr(), 0.45);

        let outcome = engine
            .cast_ability(hero, &AbilityId::new("blink"), TargetHint::SelfOnly)
            .unwrap();
        assert!(matches!(outcome, CastOutcome::Completed(_)));
        let cooldown = engine.entity(hero).unwrap().slots()[0].cooldown_remaining();
        assert!((cooldown - 5.5).abs() < 1e-4, "cooldown was {cooldown}");
    }

    #[test]
    fn e2e_epic_level_three_scaling() {
        let mut engine = stat_engine();
        let hero = engine.spawn(
            EntityKind::Player,
            "Hero",
            BaseStats::zeroed().with_attack(10.0),
        );
        let bonuses = engine
            .equip_loadout(hero, &LoadoutId::new("epic_blade"), 3, Some(Rarity::Epic))
            .unwrap();

        assert_eq!(bonuses.get(Stat::Attack), 9.0);
        assert_eq!(engine.effective_stats(hero).unwrap().attack(), 19.0);
        let equipped = engine.entity(hero).unwrap().loadout().unwrap();
        assert_eq!(equipped.rarity, Rarity::Epic);
        assert_eq!(equipped.level, 3);
    }
}

/// Casting through the engine
mod cast_tests {
    use super::*;

    fn mage(engine: &mut CombatEngine) -> EntityId {
        let mage = engine.spawn(EntityKind::Player, "Ember", BaseStats::new());
        engine
            .equip_loadout(mage, &LoadoutId::new("mage_destruction_basic"), 1, None)
            .unwrap();
        mage
    }

    #[test]
    fn e2e_silenced_cast_changes_nothing() {
        let mut engine = builtin_engine();
        let mage = mage(&mut engine);
        engine
            .apply_effect(mage, &EffectId::new("silence"), None)
            .unwrap();
        let before = engine.resources(mage).unwrap();

        let result = engine.cast_ability(mage, &AbilityId::new("arc_bolt"), TargetHint::None);

        assert_eq!(result, Err(CastError::Silenced));
        assert_eq!(engine.resources(mage).unwrap(), before, "No mana spent");
        assert!(
            engine.entity(mage).unwrap().slots().iter().all(|s| s.is_ready()),
            "No cooldown started"
        );
    }

    #[test]
    fn e2e_channeled_cast_lands_on_target() {
        let mut engine = builtin_engine();
        let mage = mage(&mut engine);
        let dummy = spawn_dummy(&mut engine);

        let outcome = engine
            .cast_ability(mage, &AbilityId::new("arc_bolt"), TargetHint::Entity(dummy))
            .unwrap();
        let CastOutcome::Started { cast_time, .. } = outcome else {
            panic!("arc bolt should channel");
        };
        assert!(cast_time > 0.0);

        let mut completed = 0;
        for _ in 0..8 {
            completed += engine.advance(0.25).casts_completed;
        }

        assert_eq!(completed, 1);
        assert!(engine.resources(dummy).unwrap().hp < 1000.0);
        assert!(engine
            .events()
            .drain()
            .iter()
            .any(|e| matches!(e, CombatEvent::CastCompleted { caster, .. } if *caster == mage)));
    }

    #[test]
    fn e2e_passive_cannot_be_cast() {
        let mut engine = builtin_engine();
        let mage = mage(&mut engine);
        let result = engine.cast_ability(mage, &AbilityId::new("arcane_mastery"), TargetHint::None);
        assert_eq!(
            result,
            Err(CastError::PassiveAbility(AbilityId::new("arcane_mastery")))
        );
    }
}

/// Catalog files
mod catalog_tests {
    use super::*;

    #[test]
    fn e2e_engine_runs_on_catalog_loaded_from_ron() {
        let builtin = builtin_catalog().unwrap();
        let text = builtin.to_ron().unwrap();
        let loaded = Catalog::from_ron(&text).unwrap();
        assert_eq!(loaded.effect_count(), builtin.effect_count());
        assert_eq!(loaded.ability_count(), builtin.ability_count());
        assert_eq!(loaded.loadout_count(), builtin.loadout_count());

        let mut engine = CombatEngine::new(Arc::new(loaded), EngineConfig::default());
        let dummy = spawn_dummy(&mut engine);
        let outcome = engine
            .apply_effect(dummy, &EffectId::new("freeze"), None)
            .unwrap();
        assert_eq!(outcome, AppliedOutcome::Applied);
        assert!(engine
            .list_active(dummy)
            .unwrap()
            .contains(&EffectId::new("frozen")));
    }
}
