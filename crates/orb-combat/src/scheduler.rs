//! Tick Scheduler.
//!
//! One frame step per living entity, in this order:
//!
//! 1. Verify stack invariants. A violation halts the entity for the frame.
//! 2. Accumulate periodic timers and resolve due ticks in insertion order.
//! 3. Decrement durations and drop expired instances.
//! 4. Progress casting slots and cooldowns.
//! 5. Regenerate resources.
//!
//! An entity's step reads and writes only that entity, so the order
//! entities are stepped in cannot change any entity's outcome. Casts that
//! complete during the step are returned and resolved by the engine after
//! every entity has been stepped.

use orb_common::{AbilityId, EffectId, EntityId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::cast::{progress_slots, scaled_cooldown, SlotEvent, TargetHint};
use crate::catalog::{Catalog, ResourceKind, TickAction};
use crate::config::EngineConfig;
use crate::damage::{DamageOutcome, Hit};
use crate::entity::EntityCombatState;
use crate::error::FaultError;
use crate::events::{CombatEvent, EventBus};
use crate::stats::Stat;

/// Shared read-only inputs of a frame.
#[derive(Clone, Copy)]
pub(crate) struct FrameEnv<'a> {
    pub catalog: &'a Catalog,
    pub config: &'a EngineConfig,
    pub events: &'a EventBus,
}

/// Summary of one `advance` call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Seconds simulated after clamping.
    pub delta: f32,
    /// Entities stepped.
    pub entities: usize,
    /// Periodic ticks resolved.
    pub ticks: u32,
    /// Instances expired.
    pub expired: u32,
    /// Casts completed and resolved.
    pub casts_completed: u32,
    /// Entities halted by an invariant fault.
    pub faults: Vec<FaultError>,
}

/// A cast whose channel finished this frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingCast {
    pub caster: EntityId,
    pub ability: AbilityId,
    pub target: TargetHint,
}

/// Result of stepping one entity.
#[derive(Debug, Default)]
pub(crate) struct EntityStep {
    pub ticks: u32,
    pub expired: u32,
    pub completed: Vec<PendingCast>,
}

struct DueTick {
    effect: EffectId,
    source: Option<EntityId>,
    action: TickAction,
    stacks: u32,
    count: u32,
}

/// The single damage path: mitigation, shield, hp, death.
pub(crate) fn apply_hit(
    state: &mut EntityCombatState,
    hit: &Hit,
    env: FrameEnv<'_>,
) -> DamageOutcome {
    let outcome = state.take_hit(hit, env.catalog, env.config.resistance_cap);
    if outcome.ignored {
        return outcome;
    }

    env.events.publish(CombatEvent::Damaged {
        entity: state.id(),
        source: hit.source,
        damage_type: hit.damage_type,
        absorbed: outcome.absorbed,
        dealt: outcome.dealt,
    });

    if outcome.killed {
        let cleanup = state.on_death();
        if let Some(ability) = cleanup.interrupted {
            env.events.publish(CombatEvent::CastInterrupted {
                caster: state.id(),
                ability,
            });
        }
        debug!(
            "{} died, released {} effects",
            state.id(),
            cleanup.released.len()
        );
        env.events.publish(CombatEvent::Died {
            entity: state.id(),
            killer: hit.source,
        });
    }
    outcome
}

/// Check every instance against its definition.
pub(crate) fn verify_stacks(
    state: &EntityCombatState,
    catalog: &Catalog,
) -> Result<(), FaultError> {
    for instance in state.effects().iter() {
        let Some(def) = catalog.effect(instance.effect()) else {
            return Err(FaultError::MissingDefinition {
                entity: state.id(),
                effect: instance.effect().clone(),
            });
        };
        let cap = def.stack_cap();
        if instance.stacks() == 0 || instance.stacks() > cap {
            return Err(FaultError::InvalidStackState {
                entity: state.id(),
                effect: instance.effect().clone(),
                stacks: instance.stacks(),
                cap,
            });
        }
    }
    Ok(())
}

/// Advance one entity by `dt` seconds.
pub(crate) fn step_entity(
    state: &mut EntityCombatState,
    dt: f32,
    env: FrameEnv<'_>,
) -> Result<EntityStep, FaultError> {
    let mut step = EntityStep::default();
    if !state.is_alive() {
        return Ok(step);
    }

    if let Err(fault) = verify_stacks(state, env.catalog) {
        error!("Halting {} for this frame: {}", state.id(), fault);
        return Err(fault);
    }

    resolve_ticks(state, dt, env, &mut step);
    if !state.is_alive() {
        return Ok(step);
    }

    expire_effects(state, dt, env, &mut step);
    progress_casts(state, dt, env, &mut step);

    if env.config.regen_enabled {
        regenerate(state, dt, env);
    }

    Ok(step)
}

fn resolve_ticks(
    state: &mut EntityCombatState,
    dt: f32,
    env: FrameEnv<'_>,
    step: &mut EntityStep,
) {
    let mut due = Vec::new();
    for instance in state.effects_mut().instances_mut() {
        let Some(tick) = env.catalog.effect(instance.effect()).and_then(|d| d.tick()) else {
            continue;
        };
        let count = instance.accumulate(dt, tick.interval);
        if count > 0 {
            due.push(DueTick {
                effect: instance.effect().clone(),
                source: instance.source(),
                action: tick.action,
                stacks: instance.stacks(),
                count,
            });
        }
    }

    for tick in due {
        for _ in 0..tick.count {
            if !state.is_alive() {
                return;
            }
            let scale = tick.stacks as f32;
            match tick.action {
                TickAction::Damage {
                    amount,
                    damage_type,
                } => {
                    let hit = Hit::periodic(amount * scale, damage_type, tick.source);
                    let outcome = apply_hit(state, &hit, env);
                    env.events.publish(CombatEvent::PeriodicDamage {
                        entity: state.id(),
                        effect: tick.effect.clone(),
                        amount: outcome.total(),
                        damage_type,
                    });
                },
                TickAction::Restore { resource, amount } => {
                    let gained = state.restore(
                        resource,
                        amount * scale,
                        env.catalog,
                        env.config.resistance_cap,
                        env.config.shield_cap,
                    );
                    env.events.publish(CombatEvent::PeriodicRestore {
                        entity: state.id(),
                        effect: tick.effect.clone(),
                        resource,
                        amount: gained,
                    });
                },
            }
            step.ticks += 1;
        }
    }
}

fn expire_effects(
    state: &mut EntityCombatState,
    dt: f32,
    env: FrameEnv<'_>,
    step: &mut EntityStep,
) {
    for instance in state.effects_mut().instances_mut() {
        instance.elapse(dt);
    }
    let expired = state.effects_mut().take_expired();
    if expired.is_empty() {
        return;
    }

    let mut dirty = false;
    for instance in &expired {
        dirty |= env
            .catalog
            .effect(instance.effect())
            .is_some_and(|d| d.affects_stats());
        env.events.publish(CombatEvent::EffectExpired {
            entity: state.id(),
            effect: instance.effect().clone(),
        });
    }
    step.expired += expired.len() as u32;

    if dirty {
        state.mark_dirty();
        state.clamp_resources(
            env.catalog,
            env.config.resistance_cap,
            env.config.shield_cap,
        );
    }
}

fn progress_casts(
    state: &mut EntityCombatState,
    dt: f32,
    env: FrameEnv<'_>,
    step: &mut EntityStep,
) {
    if state.slots().iter().all(|s| s.is_ready()) {
        return;
    }

    let stats = state
        .effective_stats(env.catalog, env.config.resistance_cap)
        .clone();
    let can_cast = stats.control.can_cast();
    let catalog = env.catalog;
    let events = progress_slots(state.slots_mut(), dt, can_cast, |id| {
        catalog.ability(id).map_or(0.0, |a| scaled_cooldown(a, &stats))
    });

    for event in events {
        match event {
            SlotEvent::Completed { ability, target } => step.completed.push(PendingCast {
                caster: state.id(),
                ability,
                target,
            }),
            SlotEvent::Interrupted { ability } => {
                debug!("{} cast of {} interrupted", state.id(), ability);
                env.events.publish(CombatEvent::CastInterrupted {
                    caster: state.id(),
                    ability,
                });
            },
        }
    }
}

fn regenerate(state: &mut EntityCombatState, dt: f32, env: FrameEnv<'_>) {
    let stats = state.effective_stats(env.catalog, env.config.resistance_cap);
    let regen = [
        (ResourceKind::Hp, stats.get(Stat::HpRegen)),
        (ResourceKind::Mana, stats.get(Stat::ManaRegen)),
        (ResourceKind::Stamina, stats.get(Stat::StaminaRegen)),
    ];
    for (resource, rate) in regen {
        state.restore(
            resource,
            rate * dt,
            env.catalog,
            env.config.resistance_cap,
            env.config.shield_cap,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EffectDefinition, TickSpec};
    use crate::damage::DamageType;
    use crate::entity::EntityKind;
    use crate::stats::{BaseStats, Modifier};

    fn catalog() -> Catalog {
        let mut builder = Catalog::builder();
        builder
            .add_effect(
                EffectDefinition::debuff("bleed", "Bleed")
                    .with_duration(6.0)
                    .with_max_stacks(5)
                    .with_tick(TickSpec::damage(20.0, 1.0, DamageType::True)),
            )
            .unwrap()
            .add_effect(
                EffectDefinition::buff("haste", "Haste")
                    .with_duration(5.0)
                    .with_modifiers([Modifier::percent(Stat::Speed, 0.3)]),
            )
            .unwrap();
        builder.build().unwrap()
    }

    fn quiet_config() -> EngineConfig {
        EngineConfig {
            regen_enabled: false,
            ..EngineConfig::default()
        }
    }

    fn spawn(catalog: &Catalog) -> EntityCombatState {
        let mut state = EntityCombatState::new(
            EntityId::from_raw(1),
            EntityKind::Enemy,
            "Dummy".into(),
            BaseStats::new().with_hp(1000.0),
        );
        state.refill(catalog, 0.8);
        state
    }

    fn apply(state: &mut EntityCombatState, catalog: &Catalog, id: &str) {
        let def = catalog.effect(&id.into()).unwrap();
        state.effects_mut().apply(def, None);
        state.mark_dirty();
    }

    #[test]
    fn test_dot_ticks_then_expires() {
        let catalog = catalog();
        let config = quiet_config();
        let bus = EventBus::new(256);
        let env = FrameEnv {
            catalog: &catalog,
            config: &config,
            events: &bus,
        };
        let mut state = spawn(&catalog);
        apply(&mut state, &catalog, "bleed");

        let step = step_entity(&mut state, 6.0, env).unwrap();
        assert_eq!(step.ticks, 6);
        assert_eq!(step.expired, 1);
        assert!(state.effects().is_empty());
        assert!((state.resources().hp - 880.0).abs() < 1e-3);
    }

    #[test]
    fn test_dot_scales_with_stacks() {
        let catalog = catalog();
        let config = quiet_config();
        let bus = EventBus::new(256);
        let env = FrameEnv {
            catalog: &catalog,
            config: &config,
            events: &bus,
        };
        let mut state = spawn(&catalog);
        apply(&mut state, &catalog, "bleed");
        apply(&mut state, &catalog, "bleed");

        step_entity(&mut state, 1.0, env).unwrap();
        assert!((state.resources().hp - 960.0).abs() < 1e-3);
    }

    #[test]
    fn test_expiry_marks_stats_dirty() {
        let catalog = catalog();
        let config = quiet_config();
        let bus = EventBus::new(256);
        let env = FrameEnv {
            catalog: &catalog,
            config: &config,
            events: &bus,
        };
        let mut state = spawn(&catalog);
        apply(&mut state, &catalog, "haste");
        let hasted = state.effective_stats(&catalog, 0.8).speed();

        step_entity(&mut state, 5.0, env).unwrap();
        let speed = state.effective_stats(&catalog, 0.8).speed();
        assert!(speed < hasted);
        assert!(bus
            .drain()
            .iter()
            .any(|e| matches!(e, CombatEvent::EffectExpired { .. })));
    }

    #[test]
    fn test_invalid_stack_state_halts_entity() {
        let catalog = catalog();
        let config = quiet_config();
        let bus = EventBus::new(256);
        let env = FrameEnv {
            catalog: &catalog,
            config: &config,
            events: &bus,
        };
        let mut state = spawn(&catalog);
        apply(&mut state, &catalog, "bleed");
        state.effects_mut().instances_mut()[0].force_stacks(9);

        let hp = state.resources().hp;
        let fault = step_entity(&mut state, 1.0, env).unwrap_err();
        assert!(matches!(fault, FaultError::InvalidStackState { stacks: 9, cap: 5, .. }));
        assert_eq!(state.resources().hp, hp);
    }

    #[test]
    fn test_regeneration_clamps_to_max() {
        let catalog = catalog();
        let config = EngineConfig::default();
        let bus = EventBus::new(16);
        let env = FrameEnv {
            catalog: &catalog,
            config: &config,
            events: &bus,
        };
        let mut state = spawn(&catalog);
        state.resources_mut().hp = 999.0;
        state.resources_mut().mana = 0.0;
        step_entity(&mut state, 2.0, env).unwrap();
        assert_eq!(state.resources().hp, 1000.0);
        assert!((state.resources().mana - 6.0).abs() < 1e-4);
    }
}
