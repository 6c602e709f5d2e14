//! Combat engine façade.
//!
//! [`CombatEngine`] owns the entity population and is the only way world,
//! AI and UI code mutates combat state. Every operation returns a typed
//! result; a failure aborts that one operation and leaves all state as it
//! was.

use std::collections::BTreeMap;
use std::sync::Arc;

use orb_common::{AbilityId, EffectId, EntityId, EntityIdAllocator, LoadoutId};
use tracing::{debug, info};

use crate::cast::{
    self, scaled_amount, scaled_cooldown, CastOutcome, CastResolution, CasterView, HintResolver,
    TargetContext, TargetHint, TargetReport, TargetResolver,
};
use crate::catalog::{AbilityAction, AbilityDefinition, Catalog, EffectDefinition, ResourceKind};
use crate::config::EngineConfig;
use crate::damage::{outgoing_multiplier, DamageOutcome, Hit};
use crate::effects::{ActiveEffects, AppliedOutcome, CleanseFilter, EffectInstance};
use crate::entity::{EntityCombatState, EntityKind, EquippedLoadout, Resources};
use crate::error::{CastError, EffectError, LoadoutError};
use crate::events::{CombatEvent, EventBus};
use crate::loadout::{self, EquipmentBonuses, Rarity};
use crate::scheduler::{apply_hit, step_entity, FrameEnv, FrameReport};
use crate::stats::{BaseStats, EffectiveStats, Stat, StatDeltas};

/// The effect resolution engine.
pub struct CombatEngine {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    entities: BTreeMap<EntityId, EntityCombatState>,
    ids: EntityIdAllocator,
    resolver: Box<dyn TargetResolver>,
    events: EventBus,
}

impl CombatEngine {
    /// Create an engine over a catalog.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, mut config: EngineConfig) -> Self {
        config.validate();
        let events = EventBus::new(config.event_capacity);
        Self {
            catalog,
            config,
            entities: BTreeMap::new(),
            ids: EntityIdAllocator::new(),
            resolver: Box::new(HintResolver),
            events,
        }
    }

    /// Replace the target resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl TargetResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Replace the target resolver of a running engine.
    pub fn set_resolver(&mut self, resolver: impl TargetResolver + 'static) {
        self.resolver = Box::new(resolver);
    }

    /// Content catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Event bus the presentation layer drains.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    // ========================================================================
    // Population
    // ========================================================================

    /// Add an entity with full pools.
    pub fn spawn(&mut self, kind: EntityKind, name: impl Into<String>, base: BaseStats) -> EntityId {
        let id = self.ids.next_id();
        let mut state = EntityCombatState::new(id, kind, name.into(), base);
        state.refill(&self.catalog, self.config.resistance_cap);
        info!("Spawned {:?} {} '{}'", kind, id, state.name());
        self.entities.insert(id, state);
        self.events.publish(CombatEvent::EntitySpawned { entity: id });
        id
    }

    /// Remove an entity, releasing every effect it carried.
    pub fn remove_entity(&mut self, entity: EntityId) -> Result<Vec<EffectInstance>, EffectError> {
        let mut state = self
            .entities
            .remove(&entity)
            .ok_or(EffectError::UnknownEntity(entity))?;
        let released = state.effects_mut().clear();
        info!("Removed {}, released {} effects", entity, released.len());
        self.events.publish(CombatEvent::EntityRemoved {
            entity,
            released: released.len(),
        });
        Ok(released)
    }

    /// Entity state, if the entity exists.
    #[must_use]
    pub fn entity(&self, entity: EntityId) -> Option<&EntityCombatState> {
        self.entities.get(&entity)
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// IDs of every entity, ascending.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Number of entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Current pools.
    #[must_use]
    pub fn resources(&self, entity: EntityId) -> Option<Resources> {
        self.entities.get(&entity).map(|s| *s.resources())
    }

    /// Effective stats, recomputed only if something changed since the last
    /// read.
    pub fn effective_stats(&mut self, entity: EntityId) -> Option<&EffectiveStats> {
        let state = self.entities.get_mut(&entity)?;
        Some(state.effective_stats(&self.catalog, self.config.resistance_cap))
    }

    /// Active effects in insertion order.
    #[must_use]
    pub fn list_active(&self, entity: EntityId) -> Option<&ActiveEffects> {
        self.entities.get(&entity).map(EntityCombatState::effects)
    }

    /// Replace an entity's base stats.
    pub fn set_base_stats(&mut self, entity: EntityId, base: BaseStats) -> Result<(), EffectError> {
        let state = self
            .entities
            .get_mut(&entity)
            .ok_or(EffectError::UnknownEntity(entity))?;
        state.set_base(base);
        state.clamp_resources(
            &self.catalog,
            self.config.resistance_cap,
            self.config.shield_cap,
        );
        Ok(())
    }

    // ========================================================================
    // Effects
    // ========================================================================

    /// Attach an effect, applying its stacking policy.
    pub fn apply_effect(
        &mut self,
        entity: EntityId,
        effect: &EffectId,
        source: Option<EntityId>,
    ) -> Result<AppliedOutcome, EffectError> {
        let catalog = Arc::clone(&self.catalog);
        let def = catalog
            .effect(effect)
            .ok_or_else(|| EffectError::UnknownEffect(effect.clone()))?;
        let env = FrameEnv {
            catalog: &catalog,
            config: &self.config,
            events: &self.events,
        };
        let state = self
            .entities
            .get_mut(&entity)
            .ok_or(EffectError::UnknownEntity(entity))?;
        if !state.is_alive() {
            return Err(EffectError::TargetDead(entity));
        }
        Ok(attach(state, def, source, env))
    }

    /// Remove every effect matching `filter`. Returns the removed ids.
    pub fn cleanse_effects(
        &mut self,
        entity: EntityId,
        filter: &CleanseFilter,
    ) -> Result<Vec<EffectId>, EffectError> {
        self.cleanse_effects_where(entity, |_, def| filter.matches(def))
    }

    /// Remove every effect for which `predicate` returns true.
    pub fn cleanse_effects_where<F>(
        &mut self,
        entity: EntityId,
        predicate: F,
    ) -> Result<Vec<EffectId>, EffectError>
    where
        F: FnMut(&EffectInstance, &EffectDefinition) -> bool,
    {
        let env = FrameEnv {
            catalog: &self.catalog,
            config: &self.config,
            events: &self.events,
        };
        let state = self
            .entities
            .get_mut(&entity)
            .ok_or(EffectError::UnknownEntity(entity))?;
        Ok(purge(state, env, predicate))
    }

    // ========================================================================
    // Direct resource changes
    // ========================================================================

    /// Route a hit through the damage path.
    pub fn deal_damage(&mut self, target: EntityId, hit: Hit) -> Result<DamageOutcome, EffectError> {
        let env = FrameEnv {
            catalog: &self.catalog,
            config: &self.config,
            events: &self.events,
        };
        let state = self
            .entities
            .get_mut(&target)
            .ok_or(EffectError::UnknownEntity(target))?;
        Ok(apply_hit(state, &hit, env))
    }

    /// Restore health. Returns the amount gained.
    pub fn heal(
        &mut self,
        target: EntityId,
        amount: f32,
        source: Option<EntityId>,
    ) -> Result<f32, EffectError> {
        let env = FrameEnv {
            catalog: &self.catalog,
            config: &self.config,
            events: &self.events,
        };
        let state = self
            .entities
            .get_mut(&target)
            .ok_or(EffectError::UnknownEntity(target))?;
        Ok(restore_health(state, amount, source, env))
    }

    /// Add to the shield pool, up to the cap. Returns the amount gained.
    pub fn grant_shield(
        &mut self,
        target: EntityId,
        amount: f32,
        source: Option<EntityId>,
    ) -> Result<f32, EffectError> {
        let env = FrameEnv {
            catalog: &self.catalog,
            config: &self.config,
            events: &self.events,
        };
        let state = self
            .entities
            .get_mut(&target)
            .ok_or(EffectError::UnknownEntity(target))?;
        Ok(add_shield(state, amount, source, env))
    }

    /// Bring a dead entity back with a fraction of its max hp.
    pub fn revive(&mut self, entity: EntityId, hp_fraction: f32) -> Result<(), EffectError> {
        let state = self
            .entities
            .get_mut(&entity)
            .ok_or(EffectError::UnknownEntity(entity))?;
        if state.is_alive() {
            return Ok(());
        }
        state.revive(hp_fraction, &self.catalog, self.config.resistance_cap);
        info!("Revived {}", entity);
        self.events.publish(CombatEvent::Revived { entity });
        Ok(())
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Advance every entity by `dt` seconds.
    ///
    /// Entities step independently; casts that finish this frame resolve
    /// afterwards in caster order.
    pub fn advance(&mut self, dt: f32) -> FrameReport {
        let delta = self.config.effective_delta(dt);
        let mut report = FrameReport {
            delta,
            entities: self.entities.len(),
            ..FrameReport::default()
        };
        if delta <= 0.0 {
            return report;
        }

        let catalog = Arc::clone(&self.catalog);
        let env = FrameEnv {
            catalog: &catalog,
            config: &self.config,
            events: &self.events,
        };

        let mut pending = Vec::new();
        for state in self.entities.values_mut() {
            match step_entity(state, delta, env) {
                Ok(step) => {
                    report.ticks += step.ticks;
                    report.expired += step.expired;
                    pending.extend(step.completed);
                },
                Err(fault) => report.faults.push(fault),
            }
        }

        for cast in pending {
            let caster_alive = self
                .entities
                .get(&cast.caster)
                .is_some_and(EntityCombatState::is_alive);
            let Some(def) = catalog.ability(&cast.ability) else {
                continue;
            };
            if !caster_alive {
                continue;
            }
            resolve_cast(
                &mut self.entities,
                self.resolver.as_ref(),
                env,
                cast.caster,
                def,
                &cast.target,
            );
            report.casts_completed += 1;
        }

        report
    }

    // ========================================================================
    // Casting
    // ========================================================================

    /// Request a cast.
    ///
    /// A rejected request changes nothing. An accepted one spends mana at
    /// once; instant casts resolve immediately, others channel and resolve
    /// during a later [`advance`](Self::advance).
    pub fn cast_ability(
        &mut self,
        caster: EntityId,
        ability: &AbilityId,
        target: TargetHint,
    ) -> Result<CastOutcome, CastError> {
        let catalog = Arc::clone(&self.catalog);
        let def = catalog
            .ability(ability)
            .ok_or_else(|| CastError::UnknownAbility(ability.clone()))?;
        let state = self
            .entities
            .get_mut(&caster)
            .ok_or(CastError::UnknownEntity(caster))?;

        let stats = state
            .effective_stats(&catalog, self.config.resistance_cap)
            .clone();
        let view = CasterView {
            alive: state.is_alive(),
            mana: state.resources().mana,
            stats: &stats,
        };
        let (index, commit) = cast::validate(def, state.slots(), view)?;

        let mana = &mut state.resources_mut().mana;
        *mana = (*mana - commit.mana_cost).max(0.0);
        let cooldown = scaled_cooldown(def, &stats);
        let instant = cast::commit(&mut state.slots_mut()[index], &commit, cooldown, target.clone());

        if !instant {
            debug!(
                "{} started casting {} ({:.2}s)",
                caster, def.id, commit.cast_time
            );
            self.events.publish(CombatEvent::CastStarted {
                caster,
                ability: def.id.clone(),
                cast_time: commit.cast_time,
            });
            return Ok(CastOutcome::Started {
                ability: def.id.clone(),
                cast_time: commit.cast_time,
                mana_spent: commit.mana_cost,
            });
        }

        let env = FrameEnv {
            catalog: &catalog,
            config: &self.config,
            events: &self.events,
        };
        let resolution = resolve_cast(
            &mut self.entities,
            self.resolver.as_ref(),
            env,
            caster,
            def,
            &target,
        );
        Ok(CastOutcome::Completed(resolution))
    }

    /// Replace an entity's ability slots. Channeling casts are interrupted.
    pub fn set_abilities(
        &mut self,
        entity: EntityId,
        abilities: Vec<AbilityId>,
    ) -> Result<(), LoadoutError> {
        if let Some(missing) = abilities.iter().find(|a| self.catalog.ability(a).is_none()) {
            return Err(LoadoutError::UnknownAbility(missing.clone()));
        }
        let state = self
            .entities
            .get_mut(&entity)
            .ok_or(LoadoutError::UnknownEntity(entity))?;
        replace_slots(state, abilities, &self.events);
        Ok(())
    }

    /// Replace an entity's passive abilities.
    pub fn set_passives(
        &mut self,
        entity: EntityId,
        passives: Vec<AbilityId>,
    ) -> Result<(), LoadoutError> {
        let deltas = passive_deltas(&self.catalog, &passives)?;
        let state = self
            .entities
            .get_mut(&entity)
            .ok_or(LoadoutError::UnknownEntity(entity))?;
        state.set_passives(passives, deltas);
        state.clamp_resources(
            &self.catalog,
            self.config.resistance_cap,
            self.config.shield_cap,
        );
        Ok(())
    }

    // ========================================================================
    // Loadouts
    // ========================================================================

    /// Equip a loadout: scale its gear, slot its abilities and select its
    /// passives.
    pub fn equip_loadout(
        &mut self,
        entity: EntityId,
        loadout: &LoadoutId,
        level: u32,
        rarity: Option<Rarity>,
    ) -> Result<EquipmentBonuses, LoadoutError> {
        let catalog = Arc::clone(&self.catalog);
        let def = catalog
            .loadout(loadout)
            .ok_or_else(|| LoadoutError::UnknownLoadout(loadout.clone()))?;
        if !self.entities.contains_key(&entity) {
            return Err(LoadoutError::UnknownEntity(entity));
        }
        if let Some(missing) = def.abilities.iter().find(|a| catalog.ability(a).is_none()) {
            return Err(LoadoutError::UnknownAbility(missing.clone()));
        }
        let passives = passive_deltas(&catalog, &def.passives)?;

        let rarity = rarity.unwrap_or(def.rarity);
        let bonuses = loadout::scale(def, rarity, level);
        let state = self
            .entities
            .get_mut(&entity)
            .ok_or(LoadoutError::UnknownEntity(entity))?;

        state.set_equipment(
            bonuses.to_deltas(),
            Some(EquippedLoadout {
                id: def.id.clone(),
                rarity,
                level,
            }),
        );
        state.set_passives(def.passives.clone(), passives);
        replace_slots(state, def.abilities.clone(), &self.events);
        state.clamp_resources(
            &catalog,
            self.config.resistance_cap,
            self.config.shield_cap,
        );

        info!(
            "{} equipped {} ({} level {})",
            entity,
            def.id,
            rarity.name(),
            level
        );
        self.events.publish(CombatEvent::LoadoutEquipped {
            entity,
            loadout: def.id.clone(),
            rarity,
            level,
        });
        Ok(bonuses)
    }
}

// ============================================================================
// Resolution helpers
// ============================================================================

/// Apply `def` to one entity, with its shield grant and companion.
fn attach(
    state: &mut EntityCombatState,
    def: &EffectDefinition,
    source: Option<EntityId>,
    env: FrameEnv<'_>,
) -> AppliedOutcome {
    let outcome = state.effects_mut().apply(def, source);
    debug!("{} {}: {:?}", state.id(), def.id, outcome);

    if outcome.stacks_gained() > 0 && def.affects_stats() {
        state.mark_dirty();
        state.clamp_resources(env.catalog, env.config.resistance_cap, env.config.shield_cap);
    }
    if let Some(grant) = def.shield_grant() {
        if outcome != AppliedOutcome::StackCapped {
            add_shield(state, grant, source, env);
        }
    }

    env.events.publish(CombatEvent::EffectApplied {
        entity: state.id(),
        effect: def.id.clone(),
        outcome,
        source,
    });

    if let Some(companion) = def.companion().and_then(|id| env.catalog.effect(id)) {
        attach(state, companion, source, env);
    }
    outcome
}

/// Remove matching instances; returns their ids in insertion order.
fn purge<F>(state: &mut EntityCombatState, env: FrameEnv<'_>, mut predicate: F) -> Vec<EffectId>
where
    F: FnMut(&EffectInstance, &EffectDefinition) -> bool,
{
    let catalog = env.catalog;
    let removed = state.effects_mut().cleanse(|instance| {
        catalog
            .effect(instance.effect())
            .is_some_and(|def| predicate(instance, def))
    });
    if removed.is_empty() {
        return Vec::new();
    }

    let dirty = removed.iter().any(|instance| {
        catalog
            .effect(instance.effect())
            .is_some_and(EffectDefinition::affects_stats)
    });
    if dirty {
        state.mark_dirty();
        state.clamp_resources(catalog, env.config.resistance_cap, env.config.shield_cap);
    }

    let effects: Vec<EffectId> = removed.iter().map(|i| i.effect().clone()).collect();
    debug!("{} cleansed {:?}", state.id(), effects);
    env.events.publish(CombatEvent::EffectsCleansed {
        entity: state.id(),
        effects: effects.clone(),
    });
    effects
}

fn restore_health(
    state: &mut EntityCombatState,
    amount: f32,
    source: Option<EntityId>,
    env: FrameEnv<'_>,
) -> f32 {
    let gained = state.restore(
        ResourceKind::Hp,
        amount,
        env.catalog,
        env.config.resistance_cap,
        env.config.shield_cap,
    );
    if gained > 0.0 {
        env.events.publish(CombatEvent::Healed {
            entity: state.id(),
            source,
            amount: gained,
        });
    }
    gained
}

fn add_shield(
    state: &mut EntityCombatState,
    amount: f32,
    source: Option<EntityId>,
    env: FrameEnv<'_>,
) -> f32 {
    let gained = state.restore(
        ResourceKind::Shield,
        amount,
        env.catalog,
        env.config.resistance_cap,
        env.config.shield_cap,
    );
    if gained > 0.0 {
        env.events.publish(CombatEvent::Shielded {
            entity: state.id(),
            source,
            amount: gained,
        });
    }
    gained
}

fn replace_slots(state: &mut EntityCombatState, abilities: Vec<AbilityId>, events: &EventBus) {
    if let Some(ability) = cast::cancel_casting(state.slots_mut()) {
        events.publish(CombatEvent::CastInterrupted {
            caster: state.id(),
            ability,
        });
    }
    state.set_abilities(abilities);
}

fn passive_deltas(catalog: &Catalog, passives: &[AbilityId]) -> Result<StatDeltas, LoadoutError> {
    let mut deltas = StatDeltas::new();
    for id in passives {
        let ability = catalog
            .ability(id)
            .ok_or_else(|| LoadoutError::UnknownAbility(id.clone()))?;
        if !ability.is_passive() {
            return Err(LoadoutError::NotPassive(id.clone()));
        }
        deltas.extend(ability.passive.iter().copied());
    }
    Ok(deltas)
}

/// Apply a completed cast to its resolved targets.
fn resolve_cast(
    entities: &mut BTreeMap<EntityId, EntityCombatState>,
    resolver: &dyn TargetResolver,
    env: FrameEnv<'_>,
    caster: EntityId,
    def: &AbilityDefinition,
    hint: &TargetHint,
) -> CastResolution {
    let mut resolution = CastResolution {
        caster,
        ability: def.id.clone(),
        targets: Vec::new(),
        lifesteal: 0.0,
    };
    let Some(caster_stats) = entities
        .get_mut(&caster)
        .map(|s| s.effective_stats(env.catalog, env.config.resistance_cap).clone())
    else {
        return resolution;
    };

    let targets = resolver.resolve(&TargetContext {
        caster,
        ability: def,
        hint,
    });

    let mut landed = 0.0;
    for target in targets {
        let Some(state) = entities.get_mut(&target) else {
            continue;
        };
        let report = resolve_target(state, &caster_stats, caster, def, env);
        landed += report.damage.map_or(0.0, |d| d.total());
        resolution.targets.push(report);
    }

    let lifesteal = caster_stats.get(Stat::Lifesteal) * landed;
    if lifesteal > 0.0 {
        if let Some(state) = entities.get_mut(&caster) {
            resolution.lifesteal = restore_health(state, lifesteal, Some(caster), env);
        }
    }

    debug!(
        "{} completed {} on {} targets",
        caster,
        def.id,
        resolution.targets.len()
    );
    env.events.publish(CombatEvent::CastCompleted {
        caster,
        ability: def.id.clone(),
        targets: resolution.targets.iter().map(|r| r.target).collect(),
    });
    resolution
}

fn resolve_target(
    state: &mut EntityCombatState,
    caster_stats: &EffectiveStats,
    caster: EntityId,
    def: &AbilityDefinition,
    env: FrameEnv<'_>,
) -> TargetReport {
    let mut report = TargetReport::new(state.id());

    for action in &def.actions {
        match action {
            AbilityAction::Damage {
                damage_type,
                scaling,
            } => {
                let amount = scaled_amount(scaling, caster_stats)
                    * outgoing_multiplier(*damage_type, caster_stats);
                let hit = Hit::direct(amount, *damage_type, Some(caster));
                let outcome = apply_hit(state, &hit, env);
                report.damage = Some(report.damage.map_or(outcome, |prev| prev.merged(outcome)));
            },
            AbilityAction::Heal(scaling) => {
                let amount = scaled_amount(scaling, caster_stats);
                report.healed += restore_health(state, amount, Some(caster), env);
            },
            AbilityAction::Shield(scaling) => {
                let amount = scaled_amount(scaling, caster_stats)
                    * (1.0 + caster_stats.get(Stat::ShieldEfficiency));
                report.shielded += add_shield(state, amount, Some(caster), env);
            },
            AbilityAction::Cleanse(filter) => {
                let removed = purge(state, env, |_, effect| filter.matches(effect));
                report.cleansed.extend(removed);
            },
        }
    }

    if state.is_alive() {
        for effect in &def.effects {
            let Some(effect_def) = env.catalog.effect(effect) else {
                continue;
            };
            let outcome = attach(state, effect_def, Some(caster), env);
            report.applied.push((effect.clone(), outcome));
        }
    }
    report
}
