//! Per-entity combat state.
//!
//! Everything the engine knows about an entity lives in one fixed struct
//! populated at spawn and updated only through engine operations. The
//! effective-stats snapshot is cached and dropped whenever an input to the
//! aggregator changes.

use orb_common::{AbilityId, EntityId, LoadoutId};
use serde::{Deserialize, Serialize};

use crate::aggregate::{compute_effective_stats, StatSources};
use crate::cast::{self, AbilitySlot};
use crate::catalog::{Catalog, ResourceKind};
use crate::damage::{mitigate, DamageOutcome, Hit};
use crate::effects::{ActiveEffects, EffectInstance};
use crate::loadout::Rarity;
use crate::stats::{BaseStats, EffectiveStats, StatDeltas};

/// Role of an entity in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player's hero.
    Player,
    /// Allied unit.
    Friendly,
    /// Hostile unit.
    Enemy,
    /// Neutral or boss creature.
    Creature,
}

/// Current pools.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// Health.
    pub hp: f32,
    /// Mana.
    pub mana: f32,
    /// Stamina.
    pub stamina: f32,
    /// Shield.
    pub shield: f32,
}

impl Resources {
    /// Pools filled to the given maxima, no shield.
    #[must_use]
    pub fn full(stats: &EffectiveStats) -> Self {
        Self {
            hp: stats.max_hp(),
            mana: stats.max_mana(),
            stamina: stats.max_stamina(),
            shield: 0.0,
        }
    }

    /// Drain shield first, then hp. Returns `(absorbed, dealt)`.
    pub fn absorb(&mut self, damage: f32) -> (f32, f32) {
        let absorbed = damage.min(self.shield).max(0.0);
        self.shield -= absorbed;
        let dealt = (damage - absorbed).min(self.hp).max(0.0);
        self.hp -= dealt;
        (absorbed, dealt)
    }

    /// Clamp pools to the given maxima.
    pub fn clamp_to(&mut self, stats: &EffectiveStats, shield_cap: f32) {
        self.hp = self.hp.clamp(0.0, stats.max_hp());
        self.mana = self.mana.clamp(0.0, stats.max_mana());
        self.stamina = self.stamina.clamp(0.0, stats.max_stamina());
        self.shield = self.shield.clamp(0.0, shield_cap);
    }

    /// HP as a fraction of `max_hp`.
    #[must_use]
    pub fn hp_percent(&self, stats: &EffectiveStats) -> f32 {
        if stats.max_hp() <= 0.0 {
            0.0
        } else {
            self.hp / stats.max_hp()
        }
    }
}

/// Loadout currently equipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquippedLoadout {
    /// Loadout id.
    pub id: LoadoutId,
    /// Rarity used for scaling.
    pub rarity: Rarity,
    /// Slot level used for scaling.
    pub level: u32,
}

/// What a death cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct DeathCleanup {
    pub released: Vec<EffectInstance>,
    pub interrupted: Option<AbilityId>,
}

/// Combat state of one entity.
#[derive(Debug, Clone)]
pub struct EntityCombatState {
    id: EntityId,
    kind: EntityKind,
    name: String,
    base: BaseStats,
    equipment: StatDeltas,
    loadout: Option<EquippedLoadout>,
    passives: Vec<AbilityId>,
    passive_deltas: StatDeltas,
    effects: ActiveEffects,
    slots: Vec<AbilitySlot>,
    resources: Resources,
    alive: bool,
    cached: Option<EffectiveStats>,
    recomputes: u64,
}

impl EntityCombatState {
    pub(crate) fn new(id: EntityId, kind: EntityKind, name: String, base: BaseStats) -> Self {
        Self {
            id,
            kind,
            name,
            base,
            equipment: StatDeltas::new(),
            loadout: None,
            passives: Vec::new(),
            passive_deltas: StatDeltas::new(),
            effects: ActiveEffects::new(),
            slots: Vec::new(),
            resources: Resources::default(),
            alive: true,
            cached: None,
            recomputes: 0,
        }
    }

    /// Entity ID.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Entity role.
    #[must_use]
    pub const fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base stats.
    #[must_use]
    pub const fn base(&self) -> &BaseStats {
        &self.base
    }

    /// Equipment deltas from the current loadout.
    #[must_use]
    pub const fn equipment(&self) -> &StatDeltas {
        &self.equipment
    }

    /// Equipped loadout, if any.
    #[must_use]
    pub const fn loadout(&self) -> Option<&EquippedLoadout> {
        self.loadout.as_ref()
    }

    /// Selected passive abilities.
    #[must_use]
    pub fn passives(&self) -> &[AbilityId] {
        &self.passives
    }

    /// Active effects, insertion-ordered.
    #[must_use]
    pub const fn effects(&self) -> &ActiveEffects {
        &self.effects
    }

    /// Ability slots.
    #[must_use]
    pub fn slots(&self) -> &[AbilitySlot] {
        &self.slots
    }

    /// Current pools.
    #[must_use]
    pub const fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Check if alive.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether a valid snapshot is cached.
    #[must_use]
    pub const fn is_cached(&self) -> bool {
        self.cached.is_some()
    }

    /// How many times stats were aggregated for this entity.
    #[must_use]
    pub const fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Effective stats, aggregated on first read after a change.
    pub fn effective_stats(&mut self, catalog: &Catalog, resistance_cap: f32) -> &EffectiveStats {
        self.cached.get_or_insert_with(|| {
            self.recomputes += 1;
            compute_effective_stats(
                StatSources {
                    base: &self.base,
                    equipment: &self.equipment,
                    passives: &self.passive_deltas,
                    effects: &self.effects,
                },
                catalog,
                resistance_cap,
            )
        })
    }

    /// Drop the cached snapshot.
    pub(crate) fn mark_dirty(&mut self) {
        self.cached = None;
    }

    pub(crate) fn set_base(&mut self, base: BaseStats) {
        self.base = base;
        self.mark_dirty();
    }

    pub(crate) fn set_equipment(&mut self, deltas: StatDeltas, loadout: Option<EquippedLoadout>) {
        self.equipment = deltas;
        self.loadout = loadout;
        self.mark_dirty();
    }

    pub(crate) fn set_passives(&mut self, passives: Vec<AbilityId>, deltas: StatDeltas) {
        self.passives = passives;
        self.passive_deltas = deltas;
        self.mark_dirty();
    }

    /// Replace slots. Any channeling cast is dropped without refund.
    pub(crate) fn set_abilities(&mut self, abilities: Vec<AbilityId>) {
        self.slots = abilities.into_iter().map(AbilitySlot::new).collect();
    }

    pub(crate) fn effects_mut(&mut self) -> &mut ActiveEffects {
        &mut self.effects
    }

    pub(crate) fn slots_mut(&mut self) -> &mut Vec<AbilitySlot> {
        &mut self.slots
    }

    pub(crate) fn resources_mut(&mut self) -> &mut Resources {
        &mut self.resources
    }

    /// Fill every pool to its maximum.
    pub(crate) fn refill(&mut self, catalog: &Catalog, resistance_cap: f32) {
        let shield = self.resources.shield;
        let stats = self.effective_stats(catalog, resistance_cap);
        let mut full = Resources::full(stats);
        full.shield = shield;
        self.resources = full;
    }

    /// Clamp pools after maxima changed.
    pub(crate) fn clamp_resources(
        &mut self,
        catalog: &Catalog,
        resistance_cap: f32,
        shield_cap: f32,
    ) {
        let stats = self.effective_stats(catalog, resistance_cap).clone();
        self.resources.clamp_to(&stats, shield_cap);
    }

    /// Route a hit through mitigation and the shield/hp pools.
    ///
    /// Dead and invulnerable targets ignore the hit. Reaching zero hp marks
    /// the entity dead; the caller runs [`Self::on_death`].
    pub(crate) fn take_hit(
        &mut self,
        hit: &Hit,
        catalog: &Catalog,
        resistance_cap: f32,
    ) -> DamageOutcome {
        if !self.alive {
            return DamageOutcome::ignored(hit.amount);
        }
        let stats = self.effective_stats(catalog, resistance_cap);
        if stats.control.invulnerable {
            return DamageOutcome::ignored(hit.amount);
        }

        let mitigated = mitigate(hit.amount, hit.damage_type, stats);
        let (absorbed, dealt) = self.resources.absorb(mitigated);
        let killed = self.resources.hp <= 0.0;
        if killed {
            self.resources.hp = 0.0;
            self.alive = false;
        }

        DamageOutcome {
            raw: hit.amount,
            mitigated,
            absorbed,
            dealt,
            ignored: false,
            killed,
        }
    }

    /// Restore a pool, clamped to its maximum. Returns the amount gained.
    ///
    /// Dead entities gain nothing.
    pub(crate) fn restore(
        &mut self,
        resource: ResourceKind,
        amount: f32,
        catalog: &Catalog,
        resistance_cap: f32,
        shield_cap: f32,
    ) -> f32 {
        if !self.alive || amount <= 0.0 {
            return 0.0;
        }
        let stats = self.effective_stats(catalog, resistance_cap);
        let max = match resource {
            ResourceKind::Hp => stats.max_hp(),
            ResourceKind::Mana => stats.max_mana(),
            ResourceKind::Stamina => stats.max_stamina(),
            ResourceKind::Shield => shield_cap,
        };
        let pool = match resource {
            ResourceKind::Hp => &mut self.resources.hp,
            ResourceKind::Mana => &mut self.resources.mana,
            ResourceKind::Stamina => &mut self.resources.stamina,
            ResourceKind::Shield => &mut self.resources.shield,
        };
        let before = *pool;
        *pool = (*pool + amount).min(max).max(before);
        *pool - before
    }

    /// Release effects and cancel casting after death.
    pub(crate) fn on_death(&mut self) -> DeathCleanup {
        self.alive = false;
        self.resources.hp = 0.0;
        self.resources.shield = 0.0;
        let released = self.effects.clear();
        if !released.is_empty() {
            self.mark_dirty();
        }
        DeathCleanup {
            released,
            interrupted: cast::cancel_casting(&mut self.slots),
        }
    }

    /// Bring a dead entity back with a fraction of max hp.
    pub(crate) fn revive(&mut self, hp_fraction: f32, catalog: &Catalog, resistance_cap: f32) {
        self.alive = true;
        let max_hp = self.effective_stats(catalog, resistance_cap).max_hp();
        self.resources.hp = (max_hp * hp_fraction.clamp(0.0, 1.0)).max(1.0);
    }
}
