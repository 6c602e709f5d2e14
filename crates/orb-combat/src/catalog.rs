//! Immutable content definitions.
//!
//! Effects, abilities and loadouts are loaded once, validated once, and then
//! shared read-only by the engine. Every effect is a closed set of
//! [`EffectComponent`]s; nothing about its shape is checked again at
//! application time.

use std::collections::BTreeMap;
use std::path::Path;

use ahash::AHashMap;
use orb_common::{AbilityId, EffectId, LoadoutId, SchemaVersion};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::damage::DamageType;
use crate::effects::CleanseFilter;
use crate::error::CatalogError;
use crate::loadout::Rarity;
use crate::stats::{ControlFlags, Modifier, Stat};

// ============================================================================
// Effects
// ============================================================================

/// Whether an effect helps or hurts its bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    /// Beneficial.
    Buff,
    /// Hostile.
    Debuff,
}

/// Resource a periodic restore tick refills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// Health.
    Hp,
    /// Mana.
    Mana,
    /// Stamina.
    Stamina,
    /// Shield pool.
    Shield,
}

/// What one periodic tick does, per stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TickAction {
    /// Deal typed damage through the damage path.
    Damage {
        /// Damage per tick per stack.
        amount: f32,
        /// Damage type.
        damage_type: DamageType,
    },
    /// Restore a resource, clamped to its maximum.
    Restore {
        /// Resource restored.
        resource: ResourceKind,
        /// Amount per tick per stack.
        amount: f32,
    },
}

/// Periodic tick of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickSpec {
    /// Seconds between ticks.
    pub interval: f32,
    /// What each tick does.
    pub action: TickAction,
}

impl TickSpec {
    /// Shortest accepted tick interval in seconds.
    pub const MIN_INTERVAL: f32 = 0.01;

    /// A damage-over-time tick.
    #[must_use]
    pub const fn damage(amount: f32, interval: f32, damage_type: DamageType) -> Self {
        Self {
            interval,
            action: TickAction::Damage {
                amount,
                damage_type,
            },
        }
    }

    /// A periodic restore.
    #[must_use]
    pub const fn restore(resource: ResourceKind, amount: f32, interval: f32) -> Self {
        Self {
            interval,
            action: TickAction::Restore { resource, amount },
        }
    }
}

/// One family of behavior an effect carries. An effect holds at most one
/// component of each family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectComponent {
    /// Stat deltas, multiplied by stack count.
    Modifiers(Vec<Modifier>),
    /// Periodic tick.
    Periodic(TickSpec),
    /// Crowd-control and status flags.
    Control(ControlFlags),
    /// Shield granted per stack gained on application.
    Shield(f32),
    /// Another effect applied alongside this one.
    Companion(EffectId),
}

impl EffectComponent {
    const fn family(&self) -> &'static str {
        match self {
            Self::Modifiers(_) => "modifiers",
            Self::Periodic(_) => "periodic",
            Self::Control(_) => "control",
            Self::Shield(_) => "shield",
            Self::Companion(_) => "companion",
        }
    }
}

/// A buff, debuff or damage-over-time effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Catalog key.
    pub id: EffectId,
    /// Display name.
    pub name: String,
    /// Buff or debuff.
    pub kind: EffectKind,
    /// Seconds the effect lasts; `None` is permanent.
    #[serde(default)]
    pub duration: Option<f32>,
    /// Stack cap; absent or 1 means refresh-only.
    #[serde(default)]
    pub max_stacks: Option<u32>,
    /// Behavior families.
    #[serde(default)]
    pub components: Vec<EffectComponent>,
}

impl EffectDefinition {
    /// Create an effect with no components.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: EffectKind) -> Self {
        Self {
            id: EffectId::new(id),
            name: name.into(),
            kind,
            duration: None,
            max_stacks: None,
            components: Vec::new(),
        }
    }

    /// Create a buff.
    #[must_use]
    pub fn buff(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, EffectKind::Buff)
    }

    /// Create a debuff.
    #[must_use]
    pub fn debuff(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, EffectKind::Debuff)
    }

    /// Set duration in seconds.
    #[must_use]
    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration = Some(seconds);
        self
    }

    /// Set stack cap.
    #[must_use]
    pub fn with_max_stacks(mut self, max: u32) -> Self {
        self.max_stacks = Some(max);
        self
    }

    /// Add stat modifiers.
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.components
            .push(EffectComponent::Modifiers(modifiers.into_iter().collect()));
        self
    }

    /// Add a periodic tick.
    #[must_use]
    pub fn with_tick(mut self, tick: TickSpec) -> Self {
        self.components.push(EffectComponent::Periodic(tick));
        self
    }

    /// Add control flags.
    #[must_use]
    pub fn with_control(mut self, flags: ControlFlags) -> Self {
        self.components.push(EffectComponent::Control(flags));
        self
    }

    /// Add a shield grant.
    #[must_use]
    pub fn with_shield(mut self, amount: f32) -> Self {
        self.components.push(EffectComponent::Shield(amount));
        self
    }

    /// Add a companion effect.
    #[must_use]
    pub fn with_companion(mut self, effect: impl Into<String>) -> Self {
        self.components
            .push(EffectComponent::Companion(EffectId::new(effect)));
        self
    }

    /// Effective stack cap (at least 1).
    #[must_use]
    pub fn stack_cap(&self) -> u32 {
        self.max_stacks.unwrap_or(1).max(1)
    }

    /// Whether reapplication adds stacks.
    #[must_use]
    pub fn is_stacking(&self) -> bool {
        self.stack_cap() > 1
    }

    /// Whether the effect never expires.
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.duration.is_none()
    }

    /// Check if this is a debuff.
    #[must_use]
    pub fn is_debuff(&self) -> bool {
        self.kind == EffectKind::Debuff
    }

    /// Stat modifiers, per stack.
    #[must_use]
    pub fn modifiers(&self) -> &[Modifier] {
        self.components
            .iter()
            .find_map(|c| match c {
                EffectComponent::Modifiers(m) => Some(m.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// Periodic tick, if any.
    #[must_use]
    pub fn tick(&self) -> Option<&TickSpec> {
        self.components.iter().find_map(|c| match c {
            EffectComponent::Periodic(t) => Some(t),
            _ => None,
        })
    }

    /// Control flags, if any.
    #[must_use]
    pub fn control(&self) -> Option<ControlFlags> {
        self.components.iter().find_map(|c| match c {
            EffectComponent::Control(f) => Some(*f),
            _ => None,
        })
    }

    /// Shield granted per stack gained.
    #[must_use]
    pub fn shield_grant(&self) -> Option<f32> {
        self.components.iter().find_map(|c| match c {
            EffectComponent::Shield(s) => Some(*s),
            _ => None,
        })
    }

    /// Companion effect, if any.
    #[must_use]
    pub fn companion(&self) -> Option<&EffectId> {
        self.components.iter().find_map(|c| match c {
            EffectComponent::Companion(id) => Some(id),
            _ => None,
        })
    }

    /// Whether this effect feeds the stat aggregator.
    #[must_use]
    pub fn affects_stats(&self) -> bool {
        !self.modifiers().is_empty() || self.control().is_some_and(|f| !f.is_empty())
    }

    /// Whether this effect roots, stuns or silences.
    #[must_use]
    pub fn is_crowd_control(&self) -> bool {
        self.control().is_some_and(|f| f.is_crowd_control())
    }

    /// Whether this effect deals periodic damage.
    #[must_use]
    pub fn is_damage_over_time(&self) -> bool {
        matches!(
            self.tick(),
            Some(TickSpec {
                action: TickAction::Damage { .. },
                ..
            })
        )
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if let Some(duration) = self.duration {
            if !duration.is_finite() || duration <= 0.0 {
                return Err(CatalogError::invalid(
                    &self.id,
                    "duration must be positive and finite",
                ));
            }
        }
        if self.max_stacks == Some(0) {
            return Err(CatalogError::invalid(&self.id, "max_stacks must be >= 1"));
        }

        let mut seen: Vec<&'static str> = Vec::with_capacity(self.components.len());
        for component in &self.components {
            let family = component.family();
            if seen.contains(&family) {
                return Err(CatalogError::invalid(
                    &self.id,
                    format!("more than one {family} component"),
                ));
            }
            seen.push(family);

            match component {
                EffectComponent::Modifiers(mods) => {
                    if mods.iter().any(|m| !m.is_finite()) {
                        return Err(CatalogError::invalid(&self.id, "non-finite modifier"));
                    }
                },
                EffectComponent::Periodic(tick) => {
                    if !tick.interval.is_finite() || tick.interval < TickSpec::MIN_INTERVAL {
                        return Err(CatalogError::invalid(
                            &self.id,
                            format!("tick interval must be at least {}s", TickSpec::MIN_INTERVAL),
                        ));
                    }
                    let amount = match tick.action {
                        TickAction::Damage { amount, .. } | TickAction::Restore { amount, .. } => {
                            amount
                        },
                    };
                    if !amount.is_finite() || amount < 0.0 {
                        return Err(CatalogError::invalid(
                            &self.id,
                            "tick amount must be non-negative",
                        ));
                    }
                },
                EffectComponent::Shield(amount) => {
                    if !amount.is_finite() || *amount < 0.0 {
                        return Err(CatalogError::invalid(
                            &self.id,
                            "shield grant must be non-negative",
                        ));
                    }
                },
                EffectComponent::Companion(other) => {
                    if *other == self.id {
                        return Err(CatalogError::invalid(&self.id, "effect is its own companion"));
                    }
                },
                EffectComponent::Control(_) => {},
            }
        }
        Ok(())
    }
}

// ============================================================================
// Abilities
// ============================================================================

/// How an ability picks its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Short arc in front of the caster.
    Melee,
    /// Fired along a path.
    Projectile,
    /// Area around a ground point.
    Ground,
    /// Area around the caster.
    Area,
    /// A single chosen entity.
    Target,
    /// Never cast; contributes static modifiers.
    Passive,
}

/// Caster stat an ability scales from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalingSource {
    /// Attack.
    AttackPower,
    /// Attack amplified by magic damage.
    MagicPower,
    /// Attack amplified by healing power.
    HealingPower,
    /// Defense.
    Defense,
}

/// `ratio × source stat`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    /// Source stat.
    pub source: ScalingSource,
    /// Multiplier (1.2 = 120%).
    pub ratio: f32,
}

impl Scaling {
    /// Create a scaling.
    #[must_use]
    pub const fn new(source: ScalingSource, ratio: f32) -> Self {
        Self { source, ratio }
    }
}

/// Direct effect of a completed cast on each target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AbilityAction {
    /// Damage through the damage path.
    Damage {
        /// Damage type.
        damage_type: DamageType,
        /// Amount.
        scaling: Scaling,
    },
    /// Restore health.
    Heal(Scaling),
    /// Add to the shield pool.
    Shield(Scaling),
    /// Remove matching effects.
    Cleanse(CleanseFilter),
}

/// An active or passive ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Catalog key.
    pub id: AbilityId,
    /// Display name.
    pub name: String,
    /// Targeting mode.
    pub target_type: TargetType,
    /// Mana spent at cast start.
    #[serde(default)]
    pub mana_cost: f32,
    /// Cooldown in seconds, before cdr.
    #[serde(default)]
    pub cooldown: f32,
    /// Channel time in seconds; zero completes immediately.
    #[serde(default)]
    pub cast_time: f32,
    /// Reach.
    #[serde(default)]
    pub range: f32,
    /// Area radius.
    #[serde(default)]
    pub radius: f32,
    /// Direct effects, in order.
    #[serde(default)]
    pub actions: Vec<AbilityAction>,
    /// Effects applied to every target.
    #[serde(default)]
    pub effects: Vec<EffectId>,
    /// Static modifiers while selected as a passive.
    #[serde(default)]
    pub passive: Vec<Modifier>,
}

impl AbilityDefinition {
    /// Create an active ability.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            id: AbilityId::new(id),
            name: name.into(),
            target_type,
            mana_cost: 0.0,
            cooldown: 0.0,
            cast_time: 0.0,
            range: 0.0,
            radius: 0.0,
            actions: Vec::new(),
            effects: Vec::new(),
            passive: Vec::new(),
        }
    }

    /// Create a passive ability.
    #[must_use]
    pub fn passive(
        id: impl Into<String>,
        name: impl Into<String>,
        modifiers: impl IntoIterator<Item = Modifier>,
    ) -> Self {
        let mut def = Self::new(id, name, TargetType::Passive);
        def.passive = modifiers.into_iter().collect();
        def
    }

    /// Set mana cost, cooldown and cast time.
    #[must_use]
    pub fn with_costs(mut self, mana: f32, cooldown: f32, cast_time: f32) -> Self {
        self.mana_cost = mana;
        self.cooldown = cooldown;
        self.cast_time = cast_time;
        self
    }

    /// Set range and radius.
    #[must_use]
    pub fn with_reach(mut self, range: f32, radius: f32) -> Self {
        self.range = range;
        self.radius = radius;
        self
    }

    /// Add a direct action.
    #[must_use]
    pub fn with_action(mut self, action: AbilityAction) -> Self {
        self.actions.push(action);
        self
    }

    /// Add an applied effect.
    #[must_use]
    pub fn with_effect(mut self, effect: impl Into<String>) -> Self {
        self.effects.push(EffectId::new(effect));
        self
    }

    /// Check if this ability is passive.
    #[must_use]
    pub fn is_passive(&self) -> bool {
        self.target_type == TargetType::Passive
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let numbers = [
            self.mana_cost,
            self.cooldown,
            self.cast_time,
            self.range,
            self.radius,
        ];
        if numbers.iter().any(|n| !n.is_finite() || *n < 0.0) {
            return Err(CatalogError::invalid(
                &self.id,
                "costs and reach must be non-negative",
            ));
        }
        if self.is_passive() && (!self.actions.is_empty() || !self.effects.is_empty()) {
            return Err(CatalogError::invalid(
                &self.id,
                "passive abilities cannot carry actions or effects",
            ));
        }
        if !self.is_passive() && !self.passive.is_empty() {
            return Err(CatalogError::invalid(
                &self.id,
                "active abilities cannot carry passive modifiers",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Loadouts
// ============================================================================

/// Equipment slot of a loadout piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EquipSlot {
    /// Main-hand weapon.
    Weapon,
    /// Head armor.
    Helmet,
    /// Body armor.
    Chest,
    /// Shoulder armor.
    Shoulders,
    /// Hand armor.
    Hands,
    /// Waist armor.
    Belt,
    /// Leg armor.
    Legs,
    /// Foot armor.
    Feet,
    /// Necklace.
    Neck,
    /// Ring or bracelet.
    Accessory,
}

/// One item of a loadout, with flat bonuses at common rarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentPiece {
    /// Slot occupied.
    pub slot: EquipSlot,
    /// Display name.
    pub name: String,
    /// Flat bonuses.
    pub bonuses: BTreeMap<Stat, f32>,
}

impl EquipmentPiece {
    /// Create a piece.
    #[must_use]
    pub fn new(slot: EquipSlot, name: impl Into<String>) -> Self {
        Self {
            slot,
            name: name.into(),
            bonuses: BTreeMap::new(),
        }
    }

    /// Add a flat bonus.
    #[must_use]
    pub fn with_bonus(mut self, stat: Stat, value: f32) -> Self {
        *self.bonuses.entry(stat).or_insert(0.0) += value;
        self
    }
}

/// Gear and ability kit for a fighter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadoutDefinition {
    /// Catalog key.
    pub id: LoadoutId,
    /// Display name.
    pub name: String,
    /// Default rarity.
    #[serde(default)]
    pub rarity: Rarity,
    /// Weapon and armor pieces.
    #[serde(default)]
    pub pieces: Vec<EquipmentPiece>,
    /// Active abilities slotted on equip.
    #[serde(default)]
    pub abilities: Vec<AbilityId>,
    /// Passive abilities selected on equip.
    #[serde(default)]
    pub passives: Vec<AbilityId>,
}

impl LoadoutDefinition {
    /// Create an empty loadout.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, rarity: Rarity) -> Self {
        Self {
            id: LoadoutId::new(id),
            name: name.into(),
            rarity,
            pieces: Vec::new(),
            abilities: Vec::new(),
            passives: Vec::new(),
        }
    }

    /// Add a piece.
    #[must_use]
    pub fn with_piece(mut self, piece: EquipmentPiece) -> Self {
        self.pieces.push(piece);
        self
    }

    /// Set active abilities.
    #[must_use]
    pub fn with_abilities<I, S>(mut self, abilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.abilities = abilities.into_iter().map(AbilityId::new).collect();
        self
    }

    /// Set passives.
    #[must_use]
    pub fn with_passives<I, S>(mut self, passives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passives = passives.into_iter().map(AbilityId::new).collect();
        self
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for piece in &self.pieces {
            if piece.bonuses.values().any(|v| !v.is_finite()) {
                return Err(CatalogError::invalid(
                    &self.id,
                    format!("non-finite bonus on {}", piece.name),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Read-only lookup tables for effects, abilities and loadouts.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    effects: AHashMap<EffectId, EffectDefinition>,
    abilities: AHashMap<AbilityId, AbilityDefinition>,
    loadouts: AHashMap<LoadoutId, LoadoutDefinition>,
}

impl Catalog {
    /// Start building a catalog.
    #[must_use]
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Look up an effect.
    #[must_use]
    pub fn effect(&self, id: &EffectId) -> Option<&EffectDefinition> {
        self.effects.get(id)
    }

    /// Look up an ability.
    #[must_use]
    pub fn ability(&self, id: &AbilityId) -> Option<&AbilityDefinition> {
        self.abilities.get(id)
    }

    /// Look up a loadout.
    #[must_use]
    pub fn loadout(&self, id: &LoadoutId) -> Option<&LoadoutDefinition> {
        self.loadouts.get(id)
    }

    /// Number of effects.
    #[must_use]
    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    /// Number of abilities.
    #[must_use]
    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }

    /// Number of loadouts.
    #[must_use]
    pub fn loadout_count(&self) -> usize {
        self.loadouts.len()
    }

    /// All effects, in no particular order.
    pub fn effects(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.effects.values()
    }

    /// Parse and validate a RON catalog document.
    pub fn from_ron(source: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = ron::from_str(source)?;
        if !SchemaVersion::CATALOG.can_read(&file.version) {
            return Err(CatalogError::VersionMismatch {
                expected: SchemaVersion::CATALOG,
                actual: file.version,
            });
        }

        let mut builder = Self::builder();
        for effect in file.effects {
            builder.add_effect(effect)?;
        }
        for ability in file.abilities {
            builder.add_ability(ability)?;
        }
        for loadout in file.loadouts {
            builder.add_loadout(loadout)?;
        }
        builder.build()
    }

    /// Load a RON catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let catalog = Self::from_ron(&source)?;
        info!(
            "Loaded catalog from {:?}: {} effects, {} abilities, {} loadouts",
            path,
            catalog.effect_count(),
            catalog.ability_count(),
            catalog.loadout_count()
        );
        Ok(catalog)
    }

    /// Serialize to a RON catalog document.
    pub fn to_ron(&self) -> Result<String, ron::Error> {
        let mut effects: Vec<_> = self.effects.values().cloned().collect();
        effects.sort_by(|a, b| a.id.cmp(&b.id));
        let mut abilities: Vec<_> = self.abilities.values().cloned().collect();
        abilities.sort_by(|a, b| a.id.cmp(&b.id));
        let mut loadouts: Vec<_> = self.loadouts.values().cloned().collect();
        loadouts.sort_by(|a, b| a.id.cmp(&b.id));

        let file = CatalogFile {
            version: SchemaVersion::CATALOG,
            effects,
            abilities,
            loadouts,
        };
        ron::ser::to_string_pretty(&file, ron::ser::PrettyConfig::default())
    }
}

/// On-disk catalog document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Schema version of the document.
    pub version: SchemaVersion,
    /// Effect definitions.
    #[serde(default)]
    pub effects: Vec<EffectDefinition>,
    /// Ability definitions.
    #[serde(default)]
    pub abilities: Vec<AbilityDefinition>,
    /// Loadout definitions.
    #[serde(default)]
    pub loadouts: Vec<LoadoutDefinition>,
}

/// Collects definitions, rejecting duplicate ids, and validates cross
/// references on [`build`](Self::build).
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    /// Add an effect.
    pub fn add_effect(&mut self, def: EffectDefinition) -> Result<&mut Self, CatalogError> {
        def.validate()?;
        if self.catalog.effects.contains_key(&def.id) {
            warn!("Rejected duplicate effect definition '{}'", def.id);
            return Err(CatalogError::DuplicateEffect(def.id));
        }
        self.catalog.effects.insert(def.id.clone(), def);
        Ok(self)
    }

    /// Add an ability.
    pub fn add_ability(&mut self, def: AbilityDefinition) -> Result<&mut Self, CatalogError> {
        def.validate()?;
        if self.catalog.abilities.contains_key(&def.id) {
            warn!("Rejected duplicate ability definition '{}'", def.id);
            return Err(CatalogError::DuplicateAbility(def.id));
        }
        self.catalog.abilities.insert(def.id.clone(), def);
        Ok(self)
    }

    /// Add a loadout.
    pub fn add_loadout(&mut self, def: LoadoutDefinition) -> Result<&mut Self, CatalogError> {
        def.validate()?;
        if self.catalog.loadouts.contains_key(&def.id) {
            warn!("Rejected duplicate loadout definition '{}'", def.id);
            return Err(CatalogError::DuplicateLoadout(def.id));
        }
        self.catalog.loadouts.insert(def.id.clone(), def);
        Ok(self)
    }

    /// Check cross references and finish.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let catalog = self.catalog;

        for effect in catalog.effects.values() {
            if let Some(companion) = effect.companion() {
                let Some(target) = catalog.effects.get(companion) else {
                    return Err(CatalogError::DanglingEffect {
                        owner: effect.id.to_string(),
                        effect: companion.clone(),
                    });
                };
                if target.companion().is_some() {
                    return Err(CatalogError::invalid(
                        &effect.id,
                        format!("companion {companion} has a companion of its own"),
                    ));
                }
            }
        }

        for ability in catalog.abilities.values() {
            if let Some(missing) = ability
                .effects
                .iter()
                .find(|e| !catalog.effects.contains_key(*e))
            {
                return Err(CatalogError::DanglingEffect {
                    owner: ability.id.to_string(),
                    effect: missing.clone(),
                });
            }
        }

        for loadout in catalog.loadouts.values() {
            for ability in loadout.abilities.iter().chain(&loadout.passives) {
                if !catalog.abilities.contains_key(ability) {
                    return Err(CatalogError::DanglingAbility {
                        owner: loadout.id.to_string(),
                        ability: ability.clone(),
                    });
                }
            }
            if let Some(active) = loadout.passives.iter().find(|p| {
                catalog
                    .abilities
                    .get(*p)
                    .is_some_and(|a| !a.is_passive())
            }) {
                return Err(CatalogError::invalid(
                    &loadout.id,
                    format!("{active} is not a passive ability"),
                ));
            }
        }

        Ok(catalog)
    }
}
