//! Combat statistics.
//!
//! This module provides:
//! - Stat identifiers and their bounds
//! - Base stats for an entity
//! - Stat modifiers (flat, percentage, all-stats, resistance)
//! - Crowd-control flags and the control state derived from them
//! - The effective stats snapshot produced by the aggregator

use serde::{Deserialize, Serialize};

use crate::damage::{DamageType, Resistances};

/// Ceiling for cooldown reduction after aggregation.
pub const CDR_CAP: f32 = 0.45;

// ============================================================================
// Stat identifiers
// ============================================================================

/// A combat-relevant stat.
///
/// Serialized names follow the content tables (`atk`, `maxHp`, `cdr`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    /// Maximum health points.
    #[serde(rename = "maxHp", alias = "hp")]
    MaxHp,
    /// Maximum mana.
    #[serde(rename = "maxMana", alias = "mana")]
    MaxMana,
    /// Maximum stamina.
    #[serde(rename = "maxStam")]
    MaxStamina,
    /// Attack power.
    #[serde(rename = "atk")]
    Attack,
    /// Defense (armor against physical damage).
    #[serde(rename = "def")]
    Defense,
    /// Movement speed.
    #[serde(rename = "speed")]
    Speed,
    /// Critical hit chance (0.0-0.75).
    #[serde(rename = "critChance")]
    CritChance,
    /// Critical hit damage multiplier.
    #[serde(rename = "critMult")]
    CritMultiplier,
    /// Cooldown reduction (0.0-0.45).
    #[serde(rename = "cdr")]
    CooldownReduction,
    /// Health regeneration per second.
    #[serde(rename = "hpRegen")]
    HpRegen,
    /// Mana regeneration per second.
    #[serde(rename = "manaRegen")]
    ManaRegen,
    /// Stamina regeneration per second.
    #[serde(rename = "stamRegen")]
    StaminaRegen,
    /// Fraction of damage removed while blocking.
    #[serde(rename = "blockEff")]
    BlockEfficiency,
    /// Fraction of direct damage dealt returned as healing.
    #[serde(rename = "lifesteal")]
    Lifesteal,
    /// Bonus attack speed.
    #[serde(rename = "atkSpeed")]
    AttackSpeed,
    /// Bonus cast speed.
    #[serde(rename = "castSpeed")]
    CastSpeed,
    /// Bonus healing power.
    #[serde(rename = "healingPower")]
    HealingPower,
    /// Bonus magic damage.
    #[serde(rename = "magicDmg")]
    MagicDamage,
    /// Bonus damage of every kind.
    #[serde(rename = "allDamage")]
    AllDamage,
    /// Extra damage taken (0.5 = +50%).
    #[serde(rename = "damageTaken")]
    DamageTaken,
    /// Fraction of mana cost waived on casts.
    #[serde(rename = "manaCostReduction")]
    ManaCostReduction,
    /// Bonus shield effectiveness.
    #[serde(rename = "shieldEff")]
    ShieldEfficiency,
}

impl Stat {
    /// Number of stats.
    pub const COUNT: usize = 22;

    /// Every stat, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::MaxHp,
        Self::MaxMana,
        Self::MaxStamina,
        Self::Attack,
        Self::Defense,
        Self::Speed,
        Self::CritChance,
        Self::CritMultiplier,
        Self::CooldownReduction,
        Self::HpRegen,
        Self::ManaRegen,
        Self::StaminaRegen,
        Self::BlockEfficiency,
        Self::Lifesteal,
        Self::AttackSpeed,
        Self::CastSpeed,
        Self::HealingPower,
        Self::MagicDamage,
        Self::AllDamage,
        Self::DamageTaken,
        Self::ManaCostReduction,
        Self::ShieldEfficiency,
    ];

    /// Position of this stat in a [`StatBlock`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the reserved `allStats` percentage applies to this stat.
    #[must_use]
    pub const fn scales_with_all_stats(self) -> bool {
        matches!(
            self,
            Self::MaxHp
                | Self::MaxMana
                | Self::MaxStamina
                | Self::Attack
                | Self::Defense
                | Self::Speed
                | Self::HpRegen
                | Self::ManaRegen
                | Self::StaminaRegen
        )
    }

    /// Whether equipment bonuses to this stat are whole numbers.
    ///
    /// Rarity and level scaling floor these stats; fractional stats such as
    /// crit chance or cdr keep their fractional part.
    #[must_use]
    pub const fn is_integral(self) -> bool {
        matches!(
            self,
            Self::MaxHp
                | Self::MaxMana
                | Self::MaxStamina
                | Self::Attack
                | Self::Defense
                | Self::Speed
        )
    }

    /// Inclusive bounds of the effective value.
    #[must_use]
    pub const fn bounds(self) -> (f32, f32) {
        match self {
            Self::MaxHp => (1.0, f32::INFINITY),
            Self::CritChance => (0.0, 0.75),
            Self::CritMultiplier => (1.0, f32::INFINITY),
            Self::CooldownReduction => (0.0, CDR_CAP),
            Self::BlockEfficiency => (0.0, 0.8),
            Self::Lifesteal => (0.0, 1.0),
            Self::ManaCostReduction => (0.0, 0.9),
            Self::AttackSpeed | Self::CastSpeed => (-0.9, f32::INFINITY),
            Self::HealingPower
            | Self::MagicDamage
            | Self::AllDamage
            | Self::DamageTaken
            | Self::ShieldEfficiency => (-1.0, f32::INFINITY),
            Self::MaxMana
            | Self::MaxStamina
            | Self::Attack
            | Self::Defense
            | Self::Speed
            | Self::HpRegen
            | Self::ManaRegen
            | Self::StaminaRegen => (0.0, f32::INFINITY),
        }
    }

    /// Clamp a value into this stat's bounds.
    #[must_use]
    pub fn clamp(self, value: f32) -> f32 {
        let (min, max) = self.bounds();
        value.clamp(min, max)
    }
}

// ============================================================================
// Stat block
// ============================================================================

/// One value per [`Stat`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock([f32; Stat::COUNT]);

impl StatBlock {
    /// A block with every stat at zero.
    #[must_use]
    pub const fn zeroed() -> Self {
        Self([0.0; Stat::COUNT])
    }

    /// Value of a stat.
    #[must_use]
    pub const fn get(&self, stat: Stat) -> f32 {
        self.0[stat.index()]
    }

    /// Set a stat.
    pub fn set(&mut self, stat: Stat, value: f32) {
        self.0[stat.index()] = value;
    }

    /// Add to a stat.
    pub fn add(&mut self, stat: Stat, value: f32) {
        self.0[stat.index()] += value;
    }

    /// Iterate over `(stat, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Stat, f32)> + '_ {
        Stat::ALL.iter().map(move |&stat| (stat, self.get(stat)))
    }
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::zeroed()
    }
}

// ============================================================================
// Base stats
// ============================================================================

/// Unmodified stats of an entity, set at spawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseStats {
    values: StatBlock,
    /// Innate resistances by damage type.
    pub resistances: Resistances,
}

impl Default for BaseStats {
    /// Starting hero stats.
    fn default() -> Self {
        let mut values = StatBlock::zeroed();
        values.set(Stat::MaxHp, 120.0);
        values.set(Stat::MaxMana, 70.0);
        values.set(Stat::MaxStamina, 100.0);
        values.set(Stat::HpRegen, 1.4);
        values.set(Stat::ManaRegen, 3.0);
        values.set(Stat::StaminaRegen, 18.0);
        values.set(Stat::Attack, 6.0);
        values.set(Stat::Defense, 2.0);
        values.set(Stat::Speed, 145.0);
        values.set(Stat::CritChance, 0.08);
        values.set(Stat::CritMultiplier, 1.7);
        values.set(Stat::BlockEfficiency, 0.5);
        Self {
            values,
            resistances: Resistances::new(),
        }
    }
}

impl BaseStats {
    /// Create base stats with the starting hero defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Base stats with every value zeroed except a 1 hp floor.
    #[must_use]
    pub fn zeroed() -> Self {
        let mut values = StatBlock::zeroed();
        values.set(Stat::MaxHp, 1.0);
        values.set(Stat::CritMultiplier, 1.0);
        Self {
            values,
            resistances: Resistances::new(),
        }
    }

    /// Value of a base stat.
    #[must_use]
    pub const fn get(&self, stat: Stat) -> f32 {
        self.values.get(stat)
    }

    /// Set a base stat.
    pub fn set(&mut self, stat: Stat, value: f32) {
        self.values.set(stat, value);
    }

    /// All base values.
    #[must_use]
    pub const fn values(&self) -> &StatBlock {
        &self.values
    }

    /// Set a stat (builder pattern).
    #[must_use]
    pub fn with(mut self, stat: Stat, value: f32) -> Self {
        self.set(stat, value);
        self
    }

    /// Set max HP.
    #[must_use]
    pub fn with_hp(self, hp: f32) -> Self {
        self.with(Stat::MaxHp, hp)
    }

    /// Set max mana.
    #[must_use]
    pub fn with_mana(self, mana: f32) -> Self {
        self.with(Stat::MaxMana, mana)
    }

    /// Set attack power.
    #[must_use]
    pub fn with_attack(self, attack: f32) -> Self {
        self.with(Stat::Attack, attack)
    }

    /// Set defense value.
    #[must_use]
    pub fn with_defense(self, defense: f32) -> Self {
        self.with(Stat::Defense, defense)
    }

    /// Set a resistance.
    #[must_use]
    pub fn with_resistance(mut self, damage_type: DamageType, value: f32) -> Self {
        self.resistances.set(damage_type, value);
        self
    }
}

// ============================================================================
// Modifiers
// ============================================================================

/// A single stat delta contributed by equipment, a passive or an effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Modifier {
    /// Added to the base value before any percentage applies.
    Flat {
        /// Stat being modified.
        stat: Stat,
        /// Amount added.
        value: f32,
    },
    /// Summed with other percentages, then applied once (0.1 = +10%).
    Percent {
        /// Stat being modified.
        stat: Stat,
        /// Fraction added to the multiplier.
        value: f32,
    },
    /// The reserved `allStats` percentage, added to every stat that scales.
    AllStats(f32),
    /// Added to the resistance for one damage type.
    Resist {
        /// Damage type resisted.
        damage_type: DamageType,
        /// Fraction of damage removed.
        value: f32,
    },
}

impl Modifier {
    /// Flat delta.
    #[must_use]
    pub const fn flat(stat: Stat, value: f32) -> Self {
        Self::Flat { stat, value }
    }

    /// Percentage delta.
    #[must_use]
    pub const fn percent(stat: Stat, value: f32) -> Self {
        Self::Percent { stat, value }
    }

    /// Same modifier with its magnitude multiplied.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        match self {
            Self::Flat { stat, value } => Self::Flat {
                stat,
                value: value * factor,
            },
            Self::Percent { stat, value } => Self::Percent {
                stat,
                value: value * factor,
            },
            Self::AllStats(value) => Self::AllStats(value * factor),
            Self::Resist { damage_type, value } => Self::Resist {
                damage_type,
                value: value * factor,
            },
        }
    }

    /// Whether the magnitude is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Flat { value, .. }
            | Self::Percent { value, .. }
            | Self::AllStats(value)
            | Self::Resist { value, .. } => value.is_finite(),
        }
    }
}

/// A fixed set of modifiers from one source (equipment, passives).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatDeltas {
    modifiers: Vec<Modifier>,
}

impl StatDeltas {
    /// No deltas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a modifier.
    pub fn push(&mut self, modifier: Modifier) {
        self.modifiers.push(modifier);
    }

    /// The modifiers.
    #[must_use]
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Sum of flat deltas to one stat.
    #[must_use]
    pub fn flat_total(&self, stat: Stat) -> f32 {
        self.modifiers
            .iter()
            .filter_map(|m| match *m {
                Modifier::Flat { stat: s, value } if s == stat => Some(value),
                _ => None,
            })
            .sum()
    }
}

impl FromIterator<Modifier> for StatDeltas {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        Self {
            modifiers: iter.into_iter().collect(),
        }
    }
}

impl Extend<Modifier> for StatDeltas {
    fn extend<I: IntoIterator<Item = Modifier>>(&mut self, iter: I) {
        self.modifiers.extend(iter);
    }
}

// ============================================================================
// Crowd control
// ============================================================================

/// Boolean flags an effect sets while active.
///
/// Consumed by movement and combat logic outside the engine; the engine
/// itself reads `stunned`, `silenced` and `invulnerable`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlFlags {
    /// Cannot move.
    pub rooted: bool,
    /// Cannot move or act.
    pub stunned: bool,
    /// Cannot cast.
    pub silenced: bool,
    /// Takes no damage.
    pub invulnerable: bool,
    /// Ignores rooted, stunned and silenced.
    pub cc_immune: bool,
    /// Ignores silenced.
    pub silence_immune: bool,
    /// Hidden from enemies.
    pub invisible: bool,
    /// Ignores ground effects.
    pub flying: bool,
}

impl ControlFlags {
    /// Whether no flag is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Whether this set restricts movement or actions.
    #[must_use]
    pub const fn is_crowd_control(&self) -> bool {
        self.rooted || self.stunned || self.silenced
    }

    /// Union of two flag sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            rooted: self.rooted || other.rooted,
            stunned: self.stunned || other.stunned,
            silenced: self.silenced || other.silenced,
            invulnerable: self.invulnerable || other.invulnerable,
            cc_immune: self.cc_immune || other.cc_immune,
            silence_immune: self.silence_immune || other.silence_immune,
            invisible: self.invisible || other.invisible,
            flying: self.flying || other.flying,
        }
    }
}

/// Control state after immunities are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    /// Cannot move.
    pub rooted: bool,
    /// Cannot move or act.
    pub stunned: bool,
    /// Cannot cast.
    pub silenced: bool,
    /// Takes no damage.
    pub invulnerable: bool,
    /// Hidden from enemies.
    pub invisible: bool,
    /// Ignores ground effects.
    pub flying: bool,
}

impl ControlState {
    /// Resolve the union of all active flags.
    ///
    /// Immunity wins over the control it grants immunity to; stunned implies
    /// rooted.
    #[must_use]
    pub fn resolve(flags: ControlFlags) -> Self {
        let immune = flags.cc_immune;
        let stunned = flags.stunned && !immune;
        Self {
            rooted: (flags.rooted || stunned) && !immune,
            stunned,
            silenced: flags.silenced && !immune && !flags.silence_immune,
            invulnerable: flags.invulnerable,
            invisible: flags.invisible,
            flying: flags.flying,
        }
    }

    /// Check if can act (not stunned).
    #[must_use]
    pub const fn can_act(&self) -> bool {
        !self.stunned
    }

    /// Check if can move.
    #[must_use]
    pub const fn can_move(&self) -> bool {
        !self.stunned && !self.rooted
    }

    /// Check if can cast abilities.
    #[must_use]
    pub const fn can_cast(&self) -> bool {
        !self.stunned && !self.silenced
    }
}

// ============================================================================
// Effective stats
// ============================================================================

/// Fully aggregated stats of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveStats {
    values: StatBlock,
    /// Resistances after modifiers, clamped.
    pub resistances: Resistances,
    /// Control state from active effects.
    pub control: ControlState,
}

impl EffectiveStats {
    pub(crate) fn new(values: StatBlock, resistances: Resistances, control: ControlState) -> Self {
        Self {
            values,
            resistances,
            control,
        }
    }

    /// Value of a stat.
    #[must_use]
    pub const fn get(&self, stat: Stat) -> f32 {
        self.values.get(stat)
    }

    /// All values.
    #[must_use]
    pub const fn values(&self) -> &StatBlock {
        &self.values
    }

    /// Calculated max HP.
    #[must_use]
    pub const fn max_hp(&self) -> f32 {
        self.get(Stat::MaxHp)
    }

    /// Calculated max mana.
    #[must_use]
    pub const fn max_mana(&self) -> f32 {
        self.get(Stat::MaxMana)
    }

    /// Calculated max stamina.
    #[must_use]
    pub const fn max_stamina(&self) -> f32 {
        self.get(Stat::MaxStamina)
    }

    /// Calculated attack.
    #[must_use]
    pub const fn attack(&self) -> f32 {
        self.get(Stat::Attack)
    }

    /// Calculated defense.
    #[must_use]
    pub const fn defense(&self) -> f32 {
        self.get(Stat::Defense)
    }

    /// Calculated movement speed.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.get(Stat::Speed)
    }

    /// Calculated cooldown reduction, already clamped to [0, 0.45].
    #[must_use]
    pub const fn cdr(&self) -> f32 {
        self.get(Stat::CooldownReduction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_indices_match_all() {
        for (i, stat) in Stat::ALL.iter().enumerate() {
            assert_eq!(stat.index(), i);
        }
    }

    #[test]
    fn test_base_stats_default() {
        let base = BaseStats::new();
        assert_eq!(base.get(Stat::MaxHp), 120.0);
        assert_eq!(base.get(Stat::Attack), 6.0);
        assert_eq!(base.get(Stat::CooldownReduction), 0.0);
    }

    #[test]
    fn test_cdr_bounds() {
        assert_eq!(Stat::CooldownReduction.clamp(0.6), CDR_CAP);
        assert_eq!(Stat::CooldownReduction.clamp(-0.2), 0.0);
    }

    #[test]
    fn test_modifier_scaled() {
        let m = Modifier::percent(Stat::Speed, -0.3).scaled(2.0);
        assert_eq!(m, Modifier::percent(Stat::Speed, -0.6));
    }

    #[test]
    fn test_cc_immune_clears_control() {
        let flags = ControlFlags {
            stunned: true,
            silenced: true,
            cc_immune: true,
            ..ControlFlags::default()
        };
        let state = ControlState::resolve(flags);
        assert!(state.can_act());
        assert!(state.can_move());
        assert!(state.can_cast());
    }

    #[test]
    fn test_stun_implies_root() {
        let state = ControlState::resolve(ControlFlags {
            stunned: true,
            ..ControlFlags::default()
        });
        assert!(state.rooted);
        assert!(!state.can_move());
        assert!(!state.can_cast());
    }

    #[test]
    fn test_silence_immunity() {
        let state = ControlState::resolve(ControlFlags {
            silenced: true,
            silence_immune: true,
            ..ControlFlags::default()
        });
        assert!(!state.silenced);
    }

    #[test]
    fn test_stat_serde_names() {
        assert_eq!(ron::to_string(&Stat::CooldownReduction).unwrap(), "cdr");
        let parsed: Stat = ron::from_str("maxHp").unwrap();
        assert_eq!(parsed, Stat::MaxHp);
    }
}
