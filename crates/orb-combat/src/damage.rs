//! Damage types, resistances and mitigation.
//!
//! Direct hits and periodic ticks share one path: [`mitigate`] turns an
//! incoming [`Hit`] into the amount the target actually suffers, and
//! [`Resources::absorb`](crate::entity::Resources::absorb) drains shield
//! before hp.

use orb_common::EntityId;
use serde::{Deserialize, Serialize};

use crate::stats::{EffectiveStats, Stat};

/// Armor constant in `damage * K / (K + def)`.
pub const ARMOR_SCALING: f32 = 100.0;

// ============================================================================
// Damage types
// ============================================================================

/// Types of damage that can be dealt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageType {
    /// Physical damage - reduced by armor.
    Physical,
    /// Fire damage.
    Fire,
    /// Ice/frost damage.
    Ice,
    /// Lightning damage.
    Lightning,
    /// Nature/poison damage.
    Nature,
    /// Shadow damage.
    Shadow,
    /// Arcane damage.
    Arcane,
    /// Holy/light damage.
    Holy,
    /// True damage - ignores all defenses.
    True,
}

impl DamageType {
    /// Number of damage types.
    pub const COUNT: usize = 9;

    /// Every damage type, in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Physical,
        Self::Fire,
        Self::Ice,
        Self::Lightning,
        Self::Nature,
        Self::Shadow,
        Self::Arcane,
        Self::Holy,
        Self::True,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Check if this damage type bypasses armor.
    #[must_use]
    pub const fn bypasses_armor(self) -> bool {
        !matches!(self, Self::Physical)
    }

    /// Check if damage ignores all defenses.
    #[must_use]
    pub const fn is_true_damage(self) -> bool {
        matches!(self, Self::True)
    }

    /// Whether `magicDmg` amplifies this type.
    #[must_use]
    pub const fn is_magic(self) -> bool {
        !matches!(self, Self::Physical | Self::True)
    }
}

// ============================================================================
// Resistances
// ============================================================================

/// Resistances to different damage types.
///
/// 0.0 = none, positive = damage removed, negative = weakness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Resistances {
    values: [f32; DamageType::COUNT],
}

impl Resistances {
    /// Create empty resistances.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get resistance for a damage type.
    #[must_use]
    pub const fn get(&self, damage_type: DamageType) -> f32 {
        self.values[damage_type.index()]
    }

    /// Set resistance for a damage type.
    pub fn set(&mut self, damage_type: DamageType, value: f32) {
        self.values[damage_type.index()] = value;
    }

    /// Add to the resistance for a damage type.
    pub fn add(&mut self, damage_type: DamageType, value: f32) {
        self.values[damage_type.index()] += value;
    }

    /// Add resistance (builder pattern).
    #[must_use]
    pub fn with_resistance(mut self, damage_type: DamageType, value: f32) -> Self {
        self.set(damage_type, value);
        self
    }

    /// Copy with every value clamped to `[-cap, cap]`.
    #[must_use]
    pub fn clamped(mut self, cap: f32) -> Self {
        for value in &mut self.values {
            *value = value.clamp(-cap, cap);
        }
        self
    }

    /// Calculate damage multiplier from resistance.
    #[must_use]
    pub const fn damage_multiplier(&self, damage_type: DamageType) -> f32 {
        1.0 - self.get(damage_type)
    }
}

// ============================================================================
// Hits
// ============================================================================

/// Where a hit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitKind {
    /// An ability or a caller-driven strike.
    Direct,
    /// A periodic tick from an active effect.
    Periodic,
}

/// An incoming instance of damage before mitigation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Damage before the target's defenses.
    pub amount: f32,
    /// Damage type.
    pub damage_type: DamageType,
    /// Attacker, if any. Used for attribution only.
    pub source: Option<EntityId>,
    /// Direct or periodic.
    pub kind: HitKind,
}

impl Hit {
    /// A direct hit.
    #[must_use]
    pub const fn direct(amount: f32, damage_type: DamageType, source: Option<EntityId>) -> Self {
        Self {
            amount,
            damage_type,
            source,
            kind: HitKind::Direct,
        }
    }

    /// A periodic tick.
    #[must_use]
    pub const fn periodic(amount: f32, damage_type: DamageType, source: Option<EntityId>) -> Self {
        Self {
            amount,
            damage_type,
            source,
            kind: HitKind::Periodic,
        }
    }
}

/// Result of routing a hit through the damage path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageOutcome {
    /// Damage before mitigation.
    pub raw: f32,
    /// Damage after armor, resistance and damage-taken.
    pub mitigated: f32,
    /// Portion soaked by shield.
    pub absorbed: f32,
    /// Health actually lost.
    pub dealt: f32,
    /// Target was invulnerable or already dead.
    pub ignored: bool,
    /// This hit brought the target to zero hp.
    pub killed: bool,
}

impl DamageOutcome {
    /// Outcome of a hit that had no effect.
    #[must_use]
    pub const fn ignored(raw: f32) -> Self {
        Self {
            raw,
            mitigated: 0.0,
            absorbed: 0.0,
            dealt: 0.0,
            ignored: true,
            killed: false,
        }
    }

    /// Shield plus health removed.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.absorbed + self.dealt
    }

    /// Sum of two hits on the same target.
    #[must_use]
    pub fn merged(self, other: Self) -> Self {
        Self {
            raw: self.raw + other.raw,
            mitigated: self.mitigated + other.mitigated,
            absorbed: self.absorbed + other.absorbed,
            dealt: self.dealt + other.dealt,
            ignored: self.ignored && other.ignored,
            killed: self.killed || other.killed,
        }
    }
}

/// Damage the target suffers from `amount` of `damage_type`, before shields.
///
/// Physical damage is reduced by armor, other types by resistance (already
/// clamped during aggregation). True damage skips both. `damageTaken` then
/// scales the result.
#[must_use]
pub fn mitigate(amount: f32, damage_type: DamageType, target: &EffectiveStats) -> f32 {
    if amount <= 0.0 {
        return 0.0;
    }

    let reduced = if damage_type.is_true_damage() {
        amount
    } else if damage_type.bypasses_armor() {
        amount * target.resistances.damage_multiplier(damage_type)
    } else {
        let def = target.defense().max(0.0);
        amount * ARMOR_SCALING / (ARMOR_SCALING + def)
    };

    let taken = 1.0 + target.get(Stat::DamageTaken);
    (reduced * taken).max(0.0)
}

/// Outgoing damage multiplier of an attacker for a damage type.
#[must_use]
pub fn outgoing_multiplier(damage_type: DamageType, attacker: &EffectiveStats) -> f32 {
    let mut bonus = attacker.get(Stat::AllDamage);
    if damage_type.is_magic() {
        bonus += attacker.get(Stat::MagicDamage);
    }
    (1.0 + bonus).max(0.0)
}
