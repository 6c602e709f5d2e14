//! Loadout/Rarity Scaler.
//!
//! Turns a loadout definition into the equipment deltas consumed by the
//! aggregator. Rarity multiplies each piece's bonuses; level multiplies the
//! summed totals afterwards. Whole-number stats are floored at both steps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::LoadoutDefinition;
use crate::stats::{Modifier, Stat, StatDeltas};

/// Guards the floor against representation error (10 × 1.3 = 12.999…).
const FLOOR_EPSILON: f64 = 1e-6;

/// Item rarity tier.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    /// ×1.
    #[default]
    Common,
    /// ×1.2.
    Uncommon,
    /// ×1.5.
    Rare,
    /// ×2.
    Epic,
    /// ×3.
    Legendary,
}

impl Rarity {
    /// Multiplier applied to every flat bonus.
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 1.2,
            Self::Rare => 1.5,
            Self::Epic => 2.0,
            Self::Legendary => 3.0,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Common => "Common",
            Self::Uncommon => "Uncommon",
            Self::Rare => "Rare",
            Self::Epic => "Epic",
            Self::Legendary => "Legendary",
        }
    }
}

/// `1 + (level - 1) × 0.1`. Level 0 is treated as level 1.
#[must_use]
pub fn level_multiplier(level: u32) -> f64 {
    1.0 + f64::from(level.max(1) - 1) * 0.1
}

fn floor_stable(value: f64) -> f64 {
    (value + FLOOR_EPSILON).floor()
}

/// Scaled equipment bonuses of a loadout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentBonuses {
    totals: BTreeMap<Stat, f32>,
}

impl EquipmentBonuses {
    /// Bonus to one stat.
    #[must_use]
    pub fn get(&self, stat: Stat) -> f32 {
        self.totals.get(&stat).copied().unwrap_or(0.0)
    }

    /// `(stat, bonus)` pairs in stat order.
    pub fn iter(&self) -> impl Iterator<Item = (Stat, f32)> + '_ {
        self.totals.iter().map(|(s, v)| (*s, *v))
    }

    /// Check if no bonus is granted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Flat modifiers for the aggregator.
    #[must_use]
    pub fn to_deltas(&self) -> StatDeltas {
        self.iter()
            .filter(|(_, v)| *v != 0.0)
            .map(|(stat, value)| Modifier::flat(stat, value))
            .collect()
    }
}

/// Scale a loadout at the given rarity and level.
///
/// Pure; safe to call for previews and tooltips.
#[must_use]
pub fn scale(loadout: &LoadoutDefinition, rarity: Rarity, level: u32) -> EquipmentBonuses {
    let rarity_mult = rarity.multiplier();
    let mut totals: BTreeMap<Stat, f64> = BTreeMap::new();

    for piece in &loadout.pieces {
        for (&stat, &value) in &piece.bonuses {
            let scaled = f64::from(value) * rarity_mult;
            let scaled = if stat.is_integral() {
                floor_stable(scaled)
            } else {
                scaled
            };
            *totals.entry(stat).or_insert(0.0) += scaled;
        }
    }

    let level_mult = level_multiplier(level);
    let totals = totals
        .into_iter()
        .map(|(stat, total)| {
            let leveled = total * level_mult;
            let leveled = if stat.is_integral() {
                floor_stable(leveled)
            } else {
                leveled
            };
            (stat, leveled as f32)
        })
        .collect();

    EquipmentBonuses { totals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EquipSlot, EquipmentPiece};

    fn loadout(pieces: Vec<EquipmentPiece>) -> LoadoutDefinition {
        let mut def = LoadoutDefinition::new("test", "Test", Rarity::Common);
        def.pieces = pieces;
        def
    }

    #[test]
    fn test_epic_level_three_attack() {
        let def = loadout(vec![
            EquipmentPiece::new(EquipSlot::Weapon, "Sword").with_bonus(Stat::Attack, 4.0)
        ]);
        let bonuses = scale(&def, Rarity::Epic, 3);
        assert_eq!(bonuses.get(Stat::Attack), 9.0);
    }

    #[test]
    fn test_rarity_floors_per_piece() {
        // 3 × 1.5 = 4.5 → 4 on each piece, then summed.
        let def = loadout(vec![
            EquipmentPiece::new(EquipSlot::Helmet, "Helm").with_bonus(Stat::Defense, 3.0),
            EquipmentPiece::new(EquipSlot::Chest, "Plate").with_bonus(Stat::Defense, 3.0),
        ]);
        assert_eq!(scale(&def, Rarity::Rare, 1).get(Stat::Defense), 8.0);
    }

    #[test]
    fn test_floor_is_stable_for_exact_products() {
        let def = loadout(vec![
            EquipmentPiece::new(EquipSlot::Weapon, "Staff").with_bonus(Stat::MaxMana, 10.0)
        ]);
        // 10 × 1.2 × 1.3 = 15.6 → 15; 10 × 1 × 1.3 = 13 exactly.
        assert_eq!(scale(&def, Rarity::Uncommon, 4).get(Stat::MaxMana), 15.0);
        assert_eq!(scale(&def, Rarity::Common, 4).get(Stat::MaxMana), 13.0);
    }

    #[test]
    fn test_fractional_stats_keep_fraction() {
        let def = loadout(vec![
            EquipmentPiece::new(EquipSlot::Weapon, "Dagger").with_bonus(Stat::CritChance, 0.05)
        ]);
        let crit = scale(&def, Rarity::Epic, 1).get(Stat::CritChance);
        assert!((crit - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_level_zero_is_level_one() {
        assert!((level_multiplier(0) - 1.0).abs() < f64::EPSILON);
        assert!((level_multiplier(1) - 1.0).abs() < f64::EPSILON);
        assert!((level_multiplier(5) - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_to_deltas_is_flat() {
        let def = loadout(vec![EquipmentPiece::new(EquipSlot::Weapon, "Axe")
            .with_bonus(Stat::Attack, 7.0)
            .with_bonus(Stat::Speed, -1.0)]);
        let deltas = scale(&def, Rarity::Common, 1).to_deltas();
        assert_eq!(deltas.flat_total(Stat::Attack), 7.0);
        assert_eq!(deltas.flat_total(Stat::Speed), -1.0);
    }
}
