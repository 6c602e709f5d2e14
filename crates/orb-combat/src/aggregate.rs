//! Stat Aggregator.
//!
//! Effective stats are a pure function of base stats, equipment deltas,
//! passive deltas and active effects. Flat deltas add to the base; percentage
//! deltas from every source are summed into one bucket per stat and applied
//! once:
//!
//! ```text
//! final = clamp((base + Σflat) × max(0, 1 + Σpercent + allStats))
//! ```
//!
//! Percentages never compound: two +10% attack sources on 100 base give 120.

use crate::catalog::Catalog;
use crate::damage::Resistances;
use crate::effects::ActiveEffects;
use crate::stats::{
    BaseStats, ControlFlags, ControlState, EffectiveStats, Modifier, Stat, StatBlock, StatDeltas,
};

/// Running sums of every contribution.
#[derive(Debug, Clone, Default)]
pub struct StatAccumulator {
    flat: StatBlock,
    percent: StatBlock,
    all_stats: f32,
    resistances: Resistances,
    control: ControlFlags,
}

impl StatAccumulator {
    /// Empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one modifier, multiplied by `scale` (stack count for effects).
    pub fn add(&mut self, modifier: &Modifier, scale: f32) {
        match *modifier {
            Modifier::Flat { stat, value } => self.flat.add(stat, value * scale),
            Modifier::Percent { stat, value } => self.percent.add(stat, value * scale),
            Modifier::AllStats(value) => self.all_stats += value * scale,
            Modifier::Resist { damage_type, value } => {
                self.resistances.add(damage_type, value * scale);
            },
        }
    }

    /// Add a whole delta set at scale 1.
    pub fn add_deltas(&mut self, deltas: &StatDeltas) {
        for modifier in deltas.modifiers() {
            self.add(modifier, 1.0);
        }
    }

    /// Merge crowd-control flags.
    pub fn add_control(&mut self, flags: ControlFlags) {
        self.control = self.control.union(flags);
    }

    /// Summed `allStats` percentage.
    #[must_use]
    pub const fn all_stats(&self) -> f32 {
        self.all_stats
    }

    /// Produce the final snapshot.
    #[must_use]
    pub fn finish(&self, base: &BaseStats, resistance_cap: f32) -> EffectiveStats {
        let mut values = StatBlock::zeroed();
        for stat in Stat::ALL {
            let additive = base.get(stat) + self.flat.get(stat);
            let mut percent = self.percent.get(stat);
            if stat.scales_with_all_stats() {
                percent += self.all_stats;
            }
            let multiplier = (1.0 + percent).max(0.0);
            values.set(stat, stat.clamp(additive * multiplier));
        }

        let mut resistances = base.resistances;
        for damage_type in crate::damage::DamageType::ALL {
            resistances.add(damage_type, self.resistances.get(damage_type));
        }

        EffectiveStats::new(
            values,
            resistances.clamped(resistance_cap),
            ControlState::resolve(self.control),
        )
    }
}

/// Inputs of one aggregation.
#[derive(Debug, Clone, Copy)]
pub struct StatSources<'a> {
    /// Unmodified stats.
    pub base: &'a BaseStats,
    /// Scaled loadout bonuses.
    pub equipment: &'a StatDeltas,
    /// Selected passives.
    pub passives: &'a StatDeltas,
    /// Active effects.
    pub effects: &'a ActiveEffects,
}

/// Aggregate effective stats.
///
/// Instances whose definition is missing from `catalog` contribute nothing;
/// the scheduler reports them as faults.
#[must_use]
pub fn compute_effective_stats(
    sources: StatSources<'_>,
    catalog: &Catalog,
    resistance_cap: f32,
) -> EffectiveStats {
    let mut acc = StatAccumulator::new();
    acc.add_deltas(sources.equipment);
    acc.add_deltas(sources.passives);

    for instance in sources.effects.iter() {
        let Some(def) = catalog.effect(instance.effect()) else {
            continue;
        };
        let scale = instance.stacks() as f32;
        for modifier in def.modifiers() {
            acc.add(modifier, scale);
        }
        if let Some(flags) = def.control() {
            acc.add_control(flags);
        }
    }

    acc.finish(sources.base, resistance_cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EffectDefinition;
    use crate::damage::DamageType;
    use proptest::prelude::*;

    const EPS: f32 = 1e-3;

    fn base_atk(atk: f32) -> BaseStats {
        BaseStats::zeroed().with_attack(atk)
    }

    #[test]
    fn test_percentages_sum_before_multiplying() {
        let mut acc = StatAccumulator::new();
        acc.add(&Modifier::percent(Stat::Attack, 0.1), 1.0);
        acc.add(&Modifier::percent(Stat::Attack, 0.1), 1.0);
        let stats = acc.finish(&base_atk(100.0), 0.8);
        assert!((stats.attack() - 120.0).abs() < EPS);
    }

    #[test]
    fn test_flat_applies_before_percent() {
        let mut acc = StatAccumulator::new();
        acc.add(&Modifier::flat(Stat::Attack, 20.0), 1.0);
        acc.add(&Modifier::percent(Stat::Attack, 0.5), 1.0);
        let stats = acc.finish(&base_atk(100.0), 0.8);
        assert!((stats.attack() - 180.0).abs() < EPS);
    }

    #[test]
    fn test_all_stats_joins_percent_bucket() {
        let mut acc = StatAccumulator::new();
        acc.add(&Modifier::AllStats(0.1), 1.0);
        acc.add(&Modifier::percent(Stat::Attack, 0.1), 1.0);
        acc.add(&Modifier::flat(Stat::CritChance, 0.1), 1.0);
        let stats = acc.finish(&base_atk(100.0), 0.8);
        assert!((stats.attack() - 120.0).abs() < EPS);
        // critChance does not scale with allStats.
        assert!((stats.get(Stat::CritChance) - 0.1).abs() < EPS);
    }

    #[test]
    fn test_negative_percent_floors_at_zero() {
        let mut acc = StatAccumulator::new();
        acc.add(&Modifier::percent(Stat::Speed, -1.0), 1.0);
        acc.add(&Modifier::percent(Stat::Speed, -0.3), 1.0);
        let stats = acc.finish(&BaseStats::zeroed().with(Stat::Speed, 145.0), 0.8);
        assert_eq!(stats.speed(), 0.0);
    }

    #[test]
    fn test_cdr_clamped() {
        let mut acc = StatAccumulator::new();
        acc.add(&Modifier::flat(Stat::CooldownReduction, 0.30), 1.0);
        acc.add(&Modifier::flat(Stat::CooldownReduction, 0.20), 1.0);
        acc.add(&Modifier::flat(Stat::CooldownReduction, 0.10), 1.0);
        let stats = acc.finish(&BaseStats::zeroed(), 0.8);
        assert!((stats.cdr() - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_max_hp_never_below_one() {
        let mut acc = StatAccumulator::new();
        acc.add(&Modifier::AllStats(-2.0), 1.0);
        let stats = acc.finish(&BaseStats::new(), 0.8);
        assert_eq!(stats.max_hp(), 1.0);
    }

    #[test]
    fn test_resistance_modifiers_clamped() {
        let mut acc = StatAccumulator::new();
        acc.add(
            &Modifier::Resist {
                damage_type: DamageType::Fire,
                value: 0.6,
            },
            2.0,
        );
        let stats = acc.finish(&BaseStats::zeroed(), 0.8);
        assert!((stats.resistances.get(DamageType::Fire) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_effect_modifiers_scale_with_stacks() {
        let def = EffectDefinition::debuff("slow", "Slow")
            .with_duration(6.0)
            .with_max_stacks(4)
            .with_modifiers([Modifier::percent(Stat::Speed, -0.3)]);
        let mut builder = Catalog::builder();
        builder.add_effect(def.clone()).unwrap();
        let catalog = builder.build().unwrap();

        let mut effects = ActiveEffects::new();
        effects.apply(&def, None);
        effects.apply(&def, None);

        let base = BaseStats::zeroed().with(Stat::Speed, 100.0);
        let empty = StatDeltas::new();
        let stats = compute_effective_stats(
            StatSources {
                base: &base,
                equipment: &empty,
                passives: &empty,
                effects: &effects,
            },
            &catalog,
            0.8,
        );
        assert!((stats.speed() - 40.0).abs() < EPS);
    }

    proptest! {
        #[test]
        fn prop_percent_sources_sum(
            base in 1.0f32..500.0,
            pcts in proptest::collection::vec(-0.5f32..0.5, 0..8),
        ) {
            let mut acc = StatAccumulator::new();
            for p in &pcts {
                acc.add(&Modifier::percent(Stat::Attack, *p), 1.0);
            }
            let sum: f32 = pcts.iter().sum();
            let expected = base * (1.0 + sum).max(0.0);
            let stats = acc.finish(&base_atk(base), 0.8);
            prop_assert!((stats.attack() - expected).abs() <= expected.abs() * 1e-4 + 1e-3);
        }

        #[test]
        fn prop_cdr_always_within_bounds(
            parts in proptest::collection::vec(-0.3f32..0.4, 0..10),
        ) {
            let mut acc = StatAccumulator::new();
            for p in &parts {
                acc.add(&Modifier::flat(Stat::CooldownReduction, *p), 1.0);
            }
            let cdr = acc.finish(&BaseStats::zeroed(), 0.8).cdr();
            prop_assert!((0.0..=0.45).contains(&cdr));
        }

        #[test]
        fn prop_aggregation_is_deterministic(
            atk in 0.0f32..200.0,
            flat in -50.0f32..50.0,
            pct in -1.0f32..1.0,
        ) {
            let mut acc = StatAccumulator::new();
            acc.add(&Modifier::flat(Stat::Attack, flat), 1.0);
            acc.add(&Modifier::percent(Stat::Attack, pct), 1.0);
            let base = base_atk(atk);
            prop_assert_eq!(acc.finish(&base, 0.8), acc.finish(&base, 0.8));
        }
    }
}
