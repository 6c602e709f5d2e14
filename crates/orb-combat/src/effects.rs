//! Effect Instance Store.
//!
//! Each entity exclusively owns an [`ActiveEffects`] collection. Instances
//! are only created through [`ActiveEffects::apply`], only removed through
//! cleanse or expiry, and only advanced by the tick scheduler. Insertion
//! order is kept and is the order periodic ticks resolve in.

use orb_common::{EffectId, EntityId};
use serde::{Deserialize, Serialize};

use crate::catalog::EffectDefinition;

/// Result of applying an effect to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppliedOutcome {
    /// A new instance was created at one stack.
    Applied,
    /// Non-stacking effect already present; duration reset to full.
    Refreshed,
    /// Stack count increased to the given value; duration reset to full.
    Stacked(u32),
    /// Already at the stack cap; duration reset to full.
    StackCapped,
}

impl AppliedOutcome {
    /// Stacks added by this application.
    #[must_use]
    pub const fn stacks_gained(self) -> u32 {
        match self {
            Self::Applied | Self::Stacked(_) => 1,
            Self::Refreshed | Self::StackCapped => 0,
        }
    }
}

/// Which instances a cleanse removes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CleanseFilter {
    /// Everything.
    All,
    /// Hostile effects.
    Debuffs,
    /// Beneficial effects.
    Buffs,
    /// Effects that root, stun or silence.
    CrowdControl,
    /// Effects with a periodic damage tick.
    DamageOverTime,
    /// One specific effect.
    Effect(EffectId),
}

impl CleanseFilter {
    /// Whether an instance of `def` matches.
    #[must_use]
    pub fn matches(&self, def: &EffectDefinition) -> bool {
        match self {
            Self::All => true,
            Self::Debuffs => def.is_debuff(),
            Self::Buffs => !def.is_debuff(),
            Self::CrowdControl => def.is_crowd_control(),
            Self::DamageOverTime => def.is_damage_over_time(),
            Self::Effect(id) => def.id == *id,
        }
    }
}

/// An effect attached to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectInstance {
    effect: EffectId,
    remaining: Option<f32>,
    stacks: u32,
    tick_accumulator: f32,
    source: Option<EntityId>,
}

impl EffectInstance {
    fn new(def: &EffectDefinition, source: Option<EntityId>) -> Self {
        Self {
            effect: def.id.clone(),
            remaining: def.duration,
            stacks: 1,
            tick_accumulator: 0.0,
            source,
        }
    }

    /// Definition id.
    #[must_use]
    pub fn effect(&self) -> &EffectId {
        &self.effect
    }

    /// Seconds left; `None` for permanent effects.
    #[must_use]
    pub const fn remaining(&self) -> Option<f32> {
        self.remaining
    }

    /// Current stack count.
    #[must_use]
    pub const fn stacks(&self) -> u32 {
        self.stacks
    }

    /// Time accumulated toward the next periodic tick.
    #[must_use]
    pub const fn tick_accumulator(&self) -> f32 {
        self.tick_accumulator
    }

    /// Entity that last applied this instance. Attribution only.
    #[must_use]
    pub const fn source(&self) -> Option<EntityId> {
        self.source
    }

    /// Check if expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining.is_some_and(|r| r <= 0.0)
    }

    fn refresh(&mut self, def: &EffectDefinition, source: Option<EntityId>) {
        self.remaining = def.duration;
        if source.is_some() {
            self.source = source;
        }
    }

    /// Accumulate `dt` and return how many ticks of `interval` elapsed.
    pub(crate) fn accumulate(&mut self, dt: f32, interval: f32) -> u32 {
        self.tick_accumulator += dt;
        let mut ticks = 0;
        // Tolerance scales with the interval so f32 drift from many small
        // frames cannot add a tick. Any leftover carries into the next frame.
        let tolerance = interval * TICK_EPSILON;
        while self.tick_accumulator + tolerance >= interval {
            self.tick_accumulator -= interval;
            ticks += 1;
        }
        ticks
    }

    /// Decrement remaining duration. Returns true once expired.
    pub(crate) fn elapse(&mut self, dt: f32) -> bool {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= dt;
            if *remaining <= TICK_EPSILON {
                *remaining = 0.0;
            }
        }
        self.is_expired()
    }

    #[cfg(test)]
    pub(crate) fn force_stacks(&mut self, stacks: u32) {
        self.stacks = stacks;
    }
}

/// Expiry tolerance in seconds, and tick tolerance as a fraction of the interval.
pub(crate) const TICK_EPSILON: f32 = 1e-4;

/// Insertion-ordered active effects of one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffects {
    instances: Vec<EffectInstance>,
}

impl ActiveEffects {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `def`, applying its stacking policy.
    pub fn apply(&mut self, def: &EffectDefinition, source: Option<EntityId>) -> AppliedOutcome {
        let Some(existing) = self.instances.iter_mut().find(|i| i.effect == def.id) else {
            self.instances.push(EffectInstance::new(def, source));
            return AppliedOutcome::Applied;
        };

        existing.refresh(def, source);
        if !def.is_stacking() {
            AppliedOutcome::Refreshed
        } else if existing.stacks < def.stack_cap() {
            existing.stacks += 1;
            AppliedOutcome::Stacked(existing.stacks)
        } else {
            AppliedOutcome::StackCapped
        }
    }

    /// Remove every instance for which `predicate` returns true.
    ///
    /// Returns the removed instances in their original order.
    pub fn cleanse<F>(&mut self, mut predicate: F) -> Vec<EffectInstance>
    where
        F: FnMut(&EffectInstance) -> bool,
    {
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.instances.len());
        for instance in self.instances.drain(..) {
            if predicate(&instance) {
                removed.push(instance);
            } else {
                kept.push(instance);
            }
        }
        self.instances = kept;
        removed
    }

    /// Remove and return every instance.
    pub fn clear(&mut self) -> Vec<EffectInstance> {
        std::mem::take(&mut self.instances)
    }

    /// Instance of an effect, if attached.
    #[must_use]
    pub fn get(&self, effect: &EffectId) -> Option<&EffectInstance> {
        self.instances.iter().find(|i| i.effect == *effect)
    }

    /// Check if an effect is attached.
    #[must_use]
    pub fn contains(&self, effect: &EffectId) -> bool {
        self.get(effect).is_some()
    }

    /// Instances in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &EffectInstance> {
        self.instances.iter()
    }

    /// Number of instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Check if empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [EffectInstance] {
        &mut self.instances
    }

    /// Drop expired instances, returning them in order.
    pub(crate) fn take_expired(&mut self) -> Vec<EffectInstance> {
        self.cleanse(EffectInstance::is_expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TickSpec;
    use crate::damage::DamageType;
    use crate::stats::{Modifier, Stat};
    use proptest::prelude::*;

    fn haste() -> EffectDefinition {
        EffectDefinition::buff("haste", "Haste")
            .with_duration(5.0)
            .with_modifiers([Modifier::percent(Stat::Speed, 0.3)])
    }

    fn bleed(max: u32) -> EffectDefinition {
        EffectDefinition::debuff("bleed", "Bleed")
            .with_duration(6.0)
            .with_max_stacks(max)
            .with_tick(TickSpec::damage(20.0, 1.0, DamageType::Physical))
    }

    #[test]
    fn test_first_apply_creates_instance() {
        let mut store = ActiveEffects::new();
        assert_eq!(store.apply(&haste(), None), AppliedOutcome::Applied);
        assert_eq!(store.len(), 1);
        let inst = store.get(&EffectId::new("haste")).unwrap();
        assert_eq!(inst.stacks(), 1);
        assert_eq!(inst.remaining(), Some(5.0));
    }

    #[test]
    fn test_reapply_non_stacking_refreshes() {
        let mut store = ActiveEffects::new();
        let def = haste();
        store.apply(&def, None);
        store.instances_mut()[0].elapse(3.0);
        assert_eq!(store.apply(&def, None), AppliedOutcome::Refreshed);
        assert_eq!(store.len(), 1);
        assert_eq!(store.iter().next().unwrap().remaining(), Some(5.0));
    }

    #[test]
    fn test_stack_until_cap() {
        let mut store = ActiveEffects::new();
        let def = bleed(3);
        assert_eq!(store.apply(&def, None), AppliedOutcome::Applied);
        assert_eq!(store.apply(&def, None), AppliedOutcome::Stacked(2));
        assert_eq!(store.apply(&def, None), AppliedOutcome::Stacked(3));
        assert_eq!(store.apply(&def, None), AppliedOutcome::StackCapped);
        assert_eq!(store.iter().next().unwrap().stacks(), 3);
    }

    #[test]
    fn test_refresh_keeps_tick_progress_and_updates_source() {
        let mut store = ActiveEffects::new();
        let def = bleed(5);
        store.apply(&def, Some(EntityId::from_raw(1)));
        store.instances_mut()[0].accumulate(0.6, 1.0);
        store.apply(&def, Some(EntityId::from_raw(2)));
        let inst = store.iter().next().unwrap();
        assert!((inst.tick_accumulator() - 0.6).abs() < 1e-6);
        assert_eq!(inst.source(), Some(EntityId::from_raw(2)));
    }

    #[test]
    fn test_permanent_never_expires() {
        let mut store = ActiveEffects::new();
        let def = EffectDefinition::buff("emperor", "Emperor")
            .with_modifiers([Modifier::percent(Stat::MaxHp, 2.0)]);
        store.apply(&def, None);
        assert!(!store.instances_mut()[0].elapse(1.0e6));
        assert!(store.take_expired().is_empty());
    }

    #[test]
    fn test_cleanse_keeps_order() {
        let mut store = ActiveEffects::new();
        store.apply(&haste(), None);
        store.apply(&bleed(5), None);
        store.apply(&EffectDefinition::buff("vigor", "Vigor").with_duration(12.0), None);

        let removed = store.cleanse(|i| i.effect().as_str() == "bleed");
        assert_eq!(removed.len(), 1);
        let order: Vec<_> = store.iter().map(|i| i.effect().as_str()).collect();
        assert_eq!(order, vec!["haste", "vigor"]);
    }

    #[test]
    fn test_accumulate_counts_ticks() {
        let mut store = ActiveEffects::new();
        store.apply(&bleed(1), None);
        let inst = &mut store.instances_mut()[0];
        assert_eq!(inst.accumulate(0.5, 1.0), 0);
        assert_eq!(inst.accumulate(2.6, 1.0), 3);
        assert!((inst.tick_accumulator() - 0.1).abs() < 1e-4);
    }

    #[test]
    fn test_accumulate_small_frames_never_overcount() {
        let mut store = ActiveEffects::new();
        store.apply(&bleed(1), None);
        let inst = &mut store.instances_mut()[0];
        let interval = 2.0e-4;
        let mut ticks = 0;
        for _ in 0..21 {
            ticks += inst.accumulate(1.5e-4, interval);
        }
        // 21 × 1.5e-4 = 3.15e-3 elapsed, 15 whole intervals.
        assert_eq!(ticks, 15);
    }

    #[test]
    fn test_accumulate_frame_rate_matches_floor() {
        let mut store = ActiveEffects::new();
        store.apply(&bleed(1), None);
        let inst = &mut store.instances_mut()[0];
        let mut ticks = 0;
        for _ in 0..180 {
            ticks += inst.accumulate(1.0 / 60.0, 0.5);
        }
        assert_eq!(ticks, 6);
    }

    #[test]
    fn test_cleanse_filter_matches() {
        let dot = bleed(5);
        assert!(CleanseFilter::Debuffs.matches(&dot));
        assert!(CleanseFilter::DamageOverTime.matches(&dot));
        assert!(!CleanseFilter::Buffs.matches(&dot));
        assert!(!CleanseFilter::CrowdControl.matches(&dot));
        assert!(CleanseFilter::Effect(EffectId::new("bleed")).matches(&dot));
    }

    proptest! {
        #[test]
        fn prop_stack_count_never_exceeds_cap(cap in 1u32..10, applies in 1usize..30) {
            let def = bleed(cap);
            let mut store = ActiveEffects::new();
            for _ in 0..applies {
                store.apply(&def, None);
            }
            let stacks = store.iter().next().unwrap().stacks();
            prop_assert_eq!(stacks, (applies as u32).min(cap));
            prop_assert_eq!(store.len(), 1);
        }
    }
}
