//! # Orb Combat
//!
//! Effect resolution engine for the Orb RPG.
//!
//! This crate owns everything that decides what happens to a combatant:
//! - Effect instances with stacking, refresh and expiry
//! - Stat aggregation with a dirty-flag cache
//! - Per-frame tick scheduling of periodic effects and casts
//! - Ability cast validation, channeling and resolution
//! - Loadout scaling by rarity and slot level
//! - A catalog of content definitions, loadable from RON
//! - A combat event bus for presentation layers
//!
//! The entry point is [`CombatEngine`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod aggregate;
pub mod cast;
pub mod catalog;
pub mod config;
pub mod content;
pub mod damage;
pub mod effects;
pub mod engine;
pub mod entity;
pub mod error;
pub mod events;
pub mod loadout;
pub mod scheduler;
pub mod stats;

mod e2e_tests;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregate::*;
    pub use crate::cast::*;
    pub use crate::catalog::*;
    pub use crate::config::*;
    pub use crate::content::*;
    pub use crate::damage::*;
    pub use crate::effects::*;
    pub use crate::engine::*;
    pub use crate::entity::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::loadout::*;
    pub use crate::scheduler::*;
    pub use crate::stats::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use orb_common::{AbilityId, EffectId, LoadoutId};
    use std::sync::Arc;

    #[test]
    fn test_builtin_engine_round() {
        let catalog = Arc::new(builtin_catalog().unwrap());
        let mut engine = CombatEngine::new(catalog, EngineConfig::default());

        let hero = engine.spawn(EntityKind::Player, "Hero", BaseStats::new());
        let wolf = engine.spawn(
            EntityKind::Enemy,
            "Wolf",
            BaseStats::new().with_hp(300.0),
        );
        engine
            .equip_loadout(hero, &LoadoutId::new("warrior_melee_basic"), 1, None)
            .unwrap();

        let outcome = engine
            .cast_ability(hero, &AbilityId::new("slash"), TargetHint::Entity(wolf))
            .unwrap();
        assert!(matches!(outcome, CastOutcome::Started { .. }));
        let report = engine.advance(0.5);
        assert_eq!(report.casts_completed, 1);
        assert!(engine.resources(wolf).unwrap().hp < 300.0);

        engine
            .apply_effect(wolf, &EffectId::new("bleed"), Some(hero))
            .unwrap();
        let report = engine.advance(1.0);
        assert_eq!(report.entities, 2);
        assert!(report.ticks >= 1);
    }
}
