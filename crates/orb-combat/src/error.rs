//! Error types for the combat engine.
//!
//! Caller-facing failures are expected and frequent (a cast on cooldown, an
//! effect on a despawned target), so every operation returns a typed error
//! instead of panicking. [`FaultError`] is different: it means an internal
//! invariant broke and is reported by the scheduler, never returned by
//! `apply`.

use orb_common::{AbilityId, EffectId, EntityId, LoadoutId, OrbError, SchemaVersion};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from applying or cleansing effects.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EffectError {
    /// No definition with this id in the catalog.
    #[error("unknown effect: {0}")]
    UnknownEffect(EffectId),
    /// Target entity does not exist.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),
    /// Target is dead; effects only land on the living.
    #[error("target {0} is dead")]
    TargetDead(EntityId),
}

/// Why a caster cannot act.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncapacitatedReason {
    /// Caster has zero hp.
    Dead,
    /// Caster is stunned.
    Stunned,
}

impl std::fmt::Display for IncapacitatedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dead => f.write_str("dead"),
            Self::Stunned => f.write_str("stunned"),
        }
    }
}

/// Errors from a cast request. A failed request changes no state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CastError {
    /// No ability with this id in the catalog.
    #[error("unknown ability: {0}")]
    UnknownAbility(AbilityId),
    /// Caster does not exist.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),
    /// Caster has no slot holding this ability.
    #[error("ability {0} is not equipped")]
    NotEquipped(AbilityId),
    /// Passive abilities are never cast.
    #[error("ability {0} is passive")]
    PassiveAbility(AbilityId),
    /// Slot is cooling down.
    #[error("on cooldown for {remaining:.2}s")]
    OnCooldown {
        /// Seconds until ready.
        remaining: f32,
    },
    /// Caster lacks mana.
    #[error("insufficient mana: need {required:.1}, have {available:.1}")]
    InsufficientResource {
        /// Mana cost after reductions.
        required: f32,
        /// Caster's current mana.
        available: f32,
    },
    /// Caster is silenced.
    #[error("caster is silenced")]
    Silenced,
    /// Caster is stunned or dead.
    #[error("caster is incapacitated ({0})")]
    Incapacitated(IncapacitatedReason),
    /// Caster is already channeling a cast.
    #[error("caster is already casting")]
    AlreadyCasting,
}

/// Errors from equipping a loadout.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadoutError {
    /// No loadout with this id in the catalog.
    #[error("unknown loadout: {0}")]
    UnknownLoadout(LoadoutId),
    /// Target entity does not exist.
    #[error("unknown entity: {0}")]
    UnknownEntity(EntityId),
    /// Loadout references an ability the catalog lacks.
    #[error("loadout references unknown ability: {0}")]
    UnknownAbility(AbilityId),
    /// An active ability was selected as a passive.
    #[error("ability {0} is not passive")]
    NotPassive(AbilityId),
}

/// Errors from building or loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two effect definitions share an id.
    #[error("duplicate effect id: {0}")]
    DuplicateEffect(EffectId),
    /// Two ability definitions share an id.
    #[error("duplicate ability id: {0}")]
    DuplicateAbility(AbilityId),
    /// Two loadout definitions share an id.
    #[error("duplicate loadout id: {0}")]
    DuplicateLoadout(LoadoutId),
    /// A definition points at an effect that does not exist.
    #[error("{owner} references unknown effect {effect}")]
    DanglingEffect {
        /// Id of the referencing definition.
        owner: String,
        /// Missing effect.
        effect: EffectId,
    },
    /// A definition points at an ability that does not exist.
    #[error("{owner} references unknown ability {ability}")]
    DanglingAbility {
        /// Id of the referencing definition.
        owner: String,
        /// Missing ability.
        ability: AbilityId,
    },
    /// A definition carries a value outside its domain.
    #[error("invalid definition {id}: {reason}")]
    Invalid {
        /// Offending definition.
        id: String,
        /// What is wrong.
        reason: String,
    },
    /// The catalog file was written for an incompatible schema.
    #[error("catalog version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// Version this build reads.
        expected: SchemaVersion,
        /// Version in the file.
        actual: SchemaVersion,
    },
    /// RON parse failure.
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// IO failure while reading a catalog file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub(crate) fn invalid(id: impl ToString, reason: impl Into<String>) -> Self {
        Self::Invalid {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<CatalogError> for OrbError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::VersionMismatch { expected, actual } => {
                Self::VersionMismatch { expected, actual }
            },
            CatalogError::Io(io) => Self::Io(io),
            CatalogError::Parse(parse) => Self::Serialization(parse.to_string()),
            other => Self::Catalog(other.to_string()),
        }
    }
}

/// Internal invariant violation detected while stepping an entity.
///
/// Indicates a bug. The scheduler logs it, halts the entity for the frame
/// and reports it in the frame report.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum FaultError {
    /// An instance carries a stack count outside `1..=max_stacks`.
    #[error("invalid stack state on {entity}: {effect} has {stacks} stacks (cap {cap})")]
    InvalidStackState {
        /// Owning entity.
        entity: EntityId,
        /// Offending effect.
        effect: EffectId,
        /// Observed stack count.
        stacks: u32,
        /// Definition's cap.
        cap: u32,
    },
    /// An instance references an effect missing from the catalog.
    #[error("instance of unknown effect {effect} on {entity}")]
    MissingDefinition {
        /// Owning entity.
        entity: EntityId,
        /// Missing effect.
        effect: EffectId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_error_messages() {
        let err = CastError::InsufficientResource {
            required: 16.0,
            available: 4.5,
        };
        assert_eq!(err.to_string(), "insufficient mana: need 16.0, have 4.5");
        assert_eq!(
            CastError::Incapacitated(IncapacitatedReason::Stunned).to_string(),
            "caster is incapacitated (stunned)"
        );
    }

    #[test]
    fn test_catalog_error_into_orb_error() {
        let err = CatalogError::VersionMismatch {
            expected: SchemaVersion::CATALOG,
            actual: SchemaVersion::new(2, 0, 0),
        };
        assert!(matches!(
            OrbError::from(err),
            OrbError::VersionMismatch { .. }
        ));

        let err = CatalogError::DuplicateEffect(EffectId::new("slow"));
        assert!(matches!(OrbError::from(err), OrbError::Catalog(_)));
    }
}
