//! Ability Cast Resolver.
//!
//! Each equipped ability lives in a slot that moves through
//! `Ready → Casting → Cooldown → Ready`. A cast request is validated against
//! the caster's current state before anything is committed, so a rejected
//! request leaves mana, cooldowns and slots untouched.
//!
//! Target selection belongs to the world (spatial queries, teams); the
//! engine asks a [`TargetResolver`] for the final target list and applies
//! the ability to it.

use orb_common::{AbilityId, EffectId, EntityId};
use serde::{Deserialize, Serialize};

use crate::catalog::{AbilityDefinition, Scaling, ScalingSource, TargetType};
use crate::damage::DamageOutcome;
use crate::effects::AppliedOutcome;
use crate::error::{CastError, IncapacitatedReason};
use crate::stats::{EffectiveStats, Stat};

// ============================================================================
// Slots
// ============================================================================

/// Where a slot is in its cast cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SlotState {
    /// Can be cast.
    Ready,
    /// Channeling.
    Casting {
        /// Seconds until completion.
        remaining: f32,
        /// Target chosen at cast start.
        target: TargetHint,
        /// Mana already paid.
        mana_spent: f32,
    },
    /// Cooling down.
    Cooldown {
        /// Seconds until ready.
        remaining: f32,
    },
}

/// An equipped ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilitySlot {
    ability: AbilityId,
    state: SlotState,
}

impl AbilitySlot {
    /// A ready slot.
    #[must_use]
    pub fn new(ability: AbilityId) -> Self {
        Self {
            ability,
            state: SlotState::Ready,
        }
    }

    /// Slotted ability.
    #[must_use]
    pub fn ability(&self) -> &AbilityId {
        &self.ability
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &SlotState {
        &self.state
    }

    /// Check if ready to cast.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, SlotState::Ready)
    }

    /// Check if channeling.
    #[must_use]
    pub fn is_casting(&self) -> bool {
        matches!(self.state, SlotState::Casting { .. })
    }

    /// Seconds of cooldown left, zero when not cooling down.
    #[must_use]
    pub fn cooldown_remaining(&self) -> f32 {
        match self.state {
            SlotState::Cooldown { remaining } => remaining,
            _ => 0.0,
        }
    }

    fn start_cooldown(&mut self, cooldown: f32) {
        self.state = if cooldown > 0.0 {
            SlotState::Cooldown {
                remaining: cooldown,
            }
        } else {
            SlotState::Ready
        };
    }

    /// Return to ready without cooldown. Mana is not refunded.
    pub(crate) fn cancel(&mut self) {
        self.state = SlotState::Ready;
    }
}

/// Cooldown after cdr: `cooldown × (1 - cdr)`.
#[must_use]
pub fn scaled_cooldown(ability: &AbilityDefinition, stats: &EffectiveStats) -> f32 {
    (ability.cooldown * (1.0 - stats.cdr())).max(0.0)
}

/// Channel time after cast speed.
#[must_use]
pub fn scaled_cast_time(ability: &AbilityDefinition, stats: &EffectiveStats) -> f32 {
    let speed = 1.0 + stats.get(Stat::CastSpeed);
    (ability.cast_time / speed.max(0.1)).max(0.0)
}

/// Mana cost after `manaCostReduction`.
#[must_use]
pub fn scaled_mana_cost(ability: &AbilityDefinition, stats: &EffectiveStats) -> f32 {
    (ability.mana_cost * (1.0 - stats.get(Stat::ManaCostReduction))).max(0.0)
}

/// Amount an action produces from the caster's stats.
///
/// Magic power reads attack; the magic damage bonus applies later as an
/// outgoing multiplier. Healing power amplifies attack.
#[must_use]
pub fn scaled_amount(scaling: &Scaling, caster: &EffectiveStats) -> f32 {
    let source = match scaling.source {
        ScalingSource::AttackPower | ScalingSource::MagicPower => caster.attack(),
        ScalingSource::HealingPower => caster.attack() * (1.0 + caster.get(Stat::HealingPower)),
        ScalingSource::Defense => caster.defense(),
    };
    (source * scaling.ratio).max(0.0)
}

// ============================================================================
// Targeting
// ============================================================================

/// Caller's aim, passed to the [`TargetResolver`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum TargetHint {
    /// No explicit aim.
    #[default]
    None,
    /// The caster only.
    SelfOnly,
    /// One entity.
    Entity(EntityId),
    /// A pre-selected group (chain targets, everything in an arc).
    Entities(Vec<EntityId>),
    /// A ground point.
    Point {
        /// World X.
        x: f32,
        /// World Y.
        y: f32,
    },
}

/// What a resolver sees.
#[derive(Debug, Clone, Copy)]
pub struct TargetContext<'a> {
    /// Caster.
    pub caster: EntityId,
    /// Ability being resolved.
    pub ability: &'a AbilityDefinition,
    /// Caller's aim.
    pub hint: &'a TargetHint,
}

/// Turns a cast into a concrete target list.
pub trait TargetResolver {
    /// Entities the ability lands on, in application order.
    fn resolve(&self, ctx: &TargetContext<'_>) -> Vec<EntityId>;
}

/// Resolver that trusts the hint.
///
/// Explicit entities are used as given. Self-area abilities without a hint
/// land on the caster. Ground points need spatial data and resolve to
/// nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintResolver;

impl TargetResolver for HintResolver {
    fn resolve(&self, ctx: &TargetContext<'_>) -> Vec<EntityId> {
        match ctx.hint {
            TargetHint::SelfOnly => vec![ctx.caster],
            TargetHint::Entity(id) => vec![*id],
            TargetHint::Entities(ids) => ids.clone(),
            TargetHint::None if ctx.ability.target_type == TargetType::Area => vec![ctx.caster],
            TargetHint::None | TargetHint::Point { .. } => Vec::new(),
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// What one target received from a completed cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    /// Target.
    pub target: EntityId,
    /// Damage taken, if the ability deals damage.
    pub damage: Option<DamageOutcome>,
    /// Health restored.
    pub healed: f32,
    /// Shield added.
    pub shielded: f32,
    /// Effects removed.
    pub cleansed: Vec<EffectId>,
    /// Effects applied and their stacking results.
    pub applied: Vec<(EffectId, AppliedOutcome)>,
}

impl TargetReport {
    pub(crate) fn new(target: EntityId) -> Self {
        Self {
            target,
            damage: None,
            healed: 0.0,
            shielded: 0.0,
            cleansed: Vec::new(),
            applied: Vec::new(),
        }
    }
}

/// Result of a completed cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CastResolution {
    /// Caster.
    pub caster: EntityId,
    /// Ability.
    pub ability: AbilityId,
    /// Per-target results, in resolver order.
    pub targets: Vec<TargetReport>,
    /// Health the caster regained from lifesteal.
    pub lifesteal: f32,
}

/// Result of an accepted cast request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CastOutcome {
    /// Channeling; resolves during a later `advance`.
    Started {
        /// Ability.
        ability: AbilityId,
        /// Channel time.
        cast_time: f32,
        /// Mana paid.
        mana_spent: f32,
    },
    /// Instant cast, already resolved.
    Completed(CastResolution),
}

// ============================================================================
// State machine
// ============================================================================

/// An accepted request, committed to its slot.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CastCommit {
    pub mana_cost: f32,
    pub cast_time: f32,
}

/// Caster facts needed to validate a request.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CasterView<'a> {
    pub alive: bool,
    pub mana: f32,
    pub stats: &'a EffectiveStats,
}

/// Validate a cast request against the caster's slots.
///
/// Check order: dead, passive, not equipped, stunned, silenced, already
/// casting, cooldown, mana. Returns the slot index to commit.
pub(crate) fn validate(
    ability: &AbilityDefinition,
    slots: &[AbilitySlot],
    caster: CasterView<'_>,
) -> Result<(usize, CastCommit), CastError> {
    if !caster.alive {
        return Err(CastError::Incapacitated(IncapacitatedReason::Dead));
    }
    if ability.is_passive() {
        return Err(CastError::PassiveAbility(ability.id.clone()));
    }
    let index = slots
        .iter()
        .position(|s| s.ability == ability.id)
        .ok_or_else(|| CastError::NotEquipped(ability.id.clone()))?;

    let control = caster.stats.control;
    if control.stunned {
        return Err(CastError::Incapacitated(IncapacitatedReason::Stunned));
    }
    if control.silenced {
        return Err(CastError::Silenced);
    }
    if slots.iter().any(AbilitySlot::is_casting) {
        return Err(CastError::AlreadyCasting);
    }
    if let SlotState::Cooldown { remaining } = slots[index].state {
        return Err(CastError::OnCooldown { remaining });
    }

    let mana_cost = scaled_mana_cost(ability, caster.stats);
    if caster.mana + f32::EPSILON < mana_cost {
        return Err(CastError::InsufficientResource {
            required: mana_cost,
            available: caster.mana,
        });
    }

    Ok((
        index,
        CastCommit {
            mana_cost,
            cast_time: scaled_cast_time(ability, caster.stats),
        },
    ))
}

/// Move a validated slot into `Casting`, or straight into cooldown for an
/// instant cast. Returns true when the cast completed immediately.
pub(crate) fn commit(
    slot: &mut AbilitySlot,
    commit: &CastCommit,
    cooldown: f32,
    target: TargetHint,
) -> bool {
    if commit.cast_time <= 0.0 {
        slot.start_cooldown(cooldown);
        true
    } else {
        slot.state = SlotState::Casting {
            remaining: commit.cast_time,
            target,
            mana_spent: commit.mana_cost,
        };
        false
    }
}

/// What happened to a slot during a frame.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SlotEvent {
    /// Channel finished; the cast must now be resolved.
    Completed {
        ability: AbilityId,
        target: TargetHint,
    },
    /// Channel cancelled.
    Interrupted { ability: AbilityId },
}

/// Advance every slot by `dt`.
///
/// Cooldowns tick in real time here; cdr was already applied when the
/// cooldown started (see [`scaled_cooldown`]). Casting slots are cancelled when the caster cannot cast; completed casts
/// enter a fresh cooldown from `cooldown_of`, which is not decremented this
/// frame.
pub(crate) fn progress_slots<F>(
    slots: &mut [AbilitySlot],
    dt: f32,
    can_cast: bool,
    mut cooldown_of: F,
) -> Vec<SlotEvent>
where
    F: FnMut(&AbilityId) -> f32,
{
    let mut events = Vec::new();
    for slot in slots {
        match &mut slot.state {
            SlotState::Ready => {},
            SlotState::Cooldown { remaining } => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    slot.state = SlotState::Ready;
                }
            },
            SlotState::Casting { .. } if !can_cast => {
                slot.cancel();
                events.push(SlotEvent::Interrupted {
                    ability: slot.ability.clone(),
                });
            },
            SlotState::Casting {
                remaining, target, ..
            } => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    let target = std::mem::take(target);
                    let cooldown = cooldown_of(&slot.ability);
                    slot.start_cooldown(cooldown);
                    events.push(SlotEvent::Completed {
                        ability: slot.ability.clone(),
                        target,
                    });
                }
            },
        }
    }
    events
}

/// Cancel any channeling slot, returning the interrupted ability.
pub(crate) fn cancel_casting(slots: &mut [AbilitySlot]) -> Option<AbilityId> {
    let slot = slots.iter_mut().find(|s| s.is_casting())?;
    slot.cancel();
    Some(slot.ability.clone())
}
