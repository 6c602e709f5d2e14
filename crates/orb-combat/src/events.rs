//! Event bus for observable combat outcomes.
//!
//! The engine publishes; the presentation layer (damage numbers, combat log,
//! UI) drains once per frame. Publishing never blocks: when the bus is full
//! the event is dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender};
use orb_common::{AbilityId, EffectId, EntityId, LoadoutId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::ResourceKind;
use crate::damage::DamageType;
use crate::effects::AppliedOutcome;
use crate::loadout::Rarity;

/// Something that happened inside the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// Entity joined the simulation.
    EntitySpawned {
        /// Entity ID
        entity: EntityId,
    },
    /// Entity left the simulation; all its effects were released.
    EntityRemoved {
        /// Entity ID
        entity: EntityId,
        /// Instances released
        released: usize,
    },
    /// An effect was applied, refreshed or stacked.
    EffectApplied {
        /// Bearer
        entity: EntityId,
        /// Effect
        effect: EffectId,
        /// Stacking result
        outcome: AppliedOutcome,
        /// Applier
        source: Option<EntityId>,
    },
    /// An effect ran out.
    EffectExpired {
        /// Bearer
        entity: EntityId,
        /// Effect
        effect: EffectId,
    },
    /// Effects were removed by a cleanse.
    EffectsCleansed {
        /// Bearer
        entity: EntityId,
        /// Removed effects, in insertion order
        effects: Vec<EffectId>,
    },
    /// A periodic damage tick resolved.
    PeriodicDamage {
        /// Bearer
        entity: EntityId,
        /// Ticking effect
        effect: EffectId,
        /// Shield plus health removed
        amount: f32,
        /// Damage type
        damage_type: DamageType,
    },
    /// A periodic restore tick resolved.
    PeriodicRestore {
        /// Bearer
        entity: EntityId,
        /// Ticking effect
        effect: EffectId,
        /// Resource refilled
        resource: ResourceKind,
        /// Amount actually restored
        amount: f32,
    },
    /// Entity took damage.
    Damaged {
        /// Target
        entity: EntityId,
        /// Attacker
        source: Option<EntityId>,
        /// Damage type
        damage_type: DamageType,
        /// Absorbed by shield
        absorbed: f32,
        /// Health lost
        dealt: f32,
    },
    /// Entity was healed.
    Healed {
        /// Target
        entity: EntityId,
        /// Healer
        source: Option<EntityId>,
        /// Health restored
        amount: f32,
    },
    /// Entity gained shield.
    Shielded {
        /// Target
        entity: EntityId,
        /// Granter
        source: Option<EntityId>,
        /// Shield added after the cap
        amount: f32,
    },
    /// Entity reached zero health.
    Died {
        /// Entity
        entity: EntityId,
        /// Killing blow
        killer: Option<EntityId>,
    },
    /// Entity was brought back.
    Revived {
        /// Entity
        entity: EntityId,
    },
    /// A cast began channeling.
    CastStarted {
        /// Caster
        caster: EntityId,
        /// Ability
        ability: AbilityId,
        /// Channel time
        cast_time: f32,
    },
    /// A cast finished and its effects were resolved.
    CastCompleted {
        /// Caster
        caster: EntityId,
        /// Ability
        ability: AbilityId,
        /// Resolved targets
        targets: Vec<EntityId>,
    },
    /// A channeling cast was cancelled by stun, silence or death.
    CastInterrupted {
        /// Caster
        caster: EntityId,
        /// Ability
        ability: AbilityId,
    },
    /// A loadout was equipped.
    LoadoutEquipped {
        /// Entity
        entity: EntityId,
        /// Loadout
        loadout: LoadoutId,
        /// Rarity used
        rarity: Rarity,
        /// Slot level
        level: u32,
    },
}

impl CombatEvent {
    /// Entity the event concerns.
    #[must_use]
    pub const fn entity(&self) -> EntityId {
        match self {
            Self::EntitySpawned { entity }
            | Self::EntityRemoved { entity, .. }
            | Self::EffectApplied { entity, .. }
            | Self::EffectExpired { entity, .. }
            | Self::EffectsCleansed { entity, .. }
            | Self::PeriodicDamage { entity, .. }
            | Self::PeriodicRestore { entity, .. }
            | Self::Damaged { entity, .. }
            | Self::Healed { entity, .. }
            | Self::Shielded { entity, .. }
            | Self::Died { entity, .. }
            | Self::Revived { entity }
            | Self::LoadoutEquipped { entity, .. } => *entity,
            Self::CastStarted { caster, .. }
            | Self::CastCompleted { caster, .. }
            | Self::CastInterrupted { caster, .. } => *caster,
        }
    }
}

/// Bounded, non-blocking event queue.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events
    sender: Sender<CombatEvent>,
    /// Receiver for collecting events
    receiver: Receiver<CombatEvent>,
    /// Channel capacity
    capacity: usize,
    /// Events lost to a full channel
    dropped: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
            dropped: AtomicU64::new(0),
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: CombatEvent) {
        if self.sender.try_send(event).is_err() {
            let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            // One warning per power of two keeps a flood from flooding the log.
            if dropped.is_power_of_two() {
                warn!("Event bus full ({} slots), {} events dropped", self.capacity, dropped);
            }
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Drains pending events into a handler.
    pub fn dispatch(&self, handler: &dyn EventHandler) -> usize {
        let mut count = 0;
        while let Ok(event) = self.receiver.try_recv() {
            handler.handle(&event);
            count += 1;
        }
        count
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events dropped since creation.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Typed event handler trait.
pub trait EventHandler {
    /// Handles an event.
    fn handle(&self, event: &CombatEvent);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn spawned(raw: u64) -> CombatEvent {
        CombatEvent::EntitySpawned {
            entity: EntityId::from_raw(raw),
        }
    }

    #[test]
    fn test_publish_and_drain() {
        let bus = EventBus::new(8);
        bus.publish(spawned(1));
        bus.publish(spawned(2));
        assert_eq!(bus.pending_count(), 2);
        let events = bus.drain();
        assert_eq!(events, vec![spawned(1), spawned(2)]);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops() {
        let bus = EventBus::new(2);
        for i in 0..5 {
            bus.publish(spawned(i));
        }
        assert_eq!(bus.pending_count(), 2);
        assert_eq!(bus.dropped_count(), 3);
    }

    #[test]
    fn test_dispatch_to_handler() {
        struct Collect(RefCell<Vec<EntityId>>);
        impl EventHandler for Collect {
            fn handle(&self, event: &CombatEvent) {
                self.0.borrow_mut().push(event.entity());
            }
        }

        let bus = EventBus::new(4);
        bus.publish(spawned(3));
        bus.publish(CombatEvent::CastInterrupted {
            caster: EntityId::from_raw(4),
            ability: AbilityId::new("arc_bolt"),
        });
        let handler = Collect(RefCell::new(Vec::new()));
        assert_eq!(bus.dispatch(&handler), 2);
        assert_eq!(
            *handler.0.borrow(),
            vec![EntityId::from_raw(3), EntityId::from_raw(4)]
        );
    }
}
