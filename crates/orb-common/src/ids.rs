//! ID types for entities and catalog entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an entity ID from a raw value (for deserialization).
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(0);

    /// Checks if this is a valid (non-null) entity ID.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out entity IDs for one simulation.
///
/// Owned by whoever owns the entity population; there is no process-wide
/// counter.
#[derive(Debug, Clone)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    /// Creates an allocator whose first ID is `#1`.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Returns a fresh ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

impl Default for EntityIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from a string key.
            #[must_use]
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Returns the string key.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self::new(key)
            }
        }
    };
}

catalog_id!(
    /// Key of an effect definition (buff, debuff or DoT), e.g. `"bleed"`.
    EffectId
);

catalog_id!(
    /// Key of an ability definition, e.g. `"arc_bolt"`.
    AbilityId
);

catalog_id!(
    /// Key of a loadout definition, e.g. `"warrior_melee_basic"`.
    LoadoutId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_id_display() {
        let id = EffectId::new("bleed");
        assert_eq!(id.to_string(), "bleed");
        assert_eq!(id, EffectId::from("bleed"));
    }

    #[test]
    fn test_allocator_is_sequential() {
        let mut alloc = EntityIdAllocator::new();
        assert_eq!(alloc.next_id().raw(), 1);
        assert_eq!(alloc.next_id().raw(), 2);
    }
}
