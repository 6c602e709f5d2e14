//! # Orb Common
//!
//! Common types shared by the Orb RPG combat core and its harness:
//! - Entity ids and the allocator that hands them out
//! - Catalog identifiers (effects, abilities, loadouts)
//! - Schema versions for catalog files
//! - Top-level error type

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_allocation() {
        let mut alloc = EntityIdAllocator::new();
        let id1 = alloc.next_id();
        let id2 = alloc.next_id();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
        assert!(!EntityId::NULL.is_valid());
    }

    #[test]
    fn test_catalog_version_reads_itself() {
        let current = SchemaVersion::CATALOG;
        assert!(current.can_read(&current));
        assert_eq!(current.to_string().parse(), Ok(current));
    }
}
