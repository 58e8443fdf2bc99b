//! Allocation ledger entries.

use des_core::{AllocationId, EntityId, RequestId, ResourceId, ResourceSetId};

/// The committed record that `entity` holds `amount` units of `resource`.
///
/// There is at most one active `Allocation` per (entity, resource) pair;
/// further grants increase its amount.  The manager removes it the moment
/// its amount returns to zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub(crate) id:       AllocationId,
    pub(crate) entity:   EntityId,
    pub(crate) resource: ResourceId,
    pub(crate) amount:   u32,
}

impl Allocation {
    pub fn id(&self) -> AllocationId {
        self.id
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn resource(&self) -> ResourceId {
        self.resource
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }
}

/// Remembers which member of a set served one of an entity's set seizes,
/// so a later release can find it by first/last/save-key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetSeizeRecord {
    pub entity:    EntityId,
    pub set:       ResourceSetId,
    pub resource:  ResourceId,
    pub request:   RequestId,
    /// Units from this seize not yet released.
    pub remaining: u32,
    pub save_key:  Option<String>,
    /// Creation sequence of the originating request.
    pub sequence:  u64,
}
