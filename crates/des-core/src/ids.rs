//! Strongly typed identifier wrappers and the model-owned id generator.
//!
//! Every arena in the toolkit (entities, resources, stations, requests, …)
//! is addressed by one of these ids.  All are `Copy + Ord + Hash`, so they
//! work as map keys and sort without ceremony.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// A flow unit (customer, patient, job) moving through stations.
    pub struct EntityId(u32);
}

typed_id! {
    /// Index of an entity type in the entity store's type registry.
    pub struct EntityTypeId(u16);
}

typed_id! {
    /// Index of a resource in the resource manager.
    pub struct ResourceId(u32);
}

typed_id! {
    /// Index of a resource set in the resource manager.
    pub struct ResourceSetId(u32);
}

typed_id! {
    /// Index of a station (receiver) in the model's station arena.
    pub struct StationId(u32);
}

typed_id! {
    /// Index of a holding queue.
    pub struct QueueId(u32);
}

typed_id! {
    /// A pending claim on resource capacity.  Never reused within a run.
    pub struct RequestId(u64);
}

typed_id! {
    /// A committed grant of units to one entity on one resource.
    pub struct AllocationId(u64);
}

typed_id! {
    /// Identity of a seize or release requirement.
    pub struct RequirementId(u64);
}

typed_id! {
    /// A satisfaction listener registered with the model.
    pub struct ListenerId(u64);
}

typed_id! {
    /// A scheduled callback on the event calendar.
    pub struct EventId(u64);
}

// ── IdGenerator ───────────────────────────────────────────────────────────────

/// Hands out requirement identities and creation sequence numbers.
///
/// One generator is owned by each model (or model builder) and threaded
/// through whatever creates requirements, so two models never share counter
/// state and test runs are isolated from each other.
#[derive(Clone, Debug, Default)]
pub struct IdGenerator {
    next_requirement: u64,
    next_sequence:    u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh requirement identity.
    pub fn next_requirement(&mut self) -> RequirementId {
        let id = RequirementId(self.next_requirement);
        self.next_requirement += 1;
        id
    }

    /// The next creation sequence number.  Strictly increasing.
    pub fn next_sequence(&mut self) -> u64 {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }
}
