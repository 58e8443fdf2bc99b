//! Requests (pending claims on capacity) and the grants made against them.
//!
//! # State machine
//!
//! ```text
//! Created ──(partial grant)──▶ PartiallyAllocated ──(…)──▶ Satisfied
//!    └────────────(full grant)────────────────────────────▶ Satisfied
//! ```
//!
//! A request is `Satisfied` exactly when `amount_allocated == amount_needed`.
//! The manager drops it from every waiting list and from its arena at that
//! moment; the final [`Grant`] carries everything a listener needs.

use std::fmt;
use std::sync::Arc;

use des_core::{EntityId, ListenerId, RequestId, ResourceId, ResourceSetId};

use crate::SelectionRule;

/// Lifecycle state of a [`Request`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RequestState {
    Created,
    PartiallyAllocated,
    Satisfied,
}

/// What a request is drawn against.
#[derive(Clone)]
pub enum RequestTarget {
    Resource(ResourceId),
    /// Any member of the set; `rule` overrides the set's own selection rule.
    Set {
        set:  ResourceSetId,
        rule: Option<Arc<dyn SelectionRule>>,
    },
}

impl fmt::Debug for RequestTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestTarget::Resource(r) => write!(f, "Resource({r})"),
            RequestTarget::Set { set, rule } => f
                .debug_struct("Set")
                .field("set", set)
                .field("rule", rule)
                .finish(),
        }
    }
}

/// Everything needed to create a request, minus identity and ordering.
#[derive(Clone, Debug)]
pub struct RequestSpec {
    pub target:       RequestTarget,
    pub amount:       u32,
    pub priority:     i32,
    pub partial_fill: bool,
    pub save_key:     Option<String>,
}

impl RequestSpec {
    /// A full-fill request for `amount` units of `resource` at the default
    /// priority.
    pub fn resource(resource: ResourceId, amount: u32) -> Self {
        Self {
            target:       RequestTarget::Resource(resource),
            amount,
            priority:     crate::DEFAULT_PRIORITY,
            partial_fill: false,
            save_key:     None,
        }
    }

    /// A full-fill request for `amount` units of any member of `set`.
    pub fn set(set: ResourceSetId, amount: u32) -> Self {
        Self {
            target: RequestTarget::Set { set, rule: None },
            ..Self::resource(ResourceId::INVALID, amount)
        }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn partial_fill(mut self, allowed: bool) -> Self {
        self.partial_fill = allowed;
        self
    }

    pub fn save_key(mut self, key: impl Into<String>) -> Self {
        self.save_key = Some(key.into());
        self
    }
}

/// A pending claim for units of one resource (possibly chosen from a set).
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) id:               RequestId,
    pub(crate) entity:           EntityId,
    pub(crate) listener:         Option<ListenerId>,
    pub(crate) target:           RequestTarget,
    pub(crate) amount_needed:    u32,
    pub(crate) amount_allocated: u32,
    pub(crate) priority:         i32,
    pub(crate) sequence:         u64,
    pub(crate) partial_fill:     bool,
    pub(crate) state:            RequestState,
    pub(crate) selected:         Option<ResourceId>,
    pub(crate) save_key:         Option<String>,
    pub(crate) submitted:        bool,
}

impl Request {
    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn listener(&self) -> Option<ListenerId> {
        self.listener
    }

    pub fn target(&self) -> &RequestTarget {
        &self.target
    }

    pub fn amount_needed(&self) -> u32 {
        self.amount_needed
    }

    pub fn amount_allocated(&self) -> u32 {
        self.amount_allocated
    }

    /// Units still outstanding.
    #[inline]
    pub fn remaining(&self) -> u32 {
        self.amount_needed - self.amount_allocated
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Creation order within the owning manager.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn partial_fill(&self) -> bool {
        self.partial_fill
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn is_satisfied(&self) -> bool {
        self.state == RequestState::Satisfied
    }

    /// The resource this request is bound to, once one has been chosen.
    pub fn selected(&self) -> Option<ResourceId> {
        self.selected
    }

    pub fn save_key(&self) -> Option<&str> {
        self.save_key.as_deref()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }
}

/// One grant of units against a request, reported to its listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grant {
    pub request:          RequestId,
    pub entity:           EntityId,
    pub listener:         ListenerId,
    pub resource:         ResourceId,
    /// Units granted by this grant alone.
    pub amount:           u32,
    /// Units granted to the request so far, this grant included.
    pub amount_allocated: u32,
    pub amount_needed:    u32,
    /// `true` for the grant that completed the request.
    pub satisfied:        bool,
}

impl crate::Sequenced for Request {
    fn identity(&self) -> String {
        self.id.to_string()
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }
}
