//! Declarative seize and release requirements.
//!
//! A requirement says *what* an entity needs ("2 units of X-ray at priority
//! 5, partial fill allowed"); a station turns it into a [`Request`] per
//! entity.  Requirements are totally ordered by (priority, creation
//! sequence), lower first; two distinct requirements that tie on both keys
//! indicate corrupted id generation and are reported as an internal error.
//!
//! # Building
//!
//! ```rust
//! use des_core::{IdGenerator, ResourceId, ResourceSetId};
//! use des_resource::{ReleaseRequirement, SeizeRequirement, SetReleasePolicy};
//!
//! let mut ids = IdGenerator::new();
//! let xray = SeizeRequirement::resource(ResourceId(0), 2)
//!     .priority(5)
//!     .partial_fill(true)
//!     .build(&mut ids)
//!     .unwrap();
//! let nurse = SeizeRequirement::set(ResourceSetId(0), 1)
//!     .save_key("triage")
//!     .build(&mut ids)
//!     .unwrap();
//! let back = ReleaseRequirement::set(ResourceSetId(0), 1)
//!     .policy(SetReleasePolicy::SaveKey("triage".into()))
//!     .build(&mut ids)
//!     .unwrap();
//! assert!(xray.sequence() < nurse.sequence());
//! assert_eq!(back.priority(), des_resource::DEFAULT_PRIORITY);
//! ```
//!
//! [`Request`]: crate::Request

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use des_core::{IdGenerator, RequirementId, ResourceId, ResourceSetId};

use crate::request::{RequestSpec, RequestTarget};
use crate::{ResourceError, ResourceResult, SelectionRule};

/// Priority given to requirements and requests that do not set one.
pub const DEFAULT_PRIORITY: i32 = 1;

// ── Ordering ──────────────────────────────────────────────────────────────────

/// Anything ordered by (priority, creation sequence) with a separate identity.
pub trait Sequenced {
    fn identity(&self) -> String;
    fn priority(&self) -> i32;
    fn sequence(&self) -> u64;
}

/// Compare two items by (priority, sequence).
///
/// Equal keys with different identities are a [`ResourceError::OrderingTie`].
pub fn try_compare<T: Sequenced + ?Sized>(a: &T, b: &T) -> ResourceResult<Ordering> {
    let ord = a
        .priority()
        .cmp(&b.priority())
        .then(a.sequence().cmp(&b.sequence()));
    if ord == Ordering::Equal && a.identity() != b.identity() {
        return Err(ResourceError::OrderingTie {
            priority: a.priority(),
            sequence: a.sequence(),
            first:    a.identity(),
            second:   b.identity(),
        });
    }
    Ok(ord)
}

/// Sort requirements into service order, failing on any tie.
pub fn sort_requirements<T: Sequenced>(items: &mut [T]) -> ResourceResult<()> {
    let mut tie: Option<ResourceError> = None;
    items.sort_by(|a, b| match try_compare(a, b) {
        Ok(ord) => ord,
        Err(e) => {
            tie.get_or_insert(e);
            Ordering::Equal
        }
    });
    match tie {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

// ── Targets ───────────────────────────────────────────────────────────────────

/// What a seize requirement draws on.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ResourceTarget {
    Resource(ResourceId),
    Set(ResourceSetId),
}

/// How a set release picks which of the entity's earlier seizes to undo.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum SetReleasePolicy {
    /// The earliest seize on the set still outstanding.
    #[default]
    FirstSeized,
    /// The most recent seize on the set still outstanding.
    LastSeized,
    /// The seize made under this save key.
    SaveKey(String),
}

impl fmt::Display for SetReleasePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetReleasePolicy::FirstSeized => f.write_str("first seized"),
            SetReleasePolicy::LastSeized  => f.write_str("last seized"),
            SetReleasePolicy::SaveKey(k)  => write!(f, "save key {k:?}"),
        }
    }
}

/// What a release requirement gives back.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum ReleaseTarget {
    Resource(ResourceId),
    Set {
        set:    ResourceSetId,
        policy: SetReleasePolicy,
    },
}

/// How many units a release gives back.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ReleaseAmount {
    Units(u32),
    /// Everything the entity holds on the target.
    All,
}

// ── SeizeRequirement ──────────────────────────────────────────────────────────

/// "Need `amount` units of `target` at `priority`."
#[derive(Clone)]
pub struct SeizeRequirement {
    id:           RequirementId,
    sequence:     u64,
    target:       ResourceTarget,
    amount:       u32,
    priority:     i32,
    partial_fill: bool,
    rule:         Option<Arc<dyn SelectionRule>>,
    save_key:     Option<String>,
}

impl SeizeRequirement {
    /// Start a requirement on a single resource.
    pub fn resource(resource: ResourceId, amount: u32) -> SeizeRequirementBuilder {
        SeizeRequirementBuilder::new(ResourceTarget::Resource(resource), amount)
    }

    /// Start a requirement on any member of a set.
    pub fn set(set: ResourceSetId, amount: u32) -> SeizeRequirementBuilder {
        SeizeRequirementBuilder::new(ResourceTarget::Set(set), amount)
    }

    pub fn id(&self) -> RequirementId {
        self.id
    }

    pub fn target(&self) -> ResourceTarget {
        self.target
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn partial_fill(&self) -> bool {
        self.partial_fill
    }

    pub fn rule(&self) -> Option<&Arc<dyn SelectionRule>> {
        self.rule.as_ref()
    }

    pub fn save_key(&self) -> Option<&str> {
        self.save_key.as_deref()
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The request this requirement manufactures for one entity.
    pub fn to_spec(&self) -> RequestSpec {
        let target = match self.target {
            ResourceTarget::Resource(r) => RequestTarget::Resource(r),
            ResourceTarget::Set(set) => RequestTarget::Set { set, rule: self.rule.clone() },
        };
        RequestSpec {
            target,
            amount:       self.amount,
            priority:     self.priority,
            partial_fill: self.partial_fill,
            save_key:     self.save_key.clone(),
        }
    }
}

impl Sequenced for SeizeRequirement {
    fn identity(&self) -> String {
        format!("seize {}", self.id)
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Debug for SeizeRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeizeRequirement")
            .field("id", &self.id)
            .field("sequence", &self.sequence)
            .field("target", &self.target)
            .field("amount", &self.amount)
            .field("priority", &self.priority)
            .field("partial_fill", &self.partial_fill)
            .field("rule", &self.rule)
            .field("save_key", &self.save_key)
            .finish()
    }
}

/// Fluent builder for [`SeizeRequirement`].
pub struct SeizeRequirementBuilder {
    target:       ResourceTarget,
    amount:       u32,
    priority:     i32,
    partial_fill: bool,
    rule:         Option<Arc<dyn SelectionRule>>,
    save_key:     Option<String>,
}

impl SeizeRequirementBuilder {
    fn new(target: ResourceTarget, amount: u32) -> Self {
        Self {
            target,
            amount,
            priority: DEFAULT_PRIORITY,
            partial_fill: false,
            rule: None,
            save_key: None,
        }
    }

    /// Lower values are served first.
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn partial_fill(mut self, allowed: bool) -> Self {
        self.partial_fill = allowed;
        self
    }

    /// Override the set's selection rule for this requirement.
    pub fn rule(mut self, rule: Arc<dyn SelectionRule>) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn save_key(mut self, key: impl Into<String>) -> Self {
        self.save_key = Some(key.into());
        self
    }

    /// Validate and stamp identity and creation order from `ids`.
    pub fn build(self, ids: &mut IdGenerator) -> ResourceResult<SeizeRequirement> {
        if self.amount == 0 {
            return Err(ResourceError::NonPositiveAmount { what: "seize amount" });
        }
        if self.rule.is_some() && matches!(self.target, ResourceTarget::Resource(_)) {
            return Err(ResourceError::RuleOnResource);
        }
        Ok(SeizeRequirement {
            id:           ids.next_requirement(),
            sequence:     ids.next_sequence(),
            target:       self.target,
            amount:       self.amount,
            priority:     self.priority,
            partial_fill: self.partial_fill,
            rule:         self.rule,
            save_key:     self.save_key,
        })
    }
}

// ── ReleaseRequirement ────────────────────────────────────────────────────────

/// "Give back `amount` of `target`."
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseRequirement {
    id:       RequirementId,
    sequence: u64,
    target:   ReleaseTarget,
    amount:   ReleaseAmount,
    priority: i32,
}

impl ReleaseRequirement {
    pub fn resource(resource: ResourceId, amount: u32) -> ReleaseRequirementBuilder {
        ReleaseRequirementBuilder::new(
            ReleaseTarget::Resource(resource),
            ReleaseAmount::Units(amount),
        )
    }

    /// Release from a set; the member is chosen by the builder's policy
    /// (first seized unless told otherwise).
    pub fn set(set: ResourceSetId, amount: u32) -> ReleaseRequirementBuilder {
        ReleaseRequirementBuilder::new(
            ReleaseTarget::Set { set, policy: SetReleasePolicy::default() },
            ReleaseAmount::Units(amount),
        )
    }

    /// Release everything the entity holds on `target`.
    pub fn all(target: ResourceTarget) -> ReleaseRequirementBuilder {
        let target = match target {
            ResourceTarget::Resource(r) => ReleaseTarget::Resource(r),
            ResourceTarget::Set(set) => {
                ReleaseTarget::Set { set, policy: SetReleasePolicy::default() }
            }
        };
        ReleaseRequirementBuilder::new(target, ReleaseAmount::All)
    }

    pub fn id(&self) -> RequirementId {
        self.id
    }

    pub fn target(&self) -> &ReleaseTarget {
        &self.target
    }

    pub fn amount(&self) -> ReleaseAmount {
        self.amount
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Sequenced for ReleaseRequirement {
    fn identity(&self) -> String {
        format!("release {}", self.id)
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }
}

/// Fluent builder for [`ReleaseRequirement`].
pub struct ReleaseRequirementBuilder {
    target:   ReleaseTarget,
    amount:   ReleaseAmount,
    priority: i32,
}

impl ReleaseRequirementBuilder {
    fn new(target: ReleaseTarget, amount: ReleaseAmount) -> Self {
        Self { target, amount, priority: DEFAULT_PRIORITY }
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Member-choice policy; ignored for single-resource targets.
    pub fn policy(mut self, policy: SetReleasePolicy) -> Self {
        if let ReleaseTarget::Set { policy: p, .. } = &mut self.target {
            *p = policy;
        }
        self
    }

    /// Shorthand for `policy(SetReleasePolicy::SaveKey(key))`.
    pub fn save_key(self, key: impl Into<String>) -> Self {
        self.policy(SetReleasePolicy::SaveKey(key.into()))
    }

    pub fn build(self, ids: &mut IdGenerator) -> ResourceResult<ReleaseRequirement> {
        if self.amount == ReleaseAmount::Units(0) {
            return Err(ResourceError::NonPositiveAmount { what: "release amount" });
        }
        Ok(ReleaseRequirement {
            id:       ids.next_requirement(),
            sequence: ids.next_sequence(),
            target:   self.target,
            amount:   self.amount,
            priority: self.priority,
        })
    }
}
