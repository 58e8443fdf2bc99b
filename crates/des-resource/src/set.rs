//! A named group of resources sharing one selection rule.

use std::sync::Arc;

use des_core::{RequestId, ResourceId, ResourceSetId};

use crate::SelectionRule;

/// A group of resources plus the rule that picks which member serves.
///
/// `order` lists the members from released-longest-ago to
/// released-most-recently; it starts as the declaration order.  The waiting
/// list holds set requests for which no member could be selected yet.
#[derive(Clone, Debug)]
pub struct ResourceSet {
    pub(crate) id:      ResourceSetId,
    pub(crate) name:    String,
    pub(crate) members: Vec<ResourceId>,
    pub(crate) order:   Vec<ResourceId>,
    pub(crate) rule:    Arc<dyn SelectionRule>,
    pub(crate) waiting: Vec<RequestId>,
}

impl ResourceSet {
    pub(crate) fn new(
        id:      ResourceSetId,
        name:    String,
        members: Vec<ResourceId>,
        rule:    Arc<dyn SelectionRule>,
    ) -> Self {
        Self {
            id,
            name,
            order: members.clone(),
            members,
            rule,
            waiting: Vec::new(),
        }
    }

    pub fn id(&self) -> ResourceSetId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[ResourceId] {
        &self.members
    }

    /// Members in release order, the order candidates are offered to rules.
    pub fn release_order(&self) -> &[ResourceId] {
        &self.order
    }

    pub fn contains(&self, resource: ResourceId) -> bool {
        self.members.contains(&resource)
    }

    pub fn rule(&self) -> &Arc<dyn SelectionRule> {
        &self.rule
    }

    /// Set requests still waiting for a member, head first.
    pub fn waiting(&self) -> &[RequestId] {
        &self.waiting
    }

    /// Move `resource` to the most-recently-released end.
    pub(crate) fn mark_released(&mut self, resource: ResourceId) {
        if let Some(pos) = self.order.iter().position(|&r| r == resource) {
            let r = self.order.remove(pos);
            self.order.push(r);
        }
    }
}
