//! `ResourceManager`: the arena that owns resources, sets, requests and the
//! allocation ledger, and implements seize/release.
//!
//! # Service discipline
//!
//! * A newly submitted request is served immediately if its resource has
//!   enough available units (or any units, with partial fill); whatever is
//!   left over joins the waiting list in (priority, sequence) order.
//! * Freed units are offered to the waiting list strictly head-first.  The
//!   scan stops at the first request that cannot be served; a later, smaller
//!   request is never served ahead of a blocked head.
//! * After a member resource has rescanned its own list, every set it belongs
//!   to retries selection for its waiting set requests, again head-first.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use des_core::{AllocationId, EntityId, ListenerId, RequestId, ResourceId, ResourceSetId};

use crate::request::{RequestSpec, RequestTarget};
use crate::{
    Allocation, CyclicRule, Grant, ReleaseAmount, ReleaseRequirement, ReleaseTarget, Request,
    RequestState, Resource, ResourceError, ResourceResult, ResourceSet, ResourceSpec,
    SeizeRequirement, SelectionRule, SetReleasePolicy, SetSeizeRecord, try_compare,
};

/// Owner of every resource-side object in one model.
#[derive(Default)]
pub struct ResourceManager {
    resources:       Vec<Resource>,
    sets:            Vec<ResourceSet>,
    names:           FxHashSet<String>,
    requests:        FxHashMap<RequestId, Request>,
    allocations:     FxHashMap<AllocationId, Allocation>,
    by_holder:       FxHashMap<(EntityId, ResourceId), AllocationId>,
    set_records:     Vec<SetSeizeRecord>,
    next_request:    u64,
    next_allocation: u64,
    next_sequence:   u64,
}

impl ResourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Register a resource with `capacity` units (at least one).
    pub fn add_resource(&mut self, name: impl Into<String>, capacity: u32) -> ResourceResult<ResourceId> {
        let name = name.into();
        if capacity == 0 {
            return Err(ResourceError::NonPositiveAmount { what: "resource capacity" });
        }
        self.claim_name(&name)?;
        let id = ResourceId(self.resources.len() as u32);
        debug!(%id, %name, capacity, "resource added");
        self.resources.push(Resource::new(id, name, capacity));
        Ok(id)
    }

    /// Register every spec in order, returning the new ids.
    pub fn add_resources(&mut self, specs: &[ResourceSpec]) -> ResourceResult<Vec<ResourceId>> {
        specs
            .iter()
            .map(|s| self.add_resource(s.name.clone(), s.capacity))
            .collect()
    }

    /// Register a set using the default [`CyclicRule`].
    pub fn add_resource_set(
        &mut self,
        name:    impl Into<String>,
        members: &[ResourceId],
    ) -> ResourceResult<ResourceSetId> {
        self.add_resource_set_with_rule(name, members, Arc::new(CyclicRule))
    }

    /// Register a set with an explicit selection rule.  Duplicate members are
    /// collapsed; declaration order is kept.
    pub fn add_resource_set_with_rule(
        &mut self,
        name:    impl Into<String>,
        members: &[ResourceId],
        rule:    Arc<dyn SelectionRule>,
    ) -> ResourceResult<ResourceSetId> {
        let name = name.into();
        if members.is_empty() {
            return Err(ResourceError::EmptySet(name));
        }
        let mut unique: Vec<ResourceId> = Vec::with_capacity(members.len());
        for &m in members {
            self.resource(m)?;
            if !unique.contains(&m) {
                unique.push(m);
            }
        }
        self.claim_name(&name)?;
        let id = ResourceSetId(self.sets.len() as u32);
        for &m in &unique {
            self.resources[m.index()].sets.push(id);
        }
        debug!(%id, %name, members = unique.len(), ?rule, "resource set added");
        self.sets.push(ResourceSet::new(id, name, unique, rule));
        Ok(id)
    }

    fn claim_name(&mut self, name: &str) -> ResourceResult<()> {
        if !self.names.insert(name.to_owned()) {
            return Err(ResourceError::DuplicateName(name.to_owned()));
        }
        Ok(())
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    pub fn resource(&self, id: ResourceId) -> ResourceResult<&Resource> {
        self.resources.get(id.index()).ok_or(ResourceError::UnknownResource(id))
    }

    pub fn resource_set(&self, id: ResourceSetId) -> ResourceResult<&ResourceSet> {
        self.sets.get(id.index()).ok_or(ResourceError::UnknownSet(id))
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.resources.iter().find(|r| r.name == name).map(|r| r.id)
    }

    pub fn resource_set_id(&self, name: &str) -> Option<ResourceSetId> {
        self.sets.iter().find(|s| s.name == name).map(|s| s.id)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn resource_sets(&self) -> &[ResourceSet] {
        &self.sets
    }

    /// A live (not yet satisfied) request.
    pub fn request(&self, id: RequestId) -> Option<&Request> {
        self.requests.get(&id)
    }

    /// Number of live requests, submitted or not.
    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    pub fn has_available_units(&self, id: ResourceId) -> ResourceResult<bool> {
        Ok(self.resource(id)?.has_available_units())
    }

    pub fn number_available(&self, id: ResourceId) -> ResourceResult<u32> {
        Ok(self.resource(id)?.number_available())
    }

    /// `entity`'s allocation on `resource`, if any.
    pub fn allocation(&self, entity: EntityId, resource: ResourceId) -> Option<&Allocation> {
        self.by_holder
            .get(&(entity, resource))
            .and_then(|id| self.allocations.get(id))
    }

    /// Units of `resource` held by `entity` (zero when none).
    pub fn allocated_to(&self, entity: EntityId, resource: ResourceId) -> u32 {
        self.allocation(entity, resource).map_or(0, |a| a.amount)
    }

    /// Every active allocation held by `entity`, oldest first.
    pub fn allocations_of(&self, entity: EntityId) -> Vec<&Allocation> {
        let mut out: Vec<&Allocation> = self
            .allocations
            .values()
            .filter(|a| a.entity == entity)
            .collect();
        out.sort_by_key(|a| a.id);
        out
    }

    pub fn holds_allocations(&self, entity: EntityId) -> bool {
        self.by_holder.keys().any(|(e, _)| *e == entity)
    }

    /// Outstanding set seizes made by `entity`, in seize order.
    pub fn set_seizes_of(&self, entity: EntityId) -> impl Iterator<Item = &SetSeizeRecord> + '_ {
        self.set_records.iter().filter(move |r| r.entity == entity)
    }

    // ── Requests ──────────────────────────────────────────────────────────

    /// Create an unsubmitted request owned by `entity`.
    pub fn create_request(&mut self, entity: EntityId, spec: RequestSpec) -> ResourceResult<RequestId> {
        if spec.amount == 0 {
            return Err(ResourceError::NonPositiveAmount { what: "request amount" });
        }
        match &spec.target {
            RequestTarget::Resource(r) => {
                self.resource(*r)?;
            }
            RequestTarget::Set { set, .. } => {
                self.resource_set(*set)?;
            }
        }
        let id = RequestId(self.next_request);
        self.next_request += 1;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.requests.insert(id, Request {
            id,
            entity,
            listener: None,
            target: spec.target,
            amount_needed: spec.amount,
            amount_allocated: 0,
            priority: spec.priority,
            sequence,
            partial_fill: spec.partial_fill,
            state: RequestState::Created,
            selected: None,
            save_key: spec.save_key,
            submitted: false,
        });
        Ok(id)
    }

    /// Name the listener that will receive this request's grants.
    pub fn attach_listener(&mut self, request: RequestId, listener: ListenerId) -> ResourceResult<()> {
        let req = self
            .requests
            .get_mut(&request)
            .ok_or(ResourceError::UnknownRequest(request))?;
        req.listener = Some(listener);
        Ok(())
    }

    /// Manufacture a listener-bound request from a requirement.
    pub fn request_from(
        &mut self,
        requirement: &SeizeRequirement,
        entity:      EntityId,
        listener:    ListenerId,
    ) -> ResourceResult<RequestId> {
        let id = self.create_request(entity, requirement.to_spec())?;
        self.attach_listener(id, listener)?;
        Ok(id)
    }

    // ── Seize ─────────────────────────────────────────────────────────────

    /// Submit a request.
    ///
    /// Grants whatever can be granted now and queues the remainder.  The
    /// returned grants must be delivered to the request's listener by the
    /// caller, in order.
    pub fn seize(&mut self, id: RequestId) -> ResourceResult<Vec<Grant>> {
        let req = self.requests.get_mut(&id).ok_or(ResourceError::UnknownRequest(id))?;
        if !req.entity.is_valid() {
            return Err(ResourceError::NoEntity(id));
        }
        if req.listener.is_none() {
            return Err(ResourceError::MissingListener(id));
        }
        if req.submitted || req.selected.is_some() {
            return Err(ResourceError::AlreadySubmitted(id));
        }
        req.submitted = true;
        let target = req.target.clone();
        let (remaining, partial) = (req.remaining(), req.partial_fill);

        let mut grants = Vec::new();
        match target {
            RequestTarget::Resource(r) => {
                self.bind(id, r)?;
                self.serve_or_wait(id, r, &mut grants)?;
            }
            RequestTarget::Set { set, rule } => {
                match self.select_member(set, rule.as_ref(), remaining, partial)? {
                    Some(r) => {
                        self.bind(id, r)?;
                        self.serve_or_wait(id, r, &mut grants)?;
                    }
                    None => {
                        insert_ordered(&mut self.sets[set.index()].waiting, id, &self.requests)?;
                        debug!(%id, %set, "no member selectable, request waits on set");
                    }
                }
            }
        }
        Ok(grants)
    }

    /// Grant `amount` units of `resource` to `entity` directly, without a
    /// request.  Fails if the units are not available right now.
    pub fn allocate(
        &mut self,
        entity:   EntityId,
        resource: ResourceId,
        amount:   u32,
    ) -> ResourceResult<AllocationId> {
        if amount == 0 {
            return Err(ResourceError::NonPositiveAmount { what: "allocation amount" });
        }
        let available = self.resource(resource)?.number_available();
        if amount > available {
            return Err(ResourceError::InsufficientUnits { resource, requested: amount, available });
        }
        self.resources[resource.index()].take(amount);
        Ok(self.ledger_add(entity, resource, amount))
    }

    // ── Release ───────────────────────────────────────────────────────────

    /// Return `amount` units of `resource` held by `entity`, then offer the
    /// freed units to waiting requests.  Returns the grants that resulted.
    pub fn release(
        &mut self,
        entity:   EntityId,
        resource: ResourceId,
        amount:   u32,
    ) -> ResourceResult<Vec<Grant>> {
        if amount == 0 {
            return Err(ResourceError::NonPositiveAmount { what: "release amount" });
        }
        self.resource(resource)?;
        let alloc_id = *self
            .by_holder
            .get(&(entity, resource))
            .ok_or(ResourceError::NoAllocation { entity, resource })?;
        let alloc = self
            .allocations
            .get_mut(&alloc_id)
            .ok_or_else(|| ResourceError::Inconsistent(format!("{alloc_id} indexed but missing")))?;
        if amount > alloc.amount {
            return Err(ResourceError::OverRelease {
                entity,
                resource,
                requested: amount,
                held: alloc.amount,
            });
        }
        alloc.amount -= amount;
        let still_held = alloc.amount;
        if still_held == 0 {
            self.allocations.remove(&alloc_id);
            self.by_holder.remove(&(entity, resource));
        }
        self.resources[resource.index()].give_back(amount);
        self.trim_set_records(entity, resource, still_held);
        debug!(%entity, %resource, amount, still_held, "units released");

        let sets = self.resources[resource.index()].sets.clone();
        for s in &sets {
            self.sets[s.index()].mark_released(resource);
        }

        let mut grants = Vec::new();
        self.offer_freed_units(resource, &mut grants)?;
        Ok(grants)
    }

    /// Release everything `entity` holds on `resource`.
    pub fn release_all(&mut self, entity: EntityId, resource: ResourceId) -> ResourceResult<Vec<Grant>> {
        let held = self.allocated_to(entity, resource);
        if held == 0 {
            return Err(ResourceError::NoAllocation { entity, resource });
        }
        self.release(entity, resource, held)
    }

    /// Release from the member of `set` chosen by `policy` among `entity`'s
    /// outstanding seizes on that set.
    pub fn release_from_set(
        &mut self,
        entity: EntityId,
        set:    ResourceSetId,
        amount: ReleaseAmount,
        policy: &SetReleasePolicy,
    ) -> ResourceResult<Vec<Grant>> {
        self.resource_set(set)?;
        let mut matching = self
            .set_records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.entity == entity && r.set == set);
        let picked = match policy {
            SetReleasePolicy::FirstSeized => matching.min_by_key(|(_, r)| r.sequence),
            SetReleasePolicy::LastSeized  => matching.max_by_key(|(_, r)| r.sequence),
            SetReleasePolicy::SaveKey(k)  => matching.find(|(_, r)| r.save_key.as_deref() == Some(k.as_str())),
        };
        let Some((idx, record)) = picked else {
            return Err(ResourceError::NoSeizeRecord { entity, set, policy: policy.to_string() });
        };
        let resource = record.resource;
        let units = match amount {
            ReleaseAmount::Units(0) => {
                return Err(ResourceError::NonPositiveAmount { what: "release amount" });
            }
            ReleaseAmount::Units(n) => n,
            ReleaseAmount::All => record.remaining,
        };
        if units > record.remaining {
            return Err(ResourceError::OverRelease {
                entity,
                resource,
                requested: units,
                held: record.remaining,
            });
        }

        // Settle the chosen record first so trimming inside release() leaves
        // the other seizes on this member alone.
        self.set_records[idx].remaining -= units;
        if self.set_records[idx].remaining == 0 {
            self.set_records.remove(idx);
        }
        self.release(entity, resource, units)
    }

    /// Apply one release requirement for `entity`.
    pub fn apply_release(
        &mut self,
        entity:      EntityId,
        requirement: &ReleaseRequirement,
    ) -> ResourceResult<Vec<Grant>> {
        match (requirement.target(), requirement.amount()) {
            (ReleaseTarget::Resource(r), ReleaseAmount::Units(n)) => self.release(entity, *r, n),
            (ReleaseTarget::Resource(r), ReleaseAmount::All) => self.release_all(entity, *r),
            (ReleaseTarget::Set { set, policy }, amount) => {
                self.release_from_set(entity, *set, amount, policy)
            }
        }
    }

    // ── Supply ────────────────────────────────────────────────────────────

    /// Change the capacity of `resource`.  Raising it offers the new units to
    /// waiting requests; lowering it below the allocated amount is an error.
    pub fn set_capacity(&mut self, resource: ResourceId, capacity: u32) -> ResourceResult<Vec<Grant>> {
        let res = self.resource(resource)?;
        if capacity < res.allocated {
            return Err(ResourceError::CapacityBelowAllocated {
                resource,
                capacity,
                allocated: res.allocated,
            });
        }
        let old = res.capacity;
        self.resources[resource.index()].capacity = capacity;
        debug!(%resource, old, capacity, "capacity changed");
        let mut grants = Vec::new();
        if capacity > old {
            self.offer_freed_units(resource, &mut grants)?;
        }
        Ok(grants)
    }

    // ── Invariants ────────────────────────────────────────────────────────

    /// Verify capacity conservation and waiting-list bookkeeping.
    pub fn check_invariants(&self) -> ResourceResult<()> {
        let mut held: FxHashMap<ResourceId, u32> = FxHashMap::default();
        for (&(entity, resource), id) in &self.by_holder {
            let a = self
                .allocations
                .get(id)
                .ok_or_else(|| ResourceError::Inconsistent(format!("{id} indexed but missing")))?;
            if a.entity != entity || a.resource != resource || a.amount == 0 {
                return Err(ResourceError::Inconsistent(format!("{id} is stale: {a:?}")));
            }
            *held.entry(resource).or_default() += a.amount;
        }
        if self.allocations.len() != self.by_holder.len() {
            return Err(ResourceError::Inconsistent("allocation index out of sync".into()));
        }
        for r in &self.resources {
            let sum = held.get(&r.id).copied().unwrap_or(0);
            if r.allocated > r.capacity || sum != r.allocated {
                return Err(ResourceError::Inconsistent(format!(
                    "{}: capacity {} allocated {} ledger {}",
                    r.id, r.capacity, r.allocated, sum
                )));
            }
            for w in &r.waiting {
                let ok = self
                    .requests
                    .get(w)
                    .is_some_and(|q| q.submitted && q.selected == Some(r.id) && !q.is_satisfied());
                if !ok {
                    return Err(ResourceError::Inconsistent(format!("{w} stale in {} waiting list", r.id)));
                }
            }
        }
        for s in &self.sets {
            for w in &s.waiting {
                let ok = self.requests.get(w).is_some_and(|q| q.submitted && q.selected.is_none());
                if !ok {
                    return Err(ResourceError::Inconsistent(format!("{w} stale in {} waiting list", s.id)));
                }
            }
        }
        for rec in &self.set_records {
            if rec.remaining == 0 || rec.remaining > self.allocated_to(rec.entity, rec.resource) {
                return Err(ResourceError::Inconsistent(format!("set record out of sync: {rec:?}")));
            }
        }
        Ok(())
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn bind(&mut self, id: RequestId, resource: ResourceId) -> ResourceResult<()> {
        let req = self.requests.get_mut(&id).ok_or(ResourceError::UnknownRequest(id))?;
        req.selected = Some(resource);
        Ok(())
    }

    /// Serve as much of `id` as `resource` allows right now; queue the rest.
    fn serve_or_wait(&mut self, id: RequestId, resource: ResourceId, grants: &mut Vec<Grant>) -> ResourceResult<()> {
        let req = self.requests.get(&id).ok_or(ResourceError::UnknownRequest(id))?;
        let (remaining, partial) = (req.remaining(), req.partial_fill);
        let available = self.resources[resource.index()].number_available();

        if available >= remaining {
            self.grant(id, resource, remaining, grants)?;
            return Ok(());
        }
        if partial && available > 0 {
            self.grant(id, resource, available, grants)?;
        }
        insert_ordered(&mut self.resources[resource.index()].waiting, id, &self.requests)?;
        debug!(%id, %resource, "request waits on resource");
        Ok(())
    }

    /// Offer the free units of `resource` to its own waiting list and to the
    /// waiting lists of every set containing it, interleaved in (priority,
    /// sequence) order.  The scan stops at the first head that cannot be
    /// served in full.
    fn offer_freed_units(&mut self, resource: ResourceId, grants: &mut Vec<Grant>) -> ResourceResult<()> {
        let sets = self.resources[resource.index()].sets.clone();
        loop {
            let mut best: Option<(RequestId, Option<ResourceSetId>)> = None;
            let res = &self.resources[resource.index()];
            if res.number_available() > 0 {
                best = res.waiting.first().map(|&head| (head, None));
            }
            for &s in &sets {
                let Some(&head) = self.sets[s.index()].waiting.first() else { continue };
                let wins = match best {
                    None => true,
                    Some((current, _)) => {
                        let a = self.requests.get(&head).ok_or(ResourceError::UnknownRequest(head))?;
                        let b = self.requests.get(&current).ok_or(ResourceError::UnknownRequest(current))?;
                        try_compare(a, b)? == std::cmp::Ordering::Less
                    }
                };
                if wins {
                    best = Some((head, Some(s)));
                }
            }
            let served = match best {
                None => false,
                Some((head, None)) => self.serve_resource_head(resource, head, grants)?,
                Some((head, Some(set))) => self.serve_set_head(set, head, grants)?,
            };
            if !served {
                return Ok(());
            }
        }
    }

    /// Serve the head of `resource`'s waiting list.  Returns `false` when it
    /// cannot be satisfied from the units now free.
    fn serve_resource_head(
        &mut self,
        resource: ResourceId,
        head:     RequestId,
        grants:   &mut Vec<Grant>,
    ) -> ResourceResult<bool> {
        let available = self.resources[resource.index()].number_available();
        let req = self.requests.get(&head).ok_or(ResourceError::UnknownRequest(head))?;
        let (remaining, partial) = (req.remaining(), req.partial_fill);

        if available >= remaining {
            self.resources[resource.index()].waiting.remove(0);
            self.grant(head, resource, remaining, grants)?;
            return Ok(true);
        }
        if partial && available > 0 {
            self.grant(head, resource, available, grants)?;
        }
        Ok(false)
    }

    /// Bind the head of `set`'s waiting list to a member and serve it.
    /// Returns `false` when no member can take it.
    fn serve_set_head(&mut self, set: ResourceSetId, head: RequestId, grants: &mut Vec<Grant>) -> ResourceResult<bool> {
        let req = self.requests.get(&head).ok_or(ResourceError::UnknownRequest(head))?;
        let (remaining, partial) = (req.remaining(), req.partial_fill);
        let rule = match &req.target {
            RequestTarget::Set { rule, .. } => rule.clone(),
            RequestTarget::Resource(_) => {
                return Err(ResourceError::Inconsistent(format!(
                    "{head} waits on {set} but targets a single resource"
                )));
            }
        };
        let Some(member) = self.select_member(set, rule.as_ref(), remaining, partial)? else {
            return Ok(false);
        };
        self.sets[set.index()].waiting.remove(0);
        self.bind(head, member)?;
        self.serve_or_wait(head, member, grants)?;
        Ok(true)
    }

    /// Ask the (possibly overridden) rule for a member, falling back to any
    /// available member for partial-fill requests.
    fn select_member(
        &self,
        set:      ResourceSetId,
        rule:     Option<&Arc<dyn SelectionRule>>,
        amount:   u32,
        partial:  bool,
    ) -> ResourceResult<Option<ResourceId>> {
        let s = self.resource_set(set)?;
        let rule = rule.unwrap_or(&s.rule);
        let candidates: Vec<&Resource> = s.order.iter().map(|r| &self.resources[r.index()]).collect();
        let pick = rule
            .select_for_amount(&candidates, amount)
            .or_else(|| if partial { rule.select_any(&candidates) } else { None });
        if let Some(r) = pick {
            if !s.contains(r) {
                return Err(ResourceError::Inconsistent(format!(
                    "selection rule {rule:?} picked {r}, not a member of {set}"
                )));
            }
        }
        Ok(pick)
    }

    /// Commit `amount` units of `resource` to request `id` and record the grant.
    fn grant(&mut self, id: RequestId, resource: ResourceId, amount: u32, grants: &mut Vec<Grant>) -> ResourceResult<()> {
        let req = self.requests.get_mut(&id).ok_or(ResourceError::UnknownRequest(id))?;
        let listener = req.listener.ok_or(ResourceError::MissingListener(id))?;
        req.amount_allocated += amount;
        let satisfied = req.amount_allocated == req.amount_needed;
        req.state = if satisfied { RequestState::Satisfied } else { RequestState::PartiallyAllocated };
        let entity = req.entity;
        let (allocated, needed, sequence) = (req.amount_allocated, req.amount_needed, req.sequence);
        let set = match &req.target {
            RequestTarget::Set { set, .. } => Some(*set),
            RequestTarget::Resource(_) => None,
        };
        let save_key = req.save_key.clone();

        self.resources[resource.index()].take(amount);
        self.ledger_add(entity, resource, amount);

        if let Some(set) = set {
            match self.set_records.iter_mut().find(|r| r.request == id) {
                Some(rec) => rec.remaining += amount,
                None => self.set_records.push(SetSeizeRecord {
                    entity,
                    set,
                    resource,
                    request: id,
                    remaining: amount,
                    save_key,
                    sequence,
                }),
            }
        }

        if satisfied {
            self.requests.remove(&id);
        }
        debug!(%id, %entity, %resource, amount, allocated, needed, satisfied, "units granted");
        grants.push(Grant {
            request: id,
            entity,
            listener,
            resource,
            amount,
            amount_allocated: allocated,
            amount_needed: needed,
            satisfied,
        });
        Ok(())
    }

    fn ledger_add(&mut self, entity: EntityId, resource: ResourceId, amount: u32) -> AllocationId {
        if let Some(&id) = self.by_holder.get(&(entity, resource)) {
            if let Some(a) = self.allocations.get_mut(&id) {
                a.amount += amount;
                return id;
            }
        }
        let id = AllocationId(self.next_allocation);
        self.next_allocation += 1;
        self.allocations.insert(id, Allocation { id, entity, resource, amount });
        self.by_holder.insert((entity, resource), id);
        id
    }

    /// Keep outstanding set seizes on (entity, resource) within what is
    /// still held, dropping units from the most recent seizes first.
    fn trim_set_records(&mut self, entity: EntityId, resource: ResourceId, held: u32) {
        let mut total: u32 = self
            .set_records
            .iter()
            .filter(|r| r.entity == entity && r.resource == resource)
            .map(|r| r.remaining)
            .sum();
        if total <= held {
            return;
        }
        let mut idx: Vec<usize> = (0..self.set_records.len())
            .filter(|&i| {
                let r = &self.set_records[i];
                r.entity == entity && r.resource == resource
            })
            .collect();
        idx.sort_by_key(|&i| std::cmp::Reverse(self.set_records[i].sequence));
        for i in idx {
            if total <= held {
                break;
            }
            let cut = (total - held).min(self.set_records[i].remaining);
            self.set_records[i].remaining -= cut;
            total -= cut;
        }
        self.set_records.retain(|r| r.remaining > 0);
    }
}

/// Insert `id` into a waiting list kept in (priority, sequence) order.
fn insert_ordered(
    list:     &mut Vec<RequestId>,
    id:       RequestId,
    requests: &FxHashMap<RequestId, Request>,
) -> ResourceResult<()> {
    let req = requests.get(&id).ok_or(ResourceError::UnknownRequest(id))?;
    let mut pos = list.len();
    for (i, w) in list.iter().enumerate() {
        let other = requests.get(w).ok_or(ResourceError::UnknownRequest(*w))?;
        match try_compare(req, other)? {
            std::cmp::Ordering::Less => {
                pos = i;
                break;
            }
            std::cmp::Ordering::Equal => {
                return Err(ResourceError::Inconsistent(format!("{id} is already waiting")));
            }
            std::cmp::Ordering::Greater => {}
        }
    }
    list.insert(pos, id);
    Ok(())
}
