//! `EntityStore`: arena of live entities, their types and the queues they
//! wait in.

use rustc_hash::FxHashMap;
use tracing::debug;

use des_core::{EntityId, EntityTypeId, QueueId, SimTime, Tally, ObservationSink};

use crate::{Discipline, Entity, EntityError, EntityResult, EntityType, Queue, QueueEntry};

#[derive(Debug, Default)]
pub struct EntityStore {
    entities:       FxHashMap<EntityId, Entity>,
    types:          Vec<EntityType>,
    queues:         Vec<Queue>,
    next_entity:    u32,
    disposed:       u64,
    time_in_system: Tally,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Types ─────────────────────────────────────────────────────────────

    pub fn add_type(&mut self, name: impl Into<String>) -> EntityResult<EntityTypeId> {
        let name = name.into();
        if self.types.iter().any(|t| t.name == name) {
            return Err(EntityError::DuplicateName(name));
        }
        let id = EntityTypeId(self.types.len() as u16);
        self.types.push(EntityType::new(id, name));
        Ok(id)
    }

    pub fn entity_type(&self, id: EntityTypeId) -> EntityResult<&EntityType> {
        self.types.get(id.index()).ok_or(EntityError::UnknownType(id))
    }

    pub fn entity_type_mut(&mut self, id: EntityTypeId) -> EntityResult<&mut EntityType> {
        self.types.get_mut(id.index()).ok_or(EntityError::UnknownType(id))
    }

    pub fn type_id(&self, name: &str) -> Option<EntityTypeId> {
        self.types.iter().find(|t| t.name == name).map(|t| t.id)
    }

    // ── Entities ──────────────────────────────────────────────────────────

    /// Create an entity of type `ty` at time `now`.
    pub fn create(&mut self, ty: EntityTypeId, now: SimTime) -> EntityResult<EntityId> {
        self.entity_type(ty)?;
        let id = EntityId(self.next_entity);
        self.next_entity += 1;
        self.entities.insert(id, Entity::new(id, ty, now));
        debug!(%id, entity_type = %ty, %now, "entity created");
        Ok(id)
    }

    pub fn get(&self, id: EntityId) -> EntityResult<&Entity> {
        self.entities.get(&id).ok_or(EntityError::UnknownEntity(id))
    }

    pub fn get_mut(&mut self, id: EntityId) -> EntityResult<&mut Entity> {
        self.entities.get_mut(&id).ok_or(EntityError::UnknownEntity(id))
    }

    /// Borrow an entity together with its type, e.g. to advance its sequence.
    pub fn with_type_mut(&mut self, id: EntityId) -> EntityResult<(&mut Entity, &mut EntityType)> {
        let entity = self.entities.get_mut(&id).ok_or(EntityError::UnknownEntity(id))?;
        let ty = self
            .types
            .get_mut(entity.type_id.index())
            .ok_or(EntityError::UnknownType(entity.type_id))?;
        Ok((entity, ty))
    }

    /// Remove a live entity, recording its time in system.  Any queue it
    /// still waits in lets go of it.
    pub fn dispose(&mut self, id: EntityId, now: SimTime) -> EntityResult<Entity> {
        let queued = self.get(id)?.queue;
        if let Some(q) = queued {
            self.leave_queue(q, id, now)?;
        }
        let entity = self.entities.remove(&id).ok_or(EntityError::UnknownEntity(id))?;
        self.disposed += 1;
        self.time_in_system.observe(now - entity.created_at);
        debug!(%id, %now, "entity disposed");
        Ok(entity)
    }

    pub fn live(&self) -> usize {
        self.entities.len()
    }

    /// Ids of live entities in creation order.
    pub fn live_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn created(&self) -> u64 {
        self.next_entity as u64
    }

    pub fn disposed(&self) -> u64 {
        self.disposed
    }

    pub fn time_in_system(&self) -> &Tally {
        &self.time_in_system
    }

    // ── Queues ────────────────────────────────────────────────────────────

    pub fn add_queue(&mut self, name: impl Into<String>, discipline: Discipline) -> EntityResult<QueueId> {
        let name = name.into();
        if self.queues.iter().any(|q| q.name == name) {
            return Err(EntityError::DuplicateName(name));
        }
        let id = QueueId(self.queues.len() as u32);
        self.queues.push(Queue::new(id, name, discipline));
        Ok(id)
    }

    pub fn queue(&self, id: QueueId) -> EntityResult<&Queue> {
        self.queues.get(id.index()).ok_or(EntityError::UnknownQueue(id))
    }

    pub fn queues(&self) -> &[Queue] {
        &self.queues
    }

    /// Put `entity` into `queue`.  An entity waits in at most one queue.
    pub fn enqueue(&mut self, queue: QueueId, entity: EntityId, now: SimTime) -> EntityResult<()> {
        let e = self.entities.get_mut(&entity).ok_or(EntityError::UnknownEntity(entity))?;
        if let Some(current) = e.queue {
            return Err(EntityError::AlreadyQueued { entity, queue: current });
        }
        let q = self.queues.get_mut(queue.index()).ok_or(EntityError::UnknownQueue(queue))?;
        q.enqueue(entity, e.priority, now)?;
        e.queue = Some(queue);
        e.queued_at = Some(now);
        Ok(())
    }

    pub fn peek_next(&self, queue: QueueId) -> EntityResult<Option<EntityId>> {
        Ok(self.queue(queue)?.peek_next().map(|e| e.entity))
    }

    pub fn remove_next(&mut self, queue: QueueId, now: SimTime) -> EntityResult<Option<QueueEntry>> {
        let q = self.queues.get_mut(queue.index()).ok_or(EntityError::UnknownQueue(queue))?;
        let Some(entry) = q.remove_next(now) else { return Ok(None) };
        self.clear_membership(entry.entity);
        Ok(Some(entry))
    }

    /// Take a specific entity out of `queue`.
    pub fn leave_queue(&mut self, queue: QueueId, entity: EntityId, now: SimTime) -> EntityResult<QueueEntry> {
        let q = self.queues.get_mut(queue.index()).ok_or(EntityError::UnknownQueue(queue))?;
        let entry = q.remove(entity, now)?;
        self.clear_membership(entity);
        Ok(entry)
    }

    fn clear_membership(&mut self, entity: EntityId) {
        if let Some(e) = self.entities.get_mut(&entity) {
            e.queue = None;
            e.queued_at = None;
        }
    }
}
