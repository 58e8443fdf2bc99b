//! The `Model` struct: stations, resources, entities and the calendar, plus
//! the receive/send protocol that moves entities between stations.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use rustc_hash::FxHashMap;
use tracing::debug;

use des_core::{
    EntityId, EntityTypeId, IdGenerator, ListenerId, ModelConfig, ResourceId, SimRng, SimTime,
    StationId,
};
use des_entity::EntityStore;
use des_executive::{EventCalendar, Executive};
use des_resource::{Grant, ResourceManager};
use des_station::{SendMode, Station, StationError, StationKind};

use crate::{ModelObserver, SeizeListener, SimError, SimResult};

// ── Events ────────────────────────────────────────────────────────────────────

/// Payloads the model puts on its calendar.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Event {
    /// Deliver `entity` to `station`.
    Arrive { station: StationId, entity: EntityId },
    /// `entity` has finished its delay at `station`.
    DelayDone { station: StationId, entity: EntityId },
    /// Next arrival from a generator station.
    Generate { station: StationId },
}

/// What `receive` does once the entity is booked in.
#[derive(Copy, Clone)]
enum Work {
    Seize,
    Release,
    Delay,
    Enter(Option<StationId>),
    Exit,
    Dispose,
}

// ── Model ─────────────────────────────────────────────────────────────────────

/// A complete simulation model.
///
/// Entities move synchronously: `receive` runs a station's local work and,
/// if that work finishes immediately, `send_entity` hands the entity on in
/// the same call.  Only delays and generator arrivals go through the
/// calendar.
///
/// Create via [`ModelBuilder`][crate::ModelBuilder].
pub struct Model {
    pub(crate) config:            ModelConfig,
    pub(crate) ids:               IdGenerator,
    pub(crate) rng:               SimRng,
    pub(crate) resources:         ResourceManager,
    pub(crate) entities:          EntityStore,
    pub(crate) stations:          Vec<Station>,
    pub(crate) calendar:          EventCalendar<Event>,
    listeners:                    FxHashMap<ListenerId, SeizeListener>,
    next_listener:                u64,
    /// Grants waiting to reach their listeners, oldest first.
    grant_queue:                  VecDeque<Grant>,
    dispatching:                  bool,
    /// When each entity entered each composite it is currently inside.
    composite_entries:            FxHashMap<(StationId, EntityId), SimTime>,
    started:                      bool,
}

impl Model {
    pub(crate) fn new(config: ModelConfig) -> Self {
        let rng = SimRng::new(config.seed);
        Self {
            config,
            ids: IdGenerator::new(),
            rng,
            resources: ResourceManager::new(),
            entities: EntityStore::new(),
            stations: Vec::new(),
            calendar: EventCalendar::new(),
            listeners: FxHashMap::default(),
            next_listener: 0,
            grant_queue: VecDeque::new(),
            dispatching: false,
            composite_entries: FxHashMap::default(),
            started: false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn now(&self) -> SimTime {
        self.calendar.current_time()
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityStore {
        &mut self.entities
    }

    /// Id source for requirements built after the model.
    pub fn ids(&mut self) -> &mut IdGenerator {
        &mut self.ids
    }

    /// Master RNG; derive per-source streams with [`SimRng::child`].
    pub fn rng(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub fn station(&self, id: StationId) -> SimResult<&Station> {
        self.stations
            .get(id.index())
            .ok_or(SimError::Station(StationError::UnknownStation(id)))
    }

    pub fn station_id(&self, name: &str) -> Option<StationId> {
        self.stations.iter().find(|s| s.name() == name).map(|s| s.id())
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    /// Seizes still waiting for grants.
    pub fn pending_seizes(&self) -> usize {
        self.listeners.len()
    }

    pub fn pending_events(&self) -> usize {
        self.calendar.len()
    }

    fn station_mut(&mut self, id: StationId) -> SimResult<&mut Station> {
        self.stations
            .get_mut(id.index())
            .ok_or(SimError::Station(StationError::UnknownStation(id)))
    }

    // ── Configuration at run time ─────────────────────────────────────────

    /// Route everything leaving `station` to `to`.
    pub fn set_direct_receiver(&mut self, station: StationId, to: StationId) -> SimResult<()> {
        self.set_sending_option(station, SendMode::Direct(to))
    }

    pub fn set_sending_option(&mut self, station: StationId, mode: SendMode) -> SimResult<()> {
        if let SendMode::Direct(to) = &mode {
            self.station(*to)?;
        }
        self.station_mut(station)?.set_send_mode(mode)?;
        Ok(())
    }

    // ── Supply ────────────────────────────────────────────────────────────

    /// Change the capacity of `resource` and deliver whatever the new units
    /// satisfy.
    pub fn set_capacity(
        &mut self,
        resource: ResourceId,
        capacity: u32,
        obs:      &mut dyn ModelObserver,
    ) -> SimResult<()> {
        let grants = self.resources.set_capacity(resource, capacity)?;
        self.dispatch_grants(grants, obs)
    }

    /// Give back `amount` units of `resource` held by `entity` outside any
    /// release station.
    pub fn release(
        &mut self,
        entity:   EntityId,
        resource: ResourceId,
        amount:   u32,
        obs:      &mut dyn ModelObserver,
    ) -> SimResult<()> {
        let grants = self.resources.release(entity, resource, amount)?;
        self.dispatch_grants(grants, obs)
    }

    /// Create an entity of type `ty` at the current time.
    pub fn create_entity(&mut self, ty: EntityTypeId) -> SimResult<EntityId> {
        let now = self.now();
        Ok(self.entities.create(ty, now)?)
    }

    /// Deliver `entity` to `station` after `delay`.
    pub fn schedule_arrival(&mut self, delay: f64, station: StationId, entity: EntityId) -> SimResult<()> {
        self.station(station)?;
        self.calendar.schedule(delay, Event::Arrive { station, entity })?;
        Ok(())
    }

    // ── Receive / send protocol ───────────────────────────────────────────

    /// Hand `entity` to `station` now.
    pub fn receive(
        &mut self,
        station: StationId,
        entity:  EntityId,
        obs:     &mut dyn ModelObserver,
    ) -> SimResult<()> {
        let now = self.now();
        let st = self.station_mut(station)?;
        if !st.receives_entities() {
            return Err(StationError::NotReceiving(station).into());
        }
        st.stats_mut().record_arrival();
        let kind = st.kind().label();
        let work = match st.kind() {
            StationKind::Seize { .. } => Work::Seize,
            StationKind::Release { .. } => Work::Release,
            StationKind::Delay { .. } => Work::Delay,
            StationKind::Composite { members, .. } => Work::Enter(members.first().copied()),
            StationKind::Exit { .. } => Work::Exit,
            StationKind::Dispose => Work::Dispose,
            StationKind::Generator(_) => return Err(StationError::NotReceiving(station).into()),
        };
        self.entities.get_mut(entity)?.set_current_station(station, now);
        obs.on_receive(now, station, entity);
        debug!(%station, %entity, kind, %now, "entity received");

        match work {
            Work::Seize => self.begin_seize(station, entity, obs),
            Work::Release => self.release_at(station, entity, obs),
            Work::Delay => self.begin_delay(station, entity),
            Work::Enter(first) => {
                let first = first
                    .ok_or_else(|| SimError::Config(format!("composite {station} has no members")))?;
                self.composite_entries.insert((station, entity), now);
                self.receive(first, entity, obs)
            }
            Work::Exit => self.send_entity(station, entity, obs),
            Work::Dispose => self.dispose_at(station, entity, obs),
        }
    }

    /// `station` is done with `entity`: pass it to the next receiver.
    ///
    /// An exit station hands the entity back to its composite, which then
    /// routes it with its own send mode.
    pub fn send_entity(
        &mut self,
        station: StationId,
        entity:  EntityId,
        obs:     &mut dyn ModelObserver,
    ) -> SimResult<()> {
        let now = self.now();
        let exit_of = match self.station(station)?.kind() {
            StationKind::Exit { composite } => Some(*composite),
            _ => None,
        };
        let from = match exit_of {
            Some(composite) => {
                self.station_mut(station)?.stats_mut().record_departure(0.0);
                let entered = self
                    .composite_entries
                    .remove(&(composite, entity))
                    .ok_or_else(|| {
                        SimError::Config(format!("{entity} reached {station} without entering {composite}"))
                    })?;
                self.entities.get_mut(entity)?.set_current_station(composite, entered);
                composite
            }
            None => station,
        };

        let (e, ty) = self.entities.with_type_mut(entity)?;
        let elapsed = now - e.arrived_at();
        let st = self
            .stations
            .get_mut(from.index())
            .ok_or(StationError::UnknownStation(from))?;
        st.stats_mut().record_departure(elapsed);
        let to = st.next_station(from, e, ty)?;

        obs.on_send(now, from, to, entity);
        debug!(%from, %to, %entity, "entity sent");
        self.receive(to, entity, obs)
    }

    // ── Station behaviour ─────────────────────────────────────────────────

    fn begin_seize(&mut self, station: StationId, entity: EntityId, obs: &mut dyn ModelObserver) -> SimResult<()> {
        let now = self.now();
        let (queue, requirements) = {
            let StationKind::Seize { queue, requirements } = self.station(station)?.kind() else {
                return Err(StationError::WrongKind { station, expected: "seize" }.into());
            };
            let e = self.entities.get(entity)?;
            let ty = self.entities.entity_type(e.entity_type())?;
            (*queue, requirements.resolve(station, e, ty)?)
        };

        // Queue first: the entity waits here until every grant is in.
        self.entities.enqueue(queue, entity, now)?;

        let listener = ListenerId(self.next_listener);
        self.next_listener += 1;

        if let [only] = requirements.as_slice() {
            let request = self.resources.request_from(only, entity, listener)?;
            self.listeners.insert(listener, SeizeListener::Single { station, entity, request });
            let grants = self.resources.seize(request)?;
            return self.dispatch_grants(grants, obs);
        }

        // Register every request before submitting any.
        let mut requests = Vec::with_capacity(requirements.len());
        for r in &requirements {
            requests.push(self.resources.request_from(r, entity, listener)?);
        }
        let pending: BTreeSet<_> = requests.iter().copied().collect();
        self.listeners.insert(listener, SeizeListener::Aggregate { station, entity, pending });
        debug!(%station, %entity, requests = requests.len(), "aggregate seize registered");

        for request in requests {
            let grants = self.resources.seize(request)?;
            self.dispatch_grants(grants, obs)?;
        }
        Ok(())
    }

    /// All of `entity`'s requests at `station` are satisfied.
    fn finish_seize(&mut self, station: StationId, entity: EntityId, obs: &mut dyn ModelObserver) -> SimResult<()> {
        let now = self.now();
        let StationKind::Seize { queue, .. } = self.station(station)?.kind() else {
            return Err(StationError::WrongKind { station, expected: "seize" }.into());
        };
        let queue = *queue;
        self.entities.leave_queue(queue, entity, now)?;
        obs.on_seized(now, station, entity);
        debug!(%station, %entity, "seize complete");
        self.send_entity(station, entity, obs)
    }

    fn release_at(&mut self, station: StationId, entity: EntityId, obs: &mut dyn ModelObserver) -> SimResult<()> {
        let now = self.now();
        let requirements = {
            let StationKind::Release { requirements } = self.station(station)?.kind() else {
                return Err(StationError::WrongKind { station, expected: "release" }.into());
            };
            let e = self.entities.get(entity)?;
            let ty = self.entities.entity_type(e.entity_type())?;
            requirements.resolve(station, e, ty)?
        };
        for r in &requirements {
            let grants = self.resources.apply_release(entity, r)?;
            self.dispatch_grants(grants, obs)?;
        }
        obs.on_released(now, station, entity);
        self.send_entity(station, entity, obs)
    }

    fn begin_delay(&mut self, station: StationId, entity: EntityId) -> SimResult<()> {
        let st = self
            .stations
            .get_mut(station.index())
            .ok_or(StationError::UnknownStation(station))?;
        let StationKind::Delay { delay } = st.kind_mut() else {
            return Err(StationError::WrongKind { station, expected: "delay" }.into());
        };
        let (_, ty) = self.entities.with_type_mut(entity)?;
        let duration = delay.sample(station, entity, ty)?;
        self.calendar.schedule(duration, Event::DelayDone { station, entity })?;
        debug!(%station, %entity, duration, "delay started");
        Ok(())
    }

    fn dispose_at(&mut self, station: StationId, entity: EntityId, obs: &mut dyn ModelObserver) -> SimResult<()> {
        let now = self.now();
        if self.resources.holds_allocations(entity) {
            return Err(SimError::HoldsAllocations { entity, station });
        }
        self.station_mut(station)?.stats_mut().record_departure(0.0);
        let gone = self.entities.dispose(entity, now)?;
        obs.on_dispose(now, entity, now - gone.created_at());
        Ok(())
    }

    fn generate(&mut self, station: StationId, obs: &mut dyn ModelObserver) -> SimResult<()> {
        let now = self.now();
        let st = self.station_mut(station)?;
        let StationKind::Generator(g) = st.kind_mut() else {
            return Err(StationError::WrongKind { station, expected: "generator" }.into());
        };
        if g.is_exhausted() {
            return Ok(());
        }
        g.record_creation();
        let ty = g.entity_type();
        let next = if g.is_exhausted() { None } else { Some(g.next_delay(station)?) };
        st.stats_mut().record_arrival();

        let entity = self.entities.create(ty, now)?;
        self.entities.get_mut(entity)?.set_current_station(station, now);
        if let Some(delay) = next {
            self.calendar.schedule(delay, Event::Generate { station })?;
        }
        obs.on_create(now, station, entity);
        self.send_entity(station, entity, obs)
    }

    // ── Grants ────────────────────────────────────────────────────────────

    /// Queue grants for delivery and, unless a delivery loop is already
    /// running further up the stack, deliver them in order.
    fn dispatch_grants(&mut self, grants: Vec<Grant>, obs: &mut dyn ModelObserver) -> SimResult<()> {
        self.grant_queue.extend(grants);
        if self.dispatching {
            return Ok(());
        }
        self.dispatching = true;
        let result = self.drain_grants(obs);
        self.dispatching = false;
        if result.is_err() {
            self.grant_queue.clear();
        }
        result
    }

    fn drain_grants(&mut self, obs: &mut dyn ModelObserver) -> SimResult<()> {
        while let Some(grant) = self.grant_queue.pop_front() {
            let now = self.now();
            obs.on_grant(now, &grant);
            let listener = self
                .listeners
                .get_mut(&grant.listener)
                .ok_or(SimError::UnknownListener(grant.listener))?;
            if !listener.on_grant(grant.listener, &grant)? {
                continue;
            }
            let done = self
                .listeners
                .remove(&grant.listener)
                .ok_or(SimError::UnknownListener(grant.listener))?;
            self.finish_seize(done.station(), done.entity(), obs)?;
        }
        Ok(())
    }

    // ── Run loop ──────────────────────────────────────────────────────────

    /// Schedule the first arrival of every generator.  Called by the first
    /// `step`; calling it again does nothing.
    pub fn start(&mut self) -> SimResult<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;
        for i in 0..self.stations.len() {
            let station = self.stations[i].id();
            if let StationKind::Generator(g) = self.stations[i].kind_mut() {
                let delay = g.first_delay(station)?;
                self.calendar.schedule(delay, Event::Generate { station })?;
            }
        }
        Ok(())
    }

    /// Execute the next event.  Returns `false` when nothing is left to run
    /// within the configured end time and event cap.
    pub fn step(&mut self, obs: &mut dyn ModelObserver) -> SimResult<bool> {
        self.start()?;
        let Some(due) = self.calendar.peek_time() else { return Ok(false) };
        if self.config.end_time().is_some_and(|end| due > end) {
            return Ok(false);
        }
        if self.config.max_events.is_some_and(|max| self.calendar.executed() >= max) {
            return Ok(false);
        }
        let Some(event) = self.calendar.pop_next() else { return Ok(false) };
        match event.payload {
            Event::Arrive { station, entity } => self.receive(station, entity, obs)?,
            Event::DelayDone { station, entity } => self.send_entity(station, entity, obs)?,
            Event::Generate { station } => self.generate(station, obs)?,
        }
        Ok(true)
    }

    /// Run until the calendar is empty, the end time is passed or the event
    /// cap is hit.
    pub fn run(&mut self, obs: &mut dyn ModelObserver) -> SimResult<()> {
        while self.step(obs)? {}
        let (now, events) = (self.now(), self.calendar.executed());
        obs.on_run_end(now, events);
        debug!(%now, events, "run finished");
        Ok(())
    }

    /// Run every event due at or before `until`.
    pub fn run_until(&mut self, until: SimTime, obs: &mut dyn ModelObserver) -> SimResult<()> {
        self.start()?;
        while self.calendar.peek_time().is_some_and(|t| t <= until) {
            if !self.step(obs)? {
                break;
            }
        }
        Ok(())
    }

    /// Resource conservation plus listener bookkeeping.
    pub fn check_invariants(&self) -> SimResult<()> {
        self.resources.check_invariants()?;
        for (id, l) in &self.listeners {
            if let Some(request) = l.pending().find(|r| self.resources.request(*r).is_none()) {
                return Err(SimError::Config(format!(
                    "{id} at {} still waits on {request}, which no longer exists",
                    l.station()
                )));
            }
            let e = self.entities.get(l.entity())?;
            if e.queue().is_none() {
                return Err(SimError::Config(format!(
                    "{} waits for grants at {} but is not queued",
                    l.entity(),
                    l.station()
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("now", &self.now())
            .field("stations", &self.stations.len())
            .field("resources", &self.resources.resources().len())
            .field("live_entities", &self.entities.live())
            .field("pending_events", &self.calendar.len())
            .field("pending_seizes", &self.listeners.len())
            .finish()
    }
}
