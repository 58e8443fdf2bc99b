//! End-to-end properties of the model: grant ordering, atomic multi-resource
//! seizes, set fairness, release round trips and composite opacity.

use des_core::{Constant, EntityId, ErrorKind, ModelConfig, ResourceId, SimTime, StationId};
use des_entity::Discipline;
use des_resource::{
    Grant, ReleaseRequirement, ResourceSpec, ResourceTarget, SeizeRequirement,
};
use des_sim::{Model, ModelBuilder, ModelObserver, NoopObserver, SimError};
use des_station::{DelayOption, Generator, RequirementOption, SendMode, StationError};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    received: Vec<StationId>,
    sent:     Vec<(StationId, StationId)>,
    grants:   Vec<(SimTime, EntityId, ResourceId, bool)>,
    seized:   Vec<(SimTime, EntityId)>,
    disposed: Vec<(SimTime, EntityId)>,
}

impl ModelObserver for Recorder {
    fn on_receive(&mut self, _now: SimTime, station: StationId, _entity: EntityId) {
        self.received.push(station);
    }

    fn on_send(&mut self, _now: SimTime, from: StationId, to: StationId, _entity: EntityId) {
        self.sent.push((from, to));
    }

    fn on_grant(&mut self, now: SimTime, grant: &Grant) {
        self.grants.push((now, grant.entity, grant.resource, grant.satisfied));
    }

    fn on_seized(&mut self, now: SimTime, _station: StationId, entity: EntityId) {
        self.seized.push((now, entity));
    }

    fn on_dispose(&mut self, now: SimTime, entity: EntityId, _time_in_system: f64) {
        self.disposed.push((now, entity));
    }
}

fn hold(b: &mut ModelBuilder, name: &str, duration: f64) -> StationId {
    b.add_delay_station(name, DelayOption::Direct(Box::new(Constant(duration)))).unwrap()
}

fn release_one(b: &mut ModelBuilder, name: &str, r: ResourceId) -> StationId {
    let give = ReleaseRequirement::resource(r, 1).build(b.ids()).unwrap();
    b.add_release_station(name, RequirementOption::Direct(vec![give])).unwrap()
}

fn seized_entities(rec: &Recorder) -> Vec<EntityId> {
    rec.seized.iter().map(|(_, e)| *e).collect()
}

// ── Request ordering ──────────────────────────────────────────────────────────

#[test]
fn waiting_seizes_are_served_by_priority_then_arrival() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    let desk = b.add_resource("desk", 1).unwrap();
    let ty = b.add_entity_type("client").unwrap();
    let seize = b
        .add_seize_station("take desk", Discipline::Fifo, RequirementOption::ByEntity)
        .unwrap();
    let work = hold(&mut b, "work", 10.0);
    let release = release_one(&mut b, "free desk", desk);
    let out = b.add_dispose_station("out").unwrap();
    b.set_direct_receiver(seize, work).unwrap();
    b.set_direct_receiver(work, release).unwrap();
    b.set_direct_receiver(release, out).unwrap();
    let mut model = b.build().unwrap();

    let arrive = |model: &mut Model, priority: i32, rec: &mut Recorder| -> EntityId {
        let e = model.create_entity(ty).unwrap();
        let need = SeizeRequirement::resource(desk, 1).priority(priority).build(model.ids()).unwrap();
        model.entities_mut().get_mut(e).unwrap().add_seize_requirement(seize, need);
        model.receive(seize, e, rec).unwrap();
        e
    };

    let mut rec = Recorder::default();
    let blocker = arrive(&mut model, 5, &mut rec);
    let p1 = arrive(&mut model, 5, &mut rec);
    let p2 = arrive(&mut model, 1, &mut rec);
    let p3 = arrive(&mut model, 5, &mut rec);
    assert_eq!(model.pending_seizes(), 3);

    model.run(&mut rec).unwrap();
    assert_eq!(seized_entities(&rec), vec![blocker, p2, p1, p3]);
    let times: Vec<f64> = rec.seized.iter().map(|(t, _)| t.0).collect();
    assert_eq!(times, vec![0.0, 10.0, 20.0, 30.0]);
    model.check_invariants().unwrap();
}

// ── Partial fill ──────────────────────────────────────────────────────────────

#[test]
fn partial_fill_takes_what_is_free_and_waits_for_the_rest() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    let beds = b.add_resource("beds", 5).unwrap();
    let ty = b.add_entity_type("ward").unwrap();

    // Two units are busy until t = 4.
    let small = SeizeRequirement::resource(beds, 2).build(b.ids()).unwrap();
    let seize_small = b
        .add_seize_station("two beds", Discipline::Fifo, RequirementOption::Direct(vec![small]))
        .unwrap();
    let hold_small = hold(&mut b, "short stay", 4.0);
    let give_small = ReleaseRequirement::resource(beds, 2).build(b.ids()).unwrap();
    let release_small = b
        .add_release_station("discharge two", RequirementOption::Direct(vec![give_small]))
        .unwrap();

    let big = SeizeRequirement::resource(beds, 5).partial_fill(true).build(b.ids()).unwrap();
    let seize_big = b
        .add_seize_station("five beds", Discipline::Fifo, RequirementOption::Direct(vec![big]))
        .unwrap();
    let hold_big = hold(&mut b, "long stay", 1.0);
    let give_big = ReleaseRequirement::all(ResourceTarget::Resource(beds)).build(b.ids()).unwrap();
    let release_big = b
        .add_release_station("discharge all", RequirementOption::Direct(vec![give_big]))
        .unwrap();

    let out = b.add_dispose_station("out").unwrap();
    b.set_direct_receiver(seize_small, hold_small).unwrap();
    b.set_direct_receiver(hold_small, release_small).unwrap();
    b.set_direct_receiver(release_small, out).unwrap();
    b.set_direct_receiver(seize_big, hold_big).unwrap();
    b.set_direct_receiver(hold_big, release_big).unwrap();
    b.set_direct_receiver(release_big, out).unwrap();
    let mut model = b.build().unwrap();

    let mut rec = Recorder::default();
    let first = model.create_entity(ty).unwrap();
    model.receive(seize_small, first, &mut rec).unwrap();
    let ward = model.create_entity(ty).unwrap();
    model.receive(seize_big, ward, &mut rec).unwrap();

    assert_eq!(model.resources().allocated_to(ward, beds), 3);
    assert_eq!(model.resources().number_available(beds).unwrap(), 0);
    assert_eq!(seized_entities(&rec), vec![first]);

    model.run(&mut rec).unwrap();
    assert_eq!(rec.seized[1], (SimTime(4.0), ward));
    assert!(model.resources().allocations_of(ward).is_empty());
    assert_eq!(model.resources().number_available(beds).unwrap(), 5);
    model.check_invariants().unwrap();
}

// ── Multi-resource atomicity ──────────────────────────────────────────────────

#[test]
fn multi_resource_seize_completes_only_when_every_grant_is_in() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    let a = b.add_resource("a", 1).unwrap();
    let bb = b.add_resource("b", 1).unwrap();
    let ty = b.add_entity_type("job").unwrap();

    let take_b = SeizeRequirement::resource(bb, 1).build(b.ids()).unwrap();
    let block = b
        .add_seize_station("block b", Discipline::Fifo, RequirementOption::Direct(vec![take_b]))
        .unwrap();
    let busy = hold(&mut b, "busy", 5.0);
    let unblock = release_one(&mut b, "unblock b", bb);

    let need_a = SeizeRequirement::resource(a, 1).build(b.ids()).unwrap();
    let need_b = SeizeRequirement::resource(bb, 1).build(b.ids()).unwrap();
    let both = b
        .add_seize_station("a and b", Discipline::Fifo, RequirementOption::Direct(vec![need_a, need_b]))
        .unwrap();
    let work = hold(&mut b, "work", 1.0);
    let give_a = ReleaseRequirement::resource(a, 1).build(b.ids()).unwrap();
    let give_b = ReleaseRequirement::resource(bb, 1).build(b.ids()).unwrap();
    let done = b
        .add_release_station("free both", RequirementOption::Direct(vec![give_a, give_b]))
        .unwrap();

    let out = b.add_dispose_station("out").unwrap();
    b.set_direct_receiver(block, busy).unwrap();
    b.set_direct_receiver(busy, unblock).unwrap();
    b.set_direct_receiver(unblock, out).unwrap();
    b.set_direct_receiver(both, work).unwrap();
    b.set_direct_receiver(work, done).unwrap();
    b.set_direct_receiver(done, out).unwrap();
    let mut model = b.build().unwrap();

    let mut rec = Recorder::default();
    let blocker = model.create_entity(ty).unwrap();
    model.receive(block, blocker, &mut rec).unwrap();
    let job = model.create_entity(ty).unwrap();
    model.receive(both, job, &mut rec).unwrap();

    // A is granted at once, but the job stays queued at the seize station.
    assert_eq!(model.resources().allocated_to(job, a), 1);
    assert!(rec.grants.contains(&(SimTime(0.0), job, a, true)));
    assert_eq!(seized_entities(&rec), vec![blocker]);
    assert!(model.entities().get(job).unwrap().queue().is_some());
    assert_eq!(model.station(both).unwrap().stats().sent(), 0);

    model.run(&mut rec).unwrap();
    assert_eq!(rec.seized[1], (SimTime(5.0), job));
    assert_eq!(model.entities().disposed(), 2);
    assert!(model.resources().allocations_of(job).is_empty());
    model.check_invariants().unwrap();
}

// ── Set fairness ──────────────────────────────────────────────────────────────

#[test]
fn cyclic_set_rotates_members_across_visits() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    b.load_resources(&[
        ResourceSpec::new("m1", 1).in_set("pool"),
        ResourceSpec::new("m2", 1).in_set("pool"),
        ResourceSpec::new("m3", 1).in_set("pool"),
    ])
    .unwrap();
    let pool = b.resource_set_id("pool").unwrap();
    let members: Vec<ResourceId> = ["m1", "m2", "m3"].iter().map(|n| b.resource_id(n).unwrap()).collect();
    let ty = b.add_entity_type("job").unwrap();

    let need = SeizeRequirement::set(pool, 1).build(b.ids()).unwrap();
    let seize = b
        .add_seize_station("take one", Discipline::Fifo, RequirementOption::Direct(vec![need]))
        .unwrap();
    let work = hold(&mut b, "work", 1.0);
    let give = ReleaseRequirement::set(pool, 1).build(b.ids()).unwrap();
    let release = b
        .add_release_station("give back", RequirementOption::Direct(vec![give]))
        .unwrap();
    let out = b.add_dispose_station("out").unwrap();
    b.set_direct_receiver(seize, work).unwrap();
    b.set_direct_receiver(work, release).unwrap();
    b.set_direct_receiver(release, out).unwrap();
    let mut model = b.build().unwrap();

    for i in 0..6u32 {
        let e = model.create_entity(ty).unwrap();
        model.schedule_arrival(10.0 * f64::from(i), seize, e).unwrap();
    }
    let mut rec = Recorder::default();
    model.run(&mut rec).unwrap();

    let offered: Vec<ResourceId> = rec.grants.iter().map(|(_, _, r, _)| *r).collect();
    let expected: Vec<ResourceId> = members.iter().chain(members.iter()).copied().collect();
    assert_eq!(offered, expected);
    assert_eq!(model.resources().set_seizes_of(EntityId(0)).count(), 0);
    model.check_invariants().unwrap();
}

// ── Round-trip release ────────────────────────────────────────────────────────

#[test]
fn releasing_everything_clears_the_allocation() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    let r = b.add_resource("crane", 3).unwrap();
    let ty = b.add_entity_type("ship").unwrap();
    let need = SeizeRequirement::resource(r, 2).build(b.ids()).unwrap();
    let seize = b
        .add_seize_station("moor", Discipline::Fifo, RequirementOption::Direct(vec![need]))
        .unwrap();
    let give = ReleaseRequirement::all(ResourceTarget::Resource(r)).build(b.ids()).unwrap();
    let release = b
        .add_release_station("unmoor", RequirementOption::Direct(vec![give]))
        .unwrap();
    let sail = hold(&mut b, "sail", 2.0);
    let out = b.add_dispose_station("out").unwrap();
    b.set_direct_receiver(seize, release).unwrap();
    b.set_direct_receiver(release, sail).unwrap();
    b.set_direct_receiver(sail, out).unwrap();
    let mut model = b.build().unwrap();

    let e = model.create_entity(ty).unwrap();
    model.receive(seize, e, &mut NoopObserver).unwrap();

    // Still alive in "sail", holding nothing.
    assert!(model.resources().allocation(e, r).is_none());
    assert!(!model.resources().holds_allocations(e));
    assert_eq!(model.resources().number_available(r).unwrap(), 3);
    model.run(&mut NoopObserver).unwrap();
    assert_eq!(model.entities().disposed(), 1);
}

// ── Re-entrant grant delivery ────────────────────────────────────────────────

#[test]
fn grants_released_inside_a_completing_seize_are_delivered_in_order() {
    // seize R → seize Q → release R → delay → release Q → dispose.  Releasing
    // R happens while the grant of Q is still being delivered.
    let mut b = ModelBuilder::new(ModelConfig::default());
    let r = b.add_resource("R", 1).unwrap();
    let q = b.add_resource("Q", 1).unwrap();
    let ty = b.add_entity_type("job").unwrap();
    let need_r = SeizeRequirement::resource(r, 1).build(b.ids()).unwrap();
    let need_q = SeizeRequirement::resource(q, 1).build(b.ids()).unwrap();
    let seize_r = b
        .add_seize_station("take R", Discipline::Fifo, RequirementOption::Direct(vec![need_r]))
        .unwrap();
    let seize_q = b
        .add_seize_station("take Q", Discipline::Fifo, RequirementOption::Direct(vec![need_q]))
        .unwrap();
    let free_r = release_one(&mut b, "free R", r);
    let work = hold(&mut b, "work", 2.0);
    let free_q = release_one(&mut b, "free Q", q);
    let out = b.add_dispose_station("out").unwrap();
    b.set_direct_receiver(seize_r, seize_q).unwrap();
    b.set_direct_receiver(seize_q, free_r).unwrap();
    b.set_direct_receiver(free_r, work).unwrap();
    b.set_direct_receiver(work, free_q).unwrap();
    b.set_direct_receiver(free_q, out).unwrap();
    let mut model = b.build().unwrap();

    let mut rec = Recorder::default();
    let jobs: Vec<EntityId> = (0..4)
        .map(|_| {
            let e = model.create_entity(ty).unwrap();
            model.receive(seize_r, e, &mut rec).unwrap();
            model.check_invariants().unwrap();
            e
        })
        .collect();
    assert_eq!(model.pending_seizes(), 3);

    while model.step(&mut rec).unwrap() {
        model.check_invariants().unwrap();
    }

    let expected: Vec<(SimTime, EntityId)> = jobs
        .iter()
        .enumerate()
        .map(|(i, e)| (SimTime(2.0 * (i as f64 + 1.0)), *e))
        .collect();
    assert_eq!(rec.disposed, expected);
    assert_eq!(model.pending_seizes(), 0);
    assert_eq!(model.entities().live(), 0);
    assert_eq!(model.resources().number_available(r).unwrap(), 1);
    assert_eq!(model.resources().number_available(q).unwrap(), 1);
}

// ── Composite opacity ─────────────────────────────────────────────────────────

#[test]
fn composite_is_one_station_from_the_outside() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    let r = b.add_resource("drill", 1).unwrap();
    let ty = b.add_entity_type("part").unwrap();
    let need = SeizeRequirement::resource(r, 1).build(b.ids()).unwrap();
    let seize = b
        .add_seize_station("get drill", Discipline::Fifo, RequirementOption::Direct(vec![need]))
        .unwrap();
    let drill = hold(&mut b, "drilling", 3.0);
    let release = release_one(&mut b, "put drill back", r);
    let op = b.add_composite("drill op", &[seize, drill, release]).unwrap();
    let inspect = hold(&mut b, "inspect", 1.0);
    let out = b.add_dispose_station("out").unwrap();
    b.set_direct_receiver(op, inspect).unwrap();
    b.set_direct_receiver(inspect, out).unwrap();
    let mut model = b.build().unwrap();
    let exit = model.station_id("drill op exit").unwrap();

    let e = model.create_entity(ty).unwrap();
    let mut rec = Recorder::default();
    model.receive(op, e, &mut rec).unwrap();
    model.run(&mut rec).unwrap();

    assert_eq!(rec.received, vec![op, seize, drill, release, exit, inspect, out]);
    assert_eq!(rec.sent, vec![
        (seize, drill),
        (drill, release),
        (release, exit),
        (op, inspect),
        (inspect, out),
    ]);

    let stats = model.station(op).unwrap().stats();
    assert_eq!(stats.received(), 1);
    assert_eq!(stats.sent(), 1);
    assert_eq!(stats.time_in_station().mean(), Some(3.0));
    for member in [seize, drill, release] {
        assert_eq!(model.station(member).unwrap().stats().received(), 1);
    }
}

// ── Routing modes ─────────────────────────────────────────────────────────────

#[test]
fn by_type_routing_follows_declared_routes() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    let fast = b.add_entity_type("fast").unwrap();
    let slow = b.add_entity_type("slow").unwrap();
    let triage = hold(&mut b, "triage", 0.0);
    let express = hold(&mut b, "express", 1.0);
    let standard = hold(&mut b, "standard", 5.0);
    let out = b.add_dispose_station("out").unwrap();
    b.set_send_mode(triage, SendMode::ByType).unwrap();
    b.set_direct_receiver(express, out).unwrap();
    b.set_direct_receiver(standard, out).unwrap();
    b.entity_type_mut(fast).unwrap().add_route(triage, express);
    b.entity_type_mut(slow).unwrap().add_route(triage, standard);
    let mut model = b.build().unwrap();

    let mut rec = Recorder::default();
    for ty in [fast, slow] {
        let e = model.create_entity(ty).unwrap();
        model.receive(triage, e, &mut rec).unwrap();
    }
    model.run(&mut rec).unwrap();
    assert!(rec.sent.contains(&(triage, express)));
    assert!(rec.sent.contains(&(triage, standard)));
    assert_eq!(model.now(), SimTime(5.0));
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[test]
fn disposing_a_holder_is_rejected() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    let r = b.add_resource("r", 1).unwrap();
    let ty = b.add_entity_type("job").unwrap();
    let need = SeizeRequirement::resource(r, 1).build(b.ids()).unwrap();
    let seize = b
        .add_seize_station("seize", Discipline::Fifo, RequirementOption::Direct(vec![need]))
        .unwrap();
    let out = b.add_dispose_station("out").unwrap();
    b.set_direct_receiver(seize, out).unwrap();
    let mut model = b.build().unwrap();

    let e = model.create_entity(ty).unwrap();
    let err = model.receive(seize, e, &mut NoopObserver).unwrap_err();
    assert!(matches!(err, SimError::HoldsAllocations { entity, station } if entity == e && station == out));
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn generators_refuse_entities() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    let ty = b.add_entity_type("job").unwrap();
    let g = b.add_generator("source", Generator::new(ty, Box::new(Constant(1.0)))).unwrap();
    let out = b.add_dispose_station("out").unwrap();
    b.set_direct_receiver(g, out).unwrap();
    let mut model = b.build().unwrap();

    let e = model.create_entity(ty).unwrap();
    let err = model.receive(g, e, &mut NoopObserver).unwrap_err();
    assert!(matches!(err, SimError::Station(StationError::NotReceiving(s)) if s == g));
    assert_eq!(err.kind(), ErrorKind::Unsupported);
}

#[test]
fn running_off_a_sequence_is_missing_configuration() {
    let mut b = ModelBuilder::new(ModelConfig::default());
    let ty = b.add_entity_type("job").unwrap();
    let step = hold(&mut b, "step", 1.0);
    b.set_send_mode(step, SendMode::BySequence).unwrap();
    b.entity_type_mut(ty).unwrap().set_sequence(vec![step]);
    let mut model = b.build().unwrap();

    let e = model.create_entity(ty).unwrap();
    model.receive(step, e, &mut NoopObserver).unwrap();
    let err = model.run(&mut NoopObserver).unwrap_err();
    assert!(matches!(err, SimError::Station(StationError::SequenceExhausted { .. })));
    assert_eq!(err.kind(), ErrorKind::MissingConfiguration);
    assert_eq!(model.now(), SimTime(2.0));
}

#[test]
fn resources_load_from_csv_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resources.csv");
    std::fs::write(&path, "name,capacity,set\ndoc_a,1,doctors\ndoc_b,1,doctors\nxray,2,\n").unwrap();

    let mut b = ModelBuilder::new(ModelConfig::default());
    b.load_resources_csv(&path).unwrap();
    let doctors = b.resource_set_id("doctors").unwrap();
    let model = b.build().unwrap();
    assert_eq!(model.resources().resource_set(doctors).unwrap().members().len(), 2);
    assert_eq!(model.resources().resources().len(), 3);
}
