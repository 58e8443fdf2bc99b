//! clinic: a walk-in clinic on the rust_des toolkit.
//!
//! Patients arrive at reception, pass through a triage composite
//! (seize a nurse from the nurse pool → assess → release the nurse) and then
//! wait for a doctor *and* an exam room together.  Urgent patients outrank
//! walk-ins in that wait.  Run with `RUST_LOG=des_sim=debug` to watch every
//! grant and hand-off.

use std::io::Cursor;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use des_core::{EntityId, Exponential, ModelConfig, SimTime, StationId, Uniform};
use des_entity::Discipline;
use des_resource::{ReleaseRequirement, ResourceTarget, SeizeRequirement, load_resources_reader};
use des_sim::{ModelBuilder, ModelObserver};
use des_station::{DelayOption, Generator, RequirementOption, SendMode};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:          u64 = 7;
const SHIFT_MINUTES: f64 = 8.0 * 60.0;
const WALK_IN_MEAN:  f64 = 6.0;  // minutes between walk-ins
const URGENT_MEAN:   f64 = 30.0; // minutes between urgent arrivals

const RESOURCES_CSV: &str = "\
name,capacity,set\n\
nurse_amy,1,nurses\n\
nurse_ben,1,nurses\n\
nurse_cat,1,nurses\n\
doctor,2,\n\
exam_room,3,\n\
";

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct ShiftLog {
    arrivals:   u64,
    treated:    u64,
    discharged: u64,
    longest:    f64,
    treatment:  Option<StationId>,
}

impl ModelObserver for ShiftLog {
    fn on_create(&mut self, _now: SimTime, _station: StationId, _entity: EntityId) {
        self.arrivals += 1;
    }

    fn on_seized(&mut self, _now: SimTime, station: StationId, _entity: EntityId) {
        if Some(station) == self.treatment {
            self.treated += 1;
        }
    }

    fn on_dispose(&mut self, _now: SimTime, _entity: EntityId, time_in_system: f64) {
        self.discharged += 1;
        self.longest = self.longest.max(time_in_system);
    }

    fn on_run_end(&mut self, now: SimTime, events: u64) {
        info!(%now, events, "shift over");
    }
}

// ── Model ─────────────────────────────────────────────────────────────────────

struct Clinic {
    triage:    StationId,
    treatment: StationId,
}

fn build_clinic(b: &mut ModelBuilder) -> Result<Clinic> {
    let specs = load_resources_reader(Cursor::new(RESOURCES_CSV))?;
    b.load_resources(&specs)?;
    let nurses = b.resource_set_id("nurses").context("nurse pool missing")?;
    let doctor = b.resource_id("doctor").context("doctor missing")?;
    let room = b.resource_id("exam_room").context("exam room missing")?;

    let walk_in = b.add_entity_type("walk-in")?;
    let urgent = b.add_entity_type("urgent")?;

    // Arrivals.
    let walk_ins = Exponential::new(WALK_IN_MEAN, b.stream(1))?;
    let urgents = Exponential::new(URGENT_MEAN, b.stream(2))?;
    let front_door = b.add_generator("front door", Generator::new(walk_in, Box::new(walk_ins)))?;
    let ambulance = b.add_generator("ambulance bay", Generator::new(urgent, Box::new(urgents)))?;

    // Triage: nurse → assess → nurse back.
    let need_nurse = SeizeRequirement::set(nurses, 1).save_key("triage").build(b.ids())?;
    let get_nurse = b.add_seize_station("get nurse", Discipline::Fifo, RequirementOption::Direct(vec![need_nurse]))?;
    let assess_time = Uniform::new(3.0, 8.0, b.stream(3))?;
    let assess = b.add_delay_station("assess", DelayOption::Direct(Box::new(assess_time)))?;
    let free_nurse = ReleaseRequirement::all(ResourceTarget::Set(nurses)).build(b.ids())?;
    let nurse_back = b.add_release_station("nurse back", RequirementOption::Direct(vec![free_nurse]))?;
    let triage = b.add_composite("triage", &[get_nurse, assess, nurse_back])?;

    // Treatment: doctor and room together, urgent first.
    let treatment = b.add_seize_station("doctor and room", Discipline::Fifo, RequirementOption::ByType)?;
    let treat = b.add_delay_station("treat", DelayOption::ByType)?;
    for (ty, priority, mean, stream) in [(walk_in, 5, 15.0, 4), (urgent, 1, 25.0, 5)] {
        let need_doctor = SeizeRequirement::resource(doctor, 1).priority(priority).build(b.ids())?;
        let need_room = SeizeRequirement::resource(room, 1).priority(priority).build(b.ids())?;
        let duration = Exponential::new(mean, b.stream(stream))?;
        let t = b.entity_type_mut(ty)?;
        t.add_seize_requirement(treatment, need_doctor);
        t.add_seize_requirement(treatment, need_room);
        t.set_delay(treat, Box::new(duration));
    }
    let give_doctor = ReleaseRequirement::all(ResourceTarget::Resource(doctor)).build(b.ids())?;
    let give_room = ReleaseRequirement::all(ResourceTarget::Resource(room)).build(b.ids())?;
    let discharge = b.add_release_station("discharge", RequirementOption::Direct(vec![give_doctor, give_room]))?;
    let exit = b.add_dispose_station("exit")?;

    // Routing.
    b.set_direct_receiver(front_door, triage)?;
    b.set_direct_receiver(ambulance, triage)?;
    b.set_send_mode(triage, SendMode::ByType)?;
    b.entity_type_mut(walk_in)?.add_route(triage, treatment);
    b.entity_type_mut(urgent)?.add_route(triage, treatment);
    b.set_direct_receiver(treatment, treat)?;
    b.set_direct_receiver(treat, discharge)?;
    b.set_direct_receiver(discharge, exit)?;

    Ok(Clinic { triage, treatment })
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== clinic: rust_des ===");
    println!("Shift: {SHIFT_MINUTES} min  |  Seed: {SEED}");
    println!();

    let config = ModelConfig { seed: SEED, end_time: Some(SHIFT_MINUTES), max_events: None };
    let mut builder = ModelBuilder::new(config);
    let clinic = build_clinic(&mut builder)?;
    let mut model = builder.build()?;

    let mut log = ShiftLog { treatment: Some(clinic.treatment), ..ShiftLog::default() };
    let t0 = Instant::now();
    model.run(&mut log)?;
    model.check_invariants()?;
    let elapsed = t0.elapsed();

    // Summary.
    println!("Simulated {} in {:.3} s", model.now(), elapsed.as_secs_f64());
    println!(
        "  arrivals: {}  treated: {}  discharged: {}  still inside: {}",
        log.arrivals,
        log.treated,
        log.discharged,
        model.entities().live()
    );
    if let Some(mean) = model.entities().time_in_system().mean() {
        println!("  time in clinic: mean {mean:.1} min, longest {:.1} min", log.longest);
    }
    println!();

    println!("{:<18} {:>9} {:>6} {:>12}", "Station", "Received", "Sent", "Mean stay");
    println!("{}", "-".repeat(48));
    for st in model.stations() {
        let stats = st.stats();
        let mean = stats.time_in_station().mean().map_or("-".to_string(), |m| format!("{m:.1}"));
        println!("{:<18} {:>9} {:>6} {:>12}", st.name(), stats.received(), stats.sent(), mean);
    }
    println!();

    println!("{:<22} {:>7} {:>10} {:>8}", "Queue", "Served", "Mean wait", "Max len");
    println!("{}", "-".repeat(50));
    for q in model.entities().queues() {
        let wait = q.waiting_time();
        let mean = wait.mean().map_or("-".to_string(), |m| format!("{m:.1}"));
        println!("{:<22} {:>7} {:>10} {:>8}", q.name(), wait.count(), mean, q.length().max());
    }
    println!();

    println!("{:<12} {:>8} {:>8} {:>9}", "Resource", "Capacity", "Seized", "Peak busy");
    println!("{}", "-".repeat(40));
    for r in model.resources().resources() {
        println!("{:<12} {:>8} {:>8} {:>9}", r.name(), r.capacity(), r.times_seized(), r.busy().max());
    }

    let triage = model.station(clinic.triage)?.stats();
    println!();
    println!(
        "Triage: {} patients assessed, mean {:.1} min each",
        triage.sent(),
        triage.time_in_station().mean().unwrap_or(0.0)
    );

    Ok(())
}
