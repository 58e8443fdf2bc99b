//! `des-sim`: the model that ties stations, resources, entities and the
//! event calendar together.
//!
//! # Entity flow
//!
//! ```text
//! receive(station, entity)
//!   Seize      → enqueue; one request per requirement; wait for grants
//!                 (all grants in) → leave queue → send_entity
//!   Release    → apply each release; grants go to their listeners → send_entity
//!   Delay      → schedule DelayDone(now + sampled duration)
//!   Composite  → receive(first member); members are chained to the exit
//!   Exit       → current station := composite; route with composite's mode
//!   Dispose    → entity leaves the model
//! send_entity(station, entity)
//!   → station's SendMode picks the next receiver → receive(next, entity)
//! ```
//!
//! Grants produced while a grant is being delivered are queued behind it and
//! delivered in order by the outermost delivery loop, so a listener that
//! triggers further releases never interleaves with another request's
//! grants.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use des_sim::{ModelBuilder, NoopObserver};
//!
//! let mut b = ModelBuilder::new(ModelConfig { seed: 7, end_time: Some(480.0), ..Default::default() });
//! // … resources, entity types, stations, routing …
//! let mut model = b.build()?;
//! model.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod listener;
pub mod model;
pub mod observer;


pub use builder::ModelBuilder;
pub use error::{SimError, SimResult};
pub use listener::SeizeListener;
pub use model::{Event, Model};
pub use observer::{ModelObserver, NoopObserver};
