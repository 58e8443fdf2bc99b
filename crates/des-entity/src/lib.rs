//! `des-entity`: the flow units that move through a model and the queues
//! they wait in.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                     |
//! |-----------------|--------------------------------------------------------------|
//! | [`entity`]      | `Entity`: type, current station, attributes, requirements   |
//! | [`entity_type`] | `EntityType`: sequence, routes, per-station requirements and delays |
//! | [`queue`]       | `Queue`, `Discipline`, `QueueEntry`                          |
//! | [`store`]       | `EntityStore`: owns entities, types and queues              |
//! | [`error`]       | `EntityError`, `EntityResult<T>`                             |
//!
//! Queue membership is tracked on both sides (the queue's entry list and the
//! entity's `queue()`), so every membership change goes through
//! [`EntityStore`] which keeps the two in step.

pub mod entity;
pub mod entity_type;
pub mod error;
pub mod queue;
pub mod store;


pub use entity::Entity;
pub use entity_type::EntityType;
pub use error::{EntityError, EntityResult};
pub use queue::{Discipline, Queue, QueueEntry};
pub use store::EntityStore;
