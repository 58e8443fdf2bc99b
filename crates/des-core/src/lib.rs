//! `des-core`: foundational types for the `rust_des` simulation toolkit.
//!
//! This crate is a dependency of every other `des-*` crate.  It has no
//! `des-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module      | Contents                                                      |
//! |-------------|---------------------------------------------------------------|
//! | [`ids`]     | `EntityId`, `ResourceId`, `RequestId`, … and `IdGenerator`    |
//! | [`time`]    | `SimTime`, `ModelConfig`                                      |
//! | [`rng`]     | `SimRng` (seedable stream with child derivation)              |
//! | [`value`]   | `ValueSource` trait, `Constant`, `Uniform`, `Exponential`, `Cycle` |
//! | [`stats`]   | `ObservationSink` trait, `Tally`, `Counter`, `NoopSink`       |
//! | [`error`]   | `DesError`, `DesResult`, `ErrorKind`                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to ids, `SimTime`, config.  |

pub mod error;
pub mod ids;
pub mod rng;
pub mod stats;
pub mod time;
pub mod value;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{DesError, DesResult, ErrorKind};
pub use ids::{
    AllocationId, EntityId, EntityTypeId, EventId, IdGenerator, ListenerId, QueueId, RequestId,
    RequirementId, ResourceId, ResourceSetId, StationId,
};
pub use rng::SimRng;
pub use stats::{Counter, NoopSink, ObservationSink, Tally};
pub use time::{ModelConfig, SimTime};
pub use value::{Constant, Cycle, Exponential, Uniform, ValueSource};
