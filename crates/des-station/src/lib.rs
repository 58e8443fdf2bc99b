//! `des-station`: what each processing station is and where it sends
//! entities next.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                             |
//! |-------------|----------------------------------------------------------------------|
//! | [`station`] | `Station`, `StationKind` (seize, release, delay, composite, exit, dispose, generator), `StationStats` |
//! | [`routing`] | `SendMode`, `EntitySender` trait, `ProbabilisticSender`, `RoundRobinSender` |
//! | [`options`] | `RequirementOption`, `StationRequirement`, `DelayOption`             |
//! | [`error`]   | `StationError`, `StationResult<T>`                                   |
//!
//! Stations here are plain data plus the decisions that only need the
//! station, the entity and its type (next destination, requirement list,
//! delay length).  Running them against resources and the calendar is the
//! job of `des-sim`.

pub mod error;
pub mod options;
pub mod routing;
pub mod station;

#[cfg(test)]
mod tests;

pub use error::{StationError, StationResult};
pub use options::{DelayOption, RequirementOption, StationRequirement};
pub use routing::{EntitySender, ProbabilisticSender, RoundRobinSender, SendMode};
pub use station::{Generator, Station, StationKind, StationStats};
