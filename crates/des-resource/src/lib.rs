//! `des-resource`: capacity-limited resources and the requests that compete
//! for them.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                       |
//! |-----------------|----------------------------------------------------------------|
//! | [`resource`]    | `Resource`: capacity, allocated units, waiting list           |
//! | [`set`]         | `ResourceSet`: members in release order, waiting list         |
//! | [`selection`]   | `SelectionRule` trait, `CyclicRule`, `MaxAvailableRule`        |
//! | [`request`]     | `Request`, `RequestState`, `RequestSpec`, `Grant`              |
//! | [`allocation`]  | `Allocation`, `SetSeizeRecord`                                 |
//! | [`requirement`] | `SeizeRequirement`, `ReleaseRequirement` and their builders    |
//! | [`manager`]     | `ResourceManager`: owns everything above, seize/release       |
//! | [`loader`]      | `load_resources_csv`, `load_resources_reader`                  |
//! | [`error`]       | `ResourceError`, `ResourceResult<T>`                           |
//!
//! # Grant model
//!
//! The manager never calls back into user code.  `seize`, `release` and
//! `set_capacity` finish all of their bookkeeping and return the list of
//! [`Grant`]s they made, in the order they were made.  The caller (the model
//! in `des-sim`) dispatches each grant to the listener named on the request.
//! A listener that seizes or releases again simply makes a fresh call; no
//! waiting list is ever being iterated at that point.

pub mod allocation;
pub mod error;
pub mod loader;
pub mod manager;
pub mod request;
pub mod requirement;
pub mod resource;
pub mod selection;
pub mod set;


pub use allocation::{Allocation, SetSeizeRecord};
pub use error::{ResourceError, ResourceResult};
pub use loader::{ResourceSpec, load_resources_csv, load_resources_reader};
pub use manager::ResourceManager;
pub use request::{Grant, Request, RequestSpec, RequestState, RequestTarget};
pub use requirement::{
    DEFAULT_PRIORITY, ReleaseAmount, ReleaseRequirement, ReleaseRequirementBuilder,
    ReleaseTarget, ResourceTarget, SeizeRequirement, SeizeRequirementBuilder, Sequenced,
    SetReleasePolicy, sort_requirements, try_compare,
};
pub use resource::Resource;
pub use selection::{CyclicRule, MaxAvailableRule, SelectionRule};
pub use set::ResourceSet;
