//! Model observer trait for tracing entity flow and collecting data.

use des_core::{EntityId, SimTime, StationId};
use des_resource::Grant;

/// Callbacks invoked by the [`Model`][crate::Model] as entities move.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: arrival log
///
/// ```rust,ignore
/// struct Arrivals(Vec<(StationId, EntityId)>);
///
/// impl ModelObserver for Arrivals {
///     fn on_receive(&mut self, _now: SimTime, station: StationId, entity: EntityId) {
///         self.0.push((station, entity));
///     }
/// }
/// ```
pub trait ModelObserver {
    /// A station accepted an entity.
    fn on_receive(&mut self, _now: SimTime, _station: StationId, _entity: EntityId) {}

    /// A station handed an entity to `to` using its send mode.
    fn on_send(&mut self, _now: SimTime, _from: StationId, _to: StationId, _entity: EntityId) {}

    /// A grant reached its listener.
    fn on_grant(&mut self, _now: SimTime, _grant: &Grant) {}

    /// Every requirement of a seize station was granted for `entity`.
    fn on_seized(&mut self, _now: SimTime, _station: StationId, _entity: EntityId) {}

    /// A release station gave back everything it was told to.
    fn on_released(&mut self, _now: SimTime, _station: StationId, _entity: EntityId) {}

    /// A generator created `entity`.
    fn on_create(&mut self, _now: SimTime, _station: StationId, _entity: EntityId) {}

    /// `entity` left the model after `time_in_system`.
    fn on_dispose(&mut self, _now: SimTime, _entity: EntityId, _time_in_system: f64) {}

    /// Called once when [`Model::run`][crate::Model::run] returns.
    fn on_run_end(&mut self, _now: SimTime, _events: u64) {}
}

/// A [`ModelObserver`] that does nothing.
pub struct NoopObserver;

impl ModelObserver for NoopObserver {}
