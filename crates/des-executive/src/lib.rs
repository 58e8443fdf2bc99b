//! `des-executive`: the scheduling executive.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`calendar`]  | `Executive` trait, `EventCalendar<E>`, `ScheduledEvent<E>`|
//! | [`error`]     | `ExecutiveError`, `ExecutiveResult<T>`                    |
//!
//! The toolkit's stations only need two things from an executive: "run this
//! payload `delay` time units from now" and "what time is it".  The
//! calendar here is the minimal implementation of that contract; events at
//! the same instant run in the order they were scheduled.

pub mod calendar;
pub mod error;

#[cfg(test)]
mod tests;

pub use calendar::{EventCalendar, Executive, ScheduledEvent};
pub use error::{ExecutiveError, ExecutiveResult};
