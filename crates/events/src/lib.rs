//! Domain event infrastructure for the progression engine.
//!
//! - [`PathEvent`] — the closed set of outward progression events.
//! - [`CourseSignal`] — inbound signals from the Course Enrollment subsystem.
//! - [`EventBus`] / [`SignalBus`] — in-process publish/subscribe hubs
//!   backed by `tokio::sync::broadcast`.
//! - [`EventOutbox`] — per-operation event accumulation so nothing is
//!   published before the owning transaction commits.
//! - [`EventPersistence`] — background service that durably writes every
//!   published event to the `path_events` table.

pub mod bus;
pub mod event;
pub mod outbox;
pub mod persistence;

pub use bus::{Bus, EventBus, SignalBus};
pub use event::{CourseSignal, PathEvent};
pub use outbox::EventOutbox;
pub use persistence::EventPersistence;
