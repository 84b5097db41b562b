//! Alarm trigger scheduler.
//!
//! Owns the live trigger set and a single background loop that rings due
//! triggers through a [`Notifier`](crate::notify::Notifier).

pub mod runner;
pub mod trigger;

pub use runner::Scheduler;
pub use trigger::{Firing, Trigger, TriggerId, TriggerKind};
