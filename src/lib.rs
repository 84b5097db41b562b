//! Chime: natural-language alarms.
//!
//! Free text such as "remind me to stretch every 10 minutes" is turned into a
//! structured alarm and rung on schedule:
//! text → Interpreter → Scheduler → Notifier
//!
//! # Architecture
//!
//! - **Interpreter**: the [`chime_grammar`] crate; pure text to [`AlarmSpec`]
//! - **Scheduler**: owns live triggers and one background loop that rings
//!   them
//! - **Notifier**: sink for firings (log, channel, fan-out)
//! - **Host bridge**: newline-delimited JSON over stdio (`chime-host`)

pub mod config;
pub mod error;
pub mod host;
pub mod notify;
pub mod scheduler;

pub use chime_grammar::{AlarmSpec, Interpreter, ParseError, TimeUnit, UnitWord, interpret};
pub use config::ChimeConfig;
pub use error::{ChimeError, Result};
pub use notify::{ChannelNotifier, FanoutNotifier, LogNotifier, Notifier, NotifyError};
pub use scheduler::{Firing, Scheduler, Trigger, TriggerId, TriggerKind};
