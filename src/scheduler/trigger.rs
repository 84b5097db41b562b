//! Live trigger records and firing history entries.
//!
//! A [`Trigger`] is derived from an [`AlarmSpec`] on submission and is only
//! ever replaced whole: the loop swaps in [`Trigger::advanced`] after an
//! interval firing and drops absolute triggers once they ring.

use chime_grammar::AlarmSpec;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Opaque handle returned by [`Scheduler::submit`](super::Scheduler::submit).
///
/// Ids are allocated monotonically, so ordering by id is submission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TriggerId(u64);

impl TriggerId {
    /// Wrap a raw id, e.g. one received over the host bridge.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric id.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TriggerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a trigger repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerKind {
    /// Fires every `period_secs` seconds until cancelled.
    Interval {
        /// Spacing between firings, at least one second.
        period_secs: u64,
    },
    /// Fires once.
    Absolute,
}

/// A scheduled alarm owned by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    pub id: TriggerId,
    pub kind: TriggerKind,
    /// Next scheduled fire time.
    pub next_fire: DateTime<Utc>,
    pub reason: String,
}

impl Trigger {
    /// Build the trigger for `spec` submitted at `now`.
    ///
    /// Interval triggers first fire one period after `now`. Periods shorter
    /// than a second are raised to one second.
    #[must_use]
    pub fn from_spec(id: TriggerId, spec: &AlarmSpec, now: DateTime<Utc>) -> Self {
        match spec {
            AlarmSpec::Interval { reason, .. } => {
                let period_secs = spec.period().map_or(u64::MAX, |p| p.as_secs()).max(1);
                Self {
                    id,
                    kind: TriggerKind::Interval { period_secs },
                    next_fire: add_secs(now, period_secs),
                    reason: reason.clone(),
                }
            }
            AlarmSpec::Absolute { fire_at, reason } => Self {
                id,
                kind: TriggerKind::Absolute,
                next_fire: *fire_at,
                reason: reason.clone(),
            },
        }
    }

    /// Whether the trigger should fire at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_fire <= now
    }

    /// The record that replaces this one after it fires at `now`. `None` for
    /// absolute triggers.
    ///
    /// Interval triggers stay on their original grid: the next fire time is
    /// the first `next_fire + k * period` strictly after `now`, so periods
    /// missed during a stall are skipped rather than rung one after another.
    #[must_use]
    pub fn advanced(&self, now: DateTime<Utc>) -> Option<Self> {
        match self.kind {
            TriggerKind::Interval { period_secs } => {
                let period_secs = period_secs.max(1);
                let behind = u64::try_from(now.signed_duration_since(self.next_fire).num_seconds())
                    .unwrap_or(0);
                let steps = behind / period_secs + 1;
                Some(Self {
                    next_fire: add_secs(self.next_fire, steps.saturating_mul(period_secs)),
                    ..self.clone()
                })
            }
            TriggerKind::Absolute => None,
        }
    }
}

/// Saturating `t + secs`.
fn add_secs(t: DateTime<Utc>, secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|delta| t.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// One delivered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firing {
    pub trigger_id: TriggerId,
    pub kind: TriggerKind,
    pub reason: String,
    /// When the trigger was scheduled to ring.
    pub scheduled_for: DateTime<Utc>,
    /// When the scan that rang it ran.
    pub fired_at: DateTime<Utc>,
}

impl Firing {
    /// Record `trigger` ringing at `fired_at`.
    #[must_use]
    pub fn of(trigger: &Trigger, fired_at: DateTime<Utc>) -> Self {
        Self {
            trigger_id: trigger.id,
            kind: trigger.kind,
            reason: trigger.reason.clone(),
            scheduled_for: trigger.next_fire,
            fired_at,
        }
    }
}
