//! Scheduler background loop.
//!
//! Spawns a tokio task that scans the live trigger set once per tick and
//! rings every trigger that is due. The trigger lock is held only while due
//! triggers are selected and their records replaced; notifier calls happen
//! after it is released.

use crate::config::SchedulerConfig;
use crate::error::{ChimeError, Result};
use crate::notify::Notifier;
use crate::scheduler::trigger::{Firing, Trigger, TriggerId};
use chime_grammar::AlarmSpec;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default interval between scans.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Number of firings to keep.
const DEFAULT_HISTORY_LIMIT: usize = 200;

/// Alarm scheduler with an explicit start/stop lifecycle.
///
/// Share it behind an `Arc`; every method takes `&self`.
pub struct Scheduler {
    state: Arc<State>,
    notifier: Arc<dyn Notifier>,
    tick_interval: Duration,
    history_limit: usize,
    running: Mutex<Option<LoopHandle>>,
}

/// State shared between callers and the loop task.
#[derive(Default)]
struct State {
    triggers: Mutex<BTreeMap<TriggerId, Trigger>>,
    history: Mutex<VecDeque<Firing>>,
    next_id: AtomicU64,
}

struct LoopHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Scheduler {
    /// Create a stopped scheduler delivering to `notifier`.
    pub fn new(notifier: impl Notifier + 'static) -> Self {
        Self::with_shared_notifier(Arc::new(notifier))
    }

    /// Create a stopped scheduler from an already shared notifier.
    pub fn with_shared_notifier(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Arc::new(State::default()),
            notifier,
            tick_interval: DEFAULT_TICK_INTERVAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
            running: Mutex::new(None),
        }
    }

    /// Create a scheduler using the tick and history settings in `config`.
    pub fn from_config(config: &SchedulerConfig, notifier: impl Notifier + 'static) -> Self {
        Self::new(notifier)
            .with_tick_interval(config.tick_interval())
            .with_history_limit(config.history_limit)
    }

    /// Override the scan interval. Zero is raised to one millisecond.
    #[must_use]
    pub fn with_tick_interval(mut self, tick: Duration) -> Self {
        self.tick_interval = tick.max(Duration::from_millis(1));
        self
    }

    /// Override the firing history limit.
    #[must_use]
    pub fn with_history_limit(mut self, max_entries: usize) -> Self {
        self.history_limit = max_entries.max(1);
        self
    }

    /// Configured scan interval.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Spawn the loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ChimeError::Scheduler`] if the loop is already running or no
    /// runtime is available.
    pub fn start(&self) -> Result<()> {
        let mut running = lock(&self.running);
        if running.as_ref().is_some_and(|h| !h.task.is_finished()) {
            return Err(ChimeError::Scheduler("scheduler already running".to_owned()));
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ChimeError::Scheduler(format!("no tokio runtime: {e}")))?;

        let cancel = CancellationToken::new();
        let task = runtime.spawn(run_loop(
            Arc::clone(&self.state),
            Arc::clone(&self.notifier),
            self.tick_interval,
            self.history_limit,
            cancel.clone(),
        ));
        *running = Some(LoopHandle { cancel, task });
        Ok(())
    }

    /// Stop the loop if it is running and wait for it to exit. Outstanding
    /// triggers are discarded either way.
    pub async fn stop(&self) {
        let handle = lock(&self.running).take();
        if let Some(handle) = handle {
            handle.cancel.cancel();
            if let Err(e) = handle.task.await {
                warn!(error = %e, "scheduler loop ended abnormally");
            }
        }
        let discarded = {
            let mut triggers = lock(&self.state.triggers);
            let count = triggers.len();
            triggers.clear();
            count
        };
        if discarded > 0 {
            debug!(discarded, "outstanding triggers discarded on stop");
        }
    }

    /// Whether the loop task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.running)
            .as_ref()
            .is_some_and(|h| !h.task.is_finished())
    }

    /// Register a trigger for `spec`. Never blocks on the loop.
    pub fn submit(&self, spec: &AlarmSpec) -> TriggerId {
        self.submit_at(spec, Utc::now())
    }

    /// Register a trigger for `spec` as if submitted at `now`.
    pub fn submit_at(&self, spec: &AlarmSpec, now: DateTime<Utc>) -> TriggerId {
        let id = TriggerId::new(self.state.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let trigger = Trigger::from_spec(id, spec, now);
        debug!(
            trigger_id = %id,
            next_fire = %trigger.next_fire,
            "trigger scheduled"
        );
        lock(&self.state.triggers).insert(id, trigger);
        id
    }

    /// Remove a trigger so it never fires again. Returns `false` for unknown
    /// or already finished ids.
    pub fn cancel(&self, id: TriggerId) -> bool {
        let removed = lock(&self.state.triggers).remove(&id).is_some();
        if removed {
            debug!(trigger_id = %id, "trigger cancelled");
        }
        removed
    }

    /// Snapshot of live triggers in id order.
    #[must_use]
    pub fn pending(&self) -> Vec<Trigger> {
        lock(&self.state.triggers).values().cloned().collect()
    }

    /// Recent firings, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<Firing> {
        lock(&self.state.history).iter().cloned().collect()
    }

    /// Run one scan at `now` on the calling task, returning what fired.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Vec<Firing> {
        self.state
            .scan(self.notifier.as_ref(), now, self.history_limit)
            .await
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.running).take() {
            handle.cancel.cancel();
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("notifier", &self.notifier.name())
            .field("tick_interval", &self.tick_interval)
            .field("history_limit", &self.history_limit)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

async fn run_loop(
    state: Arc<State>,
    notifier: Arc<dyn Notifier>,
    tick: Duration,
    history_limit: usize,
    cancel: CancellationToken,
) {
    info!(
        tick_ms = u64::try_from(tick.as_millis()).unwrap_or(u64::MAX),
        notifier = notifier.name(),
        "scheduler started"
    );
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                state.scan(notifier.as_ref(), Utc::now(), history_limit).await;
            }
        }
    }
    info!("scheduler stopped");
}

impl State {
    /// Ring every trigger due at `now`, at most once each.
    async fn scan(
        &self,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
        history_limit: usize,
    ) -> Vec<Firing> {
        let due = self.take_due(now);
        let mut fired = Vec::with_capacity(due.len());

        for trigger in due {
            let firing = Firing::of(&trigger, now);
            debug!(
                trigger_id = %firing.trigger_id,
                scheduled_for = %firing.scheduled_for,
                "trigger due"
            );
            if let Err(e) = notifier.notify(&firing).await {
                warn!(
                    trigger_id = %firing.trigger_id,
                    notifier = notifier.name(),
                    error = %e,
                    "notifier failed"
                );
            }
            self.record(firing.clone(), history_limit);
            fired.push(firing);
        }
        fired
    }

    /// Select due triggers, replacing interval records with their advanced
    /// form and dropping absolute ones. Returned in id order.
    fn take_due(&self, now: DateTime<Utc>) -> Vec<Trigger> {
        let mut triggers = lock(&self.triggers);
        let due_ids: Vec<TriggerId> = triggers
            .values()
            .filter(|t| t.is_due(now))
            .map(|t| t.id)
            .collect();

        due_ids
            .into_iter()
            .filter_map(|id| {
                let trigger = triggers.remove(&id)?;
                if let Some(next) = trigger.advanced(now) {
                    triggers.insert(id, next);
                }
                Some(trigger)
            })
            .collect()
    }

    fn record(&self, firing: Firing, history_limit: usize) {
        let mut history = lock(&self.history);
        history.push_back(firing);
        while history.len() > history_limit {
            history.pop_front();
        }
    }
}
