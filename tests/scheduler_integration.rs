//! Interpreter to scheduler flow through the public API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chime::{ChannelNotifier, Interpreter, Scheduler, TriggerKind};
use std::sync::Arc;
use std::time::Duration;

fn fast_scheduler() -> (Scheduler, tokio::sync::mpsc::UnboundedReceiver<chime::Firing>) {
    let (sink, rx) = ChannelNotifier::channel();
    let scheduler = Scheduler::new(sink).with_tick_interval(Duration::from_millis(20));
    (scheduler, rx)
}

#[tokio::test]
async fn one_second_interval_rings_repeatedly() {
    let (scheduler, mut rx) = fast_scheduler();
    scheduler.start().unwrap();

    let spec = Interpreter::default()
        .interpret("remind me to blink every 1 second")
        .unwrap();
    let id = scheduler.submit(&spec);

    let mut scheduled = Vec::new();
    for _ in 0..3 {
        let firing = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("firing before timeout")
            .expect("channel open");
        assert_eq!(firing.trigger_id, id);
        assert_eq!(firing.reason, "blink");
        assert_eq!(firing.kind, TriggerKind::Interval { period_secs: 1 });
        scheduled.push(firing.scheduled_for);
    }
    for pair in scheduled.windows(2) {
        assert_eq!(pair[1] - pair[0], chrono::TimeDelta::seconds(1));
    }

    assert!(scheduler.cancel(id));
    scheduler.stop().await;
    assert!(!scheduler.is_running());
}

#[tokio::test]
async fn delay_alarm_rings_once() {
    let (scheduler, mut rx) = fast_scheduler();
    scheduler.start().unwrap();

    let spec = chime::interpret("remind me to stand up in 0 seconds").unwrap();
    scheduler.submit(&spec);

    let firing = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(firing.reason, "stand up");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());
    assert!(scheduler.pending().is_empty());
    assert_eq!(scheduler.history().len(), 1);

    scheduler.stop().await;
}

#[tokio::test]
async fn concurrent_submits_are_visible_before_next_scan() {
    let (scheduler, _rx) = fast_scheduler();
    let scheduler = Arc::new(scheduler);
    let spec = chime::interpret("every 5 minutes").unwrap();

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let scheduler = Arc::clone(&scheduler);
        let spec = spec.clone();
        tasks.push(tokio::spawn(async move { scheduler.submit(&spec) }));
    }
    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap());
    }
    ids.sort();
    ids.dedup();

    assert_eq!(ids.len(), 32);
    assert_eq!(scheduler.pending().len(), 32);
}
