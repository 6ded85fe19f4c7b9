//! Interval scheduler for automatic runs.
//!
//! Settings live in the database and are edited by an external admin
//! surface, so the schedule is derived state: whenever the relevant
//! fields change, the active timer is cancelled and a fresh one starts.
//! At most one timer exists at any moment, and runs are serialized
//! behind a lock so a manual run never overlaps a scheduled one.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::pipeline::RunTrigger;
use crate::storage::{Database, RunConfig, SettingsRepository};

struct ActiveTimer {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
    interval_minutes: u32,
}

pub struct Scheduler {
    trigger: Arc<dyn RunTrigger>,
    active: Mutex<Option<ActiveTimer>>,
    run_lock: Arc<tokio::sync::Mutex<()>>,
}

impl Scheduler {
    pub fn new(trigger: Arc<dyn RunTrigger>) -> Self {
        Self {
            trigger,
            active: Mutex::new(None),
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Reconcile the timer with the given settings. A missing record or
    /// a disabled flag stops the timer; a changed interval replaces it.
    /// Cancellation is cooperative: an in-flight run finishes on its
    /// own, only future ticks are dropped.
    pub fn apply(&self, config: Option<&RunConfig>) {
        let desired = config
            .filter(|c| c.auto_crawl_enabled)
            .map(|c| c.crawl_interval_minutes.max(1));

        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if active.as_ref().map(|t| t.interval_minutes) == desired {
            return;
        }

        if let Some(timer) = active.take() {
            let _ = timer.cancel.send(true);
            tracing::info!(
                interval_minutes = timer.interval_minutes,
                "Stopped scheduled runs"
            );
        }

        if let Some(minutes) = desired {
            *active = Some(self.start_timer(minutes));
            tracing::info!(interval_minutes = minutes, "Scheduled automatic runs");
        }
    }

    fn start_timer(&self, minutes: u32) -> ActiveTimer {
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        let trigger = Arc::clone(&self.trigger);
        let run_lock = Arc::clone(&self.run_lock);
        let period = Duration::from_secs(minutes as u64 * 60);

        let handle = tokio::spawn(async move {
            // First fire happens one full period from now, never
            // immediately on (re)configuration.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let _guard = run_lock.lock().await;
                        let summary = trigger.trigger().await;
                        tracing::info!(
                            inserted = summary.inserted,
                            translated = summary.translations_succeeded,
                            "Scheduled run finished"
                        );
                    }
                    _ = cancel_rx.changed() => break,
                }
            }
        });

        ActiveTimer {
            cancel: cancel_tx,
            handle,
            interval_minutes: minutes,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn active_interval_minutes(&self) -> Option<u32> {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|t| t.interval_minutes)
    }

    /// Serialize a manual run against scheduled ticks.
    pub async fn run_now(&self) -> crate::pipeline::RunSummary {
        let _guard = self.run_lock.lock().await;
        self.trigger.trigger().await
    }

    /// Cancel the timer and wait for its task to wind down.
    pub async fn shutdown(&self) {
        let timer = self.active.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(timer) = timer {
            let _ = timer.cancel.send(true);
            let _ = timer.handle.await;
        }
    }
}

/// Poll the settings record and reapply the schedule when the
/// auto-run flag or the interval changes. Runs until dropped.
pub async fn watch_settings(scheduler: &Scheduler, db: &Database, poll_interval: Duration) {
    let mut last_key: Option<Option<(bool, u32)>> = None;
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match SettingsRepository::new(db).load().await {
            Ok(config) => {
                let key = config.as_ref().map(|c| c.schedule_key());
                if last_key.as_ref() != Some(&key) {
                    scheduler.apply(config.as_ref());
                    last_key = Some(key);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to read settings"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RunSummary;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTrigger {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RunTrigger for CountingTrigger {
        async fn trigger(&self) -> RunSummary {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RunSummary::default()
        }
    }

    fn enabled(minutes: u32) -> RunConfig {
        RunConfig {
            auto_crawl_enabled: true,
            crawl_interval_minutes: minutes,
            ..RunConfig::default()
        }
    }

    #[tokio::test]
    async fn only_the_latest_timer_survives_reconfiguration() {
        let trigger = Arc::new(CountingTrigger::default());
        let scheduler = Scheduler::new(trigger);

        scheduler.apply(Some(&enabled(5)));
        scheduler.apply(Some(&enabled(10)));
        scheduler.apply(Some(&enabled(15)));

        assert!(scheduler.is_active());
        assert_eq!(scheduler.active_interval_minutes(), Some(15));

        scheduler.shutdown().await;
        assert!(!scheduler.is_active());
    }

    #[tokio::test]
    async fn disabled_or_missing_settings_stop_the_timer() {
        let trigger = Arc::new(CountingTrigger::default());
        let scheduler = Scheduler::new(trigger);

        scheduler.apply(Some(&enabled(5)));
        assert!(scheduler.is_active());

        let mut disabled = enabled(5);
        disabled.auto_crawl_enabled = false;
        scheduler.apply(Some(&disabled));
        assert!(!scheduler.is_active());

        scheduler.apply(Some(&enabled(5)));
        scheduler.apply(None);
        assert!(!scheduler.is_active());
    }

    #[tokio::test]
    async fn unchanged_settings_keep_the_existing_timer() {
        let trigger = Arc::new(CountingTrigger::default());
        let scheduler = Scheduler::new(trigger);

        scheduler.apply(Some(&enabled(5)));
        let first = scheduler.active_interval_minutes();
        scheduler.apply(Some(&enabled(5)));
        assert_eq!(scheduler.active_interval_minutes(), first);

        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_fire_waits_a_full_interval() {
        let trigger = Arc::new(CountingTrigger::default());
        let scheduler = Scheduler::new(trigger.clone());
        scheduler.apply(Some(&enabled(1)));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(trigger.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(40)).await;
        tokio::task::yield_now().await;
        assert_eq!(trigger.calls.load(Ordering::SeqCst), 1);

        scheduler.shutdown().await;
    }
}
