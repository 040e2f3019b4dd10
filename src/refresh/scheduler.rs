use super::{FetchKind, Fetcher};
use crate::config::EngineConfig;
use crate::lifecycle::Activity;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Keeps the store converged with the remote collection while the view is
/// focused and the host is foregrounded.
///
/// Owns the repeating timer explicitly: `focus_gained` performs a loud fetch
/// and starts it, `focus_lost` and backgrounding cancel it, returning to the
/// foreground performs one quiet fetch and restarts it.
pub struct RefreshScheduler {
    fetcher: Arc<Fetcher>,
    period: Duration,
    reconcile_delay: Duration,
    focused: AtomicBool,
    alive: Arc<AtomicBool>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub(crate) fn new(
        fetcher: Arc<Fetcher>,
        config: &EngineConfig,
        alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            fetcher,
            period: config.refresh_period,
            reconcile_delay: config.reconcile_delay,
            focused: AtomicBool::new(false),
            alive,
            timer: Mutex::new(None),
        }
    }

    /// The view gained focus: immediate loud fetch, then the repeating timer.
    pub async fn focus_gained(&self) {
        self.focused.store(true, Ordering::SeqCst);
        let fetcher = Arc::clone(&self.fetcher);
        tokio::spawn(async move {
            fetcher.fetch(FetchKind::Loud).await;
        });
        self.start_timer().await;
    }

    /// The view lost focus: cancel the timer, issue no further calls.
    pub async fn focus_lost(&self) {
        self.focused.store(false, Ordering::SeqCst);
        self.stop_timer().await;
    }

    /// One-shot delayed quiet reconciliation, scheduled after a mutation
    /// settles to converge the store with the authoritative collection.
    pub fn schedule_reconcile(&self) {
        let fetcher = Arc::clone(&self.fetcher);
        let alive = Arc::clone(&self.alive);
        let delay = self.reconcile_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if alive.load(Ordering::SeqCst) {
                fetcher.fetch(FetchKind::Quiet).await;
            }
        });
    }

    /// React to host activity transitions. The task ends when the publisher
    /// side of the channel is dropped.
    pub(crate) fn spawn_activity_task(
        self: Arc<Self>,
        mut activity: watch::Receiver<Activity>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while activity.changed().await.is_ok() {
                let state = *activity.borrow_and_update();
                match state {
                    Activity::Background => self.stop_timer().await,
                    Activity::Foreground => {
                        if self.focused.load(Ordering::SeqCst) {
                            self.fetcher.fetch(FetchKind::Quiet).await;
                            self.start_timer().await;
                        }
                    }
                }
            }
        })
    }

    async fn start_timer(&self) {
        let mut timer = self.timer.lock().await;
        if let Some(handle) = timer.take() {
            handle.abort();
        }
        let fetcher = Arc::clone(&self.fetcher);
        let alive = Arc::clone(&self.alive);
        let period = self.period;
        *timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of an interval resolves immediately; the loud
            // focus fetch already covered it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
                fetcher.fetch(FetchKind::Quiet).await;
            }
        }));
    }

    async fn stop_timer(&self) {
        if let Some(handle) = self.timer.lock().await.take() {
            handle.abort();
        }
    }

    pub(crate) async fn shutdown(&self) {
        self.stop_timer().await;
    }
}
