//! ==============================================================================
//! poller.rs - auto update timer
//! ==============================================================================
//!
//! purpose:
//!     owns the single repeating timer that keeps the page fresh.
//!
//! behaviour:
//!     - start: one-shot load of all four resources, then a tick every
//!       `period` (first tick one full period later) refreshing
//!       latest / history / stats. no-op while already running.
//!     - stop: aborts the timer task. refreshes already in flight still
//!       land, they just schedule nothing further. no-op while stopped.
//!     - every tick runs as its own task so a slow backend never delays
//!       the next tick.
//!
//! relationships:
//!     - drives: controller.rs
//!     - used by: main.rs (startup / shutdown), server.rs (visibility)
//!
//! ==============================================================================

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::controller::Controller;

/// refresh period used when nothing is configured
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

pub struct AutoUpdate {
    controller: Arc<Controller>,
    period: Duration,
    /// `None` means not running
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl AutoUpdate {
    pub fn new(controller: Arc<Controller>, period: Duration) -> Self {
        Self {
            controller,
            period,
            timer: Mutex::new(None),
        }
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.timer.lock().is_some()
    }

    /// returns false if a timer was already live
    pub fn start(&self) -> bool {
        let mut timer = self.timer.lock();
        if timer.is_some() {
            tracing::debug!("auto update already running");
            return false;
        }

        let controller = self.controller.clone();
        tokio::spawn(async move { controller.refresh_all().await });

        let controller = self.controller.clone();
        let period = self.period;
        *timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let controller = controller.clone();
                tokio::spawn(async move { controller.refresh().await });
            }
        }));

        tracing::info!(period_ms = self.period.as_millis() as u64, "Auto update started");
        true
    }

    /// returns false if nothing was running
    pub fn stop(&self) -> bool {
        match self.timer.lock().take() {
            Some(handle) => {
                handle.abort();
                tracing::info!("Auto update stopped");
                true
            }
            None => false,
        }
    }

    /// hidden pauses, visible resumes through the normal start path
    pub fn set_visible(&self, visible: bool) {
        if visible {
            self.start();
        } else {
            self.stop();
        }
    }
}

impl Drop for AutoUpdate {
    fn drop(&mut self) {
        if let Some(handle) = self.timer.get_mut().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::{reading, Call, FakeApi, Scripted};
    use crate::domain::ConnectionStatus;
    use crate::page::PageView;

    const PERIOD: Duration = Duration::from_millis(5000);

    fn setup() -> (Arc<FakeApi>, AutoUpdate) {
        let api = Arc::new(FakeApi::default());
        let controller = Arc::new(Controller::new(api.clone(), Arc::new(PageView::new())));
        (api, AutoUpdate::new(controller, PERIOD))
    }

    #[tokio::test(start_paused = true)]
    async fn failing_ticks_keep_the_timer_alive() {
        let api = Arc::new(FakeApi::default());
        *api.latest.lock() = Scripted::Status(503);
        let page = Arc::new(PageView::new());
        let controller = Arc::new(Controller::new(api.clone(), page.clone()));
        let poller = AutoUpdate::new(controller, PERIOD);

        poller.start();
        settle().await;
        tokio::time::sleep(PERIOD * 3).await;

        assert_eq!(api.count(Call::Latest), 4);
        assert!(poller.is_running());
        assert_eq!(page.snapshot().connection_status(), ConnectionStatus::Offline);

        *api.latest.lock() = Scripted::Ok(vec![reading("ESP32_01", 21.0, 40.0, 10.0)]);
        tokio::time::sleep(PERIOD).await;

        assert_eq!(api.count(Call::Latest), 5);
        let page = page.snapshot();
        assert_eq!(page.connection_status(), ConnectionStatus::Online);
        assert_eq!(page.text("temperature"), "21.0");
    }

    /// let spawned refreshes run without crossing a tick boundary
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn start_fetches_everything_once_then_ticks() {
        let (api, poller) = setup();
        assert!(poller.start());
        settle().await;

        assert_eq!(api.count(Call::Latest), 1);
        assert_eq!(api.count(Call::Thresholds), 1);
        assert_eq!(api.count(Call::History), 1);
        assert_eq!(api.count(Call::Stats), 1);

        tokio::time::sleep(PERIOD).await;
        assert_eq!(api.count(Call::Latest), 2);
        assert_eq!(api.count(Call::History), 2);
        assert_eq!(api.count(Call::Stats), 2);
        assert_eq!(api.count(Call::Thresholds), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_one_timer() {
        let (api, poller) = setup();
        assert!(poller.start());
        assert!(!poller.start());
        settle().await;
        assert_eq!(api.count(Call::Latest), 1);

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(api.count(Call::Latest), 4);
        assert_eq!(api.count(Call::Thresholds), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_further_fetches() {
        let (api, poller) = setup();
        poller.start();
        settle().await;

        assert!(poller.stop());
        assert!(!poller.stop());
        assert!(!poller.is_running());

        tokio::time::sleep(PERIOD * 3).await;
        assert_eq!(api.count(Call::Latest), 1);
        assert_eq!(api.count(Call::Stats), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn visibility_resume_reloads_thresholds() {
        let (api, poller) = setup();
        poller.set_visible(true);
        settle().await;

        poller.set_visible(false);
        tokio::time::sleep(PERIOD * 2).await;
        assert_eq!(api.count(Call::Latest), 1);

        poller.set_visible(true);
        settle().await;
        assert!(poller.is_running());
        assert_eq!(api.count(Call::Latest), 2);
        assert_eq!(api.count(Call::Thresholds), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_stops_the_timer() {
        let (api, poller) = setup();
        poller.start();
        settle().await;
        drop(poller);

        tokio::time::sleep(PERIOD * 2).await;
        assert_eq!(api.count(Call::Latest), 1);
    }
}
