//! ==============================================================================
//! controller.rs - dashboard controller
//! ==============================================================================
//!
//! purpose:
//!     fetch from the backend, format, push into the view. owns the only
//!     piece of mutable client state: the threshold mirror.
//!
//! relationships:
//!     - uses: api.rs (MonitorApi), view.rs (DashboardView)
//!     - used by: poller.rs (periodic refresh), server.rs (form submit)
//!
//! failure model:
//!     reads log and swallow their errors; the previous render stays in
//!     place. the threshold write notifies the user either way.
//!     responses are not sequenced: a slow reply can overwrite a newer one.
//!
//! ==============================================================================

use parking_lot::RwLock;
use std::sync::Arc;

use crate::api::MonitorApi;
use crate::domain::{ConnectionStatus, Metric, Reading, StatsResponse, Thresholds};
use crate::error::UpdateError;
use crate::page::placeholder_row;
use crate::view::{text, DashboardView, HistoryRow, Notification, StatKind};

/// rows requested for the history table
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

const DISPLAY_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

pub struct Controller {
    api: Arc<dyn MonitorApi>,
    view: Arc<dyn DashboardView>,
    /// replaced wholesale, never field by field
    thresholds: RwLock<Thresholds>,
    history_limit: u32,
    show_sensor_data: bool,
}

impl Controller {
    pub fn new(api: Arc<dyn MonitorApi>, view: Arc<dyn DashboardView>) -> Self {
        Self {
            api,
            view,
            thresholds: RwLock::new(Thresholds::default()),
            history_limit: DEFAULT_HISTORY_LIMIT,
            show_sensor_data: false,
        }
    }

    pub fn with_history_limit(mut self, limit: u32) -> Self {
        self.history_limit = limit;
        self
    }

    /// log every fetched reading at info instead of debug
    pub fn with_sensor_logging(mut self, enabled: bool) -> Self {
        self.show_sensor_data = enabled;
        self
    }

    pub fn thresholds(&self) -> Thresholds {
        *self.thresholds.read()
    }

    pub fn view(&self) -> &Arc<dyn DashboardView> {
        &self.view
    }

    /// one timer tick: everything except thresholds
    pub async fn refresh(&self) {
        tokio::join!(self.fetch_latest(), self.fetch_history(), self.fetch_stats());
    }

    /// the one-shot load issued when auto update starts
    pub async fn refresh_all(&self) {
        tokio::join!(
            self.fetch_latest(),
            self.fetch_thresholds(),
            self.fetch_history(),
            self.fetch_stats()
        );
    }

    pub async fn fetch_latest(&self) {
        match self.api.latest_data(1).await {
            Ok(readings) => match readings.first() {
                Some(reading) => {
                    self.render_reading(reading);
                    self.view.set_connection_status(ConnectionStatus::Online);
                }
                None => {
                    tracing::debug!("latest-data returned no rows");
                    self.view.set_connection_status(ConnectionStatus::Offline);
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "Error fetching latest data");
                self.view.set_connection_status(ConnectionStatus::Offline);
            }
        }
    }

    pub async fn fetch_thresholds(&self) {
        match self.api.thresholds().await {
            Ok(thresholds) => self.replace_thresholds(thresholds),
            Err(e) => tracing::error!(error = %e, "Error fetching thresholds"),
        }
    }

    /// submit the threshold form
    ///
    /// on any failure the in-memory thresholds are left exactly as they were.
    pub async fn post_thresholds(&self) -> Result<Thresholds, UpdateError> {
        let result = match self.read_threshold_form() {
            Ok(candidate) => self
                .api
                .update_thresholds(&candidate)
                .await
                .map_err(UpdateError::from),
            Err(e) => Err(e),
        };

        match result {
            Ok(thresholds) => {
                self.replace_thresholds(thresholds);
                tracing::info!(
                    temperature = thresholds.temperature,
                    humidity = thresholds.humidity,
                    water_level = thresholds.water_level,
                    "Thresholds updated"
                );
                self.view.notify(Notification::success(text::UPDATE_OK));
                Ok(thresholds)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Error updating thresholds");
                self.view.notify(Notification::error(text::UPDATE_FAILED));
                Err(e)
            }
        }
    }

    pub async fn fetch_history(&self) {
        match self.api.latest_data(self.history_limit).await {
            Ok(readings) => self.view.render_history(history_rows(&readings)),
            Err(e) => tracing::error!(error = %e, "Error fetching history"),
        }
    }

    pub async fn fetch_stats(&self) {
        match self.api.stats().await {
            Ok(StatsResponse::NoData { message }) => {
                tracing::debug!(%message, "stats not available yet");
            }
            Ok(StatsResponse::Summary(stats)) => {
                tracing::debug!(total_readings = ?stats.total_readings, "stats refreshed");
                for metric in Metric::ALL {
                    let values = stats.metric(metric);
                    self.view.set_stat(metric, StatKind::Avg, &values.avg.to_string());
                    self.view.set_stat(metric, StatKind::Max, &values.max.to_string());
                    self.view.set_stat(metric, StatKind::Min, &values.min.to_string());
                }
            }
            Err(e) => tracing::error!(error = %e, "Error fetching stats"),
        }
    }

    /// flag every card whose reading is above the current threshold
    pub fn check_alerts(&self, reading: &Reading) {
        let thresholds = self.thresholds();
        for (metric, alert) in alerts(reading, &thresholds) {
            self.view.set_card_alert(metric, alert);
        }
    }

    fn render_reading(&self, reading: &Reading) {
        if self.show_sensor_data {
            tracing::info!(
                device = %reading.device_id,
                "Temp: {:.1}°C | Humidity: {:.1}% | Water: {:.1}%",
                reading.temperature,
                reading.humidity,
                reading.water_level
            );
        } else {
            tracing::debug!(device = %reading.device_id, "latest reading rendered");
        }

        for metric in Metric::ALL {
            self.view
                .set_metric_value(metric, &format!("{:.1}", reading.value(metric)));
        }
        self.view.set_last_update(&format!(
            "{}: {}",
            text::LAST_UPDATE,
            reading.timestamp.format(DISPLAY_TIME_FORMAT)
        ));
        self.check_alerts(reading);
    }

    fn replace_thresholds(&self, thresholds: Thresholds) {
        *self.thresholds.write() = thresholds;
        for metric in Metric::ALL {
            let shown = thresholds.limit(metric).to_string();
            self.view.set_threshold_input(metric, &shown);
            self.view.set_threshold_display(metric, &shown);
        }
    }

    fn read_threshold_form(&self) -> Result<Thresholds, UpdateError> {
        let field = |metric: Metric| -> Result<f64, UpdateError> {
            let raw = self.view.threshold_input(metric);
            match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(value),
                _ => Err(UpdateError::InvalidInput { metric, value: raw }),
            }
        };
        Ok(Thresholds {
            temperature: field(Metric::Temperature)?,
            humidity: field(Metric::Humidity)?,
            water_level: field(Metric::WaterLevel)?,
        })
    }
}

/// alert iff the value is strictly above its limit
pub fn alerts(reading: &Reading, thresholds: &Thresholds) -> [(Metric, bool); 3] {
    Metric::ALL.map(|metric| (metric, reading.value(metric) > thresholds.limit(metric)))
}

/// table rows in the order received; an empty list gives the placeholder
pub fn history_rows(readings: &[Reading]) -> Vec<HistoryRow> {
    if readings.is_empty() {
        return vec![placeholder_row()];
    }
    readings
        .iter()
        .map(|r| HistoryRow::Reading {
            cells: [
                r.timestamp.format(DISPLAY_TIME_FORMAT).to_string(),
                r.device_id.clone(),
                format!("{:.1}", r.temperature),
                format!("{:.1}", r.humidity),
                format!("{:.1}", r.water_level),
            ],
        })
        .collect()
}
