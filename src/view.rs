//! ==============================================================================
//! view.rs - view-binding interface between the controller and the page
//! ==============================================================================
//!
//! purpose:
//!     the controller never touches markup. it formats text and hands it to
//!     a DashboardView through one setter per displayed field. page.rs holds
//!     the real implementation; tests can read everything back from it.
//!
//! element ids:
//!     the ids below are the ones the dashboard page has always used, so a
//!     page snapshot can be matched against the markup one-for-one.
//!
//! ==============================================================================

use serde::Serialize;

use crate::domain::{ConnectionStatus, Metric};

pub trait DashboardView: Send + Sync {
    /// main value card text (already formatted)
    fn set_metric_value(&self, metric: Metric, text: &str);
    fn set_last_update(&self, text: &str);
    fn set_connection_status(&self, status: ConnectionStatus);
    /// toggles the `alert` class on the metric's card
    fn set_card_alert(&self, metric: Metric, alert: bool);
    /// current raw text of a threshold form input
    fn threshold_input(&self, metric: Metric) -> String;
    fn set_threshold_input(&self, metric: Metric, text: &str);
    fn set_threshold_display(&self, metric: Metric, text: &str);
    /// replaces every row of the history table body
    fn render_history(&self, rows: Vec<HistoryRow>);
    fn set_stat(&self, metric: Metric, kind: StatKind, text: &str);
    fn notify(&self, notification: Notification);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatKind {
    Avg,
    Max,
    Min,
}

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Avg, StatKind::Max, StatKind::Min];

    fn prefix(self) -> &'static str {
        match self {
            StatKind::Avg => "avg",
            StatKind::Max => "max",
            StatKind::Min => "min",
        }
    }
}

/// columns: time, device, temperature, humidity, water level
pub const HISTORY_COLUMNS: usize = 5;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HistoryRow {
    Reading { cells: [String; HISTORY_COLUMNS] },
    Placeholder { colspan: usize, text: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// user-facing strings (zh-CN, as shipped)
pub mod text {
    pub const ONLINE: &str = "在线";
    pub const OFFLINE: &str = "离线";
    pub const UNKNOWN: &str = "--";
    pub const LAST_UPDATE: &str = "最后更新";
    pub const NO_DATA: &str = "暂无数据";
    pub const UPDATE_OK: &str = "阈值更新成功";
    pub const UPDATE_FAILED: &str = "阈值更新失败";
}

// ==============================================================================
// element ids
// ==============================================================================

pub mod ids {
    pub const LAST_UPDATE: &str = "last-update";
    pub const CONNECTION_STATUS: &str = "connection-status";
    pub const HISTORY_BODY: &str = "history-body";
    pub const UPDATE_THRESHOLDS: &str = "update-thresholds";
}

impl Metric {
    pub fn value_id(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::WaterLevel => "water-level",
        }
    }

    pub fn card_id(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature-card",
            Metric::Humidity => "humidity-card",
            Metric::WaterLevel => "water-level-card",
        }
    }

    pub fn input_id(self) -> &'static str {
        match self {
            Metric::Temperature => "temp-threshold",
            Metric::Humidity => "humidity-threshold",
            Metric::WaterLevel => "water-threshold",
        }
    }

    pub fn threshold_display_id(self) -> &'static str {
        match self {
            Metric::Temperature => "current-temp-threshold",
            Metric::Humidity => "current-humidity-threshold",
            Metric::WaterLevel => "current-water-threshold",
        }
    }

    /// short suffix used by the stats ids (`avg-temp`, `max-water`, ...)
    fn stat_suffix(self) -> &'static str {
        match self {
            Metric::Temperature => "temp",
            Metric::Humidity => "humidity",
            Metric::WaterLevel => "water",
        }
    }

    pub fn stat_id(self, kind: StatKind) -> String {
        format!("{}-{}", kind.prefix(), self.stat_suffix())
    }

    /// human label for the page
    pub fn label(self) -> &'static str {
        match self {
            Metric::Temperature => "温度 (°C)",
            Metric::Humidity => "湿度 (%)",
            Metric::WaterLevel => "水位 (%)",
        }
    }
}
