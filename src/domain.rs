//! ==============================================================================
//! domain.rs - wire types shared with the espmonitor api
//! ==============================================================================
//!
//! purpose:
//!     the shapes the backend hands us (readings, thresholds, stats) plus the
//!     small enums the controller uses to address them (metric, connection).
//!
//! relationships:
//!     - used by: api.rs (decode / encode), controller.rs (render), page.rs
//!
//! ==============================================================================

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// one timestamped sample from a device
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// unique device identifier (e.g., "ESP32_01")
    pub device_id: String,
    /// temperature in celsius
    pub temperature: f64,
    /// relative humidity (0-100%)
    pub humidity: f64,
    /// water level (0-100%)
    pub water_level: f64,
    /// when the backend stored the sample
    #[serde(with = "timestamp")]
    pub timestamp: NaiveDateTime,
}

impl Reading {
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::WaterLevel => self.water_level,
        }
    }
}

/// per-metric alert limits, mirrored from the server
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub temperature: f64,
    pub humidity: f64,
    pub water_level: f64,
}

impl Thresholds {
    pub fn limit(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::WaterLevel => self.water_level,
        }
    }
}

impl Default for Thresholds {
    /// the values the backend seeds its thresholds table with
    fn default() -> Self {
        Self {
            temperature: 30.0,
            humidity: 70.0,
            water_level: 80.0,
        }
    }
}

/// body returned by a successful `POST /api/thresholds`
#[derive(Clone, Debug, Deserialize)]
pub struct ThresholdsUpdated {
    pub thresholds: Thresholds,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub avg: f64,
    pub max: f64,
    pub min: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub temperature: MetricStats,
    pub humidity: MetricStats,
    pub water_level: MetricStats,
    #[serde(default)]
    pub total_readings: Option<u64>,
}

impl Stats {
    pub fn metric(&self, metric: Metric) -> &MetricStats {
        match metric {
            Metric::Temperature => &self.temperature,
            Metric::Humidity => &self.humidity,
            Metric::WaterLevel => &self.water_level,
        }
    }
}

/// `GET /api/stats` answers either with aggregates or `{ "message": ... }`
/// when nothing has been recorded yet. the sentinel wins if both appear.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatsResponse {
    NoData { message: String },
    Summary(Stats),
}

/// the three monitored quantities
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Temperature,
    Humidity,
    WaterLevel,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Temperature, Metric::Humidity, Metric::WaterLevel];
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::WaterLevel => "water_level",
        };
        f.write_str(name)
    }
}

/// rendered reachability of the backend
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Online,
    Offline,
}

// ==============================================================================
// timestamps
// ==============================================================================
// sqlite's CURRENT_TIMESTAMP gives "2024-05-01 12:00:00" (utc, no zone).
// accept that, the same with fractional seconds or a "T", and full rfc 3339.

pub mod timestamp {
    use super::*;

    const SQLITE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    pub fn parse(raw: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.naive_utc());
        }
        SQLITE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    }

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&ts.format("%Y-%m-%d %H:%M:%S").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("unrecognised timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reading_accepts_sqlite_timestamp() {
        let reading: Reading = serde_json::from_value(json!({
            "device_id": "ESP32_01",
            "temperature": 24.5,
            "humidity": 55.0,
            "water_level": 40.25,
            "timestamp": "2024-05-01 12:30:05"
        }))
        .unwrap();

        assert_eq!(reading.device_id, "ESP32_01");
        assert_eq!(reading.timestamp.to_string(), "2024-05-01 12:30:05");
    }

    #[test]
    fn reading_accepts_rfc3339_timestamp() {
        let reading: Reading = serde_json::from_value(json!({
            "device_id": "ESP32_02",
            "temperature": 1.0,
            "humidity": 2.0,
            "water_level": 3.0,
            "timestamp": "2024-05-01T14:30:05+02:00"
        }))
        .unwrap();

        assert_eq!(reading.timestamp.to_string(), "2024-05-01 12:30:05");
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let result: Result<Reading, _> = serde_json::from_value(json!({
            "device_id": "x",
            "temperature": 1.0,
            "humidity": 2.0,
            "water_level": 3.0,
            "timestamp": "yesterday"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn stats_message_is_the_no_data_sentinel() {
        let parsed: StatsResponse =
            serde_json::from_value(json!({ "message": "No data available" })).unwrap();
        assert_eq!(
            parsed,
            StatsResponse::NoData {
                message: "No data available".into()
            }
        );
    }

    #[test]
    fn stats_summary_parses_all_metrics() {
        let parsed: StatsResponse = serde_json::from_value(json!({
            "temperature": { "avg": 22.31, "max": 28.0, "min": 18.5 },
            "humidity": { "avg": 50.0, "max": 61.2, "min": 40.0 },
            "water_level": { "avg": 33.3, "max": 40.0, "min": 20.0 },
            "total_readings": 42
        }))
        .unwrap();

        let StatsResponse::Summary(stats) = parsed else {
            panic!("expected summary");
        };
        assert_eq!(stats.metric(Metric::Humidity).max, 61.2);
        assert_eq!(stats.total_readings, Some(42));
    }

    #[test]
    fn update_response_carries_echoed_thresholds() {
        let parsed: ThresholdsUpdated = serde_json::from_value(json!({
            "status": "success",
            "thresholds": { "temperature": 25, "humidity": 60, "water_level": 50 }
        }))
        .unwrap();
        assert_eq!(
            parsed.thresholds,
            Thresholds {
                temperature: 25.0,
                humidity: 60.0,
                water_level: 50.0
            }
        );
    }
}
