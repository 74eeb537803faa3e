//! stub espmonitor backend for the integration tests

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub struct Backend {
    /// newest first, as the real backend orders them
    pub readings: Mutex<Vec<Value>>,
    pub thresholds: Mutex<Value>,
    pub stats: Mutex<Value>,
    pub reject_updates: AtomicBool,
    pub down: AtomicBool,
    pub requested_limits: Mutex<Vec<usize>>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            readings: Mutex::new(Vec::new()),
            thresholds: Mutex::new(json!({
                "temperature": 30.0, "humidity": 70.0, "water_level": 80.0
            })),
            stats: Mutex::new(json!({ "message": "No data available" })),
            reject_updates: AtomicBool::new(false),
            down: AtomicBool::new(false),
            requested_limits: Mutex::new(Vec::new()),
        }
    }
}

impl Backend {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn is_down(&self) -> bool {
        self.down.load(Ordering::SeqCst)
    }
}

pub fn reading(device: &str, temperature: f64, humidity: f64, water_level: f64, ts: &str) -> Value {
    json!({
        "device_id": device,
        "temperature": temperature,
        "humidity": humidity,
        "water_level": water_level,
        "timestamp": ts,
    })
}

#[derive(Deserialize)]
struct LimitParams {
    limit: Option<usize>,
}

type Shared = Arc<Backend>;

fn unavailable() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "database is locked" })),
    )
        .into_response()
}

async fn latest_data(State(backend): State<Shared>, Query(params): Query<LimitParams>) -> Response {
    if backend.is_down() {
        return unavailable();
    }
    let limit = params.limit.unwrap_or(20);
    backend.requested_limits.lock().unwrap().push(limit);
    let rows: Vec<Value> = backend
        .readings
        .lock()
        .unwrap()
        .iter()
        .take(limit)
        .cloned()
        .collect();
    Json(rows).into_response()
}

async fn get_thresholds(State(backend): State<Shared>) -> Response {
    if backend.is_down() {
        return unavailable();
    }
    Json(backend.thresholds.lock().unwrap().clone()).into_response()
}

async fn set_thresholds(State(backend): State<Shared>, Json(body): Json<Value>) -> Response {
    if backend.is_down() || backend.reject_updates.load(Ordering::SeqCst) {
        return unavailable();
    }
    *backend.thresholds.lock().unwrap() = body.clone();
    Json(json!({ "status": "success", "thresholds": body })).into_response()
}

async fn stats(State(backend): State<Shared>) -> Response {
    if backend.is_down() {
        return unavailable();
    }
    Json(backend.stats.lock().unwrap().clone()).into_response()
}

pub async fn spawn_backend(backend: Shared) -> (String, JoinHandle<()>) {
    let router = Router::new()
        .route("/api/latest-data", get(latest_data))
        .route("/api/thresholds", get(get_thresholds).post(set_thresholds))
        .route("/api/stats", get(stats))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}"), handle)
}
