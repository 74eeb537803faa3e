//! ==============================================================================
//! server.rs - dashboard web server
//! ==============================================================================
//!
//! purpose:
//!     serves the page the controller renders into, and turns the page's
//!     user events (threshold submit, tab hidden / visible) into controller
//!     and poller calls.
//!
//! routes:
//!     GET  /            html page, reloads itself every poll period
//!     GET  /api/view    json snapshot of the page
//!     POST /thresholds  threshold form submit, redirects back to /
//!     POST /visibility  state=hidden|visible
//!
//! ==============================================================================

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domain::Metric;
use crate::page::{render_html, Page, PageView};
use crate::poller::AutoUpdate;
use crate::view::DashboardView;

/// shared between all handlers
pub struct Dashboard {
    pub poller: AutoUpdate,
    pub page: Arc<PageView>,
}

type SharedDashboard = Arc<Dashboard>;

pub fn router(dashboard: SharedDashboard) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/api/view", get(view_handler))
        .route("/thresholds", post(thresholds_handler))
        .route("/visibility", post(visibility_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(dashboard)
}

pub async fn serve(listener: tokio::net::TcpListener, dashboard: SharedDashboard) -> anyhow::Result<()> {
    axum::serve(listener, router(dashboard)).await?;
    Ok(())
}

async fn page_handler(State(dashboard): State<SharedDashboard>) -> Response {
    let refresh_secs = (dashboard.poller.period().as_millis() as u64)
        .div_ceil(1000)
        .max(1);
    match render_html(&dashboard.page.snapshot(), refresh_secs) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render page");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Serialize)]
struct ViewResponse {
    auto_update: bool,
    page: Page,
}

async fn view_handler(State(dashboard): State<SharedDashboard>) -> Json<ViewResponse> {
    Json(ViewResponse {
        auto_update: dashboard.poller.is_running(),
        page: dashboard.page.snapshot(),
    })
}

/// raw form text; parsing is the controller's job
#[derive(Deserialize)]
struct ThresholdForm {
    temperature: String,
    humidity: String,
    water_level: String,
}

async fn thresholds_handler(
    State(dashboard): State<SharedDashboard>,
    Form(form): Form<ThresholdForm>,
) -> Redirect {
    let controller = dashboard.poller.controller();
    let view = controller.view();
    view.set_threshold_input(Metric::Temperature, &form.temperature);
    view.set_threshold_input(Metric::Humidity, &form.humidity);
    view.set_threshold_input(Metric::WaterLevel, &form.water_level);

    // outcome is reported on the page as a notification
    let _ = controller.post_thresholds().await;
    Redirect::to("/")
}

#[derive(Deserialize)]
struct VisibilityForm {
    state: String,
}

async fn visibility_handler(
    State(dashboard): State<SharedDashboard>,
    Form(form): Form<VisibilityForm>,
) -> Response {
    match form.state.as_str() {
        "hidden" => dashboard.poller.set_visible(false),
        "visible" => dashboard.poller.set_visible(true),
        other => {
            tracing::warn!(state = %other, "unknown visibility state");
            return (StatusCode::BAD_REQUEST, "state must be hidden or visible").into_response();
        }
    }
    StatusCode::NO_CONTENT.into_response()
}
