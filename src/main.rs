//! ==============================================================================
//! main.rs - espmonitor dashboard host entry point
//! ==============================================================================
//!
//! purpose:
//!     keeps a live view of the espmonitor backend: the esp32 nodes post
//!     readings to the backend, this host polls it and serves the page.
//!
//! responsibilities:
//!     - load monitor.toml (or defaults)
//!     - initialise tracing
//!     - build the api client, the page and the controller
//!     - start auto update (one-shot load, then every poll period)
//!     - serve the dashboard until ctrl-c, then stop the timer
//!
//! relationships:
//!     - uses: config.rs, api.rs, controller.rs, page.rs, poller.rs, server.rs
//!
//! architecture:
//!
//!     ┌────────────────────────────────────────────────────────────┐
//!     │                     rust host (this file)                  │
//!     │  ┌──────────────┐   ┌──────────────┐   ┌───────────────┐   │
//!     │  │ auto update  │──▶│  controller  │──▶│   page view   │   │
//!     │  │ (5s ticks)   │   │ (thresholds) │   │ (element ids) │   │
//!     │  └──────────────┘   └──────┬───────┘   └───────┬───────┘   │
//!     │                            │                   │           │
//!     │                            │            ┌──────┴───────┐   │
//!     │                            │            │  web server  │   │
//!     │                            │            │ (port 3000)  │   │
//!     │                            │            └──────────────┘   │
//!     └────────────────────────────┼───────────────────────────────┘
//!                                  │ http (reqwest)
//!                          ┌───────┴────────┐
//!                          │ espmonitor api │
//!                          └────────────────┘
//!
//! ==============================================================================

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use espmonitor_dashboard::api::HttpApi;
use espmonitor_dashboard::config::MonitorConfig;
use espmonitor_dashboard::controller::Controller;
use espmonitor_dashboard::page::PageView;
use espmonitor_dashboard::poller::AutoUpdate;
use espmonitor_dashboard::server::{self, Dashboard};

#[tokio::main]
async fn main() -> Result<()> {
    // step 1: load configuration. the config loader logs, so install a
    // subscriber first using RUST_LOG, falling back to info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().ok();
    let explicit_filter = filter.is_some();
    let (filter_layer, reload) = tracing_subscriber::reload::Layer::new(
        filter.unwrap_or_else(|| tracing_subscriber::EnvFilter::new("info")),
    );
    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = MonitorConfig::load_or_default();
    if !explicit_filter {
        let configured = tracing_subscriber::EnvFilter::try_new(&config.logging.level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        if let Err(e) = reload.reload(configured) {
            tracing::warn!(error = %e, "could not apply configured log level");
        }
    }
    config.log_summary();

    // step 2: wire controller to backend and page
    let api = Arc::new(HttpApi::new(config.api.base_url.clone()));
    let page = Arc::new(PageView::new());
    let controller = Arc::new(
        Controller::new(api, page.clone())
            .with_history_limit(config.polling.history_limit)
            .with_sensor_logging(config.logging.show_sensor_data),
    );
    let dashboard = Arc::new(Dashboard {
        poller: AutoUpdate::new(controller, config.polling.interval()),
        page,
    });

    // step 3: bind before polling so a bad address fails fast
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "Dashboard live");

    // step 4: start polling
    dashboard.poller.start();

    // step 5: serve until ctrl-c
    let server_dashboard = dashboard.clone();
    tokio::select! {
        result = server::serve(listener, server_dashboard) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Web server error");
                dashboard.poller.stop();
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    dashboard.poller.stop();
    Ok(())
}
