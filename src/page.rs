//! ==============================================================================
//! page.rs - in-memory dashboard page
//! ==============================================================================
//!
//! purpose:
//!     the concrete DashboardView. every element the controller writes is
//!     kept by id (text, input value, class list) together with the history
//!     table body and the notifications raised so far.
//!
//! relationships:
//!     - implements: view.rs (DashboardView)
//!     - used by: server.rs (html page + json snapshot), controller tests
//!
//! ==============================================================================

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Write as _};

use crate::domain::{ConnectionStatus, Metric, Thresholds};
use crate::view::{
    ids, text, DashboardView, HistoryRow, Notification, NotificationLevel, StatKind,
    HISTORY_COLUMNS,
};

/// most recent notifications kept for the page
const NOTIFICATION_BACKLOG: usize = 16;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Element {
    pub text: String,
    /// form value, only meaningful for inputs
    #[serde(skip_serializing_if = "String::is_empty")]
    pub value: String,
    pub classes: BTreeSet<String>,
}

impl Element {
    fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    fn with_class(mut self, class: &str) -> Self {
        self.classes.insert(class.to_string());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    pub elements: BTreeMap<String, Element>,
    pub history: Vec<HistoryRow>,
    pub notifications: Vec<Notification>,
}

impl Page {
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    pub fn text(&self, id: &str) -> &str {
        self.element(id).map(|e| e.text.as_str()).unwrap_or("")
    }

    /// read back from the indicator's class list, it is the only storage
    pub fn connection_status(&self) -> ConnectionStatus {
        match self.element(ids::CONNECTION_STATUS) {
            Some(e) if e.has_class("online") => ConnectionStatus::Online,
            Some(e) if e.has_class("offline") => ConnectionStatus::Offline,
            _ => ConnectionStatus::Unknown,
        }
    }

    pub fn card_alerted(&self, metric: Metric) -> bool {
        self.element(metric.card_id())
            .map(|e| e.has_class("alert"))
            .unwrap_or(false)
    }

    pub fn last_notification(&self) -> Option<&Notification> {
        self.notifications.last()
    }

    fn element_mut(&mut self, id: &str) -> &mut Element {
        self.elements.entry(id.to_string()).or_default()
    }
}

impl Default for Page {
    /// the page as first served: placeholders, default thresholds in the form
    fn default() -> Self {
        let mut elements = BTreeMap::new();
        let defaults = Thresholds::default();

        for metric in Metric::ALL {
            elements.insert(metric.value_id().to_string(), Element::with_text("--"));
            elements.insert(
                metric.card_id().to_string(),
                Element::default().with_class("card"),
            );
            elements.insert(
                metric.input_id().to_string(),
                Element {
                    value: defaults.limit(metric).to_string(),
                    ..Element::default()
                },
            );
            elements.insert(
                metric.threshold_display_id().to_string(),
                Element::with_text(&defaults.limit(metric).to_string()),
            );
            for kind in StatKind::ALL {
                elements.insert(metric.stat_id(kind), Element::with_text("--"));
            }
        }
        elements.insert(ids::LAST_UPDATE.to_string(), Element::default());
        elements.insert(
            ids::CONNECTION_STATUS.to_string(),
            Element::with_text(text::UNKNOWN).with_class("status-indicator"),
        );

        Self {
            elements,
            history: vec![placeholder_row()],
            notifications: Vec::new(),
        }
    }
}

pub(crate) fn placeholder_row() -> HistoryRow {
    HistoryRow::Placeholder {
        colspan: HISTORY_COLUMNS,
        text: text::NO_DATA.to_string(),
    }
}

/// shared, lock-protected page; locks are never held across an await
#[derive(Default)]
pub struct PageView {
    page: RwLock<Page>,
}

impl PageView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Page {
        self.page.read().clone()
    }
}

impl DashboardView for PageView {
    fn set_metric_value(&self, metric: Metric, text: &str) {
        self.page.write().element_mut(metric.value_id()).text = text.to_string();
    }

    fn set_last_update(&self, text: &str) {
        self.page.write().element_mut(ids::LAST_UPDATE).text = text.to_string();
    }

    fn set_connection_status(&self, status: ConnectionStatus) {
        let mut page = self.page.write();
        let element = page.element_mut(ids::CONNECTION_STATUS);
        let (label, class) = match status {
            ConnectionStatus::Online => (text::ONLINE, Some("online")),
            ConnectionStatus::Offline => (text::OFFLINE, Some("offline")),
            ConnectionStatus::Unknown => (text::UNKNOWN, None),
        };
        element.text = label.to_string();
        element.classes.clear();
        element.classes.insert("status-indicator".to_string());
        if let Some(class) = class {
            element.classes.insert(class.to_string());
        }
    }

    fn set_card_alert(&self, metric: Metric, alert: bool) {
        let mut page = self.page.write();
        let card = page.element_mut(metric.card_id());
        if alert {
            card.classes.insert("alert".to_string());
        } else {
            card.classes.remove("alert");
        }
    }

    fn threshold_input(&self, metric: Metric) -> String {
        self.page
            .read()
            .element(metric.input_id())
            .map(|e| e.value.clone())
            .unwrap_or_default()
    }

    fn set_threshold_input(&self, metric: Metric, text: &str) {
        self.page.write().element_mut(metric.input_id()).value = text.to_string();
    }

    fn set_threshold_display(&self, metric: Metric, text: &str) {
        self.page.write().element_mut(metric.threshold_display_id()).text = text.to_string();
    }

    fn render_history(&self, rows: Vec<HistoryRow>) {
        self.page.write().history = rows;
    }

    fn set_stat(&self, metric: Metric, kind: StatKind, text: &str) {
        self.page.write().element_mut(&metric.stat_id(kind)).text = text.to_string();
    }

    fn notify(&self, notification: Notification) {
        let mut page = self.page.write();
        page.notifications.push(notification);
        let excess = page.notifications.len().saturating_sub(NOTIFICATION_BACKLOG);
        page.notifications.drain(..excess);
    }
}

// ==============================================================================
// html rendering
// ==============================================================================
// bare markup carrying the element ids. the page reloads itself every
// `refresh_secs` so a browser tab follows the poller.

pub fn render_html(page: &Page, refresh_secs: u64) -> Result<String, fmt::Error> {
    let mut html = String::new();
    write!(
        html,
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<meta http-equiv="refresh" content="{refresh_secs}">
<title>ESPMonitor</title>
</head>
<body>
<h1>ESPMonitor</h1>
"#
    )?;

    let status = page.element(ids::CONNECTION_STATUS);
    writeln!(
        html,
        r#"<span id="{}" class="{}">{}</span>"#,
        ids::CONNECTION_STATUS,
        classes(status),
        html_escape(page.text(ids::CONNECTION_STATUS)),
    )?;
    writeln!(
        html,
        r#"<p id="{}">{}</p>"#,
        ids::LAST_UPDATE,
        html_escape(page.text(ids::LAST_UPDATE)),
    )?;

    html.push_str("<div class=\"data-cards\">\n");
    for metric in Metric::ALL {
        writeln!(
            html,
            r#"<div id="{}" class="{}"><h3>{}</h3><span id="{}">{}</span></div>"#,
            metric.card_id(),
            classes(page.element(metric.card_id())),
            metric.label(),
            metric.value_id(),
            html_escape(page.text(metric.value_id())),
        )?;
    }
    html.push_str("</div>\n");

    if let Some(notification) = page.last_notification() {
        writeln!(
            html,
            r#"<p class="notification {}">{}</p>"#,
            match notification.level {
                NotificationLevel::Success => "success",
                NotificationLevel::Error => "error",
            },
            html_escape(&notification.message),
        )?;
    }

    html.push_str("<form method=\"post\" action=\"/thresholds\">\n");
    for metric in Metric::ALL {
        let value = page
            .element(metric.input_id())
            .map(|e| e.value.as_str())
            .unwrap_or("");
        writeln!(
            html,
            r#"<label>{} <input id="{}" name="{}" type="number" step="0.1" value="{}"></label> <span id="{}">{}</span>"#,
            metric.label(),
            metric.input_id(),
            metric,
            html_escape(value),
            metric.threshold_display_id(),
            html_escape(page.text(metric.threshold_display_id())),
        )?;
    }
    writeln!(
        html,
        r#"<button id="{}" type="submit">更新阈值</button>"#,
        ids::UPDATE_THRESHOLDS
    )?;
    html.push_str("</form>\n");

    html.push_str("<table>\n<tbody>\n");
    for metric in Metric::ALL {
        html.push_str("<tr>");
        write!(html, "<th>{}</th>", metric.label())?;
        for kind in StatKind::ALL {
            let id = metric.stat_id(kind);
            write!(html, r#"<td id="{}">{}</td>"#, id, html_escape(page.text(&id)))?;
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");

    writeln!(html, "<table>\n<tbody id=\"{}\">", ids::HISTORY_BODY)?;
    for row in &page.history {
        match row {
            HistoryRow::Reading { cells } => {
                html.push_str("<tr>");
                for cell in cells {
                    write!(html, "<td>{}</td>", html_escape(cell))?;
                }
                html.push_str("</tr>\n");
            }
            HistoryRow::Placeholder { colspan, text } => {
                writeln!(
                    html,
                    r#"<tr><td colspan="{}" class="no-data">{}</td></tr>"#,
                    colspan,
                    html_escape(text),
                )?;
            }
        }
    }
    html.push_str("</tbody>\n</table>\n</body>\n</html>\n");
    Ok(html)
}

fn classes(element: Option<&Element>) -> String {
    element
        .map(|e| e.classes.iter().cloned().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// escape html special characters to prevent xss
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
