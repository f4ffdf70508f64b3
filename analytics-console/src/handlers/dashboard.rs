use crate::handlers::layout::PageChrome;
use crate::handlers::LOAD_FAILED_NOTICE;
use crate::models::metrics::{format_duration, format_percent};
use crate::models::role::{action, feature};
use crate::models::{DashboardMetrics, DashboardQuery, DateRange};
use crate::services::BackendError;
use crate::session::Authenticated;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use service_core::error::AppError;

pub struct MetricCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub chrome: PageChrome,
    pub from: String,
    pub to: String,
    pub notices: Vec<&'static str>,
    pub cards: Vec<MetricCard>,
}

pub fn metric_cards(metrics: &DashboardMetrics) -> Vec<MetricCard> {
    vec![
        MetricCard {
            label: "Total calls",
            value: metrics.total_calls.to_string(),
        },
        MetricCard {
            label: "Answered",
            value: metrics.answered_calls.to_string(),
        },
        MetricCard {
            label: "Abandoned",
            value: metrics.abandoned_calls.to_string(),
        },
        MetricCard {
            label: "Answer rate",
            value: format_percent(metrics.answer_rate()),
        },
        MetricCard {
            label: "Abandon rate",
            value: format_percent(metrics.abandon_rate()),
        },
        MetricCard {
            label: "Avg wait",
            value: format_duration(metrics.avg_wait_seconds),
        },
        MetricCard {
            label: "Avg handle time",
            value: format_duration(metrics.avg_handle_seconds),
        },
        MetricCard {
            label: "Service level",
            value: format_percent(metrics.service_level),
        },
        MetricCard {
            label: "Agents online",
            value: metrics.agents_online.to_string(),
        },
        MetricCard {
            label: "Zoom minutes",
            value: format!("{:.0}", metrics.zoom_minutes.max(0.0)),
        },
    ]
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, AppError> {
    auth.require(feature::DASHBOARD, action::VIEW)?;

    let (range, range_notice) = DateRange::resolve(
        query.from.as_deref(),
        query.to.as_deref(),
        state.report_defaults,
    );
    let mut notices: Vec<&'static str> = range_notice.into_iter().collect();

    let metrics = match state.backend.dashboard(auth.caller(), range).await {
        Ok(metrics) => metrics,
        Err(BackendError::Unauthorized) => return Ok(auth.expire().await),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load dashboard metrics");
            notices.push(LOAD_FAILED_NOTICE);
            DashboardMetrics::default()
        }
    };

    Ok(DashboardTemplate {
        chrome: PageChrome::new(&auth, "/dashboard"),
        from: range.from_label(),
        to: range.to_label(),
        notices,
        cards: metric_cards(&metrics),
    }
    .into_response())
}
