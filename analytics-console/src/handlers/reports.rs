use crate::handlers::layout::PageChrome;
use crate::handlers::LOAD_FAILED_NOTICE;
use crate::models::metrics::{format_duration, format_percent};
use crate::models::role::action;
use crate::models::{
    AbandonedCallRow, DateRange, ReportKind, ReportQuery, SkillReportRow, VdnReportRow,
    ZoomUsageRow,
};
use crate::services::BackendError;
use crate::session::Authenticated;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use service_core::error::AppError;

/// A row type that knows which report it belongs to and how to lay itself out.
pub trait ReportRow: DeserializeOwned {
    const KIND: ReportKind;

    fn headers() -> &'static [&'static str];

    fn cells(&self) -> Vec<String>;
}

impl ReportRow for ZoomUsageRow {
    const KIND: ReportKind = ReportKind::ZoomUsage;

    fn headers() -> &'static [&'static str] {
        &["User", "Extension", "Inbound", "Outbound", "Minutes"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.user_name.clone(),
            self.extension.clone(),
            self.inbound_calls.to_string(),
            self.outbound_calls.to_string(),
            format!("{:.1}", self.total_minutes),
        ]
    }
}

impl ReportRow for AbandonedCallRow {
    const KIND: ReportKind = ReportKind::AbandonedCalls;

    fn headers() -> &'static [&'static str] {
        &["Call ID", "Caller", "Queue", "Waited", "Abandoned at"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.call_id.clone(),
            self.caller_number.clone(),
            self.queue.clone(),
            format_duration(self.wait_seconds),
            self.abandoned_at.clone(),
        ]
    }
}

impl ReportRow for SkillReportRow {
    const KIND: ReportKind = ReportKind::Skills;

    fn headers() -> &'static [&'static str] {
        &[
            "Skill",
            "Offered",
            "Answered",
            "Abandoned",
            "Avg speed of answer",
            "Service level",
        ]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.skill.clone(),
            self.offered.to_string(),
            self.answered.to_string(),
            self.abandoned.to_string(),
            format_duration(self.avg_speed_of_answer),
            format_percent(self.service_level),
        ]
    }
}

impl ReportRow for VdnReportRow {
    const KIND: ReportKind = ReportKind::Vdn;

    fn headers() -> &'static [&'static str] {
        &["VDN", "Name", "Inbound", "Flow out", "Abandoned", "Avg talk time"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.vdn.clone(),
            self.name.clone(),
            self.inbound.to_string(),
            self.flow_out.to_string(),
            self.abandoned.to_string(),
            format_duration(self.avg_talk_seconds),
        ]
    }
}

#[derive(Template)]
#[template(path = "reports/table.html")]
pub struct ReportTemplate {
    pub chrome: PageChrome,
    pub title: &'static str,
    pub form_action: String,
    pub start_date: String,
    pub end_date: String,
    pub notices: Vec<&'static str>,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

async fn render_report<R: ReportRow>(
    state: AppState,
    auth: Authenticated,
    query: ReportQuery,
) -> Result<Response, AppError> {
    let kind = R::KIND;
    auth.require(kind.feature(), action::VIEW)?;

    let (range, range_notice) = DateRange::resolve(
        query.start_date.as_deref(),
        query.end_date.as_deref(),
        state.report_defaults,
    );
    let mut notices: Vec<&'static str> = range_notice.into_iter().collect();

    let rows: Vec<R> = match state.backend.report(auth.caller(), kind, range).await {
        Ok(rows) => rows,
        Err(BackendError::Unauthorized) => return Ok(auth.expire().await),
        Err(e) => {
            tracing::error!(report = kind.slug(), error = %e, "Failed to load report");
            notices.push(LOAD_FAILED_NOTICE);
            Vec::new()
        }
    };

    let path = format!("/reports/{}", kind.slug());
    Ok(ReportTemplate {
        chrome: PageChrome::new(&auth, &path),
        title: kind.title(),
        form_action: path,
        start_date: range.from_label(),
        end_date: range.to_label(),
        notices,
        headers: R::headers(),
        rows: rows.iter().map(ReportRow::cells).collect(),
    }
    .into_response())
}

pub async fn zoom_usage_report(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    render_report::<ZoomUsageRow>(state, auth, query).await
}

pub async fn abandoned_calls_report(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    render_report::<AbandonedCallRow>(state, auth, query).await
}

pub async fn skill_report(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    render_report::<SkillReportRow>(state, auth, query).await
}

pub async fn vdn_report(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    render_report::<VdnReportRow>(state, auth, query).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_aligned<R: ReportRow + Default>() {
        assert_eq!(R::headers().len(), R::default().cells().len());
    }

    #[test]
    fn every_report_has_one_cell_per_header() {
        assert_aligned::<ZoomUsageRow>();
        assert_aligned::<AbandonedCallRow>();
        assert_aligned::<SkillReportRow>();
        assert_aligned::<VdnReportRow>();
    }

    #[test]
    fn abandoned_call_cells_format_wait() {
        let row = AbandonedCallRow {
            call_id: "c-1".to_string(),
            wait_seconds: 42.0,
            ..Default::default()
        };
        assert_eq!(row.cells()[3], "0:42");
    }
}
