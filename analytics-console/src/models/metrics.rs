//! Display DTOs for dashboard and report payloads. The backend owns their
//! shape; every field is optional on the wire and defaults to zero/empty.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardMetrics {
    pub total_calls: u64,
    pub answered_calls: u64,
    pub abandoned_calls: u64,
    pub avg_wait_seconds: f64,
    pub avg_handle_seconds: f64,
    /// Percentage, 0-100.
    pub service_level: f64,
    pub agents_online: u64,
    pub zoom_minutes: f64,
}

impl DashboardMetrics {
    pub fn answer_rate(&self) -> f64 {
        percentage(self.answered_calls, self.total_calls)
    }

    pub fn abandon_rate(&self) -> f64 {
        percentage(self.abandoned_calls, self.total_calls)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoomUsageRow {
    pub user_name: String,
    pub extension: String,
    pub inbound_calls: u64,
    pub outbound_calls: u64,
    pub total_minutes: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbandonedCallRow {
    pub call_id: String,
    pub caller_number: String,
    pub queue: String,
    pub wait_seconds: f64,
    pub abandoned_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillReportRow {
    pub skill: String,
    pub offered: u64,
    pub answered: u64,
    pub abandoned: u64,
    pub avg_speed_of_answer: f64,
    pub service_level: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VdnReportRow {
    pub vdn: String,
    pub name: String,
    pub inbound: u64,
    pub flow_out: u64,
    pub abandoned: u64,
    pub avg_talk_seconds: f64,
}

pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// `m:ss`, or `h:mm:ss` from an hour up. Negative and non-finite input renders as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

pub fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}%", value)
    } else {
        "0.0%".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_zero() {
        let metrics: DashboardMetrics =
            serde_json::from_str(r#"{"totalCalls":120,"answeredCalls":90}"#).unwrap();
        assert_eq!(metrics.total_calls, 120);
        assert_eq!(metrics.abandoned_calls, 0);
        assert_eq!(metrics.agents_online, 0);
    }

    #[test]
    fn rates_handle_empty_periods() {
        let metrics = DashboardMetrics::default();
        assert_eq!(metrics.answer_rate(), 0.0);
        assert_eq!(metrics.abandon_rate(), 0.0);

        let metrics = DashboardMetrics {
            total_calls: 200,
            answered_calls: 150,
            abandoned_calls: 50,
            ..Default::default()
        };
        assert_eq!(metrics.answer_rate(), 75.0);
        assert_eq!(metrics.abandon_rate(), 25.0);
    }

    #[test]
    fn durations_render_as_clock() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(65.4), "1:05");
        assert_eq!(format_duration(3725.0), "1:02:05");
        assert_eq!(format_duration(-3.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(format_percent(80.0), "80.0%");
        assert_eq!(format_percent(33.333), "33.3%");
        assert_eq!(format_percent(f64::INFINITY), "0.0%");
    }

    #[test]
    fn report_rows_tolerate_partial_payloads() {
        let rows: Vec<SkillReportRow> =
            serde_json::from_str(r#"[{"skill":"Billing","offered":10},{}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].skill, "Billing");
        assert_eq!(rows[1], SkillReportRow::default());
    }
}
