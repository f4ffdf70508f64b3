use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive date window sent to the backend as `{ "from": .., "to": .. }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// `None` when `from` is after `to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        (from <= to).then_some(Self { from, to })
    }

    pub fn from_label(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    pub fn to_label(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }

    /// Resolves raw filter input against the page defaults.
    ///
    /// Blank input keeps the default for that end. Unparseable dates or an
    /// inverted window fall back to `defaults` entirely, with a notice for the page.
    pub fn resolve(
        from: Option<&str>,
        to: Option<&str>,
        defaults: DateRange,
    ) -> (DateRange, Option<&'static str>) {
        let from = match parse_optional(from) {
            Ok(date) => date.unwrap_or(defaults.from),
            Err(()) => return (defaults, Some(INVALID_DATE_NOTICE)),
        };
        let to = match parse_optional(to) {
            Ok(date) => date.unwrap_or(defaults.to),
            Err(()) => return (defaults, Some(INVALID_DATE_NOTICE)),
        };

        match DateRange::new(from, to) {
            Some(range) => (range, None),
            None => (defaults, Some(INVERTED_RANGE_NOTICE)),
        }
    }
}

pub const INVALID_DATE_NOTICE: &str = "Dates must use the YYYY-MM-DD format; showing the default range.";
pub const INVERTED_RANGE_NOTICE: &str = "The start date is after the end date; showing the default range.";

fn parse_optional(raw: Option<&str>) -> Result<Option<NaiveDate>, ()> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map(Some)
            .map_err(|_| ()),
    }
}

/// `?from=..&to=..` as used by the dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// `?startDate=..&endDate=..` as used by the report pages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn defaults() -> DateRange {
        DateRange::new(date("2024-01-01"), date("2024-01-31")).unwrap()
    }

    #[test]
    fn blank_input_uses_defaults() {
        let (range, notice) = DateRange::resolve(None, Some(""), defaults());
        assert_eq!(range, defaults());
        assert!(notice.is_none());
    }

    #[test]
    fn partial_input_overrides_one_end() {
        let (range, notice) = DateRange::resolve(Some("2024-01-15"), None, defaults());
        assert_eq!(range.from, date("2024-01-15"));
        assert_eq!(range.to, date("2024-01-31"));
        assert!(notice.is_none());
    }

    #[test]
    fn garbage_falls_back_with_notice() {
        let (range, notice) = DateRange::resolve(Some("01/15/2024"), None, defaults());
        assert_eq!(range, defaults());
        assert_eq!(notice, Some(INVALID_DATE_NOTICE));
    }

    #[test]
    fn inverted_window_falls_back_with_notice() {
        let (range, notice) =
            DateRange::resolve(Some("2024-03-01"), Some("2024-02-01"), defaults());
        assert_eq!(range, defaults());
        assert_eq!(notice, Some(INVERTED_RANGE_NOTICE));
    }

    #[test]
    fn single_day_window_is_valid() {
        assert!(DateRange::new(date("2024-05-05"), date("2024-05-05")).is_some());
    }

    #[test]
    fn serializes_as_from_to_strings() {
        let json = serde_json::to_value(defaults()).unwrap();
        assert_eq!(json, serde_json::json!({"from": "2024-01-01", "to": "2024-01-31"}));
        assert_eq!(defaults().from_label(), "2024-01-01");
    }
}
