use crate::models::role::feature;

/// The four report pages. Each one has its own backend endpoint and gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    ZoomUsage,
    AbandonedCalls,
    Skills,
    Vdn,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::ZoomUsage,
        ReportKind::AbandonedCalls,
        ReportKind::Skills,
        ReportKind::Vdn,
    ];

    /// Path segment shared by the console route and the backend endpoint.
    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::ZoomUsage => "zoom-usage",
            ReportKind::AbandonedCalls => "abandoned-calls",
            ReportKind::Skills => "skills",
            ReportKind::Vdn => "vdn",
        }
    }

    pub fn endpoint(self) -> String {
        format!("/reports/{}", self.slug())
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportKind::ZoomUsage => "Zoom Phone Usage",
            ReportKind::AbandonedCalls => "Abandoned Calls",
            ReportKind::Skills => "Skill Report",
            ReportKind::Vdn => "VDN Report",
        }
    }

    pub fn feature(self) -> &'static str {
        match self {
            ReportKind::ZoomUsage => feature::ZOOM_USAGE,
            ReportKind::AbandonedCalls => feature::ABANDONED_CALLS,
            ReportKind::Skills => feature::SKILL_REPORT,
            ReportKind::Vdn => feature::VDN_REPORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_follow_slugs() {
        assert_eq!(ReportKind::AbandonedCalls.endpoint(), "/reports/abandoned-calls");
        assert_eq!(ReportKind::Vdn.feature(), "vdn_report");
    }
}
