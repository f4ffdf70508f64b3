pub mod date_range;
pub mod metrics;
pub mod report;
pub mod role;
pub mod user;

pub use date_range::{DashboardQuery, DateRange, ReportQuery};
pub use metrics::{
    AbandonedCallRow, DashboardMetrics, SkillReportRow, VdnReportRow, ZoomUsageRow,
};
pub use report::ReportKind;
pub use role::{Permissions, Role, RoleName};
pub use user::{LoginData, RoleBundle, UserAttributes};
