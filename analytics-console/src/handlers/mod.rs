pub mod app;
pub mod auth;
pub mod dashboard;
pub mod layout;
pub mod metrics;
pub mod permissions;
pub mod reports;

/// Shown when a page could not load its data and fell back to empty values.
pub const LOAD_FAILED_NOTICE: &str =
    "We couldn't load the latest data. Figures below may be empty; try refreshing.";
