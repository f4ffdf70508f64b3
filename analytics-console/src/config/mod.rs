use crate::models::date_range::DateRange;
use chrono::NaiveDate;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config::TelemetrySettings;
use std::path::Path;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub backend: BackendSettings,
    #[serde(default)]
    pub reports: ReportSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Sessions expire after this many hours without a request.
    #[serde(default = "default_session_inactivity_hours")]
    pub session_inactivity_hours: i64,
    /// Set to true in production with HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_session_inactivity_hours() -> i64 {
    8
}

fn default_static_dir() -> String {
    "analytics-console/static".to_string()
}

#[derive(Deserialize, Clone)]
pub struct BackendSettings {
    /// Base URL of the analytics API (e.g. http://analytics-api:8080/api).
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Key material used when the login bundle doesn't carry its own.
    #[serde(default)]
    pub role_key: Option<Secret<String>>,
}

fn default_timeout_secs() -> u64 {
    15
}

/// Literal dates every report page starts from.
#[derive(Deserialize, Clone, Debug)]
pub struct ReportSettings {
    #[serde(default = "default_start")]
    pub default_start: NaiveDate,
    #[serde(default = "default_end")]
    pub default_end: NaiveDate,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            default_start: default_start(),
            default_end: default_end(),
        }
    }
}

impl ReportSettings {
    pub fn default_range(&self) -> Option<DateRange> {
        DateRange::new(self.default_start, self.default_end)
    }
}

fn default_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

fn default_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 31).unwrap_or_default()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {}", e))
    })?;

    // Check if we're already in analytics-console directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("analytics-console") {
        base_path.join("config")
    } else {
        base_path.join("analytics-console").join("config")
    };

    load_from(&configuration_directory)
}

pub fn load_from(configuration_directory: &Path) -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    check(&settings)?;

    Ok(settings)
}

/// Upper bound for `server.session_inactivity_hours` (one year).
pub const MAX_SESSION_INACTIVITY_HOURS: i64 = 24 * 365;

fn check(settings: &Settings) -> Result<(), config::ConfigError> {
    if settings.reports.default_range().is_none() {
        return Err(config::ConfigError::Message(
            "reports.default_start must not be after reports.default_end".to_string(),
        ));
    }

    let hours = settings.server.session_inactivity_hours;
    if !(1..=MAX_SESSION_INACTIVITY_HOURS).contains(&hours) {
        return Err(config::ConfigError::Message(format!(
            "server.session_inactivity_hours must be between 1 and {}, got {}",
            MAX_SESSION_INACTIVITY_HOURS, hours
        )));
    }

    Ok(())
}
