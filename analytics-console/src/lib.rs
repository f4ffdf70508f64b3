pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod startup;
pub mod utils;

use models::DateRange;
use secrecy::Secret;
use services::BackendClient;
use std::sync::Arc;

/// Shared application state: the backend client plus read-only settings.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendClient>,
    pub report_defaults: DateRange,
    role_key: Option<Arc<Secret<String>>>,
}

impl AppState {
    pub fn new(
        backend: Arc<BackendClient>,
        report_defaults: DateRange,
        role_key: Option<Secret<String>>,
    ) -> Self {
        Self {
            backend,
            report_defaults,
            role_key: role_key.map(Arc::new),
        }
    }

    /// Configured key material for bundles that arrive without their own.
    pub fn role_key(&self) -> Option<&Secret<String>> {
        self.role_key.as_deref()
    }
}
