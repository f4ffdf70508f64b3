//! HTTP client for the analytics backend API.
//!
//! Every response uses the `{ "success": bool, "data": .. }` envelope. Calls
//! are awaited one at a time by the page that needs them: no retries, no
//! deduplication, no cancellation.

use crate::config::BackendSettings;
use crate::models::{
    DashboardMetrics, DateRange, LoginData, Permissions, ReportKind, Role,
};
use crate::services::metrics::record_backend_failure;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use service_core::observability::{TracedClientExt, TracedRequest};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("backend rejected the credentials")]
    Unauthorized,

    #[error("backend returned HTTP {0}")]
    Status(StatusCode),

    #[error("backend reported failure: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),

    #[error("backend response carried no data")]
    MissingData,

    #[error("unreadable backend response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    // Missing and null both land as None.
    data: Option<T>,
    message: Option<String>,
}

/// Who a backend call is made for.
#[derive(Debug, Clone, Copy)]
pub struct Caller<'a> {
    pub token: &'a str,
    pub request_id: Option<&'a str>,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct PermissionsUpdate<'a> {
    permissions: &'a Permissions,
}

pub struct BackendClient {
    client: Client,
    settings: BackendSettings,
}

impl BackendClient {
    pub fn new(settings: BackendSettings) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(BackendError::Transport)?;

        Ok(Self { client, settings })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url.trim_end_matches('/'), path)
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
        request_id: Option<&str>,
    ) -> Result<LoginData, BackendError> {
        let request = self
            .client
            .traced_post(&self.url("/auth/login"))
            .json(&Credentials { email, password });

        self.call("/auth/login", request, request_id).await
    }

    /// Best effort; the caller ends the session regardless of the outcome.
    pub async fn logout(&self, caller: Caller<'_>) -> Result<(), BackendError> {
        let path = "/auth/logout";
        let response = self
            .client
            .traced_post(&self.url(path))
            .bearer_auth(caller.token)
            .send_with_request_id(caller.request_id)
            .await
            .map_err(|e| self.failed(path, BackendError::Transport(e)))?;

        check_status(response)
            .map(|_| ())
            .map_err(|e| self.failed(path, e))
    }

    pub async fn dashboard(
        &self,
        caller: Caller<'_>,
        range: DateRange,
    ) -> Result<DashboardMetrics, BackendError> {
        let request = self
            .client
            .traced_post(&self.url("/dashboard"))
            .bearer_auth(caller.token)
            .json(&range);

        self.call("/dashboard", request, caller.request_id).await
    }

    pub async fn report<T: DeserializeOwned>(
        &self,
        caller: Caller<'_>,
        kind: ReportKind,
        range: DateRange,
    ) -> Result<Vec<T>, BackendError> {
        let path = kind.endpoint();
        let request = self
            .client
            .traced_post(&self.url(&path))
            .bearer_auth(caller.token)
            .json(&range);

        self.call(&path, request, caller.request_id).await
    }

    pub async fn roles(&self, caller: Caller<'_>) -> Result<Vec<Role>, BackendError> {
        let request = self
            .client
            .traced_get(&self.url("/roles"))
            .bearer_auth(caller.token);

        self.call("/roles", request, caller.request_id).await
    }

    pub async fn update_permissions(
        &self,
        caller: Caller<'_>,
        role_id: i64,
        permissions: &Permissions,
    ) -> Result<Role, BackendError> {
        let path = format!("/roles/{}/permissions", role_id);
        let request = self
            .client
            .traced_put(&self.url(&path))
            .bearer_auth(caller.token)
            .json(&PermissionsUpdate { permissions });

        // Metric label stays low-cardinality.
        self.call("/roles/:id/permissions", request, caller.request_id)
            .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: TracedRequest,
        request_id: Option<&str>,
    ) -> Result<T, BackendError> {
        let result = async {
            let response = request
                .send_with_request_id(request_id)
                .await
                .map_err(BackendError::Transport)?;
            let response = check_status(response)?;
            let envelope: Envelope<T> = response.json().await.map_err(BackendError::Decode)?;
            envelope.into_data()
        }
        .await;

        result.map_err(|e| self.failed(endpoint, e))
    }

    fn failed(&self, endpoint: &str, error: BackendError) -> BackendError {
        record_backend_failure(endpoint);
        tracing::warn!(endpoint = %endpoint, error = %error, "Backend call failed");
        error
    }
}

fn check_status(response: Response) -> Result<Response, BackendError> {
    match response.status() {
        StatusCode::UNAUTHORIZED => Err(BackendError::Unauthorized),
        status if status.is_success() => Ok(response),
        status => Err(BackendError::Status(status)),
    }
}

impl<T> Envelope<T> {
    fn into_data(self) -> Result<T, BackendError> {
        if !self.success {
            return Err(BackendError::Rejected(self.message));
        }
        self.data.ok_or(BackendError::MissingData)
    }
}
