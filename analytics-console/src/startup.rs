use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};
use service_core::observability::REQUEST_ID_HEADER;
use time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::ServerSettings;
use crate::handlers::{
    app::{health_check, index},
    auth::{login_handler, login_page, logout_handler},
    dashboard::dashboard_handler,
    metrics::metrics,
    permissions::{permissions_page, update_permissions_handler},
    reports::{abandoned_calls_report, skill_report, vdn_report, zoom_usage_report},
};
use crate::middleware::{auth::auth_middleware, metrics::metrics_middleware};
use crate::AppState;

pub fn build_router(state: AppState, server: &ServerSettings) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            server.session_inactivity_hours,
        )));

    let protected = Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/reports/zoom-usage", get(zoom_usage_report))
        .route("/reports/abandoned-calls", get(abandoned_calls_report))
        .route("/reports/skills", get(skill_report))
        .route("/reports/vdn", get(vdn_report))
        .route("/admin/permissions", get(permissions_page))
        .route(
            "/admin/permissions/:role_id",
            post(update_permissions_handler),
        )
        .route_layer(from_fn(auth_middleware));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/login", get(login_page).post(login_handler))
        .route("/logout", get(logout_handler))
        .merge(protected)
        .nest_service("/static", ServeDir::new(&server.static_dir))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost so every layer above sees the request id.
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
