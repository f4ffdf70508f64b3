use crate::session::SessionContext;
use axum::{
    body::Body,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

/// Sends anonymous visitors of the protected routes to the login page before
/// any handler runs.
pub async fn auth_middleware(session: Session, request: Request<Body>, next: Next) -> Response {
    match SessionContext::new(session).token().await {
        Ok(Some(_)) => next.run(request).await,
        Ok(None) => Redirect::to("/login").into_response(),
        Err(e) => {
            tracing::error!("Failed to read session: {}", e);
            Redirect::to("/login").into_response()
        }
    }
}
