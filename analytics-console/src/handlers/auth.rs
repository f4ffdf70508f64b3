use crate::services::metrics::record_decrypt_failure;
use crate::services::{BackendError, Caller};
use crate::session::{open_bundle, SessionContext};
use crate::utils::validation::{LoginErrors, LoginForm};
use crate::AppState;
use askama::Template;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use service_core::error::AppError;
use service_core::observability::extract_request_id;
use tower_sessions::Session;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const BACKEND_UNAVAILABLE: &str =
    "The analytics service is unavailable right now. Please try again later.";
pub const SESSION_FAILED: &str = "We couldn't start your session. Please try again.";

#[derive(Template, Default)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub email: String,
    pub email_error: Option<&'static str>,
    pub password_error: Option<&'static str>,
    pub alert: Option<&'static str>,
}

impl LoginTemplate {
    fn rejected(email: &str, errors: LoginErrors) -> Self {
        Self {
            email: email.to_string(),
            email_error: errors.email,
            password_error: errors.password,
            alert: None,
        }
    }

    fn alert(email: &str, alert: &'static str) -> Self {
        Self {
            email: email.to_string(),
            alert: Some(alert),
            ..Default::default()
        }
    }
}

pub async fn login_page() -> impl IntoResponse {
    LoginTemplate::default()
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.normalized_email();

    if let Err(errors) = form.validate() {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            LoginTemplate::rejected(email, errors),
        )
            .into_response());
    }

    let request_id = extract_request_id(&headers);
    let login = match state
        .backend
        .login(email, &form.password, request_id.as_deref())
        .await
    {
        Ok(login) => login,
        Err(BackendError::Unauthorized) | Err(BackendError::Rejected(_)) => {
            tracing::info!(email = %email, "Login rejected");
            return Ok((
                StatusCode::UNAUTHORIZED,
                LoginTemplate::alert(email, INVALID_CREDENTIALS),
            )
                .into_response());
        }
        Err(e) => {
            tracing::error!(error = %e, "Login request failed");
            return Ok((
                StatusCode::BAD_GATEWAY,
                LoginTemplate::alert(email, BACKEND_UNAVAILABLE),
            )
                .into_response());
        }
    };

    // The bundle must open before the session is written.
    let role = match open_bundle(&login.rl, state.role_key()) {
        Ok(role) => role,
        Err(e) => {
            record_decrypt_failure();
            tracing::error!(email = %email, "Login role bundle rejected: {}", e);
            return Ok((
                StatusCode::BAD_GATEWAY,
                LoginTemplate::alert(email, SESSION_FAILED),
            )
                .into_response());
        }
    };

    SessionContext::new(session).establish(&login).await?;

    tracing::info!(
        email = %login.user.email,
        role = %role.role,
        "User logged in successfully"
    );

    Ok(Redirect::to("/dashboard").into_response())
}

pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
) -> impl IntoResponse {
    let context = SessionContext::new(session);

    // Get access token before clearing session
    match context.token().await {
        Ok(Some(token)) => {
            let request_id = extract_request_id(&headers);
            let caller = Caller {
                token: &token,
                request_id: request_id.as_deref(),
            };
            // We don't fail the logout if this fails - just log the error
            if let Err(e) = state.backend.logout(caller).await {
                tracing::error!("Failed to revoke token during logout: {}", e);
            } else {
                tracing::info!("Token revoked successfully");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::error!("Failed to read session during logout: {}", e),
    }

    // Clear session regardless of token revocation result
    context.end().await;

    Redirect::to("/login")
}
