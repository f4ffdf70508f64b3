//! Explicit per-user session context.
//!
//! Login writes three keys once: `tk` (bearer token), `rl` (encrypted role
//! bundle) and `user`. Pages read them back through [`Authenticated`]; logout
//! and expiry clear them. Nothing else touches session storage.

use crate::models::{LoginData, Role, RoleBundle, UserAttributes};
use crate::services::metrics::record_decrypt_failure;
use crate::services::Caller;
use crate::utils::crypto::{decrypt_role, DecryptError};
use crate::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use service_core::observability::extract_request_id;
use thiserror::Error;
use tower_sessions::Session;

pub const TOKEN_KEY: &str = "tk";
pub const ROLE_KEY: &str = "rl";
pub const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Store(#[from] tower_sessions::session::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Decrypts a login bundle, preferring the key it carries over the configured one.
pub fn open_bundle(
    bundle: &RoleBundle,
    fallback_key: Option<&Secret<String>>,
) -> Result<Role, DecryptError> {
    let key = bundle
        .key
        .as_deref()
        .or_else(|| fallback_key.map(|k| k.expose_secret().as_str()))
        .ok_or(DecryptError)?;

    decrypt_role(&bundle.ciphertext, &bundle.iv, key)
}

#[derive(Clone)]
pub struct SessionContext {
    session: Session,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Starts a fresh session id and stores the login result.
    pub async fn establish(&self, login: &LoginData) -> Result<(), SessionError> {
        self.session.cycle_id().await?;
        self.session.insert(TOKEN_KEY, &login.token).await?;
        self.session.insert(ROLE_KEY, &login.rl).await?;
        self.session.insert(USER_KEY, &login.user).await?;
        Ok(())
    }

    pub async fn token(&self) -> Result<Option<String>, SessionError> {
        Ok(self.session.get(TOKEN_KEY).await?)
    }

    pub async fn role_bundle(&self) -> Result<Option<RoleBundle>, SessionError> {
        Ok(self.session.get(ROLE_KEY).await?)
    }

    pub async fn user(&self) -> Result<Option<UserAttributes>, SessionError> {
        Ok(self.session.get(USER_KEY).await?)
    }

    /// Rebuilds the signed-in view of the session.
    ///
    /// `None` when any key is missing. A bundle that no longer decrypts ends
    /// the session and also yields `None`.
    pub async fn load(
        &self,
        fallback_key: Option<&Secret<String>>,
    ) -> Result<Option<Authenticated>, SessionError> {
        let (Some(token), Some(bundle), Some(user)) =
            (self.token().await?, self.role_bundle().await?, self.user().await?)
        else {
            return Ok(None);
        };

        match open_bundle(&bundle, fallback_key) {
            Ok(role) => Ok(Some(Authenticated {
                token,
                user,
                role,
                request_id: None,
                session: self.clone(),
            })),
            Err(_) => {
                record_decrypt_failure();
                tracing::warn!("Stored role bundle no longer decrypts; ending session");
                self.end().await;
                Ok(None)
            }
        }
    }

    /// Drops the session data and deletes the record from the store.
    pub async fn end(&self) {
        if let Err(e) = self.session.flush().await {
            tracing::error!("Failed to delete session record: {}", e);
        }
    }
}

/// A signed-in user with their decrypted role.
pub struct Authenticated {
    pub token: String,
    pub user: UserAttributes,
    pub role: Role,
    pub request_id: Option<String>,
    session: SessionContext,
}

impl Authenticated {
    pub fn caller(&self) -> Caller<'_> {
        Caller {
            token: &self.token,
            request_id: self.request_id.as_deref(),
        }
    }

    pub fn can(&self, feature: &str, action: &str) -> bool {
        self.role.can(feature, action)
    }

    pub fn require(&self, feature: &str, action: &str) -> Result<(), AppError> {
        if self.can(feature, action) {
            return Ok(());
        }

        tracing::info!(
            email = %self.user.email,
            role = %self.role.role,
            feature,
            action,
            "Permission denied"
        );
        Err(AppError::forbidden(format!(
            "Missing permission {}:{}",
            feature, action
        )))
    }

    /// Ends the session after the backend stopped accepting the token.
    pub async fn expire(self) -> Response {
        tracing::info!(email = %self.user.email, "Backend rejected token; session expired");
        self.session.end().await;
        Redirect::to("/login").into_response()
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|rejection| rejection.into_response())?;

        match SessionContext::new(session).load(state.role_key()).await {
            Ok(Some(mut authenticated)) => {
                authenticated.request_id = extract_request_id(&parts.headers);
                Ok(authenticated)
            }
            Ok(None) => Err(Redirect::to("/login").into_response()),
            Err(e) => Err(AppError::from(e).into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoleName;
    use crate::utils::crypto::tests::seal;
    use std::sync::Arc;
    use tower_sessions::{MemoryStore, SessionStore};

    const IV: &str = "000102030405060708090a0b0c0d0e0f";
    const KEY: &str = "0123456789abcdef0123456789abcdef";
    const ROLE_JSON: &str = r#"{"id":2,"role":"supervisor","permissions":{"dashboard":["view"]}}"#;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn login(key: Option<&str>) -> LoginData {
        LoginData {
            token: "token-abc".to_string(),
            rl: RoleBundle {
                ciphertext: seal(ROLE_JSON, IV, KEY),
                iv: IV.to_string(),
                key: key.map(str::to_string),
            },
            user: serde_json::from_str(r#"{"email":"sup@example.com","role":"supervisor"}"#)
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn establish_then_load_round_trips() {
        let context = SessionContext::new(session());
        context.establish(&login(Some(KEY))).await.unwrap();

        assert_eq!(context.token().await.unwrap().as_deref(), Some("token-abc"));

        let authenticated = context.load(None).await.unwrap().unwrap();
        assert_eq!(authenticated.role.role, RoleName::Supervisor);
        assert_eq!(authenticated.role.id, Some(2));
        assert_eq!(authenticated.user.email, "sup@example.com");
        assert!(authenticated.can("dashboard", "view"));
        assert!(authenticated.require("permissions", "edit").is_err());
    }

    #[tokio::test]
    async fn fallback_key_is_used_when_bundle_has_none() {
        let context = SessionContext::new(session());
        context.establish(&login(None)).await.unwrap();

        assert!(context.load(None).await.unwrap().is_none());

        // The failed load above cleared the session; set it up again.
        context.establish(&login(None)).await.unwrap();
        let fallback = Secret::new(KEY.to_string());
        assert!(context.load(Some(&fallback)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn undecryptable_bundle_ends_session() {
        let context = SessionContext::new(session());
        context
            .establish(&login(Some("ffffffffffffffffffffffffffffffff")))
            .await
            .unwrap();

        assert!(context.load(None).await.unwrap().is_none());
        assert!(context.token().await.unwrap().is_none());
        assert!(context.user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_session_is_anonymous() {
        let context = SessionContext::new(session());
        assert!(context.load(None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn end_clears_all_keys() {
        let context = SessionContext::new(session());
        context.establish(&login(Some(KEY))).await.unwrap();
        context.end().await;

        assert!(context.token().await.unwrap().is_none());
        assert!(context.role_bundle().await.unwrap().is_none());
        assert!(context.user().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn end_deletes_the_stored_record() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store.clone(), None);
        let context = SessionContext::new(session.clone());
        context.establish(&login(Some(KEY))).await.unwrap();
        session.save().await.unwrap();

        let id = session.id().unwrap();
        assert!(store.load(&id).await.unwrap().is_some());

        context.end().await;
        assert!(store.load(&id).await.unwrap().is_none());
        assert!(context.token().await.unwrap().is_none());
    }

    #[test]
    fn open_bundle_without_any_key_fails() {
        let data = login(None);
        assert_eq!(open_bundle(&data.rl, None), Err(DecryptError));
    }
}
