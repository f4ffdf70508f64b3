//! Role-based permission management: a checkbox tree per role.

use crate::handlers::layout::PageChrome;
use crate::handlers::LOAD_FAILED_NOTICE;
use crate::models::role::{action, feature};
use crate::models::{Permissions, Role};
use crate::services::BackendError;
use crate::session::Authenticated;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;
use service_core::error::AppError;

/// Features shown in the tree, with their labels.
pub const FEATURES: [(&str, &str); 6] = [
    (feature::DASHBOARD, "Dashboard"),
    (feature::ZOOM_USAGE, "Zoom phone usage"),
    (feature::ABANDONED_CALLS, "Abandoned calls"),
    (feature::SKILL_REPORT, "Skill report"),
    (feature::VDN_REPORT, "VDN report"),
    (feature::PERMISSIONS, "Permission management"),
];

pub const ACTIONS: [&str; 3] = [action::VIEW, action::EXPORT, action::EDIT];

pub const SAVED_NOTICE: &str = "Permissions saved.";
pub const SAVE_FAILED_NOTICE: &str = "Permissions could not be saved. Nothing was changed.";
pub const UNKNOWN_ROLE_NOTICE: &str = "That role no longer exists.";

fn in_catalog(feature: &str, action: &str) -> bool {
    FEATURES.iter().any(|(f, _)| *f == feature) && ACTIONS.contains(&action)
}

pub struct ActionCell {
    pub action: &'static str,
    pub value: String,
    pub checked: bool,
}

pub struct FeatureRow {
    pub label: &'static str,
    pub actions: Vec<ActionCell>,
}

pub struct RoleEditor {
    pub id: Option<i64>,
    pub name: String,
    pub editable: bool,
    pub features: Vec<FeatureRow>,
    /// Grants outside the catalog, kept as-is on save.
    pub other_grants: Vec<String>,
}

impl RoleEditor {
    pub fn new(role: &Role, can_edit: bool) -> Self {
        let features = FEATURES
            .iter()
            .map(|&(feature, label)| FeatureRow {
                label,
                actions: ACTIONS
                    .iter()
                    .map(|&action| ActionCell {
                        action,
                        value: format!("{}:{}", feature, action),
                        checked: role.permissions.allows(feature, action),
                    })
                    .collect(),
            })
            .collect();

        let other_grants = role
            .permissions
            .features()
            .flat_map(|(feature, actions)| {
                actions
                    .iter()
                    .filter(move |action| !in_catalog(feature, action))
                    .map(move |action| format!("{}:{}", feature, action))
            })
            .collect();

        Self {
            id: role.id,
            name: role.role.to_string(),
            editable: can_edit && role.id.is_some(),
            features,
            other_grants,
        }
    }
}

/// New permissions for a role: out-of-catalog grants from `current` survive,
/// catalog grants are exactly the checked `feature:action` values.
pub fn build_permissions(current: &Permissions, grants: &[String]) -> Permissions {
    let mut permissions = Permissions::new();

    for (feature, actions) in current.features() {
        for action in actions.iter().filter(|a| !in_catalog(feature, a)) {
            permissions.grant(feature, action);
        }
    }

    for grant in grants {
        match grant.split_once(':') {
            Some((feature, action)) if in_catalog(feature, action) => {
                permissions.grant(feature, action)
            }
            _ => tracing::warn!(grant = %grant, "Ignoring unknown permission grant"),
        }
    }

    permissions
}

#[derive(Template)]
#[template(path = "permissions.html")]
pub struct PermissionsTemplate {
    pub chrome: PageChrome,
    pub notices: Vec<&'static str>,
    pub actions: &'static [&'static str],
    pub roles: Vec<RoleEditor>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PermissionsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PermissionForm {
    #[serde(default)]
    pub grants: Vec<String>,
}

pub async fn permissions_page(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<PermissionsQuery>,
) -> Result<Response, AppError> {
    auth.require(feature::PERMISSIONS, action::VIEW)?;

    let mut notices = Vec::new();
    match query.status.as_deref() {
        Some("saved") => notices.push(SAVED_NOTICE),
        Some("failed") => notices.push(SAVE_FAILED_NOTICE),
        Some("missing") => notices.push(UNKNOWN_ROLE_NOTICE),
        _ => {}
    }

    let roles = match state.backend.roles(auth.caller()).await {
        Ok(roles) => roles,
        Err(BackendError::Unauthorized) => return Ok(auth.expire().await),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load roles");
            notices.push(LOAD_FAILED_NOTICE);
            Vec::new()
        }
    };

    let can_edit = auth.can(feature::PERMISSIONS, action::EDIT);
    Ok(PermissionsTemplate {
        chrome: PageChrome::new(&auth, "/admin/permissions"),
        notices,
        actions: &ACTIONS,
        roles: roles.iter().map(|role| RoleEditor::new(role, can_edit)).collect(),
    }
    .into_response())
}

pub async fn update_permissions_handler(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(role_id): Path<i64>,
    Form(form): Form<PermissionForm>,
) -> Result<Response, AppError> {
    auth.require(feature::PERMISSIONS, action::EDIT)?;

    let roles = match state.backend.roles(auth.caller()).await {
        Ok(roles) => roles,
        Err(BackendError::Unauthorized) => return Ok(auth.expire().await),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load roles before update");
            return Ok(Redirect::to("/admin/permissions?status=failed").into_response());
        }
    };

    let Some(current) = roles.iter().find(|role| role.id == Some(role_id)) else {
        return Ok(Redirect::to("/admin/permissions?status=missing").into_response());
    };

    let permissions = build_permissions(&current.permissions, &form.grants);
    let status = match state
        .backend
        .update_permissions(auth.caller(), role_id, &permissions)
        .await
    {
        Ok(updated) => {
            tracing::info!(
                role_id,
                role = %updated.role,
                by = %auth.user.email,
                "Role permissions updated"
            );
            "saved"
        }
        Err(BackendError::Unauthorized) => return Ok(auth.expire().await),
        Err(e) => {
            tracing::error!(role_id, error = %e, "Failed to update role permissions");
            "failed"
        }
    };

    Ok(Redirect::to(&format!("/admin/permissions?status={}", status)).into_response())
}
