use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Feature keys used to gate pages.
pub mod feature {
    pub const DASHBOARD: &str = "dashboard";
    pub const ZOOM_USAGE: &str = "zoom_usage";
    pub const ABANDONED_CALLS: &str = "abandoned_calls";
    pub const SKILL_REPORT: &str = "skill_report";
    pub const VDN_REPORT: &str = "vdn_report";
    pub const PERMISSIONS: &str = "permissions";
}

/// Action keys used to gate pages.
pub mod action {
    pub const VIEW: &str = "view";
    pub const EXPORT: &str = "export";
    pub const EDIT: &str = "edit";
}

/// Known role names. Anything the backend sends that we don't recognise is
/// kept verbatim in `Unknown` and gets no implicit rights.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleName {
    Admin,
    Supervisor,
    Agent,
    Viewer,
    Unknown(String),
}

impl RoleName {
    pub fn as_str(&self) -> &str {
        match self {
            RoleName::Admin => "admin",
            RoleName::Supervisor => "supervisor",
            RoleName::Agent => "agent",
            RoleName::Viewer => "viewer",
            RoleName::Unknown(name) => name,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, RoleName::Admin)
    }
}

impl From<String> for RoleName {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => RoleName::Admin,
            "supervisor" => RoleName::Supervisor,
            "agent" => RoleName::Agent,
            "viewer" => RoleName::Viewer,
            _ => RoleName::Unknown(value),
        }
    }
}

impl From<&str> for RoleName {
    fn from(value: &str) -> Self {
        RoleName::from(value.to_string())
    }
}

impl From<RoleName> for String {
    fn from(value: RoleName) -> Self {
        match value {
            RoleName::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Feature name -> allowed actions, in the order the backend delivered them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeMap<String, Vec<String>>);

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allows(&self, feature: &str, action: &str) -> bool {
        self.actions(feature).iter().any(|a| a == action)
    }

    pub fn actions(&self, feature: &str) -> &[String] {
        self.0.get(feature).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Adds `action` under `feature` unless it is already listed.
    pub fn grant(&mut self, feature: &str, action: &str) {
        let actions = self.0.entry(feature.to_string()).or_default();
        if !actions.iter().any(|a| a == action) {
            actions.push(action.to_string());
        }
    }

    pub fn features(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for Permissions {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Decrypted authorization object. Read-only for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub role: RoleName,
    pub permissions: Permissions,
}

impl Role {
    /// Admins may do everything; everyone else needs an explicit grant.
    pub fn can(&self, feature: &str, action: &str) -> bool {
        self.role.is_admin() || self.permissions.allows(feature, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supervisor() -> Role {
        serde_json::from_str(
            r#"{"id":7,"role":"supervisor","permissions":{"dashboard":["view","export"],"vdn_report":["view"]}}"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_role_shape() {
        let role = supervisor();
        assert_eq!(role.id, Some(7));
        assert_eq!(role.role, RoleName::Supervisor);
        assert_eq!(role.permissions.actions("dashboard"), ["view", "export"]);
    }

    #[test]
    fn id_is_optional() {
        let role: Role =
            serde_json::from_str(r#"{"role":"agent","permissions":{}}"#).unwrap();
        assert_eq!(role.id, None);
        assert!(role.permissions.is_empty());
    }

    #[test]
    fn missing_permissions_is_rejected() {
        assert!(serde_json::from_str::<Role>(r#"{"role":"agent"}"#).is_err());
    }

    #[test]
    fn unknown_role_names_round_trip() {
        let role: Role =
            serde_json::from_str(r#"{"role":"qa-lead","permissions":{}}"#).unwrap();
        assert_eq!(role.role, RoleName::Unknown("qa-lead".to_string()));
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["role"], "qa-lead");
    }

    #[test]
    fn gating_uses_grants_for_non_admins() {
        let role = supervisor();
        assert!(role.can(feature::DASHBOARD, action::VIEW));
        assert!(role.can(feature::VDN_REPORT, action::VIEW));
        assert!(!role.can(feature::PERMISSIONS, action::VIEW));
        assert!(!role.can(feature::VDN_REPORT, action::EXPORT));
    }

    #[test]
    fn admin_bypasses_grants() {
        let role = Role {
            id: None,
            role: RoleName::Admin,
            permissions: Permissions::new(),
        };
        assert!(role.can(feature::PERMISSIONS, action::EDIT));
    }

    #[test]
    fn grant_skips_duplicates() {
        let mut permissions = Permissions::new();
        permissions.grant("dashboard", "view");
        permissions.grant("dashboard", "view");
        permissions.grant("dashboard", "export");
        assert_eq!(permissions.actions("dashboard"), ["view", "export"]);
    }

    #[test]
    fn delivered_duplicates_are_not_rejected() {
        let permissions: Permissions =
            serde_json::from_str(r#"{"dashboard":["view","view"]}"#).unwrap();
        assert_eq!(permissions.actions("dashboard").len(), 2);
    }
}
