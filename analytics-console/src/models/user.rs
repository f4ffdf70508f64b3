use crate::models::role::RoleName;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// User object returned by the login endpoint and kept in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAttributes {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, deserialize_with = "loose_role_name")]
    pub role: Option<RoleName>,
}

impl UserAttributes {
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.email.split('@').next().unwrap_or("User").to_string(),
        }
    }

    pub fn initials(&self) -> String {
        let name = self.display_name();
        let initials: String = name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .collect();

        match initials.chars().count() {
            2 => initials.to_uppercase(),
            _ => {
                let head: String = name.chars().take(2).collect();
                if head.is_empty() {
                    "U".to_string()
                } else {
                    head.to_uppercase()
                }
            }
        }
    }
}

/// Accepts the role as a plain string or whatever else the backend sends;
/// non-string values are kept as their JSON text under `Unknown`.
fn loose_role_name<'de, D>(deserializer: D) -> Result<Option<RoleName>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(name)) => Some(RoleName::from(name)),
        Some(other) => Some(RoleName::Unknown(other.to_string())),
    })
}

/// Encrypted role bundle as delivered at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBundle {
    #[serde(rename = "encryptedData")]
    pub ciphertext: String,
    pub iv: String,
    /// Key material; the configured fallback key is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl fmt::Debug for RoleBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleBundle")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("iv", &self.iv)
            .field("key", &self.key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// `data` of a successful login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub rl: RoleBundle,
    pub user: UserAttributes,
}
