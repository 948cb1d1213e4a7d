//! Session-related models: the signed-in user and auth payloads.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sportgear_core::{Email, Role, UserId};

/// Keys the backends use for the account id, in lookup order.
const ID_KEYS: [&str; 3] = ["userid", "userId", "id"];

/// The signed-in user, exactly as the auth service returned it.
///
/// Only a few fields are typed; everything else rides along in `extra` so
/// the persisted profile round-trips without losing data. The account id is
/// found under `userid`, `userId` or `id` depending on the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    #[serde(default)]
    pub email: String,
    /// Raw role string; interpreted by the authorization layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionUser {
    /// A user with the given id, email and role.
    #[must_use]
    pub fn new(id: &UserId, email: impl Into<String>, role: Role) -> Self {
        let mut extra = serde_json::Map::new();
        extra.insert("userid".to_string(), id.as_str().into());
        Self {
            email: email.into(),
            role: Some(role.as_str().to_string()),
            first_name: None,
            last_name: None,
            extra,
        }
    }

    /// The account id, from whichever key the service used.
    #[must_use]
    pub fn id(&self) -> Option<UserId> {
        ID_KEYS.iter().find_map(|key| match self.extra.get(*key)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(UserId::new(s.clone())),
            serde_json::Value::Number(n) => Some(UserId::new(n.to_string())),
            _ => None,
        })
    }

    /// The role, failing soft to [`Role::Customer`].
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
            .as_deref()
            .map(Role::parse_or_customer)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if name.trim().is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

/// Body returned by login and registration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: SessionUser,
}

/// Body returned by a profile update.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: SessionUser,
}

/// Sign-up form.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: Email,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<String>,
}

impl Registration {
    /// JSON body for `POST /api/auth/register`.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({
            "email": self.email.as_str(),
            "password": self.password.expose_secret(),
            "firstName": self.first_name,
            "lastName": self.last_name,
            "phoneNumber": self.phone_number.clone().unwrap_or_default(),
            "dateOfBirth": self.date_of_birth.clone().unwrap_or_default(),
        })
    }
}
