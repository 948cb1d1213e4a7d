//! Accounts as served by the user management service.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use sportgear_core::{AccountStatus, Role, UserId};

use super::{Timestamp, timestamp};

/// An account, as listed on the user administration screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub userid: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default, deserialize_with = "role_or_customer")]
    pub role: Role,
    #[serde(default)]
    pub status: AccountStatus,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub last_login: Option<Timestamp>,
}

impl User {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Unknown roles list as customers rather than failing the whole page.
fn role_or_customer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Role, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(Role::parse_or_customer).unwrap_or_default())
}

/// Body of `GET /api/users/stats`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: u64,
    #[serde(default)]
    pub role_stats: BTreeMap<String, u64>,
    #[serde(default)]
    pub status_stats: BTreeMap<String, u64>,
}

/// Filters for `GET /api/users`.
#[derive(Debug, Clone, Default)]
pub struct UserFilters {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
}

impl UserFilters {
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("search", self.search.clone().unwrap_or_default()),
            ("role", self.role.map(Role::as_str).unwrap_or_default().to_string()),
            (
                "status",
                self.status
                    .map(AccountStatus::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
        ]
    }
}

/// Body of `PUT /api/users/{id}/profile`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub date_of_birth: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_admin_user() {
        let user: User = serde_json::from_str(
            r#"{
                "userid": "b3c1",
                "email": "ops@sportgear.co",
                "firstName": "Lina",
                "lastName": "Ortiz",
                "phoneNumber": null,
                "dateOfBirth": "1990-04-12",
                "role": "LOGISTICS_OPERATOR",
                "status": "ACTIVE",
                "createdAt": "2025-01-10T09:00:00Z",
                "lastLogin": null
            }"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::LogisticsOperator);
        assert_eq!(user.full_name(), "Lina Ortiz");
        assert!(user.last_login.is_none());
    }

    #[test]
    fn test_unknown_role_lists_as_customer() {
        let user: User = serde_json::from_str(
            r#"{"userid": "x", "email": "x@sportgear.co", "role": "AUDITOR", "status": "PENDING"}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Customer);
        assert_eq!(user.status, AccountStatus::Pending);
    }

    #[test]
    fn test_unknown_status_keeps_the_listing() {
        let users: Vec<User> = serde_json::from_str(
            r#"[
                {"userid": "a", "email": "a@sportgear.co", "role": "CUSTOMER", "status": "LOCKED"},
                {"userid": "b", "email": "b@sportgear.co", "role": "CUSTOMER", "status": "ACTIVE"}
            ]"#,
        )
        .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].status, AccountStatus::Unknown);
        assert_eq!(users[1].status, AccountStatus::Active);
    }

    #[test]
    fn test_stats_shape() {
        let stats: UserStats = serde_json::from_str(
            r#"{"total": 3, "roleStats": {"CUSTOMER": 2, "SYSTEM_ADMIN": 1}, "statusStats": {"ACTIVE": 3}}"#,
        )
        .unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.role_stats.get("CUSTOMER"), Some(&2));
    }

    #[test]
    fn test_filters_skip_unset() {
        let filters = UserFilters {
            role: Some(Role::StoreAdmin),
            ..UserFilters::default()
        };
        let query = filters.to_query();
        assert!(query.contains(&("role", "STORE_ADMIN".to_string())));
        assert!(query.contains(&("search", String::new())));
    }
}
