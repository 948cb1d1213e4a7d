//! User administration resource.

use secrecy::{ExposeSecret, SecretString};
use sportgear_core::{AccountStatus, Role, UserId};
use tracing::instrument;

use super::{Cache, Entity};
use crate::error::{Operation, ResourceError};
use crate::gateway::{ApiClient, Backend};
use crate::models::{ProfileResponse, ProfileUpdate, SessionUser, User, UserFilters, UserStats};
use crate::sync::ViewScope;

const USERS_PATH: &str = "/api/users";

const LOAD: Operation = Operation::new("load", "users");
const GET: Operation = Operation::new("load", "user");
const UPDATE_ROLE: Operation = Operation::new("update the role of", "user");
const UPDATE_STATUS: Operation = Operation::new("update the status of", "user");
const UPDATE_PROFILE: Operation = Operation::new("update", "profile");
const UPDATE_PASSWORD: Operation = Operation::new("change", "password");
const STATS: Operation = Operation::new("load", "user statistics");

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &UserId {
        &self.userid
    }
}

/// Accounts shown by one admin view, plus the self-service profile calls.
#[derive(Clone)]
pub struct UsersResource {
    api: ApiClient,
    cache: Cache<User>,
}

impl UsersResource {
    #[must_use]
    pub fn new(api: ApiClient, scope: ViewScope) -> Self {
        Self {
            api,
            cache: Cache::new(scope),
        }
    }

    #[must_use]
    pub const fn cache(&self) -> &Cache<User> {
        &self.cache
    }

    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.cache.items()
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self))]
    pub async fn fetch_users(&self, filters: &UserFilters) -> Result<Vec<User>, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .get(Backend::User, USERS_PATH, &filters.to_query())
            .await;
        self.cache
            .settle(LOAD, result, |cache, users: &Vec<User>| cache.replace_all(users.clone()))
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: &UserId) -> Result<User, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .get(Backend::User, &user_path(id, ""), &[])
            .await;
        self.cache.settle(GET, result, |_, _| {})
    }

    /// Assign a role. The cached record is patched once the server agrees.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self), fields(user_id = %id, role = %role))]
    pub async fn update_role(&self, id: &UserId, role: Role) -> Result<(), ResourceError> {
        let _busy = self.cache.begin();
        let body = serde_json::json!({ "role": role });
        let result = self
            .api
            .put::<_, serde_json::Value>(Backend::User, &user_path(id, "/role"), &body)
            .await
            .map(drop);
        self.cache.settle(UPDATE_ROLE, result, |cache, ()| {
            patch_user(cache, id, |user| user.role = role);
        })
    }

    /// Change an account's status. The cached record is patched once the
    /// server agrees.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails; the cache is unchanged.
    #[instrument(skip(self), fields(user_id = %id, status = %status))]
    pub async fn update_status(&self, id: &UserId, status: AccountStatus) -> Result<(), ResourceError> {
        let _busy = self.cache.begin();
        let body = serde_json::json!({ "status": status });
        let result = self
            .api
            .put::<_, serde_json::Value>(Backend::User, &user_path(id, "/status"), &body)
            .await
            .map(drop);
        self.cache.settle(UPDATE_STATUS, result, |cache, ()| {
            patch_user(cache, id, |user| user.status = status);
        })
    }

    /// Update profile fields. Returns the user as the auth service now sees
    /// it, suitable for refreshing the session.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self, update), fields(user_id = %id))]
    pub async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<SessionUser, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .put::<_, ProfileResponse>(Backend::User, &user_path(id, "/profile"), update)
            .await
            .map(|response| response.user);
        self.cache.settle(UPDATE_PROFILE, result, |cache, _| {
            patch_user(cache, id, |user| {
                user.first_name.clone_from(&update.first_name);
                user.last_name.clone_from(&update.last_name);
                user.phone_number = Some(update.phone_number.clone()).filter(|p| !p.is_empty());
                user.date_of_birth = Some(update.date_of_birth.clone()).filter(|d| !d.is_empty());
            });
        })
    }

    /// # Errors
    ///
    /// Returns `ResourceError` if the server refuses, e.g. a wrong current
    /// password.
    #[instrument(skip(self, current, new), fields(user_id = %id))]
    pub async fn update_password(
        &self,
        id: &UserId,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), ResourceError> {
        let _busy = self.cache.begin();
        let body = serde_json::json!({
            "currentPassword": current.expose_secret(),
            "newPassword": new.expose_secret(),
        });
        let result = self
            .api
            .put::<_, serde_json::Value>(Backend::User, &user_path(id, "/password"), &body)
            .await
            .map(drop);
        self.cache.settle(UPDATE_PASSWORD, result, |_, ()| {})
    }

    /// Account counts by role and status. Not cached.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError` if the request fails.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<UserStats, ResourceError> {
        let _busy = self.cache.begin();
        let result = self
            .api
            .get(Backend::User, &format!("{USERS_PATH}/stats"), &[])
            .await;
        self.cache.settle(STATS, result, |_, _| {})
    }
}

fn user_path(id: &UserId, suffix: &str) -> String {
    format!("{USERS_PATH}/{}{suffix}", urlencoding::encode(id.as_str()))
}

fn patch_user(cache: &Cache<User>, id: &UserId, f: impl FnOnce(&mut User)) {
    cache.mutate(|users| {
        if let Some(user) = users.iter_mut().find(|user| &user.userid == id) {
            f(user);
        }
    });
}
