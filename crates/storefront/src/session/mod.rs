//! Session store: the bearer token and the signed-in user.
//!
//! The session lives in two durable slots, `authToken` and `user`. They are
//! written together on login and cleared together on logout; a restore that
//! finds only one of them treats the session as absent and wipes the other.

mod storage;

pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};

use std::fmt;
use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use sportgear_core::Role;
use thiserror::Error;

use crate::error::{add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::models::SessionUser;

/// Slot holding the bearer token.
pub const TOKEN_SLOT: &str = "authToken";
/// Slot holding the serialized [`SessionUser`].
pub const USER_SLOT: &str = "user";

/// Errors that can occur while changing the session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Could not serialize user: {0}")]
    Serialize(#[from] serde_json::Error),

    /// An operation needed a session and there is none.
    #[error("Not signed in")]
    NotAuthenticated,
}

/// An authenticated session.
#[derive(Clone)]
pub struct Session {
    token: SecretString,
    user: SessionUser,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

impl Session {
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    #[must_use]
    pub const fn user(&self) -> &SessionUser {
        &self.user
    }
}

/// Owner of the session and its persisted slots.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    current: Option<Session>,
}

impl SessionStore {
    /// A store over `storage`, initially signed out. Call
    /// [`SessionStore::restore`] to pick up a persisted session.
    #[must_use]
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            current: None,
        }
    }

    #[must_use]
    pub const fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    /// Persist both slots and mark the session authenticated.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the user cannot be serialized or the slots
    /// cannot be written. The in-memory state is unchanged in that case.
    pub fn login(&mut self, token: SecretString, user: SessionUser) -> Result<&Session, SessionError> {
        let user_json = serde_json::to_string(&user)?;
        self.storage
            .store(&[(TOKEN_SLOT, token.expose_secret()), (USER_SLOT, &user_json)])?;

        if let Some(id) = user.id() {
            set_sentry_user(&id, Some(&user.email));
        }
        add_breadcrumb("auth", "Signed in", None);
        tracing::info!(email = %user.email, role = %user.role(), "Session started");

        Ok(self.current.insert(Session { token, user }))
    }

    /// Clear both slots and mark the session signed out.
    ///
    /// The in-memory session is dropped even if the slots cannot be cleared.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the slots cannot be removed.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        let was_authenticated = self.current.take().is_some();
        clear_sentry_user();
        if was_authenticated {
            add_breadcrumb("auth", "Signed out", None);
            tracing::info!("Session ended");
        }
        self.storage.remove(&[TOKEN_SLOT, USER_SLOT])?;
        Ok(())
    }

    /// Re-establish the session from storage.
    ///
    /// Both slots must be present and the user slot must parse; anything
    /// else leaves the store signed out and wipes whatever partial state was
    /// found. Never fails.
    pub fn restore(&mut self) -> Option<&Session> {
        let token = self.read_slot(TOKEN_SLOT).filter(|t| !t.trim().is_empty());
        let user_json = self.read_slot(USER_SLOT);

        let restored = match (token, user_json) {
            (Some(token), Some(user_json)) => match serde_json::from_str::<SessionUser>(&user_json) {
                Ok(user) => Some(Session {
                    token: SecretString::from(token),
                    user,
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored user does not parse, ignoring session");
                    None
                }
            },
            (None, None) => None,
            _ => {
                tracing::warn!("Partial session in storage, ignoring it");
                None
            }
        };

        if restored.is_none() {
            self.current = None;
            if let Err(e) = self.storage.remove(&[TOKEN_SLOT, USER_SLOT]) {
                tracing::warn!(error = %e, "Could not clear stale session slots");
            }
            return None;
        }

        self.current = restored;
        if let Some(session) = &self.current
            && let Some(id) = session.user.id()
        {
            set_sentry_user(&id, Some(&session.user.email));
        }
        self.current.as_ref()
    }

    /// Role of the signed-in user, re-read from the persisted user slot.
    ///
    /// Falls back to [`Role::Customer`] when signed out, when the slot is
    /// missing or unreadable, or when the role is not recognised.
    #[must_use]
    pub fn role(&self) -> Role {
        if self.current.is_none() {
            return Role::Customer;
        }
        self.read_slot(USER_SLOT)
            .and_then(|json| serde_json::from_str::<serde_json::Value>(&json).ok())
            .and_then(|user| user.get("role")?.as_str().map(Role::parse_or_customer))
            .unwrap_or_default()
    }

    /// Replace the stored user of the current session, e.g. after a profile
    /// update. The token is untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAuthenticated` when signed out, or a storage
    /// or serialization error.
    pub fn refresh_user(&mut self, user: SessionUser) -> Result<&Session, SessionError> {
        let Some(session) = self.current.as_mut() else {
            return Err(SessionError::NotAuthenticated);
        };
        let user_json = serde_json::to_string(&user)?;
        self.storage.store(&[(USER_SLOT, &user_json)])?;
        session.user = user;
        Ok(session)
    }

    fn read_slot(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(slot = key, error = %e, "Could not read session slot");
                None
            }
        }
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sportgear_core::UserId;

    use super::*;

    fn store() -> (Arc<MemoryStorage>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = SessionStore::new(storage.clone());
        (storage, store)
    }

    fn ana() -> SessionUser {
        SessionUser::new(&UserId::from("u-ana"), "ana@sportgear.co", Role::StoreAdmin)
    }

    #[test]
    fn test_login_then_restore_yields_identical_session() {
        let (storage, mut first) = store();
        first.login(SecretString::from("tok-1"), ana()).unwrap();

        let mut reloaded = SessionStore::new(storage);
        let session = reloaded.restore().unwrap();
        assert_eq!(session.token().expose_secret(), "tok-1");
        assert_eq!(session.user(), &ana());
        assert_eq!(reloaded.role(), Role::StoreAdmin);
    }

    #[test]
    fn test_logout_then_restore_is_signed_out() {
        let (storage, mut first) = store();
        first.login(SecretString::from("tok-1"), ana()).unwrap();
        first.logout().unwrap();
        assert!(!first.is_authenticated());

        let mut reloaded = SessionStore::new(storage.clone());
        assert!(reloaded.restore().is_none());
        assert_eq!(storage.get(TOKEN_SLOT).unwrap(), None);
        assert_eq!(storage.get(USER_SLOT).unwrap(), None);
    }

    #[test]
    fn test_partial_session_is_not_trusted() {
        let (storage, mut store) = store();
        storage.store(&[(TOKEN_SLOT, "orphan")]).unwrap();

        assert!(store.restore().is_none());
        assert_eq!(storage.get(TOKEN_SLOT).unwrap(), None);

        storage.store(&[(USER_SLOT, r#"{"email":"a@b.co"}"#)]).unwrap();
        assert!(store.restore().is_none());
        assert_eq!(storage.get(USER_SLOT).unwrap(), None);
    }

    #[test]
    fn test_unparseable_user_is_not_trusted() {
        let (storage, mut store) = store();
        storage
            .store(&[(TOKEN_SLOT, "tok"), (USER_SLOT, "{not json")])
            .unwrap();
        assert!(store.restore().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_role_fails_soft_to_customer() {
        let (storage, mut store) = store();
        assert_eq!(store.role(), Role::Customer);

        store.login(SecretString::from("tok"), ana()).unwrap();
        storage.store(&[(USER_SLOT, "garbage")]).unwrap();
        assert_eq!(store.role(), Role::Customer);

        storage
            .store(&[(USER_SLOT, r#"{"role": "SYSTEM_ADMIN"}"#)])
            .unwrap();
        assert_eq!(store.role(), Role::SystemAdmin);

        storage.store(&[(USER_SLOT, r#"{"role": 7}"#)]).unwrap();
        assert_eq!(store.role(), Role::Customer);
    }

    #[test]
    fn test_refresh_user_requires_session() {
        let (storage, mut store) = store();
        assert!(matches!(
            store.refresh_user(ana()),
            Err(SessionError::NotAuthenticated)
        ));

        store.login(SecretString::from("tok"), ana()).unwrap();
        let mut updated = ana();
        updated.first_name = Some("Ana María".to_string());
        store.refresh_user(updated.clone()).unwrap();

        assert_eq!(store.current().unwrap().user(), &updated);
        assert_eq!(storage.get(TOKEN_SLOT).unwrap().as_deref(), Some("tok"));
        let persisted: SessionUser =
            serde_json::from_str(&storage.get(USER_SLOT).unwrap().unwrap()).unwrap();
        assert_eq!(persisted, updated);
    }

    #[test]
    fn test_debug_redacts_token() {
        let (_, mut store) = store();
        store.login(SecretString::from("very-secret"), ana()).unwrap();
        let debug = format!("{store:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
