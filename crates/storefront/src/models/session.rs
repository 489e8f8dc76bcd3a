//! Session-related types.
//!
//! The session holds exactly two credential keys, the bearer token and the
//! user record returned at login, plus a one-shot flash message.

use secrecy::{ExposeSecret, SecretString};

use vitrine_api::Caller;
use vitrine_core::User;

/// Session keys.
pub mod keys {
    /// Opaque bearer token issued by the API.
    pub const TOKEN: &str = "token";

    /// Serialized user record, role included.
    pub const USER: &str = "user";

    /// Message shown once on the next rendered page.
    pub const FLASH: &str = "flash";
}

/// An authenticated visitor.
#[derive(Clone)]
pub struct CurrentSession {
    pub user: User,
    token: SecretString,
}

impl CurrentSession {
    #[must_use]
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self {
            user,
            token: SecretString::from(token.into()),
        }
    }

    /// API identity for calls made on this visitor's behalf.
    #[must_use]
    pub fn caller(&self) -> Caller {
        Caller::new(self.user.id.clone(), self.token.expose_secret())
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

impl std::fmt::Debug for CurrentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentSession")
            .field("user", &self.user.id)
            .field("role", &self.user.role)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let user = User {
            id: "7".into(),
            name: "Ana Souza".into(),
            email: "ana@example.com".into(),
            phone: None,
            role: vitrine_core::Role::Customer,
            addresses: Vec::new(),
            created_at: None,
        };
        let session = CurrentSession::new(user, "eyJ.secret.sig");
        let debug = format!("{session:?}");
        assert!(!debug.contains("secret"));
        assert_eq!(session.caller().user_id().as_str(), "7");
    }
}
