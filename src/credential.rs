//! Credentials and per-call sessions.
//!
//! The credential context owns the principal and secret for one desk
//! session. It never caches an authenticated session: every logical
//! operation asks for a fresh [`Session`] and drops it when done.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{Result, StockdeskError};
use crate::remote::ListStore;

/// Principal and secret captured at login
pub struct Credential {
    principal: String,
    secret: SecretString,
}

impl Credential {
    pub fn new(principal: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("principal", &self.principal)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// An authenticated handle to the store, valid for one logical operation
pub struct Session {
    principal: String,
    token: SecretString,
}

impl Session {
    pub fn new(principal: impl Into<String>, token: SecretString) -> Self {
        Self {
            principal: principal.into(),
            token,
        }
    }

    pub fn principal(&self) -> &str {
        &self.principal
    }

    /// Value for the `Authorization` header
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.token.expose_secret())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("principal", &self.principal)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Authenticate once against a store
pub async fn authenticate<S: ListStore>(
    store: &S,
    principal: &str,
    secret: &str,
) -> Result<Session> {
    let credential = Credential::new(principal, secret);
    store.authenticate(&credential).await
}

/// Holds the current credential and the store it signs into
pub struct CredentialContext<S> {
    store: S,
    credential: Option<Credential>,
}

impl<S: ListStore> CredentialContext<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            credential: None,
        }
    }

    pub fn set_credentials(&mut self, principal: impl Into<String>, secret: impl Into<String>) {
        self.credential = Some(Credential::new(principal, secret));
    }

    pub fn clear(&mut self) {
        self.credential = None;
    }

    pub fn principal(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.principal())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Sign in with the held credential
    pub async fn session(&self) -> Result<Session> {
        let credential = self
            .credential
            .as_ref()
            .ok_or(StockdeskError::NotAuthenticated)?;
        self.store.authenticate(credential).await.inspect_err(|e| {
            tracing::error!(principal = credential.principal(), "authentication failed: {e}")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_debug_redacts_secret() {
        let credential = Credential::new("user@contoso.com", "hunter2");
        let debug = format!("{:?}", credential);
        assert!(debug.contains("user@contoso.com"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new("user", SecretString::from("eyJ0eXAi.token"));
        let debug = format!("{:?}", session);
        assert!(!debug.contains("eyJ0eXAi"));
        assert_eq!(session.bearer(), "Bearer eyJ0eXAi.token");
    }
}
