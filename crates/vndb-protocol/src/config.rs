//! Session configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Protocol revision sent in the login payload.
pub const PROTOCOL_VERSION: u32 = 1;

/// Connection settings for one session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Remote host (default `"api.vndb.org"`).
    pub host: String,
    /// Remote TLS port (default `19535`).
    pub port: u16,
    /// Client identity string sent in the login payload.
    pub client: String,
    /// Client version string sent in the login payload.
    pub clientver: String,
    /// Optional account credentials; anonymous when absent.
    pub credentials: Option<Credentials>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "api.vndb.org".into(),
            port: 19535,
            client: "vndb-rs".into(),
            clientver: env!("CARGO_PKG_VERSION").into(),
            credentials: None,
        }
    }
}

impl SessionConfig {
    /// The default configuration with credentials attached.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
            ..Self::default()
        }
    }
}

/// Account credentials, immutable for the session's lifetime.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    /// Account name.
    pub username: String,
    /// Account password, sent only inside the login payload.
    pub password: String,
}

impl Credentials {
    /// Build a credentials pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Manual impl so passwords never end up in logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.host, "api.vndb.org");
        assert_eq!(cfg.port, 19535);
        assert!(cfg.credentials.is_none());
    }

    #[test]
    fn default_identity_is_nonempty() {
        let cfg = SessionConfig::default();
        assert!(!cfg.client.is_empty());
        assert!(!cfg.clientver.is_empty());
    }

    #[test]
    fn with_credentials_attaches_them() {
        let cfg = SessionConfig::with_credentials(Credentials::new("alice", "hunter2"));
        assert_eq!(cfg.credentials.unwrap().username, "alice");
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }
}
