//! Ambient session registry.
//!
//! A [`Registry`] maps the zero-argument ("global") handle to at most one
//! live [`Session`]. Local sessions never touch the registry: any number of
//! them coexist, independent of the global one and of each other.
//!
//! The slot lock is held across session creation, so two concurrent
//! `start_global` calls cannot both connect: the loser waits and then gets
//! [`SessionError::AlreadyRunning`].

use std::sync::OnceLock;

use tokio::sync::Mutex;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::session::Session;

/// Registry holding the ambient ("global") session slot.
#[derive(Default)]
pub struct Registry {
    slot: Mutex<Option<Session>>,
}

impl Registry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a session and install it as the global one.
    ///
    /// Fails with [`SessionError::AlreadyRunning`] if a global session is
    /// already installed. Retryable after [`Registry::stop_global`].
    pub async fn start_global(&self, config: SessionConfig) -> Result<Session, SessionError> {
        self.start_global_with(|| Session::connect(config)).await
    }

    /// Like [`Registry::start_global`], but with a caller-supplied connect
    /// step: the seam for sessions over alternative transports (see
    /// [`Session::handshake`]).
    pub async fn start_global_with<F, Fut>(&self, connect: F) -> Result<Session, SessionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Session, SessionError>>,
    {
        let mut slot = self.slot.lock().await;
        if slot.is_some() {
            return Err(SessionError::AlreadyRunning);
        }
        let session = connect().await?;
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Close and remove the global session. Returns `false` (and does
    /// nothing) if none was running.
    pub async fn stop_global(&self) -> bool {
        let mut slot = self.slot.lock().await;
        match slot.take() {
            Some(session) => {
                session.close().await;
                true
            }
            None => false,
        }
    }

    /// The live global session, if any.
    pub async fn current(&self) -> Option<Session> {
        self.slot.lock().await.clone()
    }
}

/// Connect a session addressed only by its returned handle, leaving the
/// registry untouched.
pub async fn start_local(config: SessionConfig) -> Result<Session, SessionError> {
    Session::connect(config).await
}

/// The process-wide registry behind the ambient handle.
pub fn global() -> &'static Registry {
    static GLOBAL: OnceLock<Registry> = OnceLock::new();
    GLOBAL.get_or_init(Registry::new)
}
