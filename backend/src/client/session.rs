use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use crate::auth::{Session, SessionError, SessionStore, SessionTokens};

const CHANGE_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq)]
pub enum AuthChange {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

/// What the auth context needs from the session layer.
#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn get_session(&self) -> Result<Option<Session>, SessionError>;

    async fn sign_out(&self) -> Result<(), SessionError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;
}

/// The one session object a client process holds.
///
/// Keeps the current token pair, re-validates it against the provider on
/// `get_session`, and broadcasts every transition to subscribers.
pub struct BrowserSession {
    store:   Arc<dyn SessionStore>,
    current: RwLock<Option<Session>>,
    changes: broadcast::Sender<AuthChange>,
}

impl BrowserSession {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self { store, current: RwLock::new(None), changes }
    }

    /// Finish the provider redirect: exchange the code and sign in.
    pub async fn sign_in_with_code(
        &self,
        code: &str,
        verifier: Option<&str>,
    ) -> Result<Session, SessionError> {
        let session = self.store.exchange_code(code, verifier).await?;
        self.restore(session.clone()).await;
        Ok(session)
    }

    /// Adopt a session persisted elsewhere (e.g. cookies from a previous run).
    pub async fn restore(&self, session: Session) {
        *self.current.write().await = Some(session.clone());
        self.emit(AuthChange::SignedIn(session));
    }

    fn emit(&self, change: AuthChange) {
        // No subscribers is fine.
        let _ = self.changes.send(change);
    }
}

#[async_trait]
impl SessionClient for BrowserSession {
    async fn get_session(&self) -> Result<Option<Session>, SessionError> {
        let Some(held) = self.current.read().await.clone() else {
            return Ok(None);
        };

        let lookup = self.store.validate(&SessionTokens::from(&held)).await;
        let mut session = held;
        if let Some(fresh) = lookup.refreshed {
            *self.current.write().await = Some(fresh.clone());
            self.emit(AuthChange::TokenRefreshed(fresh.clone()));
            session = fresh;
        }

        match lookup.outcome? {
            Some(user) => {
                session.user = user;
                Ok(Some(session))
            }
            None => {
                *self.current.write().await = None;
                self.emit(AuthChange::SignedOut);
                Ok(None)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        let held = self.current.write().await.take();
        let revoked = match held {
            Some(session) => self.store.sign_out(&session.access_token).await,
            None          => Ok(()),
        };
        self.emit(AuthChange::SignedOut);
        revoked
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }
}

/// Lazily constructs the process's [`BrowserSession`] on first use and hands
/// out the same instance from then on.
pub struct SessionHandle {
    store: Arc<dyn SessionStore>,
    cell:  OnceLock<Arc<BrowserSession>>,
}

impl SessionHandle {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store, cell: OnceLock::new() }
    }

    pub fn get(&self) -> Arc<BrowserSession> {
        self.cell
            .get_or_init(|| Arc::new(BrowserSession::new(self.store.clone())))
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}
