//! Process-wide auth state for a client.
//!
//! Mirrors the session layer into one watchable [`AuthState`] so that every
//! consumer reads the same answer without re-asking the network.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, Weak,
};

use thiserror::Error;
use tokio::{
    sync::{broadcast::error::RecvError, watch},
    task::JoinHandle,
};

use super::session::{AuthChange, SessionClient};
use crate::{
    access::{self, RequireAuth},
    auth::{Session, SessionError},
    models::{Identity, Profile, Role},
    store::ProfileStore,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    /// There is no session layer to ask at all.
    #[error("authentication service unavailable")]
    ServiceUnavailable,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("could not load profile: {0}")]
    Profile(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    pub user:             Option<Identity>,
    pub session:          Option<Session>,
    pub profile:          Option<Profile>,
    pub is_loading:       bool,
    pub is_authenticated: bool,
    pub error:            Option<AuthError>,
}

impl AuthState {
    pub fn loading() -> Self {
        AuthState {
            user: None,
            session: None,
            profile: None,
            is_loading: true,
            is_authenticated: false,
            error: None,
        }
    }

    pub fn signed_out() -> Self {
        AuthState { is_loading: false, ..Self::loading() }
    }

    pub fn failed(error: AuthError) -> Self {
        AuthState { error: Some(error), ..Self::signed_out() }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::loading()
    }
}

pub struct AuthContext {
    session:  Option<Arc<dyn SessionClient>>,
    profiles: Arc<dyn ProfileStore>,
    state:    watch::Sender<AuthState>,
    mounted:  AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl AuthContext {
    /// `session` is `None` when the process has no session layer to talk to;
    /// mounting then fails closed with [`AuthError::ServiceUnavailable`].
    pub fn new(session: Option<Arc<dyn SessionClient>>, profiles: Arc<dyn ProfileStore>) -> Arc<Self> {
        let (state, _) = watch::channel(AuthState::loading());
        Arc::new(Self {
            session,
            profiles,
            state,
            mounted: AtomicBool::new(false),
            listener: Mutex::new(None),
        })
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Load the current session and start following auth changes.
    pub async fn mount(self: &Arc<Self>) {
        self.mounted.store(true, Ordering::SeqCst);

        let Some(session) = self.session.clone() else {
            tracing::error!("No session layer available; auth context failing closed");
            self.publish(AuthState::failed(AuthError::ServiceUnavailable));
            return;
        };

        // Subscribe before the first fetch so no transition slips between them.
        let mut changes = session.subscribe();

        let initial = match session.get_session().await {
            Err(err)       => AuthState::failed(err.into()),
            Ok(None)       => AuthState::signed_out(),
            Ok(Some(held)) => self.load_signed_in(held).await,
        };
        self.publish(initial);

        // Checked under the slot lock so a concurrent unmount either sees the
        // listener or stops it from being started.
        let Ok(mut slot) = self.listener.lock() else { return };
        if !self.is_mounted() {
            tracing::debug!("Unmounted during initial session load; not following changes");
            return;
        }

        let weak: Weak<Self> = Arc::downgrade(self);
        let handle = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) => {
                        let Some(ctx) = weak.upgrade() else { break };
                        ctx.apply(change).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth change listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    /// Stop following changes; later results are discarded.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
        if let Ok(mut slot) = self.listener.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.session.as_ref().ok_or(AuthError::ServiceUnavailable)?;
        session.sign_out().await?;
        self.publish(AuthState::signed_out());
        Ok(())
    }

    /// Re-read the current user's profile. Does nothing when signed out.
    pub async fn refresh_profile(&self) {
        let current = self.state();
        let Some(user) = current.user.as_ref().filter(|_| current.is_authenticated) else {
            return;
        };

        let next = match self.profiles.get_profile(user.id).await {
            Ok(profile) => AuthState { profile, error: None, ..current.clone() },
            Err(err) => AuthState {
                error: Some(AuthError::Profile(err.to_string())),
                ..current.clone()
            },
        };
        self.publish(next);
    }

    /// Page-level check; stays put while the state is still loading.
    pub fn require_auth(&self, required_role: Option<Role>) -> RequireAuth {
        let state = self.state.borrow();
        if state.is_loading {
            return RequireAuth::stay();
        }
        access::evaluate_page(state.is_authenticated, state.profile.as_ref(), required_role)
    }

    async fn apply(&self, change: AuthChange) {
        match change {
            AuthChange::SignedOut => self.publish(AuthState::signed_out()),
            AuthChange::SignedIn(session) | AuthChange::TokenRefreshed(session) => {
                let held = self.state.borrow().session.as_ref().is_some_and(|current| {
                    current.access_token == session.access_token && current.user.id == session.user.id
                });
                if held {
                    tracing::debug!(user_id = %session.user.id, "Auth change matches held session");
                    return;
                }
                let next = self.load_signed_in(session).await;
                self.publish(next);
            }
        }
    }

    async fn load_signed_in(&self, session: Session) -> AuthState {
        let user = session.user.clone();
        let (profile, error) = match self.profiles.get_profile(user.id).await {
            Ok(profile) => (profile, None),
            Err(err) => {
                tracing::warn!(user_id = %user.id, error = %err, "Profile fetch failed");
                (None, Some(AuthError::Profile(err.to_string())))
            }
        };
        AuthState {
            user: Some(user),
            session: Some(session),
            profile,
            is_loading: false,
            is_authenticated: true,
            error,
        }
    }

    fn publish(&self, next: AuthState) {
        if !self.is_mounted() {
            tracing::debug!("Discarding auth state update after unmount");
            return;
        }
        self.state.send_replace(next);
    }
}

impl Drop for AuthContext {
    fn drop(&mut self) {
        self.unmount();
    }
}
