//! Shared application state, injected into every handler via `axum::extract::State`.

use std::sync::Arc;

use crate::{auth::SessionStore, config::Config, store::ProfileStore};

/// Application-wide state passed via axum `State<AppState>`.
///
/// Both stores sit behind `Arc<dyn _>` so the server runs against the hosted
/// identity provider and MySQL while tests swap in in-memory fakes.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub config:   Config,
}
