pub mod identity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Duration as CookieDuration;
use tower_cookies::{cookie::SameSite, Cookie, Cookies};

use crate::models::Identity;

pub use identity::IdentityClient;

// ── Session cookie constants ──────────────────────────────────

pub const ACCESS_COOKIE:   &str = "access_token";
pub const REFRESH_COOKIE:  &str = "refresh_token";
/// PKCE verifier stored before redirecting to the provider.
pub const VERIFIER_COOKIE: &str = "code_verifier";
const SESSION_DAYS:        i64  = 30;

// ── Types ─────────────────────────────────────────────────────

/// A session issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token:  String,
    pub refresh_token: String,
    /// Seconds until `access_token` expires.
    pub expires_in:    i64,
    pub user:          Identity,
}

/// Tokens as they arrived on the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTokens {
    pub access:  Option<String>,
    pub refresh: Option<String>,
}

impl SessionTokens {
    pub fn from_cookies(cookies: &Cookies) -> Self {
        let read = |name: &str| {
            cookies
                .get(name)
                .map(|c| c.value().to_owned())
                .filter(|v| !v.is_empty())
        };
        SessionTokens {
            access:  read(ACCESS_COOKIE),
            refresh: read(REFRESH_COOKIE),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_none() && self.refresh.is_none()
    }
}

impl From<&Session> for SessionTokens {
    fn from(session: &Session) -> Self {
        SessionTokens {
            access:  Some(session.access_token.clone()),
            refresh: Some(session.refresh_token.clone()),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    /// The identity provider could not be reached at all.
    #[error("identity service unavailable")]
    Unavailable,
    /// The tokens were rejected and could not be refreshed.
    #[error("session expired")]
    Expired,
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),
}

/// Result of validating a request's tokens against the session store.
///
/// `refreshed` carries a rotated token pair whenever the store issued one,
/// even when `outcome` is an error; callers must write it back to the client.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLookup {
    pub refreshed: Option<Session>,
    pub outcome:   Result<Option<Identity>, SessionError>,
}

impl SessionLookup {
    pub fn anonymous() -> Self {
        SessionLookup { refreshed: None, outcome: Ok(None) }
    }

    pub fn signed_in(user: Identity) -> Self {
        SessionLookup { refreshed: None, outcome: Ok(Some(user)) }
    }

    pub fn failed(err: SessionError) -> Self {
        SessionLookup { refreshed: None, outcome: Err(err) }
    }
}

/// The managed identity/session provider.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Re-validate tokens with the provider, refreshing them if needed.
    async fn validate(&self, tokens: &SessionTokens) -> SessionLookup;

    /// Exchange an authorization code from the sign-in redirect for a session.
    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<Session, SessionError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), SessionError>;
}

// ── Cookie helpers ────────────────────────────────────────────

pub fn set_session_cookies(cookies: &Cookies, session: &Session, secure: bool) {
    for (name, value) in [
        (ACCESS_COOKIE, &session.access_token),
        (REFRESH_COOKIE, &session.refresh_token),
    ] {
        let cookie = Cookie::build((name, value.clone()))
            .http_only(true)
            .secure(secure)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(CookieDuration::days(SESSION_DAYS))
            .build();
        cookies.add(cookie);
    }
}

pub fn clear_session_cookies(cookies: &Cookies) {
    for name in [ACCESS_COOKIE, REFRESH_COOKIE, VERIFIER_COOKIE] {
        clear_cookie(cookies, name);
    }
}

pub fn clear_cookie(cookies: &Cookies, name: &'static str) {
    let cookie = Cookie::build((name, ""))
        .http_only(true)
        .path("/")
        .max_age(CookieDuration::ZERO)
        .build();
    cookies.add(cookie);
}
