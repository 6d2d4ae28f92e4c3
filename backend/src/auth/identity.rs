//! HTTP client for the hosted identity provider.
//!
//! Speaks the provider's REST surface:
//!
//! * `GET  /auth/v1/user`: who owns this access token
//! * `POST /auth/v1/token?grant_type=refresh_token`: rotate a token pair
//! * `POST /auth/v1/token?grant_type=pkce`: exchange an auth code
//! * `POST /auth/v1/logout`: revoke the session
//!
//! Responses are decoded into wire structs and narrowed into [`Identity`] /
//! [`Session`] here, so nothing downstream sees the provider's JSON.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{Session, SessionError, SessionLookup, SessionStore, SessionTokens};
use crate::models::Identity;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct IdentityClient {
    http:     reqwest::Client,
    base_url: String,
    api_key:  String,
}

impl IdentityClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key:  api_key.to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    /// `Ok(None)` when the provider does not recognise the access token.
    async fn fetch_user(&self, access_token: &str) -> Result<Option<Identity>, SessionError> {
        let res = self
            .http
            .get(self.url("user"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            s if s.is_success() => {
                let user: WireUser = res.json().await.map_err(|e| {
                    SessionError::Rejected(format!("malformed user response: {e}"))
                })?;
                Ok(Some(user.try_into()?))
            }
            s => Err(status_error(s)),
        }
    }

    async fn grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session, SessionError> {
        let res = self
            .http
            .post(self.url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = res.status();
        if !status.is_success() {
            return Err(status_error(status));
        }
        let wire: WireSession = res
            .json()
            .await
            .map_err(|e| SessionError::Rejected(format!("malformed token response: {e}")))?;
        wire.try_into()
    }
}

#[async_trait]
impl SessionStore for IdentityClient {
    async fn validate(&self, tokens: &SessionTokens) -> SessionLookup {
        if tokens.is_empty() {
            return SessionLookup::anonymous();
        }

        if let Some(access) = tokens.access.as_deref() {
            match self.fetch_user(access).await {
                Ok(Some(user)) => return SessionLookup::signed_in(user),
                Ok(None)       => {}
                Err(err)       => return SessionLookup::failed(err),
            }
        }

        let Some(refresh) = tokens.refresh.as_deref() else {
            return SessionLookup::failed(SessionError::Expired);
        };

        match self.grant("refresh_token", json!({ "refresh_token": refresh })).await {
            Ok(session) => {
                tracing::debug!(user_id = %session.user.id, "Session refreshed");
                SessionLookup {
                    outcome:   Ok(Some(session.user.clone())),
                    refreshed: Some(session),
                }
            }
            Err(SessionError::Rejected(reason)) => {
                tracing::debug!(%reason, "Refresh token rejected");
                SessionLookup::failed(SessionError::Expired)
            }
            Err(err) => SessionLookup::failed(err),
        }
    }

    async fn exchange_code(&self, code: &str, verifier: Option<&str>) -> Result<Session, SessionError> {
        self.grant("pkce", json!({ "auth_code": code, "code_verifier": verifier })).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SessionError> {
        let res = self
            .http
            .post(self.url("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        match res.status() {
            // Already gone is as good as signed out.
            s if s.is_success() || s == StatusCode::UNAUTHORIZED => Ok(()),
            s => Err(status_error(s)),
        }
    }
}

fn transport_error(err: reqwest::Error) -> SessionError {
    tracing::warn!(error = %err, "Identity provider request failed");
    SessionError::Unavailable
}

fn status_error(status: StatusCode) -> SessionError {
    if status.is_server_error() {
        SessionError::Unavailable
    } else {
        SessionError::Rejected(format!("status {status}"))
    }
}

// ── Wire types ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireUser {
    id:            String,
    email:         Option<String>,
    #[serde(default)]
    user_metadata: WireMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct WireMetadata {
    full_name: Option<String>,
    name:      Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireSession {
    access_token:  String,
    refresh_token: String,
    #[serde(default)]
    expires_in:    i64,
    user:          WireUser,
}

impl TryFrom<WireUser> for Identity {
    type Error = SessionError;

    fn try_from(user: WireUser) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&user.id)
            .map_err(|_| SessionError::Rejected(format!("malformed user id {:?}", user.id)))?;
        let display_name = user
            .user_metadata
            .full_name
            .or(user.user_metadata.name)
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty());
        Ok(Identity {
            id,
            email: user.email.filter(|e| !e.is_empty()),
            display_name,
        })
    }
}

impl TryFrom<WireSession> for Session {
    type Error = SessionError;

    fn try_from(wire: WireSession) -> Result<Self, Self::Error> {
        if wire.access_token.is_empty() || wire.refresh_token.is_empty() {
            return Err(SessionError::Rejected("token response without tokens".into()));
        }
        Ok(Session {
            access_token:  wire.access_token,
            refresh_token: wire.refresh_token,
            expires_in:    wire.expires_in,
            user:          wire.user.try_into()?,
        })
    }
}
