//! Authentication guard middleware for the JSON API.
//!
//! Reads the session cookies, validates them with the session store (unless
//! the route guard already did for this request), loads the profile, and
//! injects an `AuthUser` extension for downstream handlers. Failures are
//! 401/503 responses rather than redirects.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    auth::{set_session_cookies, SessionTokens},
    errors::AppError,
    models::{Identity, Profile},
    state::AppState,
};

/// Authenticated identity plus its profile, if one has been created yet.
/// Injected into request extensions by `require_auth`; downstream handlers use
/// `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: Identity,
    pub profile:  Option<Profile>,
}

/// Middleware: require any valid session.
/// On success, inserts `AuthUser` into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = match req.extensions().get::<Identity>() {
        Some(identity) => identity.clone(),
        None => {
            let tokens = SessionTokens::from_cookies(&cookies);
            if tokens.is_empty() {
                return Err(AppError::Unauthorized);
            }
            let lookup = state.sessions.validate(&tokens).await;
            if let Some(fresh) = &lookup.refreshed {
                set_session_cookies(&cookies, fresh, state.config.cookie_secure);
            }
            lookup.outcome?.ok_or(AppError::Unauthorized)?
        }
    };

    // Unlike the page guard, the API fails closed on a profile lookup error.
    let profile = state.profiles.get_profile(identity.id).await?;

    req.extensions_mut().insert(AuthUser { identity, profile });

    Ok(next.run(req).await)
}
