use axum::{
    extract::{Extension, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::{
    access,
    auth::{clear_cookie, clear_session_cookies, set_session_cookies, SessionTokens, VERIFIER_COOKIE},
    bootstrap::{self, RoleSelection},
    errors::AppResult,
    middleware::auth_guard::AuthUser,
    models::{Identity, Profile, Role},
    state::AppState,
};

// ── Request / response types ──────────────────────────────────

#[derive(Deserialize)]
struct CallbackQuery {
    code:  Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct SelectRoleRequest {
    role: Role,
}

#[derive(Serialize)]
struct MeResponse {
    user:    Identity,
    profile: Option<Profile>,
}

// ── Routers ───────────────────────────────────────────────────

/// The provider redirects here after sign-in; lives outside `/api/v1`.
pub fn callback_router() -> Router<AppState> {
    Router::new().route("/auth/callback", get(callback))
}

pub fn public_router() -> Router<AppState> {
    Router::new().route("/auth/logout", post(logout))
}

/// Routes that need an `AuthUser`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/me",   get(me))
        .route("/auth/role", post(select_role))
}

// ── Handlers ──────────────────────────────────────────────────

/// GET /auth/callback: exchange the provider's code and route the new session.
async fn callback(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<CallbackQuery>,
) -> Redirect {
    if let Some(reason) = query.error {
        tracing::warn!(%reason, "Identity provider returned an error to the callback");
        return Redirect::to(access::AUTH_ERROR);
    }
    let Some(code) = query.code.filter(|c| !c.is_empty()) else {
        return Redirect::to(access::AUTH_ERROR);
    };

    let verifier = cookies.get(VERIFIER_COOKIE).map(|c| c.value().to_owned());
    let session = match state.sessions.exchange_code(&code, verifier.as_deref()).await {
        Ok(session) => session,
        Err(err) => {
            tracing::warn!(error = %err, "Auth code exchange failed");
            return Redirect::to(access::AUTH_ERROR);
        }
    };
    set_session_cookies(&cookies, &session, state.config.cookie_secure);
    if verifier.is_some() {
        clear_cookie(&cookies, VERIFIER_COOKIE);
    }

    match state.profiles.get_profile(session.user.id).await {
        Ok(profile) => Redirect::to(&access::after_sign_in(profile.as_ref())),
        Err(err) => {
            tracing::error!(user_id = %session.user.id, error = %err, "Profile lookup failed after sign-in");
            Redirect::to(access::AUTH_ERROR)
        }
    }
}

/// POST /auth/logout: revoke the session at the provider and clear cookies.
async fn logout(State(state): State<AppState>, cookies: Cookies) -> impl IntoResponse {
    let tokens = SessionTokens::from_cookies(&cookies);
    if let Some(access_token) = tokens.access.as_deref() {
        // Best-effort; the cookies go either way.
        if let Err(err) = state.sessions.sign_out(access_token).await {
            tracing::warn!(error = %err, "Provider sign-out failed");
        }
    }
    clear_session_cookies(&cookies);
    StatusCode::NO_CONTENT
}

/// GET /auth/me: the signed-in identity and its profile (null before role selection).
async fn me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse { user: user.identity, profile: user.profile })
}

/// POST /auth/role: one-time role selection for a brand-new identity.
async fn select_role(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
    Json(body): Json<SelectRoleRequest>,
) -> AppResult<impl IntoResponse> {
    let selection: RoleSelection = bootstrap::select_role(state.profiles.as_ref(), &user.identity, body.role)
        .await
        .inspect_err(|err| {
            tracing::warn!(user_id = %user.identity.id, role = %body.role, error = %err, "Role selection failed");
        })?;

    Ok((StatusCode::CREATED, Json(selection)))
}
