//! Route guard for the `/student` and `/employer` page namespaces.
//!
//! Runs on every request. Public paths pass through untouched; protected
//! paths are only served to a signed-in identity whose profile role matches
//! the namespace and whose onboarding state fits the path. Everything else is
//! answered with a redirect.
//!
//! Refreshed session cookies are written to the cookie jar before any
//! decision is made, so redirects carry them exactly like pass-throughs do.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;

use crate::{
    access::{self, Decision, RouteClass, SessionStatus},
    auth::{set_session_cookies, SessionTokens},
    state::AppState,
};

pub async fn route_guard(
    State(state): State<AppState>,
    cookies: Cookies,
    mut req: Request,
    next: Next,
) -> Response {
    let path  = req.uri().path().to_owned();
    let route = RouteClass::classify(&path);

    let tokens = SessionTokens::from_cookies(&cookies);
    let lookup = state.sessions.validate(&tokens).await;
    if let Some(fresh) = &lookup.refreshed {
        set_session_cookies(&cookies, fresh, state.config.cookie_secure);
    }

    let (status, identity) = match lookup.outcome {
        Ok(Some(identity)) => (SessionStatus::SignedIn, Some(identity)),
        Ok(None)           => (SessionStatus::Anonymous, None),
        Err(err) => {
            if route.is_protected() {
                tracing::warn!(%path, error = %err, "Session validation failed on protected route");
            }
            (SessionStatus::Failed, None)
        }
    };

    if let Some(decision) = access::evaluate_session(status, route) {
        if let Some(identity) = identity {
            req.extensions_mut().insert(identity);
        }
        return respond(decision, req, next).await;
    }

    // Signed in on a protected route: the profile decides.
    let Some(identity) = identity else {
        return redirect(access::SIGN_IN_REQUIRED);
    };

    let profile = match state.profiles.get_profile(identity.id).await {
        Ok(profile) => profile,
        Err(err) if state.config.guard_fail_open => {
            tracing::error!(
                user_id = %identity.id, %path, error = %err,
                "Profile lookup failed; deferring the check to the page"
            );
            req.extensions_mut().insert(identity);
            return next.run(req).await;
        }
        Err(err) => {
            tracing::error!(user_id = %identity.id, %path, error = %err, "Profile lookup failed");
            return redirect(access::PROFILE_UNAVAILABLE);
        }
    };

    let decision = access::evaluate_route(profile.as_ref(), route);
    if let Decision::Redirect(to) = &decision {
        tracing::debug!(user_id = %identity.id, %path, to = %to, "Route guard redirect");
    }
    req.extensions_mut().insert(identity);
    respond(decision, req, next).await
}

async fn respond(decision: Decision, req: Request, next: Next) -> Response {
    match decision {
        Decision::Allow        => next.run(req).await,
        Decision::Redirect(to) => redirect(&to),
    }
}

fn redirect(to: &str) -> Response {
    Redirect::temporary(to).into_response()
}
