use axum::{middleware, Router};
use crate::{
    errors::AppError,
    middleware::auth_guard::require_auth,
    state::AppState,
};

mod auth;
mod onboarding;
mod pages;

/// Build the `/api/v1` router.
///
/// Logout is left unprotected; every other route is wrapped in the
/// session-based [`require_auth`] middleware.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let auth_mw = middleware::from_fn_with_state(state, require_auth);
    Router::new()
        .merge(auth::public_router())
        .merge(
            Router::new()
                .merge(auth::router())
                .merge(onboarding::router())
                .route_layer(auth_mw),
        )
}

/// Landing page, sign-in callback and the guarded role namespaces.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .merge(pages::router())
        .merge(auth::callback_router())
}

/// Unmatched paths. Still behind the route guard, so a protected path only
/// reaches this once the guard has allowed it.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
