pub mod access;
pub mod auth;
pub mod bootstrap;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod landing;
pub mod middleware;
pub mod models;
pub mod onboarding;
pub mod routes;
pub mod state;
pub mod store;

use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{middleware::route_guard::route_guard, state::AppState};

/// The full application: pages and API behind the route guard.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::page_routes())
        .nest("/api/v1", routes::api_routes(state.clone()))
        .fallback(routes::not_found)
        .layer(axum::middleware::from_fn_with_state(state.clone(), route_guard))
        .layer(CookieManagerLayer::new())   // must wrap every cookie reader
        .layer(CorsLayer::permissive())     // tighten in production
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
