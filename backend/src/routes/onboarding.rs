//! `PUT /onboarding/{role}/{step}`: save one onboarding step.
//!
//! Each role's routes sit behind that role's guard, so a student can never
//! write an employer slice and vice versa.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::put,
    Json, Router,
};
use serde::Serialize;

use crate::{
    errors::{AppError, AppResult},
    middleware::{
        auth_guard::AuthUser,
        role_guard::{require_employer, require_student},
    },
    models::Role,
    onboarding::{self, OnboardingSlice, Step},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/onboarding/student/{step}",
            put(save_student_step).route_layer(middleware::from_fn(require_student)),
        )
        .route(
            "/onboarding/employer/{step}",
            put(save_employer_step).route_layer(middleware::from_fn(require_employer)),
        )
}

#[derive(Serialize)]
struct StepSaved {
    step:      &'static str,
    completed: bool,
    /// Where the client navigates next.
    next:      String,
}

async fn save_student_step(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(step): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<StepSaved>> {
    save(&state, &user, Role::Student, &step, body).await
}

async fn save_employer_step(
    Extension(user): Extension<AuthUser>,
    State(state): State<AppState>,
    Path(step): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<StepSaved>> {
    save(&state, &user, Role::Employer, &step, body).await
}

async fn save(
    state: &AppState,
    user: &AuthUser,
    role: Role,
    slug: &str,
    body: serde_json::Value,
) -> AppResult<Json<StepSaved>> {
    let step  = Step::parse(role, slug).ok_or(AppError::NotFound)?;
    let slice = OnboardingSlice::from_json(step, body)?;

    let next = onboarding::save_step(state.profiles.as_ref(), user.identity.id, &slice)
        .await
        .inspect_err(|err| {
            tracing::warn!(user_id = %user.identity.id, step = step.slug(), error = %err, "Onboarding save failed");
        })?;

    Ok(Json(StepSaved {
        step:      step.slug(),
        completed: step.is_final(),
        next,
    }))
}
