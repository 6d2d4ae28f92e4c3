//! Page endpoints: the landing page and the two role namespaces.
//!
//! The route guard has already run by the time these handlers see a request.
//! Dashboards still re-read the profile and re-apply the same policy, since
//! the guard lets requests through when its own profile lookup errors.

use axum::{
    extract::{Path, Query, Request, State},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::{
    access::{self, Decision, RouteClass},
    errors::{AppError, AppResult},
    landing::{LandingIntent, LandingQuery},
    models::{EmployerProfile, Identity, Role, StudentProfile},
    onboarding::Step,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(landing))
        .route("/student/dashboard", get(student_dashboard))
        .route("/employer/dashboard", get(employer_dashboard))
        .route("/student/onboarding/{step}", get(student_step))
        .route("/employer/onboarding/{step}", get(employer_step))
}

// ── Response types ────────────────────────────────────────────

#[derive(Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
enum Dashboard {
    Student { profile: StudentProfile },
    Employer { profile: EmployerProfile },
}

#[derive(Serialize)]
struct StepPage {
    role:     Role,
    step:     &'static str,
    index:    usize,
    total:    usize,
    is_final: bool,
    next:     Option<String>,
}

// ── Handlers ──────────────────────────────────────────────────

/// GET /: which modal the landing page opens.
async fn landing(Query(query): Query<LandingQuery>) -> Json<LandingIntent> {
    Json(LandingIntent::from_query(&query))
}

async fn student_dashboard(State(state): State<AppState>, req: Request) -> AppResult<Response> {
    let (path, identity) = guard_context(req);
    dashboard(&state, identity, &path, Role::Student).await
}

async fn employer_dashboard(State(state): State<AppState>, req: Request) -> AppResult<Response> {
    let (path, identity) = guard_context(req);
    dashboard(&state, identity, &path, Role::Employer).await
}

/// Path plus the identity the route guard attached to the request.
fn guard_context(req: Request) -> (String, Option<Identity>) {
    let (parts, _) = req.into_parts();
    (parts.uri.path().to_owned(), parts.extensions.get::<Identity>().cloned())
}

async fn dashboard(
    state: &AppState,
    identity: Option<Identity>,
    path: &str,
    role: Role,
) -> AppResult<Response> {
    let Some(identity) = identity else {
        return Ok(Redirect::temporary(access::SIGN_IN_REQUIRED).into_response());
    };

    // Stricter than the guard: a failed lookup here is an error, not a pass.
    let profile = state.profiles.get_profile(identity.id).await.map_err(|err| {
        tracing::error!(user_id = %identity.id, error = %err, "Dashboard profile lookup failed");
        AppError::Unavailable
    })?;
    if let Decision::Redirect(to) = access::evaluate_route(profile.as_ref(), RouteClass::classify(path)) {
        return Ok(Redirect::temporary(&to).into_response());
    }

    let dashboard = match role {
        Role::Student => Dashboard::Student {
            profile: state
                .profiles
                .student_profile(identity.id)
                .await?
                .ok_or(AppError::NotFound)?,
        },
        Role::Employer => Dashboard::Employer {
            profile: state
                .profiles
                .employer_profile(identity.id)
                .await?
                .ok_or(AppError::NotFound)?,
        },
    };
    Ok(Json(dashboard).into_response())
}

async fn student_step(Path(step): Path<String>) -> AppResult<Json<StepPage>> {
    step_page(Role::Student, &step)
}

async fn employer_step(Path(step): Path<String>) -> AppResult<Json<StepPage>> {
    step_page(Role::Employer, &step)
}

fn step_page(role: Role, slug: &str) -> AppResult<Json<StepPage>> {
    let step = Step::parse(role, slug).ok_or(AppError::NotFound)?;
    Ok(Json(StepPage {
        role,
        step:     step.slug(),
        index:    step.index(),
        total:    Step::for_role(role).len(),
        is_final: step.is_final(),
        next:     step.next().map(Step::path),
    }))
}
