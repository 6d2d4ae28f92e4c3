//! Role-based authorization guards for the JSON API.

use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

use crate::errors::AppError;
use crate::middleware::auth_guard::AuthUser;
use crate::models::Role;

fn require_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    match user.profile.as_ref().and_then(|p| p.role) {
        Some(actual) if actual == role => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

/// Middleware: require a profile with the `student` role.
pub async fn require_student(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&user, Role::Student)?;
    Ok(next.run(req).await)
}

/// Middleware: require a profile with the `employer` role.
pub async fn require_employer(
    Extension(user): Extension<AuthUser>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    require_role(&user, Role::Employer)?;
    Ok(next.run(req).await)
}
