//! Access policy shared by the server route guard and the client-side page check.
//!
//! Both call sites evaluate the same table; nothing in here performs I/O, so
//! the whole policy can be exercised without a session or profile store.

use crate::{models::{Profile, Role}, onboarding::Step};

// ── Well-known paths ──────────────────────────────────────────

pub const LANDING:           &str = "/";
pub const SIGN_IN_REQUIRED:  &str = "/?login=required";
pub const SESSION_EXPIRED:   &str = "/?login=required&error=session_expired";
pub const ROLE_SELECTION:    &str = "/?new_user=true";
pub const AUTH_ERROR:        &str = "/?error=auth_error";
pub const PROFILE_UNAVAILABLE: &str = "/?error=profile_unavailable";

pub fn dashboard_path(role: Role) -> &'static str {
    match role {
        Role::Student  => "/student/dashboard",
        Role::Employer => "/employer/dashboard",
    }
}

pub fn first_onboarding_path(role: Role) -> String {
    Step::first(role).path()
}

fn namespace_prefix(role: Role) -> &'static str {
    match role {
        Role::Student  => "/student",
        Role::Employer => "/employer",
    }
}

// ── Route classification ──────────────────────────────────────

/// What the guard needs to know about a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteClass {
    /// The role namespace the path lives under, if any.
    pub namespace:  Option<Role>,
    pub onboarding: bool,
}

impl RouteClass {
    pub fn classify(path: &str) -> Self {
        let namespace = Role::ALL.into_iter().find(|role| {
            let prefix = namespace_prefix(*role);
            path.strip_prefix(prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        });
        RouteClass {
            namespace,
            onboarding: path.contains("/onboarding"),
        }
    }

    pub fn is_protected(&self) -> bool {
        self.namespace.is_some()
    }
}

// ── Decisions ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(String),
}

impl Decision {
    fn to(path: impl Into<String>) -> Self {
        Decision::Redirect(path.into())
    }
}

/// What the session lookup produced, stripped of the identity itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// The session store errored while validating the token.
    Failed,
    Anonymous,
    SignedIn,
}

/// First half of the guard: decide from the session alone.
///
/// `None` means the session is valid on a protected route and the profile
/// must be consulted via [`evaluate_route`].
pub fn evaluate_session(status: SessionStatus, route: RouteClass) -> Option<Decision> {
    if !route.is_protected() {
        return Some(Decision::Allow);
    }
    match status {
        SessionStatus::Failed    => Some(Decision::to(SESSION_EXPIRED)),
        SessionStatus::Anonymous => Some(Decision::to(SIGN_IN_REQUIRED)),
        SessionStatus::SignedIn  => None,
    }
}

/// Second half of the guard: decide from the signed-in identity's profile.
pub fn evaluate_route(profile: Option<&Profile>, route: RouteClass) -> Decision {
    let Some(namespace) = route.namespace else {
        return Decision::Allow;
    };
    let Some((role, completed)) = profile.and_then(|p| p.role.map(|r| (r, p.onboarding_completed))) else {
        return Decision::to(ROLE_SELECTION);
    };

    if role != namespace {
        return Decision::to(dashboard_path(role));
    }
    match (completed, route.onboarding) {
        (false, false) => Decision::to(first_onboarding_path(role)),
        (true, true)   => Decision::to(dashboard_path(role)),
        _              => Decision::Allow,
    }
}

/// Where the sign-in callback sends an identity once its session exists.
pub fn after_sign_in(profile: Option<&Profile>) -> String {
    match profile.and_then(|p| p.role.map(|r| (r, p.onboarding_completed))) {
        None               => ROLE_SELECTION.to_owned(),
        Some((role, false)) => first_onboarding_path(role),
        Some((role, true))  => dashboard_path(role).to_owned(),
    }
}

// ── Page-level check ──────────────────────────────────────────

/// Result of the page-level check. The caller performs the navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequireAuth {
    pub should_redirect: bool,
    pub redirect_path:   Option<String>,
}

impl RequireAuth {
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn go(path: impl Into<String>) -> Self {
        RequireAuth { should_redirect: true, redirect_path: Some(path.into()) }
    }
}

/// Page-level decision, first match wins:
/// unauthenticated, then role mismatch, then unfinished onboarding.
pub fn evaluate_page(
    is_authenticated: bool,
    profile: Option<&Profile>,
    required_role: Option<Role>,
) -> RequireAuth {
    if !is_authenticated {
        return RequireAuth::go(SIGN_IN_REQUIRED);
    }

    let actual = profile.and_then(|p| p.role);
    if let Some(required) = required_role {
        if actual != Some(required) {
            return match actual {
                Some(role) => RequireAuth::go(dashboard_path(role)),
                None       => RequireAuth::go(LANDING),
            };
        }
    }

    match profile {
        Some(p) if !p.onboarding_completed => match p.role {
            Some(role) => RequireAuth::go(first_onboarding_path(role)),
            None       => RequireAuth::go(ROLE_SELECTION),
        },
        _ => RequireAuth::stay(),
    }
}
