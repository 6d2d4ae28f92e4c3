//! Landing page query flags.
//!
//! `?login=true|required`, `?signup=true` and `?new_user=true` are read once
//! when the landing page loads to decide which modal opens. `required` means
//! the visitor was bounced here from a protected route.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LandingQuery {
    pub login:    Option<String>,
    pub signup:   Option<String>,
    pub new_user: Option<String>,
    pub error:    Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Modal {
    SignIn,
    SignUp,
    ChooseRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LandingIntent {
    pub modal:   Option<Modal>,
    /// Sent here by the route guard rather than by choice.
    pub bounced: bool,
    pub error:   Option<String>,
}

const KNOWN_ERRORS: &[&str] = &["session_expired", "auth_error", "profile_unavailable"];

impl LandingIntent {
    /// Role choice wins over sign-in, which wins over sign-up.
    pub fn from_query(query: &LandingQuery) -> Self {
        let is = |v: &Option<String>, want: &str| v.as_deref() == Some(want);

        let bounced = is(&query.login, "required");
        let modal = if is(&query.new_user, "true") {
            Some(Modal::ChooseRole)
        } else if bounced || is(&query.login, "true") {
            Some(Modal::SignIn)
        } else if is(&query.signup, "true") {
            Some(Modal::SignUp)
        } else {
            None
        };

        let error = query
            .error
            .as_deref()
            .filter(|e| KNOWN_ERRORS.contains(e))
            .map(str::to_owned);

        LandingIntent { modal, bounced, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(login: Option<&str>, signup: Option<&str>, new_user: Option<&str>, error: Option<&str>) -> LandingQuery {
        LandingQuery {
            login:    login.map(str::to_owned),
            signup:   signup.map(str::to_owned),
            new_user: new_user.map(str::to_owned),
            error:    error.map(str::to_owned),
        }
    }

    #[test]
    fn no_flags_opens_nothing() {
        let intent = LandingIntent::from_query(&LandingQuery::default());
        assert_eq!(intent, LandingIntent { modal: None, bounced: false, error: None });
    }

    #[test]
    fn login_required_is_a_bounce() {
        let intent = LandingIntent::from_query(&query(Some("required"), None, None, Some("session_expired")));
        assert_eq!(intent.modal, Some(Modal::SignIn));
        assert!(intent.bounced);
        assert_eq!(intent.error.as_deref(), Some("session_expired"));
    }

    #[test]
    fn new_user_takes_priority() {
        let intent = LandingIntent::from_query(&query(Some("true"), Some("true"), Some("true"), None));
        assert_eq!(intent.modal, Some(Modal::ChooseRole));
        assert!(!intent.bounced);
    }

    #[test]
    fn signup_and_unknown_values() {
        assert_eq!(
            LandingIntent::from_query(&query(None, Some("true"), None, None)).modal,
            Some(Modal::SignUp)
        );
        assert_eq!(LandingIntent::from_query(&query(Some("yes"), None, None, None)).modal, None);
    }

    #[test]
    fn unknown_error_codes_are_dropped() {
        let intent = LandingIntent::from_query(&query(None, None, None, Some("<script>")));
        assert_eq!(intent.error, None);
    }
}
