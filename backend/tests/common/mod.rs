//! Shared fixtures: in-memory session and profile stores plus request helpers.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use campusgigs::{
    auth::{Session, SessionError, SessionLookup, SessionStore, SessionTokens, ACCESS_COOKIE},
    config::Config,
    models::{EmployerProfile, Identity, Profile, Role, RoleStub, StudentProfile},
    onboarding::{OnboardingSlice, SkillEntry, StudentPreferences},
    state::AppState,
    store::{ProfileStore, StoreError, StoreResult},
};

// ---------------------------------------------------------------------------
// Identities
// ---------------------------------------------------------------------------

pub fn identity(name: &str) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: Some(format!("{}@uni.ac.uk", name.split_whitespace().next().unwrap_or("x").to_lowercase())),
        display_name: Some(name.to_owned()),
    }
}

pub fn session_for(user: &Identity, tag: &str) -> Session {
    Session {
        access_token: format!("{tag}-access-{}", user.id),
        refresh_token: format!("{tag}-refresh-{}", user.id),
        expires_in: 3600,
        user: user.clone(),
    }
}

// ---------------------------------------------------------------------------
// Fake session store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeSessions {
    access: Mutex<HashMap<String, Identity>>,
    refresh: Mutex<HashMap<String, Identity>>,
    codes: Mutex<HashMap<String, Identity>>,
    failure: Mutex<Option<(SessionError, Option<Session>)>>,
    pub signed_out: Mutex<Vec<String>>,
    pub validations: AtomicUsize,
}

impl FakeSessions {
    /// Register a live access token for `user` and return it.
    pub fn sign_in(&self, user: &Identity) -> String {
        let token = format!("access-{}", user.id);
        self.access.lock().unwrap().insert(token.clone(), user.clone());
        token
    }

    pub fn revoke(&self, token: &str) {
        self.access.lock().unwrap().remove(token);
    }

    pub fn add_refresh_token(&self, token: &str, user: &Identity) {
        self.refresh.lock().unwrap().insert(token.to_owned(), user.clone());
    }

    pub fn add_code(&self, code: &str, user: &Identity) {
        self.codes.lock().unwrap().insert(code.to_owned(), user.clone());
    }

    /// Make every validation fail with `err`, optionally after rotating tokens.
    pub fn fail_with(&self, err: SessionError, refreshed: Option<Session>) {
        *self.failure.lock().unwrap() = Some((err, refreshed));
    }
}

#[async_trait]
impl SessionStore for FakeSessions {
    async fn validate(&self, tokens: &SessionTokens) -> SessionLookup {
        self.validations.fetch_add(1, Ordering::SeqCst);
        if let Some((err, refreshed)) = self.failure.lock().unwrap().clone() {
            return SessionLookup { refreshed, outcome: Err(err) };
        }
        if tokens.is_empty() {
            return SessionLookup::anonymous();
        }
        if let Some(user) = tokens.access.as_ref().and_then(|t| self.access.lock().unwrap().get(t).cloned()) {
            return SessionLookup::signed_in(user);
        }
        let rotated = tokens
            .refresh
            .as_ref()
            .and_then(|t| self.refresh.lock().unwrap().get(t).cloned());
        match rotated {
            Some(user) => {
                let fresh = session_for(&user, "rotated");
                self.access.lock().unwrap().insert(fresh.access_token.clone(), user.clone());
                SessionLookup { refreshed: Some(fresh), outcome: Ok(Some(user)) }
            }
            None => SessionLookup::failed(SessionError::Expired),
        }
    }

    async fn exchange_code(&self, code: &str, _verifier: Option<&str>) -> Result<Session, SessionError> {
        let user = self
            .codes
            .lock()
            .unwrap()
            .remove(code)
            .ok_or_else(|| SessionError::Rejected("unknown code".into()))?;
        let session = session_for(&user, "code");
        self.access.lock().unwrap().insert(session.access_token.clone(), user);
        Ok(session)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), SessionError> {
        self.access.lock().unwrap().remove(access_token);
        self.signed_out.lock().unwrap().push(access_token.to_owned());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake profile store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeProfiles {
    profiles: Mutex<HashMap<Uuid, Profile>>,
    students: Mutex<HashMap<Uuid, StudentProfile>>,
    employers: Mutex<HashMap<Uuid, EmployerProfile>>,
    pub skills: Mutex<HashMap<Uuid, Vec<SkillEntry>>>,
    pub preferences: Mutex<HashMap<Uuid, StudentPreferences>>,
    fail_lookups: AtomicBool,
    fail_role_insert: AtomicBool,
    pub completions: AtomicUsize,
    pub lookups: AtomicUsize,
}

fn outage() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

impl FakeProfiles {
    pub fn put_profile(&self, id: Uuid, role: Option<Role>, onboarding_completed: bool) {
        self.profiles
            .lock()
            .unwrap()
            .insert(id, Profile { id, role, onboarding_completed });
    }

    pub fn profile(&self, id: Uuid) -> Option<Profile> {
        self.profiles.lock().unwrap().get(&id).cloned()
    }

    pub fn student(&self, id: Uuid) -> Option<StudentProfile> {
        self.students.lock().unwrap().get(&id).cloned()
    }

    pub fn employer(&self, id: Uuid) -> Option<EmployerProfile> {
        self.employers.lock().unwrap().get(&id).cloned()
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    pub fn fail_role_insert(&self, fail: bool) {
        self.fail_role_insert.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProfileStore for FakeProfiles {
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(outage());
        }
        Ok(self.profile(user_id))
    }

    async fn insert_profile(&self, user_id: Uuid, role: Role) -> StoreResult<Profile> {
        let mut profiles = self.profiles.lock().unwrap();
        if profiles.contains_key(&user_id) {
            return Err(StoreError::Duplicate("profile"));
        }
        let profile = Profile { id: user_id, role: Some(role), onboarding_completed: false };
        profiles.insert(user_id, profile.clone());
        Ok(profile)
    }

    async fn insert_role_profile(&self, stub: &RoleStub) -> StoreResult<()> {
        if self.fail_role_insert.load(Ordering::SeqCst) {
            return Err(outage());
        }
        match stub.clone() {
            RoleStub::Student { id, first_name, last_name, email } => {
                let mut students = self.students.lock().unwrap();
                if students.contains_key(&id) {
                    return Err(StoreError::Duplicate("student profile"));
                }
                students.insert(id, StudentProfile { id, first_name, last_name, email, ..Default::default() });
            }
            RoleStub::Employer { id, contact_name, contact_email } => {
                let mut employers = self.employers.lock().unwrap();
                if employers.contains_key(&id) {
                    return Err(StoreError::Duplicate("employer profile"));
                }
                employers.insert(id, EmployerProfile { id, contact_name, contact_email, ..Default::default() });
            }
        }
        Ok(())
    }

    async fn save_slice(&self, user_id: Uuid, slice: &OnboardingSlice) -> StoreResult<()> {
        let new_student = || StudentProfile { id: user_id, ..Default::default() };
        let new_employer = || EmployerProfile { id: user_id, ..Default::default() };
        match slice.clone() {
            OnboardingSlice::About(about) => {
                let mut students = self.students.lock().unwrap();
                let row = students.entry(user_id).or_insert_with(new_student);
                row.first_name = Some(about.first_name);
                row.last_name = Some(about.last_name);
                row.phone = about.phone;
                row.university = Some(about.university);
                row.year_of_study = about.year_of_study;
                row.bio = about.bio;
            }
            OnboardingSlice::Skills(skills) => {
                self.students.lock().unwrap().entry(user_id).or_insert_with(new_student);
                self.skills.lock().unwrap().insert(user_id, skills.skills);
            }
            OnboardingSlice::Preferences(prefs) => {
                self.students.lock().unwrap().entry(user_id).or_insert_with(new_student);
                self.preferences.lock().unwrap().insert(user_id, prefs);
            }
            OnboardingSlice::Venue(venue) => {
                let mut employers = self.employers.lock().unwrap();
                let row = employers.entry(user_id).or_insert_with(new_employer);
                row.business_name = Some(venue.business_name);
                if venue.contact_name.is_some() {
                    row.contact_name = venue.contact_name;
                }
                row.venue_type = Some(venue.venue_type);
                row.description = venue.description;
                row.phone = venue.phone;
            }
            OnboardingSlice::Location(loc) => {
                let mut employers = self.employers.lock().unwrap();
                let row = employers.entry(user_id).or_insert_with(new_employer);
                row.address = Some(loc.address);
                row.area = Some(loc.area);
                row.city = Some(loc.city);
                row.postcode = Some(loc.postcode);
            }
            OnboardingSlice::Branding(brand) => {
                let mut employers = self.employers.lock().unwrap();
                let row = employers.entry(user_id).or_insert_with(new_employer);
                row.logo_url = brand.logo_url;
                row.website = brand.website;
                row.tagline = brand.tagline;
            }
        }
        Ok(())
    }

    async fn complete_onboarding(&self, user_id: Uuid) -> StoreResult<()> {
        self.completions.fetch_add(1, Ordering::SeqCst);
        if let Some(profile) = self.profiles.lock().unwrap().get_mut(&user_id) {
            profile.onboarding_completed = true;
        }
        Ok(())
    }

    async fn student_profile(&self, user_id: Uuid) -> StoreResult<Option<StudentProfile>> {
        Ok(self.student(user_id))
    }

    async fn employer_profile(&self, user_id: Uuid) -> StoreResult<Option<EmployerProfile>> {
        Ok(self.employer(user_id))
    }
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

pub fn test_config() -> Config {
    Config {
        db_host: "localhost".into(),
        db_port: 3306,
        db_name: "campusgigs_test".into(),
        db_user: "test".into(),
        db_password: "test".into(),
        backend_host: "127.0.0.1".into(),
        backend_port: 0,
        auth_url: "http://127.0.0.1:9".into(),
        auth_api_key: "test-key".into(),
        cookie_secure: false,
        guard_fail_open: true,
        app_env: "test".into(),
        app_base_url: "http://localhost".into(),
    }
}

pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<FakeSessions>,
    pub profiles: Arc<FakeProfiles>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let sessions = Arc::new(FakeSessions::default());
        let profiles = Arc::new(FakeProfiles::default());
        let state = AppState {
            sessions: sessions.clone(),
            profiles: profiles.clone(),
            config,
        };
        TestApp { router: campusgigs::app(state), sessions, profiles }
    }

    /// A signed-in identity with the given profile; returns it and its access token.
    pub fn user_with_profile(&self, name: &str, role: Option<Role>, completed: bool) -> (Identity, String) {
        let user = identity(name);
        self.profiles.put_profile(user.id, role, completed);
        let token = self.sessions.sign_in(&user);
        (user, token)
    }

    /// A signed-in identity that has chosen `role` and finished onboarding.
    pub async fn onboarded(&self, name: &str, role: Role) -> (Identity, String) {
        let (user, token) = self.user_with_profile(name, Some(role), true);
        self.profiles
            .insert_role_profile(&RoleStub::from_identity(role, &user))
            .await
            .unwrap();
        (user, token)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Response<Body> {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("{ACCESS_COOKIE}={token}"));
        }
        self.request(builder, body).await
    }

    pub async fn send_with_cookie(&self, path: &str, cookie: &str) -> Response<Body> {
        let builder = Request::builder().method(Method::GET).uri(path).header(header::COOKIE, cookie);
        self.request(builder, None).await
    }

    async fn request(&self, builder: axum::http::request::Builder, body: Option<serde_json::Value>) -> Response<Body> {
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub fn location(response: &Response<Body>) -> String {
    assert!(
        response.status().is_redirection(),
        "expected a redirect, got {}",
        response.status()
    );
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect without Location")
        .to_str()
        .unwrap()
        .to_owned()
}

pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_owned())
        .collect()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn assert_passed_guard(response: &Response<Body>) {
    assert!(
        !response.status().is_redirection(),
        "expected the guard to allow the request, got redirect to {:?}",
        response.headers().get(header::LOCATION)
    );
    assert_ne!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
