//! Onboarding steps for each role and the writes behind "save and continue".
//!
//! Every step persists its own slice keyed by identity; there is no draft
//! carried between steps. The final step of a role also marks the profile's
//! onboarding as complete, which is what unlocks the dashboards.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::{
    access::dashboard_path,
    models::Role,
    store::{ProfileStore, StoreError},
};

// ── Step catalogue ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    // student
    About,
    Skills,
    Preferences,
    // employer
    Venue,
    Location,
    Branding,
}

const STUDENT_STEPS:  [Step; 3] = [Step::About, Step::Skills, Step::Preferences];
const EMPLOYER_STEPS: [Step; 3] = [Step::Venue, Step::Location, Step::Branding];

impl Step {
    pub fn for_role(role: Role) -> &'static [Step] {
        match role {
            Role::Student  => &STUDENT_STEPS,
            Role::Employer => &EMPLOYER_STEPS,
        }
    }

    pub fn first(role: Role) -> Step {
        Self::for_role(role)[0]
    }

    pub fn role(self) -> Role {
        match self {
            Step::About | Step::Skills | Step::Preferences => Role::Student,
            Step::Venue | Step::Location | Step::Branding  => Role::Employer,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Step::About       => "about",
            Step::Skills      => "skills",
            Step::Preferences => "preferences",
            Step::Venue       => "venue",
            Step::Location    => "location",
            Step::Branding    => "branding",
        }
    }

    /// Look up a step by its slug within one role's flow.
    pub fn parse(role: Role, slug: &str) -> Option<Step> {
        Self::for_role(role).iter().copied().find(|s| s.slug() == slug)
    }

    /// Zero-based position within the role's flow.
    pub fn index(self) -> usize {
        Self::for_role(self.role())
            .iter()
            .position(|s| *s == self)
            .unwrap_or_default()
    }

    pub fn next(self) -> Option<Step> {
        Self::for_role(self.role()).get(self.index() + 1).copied()
    }

    pub fn is_final(self) -> bool {
        self.next().is_none()
    }

    pub fn path(self) -> String {
        format!("/{}/onboarding/{}", self.role(), self.slug())
    }
}

// ── Step payloads ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StudentAbout {
    #[validate(length(min = 1, max = 100))]
    pub first_name:    String,
    #[validate(length(min = 1, max = 100))]
    pub last_name:     String,
    #[validate(length(max = 32))]
    pub phone:         Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub university:    String,
    #[validate(range(min = 1, max = 7))]
    pub year_of_study: Option<u8>,
    #[validate(length(max = 2000))]
    pub bio:           Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Hard,
    Soft,
    Language,
    Certification,
}

impl Proficiency {
    pub fn as_str(self) -> &'static str {
        match self {
            Proficiency::Beginner     => "beginner",
            Proficiency::Intermediate => "intermediate",
            Proficiency::Advanced     => "advanced",
            Proficiency::Expert       => "expert",
        }
    }
}

impl SkillType {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillType::Hard          => "hard",
            SkillType::Soft          => "soft",
            SkillType::Language      => "language",
            SkillType::Certification => "certification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SkillEntry {
    #[validate(length(min = 1, max = 100))]
    pub name:             String,
    pub proficiency:      Proficiency,
    pub skill_type:       SkillType,
    #[validate(range(max = 60))]
    #[serde(default)]
    pub years_experience: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StudentSkills {
    #[validate(length(max = 30), nested)]
    pub skills: Vec<SkillEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    Night,
}

/// One cell of the availability grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub day:    Weekday,
    pub period: DayPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct StudentPreferences {
    #[validate(length(max = 28))]
    #[serde(default)]
    pub availability:   Vec<AvailabilitySlot>,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub categories:     Vec<String>,
    #[validate(length(max = 20))]
    #[serde(default)]
    pub areas:          Vec<String>,
    #[validate(length(max = 10))]
    #[serde(default)]
    pub schedule_types: Vec<String>,
    #[validate(range(min = 0.0, max = 1000.0))]
    pub min_hourly_pay: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmployerVenue {
    #[validate(length(min = 1, max = 200))]
    pub business_name: String,
    #[validate(length(max = 200))]
    pub contact_name:  Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub venue_type:    String,
    #[validate(length(max = 2000))]
    pub description:   Option<String>,
    #[validate(length(max = 32))]
    pub phone:         Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmployerLocation {
    #[validate(length(min = 1, max = 255))]
    pub address:  String,
    #[validate(length(min = 1, max = 100))]
    pub area:     String,
    #[validate(length(min = 1, max = 100))]
    pub city:     String,
    #[validate(length(min = 1, max = 16))]
    pub postcode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct EmployerBranding {
    #[validate(url, length(max = 512))]
    pub logo_url: Option<String>,
    #[validate(url, length(max = 512))]
    pub website:  Option<String>,
    #[validate(length(max = 255))]
    pub tagline:  Option<String>,
}

/// The part of a role-specific profile that one step owns.
#[derive(Debug, Clone, PartialEq)]
pub enum OnboardingSlice {
    About(StudentAbout),
    Skills(StudentSkills),
    Preferences(StudentPreferences),
    Venue(EmployerVenue),
    Location(EmployerLocation),
    Branding(EmployerBranding),
}

#[derive(Debug, Error)]
pub enum SliceError {
    #[error("malformed {step} payload: {source}")]
    Decode {
        step:   &'static str,
        source: serde_json::Error,
    },
    #[error("invalid {step} payload: {source}")]
    Invalid {
        step:   &'static str,
        source: validator::ValidationErrors,
    },
}

fn decode<T>(step: Step, body: serde_json::Value) -> Result<T, SliceError>
where
    T: serde::de::DeserializeOwned + Validate,
{
    let payload: T = serde_json::from_value(body)
        .map_err(|source| SliceError::Decode { step: step.slug(), source })?;
    payload
        .validate()
        .map_err(|source| SliceError::Invalid { step: step.slug(), source })?;
    Ok(payload)
}

impl OnboardingSlice {
    /// Decode and validate the request body for `step`.
    pub fn from_json(step: Step, body: serde_json::Value) -> Result<Self, SliceError> {
        Ok(match step {
            Step::About       => OnboardingSlice::About(decode(step, body)?),
            Step::Skills      => OnboardingSlice::Skills(decode(step, body)?),
            Step::Preferences => OnboardingSlice::Preferences(decode(step, body)?),
            Step::Venue       => OnboardingSlice::Venue(decode(step, body)?),
            Step::Location    => OnboardingSlice::Location(decode(step, body)?),
            Step::Branding    => OnboardingSlice::Branding(decode(step, body)?),
        })
    }

    pub fn step(&self) -> Step {
        match self {
            OnboardingSlice::About(_)       => Step::About,
            OnboardingSlice::Skills(_)      => Step::Skills,
            OnboardingSlice::Preferences(_) => Step::Preferences,
            OnboardingSlice::Venue(_)       => Step::Venue,
            OnboardingSlice::Location(_)    => Step::Location,
            OnboardingSlice::Branding(_)    => Step::Branding,
        }
    }
}

// ── Save and continue ────────────────────────────────────────

/// Persist one step and return the path to navigate to next.
///
/// The final step also flips `onboarding_completed`. Both writes are keyed
/// by identity, so re-running a step (including the final one) is safe.
pub async fn save_step(
    store: &dyn ProfileStore,
    user_id: Uuid,
    slice: &OnboardingSlice,
) -> Result<String, StoreError> {
    store.save_slice(user_id, slice).await?;

    let step = slice.step();
    match step.next() {
        Some(next) => Ok(next.path()),
        None => {
            store.complete_onboarding(user_id).await?;
            tracing::info!(user_id = %user_id, role = %step.role(), "Onboarding completed");
            Ok(dashboard_path(step.role()).to_owned())
        }
    }
}
