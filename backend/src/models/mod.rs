//! Rows owned by the profile store, and the narrowing layer that turns the
//! loosely-typed database shapes into domain types.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ── Row narrowing errors ─────────────────────────────────────

#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("invalid identity id {0:?}")]
    Id(String),
    #[error("unknown role {0:?}")]
    Role(String),
    #[error("invalid {column} value: {reason}")]
    Column { column: &'static str, reason: String },
}

fn parse_id(raw: &str) -> Result<Uuid, RowError> {
    Uuid::parse_str(raw).map_err(|_| RowError::Id(raw.to_owned()))
}

// ── Roles ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Employer,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Student, Role::Employer];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student  => "student",
            Role::Employer => "employer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student"  => Ok(Role::Student),
            "employer" => Ok(Role::Employer),
            other      => Err(RowError::Role(other.to_owned())),
        }
    }
}

// ── Identity ─────────────────────────────────────────────────

/// Who the identity provider says is signed in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id:           Uuid,
    pub email:        Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    /// Split the provider's display name into `(first, last)`.
    ///
    /// The last whitespace-separated word is the last name; everything before
    /// it is the first name. A single word is a first name only.
    pub fn split_name(&self) -> (Option<String>, Option<String>) {
        let Some(name) = self.display_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) else {
            return (None, None);
        };
        match name.rsplit_once(char::is_whitespace) {
            Some((first, last)) => (Some(first.trim().to_owned()), Some(last.to_owned())),
            None                => (Some(name.to_owned()), None),
        }
    }
}

// ── Profiles ─────────────────────────────────────────────────

/// The base authorization record for an identity.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Profile {
    pub id:                   Uuid,
    pub role:                 Option<Role>,
    pub onboarding_completed: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProfileRow {
    pub id:                   String,
    pub role:                 Option<String>,
    pub onboarding_completed: bool,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = RowError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let role = match row.role.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw)       => Some(raw.parse()?),
        };
        Ok(Profile {
            id: parse_id(&row.id)?,
            role,
            onboarding_completed: row.onboarding_completed,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StudentProfile {
    pub id:            Uuid,
    pub first_name:    Option<String>,
    pub last_name:     Option<String>,
    pub email:         Option<String>,
    pub phone:         Option<String>,
    pub university:    Option<String>,
    pub year_of_study: Option<u8>,
    pub bio:           Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StudentProfileRow {
    pub id:            String,
    pub first_name:    Option<String>,
    pub last_name:     Option<String>,
    pub email:         Option<String>,
    pub phone:         Option<String>,
    pub university:    Option<String>,
    pub year_of_study: Option<i8>,
    pub bio:           Option<String>,
}

impl TryFrom<StudentProfileRow> for StudentProfile {
    type Error = RowError;

    fn try_from(row: StudentProfileRow) -> Result<Self, Self::Error> {
        let year_of_study = row
            .year_of_study
            .map(|y| {
                u8::try_from(y).map_err(|_| RowError::Column {
                    column: "year_of_study",
                    reason: format!("negative year {y}"),
                })
            })
            .transpose()?;
        Ok(StudentProfile {
            id: parse_id(&row.id)?,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            university: row.university,
            year_of_study,
            bio: row.bio,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct EmployerProfile {
    pub id:            Uuid,
    pub business_name: Option<String>,
    pub contact_name:  Option<String>,
    pub contact_email: Option<String>,
    pub phone:         Option<String>,
    pub venue_type:    Option<String>,
    pub description:   Option<String>,
    pub address:       Option<String>,
    pub area:          Option<String>,
    pub city:          Option<String>,
    pub postcode:      Option<String>,
    pub logo_url:      Option<String>,
    pub website:       Option<String>,
    pub tagline:       Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmployerProfileRow {
    pub id:            String,
    pub business_name: Option<String>,
    pub contact_name:  Option<String>,
    pub contact_email: Option<String>,
    pub phone:         Option<String>,
    pub venue_type:    Option<String>,
    pub description:   Option<String>,
    pub address:       Option<String>,
    pub area:          Option<String>,
    pub city:          Option<String>,
    pub postcode:      Option<String>,
    pub logo_url:      Option<String>,
    pub website:       Option<String>,
    pub tagline:       Option<String>,
}

impl TryFrom<EmployerProfileRow> for EmployerProfile {
    type Error = RowError;

    fn try_from(row: EmployerProfileRow) -> Result<Self, Self::Error> {
        Ok(EmployerProfile {
            id: parse_id(&row.id)?,
            business_name: row.business_name,
            contact_name: row.contact_name,
            contact_email: row.contact_email,
            phone: row.phone,
            venue_type: row.venue_type,
            description: row.description,
            address: row.address,
            area: row.area,
            city: row.city,
            postcode: row.postcode,
            logo_url: row.logo_url,
            website: row.website,
            tagline: row.tagline,
        })
    }
}

// ── Role selection stubs ─────────────────────────────────────

/// Minimal role-specific row written right after the base profile.
#[derive(Debug, Clone, PartialEq)]
pub enum RoleStub {
    Student {
        id:         Uuid,
        first_name: Option<String>,
        last_name:  Option<String>,
        email:      Option<String>,
    },
    Employer {
        id:            Uuid,
        contact_name:  Option<String>,
        contact_email: Option<String>,
    },
}

impl RoleStub {
    /// Prefill the stub for `role` from the provider's identity metadata.
    pub fn from_identity(role: Role, identity: &Identity) -> Self {
        match role {
            Role::Student => {
                let (first_name, last_name) = identity.split_name();
                RoleStub::Student {
                    id: identity.id,
                    first_name,
                    last_name,
                    email: identity.email.clone(),
                }
            }
            Role::Employer => RoleStub::Employer {
                id:            identity.id,
                contact_name:  identity.display_name.clone(),
                contact_email: identity.email.clone(),
            },
        }
    }

    pub fn role(&self) -> Role {
        match self {
            RoleStub::Student { .. }  => Role::Student,
            RoleStub::Employer { .. } => Role::Employer,
        }
    }
}
