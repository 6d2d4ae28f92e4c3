//! Profile store port.
//!
//! Every method acts on behalf of one identity and only ever touches that
//! identity's own rows.

pub mod mysql;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{EmployerProfile, Profile, Role, RoleStub, RowError, StudentProfile},
    onboarding::OnboardingSlice,
};

pub use mysql::MySqlProfileStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected an insert.
    #[error("{0} already exists")]
    Duplicate(&'static str),
    /// A foreign key rejected a write because the row it hangs off is absent.
    #[error("{0} does not exist yet")]
    MissingParent(&'static str),
    #[error("malformed row: {0}")]
    Malformed(#[from] RowError),
    #[error("could not encode column: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Ok(None)` when the identity has not chosen a role yet.
    async fn get_profile(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;

    /// Create the base profile with `onboarding_completed = false`.
    /// Fails with [`StoreError::Duplicate`] if one already exists.
    async fn insert_profile(&self, user_id: Uuid, role: Role) -> StoreResult<Profile>;

    /// Create the minimal role-specific row.
    async fn insert_role_profile(&self, stub: &RoleStub) -> StoreResult<()>;

    /// Upsert the slice one onboarding step owns.
    async fn save_slice(&self, user_id: Uuid, slice: &OnboardingSlice) -> StoreResult<()>;

    /// Set `onboarding_completed = true`. Setting it again is a no-op.
    async fn complete_onboarding(&self, user_id: Uuid) -> StoreResult<()>;

    async fn student_profile(&self, user_id: Uuid) -> StoreResult<Option<StudentProfile>>;

    async fn employer_profile(&self, user_id: Uuid) -> StoreResult<Option<EmployerProfile>>;
}
