//! Role selection: the only place a profile row is ever created.

use serde::Serialize;

use crate::{
    models::{Identity, Profile, Role, RoleStub},
    onboarding::Step,
    store::{ProfileStore, StoreError},
};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RoleSelection {
    pub profile:  Profile,
    /// First onboarding step for the chosen role.
    pub redirect: String,
}

/// Create the base profile, then the role-specific stub.
///
/// The two inserts run strictly in that order and the second is skipped when
/// the first fails. Neither insert is retried or upserted: running this again
/// for an identity that already has a profile fails with
/// [`StoreError::Duplicate`] and leaves the existing role untouched.
pub async fn select_role(
    store: &dyn ProfileStore,
    identity: &Identity,
    role: Role,
) -> Result<RoleSelection, StoreError> {
    let profile = store.insert_profile(identity.id, role).await?;

    let stub = RoleStub::from_identity(role, identity);
    store.insert_role_profile(&stub).await?;

    tracing::info!(user_id = %identity.id, %role, "Role selected");
    Ok(RoleSelection {
        profile,
        redirect: Step::first(role).path(),
    })
}
