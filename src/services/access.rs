use crate::{
    error::ApiError,
    models::{auth::AuthenticatedUser, user::UserRole},
};

/// Role required to act on another subject's records.
pub const ELEVATED_ROLE: UserRole = UserRole::Admin;

pub fn check_role(identity: &AuthenticatedUser, required: UserRole) -> Result<(), ApiError> {
    if identity.role != required {
        tracing::warn!(
            subject = %identity.subject_id,
            role = %identity.role,
            required = %required,
            "role check denied"
        );
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

/// A USER may only act on their own subject id; anyone else must hold `elevated`.
pub fn check_owner_or_role(
    identity: &AuthenticatedUser,
    target_subject_id: &str,
    elevated: UserRole,
) -> Result<(), ApiError> {
    if identity.role == UserRole::User && identity.subject_id == target_subject_id {
        return Ok(());
    }
    check_role(identity, elevated)
}
