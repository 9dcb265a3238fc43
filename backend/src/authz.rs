//! Request-level authorization checks.
//!
//! Handlers call these after resolving the target resource and before invoking the
//! service, so services and repositories stay authorization-agnostic.

use uuid::Uuid;

use crate::{auth::Principal, error::AppError};

const FORBIDDEN: &str = "This action is unauthorized.";

/// Owner-or-admin check: passes when the principal owns the resource or is an admin.
pub fn authorize_owner(principal: &Principal, owner_id: Uuid) -> Result<(), AppError> {
    if principal.id == owner_id || principal.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(FORBIDDEN))
    }
}

/// Admin-only check.
pub fn require_admin(principal: &Principal) -> Result<(), AppError> {
    if principal.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden(FORBIDDEN))
    }
}
