use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;

#[derive(Debug, Error)]
pub(crate) enum AccessPolicyError {
    #[error("user role is not allowed to take exams")]
    RoleNotEligible,
    #[error("exam access not approved")]
    NotApproved,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Gate every session-mutating operation: only ordinary takers with an
/// explicit approved grant may touch a session. Re-checked on each call so
/// a grant revoked mid-exam takes effect immediately.
pub(crate) async fn ensure_can_take_exam(
    pool: &PgPool,
    user: &User,
    exam_id: &str,
) -> Result<(), AccessPolicyError> {
    if user.role != UserRole::User {
        return Err(AccessPolicyError::RoleNotEligible);
    }

    let access = repositories::exam_access::find_approved(pool, &user.id, exam_id).await?;
    if access.is_none() {
        return Err(AccessPolicyError::NotApproved);
    }

    Ok(())
}
