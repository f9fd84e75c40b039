use sqlx::PgPool;

use crate::db::models::ExamAccess;
use crate::db::types::AccessStatus;

const COLUMNS: &str = "id, user_id, exam_id, status, deleted_at, created_at, updated_at";

pub(crate) async fn find_approved(
    pool: &PgPool,
    user_id: &str,
    exam_id: &str,
) -> Result<Option<ExamAccess>, sqlx::Error> {
    sqlx::query_as::<_, ExamAccess>(&format!(
        "SELECT {COLUMNS} FROM exam_access \
         WHERE user_id = $1 AND exam_id = $2 AND status = $3 AND deleted_at IS NULL"
    ))
    .bind(user_id)
    .bind(exam_id)
    .bind(AccessStatus::Approved)
    .fetch_optional(pool)
    .await
}

/// Approving is idempotent: a second approval for the same pair refreshes
/// the existing grant and revives a soft-deleted one.
pub(crate) async fn upsert_approved(
    pool: &PgPool,
    id: &str,
    user_id: &str,
    exam_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<ExamAccess, sqlx::Error> {
    sqlx::query_as::<_, ExamAccess>(&format!(
        "INSERT INTO exam_access (id, user_id, exam_id, status, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         ON CONFLICT (user_id, exam_id) DO UPDATE
            SET status = EXCLUDED.status, deleted_at = NULL, updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(exam_id)
    .bind(AccessStatus::Approved)
    .bind(now)
    .fetch_one(pool)
    .await
}
