use sqlx::PgPool;

use crate::db::models::ExamSession;
use crate::db::types::SessionStatus;

const COLUMNS: &str = "\
    id, user_id, exam_id, status, start_time, time_limit_seconds, submitted_at, \
    total_correct, total_wrong, total_unanswered, deleted_at, created_at, updated_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) status: SessionStatus,
    pub(crate) start_time: time::PrimitiveDateTime,
    pub(crate) time_limit_seconds: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_in_progress(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    exam_id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE user_id = $1 AND exam_id = $2 AND status = $3 AND deleted_at IS NULL"
    ))
    .bind(user_id)
    .bind(exam_id)
    .bind(SessionStatus::InProgress)
    .fetch_optional(executor)
    .await
}

/// Newest session for the pair, whatever its state.
pub(crate) async fn find_latest(
    executor: impl sqlx::PgExecutor<'_>,
    user_id: &str,
    exam_id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE user_id = $1 AND exam_id = $2 AND deleted_at IS NULL \
         ORDER BY created_at DESC LIMIT 1"
    ))
    .bind(user_id)
    .bind(exam_id)
    .fetch_optional(executor)
    .await
}

/// Insert guarded by the partial unique index on (user_id, exam_id) for
/// in-progress rows. Returns false when a concurrent caller won the race;
/// the caller then refetches the surviving session.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    session: CreateSession<'_>,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO exam_sessions (
            id, user_id, exam_id, status, start_time, time_limit_seconds,
            created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        ON CONFLICT DO NOTHING",
    )
    .bind(session.id)
    .bind(session.user_id)
    .bind(session.exam_id)
    .bind(session.status)
    .bind(session.start_time)
    .bind(session.time_limit_seconds)
    .bind(session.created_at)
    .bind(session.updated_at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) struct FinalizeSession {
    pub(crate) total_correct: i32,
    pub(crate) total_wrong: i32,
    pub(crate) total_unanswered: i32,
    pub(crate) submitted_at: time::PrimitiveDateTime,
}

/// The status guard makes the in_progress -> submitted transition happen
/// at most once: a racing second submit matches no row and gets None.
pub(crate) async fn finalize(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: FinalizeSession,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "UPDATE exam_sessions SET \
            status = $1, submitted_at = $2, total_correct = $3, total_wrong = $4, \
            total_unanswered = $5, updated_at = $2 \
         WHERE id = $6 AND status = $7 \
         RETURNING {COLUMNS}"
    ))
    .bind(SessionStatus::Submitted)
    .bind(params.submitted_at)
    .bind(params.total_correct)
    .bind(params.total_wrong)
    .bind(params.total_unanswered)
    .bind(id)
    .bind(SessionStatus::InProgress)
    .fetch_optional(executor)
    .await
}
