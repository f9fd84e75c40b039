use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::db::models::{ExamSessionAnswer, OptionSnapshot};

const COLUMNS: &str = "\
    id, session_id, question_id, selected_option_id, answered_at, is_correct, \
    question_snapshot_html, options_snapshot, correct_option_id";

/// Seed one blank answer row per exam question so the answer sheet is fixed
/// at session start.
pub(crate) async fn bulk_create(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
    question_ids: &[String],
) -> Result<(), sqlx::Error> {
    if question_ids.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO exam_session_answers (id, session_id, question_id) ",
    );
    builder.push_values(question_ids, |mut row, question_id| {
        row.push_bind(Uuid::new_v4().to_string());
        row.push_bind(session_id);
        row.push_bind(question_id);
    });

    builder.build().execute(executor).await?;
    Ok(())
}

/// Replaces any previous selection for the pair; NULL clears it.
pub(crate) async fn save_selection(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
    question_id: &str,
    selected_option_id: Option<&str>,
    answered_at: time::PrimitiveDateTime,
) -> Result<ExamSessionAnswer, sqlx::Error> {
    sqlx::query_as::<_, ExamSessionAnswer>(&format!(
        "UPDATE exam_session_answers \
         SET selected_option_id = $1, answered_at = $2 \
         WHERE session_id = $3 AND question_id = $4 \
         RETURNING {COLUMNS}"
    ))
    .bind(selected_option_id)
    .bind(answered_at)
    .bind(session_id)
    .bind(question_id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn list_by_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<ExamSessionAnswer>, sqlx::Error> {
    sqlx::query_as::<_, ExamSessionAnswer>(&format!(
        "SELECT {COLUMNS} FROM exam_session_answers WHERE session_id = $1"
    ))
    .bind(session_id)
    .fetch_all(executor)
    .await
}

/// Answer rows joined with the live question body, as input to grading.
#[derive(Debug, FromRow)]
pub(crate) struct AnswerForGrading {
    pub(crate) question_id: String,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) content_html: String,
}

pub(crate) async fn list_for_grading(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<AnswerForGrading>, sqlx::Error> {
    sqlx::query_as::<_, AnswerForGrading>(
        "SELECT a.question_id, a.selected_option_id, q.content_html \
         FROM exam_session_answers a \
         JOIN questions q ON q.id = a.question_id \
         WHERE a.session_id = $1",
    )
    .bind(session_id)
    .fetch_all(executor)
    .await
}

pub(crate) struct ApplyGrade<'a> {
    pub(crate) question_id: &'a str,
    pub(crate) is_correct: Option<bool>,
    pub(crate) question_snapshot_html: &'a str,
    pub(crate) options_snapshot: &'a [OptionSnapshot],
    pub(crate) correct_option_id: &'a str,
}

pub(crate) async fn apply_grade(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
    grade: ApplyGrade<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_session_answers \
         SET is_correct = $1, question_snapshot_html = $2, options_snapshot = $3, \
             correct_option_id = $4 \
         WHERE session_id = $5 AND question_id = $6",
    )
    .bind(grade.is_correct)
    .bind(grade.question_snapshot_html)
    .bind(sqlx::types::Json(grade.options_snapshot))
    .bind(grade.correct_option_id)
    .bind(session_id)
    .bind(grade.question_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn count_by_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_session_answers WHERE session_id = $1")
        .bind(session_id)
        .fetch_one(executor)
        .await
}
