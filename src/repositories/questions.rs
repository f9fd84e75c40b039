use sqlx::FromRow;
use sqlx::PgPool;

use crate::db::models::{ExamQuestion, QuestionOption};
use crate::db::types::QuestionStatus;

const OPTION_COLUMNS: &str = "id, question_id, content_html, is_correct, order_no";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) content_html: &'a str,
    pub(crate) section_type: &'a str,
    pub(crate) status: QuestionStatus,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) struct CreateOption<'a> {
    pub(crate) id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) content_html: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) order_no: i32,
}

pub(crate) struct LinkToExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) order_no: i32,
    pub(crate) section_type: &'a str,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateQuestion<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO questions (
            id, content_html, section_type, status, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7)",
    )
    .bind(params.id)
    .bind(params.content_html)
    .bind(params.section_type)
    .bind(params.status)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn create_option(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateOption<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO question_options (id, question_id, content_html, is_correct, order_no)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(params.id)
    .bind(params.question_id)
    .bind(params.content_html)
    .bind(params.is_correct)
    .bind(params.order_no)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn link_to_exam(
    executor: impl sqlx::PgExecutor<'_>,
    params: LinkToExam<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO exam_questions (id, exam_id, question_id, order_no, section_type)
         VALUES ($1,$2,$3,$4,$5)",
    )
    .bind(params.id)
    .bind(params.exam_id)
    .bind(params.question_id)
    .bind(params.order_no)
    .bind(params.section_type)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn find_exam_link(
    pool: &PgPool,
    exam_id: &str,
    question_id: &str,
) -> Result<Option<ExamQuestion>, sqlx::Error> {
    sqlx::query_as::<_, ExamQuestion>(
        "SELECT id, exam_id, question_id, order_no, section_type \
         FROM exam_questions WHERE exam_id = $1 AND question_id = $2",
    )
    .bind(exam_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn option_belongs(
    pool: &PgPool,
    question_id: &str,
    option_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM question_options WHERE id = $1 AND question_id = $2)",
    )
    .bind(option_id)
    .bind(question_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_ids_for_exam(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT question_id FROM exam_questions WHERE exam_id = $1 ORDER BY order_no",
    )
    .bind(exam_id)
    .fetch_all(executor)
    .await
}

/// One row per exam question, in presentation order, joined with the
/// question body. Options are fetched separately and grouped by the caller.
#[derive(Debug, FromRow)]
pub(crate) struct ExamQuestionRow {
    pub(crate) question_id: String,
    pub(crate) order_no: i32,
    pub(crate) section_type: String,
    pub(crate) content_html: String,
}

pub(crate) async fn list_for_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<ExamQuestionRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamQuestionRow>(
        "SELECT eq.question_id, eq.order_no, eq.section_type, q.content_html \
         FROM exam_questions eq \
         JOIN questions q ON q.id = eq.question_id \
         WHERE eq.exam_id = $1 \
         ORDER BY eq.order_no",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_options_for_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options \
         WHERE question_id IN (SELECT question_id FROM exam_questions WHERE exam_id = $1) \
         ORDER BY question_id, order_no"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

/// Options for every question the session answered, used by grading. Goes
/// through the answer rows rather than exam_questions so the grade covers
/// exactly the sheet fixed at session start.
pub(crate) async fn list_options_for_session(
    executor: impl sqlx::PgExecutor<'_>,
    session_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options \
         WHERE question_id IN (
            SELECT question_id FROM exam_session_answers WHERE session_id = $1
         ) \
         ORDER BY question_id, order_no"
    ))
    .bind(session_id)
    .fetch_all(executor)
    .await
}
