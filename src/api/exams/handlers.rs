use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::exams::helpers;
use crate::api::guards::{CurrentAdmin, CurrentEditor, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::{ExamStatus, QuestionStatus, UserRole};
use crate::repositories;
use crate::schemas::exam::{AccessResponse, ApproveAccessRequest, ExamCreate, ExamResponse};

pub(super) async fn create_exam(
    CurrentEditor(editor): CurrentEditor,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let exam_id = Uuid::new_v4().to_string();

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let exam = repositories::exams::create(
        &mut *tx,
        repositories::exams::CreateExam {
            id: &exam_id,
            title: &payload.title,
            description: payload.description.as_deref(),
            time_limit_seconds: payload.time_limit_seconds,
            status: ExamStatus::Draft,
            created_by: &editor.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    for (position, question) in payload.questions.iter().enumerate() {
        let question_id = Uuid::new_v4().to_string();
        let order_no = (position + 1) as i32;

        repositories::questions::create(
            &mut *tx,
            repositories::questions::CreateQuestion {
                id: &question_id,
                content_html: &question.content_html,
                section_type: &question.section_type,
                status: QuestionStatus::Active,
                created_by: &editor.id,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

        for (option_position, option) in question.options.iter().enumerate() {
            repositories::questions::create_option(
                &mut *tx,
                repositories::questions::CreateOption {
                    id: &Uuid::new_v4().to_string(),
                    question_id: &question_id,
                    content_html: &option.content_html,
                    is_correct: option.is_correct,
                    order_no: (option_position + 1) as i32,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to create option"))?;
        }

        repositories::questions::link_to_exam(
            &mut *tx,
            repositories::questions::LinkToExam {
                id: &Uuid::new_v4().to_string(),
                exam_id: &exam_id,
                question_id: &question_id,
                order_no,
                section_type: &question.section_type,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to attach question to exam"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let question_count = payload.questions.len() as i64;
    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(&exam, question_count))))
}

pub(super) async fn publish_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    if exam.status == ExamStatus::Published {
        return Err(ApiError::BadRequest("Exam is already published".to_string()));
    }

    let question_count = repositories::exams::count_questions(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    if question_count == 0 {
        return Err(ApiError::BadRequest("Cannot publish an exam without questions".to_string()));
    }

    let exam = repositories::exams::publish(state.db(), &exam_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to publish exam"))?;

    Ok(Json(ExamResponse::from_db(&exam, question_count)))
}

pub(super) async fn approve_access(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ApproveAccessRequest>,
) -> Result<Json<AccessResponse>, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;
    if exam.is_none() {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    let user = repositories::users::find_by_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.role != UserRole::User {
        return Err(ApiError::BadRequest(
            "Only regular users can be granted exam access".to_string(),
        ));
    }

    let access = repositories::exam_access::upsert_approved(
        state.db(),
        &Uuid::new_v4().to_string(),
        &user.id,
        &exam_id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to approve exam access"))?;

    Ok(Json(AccessResponse {
        id: access.id,
        user_id: access.user_id,
        exam_id: access.exam_id,
        status: access.status,
        updated_at: format_primitive(access.updated_at),
    }))
}

pub(super) async fn list_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamResponse>>, ApiError> {
    let exams = match user.role {
        UserRole::Admin | UserRole::Editor => repositories::exams::list_all(state.db())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list exams"))?,
        UserRole::User => repositories::exams::list_accessible(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list exams"))?,
    };

    let mut responses = Vec::with_capacity(exams.len());
    for exam in &exams {
        let question_count = repositories::exams::count_questions(state.db(), &exam.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;
        responses.push(ExamResponse::from_db(exam, question_count));
    }

    Ok(Json(responses))
}

pub(super) async fn get_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = match user.role {
        UserRole::Admin | UserRole::Editor => repositories::exams::find_by_id(state.db(), &exam_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
            .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?,
        UserRole::User => {
            // On the read path a draft stays invisible to takers, unlike
            // session start where it is a 400.
            let exam =
                helpers::fetch_published_exam(&state, &exam_id).await.map_err(|err| match err {
                    ApiError::BadRequest(_) => ApiError::NotFound("Exam not found".to_string()),
                    other => other,
                })?;
            helpers::require_take_access(&state, &user, &exam_id).await.map_err(|err| {
                // Hide unapproved exams from takers entirely
                match err {
                    ApiError::Forbidden(_) => ApiError::NotFound("Exam not found".to_string()),
                    other => other,
                }
            })?;
            exam
        }
    };

    let question_count = repositories::exams::count_questions(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count questions"))?;

    Ok(Json(ExamResponse::from_db(&exam, question_count)))
}
