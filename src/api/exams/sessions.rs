use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::exams::helpers;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::types::SessionStatus;
use crate::repositories;
use crate::schemas::session::{
    AnswerResponse, DetailOption, DetailQuestion, ResultOption, ResultQuestion, SaveAnswerRequest,
    SessionDetailResponse, SessionResponse, SessionResultResponse,
};
use crate::services::grading::{self, AnswerSheetEntry};

/// Idempotent entry: one in-progress session per (user, exam). A repeat
/// call resumes the open session instead of creating a second one.
pub(super) async fn start_session(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    // Load the exam first: a missing id is 404 and a draft is 400 even for
    // callers the access policy would reject.
    let exam = helpers::fetch_published_exam(&state, &exam_id).await?;
    helpers::require_take_access(&state, &user, &exam_id).await?;

    let existing = repositories::sessions::find_in_progress(state.db(), &user.id, &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?;
    if let Some(session) = existing {
        return Ok(Json(SessionResponse::from_db(&session)));
    }

    let now = primitive_now_utc();
    let time_limit_seconds = exam
        .time_limit_seconds
        .unwrap_or(state.settings().exam().default_time_limit_seconds as i32);

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let session_id = Uuid::new_v4().to_string();
    let inserted = repositories::sessions::create(
        &mut *tx,
        repositories::sessions::CreateSession {
            id: &session_id,
            user_id: &user.id,
            exam_id: &exam_id,
            status: SessionStatus::InProgress,
            start_time: now,
            time_limit_seconds,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create session"))?;

    if !inserted {
        // Lost the race against a concurrent start; hand back the winner.
        let existing = repositories::sessions::find_in_progress(&mut *tx, &user.id, &exam_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
            .ok_or_else(|| {
                ApiError::Conflict("A session already exists for this exam".to_string())
            })?;
        tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;
        return Ok(Json(SessionResponse::from_db(&existing)));
    }

    let question_ids = repositories::questions::list_ids_for_exam(&mut *tx, &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam questions"))?;

    repositories::answers::bulk_create(&mut *tx, &session_id, &question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create answer sheet"))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let session = repositories::sessions::find_by_id(state.db(), &session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
        .ok_or_else(|| ApiError::Internal("Session disappeared after creation".to_string()))?;

    Ok(Json(SessionResponse::from_db(&session)))
}

/// Last write wins; saving again for the same question replaces the
/// earlier selection, and a null selection clears it.
pub(super) async fn save_answer(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SaveAnswerRequest>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user.id).await?;
    helpers::require_take_access(&state, &user, &session.exam_id).await?;

    if session.status != SessionStatus::InProgress {
        return Err(ApiError::BadRequest("Session is not in progress".to_string()));
    }

    let link =
        repositories::questions::find_exam_link(state.db(), &session.exam_id, &payload.question_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check exam question"))?;
    if link.is_none() {
        return Err(ApiError::NotFound("Question not found in this exam".to_string()));
    }

    if let Some(option_id) = payload.selected_option_id.as_deref() {
        let belongs =
            repositories::questions::option_belongs(state.db(), &payload.question_id, option_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to check option"))?;
        if !belongs {
            return Err(ApiError::BadRequest(
                "Option does not belong to this question".to_string(),
            ));
        }
    }

    let answer = repositories::answers::save_selection(
        state.db(),
        &session_id,
        &payload.question_id,
        payload.selected_option_id.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save answer"))?;

    Ok(Json(AnswerResponse {
        question_id: answer.question_id,
        selected_option_id: answer.selected_option_id,
        answered_at: answer.answered_at.map(format_primitive),
    }))
}

pub(super) async fn submit_exam(
    Path(exam_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, ApiError> {
    // Session lookup comes before the access check so a caller with no
    // session sees 404, not 403.
    let session = repositories::sessions::find_latest(state.db(), &user.id, &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
        .ok_or_else(|| ApiError::NotFound("No session found for this exam".to_string()))?;

    helpers::require_take_access(&state, &user, &exam_id).await?;

    if session.status != SessionStatus::InProgress {
        return Err(ApiError::BadRequest("Session is already submitted".to_string()));
    }

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let rows = repositories::answers::list_for_grading(&mut *tx, &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;
    let options = repositories::questions::list_options_for_session(&mut *tx, &session.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load options"))?;

    let mut grouped = helpers::group_options_by_question(options);
    let entries: Vec<AnswerSheetEntry> = rows
        .into_iter()
        .map(|row| AnswerSheetEntry {
            options: grouped.remove(&row.question_id).unwrap_or_default(),
            question_id: row.question_id,
            selected_option_id: row.selected_option_id,
            question_content_html: row.content_html,
        })
        .collect();

    let outcome = grading::grade_answer_sheet(&entries)
        .map_err(|err| ApiError::UnprocessableEntity(err.to_string()))?;

    for graded in &outcome.answers {
        repositories::answers::apply_grade(
            &mut *tx,
            &session.id,
            repositories::answers::ApplyGrade {
                question_id: &graded.question_id,
                is_correct: graded.is_correct,
                question_snapshot_html: &graded.question_snapshot_html,
                options_snapshot: &graded.options_snapshot,
                correct_option_id: &graded.correct_option_id,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store grade"))?;
    }

    let session = repositories::sessions::finalize(
        &mut *tx,
        &session.id,
        repositories::sessions::FinalizeSession {
            total_correct: outcome.total_correct,
            total_wrong: outcome.total_wrong,
            total_unanswered: outcome.total_unanswered,
            submitted_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to finalize session"))?
    .ok_or_else(|| ApiError::BadRequest("Session is already submitted".to_string()))?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    metrics::counter!("exam_submissions_total").increment(1);

    Ok(Json(SessionResponse::from_db(&session)))
}

pub(super) async fn get_session_detail(
    Path((exam_id, session_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user.id).await?;
    if session.exam_id != exam_id {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    let questions = repositories::questions::list_for_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let options = repositories::questions::list_options_for_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load options"))?;
    let answers = repositories::answers::list_by_session(state.db(), &session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;

    let mut grouped = helpers::group_options_by_question(options);
    let mut answers_by_question = std::collections::HashMap::new();
    for answer in answers {
        answers_by_question.insert(answer.question_id.clone(), answer);
    }

    let questions = questions
        .into_iter()
        .map(|question| {
            let answer = answers_by_question.remove(&question.question_id);
            DetailQuestion {
                options: grouped
                    .remove(&question.question_id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|option| DetailOption {
                        id: option.id,
                        content_html: option.content_html,
                    })
                    .collect(),
                selected_option_id: answer
                    .as_ref()
                    .and_then(|answer| answer.selected_option_id.clone()),
                answered_at: answer
                    .as_ref()
                    .and_then(|answer| answer.answered_at)
                    .map(format_primitive),
                question_id: question.question_id,
                order_no: question.order_no,
                section_type: question.section_type,
                content_html: question.content_html,
            }
        })
        .collect();

    Ok(Json(SessionDetailResponse { session: SessionResponse::from_db(&session), questions }))
}

/// Built from the snapshots taken at grading time, so later edits to the
/// question bank never change a published result.
pub(super) async fn get_session_result(
    Path((exam_id, session_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SessionResultResponse>, ApiError> {
    let session = helpers::fetch_owned_session(&state, &session_id, &user.id).await?;
    if session.exam_id != exam_id {
        return Err(ApiError::NotFound("Session not found".to_string()));
    }

    if session.status != SessionStatus::Submitted {
        return Err(ApiError::BadRequest("Session is not submitted yet".to_string()));
    }

    let order = repositories::questions::list_for_exam(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let answers = repositories::answers::list_by_session(state.db(), &session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;

    let mut answers_by_question = std::collections::HashMap::new();
    for answer in answers {
        answers_by_question.insert(answer.question_id.clone(), answer);
    }

    let mut questions = Vec::with_capacity(order.len());
    for row in order {
        let Some(answer) = answers_by_question.remove(&row.question_id) else {
            continue;
        };

        let options = answer
            .options_snapshot
            .map(|snapshot| snapshot.0)
            .unwrap_or_default()
            .into_iter()
            .map(|option| ResultOption {
                id: option.id,
                content_html: option.content_html,
                is_correct: option.is_correct,
            })
            .collect();

        questions.push(ResultQuestion {
            question_id: answer.question_id,
            order_no: row.order_no,
            content_html: answer.question_snapshot_html.unwrap_or(row.content_html),
            options,
            selected_option_id: answer.selected_option_id,
            correct_option_id: answer.correct_option_id,
            is_correct: answer.is_correct,
        });
    }

    Ok(Json(SessionResultResponse { session: SessionResponse::from_db(&session), questions }))
}
