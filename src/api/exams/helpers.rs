use std::collections::HashMap;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::{Exam, ExamSession, QuestionOption, User};
use crate::db::types::ExamStatus;
use crate::repositories;
use crate::services::access_policy::{self, AccessPolicyError};

/// A missing exam is 404; one that exists but is still a draft is 400,
/// whatever grants the caller holds.
pub(super) async fn fetch_published_exam(
    state: &AppState,
    exam_id: &str,
) -> Result<Exam, ApiError> {
    let exam = repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?;

    match exam {
        Some(exam) if exam.status == ExamStatus::Published => Ok(exam),
        Some(_) => Err(ApiError::BadRequest("Exam is not published".to_string())),
        None => Err(ApiError::NotFound("Exam not found".to_string())),
    }
}

/// Ownership mismatch is indistinguishable from a missing session; both
/// come back as 404 so session ids leak nothing across users.
pub(super) async fn fetch_owned_session(
    state: &AppState,
    session_id: &str,
    user_id: &str,
) -> Result<ExamSession, ApiError> {
    let session = repositories::sessions::find_by_id(state.db(), session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?;

    match session {
        Some(session) if session.user_id == user_id => Ok(session),
        _ => Err(ApiError::NotFound("Session not found".to_string())),
    }
}

pub(super) async fn require_take_access(
    state: &AppState,
    user: &User,
    exam_id: &str,
) -> Result<(), ApiError> {
    access_policy::ensure_can_take_exam(state.db(), user, exam_id).await.map_err(|err| match err {
        AccessPolicyError::RoleNotEligible => {
            ApiError::Forbidden("Only regular users can take exams")
        }
        AccessPolicyError::NotApproved => ApiError::Forbidden("Exam access not approved"),
        AccessPolicyError::Db(e) => ApiError::internal(e, "Failed to check exam access"),
    })
}

pub(super) fn group_options_by_question(
    options: Vec<QuestionOption>,
) -> HashMap<String, Vec<QuestionOption>> {
    let mut grouped: HashMap<String, Vec<QuestionOption>> = HashMap::new();
    for option in options {
        grouped.entry(option.question_id.clone()).or_default().push(option);
    }
    grouped
}
