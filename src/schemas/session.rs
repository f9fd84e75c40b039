use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::ExamSession;
use crate::db::types::SessionStatus;

#[derive(Debug, Deserialize)]
pub(crate) struct SaveAnswerRequest {
    #[serde(alias = "questionId")]
    pub(crate) question_id: String,
    #[serde(default)]
    #[serde(alias = "selectedOptionId")]
    pub(crate) selected_option_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) status: SessionStatus,
    pub(crate) start_time: String,
    pub(crate) time_limit_seconds: i32,
    pub(crate) submitted_at: Option<String>,
    pub(crate) total_correct: Option<i32>,
    pub(crate) total_wrong: Option<i32>,
    pub(crate) total_unanswered: Option<i32>,
}

impl SessionResponse {
    pub(crate) fn from_db(session: &ExamSession) -> Self {
        Self {
            id: session.id.clone(),
            exam_id: session.exam_id.clone(),
            status: session.status,
            start_time: format_primitive(session.start_time),
            time_limit_seconds: session.time_limit_seconds,
            submitted_at: session.submitted_at.map(format_primitive),
            total_correct: session.total_correct,
            total_wrong: session.total_wrong,
            total_unanswered: session.total_unanswered,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) question_id: String,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) answered_at: Option<String>,
}

/// In-progress view of a session: live question bodies and options, with
/// `is_correct` withheld.
#[derive(Debug, Serialize)]
pub(crate) struct SessionDetailResponse {
    pub(crate) session: SessionResponse,
    pub(crate) questions: Vec<DetailQuestion>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetailQuestion {
    pub(crate) question_id: String,
    pub(crate) order_no: i32,
    pub(crate) section_type: String,
    pub(crate) content_html: String,
    pub(crate) options: Vec<DetailOption>,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) answered_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DetailOption {
    pub(crate) id: String,
    pub(crate) content_html: String,
}

/// Post-submission view built from the graded snapshots, not the live
/// question bank.
#[derive(Debug, Serialize)]
pub(crate) struct SessionResultResponse {
    pub(crate) session: SessionResponse,
    pub(crate) questions: Vec<ResultQuestion>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultQuestion {
    pub(crate) question_id: String,
    pub(crate) order_no: i32,
    pub(crate) content_html: String,
    pub(crate) options: Vec<ResultOption>,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) correct_option_id: Option<String>,
    pub(crate) is_correct: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultOption {
    pub(crate) id: String,
    pub(crate) content_html: String,
    pub(crate) is_correct: bool,
}
