mod handlers;
mod helpers;
mod sessions;

use axum::{routing::get, routing::post, routing::put, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::create_exam).get(handlers::list_exams))
        .route("/:exam_id", get(handlers::get_exam))
        .route("/:exam_id/publish", post(handlers::publish_exam))
        .route("/:exam_id/access/approve", post(handlers::approve_access))
        .route("/:exam_id/sessions", post(sessions::start_session))
        .route("/:exam_id/submit", post(sessions::submit_exam))
        .route("/:exam_id/sessions/:session_id", get(sessions::get_session_detail))
        .route("/:exam_id/sessions/:session_id/result", get(sessions::get_session_result))
        .route("/sessions/:session_id/answers", put(sessions::save_answer))
}

#[cfg(test)]
mod tests;
