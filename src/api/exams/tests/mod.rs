use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

mod authoring;

pub(super) async fn signup(app: axum::Router, email: &str, password: &str) -> (String, String) {
    let response = app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/auth/signup",
            None,
            Some(json!({
                "email": email,
                "password": password,
                "full_name": "Flow User",
            })),
        ))
        .await
        .expect("signup");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");

    let token = body["access_token"].as_str().expect("access token").to_string();
    let user_id = body["user"]["id"].as_str().expect("user id").to_string();
    (token, user_id)
}

pub(super) async fn start_session(
    app: axum::Router,
    token: &str,
    exam_id: &str,
) -> serde_json::Value {
    let response = app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/sessions"),
            Some(token),
            None,
        ))
        .await
        .expect("start session");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    body
}

pub(super) async fn save_answer(
    app: axum::Router,
    token: &str,
    session_id: &str,
    question_id: &str,
    option_id: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/exams/sessions/{session_id}/answers"),
            Some(token),
            Some(json!({
                "question_id": question_id,
                "selected_option_id": option_id,
            })),
        ))
        .await
        .expect("save answer");

    let status = response.status();
    let body = test_support::read_json(response).await;
    (status, body)
}

pub(super) async fn submit_exam(
    app: axum::Router,
    token: &str,
    exam_id: &str,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/submit"),
            Some(token),
            None,
        ))
        .await
        .expect("submit exam");

    let status = response.status();
    let body = test_support::read_json(response).await;
    (status, body)
}
