use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use super::signup;
use crate::db::types::ExamStatus;
use crate::test_support;

fn exam_payload() -> serde_json::Value {
    json!({
        "title": "History 101 final",
        "description": "Covers lectures 1-10",
        "time_limit_seconds": 1800,
        "questions": [
            {
                "content_html": "<p>Who wrote the Histories?</p>",
                "section_type": "antiquity",
                "options": [
                    {"content_html": "<p>Herodotus</p>", "is_correct": true},
                    {"content_html": "<p>Thucydides</p>"},
                    {"content_html": "<p>Xenophon</p>"},
                ],
            },
            {
                "content_html": "<p>When did Rome fall?</p>",
                "options": [
                    {"content_html": "<p>476 AD</p>", "is_correct": true},
                    {"content_html": "<p>1453 AD</p>"},
                ],
            },
        ],
    })
}

#[tokio::test]
async fn editor_creates_and_admin_publishes() {
    let ctx = test_support::setup_test_context().await;

    let editor = test_support::insert_editor(ctx.state.db(), "editor@example.com", "pass").await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com", "pass").await;
    let editor_token = test_support::bearer_token(&editor.id, ctx.state.settings());
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&editor_token),
            Some(exam_payload()),
        ))
        .await
        .expect("create exam");

    let status = response.status();
    let exam = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {exam}");
    assert_eq!(exam["status"], "draft");
    assert_eq!(exam["question_count"], 2);
    assert_eq!(exam["time_limit_seconds"], 1800);
    let exam_id = exam["id"].as_str().expect("exam id");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/publish"),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("publish exam");

    let status = response.status();
    let published = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {published}");
    assert_eq!(published["status"], "published");
    assert!(published["published_at"].as_str().is_some());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{exam_id}/publish"),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("second publish");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn create_exam_requires_editor_role() {
    let ctx = test_support::setup_test_context().await;

    let (taker_token, _) = signup(ctx.app.clone(), "taker@example.com", "taker-pass-123").await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&taker_token),
            Some(exam_payload()),
        ))
        .await
        .expect("create exam");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn publish_requires_admin_and_questions() {
    let ctx = test_support::setup_test_context().await;

    let editor = test_support::insert_editor(ctx.state.db(), "editor@example.com", "pass").await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com", "pass").await;
    let editor_token = test_support::bearer_token(&editor.id, ctx.state.settings());
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let empty = test_support::seed_exam(ctx.state.db(), &editor.id, ExamStatus::Draft, None, &[])
        .await
        .exam;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{}/publish", empty.id),
            Some(&editor_token),
            None,
        ))
        .await
        .expect("publish as editor");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/exams/{}/publish", empty.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("publish empty exam");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams/does-not-exist/publish",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("publish missing exam");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_exam_rejects_invalid_questions() {
    let ctx = test_support::setup_test_context().await;

    let editor = test_support::insert_editor(ctx.state.db(), "editor@example.com", "pass").await;
    let editor_token = test_support::bearer_token(&editor.id, ctx.state.settings());

    let payload = json!({
        "title": "Broken exam",
        "questions": [
            {
                "content_html": "<p>Lonely option?</p>",
                "options": [{"content_html": "<p>Only one</p>", "is_correct": true}],
            },
        ],
    });

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&editor_token),
            Some(payload),
        ))
        .await
        .expect("create exam");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn access_approval_is_admin_only_and_idempotent() {
    let ctx = test_support::setup_test_context().await;

    let editor = test_support::insert_editor(ctx.state.db(), "editor@example.com", "pass").await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com", "pass").await;
    let editor_token = test_support::bearer_token(&editor.id, ctx.state.settings());
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let (_, taker_id) = signup(ctx.app.clone(), "taker@example.com", "taker-pass-123").await;

    let seeded = test_support::seed_exam(
        ctx.state.db(),
        &editor.id,
        ExamStatus::Published,
        None,
        &[(2, Some(0))],
    )
    .await;

    let uri = format!("/api/v1/exams/{}/access/approve", seeded.exam.id);
    let body = json!({"user_id": taker_id});

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            Some(&editor_token),
            Some(body.clone()),
        ))
        .await
        .expect("approve as editor");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    for _ in 0..2 {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &uri,
                Some(&admin_token),
                Some(body.clone()),
            ))
            .await
            .expect("approve as admin");

        let status = response.status();
        let access = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {access}");
        assert_eq!(access["status"], "approved");
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            Some(&admin_token),
            Some(json!({"user_id": editor.id})),
        ))
        .await
        .expect("approve staff user");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            &uri,
            Some(&admin_token),
            Some(json!({"user_id": "missing-user"})),
        ))
        .await
        .expect("approve missing user");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn takers_only_see_published_approved_exams() {
    let ctx = test_support::setup_test_context().await;

    let editor = test_support::insert_editor(ctx.state.db(), "editor@example.com", "pass").await;
    let (taker_token, taker_id) =
        signup(ctx.app.clone(), "taker@example.com", "taker-pass-123").await;

    let published = test_support::seed_exam(
        ctx.state.db(),
        &editor.id,
        ExamStatus::Published,
        None,
        &[(2, Some(0))],
    )
    .await;
    let draft = test_support::seed_exam(
        ctx.state.db(),
        &editor.id,
        ExamStatus::Draft,
        None,
        &[(2, Some(0))],
    )
    .await;

    // No approval yet: nothing visible
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams",
            Some(&taker_token),
            None,
        ))
        .await
        .expect("list exams");
    let status = response.status();
    let list = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {list}");
    assert_eq!(list.as_array().map(Vec::len), Some(0));

    test_support::approve_access(ctx.state.db(), &taker_id, &published.exam.id).await;
    test_support::approve_access(ctx.state.db(), &taker_id, &draft.exam.id).await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/exams",
            Some(&taker_token),
            None,
        ))
        .await
        .expect("list exams");
    let list = test_support::read_json(response).await;
    let listed = list.as_array().expect("array");
    assert_eq!(listed.len(), 1, "draft must stay hidden: {list}");
    assert_eq!(listed[0]["id"], published.exam.id.as_str());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{}", draft.exam.id),
            Some(&taker_token),
            None,
        ))
        .await
        .expect("get draft exam");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let editor_token = test_support::bearer_token(&editor.id, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/exams/{}", draft.exam.id),
            Some(&editor_token),
            None,
        ))
        .await
        .expect("get draft exam as editor");
    assert_eq!(response.status(), StatusCode::OK);
}
