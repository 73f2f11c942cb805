// tests/api_tests.rs

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use exam_service::{
    config::Config,
    routes,
    state::AppState,
    store::MemoryExamStore,
    utils::jwt::{ROLE_INSTRUCTOR, ROLE_STUDENT, sign_jwt},
};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "test_secret_for_integration_tests";

/// Builds the router over a fresh in-memory store.
fn spawn_app() -> Router {
    let config = Config {
        database_url: "postgres://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        listen_addr: "127.0.0.1:0".to_string(),
        max_connections: 1,
    };

    let state = AppState::new(Arc::new(MemoryExamStore::new()), config);
    routes::create_router(state)
}

fn token(id: i64, role: &str) -> String {
    sign_jwt(id, role, SECRET, 600).expect("Failed to sign token")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", t));
    }
    let request = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Failed to execute request");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Creates an open exam with two questions (40 + 60 points) as an instructor.
async fn seed_exam(app: &Router, staff: &str) -> (i64, Vec<i64>) {
    let (status, exam) = send(
        app,
        Method::POST,
        "/api/admin/exams",
        Some(staff),
        Some(json!({ "course_id": 3, "title": "Final exam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(exam["status"], "in_progress");
    let exam_id = exam["id"].as_i64().unwrap();

    let (status, questions) = send(
        app,
        Method::POST,
        &format!("/api/admin/exams/{}/questions/batch", exam_id),
        Some(staff),
        Some(json!([
            { "title": "2 + 2", "type": "single_choice", "options": "[\"3\",\"4\"]", "answer": "B", "score": 40.0 },
            { "title": "Sky is blue", "type": "true_false", "answer": "true", "score": 60.0 }
        ])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let ids = questions
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_i64().unwrap())
        .collect();

    (exam_id, ids)
}

#[tokio::test]
async fn unknown_path_is_404() {
    let app = spawn_app();
    let (status, _) = send(&app, Method::GET, "/random_path_that_does_not_exist", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn learner_routes_require_token() {
    let app = spawn_app();
    let staff = token(1, ROLE_INSTRUCTOR);
    let (exam_id, _) = seed_exam(&app, &staff).await;

    let (status, _) = send(&app, Method::POST, &format!("/api/exams/{}/start", exam_id), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/exams/{}/start", exam_id),
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn students_cannot_manage_exams() {
    let app = spawn_app();
    let student = token(5, ROLE_STUDENT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/exams",
        Some(&student),
        Some(json!({ "course_id": 3, "title": "Sneaky" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_exam_validation_errors_are_400() {
    let app = spawn_app();
    let staff = token(1, ROLE_INSTRUCTOR);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/exams",
        Some(&staff),
        Some(json!({ "title": "No course" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/admin/exams",
        Some(&staff),
        Some(json!({
            "course_id": 3,
            "title": "Backwards",
            "start_time": "2030-01-02T00:00:00Z",
            "end_time": "2030-01-01T00:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_attempt_flow() {
    let app = spawn_app();
    let staff = token(1, ROLE_INSTRUCTOR);
    let (exam_id, ids) = seed_exam(&app, &staff).await;

    let alice = token(10, ROLE_STUDENT);
    let bob = token(11, ROLE_STUDENT);

    // Learners never see canonical answers.
    let (status, questions) = send(
        &app,
        Method::GET,
        &format!("/api/exams/{}/questions", exam_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    for q in questions.as_array().unwrap() {
        assert!(q.get("answer").is_none());
    }

    for t in [&alice, &bob] {
        let (status, record) = send(
            &app,
            Method::POST,
            &format!("/api/exams/{}/start", exam_id),
            Some(t),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record["status"], "in_progress");
    }

    // Starting again before submitting resumes the open attempt.
    let (status, resumed) = send(
        &app,
        Method::POST,
        &format!("/api/exams/{}/start", exam_id),
        Some(&alice),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resumed["status"], "in_progress");

    let mut alice_answers = serde_json::Map::new();
    alice_answers.insert(ids[0].to_string(), json!("b"));
    alice_answers.insert(ids[1].to_string(), json!("false"));
    let (status, record) = send(
        &app,
        Method::POST,
        &format!("/api/exams/{}/submit", exam_id),
        Some(&alice),
        Some(json!({ "answers": alice_answers })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["score"], 40.0);
    assert_eq!(record["status"], "completed");
    assert_eq!(record["answers"]["version"], 1);

    let mut bob_answers = serde_json::Map::new();
    bob_answers.insert(ids[0].to_string(), json!("B"));
    bob_answers.insert(ids[1].to_string(), json!(" TRUE "));
    let (status, record) = send(
        &app,
        Method::POST,
        &format!("/api/exams/{}/submit", exam_id),
        Some(&bob),
        Some(json!({ "answers": bob_answers })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["score"], 100.0);

    // Resubmission and a second start are both conflicts.
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/exams/{}/submit", exam_id),
        Some(&bob),
        Some(json!({ "answers": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/exams/{}/start", exam_id),
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, stats) = send(
        &app,
        Method::GET,
        &format!("/api/admin/exams/{}/stats", exam_id),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        json!({
            "total_participants": 2,
            "completed_count": 2,
            "average_score": 70.0,
            "pass_rate": 0.5,
            "highest_score": 100.0,
            "lowest_score": 40.0
        })
    );

    let (status, mine) = send(&app, Method::GET, "/api/exams/my-records", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (status, records) = send(
        &app,
        Method::GET,
        &format!("/api/admin/exams/{}/records", exam_id),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn submit_before_start_is_400() {
    let app = spawn_app();
    let staff = token(1, ROLE_INSTRUCTOR);
    let (exam_id, _) = seed_exam(&app, &staff).await;
    let student = token(30, ROLE_STUDENT);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/exams/{}/submit", exam_id),
        Some(&student),
        Some(json!({ "answers": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("start the exam first"));
}

#[tokio::test]
async fn update_open_exam_conflicts_and_scheduled_exam_updates() {
    let app = spawn_app();
    let staff = token(1, ROLE_INSTRUCTOR);
    let (open_id, _) = seed_exam(&app, &staff).await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/exams/{}", open_id),
        Some(&staff),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, scheduled) = send(
        &app,
        Method::POST,
        "/api/admin/exams",
        Some(&staff),
        Some(json!({
            "course_id": 3,
            "title": "Next year",
            "start_time": "2099-01-01T09:00:00Z",
            "end_time": "2099-01-01T11:00:00Z"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(scheduled["status"], "not_started");
    let scheduled_id = scheduled["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/exams/{}", scheduled_id),
        Some(&staff),
        Some(json!({ "duration": 90 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["duration"], 90);

    let student = token(40, ROLE_STUDENT);
    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/exams/{}/start", scheduled_id),
        Some(&student),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, listed) = send(&app, Method::GET, "/api/exams/course/3", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn question_management_routes() {
    let app = spawn_app();
    let staff = token(2, ROLE_INSTRUCTOR);
    let (exam_id, ids) = seed_exam(&app, &staff).await;

    let (status, reordered) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/exams/{}/questions/sort", exam_id),
        Some(&staff),
        Some(json!({ "question_ids": [ids[1], ids[0]] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reordered[0]["id"].as_i64(), Some(ids[1]));
    assert_eq!(reordered[0]["answer"], "true");

    let (status, single) = send(
        &app,
        Method::GET,
        &format!("/api/admin/exams/{}/questions/{}", exam_id, ids[1]),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single["title"], "Sky is blue");
    assert_eq!(single["answer"], "true");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/admin/exams/{}/questions/{}", exam_id, ids[1]),
        Some(&token(9, ROLE_STUDENT)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (other_id, _) = seed_exam(&app, &staff).await;
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/admin/exams/{}/questions/{}", other_id, ids[1]),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, updated) = send(
        &app,
        Method::PUT,
        &format!("/api/admin/exams/{}/questions/{}", exam_id, ids[0]),
        Some(&staff),
        Some(json!({ "answer": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["answer"], "A");

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/exams/{}/questions/{}", exam_id, ids[0]),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, exam) = send(&app, Method::GET, &format!("/api/exams/{}", exam_id), None, None).await;
    assert_eq!(exam["question_count"], 1);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/admin/exams/{}", exam_id),
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::GET, &format!("/api/exams/{}", exam_id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn markup_only_title_is_400() {
    let app = spawn_app();
    let staff = token(2, ROLE_INSTRUCTOR);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/admin/exams",
        Some(&staff),
        Some(json!({ "course_id": 3, "title": "<script>alert(1)</script>" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("must not be empty"));

    let (_, listed) = send(&app, Method::GET, "/api/exams/course/3", None, None).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}
