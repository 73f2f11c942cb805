// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, exam},
    state::AppState,
    utils::jwt::{auth_middleware, staff_middleware},
};

/// Assembles the main application router.
///
/// * Public exam routes (catalog reads).
/// * Learner routes behind bearer-token auth (questions, start, submit, own records).
/// * Staff routes behind auth plus the staff check (exam and question management, stats).
/// * Global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let learner_routes = Router::new()
        .route("/my-records", get(exam::my_records))
        .route("/{id}/questions", get(exam::get_exam_questions))
        .route("/{id}/start", post(exam::start_exam))
        .route("/{id}/submit", post(exam::submit_exam))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let exam_routes = Router::new()
        .route("/course/{course_id}", get(exam::list_course_exams))
        .route("/{id}", get(exam::get_exam))
        .merge(learner_routes);

    let admin_routes = Router::new()
        .route("/", post(admin::create_exam))
        .route(
            "/{id}",
            put(admin::update_exam).delete(admin::delete_exam),
        )
        .route(
            "/{id}/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route("/{id}/questions/batch", post(admin::create_questions))
        .route("/{id}/questions/sort", put(admin::reorder_questions))
        .route(
            "/{id}/questions/{question_id}",
            get(admin::get_question)
                .put(admin::update_question)
                .delete(admin::delete_question),
        )
        .route("/{id}/stats", get(admin::exam_stats))
        .route("/{id}/records", get(admin::exam_records))
        // Double middleware protection: Auth first, then Staff check
        .layer(middleware::from_fn(staff_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/exams", exam_routes)
        .nest("/api/admin/exams", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
