// src/handlers/exam.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::{
    error::AppError,
    models::{
        exam::ExamResponse, exam_record::SubmitExamRequest, learner::LearnerId,
        question::PublicQuestion,
    },
    services::{AttemptManager, ExamCatalog},
};

/// Lists the exams of a course, newest first.
pub async fn list_course_exams(
    State(catalog): State<ExamCatalog>,
    Path(course_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let exams: Vec<ExamResponse> = catalog
        .list_course_exams(course_id)
        .await?
        .into_iter()
        .map(|exam| ExamResponse::at(exam, now))
        .collect();

    Ok(Json(exams))
}

/// Retrieves one exam with its current status.
pub async fn get_exam(
    State(catalog): State<ExamCatalog>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = catalog.get_exam(id).await?;
    Ok(Json(ExamResponse::at(exam, Utc::now())))
}

/// Returns the question bank of an exam without the canonical answers.
pub async fn get_exam_questions(
    State(catalog): State<ExamCatalog>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions: Vec<PublicQuestion> = catalog
        .questions_by_exam(id)
        .await?
        .into_iter()
        .map(PublicQuestion::from)
        .collect();

    Ok(Json(questions))
}

/// Starts the caller's attempt on an exam (201), or resumes the one in progress (200).
pub async fn start_exam(
    State(attempts): State<AttemptManager>,
    Extension(learner): Extension<LearnerId>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let slot = attempts.start_exam(learner, id, Utc::now()).await?;
    let status = if slot.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(slot.into_record())))
}

/// Submits the caller's answers and returns the graded attempt.
pub async fn submit_exam(
    State(attempts): State<AttemptManager>,
    Extension(learner): Extension<LearnerId>,
    Path(id): Path<i64>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let record = attempts
        .submit_exam(learner, id, &req.answers, Utc::now())
        .await?;
    Ok(Json(record))
}

/// Lists the caller's own attempts.
pub async fn my_records(
    State(attempts): State<AttemptManager>,
    Extension(learner): Extension<LearnerId>,
) -> Result<impl IntoResponse, AppError> {
    let records = attempts.my_attempts(learner).await?;
    Ok(Json(records))
}
