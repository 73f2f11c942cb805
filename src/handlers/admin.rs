// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::{CreateExamRequest, ExamResponse, UpdateExamRequest},
        question::{CreateQuestionRequest, ReorderQuestionsRequest, UpdateQuestionRequest},
    },
    services::{AttemptManager, ExamCatalog, ExamStatistics},
};

/// Creates a new exam.
/// Staff only.
pub async fn create_exam(
    State(catalog): State<ExamCatalog>,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let exam = catalog.create_exam(payload, now).await?;
    Ok((StatusCode::CREATED, Json(ExamResponse::at(exam, now))))
}

/// Updates an exam that has not opened yet.
/// Staff only.
pub async fn update_exam(
    State(catalog): State<ExamCatalog>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let exam = catalog.update_exam(id, payload, now).await?;
    Ok(Json(ExamResponse::at(exam, now)))
}

/// Deletes an exam and its questions.
/// Staff only.
pub async fn delete_exam(
    State(catalog): State<ExamCatalog>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    catalog.delete_exam(id, Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Full question bank including canonical answers.
/// Staff only.
pub async fn list_questions(
    State(catalog): State<ExamCatalog>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let questions = catalog.questions_by_exam(id).await?;
    Ok(Json(questions))
}

/// Adds a single question.
/// Staff only.
pub async fn create_question(
    State(catalog): State<ExamCatalog>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = catalog.add_question(id, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

/// Adds a batch of questions.
/// Staff only.
pub async fn create_questions(
    State(catalog): State<ExamCatalog>,
    Path(id): Path<i64>,
    Json(payload): Json<Vec<CreateQuestionRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let questions = catalog.add_questions(id, payload, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(questions)))
}

/// Rewrites the order of an exam's questions.
/// Staff only.
pub async fn reorder_questions(
    State(catalog): State<ExamCatalog>,
    Path(id): Path<i64>,
    Json(payload): Json<ReorderQuestionsRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let questions = catalog
        .update_question_sort(id, &payload.question_ids)
        .await?;
    Ok(Json(questions))
}

/// Retrieves one question, canonical answer included.
/// Staff only.
pub async fn get_question(
    State(catalog): State<ExamCatalog>,
    Path((id, question_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let question = catalog.get_question(id, question_id).await?;
    Ok(Json(question))
}

/// Updates a question by ID.
/// Staff only.
pub async fn update_question(
    State(catalog): State<ExamCatalog>,
    Path((id, question_id)): Path<(i64, i64)>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let question = catalog.update_question(id, question_id, payload).await?;
    Ok(Json(question))
}

/// Deletes a question by ID.
/// Staff only.
pub async fn delete_question(
    State(catalog): State<ExamCatalog>,
    Path((id, question_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    catalog.delete_question(id, question_id, Utc::now()).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Cohort statistics for an exam.
/// Staff only.
pub async fn exam_stats(
    State(stats): State<ExamStatistics>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let stats = stats.exam_stats(id).await?;
    Ok(Json(stats))
}

/// All attempts on an exam.
/// Staff only.
pub async fn exam_records(
    State(attempts): State<AttemptManager>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let records = attempts.exam_attempts(id).await?;
    Ok(Json(records))
}
