// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Question kind. Stored as SMALLINT (1-4).
///
/// Grading does not look at the type; every kind is scored by exact answer match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum QuestionType {
    SingleChoice = 1,
    MultipleChoice = 2,
    TrueFalse = 3,
    FillBlank = 4,
}

/// Represents the 'exam_questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamQuestion {
    pub id: i64,

    pub exam_id: i64,

    /// Short prompt shown as the question heading.
    pub title: String,

    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub content: Option<String>,

    /// Serialized option set. Opaque to this service; the client decides the encoding.
    pub options: Option<String>,

    /// The canonical answer.
    pub answer: String,

    /// Weight awarded for a correct answer.
    pub score: f64,

    pub sort_order: i32,
}

/// DTO for sending a question to a learner (excludes the canonical answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub content: Option<String>,
    pub options: Option<String>,
    pub score: f64,
    pub sort_order: i32,
}

impl From<ExamQuestion> for PublicQuestion {
    fn from(q: ExamQuestion) -> Self {
        Self {
            id: q.id,
            title: q.title,
            question_type: q.question_type,
            content: q.content,
            options: q.options,
            score: q.score,
            sort_order: q.sort_order,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(length(max = 5000))]
    pub content: Option<String>,
    #[validate(length(max = 5000))]
    pub options: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    #[validate(range(min = 0.0))]
    pub score: Option<f64>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    #[validate(length(max = 5000))]
    pub content: Option<String>,
    #[validate(length(max = 5000))]
    pub options: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: Option<String>,
    #[validate(range(min = 0.0))]
    pub score: Option<f64>,
    #[validate(range(min = 0))]
    pub sort_order: Option<i32>,
}

/// DTO for reordering the question bank of an exam.
#[derive(Debug, Deserialize, Validate)]
pub struct ReorderQuestionsRequest {
    #[validate(length(min = 1))]
    pub question_ids: Vec<i64>,
}

/// A validated question ready to be inserted, with sort order resolved.
#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub question_type: QuestionType,
    pub content: Option<String>,
    pub options: Option<String>,
    pub answer: String,
    pub score: f64,
    pub sort_order: i32,
}
