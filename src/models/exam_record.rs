// src/models/exam_record.rs

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

/// State of an attempt. Stored as SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[repr(i16)]
pub enum AttemptStatus {
    InProgress = 0,
    Completed = 1,
}

/// Current layout version of [`AnswerSheet`].
pub const ANSWER_SHEET_VERSION: u32 = 1;

/// Serialized form of a learner's submitted answers.
///
/// Keyed by question id so a stored attempt can be read back without
/// knowing anything about the client that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerSheet {
    pub version: u32,
    pub answers: BTreeMap<i64, String>,
}

impl AnswerSheet {
    pub fn new(answers: &HashMap<i64, String>) -> Self {
        Self {
            version: ANSWER_SHEET_VERSION,
            answers: answers
                .iter()
                .map(|(id, answer)| (*id, answer.clone()))
                .collect(),
        }
    }
}

/// Represents the 'exam_records' table in the database.
/// One row per (learner, exam); the pair is unique.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamRecord {
    pub id: i64,
    pub user_id: i64,
    pub exam_id: i64,
    /// Set on submit.
    pub score: Option<f64>,
    /// Copy of the exam's total score when the attempt started.
    pub total_score: f64,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub submit_time: Option<DateTime<Utc>>,
    pub status: AttemptStatus,
    pub answers: Option<Json<AnswerSheet>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExamRecord {
    pub fn is_completed(&self) -> bool {
        self.status == AttemptStatus::Completed
    }
}

/// Outcome of the atomic create-if-absent performed when an attempt starts.
#[derive(Debug, Clone)]
pub enum AttemptSlot {
    /// No attempt existed; this one was just inserted.
    Created(ExamRecord),
    /// An attempt for the pair was already there; it is returned untouched.
    Existing(ExamRecord),
}

impl AttemptSlot {
    pub fn is_created(&self) -> bool {
        matches!(self, AttemptSlot::Created(_))
    }

    pub fn into_record(self) -> ExamRecord {
        match self {
            AttemptSlot::Created(record) | AttemptSlot::Existing(record) => record,
        }
    }
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitExamRequest {
    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: User's answer (String)
    pub answers: HashMap<i64, String>,
}
