// src/services/attempt.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        exam::ExamStatus,
        exam_record::{AnswerSheet, AttemptSlot, ExamRecord},
        learner::LearnerId,
    },
    services::{catalog::ExamCatalog, grading::auto_grade},
    store::ExamStore,
};

/// Starts and submits exam attempts.
///
/// A learner gets exactly one attempt per exam. Starting again while the
/// attempt is in progress hands back the same attempt; once it is submitted,
/// both starting and submitting again are conflicts.
///
/// Attempts are never closed by the clock: one that was started inside the
/// window stays in progress until the learner submits it.
#[derive(Clone)]
pub struct AttemptManager {
    store: Arc<dyn ExamStore>,
    catalog: ExamCatalog,
}

impl AttemptManager {
    pub fn new(store: Arc<dyn ExamStore>, catalog: ExamCatalog) -> Self {
        Self { store, catalog }
    }

    /// Returns `AttemptSlot::Existing` when an in-progress attempt is resumed.
    pub async fn start_exam(
        &self,
        learner: LearnerId,
        exam_id: i64,
        now: DateTime<Utc>,
    ) -> Result<AttemptSlot, AppError> {
        let exam = self.catalog.get_exam(exam_id).await?;

        match exam.status_at(now) {
            ExamStatus::NotStarted => return Err(AppError::conflict("Exam is not yet open")),
            ExamStatus::Ended => return Err(AppError::conflict("Exam is closed")),
            ExamStatus::InProgress => {}
        }

        let slot = self
            .store
            .create_attempt(learner.get(), exam_id, exam.total_score, now)
            .await?;

        match &slot {
            AttemptSlot::Created(record) => {
                tracing::info!(
                    "Exam started: user_id={}, exam_id={}, record_id={}",
                    learner,
                    exam_id,
                    record.id
                );
            }
            AttemptSlot::Existing(record) if record.is_completed() => {
                return Err(AppError::conflict("Exam already taken"));
            }
            AttemptSlot::Existing(record) => {
                tracing::debug!(
                    "Exam resumed: user_id={}, exam_id={}, record_id={}",
                    learner,
                    exam_id,
                    record.id
                );
            }
        }
        Ok(slot)
    }

    pub async fn submit_exam(
        &self,
        learner: LearnerId,
        exam_id: i64,
        answers: &HashMap<i64, String>,
        now: DateTime<Utc>,
    ) -> Result<ExamRecord, AppError> {
        let record = self
            .store
            .find_attempt(learner.get(), exam_id)
            .await?
            .ok_or_else(|| AppError::validation("No exam record found, start the exam first"))?;

        if record.is_completed() {
            return Err(AppError::conflict("Exam already submitted"));
        }

        let questions = self.store.questions_by_exam(exam_id).await?;
        let raw = auto_grade(answers, &questions);
        let score = raw.clamp(0.0, record.total_score);
        if score != raw {
            tracing::warn!(
                "Score clamped: exam_id={}, record_id={}, raw={}, total_score={}",
                exam_id,
                record.id,
                raw,
                record.total_score
            );
        }

        let sheet = AnswerSheet::new(answers);
        let completed = self
            .store
            .complete_attempt(record.id, score, &sheet, now)
            .await?
            // A concurrent submit got there first.
            .ok_or_else(|| AppError::conflict("Exam already submitted"))?;

        tracing::info!(
            "Exam submitted: user_id={}, exam_id={}, score={}",
            learner,
            exam_id,
            score
        );
        Ok(completed)
    }

    /// The learner's attempts, most recently submitted first.
    pub async fn my_attempts(&self, learner: LearnerId) -> Result<Vec<ExamRecord>, AppError> {
        self.store.attempts_by_user(learner.get()).await
    }

    /// Every attempt on an exam.
    pub async fn exam_attempts(&self, exam_id: i64) -> Result<Vec<ExamRecord>, AppError> {
        self.catalog.get_exam(exam_id).await?;
        self.store.attempts_by_exam(exam_id).await
    }
}
