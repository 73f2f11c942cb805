//! Storage seam for exams, question banks and attempt records.
//!
//! Two backends: [`postgres::PgExamStore`] for deployments and
//! [`memory::MemoryExamStore`] for tests and local runs. Both must make
//! `create_attempt` and `complete_attempt` atomic; the single-attempt rule
//! relies on it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        exam::{Exam, NewExam, UpdateExamRequest},
        exam_record::{AnswerSheet, AttemptSlot, ExamRecord},
        question::{ExamQuestion, NewQuestion, UpdateQuestionRequest},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryExamStore;
pub use postgres::PgExamStore;

#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn insert_exam(&self, exam: &NewExam, now: DateTime<Utc>) -> Result<Exam, AppError>;

    /// Soft-deleted exams are reported as absent.
    async fn get_exam(&self, id: i64) -> Result<Option<Exam>, AppError>;

    /// Exams of a course, newest first.
    async fn list_exams_by_course(&self, course_id: i64) -> Result<Vec<Exam>, AppError>;

    async fn update_exam(
        &self,
        id: i64,
        patch: &UpdateExamRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<Exam>, AppError>;

    /// Soft-deletes the exam and removes its questions. Returns false if there was nothing to delete.
    async fn delete_exam(&self, id: i64, now: DateTime<Utc>) -> Result<bool, AppError>;

    /// Inserts the batch and refreshes the exam's question count.
    async fn insert_questions(
        &self,
        exam_id: i64,
        questions: &[NewQuestion],
        now: DateTime<Utc>,
    ) -> Result<Vec<ExamQuestion>, AppError>;

    /// Questions of an exam ordered by sort order, then id.
    async fn questions_by_exam(&self, exam_id: i64) -> Result<Vec<ExamQuestion>, AppError>;

    /// A question is only found through the exam it belongs to.
    async fn get_question(
        &self,
        exam_id: i64,
        question_id: i64,
    ) -> Result<Option<ExamQuestion>, AppError>;

    async fn update_question(
        &self,
        exam_id: i64,
        question_id: i64,
        patch: &UpdateQuestionRequest,
    ) -> Result<Option<ExamQuestion>, AppError>;

    /// Removes one question and refreshes the exam's question count.
    async fn delete_question(
        &self,
        exam_id: i64,
        question_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError>;

    /// Sets each question's sort order to its index in `ordered_ids`, all or nothing.
    /// Returns false (and changes nothing) if any id is not a question of the exam.
    async fn reorder_questions(&self, exam_id: i64, ordered_ids: &[i64]) -> Result<bool, AppError>;

    /// Inserts an in-progress attempt unless the learner already has one for the exam.
    async fn create_attempt(
        &self,
        user_id: i64,
        exam_id: i64,
        total_score: f64,
        now: DateTime<Utc>,
    ) -> Result<AttemptSlot, AppError>;

    async fn find_attempt(&self, user_id: i64, exam_id: i64) -> Result<Option<ExamRecord>, AppError>;

    /// Moves an in-progress attempt to completed. Returns `None` if the attempt
    /// was not in progress any more; the stored row is then left as it was.
    async fn complete_attempt(
        &self,
        attempt_id: i64,
        score: f64,
        answers: &AnswerSheet,
        now: DateTime<Utc>,
    ) -> Result<Option<ExamRecord>, AppError>;

    async fn attempts_by_exam(&self, exam_id: i64) -> Result<Vec<ExamRecord>, AppError>;

    /// Attempts of a learner, most recently submitted first.
    async fn attempts_by_user(&self, user_id: i64) -> Result<Vec<ExamRecord>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exam_store_is_object_safe() {
        fn _takes_boxed(_: Box<dyn ExamStore>) {}
    }
}
