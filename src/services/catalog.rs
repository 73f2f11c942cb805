// src/services/catalog.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::{
    config::{
        DEFAULT_DURATION_MINUTES, DEFAULT_PASS_SCORE, DEFAULT_QUESTION_SCORE, DEFAULT_TOTAL_SCORE,
        MAX_EXAM_TITLE_CHARS, MAX_QUESTION_TITLE_CHARS,
    },
    error::AppError,
    models::{
        exam::{CreateExamRequest, Exam, ExamStatus, NewExam, UpdateExamRequest, validate_window},
        question::{
            CreateQuestionRequest, ExamQuestion, NewQuestion, UpdateQuestionRequest,
        },
    },
    store::ExamStore,
    utils::html::{clean_html, clean_optional},
};

/// Exam definitions and their question banks.
#[derive(Clone)]
pub struct ExamCatalog {
    store: Arc<dyn ExamStore>,
}

/// Sanitizes a title and checks what is left. Markup-only input ends up empty,
/// and escaped entities can push the text past the length limit.
fn clean_title(raw: &str, max_chars: usize, kind: &str) -> Result<String, AppError> {
    let cleaned = clean_html(raw.trim());
    let cleaned = cleaned.trim();

    if cleaned.is_empty() {
        return Err(AppError::validation(format!("{} title must not be empty", kind)));
    }
    if cleaned.chars().count() > max_chars {
        return Err(AppError::validation(format!(
            "{} title must be at most {} characters",
            kind, max_chars
        )));
    }
    Ok(cleaned.to_string())
}

fn require_title(title: Option<&str>) -> Result<String, AppError> {
    let title = title.ok_or_else(|| AppError::validation("Exam title must not be empty"))?;
    clean_title(title, MAX_EXAM_TITLE_CHARS, "Exam")
}

fn check_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<(), AppError> {
    validate_window(start, end)
        .map_err(|_| AppError::validation("Start time must not be later than end time"))
}

impl ExamCatalog {
    pub fn new(store: Arc<dyn ExamStore>) -> Self {
        Self { store }
    }

    /// Loads a live exam or fails with `NotFound`.
    pub async fn get_exam(&self, id: i64) -> Result<Exam, AppError> {
        self.store
            .get_exam(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Exam {} not found", id)))
    }

    pub async fn list_course_exams(&self, course_id: i64) -> Result<Vec<Exam>, AppError> {
        self.store.list_exams_by_course(course_id).await
    }

    /// Creates an exam, filling in defaults for any numeric field left out.
    pub async fn create_exam(
        &self,
        req: CreateExamRequest,
        now: DateTime<Utc>,
    ) -> Result<Exam, AppError> {
        req.validate()?;

        let course_id = req
            .course_id
            .ok_or_else(|| AppError::validation("Course id is required"))?;
        let title = require_title(req.title.as_deref())?;
        check_window(req.start_time, req.end_time)?;

        let new_exam = NewExam {
            course_id,
            title,
            description: clean_optional(req.description.as_deref()),
            duration: req.duration.unwrap_or(DEFAULT_DURATION_MINUTES),
            total_score: req.total_score.unwrap_or(DEFAULT_TOTAL_SCORE),
            pass_score: req.pass_score.unwrap_or(DEFAULT_PASS_SCORE),
            start_time: req.start_time,
            end_time: req.end_time,
        };

        let exam = self.store.insert_exam(&new_exam, now).await?;
        tracing::info!(
            "Exam created: id={}, title={}, course_id={}",
            exam.id,
            exam.title,
            exam.course_id
        );
        Ok(exam)
    }

    /// Updates an exam that has not started yet.
    pub async fn update_exam(
        &self,
        id: i64,
        mut patch: UpdateExamRequest,
        now: DateTime<Utc>,
    ) -> Result<Exam, AppError> {
        patch.validate()?;

        let existing = self.get_exam(id).await?;
        if existing.status_at(now) != ExamStatus::NotStarted {
            return Err(AppError::conflict("Exam already started or ended"));
        }

        if patch.title.is_some() {
            patch.title = Some(require_title(patch.title.as_deref())?);
        }
        patch.description = clean_optional(patch.description.as_deref());
        check_window(
            patch.start_time.or(existing.start_time),
            patch.end_time.or(existing.end_time),
        )?;

        if patch.is_empty() {
            return Ok(existing);
        }

        let exam = self
            .store
            .update_exam(id, &patch, now)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Exam {} not found", id)))?;
        tracing::info!("Exam updated: id={}", id);
        Ok(exam)
    }

    /// Soft-deletes an exam together with its question bank.
    /// Attempt records are kept.
    pub async fn delete_exam(&self, id: i64, now: DateTime<Utc>) -> Result<(), AppError> {
        if !self.store.delete_exam(id, now).await? {
            return Err(AppError::not_found(format!("Exam {} not found", id)));
        }
        tracing::info!("Exam deleted: id={}", id);
        Ok(())
    }

    /// Adds a batch of questions. A question without a sort order is placed
    /// after the existing ones, in batch order.
    pub async fn add_questions(
        &self,
        exam_id: i64,
        questions: Vec<CreateQuestionRequest>,
        now: DateTime<Utc>,
    ) -> Result<Vec<ExamQuestion>, AppError> {
        if questions.is_empty() {
            return Err(AppError::validation("No questions supplied"));
        }
        for q in &questions {
            q.validate()?;
        }

        self.get_exam(exam_id).await?;
        let base = self.store.questions_by_exam(exam_id).await?.len() as i32;

        let mut new_questions = Vec::with_capacity(questions.len());
        for (index, q) in questions.into_iter().enumerate() {
            new_questions.push(NewQuestion {
                title: clean_title(&q.title, MAX_QUESTION_TITLE_CHARS, "Question")?,
                question_type: q.question_type,
                content: clean_optional(q.content.as_deref()),
                options: q.options,
                answer: q.answer,
                score: q.score.unwrap_or(DEFAULT_QUESTION_SCORE),
                sort_order: q.sort_order.unwrap_or(base + index as i32),
            });
        }

        let inserted = self
            .store
            .insert_questions(exam_id, &new_questions, now)
            .await?;
        tracing::info!(
            "Questions added: exam_id={}, count={}",
            exam_id,
            inserted.len()
        );
        Ok(inserted)
    }

    pub async fn add_question(
        &self,
        exam_id: i64,
        question: CreateQuestionRequest,
        now: DateTime<Utc>,
    ) -> Result<ExamQuestion, AppError> {
        self.add_questions(exam_id, vec![question], now)
            .await?
            .pop()
            .ok_or_else(|| AppError::internal("Question insert returned no row"))
    }

    /// Full question bank, canonical answers included, by sort order.
    pub async fn questions_by_exam(&self, exam_id: i64) -> Result<Vec<ExamQuestion>, AppError> {
        self.get_exam(exam_id).await?;
        self.store.questions_by_exam(exam_id).await
    }

    /// One question of an exam, canonical answer included.
    pub async fn get_question(
        &self,
        exam_id: i64,
        question_id: i64,
    ) -> Result<ExamQuestion, AppError> {
        self.get_exam(exam_id).await?;
        self.store
            .get_question(exam_id, question_id)
            .await?
            .ok_or_else(|| question_not_found(exam_id, question_id))
    }

    pub async fn update_question(
        &self,
        exam_id: i64,
        question_id: i64,
        mut patch: UpdateQuestionRequest,
    ) -> Result<ExamQuestion, AppError> {
        patch.validate()?;
        self.get_exam(exam_id).await?;

        patch.title = patch
            .title
            .as_deref()
            .map(|t| clean_title(t, MAX_QUESTION_TITLE_CHARS, "Question"))
            .transpose()?;
        patch.content = clean_optional(patch.content.as_deref());

        self.store
            .update_question(exam_id, question_id, &patch)
            .await?
            .ok_or_else(|| question_not_found(exam_id, question_id))
    }

    pub async fn delete_question(
        &self,
        exam_id: i64,
        question_id: i64,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if !self.store.delete_question(exam_id, question_id, now).await? {
            return Err(question_not_found(exam_id, question_id));
        }
        tracing::info!(
            "Question deleted: exam_id={}, question_id={}",
            exam_id,
            question_id
        );
        Ok(())
    }

    /// Rewrites sort orders so that `ordered_ids[i]` gets sort order `i`.
    pub async fn update_question_sort(
        &self,
        exam_id: i64,
        ordered_ids: &[i64],
    ) -> Result<Vec<ExamQuestion>, AppError> {
        if ordered_ids.is_empty() {
            return Err(AppError::validation("Question order must not be empty"));
        }
        self.get_exam(exam_id).await?;

        if !self.store.reorder_questions(exam_id, ordered_ids).await? {
            return Err(AppError::not_found(format!(
                "Some questions do not belong to exam {}",
                exam_id
            )));
        }
        tracing::info!("Question order updated: exam_id={}", exam_id);

        self.store.questions_by_exam(exam_id).await
    }
}

fn question_not_found(exam_id: i64, question_id: i64) -> AppError {
    AppError::not_found(format!(
        "Question {} not found in exam {}",
        question_id, exam_id
    ))
}
