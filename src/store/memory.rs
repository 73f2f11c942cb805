// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tokio::sync::Mutex;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, NewExam, UpdateExamRequest},
        exam_record::{AnswerSheet, AttemptSlot, AttemptStatus, ExamRecord},
        question::{ExamQuestion, NewQuestion, UpdateQuestionRequest},
    },
};

use super::ExamStore;

#[derive(Default)]
struct Tables {
    exams: BTreeMap<i64, Exam>,
    questions: BTreeMap<i64, ExamQuestion>,
    records: BTreeMap<i64, ExamRecord>,
    next_exam_id: i64,
    next_question_id: i64,
    next_record_id: i64,
}

impl Tables {
    fn live_exam_mut(&mut self, id: i64) -> Option<&mut Exam> {
        self.exams.get_mut(&id).filter(|e| !e.deleted)
    }

    fn refresh_question_count(&mut self, exam_id: i64, now: DateTime<Utc>) {
        let count = self
            .questions
            .values()
            .filter(|q| q.exam_id == exam_id)
            .count() as i32;
        if let Some(exam) = self.exams.get_mut(&exam_id) {
            exam.question_count = count;
            exam.updated_at = now;
        }
    }
}

/// In-process store. Every operation runs under one lock, which is what makes
/// attempt creation and completion atomic here.
#[derive(Default)]
pub struct MemoryExamStore {
    tables: Mutex<Tables>,
}

impl MemoryExamStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExamStore for MemoryExamStore {
    async fn insert_exam(&self, exam: &NewExam, now: DateTime<Utc>) -> Result<Exam, AppError> {
        let mut tables = self.tables.lock().await;
        tables.next_exam_id += 1;

        let created = Exam {
            id: tables.next_exam_id,
            course_id: exam.course_id,
            title: exam.title.clone(),
            description: exam.description.clone(),
            duration: exam.duration,
            total_score: exam.total_score,
            pass_score: exam.pass_score,
            question_count: 0,
            start_time: exam.start_time,
            end_time: exam.end_time,
            created_at: now,
            updated_at: now,
            deleted: false,
        };
        tables.exams.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_exam(&self, id: i64) -> Result<Option<Exam>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.exams.get(&id).filter(|e| !e.deleted).cloned())
    }

    async fn list_exams_by_course(&self, course_id: i64) -> Result<Vec<Exam>, AppError> {
        let tables = self.tables.lock().await;
        let mut exams: Vec<Exam> = tables
            .exams
            .values()
            .filter(|e| e.course_id == course_id && !e.deleted)
            .cloned()
            .collect();
        exams.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(exams)
    }

    async fn update_exam(
        &self,
        id: i64,
        patch: &UpdateExamRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<Exam>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(exam) = tables.live_exam_mut(id) else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            exam.title = title.clone();
        }
        if let Some(description) = &patch.description {
            exam.description = Some(description.clone());
        }
        if let Some(duration) = patch.duration {
            exam.duration = duration;
        }
        if let Some(total_score) = patch.total_score {
            exam.total_score = total_score;
        }
        if let Some(pass_score) = patch.pass_score {
            exam.pass_score = pass_score;
        }
        if let Some(start_time) = patch.start_time {
            exam.start_time = Some(start_time);
        }
        if let Some(end_time) = patch.end_time {
            exam.end_time = Some(end_time);
        }
        exam.updated_at = now;

        Ok(Some(exam.clone()))
    }

    async fn delete_exam(&self, id: i64, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(exam) = tables.live_exam_mut(id) else {
            return Ok(false);
        };
        exam.deleted = true;
        exam.question_count = 0;
        exam.updated_at = now;

        tables.questions.retain(|_, q| q.exam_id != id);
        Ok(true)
    }

    async fn insert_questions(
        &self,
        exam_id: i64,
        questions: &[NewQuestion],
        now: DateTime<Utc>,
    ) -> Result<Vec<ExamQuestion>, AppError> {
        let mut tables = self.tables.lock().await;
        let mut inserted = Vec::with_capacity(questions.len());

        for q in questions {
            tables.next_question_id += 1;
            let row = ExamQuestion {
                id: tables.next_question_id,
                exam_id,
                title: q.title.clone(),
                question_type: q.question_type,
                content: q.content.clone(),
                options: q.options.clone(),
                answer: q.answer.clone(),
                score: q.score,
                sort_order: q.sort_order,
            };
            tables.questions.insert(row.id, row.clone());
            inserted.push(row);
        }

        tables.refresh_question_count(exam_id, now);
        Ok(inserted)
    }

    async fn questions_by_exam(&self, exam_id: i64) -> Result<Vec<ExamQuestion>, AppError> {
        let tables = self.tables.lock().await;
        let mut questions: Vec<ExamQuestion> = tables
            .questions
            .values()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect();
        questions.sort_by_key(|q| (q.sort_order, q.id));
        Ok(questions)
    }

    async fn get_question(
        &self,
        exam_id: i64,
        question_id: i64,
    ) -> Result<Option<ExamQuestion>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .questions
            .get(&question_id)
            .filter(|q| q.exam_id == exam_id)
            .cloned())
    }

    async fn update_question(
        &self,
        exam_id: i64,
        question_id: i64,
        patch: &UpdateQuestionRequest,
    ) -> Result<Option<ExamQuestion>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(q) = tables
            .questions
            .get_mut(&question_id)
            .filter(|q| q.exam_id == exam_id)
        else {
            return Ok(None);
        };

        if let Some(title) = &patch.title {
            q.title = title.clone();
        }
        if let Some(question_type) = patch.question_type {
            q.question_type = question_type;
        }
        if let Some(content) = &patch.content {
            q.content = Some(content.clone());
        }
        if let Some(options) = &patch.options {
            q.options = Some(options.clone());
        }
        if let Some(answer) = &patch.answer {
            q.answer = answer.clone();
        }
        if let Some(score) = patch.score {
            q.score = score;
        }
        if let Some(sort_order) = patch.sort_order {
            q.sort_order = sort_order;
        }

        Ok(Some(q.clone()))
    }

    async fn delete_question(
        &self,
        exam_id: i64,
        question_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let belongs = tables
            .questions
            .get(&question_id)
            .is_some_and(|q| q.exam_id == exam_id);
        if !belongs {
            return Ok(false);
        }

        tables.questions.remove(&question_id);
        tables.refresh_question_count(exam_id, now);
        Ok(true)
    }

    async fn reorder_questions(&self, exam_id: i64, ordered_ids: &[i64]) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let all_belong = ordered_ids.iter().all(|id| {
            tables
                .questions
                .get(id)
                .is_some_and(|q| q.exam_id == exam_id)
        });
        if !all_belong {
            return Ok(false);
        }

        for (index, id) in ordered_ids.iter().enumerate() {
            if let Some(q) = tables.questions.get_mut(id) {
                q.sort_order = index as i32;
            }
        }
        Ok(true)
    }

    async fn create_attempt(
        &self,
        user_id: i64,
        exam_id: i64,
        total_score: f64,
        now: DateTime<Utc>,
    ) -> Result<AttemptSlot, AppError> {
        let mut tables = self.tables.lock().await;

        if let Some(existing) = tables
            .records
            .values()
            .find(|r| r.user_id == user_id && r.exam_id == exam_id)
        {
            return Ok(AttemptSlot::Existing(existing.clone()));
        }

        tables.next_record_id += 1;
        let record = ExamRecord {
            id: tables.next_record_id,
            user_id,
            exam_id,
            score: None,
            total_score,
            start_time: now,
            end_time: None,
            submit_time: None,
            status: AttemptStatus::InProgress,
            answers: None,
            created_at: now,
            updated_at: now,
        };
        tables.records.insert(record.id, record.clone());
        Ok(AttemptSlot::Created(record))
    }

    async fn find_attempt(&self, user_id: i64, exam_id: i64) -> Result<Option<ExamRecord>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .records
            .values()
            .find(|r| r.user_id == user_id && r.exam_id == exam_id)
            .cloned())
    }

    async fn complete_attempt(
        &self,
        attempt_id: i64,
        score: f64,
        answers: &AnswerSheet,
        now: DateTime<Utc>,
    ) -> Result<Option<ExamRecord>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(record) = tables
            .records
            .get_mut(&attempt_id)
            .filter(|r| r.status == AttemptStatus::InProgress)
        else {
            return Ok(None);
        };

        record.score = Some(score);
        record.end_time = Some(now);
        record.submit_time = Some(now);
        record.status = AttemptStatus::Completed;
        record.answers = Some(Json(answers.clone()));
        record.updated_at = now;

        Ok(Some(record.clone()))
    }

    async fn attempts_by_exam(&self, exam_id: i64) -> Result<Vec<ExamRecord>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .records
            .values()
            .filter(|r| r.exam_id == exam_id)
            .cloned()
            .collect())
    }

    async fn attempts_by_user(&self, user_id: i64) -> Result<Vec<ExamRecord>, AppError> {
        let tables = self.tables.lock().await;
        let mut records: Vec<ExamRecord> = tables
            .records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        // Submitted first (latest on top), then unsubmitted by id.
        records.sort_by(|a, b| match (a.submit_time, b.submit_time) {
            (Some(x), Some(y)) => y.cmp(&x).then(b.id.cmp(&a.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => b.id.cmp(&a.id),
        });
        Ok(records)
    }
}
