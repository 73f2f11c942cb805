// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, types::Json};

use crate::{
    error::AppError,
    models::{
        exam::{Exam, NewExam, UpdateExamRequest},
        exam_record::{AnswerSheet, AttemptSlot, ExamRecord},
        question::{ExamQuestion, NewQuestion, UpdateQuestionRequest},
    },
};

use super::ExamStore;

const EXAM_COLUMNS: &str = "id, course_id, title, description, duration, total_score, pass_score, \
     question_count, start_time, end_time, created_at, updated_at, deleted";

const QUESTION_COLUMNS: &str =
    "id, exam_id, title, type, content, options, answer, score, sort_order";

const RECORD_COLUMNS: &str = "id, user_id, exam_id, score, total_score, start_time, end_time, \
     submit_time, status, answers, created_at, updated_at";

/// PostgreSQL-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgExamStore {
    pool: PgPool,
}

impl PgExamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Keeps `exams.question_count` equal to the number of question rows.
async fn refresh_question_count(
    conn: &mut sqlx::PgConnection,
    exam_id: i64,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE exams
        SET question_count = (SELECT COUNT(*) FROM exam_questions WHERE exam_id = $1)::INT,
            updated_at = $2
        WHERE id = $1
        "#,
    )
    .bind(exam_id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl ExamStore for PgExamStore {
    async fn insert_exam(&self, exam: &NewExam, now: DateTime<Utc>) -> Result<Exam, AppError> {
        let sql = format!(
            r#"
            INSERT INTO exams
            (course_id, title, description, duration, total_score, pass_score,
             question_count, start_time, end_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, $9, $9)
            RETURNING {EXAM_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, Exam>(&sql)
            .bind(exam.course_id)
            .bind(&exam.title)
            .bind(&exam.description)
            .bind(exam.duration)
            .bind(exam.total_score)
            .bind(exam.pass_score)
            .bind(exam.start_time)
            .bind(exam.end_time)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn get_exam(&self, id: i64) -> Result<Option<Exam>, AppError> {
        let sql = format!("SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1 AND deleted = FALSE");
        let exam = sqlx::query_as::<_, Exam>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(exam)
    }

    async fn list_exams_by_course(&self, course_id: i64) -> Result<Vec<Exam>, AppError> {
        let sql = format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE course_id = $1 AND deleted = FALSE \
             ORDER BY created_at DESC, id DESC"
        );
        let exams = sqlx::query_as::<_, Exam>(&sql)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(exams)
    }

    async fn update_exam(
        &self,
        id: i64,
        patch: &UpdateExamRequest,
        now: DateTime<Utc>,
    ) -> Result<Option<Exam>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exams SET ");
        let mut separated = builder.separated(", ");

        separated.push("updated_at = ");
        separated.push_bind_unseparated(now);

        if let Some(title) = &patch.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title.clone());
        }

        if let Some(description) = &patch.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }

        if let Some(duration) = patch.duration {
            separated.push("duration = ");
            separated.push_bind_unseparated(duration);
        }

        if let Some(total_score) = patch.total_score {
            separated.push("total_score = ");
            separated.push_bind_unseparated(total_score);
        }

        if let Some(pass_score) = patch.pass_score {
            separated.push("pass_score = ");
            separated.push_bind_unseparated(pass_score);
        }

        if let Some(start_time) = patch.start_time {
            separated.push("start_time = ");
            separated.push_bind_unseparated(start_time);
        }

        if let Some(end_time) = patch.end_time {
            separated.push("end_time = ");
            separated.push_bind_unseparated(end_time);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder.push(" AND deleted = FALSE RETURNING ");
        builder.push(EXAM_COLUMNS);

        let updated = builder
            .build_query_as::<Exam>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }

    async fn delete_exam(&self, id: i64, now: DateTime<Utc>) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE exams SET deleted = TRUE, updated_at = $2 WHERE id = $1 AND deleted = FALSE",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM exam_questions WHERE exam_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE exams SET question_count = 0 WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn insert_questions(
        &self,
        exam_id: i64,
        questions: &[NewQuestion],
        now: DateTime<Utc>,
    ) -> Result<Vec<ExamQuestion>, AppError> {
        let sql = format!(
            r#"
            INSERT INTO exam_questions
            (exam_id, title, type, content, options, answer, score, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {QUESTION_COLUMNS}
            "#
        );

        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(questions.len());

        for q in questions {
            let row = sqlx::query_as::<_, ExamQuestion>(&sql)
                .bind(exam_id)
                .bind(&q.title)
                .bind(q.question_type)
                .bind(&q.content)
                .bind(&q.options)
                .bind(&q.answer)
                .bind(q.score)
                .bind(q.sort_order)
                .fetch_one(&mut *tx)
                .await?;
            inserted.push(row);
        }

        refresh_question_count(&mut tx, exam_id, now).await?;
        tx.commit().await?;

        Ok(inserted)
    }

    async fn questions_by_exam(&self, exam_id: i64) -> Result<Vec<ExamQuestion>, AppError> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM exam_questions WHERE exam_id = $1 \
             ORDER BY sort_order ASC, id ASC"
        );
        let questions = sqlx::query_as::<_, ExamQuestion>(&sql)
            .bind(exam_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(questions)
    }

    async fn get_question(
        &self,
        exam_id: i64,
        question_id: i64,
    ) -> Result<Option<ExamQuestion>, AppError> {
        let sql = format!(
            "SELECT {QUESTION_COLUMNS} FROM exam_questions WHERE id = $1 AND exam_id = $2"
        );
        let question = sqlx::query_as::<_, ExamQuestion>(&sql)
            .bind(question_id)
            .bind(exam_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(question)
    }

    async fn update_question(
        &self,
        exam_id: i64,
        question_id: i64,
        patch: &UpdateQuestionRequest,
    ) -> Result<Option<ExamQuestion>, AppError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE exam_questions SET ");
        let mut separated = builder.separated(", ");

        // Keeps the statement valid when the patch is empty.
        separated.push("id = id");

        if let Some(title) = &patch.title {
            separated.push("title = ");
            separated.push_bind_unseparated(title.clone());
        }

        if let Some(question_type) = patch.question_type {
            separated.push("type = ");
            separated.push_bind_unseparated(question_type);
        }

        if let Some(content) = &patch.content {
            separated.push("content = ");
            separated.push_bind_unseparated(content.clone());
        }

        if let Some(options) = &patch.options {
            separated.push("options = ");
            separated.push_bind_unseparated(options.clone());
        }

        if let Some(answer) = &patch.answer {
            separated.push("answer = ");
            separated.push_bind_unseparated(answer.clone());
        }

        if let Some(score) = patch.score {
            separated.push("score = ");
            separated.push_bind_unseparated(score);
        }

        if let Some(sort_order) = patch.sort_order {
            separated.push("sort_order = ");
            separated.push_bind_unseparated(sort_order);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(question_id);
        builder.push(" AND exam_id = ");
        builder.push_bind(exam_id);
        builder.push(" RETURNING ");
        builder.push(QUESTION_COLUMNS);

        let updated = builder
            .build_query_as::<ExamQuestion>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(updated)
    }

    async fn delete_question(
        &self,
        exam_id: i64,
        question_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM exam_questions WHERE id = $1 AND exam_id = $2")
            .bind(question_id)
            .bind(exam_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        refresh_question_count(&mut tx, exam_id, now).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn reorder_questions(&self, exam_id: i64, ordered_ids: &[i64]) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        for (index, question_id) in ordered_ids.iter().enumerate() {
            let result = sqlx::query(
                "UPDATE exam_questions SET sort_order = $1 WHERE id = $2 AND exam_id = $3",
            )
            .bind(index as i32)
            .bind(question_id)
            .bind(exam_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(false);
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn create_attempt(
        &self,
        user_id: i64,
        exam_id: i64,
        total_score: f64,
        now: DateTime<Utc>,
    ) -> Result<AttemptSlot, AppError> {
        // ON CONFLICT makes check-and-insert a single statement; the unique
        // constraint on (user_id, exam_id) decides which concurrent start wins.
        let insert = format!(
            r#"
            INSERT INTO exam_records
            (user_id, exam_id, total_score, start_time, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, 0, $4, $4)
            ON CONFLICT (user_id, exam_id) DO NOTHING
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let created = sqlx::query_as::<_, ExamRecord>(&insert)
            .bind(user_id)
            .bind(exam_id)
            .bind(total_score)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(record) = created {
            return Ok(AttemptSlot::Created(record));
        }

        let existing = self.find_attempt(user_id, exam_id).await?.ok_or_else(|| {
            AppError::InternalServerError(format!(
                "exam record for user {} exam {} conflicted but could not be read",
                user_id, exam_id
            ))
        })?;

        Ok(AttemptSlot::Existing(existing))
    }

    async fn find_attempt(&self, user_id: i64, exam_id: i64) -> Result<Option<ExamRecord>, AppError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM exam_records WHERE user_id = $1 AND exam_id = $2"
        );
        let record = sqlx::query_as::<_, ExamRecord>(&sql)
            .bind(user_id)
            .bind(exam_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn complete_attempt(
        &self,
        attempt_id: i64,
        score: f64,
        answers: &AnswerSheet,
        now: DateTime<Utc>,
    ) -> Result<Option<ExamRecord>, AppError> {
        let sql = format!(
            r#"
            UPDATE exam_records
            SET score = $2, end_time = $3, submit_time = $3, status = 1,
                answers = $4, updated_at = $3
            WHERE id = $1 AND status = 0
            RETURNING {RECORD_COLUMNS}
            "#
        );

        let record = sqlx::query_as::<_, ExamRecord>(&sql)
            .bind(attempt_id)
            .bind(score)
            .bind(now)
            .bind(Json(answers))
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn attempts_by_exam(&self, exam_id: i64) -> Result<Vec<ExamRecord>, AppError> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM exam_records WHERE exam_id = $1 ORDER BY id");
        let records = sqlx::query_as::<_, ExamRecord>(&sql)
            .bind(exam_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    async fn attempts_by_user(&self, user_id: i64) -> Result<Vec<ExamRecord>, AppError> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM exam_records WHERE user_id = $1 \
             ORDER BY submit_time DESC NULLS LAST, id DESC"
        );
        let records = sqlx::query_as::<_, ExamRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }
}
