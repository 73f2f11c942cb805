// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'exams' table in the database.
/// The lifecycle status is not a column; see [`Exam::status_at`].
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,

    /// Opaque reference into the course catalog. Not validated here.
    pub course_id: i64,

    pub title: String,

    pub description: Option<String>,

    /// Exam length in minutes.
    pub duration: i32,

    pub total_score: f64,

    pub pass_score: f64,

    pub question_count: i32,

    pub start_time: Option<DateTime<Utc>>,

    pub end_time: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft-delete flag.
    #[serde(skip)]
    pub deleted: bool,
}

/// Lifecycle status of an exam, derived from its window and the wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamStatus {
    NotStarted,
    InProgress,
    Ended,
}

impl Exam {
    /// Status of the exam at `now`.
    ///
    /// * `NotStarted` if a start time is set and `now` is before it.
    /// * `Ended` if an end time is set and `now` is after it.
    /// * `InProgress` otherwise, including when no window is set at all.
    pub fn status_at(&self, now: DateTime<Utc>) -> ExamStatus {
        if let Some(start) = self.start_time {
            if now < start {
                return ExamStatus::NotStarted;
            }
        }
        if let Some(end) = self.end_time {
            if now > end {
                return ExamStatus::Ended;
            }
        }
        ExamStatus::InProgress
    }
}

/// Checks that a window is ordered when both bounds are present.
pub fn validate_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), validator::ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            Err(validator::ValidationError::new("start_time_after_end_time"))
        }
        _ => Ok(()),
    }
}

/// DTO for returning an exam together with its derived status.
#[derive(Debug, Serialize)]
pub struct ExamResponse {
    #[serde(flatten)]
    pub exam: Exam,
    pub status: ExamStatus,
}

impl ExamResponse {
    pub fn at(exam: Exam, now: DateTime<Utc>) -> Self {
        let status = exam.status_at(now);
        Self { exam, status }
    }
}

/// DTO for creating a new exam. Missing numeric fields fall back to the defaults in `config`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateExamRequest {
    pub course_id: Option<i64>,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub duration: Option<i32>,
    #[validate(range(min = 0.0))]
    pub total_score: Option<f64>,
    #[validate(range(min = 0.0))]
    pub pass_score: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// DTO for updating an exam. Fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateExamRequest {
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub duration: Option<i32>,
    #[validate(range(min = 0.0))]
    pub total_score: Option<f64>,
    #[validate(range(min = 0.0))]
    pub pass_score: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl UpdateExamRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.duration.is_none()
            && self.total_score.is_none()
            && self.pass_score.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }
}

/// A validated exam ready to be inserted, with defaults applied.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub course_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub duration: i32,
    pub total_score: f64,
    pub pass_score: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn exam_with_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Exam {
        let now = Utc::now();
        Exam {
            id: 1,
            course_id: 1,
            title: "Final".to_string(),
            description: None,
            duration: 60,
            total_score: 100.0,
            pass_score: 60.0,
            question_count: 0,
            start_time: start,
            end_time: end,
            created_at: now,
            updated_at: now,
            deleted: false,
        }
    }

    #[test]
    fn test_status_without_window_is_in_progress() {
        let exam = exam_with_window(None, None);
        assert_eq!(exam.status_at(Utc::now()), ExamStatus::InProgress);
    }

    #[test]
    fn test_status_follows_window() {
        let now = Utc::now();
        let exam = exam_with_window(Some(now), Some(now + Duration::hours(1)));

        assert_eq!(
            exam.status_at(now - Duration::seconds(1)),
            ExamStatus::NotStarted
        );
        assert_eq!(exam.status_at(now), ExamStatus::InProgress);
        assert_eq!(
            exam.status_at(now + Duration::minutes(30)),
            ExamStatus::InProgress
        );
        assert_eq!(exam.status_at(now + Duration::hours(1)), ExamStatus::InProgress);
        assert_eq!(
            exam.status_at(now + Duration::hours(1) + Duration::seconds(1)),
            ExamStatus::Ended
        );
    }

    #[test]
    fn test_open_ended_windows() {
        let now = Utc::now();

        let only_start = exam_with_window(Some(now), None);
        assert_eq!(
            only_start.status_at(now + Duration::days(365)),
            ExamStatus::InProgress
        );

        let only_end = exam_with_window(None, Some(now));
        assert_eq!(
            only_end.status_at(now - Duration::days(365)),
            ExamStatus::InProgress
        );
        assert_eq!(
            only_end.status_at(now + Duration::seconds(1)),
            ExamStatus::Ended
        );
    }

    #[test]
    fn test_validate_window() {
        let now = Utc::now();
        assert!(validate_window(Some(now), Some(now)).is_ok());
        assert!(validate_window(Some(now), None).is_ok());
        assert!(validate_window(Some(now + Duration::minutes(1)), Some(now)).is_err());
    }
}
