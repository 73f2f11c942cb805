// src/services/stats.rs

use std::sync::Arc;

use crate::{
    error::AppError,
    models::{exam_record::ExamRecord, stats::ExamStats},
    services::catalog::ExamCatalog,
    store::ExamStore,
};

/// Computes cohort statistics on demand. Nothing is cached.
#[derive(Clone)]
pub struct ExamStatistics {
    store: Arc<dyn ExamStore>,
    catalog: ExamCatalog,
}

impl ExamStatistics {
    pub fn new(store: Arc<dyn ExamStore>, catalog: ExamCatalog) -> Self {
        Self { store, catalog }
    }

    pub async fn exam_stats(&self, exam_id: i64) -> Result<ExamStats, AppError> {
        let exam = self.catalog.get_exam(exam_id).await?;
        let records = self.store.attempts_by_exam(exam_id).await?;
        Ok(aggregate(&records, exam.pass_score))
    }
}

/// Folds attempt records into [`ExamStats`].
///
/// Only completed attempts with a score count towards the score figures.
/// With no completed attempt the result is all zeros.
pub fn aggregate(records: &[ExamRecord], pass_score: f64) -> ExamStats {
    let completed: Vec<&ExamRecord> = records.iter().filter(|r| r.is_completed()).collect();
    if completed.is_empty() {
        return ExamStats::default();
    }

    let scores: Vec<f64> = completed.iter().filter_map(|r| r.score).collect();
    let passed = scores.iter().filter(|s| **s >= pass_score).count();

    let (average_score, highest_score, lowest_score) = if scores.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        (
            scores.iter().sum::<f64>() / scores.len() as f64,
            scores.iter().copied().fold(f64::MIN, f64::max),
            scores.iter().copied().fold(f64::MAX, f64::min),
        )
    };

    ExamStats {
        total_participants: records.len() as i64,
        completed_count: completed.len() as i64,
        average_score,
        pass_rate: passed as f64 / completed.len() as f64,
        highest_score,
        lowest_score,
    }
}
