// src/models/stats.rs

use serde::{Deserialize, Serialize};

/// Cohort statistics for one exam.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamStats {
    /// Attempts in any state.
    pub total_participants: i64,
    pub completed_count: i64,
    pub average_score: f64,
    /// Fraction in [0, 1].
    pub pass_rate: f64,
    pub highest_score: f64,
    pub lowest_score: f64,
}
