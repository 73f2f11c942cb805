// src/services/mod.rs

pub mod attempt;
pub mod catalog;
pub mod grading;
pub mod stats;

pub use attempt::AttemptManager;
pub use catalog::ExamCatalog;
pub use stats::ExamStatistics;
