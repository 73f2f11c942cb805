// src/models/mod.rs

pub mod exam;
pub mod exam_record;
pub mod learner;
pub mod question;
pub mod stats;
