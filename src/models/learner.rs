// src/models/learner.rs

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Identity of the learner taking an exam, resolved upstream from the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LearnerId(i64);

impl LearnerId {
    pub fn new(id: i64) -> Result<Self, AppError> {
        if id <= 0 {
            return Err(AppError::AuthError("Invalid learner identity".to_string()));
        }
        Ok(Self(id))
    }

    /// Parses the `sub` claim of a token.
    pub fn parse(subject: &str) -> Result<Self, AppError> {
        let id = subject
            .trim()
            .parse::<i64>()
            .map_err(|_| AppError::AuthError("Invalid learner identity".to_string()))?;
        Self::new(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LearnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
