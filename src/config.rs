// src/config.rs

use std::env;

use dotenvy::dotenv;

/// Default exam length in minutes when the creator leaves it out.
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

/// Default maximum score of an exam.
pub const DEFAULT_TOTAL_SCORE: f64 = 100.0;

/// Default score at or above which an attempt counts as passed.
pub const DEFAULT_PASS_SCORE: f64 = 60.0;

/// Default weight of a question added without an explicit score.
pub const DEFAULT_QUESTION_SCORE: f64 = 5.0;

/// Longest exam title accepted, counted after sanitizing.
pub const MAX_EXAM_TITLE_CHARS: usize = 200;

/// Longest question title accepted, counted after sanitizing.
pub const MAX_QUESTION_TITLE_CHARS: usize = 500;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub listen_addr: String,
    pub max_connections: u32,
}

impl Config {
    /// Reads the configuration from the process environment (and `.env` if present).
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required.
    pub fn from_env() -> Result<Self, String> {
        dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw
                .parse::<u32>()
                .map_err(|e| format!("DATABASE_MAX_CONNECTIONS is not a number: {}", e))?,
            Err(_) => 5,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            listen_addr,
            max_connections,
        })
    }
}
