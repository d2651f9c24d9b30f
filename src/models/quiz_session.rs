// src/models/quiz_session.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'quiz_sessions' table: one scored play-through of a document.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizSession {
    pub id: i64,
    pub user_id: i64,
    pub document_id: i64,
    /// Number of correctly answered questions.
    pub score: f64,
    pub total_questions: i64,
    pub played_at: chrono::DateTime<chrono::Utc>,
}

/// One point of the score-over-time series for a document.
#[derive(Debug, Serialize)]
pub struct ScorePoint {
    /// Formatted as `YYYY-MM-DD HH:MM`.
    pub played_at: String,
    pub score: f64,
    pub total_questions: i64,
}

impl From<QuizSession> for ScorePoint {
    fn from(s: QuizSession) -> Self {
        Self {
            played_at: s.played_at.format("%Y-%m-%d %H:%M").to_string(),
            score: s.score,
            total_questions: s.total_questions,
        }
    }
}

/// Query parameters for the score series endpoint.
#[derive(Debug, Deserialize)]
pub struct ResultsDataParams {
    pub document_id: Option<i64>,
}
