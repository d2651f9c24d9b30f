// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::quiz_session::QuizSession;

/// A single submitted answer.
#[derive(Debug, Deserialize)]
pub struct SubmittedAnswer {
    /// Entries without a question id are ignored.
    pub question_id: Option<i64>,
    #[serde(default)]
    pub user_answer: String,
}

/// DTO for saving a finished quiz.
#[derive(Debug, Deserialize)]
pub struct SaveResultsRequest {
    pub document_id: Option<i64>,
    #[serde(default)]
    pub answers: Vec<SubmittedAnswer>,
}

/// A stored result joined with its question, for the session detail view.
#[derive(Debug, Serialize, FromRow)]
pub struct ResultDetail {
    pub question_id: i64,
    pub question: String,
    pub correct_answer: Option<String>,
    pub user_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionDetailResponse {
    #[serde(flatten)]
    pub session: QuizSession,
    pub results: Vec<ResultDetail>,
}
