// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Kind of question stored for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum QuestionType {
    /// Multiple-choice question.
    Qcm,
    OpenQuestion,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub document_id: i64,

    /// Mapped from the database column 'type' since `type` is a reserved keyword in Rust.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    pub question: String,

    /// List of choices, stored as a JSON array. `None` for open questions.
    pub choices: Option<Json<Vec<String>>>,

    /// The correct answer text.
    pub answer: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending a question to a player (excludes the answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
    pub choices: Vec<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            question_type: q.question_type,
            question: q.question,
            choices: q.choices.map(|c| c.0).unwrap_or_default(),
        }
    }
}

/// Response for a play-through of a document's quiz.
#[derive(Debug, Serialize)]
pub struct PlayResponse {
    pub document_id: i64,
    pub title: String,
    pub questions: Vec<PublicQuestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Query parameters for quiz generation.
#[derive(Debug, Deserialize)]
pub struct GenerateQuizParams {
    pub document_id: Option<i64>,
    pub nb_questions: Option<u32>,
}
