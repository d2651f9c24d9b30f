// src/models/document.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'documents' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub user_id: i64,

    /// Original (sanitised) file name, or the caller-supplied title for raw text.
    pub title: String,

    /// Text extracted from the upload.
    pub content: String,

    /// Where the uploaded file was stored on disk. `None` for raw text.
    #[serde(skip)]
    pub file_path: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Listing row: a document without its content, plus how many questions it has.
#[derive(Debug, Serialize, FromRow)]
pub struct DocumentSummary {
    pub id: i64,
    pub title: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub question_count: i64,
}

/// DTO for creating a document from pasted text.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTextDocumentRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    #[validate(length(max = 500000, message = "Content must be at most 500000 characters"))]
    pub content: String,
}
