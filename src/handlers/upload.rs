// src/handlers/upload.rs

use std::collections::HashMap;
use std::path::PathBuf;

use axum::{body::Bytes, extract::Multipart};

use crate::{error::AppError, utils::filename::sanitize_filename};

/// A multipart form holding one `file` part plus plain text fields.
#[derive(Debug)]
pub struct UploadForm {
    /// Sanitised client file name.
    pub file_name: String,
    pub data: Bytes,
    pub fields: HashMap<String, String>,
}

/// Reads the whole multipart body.
///
/// 400 when no `file` part was sent or its file name is empty after sanitising.
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("failed to read multipart field: {e}");
        AppError::BadRequest("Malformed multipart body".to_string())
    })? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "file" {
            let raw_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(|e| {
                tracing::error!("failed to read uploaded file: {e}");
                AppError::BadRequest("Failed to read uploaded file".to_string())
            })?;
            let file_name = sanitize_filename(&raw_name)
                .ok_or_else(|| AppError::BadRequest("Empty filename".to_string()))?;
            file = Some((file_name, data));
        } else {
            let text = field.text().await.map_err(|e| {
                tracing::error!("failed to read field data: {e}");
                AppError::BadRequest("Failed to read form field".to_string())
            })?;
            fields.insert(name, text);
        }
    }

    let (file_name, data) = file.ok_or_else(|| AppError::BadRequest("No file sent".to_string()))?;

    Ok(UploadForm {
        file_name,
        data,
        fields,
    })
}

/// Writes an upload under `upload_dir` with a unique prefix and returns its path.
pub async fn store_upload(upload_dir: &str, file_name: &str, data: &[u8]) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Cannot create upload dir: {}", e)))?;

    let path = PathBuf::from(upload_dir).join(format!("{}_{}", uuid::Uuid::new_v4(), file_name));
    tokio::fs::write(&path, data)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Cannot store upload: {}", e)))?;

    Ok(path)
}

/// Parses an optional `nb_questions` value, enforcing `1..=max`.
pub fn parse_question_count(raw: Option<&str>, default: u32, max: u32) -> Result<u32, AppError> {
    let count = match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => s
            .parse::<u32>()
            .map_err(|_| AppError::BadRequest("'nb_questions' must be a number".to_string()))?,
        None => default,
    };
    check_question_count(count, max)
}

pub fn check_question_count(count: u32, max: u32) -> Result<u32, AppError> {
    if count == 0 || count > max {
        return Err(AppError::BadRequest(format!(
            "'nb_questions' must be between 1 and {}",
            max
        )));
    }
    Ok(count)
}
