// src/handlers/mcq.rs

use axum::{
    Json,
    extract::{Multipart, State},
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    config::{DEFAULT_MCQ_COUNT, MAX_QUESTION_COUNT},
    error::AppError,
    handlers::{
        documents::remove_stored_file,
        upload::{check_question_count, parse_question_count, read_upload_form, store_upload},
    },
    state::AppState,
    utils::json::AppJson,
};

/// Request body for generating questions from raw text.
#[derive(Debug, Deserialize)]
pub struct GenerateFromTextRequest {
    pub text: Option<String>,
    pub nb_questions: Option<u32>,
}

/// Generates MCQs from a text without storing anything.
pub async fn generate_from_text(
    State(state): State<AppState>,
    AppJson(req): AppJson<GenerateFromTextRequest>,
) -> Result<impl IntoResponse, AppError> {
    let text = req
        .text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing 'text' in request body".to_string()))?;
    let nb_questions = check_question_count(
        req.nb_questions.unwrap_or(DEFAULT_MCQ_COUNT),
        MAX_QUESTION_COUNT,
    )?;

    let mcqs = state.generator.generate_mcq(text, nb_questions).await?;
    Ok(Json(serde_json::json!({ "mcqs": mcqs })))
}

/// Extracts text from an uploaded file and generates MCQs from it without
/// keeping either the file or the questions.
pub async fn generate_from_file(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_upload_form(multipart).await?;
    let nb_questions = parse_question_count(
        form.fields.get("nb_questions").map(String::as_str),
        DEFAULT_MCQ_COUNT,
        MAX_QUESTION_COUNT,
    )?;

    let path = store_upload(&state.config.upload_dir, &form.file_name, &form.data).await?;
    let extracted = state.extractor.extract(&path, &form.file_name).await;
    remove_stored_file(&path.to_string_lossy()).await;
    let text = extracted?;

    let mcqs = state.generator.generate_mcq(&text, nb_questions).await?;
    Ok(Json(serde_json::json!({ "mcqs": mcqs })))
}
