// src/handlers/documents.rs

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::upload::{read_upload_form, store_upload},
    models::document::{CreateTextDocumentRequest, Document, DocumentSummary},
    state::AppState,
    utils::{html::clean_label, json::AppJson, jwt::AuthUser},
};

/// Loads a document and checks that `user_id` owns it.
/// 404 when it does not exist, 403 when it belongs to someone else.
pub async fn load_owned_document(
    pool: &SqlitePool,
    document_id: i64,
    user_id: i64,
) -> Result<Document, AppError> {
    let document = sqlx::query_as::<_, Document>(
        "SELECT id, user_id, title, content, file_path, created_at FROM documents WHERE id = ?",
    )
    .bind(document_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Document not found".to_string()))?;

    if document.user_id != user_id {
        tracing::warn!(document_id, user_id, "cross-user document access rejected");
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    Ok(document)
}

/// Best-effort removal of a stored upload.
pub async fn remove_stored_file(path: &str) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove stored file {}: {}", path, e);
        }
    }
}

async fn insert_document(
    pool: &SqlitePool,
    user_id: i64,
    title: &str,
    content: &str,
    file_path: Option<&str>,
) -> Result<i64, AppError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO documents (user_id, title, content, file_path, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(file_path)
    .bind(chrono::Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to insert document: {:?}", e);
        AppError::from(e)
    })?;

    Ok(id)
}

/// Uploads a file, extracts its text and stores it as a document of the caller.
pub async fn upload_document(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_upload_form(multipart).await?;
    let path = store_upload(&state.config.upload_dir, &form.file_name, &form.data).await?;

    let content = match state.extractor.extract(&path, &form.file_name).await {
        Ok(content) => content,
        Err(e) => {
            remove_stored_file(&path.to_string_lossy()).await;
            return Err(e.into());
        }
    };

    let title = clean_label(&form.file_name);
    let stored_path = path.to_string_lossy().into_owned();
    let id = match insert_document(&state.pool, user.id, &title, &content, Some(&stored_path)).await {
        Ok(id) => id,
        Err(e) => {
            remove_stored_file(&stored_path).await;
            return Err(e);
        }
    };

    tracing::info!(document_id = id, user_id = user.id, chars = content.len(), "document uploaded");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Document loaded successfully",
            "document_id": id,
            "title": title
        })),
    ))
}

/// Stores pasted text as a document of the caller.
pub async fn create_text_document(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateTextDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::BadRequest(e.to_string()))?;

    let title = clean_label(&payload.title);
    let content = payload.content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(AppError::BadRequest("Title and content are required".to_string()));
    }

    let id = insert_document(&pool, user.id, &title, content, None).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Document loaded successfully",
            "document_id": id,
            "title": title
        })),
    ))
}

/// Lists the caller's documents, newest first, with their question counts.
pub async fn list_documents(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let documents = sqlx::query_as::<_, DocumentSummary>(
        r#"
        SELECT
            d.id, d.title, d.created_at,
            (SELECT COUNT(*) FROM questions q WHERE q.document_id = d.id) AS question_count
        FROM documents d
        WHERE d.user_id = ?
        ORDER BY d.created_at DESC, d.id DESC
        "#,
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(documents))
}

/// Retrieves one of the caller's documents, including its text.
pub async fn get_document(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let document = load_owned_document(&pool, id, user.id).await?;
    Ok(Json(document))
}

/// Deletes one of the caller's documents. Questions, sessions and results cascade.
pub async fn delete_document(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let document = load_owned_document(&pool, id, user.id).await?;

    sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(document.id)
        .execute(&pool)
        .await?;

    if let Some(path) = &document.file_path {
        remove_stored_file(path).await;
    }

    tracing::info!(document_id = id, user_id = user.id, "document deleted");
    Ok(Json(json!({ "message": "Document deleted from database" })))
}
