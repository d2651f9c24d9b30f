// src/handlers/quizzes.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::{SqlitePool, types::Json as SqlJson};

use crate::{
    config::{DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT, PLAY_SAMPLE_SIZE},
    error::AppError,
    handlers::{documents::load_owned_document, upload::check_question_count},
    models::question::{GenerateQuizParams, PlayResponse, PublicQuestion, Question, QuestionType},
    state::AppState,
    utils::jwt::AuthUser,
};

/// Generates MCQs for one of the caller's documents and stores them.
///
/// A document is generated for at most once: 409 if it already has questions.
pub async fn generate_quiz(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<GenerateQuizParams>,
) -> Result<impl IntoResponse, AppError> {
    let document_id = params
        .document_id
        .ok_or_else(|| AppError::BadRequest("Parameter 'document_id' required!".to_string()))?;
    let nb_questions = check_question_count(
        params.nb_questions.unwrap_or(DEFAULT_QUESTION_COUNT),
        MAX_QUESTION_COUNT,
    )?;

    let document = load_owned_document(&state.pool, document_id, user.id).await?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE document_id = ?")
        .bind(document.id)
        .fetch_one(&state.pool)
        .await?;
    if existing > 0 {
        return Err(AppError::Conflict(
            "Already generated MCQs for this document.".to_string(),
        ));
    }

    let mcqs = state
        .generator
        .generate_mcq(&document.content, nb_questions)
        .await?;
    let (first, rest) = mcqs.split_first().ok_or_else(|| {
        AppError::BadGateway("No question has been generated".to_string())
    })?;

    let mut tx = state.pool.begin().await?;
    let now = chrono::Utc::now();

    // Only inserts while the document has no questions: a concurrent
    // generation that committed first turns this one into a 409.
    let inserted = sqlx::query(
        r#"
        INSERT INTO questions (document_id, type, question, choices, answer, created_at)
        SELECT ?, ?, ?, ?, ?, ?
        WHERE NOT EXISTS (SELECT 1 FROM questions WHERE document_id = ?)
        "#,
    )
    .bind(document.id)
    .bind(QuestionType::Qcm)
    .bind(&first.question)
    .bind(SqlJson(&first.answers))
    .bind(&first.correct_answer)
    .bind(now)
    .bind(document.id)
    .execute(&mut *tx)
    .await?;
    if inserted.rows_affected() == 0 {
        return Err(AppError::Conflict(
            "Already generated MCQs for this document.".to_string(),
        ));
    }

    for mcq in rest {
        sqlx::query(
            r#"
            INSERT INTO questions (document_id, type, question, choices, answer, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(document.id)
        .bind(QuestionType::Qcm)
        .bind(&mcq.question)
        .bind(SqlJson(&mcq.answers))
        .bind(&mcq.correct_answer)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    tracing::info!(document_id, count = mcqs.len(), "quiz generated");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": format!("{} MCQs generated", mcqs.len()),
            "count": mcqs.len()
        })),
    ))
}

async fn fetch_questions(pool: &SqlitePool, document_id: i64, limit: Option<i64>) -> Result<Vec<Question>, AppError> {
    let questions = match limit {
        Some(limit) => {
            sqlx::query_as::<_, Question>(
                r#"
                SELECT id, document_id, type, question, choices, answer, created_at
                FROM questions
                WHERE document_id = ?
                ORDER BY RANDOM()
                LIMIT ?
                "#,
            )
            .bind(document_id)
            .bind(limit)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, Question>(
                r#"
                SELECT id, document_id, type, question, choices, answer, created_at
                FROM questions
                WHERE document_id = ?
                ORDER BY id
                "#,
            )
            .bind(document_id)
            .fetch_all(pool)
            .await
        }
    }
    .map_err(|e| {
        tracing::error!("Failed to fetch questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(questions)
}

/// Lists every question of a document, answers included. Owner only.
pub async fn list_questions(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(document_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let document = load_owned_document(&pool, document_id, user.id).await?;
    let questions = fetch_questions(&pool, document.id, None).await?;

    Ok(Json(serde_json::json!({
        "document_id": document.id,
        "title": document.title,
        "questions": questions
    })))
}

/// Samples up to `PLAY_SAMPLE_SIZE` random questions for a play-through.
/// Answers are withheld; grading happens when results are saved.
pub async fn play_quiz(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(document_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let document = load_owned_document(&pool, document_id, user.id).await?;
    let questions = fetch_questions(&pool, document.id, Some(PLAY_SAMPLE_SIZE)).await?;

    let message = questions
        .is_empty()
        .then(|| "No question has been generated for this document".to_string());

    Ok(Json(PlayResponse {
        document_id: document.id,
        title: document.title,
        questions: questions.into_iter().map(PublicQuestion::from).collect(),
        message,
    }))
}
