// src/handlers/results.rs

use std::collections::{HashMap, HashSet};

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::documents::load_owned_document,
    models::{
        quiz_session::{QuizSession, ResultsDataParams, ScorePoint},
        result::{ResultDetail, SaveResultsRequest, SessionDetailResponse},
    },
    utils::{json::AppJson, jwt::AuthUser},
};

/// Helper struct for fetching answer keys from the database.
#[derive(sqlx::FromRow)]
struct AnswerKey {
    id: i64,
    answer: Option<String>,
}

/// One answer after grading.
#[derive(Debug, PartialEq)]
struct GradedAnswer {
    question_id: i64,
    user_answer: String,
    is_correct: bool,
}

/// Case-insensitive comparison ignoring surrounding whitespace.
fn answers_match(user_answer: &str, correct: &str) -> bool {
    user_answer.trim().to_lowercase() == correct.trim().to_lowercase()
}

/// Grades submitted answers against the document's answer key.
///
/// Questions without a stored answer (open questions) are never counted correct.
/// Returns the graded answers and the number of correct ones.
fn grade_answers(
    submitted: &[(i64, String)],
    answer_key: &HashMap<i64, Option<String>>,
) -> (Vec<GradedAnswer>, usize) {
    let graded: Vec<GradedAnswer> = submitted
        .iter()
        .map(|(question_id, user_answer)| {
            let is_correct = answer_key
                .get(question_id)
                .and_then(|a| a.as_deref())
                .is_some_and(|correct| answers_match(user_answer, correct));
            GradedAnswer {
                question_id: *question_id,
                user_answer: user_answer.clone(),
                is_correct,
            }
        })
        .collect();

    let correct = graded.iter().filter(|g| g.is_correct).count();
    (graded, correct)
}

/// Saves a finished quiz: one quiz session plus one result per answer.
///
/// Answers are graded here; the score is the number of correct answers.
pub async fn save_results(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    AppJson(req): AppJson<SaveResultsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let document_id = match req.document_id {
        Some(id) if !req.answers.is_empty() => id,
        _ => return Err(AppError::BadRequest("Incomplete data".to_string())),
    };

    let document = load_owned_document(&pool, document_id, user.id).await?;

    let submitted: Vec<(i64, String)> = req
        .answers
        .into_iter()
        .filter_map(|a| a.question_id.map(|id| (id, a.user_answer)))
        .collect();
    if submitted.is_empty() {
        return Err(AppError::BadRequest("Incomplete data".to_string()));
    }

    let answer_key: HashMap<i64, Option<String>> = sqlx::query_as::<_, AnswerKey>(
        "SELECT id, answer FROM questions WHERE document_id = ?",
    )
    .bind(document.id)
    .fetch_all(&pool)
    .await?
    .into_iter()
    .map(|k| (k.id, k.answer))
    .collect();

    if let Some((unknown, _)) = submitted.iter().find(|(id, _)| !answer_key.contains_key(id)) {
        return Err(AppError::BadRequest(format!(
            "Question {} does not belong to this document",
            unknown
        )));
    }

    let mut seen = HashSet::new();
    if let Some((repeated, _)) = submitted.iter().find(|(id, _)| !seen.insert(*id)) {
        return Err(AppError::BadRequest(format!(
            "Question {} was answered more than once",
            repeated
        )));
    }

    let (graded, correct_count) = grade_answers(&submitted, &answer_key);
    let score = correct_count as f64;
    let total_questions = graded.len() as i64;
    let now = chrono::Utc::now();

    let mut tx = pool.begin().await?;

    let quiz_session_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO quiz_sessions (user_id, document_id, score, total_questions, played_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user.id)
    .bind(document.id)
    .bind(score)
    .bind(total_questions)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    for answer in &graded {
        sqlx::query(
            r#"
            INSERT INTO results (question_id, user_id, quiz_session_id, user_answer, is_correct, reviewed_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(answer.question_id)
        .bind(user.id)
        .bind(quiz_session_id)
        .bind(&answer.user_answer)
        .bind(answer.is_correct)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await.map_err(|e| {
        tracing::error!("Failed to save results: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!(quiz_session_id, document_id, score, total_questions, "results saved");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Saved results",
            "score": score,
            "total_questions": total_questions,
            "document_id": document_id,
            "quiz_session_id": quiz_session_id
        })),
    ))
}

/// Score history of the caller for one document, oldest first.
pub async fn results_data(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Query(params): Query<ResultsDataParams>,
) -> Result<impl IntoResponse, AppError> {
    let document_id = params
        .document_id
        .ok_or_else(|| AppError::BadRequest("Parameter 'document_id' required!".to_string()))?;

    let sessions = sqlx::query_as::<_, QuizSession>(
        r#"
        SELECT id, user_id, document_id, score, total_questions, played_at
        FROM quiz_sessions
        WHERE user_id = ? AND document_id = ?
        ORDER BY played_at ASC, id ASC
        "#,
    )
    .bind(user.id)
    .bind(document_id)
    .fetch_all(&pool)
    .await?;

    let points: Vec<ScorePoint> = sessions.into_iter().map(ScorePoint::from).collect();
    Ok(Json(points))
}

/// One quiz session with every answer given in it.
pub async fn session_detail(
    State(pool): State<SqlitePool>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let session = sqlx::query_as::<_, QuizSession>(
        "SELECT id, user_id, document_id, score, total_questions, played_at FROM quiz_sessions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Quiz session not found".to_string()))?;

    if session.user_id != user.id {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    let results = sqlx::query_as::<_, ResultDetail>(
        r#"
        SELECT
            r.question_id, q.question, q.answer AS correct_answer,
            r.user_answer, r.is_correct
        FROM results r
        JOIN questions q ON q.id = r.question_id
        WHERE r.quiz_session_id = ?
        ORDER BY r.id
        "#,
    )
    .bind(session.id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(SessionDetailResponse { session, results }))
}
