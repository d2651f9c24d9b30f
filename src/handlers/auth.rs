// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{CreateUserRequest, LoginRequest, MeResponse, User},
    utils::{
        hash::{hash_password, verify_password},
        json::AppJson,
        jwt::{AuthUser, purge_expired_revocations, sign_jwt},
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the user object (excluding password).
pub async fn register(
    State(pool): State<SqlitePool>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    let hashed_password = hash_password(&payload.password)?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, email, password, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, username, email, password, created_at
        "#,
    )
    .bind(payload.username.trim())
    .bind(&email)
    .bind(&hashed_password)
    .bind(chrono::Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("This account already exists".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Authenticates a user by email and returns a JWT token.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password, created_at
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(payload.email.trim().to_lowercase())
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    // Same message for both cases so emails cannot be probed.
    let user = user.ok_or(AppError::AuthError("Incorrect credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Incorrect credentials".to_string()));
    }

    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "username": user.username
    })))
}

/// Revokes the token used for this request.
pub async fn logout(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?, ?)")
        .bind(&user.claims.jti)
        .bind(user.claims.exp as i64)
        .execute(&pool)
        .await?;

    if let Err(e) = purge_expired_revocations(&pool).await {
        tracing::warn!("Failed to purge expired revocations: {}", e);
    }

    Ok(Json(json!({ "message": "Logged out successfully." })))
}

/// Current user's profile and counters.
pub async fn me(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let row = sqlx::query_as::<_, (i64, String, String, chrono::DateTime<chrono::Utc>, i64, i64)>(
        r#"
        SELECT
            u.id, u.username, u.email, u.created_at,
            (SELECT COUNT(*) FROM documents WHERE user_id = u.id),
            (SELECT COUNT(*) FROM quiz_sessions WHERE user_id = u.id)
        FROM users u
        WHERE u.id = ?
        "#,
    )
    .bind(user.id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    let (id, username, email, created_at, documents_count, quiz_sessions_count) = row;

    Ok(Json(MeResponse {
        id,
        username,
        email,
        created_at,
        documents_count,
        quiz_sessions_count,
    }))
}

/// Deletes the caller's account. Documents, questions, sessions and results
/// go with it through the foreign key cascades.
pub async fn delete_account(
    State(pool): State<SqlitePool>,
    user: AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let files: Vec<String> = sqlx::query_scalar(
        "SELECT file_path FROM documents WHERE user_id = ? AND file_path IS NOT NULL",
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await?;

    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user.id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    for path in files {
        super::documents::remove_stored_file(&path).await;
    }

    // The token would otherwise stay valid until expiry for a user that no longer exists.
    sqlx::query("INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?, ?)")
        .bind(&user.claims.jti)
        .bind(user.claims.exp as i64)
        .execute(&pool)
        .await?;

    tracing::info!(user_id = user.id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}
