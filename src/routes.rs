// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, documents, health, mcq, quizzes, results},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, documents, quizzes, results, mcq).
/// * Everything except register, login and health requires a bearer token.
/// * Applies global middleware (Trace, CORS, body limit).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        // Protected account routes
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .route("/me", get(auth::me).delete(auth::delete_account))
                .layer(require_auth.clone()),
        );

    let document_routes = Router::new()
        .route("/", get(documents::list_documents))
        .route("/upload", post(documents::upload_document))
        .route("/text", post(documents::create_text_document))
        .route(
            "/{id}",
            get(documents::get_document).delete(documents::delete_document),
        )
        .layer(require_auth.clone());

    let quiz_routes = Router::new()
        .route("/generate", post(quizzes::generate_quiz))
        .route("/{document_id}", get(quizzes::list_questions))
        .route("/{document_id}/play", get(quizzes::play_quiz))
        .layer(require_auth.clone());

    let result_routes = Router::new()
        .route("/save", post(results::save_results))
        .route("/data", get(results::results_data))
        .route("/sessions/{id}", get(results::session_detail))
        .layer(require_auth.clone());

    let mcq_routes = Router::new()
        .route("/generate", post(mcq::generate_from_text))
        .route("/generate/file", post(mcq::generate_from_file))
        .layer(require_auth);

    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health))
        .nest("/api/auth", auth_routes)
        .nest("/api/documents", document_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/results", result_routes)
        .nest("/api/mcq", mcq_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
