// src/config.rs

use std::env;
use dotenvy::dotenv;
use url::Url;

/// Number of questions requested from the model when the caller does not say.
pub const DEFAULT_QUESTION_COUNT: u32 = 10;

/// Upper bound accepted for `nb_questions` on any generation endpoint.
pub const MAX_QUESTION_COUNT: u32 = 20;

/// Default for the stateless `/api/mcq` endpoints.
pub const DEFAULT_MCQ_COUNT: u32 = 5;

/// How many questions a single play-through samples from a document.
pub const PLAY_SAMPLE_SIZE: i64 = 9;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub log_dir: String,
    pub upload_dir: String,
    pub max_upload_bytes: usize,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub pdftotext_bin: String,
    pub pandoc_bin: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .expect("GEMINI_API_KEY must be set");

        let gemini_base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string());
        if Url::parse(&gemini_base_url).is_err() {
            panic!("GEMINI_BASE_URL is not a valid URL: {}", gemini_base_url);
        }

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration: parse_or("JWT_EXPIRATION", 86_400),
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            cors_origins,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            gemini_api_key,
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            gemini_base_url: gemini_base_url.trim_end_matches('/').to_string(),
            pdftotext_bin: env::var("PDFTOTEXT_BIN").unwrap_or_else(|_| "pdftotext".to_string()),
            pandoc_bin: env::var("PANDOC_BIN").unwrap_or_else(|_| "pandoc".to_string()),
        }
    }
}

/// Reads a numeric variable, falling back to `default` when unset or malformed.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("{} is not a valid number, using default", key);
            default
        }),
        Err(_) => default,
    }
}
