// tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use quizforge::{
    config::Config,
    db, routes,
    services::{
        extraction::CommandExtractor,
        llm::{LlmError, Mcq, QuestionGenerator},
    },
    state::AppState,
};
use sqlx::SqlitePool;

/// Canned generator: `nb_questions` questions whose correct answer is always "A".
/// With `empty` set it behaves like a model whose output failed validation.
pub struct StubGenerator {
    pub empty: bool,
}

#[async_trait]
impl QuestionGenerator for StubGenerator {
    async fn generate_mcq(&self, text: &str, nb_questions: u32) -> Result<Vec<Mcq>, LlmError> {
        if self.empty {
            return Ok(Vec::new());
        }
        let topic: String = text.chars().take(20).collect();
        Ok((1..=nb_questions)
            .map(|i| Mcq {
                question: format!("Question {} about {}", i, topic),
                answers: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_answer: "A".into(),
            })
            .collect())
    }
}

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
    pub upload_dir: String,
}

pub fn test_config(upload_dir: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        log_dir: "logs".to_string(),
        upload_dir: upload_dir.to_string(),
        max_upload_bytes: 1024 * 1024,
        gemini_api_key: "test-api-key".to_string(),
        gemini_model: "gemini-test".to_string(),
        gemini_base_url: "http://127.0.0.1:9".to_string(),
        pdftotext_bin: "pdftotext".to_string(),
        pandoc_bin: "pandoc".to_string(),
    }
}

/// Spawns the app on a random port against a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(StubGenerator { empty: false }).await
}

pub async fn spawn_app_with(generator: StubGenerator) -> TestApp {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create in-memory database");

    let upload_dir = std::env::temp_dir()
        .join(format!("quizforge_test_{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let state = AppState {
        pool: pool.clone(),
        config: test_config(&upload_dir),
        extractor: Arc::new(CommandExtractor::new("pdftotext", "pandoc")),
        generator: Arc::new(generator),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
        upload_dir,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&serde_json::json!({
                "username": username,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Register request failed")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// Registers a fresh user and returns its bearer token.
    pub async fn user_token(&self, name: &str) -> String {
        let email = format!("{}@example.com", name);
        let resp = self.register(name, &email, "testpassword123").await;
        assert_eq!(resp.status().as_u16(), 201);

        let body: serde_json::Value = self
            .login(&email, "testpassword123")
            .await
            .json()
            .await
            .expect("Failed to parse login json");
        body["token"].as_str().expect("Token not found").to_string()
    }

    /// Creates a raw-text document and returns its id.
    pub async fn text_document(&self, token: &str, title: &str, content: &str) -> i64 {
        let resp = self
            .client
            .post(self.url("/api/documents/text"))
            .bearer_auth(token)
            .json(&serde_json::json!({ "title": title, "content": content }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 201);
        let body: serde_json::Value = resp.json().await.unwrap();
        body["document_id"].as_i64().unwrap()
    }

    /// Generates the quiz of a document with the stub generator.
    pub async fn generate(&self, token: &str, document_id: i64, nb: u32) -> reqwest::Response {
        self.client
            .post(self.url(&format!(
                "/api/quizzes/generate?document_id={}&nb_questions={}",
                document_id, nb
            )))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}
