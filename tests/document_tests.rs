// tests/document_tests.rs

mod common;

use common::{TestApp, spawn_app};
use reqwest::multipart::{Form, Part};

async fn upload(app: &TestApp, token: &str, file_name: &str, content: &str) -> reqwest::Response {
    let part = Part::bytes(content.as_bytes().to_vec()).file_name(file_name.to_string());
    app.client
        .post(app.url("/api/documents/upload"))
        .bearer_auth(token)
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn upload_text_file_extracts_content() {
    let app = spawn_app().await;
    let token = app.user_token("testuser").await;

    let resp = upload(&app, &token, "bees notes.txt", "  Bees pollinate flowers.\n").await;
    assert_eq!(resp.status().as_u16(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Document loaded successfully");
    assert_eq!(body["title"], "bees_notes.txt");
    let id = body["document_id"].as_i64().unwrap();

    let doc: serde_json::Value = app
        .client
        .get(app.url(&format!("/api/documents/{}", id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(doc["content"], "Bees pollinate flowers.");

    let stored: Option<String> = sqlx::query_scalar("SELECT file_path FROM documents WHERE id = ?")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    let stored = stored.expect("upload should keep a file path");
    assert!(stored.starts_with(&app.upload_dir));
    assert!(std::path::Path::new(&stored).exists());
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = spawn_app().await;
    let token = app.user_token("testuser").await;

    let resp = app
        .client
        .post(app.url("/api/documents/upload"))
        .bearer_auth(&token)
        .multipart(Form::new().text("title", "nothing"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "No file sent");
}

#[tokio::test]
async fn upload_unsupported_type_is_rejected() {
    let app = spawn_app().await;
    let token = app.user_token("testuser").await;

    let resp = upload(&app, &token, "archive.zip", "PK").await;
    assert_eq!(resp.status().as_u16(), 400);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn upload_empty_text_is_rejected() {
    let app = spawn_app().await;
    let token = app.user_token("testuser").await;

    let resp = upload(&app, &token, "blank.txt", "   \n").await;
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn text_document_validation() {
    let app = spawn_app().await;
    let token = app.user_token("testuser").await;

    let resp = app
        .client
        .post(app.url("/api/documents/text"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "", "content": "something" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = app
        .client
        .post(app.url("/api/documents/text"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "content": "something" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("title"));

    let resp = app
        .client
        .post(app.url("/api/documents/text"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "title": "Huge", "content": "a".repeat(500_001) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("at most 500000 characters"));

    let id = app
        .text_document(&token, "<script>x</script>Biology", "Cells divide.")
        .await;
    let title: String = sqlx::query_scalar("SELECT title FROM documents WHERE id = ?")
        .bind(id)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(title, "Biology");
}

#[tokio::test]
async fn list_shows_only_own_documents_with_counts() {
    let app = spawn_app().await;
    let alice = app.user_token("alice").await;
    let bob = app.user_token("bob").await;

    let first = app.text_document(&alice, "First", "Text one.").await;
    let second = app.text_document(&alice, "Second", "Text two.").await;
    app.text_document(&bob, "Bob's", "Text three.").await;
    assert_eq!(app.generate(&alice, first, 4).await.status().as_u16(), 201);

    let list: Vec<serde_json::Value> = app
        .client
        .get(app.url("/api/documents"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(list.len(), 2);
    // Newest first
    assert_eq!(list[0]["id"].as_i64().unwrap(), second);
    assert_eq!(list[0]["question_count"], 0);
    assert_eq!(list[1]["id"].as_i64().unwrap(), first);
    assert_eq!(list[1]["question_count"], 4);
    assert!(list[0].get("content").is_none());
}

#[tokio::test]
async fn delete_document_checks_owner_and_cascades() {
    let app = spawn_app().await;
    let alice = app.user_token("alice").await;
    let bob = app.user_token("bob").await;

    let resp = upload(&app, &alice, "bees.txt", "Bees pollinate flowers.").await;
    let doc = resp.json::<serde_json::Value>().await.unwrap()["document_id"]
        .as_i64()
        .unwrap();
    let stored: String = sqlx::query_scalar("SELECT file_path FROM documents WHERE id = ?")
        .bind(doc)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(app.generate(&alice, doc, 3).await.status().as_u16(), 201);

    // Someone else's document
    let forbidden = app
        .client
        .delete(app.url(&format!("/api/documents/{}", doc)))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let get_forbidden = app
        .client
        .get(app.url(&format!("/api/documents/{}", doc)))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(get_forbidden.status().as_u16(), 403);

    let missing = app
        .client
        .delete(app.url("/api/documents/9999"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    let ok = app
        .client
        .delete(app.url(&format!("/api/documents/{}", doc)))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(ok.status().as_u16(), 200);

    let questions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE document_id = ?")
        .bind(doc)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(questions, 0);
    assert!(!std::path::Path::new(&stored).exists());
}
