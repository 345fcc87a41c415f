//! services/client/tests/rest_api_test.rs
//!
//! Integration tests for the REST adapter against a mock HTTP backend:
//! bearer injection, 401 handling, error-body extraction, and the
//! document endpoints.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use askdoc_core::domain::{DocumentUpload, TokenPair};
use askdoc_core::ports::{AuthApi, DocumentApi, PortError, TokenVault};
use client_lib::adapters::rest::RestApi;
use client_lib::adapters::vault::FileTokenVault;

/// Matches only requests that carry no Authorization header at all.
struct NoAuthHeader;

impl Match for NoAuthHeader {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("authorization")
    }
}

fn empty_vault() -> (TempDir, Arc<FileTokenVault>) {
    let dir = TempDir::new().unwrap();
    let vault = Arc::new(FileTokenVault::new(dir.path().join("tokens.json")));
    (dir, vault)
}

fn loaded_vault(access: &str) -> (TempDir, Arc<FileTokenVault>) {
    let (dir, vault) = empty_vault();
    vault
        .store(&TokenPair {
            access: access.to_string(),
            refresh: "refresh-token".to_string(),
        })
        .unwrap();
    (dir, vault)
}

fn api(server: &MockServer, vault: Arc<FileTokenVault>) -> RestApi {
    RestApi::new(server.uri(), Duration::from_secs(5), vault).unwrap()
}

fn document_json(id: i64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "file": format!("/media/documents/{}.pdf", id),
        "file_name": format!("{}.pdf", title),
        "file_type": "application/pdf",
        "file_size": 2048,
        "uploaded_at": "2024-03-01T12:00:00Z",
        "updated_at": "2024-03-02T08:30:00Z"
    })
}

#[tokio::test]
async fn attaches_bearer_token_from_the_vault() {
    let server = MockServer::start().await;
    let (_dir, vault) = loaded_vault("stored-access-token");

    Mock::given(method("GET"))
        .and(path("/documents/"))
        .and(header("authorization", "Bearer stored-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server, vault);
    let documents = api.list_documents().await.unwrap();
    assert!(documents.is_empty());
}

#[tokio::test]
async fn sends_no_authorization_header_when_vault_is_empty() {
    let server = MockServer::start().await;
    let (_dir, vault) = empty_vault();

    Mock::given(method("POST"))
        .and(path("/token/"))
        .and(NoAuthHeader)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access": "new-access",
            "refresh": "new-refresh"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server, vault);
    let tokens = api.obtain_tokens("ada", "lovelace").await.unwrap();
    assert_eq!(tokens.access, "new-access");
    assert_eq!(tokens.refresh, "new-refresh");
}

#[tokio::test]
async fn unauthorized_with_stored_tokens_clears_both_and_signals() {
    let server = MockServer::start().await;
    let (_dir, vault) = loaded_vault("stale-token");

    Mock::given(method("GET"))
        .and(path("/documents/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Given token not valid for any token type"
        })))
        .mount(&server)
        .await;

    let api = api(&server, vault.clone());
    let mut expiry = api.session_expiry();

    let err = api.list_documents().await.unwrap_err();
    assert!(matches!(err, PortError::Unauthorized(_)));

    // Both halves of the pair are gone from disk, and the session store's
    // signal has fired.
    assert!(vault.load().unwrap().is_none());
    assert!(expiry.has_changed().unwrap());
}

#[tokio::test]
async fn unauthorized_without_stored_tokens_does_not_signal() {
    let server = MockServer::start().await;
    let (_dir, vault) = empty_vault();

    Mock::given(method("POST"))
        .and(path("/token/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "No active account found with the given credentials"
        })))
        .mount(&server)
        .await;

    let api = api(&server, vault);
    let mut expiry = api.session_expiry();

    let err = api.obtain_tokens("ada", "wrong").await.unwrap_err();
    match err {
        // The server's reason travels with the error so the auth screen
        // can display it.
        PortError::Unauthorized(detail) => {
            assert_eq!(detail, "No active account found with the given credentials")
        }
        other => panic!("expected Unauthorized, got {:?}", other),
    }
    assert!(!expiry.has_changed().unwrap());
}

#[tokio::test]
async fn error_body_detail_field_is_surfaced() {
    let server = MockServer::start().await;
    let (_dir, vault) = empty_vault();

    Mock::given(method("POST"))
        .and(path("/qa/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "Document is still being processed"
        })))
        .mount(&server)
        .await;

    let api = api(&server, vault);
    let err = api.ask_question(1, "ready yet?").await.unwrap_err();

    match err {
        PortError::Rejected(detail) => {
            assert_eq!(detail, "Document is still being processed")
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn field_keyed_validation_errors_are_flattened() {
    let server = MockServer::start().await;
    let (_dir, vault) = empty_vault();

    Mock::given(method("POST"))
        .and(path("/auth/register/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "username": ["A user with that username already exists."],
            "password": ["This password is too short."]
        })))
        .mount(&server)
        .await;

    let api = api(&server, vault);
    let err = api.register("ada", "x").await.unwrap_err();

    match err {
        PortError::Rejected(detail) => {
            assert!(detail.contains("already exists"));
            assert!(detail.contains("too short"));
        }
        other => panic!("expected Rejected, got {:?}", other),
    }
}

#[tokio::test]
async fn not_found_maps_to_its_own_variant() {
    let server = MockServer::start().await;
    let (_dir, vault) = empty_vault();

    Mock::given(method("DELETE"))
        .and(path("/documents/42/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "detail": "Not found."
        })))
        .mount(&server)
        .await;

    let api = api(&server, vault);
    let err = api.delete_document(42).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}

#[tokio::test]
async fn upload_posts_multipart_and_parses_the_record() {
    let server = MockServer::start().await;
    let (_dir, vault) = loaded_vault("token");

    Mock::given(method("POST"))
        .and(path("/documents/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(document_json(11, "Quarterly Report")))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server, vault);
    let upload = DocumentUpload {
        title: "Quarterly Report".to_string(),
        file_name: "report.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        bytes: b"%PDF-1.4 fake".to_vec(),
    };

    let created = api.upload_document(&upload).await.unwrap();
    assert_eq!(created.id, 11);
    assert_eq!(created.title, "Quarterly Report");
    assert_eq!(created.file_size, 2048);
}

#[tokio::test]
async fn rename_patches_the_document_resource() {
    let server = MockServer::start().await;
    let (_dir, vault) = loaded_vault("token");

    Mock::given(method("PATCH"))
        .and(path("/documents/3/"))
        .and(body_json(json!({ "title": "New Title" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(document_json(3, "New Title")))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server, vault);
    let updated = api.rename_document(3, "New Title").await.unwrap();
    assert_eq!(updated.title, "New Title");
}

#[tokio::test]
async fn delete_hits_the_document_resource() {
    let server = MockServer::start().await;
    let (_dir, vault) = loaded_vault("token");

    Mock::given(method("DELETE"))
        .and(path("/documents/3/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server, vault);
    api.delete_document(3).await.unwrap();
}

#[tokio::test]
async fn ask_question_sends_the_document_id_and_returns_the_answer() {
    let server = MockServer::start().await;
    let (_dir, vault) = loaded_vault("token");

    Mock::given(method("POST"))
        .and(path("/qa/"))
        .and(body_json(json!({
            "doc_id": 7,
            "question": "What is the main finding?"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "Revenue grew 12% year over year."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server, vault);
    let answer = api
        .ask_question(7, "What is the main finding?")
        .await
        .unwrap();
    assert_eq!(answer, "Revenue grew 12% year over year.");
}
