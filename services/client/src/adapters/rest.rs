//! services/client/src/adapters/rest.rs
//!
//! This module contains the REST adapter, which is the concrete implementation
//! of the `AuthApi` and `DocumentApi` ports. It owns the single shared HTTP
//! transport and everything that is global about talking to the backend:
//! bearer-token injection on the way out, and 401 handling on the way back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use askdoc_core::domain::{Document, DocumentUpload, TokenPair};
use askdoc_core::ports::{AuthApi, DocumentApi, PortError, PortResult, TokenVault};

//=========================================================================================
// Request/Response Payloads
//=========================================================================================

#[derive(Serialize)]
struct CredentialsRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RenameRequest<'a> {
    title: &'a str,
}

#[derive(Serialize)]
struct QuestionRequest<'a> {
    doc_id: i64,
    question: &'a str,
}

#[derive(Deserialize)]
struct AnswerResponse {
    answer: String,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// The shared HTTP transport, configured once with the backend base address.
///
/// The access token is read from the vault and injected per request rather
/// than kept in mutable default headers, so a request always carries the
/// credentials that are current at the moment it is issued.
pub struct RestApi {
    http: Client,
    base_url: String,
    vault: Arc<dyn TokenVault>,
    /// Bumped every time a 401 forces the persisted tokens to be dropped.
    /// The session store subscribes to this to fall back to Anonymous.
    expiry_tx: watch::Sender<u64>,
}

impl RestApi {
    /// Creates a new `RestApi` against the given base URL (including the
    /// `/api` prefix, no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        vault: Arc<dyn TokenVault>,
    ) -> PortResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PortError::Unexpected(format!("could not build HTTP client: {}", e)))?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        let (expiry_tx, _) = watch::channel(0u64);

        Ok(Self {
            http,
            base_url,
            vault,
            expiry_tx,
        })
    }

    /// A receiver that observes forced credential drops. Each 401 that
    /// discards persisted tokens advances the generation by one.
    pub fn session_expiry(&self) -> watch::Receiver<u64> {
        self.expiry_tx.subscribe()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches the persisted access token as a bearer credential.
    /// No side effects when no token is stored (login, register).
    fn authorize(&self, builder: RequestBuilder) -> PortResult<RequestBuilder> {
        Ok(match self.vault.load()? {
            Some(tokens) => builder.bearer_auth(tokens.access),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder) -> PortResult<Response> {
        let builder = self.authorize(builder)?;
        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;
        self.check(response).await
    }

    /// Maps non-success responses to `PortError`s.
    ///
    /// This is the only place in the client with global auth-failure
    /// behavior: a 401 while a token is persisted clears BOTH tokens and
    /// signals the session expiry channel. Every other error is passed
    /// through to the calling store.
    async fn check(&self, response: Response) -> PortResult<Response> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            // The body must be read before the response is dropped; the
            // server's reason (wrong password, invalid token) is what the
            // auth screen displays.
            let detail = error_detail(response)
                .await
                .unwrap_or_else(|| "Authorization denied by the backend".to_string());
            if self.vault.load()?.is_some() {
                warn!("authorization denied by the backend; discarding persisted tokens");
                self.vault.clear()?;
                self.expiry_tx.send_modify(|generation| *generation += 1);
            }
            return Err(PortError::Unauthorized(detail));
        }

        if status.is_success() {
            return Ok(response);
        }

        let detail = error_detail(response)
            .await
            .unwrap_or_else(|| format!("request failed with status {}", status));
        debug!(%status, %detail, "backend rejected request");

        match status {
            StatusCode::NOT_FOUND => Err(PortError::NotFound(detail)),
            s if s.is_client_error() => Err(PortError::Rejected(detail)),
            _ => Err(PortError::Unexpected(detail)),
        }
    }
}

/// Extracts a human-readable message from an error response body.
///
/// Prefers the `detail` field the backend uses for most failures; falls
/// back to joining every string found in the object, since field-keyed
/// validation errors arrive as `{"field": ["message", ...]}`.
async fn error_detail(response: Response) -> Option<String> {
    let body: serde_json::Value = response.json().await.ok()?;

    if let Some(detail) = body.get("detail").and_then(|v| v.as_str()) {
        return Some(detail.to_string());
    }

    let object = body.as_object()?;
    let mut parts = Vec::new();
    for value in object.values() {
        collect_strings(value, &mut parts);
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn collect_strings(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_strings(item, out);
            }
        }
        _ => {}
    }
}

//=========================================================================================
// `AuthApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthApi for RestApi {
    async fn obtain_tokens(&self, username: &str, password: &str) -> PortResult<TokenPair> {
        let response = self
            .send(
                self.http
                    .post(self.url("/token/"))
                    .json(&CredentialsRequest { username, password }),
            )
            .await?;

        response
            .json::<TokenPair>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed token response: {}", e)))
    }

    async fn register(&self, username: &str, password: &str) -> PortResult<()> {
        self.send(
            self.http
                .post(self.url("/auth/register/"))
                .json(&CredentialsRequest { username, password }),
        )
        .await?;
        Ok(())
    }
}

//=========================================================================================
// `DocumentApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentApi for RestApi {
    async fn list_documents(&self) -> PortResult<Vec<Document>> {
        let response = self.send(self.http.get(self.url("/documents/"))).await?;

        response
            .json::<Vec<Document>>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed document listing: {}", e)))
    }

    async fn upload_document(&self, upload: &DocumentUpload) -> PortResult<Document> {
        let part = multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| {
                PortError::Unexpected(format!(
                    "invalid content type '{}': {}",
                    upload.content_type, e
                ))
            })?;
        let form = multipart::Form::new()
            .text("title", upload.title.clone())
            .part("file", part);

        let response = self
            .send(self.http.post(self.url("/documents/")).multipart(form))
            .await?;

        response
            .json::<Document>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed upload response: {}", e)))
    }

    async fn rename_document(&self, id: i64, title: &str) -> PortResult<Document> {
        let response = self
            .send(
                self.http
                    .patch(self.url(&format!("/documents/{}/", id)))
                    .json(&RenameRequest { title }),
            )
            .await?;

        response
            .json::<Document>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed rename response: {}", e)))
    }

    async fn delete_document(&self, id: i64) -> PortResult<()> {
        self.send(self.http.delete(self.url(&format!("/documents/{}/", id))))
            .await?;
        Ok(())
    }

    async fn ask_question(&self, document_id: i64, question: &str) -> PortResult<String> {
        let response = self
            .send(self.http.post(self.url("/qa/")).json(&QuestionRequest {
                doc_id: document_id,
                question,
            }))
            .await?;

        let answer = response
            .json::<AnswerResponse>()
            .await
            .map_err(|e| PortError::Unexpected(format!("malformed answer response: {}", e)))?;
        Ok(answer.answer)
    }
}
