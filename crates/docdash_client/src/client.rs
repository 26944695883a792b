//! HTTP transport client: generic JSON requests, multipart upload, and the
//! single-question query operation with tagged degraded outcomes.
//!
//! The client owns the session's uploaded-document list. It is append-only
//! and lives for the client instance; every query references the full list
//! in insertion order.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{
    ProcessingOptions, QueryAnswer, QueryParams, QueryRequest, QueryResponse, SystemHealth,
    UploadResponse,
};

/// Bearer token expected by the backend.
pub const DEFAULT_AUTH_TOKEN: &str = "hackrx-2024-bajaj-finserv";

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Upload deadline. Aborts the transfer, so a late server response can never
/// land after failure has been reported.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Query deadline. Large corpora routinely take over a minute to answer.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(90);

const CHUNK_SIZE_DEFAULT: u32 = 1000;
const CHUNK_OVERLAP_DEFAULT: u32 = 200;

/// Transport failure taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Non-2xx HTTP status. Message comes from the body's `detail`/`error`
    /// field when present, otherwise the raw body or status text.
    #[error("HTTP {status}: {message}")]
    Transport { status: u16, message: String },
    /// The request could not complete at all.
    #[error("network error: {0}")]
    Network(String),
    /// The request-level deadline elapsed.
    #[error("request timed out")]
    Timeout,
    /// The server answered 2xx with an empty answer set.
    #[error("no answer received from API")]
    NoAnswer,
    /// File rejected by the type gate before any network call.
    #[error("unsupported file type: {0}. Please upload PDF, DOCX, or email files.")]
    UnsupportedFile(String),
    /// Local file could not be read for upload.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The server body could not be decoded as the expected JSON shape.
    #[error("invalid response body: {0}")]
    InvalidBody(String),
}

impl ApiError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

/// Outcome of a single-question submission. Degraded paths are tagged here;
/// the user-facing wording for them lives in [`crate::fallback`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The backend produced at least one answer; this is the first one.
    Answered(QueryAnswer),
    /// Nothing has been uploaded this session. No request was issued.
    NoDocuments,
    /// The query deadline elapsed before the backend responded.
    TimedOut,
    /// The backend failed with a 5xx, typically while still processing.
    ServerBusy(u16),
}

/// Client for the document intelligence backend.
///
/// Construct one per session and pass it to whatever frontend drives it;
/// the uploaded-document list is scoped to the instance.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: String,
    query_timeout: Duration,
    uploaded_documents: Mutex<Vec<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, auth_token: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let base_url = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: auth_token.into(),
            query_timeout: QUERY_TIMEOUT,
            uploaded_documents: Mutex::new(Vec::new()),
        })
    }

    /// Build a client from config, falling back to the fixed defaults.
    pub fn from_config(cfg: &Config) -> Result<Self, ApiError> {
        let base_url = cfg
            .api
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = cfg
            .api
            .auth_token
            .clone()
            .unwrap_or_else(|| DEFAULT_AUTH_TOKEN.to_string());
        let mut client = Self::new(base_url, token)?;
        if let Some(secs) = cfg.query.timeout_secs {
            client.query_timeout = Duration::from_secs(secs);
        }
        Ok(client)
    }

    /// Override the query deadline (tests use short deadlines).
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Snapshot of the session's uploaded document references, in the order
    /// their uploads completed.
    pub fn documents(&self) -> Vec<String> {
        // A poisoned lock still holds a consistent list; take it rather than
        // reporting an empty session.
        self.uploaded_documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Generic JSON request: bearer auth, JSON content type, non-2xx mapped
    /// to [`ApiError::Transport`] with the body's `detail`/`error` message.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        timeout: Option<Duration>,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(%method, %url, "issuing request");

        let mut req = self
            .http
            .request(method, &url)
            .header("Authorization", format!("Bearer {}", self.auth_token))
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            req = req.json(body);
        }
        if let Some(timeout) = timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await.map_err(ApiError::from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            let fallback = status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string();
            let body_text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<serde_json::Value>(&body_text)
                .ok()
                .and_then(|v| {
                    v.get("detail")
                        .or_else(|| v.get("error"))
                        .and_then(|m| m.as_str().map(String::from))
                })
                .unwrap_or(if body_text.is_empty() { fallback } else { body_text });
            return Err(ApiError::Transport {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| ApiError::InvalidBody(e.to_string()))
    }

    /// Upload one document as multipart form data to `/api/v1/upload`.
    ///
    /// On success the returned `file_path` is appended to the session list.
    /// No retry; failures (including the 15 s deadline) surface as errors.
    pub async fn upload_document(&self, path: &Path) -> Result<UploadResponse, ApiError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!(file = %filename, size = bytes.len(), "uploading document");

        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.clone());
        let form = reqwest::multipart::Form::new().part("file", part);

        // Multipart content type is set by the form; only the bearer token
        // is attached explicitly.
        let resp = self
            .http
            .post(self.url("/api/v1/upload"))
            .header("Authorization", format!("Bearer {}", self.auth_token))
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await
            .map_err(ApiError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            warn!(file = %filename, status = status.as_u16(), "upload failed");
            return Err(ApiError::Transport {
                status: status.as_u16(),
                message: format!(
                    "Upload failed: {} {} - {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or(""),
                    body_text
                ),
            });
        }

        let result: UploadResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::InvalidBody(e.to_string()))?;

        // Every successful upload is recorded, poisoned lock or not.
        {
            let mut docs = self
                .uploaded_documents
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            docs.push(result.file_path.clone());
            debug!(documents = docs.len(), "session document list updated");
        }
        info!(file = %filename, path = %result.file_path, "upload complete");
        Ok(result)
    }

    /// Submit a single question against the session's uploaded documents.
    ///
    /// Returns a tagged outcome: with no uploads the call short-circuits to
    /// `NoDocuments` without touching the network; a deadline or 5xx comes
    /// back as `TimedOut`/`ServerBusy` rather than an error so the frontend
    /// can render an informative degraded answer. Everything else propagates.
    pub async fn submit_query(&self, params: &QueryParams) -> Result<QueryOutcome, ApiError> {
        let documents = self.documents();
        if documents.is_empty() {
            debug!(query = %params.query, "no session documents, skipping request");
            return Ok(QueryOutcome::NoDocuments);
        }

        let request = QueryRequest {
            documents,
            questions: vec![params.query.clone()],
            document_format: None,
            processing_options: Some(ProcessingOptions {
                chunk_size: Some(params.chunk_size.unwrap_or(CHUNK_SIZE_DEFAULT)),
                chunk_overlap: Some(params.overlap.unwrap_or(CHUNK_OVERLAP_DEFAULT)),
                top_k_retrieval: None,
                include_metadata: Some(params.include_metadata),
                optimize_for_speed: Some(!params.semantic_search),
                enable_caching: None,
            }),
            session_id: None,
        };

        let body = serde_json::to_value(&request).map_err(|e| ApiError::InvalidBody(e.to_string()))?;
        let result: Result<QueryResponse, ApiError> = self
            .request_json(Method::POST, "/api/v1/query", Some(&body), Some(self.query_timeout))
            .await;

        match result {
            Ok(resp) => {
                let first = resp.answers.into_iter().next().ok_or(ApiError::NoAnswer)?;
                Ok(QueryOutcome::Answered(QueryAnswer {
                    answer: first.answer,
                    confidence: first.confidence_score,
                    sources: first.source_citations,
                }))
            }
            Err(ApiError::Timeout) => {
                warn!(query = %params.query, "query deadline elapsed");
                Ok(QueryOutcome::TimedOut)
            }
            Err(ApiError::Transport { status, .. }) if status >= 500 => {
                warn!(query = %params.query, status, "server busy");
                Ok(QueryOutcome::ServerBusy(status))
            }
            Err(e) => Err(e),
        }
    }

    /// Batch multi-question run against `/api/v1/hackrx/run`. Returns every
    /// answer; errors propagate without fallback synthesis.
    pub async fn process_query(&self, request: &QueryRequest) -> Result<QueryResponse, ApiError> {
        let body = serde_json::to_value(request).map_err(|e| ApiError::InvalidBody(e.to_string()))?;
        self.request_json(Method::POST, "/api/v1/hackrx/run", Some(&body), Some(self.query_timeout))
            .await
    }

    /// Fetch a health snapshot from `/api/v1/health`.
    pub async fn get_system_health(&self) -> Result<SystemHealth, ApiError> {
        self.request_json(Method::GET, "/api/v1/health", None, None).await
    }

    /// Opaque metrics payload from `/api/v1/metrics`.
    pub async fn get_metrics(&self) -> Result<serde_json::Value, ApiError> {
        self.request_json(Method::GET, "/api/v1/metrics", None, None).await
    }

    /// Opaque session listing from `/api/v1/sessions`.
    pub async fn get_sessions(&self) -> Result<serde_json::Value, ApiError> {
        self.request_json(Method::GET, "/api/v1/sessions", None, None).await
    }
}
