//! Wire types for the backend REST API. Client ↔ server JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Client → server: query request for `/api/v1/query` and `/api/v1/hackrx/run`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryRequest {
    pub documents: Vec<String>,
    pub questions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_options: Option<ProcessingOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Chunking and retrieval knobs forwarded to the backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_overlap: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k_retrieval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_metadata: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize_for_speed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_caching: Option<bool>,
}

/// Server → client: one answered question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedAnswer {
    #[serde(default)]
    pub question: String,
    pub answer: String,
    pub confidence_score: f64,
    #[serde(default)]
    pub query_type: String,
    #[serde(default)]
    pub source_citations: Vec<String>,
    #[serde(default)]
    pub processing_time: f64,
    #[serde(default)]
    pub context_chunks_used: u32,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Server → client: query response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub answers: Vec<DetailedAnswer>,
    #[serde(default)]
    pub total_processing_time: f64,
    #[serde(default)]
    pub total_token_usage: HashMap<String, u64>,
    #[serde(default)]
    pub document_statistics: serde_json::Value,
    #[serde(default)]
    pub performance_metrics: HashMap<String, f64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: String,
}

/// Server → client: process memory figures inside a health snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryUsage {
    #[serde(default)]
    pub rss: f64,
    #[serde(default)]
    pub vms: f64,
    #[serde(default)]
    pub cpu_percent: f64,
}

/// Server → client: `/api/v1/health` snapshot. Latest fetch wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SystemHealth {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub uptime: f64,
    #[serde(default)]
    pub memory_usage: MemoryUsage,
    #[serde(default)]
    pub active_sessions: u64,
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub average_response_time: f64,
}

/// Server → client: `/api/v1/upload` result. The backend reports `size`
/// pre-formatted as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: String,
    pub file_path: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub size: String,
}

/// Flattened per-question result rendered by the frontends.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAnswer {
    pub answer: String,
    pub confidence: f64,
    pub sources: Vec<String>,
}

/// Frontend-facing input for a single-question submission.
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub query: String,
    pub domain: Option<String>,
    pub chunk_size: Option<u32>,
    pub overlap: Option<u32>,
    pub include_metadata: bool,
    pub semantic_search: bool,
}

impl QueryParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            domain: None,
            chunk_size: None,
            overlap: None,
            include_metadata: true,
            semantic_search: true,
        }
    }
}
