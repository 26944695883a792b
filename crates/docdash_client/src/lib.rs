//! Client library for the document intelligence dashboard backend
//! (upload, query, health). Used by the `docdash` terminal frontend.

pub mod client;
pub mod config;
pub mod display;
pub mod fallback;
pub mod models;
pub mod upload;

pub use client::{ApiClient, ApiError, QueryOutcome};
pub use config::{default_config_path, Config, ConfigError};
pub use models::{
    QueryAnswer, QueryParams, QueryRequest, QueryResponse, SystemHealth, UploadResponse,
};
pub use upload::{UploadStatus, UploadTracker};
