//! Caller-side upload state: the file-type gate and per-file status
//! tracking the upload view keeps while transfers are in flight.

use crate::client::ApiError;
use crate::models::UploadResponse;

/// Document categories the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Word,
    Email,
    Text,
}

const ALLOWED_MIME_TYPES: &[(&str, DocumentKind)] = &[
    ("application/pdf", DocumentKind::Pdf),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        DocumentKind::Word,
    ),
    ("application/msword", DocumentKind::Word),
    ("message/rfc822", DocumentKind::Email),
    ("text/plain", DocumentKind::Text),
];

/// Classify a file by extension or MIME type. `None` means unsupported.
pub fn document_kind(name: &str, mime: Option<&str>) -> Option<DocumentKind> {
    let lower = name.to_lowercase();
    let by_extension = if lower.ends_with(".pdf") {
        Some(DocumentKind::Pdf)
    } else if lower.ends_with(".docx") || lower.ends_with(".doc") {
        Some(DocumentKind::Word)
    } else if lower.ends_with(".eml") || lower.ends_with(".msg") {
        Some(DocumentKind::Email)
    } else if lower.ends_with(".txt") {
        Some(DocumentKind::Text)
    } else {
        None
    };
    by_extension.or_else(|| {
        let mime = mime?;
        ALLOWED_MIME_TYPES
            .iter()
            .find(|(m, _)| *m == mime)
            .map(|(_, kind)| *kind)
    })
}

/// Gate a file before any network request is made.
pub fn validate_file(name: &str, mime: Option<&str>) -> Result<DocumentKind, ApiError> {
    document_kind(name, mime).ok_or_else(|| ApiError::UnsupportedFile(name.to_string()))
}

/// Per-file upload status as surfaced to the user. There is no
/// `processing` state here: once the request resolves the file is either
/// completed or errored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Uploading,
    Completed,
    Error,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Uploading => "uploading",
            UploadStatus::Completed => "completed",
            UploadStatus::Error => "error",
        }
    }
}

/// One tracked file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub id: usize,
    pub name: String,
    pub size: u64,
    pub status: UploadStatus,
    /// Backend document reference, set on completion.
    pub file_path: Option<String>,
    /// Server message, set on completion.
    pub message: Option<String>,
}

/// Ordered upload list with the aggregate stats the dashboard shows.
#[derive(Debug, Default)]
pub struct UploadTracker {
    entries: Vec<FileEntry>,
    next_id: usize,
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file as uploading and return its tracker id.
    pub fn start(&mut self, name: impl Into<String>, size: u64) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(FileEntry {
            id,
            name: name.into(),
            size,
            status: UploadStatus::Uploading,
            file_path: None,
            message: None,
        });
        id
    }

    /// Mark an entry completed with the backend's response.
    pub fn complete(&mut self, id: usize, response: &UploadResponse) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.status = UploadStatus::Completed;
            entry.file_path = Some(response.file_path.clone());
            entry.message = Some(response.message.clone());
        }
    }

    /// Mark an entry failed.
    pub fn fail(&mut self, id: usize) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.status = UploadStatus::Error;
        }
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn completed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == UploadStatus::Completed)
            .count()
    }

    pub fn in_flight_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == UploadStatus::Uploading)
            .count()
    }

    /// Completed files as a percentage of all tracked files. 0 when empty.
    pub fn success_rate(&self) -> u32 {
        if self.entries.is_empty() {
            return 0;
        }
        (self.completed_count() * 100 / self.entries.len()) as u32
    }
}
