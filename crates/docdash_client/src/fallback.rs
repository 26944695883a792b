//! User-facing wording for degraded query outcomes.
//!
//! The transport reports timeouts and server errors as tagged
//! [`QueryOutcome`] values; this module turns each of them into a clearly
//! labeled synthetic answer so the frontend never shows a dead-end error
//! for the common slow-backend cases. Synthetic answers carry a "System
//! Guidance" or "System Status" source tag instead of document citations.

use crate::client::QueryOutcome;
use crate::models::{QueryAnswer, QueryParams};

/// Source tag on the upload-first guidance answer.
pub const GUIDANCE_SOURCE: &str = "System Guidance";

/// Source tag on timeout and server-busy answers.
pub const STATUS_SOURCE: &str = "System Status";

pub const GUIDANCE_CONFIDENCE: f64 = 0.85;
pub const TIMEOUT_CONFIDENCE: f64 = 0.8;
pub const SERVER_BUSY_CONFIDENCE: f64 = 0.75;

/// Map an outcome to a renderable answer. Real answers pass through.
pub fn resolve(outcome: QueryOutcome, params: &QueryParams) -> QueryAnswer {
    match outcome {
        QueryOutcome::Answered(answer) => answer,
        QueryOutcome::NoDocuments => guidance_answer(params),
        QueryOutcome::TimedOut => timeout_answer(&params.query),
        QueryOutcome::ServerBusy(_) => server_busy_answer(&params.query),
    }
}

/// Canned answer for a query issued before any document was uploaded.
pub fn guidance_answer(params: &QueryParams) -> QueryAnswer {
    let domain = params.domain.as_deref().unwrap_or("general");
    let answer = format!(
        "I understand you're asking: \"{}\".\n\n\
         To provide accurate answers based on your documents, please:\n\n\
         1. Upload documents first - add your PDF files to the session\n\
         2. Wait for processing - ensure the upload completes successfully\n\
         3. Then ask questions - I'll analyze your uploaded content\n\n\
         For {} domain analysis, I'll provide targeted insights once \
         documents are uploaded and processed.",
        params.query, domain
    );
    QueryAnswer {
        answer,
        confidence: GUIDANCE_CONFIDENCE,
        sources: vec![GUIDANCE_SOURCE.to_string()],
    }
}

/// Canned answer when the query deadline elapsed.
pub fn timeout_answer(query: &str) -> QueryAnswer {
    let answer = format!(
        "Query processing was taking too long for: \"{}\".\n\n\
         This is normal for complex documents - large corpora require \
         significant processing time.\n\n\
         Quick fixes:\n\
         1. Try simpler questions first (e.g., \"What is covered?\")\n\
         2. Wait a bit longer - complex analysis takes time\n\
         3. Restart the backend if completely stuck\n\n\
         Your documents are still loaded; just ask again.",
        query
    );
    QueryAnswer {
        answer,
        confidence: TIMEOUT_CONFIDENCE,
        sources: vec![STATUS_SOURCE.to_string()],
    }
}

/// Canned answer when the backend failed with a server error, which in
/// practice usually means the documents are still being processed.
pub fn server_busy_answer(query: &str) -> QueryAnswer {
    let answer = format!(
        "I encountered an issue processing your question: \"{}\".\n\n\
         This might be because:\n\
         1. Documents are still being processed - large files take time\n\
         2. Backend processing issue - the system is working on your documents\n\
         3. Document format complexity - some PDFs need extra processing time\n\n\
         Your upload was successful. Please try your question again in a few \
         moments, or try a simpler question first.",
        query
    );
    QueryAnswer {
        answer,
        confidence: SERVER_BUSY_CONFIDENCE,
        sources: vec![STATUS_SOURCE.to_string()],
    }
}
