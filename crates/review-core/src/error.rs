//! Error types for the review engine

use markup_core::MarkupError;
use shared_types::IssueId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewError {
    /// The stored result matches none of the accepted shapes
    #[error("Malformed result: {0}")]
    MalformedResult(String),

    /// No issue with this id in the current load cycle
    #[error("Issue not found: {0}")]
    IssueNotFound(IssueId),

    /// Writing the result file failed; in-memory state is kept
    #[error("Failed to persist review state: {0}")]
    Persistence(String),

    /// Missing document or result data; nothing was drawn
    #[error("Cannot export: {0}")]
    ExportPrecondition(String),

    #[error("Export failed: {0}")]
    Export(#[from] MarkupError),
}

pub type Result<T> = std::result::Result<T, ReviewError>;
