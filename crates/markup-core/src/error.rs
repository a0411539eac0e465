use shared_types::IssueId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Page {page} does not exist (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("PDF operation failed: {0}")]
    OperationError(String),

    #[error("Failed to serialize PDF: {0}")]
    SerializationError(String),
}

/// A single issue that could not be drawn. Collected, never fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DrawError {
    #[error("Issue {issue_id}: bounding box has non-finite coordinates")]
    InvalidGeometry { issue_id: IssueId },

    #[error("Issue {issue_id}: label {label:?} cannot be encoded with the standard font")]
    UnencodableLabel { issue_id: IssueId, label: String },
}
