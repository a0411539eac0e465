//! Document review overlay engine
//!
//! Holds the issue set of one document, derives per-page status, maps issue
//! boxes and layout guides onto the render surface, and exports an annotated
//! copy of the document.

pub mod backend;
pub mod coords;
pub mod error;
pub mod guides;
pub mod overlay;
pub mod report;
pub mod session;
pub mod status;
pub mod storage;
pub mod store;

pub use backend::{check_document, interpret_response, BackendError, ValidationBackend};
pub use coords::{
    mm_to_points, offset_to_percent, point_rect_to_percent, pointer_to_document_offset,
    PercentRect, RulerReading, MM_TO_PT,
};
pub use error::{Result, ReviewError};
pub use guides::{GuideLayout, IndentGuide, MarginGuides};
pub use overlay::{Marker, PageOverlay};
pub use report::{issue_report_string, write_issue_report, ReportError};
pub use session::{ApproveOutcome, Mutation, ReviewSession};
pub use status::{next_problem_page, page_status, ReviewStats};
pub use storage::{FsProjectStorage, MemoryStorage, ResultStorage};
pub use store::{IssueStore, ResultShape};

pub use markup_core::AnnotatedDocument;
pub use shared_types::{BBox, GuideConfig, Issue, IssueId, PageSize, PageStatus, SeverityClass};
