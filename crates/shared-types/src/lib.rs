pub mod config;
pub mod types;

pub use config::{GuideConfig, MarginsMm};
pub use types::{BBox, Issue, IssueId, PageSize, PageStatus, SeverityClass};
