//! CSV report of the issues still open

use shared_types::Issue;
use std::io::Write;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub const REPORT_HEADER: [&str; 5] = ["Page", "Code", "Severity", "Message", "BBox"];

/// Write one row per active issue.
///
/// The bbox column holds the box as a JSON array, or is empty when the
/// issue has no location.
pub fn write_issue_report<W: Write>(writer: W, issues: &[Issue]) -> Result<usize, ReportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(REPORT_HEADER)?;

    let mut rows = 0;
    for issue in issues.iter().filter(|i| i.is_active()) {
        let bbox = match &issue.bbox {
            Some(bbox) => serde_json::to_string(bbox)?,
            None => String::new(),
        };
        csv_writer.write_record([
            issue.page.to_string().as_str(),
            issue.code.as_str(),
            issue.severity.as_str(),
            issue.message.as_str(),
            bbox.as_str(),
        ])?;
        rows += 1;
    }

    csv_writer.flush()?;
    Ok(rows)
}

/// Render the report into a string
pub fn issue_report_string(issues: &[Issue]) -> Result<String, ReportError> {
    let mut buffer = Vec::new();
    write_issue_report(&mut buffer, issues)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
