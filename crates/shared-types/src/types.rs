use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Position of an issue in the loaded result array. Only valid until the next load.
pub type IssueId = usize;

/// Issue location `[x0, y0, x1, y1]` in points, bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

impl From<[f64; 4]> for BBox {
    fn from([x0, y0, x1, y1]: [f64; 4]) -> Self {
        Self { x0, y0, x1, y1 }
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x0, b.y0, b.x1, b.y1]
    }
}

/// Coarse classification used for colours and page status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityClass {
    Error,
    Warning,
    Other,
}

impl SeverityClass {
    /// Classify from the free-form severity and message fields.
    ///
    /// Both fields are lower-cased and searched for "error" first, then
    /// "warn", so text mentioning both is an error.
    pub fn classify(severity: &str, message: &str) -> Self {
        let severity = severity.to_lowercase();
        let message = message.to_lowercase();

        if severity.contains("error") || message.contains("error") {
            SeverityClass::Error
        } else if severity.contains("warn") || message.contains("warn") {
            SeverityClass::Warning
        } else {
            SeverityClass::Other
        }
    }
}

/// Aggregate review state of a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Clean,
    Resolved,
    Warning,
    Error,
}

impl PageStatus {
    /// Pages that still need the reviewer's attention
    pub fn needs_attention(&self) -> bool {
        matches!(self, PageStatus::Warning | PageStatus::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PageStatus::Clean => "clean",
            PageStatus::Resolved => "resolved",
            PageStatus::Warning => "warning",
            PageStatus::Error => "error",
        }
    }
}

/// Page dimensions in points.
///
/// The default value is the unmeasured size (0 x 0); every coordinate
/// conversion treats it as unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_measured(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// One detected formatting problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: IssueId,
    pub page: u32,
    pub severity: String,
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
    pub is_ignored: bool,
    /// Producer fields this crate does not interpret, kept for persistence.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Issue {
    pub fn new(id: IssueId, page: u32, severity: &str, code: &str, message: &str) -> Self {
        Self {
            id,
            page,
            severity: severity.to_string(),
            code: code.to_string(),
            message: message.to_string(),
            bbox: None,
            is_ignored: false,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_bbox(mut self, bbox: impl Into<BBox>) -> Self {
        self.bbox = Some(bbox.into());
        self
    }

    pub fn ignored(mut self, is_ignored: bool) -> Self {
        self.is_ignored = is_ignored;
        self
    }

    pub fn is_active(&self) -> bool {
        !self.is_ignored
    }

    pub fn severity_class(&self) -> SeverityClass {
        SeverityClass::classify(&self.severity, &self.message)
    }

    /// Short text used for export labels: the code, or the severity when no code is set.
    pub fn label(&self) -> &str {
        if self.code.trim().is_empty() {
            &self.severity
        } else {
            &self.code
        }
    }

    /// Content hash of page, code and bbox.
    ///
    /// Unlike `id`, this survives a reload as long as the producer reports
    /// the same issue at the same place.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.page.to_be_bytes());
        hasher.update(self.code.as_bytes());
        if let Some(bbox) = &self.bbox {
            for v in <[f64; 4]>::from(*bbox) {
                hasher.update(v.to_bits().to_be_bytes());
            }
        }
        hex::encode(&hasher.finalize()[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_error_substring_in_severity() {
        assert_eq!(SeverityClass::classify("Error", ""), SeverityClass::Error);
        assert_eq!(SeverityClass::classify("CRITICAL_ERROR", ""), SeverityClass::Error);
    }

    #[test]
    fn test_classify_checks_message_too() {
        assert_eq!(
            SeverityClass::classify("info", "Font size error on heading"),
            SeverityClass::Error
        );
        assert_eq!(
            SeverityClass::classify("", "Possible warning: indent"),
            SeverityClass::Warning
        );
    }

    #[test]
    fn test_classify_error_wins_over_warning() {
        assert_eq!(
            SeverityClass::classify("warning", "margin error"),
            SeverityClass::Error
        );
    }

    #[test]
    fn test_classify_other() {
        assert_eq!(SeverityClass::classify("info", "check spacing"), SeverityClass::Other);
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let bbox = BBox::new(10.0, 10.0, 110.0, 60.0);
        let json = serde_json::to_string(&bbox).unwrap();
        assert_eq!(json, "[10.0,10.0,110.0,60.0]");
        let back: BBox = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bbox);
    }

    #[test]
    fn test_page_size_default_is_unmeasured() {
        assert!(!PageSize::default().is_measured());
        assert!(!PageSize::new(600.0, f64::NAN).is_measured());
        assert!(PageSize::new(600.0, 800.0).is_measured());
    }

    #[test]
    fn test_label_falls_back_to_severity() {
        let issue = Issue::new(0, 1, "warning", "", "msg");
        assert_eq!(issue.label(), "warning");
        let issue = Issue::new(0, 1, "warning", "FONT_SIZE", "msg");
        assert_eq!(issue.label(), "FONT_SIZE");
    }

    #[test]
    fn test_fingerprint_ignores_position_and_flag() {
        let a = Issue::new(0, 3, "error", "MARGIN", "a").with_bbox([1.0, 2.0, 3.0, 4.0]);
        let b = Issue::new(7, 3, "error", "MARGIN", "b")
            .with_bbox([1.0, 2.0, 3.0, 4.0])
            .ignored(true);
        assert_eq!(a.fingerprint(), b.fingerprint());

        let moved = a.clone().with_bbox([1.0, 2.0, 3.0, 5.0]);
        assert_ne!(a.fingerprint(), moved.fingerprint());
    }

    #[test]
    fn test_issue_serializes_camel_case_with_extra_fields() {
        let mut issue = Issue::new(2, 1, "error", "X", "m");
        issue
            .extra
            .insert("rule".to_string(), serde_json::json!("margin_left"));
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["isIgnored"], serde_json::json!(false));
        assert_eq!(value["rule"], serde_json::json!("margin_left"));
        assert!(value.get("bbox").is_none());
    }
}
