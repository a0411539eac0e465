//! Per-page overlay model
//!
//! Everything a presenter needs to draw one page: the page status, a marker
//! per located issue in render space, and the guide lines.

use crate::coords::{point_rect_to_percent, PercentRect};
use crate::guides::GuideLayout;
use crate::status::page_status;
use serde::Serialize;
use shared_types::{GuideConfig, Issue, IssueId, PageSize, PageStatus, SeverityClass};

pub const ERROR_MARKER_COLOR: &str = "#e11d48";
pub const OTHER_MARKER_COLOR: &str = "#fbbf24";
pub const IGNORED_MARKER_COLOR: &str = "#3b82f6";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub issue_id: IssueId,
    pub rect: PercentRect,
    pub severity: SeverityClass,
    pub color: &'static str,
    pub is_ignored: bool,
    pub code: String,
    pub message: String,
}

impl Marker {
    fn for_issue(issue: &Issue, rect: PercentRect) -> Self {
        let severity = issue.severity_class();
        let color = if issue.is_ignored {
            IGNORED_MARKER_COLOR
        } else if severity == SeverityClass::Error {
            ERROR_MARKER_COLOR
        } else {
            OTHER_MARKER_COLOR
        };
        Self {
            issue_id: issue.id,
            rect,
            severity,
            color,
            is_ignored: issue.is_ignored,
            code: issue.code.clone(),
            message: issue.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOverlay {
    pub page: u32,
    pub status: PageStatus,
    /// False until the page has been measured; markers and guides are empty then
    pub geometry_available: bool,
    pub markers: Vec<Marker>,
    pub guides: GuideLayout,
}

impl PageOverlay {
    pub fn build(
        issues: &[Issue],
        page: u32,
        size: PageSize,
        guide_config: Option<&GuideConfig>,
    ) -> Self {
        let status = page_status(issues, page);
        if !size.is_measured() {
            return Self {
                page,
                status,
                geometry_available: false,
                markers: Vec::new(),
                guides: GuideLayout::default(),
            };
        }

        let markers = issues
            .iter()
            .filter(|i| i.page == page)
            .filter_map(|issue| {
                let rect = point_rect_to_percent(issue.bbox.as_ref()?, size)?;
                Some(Marker::for_issue(issue, rect))
            })
            .collect();

        let guides = guide_config
            .and_then(|config| GuideLayout::compute(config, size))
            .unwrap_or_default();

        Self {
            page,
            status,
            geometry_available: true,
            markers,
            guides,
        }
    }

    pub fn active_markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| !m.is_ignored)
    }
}
