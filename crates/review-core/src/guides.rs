//! Margin and indent guide positions on the render surface

use crate::coords::{mm_to_points, offset_to_percent};
use serde::Serialize;
use shared_types::{GuideConfig, PageSize};

/// Recognized indent rules with their guide label and colour, in display order
pub const INDENT_STYLES: [(&str, &str, &str); 6] = [
    ("paragraph", "Para", "#10b981"),
    ("sub_section_num", "Sec#", "#f59e0b"),
    ("sub_section_text_1", "Sec1", "#f97316"),
    ("sub_section_text_2", "Sec2", "#ef4444"),
    ("bullet_point", "Bullet", "#8b5cf6"),
    ("bullet_text", "BulTxt", "#ec4899"),
];

/// Margin lines in percent of the page box.
///
/// `top_pct`/`left_pct` are measured from the top and left edges,
/// `bottom_pct`/`right_pct` from the bottom and right edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginGuides {
    pub top_pct: f64,
    pub bottom_pct: f64,
    pub left_pct: f64,
    pub right_pct: f64,
}

/// Vertical indent line, measured from the left page edge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndentGuide {
    pub key: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub mm: f64,
    pub left_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuideLayout {
    pub margins: Option<MarginGuides>,
    pub indents: Vec<IndentGuide>,
}

impl GuideLayout {
    /// Place every configured guide on a page.
    ///
    /// Returns `None` while the page is unmeasured. Indent lines are offsets
    /// from the left margin, so they need a margin configuration as well.
    pub fn compute(config: &GuideConfig, page: PageSize) -> Option<Self> {
        if !page.is_measured() {
            return None;
        }

        let margins = config.margin_mm.and_then(|m| {
            Some(MarginGuides {
                top_pct: offset_to_percent(mm_to_points(m.top), page.height)?,
                bottom_pct: offset_to_percent(mm_to_points(m.bottom), page.height)?,
                left_pct: offset_to_percent(mm_to_points(m.left), page.width)?,
                right_pct: offset_to_percent(mm_to_points(m.right), page.width)?,
            })
        });

        let indents = match (config.left_margin_mm(), &config.indent_rules) {
            (Some(left_mm), Some(_)) => INDENT_STYLES
                .iter()
                .filter_map(|&(key, label, color)| {
                    let mm = config.indent_mm(key)?;
                    let left_pct = offset_to_percent(mm_to_points(left_mm + mm), page.width)?;
                    Some(IndentGuide {
                        key,
                        label,
                        color,
                        mm,
                        left_pct,
                    })
                })
                .collect(),
            _ => Vec::new(),
        };

        Some(Self { margins, indents })
    }

    pub fn is_empty(&self) -> bool {
        self.margins.is_none() && self.indents.is_empty()
    }
}
