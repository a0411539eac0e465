//! Coordinate transformation between PDF point space and the render surface
//!
//! Point space has its origin at the bottom-left of the page; the render
//! surface is expressed in percentages of the page box with the origin at the
//! top-left. Every conversion returns `None` when the page geometry is not
//! known yet, so callers never see NaN or a division by zero.

use serde::Serialize;
use shared_types::{BBox, PageSize};

/// Points per millimetre
pub const MM_TO_PT: f64 = 2.8346;

/// Rectangle on the render surface, in percent of the page box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PercentRect {
    pub left_pct: f64,
    pub top_pct: f64,
    pub width_pct: f64,
    pub height_pct: f64,
}

/// Ruler position under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RulerReading {
    /// Pointer position across the page, clamped to 0..=100
    pub x_pct: f64,
    pub distance_from_margin_mm: f64,
    pub distance_from_edge_mm: f64,
}

/// Convert a point-space bbox to render-space percentages (Y axis flipped)
pub fn point_rect_to_percent(rect: &BBox, page: PageSize) -> Option<PercentRect> {
    if !page.is_measured() {
        return None;
    }
    Some(PercentRect {
        left_pct: rect.x0 / page.width * 100.0,
        top_pct: (page.height - rect.y1) / page.height * 100.0,
        width_pct: rect.width() / page.width * 100.0,
        height_pct: rect.height() / page.height * 100.0,
    })
}

/// Convert render-space percentages back to a point-space bbox
pub fn percent_rect_to_point(rect: &PercentRect, page: PageSize) -> Option<BBox> {
    if !page.is_measured() {
        return None;
    }
    let x0 = rect.left_pct / 100.0 * page.width;
    let y1 = page.height - rect.top_pct / 100.0 * page.height;
    Some(BBox::new(
        x0,
        y1 - rect.height_pct / 100.0 * page.height,
        x0 + rect.width_pct / 100.0 * page.width,
        y1,
    ))
}

pub fn mm_to_points(mm: f64) -> f64 {
    mm * MM_TO_PT
}

pub fn points_to_mm(points: f64) -> f64 {
    points / MM_TO_PT
}

/// Position of a linear offset along an axis, in percent
pub fn offset_to_percent(offset_pt: f64, axis_length_pt: f64) -> Option<f64> {
    if !offset_pt.is_finite() || !axis_length_pt.is_finite() || axis_length_pt <= 0.0 {
        return None;
    }
    Some(offset_pt / axis_length_pt * 100.0)
}

/// Translate a horizontal pointer position into document distances.
///
/// `fraction` is the pointer position as a fraction of the rendered page
/// width. Positions outside the page are clamped to its edges. Distances are
/// rounded to 0.1 mm.
pub fn pointer_to_document_offset(
    fraction: f64,
    page_width_pt: f64,
    left_margin_mm: f64,
) -> Option<RulerReading> {
    if !fraction.is_finite() || !page_width_pt.is_finite() || page_width_pt <= 0.0 {
        return None;
    }
    let x_pct = (fraction * 100.0).clamp(0.0, 100.0);
    let edge_mm = points_to_mm(x_pct / 100.0 * page_width_pt);
    let margin_mm = if left_margin_mm.is_finite() {
        left_margin_mm
    } else {
        0.0
    };

    Some(RulerReading {
        x_pct,
        distance_from_margin_mm: round_tenth(edge_mm - margin_mm),
        distance_from_edge_mm: round_tenth(edge_mm),
    })
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
