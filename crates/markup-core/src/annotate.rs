//! Draw active review issues onto PDF pages

use crate::error::{DrawError, MarkupError};
use crate::resources::{add_page_resources, append_page_content};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, StringFormat};
use shared_types::{BBox, Issue, IssueId, SeverityClass};
use std::collections::BTreeMap;

/// Border width of every issue rectangle, in points
pub const BORDER_WIDTH: f32 = 1.5;
/// Fill opacity of every issue rectangle
pub const FILL_OPACITY: f32 = 0.15;
/// Label font size in points
pub const LABEL_FONT_SIZE: f32 = 7.0;
/// Gap between the rectangle's top edge and the label baseline
const LABEL_GAP: f32 = 2.0;

const ERROR_COLOR: &str = "#E11D48";
const OTHER_COLOR: &str = "#F59E0B";

const FONT_NAME: &str = "RvF1";
const GSTATE_NAME: &str = "RvGS";

/// Result of an export: the new document plus what could not be drawn.
#[derive(Debug, Clone)]
pub struct AnnotatedDocument {
    pub bytes: Vec<u8>,
    /// Number of rectangles drawn
    pub drawn: usize,
    /// Issues whose page index is outside the document
    pub off_page: Vec<IssueId>,
    /// Per-issue failures; the rest of the export went ahead
    pub draw_errors: Vec<DrawError>,
}

/// Parse hex color string (e.g., "#FF0000" or "FF0000") to RGB floats (0-1 range)
fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim_start_matches('#');
    if hex.len() >= 6 {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0) as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0) as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0) as f32 / 255.0;
        (r, g, b)
    } else {
        (0.0, 0.0, 0.0) // Default to black
    }
}

/// Border and label colour: one for errors, one for everything else
fn issue_color(issue: &Issue) -> (f32, f32, f32) {
    match issue.severity_class() {
        SeverityClass::Error => parse_hex_color(ERROR_COLOR),
        SeverityClass::Warning | SeverityClass::Other => parse_hex_color(OTHER_COLOR),
    }
}

/// Produce a copy of `pdf_bytes` with every active, located issue marked.
///
/// Boxes are already in the PDF's own bottom-left point space, so they are
/// drawn at `(min x, min y)` without any vertical flip; the exported
/// rectangle then lines up with the marker the overlay places on screen.
/// Issues pointing at pages the document does not have are skipped; a label
/// that cannot be encoded is dropped while its rectangle stays.
pub fn annotate_document(
    pdf_bytes: &[u8],
    issues: &[Issue],
) -> Result<AnnotatedDocument, MarkupError> {
    let mut doc =
        Document::load_mem(pdf_bytes).map_err(|e| MarkupError::ParseError(e.to_string()))?;
    let pages = crate::page_ids(&doc);

    let mut by_page: BTreeMap<u32, Vec<&Issue>> = BTreeMap::new();
    let mut off_page = Vec::new();
    for issue in issues.iter().filter(|i| i.is_active() && i.bbox.is_some()) {
        if pages.contains_key(&issue.page) {
            by_page.entry(issue.page).or_default().push(issue);
        } else {
            tracing::debug!(
                issue_id = issue.id,
                page = issue.page,
                page_count = pages.len(),
                "Skipping issue on missing page"
            );
            off_page.push(issue.id);
        }
    }

    let mut drawn = 0;
    let mut draw_errors = Vec::new();

    if !by_page.is_empty() {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let gs_id = doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => Object::Real(FILL_OPACITY),
            "CA" => Object::Real(1.0),
        });

        for (page, page_issues) in &by_page {
            let page_id = pages[page];
            let mut operations = Vec::new();

            for issue in page_issues {
                match issue_operations(issue) {
                    Ok((ops, label_error)) => {
                        operations.extend(ops);
                        drawn += 1;
                        if let Some(e) = label_error {
                            tracing::warn!(issue_id = issue.id, error = %e, "Skipping label");
                            draw_errors.push(e);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(issue_id = issue.id, error = %e, "Skipping issue");
                        draw_errors.push(e);
                    }
                }
            }

            if operations.is_empty() {
                continue;
            }

            let content = Content { operations }
                .encode()
                .map_err(|e| MarkupError::OperationError(e.to_string()))?;
            add_page_resources(&mut doc, page_id, (FONT_NAME, font_id), (GSTATE_NAME, gs_id))?;
            append_page_content(&mut doc, page_id, content)?;
        }
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| MarkupError::SerializationError(e.to_string()))?;

    tracing::info!(
        drawn,
        off_page = off_page.len(),
        draw_errors = draw_errors.len(),
        "Annotated document"
    );

    Ok(AnnotatedDocument {
        bytes,
        drawn,
        off_page,
        draw_errors,
    })
}

/// Rectangle plus label operations for one issue.
///
/// Returns the label failure separately so the rectangle is still drawn.
fn issue_operations(issue: &Issue) -> Result<(Vec<Operation>, Option<DrawError>), DrawError> {
    let bbox = issue
        .bbox
        .filter(|b| [b.x0, b.y0, b.x1, b.y1].iter().all(|v| v.is_finite()))
        .ok_or(DrawError::InvalidGeometry { issue_id: issue.id })?;

    let color = issue_color(issue);
    let mut ops = rectangle_operations(&bbox, color);

    let label = format!("[{}]", issue.label());
    match encode_label(&label) {
        Some(encoded) => {
            let top = bbox.y0.max(bbox.y1) as f32;
            let left = bbox.x0.min(bbox.x1) as f32;
            ops.extend(label_operations(encoded, left, top + LABEL_GAP, color));
            Ok((ops, None))
        }
        None => Ok((
            ops,
            Some(DrawError::UnencodableLabel {
                issue_id: issue.id,
                label,
            }),
        )),
    }
}

fn rectangle_operations(bbox: &BBox, (r, g, b): (f32, f32, f32)) -> Vec<Operation> {
    let x = bbox.x0.min(bbox.x1) as f32;
    let y = bbox.y0.min(bbox.y1) as f32;
    let width = bbox.width().abs() as f32;
    let height = bbox.height().abs() as f32;

    vec![
        Operation::new("q", vec![]),
        Operation::new("gs", vec![Object::Name(GSTATE_NAME.as_bytes().to_vec())]),
        Operation::new("rg", vec![r.into(), g.into(), b.into()]),
        Operation::new("RG", vec![r.into(), g.into(), b.into()]),
        Operation::new("w", vec![BORDER_WIDTH.into()]),
        Operation::new(
            "re",
            vec![x.into(), y.into(), width.into(), height.into()],
        ),
        // Fill and stroke
        Operation::new("B", vec![]),
        Operation::new("Q", vec![]),
    ]
}

fn label_operations(
    encoded: Vec<u8>,
    x: f32,
    y: f32,
    (r, g, b): (f32, f32, f32),
) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", vec![r.into(), g.into(), b.into()]),
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![
                Object::Name(FONT_NAME.as_bytes().to_vec()),
                LABEL_FONT_SIZE.into(),
            ],
        ),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::String(encoded, StringFormat::Literal)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// Encode a label for Helvetica with WinAnsiEncoding.
///
/// Only printable Latin-1 is accepted; anything else returns `None`.
fn encode_label(label: &str) -> Option<Vec<u8>> {
    label
        .chars()
        .map(|c| match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => Some(c as u8),
            _ => None,
        })
        .collect()
}
