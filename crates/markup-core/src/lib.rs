//! Burn review markings into PDF documents
//!
//! This crate draws issue rectangles and labels directly into page content
//! streams using lopdf, and answers the page-geometry questions the overlay
//! engine needs before it can place anything.

pub mod annotate;
pub mod error;
mod resources;

pub use annotate::{annotate_document, AnnotatedDocument, BORDER_WIDTH, FILL_OPACITY};
pub use error::{DrawError, MarkupError};

use lopdf::{Document, Object, ObjectId};
use shared_types::PageSize;

/// Parse PDF bytes and return page count
pub fn page_count(bytes: &[u8]) -> Result<u32, MarkupError> {
    let doc = Document::load_mem(bytes).map_err(|e| MarkupError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}

/// Size of a 1-based page in points, taken from its (possibly inherited) MediaBox
pub fn page_size(bytes: &[u8], page: u32) -> Result<PageSize, MarkupError> {
    let doc = Document::load_mem(bytes).map_err(|e| MarkupError::ParseError(e.to_string()))?;
    let pages = doc.get_pages();
    let page_id = *pages.get(&page).ok_or(MarkupError::PageOutOfRange {
        page,
        page_count: pages.len() as u32,
    })?;

    let media_box = resources::inherited_entry(&doc, page_id, b"MediaBox")
        .ok_or_else(|| MarkupError::OperationError(format!("Page {} has no MediaBox", page)))?;
    media_box_size(&doc, &media_box)
}

fn media_box_size(doc: &Document, media_box: &Object) -> Result<PageSize, MarkupError> {
    let values = resolve(doc, media_box)
        .as_array()
        .map_err(|e| MarkupError::OperationError(format!("Invalid MediaBox: {}", e)))?;
    if values.len() != 4 {
        return Err(MarkupError::OperationError(format!(
            "MediaBox has {} entries, expected 4",
            values.len()
        )));
    }

    let mut numbers = [0.0f64; 4];
    for (slot, value) in numbers.iter_mut().zip(values) {
        *slot = number(resolve(doc, value)).ok_or_else(|| {
            MarkupError::OperationError("MediaBox contains a non-numeric entry".to_string())
        })?;
    }
    let [x0, y0, x1, y1] = numbers;
    Ok(PageSize::new((x1 - x0).abs(), (y1 - y0).abs()))
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(*v as f64),
        _ => None,
    }
}

/// Page object ids keyed by 1-based page number
pub(crate) fn page_ids(doc: &Document) -> std::collections::BTreeMap<u32, ObjectId> {
    doc.get_pages()
}
