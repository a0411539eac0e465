//! Page resource and content-stream plumbing

use crate::error::MarkupError;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

// Guards against cyclic Parent chains in damaged files
const MAX_TREE_DEPTH: usize = 64;

/// Look up an inheritable page attribute, walking up the page tree.
pub(crate) fn inherited_entry(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent_id).ok()?.as_dict().ok()?;
    }
    None
}

/// Dereference `object` into an owned dictionary, or an empty one.
fn owned_dict(doc: &Document, object: Option<&Object>) -> Dictionary {
    match object {
        Some(Object::Dictionary(dict)) => dict.clone(),
        Some(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(|o| o.as_dict())
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

/// Register a font and a graphics state on one page.
///
/// The page gets its own inline copy of its effective resources so shared
/// resource dictionaries used by other pages stay untouched.
pub(crate) fn add_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    font: (&str, ObjectId),
    ext_gstate: (&str, ObjectId),
) -> Result<(), MarkupError> {
    let inherited = inherited_entry(doc, page_id, b"Resources");
    let mut resources = owned_dict(doc, inherited.as_ref());

    let mut fonts = owned_dict(doc, resources.get(b"Font").ok());
    fonts.set(font.0, Object::Reference(font.1));
    resources.set("Font", Object::Dictionary(fonts));

    let mut states = owned_dict(doc, resources.get(b"ExtGState").ok());
    states.set(ext_gstate.0, Object::Reference(ext_gstate.1));
    resources.set("ExtGState", Object::Dictionary(states));

    let page = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| MarkupError::OperationError(e.to_string()))?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Append drawing operations after the existing page content.
///
/// The original content is wrapped in `q ... Q` so any graphics state it
/// leaves behind cannot shift or scale the markings.
pub(crate) fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<(), MarkupError> {
    let existing = existing_contents(doc, page_id)?;

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    // Leading newline: the previous stream may end without whitespace
    let mut closing = b"\nQ\n".to_vec();
    closing.extend(content);
    let close_id = doc.add_object(Stream::new(Dictionary::new(), closing));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(close_id));

    let page = doc
        .get_object_mut(page_id)
        .and_then(|o| o.as_dict_mut())
        .map_err(|e| MarkupError::OperationError(e.to_string()))?;
    page.set("Contents", Object::Array(contents));
    Ok(())
}

fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>, MarkupError> {
    let page = doc
        .get_object(page_id)
        .and_then(|o| o.as_dict())
        .map_err(|e| MarkupError::OperationError(e.to_string()))?;

    Ok(match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            // A reference to an array of streams: splice the array in
            Ok(Object::Array(streams)) => streams.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(streams)) => streams.clone(),
        _ => Vec::new(),
    })
}
