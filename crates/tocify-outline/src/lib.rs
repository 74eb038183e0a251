//! Outline (bookmark) read/write access backed by lopdf.
//!
//! Reading walks the `/Outlines` tree through `/First`/`/Next` links with
//! cycle and depth guards; writing rebuilds the tree from a flat, already
//! normalized `(level, title, page)` list.

use std::collections::HashMap;
use std::path::Path;

use lopdf::{Bookmark, Document, Object, ObjectId};

use tocify_core::TocEntry;
use tocify_core::backend::{BackendError, OutlineStore};

/// Maximum outline nesting depth followed while reading. Prevents runaway
/// recursion on documents with circular `/First` links.
const MAX_DEPTH: usize = 64;

/// Maximum siblings followed at one level.
const MAX_SIBLINGS: usize = 10_000;

/// [`OutlineStore`] implementation over lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfOutlines;

impl OutlineStore for LopdfOutlines {
    fn read_outline(&self, path: &Path) -> Result<Vec<TocEntry>, BackendError> {
        let doc = Document::load(path).map_err(|e| BackendError::OpenError(e.to_string()))?;
        Ok(read_outline_entries(&doc))
    }

    fn write_outline(
        &self,
        source: &Path,
        dest: &Path,
        entries: &[TocEntry],
    ) -> Result<(), BackendError> {
        let mut doc =
            Document::load(source).map_err(|e| BackendError::OpenError(e.to_string()))?;
        replace_outline(&mut doc, entries)?;
        doc.save(dest)
            .map_err(|e| BackendError::OutlineError(e.to_string()))?;
        Ok(())
    }
}

/// Flatten the document's outline tree into `(level, title, page)` entries,
/// in display order.
fn read_outline_entries(doc: &Document) -> Vec<TocEntry> {
    let Some(first) = outline_first_item(doc) else {
        return Vec::new();
    };

    // Reverse page map: page object id → 1-based page number.
    let page_numbers: HashMap<ObjectId, u32> =
        doc.get_pages().into_iter().map(|(n, id)| (id, n)).collect();

    let mut entries = Vec::new();
    let mut visited = std::collections::HashSet::new();
    walk_outline(doc, first, 1, &page_numbers, &mut visited, &mut entries);
    entries
}

/// Resolve `/Root → /Outlines → /First`, tolerating malformed documents by
/// returning `None`.
fn outline_first_item(doc: &Document) -> Option<ObjectId> {
    let root_id = doc.trailer.get(b"Root").ok()?.as_reference().ok()?;
    let catalog = doc.get_object(root_id).ok()?.as_dict().ok()?;
    let outlines = resolve(doc, catalog.get(b"Outlines").ok()?)?.as_dict().ok()?;
    outlines.get(b"First").ok()?.as_reference().ok()
}

fn walk_outline(
    doc: &Document,
    item_id: ObjectId,
    level: usize,
    page_numbers: &HashMap<ObjectId, u32>,
    visited: &mut std::collections::HashSet<ObjectId>,
    entries: &mut Vec<TocEntry>,
) {
    if level > MAX_DEPTH {
        return;
    }

    let mut current = Some(item_id);
    let mut siblings = 0usize;

    while let Some(id) = current {
        if !visited.insert(id) || siblings >= MAX_SIBLINGS {
            break;
        }
        siblings += 1;

        let Ok(node) = doc.get_object(id).and_then(Object::as_dict) else {
            break;
        };

        let title = node
            .get(b"Title")
            .ok()
            .and_then(|obj| resolve(doc, obj))
            .and_then(|obj| match obj {
                Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
                _ => None,
            })
            .unwrap_or_default();

        let page = resolve_destination_page(doc, node, page_numbers).unwrap_or(1);
        entries.push(TocEntry::new(level, title, page));

        if let Ok(child) = node.get(b"First").and_then(Object::as_reference) {
            walk_outline(doc, child, level + 1, page_numbers, visited, entries);
        }

        current = node.get(b"Next").and_then(Object::as_reference).ok();
    }
}

/// Find the 1-based page number an outline item points at, through either
/// a direct `/Dest` or a GoTo action's `/D`.
fn resolve_destination_page(
    doc: &Document,
    node: &lopdf::Dictionary,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<usize> {
    let dest = match node.get(b"Dest") {
        Ok(obj) => resolve(doc, obj)?,
        Err(_) => {
            let action = resolve(doc, node.get(b"A").ok()?)?.as_dict().ok()?;
            resolve(doc, action.get(b"D").ok()?)?
        }
    };

    let array = dest.as_array().ok()?;
    let page_id = array.first()?.as_reference().ok()?;
    page_numbers.get(&page_id).map(|&n| n as usize)
}

/// Follow a reference to its target object; non-references pass through.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Decode a PDF text string: UTF-16BE when BOM-prefixed, best-effort UTF-8
/// otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// Replace the document's outline with `entries`. An empty list removes the
/// outline entirely; the document is still saved by the caller.
fn replace_outline(doc: &mut Document, entries: &[TocEntry]) -> Result<(), BackendError> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|e| BackendError::OutlineError(format!("missing document catalog: {}", e)))?;

    if entries.is_empty() {
        if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(root_id) {
            catalog.remove(b"Outlines");
        }
        return Ok(());
    }

    let pages = doc.get_pages();

    // Bookmark ids by level, so each entry attaches to the most recent
    // entry one level up. Input levels are normalized (start at 1, no
    // skips), making the stack discipline total.
    let mut parent_stack: Vec<u32> = Vec::new();
    for entry in entries {
        let Some(&page_id) = pages.get(&(entry.page as u32)) else {
            tracing::warn!(title = %entry.title, page = entry.page, "skipping bookmark for missing page");
            continue;
        };

        let parent = if entry.level >= 2 {
            parent_stack.get(entry.level - 2).copied()
        } else {
            None
        };

        let id = doc.add_bookmark(
            Bookmark::new(entry.title.clone(), [0.0, 0.0, 0.0], 0, page_id),
            parent,
        );
        parent_stack.truncate(entry.level - 1);
        parent_stack.push(id);
    }

    if let Some(outline_id) = doc.build_outline() {
        if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(root_id) {
            catalog.set("Outlines", Object::Reference(outline_id));
        }
    }

    Ok(())
}
