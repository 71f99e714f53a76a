//! Highlight annotation writing.

use lopdf::{Dictionary, Object};

use redline_core::BBox;

use crate::error::EngineError;

/// Visual parameters for a highlight annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightStyle {
    /// RGB components in the 0–1 range.
    pub color: (f32, f32, f32),
    /// Constant opacity (/CA) in the 0–1 range.
    pub opacity: f32,
}

impl Default for HighlightStyle {
    /// Translucent yellow.
    fn default() -> Self {
        Self {
            color: (1.0, 1.0, 0.0),
            opacity: 0.4,
        }
    }
}

impl HighlightStyle {
    /// Parse an `RRGGBB` hex color (with or without a leading `#`).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()? as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()? as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()? as f32 / 255.0;
        Some(Self {
            color: (r, g, b),
            ..Self::default()
        })
    }
}

/// Append a /Highlight annotation covering `bbox` to the page's /Annots
/// array, creating the array when the page has none.
pub(crate) fn add_highlight(
    doc: &mut lopdf::Document,
    page_id: lopdf::ObjectId,
    bbox: BBox,
    style: &HighlightStyle,
) -> Result<(), EngineError> {
    let (x0, y0, x1, y1) = (bbox.x0 as f32, bbox.y0 as f32, bbox.x1 as f32, bbox.y1 as f32);

    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
    annot.set(
        "Rect",
        Object::Array(vec![
            Object::Real(x0),
            Object::Real(y0),
            Object::Real(x1),
            Object::Real(y1),
        ]),
    );
    // QuadPoints order: upper-left, upper-right, lower-left, lower-right.
    annot.set(
        "QuadPoints",
        Object::Array(vec![
            Object::Real(x0),
            Object::Real(y1),
            Object::Real(x1),
            Object::Real(y1),
            Object::Real(x0),
            Object::Real(y0),
            Object::Real(x1),
            Object::Real(y0),
        ]),
    );
    annot.set(
        "C",
        Object::Array(vec![
            Object::Real(style.color.0),
            Object::Real(style.color.1),
            Object::Real(style.color.2),
        ]),
    );
    annot.set("CA", Object::Real(style.opacity));

    let annot_id = doc.add_object(Object::Dictionary(annot));
    append_to_annots(doc, page_id, annot_id)
}

/// Push an annotation reference onto the page's /Annots, handling the array
/// being inline, indirect, or absent.
fn append_to_annots(
    doc: &mut lopdf::Document,
    page_id: lopdf::ObjectId,
    annot_id: lopdf::ObjectId,
) -> Result<(), EngineError> {
    let annots_ref = {
        let page_dict = doc
            .get_object(page_id)
            .and_then(|obj| obj.as_dict())
            .map_err(|e| EngineError::Malformed(format!("page is not a dictionary: {e}")))?;
        match page_dict.get(b"Annots") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        }
    };

    if let Some(array_id) = annots_ref {
        let array = doc
            .get_object_mut(array_id)
            .and_then(|obj| obj.as_array_mut())
            .map_err(|e| EngineError::Malformed(format!("/Annots is not an array: {e}")))?;
        array.push(Object::Reference(annot_id));
        return Ok(());
    }

    let page_dict = doc
        .get_object_mut(page_id)
        .and_then(|obj| obj.as_dict_mut())
        .map_err(|e| EngineError::Malformed(format!("page is not a dictionary: {e}")))?;
    if let Ok(Object::Array(array)) = page_dict.get_mut(b"Annots") {
        array.push(Object::Reference(annot_id));
    } else {
        page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
    }
    Ok(())
}
