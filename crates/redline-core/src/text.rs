//! Page text records produced by a PDF engine's layout pass.
//!
//! A page is represented as a flat, ordered list of [`TextSpan`]s (one per
//! contiguous text run) backed by the page's [`Glyph`] list. Spans carry a
//! range into the glyph list so that sub-span geometry (individual word
//! occurrences) can be recovered by [`locate_literal`](crate::locate_literal).

use std::ops::Range;

use crate::BBox;

/// A single positioned character on a page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Glyph {
    pub ch: char,
    pub bbox: BBox,
}

/// A contiguous run of text as reported by the engine's layout analysis.
///
/// `glyphs` indexes into the owning [`PageText`]'s glyph list; `text` is the
/// concatenation of those glyphs' characters and `bbox` the union of their
/// boxes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextSpan {
    pub text: String,
    pub bbox: BBox,
    pub glyphs: Range<usize>,
}

/// All text found on one page, in the engine's reading order.
///
/// The span order is significant: two `PageText` values are compared
/// positionally (index against index), never re-sorted or content-matched.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageText {
    pub spans: Vec<TextSpan>,
    pub glyphs: Vec<Glyph>,
}

impl PageText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of spans on the page.
    pub fn span_count(&self) -> usize {
        self.spans.len()
    }

    /// True when the page produced no text at all (e.g. an image-only page).
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Append a span built from already-positioned glyphs.
    ///
    /// The span's text is the concatenation of the glyph characters and its
    /// bbox the union of their boxes. Glyphless spans are dropped silently;
    /// an empty run carries no comparable text and no geometry.
    pub fn push_span(&mut self, glyphs: Vec<Glyph>) {
        let Some(first) = glyphs.first() else {
            return;
        };
        let mut bbox = first.bbox;
        let mut text = String::new();
        for g in &glyphs {
            bbox = bbox.union(&g.bbox);
            text.push(g.ch);
        }
        let start = self.glyphs.len();
        self.glyphs.extend(glyphs);
        self.spans.push(TextSpan {
            text,
            bbox,
            glyphs: start..self.glyphs.len(),
        });
    }
}
