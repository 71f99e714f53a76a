//! The default, lopdf-backed implementation of [`Engine`].

use std::path::Path;
use std::rc::Rc;

use redline_core::{BBox, PageText};
use redline_pdf::{EngineError, HighlightStyle, OutputDocument, PdfDocument};

use crate::engine::Engine;

/// PDF engine backed by [`redline_pdf`].
///
/// Text layout comes from the content-stream interpreter, search from the
/// default glyph search, and output assembly from per-page object import.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfEngine;

impl Engine for LopdfEngine {
    type Doc = PdfDocument;
    type Output = OutputDocument;

    fn open(&self, path: &Path) -> Result<PdfDocument, EngineError> {
        PdfDocument::open(path)
    }

    fn page_count(&self, doc: &PdfDocument) -> usize {
        doc.page_count()
    }

    fn page_text(&self, doc: &PdfDocument, index: usize) -> Result<Rc<PageText>, EngineError> {
        doc.page_text(index)
    }

    fn highlight(
        &self,
        doc: &mut PdfDocument,
        index: usize,
        bbox: BBox,
        style: &HighlightStyle,
    ) -> Result<(), EngineError> {
        doc.add_highlight(index, bbox, style)
    }

    fn create_output(&self) -> OutputDocument {
        OutputDocument::new()
    }

    fn append_page(
        &self,
        output: &mut OutputDocument,
        source: &PdfDocument,
        index: usize,
    ) -> Result<(), EngineError> {
        output.append_page(source, index)
    }

    fn save(&self, output: &mut OutputDocument, path: &Path) -> Result<(), EngineError> {
        output.save(path)
    }
}
