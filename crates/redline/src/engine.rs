//! The PDF engine capability surface consumed by the comparison pipeline.

use std::path::Path;
use std::rc::Rc;

use redline_core::{BBox, PageText, locate_literal};
use redline_pdf::{EngineError, HighlightStyle};

/// Everything the pipeline needs from a PDF engine.
///
/// Modeling the engine as a trait keeps the orchestration testable without
/// real documents: the comparison laws (page-count, skip, highlight
/// completeness, resource release) are exercised against an in-memory
/// implementation, while [`LopdfEngine`](crate::LopdfEngine) provides the
/// real one.
pub trait Engine {
    /// An open input document.
    type Doc;
    /// An output document under construction.
    type Output;

    /// Open an existing document. Failures are fatal to the run.
    fn open(&self, path: &Path) -> Result<Self::Doc, EngineError>;

    fn page_count(&self, doc: &Self::Doc) -> usize;

    /// The page's positioned text in the engine's reading order. An empty
    /// page yields an empty extraction, not an error.
    fn page_text(&self, doc: &Self::Doc, index: usize) -> Result<Rc<PageText>, EngineError>;

    /// Bounding boxes of every literal occurrence of `needle` on the page.
    ///
    /// The default implementation searches the extracted glyphs; engines
    /// with a native page search may override it.
    fn search(
        &self,
        doc: &Self::Doc,
        index: usize,
        needle: &str,
    ) -> Result<Vec<BBox>, EngineError> {
        let page = self.page_text(doc, index)?;
        Ok(locate_literal(&page, needle))
    }

    /// Add a highlight annotation to the page, mutating the in-memory
    /// document only.
    fn highlight(
        &self,
        doc: &mut Self::Doc,
        index: usize,
        bbox: BBox,
        style: &HighlightStyle,
    ) -> Result<(), EngineError>;

    /// A fresh, empty output document.
    fn create_output(&self) -> Self::Output;

    /// Copy page `index` of `source`, in its current in-memory state, to
    /// the end of `output`.
    fn append_page(
        &self,
        output: &mut Self::Output,
        source: &Self::Doc,
        index: usize,
    ) -> Result<(), EngineError>;

    /// Persist the output document. Nothing is written before this call.
    fn save(&self, output: &mut Self::Output, path: &Path) -> Result<(), EngineError>;
}
