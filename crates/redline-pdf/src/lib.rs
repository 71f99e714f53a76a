//! redline-pdf: the lopdf-backed PDF engine for redline.
//!
//! Provides the concrete capabilities the comparison pipeline consumes:
//! opening documents, extracting positioned page text (a compact
//! content-stream interpreter, since lopdf exposes the object model but not
//! layout), writing highlight annotations, and exporting annotated pages
//! into a fresh output document.

pub mod annot;
pub mod document;
pub mod error;
mod extract;
pub mod import;

pub use annot::HighlightStyle;
pub use document::PdfDocument;
pub use error::EngineError;
pub use import::OutputDocument;
