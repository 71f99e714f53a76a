//! redline: compare two revisions of a PDF and highlight what changed.
//!
//! The pipeline walks both documents page by page, pairs text spans at the
//! same structural position, computes the words present in exactly one
//! revision, locates those words on the new revision's page, and writes a
//! copy of the new document with highlight annotations over every hit.
//!
//! # Example
//!
//! ```ignore
//! let report = redline::compare_documents("new.pdf", "old.pdf", "diff.pdf")?;
//! println!("{} highlights", report.total_highlights());
//! ```
//!
//! The engine boundary is the [`Engine`] trait; [`LopdfEngine`] is the
//! default implementation. The comparison logic itself is engine-agnostic
//! and can run against any implementation; the test suite drives it with an
//! in-memory fake.

pub mod comparator;
pub mod engine;
pub mod lopdf_engine;

pub use comparator::{CompareError, CompareReport, Comparator, PageOutcome, compare_documents};
pub use engine::Engine;
pub use lopdf_engine::LopdfEngine;

pub use redline_core::{BBox, Glyph, PageText, TextSpan};
pub use redline_pdf::{EngineError, HighlightStyle};
