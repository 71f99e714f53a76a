//! redline-core: PDF-engine-independent data types and diff algorithms.
//!
//! This crate provides the foundational types (BBox, Glyph, TextSpan,
//! PageText) and the comparison pipeline's pure algorithms: positional span
//! pairing, whitespace-token word diffing, and literal text location. It has
//! no PDF dependency; everything here operates on already-extracted records
//! and is testable without a document.

pub mod compare;
pub mod geometry;
pub mod locate;
pub mod text;
pub mod words;

pub use compare::{PageDiff, SpanPair, compare_spans};
pub use geometry::BBox;
pub use locate::locate_literal;
pub use text::{Glyph, PageText, TextSpan};
pub use words::differing_words;
