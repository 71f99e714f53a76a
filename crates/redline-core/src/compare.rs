//! Positional span pairing between two page extractions.
//!
//! Pairing is strictly index-for-index: span `i` of the new page is compared
//! with span `i` of the old page. Pages whose span counts differ cannot be
//! aligned this way and are reported as a [`PageDiff::Mismatch`]; the caller
//! skips the whole page rather than attempting partial alignment. An
//! insertion or deletion of a span that keeps the counts equal desynchronizes
//! every later pair without detection; that trade-off is inherent to
//! positional alignment.

use crate::PageText;

/// An index-aligned pair of spans whose text differs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpanPair {
    /// Position of the pair on the page (index into both extractions).
    pub index: usize,
    pub new_text: String,
    pub old_text: String,
}

/// Outcome of pairing two page extractions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageDiff {
    /// Span counts differ; the page cannot be aligned and must be skipped.
    Mismatch { new_spans: usize, old_spans: usize },
    /// Index-aligned pairs whose text differs, in page order. Empty when the
    /// pages are textually identical.
    Pairs(Vec<SpanPair>),
}

impl PageDiff {
    /// True when the page could not be aligned.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, PageDiff::Mismatch { .. })
    }
}

/// Pair two extractions of the same page index and collect differing pairs.
///
/// Texts are compared by exact string equality, whitespace included. Only
/// differing pairs are returned, preserving their original index order.
pub fn compare_spans(new: &PageText, old: &PageText) -> PageDiff {
    if new.span_count() != old.span_count() {
        return PageDiff::Mismatch {
            new_spans: new.span_count(),
            old_spans: old.span_count(),
        };
    }

    let pairs = new
        .spans
        .iter()
        .zip(&old.spans)
        .enumerate()
        .filter(|(_, (n, o))| n.text != o.text)
        .map(|(index, (n, o))| SpanPair {
            index,
            new_text: n.text.clone(),
            old_text: o.text.clone(),
        })
        .collect();

    PageDiff::Pairs(pairs)
}
