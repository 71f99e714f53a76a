//! The top-level comparison pipeline.
//!
//! For every page index shared by both documents: extract both sides, pair
//! spans positionally, diff each differing pair into words, locate every
//! differing word on the new page, highlight each hit in place, and append
//! the (possibly annotated) new page to the output. Pages whose span counts
//! differ are copied through without comparison. The output is written once,
//! after the last page.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use redline_core::{PageDiff, compare_spans, differing_words};
use redline_pdf::{EngineError, HighlightStyle};

use crate::engine::Engine;
use crate::lopdf_engine::LopdfEngine;

/// Fatal comparison failure.
///
/// Per-page conditions (unalignable pages, words that cannot be located)
/// never surface here; they are recorded in the [`CompareReport`].
#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// What happened to one page of the comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "status", rename_all = "snake_case")
)]
pub enum PageOutcome {
    /// The page was aligned and compared; it carries `highlights` new
    /// annotations.
    Compared {
        /// 0-based page index.
        page: usize,
        /// Number of span pairs whose text differed.
        differing_spans: usize,
        /// Differing words across all pairs (per-pair sets, summed).
        words: usize,
        /// Highlight annotations applied.
        highlights: usize,
        /// Differing words that text search could not locate.
        misses: usize,
    },
    /// Span counts differed; the page was copied without comparison.
    Skipped {
        /// 0-based page index.
        page: usize,
        new_spans: usize,
        old_spans: usize,
    },
}

/// Summary of one comparison run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompareReport {
    /// Per-page outcomes, in page order. Length equals `output_pages`.
    pub pages: Vec<PageOutcome>,
    /// Pages written to the output: min(new pages, old pages).
    pub output_pages: usize,
}

impl CompareReport {
    /// Total highlight annotations applied across all pages.
    pub fn total_highlights(&self) -> usize {
        self.pages
            .iter()
            .map(|p| match p {
                PageOutcome::Compared { highlights, .. } => *highlights,
                PageOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    /// Number of pages skipped due to structural mismatch.
    pub fn skipped_pages(&self) -> usize {
        self.pages
            .iter()
            .filter(|p| matches!(p, PageOutcome::Skipped { .. }))
            .count()
    }
}

/// Orchestrates a comparison run over a PDF [`Engine`].
pub struct Comparator<E: Engine> {
    engine: E,
    style: HighlightStyle,
}

impl Comparator<LopdfEngine> {
    /// A comparator over the default lopdf engine.
    pub fn new() -> Self {
        Self::with_engine(LopdfEngine)
    }
}

impl Default for Comparator<LopdfEngine> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Engine> Comparator<E> {
    /// A comparator over a caller-provided engine.
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            style: HighlightStyle::default(),
        }
    }

    /// Set the highlight style used for every annotation.
    pub fn highlight_style(mut self, style: HighlightStyle) -> Self {
        self.style = style;
        self
    }

    /// Compare `new_path` against `old_path` and write the highlighted copy
    /// of the new document to `output_path`.
    ///
    /// # Errors
    ///
    /// Fatal only: an input that cannot be opened (before any page work) or
    /// an output that cannot be saved. No partial output file is produced on
    /// either path.
    pub fn compare(
        &self,
        new_path: impl AsRef<Path>,
        old_path: impl AsRef<Path>,
        output_path: impl AsRef<Path>,
    ) -> Result<CompareReport, CompareError> {
        let mut new_doc = self.engine.open(new_path.as_ref())?;
        let old_doc = self.engine.open(old_path.as_ref())?;
        let mut output = self.engine.create_output();

        let page_count = self
            .engine
            .page_count(&new_doc)
            .min(self.engine.page_count(&old_doc));
        let mut pages = Vec::with_capacity(page_count);

        for index in 0..page_count {
            debug!(page = index, "comparing page");
            let new_text = self.engine.page_text(&new_doc, index)?;
            let old_text = self.engine.page_text(&old_doc, index)?;

            let outcome = match compare_spans(&new_text, &old_text) {
                PageDiff::Mismatch {
                    new_spans,
                    old_spans,
                } => {
                    warn!(
                        page = index,
                        new_spans, old_spans, "page structures do not match; skipping comparison"
                    );
                    PageOutcome::Skipped {
                        page: index,
                        new_spans,
                        old_spans,
                    }
                }
                PageDiff::Pairs(pairs) => {
                    let mut words = 0;
                    let mut highlights = 0;
                    let mut misses = 0;

                    // One word set per differing pair: a word that differs in
                    // two separate pairs is searched (and highlighted) twice,
                    // matching the no-deduplication contract.
                    for pair in &pairs {
                        for word in differing_words(&pair.new_text, &pair.old_text) {
                            words += 1;
                            let boxes = self.engine.search(&new_doc, index, &word)?;
                            if boxes.is_empty() {
                                debug!(page = index, word = %word, "differing word not found by search");
                                misses += 1;
                                continue;
                            }
                            for bbox in boxes {
                                self.engine.highlight(&mut new_doc, index, bbox, &self.style)?;
                                highlights += 1;
                            }
                        }
                    }

                    PageOutcome::Compared {
                        page: index,
                        differing_spans: pairs.len(),
                        words,
                        highlights,
                        misses,
                    }
                }
            };

            pages.push(outcome);
            // The page must carry all of its annotations before this copy.
            self.engine.append_page(&mut output, &new_doc, index)?;
        }

        self.engine.save(&mut output, output_path.as_ref())?;

        Ok(CompareReport {
            pages,
            output_pages: page_count,
        })
    }
}

/// Compare two PDF revisions with the default engine and styling.
pub fn compare_documents(
    new_path: impl AsRef<Path>,
    old_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<CompareReport, CompareError> {
    Comparator::new().compare(new_path, old_path, output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_totals() {
        let report = CompareReport {
            pages: vec![
                PageOutcome::Compared {
                    page: 0,
                    differing_spans: 2,
                    words: 3,
                    highlights: 4,
                    misses: 1,
                },
                PageOutcome::Skipped {
                    page: 1,
                    new_spans: 5,
                    old_spans: 4,
                },
                PageOutcome::Compared {
                    page: 2,
                    differing_spans: 0,
                    words: 0,
                    highlights: 0,
                    misses: 0,
                },
            ],
            output_pages: 3,
        };
        assert_eq!(report.total_highlights(), 4);
        assert_eq!(report.skipped_pages(), 1);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn page_outcome_serializes_with_status_tag() {
        let outcome = PageOutcome::Skipped {
            page: 1,
            new_spans: 5,
            old_spans: 4,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["new_spans"], 5);
    }
}
