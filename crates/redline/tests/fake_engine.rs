//! Orchestration laws exercised against an in-memory engine.
//!
//! The fake records every side-effecting call in order and counts handle
//! drops, so the page-count, skip, completeness, ordering, and
//! resource-release properties can be asserted without touching a real PDF.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use redline::{
    BBox, CompareReport, Comparator, Engine, EngineError, Glyph, HighlightStyle, PageOutcome,
    PageText,
};

/// Side-effecting engine calls, in call order.
#[derive(Debug, Clone, PartialEq)]
enum Event {
    Highlight { page: usize },
    Append { page: usize },
    Save,
}

#[derive(Default)]
struct FakeLog {
    events: Vec<Event>,
    docs_dropped: usize,
    outputs_dropped: usize,
}

struct FakeDoc {
    pages: Vec<Rc<PageText>>,
    log: Rc<RefCell<FakeLog>>,
}

impl Drop for FakeDoc {
    fn drop(&mut self) {
        self.log.borrow_mut().docs_dropped += 1;
    }
}

struct FakeOutput {
    log: Rc<RefCell<FakeLog>>,
}

impl Drop for FakeOutput {
    fn drop(&mut self) {
        self.log.borrow_mut().outputs_dropped += 1;
    }
}

struct FakeEngine {
    docs: HashMap<PathBuf, Vec<Rc<PageText>>>,
    log: Rc<RefCell<FakeLog>>,
    fail_save: bool,
}

impl FakeEngine {
    fn new() -> Self {
        Self {
            docs: HashMap::new(),
            log: Rc::new(RefCell::new(FakeLog::default())),
            fail_save: false,
        }
    }

    fn with_doc(mut self, path: &str, pages: Vec<PageText>) -> Self {
        self.docs
            .insert(PathBuf::from(path), pages.into_iter().map(Rc::new).collect());
        self
    }

    fn fail_save(mut self) -> Self {
        self.fail_save = true;
        self
    }
}

impl Engine for FakeEngine {
    type Doc = FakeDoc;
    type Output = FakeOutput;

    fn open(&self, path: &Path) -> Result<FakeDoc, EngineError> {
        let pages = self
            .docs
            .get(path)
            .cloned()
            .ok_or_else(|| EngineError::Parse(format!("no such document: {}", path.display())))?;
        Ok(FakeDoc {
            pages,
            log: Rc::clone(&self.log),
        })
    }

    fn page_count(&self, doc: &FakeDoc) -> usize {
        doc.pages.len()
    }

    fn page_text(&self, doc: &FakeDoc, index: usize) -> Result<Rc<PageText>, EngineError> {
        doc.pages
            .get(index)
            .cloned()
            .ok_or_else(|| EngineError::Malformed(format!("page {index} out of range")))
    }

    fn highlight(
        &self,
        _doc: &mut FakeDoc,
        index: usize,
        _bbox: BBox,
        _style: &HighlightStyle,
    ) -> Result<(), EngineError> {
        self.log.borrow_mut().events.push(Event::Highlight { page: index });
        Ok(())
    }

    fn create_output(&self) -> FakeOutput {
        FakeOutput {
            log: Rc::clone(&self.log),
        }
    }

    fn append_page(
        &self,
        _output: &mut FakeOutput,
        _source: &FakeDoc,
        index: usize,
    ) -> Result<(), EngineError> {
        self.log.borrow_mut().events.push(Event::Append { page: index });
        Ok(())
    }

    fn save(&self, _output: &mut FakeOutput, _path: &Path) -> Result<(), EngineError> {
        if self.fail_save {
            return Err(EngineError::Save("unwritable output".into()));
        }
        self.log.borrow_mut().events.push(Event::Save);
        Ok(())
    }
}

/// One span per line, glyphs 6pt wide on descending baselines.
fn page(lines: &[&str]) -> PageText {
    let mut page = PageText::new();
    for (i, line) in lines.iter().enumerate() {
        let y = 700.0 - 20.0 * i as f64;
        let glyphs = line
            .chars()
            .enumerate()
            .map(|(j, ch)| Glyph {
                ch,
                bbox: BBox::new(
                    72.0 + 6.0 * j as f64,
                    y,
                    72.0 + 6.0 * (j + 1) as f64,
                    y + 12.0,
                ),
            })
            .collect();
        page.push_span(glyphs);
    }
    page
}

fn run(engine: FakeEngine) -> (Result<CompareReport, redline::CompareError>, Rc<RefCell<FakeLog>>) {
    let log = Rc::clone(&engine.log);
    let result = Comparator::with_engine(engine).compare("new.pdf", "old.pdf", "out.pdf");
    (result, log)
}

#[test]
fn identical_documents_add_no_highlights() {
    let pages = vec![page(&["alpha beta", "gamma"]), page(&["delta"])];
    let engine = FakeEngine::new()
        .with_doc("new.pdf", pages.clone())
        .with_doc("old.pdf", pages);

    let (result, log) = run(engine);
    let report = result.unwrap();

    assert_eq!(report.total_highlights(), 0);
    assert_eq!(report.output_pages, 2);
    assert!(report.pages.iter().all(|p| matches!(
        p,
        PageOutcome::Compared { highlights: 0, misses: 0, .. }
    )));
    assert_eq!(
        log.borrow().events,
        vec![
            Event::Append { page: 0 },
            Event::Append { page: 1 },
            Event::Save
        ]
    );
}

#[test]
fn output_page_count_is_min_of_inputs() {
    let engine = FakeEngine::new()
        .with_doc(
            "new.pdf",
            vec![page(&["a"]), page(&["b"]), page(&["c"])],
        )
        .with_doc("old.pdf", vec![page(&["a"]), page(&["b"])]);

    let (result, log) = run(engine);
    let report = result.unwrap();

    assert_eq!(report.output_pages, 2);
    assert_eq!(report.pages.len(), 2);
    let appends: Vec<_> = log
        .borrow()
        .events
        .iter()
        .filter(|e| matches!(e, Event::Append { .. }))
        .cloned()
        .collect();
    assert_eq!(appends, vec![Event::Append { page: 0 }, Event::Append { page: 1 }]);
}

#[test]
fn mismatched_page_is_skipped_but_still_copied() {
    let engine = FakeEngine::new()
        .with_doc("new.pdf", vec![page(&["one", "two", "three"])])
        .with_doc("old.pdf", vec![page(&["one", "two"])]);

    let (result, log) = run(engine);
    let report = result.unwrap();

    assert_eq!(
        report.pages,
        vec![PageOutcome::Skipped {
            page: 0,
            new_spans: 3,
            old_spans: 2
        }]
    );
    // Copied through unannotated.
    assert_eq!(
        log.borrow().events,
        vec![Event::Append { page: 0 }, Event::Save]
    );
}

#[test]
fn every_occurrence_of_a_differing_word_is_highlighted() {
    // "alpha" appears in two spans of the new page; the differing pair only
    // involves the first, but search covers the whole page.
    let engine = FakeEngine::new()
        .with_doc("new.pdf", vec![page(&["alpha beta", "alpha"])])
        .with_doc("old.pdf", vec![page(&["gamma beta", "alpha"])]);

    let (result, log) = run(engine);
    let report = result.unwrap();

    // Differing words {alpha, gamma}: alpha hits twice, gamma is a miss.
    assert_eq!(
        report.pages,
        vec![PageOutcome::Compared {
            page: 0,
            differing_spans: 1,
            words: 2,
            highlights: 2,
            misses: 1
        }]
    );
    let highlight_count = log
        .borrow()
        .events
        .iter()
        .filter(|e| matches!(e, Event::Highlight { page: 0 }))
        .count();
    assert_eq!(highlight_count, 2);
}

#[test]
fn word_differing_in_two_pairs_is_highlighted_twice() {
    // "alpha" differs in both pairs; no cross-pair deduplication, so both
    // occurrences are highlighted once per pair.
    let engine = FakeEngine::new()
        .with_doc("new.pdf", vec![page(&["alpha x", "alpha y"])])
        .with_doc("old.pdf", vec![page(&["beta x", "beta y"])]);

    let (result, _log) = run(engine);
    let report = result.unwrap();

    assert_eq!(
        report.pages,
        vec![PageOutcome::Compared {
            page: 0,
            differing_spans: 2,
            words: 4,
            highlights: 4,
            misses: 2
        }]
    );
}

#[test]
fn highlights_are_applied_before_the_page_is_copied() {
    let engine = FakeEngine::new()
        .with_doc("new.pdf", vec![page(&["same"]), page(&["changed here"])])
        .with_doc("old.pdf", vec![page(&["same"]), page(&["altered here"])]);

    let (result, log) = run(engine);
    result.unwrap();

    let events = log.borrow().events.clone();
    let append_1 = events
        .iter()
        .position(|e| *e == Event::Append { page: 1 })
        .unwrap();
    let last_highlight = events
        .iter()
        .rposition(|e| matches!(e, Event::Highlight { page: 1 }))
        .unwrap();
    assert!(last_highlight < append_1);
    assert_eq!(events.last(), Some(&Event::Save));
}

#[test]
fn unopenable_input_is_fatal_and_writes_nothing() {
    let engine = FakeEngine::new().with_doc("new.pdf", vec![page(&["a"])]);

    let (result, log) = run(engine);
    assert!(result.is_err());

    let log = log.borrow();
    assert!(log.events.is_empty());
    // The new document had been opened and is released on the error path.
    assert_eq!(log.docs_dropped, 1);
}

#[test]
fn save_failure_still_releases_every_handle() {
    let pages = vec![page(&["a"])];
    let engine = FakeEngine::new()
        .with_doc("new.pdf", pages.clone())
        .with_doc("old.pdf", pages)
        .fail_save();

    let (result, log) = run(engine);
    assert!(result.is_err());

    let log = log.borrow();
    assert_eq!(log.docs_dropped, 2);
    assert_eq!(log.outputs_dropped, 1);
}

#[test]
fn handles_are_released_exactly_once_on_success() {
    let pages = vec![page(&["a"])];
    let engine = FakeEngine::new()
        .with_doc("new.pdf", pages.clone())
        .with_doc("old.pdf", pages);

    let (result, log) = run(engine);
    result.unwrap();

    let log = log.borrow();
    assert_eq!(log.docs_dropped, 2);
    assert_eq!(log.outputs_dropped, 1);
}
