//! Document handles and shared page-graph helpers.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use redline_core::{BBox, PageText};

use crate::annot::{self, HighlightStyle};
use crate::error::EngineError;
use crate::extract;

/// A PDF document opened for comparison.
///
/// Wraps a parsed [`lopdf::Document`] together with its ordered page list.
/// Page text is extracted on demand; only the most recently requested page's
/// extraction is memoized (word location hits the same page repeatedly), so
/// nothing is retained across pages.
pub struct PdfDocument {
    inner: lopdf::Document,
    /// Ordered page ObjectIds, indexed by 0-based page number.
    page_ids: Vec<lopdf::ObjectId>,
    text_memo: RefCell<Option<(usize, Rc<PageText>)>>,
}

impl PdfDocument {
    /// Open a PDF document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the file cannot be read or is not a valid
    /// PDF.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let inner = lopdf::Document::load(path.as_ref())?;
        Ok(Self::from_inner(inner))
    }

    /// Open a PDF document from bytes already in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EngineError> {
        let inner = lopdf::Document::load_mem(bytes)?;
        Ok(Self::from_inner(inner))
    }

    fn from_inner(inner: lopdf::Document) -> Self {
        // get_pages returns a BTreeMap keyed by 1-based page number, so the
        // values come out in page order.
        let page_ids = inner.get_pages().into_values().collect();
        Self {
            inner,
            page_ids,
            text_memo: RefCell::new(None),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub(crate) fn page_id(&self, index: usize) -> Result<lopdf::ObjectId, EngineError> {
        self.page_ids.get(index).copied().ok_or_else(|| {
            EngineError::Malformed(format!(
                "page index {index} out of range (document has {} pages)",
                self.page_ids.len()
            ))
        })
    }

    pub(crate) fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    /// Extract the page's positioned text, in content-stream order.
    ///
    /// A page without contents or without text operators yields an empty
    /// [`PageText`], not an error.
    pub fn page_text(&self, index: usize) -> Result<Rc<PageText>, EngineError> {
        if let Some((memo_index, text)) = self.text_memo.borrow().as_ref() {
            if *memo_index == index {
                return Ok(Rc::clone(text));
            }
        }
        let text = Rc::new(extract::extract_page_text(&self.inner, self.page_id(index)?)?);
        *self.text_memo.borrow_mut() = Some((index, Rc::clone(&text)));
        Ok(text)
    }

    /// Add a highlight annotation to the page, in memory.
    pub fn add_highlight(
        &mut self,
        index: usize,
        bbox: BBox,
        style: &HighlightStyle,
    ) -> Result<(), EngineError> {
        let page_id = self.page_id(index)?;
        annot::add_highlight(&mut self.inner, page_id, bbox, style)
    }
}

impl std::fmt::Debug for PdfDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfDocument")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

/// Follow a reference one level, returning the target object.
///
/// Non-reference objects are returned unchanged; a dangling reference is
/// returned as-is so callers degrade instead of failing.
pub(crate) fn deref<'a>(doc: &'a lopdf::Document, obj: &'a lopdf::Object) -> &'a lopdf::Object {
    match obj {
        lopdf::Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// Look up a key on a page dictionary, walking up the page tree (via
/// /Parent) when the key is inheritable and not set on the page itself.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a lopdf::Document,
    page_id: lopdf::ObjectId,
    key: &[u8],
) -> Result<Option<&'a lopdf::Object>, EngineError> {
    let mut current = page_id;
    // Depth guard against cyclic /Parent chains in damaged files.
    for _ in 0..64 {
        let dict = doc
            .get_object(current)
            .map_err(|e| EngineError::Malformed(format!("cannot resolve page node: {e}")))?
            .as_dict()
            .map_err(|_| EngineError::Malformed("page tree node is not a dictionary".into()))?;
        if let Ok(value) = dict.get(key) {
            return Ok(Some(value));
        }
        match dict.get(b"Parent") {
            Ok(lopdf::Object::Reference(parent)) => current = *parent,
            _ => return Ok(None),
        }
    }
    Ok(None)
}

/// Gather a page's content stream bytes.
///
/// Handles both a single stream reference and an array of stream references;
/// a page with no /Contents yields empty bytes.
pub(crate) fn page_content_bytes(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<Vec<u8>, EngineError> {
    let page_dict = doc
        .get_object(page_id)
        .and_then(|obj| obj.as_dict())
        .map_err(|e| EngineError::Malformed(format!("page is not a dictionary: {e}")))?;

    let contents_obj = match page_dict.get(b"Contents") {
        Ok(obj) => obj,
        Err(_) => return Ok(Vec::new()),
    };

    match contents_obj {
        lopdf::Object::Reference(id) => {
            let stream = doc
                .get_object(*id)
                .and_then(|obj| obj.as_stream())
                .map_err(|e| EngineError::Malformed(format!("/Contents is not a stream: {e}")))?;
            decode_content_stream(stream)
        }
        lopdf::Object::Array(arr) => {
            let mut content = Vec::new();
            for item in arr {
                let id = item.as_reference().map_err(|e| {
                    EngineError::Malformed(format!("/Contents array item is not a reference: {e}"))
                })?;
                let stream = doc
                    .get_object(id)
                    .and_then(|obj| obj.as_stream())
                    .map_err(|e| {
                        EngineError::Malformed(format!("/Contents array item is not a stream: {e}"))
                    })?;
                let bytes = decode_content_stream(stream)?;
                if !content.is_empty() {
                    content.push(b' ');
                }
                content.extend_from_slice(&bytes);
            }
            Ok(content)
        }
        _ => Err(EngineError::Malformed(
            "/Contents is neither a reference nor an array".to_string(),
        )),
    }
}

/// Decode a content stream, decompressing if a filter is present.
fn decode_content_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, EngineError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| EngineError::Malformed(format!("cannot decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{doc_with_pages, doc_with_text};

    fn to_bytes(mut doc: lopdf::Document) -> Vec<u8> {
        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn open_from_bytes_counts_pages() {
        let bytes = to_bytes(doc_with_pages(&[
            "BT /F1 12 Tf 72 700 Td (one) Tj ET",
            "BT /F1 12 Tf 72 700 Td (two) Tj ET",
        ]));
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert_eq!(doc.page_count(), 2);
    }

    #[test]
    fn invalid_bytes_fail_to_open() {
        assert!(PdfDocument::from_bytes(b"not a pdf at all").is_err());
    }

    #[test]
    fn open_missing_file_fails() {
        assert!(PdfDocument::open("/nonexistent/path/to.pdf").is_err());
    }

    #[test]
    fn page_text_reads_spans_in_order() {
        let bytes = to_bytes(doc_with_pages(&[
            "BT /F1 12 Tf 72 700 Td (first) Tj 0 -20 Td (second) Tj ET",
        ]));
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        let text = doc.page_text(0).unwrap();
        let texts: Vec<_> = text.spans.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn page_text_memoizes_only_latest_page() {
        let bytes = to_bytes(doc_with_pages(&[
            "BT /F1 12 Tf 72 700 Td (one) Tj ET",
            "BT /F1 12 Tf 72 700 Td (two) Tj ET",
        ]));
        let doc = PdfDocument::from_bytes(&bytes).unwrap();

        let first = doc.page_text(0).unwrap();
        let again = doc.page_text(0).unwrap();
        assert!(Rc::ptr_eq(&first, &again));

        let other = doc.page_text(1).unwrap();
        assert_eq!(other.spans[0].text, "two");
        // Page 0 was evicted; a fresh extraction is produced.
        let refreshed = doc.page_text(0).unwrap();
        assert!(!Rc::ptr_eq(&first, &refreshed));
        assert_eq!(*first, *refreshed);
    }

    #[test]
    fn page_index_out_of_range_is_malformed() {
        let bytes = to_bytes(doc_with_text("only page"));
        let doc = PdfDocument::from_bytes(&bytes).unwrap();
        assert!(matches!(
            doc.page_text(5),
            Err(EngineError::Malformed(_))
        ));
    }

    #[test]
    fn content_bytes_empty_for_contentless_page() {
        use lopdf::{Object, dictionary};

        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => Object::Integer(1),
                "Kids" => vec![Object::Reference(page_id)],
            }),
        );

        assert!(page_content_bytes(&doc, page_id).unwrap().is_empty());
    }

    #[test]
    fn inherited_resources_are_found_through_parent() {
        use lopdf::Object;

        let bytes = to_bytes(doc_with_text("x"));
        let mut doc = lopdf::Document::load_mem(&bytes).unwrap();

        // Move Resources from the page up to the Pages node.
        let pages = doc.get_pages();
        let page_id = *pages.values().next().unwrap();
        let resources = {
            let page_dict = doc.get_object_mut(page_id).unwrap().as_dict_mut().unwrap();
            page_dict.remove(b"Resources").unwrap()
        };
        let parent_id = {
            let page_dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
            page_dict.get(b"Parent").unwrap().as_reference().unwrap()
        };
        if let Object::Dictionary(pages_dict) = doc.get_object_mut(parent_id).unwrap() {
            pages_dict.set("Resources", resources);
        }

        let found = resolve_inherited(&doc, page_id, b"Resources").unwrap();
        assert!(found.is_some());
    }
}
