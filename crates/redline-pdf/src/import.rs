//! Building the output document from annotated source pages.
//!
//! Pages are carried over by importing each page's object closure (the
//! page dictionary plus everything reachable from it) into the output
//! document, remapping references as they cross. A persistent id map keeps
//! objects shared between pages (fonts, resource dictionaries) from being
//! imported twice. The page tree and catalog are assembled once, at save
//! time.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Object, ObjectId};
use tracing::debug;

use crate::document::{PdfDocument, resolve_inherited};
use crate::error::EngineError;

/// Attributes a page may inherit from its ancestors in the page tree. They
/// are materialized onto the page before the /Parent link is severed.
const INHERITED_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// An output document under construction.
///
/// All imported pages come from a single source document per
/// `OutputDocument`; the id map is keyed by source object id alone.
pub struct OutputDocument {
    doc: lopdf::Document,
    page_ids: Vec<ObjectId>,
    id_map: BTreeMap<ObjectId, ObjectId>,
    /// (pages, catalog) ids, allocated on first save.
    root: Option<(ObjectId, ObjectId)>,
}

impl Default for OutputDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputDocument {
    /// Create an empty output document.
    pub fn new() -> Self {
        Self {
            doc: lopdf::Document::with_version("1.5"),
            page_ids: Vec::new(),
            id_map: BTreeMap::new(),
            root: None,
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append page `index` of `source`, copying its object closure.
    ///
    /// The page must be fully annotated before this call: the import reads
    /// the page's current in-memory state, so later mutations of the source
    /// are not reflected in the output.
    pub fn append_page(&mut self, source: &PdfDocument, index: usize) -> Result<(), EngineError> {
        let page_id = source.page_id(index)?;
        let src = source.inner();

        let mut page_dict = src
            .get_object(page_id)
            .and_then(|obj| obj.as_dict())
            .map_err(|e| EngineError::Malformed(format!("page is not a dictionary: {e}")))?
            .clone();

        // Materialize inheritable attributes, then cut the tree link so the
        // source page tree is not dragged into the output.
        for key in INHERITED_KEYS {
            if !page_dict.has(key) {
                if let Some(value) = resolve_inherited(src, page_id, key)? {
                    page_dict.set(key, value.clone());
                }
            }
        }
        page_dict.remove(b"Parent");

        let new_id = self.doc.new_object_id();
        // Mapped before the walk so back-references to the page itself
        // (annotation /P entries, for instance) resolve to the copy.
        self.id_map.insert(page_id, new_id);
        let converted = self.convert_dict(src, &page_dict)?;
        self.doc.objects.insert(new_id, Object::Dictionary(converted));
        self.page_ids.push(new_id);

        debug!(page = index, "appended page to output");
        Ok(())
    }

    /// Import the object behind a source reference, reusing the existing
    /// copy when the closure walk has already visited it.
    fn import_ref(&mut self, src: &lopdf::Document, id: ObjectId) -> Result<ObjectId, EngineError> {
        if let Some(&mapped) = self.id_map.get(&id) {
            return Ok(mapped);
        }
        let new_id = self.doc.new_object_id();
        self.id_map.insert(id, new_id);

        let object = src
            .get_object(id)
            .map_err(|e| EngineError::Malformed(format!("dangling reference {id:?}: {e}")))?
            .clone();
        let converted = self.convert(src, object)?;
        self.doc.objects.insert(new_id, converted);
        Ok(new_id)
    }

    /// Rewrite an object so every reference points into the output document,
    /// importing referenced objects along the way.
    fn convert(&mut self, src: &lopdf::Document, obj: Object) -> Result<Object, EngineError> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.import_ref(src, id)?)),
            Object::Array(array) => Ok(Object::Array(
                array
                    .into_iter()
                    .map(|item| self.convert(src, item))
                    .collect::<Result<_, _>>()?,
            )),
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.convert_dict(src, &dict)?)),
            Object::Stream(mut stream) => {
                stream.dict = self.convert_dict(src, &stream.dict)?;
                Ok(Object::Stream(stream))
            }
            other => Ok(other),
        }
    }

    fn convert_dict(
        &mut self,
        src: &lopdf::Document,
        dict: &Dictionary,
    ) -> Result<Dictionary, EngineError> {
        let mut out = Dictionary::new();
        for (key, value) in dict.iter() {
            out.set(key.clone(), self.convert(src, value.clone())?);
        }
        Ok(out)
    }

    /// Assemble the page tree and catalog, then write the document to
    /// `path`. No file is created before this point.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        self.finalize();
        self.doc
            .save(path.as_ref())
            .map_err(|e| EngineError::Save(e.to_string()))?;
        Ok(())
    }

    /// As [`save`](Self::save), but into an in-memory buffer.
    pub fn save_to(&mut self, target: &mut Vec<u8>) -> Result<(), EngineError> {
        self.finalize();
        self.doc
            .save_to(target)
            .map_err(|e| EngineError::Save(e.to_string()))?;
        Ok(())
    }

    fn finalize(&mut self) {
        let (pages_id, catalog_id) = match self.root {
            Some(ids) => ids,
            None => {
                let ids = (self.doc.new_object_id(), self.doc.new_object_id());
                self.root = Some(ids);
                ids
            }
        };
        for &page_id in &self.page_ids {
            if let Ok(Object::Dictionary(dict)) = self.doc.get_object_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary({
                let mut dict = Dictionary::new();
                dict.set("Type", Object::Name(b"Pages".to_vec()));
                dict.set("Count", Object::Integer(self.page_ids.len() as i64));
                dict.set("Kids", Object::Array(kids));
                dict
            }),
        );
        self.doc.objects.insert(
            catalog_id,
            Object::Dictionary({
                let mut dict = Dictionary::new();
                dict.set("Type", Object::Name(b"Catalog".to_vec()));
                dict.set("Pages", Object::Reference(pages_id));
                dict
            }),
        );
        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.compress();
    }
}
