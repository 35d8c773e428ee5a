// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler — merge documents, extract page ranges, and lock or unlock
// documents with a password. Every operation copies pages into a fresh
// `lopdf::Document`; inputs are never modified.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::{debug, info, instrument, warn};
use wandelwerk_core::Artifact;
use wandelwerk_core::error::{EngineError, Result};

use crate::pdf::range::PageRange;
use crate::pdf::reader::{self, PdfReader};
use crate::pdf::security;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Stateless entry point for page-level PDF transformations.
pub struct PdfAssembler;

impl PdfAssembler {
    /// Concatenate every page of every document, in input order.
    #[instrument(skip_all, fields(documents = documents.len()))]
    pub fn merge(documents: &[&[u8]]) -> Result<Vec<u8>> {
        if documents.is_empty() {
            return Err(EngineError::InvalidParameter(
                "merge needs at least one PDF".into(),
            ));
        }

        let mut output = OutputDocument::new();
        for (index, bytes) in documents.iter().enumerate() {
            let reader = PdfReader::from_bytes(bytes).map_err(|err| match err {
                EngineError::PdfError(detail) => {
                    EngineError::PdfError(format!("failed to load PDF #{}: {}", index + 1, detail))
                }
                other => {
                    warn!(input = index + 1, %other, "Merge input rejected");
                    other
                }
            })?;
            output.append_all(&reader)?;
        }

        info!(pages = output.page_count, "Merge complete");
        output.finish()
    }

    /// Copy exactly the pages of `range`, in range order.
    #[instrument(skip_all, fields(pages = range.len()))]
    pub fn extract_range(document: &[u8], range: &PageRange) -> Result<Vec<u8>> {
        let reader = PdfReader::from_bytes(document)?;
        Self::extract_from(&reader, range)
    }

    /// Parse `expr` against the document's page count, then extract it.
    pub fn extract_expr(document: &[u8], expr: &str) -> Result<Vec<u8>> {
        let reader = PdfReader::from_bytes(document)?;
        let range = PageRange::parse(expr, reader.page_count())?;
        Self::extract_from(&reader, &range)
    }

    fn extract_from(reader: &PdfReader, range: &PageRange) -> Result<Vec<u8>> {
        let mut output = OutputDocument::new();
        for &page_number in range.pages() {
            let page_id = reader.page_id(page_number).map_err(|_| {
                EngineError::InvalidRange(format!(
                    "page {} exceeds document length of {} pages",
                    page_number,
                    reader.page_count()
                ))
            })?;
            output.append_page(reader.document(), page_id)?;
        }

        debug!(pages = output.page_count, "Range extracted");
        output.finish()
    }

    /// Copy every page into a new document protected by `password` (AES-256).
    #[instrument(skip_all, fields(bytes_len = document.len()))]
    pub fn encrypt(document: &[u8], password: &str) -> Result<Vec<u8>> {
        if password.is_empty() {
            return Err(EngineError::Encryption("password must not be empty".into()));
        }

        let source = reader::load_document(document)?;
        if source.is_encrypted() {
            return Err(EngineError::Encryption(
                "document is already password protected".into(),
            ));
        }
        let reader = PdfReader::from_document(source);

        let mut output = OutputDocument::new();
        output.append_all(&reader)?;
        let mut locked = output.into_document();
        security::lock(&mut locked, password)?;

        info!(pages = reader.page_count(), "Document locked");
        save(&mut locked)
    }

    /// Open a locked document with `password` and copy every page into a new,
    /// unprotected document.
    #[instrument(skip_all, fields(bytes_len = document.len()))]
    pub fn decrypt(document: &[u8], password: &str) -> Result<Vec<u8>> {
        let reader = security::unlock(document, password)?;
        if reader.page_count() == 0 {
            return Err(EngineError::PdfError(
                "no pages could be recovered from the locked document".into(),
            ));
        }

        let mut output = OutputDocument::new();
        output.append_all(&reader)?;
        if output.page_count != reader.page_count() {
            return Err(EngineError::PdfError(format!(
                "recovered {} of {} pages",
                output.page_count,
                reader.page_count()
            )));
        }

        info!(pages = output.page_count, "Document unlocked");
        output.finish()
    }

    // -- Artifact wrappers ----------------------------------------------------

    pub fn merge_artifact(documents: &[&[u8]]) -> Result<Artifact> {
        Ok(Artifact::pdf(Self::merge(documents)?, "merged.pdf"))
    }

    pub fn extract_artifact(document: &[u8], expr: &str) -> Result<Artifact> {
        Ok(Artifact::pdf(Self::extract_expr(document, expr)?, "extracted.pdf"))
    }

    pub fn encrypt_artifact(document: &[u8], password: &str) -> Result<Artifact> {
        Ok(Artifact::pdf(Self::encrypt(document, password)?, "locked.pdf"))
    }

    pub fn decrypt_artifact(document: &[u8], password: &str) -> Result<Artifact> {
        Ok(Artifact::pdf(Self::decrypt(document, password)?, "unlocked.pdf"))
    }
}

// -- Output document ----------------------------------------------------------

/// A new document with an empty page tree that pages are appended to.
struct OutputDocument {
    document: Document,
    pages_id: ObjectId,
    page_count: u32,
}

impl OutputDocument {
    fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        Self {
            document,
            pages_id,
            page_count: 0,
        }
    }

    fn append_all(&mut self, reader: &PdfReader) -> Result<()> {
        for page_id in reader.page_ids() {
            self.append_page(reader.document(), page_id)?;
        }
        Ok(())
    }

    /// Clone a single page (and everything it references) from `source`,
    /// appending it as the last page.
    fn append_page(&mut self, source: &Document, page_id: ObjectId) -> Result<()> {
        let page = source
            .get_object(page_id)
            .and_then(Object::as_dict)
            .map_err(|err| {
                EngineError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
            })?;

        // References are memoised per page so shared objects are cloned once
        // and reference cycles terminate.
        let mut copier = ObjectCopier::new(source);
        let mut cloned = copier.clone_dictionary(&mut self.document, page)?;

        for key in INHERITABLE_KEYS {
            if cloned.has(key) {
                continue;
            }
            if let Some(inherited) = inherited_attribute(source, page, key) {
                let value = copier.clone_object(&mut self.document, inherited)?;
                cloned.set(key.to_vec(), value);
            }
        }
        cloned.set("Parent", Object::Reference(self.pages_id));

        let cloned_id = self.document.add_object(Object::Dictionary(cloned));

        if let Ok(Object::Dictionary(pages_dict)) = self.document.get_object_mut(self.pages_id) {
            if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
                kids.push(Object::Reference(cloned_id));
            }
            if let Ok(Object::Integer(count)) = pages_dict.get_mut(b"Count") {
                *count += 1;
            }
        }

        self.page_count += 1;
        Ok(())
    }

    fn into_document(self) -> Document {
        self.document
    }

    fn finish(self) -> Result<Vec<u8>> {
        let mut document = self.document;
        save(&mut document)
    }
}

fn save(document: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    document
        .save_to(&mut output)
        .map_err(|err| EngineError::PdfError(format!("failed to serialise PDF: {}", err)))?;
    debug!(output_bytes = output.len(), "PDF serialised");
    Ok(output)
}

/// Walk `/Parent` links upwards looking for an inheritable attribute the page
/// does not set itself.
fn inherited_attribute<'a>(source: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut node = page;
    // Page trees are shallow; the bound guards against malformed parent loops.
    for _ in 0..64 {
        let parent_id = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = source.get_object(parent_id).ok()?.as_dict().ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value);
        }
    }
    None
}

// -- Deep copy ------------------------------------------------------------------

/// Deep-copies objects from one document into another, resolving references
/// (except `/Parent`, which the caller patches) into new objects in the target.
struct ObjectCopier<'a> {
    source: &'a Document,
    copied: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            copied: HashMap::new(),
        }
    }

    fn clone_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Result<Dictionary> {
        let mut new_dict = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            let cloned_value = self.clone_object(target, value)?;
            new_dict.set(key.clone(), cloned_value);
        }
        Ok(new_dict)
    }

    fn clone_object(&mut self, target: &mut Document, object: &Object) -> Result<Object> {
        match object {
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.clone_dictionary(target, dict)?)),
            Object::Array(items) => {
                let mut new_items = Vec::with_capacity(items.len());
                for item in items {
                    new_items.push(self.clone_object(target, item)?);
                }
                Ok(Object::Array(new_items))
            }
            Object::Stream(stream) => {
                let dict = self.clone_dictionary(target, &stream.dict)?;
                Ok(Object::Stream(Stream::new(dict, stream.content.clone())))
            }
            Object::Reference(ref_id) => self.clone_reference(target, *ref_id),
            // Boolean, Integer, Real, String, Name and Null copy as-is.
            other => Ok(other.clone()),
        }
    }

    fn clone_reference(&mut self, target: &mut Document, ref_id: ObjectId) -> Result<Object> {
        if let Some(&existing) = self.copied.get(&ref_id) {
            return Ok(Object::Reference(existing));
        }

        let referenced = match self.source.get_object(ref_id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                return Ok(Object::Null);
            }
        };

        // Reserve the target ID before descending so cycles resolve to it.
        let new_id = target.new_object_id();
        self.copied.insert(ref_id, new_id);
        let cloned = self.clone_object(target, referenced)?;
        target.objects.insert(new_id, cloned);
        Ok(Object::Reference(new_id))
    }
}
