//! Building a mutable document from an immutable base
//!
//! The base is a parsed PDF. Its pages are deep-copied into a fresh
//! [`Document`]: every object a page reaches is copied once under a new
//! identity and references are rewritten to match. Page-tree nodes and the
//! catalog are never copied; references to them point at the new document's
//! own. The base's AcroForm is copied through the same table, so fields whose
//! widgets sit on copied pages stay registered under their new identities.
//!
//! Strings are held as text: a byte string is kept as one character per byte
//! and written back byte for byte, but a string starting with a UTF-16 byte
//! order mark is decoded and may not come back identical when it is not
//! valid UTF-16.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId};
use crate::page::Page;
use crate::parser::{ParsedPage, PdfReader};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// An immutable, parsed document that pages are copied from.
#[derive(Debug, Clone)]
pub struct BaseDocument {
    reader: PdfReader,
}

impl BaseDocument {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self {
            reader: PdfReader::from_bytes(data)?,
        })
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            reader: PdfReader::open(path)?,
        })
    }

    /// Serialize freshly drawn pages and parse them back as a base.
    pub fn render(pages: impl IntoIterator<Item = Page>) -> Result<Self> {
        let mut document = Document::new();
        for page in pages {
            document.add_page(page)?;
        }
        Self::from_bytes(&document.to_bytes()?)
    }

    pub fn reader(&self) -> &PdfReader {
        &self.reader
    }

    pub fn page_count(&self) -> Result<usize> {
        Ok(self.reader.page_count()?)
    }
}

/// A new document with one page per base page, in order.
///
/// Each copy keeps its content, resources, media box and annotations.
/// Inherited page attributes are written onto the copy itself. The base's
/// AcroForm, when it has one, becomes the new document's, with `/Fields` in
/// the same order.
pub fn copy_pages(base: &BaseDocument) -> Result<Document> {
    let reader = base.reader();
    let pages = reader.pages()?;
    let mut document = Document::new();

    let mut copier = PageCopier::new(reader, &mut document);
    for page in &pages {
        copier.reserve_page(page.id);
    }
    let new_ids: Vec<ObjectId> = pages
        .iter()
        .map(|page| copier.copy_page(page))
        .collect::<Result<_>>()?;
    let acro_form = match reader.catalog()?.get("AcroForm") {
        Some(form) if reader.resolve_dict(form).is_some() => Some(copier.copy_value(form)),
        Some(_) => {
            warn!("ignoring base /AcroForm that is not a dictionary");
            None
        }
        None => None,
    };
    copier.finish()?;

    for id in new_ids {
        document.append_page_object(id)?;
    }
    if let Some(form) = acro_form {
        let catalog = document.catalog_id();
        document
            .store_mut()
            .expect_dict_mut(catalog, "catalog")?
            .set("AcroForm", form);
    }

    debug!(
        pages = document.page_count(),
        objects = document.store().len(),
        "copied pages from base"
    );
    Ok(document)
}

struct PageCopier<'a> {
    reader: &'a PdfReader,
    document: &'a mut Document,
    remap: HashMap<ObjectId, ObjectId>,
    pending: Vec<(ObjectId, ObjectId)>,
}

impl<'a> PageCopier<'a> {
    fn new(reader: &'a PdfReader, document: &'a mut Document) -> Self {
        let mut remap = HashMap::new();
        for (id, object) in reader.objects() {
            match object.as_dict().and_then(|dict| dict.get_name("Type")) {
                Some("Catalog") => {
                    remap.insert(*id, document.catalog_id());
                }
                Some("Pages") => {
                    remap.insert(*id, document.pages_id());
                }
                _ => {}
            }
        }

        Self {
            reader,
            document,
            remap,
            pending: Vec::new(),
        }
    }

    /// Give a base page its new identity before anything refers to it.
    fn reserve_page(&mut self, base: ObjectId) {
        let id = self.document.store_mut().allocate(Object::Null);
        self.remap.insert(base, id);
    }

    fn copy_page(&mut self, page: &ParsedPage) -> Result<ObjectId> {
        let Some(&target) = self.remap.get(&page.id) else {
            return Err(PdfError::InvalidReference(format!(
                "page {} was not reserved",
                page.id
            )));
        };

        let mut dict = Dictionary::new();
        for (key, value) in page.dict.iter().filter(|(key, _)| key.as_str() != "Parent") {
            let copied = self.copy_value(value);
            dict.set(key.clone(), copied);
        }
        for (key, value) in page.inherited.iter() {
            let copied = self.copy_value(value);
            dict.set(key.clone(), copied);
        }
        if !dict.contains_key("MediaBox") {
            dict.set("MediaBox", page.media_box.to_pdf_array());
        }
        dict.set("Parent", self.document.pages_id());

        self.document.store_mut().replace(target, dict)?;
        Ok(target)
    }

    /// Copy every object queued by [`Self::copy_value`] until none is left.
    fn finish(&mut self) -> Result<()> {
        while let Some((base, target)) = self.pending.pop() {
            let copied = match self.reader.get_object(base) {
                Some(object) => self.copy_value(object),
                None => Object::Null,
            };
            self.document.store_mut().replace(target, copied)?;
        }
        Ok(())
    }

    fn copy_value(&mut self, object: &Object) -> Object {
        match object {
            Object::Reference(id) => Object::Reference(self.map_reference(*id)),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy_value(item)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dictionary(dict)),
            Object::Stream(dict, data) => Object::Stream(self.copy_dictionary(dict), data.clone()),
            other => other.clone(),
        }
    }

    fn copy_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::with_capacity(dict.len());
        for (key, value) in dict.iter() {
            let copied = self.copy_value(value);
            copy.set(key.clone(), copied);
        }
        copy
    }

    fn map_reference(&mut self, base: ObjectId) -> ObjectId {
        if let Some(&id) = self.remap.get(&base) {
            return id;
        }
        let id = self.document.store_mut().allocate(Object::Null);
        self.remap.insert(base, id);
        self.pending.push((base, id));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rectangle;
    use crate::text::Font;

    fn base_with_text(pages: usize) -> BaseDocument {
        let pages = (0..pages).map(|i| {
            let mut page = Page::letter();
            page.text()
                .set_font(Font::Helvetica, 12.0)
                .at(72.0, 720.0)
                .write(&format!("page {i}"));
            page
        });
        BaseDocument::render(pages).unwrap()
    }

    #[test]
    fn test_render_round_trips_pages() {
        let base = base_with_text(2);
        assert_eq!(base.page_count().unwrap(), 2);
        assert_eq!(base.reader().version(), "1.7");
    }

    #[test]
    fn test_copy_keeps_page_count_and_content() {
        let base = base_with_text(3);
        let doc = copy_pages(&base).unwrap();
        assert_eq!(doc.page_count(), 3);

        let base_pages = base.reader().pages().unwrap();
        for (index, base_page) in base_pages.iter().enumerate() {
            let id = doc.page_id(index).unwrap();
            let page = doc.store().get_dict(id).unwrap();
            assert_eq!(page.get("Parent"), Some(&Object::Reference(doc.pages_id())));

            let base_content = base.reader().resolve(base_page.dict.get("Contents").unwrap());
            let content = doc.store().resolve(page.get("Contents").unwrap());
            match (base_content, content) {
                (Object::Stream(_, expected), Object::Stream(_, actual)) => {
                    assert_eq!(expected, actual)
                }
                other => panic!("expected streams, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_copy_keeps_registered_fields() {
        let mut source = Document::new();
        source.add_page(Page::letter()).unwrap();
        source
            .add_signature_field("Existing", Rectangle::from_coords(10.0, 10.0, 50.0, 30.0), 0)
            .unwrap();
        let base = BaseDocument::from_bytes(&source.to_bytes().unwrap()).unwrap();

        let mut copy = copy_pages(&base).unwrap();
        let copied = copy.signature_fields().unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].name, "Existing");
        assert_eq!(copied[0].page_index, Some(0));

        // The registered field is the parent of the copied widget
        let page = copy.page_id(0).unwrap();
        let annots = copy.store().get_dict(page).unwrap().get_array("Annots").unwrap().clone();
        let widget = copy.store().resolve(&annots[0]).as_dict().unwrap();
        assert_eq!(widget.get("Parent").and_then(Object::as_reference), copied[0].field);

        let next = copy.store().next_id();
        let duplicate = copy.add_signature_field(
            "Existing",
            Rectangle::from_coords(60.0, 10.0, 90.0, 30.0),
            0,
        );
        assert!(matches!(duplicate, Err(PdfError::DuplicateFieldName(ref n)) if n == "Existing"));
        assert_eq!(copy.store().next_id(), next);

        copy.add_signature_field("Second", Rectangle::from_coords(60.0, 10.0, 90.0, 30.0), 0)
            .unwrap();
        let names: Vec<String> = copy
            .signature_fields()
            .unwrap()
            .into_iter()
            .map(|field| field.name)
            .collect();
        assert_eq!(names, vec!["Existing", "Second"]);

        let catalog = copy.store().get_dict(copy.catalog_id()).unwrap();
        let registry = copy.store().resolve(catalog.get("AcroForm").unwrap()).as_dict().unwrap();
        assert_eq!(registry.get_array("Fields").unwrap().len(), 2);
        assert_eq!(registry.get("SigFlags"), Some(&Object::Integer(3)));
    }

    #[test]
    fn test_copy_without_registry_has_none() {
        let copy = copy_pages(&base_with_text(1)).unwrap();
        let catalog = copy.store().get_dict(copy.catalog_id()).unwrap();
        assert!(catalog.get("AcroForm").is_none());
        assert!(copy.signature_fields().unwrap().is_empty());
    }

    #[test]
    fn test_binary_strings_survive_copy() {
        let bytes: String = (0u8..=255).map(char::from).collect();
        let mut source = Document::new();
        let page = source.add_page(Page::letter()).unwrap();
        source
            .store_mut()
            .get_dict_mut(page)
            .unwrap()
            .set("PieceInfo", Object::String(bytes.clone()));
        let base = BaseDocument::from_bytes(&source.to_bytes().unwrap()).unwrap();

        let copy = copy_pages(&base).unwrap();
        let page = copy.store().get_dict(copy.page_id(0).unwrap()).unwrap();
        assert_eq!(page.get_string("PieceInfo"), Some(bytes.as_str()));
    }

    #[test]
    fn test_annotation_page_links_are_remapped() {
        let mut source = Document::new();
        source.add_page(Page::letter()).unwrap();
        source.add_page(Page::letter()).unwrap();
        source
            .add_signature_field("OnSecond", Rectangle::from_coords(10.0, 10.0, 50.0, 30.0), 1)
            .unwrap();
        let base = BaseDocument::from_bytes(&source.to_bytes().unwrap()).unwrap();

        let copy = copy_pages(&base).unwrap();
        let second = copy.page_id(1).unwrap();
        let annots = copy.store().get_dict(second).unwrap().get_array("Annots").unwrap();
        let widget = copy.store().resolve(&annots[0]).as_dict().unwrap();
        assert_eq!(widget.get("P"), Some(&Object::Reference(second)));

        let parent = copy.store().resolve(widget.get("Parent").unwrap()).as_dict().unwrap();
        assert_eq!(parent.get_string("T"), Some("OnSecond"));
    }

    #[test]
    fn test_inherited_attributes_are_materialized() {
        let pdf = build_inherited_fixture();
        let base = BaseDocument::from_bytes(&pdf).unwrap();
        let copy = copy_pages(&base).unwrap();

        let page = copy.store().get_dict(copy.page_id(0).unwrap()).unwrap();
        assert_eq!(
            Rectangle::from_pdf_array(page.get("MediaBox").unwrap()),
            Some(Rectangle::from_coords(0.0, 0.0, 200.0, 300.0))
        );
        assert_eq!(page.get("Rotate"), Some(&Object::Integer(90)));
        assert!(page.get_dict("Resources").is_some());
    }

    fn build_inherited_fixture() -> Vec<u8> {
        let bodies = [
            "<< /Type /Catalog /Pages 2 0 R >>",
            "<< /Type /Pages /Kids [3 0 R] /Count 1 /MediaBox [0 0 200 300] /Rotate 90 /Resources << >> >>",
            "<< /Type /Page /Parent 2 0 R >>",
        ];
        let mut out = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in bodies.iter().enumerate() {
            offsets.push(out.len());
            out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
        }
        let xref = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", bodies.len() + 1).as_bytes());
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!("trailer\n<< /Size 4 /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n").as_bytes(),
        );
        out
    }
}
