use crate::annotations::{attach_annotation, check_annotation_slot};
use crate::error::{PdfError, Result};
use crate::forms::acro_form::{register_in_catalog, registered_field_names};
use crate::forms::inspect::{signature_fields_in, SignatureFieldInfo};
use crate::forms::signature::create_signature_field;
use crate::geometry::Rectangle;
use crate::objects::{Dictionary, Object, ObjectId, Stream};
use crate::page::Page;
use crate::store::ObjectStore;
use crate::writer::{persist, PdfWriter};
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// A mutable PDF document: the object store plus the catalog and page tree
/// that live in it.
///
/// # Example
///
/// ```rust
/// use sigfield::{Document, Page, Rectangle};
///
/// let mut doc = Document::new();
/// doc.set_title("Signature fixture");
/// doc.add_page(Page::letter())?;
///
/// let rect = Rectangle::from_coords(61.2, 79.2, 306.0, 158.4);
/// doc.add_signature_field("SignatureField1", rect, 0)?;
///
/// let bytes = doc.to_bytes()?;
/// assert!(bytes.starts_with(b"%PDF-1.7"));
/// # Ok::<(), sigfield::PdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    store: ObjectStore,
    catalog_id: ObjectId,
    pages_id: ObjectId,
    page_ids: Vec<ObjectId>,
    metadata: DocumentMetadata,
}

/// Metadata for a PDF document.
#[derive(Debug, Clone)]
pub struct DocumentMetadata {
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Software that created the original document
    pub creator: Option<String>,
    /// Software that produced the PDF
    pub producer: Option<String>,
    /// Date and time the document was created
    pub creation_date: Option<DateTime<Utc>>,
    /// Date and time the document was last modified
    pub modification_date: Option<DateTime<Utc>>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            title: None,
            author: None,
            subject: None,
            keywords: None,
            creator: Some("sigfield".to_string()),
            producer: Some(format!("sigfield v{}", env!("CARGO_PKG_VERSION"))),
            creation_date: Some(now),
            modification_date: Some(now),
        }
    }
}

impl Document {
    /// Creates a new empty PDF document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut store = ObjectStore::new();

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::name("Catalog"));
        let catalog_id = store.allocate(catalog);

        let mut pages = Dictionary::new();
        pages.set("Type", Object::name("Pages"));
        pages.set("Kids", Vec::<Object>::new());
        pages.set("Count", 0);
        let pages_id = store.allocate(pages);

        if let Some(catalog) = store.get_dict_mut(catalog_id) {
            catalog.set("Pages", pages_id);
        }

        Self {
            store,
            catalog_id,
            pages_id,
            page_ids: Vec::new(),
            metadata: DocumentMetadata::default(),
        }
    }

    /// Adds a page to the document and returns the page object's identity.
    ///
    /// The page's content becomes one content stream, Flate-compressed when
    /// the `compression` feature is enabled.
    pub fn add_page(&mut self, page: Page) -> Result<ObjectId> {
        #[allow(unused_mut)]
        let mut content = Stream::new(page.generate_content());
        #[cfg(feature = "compression")]
        content.compress_flate()?;
        let content_id = self.store.allocate(content.into_object());

        let mut page_dict = Dictionary::new();
        page_dict.set("Type", Object::name("Page"));
        page_dict.set("Parent", self.pages_id);
        page_dict.set("MediaBox", page.media_box().to_pdf_array());
        page_dict.set("Resources", page.resources());
        page_dict.set("Contents", content_id);
        let page_id = self.store.allocate(page_dict);

        self.append_page_object(page_id)?;
        Ok(page_id)
    }

    /// Link an already stored page dictionary at the end of the page tree.
    pub(crate) fn append_page_object(&mut self, page_id: ObjectId) -> Result<()> {
        let pages = self.store.expect_dict_mut(self.pages_id, "page tree")?;
        match pages.get_mut("Kids") {
            Some(Object::Array(kids)) => kids.push(Object::Reference(page_id)),
            _ => pages.set("Kids", vec![Object::Reference(page_id)]),
        }
        self.page_ids.push(page_id);
        let count = self.page_ids.len() as i64;
        self.store
            .expect_dict_mut(self.pages_id, "page tree")?
            .set("Count", count);

        debug!(page = %page_id, index = self.page_ids.len() - 1, "added page");
        Ok(())
    }

    /// Gets the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Identity of the page at `index` (zero-based).
    pub fn page_id(&self, index: usize) -> Option<ObjectId> {
        self.page_ids.get(index).copied()
    }

    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    pub fn catalog_id(&self) -> ObjectId {
        self.catalog_id
    }

    pub fn pages_id(&self) -> ObjectId {
        self.pages_id
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    /// Add an unsigned signature field with its widget on page `page_index`.
    ///
    /// Everything that can be rejected is checked first (rectangle, name,
    /// page index, name already registered, shape of the page's `/Annots`),
    /// so a failed call leaves the document exactly as it was.
    ///
    /// Returns `(field, widget)`.
    pub fn add_signature_field(
        &mut self,
        name: &str,
        rect: Rectangle,
        page_index: usize,
    ) -> Result<(ObjectId, ObjectId)> {
        rect.validate()?;
        if name.is_empty() {
            return Err(PdfError::InvalidFieldName(name.to_string()));
        }
        let page = self
            .page_id(page_index)
            .ok_or(PdfError::InvalidPageNumber(page_index))?;
        if registered_field_names(&self.store, self.catalog_id)?
            .iter()
            .any(|existing| existing == name)
        {
            return Err(PdfError::DuplicateFieldName(name.to_string()));
        }
        check_annotation_slot(&self.store, page)?;

        let (field, widget) = create_signature_field(&mut self.store, name, &rect, page)?;
        attach_annotation(&mut self.store, page, widget)?;
        register_in_catalog(&mut self.store, self.catalog_id, field)?;

        Ok((field, widget))
    }

    /// Signature fields registered so far, in registration order.
    pub fn signature_fields(&self) -> Result<Vec<SignatureFieldInfo>> {
        let catalog = self.store.expect_dict(self.catalog_id, "catalog")?;
        Ok(signature_fields_in(&self.store, catalog, &self.page_ids))
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    /// Sets the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.metadata.title = Some(title.into());
    }

    /// Sets the document author.
    pub fn set_author(&mut self, author: impl Into<String>) {
        self.metadata.author = Some(author.into());
    }

    /// Sets the document subject.
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.metadata.subject = Some(subject.into());
    }

    /// Sets the document keywords.
    pub fn set_keywords(&mut self, keywords: impl Into<String>) {
        self.metadata.keywords = Some(keywords.into());
    }

    /// Sets the document creator (software that created the original document).
    pub fn set_creator(&mut self, creator: impl Into<String>) {
        self.metadata.creator = Some(creator.into());
    }

    /// Sets the document producer (software that produced the PDF).
    pub fn set_producer(&mut self, producer: impl Into<String>) {
        self.metadata.producer = Some(producer.into());
    }

    /// Sets the document creation date.
    pub fn set_creation_date(&mut self, date: DateTime<Utc>) {
        self.metadata.creation_date = Some(date);
    }

    /// Sets the document modification date.
    pub fn set_modification_date(&mut self, date: DateTime<Utc>) {
        self.metadata.modification_date = Some(date);
    }

    /// Serializes the document into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Serializes the document into `writer`.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        PdfWriter::new_with_writer(writer).write_document(self)
    }

    /// Saves the document to a file, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the file cannot be written; the previous
    /// file, if any, is left in place.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        persist(path, &self.to_bytes()?)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
