//! Listing the signature fields of a document
//!
//! Works the same over a parsed file and over a document being built: only
//! fields listed in the AcroForm's `/Fields` whose `/FT` is `/Sig` count.

use crate::error::Result;
use crate::geometry::Rectangle;
use crate::objects::{Dictionary, Object, ObjectId};
use crate::parser::PdfReader;
use crate::store::ObjectStore;

const MAX_RESOLVE_DEPTH: usize = 32;

/// A signature field as found in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureFieldInfo {
    /// Partial field name (`/T`), empty when missing
    pub name: String,
    /// Identity of the field object, `None` for a direct entry in `/Fields`
    pub field: Option<ObjectId>,
    /// The field's `/Rect`, else its first widget's
    pub rect: Option<Rectangle>,
    /// Zero-based index of the page the first widget sits on
    pub page_index: Option<usize>,
    /// Number of widgets (`/Kids`)
    pub widget_count: usize,
    /// Whether `/V` holds a signature dictionary
    pub signed: bool,
}

/// Read access to indirect objects, shared by [`ObjectStore`] and [`PdfReader`].
pub(crate) trait ObjectSource {
    fn object(&self, id: ObjectId) -> Option<&Object>;

    /// Follow references until a direct object; dangling chains give `Null`.
    fn follow<'a>(&'a self, object: &'a Object) -> &'a Object {
        let mut current = object;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match current {
                Object::Reference(id) => match self.object(*id) {
                    Some(next) => current = next,
                    None => return &Object::Null,
                },
                direct => return direct,
            }
        }
        &Object::Null
    }
}

impl ObjectSource for ObjectStore {
    fn object(&self, id: ObjectId) -> Option<&Object> {
        self.get(id)
    }
}

impl ObjectSource for PdfReader {
    fn object(&self, id: ObjectId) -> Option<&Object> {
        self.get_object(id)
    }
}

pub(crate) fn signature_fields_in<S: ObjectSource>(
    source: &S,
    catalog: &Dictionary,
    page_ids: &[ObjectId],
) -> Vec<SignatureFieldInfo> {
    let fields = catalog
        .get("AcroForm")
        .and_then(|form| source.follow(form).as_dict())
        .and_then(|form| form.get("Fields"))
        .and_then(|fields| source.follow(fields).as_array());
    let Some(fields) = fields else {
        return Vec::new();
    };

    fields
        .iter()
        .filter_map(|entry| {
            let dict = source.follow(entry).as_dict()?;
            (dict.get_name("FT") == Some("Sig"))
                .then(|| describe(source, entry.as_reference(), dict, page_ids))
        })
        .collect()
}

fn describe<S: ObjectSource>(
    source: &S,
    field: Option<ObjectId>,
    dict: &Dictionary,
    page_ids: &[ObjectId],
) -> SignatureFieldInfo {
    let kids: Vec<&Dictionary> = dict
        .get("Kids")
        .and_then(|kids| source.follow(kids).as_array())
        .map(|kids| {
            kids.iter()
                .filter_map(|kid| source.follow(kid).as_dict())
                .collect()
        })
        .unwrap_or_default();
    // A field without kids is merged with its widget
    let first_widget = kids.first().copied().unwrap_or(dict);

    let rect = [dict, first_widget]
        .iter()
        .find_map(|d| d.get("Rect").map(|r| source.follow(r)))
        .and_then(Rectangle::from_pdf_array);

    let page_index = first_widget
        .get("P")
        .and_then(Object::as_reference)
        .and_then(|page| page_ids.iter().position(|id| *id == page));

    let signed = std::iter::once(dict)
        .chain(kids.iter().copied())
        .any(|d| d.get("V").map(|v| source.follow(v).as_dict().is_some()) == Some(true));

    SignatureFieldInfo {
        name: dict.get_string("T").unwrap_or_default().to_string(),
        field,
        rect,
        page_index,
        widget_count: kids.len(),
        signed,
    }
}

/// Every signature field of `reader`'s AcroForm, in `/Fields` order.
///
/// A document without an AcroForm has none.
pub fn collect_signature_fields(reader: &PdfReader) -> Result<Vec<SignatureFieldInfo>> {
    let catalog = reader.catalog()?;
    let page_ids: Vec<ObjectId> = reader.pages()?.iter().map(|page| page.id).collect();
    Ok(signature_fields_in(reader, catalog, &page_ids))
}

/// The signature field named `name`, if any.
pub fn find_signature_field(reader: &PdfReader, name: &str) -> Result<Option<SignatureFieldInfo>> {
    Ok(collect_signature_fields(reader)?
        .into_iter()
        .find(|field| field.name == name))
}

/// The first signature field that holds no signature yet.
pub fn first_unsigned_signature_field(reader: &PdfReader) -> Result<Option<SignatureFieldInfo>> {
    Ok(collect_signature_fields(reader)?
        .into_iter()
        .find(|field| !field.signed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig_field(store: &mut ObjectStore, name: &str, value: Option<Object>) -> ObjectId {
        let mut dict = Dictionary::new();
        dict.set("FT", Object::name("Sig"));
        dict.set("T", name);
        dict.set("Rect", Rectangle::from_coords(0.0, 0.0, 10.0, 10.0).to_pdf_array());
        if let Some(value) = value {
            dict.set("V", value);
        }
        store.allocate(dict)
    }

    fn catalog_with(store: &mut ObjectStore, fields: Vec<Object>) -> Dictionary {
        let mut form = Dictionary::new();
        form.set("Fields", fields);
        let form = store.allocate(form);
        let mut catalog = Dictionary::new();
        catalog.set("AcroForm", form);
        catalog
    }

    #[test]
    fn test_no_acroform_means_no_fields() {
        let store = ObjectStore::new();
        assert!(signature_fields_in(&store, &Dictionary::new(), &[]).is_empty());
    }

    #[test]
    fn test_only_signature_fields_are_listed() {
        let mut store = ObjectStore::new();
        let sig = sig_field(&mut store, "SignatureField1", None);
        let mut text = Dictionary::new();
        text.set("FT", Object::name("Tx"));
        text.set("T", "Comment");
        let text = store.allocate(text);
        let catalog = catalog_with(&mut store, vec![Object::Reference(text), Object::Reference(sig)]);

        let fields = signature_fields_in(&store, &catalog, &[]);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "SignatureField1");
        assert_eq!(fields[0].field, Some(sig));
        assert_eq!(fields[0].widget_count, 0);
        assert_eq!(fields[0].page_index, None);
    }

    #[test]
    fn test_signed_field_detection() {
        let mut store = ObjectStore::new();
        let mut signature = Dictionary::new();
        signature.set("Type", Object::name("Sig"));
        let signature = store.allocate(signature);
        let signed = sig_field(&mut store, "Signed", Some(Object::Reference(signature)));
        let placeholder = sig_field(&mut store, "Unsigned", Some(Object::Null));
        let catalog = catalog_with(
            &mut store,
            vec![Object::Reference(signed), Object::Reference(placeholder)],
        );

        let fields = signature_fields_in(&store, &catalog, &[]);
        assert!(fields[0].signed);
        assert!(!fields[1].signed);
    }

    #[test]
    fn test_widget_page_and_rect() {
        let mut store = ObjectStore::new();
        let page = store.allocate(Dictionary::new());
        let other_page = store.allocate(Dictionary::new());

        let mut widget = Dictionary::new();
        widget.set("Rect", Rectangle::from_coords(1.0, 2.0, 3.0, 4.0).to_pdf_array());
        widget.set("P", page);
        let widget = store.allocate(widget);

        let mut field = Dictionary::new();
        field.set("FT", Object::name("Sig"));
        field.set("T", "OnSecondPage");
        field.set("Kids", vec![Object::Reference(widget)]);
        let field = store.allocate(field);
        let catalog = catalog_with(&mut store, vec![Object::Reference(field)]);

        let fields = signature_fields_in(&store, &catalog, &[other_page, page]);
        assert_eq!(fields[0].page_index, Some(1));
        assert_eq!(fields[0].widget_count, 1);
        assert_eq!(fields[0].rect, Some(Rectangle::from_coords(1.0, 2.0, 3.0, 4.0)));
    }
}
