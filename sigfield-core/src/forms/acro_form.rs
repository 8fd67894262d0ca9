//! Document-level form registry (AcroForm)
//!
//! The AcroForm dictionary hangs off the catalog and lists every top-level
//! field. There is at most one per document; it is created the first time a
//! field is registered and only ever grows afterwards.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId};
use crate::store::ObjectStore;
use bitflags::bitflags;
use tracing::debug;

bitflags! {
    /// Signature flags (`/SigFlags`).
    ///
    /// Per PDF spec Table 219 (Entries in the interactive form dictionary).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SigFlags: u32 {
        /// Bit 1: The document contains at least one signature field
        const SIGNATURES_EXIST = 1 << 0;
        /// Bit 2: Save only with incremental updates
        const APPEND_ONLY = 1 << 1;
    }
}

/// Where the catalog keeps its AcroForm.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Registry {
    Missing,
    Indirect(ObjectId),
    Direct,
}

/// Where an AcroForm keeps its `/Fields` array.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldList {
    Missing,
    Direct,
    Indirect(ObjectId),
}

fn locate_registry(store: &ObjectStore, catalog: ObjectId) -> Result<Registry> {
    match store.expect_dict(catalog, "catalog")?.get("AcroForm") {
        None | Some(Object::Null) => Ok(Registry::Missing),
        Some(Object::Dictionary(_)) => Ok(Registry::Direct),
        Some(Object::Reference(id)) => match store.get(*id) {
            Some(Object::Dictionary(_)) => Ok(Registry::Indirect(*id)),
            _ => Err(PdfError::InvalidStructure(format!(
                "/AcroForm {id} is not a dictionary"
            ))),
        },
        Some(other) => Err(PdfError::InvalidStructure(format!(
            "/AcroForm is a {}",
            other.type_name()
        ))),
    }
}

fn registry_dict<'a>(
    store: &'a ObjectStore,
    catalog: ObjectId,
    registry: Registry,
) -> Option<&'a Dictionary> {
    match registry {
        Registry::Missing => None,
        Registry::Indirect(id) => store.get_dict(id),
        Registry::Direct => store.get_dict(catalog)?.get_dict("AcroForm"),
    }
}

fn locate_fields(store: &ObjectStore, registry: &Dictionary) -> Result<FieldList> {
    match registry.get("Fields") {
        None | Some(Object::Null) => Ok(FieldList::Missing),
        Some(Object::Array(_)) => Ok(FieldList::Direct),
        Some(Object::Reference(id)) => match store.get(*id) {
            Some(Object::Array(_)) => Ok(FieldList::Indirect(*id)),
            _ => Err(PdfError::InvalidStructure(format!(
                "/Fields {id} is not an array"
            ))),
        },
        Some(other) => Err(PdfError::InvalidStructure(format!(
            "/Fields is a {}",
            other.type_name()
        ))),
    }
}

fn field_entries<'a>(store: &'a ObjectStore, registry: &'a Dictionary) -> Result<&'a [Object]> {
    let entries: &[Object] = match locate_fields(store, registry)? {
        FieldList::Missing => &[],
        FieldList::Direct => registry
            .get_array("Fields")
            .map(Vec::as_slice)
            .unwrap_or_default(),
        FieldList::Indirect(id) => store
            .get(id)
            .and_then(Object::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
    };
    Ok(entries)
}

/// Names (`/T`) of the registered fields, in registration order.
///
/// Entries without a name are skipped. A document without an AcroForm has
/// no registered fields.
pub fn registered_field_names(store: &ObjectStore, catalog: ObjectId) -> Result<Vec<String>> {
    let registry = locate_registry(store, catalog)?;
    let Some(dict) = registry_dict(store, catalog, registry) else {
        return Ok(Vec::new());
    };

    Ok(field_entries(store, dict)?
        .iter()
        .filter_map(|entry| store.resolve(entry).as_dict())
        .filter_map(|field| field.get_string("T"))
        .map(str::to_string)
        .collect())
}

/// Identity of the document's AcroForm, if it has an indirect one.
pub fn registry_id(store: &ObjectStore, catalog: ObjectId) -> Result<Option<ObjectId>> {
    Ok(match locate_registry(store, catalog)? {
        Registry::Indirect(id) => Some(id),
        _ => None,
    })
}

/// Add `field` to the document's AcroForm and return the AcroForm's identity.
///
/// The AcroForm is created (as an indirect object linked from the catalog) when
/// the document has none; a direct AcroForm dictionary in the catalog is moved
/// into its own object first. `/SigFlags` is set to
/// `SIGNATURES_EXIST | APPEND_ONLY`.
///
/// A field whose `/T` is already registered is rejected with
/// `DuplicateFieldName` before anything changes.
pub fn register_field(document: &mut Document, field: ObjectId) -> Result<ObjectId> {
    let catalog = document.catalog_id();
    register_in_catalog(document.store_mut(), catalog, field)
}

pub(crate) fn register_in_catalog(
    store: &mut ObjectStore,
    catalog: ObjectId,
    field: ObjectId,
) -> Result<ObjectId> {
    let name = store
        .expect_dict(field, "field")?
        .get_string("T")
        .filter(|name| !name.is_empty())
        .ok_or_else(|| PdfError::InvalidFieldName(String::new()))?
        .to_string();

    // Everything that can fail is checked before the first mutation
    let registry = locate_registry(store, catalog)?;
    if let Some(dict) = registry_dict(store, catalog, registry) {
        locate_fields(store, dict)?;
    }
    if registered_field_names(store, catalog)?.contains(&name) {
        return Err(PdfError::DuplicateFieldName(name));
    }

    let registry_id = match registry {
        Registry::Indirect(id) => id,
        Registry::Missing => {
            let id = store.allocate(Dictionary::new());
            store.expect_dict_mut(catalog, "catalog")?.set("AcroForm", id);
            debug!(registry = %id, "created AcroForm");
            id
        }
        Registry::Direct => {
            let dict = store
                .expect_dict_mut(catalog, "catalog")?
                .remove("AcroForm")
                .unwrap_or_else(|| Object::Dictionary(Dictionary::new()));
            let id = store.allocate(dict);
            store.expect_dict_mut(catalog, "catalog")?.set("AcroForm", id);
            debug!(registry = %id, "moved direct AcroForm into its own object");
            id
        }
    };

    let fields = locate_fields(store, store.expect_dict(registry_id, "AcroForm")?)?;
    match fields {
        FieldList::Indirect(array) => {
            if let Some(entries) = store.get_mut(array).and_then(Object::as_array_mut) {
                entries.push(Object::Reference(field));
            }
        }
        FieldList::Missing | FieldList::Direct => {
            let registry = store.expect_dict_mut(registry_id, "AcroForm")?;
            match registry.get_mut("Fields") {
                Some(Object::Array(entries)) => entries.push(Object::Reference(field)),
                _ => registry.set("Fields", vec![Object::Reference(field)]),
            }
        }
    }

    let flags = SigFlags::SIGNATURES_EXIST | SigFlags::APPEND_ONLY;
    store
        .expect_dict_mut(registry_id, "AcroForm")?
        .set("SigFlags", i64::from(flags.bits()));

    debug!(name = %name, field = %field, registry = %registry_id, "registered field");
    Ok(registry_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ObjectStore, ObjectId) {
        let mut store = ObjectStore::new();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::name("Catalog"));
        let catalog = store.allocate(catalog);
        (store, catalog)
    }

    fn field(store: &mut ObjectStore, name: &str) -> ObjectId {
        let mut dict = Dictionary::new();
        dict.set("FT", Object::name("Sig"));
        dict.set("T", name);
        store.allocate(dict)
    }

    fn fields_of(store: &ObjectStore, registry: ObjectId) -> Vec<Object> {
        let dict = store.get_dict(registry).unwrap();
        store.resolve(dict.get("Fields").unwrap()).as_array().unwrap().clone()
    }

    #[test]
    fn test_first_registration_creates_registry() {
        let (mut store, catalog) = setup();
        let f = field(&mut store, "SignatureField1");

        let registry = register_in_catalog(&mut store, catalog, f).unwrap();

        assert_eq!(
            store.get_dict(catalog).unwrap().get("AcroForm"),
            Some(&Object::Reference(registry))
        );
        assert_eq!(fields_of(&store, registry), vec![Object::Reference(f)]);
        assert_eq!(
            store.get_dict(registry).unwrap().get("SigFlags"),
            Some(&Object::Integer(3))
        );
    }

    #[test]
    fn test_registry_is_reused() {
        let (mut store, catalog) = setup();
        let f1 = field(&mut store, "SignatureField1");
        let f2 = field(&mut store, "SignatureField2");

        let first = register_in_catalog(&mut store, catalog, f1).unwrap();
        let second = register_in_catalog(&mut store, catalog, f2).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            fields_of(&store, first),
            vec![Object::Reference(f1), Object::Reference(f2)]
        );
        assert_eq!(
            registered_field_names(&store, catalog).unwrap(),
            vec!["SignatureField1", "SignatureField2"]
        );
    }

    #[test]
    fn test_sig_flags_are_set_not_accumulated() {
        let (mut store, catalog) = setup();
        let mut acro = Dictionary::new();
        acro.set("Fields", Vec::<Object>::new());
        acro.set("SigFlags", 1);
        let registry = store.allocate(acro);
        store.get_dict_mut(catalog).unwrap().set("AcroForm", registry);

        let f = field(&mut store, "Sig");
        register_in_catalog(&mut store, catalog, f).unwrap();
        assert_eq!(
            store.get_dict(registry).unwrap().get("SigFlags"),
            Some(&Object::Integer(3))
        );
    }

    #[test]
    fn test_duplicate_name_is_rejected_without_mutation() {
        let (mut store, catalog) = setup();
        let f1 = field(&mut store, "SignatureField1");
        let registry = register_in_catalog(&mut store, catalog, f1).unwrap();
        let before = store.get_dict(registry).unwrap().clone();

        let dup = field(&mut store, "SignatureField1");
        let result = register_in_catalog(&mut store, catalog, dup);

        assert!(matches!(result, Err(PdfError::DuplicateFieldName(ref n)) if n == "SignatureField1"));
        assert_eq!(store.get_dict(registry).unwrap(), &before);
    }

    #[test]
    fn test_direct_registry_is_moved_into_object() {
        let (mut store, catalog) = setup();
        let existing = field(&mut store, "Existing");
        let mut acro = Dictionary::new();
        acro.set("Fields", vec![Object::Reference(existing)]);
        acro.set("DA", "/Helv 0 Tf 0 g");
        store.get_dict_mut(catalog).unwrap().set("AcroForm", acro);

        let f = field(&mut store, "Sig");
        let registry = register_in_catalog(&mut store, catalog, f).unwrap();

        let dict = store.get_dict(registry).unwrap();
        assert_eq!(dict.get_string("DA"), Some("/Helv 0 Tf 0 g"));
        assert_eq!(
            fields_of(&store, registry),
            vec![Object::Reference(existing), Object::Reference(f)]
        );
        assert_eq!(registry_id(&store, catalog).unwrap(), Some(registry));
    }

    #[test]
    fn test_indirect_fields_array_is_extended() {
        let (mut store, catalog) = setup();
        let array = store.allocate(Vec::<Object>::new());
        let mut acro = Dictionary::new();
        acro.set("Fields", array);
        let registry = store.allocate(acro);
        store.get_dict_mut(catalog).unwrap().set("AcroForm", registry);

        let f = field(&mut store, "Sig");
        register_in_catalog(&mut store, catalog, f).unwrap();

        assert_eq!(store.get(array), Some(&Object::Array(vec![Object::Reference(f)])));
        assert_eq!(
            store.get_dict(registry).unwrap().get("Fields"),
            Some(&Object::Reference(array))
        );
    }

    #[test]
    fn test_malformed_fields_fail_before_mutation() {
        let (mut store, catalog) = setup();
        let mut acro = Dictionary::new();
        acro.set("Fields", 5);
        store.get_dict_mut(catalog).unwrap().set("AcroForm", acro);
        let before = store.len();

        let f = field(&mut store, "Sig");
        let result = register_in_catalog(&mut store, catalog, f);
        assert!(matches!(result, Err(PdfError::InvalidStructure(_))));
        assert_eq!(store.len(), before + 1);
        assert!(matches!(
            store.get_dict(catalog).unwrap().get("AcroForm"),
            Some(Object::Dictionary(_))
        ));
    }

    #[test]
    fn test_no_registry_means_no_names() {
        let (store, catalog) = setup();
        assert!(registered_field_names(&store, catalog).unwrap().is_empty());
        assert_eq!(registry_id(&store, catalog).unwrap(), None);
    }

    #[test]
    fn test_register_field_on_document() {
        use crate::forms::signature::create_signature_field;
        use crate::geometry::Rectangle;
        use crate::page::Page;

        let mut doc = Document::new();
        let page = doc.add_page(Page::letter()).unwrap();
        let rect = Rectangle::from_coords(61.2, 79.2, 306.0, 158.4);
        let (f, _) = create_signature_field(doc.store_mut(), "SignatureField1", &rect, page).unwrap();

        let registry = register_field(&mut doc, f).unwrap();
        assert_eq!(registry_id(doc.store(), doc.catalog_id()).unwrap(), Some(registry));
        assert!(matches!(
            register_field(&mut doc, f),
            Err(PdfError::DuplicateFieldName(_))
        ));
    }

    #[test]
    fn test_sig_flag_bits() {
        assert_eq!((SigFlags::SIGNATURES_EXIST | SigFlags::APPEND_ONLY).bits(), 3);
    }
}
