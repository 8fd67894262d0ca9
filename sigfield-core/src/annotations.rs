//! Page annotation lists
//!
//! A page's `/Annots` entry shows up in several shapes in real files: absent,
//! a direct array, a reference to an array object, or a lone annotation that
//! was never wrapped in an array. Attaching a new annotation keeps whatever
//! is already there, in order.

use crate::error::{PdfError, Result};
use crate::objects::{Object, ObjectId};
use crate::store::ObjectStore;
use tracing::debug;

/// Shape of a page's `/Annots` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationSlot {
    /// No entry, or `null`
    Absent,
    /// An array stored in the page dictionary
    DirectArray,
    /// A reference to an array object
    IndirectArray(ObjectId),
    /// A single annotation, direct or by reference, not in an array
    Single(Object),
}

/// Classify `page`'s `/Annots` without changing anything.
pub fn check_annotation_slot(store: &ObjectStore, page: ObjectId) -> Result<AnnotationSlot> {
    let page_dict = store.expect_dict(page, "page")?;

    let slot = match page_dict.get("Annots") {
        None | Some(Object::Null) => AnnotationSlot::Absent,
        Some(Object::Array(_)) => AnnotationSlot::DirectArray,
        Some(single @ Object::Dictionary(_)) => AnnotationSlot::Single(single.clone()),
        Some(Object::Reference(target)) => match store.get(*target) {
            Some(Object::Array(_)) => AnnotationSlot::IndirectArray(*target),
            Some(Object::Dictionary(_)) => AnnotationSlot::Single(Object::Reference(*target)),
            Some(other) => {
                return Err(PdfError::MalformedAnnotationList(format!(
                    "page {page}: /Annots refers to a {}",
                    other.type_name()
                )))
            }
            None => {
                return Err(PdfError::MalformedAnnotationList(format!(
                    "page {page}: /Annots refers to missing object {target}"
                )))
            }
        },
        Some(other) => {
            return Err(PdfError::MalformedAnnotationList(format!(
                "page {page}: /Annots is a {}",
                other.type_name()
            )))
        }
    };

    Ok(slot)
}

/// Add `annotation` to the end of `page`'s annotation list.
///
/// On error the page and any referenced array are left untouched.
pub fn attach_annotation(store: &mut ObjectStore, page: ObjectId, annotation: ObjectId) -> Result<()> {
    let slot = check_annotation_slot(store, page)?;
    let entry = Object::Reference(annotation);

    match &slot {
        AnnotationSlot::Absent => {
            store
                .expect_dict_mut(page, "page")?
                .set("Annots", vec![entry]);
        }
        AnnotationSlot::DirectArray => {
            if let Some(Object::Array(annots)) = store.expect_dict_mut(page, "page")?.get_mut("Annots") {
                annots.push(entry);
            }
        }
        AnnotationSlot::IndirectArray(target) => {
            if let Some(annots) = store.get_mut(*target).and_then(Object::as_array_mut) {
                annots.push(entry);
            }
        }
        AnnotationSlot::Single(existing) => {
            store
                .expect_dict_mut(page, "page")?
                .set("Annots", vec![existing.clone(), entry]);
        }
    }

    debug!(page = %page, annotation = %annotation, slot = ?slot, "attached annotation");
    Ok(())
}

/// Annotation entries of `page` in order, whatever shape `/Annots` has.
pub fn page_annotations(store: &ObjectStore, page: ObjectId) -> Result<Vec<Object>> {
    let annots = store
        .expect_dict(page, "page")?
        .get("Annots")
        .cloned()
        .unwrap_or(Object::Null);

    Ok(match check_annotation_slot(store, page)? {
        AnnotationSlot::Absent => Vec::new(),
        AnnotationSlot::DirectArray => annots.as_array().cloned().unwrap_or_default(),
        AnnotationSlot::IndirectArray(target) => store
            .get(target)
            .and_then(Object::as_array)
            .cloned()
            .unwrap_or_default(),
        AnnotationSlot::Single(existing) => vec![existing],
    })
}
