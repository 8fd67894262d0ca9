//! Signature placeholder fields
//!
//! A signature field is a terminal field of type `/Sig` with exactly one
//! widget annotation as its kid. The widget is what a page shows; the field is
//! what the AcroForm lists. Neither carries a value, so the field is unsigned.

use crate::error::{PdfError, Result};
use crate::geometry::Rectangle;
use crate::objects::{Dictionary, Object, ObjectId};
use crate::store::ObjectStore;
use bitflags::bitflags;
use tracing::debug;

bitflags! {
    /// Annotation flags (`/F`).
    ///
    /// Per PDF spec Table 165 (Annotation flags).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AnnotationFlags: u32 {
        /// Bit 1: Do not display if no handler is available
        const INVISIBLE = 1 << 0;
        /// Bit 2: Do not display or print
        const HIDDEN = 1 << 1;
        /// Bit 3: Print when the page is printed
        const PRINT = 1 << 2;
        /// Bit 4: Do not scale with page magnification
        const NO_ZOOM = 1 << 3;
        /// Bit 5: Do not rotate with the page
        const NO_ROTATE = 1 << 4;
        /// Bit 6: Do not display on screen
        const NO_VIEW = 1 << 5;
        /// Bit 7: Do not allow interaction
        const READ_ONLY = 1 << 6;
        /// Bit 8: Do not allow deletion or property changes
        const LOCKED = 1 << 7;
    }
}

/// Flags set on every signature field and widget.
pub const SIGNATURE_ANNOTATION_FLAGS: AnnotationFlags = AnnotationFlags::PRINT;

/// Check what [`create_signature_field`] would check, without allocating.
pub fn validate_signature_field(
    store: &ObjectStore,
    name: &str,
    rect: &Rectangle,
    target_page: ObjectId,
) -> Result<()> {
    rect.validate()?;
    if name.is_empty() {
        return Err(PdfError::InvalidFieldName(name.to_string()));
    }
    store.expect_dict(target_page, "page")?;
    Ok(())
}

/// Allocate a signature field and its widget, linked both ways.
///
/// The widget gets `/P` pointing at `target_page` and `/Parent` pointing at the
/// field; the field gets `/Kids [widget]`. Nothing is allocated when the
/// rectangle, the name or the page is rejected.
///
/// Returns `(field, widget)`.
pub fn create_signature_field(
    store: &mut ObjectStore,
    name: &str,
    rect: &Rectangle,
    target_page: ObjectId,
) -> Result<(ObjectId, ObjectId)> {
    validate_signature_field(store, name, rect, target_page)?;

    let flags = i64::from(SIGNATURE_ANNOTATION_FLAGS.bits());

    let mut widget = Dictionary::new();
    widget.set("Type", Object::name("Annot"));
    widget.set("Subtype", Object::name("Widget"));
    widget.set("FT", Object::name("Sig"));
    widget.set("T", name);
    widget.set("F", flags);
    widget.set("Rect", rect.to_pdf_array());
    widget.set("P", target_page);
    let widget_id = store.allocate(widget);

    let mut field = Dictionary::new();
    field.set("FT", Object::name("Sig"));
    field.set("T", name);
    field.set("F", flags);
    field.set("Rect", rect.to_pdf_array());
    field.set("Kids", vec![Object::Reference(widget_id)]);
    let field_id = store.allocate(field);

    store
        .expect_dict_mut(widget_id, "widget")?
        .set("Parent", field_id);

    debug!(
        name,
        field = %field_id,
        widget = %widget_id,
        page = %target_page,
        "created signature field"
    );
    Ok((field_id, widget_id))
}
