//! Interactive form support for signature placeholders

pub mod acro_form;
pub mod inspect;
pub mod signature;

pub use acro_form::{register_field, registered_field_names, registry_id, SigFlags};
pub use inspect::{
    collect_signature_fields, find_signature_field, first_unsigned_signature_field,
    SignatureFieldInfo,
};
pub use signature::{
    create_signature_field, validate_signature_field, AnnotationFlags, SIGNATURE_ANNOTATION_FLAGS,
};
