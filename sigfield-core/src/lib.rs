//! # sigfield
//!
//! Builds PDF test fixtures that carry signature placeholder fields: an
//! unsigned `/Sig` field with one widget annotation, registered in the
//! document's AcroForm and shown on a page.
//!
//! ## Features
//!
//! - **Page content**: text in the standard Type 1 fonts and stroked or filled
//!   rectangles with transparency
//! - **Signature fields**: field and widget linked both ways, attached to a
//!   page's `/Annots` in whatever shape it already has, registered with
//!   `/SigFlags 3`
//! - **Base documents**: pages of an existing PDF copied into a new document
//! - **Parsing**: classic cross-reference tables, `/Prev` chains and
//!   reconstruction of damaged tables
//! - **Atomic output**: files are replaced through a synced temporary file
//!
//! ## Quick Start
//!
//! ```rust
//! use sigfield::{copy_pages, BaseDocument, Color, Font, Page, Rectangle, Result};
//!
//! # fn main() -> Result<()> {
//! let mut page = Page::letter();
//! page.text()
//!     .set_font(Font::HelveticaBold, 22.0)
//!     .at(72.0, 720.0)
//!     .write("Test document");
//! page.graphics()
//!     .set_stroke_color(Color::red())
//!     .rect(61.2, 79.2, 244.8, 95.04)
//!     .stroke();
//!
//! let base = BaseDocument::render([page])?;
//! let mut doc = copy_pages(&base)?;
//! doc.add_signature_field(
//!     "SignatureField1",
//!     Rectangle::from_coords(61.2, 79.2, 306.0, 158.4),
//!     0,
//! )?;
//!
//! let bytes = doc.to_bytes()?;
//! assert!(bytes.starts_with(b"%PDF-1.7"));
//! # Ok(())
//! # }
//! ```

pub mod annotations;
pub mod assembler;
pub mod document;
pub mod error;
pub mod forms;
pub mod geometry;
pub mod graphics;
pub mod objects;
pub mod page;
pub mod parser;
pub mod store;
pub mod text;
pub mod writer;

pub use annotations::{attach_annotation, check_annotation_slot, page_annotations, AnnotationSlot};
pub use assembler::{copy_pages, BaseDocument};
pub use document::{Document, DocumentMetadata};
pub use error::{PdfError, Result};
pub use forms::{
    collect_signature_fields, create_signature_field, find_signature_field,
    first_unsigned_signature_field, register_field, AnnotationFlags, SigFlags, SignatureFieldInfo,
};
pub use geometry::{Point, Rectangle};
pub use graphics::{Color, GraphicsContext};
pub use objects::{Dictionary, Object, ObjectId, Stream};
pub use page::Page;
pub use parser::{ParseError, ParsedPage, PdfReader};
pub use store::ObjectStore;
pub use text::{Font, TextContext};
pub use writer::{persist, PdfWriter};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
