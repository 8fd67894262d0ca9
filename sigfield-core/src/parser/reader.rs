//! PDF Document Reader
//!
//! Loads a whole document into memory: header, cross-reference table and every
//! in-use object. Pages are collected by walking the page tree with inherited
//! attributes applied.

use super::lexer::{find_subslice, is_whitespace, Lexer};
use super::objects::ObjectParser;
use super::xref::XRefTable;
use super::{ParseError, ParseResult};
use crate::geometry::Rectangle;
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Page attributes a page may take from its ancestors (ISO 32000-1 Table 30)
pub const INHERITABLE_KEYS: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// Longest chain of references followed by [`PdfReader::resolve`]
const MAX_RESOLVE_DEPTH: usize = 32;

/// A page from the page tree
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Identity of the page object
    pub id: ObjectId,
    /// The page dictionary as stored
    pub dict: Dictionary,
    /// Inheritable entries found on ancestors and missing from `dict`
    pub inherited: Dictionary,
    /// Effective media box
    pub media_box: Rectangle,
    /// Effective crop box, when one is set
    pub crop_box: Option<Rectangle>,
    /// Effective rotation in degrees
    pub rotation: i64,
}

impl ParsedPage {
    pub fn width(&self) -> f64 {
        self.media_box.width()
    }

    pub fn height(&self) -> f64 {
        self.media_box.height()
    }

    /// Entry from the page itself, else from its ancestors
    pub fn attribute(&self, key: &str) -> Option<&Object> {
        self.dict.get(key).or_else(|| self.inherited.get(key))
    }
}

/// Parsed PDF document
#[derive(Debug, Clone)]
pub struct PdfReader {
    version: String,
    xref: XRefTable,
    objects: BTreeMap<ObjectId, Object>,
}

impl PdfReader {
    /// Open a PDF file from a path
    pub fn open<P: AsRef<Path>>(path: P) -> ParseResult<Self> {
        let data = std::fs::read(path.as_ref())?;
        debug!(path = %path.as_ref().display(), bytes = data.len(), "opened PDF");
        Self::from_bytes(&data)
    }

    /// Parse a complete document held in memory
    pub fn from_bytes(data: &[u8]) -> ParseResult<Self> {
        let version = parse_header(data)?;
        let xref = XRefTable::parse(data)?;

        let resolve_length = |id: ObjectId| -> Option<usize> {
            let entry = xref.get(id.number())?;
            let mut parser = ObjectParser::new(Lexer::at(data, entry.offset));
            match parser.parse_indirect_object().ok()? {
                (found, Object::Integer(n)) if found == id => usize::try_from(n).ok(),
                _ => None,
            }
        };

        let mut objects = BTreeMap::new();
        for (&number, entry) in xref.iter() {
            if !entry.in_use || number == 0 {
                continue;
            }
            let mut parser = ObjectParser::new(Lexer::at(data, entry.offset))
                .with_length_resolver(&resolve_length);
            let (id, object) = parser.parse_indirect_object()?;
            if id.number() != number {
                return Err(ParseError::InvalidReference(number, entry.generation));
            }
            objects.insert(id, object);
        }

        debug!(version = %version, objects = objects.len(), "parsed PDF");
        Ok(Self {
            version,
            xref,
            objects,
        })
    }

    /// Version from the `%PDF-x.y` header
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn trailer(&self) -> &Dictionary {
        self.xref.trailer()
    }

    /// Whether the cross-reference table had to be rebuilt
    pub fn was_reconstructed(&self) -> bool {
        self.xref.is_reconstructed()
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// All objects in identity order
    pub fn objects(&self) -> impl Iterator<Item = (&ObjectId, &Object)> {
        self.objects.iter()
    }

    /// Follow references until a direct object; dangling or cyclic chains
    /// resolve to `Null`.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        let mut current = object;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match current {
                Object::Reference(id) => match self.objects.get(id) {
                    Some(next) => current = next,
                    None => return &Object::Null,
                },
                direct => return direct,
            }
        }
        &Object::Null
    }

    /// Dictionary behind `object`, following references
    pub fn resolve_dict<'a>(&'a self, object: &'a Object) -> Option<&'a Dictionary> {
        self.resolve(object).as_dict()
    }

    /// The document catalog
    pub fn catalog(&self) -> ParseResult<&Dictionary> {
        let root = self
            .trailer()
            .get("Root")
            .ok_or_else(|| ParseError::MissingKey("Root".to_string()))?;
        self.resolve_dict(root).ok_or(ParseError::InvalidTrailer)
    }

    /// The document information dictionary, if any
    pub fn info(&self) -> Option<&Dictionary> {
        self.trailer()
            .get("Info")
            .and_then(|info| self.resolve_dict(info))
    }

    /// Pages in document order
    pub fn pages(&self) -> ParseResult<Vec<ParsedPage>> {
        let root = self
            .catalog()?
            .get("Pages")
            .ok_or_else(|| ParseError::MissingKey("Pages".to_string()))?;
        let root_id = root.as_reference().ok_or_else(|| ParseError::SyntaxError {
            position: 0,
            message: "Catalog /Pages must be an indirect reference".to_string(),
        })?;

        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(root_id, Dictionary::new())];

        while let Some((id, inherited)) = stack.pop() {
            if !visited.insert(id) {
                return Err(ParseError::CircularReference);
            }
            let node = self
                .objects
                .get(&id)
                .and_then(Object::as_dict)
                .ok_or(ParseError::InvalidReference(id.number(), id.generation()))?;

            let mut carried = inherited;
            for key in INHERITABLE_KEYS {
                if let Some(value) = node.get(key) {
                    carried.set(key, value.clone());
                }
            }

            match node.get_name("Type") {
                Some("Pages") => {
                    let kids = node
                        .get("Kids")
                        .map(|kids| self.resolve(kids))
                        .and_then(Object::as_array)
                        .ok_or_else(|| ParseError::MissingKey("Kids".to_string()))?;
                    for kid in kids.iter().rev() {
                        match kid.as_reference() {
                            Some(kid_id) => stack.push((kid_id, carried.clone())),
                            None => warn!(node = %id, "ignoring direct object in /Kids"),
                        }
                    }
                }
                _ => pages.push(self.build_page(id, node, carried)),
            }
        }

        Ok(pages)
    }

    pub fn page_count(&self) -> ParseResult<usize> {
        Ok(self.pages()?.len())
    }

    fn build_page(&self, id: ObjectId, node: &Dictionary, carried: Dictionary) -> ParsedPage {
        let inherited: Dictionary = carried
            .iter()
            .filter(|(key, _)| !node.contains_key(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let lookup = |key: &str| node.get(key).or_else(|| inherited.get(key));
        let rect = |key: &str| lookup(key).and_then(|v| Rectangle::from_pdf_array(self.resolve(v)));

        let media_box = rect("MediaBox").unwrap_or_else(|| {
            warn!(page = %id, "page has no usable /MediaBox, assuming US Letter");
            Rectangle::from_coords(0.0, 0.0, 612.0, 792.0)
        });
        let crop_box = rect("CropBox");
        let rotation = lookup("Rotate")
            .and_then(|v| self.resolve(v).as_integer())
            .unwrap_or(0);

        ParsedPage {
            id,
            dict: node.clone(),
            inherited,
            media_box,
            crop_box,
            rotation,
        }
    }
}

/// Version string from `%PDF-x.y`, which must appear within the first 1024 bytes
fn parse_header(data: &[u8]) -> ParseResult<String> {
    let window = &data[..data.len().min(1024)];
    let start = find_subslice(window, b"%PDF-").ok_or(ParseError::InvalidHeader)? + 5;
    let version: String = data[start..]
        .iter()
        .take_while(|c| !is_whitespace(**c) && **c != b'%')
        .map(|&c| c as char)
        .collect();

    let valid = version
        .split_once('.')
        .is_some_and(|(major, minor)| {
            !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
        });
    if valid {
        Ok(version)
    } else {
        Err(ParseError::InvalidHeader)
    }
}
