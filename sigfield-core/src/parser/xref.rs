//! PDF Cross-Reference Table Parser
//!
//! Parses classic xref tables according to ISO 32000-1 Section 7.5.4,
//! following `/Prev` links through incremental updates.

use super::lexer::{is_whitespace, rfind_subslice, Lexer, Token};
use super::objects::ObjectParser;
use super::{ParseError, ParseResult};
use crate::objects::{Dictionary, Object};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Cross-reference entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct XRefEntry {
    /// Byte offset in the file (for in-use entries)
    pub offset: usize,
    /// Generation number
    pub generation: u16,
    /// Whether this entry is in use
    pub in_use: bool,
}

/// Cross-reference table
#[derive(Debug, Clone)]
pub struct XRefTable {
    entries: BTreeMap<u32, XRefEntry>,
    trailer: Dictionary,
    reconstructed: bool,
}

impl XRefTable {
    /// Parse the table chain of `data`, rebuilding it by scanning when damaged.
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        match Self::parse_chain(data) {
            Ok(table) => Ok(table),
            Err(ParseError::UnsupportedXRefStream) => Err(ParseError::UnsupportedXRefStream),
            Err(err) => {
                warn!(error = %err, "cross-reference table unusable, reconstructing");
                Self::reconstruct(data)
            }
        }
    }

    /// Parse starting at `startxref`, newest section first.
    pub fn parse_chain(data: &[u8]) -> ParseResult<Self> {
        let mut offset = find_startxref(data)?;
        let mut entries = BTreeMap::new();
        let mut trailer: Option<Dictionary> = None;
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(offset) {
                return Err(ParseError::CircularReference);
            }

            let (section, section_trailer) = parse_section(data, offset)?;
            debug!(offset, entries = section.len(), "parsed xref section");

            // Entries from newer sections win
            for (number, entry) in section {
                entries.entry(number).or_insert(entry);
            }

            let prev = section_trailer.get("Prev").and_then(Object::as_integer);
            if trailer.is_none() {
                trailer = Some(section_trailer);
            }

            match prev.and_then(|p| usize::try_from(p).ok()) {
                Some(p) => offset = p,
                None => break,
            }
        }

        let trailer = trailer.ok_or(ParseError::InvalidTrailer)?;
        if !trailer.contains_key("Root") {
            return Err(ParseError::MissingKey("Root".to_string()));
        }

        Ok(Self {
            entries,
            trailer,
            reconstructed: false,
        })
    }

    /// Rebuild the table from `n g obj` headers found anywhere in the file.
    pub fn reconstruct(data: &[u8]) -> ParseResult<Self> {
        let mut entries = BTreeMap::new();
        for (number, generation, offset) in scan_object_headers(data) {
            // Later definitions belong to later incremental updates
            entries.insert(
                number,
                XRefEntry {
                    offset,
                    generation,
                    in_use: true,
                },
            );
        }

        if entries.is_empty() {
            return Err(ParseError::InvalidXRef);
        }

        let mut trailer = rfind_subslice(data, b"trailer")
            .and_then(|pos| {
                let mut lexer = Lexer::at(data, pos);
                lexer.next_token().ok()?;
                match ObjectParser::new(lexer).parse_object().ok()? {
                    Object::Dictionary(dict) => Some(dict),
                    _ => None,
                }
            })
            .unwrap_or_default();

        if !trailer.contains_key("Root") {
            let catalog = entries.iter().find_map(|(number, entry)| {
                let mut parser = ObjectParser::new(Lexer::at(data, entry.offset));
                let (id, object) = parser.parse_indirect_object().ok()?;
                let is_catalog = object
                    .as_dict()
                    .and_then(|d| d.get_name("Type"))
                    .is_some_and(|t| t == "Catalog");
                (is_catalog && id.number() == *number).then_some(id)
            });
            match catalog {
                Some(id) => trailer.set("Root", id),
                None => return Err(ParseError::MissingKey("Root".to_string())),
            }
        }

        let size = entries.keys().next_back().map_or(1, |n| i64::from(*n) + 1);
        trailer.set("Size", size);
        trailer.remove("Prev");

        Ok(Self {
            entries,
            trailer,
            reconstructed: true,
        })
    }

    pub fn get(&self, number: u32) -> Option<&XRefEntry> {
        self.entries.get(&number)
    }

    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    /// Whether the table came from scanning instead of the file's own xref.
    pub fn is_reconstructed(&self) -> bool {
        self.reconstructed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&u32, &XRefEntry)> {
        self.entries.iter()
    }
}

/// Offset named by the last `startxref` in the file
fn find_startxref(data: &[u8]) -> ParseResult<usize> {
    let pos = rfind_subslice(data, b"startxref").ok_or(ParseError::InvalidXRef)?;
    let mut lexer = Lexer::at(data, pos);
    lexer.next_token()?;
    match lexer.next_token()? {
        Token::Integer(offset) => usize::try_from(offset)
            .ok()
            .filter(|o| *o < data.len())
            .ok_or(ParseError::InvalidXRef),
        _ => Err(ParseError::InvalidXRef),
    }
}

/// One `xref ... trailer << >>` section
fn parse_section(data: &[u8], offset: usize) -> ParseResult<(BTreeMap<u32, XRefEntry>, Dictionary)> {
    let mut lexer = Lexer::at(data, offset);

    match lexer.next_token()? {
        Token::XRef => {}
        Token::Integer(_) => {
            // `n g obj` here means a cross-reference stream
            if matches!(lexer.next_token(), Ok(Token::Integer(_)))
                && matches!(lexer.next_token(), Ok(Token::Obj))
            {
                return Err(ParseError::UnsupportedXRefStream);
            }
            return Err(ParseError::InvalidXRef);
        }
        _ => return Err(ParseError::InvalidXRef),
    }

    let mut entries = BTreeMap::new();
    loop {
        match lexer.next_token()? {
            Token::Trailer => break,
            Token::Integer(first) => {
                let count = match lexer.next_token()? {
                    Token::Integer(count) => count,
                    _ => return Err(ParseError::InvalidXRef),
                };
                let first = u32::try_from(first).map_err(|_| ParseError::InvalidXRef)?;
                let count = u32::try_from(count).map_err(|_| ParseError::InvalidXRef)?;

                for i in 0..count {
                    let entry = read_entry(&mut lexer)?;
                    let number = first.checked_add(i).ok_or(ParseError::InvalidXRef)?;
                    entries.insert(number, entry);
                }
            }
            _ => return Err(ParseError::InvalidXRef),
        }
    }

    match ObjectParser::new(lexer).parse_object()? {
        Object::Dictionary(trailer) => Ok((entries, trailer)),
        _ => Err(ParseError::InvalidTrailer),
    }
}

/// `oooooooooo ggggg n|f`
fn read_entry(lexer: &mut Lexer<'_>) -> ParseResult<XRefEntry> {
    let mut field = || {
        lexer.skip_whitespace_and_comments();
        lexer.read_word()
    };
    let offset = field();
    let generation = field();
    let kind = field();

    let offset = offset.parse::<usize>().map_err(|_| ParseError::InvalidXRef)?;
    let generation = generation
        .parse::<u16>()
        .map_err(|_| ParseError::InvalidXRef)?;
    let in_use = match kind.as_str() {
        "n" => true,
        "f" => false,
        _ => return Err(ParseError::InvalidXRef),
    };

    Ok(XRefEntry {
        offset,
        generation,
        in_use,
    })
}

/// Every `n g obj` header with the offset of its first digit
fn scan_object_headers(data: &[u8]) -> Vec<(u32, u16, usize)> {
    let mut found = Vec::new();
    let mut search_from = 0;

    while let Some(rel) = super::lexer::find_subslice(&data[search_from..], b"obj") {
        let keyword = search_from + rel;
        search_from = keyword + 3;

        // Skip `endobj` and words that merely contain "obj"
        let followed_ok = data
            .get(keyword + 3)
            .map_or(true, |c| is_whitespace(*c) || super::lexer::is_delimiter(*c));
        if !followed_ok || keyword == 0 || !is_whitespace(data[keyword - 1]) {
            continue;
        }

        if let Some(header) = header_before(data, keyword) {
            found.push(header);
        }
    }

    found
}

/// Walk back from `obj` over `<generation> <number>`
fn header_before(data: &[u8], keyword: usize) -> Option<(u32, u16, usize)> {
    let skip_ws = |mut p: usize| {
        while p > 0 && is_whitespace(data[p - 1]) {
            p -= 1;
        }
        p
    };
    let digits_back = |end: usize| {
        let mut start = end;
        while start > 0 && data[start - 1].is_ascii_digit() {
            start -= 1;
        }
        (start < end).then_some(start)
    };

    let gen_end = skip_ws(keyword);
    let gen_start = digits_back(gen_end)?;
    if gen_start == 0 || !is_whitespace(data[gen_start - 1]) {
        return None;
    }

    let num_end = skip_ws(gen_start);
    let num_start = digits_back(num_end)?;
    if num_start > 0 && !(is_whitespace(data[num_start - 1]) || data[num_start - 1] == b'>') {
        return None;
    }

    let number = std::str::from_utf8(&data[num_start..num_end]).ok()?.parse().ok()?;
    let generation = std::str::from_utf8(&data[gen_start..gen_end]).ok()?.parse().ok()?;
    Some((number, generation, num_start))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &[u8] = b"%PDF-1.7\n\
1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n\
xref\n0 3\n0000000000 65535 f \n0000000009 00000 n \n0000000058 00000 n \n\
trailer\n<< /Size 3 /Root 1 0 R >>\nstartxref\n110\n%%EOF\n";

    #[test]
    fn test_offsets_in_fixture_are_right() {
        assert!(SIMPLE[9..].starts_with(b"1 0 obj"));
        assert!(SIMPLE[58..].starts_with(b"2 0 obj"));
        assert!(SIMPLE[110..].starts_with(b"xref"));
    }

    #[test]
    fn test_parse_simple_table() {
        let table = XRefTable::parse(SIMPLE).unwrap();
        assert!(!table.is_reconstructed());
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.get(1),
            Some(&XRefEntry {
                offset: 9,
                generation: 0,
                in_use: true
            })
        );
        assert!(!table.get(0).unwrap().in_use);
        assert_eq!(table.trailer().get("Size"), Some(&Object::Integer(3)));
    }

    #[test]
    fn test_broken_startxref_is_reconstructed() {
        let broken = String::from_utf8_lossy(SIMPLE).replace("startxref\n110", "startxref\n999");
        let table = XRefTable::parse(broken.as_bytes()).unwrap();
        assert!(table.is_reconstructed());
        assert_eq!(table.get(1).map(|e| e.offset), Some(9));
        assert_eq!(table.get(2).map(|e| e.offset), Some(58));
        assert_eq!(table.trailer().get("Size"), Some(&Object::Integer(3)));
    }

    #[test]
    fn test_reconstruct_without_trailer_finds_catalog() {
        let data = b"%PDF-1.7\n1 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\n\
2 0 obj\n<< /Type /Catalog /Pages 1 0 R >>\nendobj\n";
        let table = XRefTable::reconstruct(data).unwrap();
        assert_eq!(
            table.trailer().get("Root"),
            Some(&Object::Reference(crate::objects::ObjectId::new(2, 0)))
        );
    }

    #[test]
    fn test_reconstruct_without_objects_fails() {
        assert!(matches!(
            XRefTable::reconstruct(b"%PDF-1.7\nnothing here\n"),
            Err(ParseError::InvalidXRef)
        ));
    }

    #[test]
    fn test_xref_stream_is_reported() {
        let data = b"%PDF-1.7\n5 0 obj\n<< /Type /XRef >>\nstream\nendstream\nendobj\nstartxref\n9\n%%EOF";
        assert!(matches!(
            XRefTable::parse(data),
            Err(ParseError::UnsupportedXRefStream)
        ));
    }

    #[test]
    fn test_scan_skips_endobj() {
        let headers = scan_object_headers(b"\n12 0 obj\n<<>>\nendobj\n13 2 obj null endobj");
        assert_eq!(headers, vec![(12, 0, 1), (13, 2, 22)]);
    }
}
