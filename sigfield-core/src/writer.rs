use crate::document::{Document, DocumentMetadata};
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Serializes a [`Document`] as PDF 1.7 with a classic cross-reference table.
pub struct PdfWriter<W: Write> {
    writer: W,
    xref_positions: BTreeMap<ObjectId, u64>,
    current_position: u64,
}

impl<W: Write> PdfWriter<W> {
    pub fn new_with_writer(writer: W) -> Self {
        Self {
            writer,
            xref_positions: BTreeMap::new(),
            current_position: 0,
        }
    }

    /// Write header, every stored object in identity order, the information
    /// dictionary, the xref table and the trailer.
    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        let store = document.store();

        // The body is assembled first so the file identifier can be derived from it
        let mut body = Vec::new();
        write_header(&mut body);
        for (id, object) in store.iter() {
            self.record_object(&mut body, *id, object);
        }
        let info_id = store.next_id();
        let info = Object::Dictionary(info_dictionary(document.metadata()));
        self.record_object(&mut body, info_id, &info);

        let digest = md5::compute(&body);
        self.write_bytes(&body)?;

        let xref_position = self.current_position;
        self.write_xref()?;
        self.write_trailer(document.catalog_id(), info_id, &digest.0, xref_position)?;

        self.writer.flush()?;
        debug!(
            objects = self.xref_positions.len(),
            bytes = self.current_position,
            "serialized document"
        );
        Ok(())
    }

    fn record_object(&mut self, body: &mut Vec<u8>, id: ObjectId, object: &Object) {
        self.xref_positions
            .insert(id, self.current_position + body.len() as u64);
        write_object(body, id, object);
    }

    fn write_xref(&mut self) -> Result<()> {
        let max_obj_num = self
            .xref_positions
            .keys()
            .map(ObjectId::number)
            .max()
            .unwrap_or(0);
        let by_number: BTreeMap<u32, (u16, u64)> = self
            .xref_positions
            .iter()
            .map(|(id, pos)| (id.number(), (id.generation(), *pos)))
            .collect();

        let mut table = String::new();
        table.push_str("xref\n");
        table.push_str(&format!("0 {}\n", max_obj_num + 1));
        table.push_str("0000000000 65535 f \n");
        for obj_num in 1..=max_obj_num {
            match by_number.get(&obj_num) {
                Some((generation, position)) => {
                    table.push_str(&format!("{position:010} {generation:05} n \n"));
                }
                None => table.push_str("0000000000 00000 f \n"),
            }
        }

        self.write_bytes(table.as_bytes())
    }

    fn write_trailer(
        &mut self,
        catalog_id: ObjectId,
        info_id: ObjectId,
        file_id: &[u8],
        xref_position: u64,
    ) -> Result<()> {
        let max_obj_num = self
            .xref_positions
            .keys()
            .map(ObjectId::number)
            .max()
            .unwrap_or(0);

        let mut trailer = Dictionary::new();
        trailer.set("Size", Object::Integer(i64::from(max_obj_num) + 1));
        trailer.set("Root", Object::Reference(catalog_id));
        trailer.set("Info", Object::Reference(info_id));

        let mut out = Vec::new();
        out.extend_from_slice(b"trailer\n<<");
        for (key, value) in trailer.iter() {
            out.extend_from_slice(b"\n/");
            write_name_body(&mut out, key);
            out.push(b' ');
            write_value(&mut out, value);
        }
        let hex = hex_string(file_id);
        out.extend_from_slice(format!("\n/ID [{hex} {hex}]\n>>").as_bytes());
        out.extend_from_slice(format!("\nstartxref\n{xref_position}\n%%EOF\n").as_bytes());

        self.write_bytes(&out)
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.current_position += data.len() as u64;
        Ok(())
    }
}

fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(b"%PDF-1.7\n");
    // Binary comment to ensure file is treated as binary
    out.extend_from_slice(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n']);
}

fn write_object(out: &mut Vec<u8>, id: ObjectId, object: &Object) {
    out.extend_from_slice(format!("{} {} obj\n", id.number(), id.generation()).as_bytes());
    write_value(out, object);
    out.extend_from_slice(b"\nendobj\n");
}

/// Serialize one value in PDF syntax.
pub(crate) fn write_value(out: &mut Vec<u8>, object: &Object) {
    match object {
        Object::Null => out.extend_from_slice(b"null"),
        Object::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        Object::Real(f) => out.extend_from_slice(format_real(*f).as_bytes()),
        Object::String(s) => write_string(out, s),
        Object::Name(n) => {
            out.push(b'/');
            write_name_body(out, n);
        }
        Object::Array(arr) => {
            out.push(b'[');
            for (i, obj) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                write_value(out, obj);
            }
            out.push(b']');
        }
        Object::Dictionary(dict) => write_dictionary(out, dict),
        Object::Stream(dict, data) => {
            let mut dict = dict.clone();
            dict.set("Length", data.len() as i64);
            write_dictionary(out, &dict);
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(data);
            out.extend_from_slice(b"\nendstream");
        }
        Object::Reference(id) => {
            out.extend_from_slice(format!("{} {} R", id.number(), id.generation()).as_bytes());
        }
    }
}

fn write_dictionary(out: &mut Vec<u8>, dict: &Dictionary) {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        out.extend_from_slice(b"\n/");
        write_name_body(out, key);
        out.push(b' ');
        write_value(out, value);
    }
    out.extend_from_slice(b"\n>>");
}

fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let formatted = format!("{value:.6}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Text made of characters up to U+00FF becomes a literal string, one byte
/// per character; anything else a UTF-16BE hex string with a byte order mark.
fn write_string(out: &mut Vec<u8>, text: &str) {
    let bytes: Option<Vec<u8>> = text.chars().map(|ch| u8::try_from(ch).ok()).collect();
    match bytes {
        Some(bytes) if !bytes.starts_with(&[0xFE, 0xFF]) => {
            out.push(b'(');
            for byte in bytes {
                match byte {
                    b'(' | b')' | b'\\' => {
                        out.push(b'\\');
                        out.push(byte);
                    }
                    b'\n' => out.extend_from_slice(b"\\n"),
                    b'\r' => out.extend_from_slice(b"\\r"),
                    b'\t' => out.extend_from_slice(b"\\t"),
                    0x20..=0x7E => out.push(byte),
                    _ => out.extend_from_slice(format!("\\{byte:03o}").as_bytes()),
                }
            }
            out.push(b')');
        }
        _ => {
            let mut bytes = vec![0xFE, 0xFF];
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            out.extend_from_slice(hex_string(&bytes).as_bytes());
        }
    }
}

/// Name characters outside the regular printable range, delimiters and `#`
/// are written as `#xx`.
fn write_name_body(out: &mut Vec<u8>, name: &str) {
    for ch in name.chars() {
        let mut buf = [0u8; 4];
        let bytes: &[u8] = match u8::try_from(u32::from(ch)) {
            Ok(byte) => {
                buf[0] = byte;
                &buf[..1]
            }
            Err(_) => ch.encode_utf8(&mut buf).as_bytes(),
        };
        for &byte in bytes {
            let regular = matches!(byte, 0x21..=0x7E)
                && !matches!(
                    byte,
                    b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%' | b'#'
                );
            if regular {
                out.push(byte);
            } else {
                out.extend_from_slice(format!("#{byte:02X}").as_bytes());
            }
        }
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2 + 2);
    hex.push('<');
    for byte in bytes {
        hex.push_str(&format!("{byte:02X}"));
    }
    hex.push('>');
    hex
}

fn info_dictionary(metadata: &DocumentMetadata) -> Dictionary {
    let mut info_dict = Dictionary::new();

    if let Some(ref title) = metadata.title {
        info_dict.set("Title", Object::String(title.clone()));
    }
    if let Some(ref author) = metadata.author {
        info_dict.set("Author", Object::String(author.clone()));
    }
    if let Some(ref subject) = metadata.subject {
        info_dict.set("Subject", Object::String(subject.clone()));
    }
    if let Some(ref keywords) = metadata.keywords {
        info_dict.set("Keywords", Object::String(keywords.clone()));
    }
    if let Some(ref creator) = metadata.creator {
        info_dict.set("Creator", Object::String(creator.clone()));
    }
    if let Some(ref producer) = metadata.producer {
        info_dict.set("Producer", Object::String(producer.clone()));
    }
    if let Some(creation_date) = metadata.creation_date {
        info_dict.set("CreationDate", Object::String(format_pdf_date(creation_date)));
    }
    if let Some(mod_date) = metadata.modification_date {
        info_dict.set("ModDate", Object::String(format_pdf_date(mod_date)));
    }

    info_dict
}

/// Format a DateTime as a PDF date string (D:YYYYMMDDHHmmSSOHH'mm)
fn format_pdf_date(date: DateTime<Utc>) -> String {
    let formatted = date.format("D:%Y%m%d%H%M%S");

    // For UTC, the offset is always +00'00
    format!("{formatted}+00'00")
}

/// Write `bytes` to `path` so that readers see either the old file or the
/// complete new one.
///
/// Missing parent directories are created. The bytes go to a temporary file
/// next to the destination which is flushed, synced and renamed over it. On
/// failure the temporary file is removed and the destination is untouched.
pub fn persist(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let storage_failure = |source: std::io::Error| PdfError::StorageFailure {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(storage_failure)?;
    }

    let temp = temp_path(path);
    let result = write_synced(&temp, bytes).and_then(|()| fs::rename(&temp, path));
    if let Err(source) = result {
        let _ = fs::remove_file(&temp);
        return Err(storage_failure(source));
    }

    info!(path = %path.display(), bytes = bytes.len(), "wrote PDF");
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.flush()?;
    file.sync_all()
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}
