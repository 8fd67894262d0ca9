#[cfg(feature = "compression")]
use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object};

/// Stream under construction; `Length` always tracks the current payload.
#[derive(Debug, Clone)]
pub struct Stream {
    dictionary: Dictionary,
    data: Vec<u8>,
}

impl Stream {
    pub fn new(data: Vec<u8>) -> Self {
        Self::with_dictionary(Dictionary::new(), data)
    }

    pub fn with_dictionary(dictionary: Dictionary, data: Vec<u8>) -> Self {
        let mut dict = dictionary;
        dict.set("Length", data.len() as i64);

        Self {
            dictionary: dict,
            data,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn set_filter(&mut self, filter: &str) {
        self.dictionary.set("Filter", Object::name(filter));
    }

    #[cfg(feature = "compression")]
    pub fn compress_flate(&mut self) -> Result<()> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&self.data)
            .map_err(|e| PdfError::CompressionError(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| PdfError::CompressionError(e.to_string()))?;

        self.data = compressed;
        self.dictionary.set("Length", self.data.len() as i64);
        self.set_filter("FlateDecode");

        Ok(())
    }

    pub fn into_object(self) -> Object {
        Object::Stream(self.dictionary, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_new_sets_length() {
        let stream = Stream::new(vec![1, 2, 3, 4, 5]);
        assert_eq!(stream.data(), &[1, 2, 3, 4, 5]);
        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(5)));
    }

    #[test]
    fn test_with_dictionary_keeps_entries() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::name("XObject"));
        let stream = Stream::with_dictionary(dict, vec![0xFF, 0xD8]);

        assert_eq!(stream.dictionary().get_name("Type"), Some("XObject"));
        assert_eq!(stream.dictionary().get("Length"), Some(&Object::Integer(2)));
    }

    #[test]
    fn test_into_object() {
        let object = Stream::new(b"q Q".to_vec()).into_object();
        match object {
            Object::Stream(dict, data) => {
                assert_eq!(data, b"q Q");
                assert_eq!(dict.get("Length"), Some(&Object::Integer(3)));
            }
            other => panic!("expected stream, got {}", other.type_name()),
        }
    }

    #[cfg(feature = "compression")]
    #[test]
    fn test_compress_flate_roundtrip() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let payload = b"BT /Helvetica 12 Tf 72 720 Td (Hello) Tj ET\n".repeat(20);
        let mut stream = Stream::new(payload.clone());
        stream.compress_flate().unwrap();

        assert_eq!(stream.dictionary().get_name("Filter"), Some("FlateDecode"));
        assert_eq!(
            stream.dictionary().get("Length"),
            Some(&Object::Integer(stream.data().len() as i64))
        );
        assert!(stream.data().len() < payload.len());

        let mut decoded = Vec::new();
        ZlibDecoder::new(stream.data())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, payload);
    }
}
