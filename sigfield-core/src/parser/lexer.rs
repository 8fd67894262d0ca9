//! PDF Lexer
//!
//! Tokenizes PDF syntax according to ISO 32000-1 Section 7.2. The lexer works
//! over an in-memory buffer so callers can jump to byte offsets taken from the
//! cross-reference table.

use super::{ParseError, ParseResult};

/// PDF Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Boolean: true or false
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Real number
    Real(f64),

    /// String (literal or hexadecimal), raw bytes
    String(Vec<u8>),

    /// Name object (e.g., /Type), `#xx` escapes already decoded
    Name(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,

    /// Stream keyword
    Stream,

    /// Endstream keyword
    EndStream,

    /// Obj keyword
    Obj,

    /// Endobj keyword
    EndObj,

    /// Reference operator R
    R,

    /// Xref keyword
    XRef,

    /// Trailer keyword
    Trailer,

    /// StartXRef keyword
    StartXRef,

    /// Null object
    Null,

    /// End of input
    Eof,
}

impl Token {
    /// Short label used in `UnexpectedToken` errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Boolean(b) => b.to_string(),
            Token::Integer(i) => i.to_string(),
            Token::Real(r) => r.to_string(),
            Token::String(_) => "string".to_string(),
            Token::Name(n) => format!("/{n}"),
            Token::ArrayStart => "[".to_string(),
            Token::ArrayEnd => "]".to_string(),
            Token::DictStart => "<<".to_string(),
            Token::DictEnd => ">>".to_string(),
            Token::Stream => "stream".to_string(),
            Token::EndStream => "endstream".to_string(),
            Token::Obj => "obj".to_string(),
            Token::EndObj => "endobj".to_string(),
            Token::R => "R".to_string(),
            Token::XRef => "xref".to_string(),
            Token::Trailer => "trailer".to_string(),
            Token::StartXRef => "startxref".to_string(),
            Token::Null => "null".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

pub(crate) fn is_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C' | b'\0')
}

pub(crate) fn is_delimiter(ch: u8) -> bool {
    matches!(
        ch,
        b'/' | b'<' | b'>' | b'[' | b']' | b'(' | b')' | b'{' | b'}' | b'%'
    )
}

/// PDF Lexer for tokenizing PDF content
pub struct Lexer<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer at the start of `data`
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a lexer positioned at `offset`
    pub fn at(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            position: offset.min(data.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Get the next token
    pub fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace_and_comments();

        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        match ch {
            b'/' => self.read_name(),
            b'(' => self.read_literal_string(),
            b'<' => self.read_angle_bracket(),
            b'>' => {
                self.consume_char();
                if self.peek_char() == Some(b'>') {
                    self.consume_char();
                    Ok(Token::DictEnd)
                } else {
                    Err(self.syntax_error("Expected '>' after '>'"))
                }
            }
            b'[' => {
                self.consume_char();
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.consume_char();
                Ok(Token::ArrayEnd)
            }
            b'+' | b'-' | b'0'..=b'9' | b'.' => self.read_number(),
            _ if ch.is_ascii_alphabetic() => self.read_keyword(),
            _ => Err(self.syntax_error(&format!("Unexpected character: {}", ch as char))),
        }
    }

    /// Look at the next token without consuming it
    pub fn peek_token(&mut self) -> ParseResult<Token> {
        let saved = self.position;
        let token = self.next_token();
        self.position = saved;
        token
    }

    fn peek_char(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    fn consume_char(&mut self) -> Option<u8> {
        let ch = self.peek_char();
        if ch.is_some() {
            self.position += 1;
        }
        ch
    }

    fn syntax_error(&self, message: &str) -> ParseError {
        ParseError::SyntaxError {
            position: self.position,
            message: message.to_string(),
        }
    }

    /// Skip whitespace and `%` comments
    pub fn skip_whitespace_and_comments(&mut self) {
        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) {
                self.consume_char();
            } else if ch == b'%' {
                while let Some(c) = self.peek_char() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.consume_char();
                }
            } else {
                break;
            }
        }
    }

    /// Read a name object (e.g., /Type)
    fn read_name(&mut self) -> ParseResult<Token> {
        self.consume_char(); // '/'
        let mut name = String::new();

        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.consume_char();

            if ch == b'#' {
                let hex = self
                    .data
                    .get(self.position..self.position + 2)
                    .and_then(|pair| std::str::from_utf8(pair).ok())
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or_else(|| self.syntax_error("Invalid hex code in name"))?;
                self.position += 2;
                name.push(hex as char);
            } else {
                name.push(ch as char);
            }
        }

        Ok(Token::Name(name))
    }

    /// Read a literal string (parentheses)
    fn read_literal_string(&mut self) -> ParseResult<Token> {
        self.consume_char(); // '('
        let mut string = Vec::new();
        let mut depth = 1;

        loop {
            let ch = self
                .consume_char()
                .ok_or_else(|| self.syntax_error("Unterminated string"))?;

            match ch {
                b'\\' => {
                    let escaped = self
                        .consume_char()
                        .ok_or_else(|| self.syntax_error("Unterminated string"))?;
                    match escaped {
                        b'n' => string.push(b'\n'),
                        b'r' => string.push(b'\r'),
                        b't' => string.push(b'\t'),
                        b'b' => string.push(b'\x08'),
                        b'f' => string.push(b'\x0C'),
                        b'0'..=b'7' => {
                            let mut value = u32::from(escaped - b'0');
                            for _ in 0..2 {
                                match self.peek_char() {
                                    Some(next @ b'0'..=b'7') => {
                                        self.consume_char();
                                        value = value * 8 + u32::from(next - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            string.push((value & 0xFF) as u8);
                        }
                        // Line continuation
                        b'\r' => {
                            if self.peek_char() == Some(b'\n') {
                                self.consume_char();
                            }
                        }
                        b'\n' => {}
                        other => string.push(other),
                    }
                }
                b'(' => {
                    depth += 1;
                    string.push(ch);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    string.push(ch);
                }
                _ => string.push(ch),
            }
        }

        Ok(Token::String(string))
    }

    /// Read angle bracket tokens (hex strings or dict markers)
    fn read_angle_bracket(&mut self) -> ParseResult<Token> {
        self.consume_char(); // '<'

        if self.peek_char() == Some(b'<') {
            self.consume_char();
            return Ok(Token::DictStart);
        }

        let mut digits = Vec::new();
        loop {
            let ch = self
                .consume_char()
                .ok_or_else(|| self.syntax_error("Unterminated hex string"))?;
            if ch == b'>' {
                break;
            }
            if let Some(value) = (ch as char).to_digit(16) {
                digits.push(value as u8);
            } else if !is_whitespace(ch) {
                return Err(self.syntax_error("Invalid character in hex string"));
            }
        }

        // Odd digit count: the final digit is followed by an implicit 0
        if digits.len() % 2 != 0 {
            digits.push(0);
        }

        let bytes = digits.chunks(2).map(|pair| pair[0] << 4 | pair[1]).collect();
        Ok(Token::String(bytes))
    }

    /// Read a number (integer or real)
    fn read_number(&mut self) -> ParseResult<Token> {
        let start = self.position;
        let mut has_dot = false;

        if matches!(self.peek_char(), Some(b'+' | b'-')) {
            self.consume_char();
        }

        while let Some(ch) = self.peek_char() {
            match ch {
                b'0'..=b'9' => {
                    self.consume_char();
                }
                b'.' if !has_dot => {
                    self.consume_char();
                    has_dot = true;
                }
                _ => break,
            }
        }

        let text = std::str::from_utf8(&self.data[start..self.position])
            .map_err(|_| self.syntax_error("Invalid number"))?;

        if has_dot {
            // "5." and ".5" are both valid PDF reals
            let normalized = match text {
                t if t.ends_with('.') => format!("{t}0"),
                t => t.to_string(),
            };
            normalized
                .parse::<f64>()
                .map(Token::Real)
                .map_err(|_| self.syntax_error(&format!("Invalid real number: '{text}'")))
        } else {
            text.parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| self.syntax_error(&format!("Invalid integer: '{text}'")))
        }
    }

    /// Read a keyword
    fn read_keyword(&mut self) -> ParseResult<Token> {
        let word = self.read_word();
        match word.as_str() {
            "true" => Ok(Token::Boolean(true)),
            "false" => Ok(Token::Boolean(false)),
            "null" => Ok(Token::Null),
            "obj" => Ok(Token::Obj),
            "endobj" => Ok(Token::EndObj),
            "stream" => Ok(Token::Stream),
            "endstream" => Ok(Token::EndStream),
            "R" => Ok(Token::R),
            "xref" => Ok(Token::XRef),
            "trailer" => Ok(Token::Trailer),
            "startxref" => Ok(Token::StartXRef),
            _ => Err(self.syntax_error(&format!("Unknown keyword: {word}"))),
        }
    }

    /// Read a word (sequence of non-delimiter characters)
    pub(crate) fn read_word(&mut self) -> String {
        let start = self.position;
        while let Some(ch) = self.peek_char() {
            if is_whitespace(ch) || is_delimiter(ch) {
                break;
            }
            self.consume_char();
        }
        String::from_utf8_lossy(&self.data[start..self.position]).into_owned()
    }

    /// Skip the end-of-line marker that follows the `stream` keyword
    pub fn skip_stream_eol(&mut self) {
        match self.peek_char() {
            Some(b'\r') => {
                self.consume_char();
                if self.peek_char() == Some(b'\n') {
                    self.consume_char();
                }
            }
            Some(b'\n') => {
                self.consume_char();
            }
            _ => {}
        }
    }

    /// Read exactly n bytes
    pub fn read_bytes(&mut self, n: usize) -> ParseResult<&'a [u8]> {
        let end = self
            .position
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| self.syntax_error("Stream extends past end of file"))?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    /// Offset of the next `endstream` keyword at or after the current position
    pub fn find_endstream(&self) -> Option<usize> {
        find_subslice(&self.data[self.position..], b"endstream").map(|i| self.position + i)
    }
}

/// Position of the first occurrence of `needle` in `haystack`
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Position of the last occurrence of `needle` in `haystack`
pub(crate) fn rfind_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                break;
            }
            out.push(token);
        }
        out
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            tokens(b"<< /Type /Annot /F 4 /Rect [61.2 79.2 306 158.4] >>"),
            vec![
                Token::DictStart,
                Token::Name("Type".to_string()),
                Token::Name("Annot".to_string()),
                Token::Name("F".to_string()),
                Token::Integer(4),
                Token::Name("Rect".to_string()),
                Token::ArrayStart,
                Token::Real(61.2),
                Token::Real(79.2),
                Token::Integer(306),
                Token::Real(158.4),
                Token::ArrayEnd,
                Token::DictEnd,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens(b"true false null obj endobj R xref trailer startxref"),
            vec![
                Token::Boolean(true),
                Token::Boolean(false),
                Token::Null,
                Token::Obj,
                Token::EndObj,
                Token::R,
                Token::XRef,
                Token::Trailer,
                Token::StartXRef,
            ]
        );
    }

    #[test]
    fn test_unknown_keyword() {
        let mut lexer = Lexer::new(b"bogus");
        assert!(matches!(
            lexer.next_token(),
            Err(ParseError::SyntaxError { .. })
        ));
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            tokens(b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n1 0 obj"),
            vec![Token::Integer(1), Token::Integer(0), Token::Obj]
        );
    }

    #[test]
    fn test_literal_string_escapes() {
        assert_eq!(
            tokens(b"(a\\(b\\)c\\\\d\\n\\101 (nested))"),
            vec![Token::String(b"a(b)c\\d\nA (nested)".to_vec())]
        );
    }

    #[test]
    fn test_literal_string_line_continuation() {
        assert_eq!(tokens(b"(abc\\\ndef)"), vec![Token::String(b"abcdef".to_vec())]);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new(b"(never closed");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_hex_strings() {
        assert_eq!(
            tokens(b"<FEFF0041> <48 65 6C> <7>"),
            vec![
                Token::String(vec![0xFE, 0xFF, 0x00, 0x41]),
                Token::String(vec![0x48, 0x65, 0x6C]),
                Token::String(vec![0x70]),
            ]
        );
    }

    #[test]
    fn test_name_hex_escape() {
        assert_eq!(
            tokens(b"/A#20B /Sig#2F1"),
            vec![Token::Name("A B".to_string()), Token::Name("Sig/1".to_string())]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens(b"-12 +7 .5 5. -0.25 0"),
            vec![
                Token::Integer(-12),
                Token::Integer(7),
                Token::Real(0.5),
                Token::Real(5.0),
                Token::Real(-0.25),
                Token::Integer(0),
            ]
        );
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::new(b"12 0 R");
        assert_eq!(lexer.peek_token().unwrap(), Token::Integer(12));
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(12));
        assert_eq!(lexer.next_token().unwrap(), Token::Integer(0));
        assert_eq!(lexer.next_token().unwrap(), Token::R);
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn test_read_bytes_bounds() {
        let mut lexer = Lexer::new(b"abcdef");
        assert_eq!(lexer.read_bytes(3).unwrap(), b"abc");
        assert!(lexer.read_bytes(10).is_err());
        assert_eq!(lexer.position(), 3);
    }

    #[test]
    fn test_subslice_search() {
        assert_eq!(find_subslice(b"xx startxref yy startxref", b"startxref"), Some(3));
        assert_eq!(rfind_subslice(b"xx startxref yy startxref", b"startxref"), Some(16));
        assert_eq!(find_subslice(b"abc", b"zzzz"), None);
    }
}
