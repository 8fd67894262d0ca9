//! PDF Object Parser
//!
//! Parses PDF objects from tokens according to ISO 32000-1 Section 7.3

use super::lexer::{Lexer, Token};
use super::{decode_text, ParseError, ParseResult};
use crate::objects::{Dictionary, Object, ObjectId};

/// Deepest array/dictionary nesting accepted before giving up.
const MAX_NESTING: usize = 256;

/// Resolves an indirect `/Length` to a byte count.
pub type LengthResolver<'r> = &'r dyn Fn(ObjectId) -> Option<usize>;

pub struct ObjectParser<'a, 'r> {
    lexer: Lexer<'a>,
    resolve_length: Option<LengthResolver<'r>>,
}

impl<'a, 'r> ObjectParser<'a, 'r> {
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            resolve_length: None,
        }
    }

    pub fn with_length_resolver(mut self, resolver: LengthResolver<'r>) -> Self {
        self.resolve_length = Some(resolver);
        self
    }

    pub fn lexer(&mut self) -> &mut Lexer<'a> {
        &mut self.lexer
    }

    pub fn into_lexer(self) -> Lexer<'a> {
        self.lexer
    }

    /// Parse a single direct object
    pub fn parse_object(&mut self) -> ParseResult<Object> {
        let token = self.lexer.next_token()?;
        self.parse_from_token(token, 0)
    }

    /// Parse `n g obj ... endobj` at the lexer's position
    pub fn parse_indirect_object(&mut self) -> ParseResult<(ObjectId, Object)> {
        let number = self.expect_integer("object number")?;
        let generation = self.expect_integer("generation number")?;
        self.expect(Token::Obj)?;

        let id = object_id(number, generation)?;
        let token = self.lexer.next_token()?;
        let object = match self.parse_from_token(token, 0)? {
            Object::Dictionary(dict) if self.lexer.peek_token()? == Token::Stream => {
                self.lexer.next_token()?;
                let data = self.read_stream_data(&dict)?;
                Object::Stream(dict, data)
            }
            other => other,
        };

        // Missing `endobj` is tolerated
        if self.lexer.peek_token()? == Token::EndObj {
            self.lexer.next_token()?;
        }

        Ok((id, object))
    }

    fn parse_from_token(&mut self, token: Token, depth: usize) -> ParseResult<Object> {
        if depth > MAX_NESTING {
            return Err(ParseError::SyntaxError {
                position: self.lexer.position(),
                message: "Objects nested too deeply".to_string(),
            });
        }

        match token {
            Token::Null => Ok(Object::Null),
            Token::Boolean(b) => Ok(Object::Boolean(b)),
            Token::Integer(i) => self.parse_integer_or_reference(i),
            Token::Real(r) => Ok(Object::Real(r)),
            Token::String(bytes) => Ok(Object::String(decode_text(&bytes))),
            Token::Name(n) => Ok(Object::Name(n)),
            Token::ArrayStart => self.parse_array(depth),
            Token::DictStart => self.parse_dictionary(depth).map(Object::Dictionary),
            Token::Eof => Err(ParseError::SyntaxError {
                position: self.lexer.position(),
                message: "Unexpected end of file".to_string(),
            }),
            other => Err(ParseError::UnexpectedToken {
                expected: "PDF object".to_string(),
                found: other.describe(),
            }),
        }
    }

    /// `n g R` is a reference; anything else leaves the lexer after `n`
    fn parse_integer_or_reference(&mut self, number: i64) -> ParseResult<Object> {
        let saved = self.lexer.position();
        if let Ok(Token::Integer(generation)) = self.lexer.next_token() {
            if let Ok(Token::R) = self.lexer.next_token() {
                return object_id(number, generation).map(Object::Reference);
            }
        }
        self.lexer.set_position(saved);
        Ok(Object::Integer(number))
    }

    fn parse_array(&mut self, depth: usize) -> ParseResult<Object> {
        let mut elements = Vec::new();
        loop {
            let token = self.lexer.next_token()?;
            if token == Token::ArrayEnd {
                break;
            }
            elements.push(self.parse_from_token(token, depth + 1)?);
        }
        Ok(Object::Array(elements))
    }

    fn parse_dictionary(&mut self, depth: usize) -> ParseResult<Dictionary> {
        let mut dict = Dictionary::new();
        loop {
            match self.lexer.next_token()? {
                Token::DictEnd => break,
                Token::Name(key) => {
                    let token = self.lexer.next_token()?;
                    let value = self.parse_from_token(token, depth + 1)?;
                    // A null value is equivalent to an absent entry
                    if !value.is_null() {
                        dict.set(key, value);
                    }
                }
                other => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "dictionary key".to_string(),
                        found: other.describe(),
                    })
                }
            }
        }
        Ok(dict)
    }

    fn read_stream_data(&mut self, dict: &Dictionary) -> ParseResult<Vec<u8>> {
        self.lexer.skip_stream_eol();
        let start = self.lexer.position();

        let declared = match dict.get("Length") {
            Some(Object::Integer(n)) => usize::try_from(*n).ok(),
            Some(Object::Reference(id)) => self.resolve_length.and_then(|resolve| resolve(*id)),
            _ => None,
        };

        if let Some(length) = declared {
            if let Ok(data) = self.lexer.read_bytes(length) {
                let data = data.to_vec();
                if self.lexer.peek_token().ok() == Some(Token::EndStream) {
                    self.lexer.next_token()?;
                    return Ok(data);
                }
            }
            self.lexer.set_position(start);
        }

        // Length missing or wrong: scan for the keyword instead
        let end = self
            .lexer
            .find_endstream()
            .ok_or_else(|| ParseError::MissingKey("Length".to_string()))?;
        let mut data_end = end;
        let bytes = self.lexer.data();
        if data_end > start && bytes[data_end - 1] == b'\n' {
            data_end -= 1;
        }
        if data_end > start && bytes[data_end - 1] == b'\r' {
            data_end -= 1;
        }
        let data = bytes[start..data_end].to_vec();
        self.lexer.set_position(end);
        self.lexer.next_token()?;
        Ok(data)
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let token = self.lexer.next_token()?;
        if token == expected {
            Ok(())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: expected.describe(),
                found: token.describe(),
            })
        }
    }

    fn expect_integer(&mut self, what: &str) -> ParseResult<i64> {
        match self.lexer.next_token()? {
            Token::Integer(i) => Ok(i),
            other => Err(ParseError::UnexpectedToken {
                expected: what.to_string(),
                found: other.describe(),
            }),
        }
    }
}

fn object_id(number: i64, generation: i64) -> ParseResult<ObjectId> {
    match (u32::try_from(number), u16::try_from(generation)) {
        (Ok(n), Ok(g)) => Ok(ObjectId::new(n, g)),
        _ => Err(ParseError::SyntaxError {
            position: 0,
            message: format!("Invalid object identity {number} {generation}"),
        }),
    }
}
