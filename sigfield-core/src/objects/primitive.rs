use crate::objects::Dictionary;
use std::fmt;

/// Identity of an indirect object: object number plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Name(String),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Dictionary, Vec<u8>),
    Reference(ObjectId),
}

impl Object {
    /// Build a name object (`/Name`); plain `&str` converts to a string object.
    pub fn name(name: impl Into<String>) -> Self {
        Object::Name(name.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Object::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Object::Real(f) => Some(*f),
            Object::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Object>> {
        match self {
            Object::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(dict, _) => Some(dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dictionary> {
        match self {
            Object::Dictionary(dict) => Some(dict),
            Object::Stream(dict, _) => Some(dict),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Short label of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::String(_) => "string",
            Object::Name(_) => "name",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dictionary",
            Object::Stream(_, _) => "stream",
            Object::Reference(_) => "reference",
        }
    }
}

impl From<bool> for Object {
    fn from(b: bool) -> Self {
        Object::Boolean(b)
    }
}

impl From<i32> for Object {
    fn from(i: i32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<i64> for Object {
    fn from(i: i64) -> Self {
        Object::Integer(i)
    }
}

impl From<u32> for Object {
    fn from(i: u32) -> Self {
        Object::Integer(i as i64)
    }
}

impl From<f64> for Object {
    fn from(f: f64) -> Self {
        Object::Real(f)
    }
}

impl From<String> for Object {
    fn from(s: String) -> Self {
        Object::String(s)
    }
}

impl From<&str> for Object {
    fn from(s: &str) -> Self {
        Object::String(s.to_string())
    }
}

impl From<Vec<Object>> for Object {
    fn from(v: Vec<Object>) -> Self {
        Object::Array(v)
    }
}

impl From<Dictionary> for Object {
    fn from(d: Dictionary) -> Self {
        Object::Dictionary(d)
    }
}

impl From<ObjectId> for Object {
    fn from(id: ObjectId) -> Self {
        Object::Reference(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_display() {
        let id = ObjectId::new(12, 0);
        assert_eq!(id.to_string(), "12 0 R");
        assert_eq!(id.number(), 12);
        assert_eq!(id.generation(), 0);
    }

    #[test]
    fn test_object_id_ordering() {
        assert!(ObjectId::new(1, 0) < ObjectId::new(2, 0));
        assert!(ObjectId::new(2, 0) < ObjectId::new(2, 1));
    }

    #[test]
    fn test_name_vs_string_conversion() {
        assert_eq!(Object::name("Sig"), Object::Name("Sig".to_string()));
        assert_eq!(Object::from("Sig"), Object::String("Sig".to_string()));
    }

    #[test]
    fn test_accessors() {
        assert_eq!(Object::Integer(3).as_real(), Some(3.0));
        assert_eq!(Object::Real(1.5).as_integer(), None);
        assert_eq!(
            Object::Reference(ObjectId::new(4, 0)).as_reference(),
            Some(ObjectId::new(4, 0))
        );
        assert!(Object::Null.is_null());
        assert_eq!(Object::Boolean(true).as_bool(), Some(true));
    }

    #[test]
    fn test_stream_exposes_dictionary() {
        let mut dict = Dictionary::new();
        dict.set("Length", 3);
        let mut stream = Object::Stream(dict, vec![1, 2, 3]);
        assert!(stream.as_dict().is_some());
        stream.as_dict_mut().unwrap().set("Filter", Object::name("FlateDecode"));
        assert_eq!(
            stream.as_dict().unwrap().get("Filter"),
            Some(&Object::name("FlateDecode"))
        );
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Object::Array(vec![]).type_name(), "array");
        assert_eq!(Object::Name("X".into()).type_name(), "name");
    }
}
