//! Per-document object table.
//!
//! Every structural object of a document lives here and is addressed by its
//! [`ObjectId`]. Objects refer to each other through `Object::Reference`, so
//! cyclic links such as a field and its widget never need shared ownership.

use crate::error::{PdfError, Result};
use crate::objects::{Dictionary, Object, ObjectId};
use std::collections::BTreeMap;
use tracing::trace;

/// Highest object number a classic cross-reference table can address.
pub const MAX_OBJECT_NUMBER: u32 = 8_388_607;

#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects: BTreeMap<ObjectId, Object>,
    next_number: u32,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            next_number: 1,
        }
    }

    /// Store `value` under the next unused identity and return it.
    ///
    /// Identities are never reused within one store.
    ///
    /// # Panics
    ///
    /// Panics when the object number space is exhausted.
    pub fn allocate(&mut self, value: impl Into<Object>) -> ObjectId {
        assert!(
            self.next_number <= MAX_OBJECT_NUMBER,
            "object number space exhausted"
        );
        let id = ObjectId::new(self.next_number, 0);
        self.next_number += 1;

        let value = value.into();
        trace!(object = %id, kind = value.type_name(), "allocated object");
        self.objects.insert(id, value);
        id
    }

    /// Identity the next `allocate` call will hand out.
    pub fn next_id(&self) -> ObjectId {
        ObjectId::new(self.next_number, 0)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    pub fn get_dict(&self, id: ObjectId) -> Option<&Dictionary> {
        self.get(id).and_then(Object::as_dict)
    }

    pub fn get_dict_mut(&mut self, id: ObjectId) -> Option<&mut Dictionary> {
        self.get_mut(id).and_then(Object::as_dict_mut)
    }

    /// Dictionary at `id`, or `InvalidReference` naming what was expected.
    pub fn expect_dict(&self, id: ObjectId, what: &str) -> Result<&Dictionary> {
        self.get_dict(id)
            .ok_or_else(|| PdfError::InvalidReference(format!("{id} is not a {what} dictionary")))
    }

    pub fn expect_dict_mut(&mut self, id: ObjectId, what: &str) -> Result<&mut Dictionary> {
        self.get_dict_mut(id)
            .ok_or_else(|| PdfError::InvalidReference(format!("{id} is not a {what} dictionary")))
    }

    /// Overwrite an object that was previously allocated.
    pub fn replace(&mut self, id: ObjectId, value: impl Into<Object>) -> Result<Object> {
        match self.objects.get_mut(&id) {
            Some(slot) => Ok(std::mem::replace(slot, value.into())),
            None => Err(PdfError::InvalidReference(format!(
                "{id} was never allocated"
            ))),
        }
    }

    /// Follow one level of indirection. Dangling references resolve to `Null`.
    pub fn resolve<'a>(&'a self, object: &'a Object) -> &'a Object {
        match object {
            Object::Reference(id) => self.get(*id).unwrap_or(&Object::Null),
            other => other,
        }
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in ascending identity order.
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &Object)> {
        self.objects.iter()
    }
}

impl Default for ObjectStore {
    fn default() -> Self {
        Self::new()
    }
}
