use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::TypedValue;

/// An ordered set of named, typed fields.
///
/// Field names are unique within a record. Insertion order is preserved and is part of the record's identity: two
/// records are equal only if they hold the same fields, with the same values, in the same order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: IndexMap<String, TypedValue>,
}

impl Record {
    /// Creates an empty `Record`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, returning the previous value if the field was already present.
    ///
    /// A new field is appended after all existing fields. An existing field is overwritten in place, keeping its
    /// original position.
    pub fn insert<N, V>(&mut self, name: N, value: V) -> Option<TypedValue>
    where
        N: Into<String>,
        V: Into<TypedValue>,
    {
        self.fields.insert(name.into(), value.into())
    }

    /// Consumes this record, returning it with the given field set.
    pub fn with_field<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<TypedValue>,
    {
        self.insert(name, value);
        self
    }

    /// Gets the value of a field.
    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.fields.get(name)
    }

    /// Returns `true` if the record has a field with the given name.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Returns the position of a field within the record.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.fields.get_index_of(name)
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns an iterator over the field names, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Returns an iterator over the fields, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypedValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        // `IndexMap` equality ignores order, so compare field by field.
        self.fields.len() == other.fields.len() && self.fields.iter().eq(other.fields.iter())
    }
}

impl<N, V> FromIterator<(N, V)> for Record
where
    N: Into<String>,
    V: Into<TypedValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
