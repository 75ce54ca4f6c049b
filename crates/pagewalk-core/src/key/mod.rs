//! Index keys: ordered tuples of [`IndexValue`]s, one per indexed field.

pub mod cursor;
pub mod value;

use std::cmp::Ordering;

use serde_json::Value;

pub use value::IndexValue;

/// A point in an index's sort order.
///
/// A key may be shorter than the index it is used with. A shorter key acts
/// as a prefix bound: `[1]` as an inclusive start bound covers every entry
/// whose first field is `>= 1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct IndexKey(Vec<IndexValue>);

impl IndexKey {
    pub fn new(values: Vec<IndexValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[IndexValue] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<IndexValue>> for IndexKey {
    fn from(values: Vec<IndexValue>) -> Self {
        Self(values)
    }
}

impl<T: Into<IndexValue>, const N: usize> From<[T; N]> for IndexKey {
    fn from(values: [T; N]) -> Self {
        Self(values.into_iter().map(Into::into).collect())
    }
}

impl FromIterator<IndexValue> for IndexKey {
    fn from_iter<I: IntoIterator<Item = IndexValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Compare two index keys field by field. A strict prefix sorts before
/// any of its extensions.
pub fn compare_keys(a: &IndexKey, b: &IndexKey) -> Ordering {
    a.cmp(b)
}

/// Resolve a dot-separated field path on a document.
///
/// Returns `None` when any segment is missing or an intermediate value is
/// not an object.
pub fn resolve_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// The index value of `path` on `doc`, [`IndexValue::Unset`] when absent.
pub fn field_value(doc: &Value, path: &str) -> IndexValue {
    resolve_path(doc, path).map_or(IndexValue::Unset, IndexValue::from_json)
}

/// Project `fields` onto a document to compute its key in that index.
pub fn index_key_for(doc: &Value, fields: &[String]) -> IndexKey {
    fields.iter().map(|f| field_value(doc, f)).collect()
}
