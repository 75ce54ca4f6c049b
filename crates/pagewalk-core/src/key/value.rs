//! Scalar values stored in index keys and their total order.
//!
//! Values are ordered by type first, then by value within a type:
//!
//! ```text
//! Unset < Null < Integer/Number < Boolean < String < Array < Object
//! ```
//!
//! `Unset` marks a field that is absent from the document. It is distinct
//! from an explicit JSON `null` and sorts before everything else, so
//! documents missing an indexed field cluster at the start of the index.
//!
//! Numbers keep JSON integers exact (`Integer`) and everything else as
//! `f64` (`Number`). Both kinds compare by numeric value, so `3`, `3.0`
//! and `-0.0 == 0` behave as in JSON. Integers beyond 2^53 stay distinct.
//! A NaN sorts above every number, or below them when its sign bit is set.

use std::cmp::Ordering;

use serde_json::{Map, Value};

/// One component of an [`IndexKey`](super::IndexKey).
#[derive(Debug, Clone)]
pub enum IndexValue {
    Unset,
    Null,
    /// A JSON integer, exact over the whole `i64` and `u64` range.
    Integer(i128),
    Number(f64),
    Boolean(bool),
    String(String),
    Array(Vec<IndexValue>),
    /// Object entries sorted by key.
    Object(Vec<(String, IndexValue)>),
}

impl IndexValue {
    /// Convert a JSON value. Object entries are sorted by key so that two
    /// objects with the same entries compare equal.
    pub fn from_json(val: &Value) -> Self {
        match val {
            Value::Null => IndexValue::Null,
            Value::Bool(b) => IndexValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    IndexValue::Integer(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    IndexValue::Integer(i128::from(u))
                } else {
                    IndexValue::Number(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => IndexValue::String(s.clone()),
            Value::Array(arr) => IndexValue::Array(arr.iter().map(IndexValue::from_json).collect()),
            Value::Object(obj) => {
                let mut entries: Vec<(String, IndexValue)> = obj
                    .iter()
                    .map(|(k, v)| (k.clone(), IndexValue::from_json(v)))
                    .collect();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                IndexValue::Object(entries)
            }
        }
    }

    /// Convert back to JSON. `Unset` has no JSON form and yields `None`;
    /// unset elements nested in arrays or objects are dropped.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            IndexValue::Unset => None,
            IndexValue::Null => Some(Value::Null),
            IndexValue::Integer(i) => Some(integer_json(*i)),
            IndexValue::Number(n) => Some(serde_json::json!(*n)),
            IndexValue::Boolean(b) => Some(Value::Bool(*b)),
            IndexValue::String(s) => Some(Value::String(s.clone())),
            IndexValue::Array(items) => Some(Value::Array(
                items.iter().filter_map(IndexValue::to_json).collect(),
            )),
            IndexValue::Object(entries) => {
                let mut map = Map::new();
                for (k, v) in entries {
                    if let Some(v) = v.to_json() {
                        map.insert(k.clone(), v);
                    }
                }
                Some(Value::Object(map))
            }
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, IndexValue::Unset)
    }

    /// Position of this value's type in the cross-type order.
    fn type_rank(&self) -> u8 {
        match self {
            IndexValue::Unset => 0,
            IndexValue::Null => 1,
            IndexValue::Integer(_) | IndexValue::Number(_) => 2,
            IndexValue::Boolean(_) => 3,
            IndexValue::String(_) => 4,
            IndexValue::Array(_) => 5,
            IndexValue::Object(_) => 6,
        }
    }
}

impl Ord for IndexValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IndexValue::Integer(a), IndexValue::Integer(b)) => a.cmp(b),
            (IndexValue::Number(a), IndexValue::Number(b)) => cmp_floats(*a, *b),
            (IndexValue::Integer(a), IndexValue::Number(b)) => cmp_int_float(*a, *b),
            (IndexValue::Number(a), IndexValue::Integer(b)) => cmp_int_float(*b, *a).reverse(),
            (IndexValue::Boolean(a), IndexValue::Boolean(b)) => a.cmp(b),
            (IndexValue::String(a), IndexValue::String(b)) => a.cmp(b),
            (IndexValue::Array(a), IndexValue::Array(b)) => a.cmp(b),
            (IndexValue::Object(a), IndexValue::Object(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

/// `total_cmp` with the two zeros merged.
fn cmp_floats(a: f64, b: f64) -> Ordering {
    if a == b {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Exact comparison of an integer with a float, consistent with
/// [`cmp_floats`].
fn cmp_int_float(i: i128, f: f64) -> Ordering {
    // Rounds up to 2^127, which every i128 lies strictly below.
    const LIMIT: f64 = i128::MAX as f64;
    if f.is_nan() {
        return if f.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    // `whole` is integral and within range, so the cast is exact.
    match i.cmp(&(whole as i128)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        other => other,
    }
}

fn integer_json(i: i128) -> Value {
    if let Ok(v) = i64::try_from(i) {
        Value::from(v)
    } else if let Ok(v) = u64::try_from(i) {
        Value::from(v)
    } else {
        serde_json::json!(i as f64)
    }
}

impl PartialOrd for IndexValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for IndexValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexValue {}

impl From<&Value> for IndexValue {
    fn from(val: &Value) -> Self {
        IndexValue::from_json(val)
    }
}

impl From<Value> for IndexValue {
    fn from(val: Value) -> Self {
        IndexValue::from_json(&val)
    }
}

impl From<f64> for IndexValue {
    fn from(n: f64) -> Self {
        IndexValue::Number(n)
    }
}

impl From<i64> for IndexValue {
    fn from(n: i64) -> Self {
        IndexValue::Integer(i128::from(n))
    }
}

impl From<u64> for IndexValue {
    fn from(n: u64) -> Self {
        IndexValue::Integer(i128::from(n))
    }
}

impl From<i32> for IndexValue {
    fn from(n: i32) -> Self {
        IndexValue::Integer(i128::from(n))
    }
}

impl From<bool> for IndexValue {
    fn from(b: bool) -> Self {
        IndexValue::Boolean(b)
    }
}

impl From<&str> for IndexValue {
    fn from(s: &str) -> Self {
        IndexValue::String(s.to_string())
    }
}

impl From<String> for IndexValue {
    fn from(s: String) -> Self {
        IndexValue::String(s)
    }
}
