//! Executable index ranges: the shape a range-scan executor accepts.

use std::ops::Bound;

use serde_json::Value;

use crate::error::{Error, RequestError};
use crate::key::{IndexValue, field_value};

use super::split::{ComparisonOp, RangeDescriptor};

/// An equality prefix over the leading index fields plus optional bounds on
/// the field right after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRange {
    pub prefix: Vec<(String, IndexValue)>,
    pub trailing: Option<TrailingRange>,
}

/// Lower and upper bounds on a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailingRange {
    pub field: String,
    pub lower: Bound<IndexValue>,
    pub upper: Bound<IndexValue>,
}

impl IndexRange {
    /// The range covering the whole index.
    pub fn full() -> Self {
        Self {
            prefix: Vec::new(),
            trailing: None,
        }
    }

    /// Fields constrained by this range, in index order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.prefix
            .iter()
            .map(|(f, _)| f.as_str())
            .chain(self.trailing.as_ref().map(|t| t.field.as_str()))
    }

    /// Whether `doc` falls inside this range.
    pub fn contains(&self, doc: &Value) -> bool {
        let prefix_matches = self
            .prefix
            .iter()
            .all(|(field, value)| field_value(doc, field) == *value);
        prefix_matches
            && self
                .trailing
                .as_ref()
                .is_none_or(|t| t.contains(&field_value(doc, &t.field)))
    }
}

impl TrailingRange {
    pub fn contains(&self, value: &IndexValue) -> bool {
        let above = match &self.lower {
            Bound::Included(lo) => value >= lo,
            Bound::Excluded(lo) => value > lo,
            Bound::Unbounded => true,
        };
        let below = match &self.upper {
            Bound::Included(hi) => value <= hi,
            Bound::Excluded(hi) => value < hi,
            Bound::Unbounded => true,
        };
        above && below
    }
}

impl TryFrom<&RangeDescriptor> for IndexRange {
    type Error = Error;

    fn try_from(descriptor: &RangeDescriptor) -> Result<Self, Error> {
        let mut range = IndexRange::full();
        for cmp in descriptor.comparisons() {
            let bound = match cmp.op {
                ComparisonOp::Eq => {
                    if range.trailing.is_some() {
                        return Err(malformed(format!(
                            "equality on '{}' after an inequality",
                            cmp.field
                        )));
                    }
                    range.prefix.push((cmp.field.clone(), cmp.value.clone()));
                    continue;
                }
                ComparisonOp::Gt | ComparisonOp::Lt => Bound::Excluded(cmp.value.clone()),
                ComparisonOp::Gte | ComparisonOp::Lte => Bound::Included(cmp.value.clone()),
            };

            let trailing = range.trailing.get_or_insert_with(|| TrailingRange {
                field: cmp.field.clone(),
                lower: Bound::Unbounded,
                upper: Bound::Unbounded,
            });
            if trailing.field != cmp.field {
                return Err(malformed(format!(
                    "inequalities on both '{}' and '{}'",
                    trailing.field, cmp.field
                )));
            }
            let slot = if cmp.op.is_lower() {
                &mut trailing.lower
            } else {
                &mut trailing.upper
            };
            if !matches!(slot, Bound::Unbounded) {
                return Err(malformed(format!("duplicate bound on '{}'", cmp.field)));
            }
            *slot = bound;
        }
        Ok(range)
    }
}

fn malformed(reason: String) -> Error {
    RequestError::MalformedRange(reason).into()
}
