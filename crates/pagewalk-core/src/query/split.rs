//! Splitting a pair of composite key bounds into executable ranges.
//!
//! Index range queries can only constrain a key with an equality prefix and
//! a single inequality on the next field. A bound pair such as
//! `(a, b, c) > (1, 2, 3)` and `(a, b, c) <= (1, 3, 2)` cannot be expressed
//! that way in one query, so it is split into a staircase of ranges that
//! each can:
//!
//! ```text
//! a == 1, b == 2, c > 3           (rest of the b == 2 subtree)
//! a == 1, b > 2, b < 3            (whole subtrees strictly between)
//! a == 1, b == 3, c <= 2          (start of the b == 3 subtree)
//! ```
//!
//! Scanned in order, the ranges visit exactly the keys between the bounds,
//! each once, in index order.

use std::cmp::Ordering;

use crate::key::IndexValue;
use crate::types::Order;

/// Comparison operator applied to one index field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl ComparisonOp {
    /// The exclusive form of an inclusive inequality.
    pub fn strict(self) -> Self {
        match self {
            ComparisonOp::Gte => ComparisonOp::Gt,
            ComparisonOp::Lte => ComparisonOp::Lt,
            op => op,
        }
    }

    pub fn is_strict(self) -> bool {
        matches!(self, ComparisonOp::Lt | ComparisonOp::Gt)
    }

    /// Whether this operator bounds a field from below.
    pub fn is_lower(self) -> bool {
        matches!(self, ComparisonOp::Gt | ComparisonOp::Gte)
    }

    /// Whether this operator bounds a field from above.
    pub fn is_upper(self) -> bool {
        matches!(self, ComparisonOp::Lt | ComparisonOp::Lte)
    }
}

/// One `field <op> value` clause of a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldComparison {
    pub op: ComparisonOp,
    pub field: String,
    pub value: IndexValue,
}

impl FieldComparison {
    pub fn new(op: ComparisonOp, field: impl Into<String>, value: IndexValue) -> Self {
        Self {
            op,
            field: field.into(),
            value,
        }
    }
}

/// A conjunction of field comparisons: equality on a leading run of index
/// fields, then at most a lower and an upper bound on the next field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeDescriptor {
    comparisons: Vec<FieldComparison>,
}

impl RangeDescriptor {
    pub fn new(comparisons: Vec<FieldComparison>) -> Self {
        Self { comparisons }
    }

    pub fn comparisons(&self) -> &[FieldComparison] {
        &self.comparisons
    }

    pub fn len(&self) -> usize {
        self.comparisons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }

    fn push(&mut self, op: ComparisonOp, field: &str, value: &IndexValue) {
        self.comparisons
            .push(FieldComparison::new(op, field, value.clone()));
    }
}

/// Bound operators for a scan, given its direction and inclusivity.
///
/// Start and end keys are positions in scan order, so for a descending
/// scan the start key is the upper bound and the end key the lower one.
pub fn bound_types(
    order: Order,
    start_inclusive: bool,
    end_inclusive: bool,
) -> (ComparisonOp, ComparisonOp) {
    let pick = |inclusive: bool, inclusive_op: ComparisonOp| {
        if inclusive {
            inclusive_op
        } else {
            inclusive_op.strict()
        }
    };
    match order {
        Order::Asc => (
            pick(start_inclusive, ComparisonOp::Gte),
            pick(end_inclusive, ComparisonOp::Lte),
        ),
        Order::Desc => (
            pick(start_inclusive, ComparisonOp::Lte),
            pick(end_inclusive, ComparisonOp::Gte),
        ),
    }
}

/// Split the keys between `start` and `end` into ranges that each use an
/// equality prefix plus one trailing inequality.
///
/// `start` and `end` are key prefixes in scan order; an empty bound leaves
/// that side open. `start_op` and `end_op` come from [`bound_types`].
/// The returned ranges are disjoint and, scanned in the same direction and
/// concatenated, yield keys in scan order. An empty result means no key can
/// satisfy both bounds.
///
/// # Panics
///
/// If a bound is longer than `index_fields`, if the operators are not one
/// lower and one upper bound, or if `start` comes after `end` in scan
/// order. [`get_page`](super::get_page) rejects such requests with an
/// error before splitting.
pub fn split_range(
    index_fields: &[String],
    start: &[IndexValue],
    end: &[IndexValue],
    start_op: ComparisonOp,
    end_op: ComparisonOp,
) -> Vec<RangeDescriptor> {
    assert!(
        start.len() <= index_fields.len() && end.len() <= index_fields.len(),
        "bound longer than the {} index fields",
        index_fields.len()
    );
    assert!(
        (start_op.is_lower() && end_op.is_upper()) || (start_op.is_upper() && end_op.is_lower()),
        "bound operators {start_op:?} and {end_op:?} do not form an interval"
    );

    // Shared leading values pin those fields to equality in every range.
    let common = start
        .iter()
        .zip(end)
        .take_while(|(s, e)| s == e)
        .count();
    let mut prefix = RangeDescriptor::default();
    for i in 0..common {
        prefix.push(ComparisonOp::Eq, &index_fields[i], &start[i]);
    }

    // A bound swallowed whole by the prefix excludes the entire prefix
    // subtree when it is strict, and nothing can lie on the other side.
    let start_consumed = !start.is_empty() && common == start.len();
    let end_consumed = !end.is_empty() && common == end.len();
    if (start_consumed && start_op.is_strict()) || (end_consumed && end_op.is_strict()) {
        return Vec::new();
    }

    let fields = &index_fields[common..];
    let mut start_rest = &start[common..];
    let mut end_rest = &end[common..];

    if let (Some(s), Some(e)) = (start_rest.first(), end_rest.first()) {
        let expected = if start_op.is_lower() {
            Ordering::Less
        } else {
            Ordering::Greater
        };
        assert!(
            s.cmp(e) == expected,
            "start bound lies past the end bound in scan order"
        );
    }

    let mut ranges = Vec::new();

    // Climb out of the start key: at each level, the siblings beyond it.
    let mut op = start_op;
    while start_rest.len() > 1 {
        ranges.push(staircase_step(&prefix, fields, start_rest, op));
        op = op.strict();
        start_rest = &start_rest[..start_rest.len() - 1];
    }
    let start_op = op;

    // Descend into the end key, collected top-down then reversed.
    let mut end_ranges = Vec::new();
    let mut op = end_op;
    while end_rest.len() > 1 {
        end_ranges.push(staircase_step(&prefix, fields, end_rest, op));
        op = op.strict();
        end_rest = &end_rest[..end_rest.len() - 1];
    }
    let end_op = op;
    end_ranges.reverse();

    let middle = match (start_rest.first(), end_rest.first()) {
        (Some(s), Some(e)) => {
            let mut middle = prefix.clone();
            middle.push(start_op, &fields[0], s);
            middle.push(end_op, &fields[0], e);
            middle
        }
        (Some(_), None) => staircase_step(&prefix, fields, start_rest, start_op),
        (None, Some(_)) => staircase_step(&prefix, fields, end_rest, end_op),
        (None, None) => prefix,
    };
    ranges.push(middle);
    ranges.extend(end_ranges);
    ranges
}

/// `prefix`, equality on all but the last of `bound`, then `op` on the last.
fn staircase_step(
    prefix: &RangeDescriptor,
    fields: &[String],
    bound: &[IndexValue],
    op: ComparisonOp,
) -> RangeDescriptor {
    let mut range = prefix.clone();
    if let Some((last, leading)) = bound.split_last() {
        for (field, value) in fields.iter().zip(leading) {
            range.push(ComparisonOp::Eq, field, value);
        }
        range.push(op, &fields[leading.len()], last);
    }
    range
}
