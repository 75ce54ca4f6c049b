//! A single in-memory table: documents by id plus declared indexes.

use std::collections::BTreeMap;

use crate::error::{Error, SchemaError, StoreError};
use crate::key::{IndexKey, compare_keys, index_key_for};
use crate::query::IndexRange;
use crate::schema::{
    IndexDefinition, TableDefinition, is_builtin_index, resolve_index_fields, with_tiebreakers,
};
use crate::types::{Document, Order};

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryTable {
    pub(crate) documents: BTreeMap<String, Document>,
    /// User-declared index fields, without tiebreakers.
    indexes: BTreeMap<String, Vec<String>>,
}

impl MemoryTable {
    pub(crate) fn define_index(
        &mut self,
        table: &str,
        name: &str,
        fields: Vec<String>,
    ) -> Result<(), Error> {
        if is_builtin_index(name) {
            return Err(SchemaError::ReservedIndexName(name.to_string()).into());
        }
        if self.indexes.contains_key(name) {
            return Err(SchemaError::DuplicateIndex {
                table: table.to_string(),
                index: name.to_string(),
            }
            .into());
        }
        self.indexes.insert(name.to_string(), fields);
        Ok(())
    }

    /// Full field list of an index, tiebreakers included.
    pub(crate) fn index_fields(&self, table: &str, index: &str) -> Result<Vec<String>, Error> {
        if is_builtin_index(index) {
            return resolve_index_fields(table, index, None, None);
        }
        self.indexes
            .get(index)
            .map(|fields| with_tiebreakers(fields))
            .ok_or_else(|| {
                StoreError::IndexNotFound {
                    table: table.to_string(),
                    index: index.to_string(),
                }
                .into()
            })
    }

    pub(crate) fn definition(&self) -> TableDefinition {
        TableDefinition {
            indexes: self
                .indexes
                .iter()
                .map(|(name, fields)| IndexDefinition {
                    name: name.clone(),
                    fields: fields.clone(),
                })
                .collect(),
        }
    }

    /// Documents inside `range`, in index order for `order`.
    pub(crate) fn scan(&self, fields: &[String], range: &IndexRange, order: Order) -> Vec<Document> {
        let mut hits: Vec<(IndexKey, &Document)> = self
            .documents
            .values()
            .filter(|doc| range.contains(doc))
            .map(|doc| (index_key_for(doc, fields), doc))
            .collect();
        hits.sort_by(|a, b| compare_keys(&a.0, &b.0));
        if order.is_desc() {
            hits.reverse();
        }
        hits.into_iter().map(|(_, doc)| doc.clone()).collect()
    }
}

/// Check that `range` constrains a leading run of `fields` with equality
/// and at most the next field with bounds, which is all an index can serve.
pub(crate) fn check_range_shape(
    index: &str,
    fields: &[String],
    range: &IndexRange,
) -> Result<(), Error> {
    let invalid = |reason: String| -> Error {
        StoreError::InvalidRange {
            index: index.to_string(),
            reason,
        }
        .into()
    };

    let constrained: Vec<&str> = range.fields().collect();
    if constrained.len() > fields.len() {
        return Err(invalid(format!(
            "{} fields constrained, index has {}",
            constrained.len(),
            fields.len()
        )));
    }
    for (position, (got, expected)) in constrained.iter().zip(fields).enumerate() {
        if *got != expected.as_str() {
            return Err(invalid(format!(
                "field {position} is '{expected}', range constrains '{got}'"
            )));
        }
    }
    Ok(())
}
