//! Schema descriptions and index field resolution.
//!
//! A [`DatabaseSchema`] lists, per table, the user-defined indexes and the
//! fields they sort by. The system tiebreaker fields (`_creationTime`,
//! `_id`) are implied and never listed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, RequestError, SchemaError};
use crate::types::{BY_CREATION_TIME, BY_ID, CREATION_TIME_FIELD, ID_FIELD};

/// Schema for every table in a database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    #[serde(default)]
    pub tables: BTreeMap<String, TableDefinition>,
}

/// Indexes declared on a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

/// A named index and the document fields it sorts by, in order.
///
/// Fields may be dot-separated paths into nested objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub fields: Vec<String>,
}

impl DatabaseSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a table definition.
    pub fn table(mut self, name: impl Into<String>, table: TableDefinition) -> Self {
        self.tables.insert(name.into(), table);
        self
    }

    pub fn get_table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    /// The declared fields of `index` on `table`, without tiebreakers.
    pub fn index_fields(&self, table: &str, index: &str) -> Result<&[String], Error> {
        let table_def = self
            .get_table(table)
            .ok_or_else(|| SchemaError::TableNotFound(table.to_string()))?;
        let index_def = table_def
            .find_index(index)
            .ok_or_else(|| SchemaError::IndexNotFound {
                table: table.to_string(),
                index: index.to_string(),
            })?;
        Ok(&index_def.fields)
    }
}

impl TableDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an index on this table.
    pub fn index<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        fields: impl IntoIterator<Item = S>,
    ) -> Self {
        self.indexes.push(IndexDefinition {
            name: name.into(),
            fields: fields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn find_index(&self, name: &str) -> Option<&IndexDefinition> {
        self.indexes.iter().find(|idx| idx.name == name)
    }
}

/// Whether `name` is one of the indexes every table has.
pub fn is_builtin_index(name: &str) -> bool {
    name == BY_CREATION_TIME || name == BY_ID
}

/// Append the implicit tiebreakers to a user field list.
///
/// A list that already ends in uniqueness (contains `_id`) is returned
/// unchanged, otherwise `_creationTime` (if absent) and `_id` are appended.
pub fn with_tiebreakers(fields: &[String]) -> Vec<String> {
    let mut out = fields.to_vec();
    if !out.iter().any(|f| f == ID_FIELD) {
        if !out.iter().any(|f| f == CREATION_TIME_FIELD) {
            out.push(CREATION_TIME_FIELD.to_string());
        }
        out.push(ID_FIELD.to_string());
    }
    out
}

/// Resolve the full, totally ordered field list of an index.
///
/// Built-in indexes resolve to fixed lists. Any other index takes the
/// caller's explicit field list when given, otherwise the fields declared
/// in `schema`. Both get the implicit tiebreakers appended.
pub fn resolve_index_fields(
    table: &str,
    index: &str,
    explicit: Option<&[String]>,
    schema: Option<&DatabaseSchema>,
) -> Result<Vec<String>, Error> {
    if index == BY_CREATION_TIME {
        return Ok(vec![CREATION_TIME_FIELD.to_string(), ID_FIELD.to_string()]);
    }
    if index == BY_ID {
        return Ok(vec![ID_FIELD.to_string()]);
    }
    if let Some(fields) = explicit {
        return Ok(with_tiebreakers(fields));
    }
    let schema = schema.ok_or_else(|| RequestError::MissingSchema {
        index: index.to_string(),
    })?;
    Ok(with_tiebreakers(schema.index_fields(table, index)?))
}
