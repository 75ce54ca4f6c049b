//! In-memory document store.
//!
//! [`MemoryStore`] keeps tables of JSON documents behind a lock and serves
//! index range scans with the same restrictions a real index has: an
//! equality prefix and bounds on the next field only. It assigns `_id` and
//! `_creationTime` on insert, so every table has the built-in `by_id` and
//! `by_creation_time` indexes.
//!
//! Scans read a snapshot of the matching documents when opened.

pub(crate) mod table;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, SchemaError, StoreError};
use crate::query::{DocumentStream, IndexRange, RangeScanner};
use crate::schema::DatabaseSchema;
use crate::types::{CREATION_TIME_FIELD, Document, ID_FIELD, Order};

use table::{MemoryTable, check_range_shape};

#[derive(Debug, Default)]
struct StoreState {
    tables: BTreeMap<String, MemoryTable>,
    next_id: u64,
    last_creation_time: f64,
}

impl StoreState {
    fn table(&self, name: &str) -> Result<&MemoryTable, Error> {
        self.tables
            .get(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()).into())
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable, Error> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()).into())
    }

    /// Next creation timestamp: wall-clock milliseconds, nudged forward so
    /// timestamps are strictly increasing within the store.
    fn next_creation_time(&mut self) -> f64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        let t = if now > self.last_creation_time {
            now
        } else {
            self.last_creation_time + 1.0
        };
        self.last_creation_time = t;
        t
    }
}

/// An in-memory store of tables.
///
/// `MemoryStore` is cheaply clonable (`Arc`-based) and `Send + Sync`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_table(&self, name: &str) -> Result<(), Error> {
        let mut state = self.inner.write();
        if state.tables.contains_key(name) {
            return Err(SchemaError::TableAlreadyExists(name.to_string()).into());
        }
        state.tables.insert(name.to_string(), MemoryTable::default());
        debug!(table = name, "created table");
        Ok(())
    }

    /// Declare an index on `fields` (dot-separated paths allowed).
    /// `_creationTime` and `_id` are appended implicitly.
    pub fn define_index<S: Into<String>>(
        &self,
        table: &str,
        name: &str,
        fields: impl IntoIterator<Item = S>,
    ) -> Result<(), Error> {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let mut state = self.inner.write();
        state
            .table_mut(table)?
            .define_index(table, name, fields.clone())?;
        debug!(table, index = name, ?fields, "defined index");
        Ok(())
    }

    /// Insert a document, assigning it a fresh `_id` and `_creationTime`.
    /// Returns the new id.
    pub fn insert(&self, table: &str, doc: Document) -> Result<String, Error> {
        let mut doc = doc;
        let obj = user_object(&mut doc)?;
        let mut state = self.inner.write();
        state.table(table)?;

        let id = format!("{:016x}", state.next_id);
        state.next_id += 1;
        let creation_time = state.next_creation_time();
        obj.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        obj.insert(CREATION_TIME_FIELD.to_string(), serde_json::json!(creation_time));

        state.table_mut(table)?.documents.insert(id.clone(), doc);
        Ok(id)
    }

    /// Insert a document with caller-chosen system fields.
    pub fn insert_with_id(
        &self,
        table: &str,
        id: &str,
        creation_time: f64,
        doc: Document,
    ) -> Result<(), Error> {
        let mut doc = doc;
        let obj = user_object(&mut doc)?;
        obj.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        obj.insert(CREATION_TIME_FIELD.to_string(), serde_json::json!(creation_time));

        let mut state = self.inner.write();
        let documents = &mut state.table_mut(table)?.documents;
        if documents.contains_key(id) {
            return Err(StoreError::DuplicateId(id.to_string()).into());
        }
        documents.insert(id.to_string(), doc);
        if creation_time > state.last_creation_time {
            state.last_creation_time = creation_time;
        }
        Ok(())
    }

    pub fn get(&self, table: &str, id: &str) -> Result<Option<Document>, Error> {
        let state = self.inner.read();
        Ok(state.table(table)?.documents.get(id).cloned())
    }

    /// Delete a document, returning it if it existed.
    pub fn delete(&self, table: &str, id: &str) -> Result<Option<Document>, Error> {
        let mut state = self.inner.write();
        Ok(state.table_mut(table)?.documents.remove(id))
    }

    /// Number of documents in `table`.
    pub fn count(&self, table: &str) -> Result<usize, Error> {
        let state = self.inner.read();
        Ok(state.table(table)?.documents.len())
    }

    /// Schema description of every table and its declared indexes.
    pub fn schema(&self) -> DatabaseSchema {
        let state = self.inner.read();
        DatabaseSchema {
            tables: state
                .tables
                .iter()
                .map(|(name, table)| (name.clone(), table.definition()))
                .collect(),
        }
    }
}

/// Borrow `doc` as an object, rejecting non-objects and documents that
/// already carry system fields.
fn user_object(doc: &mut Document) -> Result<&mut serde_json::Map<String, Value>, Error> {
    let obj = doc
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".to_string()))?;
    for field in [ID_FIELD, CREATION_TIME_FIELD] {
        if obj.contains_key(field) {
            return Err(
                StoreError::InvalidDocument(format!("system field '{field}' is reserved")).into(),
            );
        }
    }
    Ok(obj)
}

impl RangeScanner for MemoryStore {
    fn scan_range<'a>(
        &'a self,
        table: &str,
        index: &str,
        range: &IndexRange,
        order: Order,
    ) -> Result<DocumentStream<'a>, Error> {
        let state = self.inner.read();
        let mem_table = state.table(table)?;
        let fields = mem_table.index_fields(table, index)?;
        check_range_shape(index, &fields, range)?;
        let docs = mem_table.scan(&fields, range, order);
        Ok(Box::new(docs.into_iter().map(Ok::<Document, Error>)))
    }
}
