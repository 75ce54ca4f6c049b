//! Core types: documents, system fields, scan order, default row limits.

use serde::{Deserialize, Serialize};

/// A stored document. Documents are JSON objects.
pub type Document = serde_json::Value;

/// Unique document identifier field. Every index ends with it.
pub const ID_FIELD: &str = "_id";

/// Insertion timestamp field (milliseconds since the Unix epoch).
pub const CREATION_TIME_FIELD: &str = "_creationTime";

/// Built-in index ordered by `[_creationTime, _id]`.
pub const BY_CREATION_TIME: &str = "by_creation_time";

/// Built-in index ordered by `[_id]`.
pub const BY_ID: &str = "by_id";

/// Row target used when neither the request nor the config names one.
pub const DEFAULT_TARGET_MAX_ROWS: usize = 100;

/// Direction of an index scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn is_desc(self) -> bool {
        matches!(self, Order::Desc)
    }

    /// The opposite direction.
    pub fn reverse(self) -> Self {
        match self {
            Order::Asc => Order::Desc,
            Order::Desc => Order::Asc,
        }
    }
}
