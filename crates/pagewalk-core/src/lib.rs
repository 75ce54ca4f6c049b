//! # pagewalk
//!
//! Cursor pagination over composite index ranges for document stores whose
//! range queries only accept an equality prefix plus one inequality on the
//! next indexed field.
//!
//! A page is described by an optional start and end [`IndexKey`](key::IndexKey).
//! The bounds are split into a short, ordered list of single-inequality
//! ranges, each range is scanned through an injected [`RangeScanner`](query::RangeScanner),
//! and the results are stitched back together in index order together with
//! the index key of every returned document.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pagewalk_core::memory::MemoryStore;
//! use pagewalk_core::query::{PageRequest, get_page};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.create_table("messages").unwrap();
//! for i in 0..250 {
//!     store.insert("messages", json!({"body": format!("hello {i}")})).unwrap();
//! }
//!
//! // First page: up to 100 rows from the default `by_creation_time` index.
//! let first = get_page(&store, &PageRequest::new("messages")).unwrap();
//! assert!(first.has_more);
//!
//! // Continue after the last key of the previous page.
//! let next = PageRequest::new("messages").start_key(first.last_key().unwrap().clone());
//! let second = get_page(&store, &next).unwrap();
//! assert_eq!(second.page.len(), 100);
//! ```

pub mod config;
pub mod error;
pub mod key;
pub mod memory;
pub mod query;
pub mod schema;
pub mod types;
