//! Shared fixtures for integration tests.
#![allow(dead_code)]

use pagewalk_core::memory::MemoryStore;
use pagewalk_core::query::PageResponse;
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// Install a test-friendly subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_test_writer()
        .try_init();
}

pub const A_VALUES: [i64; 3] = [0, 1, 2];
pub const B_VALUES: [i64; 3] = [0, 1, 2];
pub const C_VALUES: [i64; 2] = [0, 1];

pub fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Table `grid` holding one document per `(a, b, c)` combination, with an
/// index `by_abc` on `[a, b, c]`. Ids and creation times are assigned in
/// reverse key order so the tiebreakers never agree with the user fields
/// by accident.
pub fn grid_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.create_table("grid").unwrap();
    store.define_index("grid", "by_abc", ["a", "b", "c"]).unwrap();

    let mut n = 100;
    for a in A_VALUES {
        for b in B_VALUES {
            for c in C_VALUES {
                store
                    .insert_with_id(
                        "grid",
                        &format!("g{n:03}"),
                        f64::from(n),
                        json!({"a": a, "b": b, "c": c}),
                    )
                    .unwrap();
                n -= 1;
            }
        }
    }
    store
}

/// `(a, b, c)` of each document on a page.
pub fn abc(response: &PageResponse) -> Vec<(i64, i64, i64)> {
    response
        .page
        .iter()
        .map(|doc| {
            (
                doc["a"].as_i64().unwrap(),
                doc["b"].as_i64().unwrap(),
                doc["c"].as_i64().unwrap(),
            )
        })
        .collect()
}

pub fn ids(response: &PageResponse) -> Vec<String> {
    response
        .page
        .iter()
        .map(|doc| doc["_id"].as_str().unwrap().to_string())
        .collect()
}
