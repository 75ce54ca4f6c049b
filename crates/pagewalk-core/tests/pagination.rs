//! Page reader behavior against the in-memory store.

mod common;

use std::cell::Cell;

use pagewalk_core::error::{Error, StoreError};
use pagewalk_core::key::{IndexKey, IndexValue};
use pagewalk_core::memory::MemoryStore;
use pagewalk_core::query::{
    DocumentStream, IndexRange, PageRequest, RangeScanner, get_page, pages, stream_query,
};
use pagewalk_core::types::{Document, Order};
use serde_json::json;

use common::{abc, grid_store, ids, init_tracing};

fn abc_request<'s>() -> PageRequest<'s> {
    PageRequest::new("grid")
        .index("by_abc")
        .index_fields(["a", "b", "c"])
}

/// Wraps a store, counting opened scans and optionally failing one.
struct InstrumentedScanner {
    inner: MemoryStore,
    opened: Cell<usize>,
    fail_open_at: Option<usize>,
    fail_item_at_scan: Option<usize>,
}

impl InstrumentedScanner {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            opened: Cell::new(0),
            fail_open_at: None,
            fail_item_at_scan: None,
        }
    }
}

impl RangeScanner for InstrumentedScanner {
    fn scan_range<'a>(
        &'a self,
        table: &str,
        index: &str,
        range: &IndexRange,
        order: Order,
    ) -> Result<DocumentStream<'a>, Error> {
        let n = self.opened.get();
        self.opened.set(n + 1);
        if self.fail_open_at == Some(n) {
            return Err(StoreError::Backend("store unavailable".into()).into());
        }
        let stream = self.inner.scan_range(table, index, range, order)?;
        if self.fail_item_at_scan == Some(n) {
            let failing = std::iter::once(Err::<Document, Error>(
                StoreError::Backend("connection reset".into()).into(),
            ));
            return Ok(Box::new(stream.take(1).chain(failing)));
        }
        Ok(stream)
    }
}

#[test]
fn test_default_index_walks_creation_order() {
    init_tracing();
    let store = MemoryStore::new();
    store.create_table("messages").unwrap();
    let inserted: Vec<String> = (0..5)
        .map(|i| store.insert("messages", json!({"n": i})).unwrap())
        .collect();

    let response = get_page(&store, &PageRequest::new("messages")).unwrap();
    assert_eq!(ids(&response), inserted);
    assert!(!response.has_more);
    for (doc, key) in response.iter() {
        assert_eq!(key.len(), 2);
        assert_eq!(key.values()[1], IndexValue::from(doc["_id"].as_str().unwrap()));
    }
}

#[test]
fn test_by_id_index() {
    let store = grid_store();
    let request = PageRequest::new("grid").index("by_id").target_max_rows(3);
    let response = get_page(&store, &request).unwrap();
    assert_eq!(ids(&response), vec!["g083", "g084", "g085"]);
    assert_eq!(response.index_keys[0], IndexKey::from(["g083"]));
    assert!(response.has_more);
}

#[test]
fn test_documented_split_against_store() {
    let store = grid_store();
    let request = abc_request()
        .start_key([0, 1, 0])
        .end_key([0, 2, 1])
        .end_inclusive(true);
    let response = get_page(&store, &request).unwrap();
    assert_eq!(abc(&response), vec![(0, 1, 1), (0, 2, 0), (0, 2, 1)]);
    assert!(!response.has_more);
}

#[test]
fn test_target_max_rows_without_end_key() {
    let store = grid_store();
    let request = abc_request().start_key([1]).start_inclusive(true).target_max_rows(2);
    let response = get_page(&store, &request).unwrap();
    assert_eq!(abc(&response), vec![(1, 0, 0), (1, 0, 1)]);
    assert!(response.has_more);
}

#[test]
fn test_end_key_ignores_target_max_rows() {
    let store = grid_store();
    // Six rows lie between the bounds; the target of two does not apply.
    let request = abc_request()
        .start_key([1])
        .start_inclusive(true)
        .end_key([1])
        .target_max_rows(2);
    let response = get_page(&store, &request).unwrap();
    assert_eq!(response.len(), 6);
    assert!(!response.has_more);

    let capped = request.absolute_max_rows(4);
    let response = get_page(&store, &capped).unwrap();
    assert_eq!(response.len(), 4);
    assert!(response.has_more);
}

#[test]
fn test_exact_fit_reports_no_more() {
    let store = grid_store();
    let request = abc_request().start_key([2]).start_inclusive(true).target_max_rows(6);
    let response = get_page(&store, &request).unwrap();
    assert_eq!(response.len(), 6);
    assert!(!response.has_more);
}

#[test]
fn test_key_round_trip_boundary_exactness() {
    let store = grid_store();
    let all = get_page(&store, &abc_request()).unwrap();
    assert_eq!(all.len(), 18);

    for (doc, key) in all.iter() {
        let exclusive = get_page(&store, &abc_request().start_key(key.clone())).unwrap();
        assert!(!exclusive.page.contains(doc), "exclusive start returned {doc}");

        let inclusive = get_page(
            &store,
            &abc_request().start_key(key.clone()).start_inclusive(true),
        )
        .unwrap();
        assert_eq!(inclusive.page.first(), Some(doc));
    }
}

#[test]
fn test_pages_walk_whole_table_both_directions() {
    let store = grid_store();
    let forward: Vec<Document> = pages(&store, abc_request().target_max_rows(4))
        .map(|page| page.unwrap().page)
        .collect::<Vec<_>>()
        .concat();
    assert_eq!(forward.len(), 18);

    let backward: Vec<Document> =
        pages(&store, abc_request().order(Order::Desc).target_max_rows(5))
            .map(|page| page.unwrap().page)
            .collect::<Vec<_>>()
            .concat();
    let mut reversed = forward.clone();
    reversed.reverse();
    assert_eq!(backward, reversed);

    let page_sizes: Vec<usize> = pages(&store, abc_request().target_max_rows(4))
        .map(|page| page.unwrap().len())
        .collect();
    assert_eq!(page_sizes, vec![4, 4, 4, 4, 2]);
}

#[test]
fn test_descending_bounds() {
    let store = grid_store();
    let request = abc_request()
        .order(Order::Desc)
        .start_key([2, 0, 0])
        .end_key([1, 2, 0])
        .end_inclusive(false);
    let response = get_page(&store, &request).unwrap();
    assert_eq!(abc(&response), vec![(1, 2, 1)]);
}

#[test]
fn test_cursor_continuation() {
    let store = grid_store();
    let first = get_page(&store, &abc_request().target_max_rows(5)).unwrap();
    let cursor = first.last_key().unwrap().to_cursor();

    let resumed = IndexKey::from_cursor(&cursor).unwrap();
    let second = get_page(&store, &abc_request().start_key(resumed).target_max_rows(5)).unwrap();
    assert_eq!(abc(&second)[0], (0, 2, 1));
}

#[test]
fn test_nested_field_index_with_missing_values() {
    let store = MemoryStore::new();
    store.create_table("people").unwrap();
    store.define_index("people", "by_city", ["address.city"]).unwrap();
    store
        .insert("people", json!({"name": "ann", "address": {"city": "Oslo"}}))
        .unwrap();
    store.insert("people", json!({"name": "bo"})).unwrap();
    store
        .insert("people", json!({"name": "cy", "address": {"city": "Bergen"}}))
        .unwrap();
    store
        .insert("people", json!({"name": "di", "address": "unknown"}))
        .unwrap();

    let schema = store.schema();
    let request = PageRequest::new("people").index("by_city").schema(&schema);
    let response = get_page(&store, &request).unwrap();
    let names: Vec<&str> = response
        .page
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    // Documents without a city sort first, in creation order.
    assert_eq!(names, vec!["bo", "di", "cy", "ann"]);
    assert_eq!(response.index_keys[0].values()[0], IndexValue::Unset);

    // Continue from an unset key.
    let after_unset = PageRequest::new("people")
        .index("by_city")
        .schema(&schema)
        .start_key(vec![IndexValue::Unset])
        .target_max_rows(1);
    let response = get_page(&store, &after_unset).unwrap();
    assert_eq!(response.page[0]["name"], "cy");
}

#[test]
fn test_large_integer_keys_match_exactly() {
    let store = MemoryStore::new();
    store.create_table("ledger").unwrap();
    store.define_index("ledger", "by_seq", ["seq"]).unwrap();
    store
        .insert("ledger", json!({"name": "a", "seq": 9_007_199_254_740_992_i64}))
        .unwrap();
    store
        .insert("ledger", json!({"name": "b", "seq": 9_007_199_254_740_993_i64}))
        .unwrap();
    store
        .insert("ledger", json!({"name": "c", "seq": 9_007_199_254_740_992.0}))
        .unwrap();

    let schema = store.schema();
    let exact = PageRequest::new("ledger")
        .index("by_seq")
        .schema(&schema)
        .start_key([9_007_199_254_740_993_i64])
        .start_inclusive(true)
        .end_key([9_007_199_254_740_993_i64]);
    let response = get_page(&store, &exact).unwrap();
    let names: Vec<&str> = response
        .page
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["b"]);

    // The float equal to 2^53 shares a key value with the integer.
    let below = PageRequest::new("ledger")
        .index("by_seq")
        .schema(&schema)
        .end_key([9_007_199_254_740_993_i64])
        .end_inclusive(false);
    let response = get_page(&store, &below).unwrap();
    let names: Vec<&str> = response
        .page
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["a", "c"]);
}

#[test]
fn test_scans_open_lazily() {
    let scanner = InstrumentedScanner::new(grid_store());
    // Three ranges holding 1, 4 and 12 rows; two rows plus a peek need two.
    let request = abc_request().start_key([0, 0, 0]).target_max_rows(2);
    assert_eq!(stream_query(&scanner, &request).unwrap().remaining_ranges(), 3);

    let response = get_page(&scanner, &request).unwrap();
    assert_eq!(response.len(), 2);
    assert!(response.has_more);
    assert_eq!(scanner.opened.get(), 2);
}

#[test]
fn test_open_failure_discards_partial_page() {
    let mut scanner = InstrumentedScanner::new(grid_store());
    scanner.fail_open_at = Some(1);
    let request = abc_request().start_key([0, 1, 0]).end_key([0, 2, 1]);
    let err = get_page(&scanner, &request).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::Backend(_))));
}

#[test]
fn test_stream_failure_ends_stream() {
    let mut scanner = InstrumentedScanner::new(grid_store());
    scanner.fail_item_at_scan = Some(0);
    let request = abc_request();
    let items: Vec<_> = stream_query(&scanner, &request).unwrap().collect();
    assert_eq!(items.len(), 2);
    assert!(items[0].is_ok());
    assert!(items[1].is_err());

    let mut scanner = InstrumentedScanner::new(grid_store());
    scanner.fail_item_at_scan = Some(0);
    assert!(get_page(&scanner, &request).is_err());
}

#[test]
fn test_missing_table_propagates_store_error() {
    let store = MemoryStore::new();
    let err = get_page(&store, &PageRequest::new("nope")).unwrap_err();
    assert!(matches!(err, Error::Store(StoreError::TableNotFound(_))));
}
