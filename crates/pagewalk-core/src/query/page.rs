//! Page requests and the page reader.
//!
//! A page is read by resolving the index's field list, splitting the
//! request's bounds into [`IndexRange`]s, scanning the ranges one after
//! another and stopping once the row cap is reached. Every returned
//! document comes with its [`IndexKey`], computed from the document itself,
//! so any returned key can bound a follow-up request.

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::config::PaginationConfig;
use crate::error::{Error, RequestError};
use crate::key::{IndexKey, IndexValue, index_key_for};
use crate::schema::{DatabaseSchema, resolve_index_fields};
use crate::types::{BY_CREATION_TIME, DEFAULT_TARGET_MAX_ROWS, Document, Order};

use super::range::IndexRange;
use super::scanner::{DocumentStream, RangeScanner};
use super::split::{bound_types, split_range};

/// A request for one page of a table, walked in index order.
///
/// Start and end keys are positions in scan order: for a descending scan
/// the start key is the higher one.
#[derive(Debug, Clone)]
pub struct PageRequest<'s> {
    pub table: String,
    pub index: String,
    pub start_index_key: Option<IndexKey>,
    pub start_inclusive: bool,
    pub end_index_key: Option<IndexKey>,
    pub end_inclusive: bool,
    /// Soft row target, only used when there is no end key.
    pub target_max_rows: Option<usize>,
    /// Hard row cap, always enforced.
    pub absolute_max_rows: Option<usize>,
    pub order: Order,
    /// Index fields, for indexes not described by `schema`.
    pub index_fields: Option<Vec<String>>,
    pub schema: Option<&'s DatabaseSchema>,
}

impl<'s> PageRequest<'s> {
    /// A request for the first page of `table` on `by_creation_time`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            index: BY_CREATION_TIME.to_string(),
            start_index_key: None,
            start_inclusive: false,
            end_index_key: None,
            end_inclusive: true,
            target_max_rows: None,
            absolute_max_rows: None,
            order: Order::Asc,
            index_fields: None,
            schema: None,
        }
    }

    /// A request seeded from configured defaults.
    pub fn with_config(table: impl Into<String>, config: &PaginationConfig) -> Self {
        Self {
            index: config.default_index.clone(),
            target_max_rows: Some(config.target_max_rows),
            absolute_max_rows: config.absolute_max_rows,
            order: config.order,
            ..Self::new(table)
        }
    }

    pub fn index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn start_key(mut self, key: impl Into<IndexKey>) -> Self {
        self.start_index_key = Some(key.into());
        self
    }

    pub fn start_inclusive(mut self, inclusive: bool) -> Self {
        self.start_inclusive = inclusive;
        self
    }

    pub fn end_key(mut self, key: impl Into<IndexKey>) -> Self {
        self.end_index_key = Some(key.into());
        self
    }

    pub fn end_inclusive(mut self, inclusive: bool) -> Self {
        self.end_inclusive = inclusive;
        self
    }

    pub fn target_max_rows(mut self, n: usize) -> Self {
        self.target_max_rows = Some(n);
        self
    }

    pub fn absolute_max_rows(mut self, n: usize) -> Self {
        self.absolute_max_rows = Some(n);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn index_fields<F: Into<String>>(mut self, fields: impl IntoIterator<Item = F>) -> Self {
        self.index_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn schema(mut self, schema: &'s DatabaseSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// The most rows a page for this request may hold.
    ///
    /// With an end key only the absolute cap applies: the page already ends
    /// at a fixed key, and capping it by the target would split it from the
    /// page that follows once more rows land inside it.
    pub fn effective_max_rows(&self) -> usize {
        let absolute = self.absolute_max_rows.unwrap_or(usize::MAX);
        if self.end_index_key.is_some() {
            absolute
        } else {
            absolute.min(self.target_max_rows.unwrap_or(DEFAULT_TARGET_MAX_ROWS))
        }
    }

    fn start_values(&self) -> &[IndexValue] {
        self.start_index_key
            .as_ref()
            .map(IndexKey::values)
            .unwrap_or_default()
    }

    fn end_values(&self) -> &[IndexValue] {
        self.end_index_key
            .as_ref()
            .map(IndexKey::values)
            .unwrap_or_default()
    }
}

/// One page of documents and their index keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResponse {
    pub page: Vec<Document>,
    /// `index_keys[i]` is the key of `page[i]` in the walked index.
    pub index_keys: Vec<IndexKey>,
    /// Whether rows remain in the requested range beyond this page.
    pub has_more: bool,
}

impl PageResponse {
    pub fn len(&self) -> usize {
        self.page.len()
    }

    pub fn is_empty(&self) -> bool {
        self.page.is_empty()
    }

    /// Key of the last row, the exclusive start of the next page.
    pub fn last_key(&self) -> Option<&IndexKey> {
        self.index_keys.last()
    }

    /// Iterate over `(document, key)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Document, &IndexKey)> {
        self.page.iter().zip(&self.index_keys)
    }
}

/// Validated fields and executable ranges for a request.
struct ScanPlan {
    fields: Vec<String>,
    ranges: Vec<IndexRange>,
}

impl ScanPlan {
    fn prepare(request: &PageRequest<'_>) -> Result<Self, Error> {
        let fields = resolve_index_fields(
            &request.table,
            &request.index,
            request.index_fields.as_deref(),
            request.schema,
        )?;

        let start = request.start_values();
        let end = request.end_values();
        check_key_len("start", start, &request.index, &fields)?;
        check_key_len("end", end, &request.index, &fields)?;
        check_bound_order(start, end, request.order)?;

        let (start_op, end_op) =
            bound_types(request.order, request.start_inclusive, request.end_inclusive);
        let ranges = split_range(&fields, start, end, start_op, end_op)
            .iter()
            .map(IndexRange::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { fields, ranges })
    }
}

fn check_key_len(
    side: &'static str,
    key: &[IndexValue],
    index: &str,
    fields: &[String],
) -> Result<(), Error> {
    if key.len() > fields.len() {
        return Err(RequestError::KeyTooLong {
            side,
            index: index.to_string(),
            len: key.len(),
            fields: fields.len(),
        }
        .into());
    }
    Ok(())
}

/// Reject a start key that lies past the end key in scan order. Only the
/// shared leading fields are compared, since both may be prefixes.
fn check_bound_order(start: &[IndexValue], end: &[IndexValue], order: Order) -> Result<(), Error> {
    let n = start.len().min(end.len());
    let inverted = matches!(
        (order, start[..n].cmp(&end[..n])),
        (Order::Asc, Ordering::Greater) | (Order::Desc, Ordering::Less)
    );
    if inverted {
        return Err(RequestError::InvertedBounds {
            order: if order.is_desc() { "descending" } else { "ascending" },
        }
        .into());
    }
    Ok(())
}

/// A lazy, single-pass stream of `(document, key)` pairs for a request.
///
/// Each range is only opened once the previous one is exhausted, so
/// dropping the stream early skips the remaining scans. After the first
/// error the stream ends.
pub struct QueryStream<'a, S: ?Sized> {
    scanner: &'a S,
    table: String,
    index: String,
    order: Order,
    fields: Vec<String>,
    ranges: std::vec::IntoIter<IndexRange>,
    current: Option<DocumentStream<'a>>,
    finished: bool,
}

impl<S: ?Sized> QueryStream<'_, S> {
    /// The resolved index fields keys are projected from.
    pub fn index_fields(&self) -> &[String] {
        &self.fields
    }

    /// Ranges not yet opened.
    pub fn remaining_ranges(&self) -> usize {
        self.ranges.len()
    }
}

impl<'a, S: RangeScanner + ?Sized> Iterator for QueryStream<'a, S> {
    type Item = Result<(Document, IndexKey), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            if let Some(stream) = self.current.as_mut() {
                match stream.next() {
                    Some(Ok(doc)) => {
                        let key = index_key_for(&doc, &self.fields);
                        return Some(Ok((doc, key)));
                    }
                    Some(Err(e)) => {
                        self.finished = true;
                        self.current = None;
                        return Some(Err(e));
                    }
                    None => self.current = None,
                }
            }

            let Some(range) = self.ranges.next() else {
                self.finished = true;
                return None;
            };
            trace!(table = %self.table, index = %self.index, ?range, "opening range scan");
            match self
                .scanner
                .scan_range(&self.table, &self.index, &range, self.order)
            {
                Ok(stream) => self.current = Some(stream),
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Stream every document in the request's range, without a row cap.
///
/// The request is validated and split up front; no scan is issued until
/// the stream is first polled.
pub fn stream_query<'a, S: RangeScanner + ?Sized>(
    scanner: &'a S,
    request: &PageRequest<'_>,
) -> Result<QueryStream<'a, S>, Error> {
    let plan = ScanPlan::prepare(request)?;
    Ok(QueryStream {
        scanner,
        table: request.table.clone(),
        index: request.index.clone(),
        order: request.order,
        fields: plan.fields,
        ranges: plan.ranges.into_iter(),
        current: None,
        finished: false,
    })
}

/// Read one page.
///
/// `has_more` is set only when a row beyond the cap exists. Any scan
/// failure discards the partial page.
pub fn get_page<S: RangeScanner + ?Sized>(
    scanner: &S,
    request: &PageRequest<'_>,
) -> Result<PageResponse, Error> {
    let max_rows = request.effective_max_rows();
    let stream = stream_query(scanner, request)?;
    let ranges = stream.remaining_ranges();

    let mut response = PageResponse::default();
    for item in stream {
        let (doc, key) = item?;
        if response.page.len() >= max_rows {
            response.has_more = true;
            break;
        }
        response.page.push(doc);
        response.index_keys.push(key);
    }

    debug!(
        table = %request.table,
        index = %request.index,
        ranges,
        rows = response.page.len(),
        has_more = response.has_more,
        "read page"
    );
    Ok(response)
}

/// Iterator over consecutive pages, each starting just after the last key
/// of the one before. Ends after the first page without `has_more`, or
/// after the first error.
pub struct Pages<'a, 's, S: ?Sized> {
    scanner: &'a S,
    request: PageRequest<'s>,
    finished: bool,
}

/// Walk a range page by page, starting from `request`.
pub fn pages<'a, 's, S: RangeScanner + ?Sized>(
    scanner: &'a S,
    request: PageRequest<'s>,
) -> Pages<'a, 's, S> {
    Pages {
        scanner,
        request,
        finished: false,
    }
}

impl<S: RangeScanner + ?Sized> Iterator for Pages<'_, '_, S> {
    type Item = Result<PageResponse, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let response = match get_page(self.scanner, &self.request) {
            Ok(response) => response,
            Err(e) => {
                self.finished = true;
                return Some(Err(e));
            }
        };
        match response.last_key() {
            Some(last) if response.has_more => {
                self.request.start_index_key = Some(last.clone());
                self.request.start_inclusive = false;
            }
            _ => self.finished = true,
        }
        Some(Ok(response))
    }
}
