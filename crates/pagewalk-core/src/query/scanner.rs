//! The range-scan executor seam.

use crate::error::Error;
use crate::types::{Document, Order};

use super::range::IndexRange;

/// A lazily consumed stream of documents from one range scan.
pub type DocumentStream<'a> = Box<dyn Iterator<Item = Result<Document, Error>> + 'a>;

/// A document store that can scan one [`IndexRange`] of a table's index.
///
/// Implementations must return exactly the documents inside `range`, in
/// index order for `order`, and may fetch them lazily as the stream is
/// consumed. Failures are reported either when opening the scan or as an
/// `Err` item; both abort the page being read.
pub trait RangeScanner {
    fn scan_range<'a>(
        &'a self,
        table: &str,
        index: &str,
        range: &IndexRange,
        order: Order,
    ) -> Result<DocumentStream<'a>, Error>;
}

impl<S: RangeScanner + ?Sized> RangeScanner for &S {
    fn scan_range<'a>(
        &'a self,
        table: &str,
        index: &str,
        range: &IndexRange,
        order: Order,
    ) -> Result<DocumentStream<'a>, Error> {
        (**self).scan_range(table, index, range, order)
    }
}
