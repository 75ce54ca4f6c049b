//! Paginated range scans: bound splitting, executor seam, page assembly.

pub mod page;
pub mod range;
pub mod scanner;
pub mod split;

pub use page::{PageRequest, PageResponse, Pages, QueryStream, get_page, pages, stream_query};
pub use range::{IndexRange, TrailingRange};
pub use scanner::{DocumentStream, RangeScanner};
pub use split::{ComparisonOp, FieldComparison, RangeDescriptor, bound_types, split_range};
