//! # Filtering, Sorting & Pagination
//!
//! Turns the catalog query string into validated, request-scoped values:
//!
//! - **[`FilterSet`]**: recognised filter keys with typed values
//! - **[`compile`]**: lowers a `FilterSet` for one kind into a sea-query
//!   condition plus its ordered bound values
//! - **[`parse_sorting`]**: whitelist check of `sort_by`/`sort_method`
//! - **[`Page`]**: `limit`/`page` window
//!
//! ```rust,ignore
//! // name contains "expo", music or art, no packages above 0
//! GET /events?name=expo&field=music,art&fees=free&limit=10
//!
//! // sorted by the computed mean rating
//! GET /rentals?sort_by=average_rating&sort_method=desc&limit=20&page=1
//! ```
//!
//! Validation fails fast: a request with any malformed value is rejected as a
//! whole before a query is built.

pub mod filter;
pub mod pagination;
pub mod predicate;
pub mod sort;

pub use filter::{Fees, FilterKey, FilterSet};
pub use pagination::Page;
pub use predicate::{CompiledPredicate, Predicate, compile};
pub use sort::{SafeSort, SortField, parse_sorting, validate};
