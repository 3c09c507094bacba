//! Continuation-token driven retrieval of large result sets.

mod page;
pub use self::page::{ContinuationToken, Page, PageBuilder, PageRequest};

mod paginator;
pub use self::paginator::{PageSource, PaginationOptions, Paginator};

mod collection;
pub use self::collection::ResultCollection;
