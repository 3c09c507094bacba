//! The per-document result model.

pub(crate) mod expandable;

mod document;
pub use self::document::{DocumentOutcome, DocumentOutcomeBuilder};

mod document_error;
pub use self::document_error::{DocumentError, ErrorCode};

mod statistics;
pub use self::statistics::{BatchStatistics, TextDocumentStatistics};

mod warning;
pub use self::warning::{Warning, WarningCode, WarningSet};
