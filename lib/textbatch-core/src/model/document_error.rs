use serde::{Deserialize, Serialize};

use super::expandable::expandable_enum;

expandable_enum! {
    /// Error codes reported by the service for a document, an action, or a whole job.
    pub enum ErrorCode {
        /// The request is malformed.
        InvalidRequest => "InvalidRequest",
        /// An argument of the request is invalid.
        InvalidArgument => "InvalidArgument",
        /// The service failed while processing the request.
        InternalServerError => "InternalServerError",
        /// The service is temporarily unavailable.
        ServiceUnavailable => "ServiceUnavailable",
        /// The requested resource does not exist.
        NotFound => "NotFound",
        /// A parameter value is invalid.
        InvalidParameterValue => "InvalidParameterValue",
        /// The request body could not be read.
        InvalidRequestBodyFormat => "InvalidRequestBodyFormat",
        /// The request contained no documents.
        EmptyRequest => "EmptyRequest",
        /// Input records are missing from the request.
        MissingInputRecords => "MissingInputRecords",
        /// The document is invalid (empty text, too long, ...).
        InvalidDocument => "InvalidDocument",
        /// The requested model version does not exist.
        ModelVersionIncorrect => "ModelVersionIncorrect",
        /// The document batch is invalid (too many documents, ...).
        InvalidDocumentBatch => "InvalidDocumentBatch",
        /// The document language is not supported.
        UnsupportedLanguageCode => "UnsupportedLanguageCode",
        /// The country hint is invalid.
        InvalidCountryHint => "InvalidCountryHint",
    }
}

/// A failure reported by the service.
///
/// Used for a single document, for a whole action, or for the job itself. A document
/// error never aborts the enumeration of its sibling documents: it is yielded in place
/// as an errored [`DocumentOutcome`](super::DocumentOutcome).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::Display, derive_more::Error)]
#[display("{code}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct DocumentError {
    code: ErrorCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl DocumentError {
    /// Creates a new error with a code and a human readable message.
    pub fn new(code: impl Into<ErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            target: None,
            details: None,
        }
    }

    /// Sets the element of the request the error refers to.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Attaches the service-specific inner error payload.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The error code.
    pub fn code(&self) -> &ErrorCode {
        &self.code
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The element of the request the error refers to, if any.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// The inner error payload, kept opaque.
    pub fn details(&self) -> Option<&serde_json::Value> {
        self.details.as_ref()
    }
}
