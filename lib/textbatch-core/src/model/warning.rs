use serde::{Deserialize, Serialize};

use super::expandable::expandable_enum;

expandable_enum! {
    /// Warning codes reported by the service.
    pub enum WarningCode {
        /// The document contains very long words; some analysis may be degraded.
        LongWordsInDocument => "LongWordsInDocument",
        /// The document was longer than the service limit and was truncated.
        DocumentTruncated => "DocumentTruncated",
    }
}

/// A non-fatal annotation reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[display("{code}: {message}")]
#[serde(rename_all = "camelCase")]
pub struct Warning {
    code: WarningCode,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_ref: Option<String>,
}

impl Warning {
    /// Creates a warning.
    pub fn new(code: impl Into<WarningCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            target_ref: None,
        }
    }

    /// Sets the JSON pointer of the element the warning refers to.
    #[must_use]
    pub fn with_target_ref(mut self, target_ref: impl Into<String>) -> Self {
        self.target_ref = Some(target_ref.into());
        self
    }

    /// The warning code.
    pub fn code(&self) -> &WarningCode {
        &self.code
    }

    /// The warning message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The element the warning refers to, if any.
    pub fn target_ref(&self) -> Option<&str> {
        self.target_ref.as_deref()
    }
}

/// Ordered warnings attached to a document or to a whole collection.
///
/// An absent list of warnings is an empty set, never a missing one.
/// The set only grows while a collection is being assembled; callers get read access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Deref)]
#[serde(transparent)]
pub struct WarningSet(Vec<Warning>);

impl WarningSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if a warning with this code is present.
    pub fn contains_code(&self, code: &WarningCode) -> bool {
        self.0.iter().any(|warning| warning.code() == code)
    }

    /// Iterates over the distinct codes, in first-seen order.
    pub fn codes(&self) -> impl Iterator<Item = &WarningCode> {
        let mut seen = Vec::new();
        self.0.iter().filter_map(move |warning| {
            let code = warning.code();
            if seen.contains(&code) {
                None
            } else {
                seen.push(code);
                Some(code)
            }
        })
    }

    pub(crate) fn push(&mut self, warning: Warning) {
        self.0.push(warning);
    }

    pub(crate) fn extend(&mut self, other: WarningSet) {
        self.0.extend(other.0);
    }
}

impl From<Vec<Warning>> for WarningSet {
    fn from(warnings: Vec<Warning>) -> Self {
        Self(warnings)
    }
}

impl FromIterator<Warning> for WarningSet {
    fn from_iter<I: IntoIterator<Item = Warning>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for WarningSet {
    type Item = Warning;
    type IntoIter = std::vec::IntoIter<Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a WarningSet {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
