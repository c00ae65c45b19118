//! # Codenames
//!
//! A codename names one permission. Codenames are namespaced by the
//! application label of the content type they were registered for,
//! e.g. `wiki.frob` or `documents.add_document_child`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::content_type::ContentType;

/// Errors raised while parsing a codename string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodenameError {
    /// The string is not of the form `app_label.codename`.
    #[error("Malformed codename: {0:?} (expected \"app_label.codename\")")]
    Malformed(String),
}

/// A namespaced permission codename.
///
/// Serializes as its full string form (`"wiki.frob"`).
///
/// # Example
///
/// ```
/// use teamwork_rbac::Codename;
///
/// let perm = Codename::new("wiki", "frob");
/// assert_eq!(perm.to_string(), "wiki.frob");
///
/// let parsed = Codename::parse("wiki.frob").unwrap();
/// assert_eq!(parsed, perm);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(into = "String", try_from = "String")]
pub struct Codename {
    /// Application label the permission belongs to.
    pub app_label: String,
    /// Bare codename within the application (e.g. `frob`).
    pub codename: String,
}

impl Codename {
    /// Create a codename from its application label and bare name.
    pub fn new(app_label: impl Into<String>, codename: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            codename: codename.into(),
        }
    }

    /// Create a codename namespaced by a content type's application label.
    ///
    /// # Example
    ///
    /// ```
    /// use teamwork_rbac::{Codename, ContentType};
    ///
    /// let doc = ContentType::new("wiki", "document");
    /// assert_eq!(Codename::for_content_type(&doc, "hello").to_string(), "wiki.hello");
    /// ```
    pub fn for_content_type(content_type: &ContentType, codename: impl Into<String>) -> Self {
        Self::new(content_type.app_label.clone(), codename)
    }

    /// Parse from the `app_label.codename` form.
    ///
    /// The application label is everything before the first `.`; the bare
    /// codename may not be empty.
    ///
    /// # Returns
    ///
    /// `Some(Codename)` if valid, `None` otherwise
    pub fn parse(s: &str) -> Option<Self> {
        let (app_label, codename) = s.split_once('.')?;
        if app_label.is_empty() || codename.is_empty() {
            return None;
        }
        Some(Self::new(app_label, codename))
    }

    /// The full `app_label.codename` string.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.app_label, self.codename)
    }
}

impl fmt::Display for Codename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.codename)
    }
}

impl From<Codename> for String {
    fn from(codename: Codename) -> Self {
        codename.full_name()
    }
}

impl TryFrom<String> for Codename {
    type Error = CodenameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Codename::parse(&value).ok_or(CodenameError::Malformed(value))
    }
}

impl std::str::FromStr for Codename {
    type Err = CodenameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Codename::parse(s).ok_or_else(|| CodenameError::Malformed(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codename_display() {
        let perm = Codename::new("wiki", "add_document_child");
        assert_eq!(perm.to_string(), "wiki.add_document_child");
        assert_eq!(perm.full_name(), "wiki.add_document_child");
    }

    #[test]
    fn test_codename_parse() {
        let perm = Codename::parse("wiki.frob").unwrap();
        assert_eq!(perm.app_label, "wiki");
        assert_eq!(perm.codename, "frob");

        // Only the first dot separates the namespace
        let dotted = Codename::parse("wiki.frob.v2").unwrap();
        assert_eq!(dotted.app_label, "wiki");
        assert_eq!(dotted.codename, "frob.v2");
    }

    #[test]
    fn test_codename_parse_rejects_malformed() {
        assert!(Codename::parse("frob").is_none());
        assert!(Codename::parse(".frob").is_none());
        assert!(Codename::parse("wiki.").is_none());
        assert_eq!(
            "frob".parse::<Codename>(),
            Err(CodenameError::Malformed("frob".to_string()))
        );
    }

    #[test]
    fn test_codename_serializes_as_string() {
        let perm = Codename::new("wiki", "xyzzy");
        let json = serde_json::to_string(&perm).unwrap();
        assert_eq!(json, "\"wiki.xyzzy\"");

        let bad: Result<Codename, _> = serde_json::from_str("\"xyzzy\"");
        assert!(bad.is_err());
    }
}
