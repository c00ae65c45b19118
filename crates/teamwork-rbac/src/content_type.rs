//! # Content Types
//!
//! Content types tag every kind of object permissions can be checked
//! against, and the registry records which codenames exist for each type.
//! The registry is built once at startup and shared read-only afterwards.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::codename::Codename;

/// A content type, identified by application label and model name.
///
/// # Example
///
/// ```
/// use teamwork_rbac::ContentType;
///
/// let doc = ContentType::new("wiki", "document");
/// assert_eq!(doc.to_string(), "wiki.document");
/// assert_eq!(ContentType::parse("wiki.document"), Some(doc));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentType {
    /// Application label (namespace of the type's codenames).
    pub app_label: String,
    /// Model name within the application.
    pub model: String,
}

impl ContentType {
    /// Create a content type.
    pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            model: model.into().to_lowercase(),
        }
    }

    /// Parse from `app_label.model`.
    pub fn parse(s: &str) -> Option<Self> {
        let (app_label, model) = s.split_once('.')?;
        if app_label.is_empty() || model.is_empty() || model.contains('.') {
            return None;
        }
        Some(Self::new(app_label, model))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model)
    }
}

/// Registry of the codenames defined for each content type.
///
/// Built with [`ContentTypeRegistry::builder`] and never mutated afterwards.
/// The set registered for a type is the permission universe a superuser
/// receives on objects of that type, and the set custom logic hooks are
/// consulted for.
///
/// # Example
///
/// ```
/// use teamwork_rbac::{Codename, ContentType, ContentTypeRegistry};
///
/// let doc = ContentType::new("wiki", "document");
/// let registry = ContentTypeRegistry::builder()
///     .register(doc.clone(), ["frob", "xyzzy"])
///     .build();
///
/// assert!(registry.is_registered(&doc));
/// assert!(registry.has_codename(&doc, &Codename::new("wiki", "frob")));
/// assert_eq!(registry.codenames(&doc).count(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ContentTypeRegistry {
    types: HashMap<ContentType, BTreeSet<Codename>>,
}

impl ContentTypeRegistry {
    /// Start building a registry.
    pub fn builder() -> ContentTypeRegistryBuilder {
        ContentTypeRegistryBuilder::default()
    }

    /// Whether the content type is known to this registry.
    pub fn is_registered(&self, content_type: &ContentType) -> bool {
        self.types.contains_key(content_type)
    }

    /// Codenames registered for a content type (empty if unknown).
    pub fn codenames<'a>(
        &'a self,
        content_type: &ContentType,
    ) -> impl Iterator<Item = &'a Codename> + 'a {
        self.types.get(content_type).into_iter().flatten()
    }

    /// Whether a codename is registered for a content type.
    pub fn has_codename(&self, content_type: &ContentType, codename: &Codename) -> bool {
        self.types
            .get(content_type)
            .is_some_and(|codenames| codenames.contains(codename))
    }

    /// All registered content types.
    pub fn content_types(&self) -> impl Iterator<Item = &ContentType> {
        self.types.keys()
    }

    /// Number of registered content types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Builder for [`ContentTypeRegistry`].
#[derive(Debug, Default)]
pub struct ContentTypeRegistryBuilder {
    types: HashMap<ContentType, BTreeSet<Codename>>,
}

impl ContentTypeRegistryBuilder {
    /// Register bare codenames for a content type.
    ///
    /// Codenames are namespaced by the type's application label. Registering
    /// the same type twice extends its codename set.
    pub fn register<I, S>(mut self, content_type: ContentType, codenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.types.entry(content_type.clone()).or_default();
        for name in codenames {
            entry.insert(Codename::for_content_type(&content_type, name));
        }
        self
    }

    /// Finish building.
    pub fn build(self) -> ContentTypeRegistry {
        ContentTypeRegistry { types: self.types }
    }
}
