//! Content object domain models
//!
//! Content objects are the targets of permission checks. They are referenced
//! generically through [`ContentRef`] (content type tag plus identity), may
//! belong to a team, may have an owner, and may name permission parents
//! from which grants are inherited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use teamwork_rbac::ContentType;
use uuid::Uuid;

/// Generic reference to a content object of any type.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use teamwork_org::ContentRef;
/// use teamwork_rbac::ContentType;
///
/// let id = Uuid::now_v7();
/// let doc = ContentRef::new(ContentType::new("wiki", "document"), id);
/// assert_eq!(doc.to_string(), format!("wiki.document:{}", id));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentRef {
    /// Type tag of the referenced object
    pub content_type: ContentType,

    /// Identity of the object within its type
    pub id: Uuid,
}

impl ContentRef {
    /// Creates a reference.
    pub fn new(content_type: ContentType, id: Uuid) -> Self {
        Self { content_type, id }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.content_type, self.id)
    }
}

/// A content object as seen by the permission backend.
///
/// # Architecture
///
/// ```text
/// ContentObject
///   ├─ creator   (owner, for apply_to_owners policies)
///   ├─ team      (scope for team roles)
///   ├─ parents   (permission inheritance)
///   └─ metadata  (visible to custom permission logic)
/// ```
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use teamwork_org::ContentObject;
/// use teamwork_rbac::ContentType;
///
/// let doc_type = ContentType::new("wiki", "document");
/// let owner = Uuid::now_v7();
/// let root = ContentObject::new(doc_type.clone()).with_name("root");
/// let child = ContentObject::new(doc_type)
///     .with_creator(owner)
///     .with_parent(root.content_ref.clone());
///
/// assert_eq!(child.creator(), Some(owner));
/// assert_eq!(child.parents(), &[root.content_ref.clone()]);
/// assert_eq!(root.name(), Some("root"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentObject {
    /// Generic reference (type tag and identity)
    pub content_ref: ContentRef,

    /// User who created (owns) the object
    pub creator: Option<Uuid>,

    /// Team the object belongs to
    pub team: Option<Uuid>,

    /// Objects this one inherits permissions from
    #[serde(default)]
    pub parents: Vec<ContentRef>,

    /// When the object was created
    pub created_at: DateTime<Utc>,

    /// Custom metadata for extensibility
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ContentObject {
    /// Creates a new content object of the given type.
    ///
    /// The object is created with:
    /// - A newly generated UUID v7 ID
    /// - No creator, team or parents
    /// - Current timestamp for created_at
    pub fn new(content_type: ContentType) -> Self {
        Self::with_id(content_type, Uuid::now_v7())
    }

    /// Creates a content object with a known identity.
    pub fn with_id(content_type: ContentType, id: Uuid) -> Self {
        Self {
            content_ref: ContentRef::new(content_type, id),
            creator: None,
            team: None,
            parents: Vec::new(),
            created_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Set the creator (owner).
    pub fn with_creator(mut self, creator_id: Uuid) -> Self {
        self.creator = Some(creator_id);
        self
    }

    /// Associate the object with a team.
    pub fn with_team(mut self, team_id: Uuid) -> Self {
        self.team = Some(team_id);
        self
    }

    /// Add a permission parent.
    pub fn with_parent(mut self, parent: ContentRef) -> Self {
        self.add_parent(parent);
        self
    }

    /// Set the `name` metadata entry.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with_metadata("name", serde_json::Value::String(name.into()))
    }

    /// Set a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Add a permission parent, ignoring duplicates and self-references.
    pub fn add_parent(&mut self, parent: ContentRef) {
        if parent != self.content_ref && !self.parents.contains(&parent) {
            self.parents.push(parent);
        }
    }

    /// Replace all parents with a single one.
    pub fn set_parent(&mut self, parent: ContentRef) {
        self.parents.clear();
        self.add_parent(parent);
    }

    /// Object identity.
    pub fn id(&self) -> Uuid {
        self.content_ref.id
    }

    /// Object type tag.
    pub fn content_type(&self) -> &ContentType {
        &self.content_ref.content_type
    }

    /// Creator (owner) of the object.
    pub fn creator(&self) -> Option<Uuid> {
        self.creator
    }

    /// Team the object belongs to.
    pub fn team(&self) -> Option<Uuid> {
        self.team
    }

    /// Permission parents.
    pub fn parents(&self) -> &[ContentRef] {
        &self.parents
    }

    /// The `name` metadata entry, if it is a string.
    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_type() -> ContentType {
        ContentType::new("wiki", "document")
    }

    #[test]
    fn test_content_object_creation() {
        let doc = ContentObject::new(doc_type());
        assert_eq!(doc.content_type(), &doc_type());
        assert!(doc.creator().is_none());
        assert!(doc.team().is_none());
        assert!(doc.parents().is_empty());
    }

    #[test]
    fn test_add_parent_ignores_self_and_duplicates() {
        let parent = ContentObject::new(doc_type());
        let mut doc = ContentObject::new(doc_type());

        doc.add_parent(doc.content_ref.clone());
        assert!(doc.parents().is_empty());

        doc.add_parent(parent.content_ref.clone());
        doc.add_parent(parent.content_ref.clone());
        assert_eq!(doc.parents().len(), 1);
    }

    #[test]
    fn test_set_parent_replaces() {
        let a = ContentObject::new(doc_type());
        let b = ContentObject::new(doc_type());
        let mut doc = ContentObject::new(doc_type()).with_parent(a.content_ref.clone());

        doc.set_parent(b.content_ref.clone());
        assert_eq!(doc.parents(), &[b.content_ref]);
    }

    #[test]
    fn test_name_metadata() {
        let doc = ContentObject::new(doc_type()).with_name("Quuxy");
        assert_eq!(doc.name(), Some("Quuxy"));

        let numbered = ContentObject::new(doc_type()).with_metadata("name", serde_json::json!(7));
        assert_eq!(numbered.name(), None);
    }
}
