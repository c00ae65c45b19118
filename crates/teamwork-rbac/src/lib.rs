//! # Teamwork RBAC
//!
//! Permission vocabulary shared by the teamwork crates.
//!
//! ## Overview
//!
//! The teamwork-rbac crate handles:
//! - **Content Types**: Tags for every kind of object permissions apply to
//! - **Codenames**: Namespaced permission names (`app_label.codename`)
//! - **Permission Sets**: Resolved collections of codenames
//! - **Registry**: The codenames registered for each content type
//!
//! ## Architecture
//!
//! ```text
//! ContentType = app_label + model
//! Codename    = app_label + codename
//!
//! Examples:
//!   "wiki.document"            - content type
//!   "wiki.frob"                - permission on wiki content
//!   "wiki.add_document_child"  - permission on wiki content
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use teamwork_rbac::{Codename, ContentType, ContentTypeRegistry, PermissionSet};
//!
//! let doc = ContentType::new("wiki", "document");
//! let registry = ContentTypeRegistry::builder()
//!     .register(doc.clone(), ["frob", "xyzzy", "hello"])
//!     .build();
//!
//! // The full universe for a type (what a superuser receives)
//! let universe: PermissionSet = registry.codenames(&doc).cloned().collect();
//! assert!(universe.contains("wiki.frob"));
//! assert_eq!(universe.len(), 3);
//! ```
//!
//! ## Integration with teamwork-org
//!
//! Roles and policies in `teamwork-org` grant [`Codename`]s; the
//! `teamwork-backend` resolution engine unions them into a [`PermissionSet`].

pub mod codename;
pub mod content_type;
pub mod permissions;

// Re-export main types for convenience
pub use codename::{Codename, CodenameError};
pub use content_type::{ContentType, ContentTypeRegistry, ContentTypeRegistryBuilder};
pub use permissions::PermissionSet;
