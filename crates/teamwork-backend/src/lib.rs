//! # Teamwork Permission Backend
//!
//! Object-level permission resolution over teams, roles and policies.
//!
//! ## Overview
//!
//! The teamwork-backend crate handles:
//! - **Resolution**: Computing every codename a principal holds on an object
//! - **Inheritance**: Following parent links through acyclic or cyclic graphs
//! - **Custom Logic**: Per-content-type hooks granting codenames dynamically
//! - **Caching**: Memoising resolutions until the store changes
//!
//! ## Architecture
//!
//! ```text
//! PermissionBackend
//!   ├─ PermissionCache   (principal, object) → PermissionSet @ revision
//!   └─ ResolutionEngine
//!        ├─ ContentTypeRegistry   (superuser universe, logic codenames)
//!        └─ PermissionStore       (objects, policies, teams, roles, logic)
//! ```
//!
//! ## Resolution
//!
//! Superusers receive every codename registered for the object's type.
//! Everyone else receives, in the default layered mode:
//!
//! - per source node, grants naming them (the node team's roles,
//!   `users`/`groups` policies), or if there are none, grants for their
//!   class (`authenticated`/`anonymous`)
//! - plus `apply_to_owners` grants when they created the object
//! - plus whatever the type's custom logic approves
//!
//! Policies come from the object itself, or failing that from the nearest
//! ancestors carrying any, or failing that from the global policies.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use teamwork_backend::{MemoryStore, PermissionBackend};
//! use teamwork_org::{ContentObject, Principal, Role, Team, User};
//! use teamwork_rbac::{Codename, ContentType, ContentTypeRegistry};
//!
//! let doc_type = ContentType::new("wiki", "document");
//! let registry = ContentTypeRegistry::builder()
//!     .register(doc_type.clone(), ["frob", "xyzzy", "hello"])
//!     .build();
//!
//! let founder = User::new("founder0");
//! let member = User::new("tester2");
//! let team = Team::new("team1", founder.id);
//! let doc = ContentObject::new(doc_type).with_team(team.id);
//! let doc_ref = doc.content_ref.clone();
//!
//! let store = Arc::new(MemoryStore::new());
//! store.insert_team(team.clone());
//! store.insert_object(doc);
//! store
//!     .insert_role(
//!         Role::new(team.id, "role1")
//!             .with_user(member.id)
//!             .with_permissions([Codename::new("wiki", "frob")]),
//!     )
//!     .unwrap();
//!
//! let backend = PermissionBackend::new(store, Arc::new(registry));
//! let perms = backend
//!     .get_all_permissions(&Principal::Authenticated(member), Some(&doc_ref))
//!     .unwrap();
//! assert_eq!(perms.sorted(), vec!["wiki.frob".to_string()]);
//!
//! let admin = Principal::Superuser(User::new("admin"));
//! assert_eq!(backend.get_all_permissions(&admin, Some(&doc_ref)).unwrap().len(), 3);
//! ```
//!
//! ## Integration
//!
//! - `teamwork-rbac`: Codenames, permission sets, content type registry
//! - `teamwork-org`: Principals, content objects, teams, roles, policies

pub mod backend;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod logic;
pub mod store;

// Re-export main types for convenience
pub use backend::PermissionBackend;
pub use cache::{CacheKey, CacheStats, PermissionCache};
pub use config::{BackendConfig, ConfigError, HookFailurePolicy, ResolutionMode};
pub use engine::ResolutionEngine;
pub use error::{BackendError, BackendResult};
pub use logic::{LogicError, PermissionLogic};
pub use store::{ContentStore, MemoryStore, PermissionStore, PolicyStore, StoreError, TeamStore};
