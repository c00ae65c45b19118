//! # Teamwork Organization Records
//!
//! The records the permission backend reads: who is asking, what they are
//! asking about, and which teams, roles and policies grant permissions.
//!
//! ## Overview
//!
//! The teamwork-org crate handles:
//! - **Principals**: Anonymous visitors, users and superusers
//! - **Content Objects**: Permission targets with owner, team and parents
//! - **Teams**: Named groups scoping role grants to their objects
//! - **Roles**: Team-scoped bindings of users to permissions
//! - **Policies**: Object-attached or global grants with principal matchers
//!
//! ## Architecture
//!
//! ```text
//! Principal ──(matcher)──→ Policy ──→ ContentObject (or global)
//!     │                                    │
//!     └──(member)──→ Role ──→ Team ←──(team)┘
//!                                          │
//!                               parents ───┘ (inheritance)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use teamwork_org::{ContentObject, Policy, Principal, Role, Team, User};
//! use teamwork_rbac::{Codename, ContentType};
//!
//! let founder = User::new("founder0");
//! let team = Team::new("docs", founder.id);
//!
//! let doc = ContentObject::new(ContentType::new("wiki", "document"))
//!     .with_creator(founder.id)
//!     .with_team(team.id);
//!
//! let role = Role::new(team.id, "editors")
//!     .with_user(founder.id)
//!     .with_permissions([Codename::new("wiki", "frob")]);
//!
//! let policy = Policy::for_object(doc.content_ref.clone())
//!     .with_anonymous()
//!     .with_permissions([Codename::new("wiki", "xyzzy")]);
//!
//! assert!(policy.matches(&Principal::Anonymous, doc.creator()));
//! ```
//!
//! ## Integration
//!
//! - `teamwork-rbac`: Codenames and content types
//! - `teamwork-backend`: Stores and resolution over these records

pub mod content;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod team;

// Re-export main types for convenience
pub use content::{ContentObject, ContentRef};
pub use policy::{MatchCriterion, Policy, PolicyTarget};
pub use principal::{Principal, PrincipalKey, User};
pub use roles::Role;
pub use team::Team;
