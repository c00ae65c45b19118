//! Team roles
//!
//! A role belongs to exactly one team and binds a set of member users to a
//! set of permission codenames. Membership is direct only; groups do not
//! confer role membership.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use teamwork_rbac::Codename;
use uuid::Uuid;

/// A role within a team.
///
/// The role's permissions apply only to content objects associated with
/// the owning team.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use teamwork_org::Role;
/// use teamwork_rbac::Codename;
///
/// let team_id = Uuid::now_v7();
/// let user_id = Uuid::now_v7();
/// let mut role = Role::new(team_id, "editors");
/// role.add_user(user_id);
/// role.grant(Codename::new("wiki", "frob"));
///
/// assert!(role.has_member(&user_id));
/// assert!(role.grants(&Codename::new("wiki", "frob")));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique role ID
    pub id: Uuid,

    /// Team that owns the role
    pub team_id: Uuid,

    /// Human-readable name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Direct member users
    #[serde(default)]
    pub users: HashSet<Uuid>,

    /// Granted permission codenames
    #[serde(default)]
    pub permissions: BTreeSet<Codename>,

    /// When the role was created
    pub created_at: DateTime<Utc>,
}

impl Role {
    /// Creates an empty role within a team.
    pub fn new(team_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            team_id,
            name: name.into(),
            description: None,
            users: HashSet::new(),
            permissions: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Add a member (builder form).
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.add_user(user_id);
        self
    }

    /// Grant permissions (builder form).
    pub fn with_permissions<I>(mut self, codenames: I) -> Self
    where
        I: IntoIterator<Item = Codename>,
    {
        self.permissions.extend(codenames);
        self
    }

    /// Add a direct member.
    pub fn add_user(&mut self, user_id: Uuid) {
        self.users.insert(user_id);
    }

    /// Remove a direct member.
    ///
    /// # Returns
    ///
    /// `true` if the user was a member
    pub fn remove_user(&mut self, user_id: &Uuid) -> bool {
        self.users.remove(user_id)
    }

    /// Check direct membership.
    pub fn has_member(&self, user_id: &Uuid) -> bool {
        self.users.contains(user_id)
    }

    /// Grant a permission.
    pub fn grant(&mut self, codename: Codename) {
        self.permissions.insert(codename);
    }

    /// Revoke a permission.
    pub fn revoke(&mut self, codename: &Codename) -> bool {
        self.permissions.remove(codename)
    }

    /// Check whether the role grants a permission.
    pub fn grants(&self, codename: &Codename) -> bool {
        self.permissions.contains(codename)
    }
}
