//! Principals
//!
//! The acting party of a permission check: an anonymous visitor, an
//! authenticated user, or a superuser. Identity and group memberships come
//! from the surrounding authentication layer; this module only models them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// A user account as seen by the permission backend.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use teamwork_org::User;
///
/// let group_id = Uuid::now_v7();
/// let user = User::new("tester0").with_group(group_id);
/// assert!(user.is_active);
/// assert!(user.in_group(&group_id));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Stable user ID
    pub id: Uuid,

    /// Login name
    pub username: String,

    /// Direct group memberships
    #[serde(default)]
    pub groups: HashSet<Uuid>,

    /// Whether the account is active (inactive accounts hold no permissions)
    pub is_active: bool,
}

impl User {
    /// Creates a new active user with a generated UUID v7 ID and no groups.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            username: username.into(),
            groups: HashSet::new(),
            is_active: true,
        }
    }

    /// Use a known ID instead of the generated one.
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Add a direct group membership.
    pub fn with_group(mut self, group_id: Uuid) -> Self {
        self.groups.insert(group_id);
        self
    }

    /// Mark the account inactive.
    pub fn deactivated(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Check direct membership in a group.
    pub fn in_group(&self, group_id: &Uuid) -> bool {
        self.groups.contains(group_id)
    }

    /// Check direct membership in any of the given groups.
    pub fn in_any_group(&self, groups: &HashSet<Uuid>) -> bool {
        !self.groups.is_disjoint(groups)
    }
}

/// The principal of a permission check.
///
/// # Examples
///
/// ```
/// use teamwork_org::{Principal, User};
///
/// let anon = Principal::Anonymous;
/// assert!(anon.is_anonymous());
/// assert!(!anon.is_authenticated());
///
/// let user = Principal::Authenticated(User::new("tester0"));
/// assert!(user.is_authenticated());
/// assert!(!user.is_superuser());
///
/// let admin = Principal::Superuser(User::new("admin"));
/// assert!(admin.is_superuser());
/// assert!(!admin.is_authenticated());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "user", rename_all = "snake_case")]
pub enum Principal {
    /// An anonymous visitor
    Anonymous,

    /// A regular signed-in user
    Authenticated(User),

    /// A user holding every registered permission on every object
    Superuser(User),
}

impl Principal {
    /// Check if this is an anonymous visitor.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Principal::Anonymous)
    }

    /// Check if this is a regular (non-superuser) signed-in user.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated(_))
    }

    /// Check if this is a superuser.
    pub fn is_superuser(&self) -> bool {
        matches!(self, Principal::Superuser(_))
    }

    /// Whether the principal may hold permissions at all.
    ///
    /// Anonymous visitors are always "active"; users follow their account flag.
    pub fn is_active(&self) -> bool {
        self.user().map_or(true, |user| user.is_active)
    }

    /// The underlying user account, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Principal::Anonymous => None,
            Principal::Authenticated(user) | Principal::Superuser(user) => Some(user),
        }
    }

    /// The principal's user ID, if any.
    pub fn user_id(&self) -> Option<Uuid> {
        self.user().map(|user| user.id)
    }

    /// A hashable key identifying everything about the principal that
    /// resolution depends on.
    pub fn key(&self) -> PrincipalKey {
        match self {
            Principal::Anonymous => PrincipalKey::Anonymous,
            Principal::Authenticated(user) => PrincipalKey::from_user(user, false),
            Principal::Superuser(user) => PrincipalKey::from_user(user, true),
        }
    }
}

impl Default for Principal {
    fn default() -> Self {
        Self::Anonymous
    }
}

/// Cache key for a principal.
///
/// Two principals with the same key resolve to the same permissions on any
/// object. Custom logic sees the whole [`User`], so the key carries every
/// user field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrincipalKey {
    /// An anonymous visitor
    Anonymous,

    /// A user account
    User {
        /// User ID
        id: Uuid,
        /// Login name
        username: String,
        /// Sorted direct group IDs
        groups: Vec<Uuid>,
        /// Whether the user is a superuser
        superuser: bool,
        /// Whether the account is active
        active: bool,
    },
}

impl PrincipalKey {
    fn from_user(user: &User, superuser: bool) -> Self {
        let mut groups: Vec<Uuid> = user.groups.iter().copied().collect();
        groups.sort();
        PrincipalKey::User {
            id: user.id,
            username: user.username.clone(),
            groups,
            superuser,
            active: user.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_groups() {
        let g1 = Uuid::now_v7();
        let g2 = Uuid::now_v7();
        let user = User::new("tester4").with_group(g1);

        assert!(user.in_group(&g1));
        assert!(!user.in_group(&g2));
        assert!(user.in_any_group(&HashSet::from([g1, g2])));
        assert!(!user.in_any_group(&HashSet::from([g2])));
        assert!(!user.in_any_group(&HashSet::new()));
    }

    #[test]
    fn test_principal_active() {
        assert!(Principal::Anonymous.is_active());
        assert!(Principal::Authenticated(User::new("a")).is_active());
        assert!(!Principal::Authenticated(User::new("b").deactivated()).is_active());
    }

    #[test]
    fn test_principal_key_ignores_group_order() {
        let g1 = Uuid::now_v7();
        let g2 = Uuid::now_v7();
        let id = Uuid::now_v7();
        let a = User::new("a").with_id(id).with_group(g1).with_group(g2);
        let b = User::new("a").with_id(id).with_group(g2).with_group(g1);

        assert_eq!(
            Principal::Authenticated(a.clone()).key(),
            Principal::Authenticated(b).key()
        );
        assert_ne!(
            Principal::Authenticated(a.clone()).key(),
            Principal::Superuser(a).key()
        );
    }

    #[test]
    fn test_principal_key_tracks_rename() {
        let id = Uuid::now_v7();
        let before = Principal::Authenticated(User::new("quux1").with_id(id)).key();
        let after = Principal::Authenticated(User::new("randomguy").with_id(id)).key();
        assert_ne!(before, after);
    }

    #[test]
    fn test_principal_key_tracks_membership_changes() {
        let user = User::new("tester5");
        let before = Principal::Authenticated(user.clone()).key();
        let after = Principal::Authenticated(user.with_group(Uuid::now_v7())).key();
        assert_ne!(before, after);
    }
}
