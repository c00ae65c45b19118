//! Policy domain models
//!
//! A policy grants a set of permission codenames to every principal its
//! matcher accepts. Policies are attached to one content object or apply
//! globally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use teamwork_rbac::Codename;
use uuid::Uuid;

use crate::content::ContentRef;
use crate::principal::Principal;

/// What a policy is attached to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "scope", content = "object", rename_all = "snake_case")]
pub enum PolicyTarget {
    /// Fallback for objects whose ancestry carries no policy of its own
    Global,

    /// A single content object
    Object(ContentRef),
}

impl PolicyTarget {
    /// The targeted object, if any.
    pub fn object(&self) -> Option<&ContentRef> {
        match self {
            PolicyTarget::Global => None,
            PolicyTarget::Object(content_ref) => Some(content_ref),
        }
    }

    /// Check if the policy applies globally.
    pub fn is_global(&self) -> bool {
        matches!(self, PolicyTarget::Global)
    }
}

/// The matcher criterion by which a policy applied to a principal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MatchCriterion {
    /// `anonymous` flag and an anonymous principal
    Anonymous,
    /// `authenticated` flag and a signed-in, non-superuser principal
    Authenticated,
    /// Principal listed in `users`
    User,
    /// Principal in one of `groups`
    Group,
    /// `apply_to_owners` flag and the principal created the object
    Owner,
}

impl MatchCriterion {
    /// Whether the criterion names the principal explicitly (`users`/`groups`).
    pub fn is_specific(&self) -> bool {
        matches!(self, Self::User | Self::Group)
    }

    /// Whether the criterion applies to a whole class of principals.
    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Anonymous | Self::Authenticated)
    }

    /// Get the string representation of the criterion.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Authenticated => "authenticated",
            Self::User => "user",
            Self::Group => "group",
            Self::Owner => "owner",
        }
    }
}

/// A permission policy.
///
/// # Matching
///
/// Criteria are independently sufficient (OR'd):
/// - `anonymous`: anonymous visitors
/// - `authenticated`: any signed-in, non-superuser user
/// - `users`: listed user IDs
/// - `groups`: users with a direct membership in a listed group
/// - `apply_to_owners`: the creator of the object being checked
///
/// A policy with no flags and no users or groups matches nobody.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use teamwork_org::{ContentObject, Policy, Principal, User};
/// use teamwork_rbac::{Codename, ContentType};
///
/// let doc = ContentObject::new(ContentType::new("wiki", "document"));
/// let policy = Policy::for_object(doc.content_ref.clone())
///     .with_authenticated()
///     .with_permissions([Codename::new("wiki", "xyzzy")]);
///
/// let user = Principal::Authenticated(User::new("tester0"));
/// assert!(policy.matches(&user, doc.creator()));
/// assert!(!policy.matches(&Principal::Anonymous, doc.creator()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Unique policy ID
    pub id: Uuid,

    /// Object the policy is attached to, or global
    pub target: PolicyTarget,

    /// Applies to anonymous visitors
    #[serde(default)]
    pub anonymous: bool,

    /// Applies to any signed-in user
    #[serde(default)]
    pub authenticated: bool,

    /// Applies to the creator of the object
    #[serde(default)]
    pub apply_to_owners: bool,

    /// Explicit user IDs the policy applies to
    #[serde(default)]
    pub users: HashSet<Uuid>,

    /// Group IDs whose direct members the policy applies to
    #[serde(default)]
    pub groups: HashSet<Uuid>,

    /// Granted permission codenames
    #[serde(default)]
    pub permissions: BTreeSet<Codename>,

    /// When the policy was created
    pub created_at: DateTime<Utc>,
}

impl Policy {
    /// Creates a policy with no matcher criteria and no permissions.
    pub fn new(target: PolicyTarget) -> Self {
        Self {
            id: Uuid::now_v7(),
            target,
            anonymous: false,
            authenticated: false,
            apply_to_owners: false,
            users: HashSet::new(),
            groups: HashSet::new(),
            permissions: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }

    /// Creates an empty policy attached to a content object.
    pub fn for_object(content_ref: ContentRef) -> Self {
        Self::new(PolicyTarget::Object(content_ref))
    }

    /// Creates an empty global policy.
    pub fn global() -> Self {
        Self::new(PolicyTarget::Global)
    }

    /// Match anonymous visitors.
    pub fn with_anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    /// Match any signed-in user.
    pub fn with_authenticated(mut self) -> Self {
        self.authenticated = true;
        self
    }

    /// Match the object's creator.
    pub fn with_owners(mut self) -> Self {
        self.apply_to_owners = true;
        self
    }

    /// Match a specific user.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.users.insert(user_id);
        self
    }

    /// Match direct members of a group.
    pub fn with_group(mut self, group_id: Uuid) -> Self {
        self.groups.insert(group_id);
        self
    }

    /// Grant permissions.
    pub fn with_permissions<I>(mut self, codenames: I) -> Self
    where
        I: IntoIterator<Item = Codename>,
    {
        self.permissions.extend(codenames);
        self
    }

    /// Grant a permission.
    pub fn grant(&mut self, codename: Codename) {
        self.permissions.insert(codename);
    }

    /// Check whether any matcher criterion is configured.
    pub fn has_matcher(&self) -> bool {
        self.anonymous
            || self.authenticated
            || self.apply_to_owners
            || !self.users.is_empty()
            || !self.groups.is_empty()
    }

    /// Check whether the policy applies to a principal.
    ///
    /// # Arguments
    ///
    /// * `principal` - The principal being checked
    /// * `owner` - Creator of the object the policy is evaluated for
    pub fn matches(&self, principal: &Principal, owner: Option<Uuid>) -> bool {
        self.matched_by(principal, owner).is_some()
    }

    /// The most specific criterion by which the policy applies to a principal.
    ///
    /// Specificity order: `users`, `groups`, `apply_to_owners`, then
    /// `authenticated` (or `anonymous` for anonymous visitors).
    pub fn matched_by(&self, principal: &Principal, owner: Option<Uuid>) -> Option<MatchCriterion> {
        let user = match principal {
            Principal::Anonymous => {
                return self.anonymous.then_some(MatchCriterion::Anonymous);
            }
            Principal::Authenticated(user) | Principal::Superuser(user) => user,
        };

        if self.users.contains(&user.id) {
            Some(MatchCriterion::User)
        } else if user.in_any_group(&self.groups) {
            Some(MatchCriterion::Group)
        } else if self.apply_to_owners && owner == Some(user.id) {
            Some(MatchCriterion::Owner)
        } else if self.authenticated && principal.is_authenticated() {
            Some(MatchCriterion::Authenticated)
        } else {
            None
        }
    }
}
