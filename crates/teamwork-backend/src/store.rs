//! Record stores
//!
//! Read-only traits the resolution engine consumes, and [`MemoryStore`], a
//! thread-safe in-memory implementation of all of them.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use teamwork_org::{ContentObject, ContentRef, Policy, Role, Team};
use teamwork_rbac::ContentType;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::logic::PermissionLogic;

/// Store write errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// A role referenced a team the store does not hold
    #[error("Unknown team: {0}")]
    UnknownTeam(Uuid),
}

/// Content objects and their per-type custom logic.
pub trait ContentStore: Send + Sync {
    /// Look up a content object by reference.
    fn object(&self, content_ref: &ContentRef) -> Option<ContentObject>;

    /// Custom permission logic registered for a content type.
    fn custom_logic_of(&self, content_type: &ContentType) -> Option<Arc<dyn PermissionLogic>>;
}

/// Policy lookups.
pub trait PolicyStore: Send + Sync {
    /// Policies attached directly to an object.
    fn policies_for(&self, content_ref: &ContentRef) -> Vec<Policy>;

    /// Policies not attached to any object.
    fn global_policies(&self) -> Vec<Policy>;
}

/// Team and role lookups.
pub trait TeamStore: Send + Sync {
    /// Look up a team.
    fn team(&self, team_id: &Uuid) -> Option<Team>;

    /// Roles belonging to a team.
    fn roles_of(&self, team_id: &Uuid) -> Vec<Role>;
}

/// Everything the resolution engine reads.
pub trait PermissionStore: ContentStore + PolicyStore + TeamStore {
    /// Write counter; changes whenever any record changes.
    fn revision(&self) -> u64;
}

/// In-memory store.
///
/// Every write bumps the revision, which expires cached resolutions.
///
/// # Examples
///
/// ```
/// use teamwork_backend::store::{MemoryStore, PermissionStore, PolicyStore};
/// use teamwork_org::{ContentObject, Policy};
/// use teamwork_rbac::{Codename, ContentType};
///
/// let store = MemoryStore::new();
/// let doc = ContentObject::new(ContentType::new("wiki", "document"));
/// let doc_ref = doc.content_ref.clone();
/// store.insert_object(doc);
/// store.insert_policy(
///     Policy::for_object(doc_ref.clone())
///         .with_anonymous()
///         .with_permissions([Codename::new("wiki", "frob")]),
/// );
///
/// assert_eq!(store.policies_for(&doc_ref).len(), 1);
/// assert_eq!(store.revision(), 2);
/// ```
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<ContentRef, ContentObject>>,
    policies: RwLock<HashMap<Uuid, Policy>>,
    teams: RwLock<HashMap<Uuid, Team>>,
    roles: RwLock<HashMap<Uuid, Role>>,
    logic: RwLock<HashMap<ContentType, Arc<dyn PermissionLogic>>>,
    revision: AtomicU64,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("objects", &self.objects.read().len())
            .field("policies", &self.policies.read().len())
            .field("teams", &self.teams.read().len())
            .field("roles", &self.roles.read().len())
            .field("revision", &self.revision())
            .finish()
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    /// Insert or replace a content object.
    pub fn insert_object(&self, object: ContentObject) {
        debug!(object = %object.content_ref, "Storing content object");
        self.objects
            .write()
            .insert(object.content_ref.clone(), object);
        self.bump();
    }

    /// Remove a content object and the policies attached to it.
    pub fn remove_object(&self, content_ref: &ContentRef) -> Option<ContentObject> {
        let removed = self.objects.write().remove(content_ref);
        self.policies
            .write()
            .retain(|_, policy| policy.target.object() != Some(content_ref));
        self.bump();
        removed
    }

    /// Insert or replace a team.
    pub fn insert_team(&self, team: Team) {
        self.teams.write().insert(team.id, team);
        self.bump();
    }

    /// Remove a team and its roles.
    pub fn remove_team(&self, team_id: &Uuid) -> Option<Team> {
        let removed = self.teams.write().remove(team_id);
        self.roles.write().retain(|_, role| role.team_id != *team_id);
        self.bump();
        removed
    }

    /// Insert or replace a role.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownTeam`] if the role's team is not stored.
    pub fn insert_role(&self, role: Role) -> Result<(), StoreError> {
        if !self.teams.read().contains_key(&role.team_id) {
            return Err(StoreError::UnknownTeam(role.team_id));
        }
        self.roles.write().insert(role.id, role);
        self.bump();
        Ok(())
    }

    /// Remove a role.
    pub fn remove_role(&self, role_id: &Uuid) -> Option<Role> {
        let removed = self.roles.write().remove(role_id);
        self.bump();
        removed
    }

    /// Insert or replace a policy.
    pub fn insert_policy(&self, policy: Policy) {
        self.policies.write().insert(policy.id, policy);
        self.bump();
    }

    /// Remove a policy.
    pub fn remove_policy(&self, policy_id: &Uuid) -> Option<Policy> {
        let removed = self.policies.write().remove(policy_id);
        self.bump();
        removed
    }

    /// Register custom permission logic for a content type, replacing any
    /// previous registration.
    pub fn register_logic(&self, content_type: ContentType, logic: Arc<dyn PermissionLogic>) {
        debug!(content_type = %content_type, "Registering permission logic");
        self.logic.write().insert(content_type, logic);
        self.bump();
    }
}

impl ContentStore for MemoryStore {
    fn object(&self, content_ref: &ContentRef) -> Option<ContentObject> {
        self.objects.read().get(content_ref).cloned()
    }

    fn custom_logic_of(&self, content_type: &ContentType) -> Option<Arc<dyn PermissionLogic>> {
        self.logic.read().get(content_type).cloned()
    }
}

impl PolicyStore for MemoryStore {
    fn policies_for(&self, content_ref: &ContentRef) -> Vec<Policy> {
        self.policies
            .read()
            .values()
            .filter(|policy| policy.target.object() == Some(content_ref))
            .cloned()
            .collect()
    }

    fn global_policies(&self) -> Vec<Policy> {
        self.policies
            .read()
            .values()
            .filter(|policy| policy.target.is_global())
            .cloned()
            .collect()
    }
}

impl TeamStore for MemoryStore {
    fn team(&self, team_id: &Uuid) -> Option<Team> {
        self.teams.read().get(team_id).cloned()
    }

    fn roles_of(&self, team_id: &Uuid) -> Vec<Role> {
        self.roles
            .read()
            .values()
            .filter(|role| role.team_id == *team_id)
            .cloned()
            .collect()
    }
}

impl PermissionStore for MemoryStore {
    fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::LogicError;
    use teamwork_org::{Principal, User};
    use teamwork_rbac::Codename;

    fn doc_type() -> ContentType {
        ContentType::new("wiki", "document")
    }

    #[test]
    fn test_writes_bump_revision() {
        let store = MemoryStore::new();
        assert_eq!(store.revision(), 0);

        let doc = ContentObject::new(doc_type());
        let doc_ref = doc.content_ref.clone();
        store.insert_object(doc);
        assert_eq!(store.revision(), 1);
        assert!(store.object(&doc_ref).is_some());

        store.remove_object(&doc_ref);
        assert_eq!(store.revision(), 2);
        assert!(store.object(&doc_ref).is_none());
    }

    #[test]
    fn test_remove_object_drops_attached_policies() {
        let store = MemoryStore::new();
        let doc = ContentObject::new(doc_type());
        let doc_ref = doc.content_ref.clone();
        store.insert_object(doc);
        store.insert_policy(Policy::for_object(doc_ref.clone()).with_anonymous());
        store.insert_policy(Policy::global().with_anonymous());

        store.remove_object(&doc_ref);
        assert!(store.policies_for(&doc_ref).is_empty());
        assert_eq!(store.global_policies().len(), 1);
    }

    #[test]
    fn test_policy_lookup_by_target() {
        let store = MemoryStore::new();
        let a = ContentObject::new(doc_type());
        let b = ContentObject::new(doc_type());
        let policy = Policy::for_object(a.content_ref.clone()).with_authenticated();
        let policy_id = policy.id;
        store.insert_policy(policy);

        assert_eq!(store.policies_for(&a.content_ref).len(), 1);
        assert!(store.policies_for(&b.content_ref).is_empty());
        assert!(store.global_policies().is_empty());

        assert!(store.remove_policy(&policy_id).is_some());
        assert!(store.policies_for(&a.content_ref).is_empty());
    }

    #[test]
    fn test_role_requires_team() {
        let store = MemoryStore::new();
        let founder = User::new("founder0");
        let team = Team::new("team1", founder.id);
        let orphan = Role::new(Uuid::now_v7(), "orphan");
        let orphan_team = orphan.team_id;

        assert_eq!(
            store.insert_role(orphan),
            Err(StoreError::UnknownTeam(orphan_team))
        );

        let role = Role::new(team.id, "role1");
        store.insert_team(team.clone());
        store.insert_role(role).unwrap();
        assert_eq!(store.roles_of(&team.id).len(), 1);
    }

    #[test]
    fn test_remove_team_cascades_roles() {
        let store = MemoryStore::new();
        let team = Team::new("team1", Uuid::now_v7());
        store.insert_team(team.clone());
        store.insert_role(Role::new(team.id, "role1")).unwrap();
        store.insert_role(Role::new(team.id, "role2")).unwrap();

        assert!(store.remove_team(&team.id).is_some());
        assert!(store.team(&team.id).is_none());
        assert!(store.roles_of(&team.id).is_empty());
    }

    #[test]
    fn test_register_logic() {
        let store = MemoryStore::new();
        assert!(store.custom_logic_of(&doc_type()).is_none());

        store.register_logic(
            doc_type(),
            Arc::new(|_: &Principal, _: &ContentObject, _: &Codename| {
                Ok::<_, LogicError>(true)
            }),
        );
        assert!(store.custom_logic_of(&doc_type()).is_some());
        assert!(store
            .custom_logic_of(&ContentType::new("wiki", "page"))
            .is_none());
    }
}
