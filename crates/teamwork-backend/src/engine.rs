//! Permission resolution
//!
//! Computes the full set of codenames a principal holds on one content
//! object from four sources: policies, team roles, ownership and custom
//! logic. Parent links make every source inheritable.
//!
//! # Lineage
//!
//! ```text
//!        root ── policy ──→ grants
//!       /    \
//!     a       b ── team ──→ roles ──→ grants
//!       \    /
//!        obj ── content type ──→ logic ──→ grants
//! ```
//!
//! The lineage of an object is the object itself plus every ancestor
//! reachable through parent links, visited breadth-first and at most once,
//! so cycles and diamonds terminate.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use teamwork_org::{ContentObject, ContentRef, MatchCriterion, Policy, Principal};
use teamwork_rbac::{ContentTypeRegistry, PermissionSet};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::config::{BackendConfig, HookFailurePolicy, ResolutionMode};
use crate::error::{BackendError, BackendResult};
use crate::logic::PermissionLogic;
use crate::store::PermissionStore;

/// A policy paired with the node it is attached to (`None` for global
/// policies) and the owner its `apply_to_owners` flag is checked against.
#[derive(Debug)]
struct ApplicablePolicy {
    policy: Policy,
    source: Option<ContentRef>,
    owner: Option<Uuid>,
}

/// Policy grants from one source node.
#[derive(Debug, Default)]
struct SourceGrants {
    /// Policies naming the principal (`users`/`groups`)
    specific: PermissionSet,
    /// `authenticated`/`anonymous` policies
    generic: PermissionSet,
}

/// Grants collected by source.
#[derive(Debug, Default)]
struct Grants {
    /// Policy grants keyed by the node they are attached to
    policies: HashMap<Option<ContentRef>, SourceGrants>,
    /// Team role grants keyed by the node whose team granted them
    roles: HashMap<ContentRef, PermissionSet>,
    /// `apply_to_owners` policies
    owner: PermissionSet,
    /// Custom logic hooks
    logic: PermissionSet,
}

impl Grants {
    /// Layered: on each source node, grants naming the principal (its
    /// `users`/`groups` policies and its team's roles) replace that node's
    /// class grants. Sources never suppress one another.
    fn combine(self, mode: ResolutionMode) -> PermissionSet {
        let mut result = PermissionSet::new();
        for (source, grants) in self.policies {
            match mode {
                ResolutionMode::Layered => {
                    let mut specific = grants.specific;
                    if let Some(roles) = source.as_ref().and_then(|node| self.roles.get(node)) {
                        specific.merge(roles);
                    }
                    if specific.is_empty() {
                        result.merge(&grants.generic);
                    } else {
                        result.merge(&specific);
                    }
                }
                ResolutionMode::Union => {
                    result.merge(&grants.specific);
                    result.merge(&grants.generic);
                }
            }
        }
        for roles in self.roles.values() {
            result.merge(roles);
        }
        result.merge(&self.owner);
        result.merge(&self.logic);
        result
    }
}

/// An object and its ancestors.
#[derive(Debug)]
struct Lineage {
    nodes: Vec<ContentObject>,
    index: HashMap<ContentRef, usize>,
}

impl Lineage {
    fn get(&self, content_ref: &ContentRef) -> Option<&ContentObject> {
        self.index.get(content_ref).map(|&i| &self.nodes[i])
    }

    /// The queried object.
    fn object(&self) -> &ContentObject {
        &self.nodes[0]
    }
}

/// Resolves permission sets against a store.
pub struct ResolutionEngine<S> {
    store: Arc<S>,
    registry: Arc<ContentTypeRegistry>,
    config: BackendConfig,
}

impl<S> std::fmt::Debug for ResolutionEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionEngine")
            .field("content_types", &self.registry.len())
            .field("mode", &self.config.mode)
            .field("max_ancestor_depth", &self.config.max_ancestor_depth)
            .field("hook_failure", &self.config.hook_failure)
            .finish()
    }
}

impl<S: PermissionStore> ResolutionEngine<S> {
    /// Create an engine over a store and a content type registry.
    pub fn new(store: Arc<S>, registry: Arc<ContentTypeRegistry>, config: BackendConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The content type registry.
    pub fn registry(&self) -> &ContentTypeRegistry {
        &self.registry
    }

    /// The active configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Every codename `principal` holds on `object`.
    ///
    /// # Errors
    ///
    /// [`BackendError::Logic`] when a custom logic hook fails and the hook
    /// failure policy is [`HookFailurePolicy::Propagate`].
    pub fn resolve(
        &self,
        principal: &Principal,
        object: &ContentObject,
    ) -> BackendResult<PermissionSet> {
        let content_type = object.content_type();
        if !self.registry.is_registered(content_type) {
            debug!(object = %object.content_ref, "Content type not registered");
            return Ok(PermissionSet::new());
        }

        if !principal.is_active() {
            debug!(user_id = ?principal.user_id(), "Inactive principal holds no permissions");
            return Ok(PermissionSet::new());
        }

        if principal.is_superuser() {
            return Ok(self.registry.codenames(content_type).cloned().collect());
        }

        let lineage = self.lineage(object);
        let policies = match self.config.mode {
            ResolutionMode::Layered => self.nearest_policies(&lineage),
            ResolutionMode::Union => self.all_policies(&lineage),
        };

        let mut grants = Grants::default();
        for applicable in &policies {
            let Some(criterion) = applicable.policy.matched_by(principal, applicable.owner) else {
                continue;
            };
            let granted = &applicable.policy.permissions;
            if criterion == MatchCriterion::Owner {
                grants.owner.add_all(granted);
                continue;
            }
            let source = grants.policies.entry(applicable.source.clone()).or_default();
            if criterion.is_specific() {
                source.specific.add_all(granted);
            } else {
                source.generic.add_all(granted);
            }
        }

        self.collect_role_grants(principal, &lineage, &mut grants.roles);
        self.collect_logic_grants(principal, &lineage, &mut grants.logic)?;

        let permissions = grants.combine(self.config.mode);
        debug!(
            object = %object.content_ref,
            user_id = ?principal.user_id(),
            lineage = lineage.nodes.len(),
            policies = policies.len(),
            granted = permissions.len(),
            "Resolved permissions"
        );
        Ok(permissions)
    }

    /// Breadth-first walk over parent links.
    fn lineage(&self, object: &ContentObject) -> Lineage {
        let mut nodes = vec![object.clone()];
        let mut index = HashMap::from([(object.content_ref.clone(), 0)]);
        let mut queue = VecDeque::from([(0usize, 0usize)]);

        while let Some((position, depth)) = queue.pop_front() {
            if self.config.max_ancestor_depth.is_some_and(|max| depth >= max) {
                if !nodes[position].parents().is_empty() {
                    debug!(
                        object = %nodes[position].content_ref,
                        depth,
                        "Ancestor depth limit reached"
                    );
                }
                continue;
            }

            let parents = nodes[position].parents().to_vec();
            for parent_ref in parents {
                if index.contains_key(&parent_ref) {
                    trace!(parent = %parent_ref, "Ancestor already visited");
                    continue;
                }
                let Some(parent) = self.store.object(&parent_ref) else {
                    debug!(parent = %parent_ref, "Skipping unknown parent");
                    continue;
                };
                index.insert(parent_ref, nodes.len());
                queue.push_back((nodes.len(), depth + 1));
                nodes.push(parent);
            }
        }

        Lineage { nodes, index }
    }

    /// Policies of the nearest policy-bearing node on every path upward,
    /// with global policies standing in for roots that carry none.
    fn nearest_policies(&self, lineage: &Lineage) -> Vec<ApplicablePolicy> {
        let mut walk = NearestWalk {
            lineage,
            store: self.store.as_ref(),
            on_path: HashSet::new(),
            done: HashSet::new(),
            seen_policies: HashSet::new(),
            reached_root: false,
            found: Vec::new(),
        };
        walk.visit(lineage.object());

        let mut found = walk.found;
        if walk.reached_root {
            found.extend(self.global_policies(lineage));
        }
        found
    }

    /// Policies attached to every lineage node, plus global policies.
    fn all_policies(&self, lineage: &Lineage) -> Vec<ApplicablePolicy> {
        let mut found: Vec<ApplicablePolicy> = lineage
            .nodes
            .iter()
            .flat_map(|node| {
                let owner = node.creator();
                let source = node.content_ref.clone();
                self.store
                    .policies_for(&node.content_ref)
                    .into_iter()
                    .map(move |policy| ApplicablePolicy {
                        policy,
                        source: Some(source.clone()),
                        owner,
                    })
            })
            .collect();

        found.extend(self.global_policies(lineage));
        found
    }

    /// Global policies; their owner is the creator of the queried object.
    fn global_policies(&self, lineage: &Lineage) -> Vec<ApplicablePolicy> {
        let owner = lineage.object().creator();
        self.store
            .global_policies()
            .into_iter()
            .map(|policy| ApplicablePolicy {
                policy,
                source: None,
                owner,
            })
            .collect()
    }

    /// Role grants per lineage node, from the roles of the node's team that
    /// list the principal.
    fn collect_role_grants(
        &self,
        principal: &Principal,
        lineage: &Lineage,
        grants: &mut HashMap<ContentRef, PermissionSet>,
    ) {
        let Some(user_id) = principal.user_id() else {
            return;
        };

        let mut by_team: HashMap<Uuid, PermissionSet> = HashMap::new();
        for node in &lineage.nodes {
            let Some(team_id) = node.team() else {
                continue;
            };
            let granted = by_team.entry(team_id).or_insert_with(|| {
                let mut granted = PermissionSet::new();
                for role in self.store.roles_of(&team_id) {
                    if role.has_member(&user_id) {
                        trace!(role = %role.name, team_id = %team_id, "Role grants permissions");
                        granted.add_all(&role.permissions);
                    }
                }
                granted
            });
            if !granted.is_empty() {
                grants.insert(node.content_ref.clone(), granted.clone());
            }
        }
    }

    fn collect_logic_grants(
        &self,
        principal: &Principal,
        lineage: &Lineage,
        grants: &mut PermissionSet,
    ) -> BackendResult<()> {
        for node in &lineage.nodes {
            let Some(logic) = self.store.custom_logic_of(node.content_type()) else {
                continue;
            };

            for codename in self.registry.codenames(node.content_type()) {
                match logic.has_perm(principal, node, codename) {
                    Ok(true) => grants.add_ref(codename),
                    Ok(false) => {}
                    Err(source) => match self.config.hook_failure {
                        HookFailurePolicy::Propagate => {
                            return Err(BackendError::Logic {
                                object: node.content_ref.to_string(),
                                codename: codename.full_name(),
                                source,
                            });
                        }
                        HookFailurePolicy::Deny => {
                            warn!(
                                object = %node.content_ref,
                                codename = %codename,
                                error = %source,
                                "Permission logic failed; treating as denied"
                            );
                        }
                    },
                }
            }
        }
        Ok(())
    }
}

/// Depth-first search for the nearest policy-bearing node on each path.
struct NearestWalk<'a, S> {
    lineage: &'a Lineage,
    store: &'a S,
    on_path: HashSet<ContentRef>,
    done: HashSet<ContentRef>,
    seen_policies: HashSet<Uuid>,
    reached_root: bool,
    found: Vec<ApplicablePolicy>,
}

impl<S: PermissionStore> NearestWalk<'_, S> {
    fn visit(&mut self, node: &ContentObject) {
        let node_ref = &node.content_ref;
        if self.done.contains(node_ref) {
            return;
        }

        let attached = self.store.policies_for(node_ref);
        if !attached.is_empty() {
            trace!(object = %node_ref, policies = attached.len(), "Nearest policies found");
            let owner = node.creator();
            for policy in attached {
                if self.seen_policies.insert(policy.id) {
                    self.found.push(ApplicablePolicy {
                        policy,
                        source: Some(node_ref.clone()),
                        owner,
                    });
                }
            }
            self.done.insert(node_ref.clone());
            return;
        }

        self.on_path.insert(node_ref.clone());
        let lineage = self.lineage;
        let parents: Vec<&ContentObject> = node
            .parents()
            .iter()
            .filter(|parent| !self.on_path.contains(*parent))
            .filter_map(|parent| lineage.get(parent))
            .collect();

        if parents.is_empty() {
            trace!(object = %node_ref, "Reached a root without policies");
            self.reached_root = true;
        }
        for parent in parents {
            self.visit(parent);
        }

        self.on_path.remove(node_ref);
        self.done.insert(node_ref.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::LogicError;
    use crate::store::MemoryStore;
    use teamwork_org::{Role, Team, User};
    use teamwork_rbac::{Codename, ContentType};

    fn doc_type() -> ContentType {
        ContentType::new("wiki", "document")
    }

    fn wiki(name: &str) -> Codename {
        Codename::new("wiki", name)
    }

    fn registry() -> Arc<ContentTypeRegistry> {
        Arc::new(
            ContentTypeRegistry::builder()
                .register(doc_type(), ["frob", "xyzzy", "hello", "quux"])
                .build(),
        )
    }

    fn engine(store: &Arc<MemoryStore>, config: BackendConfig) -> ResolutionEngine<MemoryStore> {
        ResolutionEngine::new(Arc::clone(store), registry(), config)
    }

    fn grant_authenticated(store: &MemoryStore, object: &ContentObject, perm: &str) {
        store.insert_policy(
            Policy::for_object(object.content_ref.clone())
                .with_authenticated()
                .with_permissions([wiki(perm)]),
        );
    }

    fn user() -> Principal {
        Principal::Authenticated(User::new("noob1"))
    }

    #[test]
    fn test_lineage_skips_dangling_parents() {
        let store = Arc::new(MemoryStore::new());
        let missing = ContentRef::new(doc_type(), Uuid::now_v7());
        let root = ContentObject::new(doc_type());
        let doc = ContentObject::new(doc_type())
            .with_parent(missing)
            .with_parent(root.content_ref.clone());
        store.insert_object(root.clone());
        store.insert_object(doc.clone());

        let lineage = engine(&store, BackendConfig::default()).lineage(&doc);
        assert_eq!(lineage.nodes.len(), 2);
        assert!(lineage.get(&root.content_ref).is_some());
    }

    #[test]
    fn test_cycle_terminates_and_falls_back_to_global() {
        let store = Arc::new(MemoryStore::new());
        let mut a = ContentObject::new(doc_type());
        let b = ContentObject::new(doc_type()).with_parent(a.content_ref.clone());
        a.add_parent(b.content_ref.clone());
        store.insert_object(a.clone());
        store.insert_object(b.clone());
        store.insert_policy(
            Policy::global()
                .with_authenticated()
                .with_permissions([wiki("hello")]),
        );

        let engine = engine(&store, BackendConfig::default());
        assert_eq!(engine.lineage(&a).nodes.len(), 2);

        let perms = engine.resolve(&user(), &a).unwrap();
        assert_eq!(perms, PermissionSet::from_strings(&["wiki.hello"]));
    }

    #[test]
    fn test_global_policies_only_without_ancestor_policies() {
        let store = Arc::new(MemoryStore::new());
        let root = ContentObject::new(doc_type());
        let child = ContentObject::new(doc_type()).with_parent(root.content_ref.clone());
        let orphan = ContentObject::new(doc_type());
        for object in [&root, &child, &orphan] {
            store.insert_object(object.clone());
        }
        grant_authenticated(&store, &root, "frob");
        store.insert_policy(
            Policy::global()
                .with_authenticated()
                .with_permissions([wiki("hello")]),
        );

        let engine = engine(&store, BackendConfig::default());
        assert_eq!(
            engine.resolve(&user(), &child).unwrap(),
            PermissionSet::from_strings(&["wiki.frob"])
        );
        assert_eq!(
            engine.resolve(&user(), &orphan).unwrap(),
            PermissionSet::from_strings(&["wiki.hello"])
        );
    }

    #[test]
    fn test_diamond_does_not_reach_global() {
        //     top
        //    /   \
        //  left  right
        //    \   /
        //    bottom
        let store = Arc::new(MemoryStore::new());
        let top = ContentObject::new(doc_type());
        let left = ContentObject::new(doc_type()).with_parent(top.content_ref.clone());
        let right = ContentObject::new(doc_type()).with_parent(top.content_ref.clone());
        let bottom = ContentObject::new(doc_type())
            .with_parent(left.content_ref.clone())
            .with_parent(right.content_ref.clone());
        for object in [&top, &left, &right, &bottom] {
            store.insert_object(object.clone());
        }
        grant_authenticated(&store, &top, "frob");
        grant_authenticated(&store, &right, "xyzzy");
        store.insert_policy(
            Policy::global()
                .with_authenticated()
                .with_permissions([wiki("hello")]),
        );

        let perms = engine(&store, BackendConfig::default())
            .resolve(&user(), &bottom)
            .unwrap();
        assert_eq!(perms, PermissionSet::from_strings(&["wiki.frob", "wiki.xyzzy"]));
    }

    #[test]
    fn test_max_ancestor_depth() {
        let store = Arc::new(MemoryStore::new());
        let grandparent = ContentObject::new(doc_type());
        let parent = ContentObject::new(doc_type()).with_parent(grandparent.content_ref.clone());
        let doc = ContentObject::new(doc_type()).with_parent(parent.content_ref.clone());
        for object in [&grandparent, &parent, &doc] {
            store.insert_object(object.clone());
        }
        grant_authenticated(&store, &grandparent, "frob");

        let unlimited = engine(&store, BackendConfig::default());
        assert_eq!(unlimited.lineage(&doc).nodes.len(), 3);
        assert!(unlimited.resolve(&user(), &doc).unwrap().contains("wiki.frob"));

        let limited = engine(&store, BackendConfig::default().with_max_ancestor_depth(1));
        assert_eq!(limited.lineage(&doc).nodes.len(), 2);
        assert!(limited.resolve(&user(), &doc).unwrap().is_empty());
    }

    #[test]
    fn test_union_mode_collects_every_source() {
        let store = Arc::new(MemoryStore::new());
        let root = ContentObject::new(doc_type());
        let doc = ContentObject::new(doc_type()).with_parent(root.content_ref.clone());
        store.insert_object(root.clone());
        store.insert_object(doc.clone());
        grant_authenticated(&store, &root, "frob");
        grant_authenticated(&store, &doc, "xyzzy");
        store.insert_policy(
            Policy::global()
                .with_authenticated()
                .with_permissions([wiki("hello")]),
        );

        let layered = engine(&store, BackendConfig::default());
        assert_eq!(
            layered.resolve(&user(), &doc).unwrap(),
            PermissionSet::from_strings(&["wiki.xyzzy"])
        );

        let union = engine(&store, BackendConfig::default().with_mode(ResolutionMode::Union));
        assert_eq!(
            union.resolve(&user(), &doc).unwrap(),
            PermissionSet::from_strings(&["wiki.frob", "wiki.xyzzy", "wiki.hello"])
        );
    }

    #[test]
    fn test_inherited_role_does_not_suppress_own_class_policy() {
        let store = Arc::new(MemoryStore::new());
        let member = User::new("tester2");
        let team = Team::new("team1", Uuid::now_v7());
        let parent = ContentObject::new(doc_type()).with_team(team.id);
        let child = ContentObject::new(doc_type()).with_parent(parent.content_ref.clone());
        store.insert_team(team.clone());
        store.insert_object(parent.clone());
        store.insert_object(child.clone());
        store
            .insert_role(
                Role::new(team.id, "role1")
                    .with_user(member.id)
                    .with_permissions([wiki("frob")]),
            )
            .unwrap();
        grant_authenticated(&store, &child, "xyzzy");

        let engine = engine(&store, BackendConfig::default());
        assert_eq!(
            engine.resolve(&user(), &child).unwrap(),
            PermissionSet::from_strings(&["wiki.xyzzy"])
        );
        assert_eq!(
            engine.resolve(&Principal::Authenticated(member), &child).unwrap(),
            PermissionSet::from_strings(&["wiki.frob", "wiki.xyzzy"])
        );
    }

    #[test]
    fn test_role_replaces_class_policy_on_same_node() {
        let store = Arc::new(MemoryStore::new());
        let member = User::new("tester2");
        let team = Team::new("team1", Uuid::now_v7());
        let doc = ContentObject::new(doc_type()).with_team(team.id);
        store.insert_team(team.clone());
        store.insert_object(doc.clone());
        store
            .insert_role(
                Role::new(team.id, "role1")
                    .with_user(member.id)
                    .with_permissions([wiki("frob")]),
            )
            .unwrap();
        grant_authenticated(&store, &doc, "xyzzy");

        let engine = engine(&store, BackendConfig::default());
        assert_eq!(
            engine.resolve(&Principal::Authenticated(member), &doc).unwrap(),
            PermissionSet::from_strings(&["wiki.frob"])
        );
    }

    #[test]
    fn test_unregistered_type_resolves_empty() {
        let store = Arc::new(MemoryStore::new());
        let page = ContentObject::new(ContentType::new("wiki", "page"));
        store.insert_object(page.clone());
        store.insert_policy(
            Policy::for_object(page.content_ref.clone())
                .with_authenticated()
                .with_permissions([wiki("frob")]),
        );

        let engine = engine(&store, BackendConfig::default());
        assert!(engine.resolve(&user(), &page).unwrap().is_empty());
        assert!(engine
            .resolve(&Principal::Superuser(User::new("admin")), &page)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_hook_failure_policy() {
        let store = Arc::new(MemoryStore::new());
        let doc = ContentObject::new(doc_type());
        store.insert_object(doc.clone());
        grant_authenticated(&store, &doc, "frob");
        store.register_logic(
            doc_type(),
            Arc::new(|_: &Principal, _: &ContentObject, codename: &Codename| {
                if codename.codename == "quux" {
                    Err(LogicError::new("backing lookup failed"))
                } else {
                    Ok(false)
                }
            }),
        );

        let err = engine(&store, BackendConfig::default())
            .resolve(&user(), &doc)
            .unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_LOGIC_FAILED");
        assert!(err.to_string().contains("wiki.quux"));

        let deny = engine(
            &store,
            BackendConfig::default().with_hook_failure(HookFailurePolicy::Deny),
        );
        assert_eq!(
            deny.resolve(&user(), &doc).unwrap(),
            PermissionSet::from_strings(&["wiki.frob"])
        );
    }
}
