//! Permission backend
//!
//! The entry point applications call: answers "which permissions does this
//! principal hold on this object" and "does it hold this one", memoising
//! answers until the store changes.

use std::sync::Arc;
use teamwork_org::{ContentRef, Principal};
use teamwork_rbac::{ContentTypeRegistry, PermissionSet};
use tracing::{debug, instrument, trace};

use crate::cache::{CacheKey, CacheStats, PermissionCache};
use crate::config::BackendConfig;
use crate::engine::ResolutionEngine;
use crate::error::BackendResult;
use crate::store::PermissionStore;

/// Object-level permission backend.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use teamwork_backend::{MemoryStore, PermissionBackend};
/// use teamwork_org::{ContentObject, Policy, Principal, User};
/// use teamwork_rbac::{Codename, ContentType, ContentTypeRegistry};
///
/// let doc_type = ContentType::new("wiki", "document");
/// let registry = ContentTypeRegistry::builder()
///     .register(doc_type.clone(), ["frob", "xyzzy"])
///     .build();
///
/// let store = Arc::new(MemoryStore::new());
/// let doc = ContentObject::new(doc_type);
/// let doc_ref = doc.content_ref.clone();
/// store.insert_object(doc);
/// store.insert_policy(
///     Policy::for_object(doc_ref.clone())
///         .with_authenticated()
///         .with_permissions([Codename::new("wiki", "frob")]),
/// );
///
/// let backend = PermissionBackend::new(store, Arc::new(registry));
/// let user = Principal::Authenticated(User::new("tester0"));
///
/// assert!(backend.has_perm(&user, "wiki.frob", Some(&doc_ref)).unwrap());
/// assert!(!backend.has_perm(&user, "wiki.xyzzy", Some(&doc_ref)).unwrap());
/// assert!(!backend.has_perm(&Principal::Anonymous, "wiki.frob", Some(&doc_ref)).unwrap());
/// ```
#[derive(Debug)]
pub struct PermissionBackend<S> {
    engine: ResolutionEngine<S>,
    cache: Option<PermissionCache>,
}

impl<S: PermissionStore> PermissionBackend<S> {
    /// Create a backend with the default configuration.
    pub fn new(store: Arc<S>, registry: Arc<ContentTypeRegistry>) -> Self {
        Self::build(store, registry, BackendConfig::default())
    }

    /// Create a backend with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Config`](crate::BackendError::Config) if the
    /// configuration is inconsistent.
    pub fn with_config(
        store: Arc<S>,
        registry: Arc<ContentTypeRegistry>,
        config: BackendConfig,
    ) -> BackendResult<Self> {
        config.validate()?;
        Ok(Self::build(store, registry, config))
    }

    /// Create a backend configured from `TEAMWORK_*` environment variables.
    pub fn from_env(store: Arc<S>, registry: Arc<ContentTypeRegistry>) -> BackendResult<Self> {
        let config = BackendConfig::from_env()?;
        Ok(Self::build(store, registry, config))
    }

    fn build(store: Arc<S>, registry: Arc<ContentTypeRegistry>, config: BackendConfig) -> Self {
        let cache = config
            .cache_enabled
            .then(|| PermissionCache::new(config.cache_capacity));
        Self {
            engine: ResolutionEngine::new(store, registry, config),
            cache,
        }
    }

    /// Every permission `principal` holds on `object`, as `app_label.codename`
    /// strings.
    ///
    /// Returns an empty set when `object` is `None`, unknown to the store, or
    /// of an unregistered content type.
    #[instrument(skip_all, fields(user_id = ?principal.user_id()))]
    pub fn get_all_permissions(
        &self,
        principal: &Principal,
        object: Option<&ContentRef>,
    ) -> BackendResult<PermissionSet> {
        let Some(object_ref) = object else {
            trace!("No object given");
            return Ok(PermissionSet::new());
        };

        if !self.engine.registry().is_registered(&object_ref.content_type) {
            debug!(object = %object_ref, "Content type not registered");
            return Ok(PermissionSet::new());
        }

        let store = self.engine.store();
        let revision = store.revision();
        let key = self
            .cache
            .as_ref()
            .map(|_| CacheKey::new(principal.key(), object_ref.clone()));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(permissions) = cache.get(key, revision) {
                trace!(object = %object_ref, "Permission cache hit");
                return Ok(permissions);
            }
        }

        let Some(content) = store.object(object_ref) else {
            debug!(object = %object_ref, "Unknown object");
            return Ok(PermissionSet::new());
        };

        let permissions = self.engine.resolve(principal, &content)?;

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.insert(key, revision, permissions.clone());
        }
        Ok(permissions)
    }

    /// Whether `principal` holds `permission` (`app_label.codename`) on
    /// `object`.
    pub fn has_perm(
        &self,
        principal: &Principal,
        permission: &str,
        object: Option<&ContentRef>,
    ) -> BackendResult<bool> {
        Ok(self
            .get_all_permissions(principal, object)?
            .contains(permission))
    }

    /// Drop every cached resolution.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            debug!(entries = cache.len(), "Invalidating permission cache");
            cache.invalidate();
        }
    }

    /// Cache statistics, if caching is enabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(PermissionCache::stats)
    }

    /// The underlying resolution engine.
    pub fn engine(&self) -> &ResolutionEngine<S> {
        &self.engine
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        self.engine.store()
    }
}
