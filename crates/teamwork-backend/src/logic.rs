//! Custom permission logic
//!
//! A content type may register a [`PermissionLogic`] capability. When it
//! does, the resolution engine asks it about every codename registered for
//! the type and grants the ones it approves. Types without the capability
//! contribute nothing.

use teamwork_org::{ContentObject, Principal};
use teamwork_rbac::Codename;
use thiserror::Error;

/// Failure raised by a custom permission logic hook.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct LogicError {
    message: String,
}

impl LogicError {
    /// Create a hook error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Per-content-type permission logic.
///
/// Implementations must be pure: the same inputs always produce the same
/// answer, or cached results become inconsistent.
///
/// Closures with the matching signature implement the trait:
///
/// ```
/// use teamwork_backend::logic::{LogicError, PermissionLogic};
/// use teamwork_org::{ContentObject, Principal, User};
/// use teamwork_rbac::{Codename, ContentType};
///
/// let logic = |principal: &Principal, object: &ContentObject, codename: &Codename| {
///     Ok::<_, LogicError>(codename.codename == "quux" && principal.is_authenticated())
/// };
///
/// let doc = ContentObject::new(ContentType::new("wiki", "document"));
/// let user = Principal::Authenticated(User::new("quux1"));
/// assert!(logic.has_perm(&user, &doc, &Codename::new("wiki", "quux")).unwrap());
/// ```
pub trait PermissionLogic: Send + Sync {
    /// Whether `principal` holds `codename` on `object`.
    fn has_perm(
        &self,
        principal: &Principal,
        object: &ContentObject,
        codename: &Codename,
    ) -> Result<bool, LogicError>;
}

impl<F> PermissionLogic for F
where
    F: Fn(&Principal, &ContentObject, &Codename) -> Result<bool, LogicError> + Send + Sync,
{
    fn has_perm(
        &self,
        principal: &Principal,
        object: &ContentObject,
        codename: &Codename,
    ) -> Result<bool, LogicError> {
        self(principal, object, codename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use teamwork_org::User;
    use teamwork_rbac::ContentType;

    struct NamePrefix;

    impl PermissionLogic for NamePrefix {
        fn has_perm(
            &self,
            principal: &Principal,
            object: &ContentObject,
            codename: &Codename,
        ) -> Result<bool, LogicError> {
            let Some(user) = principal.user() else {
                return Ok(false);
            };
            let name = object
                .name()
                .ok_or_else(|| LogicError::new("object has no name"))?;
            Ok(name.starts_with(&user.username) && codename.codename == "frob")
        }
    }

    #[test]
    fn test_trait_object_logic() {
        let logic: Arc<dyn PermissionLogic> = Arc::new(NamePrefix);
        let doc = ContentObject::new(ContentType::new("wiki", "document")).with_name("alice-notes");
        let alice = Principal::Authenticated(User::new("alice"));
        let bob = Principal::Authenticated(User::new("bob"));
        let frob = Codename::new("wiki", "frob");

        assert_eq!(logic.has_perm(&alice, &doc, &frob), Ok(true));
        assert_eq!(logic.has_perm(&bob, &doc, &frob), Ok(false));
        assert_eq!(logic.has_perm(&Principal::Anonymous, &doc, &frob), Ok(false));
    }

    #[test]
    fn test_logic_error_surfaces() {
        let logic = NamePrefix;
        let unnamed = ContentObject::new(ContentType::new("wiki", "document"));
        let alice = Principal::Authenticated(User::new("alice"));

        let err = logic
            .has_perm(&alice, &unnamed, &Codename::new("wiki", "frob"))
            .unwrap_err();
        assert_eq!(err.message(), "object has no name");
    }
}
