//! # Permission Sets
//!
//! The resolved set of codenames a principal holds on an object.

use serde::{Deserialize, Serialize};
use std::collections::{hash_set, HashSet};

use crate::codename::Codename;

/// A set of permission codenames.
///
/// Uses the full `app_label.codename` strings internally so that membership
/// checks against caller-supplied names are a single lookup.
///
/// # Example
///
/// ```
/// use teamwork_rbac::{Codename, PermissionSet};
///
/// let mut set = PermissionSet::new();
/// set.add(Codename::new("wiki", "frob"));
/// set.add(Codename::new("wiki", "hello"));
///
/// assert!(set.contains("wiki.frob"));
/// assert!(set.has(&Codename::new("wiki", "hello")));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// The permissions in this set (stored as full codename strings).
    permissions: HashSet<String>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: HashSet::new(),
        }
    }

    /// Add a permission to the set.
    pub fn add(&mut self, codename: Codename) {
        self.permissions.insert(codename.full_name());
    }

    /// Add a permission given by reference.
    pub fn add_ref(&mut self, codename: &Codename) {
        self.permissions.insert(codename.full_name());
    }

    /// Add multiple permissions to the set.
    pub fn add_all<'a, I>(&mut self, codenames: I)
    where
        I: IntoIterator<Item = &'a Codename>,
    {
        for codename in codenames {
            self.add_ref(codename);
        }
    }

    /// Remove a permission from the set.
    ///
    /// # Returns
    ///
    /// `true` if the permission was present, `false` otherwise
    pub fn remove(&mut self, codename: &Codename) -> bool {
        self.permissions.remove(&codename.full_name())
    }

    /// Check if the set contains a permission.
    pub fn has(&self, codename: &Codename) -> bool {
        self.permissions.contains(&codename.full_name())
    }

    /// Check if the set contains a permission given as `app_label.codename`.
    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        for perm in &other.permissions {
            if !self.permissions.contains(perm) {
                self.permissions.insert(perm.clone());
            }
        }
    }

    /// Iterate over the full codename strings.
    pub fn iter(&self) -> hash_set::Iter<'_, String> {
        self.permissions.iter()
    }

    /// All permissions as parsed codenames.
    pub fn all(&self) -> Vec<Codename> {
        self.permissions
            .iter()
            .filter_map(|s| Codename::parse(s))
            .collect()
    }

    /// Sorted codename strings, for stable output.
    pub fn sorted(&self) -> Vec<String> {
        let mut names: Vec<String> = self.permissions.iter().cloned().collect();
        names.sort();
        names
    }

    /// Create from a list of permission strings.
    ///
    /// Strings that are not valid `app_label.codename` names are skipped.
    ///
    /// # Example
    ///
    /// ```
    /// use teamwork_rbac::PermissionSet;
    ///
    /// let set = PermissionSet::from_strings(&["wiki.frob", "wiki.hello", "bogus"]);
    /// assert_eq!(set.len(), 2);
    /// ```
    pub fn from_strings(perms: &[&str]) -> Self {
        perms.iter().filter_map(|p| Codename::parse(p)).collect()
    }

    /// Get the count of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Check if this set contains all permissions from another set.
    pub fn contains_all(&self, other: &PermissionSet) -> bool {
        other.permissions.is_subset(&self.permissions)
    }

    /// Consume the set, returning the underlying strings.
    pub fn into_strings(self) -> HashSet<String> {
        self.permissions
    }
}

impl FromIterator<Codename> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Codename>>(iter: T) -> Self {
        let mut set = PermissionSet::new();
        for codename in iter {
            set.add(codename);
        }
        set
    }
}

impl Extend<Codename> for PermissionSet {
    fn extend<T: IntoIterator<Item = Codename>>(&mut self, iter: T) {
        for codename in iter {
            self.add(codename);
        }
    }
}

impl IntoIterator for PermissionSet {
    type Item = String;
    type IntoIter = hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a String;
    type IntoIter = hash_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.iter()
    }
}
