//! Per-user index registry
//!
//! This module maps validated user names to their own [`SpatialIndex`],
//! giving every user an isolated set of records within one library.

use crate::compute::spatial::SpatialIndex;
use crate::config::IndexConfig;
use crate::error::{MediaTreeError, Result};
use crate::storage::FIELD_SEPARATOR;
use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::fmt;

/// A user name that can be used as a registry key and a storage column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserName(String);

impl UserName {
    /// Longest accepted user name, in bytes
    pub const MAX_LEN: usize = 255;

    /// Parses and validates a string as a user name.
    ///
    /// # Arguments
    ///
    /// * `name` - The string to parse as a user name.
    ///
    /// # Returns
    ///
    /// `Ok(UserName)` if the name is valid, `Err(MediaTreeError::InvalidInput)` otherwise.
    pub fn parse<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();

        if name.is_empty() {
            return Err(MediaTreeError::InvalidInput(
                "User name cannot be empty".into(),
            ));
        }

        if name.trim() != name {
            return Err(MediaTreeError::InvalidInput(format!(
                "User name '{}' cannot start or end with whitespace",
                name
            )));
        }

        if name.contains(FIELD_SEPARATOR) {
            return Err(MediaTreeError::InvalidInput(format!(
                "User name '{}' cannot contain '{}'",
                name, FIELD_SEPARATOR
            )));
        }

        if name.contains(['\n', '\r', '\0']) {
            return Err(MediaTreeError::InvalidInput(
                "User name cannot contain line breaks or null bytes".into(),
            ));
        }

        // The name becomes part of a report file name
        if name.contains(['/', '\\']) {
            return Err(MediaTreeError::InvalidInput(format!(
                "User name '{}' cannot contain path separators",
                name
            )));
        }

        if name == "." || name == ".." {
            return Err(MediaTreeError::InvalidInput(format!(
                "User name '{}' is reserved",
                name
            )));
        }

        if name.len() > Self::MAX_LEN {
            return Err(MediaTreeError::InvalidInput(format!(
                "User name cannot exceed {} characters",
                Self::MAX_LEN
            )));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for UserName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maps each user to their spatial index.
///
/// Entries are created on first reference and never removed implicitly.
/// Iteration is ordered by user name so snapshots are reproducible.
///
/// # Examples
///
/// ```rust
/// use mediatree::{BoundingBox, IndexRegistry, Record, UserName};
///
/// let mut registry = IndexRegistry::new();
/// let alice = UserName::parse("alice").unwrap();
///
/// registry
///     .get_or_create(&alice)
///     .insert(Record::new(1, "Song", "audio", BoundingBox::new(0.0, 0.0, 1.0, 1.0)));
///
/// assert!(registry.exists("alice"));
/// assert!(!registry.exists("bob"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    indexes: FxHashMap<UserName, SpatialIndex>,
    config: IndexConfig,
}

impl IndexRegistry {
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    /// Create a registry whose indexes all use `config`.
    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            indexes: FxHashMap::default(),
            config,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Get the user's index, creating an empty one on first access.
    pub fn get_or_create(&mut self, user: &UserName) -> &mut SpatialIndex {
        let config = self.config;
        self.indexes.entry(user.clone()).or_insert_with(|| {
            log::debug!("Creating index for user '{}'", user);
            SpatialIndex::with_config(config)
        })
    }

    pub fn exists(&self, user: &str) -> bool {
        self.indexes.contains_key(user)
    }

    pub fn get(&self, user: &str) -> Option<&SpatialIndex> {
        self.indexes.get(user)
    }

    pub fn get_mut(&mut self, user: &str) -> Option<&mut SpatialIndex> {
        self.indexes.get_mut(user)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Registered user names in sorted order.
    pub fn users(&self) -> Vec<&UserName> {
        let mut users: Vec<&UserName> = self.indexes.keys().collect();
        users.sort();
        users
    }

    /// Registered indexes, ordered by user name.
    pub fn iter(&self) -> impl Iterator<Item = (&UserName, &SpatialIndex)> {
        let mut entries: Vec<(&UserName, &SpatialIndex)> = self.indexes.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    /// Total number of records across all users.
    pub fn record_count(&self) -> usize {
        self.indexes.values().map(SpatialIndex::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediatree_types::{BoundingBox, Record};

    fn user(name: &str) -> UserName {
        UserName::parse(name).unwrap()
    }

    #[test]
    fn test_user_name_parse_valid() {
        assert_eq!(user("alice").as_str(), "alice");
        assert!(UserName::parse("bob smith").is_ok());
    }

    #[test]
    fn test_user_name_parse_empty() {
        assert!(UserName::parse("").is_err());
    }

    #[test]
    fn test_user_name_parse_with_separator() {
        assert!(UserName::parse("a,b").is_err());
    }

    #[test]
    fn test_user_name_parse_with_whitespace_edges() {
        assert!(UserName::parse(" alice").is_err());
        assert!(UserName::parse("alice\n").is_err());
    }

    #[test]
    fn test_user_name_parse_with_null_byte() {
        assert!(UserName::parse("null\0byte").is_err());
    }

    #[test]
    fn test_user_name_parse_with_path_components() {
        assert!(UserName::parse("../escaped").is_err());
        assert!(UserName::parse("a/b").is_err());
        assert!(UserName::parse("a\\b").is_err());
        assert!(UserName::parse(".").is_err());
        assert!(UserName::parse("..").is_err());
        assert!(UserName::parse("...").is_ok());
        assert!(UserName::parse("j.doe").is_ok());
    }

    #[test]
    fn test_user_name_parse_too_long() {
        let long_name = "a".repeat(256);
        assert!(UserName::parse(long_name).is_err());
        assert!(UserName::parse("a".repeat(255)).is_ok());
    }

    #[test]
    fn test_get_or_create_creates_once() {
        let mut registry = IndexRegistry::new();
        let alice = user("alice");
        assert!(!registry.exists("alice"));

        registry
            .get_or_create(&alice)
            .insert(Record::new(1, "t", "g", BoundingBox::new(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(registry.get_or_create(&alice).len(), 1);
        assert_eq!(registry.len(), 1);
        assert!(registry.exists("alice"));
    }

    #[test]
    fn test_users_are_isolated() {
        let mut registry = IndexRegistry::new();
        let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        registry
            .get_or_create(&user("alice"))
            .insert(Record::new(1, "a", "", bbox));
        registry.get_or_create(&user("bob"));

        assert_eq!(registry.get("alice").unwrap().search(&bbox).len(), 1);
        assert!(registry.get("bob").unwrap().search(&bbox).is_empty());
        assert!(registry.get("carol").is_none());
        assert_eq!(registry.record_count(), 1);
    }

    #[test]
    fn test_iteration_is_sorted() {
        let mut registry = IndexRegistry::new();
        for name in ["zoe", "adam", "mia"] {
            registry.get_or_create(&user(name));
        }

        let names: Vec<&str> = registry.iter().map(|(u, _)| u.as_str()).collect();
        assert_eq!(names, vec!["adam", "mia", "zoe"]);
        assert_eq!(registry.users().len(), 3);
    }

    #[test]
    fn test_indexes_share_registry_config() {
        let config = IndexConfig::default().with_max_children(8);
        let mut registry = IndexRegistry::with_config(config);
        assert_eq!(registry.get_or_create(&user("alice")).config().max_children, 8);
    }
}
