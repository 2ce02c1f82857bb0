//! The media library: per-user spatial indexes wired to persistent storage.
//!
//! `MediaLibrary` owns an [`IndexRegistry`] and a [`StorageBackend`]. Adding a
//! record inserts it into the user's index and appends one row; deleting
//! rewrites every row from a fresh snapshot. The in-memory state is always
//! authoritative: when storage fails, the mutation stands and the failure is
//! handed back as a warning inside [`MutationOutcome`].

use crate::builder::LibraryBuilder;
use crate::compute::spatial::SpatialIndex;
use crate::compute::validation::validate_record;
use crate::config::{Config, SearchMode};
use crate::error::{MediaTreeError, Result};
use crate::registry::{IndexRegistry, UserName};
use crate::report::SearchReport;
use crate::storage::{LoadReport, StorageBackend, StorageStats};
use mediatree_types::{BoundingBox, Record};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Result of a mutation whose in-memory part always succeeded.
///
/// `warning` carries the storage error, if persisting the change failed.
#[derive(Debug)]
#[must_use]
pub struct MutationOutcome<T> {
    pub value: T,
    pub warning: Option<MediaTreeError>,
}

impl<T> MutationOutcome<T> {
    fn persisted(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.warning.is_none()
    }

    /// Treat a persistence warning as an error.
    pub fn into_result(self) -> Result<T> {
        match self.warning {
            Some(e) => Err(e),
            None => Ok(self.value),
        }
    }
}

/// Where a search report was written and how many records it lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSummary {
    pub path: PathBuf,
    pub matches: usize,
}

/// Library statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryStats {
    pub users: usize,
    pub records: usize,
    /// Adds, searches and deletes served since the library was opened
    pub operations: u64,
    /// Appends or rewrites that failed
    pub failed_writes: u64,
    pub storage: StorageStats,
}

/// Multi-user media library
///
/// # Examples
///
/// ```rust
/// use mediatree::{BoundingBox, MediaLibrary, Record};
///
/// # fn main() -> mediatree::Result<()> {
/// let mut library = MediaLibrary::memory()?;
/// library.create_user("alice")?;
///
/// library
///     .add("alice", Record::new(1, "Beach", "photo", BoundingBox::new(0.0, 0.0, 10.0, 10.0)))?
///     .into_result()?;
///
/// let hits = library.search("alice", &BoundingBox::new(5.0, 5.0, 6.0, 6.0))?;
/// assert_eq!(hits.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MediaLibrary {
    registry: IndexRegistry,
    storage: Box<dyn StorageBackend>,
    reports: SearchReport,
    config: Config,
    load_report: LoadReport,
    operations: AtomicU64,
    failed_writes: u64,
}

impl MediaLibrary {
    /// Create a library with no persistence.
    pub fn memory() -> Result<Self> {
        LibraryBuilder::new().in_memory().build()
    }

    /// Open a library backed by the CSV file at `path`, loading its rows.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        LibraryBuilder::new().data_file(path.as_ref()).build()
    }

    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::new()
    }

    /// Assemble a library and replay every stored row into it.
    pub(crate) fn from_parts(config: Config, mut storage: Box<dyn StorageBackend>) -> Result<Self> {
        config.validate().map_err(MediaTreeError::InvalidConfig)?;

        let loaded = storage.load()?;
        let mut registry = IndexRegistry::with_config(config.index);
        for (user, record) in loaded.rows {
            registry.get_or_create(&user).insert(record);
        }

        if loaded.report.is_clean() {
            log::info!(
                "Loaded {} records for {} users",
                loaded.report.loaded,
                registry.len()
            );
        } else {
            log::info!(
                "Loaded {} records for {} users, skipped {} malformed rows",
                loaded.report.loaded,
                registry.len(),
                loaded.report.skipped()
            );
        }

        Ok(Self {
            registry,
            storage,
            reports: SearchReport::new(&config.persistence.results_dir),
            config,
            load_report: loaded.report,
            operations: AtomicU64::new(0),
            failed_writes: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Outcome of the initial load
    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn registry(&self) -> &IndexRegistry {
        &self.registry
    }

    /// Register a new user with an empty index.
    ///
    /// Nothing is persisted until the user adds a record.
    pub fn create_user(&mut self, name: &str) -> Result<UserName> {
        let user = UserName::parse(name)?;
        if self.registry.exists(user.as_str()) {
            return Err(MediaTreeError::UserExists(user.into()));
        }
        self.registry.get_or_create(&user);
        log::debug!("Created user '{}'", user);
        Ok(user)
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.registry.exists(name)
    }

    /// Registered users in sorted order
    pub fn users(&self) -> Vec<&UserName> {
        self.registry.users()
    }

    pub fn index(&self, user: &str) -> Option<&SpatialIndex> {
        self.registry.get(user)
    }

    fn index_for(&self, user: &str) -> Result<&SpatialIndex> {
        self.registry
            .get(user)
            .ok_or_else(|| MediaTreeError::UnknownUser(user.to_string()))
    }

    fn resolve(&self, user: &str) -> Result<UserName> {
        if !self.registry.exists(user) {
            return Err(MediaTreeError::UnknownUser(user.to_string()));
        }
        UserName::parse(user)
    }

    fn count_operation(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }

    /// Insert a record into the user's index and append it to storage.
    pub fn add(&mut self, user: &str, record: Record) -> Result<MutationOutcome<()>> {
        let user = self.resolve(user)?;
        validate_record(&record)?;

        self.registry.get_or_create(&user).insert(record.clone());
        self.count_operation();

        match self.storage.append(&user, &record) {
            Ok(()) => Ok(MutationOutcome::persisted(())),
            Err(e) => {
                log::warn!("Failed to persist record {} for '{}': {}", record.id(), user, e);
                self.failed_writes += 1;
                Ok(MutationOutcome {
                    value: (),
                    warning: Some(e),
                })
            }
        }
    }

    /// Search the user's records with the configured [`SearchMode`].
    pub fn search(&self, user: &str, query: &BoundingBox) -> Result<Vec<&Record>> {
        self.search_with(user, query, self.config.search_mode)
    }

    /// Records whose box equals `query` exactly
    pub fn search_exact(&self, user: &str, query: &BoundingBox) -> Result<Vec<&Record>> {
        self.search_with(user, query, SearchMode::Exact)
    }

    fn search_with(&self, user: &str, query: &BoundingBox, mode: SearchMode) -> Result<Vec<&Record>> {
        let index = self.index_for(user)?;
        self.count_operation();
        Ok(index.search_with(query, mode))
    }

    /// Search with the configured mode and write the matches to the user's
    /// report file.
    pub fn search_to_report(&self, user: &str, query: &BoundingBox) -> Result<SearchSummary> {
        let name = self.resolve(user)?;
        let matches = self.search(user, query)?;
        let path = self.reports.write(&name, &matches)?;
        Ok(SearchSummary {
            path,
            matches: matches.len(),
        })
    }

    /// Remove every record of `user` intersecting `query`, then rewrite
    /// storage from a full snapshot.
    pub fn delete(&mut self, user: &str, query: &BoundingBox) -> Result<MutationOutcome<usize>> {
        let removed = match self.registry.get_mut(user) {
            Some(index) => index.delete(query),
            None => return Err(MediaTreeError::UnknownUser(user.to_string())),
        };
        self.count_operation();
        log::debug!("Deleted {} records for '{}'", removed, user);

        match self.rewrite_storage() {
            Ok(()) => Ok(MutationOutcome::persisted(removed)),
            Err(e) => {
                log::warn!("Failed to rewrite storage after delete: {}", e);
                self.failed_writes += 1;
                Ok(MutationOutcome {
                    value: removed,
                    warning: Some(e),
                })
            }
        }
    }

    /// All records of one user, in index order
    pub fn list(&self, user: &str) -> Result<Vec<&Record>> {
        Ok(self.index_for(user)?.list_all())
    }

    /// Every record of every user, users sorted by name
    pub fn snapshot(&self) -> Vec<(&UserName, &Record)> {
        snapshot_rows(&self.registry)
    }

    /// Rewrite storage from the in-memory state.
    pub fn persist_all(&mut self) -> Result<()> {
        self.rewrite_storage().inspect_err(|_| self.failed_writes += 1)
    }

    fn rewrite_storage(&mut self) -> Result<()> {
        let rows = snapshot_rows(&self.registry);
        self.storage.rewrite(&rows)
    }

    pub fn stats(&self) -> LibraryStats {
        LibraryStats {
            users: self.registry.len(),
            records: self.registry.record_count(),
            operations: self.operations.load(Ordering::Relaxed),
            failed_writes: self.failed_writes,
            storage: self.storage.stats(),
        }
    }
}

impl std::fmt::Debug for MediaLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaLibrary")
            .field("users", &self.registry.len())
            .field("records", &self.registry.record_count())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn snapshot_rows(registry: &IndexRegistry) -> Vec<(&UserName, &Record)> {
    registry
        .iter()
        .flat_map(|(user, index)| index.iter().map(move |record| (user, record)))
        .collect()
}
