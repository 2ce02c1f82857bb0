//! Thread-safe wrapper for concurrent library access.
//!
//! `SyncLibrary` wraps [`MediaLibrary`] in `Arc<RwLock<_>>`. An insert with
//! its splits, or a delete with its box rebuild and storage rewrite, runs
//! under one exclusive write lock; searches share the read lock. Writing a
//! search report takes the write lock.
//!
//! Enable the `sync` feature to use this module:
//!
//! ```toml
//! [dependencies]
//! mediatree = { version = "0.1", features = ["sync"] }
//! ```
//!
//! # Examples
//!
//! ```rust
//! use mediatree::{BoundingBox, Record, SyncLibrary};
//! use std::thread;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let library = SyncLibrary::memory()?;
//! library.create_user("alice")?;
//!
//! let writer = library.clone();
//! let handle = thread::spawn(move || {
//!     writer
//!         .add("alice", Record::new(1, "Map", "geo", BoundingBox::new(0.0, 0.0, 5.0, 5.0)))
//!         .and_then(|outcome| outcome.into_result())
//!         .unwrap();
//! });
//! handle.join().unwrap();
//!
//! assert_eq!(library.search("alice", &BoundingBox::new(1.0, 1.0, 2.0, 2.0))?.len(), 1);
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::Result;
use crate::library::{LibraryStats, MediaLibrary, MutationOutcome, SearchSummary};
use crate::registry::UserName;
use mediatree_types::{BoundingBox, Record};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;

/// Thread-safe wrapper around `MediaLibrary` using `Arc<RwLock<MediaLibrary>>`.
///
/// Query results are cloned out of the lock, so they stay valid after it is
/// released.
#[derive(Clone)]
pub struct SyncLibrary {
    inner: Arc<RwLock<MediaLibrary>>,
}

impl SyncLibrary {
    pub fn new(library: MediaLibrary) -> Self {
        Self {
            inner: Arc::new(RwLock::new(library)),
        }
    }

    /// Creates a library with no persistence.
    pub fn memory() -> Result<Self> {
        Ok(Self::new(MediaLibrary::memory()?))
    }

    /// Opens a library backed by the CSV file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(MediaLibrary::open(path)?))
    }

    pub fn create_user(&self, name: &str) -> Result<UserName> {
        self.inner.write().create_user(name)
    }

    pub fn has_user(&self, name: &str) -> bool {
        self.inner.read().has_user(name)
    }

    pub fn add(&self, user: &str, record: Record) -> Result<MutationOutcome<()>> {
        self.inner.write().add(user, record)
    }

    pub fn search(&self, user: &str, query: &BoundingBox) -> Result<Vec<Record>> {
        let library = self.inner.read();
        Ok(library.search(user, query)?.into_iter().cloned().collect())
    }

    pub fn search_exact(&self, user: &str, query: &BoundingBox) -> Result<Vec<Record>> {
        let library = self.inner.read();
        Ok(library.search_exact(user, query)?.into_iter().cloned().collect())
    }

    /// Searches and rewrites the user's report file.
    ///
    /// Holds the write lock so concurrent reports for one user never
    /// interleave in the same file.
    pub fn search_to_report(&self, user: &str, query: &BoundingBox) -> Result<SearchSummary> {
        self.inner.write().search_to_report(user, query)
    }

    pub fn delete(&self, user: &str, query: &BoundingBox) -> Result<MutationOutcome<usize>> {
        self.inner.write().delete(user, query)
    }

    pub fn list(&self, user: &str) -> Result<Vec<Record>> {
        let library = self.inner.read();
        Ok(library.list(user)?.into_iter().cloned().collect())
    }

    pub fn persist_all(&self) -> Result<()> {
        self.inner.write().persist_all()
    }

    pub fn stats(&self) -> LibraryStats {
        self.inner.read().stats()
    }

    pub fn config(&self) -> Config {
        self.inner.read().config().clone()
    }

    /// Acquires a read lock for several queries under one lock.
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, MediaLibrary> {
        self.inner.read()
    }

    /// Acquires a write lock for several mutations under one lock.
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, MediaLibrary> {
        self.inner.write()
    }
}

// Ensure SyncLibrary is Send + Sync
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<SyncLibrary>;
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn record(id: i64) -> Record {
        let x = id as f64;
        Record::new(id, format!("r{id}"), "t", BoundingBox::new(x, x, x + 1.0, x + 1.0))
    }

    #[test]
    fn test_basic_operations() {
        let library = SyncLibrary::memory().unwrap();
        library.create_user("alice").unwrap();
        library.add("alice", record(1)).unwrap().into_result().unwrap();

        let hits = library.search("alice", &BoundingBox::new(0.0, 0.0, 1.0, 1.0)).unwrap();
        assert_eq!(hits, vec![record(1)]);
        assert!(library.has_user("alice"));
    }

    #[test]
    fn test_concurrent_writes() {
        let library = SyncLibrary::memory().unwrap();
        library.create_user("alice").unwrap();

        let handles: Vec<_> = (0..5)
            .map(|i| {
                let library = library.clone();
                thread::spawn(move || {
                    for j in 0..20 {
                        library.add("alice", record(i * 100 + j)).unwrap().into_result().unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(library.stats().records, 100);
        let guard = library.read();
        assert!(guard.index("alice").unwrap().check_invariants().is_ok());
    }

    #[test]
    fn test_concurrent_reads_and_deletes() {
        let library = SyncLibrary::memory().unwrap();
        library.create_user("alice").unwrap();
        for i in 0..50 {
            library.add("alice", record(i)).unwrap().into_result().unwrap();
        }

        let mut handles = vec![];
        for _ in 0..4 {
            let library = library.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    let hits = library
                        .search("alice", &BoundingBox::new(0.0, 0.0, 100.0, 100.0))
                        .unwrap();
                    assert!(hits.len() <= 50);
                }
            }));
        }

        let deleter = library.clone();
        handles.push(thread::spawn(move || {
            deleter
                .delete("alice", &BoundingBox::new(10.5, 10.5, 20.5, 20.5))
                .unwrap()
                .into_result()
                .unwrap();
        }));

        for handle in handles {
            handle.join().unwrap();
        }

        // Records 10 through 20 touch the query box
        assert_eq!(library.list("alice").unwrap().len(), 39);
    }

    #[test]
    fn test_concurrent_reports_stay_whole() {
        let dir = tempfile::TempDir::new().unwrap();
        let inner = MediaLibrary::builder()
            .in_memory()
            .results_dir(dir.path())
            .build()
            .unwrap();
        let library = SyncLibrary::new(inner);
        library.create_user("alice").unwrap();
        for i in 0..200 {
            library.add("alice", record(i)).unwrap().into_result().unwrap();
        }

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let library = library.clone();
                thread::spawn(move || {
                    for _ in 0..10 {
                        let summary = library
                            .search_to_report("alice", &BoundingBox::new(0.0, 0.0, 500.0, 500.0))
                            .unwrap();
                        assert_eq!(summary.matches, 200);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let path = dir.path().join("alice_search_result.txt");
        let content = std::fs::read_to_string(path).unwrap();
        assert_eq!(content.lines().count(), 200);
        assert!(content.lines().all(|line| line.starts_with("ID: ")));
    }
}
