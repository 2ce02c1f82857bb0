//! In-memory storage backend, used for ephemeral libraries and tests.

use super::{LoadReport, LoadedRows, StorageBackend, StorageStats};
use crate::error::Result;
use crate::registry::UserName;
use mediatree_types::Record;

/// In-memory storage backend keeping rows in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    rows: Vec<(UserName, Record)>,
    stats: StorageStats,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that returns `rows` on the next load.
    pub fn with_rows(rows: Vec<(UserName, Record)>) -> Self {
        let stats = StorageStats {
            row_count: rows.len(),
            ..StorageStats::default()
        };
        Self { rows, stats }
    }

    pub fn rows(&self) -> &[(UserName, Record)] {
        &self.rows
    }
}

impl StorageBackend for MemoryBackend {
    fn load(&mut self) -> Result<LoadedRows> {
        Ok(LoadedRows {
            rows: self.rows.clone(),
            report: LoadReport {
                loaded: self.rows.len(),
                ..LoadReport::default()
            },
        })
    }

    fn append(&mut self, user: &UserName, record: &Record) -> Result<()> {
        self.rows.push((user.clone(), record.clone()));
        self.stats.appends += 1;
        self.stats.row_count = self.rows.len();
        Ok(())
    }

    fn rewrite(&mut self, rows: &[(&UserName, &Record)]) -> Result<()> {
        self.rows = rows
            .iter()
            .map(|(user, record)| ((*user).clone(), (*record).clone()))
            .collect();
        self.stats.rewrites += 1;
        self.stats.row_count = self.rows.len();
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediatree_types::BoundingBox;

    #[test]
    fn test_memory_backend_roundtrip() {
        let alice = UserName::parse("alice").unwrap();
        let a = Record::new(1, "a", "", BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        let b = Record::new(2, "b", "", BoundingBox::new(2.0, 2.0, 3.0, 3.0));

        let mut backend = MemoryBackend::new();
        backend.append(&alice, &a).unwrap();
        backend.append(&alice, &b).unwrap();
        assert_eq!(backend.load().unwrap().rows.len(), 2);

        backend.rewrite(&[(&alice, &b)]).unwrap();
        let loaded = backend.load().unwrap();
        assert_eq!(loaded.rows, vec![(alice.clone(), b)]);
        assert_eq!(loaded.report.loaded, 1);

        let stats = backend.stats();
        assert_eq!(stats.appends, 2);
        assert_eq!(stats.rewrites, 1);
        assert_eq!(stats.row_count, 1);
    }

    #[test]
    fn test_with_rows_seeds_load() {
        let bob = UserName::parse("bob").unwrap();
        let r = Record::new(9, "x", "y", BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        let mut backend = MemoryBackend::with_rows(vec![(bob, r)]);
        assert_eq!(backend.stats().row_count, 1);
        assert_eq!(backend.load().unwrap().rows[0].1.id(), 9);
    }
}
