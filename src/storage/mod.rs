//! Storage backend abstraction for mediatree
//!
//! Records are persisted as flat rows, one per record, tagged with the owning
//! user. Additions append a single row; deletions rewrite the whole set.
//! The index never talks to storage directly, the library does.

mod codec;
mod csv;
mod memory;

pub use codec::{decode_row, encode_row};
pub use csv::CsvFile;
pub use memory::MemoryBackend;

use crate::error::Result;
use crate::registry::UserName;
use mediatree_types::Record;
use serde::Serialize;

/// Column separator of the persisted row format
pub const FIELD_SEPARATOR: char = ',';

/// Number of columns in a persisted row
pub const FIELD_COUNT: usize = 8;

/// Trait for storage backend implementations
///
/// Implementations must tolerate being called after a previous failure: a
/// failed append or rewrite leaves the backend usable for the next call.
pub trait StorageBackend: Send + Sync {
    /// Read every persisted row. Rows that cannot be decoded are skipped and
    /// counted in the returned report.
    fn load(&mut self) -> Result<LoadedRows>;

    /// Persist one new record for `user`, leaving existing rows untouched
    fn append(&mut self, user: &UserName, record: &Record) -> Result<()>;

    /// Replace the persisted rows with `rows`, in the given order
    fn rewrite(&mut self, rows: &[(&UserName, &Record)]) -> Result<()>;

    /// Get storage statistics
    fn stats(&self) -> StorageStats;
}

/// Rows read back from a backend
#[derive(Debug, Default)]
pub struct LoadedRows {
    pub rows: Vec<(UserName, Record)>,
    pub report: LoadReport,
}

/// Summary of a load pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Rows decoded and handed to the library
    pub loaded: usize,
    /// Blank lines ignored
    pub blank: usize,
    /// 1-based line numbers of rows that could not be decoded
    pub skipped_lines: Vec<usize>,
}

impl LoadReport {
    pub fn skipped(&self) -> usize {
        self.skipped_lines.len()
    }

    pub fn is_clean(&self) -> bool {
        self.skipped_lines.is_empty()
    }
}

/// Storage backend statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Rows currently persisted, as far as the backend knows
    pub row_count: usize,
    pub appends: u64,
    pub rewrites: u64,
    /// Bytes written since the backend was opened
    pub bytes_written: u64,
}
