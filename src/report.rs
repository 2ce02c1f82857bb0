//! Per-user search reports.
//!
//! Each search overwrites `<results_dir>/<user>_search_result.txt` with one
//! line per matching record, formatted by `Record`'s `Display`.

use crate::error::Result;
use crate::registry::UserName;
use mediatree_types::Record;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const REPORT_SUFFIX: &str = "_search_result.txt";

/// Writer for search result files under one directory
#[derive(Debug, Clone)]
pub struct SearchReport {
    results_dir: PathBuf,
}

impl SearchReport {
    pub fn new<P: AsRef<Path>>(results_dir: P) -> Self {
        Self {
            results_dir: results_dir.as_ref().to_path_buf(),
        }
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Path of the report file for `user`
    pub fn path_for(&self, user: &UserName) -> PathBuf {
        self.results_dir
            .join(format!("{}{}", user.as_str(), REPORT_SUFFIX))
    }

    /// Truncate the user's report and write `records` into it.
    ///
    /// Returns the path written. An empty result still produces an empty file.
    pub fn write(&self, user: &UserName, records: &[&Record]) -> Result<PathBuf> {
        if !self.results_dir.as_os_str().is_empty() && !self.results_dir.exists() {
            fs::create_dir_all(&self.results_dir)?;
        }

        let path = self.path_for(user);
        let mut writer = BufWriter::new(File::create(&path)?);
        for record in records {
            writeln!(writer, "{}", record)?;
        }
        writer.flush()?;

        log::debug!("Wrote {} results to {}", records.len(), path.display());
        Ok(path)
    }
}
