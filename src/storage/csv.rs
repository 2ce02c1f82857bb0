//! Flat-file storage backend.
//!
//! Additions are appended as single lines. A rewrite goes through a temporary
//! sibling file that is atomically renamed over the target, so a crash never
//! leaves a half-written data file behind.

use super::codec::{decode_row, encode_row};
use super::{LoadReport, LoadedRows, StorageBackend, StorageStats};
use crate::error::Result;
use crate::registry::UserName;
use mediatree_types::Record;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Storage backend writing one comma-separated line per record
#[derive(Debug)]
pub struct CsvFile {
    path: PathBuf,
    stats: StorageStats,
}

impl CsvFile {
    /// Create a backend for `path`. The file is not touched until the first
    /// load or write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            stats: StorageStats::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        if let Some(name) = temp.file_name() {
            let mut new_name = name.to_string_lossy().into_owned();
            new_name.push_str(".tmp");
            temp.set_file_name(new_name);
        }
        temp
    }

    fn write_temp(&self, temp_path: &Path, rows: &[(&UserName, &Record)]) -> Result<u64> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;

        let mut writer = BufWriter::new(file);
        let mut written = 0u64;
        for (user, record) in rows {
            let line = encode_row(user, record);
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
            written += line.len() as u64 + 1;
        }

        writer.flush()?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        Ok(written)
    }

    #[cfg(unix)]
    fn sync_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            File::open(parent)?.sync_all()?;
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_parent_dir(&self) -> Result<()> {
        Ok(())
    }
}

impl StorageBackend for CsvFile {
    fn load(&mut self) -> Result<LoadedRows> {
        if !self.exists() {
            log::debug!("Data file {} does not exist, starting empty", self.path.display());
            return Ok(LoadedRows::default());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut rows = Vec::new();
        let mut report = LoadReport::default();

        for (index, line) in reader.split(b'\n').enumerate() {
            let line_no = index + 1;
            let bytes = line?;

            let Ok(text) = std::str::from_utf8(&bytes) else {
                log::warn!("Skipping line {} of {}: not valid UTF-8", line_no, self.path.display());
                report.skipped_lines.push(line_no);
                continue;
            };

            if text.trim().is_empty() {
                report.blank += 1;
                continue;
            }

            match decode_row(line_no, text) {
                Ok(row) => rows.push(row),
                Err(e) => {
                    log::warn!("Skipping row in {}: {}", self.path.display(), e);
                    report.skipped_lines.push(line_no);
                }
            }
        }

        report.loaded = rows.len();
        self.stats.row_count = rows.len();
        log::debug!(
            "Loaded {} rows from {} ({} skipped)",
            report.loaded,
            self.path.display(),
            report.skipped()
        );

        Ok(LoadedRows { rows, report })
    }

    fn append(&mut self, user: &UserName, record: &Record) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut line = encode_row(user, record);
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()?;

        self.stats.appends += 1;
        self.stats.row_count += 1;
        self.stats.bytes_written += line.len() as u64;
        Ok(())
    }

    fn rewrite(&mut self, rows: &[(&UserName, &Record)]) -> Result<()> {
        let temp_path = self.temp_path();

        let written = match self.write_temp(&temp_path, rows) {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&temp_path);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        self.sync_parent_dir()?;

        self.stats.rewrites += 1;
        self.stats.row_count = rows.len();
        self.stats.bytes_written += written;
        Ok(())
    }

    fn stats(&self) -> StorageStats {
        self.stats
    }
}
