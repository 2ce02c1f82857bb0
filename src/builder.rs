//! Library builder for flexible configuration
//!
//! This module provides a builder pattern for creating libraries with a
//! custom data file, results directory, storage backend or index shape.

use crate::config::Config;
use crate::error::Result;
use crate::library::MediaLibrary;
use crate::storage::{CsvFile, MemoryBackend, StorageBackend};
use std::path::PathBuf;

/// Builder for library configuration with custom persistence paths and settings.
pub struct LibraryBuilder {
    config: Config,
    in_memory: bool,
    backend: Option<Box<dyn StorageBackend>>,
}

impl LibraryBuilder {
    /// Create a new builder backed by the default data file.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            in_memory: false,
            backend: None,
        }
    }

    /// Set the CSV data file. It is created on the first write and loaded on startup.
    pub fn data_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.persistence.data_file = path.into();
        self.in_memory = false;
        self
    }

    /// Set the directory receiving search reports.
    pub fn results_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.persistence.results_dir = path.into();
        self
    }

    /// Configure for in-memory storage with no persistence.
    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self.backend = None;
        self
    }

    /// Set the library configuration (index shape, search mode, paths).
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use a custom storage backend instead of the configured data file.
    pub fn backend(mut self, backend: Box<dyn StorageBackend>) -> Self {
        self.backend = Some(backend);
        self.in_memory = false;
        self
    }

    /// Build the library. Loads every row the storage backend holds.
    pub fn build(self) -> Result<MediaLibrary> {
        let storage: Box<dyn StorageBackend> = match self.backend {
            Some(backend) => backend,
            None if self.in_memory => Box::new(MemoryBackend::new()),
            None => Box::new(CsvFile::new(&self.config.persistence.data_file)),
        };

        MediaLibrary::from_parts(self.config, storage)
    }
}

impl Default for LibraryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LibraryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryBuilder")
            .field("config", &self.config)
            .field("in_memory", &self.in_memory)
            .field("custom_backend", &self.backend.is_some())
            .finish()
    }
}
