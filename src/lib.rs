//! Multi-user multimedia library indexed by 2-D bounding boxes.
//!
//! Every user owns a bounded fan-out R-tree of media records. Records are
//! found or removed by box overlap, and persisted to a flat CSV file.
//!
//! ```rust
//! use mediatree::{BoundingBox, MediaLibrary, Record};
//!
//! let mut library = MediaLibrary::memory()?;
//! library.create_user("alice")?;
//! library
//!     .add("alice", Record::new(1, "Harbor", "photo", BoundingBox::new(0.0, 0.0, 4.0, 3.0)))?
//!     .into_result()?;
//!
//! let hits = library.search("alice", &BoundingBox::new(1.0, 1.0, 2.0, 2.0))?;
//! assert_eq!(hits[0].title(), "Harbor");
//! # Ok::<(), mediatree::MediaTreeError>(())
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod error;
pub mod library;
pub mod registry;
pub mod report;
pub mod session;
pub mod storage;

#[cfg(feature = "sync")]
pub mod sync;

pub use builder::LibraryBuilder;
pub use library::{LibraryStats, MediaLibrary, MutationOutcome, SearchSummary};
pub use error::{MediaTreeError, Result};

pub use geo::Rect;

pub use mediatree_types::{BoundingBox, Record};

pub use compute::spatial::{IndexStats, InvariantViolation, Node, SpatialIndex};

pub use config::{Config, IndexConfig, PersistenceConfig, RebalancePolicy, SearchMode};

pub use registry::{IndexRegistry, UserName};

pub use report::SearchReport;

pub use storage::{CsvFile, LoadReport, MemoryBackend, StorageBackend, StorageStats};

#[cfg(feature = "sync")]
pub use sync::SyncLibrary;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{LibraryBuilder, MediaLibrary, MediaTreeError, Result};

    pub use crate::{BoundingBox, Record, SpatialIndex};

    pub use crate::{Config, RebalancePolicy, SearchMode};

    pub use crate::{IndexRegistry, UserName};

    pub use crate::{MemoryBackend, StorageBackend};

    #[cfg(feature = "sync")]
    pub use crate::SyncLibrary;

    pub use geo::Rect;
}
