//! # mediatree-types
//!
//! Value types shared by the mediatree spatial index and its storage layer.
//!
//! - **`BoundingBox`**: an axis-aligned rectangle with expansion, overlap and
//!   expansion-cost operations, plus conversions to and from `geo::Rect`.
//! - **`Record`**: an immutable multimedia metadata entry (id, title, tags)
//!   positioned by a `BoundingBox`.
//!
//! ## Examples
//!
//! ```rust
//! use mediatree_types::bbox::BoundingBox;
//! use mediatree_types::record::Record;
//!
//! let record = Record::new(1, "Harbor at dusk", "photo;sea", BoundingBox::new(0.0, 0.0, 10.0, 10.0));
//! assert!(record.bbox().intersects(&BoundingBox::new(10.0, 10.0, 20.0, 20.0)));
//! ```

pub mod bbox;
pub mod record;

pub use bbox::BoundingBox;
pub use record::Record;
