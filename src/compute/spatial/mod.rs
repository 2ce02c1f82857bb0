pub mod index;
pub mod node;

pub use index::{IndexStats, SpatialIndex};
pub use node::{Entries, InvariantViolation, Iter, Node};
