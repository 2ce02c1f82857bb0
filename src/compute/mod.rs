//! Compute layer: the spatial index and input validation.
//!
//! This module is independent of storage. Nothing in here performs I/O;
//! persistence is driven by the library facade around it.

pub mod spatial;
pub mod validation;
