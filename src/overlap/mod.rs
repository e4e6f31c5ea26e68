//! Faces shared between partitions.

pub mod overlap;
