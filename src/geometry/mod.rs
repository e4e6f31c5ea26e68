//! Geometry utilities: vector helpers and corner coordinate emission.

pub mod corner_coords;
pub mod metrics;
