//! Raw mesh topology: CSR incidence arrays, the per-partition mesh, face
//! orientation and structural validation.

pub mod csr;
pub mod mesh;
pub mod orientation;
pub mod validation;

pub use csr::Csr;
pub use mesh::{AdjacencyGroup, BoundaryTopology, PolyMesh};
