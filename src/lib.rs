#![cfg_attr(docsrs, feature(doc_cfg))]
//! # corner-mesh
//!
//! corner-mesh converts an unstructured, possibly domain-decomposed
//! polyhedral mesh into the corner-based connectivity a downstream transport
//! solver consumes: the neighbor across every face, the corners of every
//! face in a canonical winding, the matching corner on the far side of every
//! corner-face, and a boundary-condition id for faces with no local
//! neighbor.
//!
//! ## Features
//! - Half-face, corner and boundary indexing over compressed-sparse-row
//!   incidence arrays
//! - Shared-face resolution between partitions over a pluggable
//!   communicator (serial, in-process threads, MPI)
//! - Reading and writing a path-addressed mesh document
//! - Structural validation of the input and of the finished corner mesh
//!
//! ## Determinism
//!
//! Every output array is produced in cell/face order; joins go through
//! sorted maps, so re-running a conversion gives byte-identical results.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! corner-mesh = "0.1"
//! # Optional features:
//! # features = ["mpi-support", "rayon"]
//! ```
//!
//! ```no_run
//! use corner_mesh::prelude::*;
//!
//! # fn main() -> Result<(), MeshError> {
//! let mut doc = TreeDocument::new();
//! // ... fill `doc` with coordsets/topologies/fields/adjsets ...
//! let solver = MeshPipeline::new(ConversionConfig::default()).run(&mut doc, &NoComm)?;
//! println!("{} zones, {} corners", solver.n_zones(), solver.n_corners());
//! # Ok(())
//! # }
//! ```

pub mod algs;
pub mod data;
pub mod debug_invariants;
pub mod geometry;
pub mod io;
pub mod mesh_error;
pub mod overlap;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::boundary::{DEFAULT_SHARED_BOUNDARY_ID, FaceKind, NO_BOUNDARY};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::communicator::{CommTag, Communicator, Elapsed, LocalComm, NoComm, Wait};
    pub use crate::algs::pipeline::{ConversionConfig, MeshPipeline};
    pub use crate::data::connectivity::{SolverMesh, ZoneConnectivity};
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::io::document::{DocArray, MeshDocument, TreeDocument};
    pub use crate::mesh_error::{ErrorCategory, MeshError};
    pub use crate::overlap::overlap::Overlap;
    pub use crate::topology::csr::Csr;
    pub use crate::topology::mesh::{AdjacencyGroup, BoundaryTopology, PolyMesh};
}
