//! Output records handed to the solver.

pub mod connectivity;

pub use connectivity::{SolverMesh, ZoneConnectivity};
