//! MeshError: unified error type for corner-mesh public APIs
//!
//! Every stage of the conversion returns `Result<_, MeshError>`; nothing in
//! the library panics on malformed input. Variants are grouped into the four
//! failure classes reported by [`MeshError::category`].

use thiserror::Error;

/// Coarse failure class of a [`MeshError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The raw mesh (or the corner mesh built from it) is malformed.
    StructuralInconsistency,
    /// A physical boundary face has no boundary-condition id.
    AttributeMissing,
    /// Two partitions disagree about a shared face.
    ShareMismatch,
    /// The message exchange with a neighbor could not complete.
    ExchangeFailure,
}

/// Unified error type for corner-mesh operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// A required document path is absent.
    #[error("document path `{0}` is missing")]
    MissingPath(String),
    /// A document array has an unexpected element type.
    #[error("document path `{path}` holds {found}, expected {expected}")]
    WrongArrayType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    /// An index array contains a negative entry.
    #[error("document path `{path}` has negative index {value} at position {position}")]
    NegativeIndex {
        path: String,
        position: usize,
        value: i64,
    },
    /// Two arrays that must have the same length do not.
    #[error("{what}: expected {expected} entries, found {found}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    /// An index points outside the array it refers to.
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
    /// A face has fewer than three distinct vertices.
    #[error("face {face} has {vertices} distinct vertices (need at least 3)")]
    FaceArity { face: usize, vertices: usize },
    /// A cell has fewer than four faces or repeats one.
    #[error("cell {cell} has {faces} distinct faces (need at least 4)")]
    CellArity { cell: usize, faces: usize },
    /// A face is referenced by more than two cells.
    #[error("face {face} is referenced by {cells} cells (at most 2 allowed)")]
    NonManifoldFace { face: usize, cells: usize },
    /// A face is not used by any cell.
    #[error("face {face} is not referenced by any cell")]
    OrphanFace { face: usize },
    /// A boundary-topology face does not match exactly one mesh face.
    #[error("boundary face {boundary_face} matches {matches} mesh faces (expected exactly 1)")]
    UnmatchedBoundaryFace { boundary_face: usize, matches: usize },
    /// Two boundary-topology entries tag the same face with different ids.
    #[error("face {face} tagged with conflicting boundary ids {first} and {second}")]
    ConflictingBoundaryAttribute { face: usize, first: i32, second: i32 },
    /// The outward direction of a face could not be determined.
    #[error("face {face} of cell {cell} is degenerate; cannot orient it")]
    DegenerateFace { cell: usize, face: usize },
    /// The faces of a cell do not bound a closed, orientable volume.
    #[error("cell {cell} is not a closed shell: {reason}")]
    OpenCell { cell: usize, reason: String },
    /// A face vertex is not a corner of the cell that should own it.
    #[error("vertex {vertex} is not a corner of cell {cell}")]
    CornerNotInCell { cell: usize, vertex: usize },
    /// An adjacency group is malformed for this rank.
    #[error("adjacency group `{group}` on rank {rank}: {reason}")]
    InvalidAdjacency {
        group: String,
        rank: usize,
        reason: String,
    },
    /// A face is declared shared but has two local cells.
    #[error("face {face} is declared shared with rank {neighbor} but is interior")]
    SharedFaceInterior { face: usize, neighbor: usize },
    /// The finished corner mesh breaks a structural rule.
    #[error("corner mesh invalid at zone {zone}: {reason}")]
    CornerMeshInvalid { zone: usize, reason: String },
    /// A non-shared boundary face carries no boundary-condition id.
    #[error("boundary face {face} (cell {cell}) has no boundary condition id")]
    AttributeMissing { face: usize, cell: usize },
    /// A neighbor disagrees about a shared face.
    #[error("shared face mismatch with rank {neighbor} at face {face}: {reason}")]
    ShareMismatch {
        neighbor: usize,
        face: usize,
        reason: String,
    },
    /// The communicator failed for a neighbor.
    #[error("communication with rank {neighbor} failed: {reason}")]
    CommError { neighbor: usize, reason: String },
    /// A neighbor did not answer in time.
    #[error("rank {neighbor} did not answer within {millis} ms")]
    ExchangeTimeout { neighbor: usize, millis: u128 },
    /// A received payload could not be decoded.
    #[error("malformed message from rank {neighbor}: {reason}")]
    MalformedMessage { neighbor: usize, reason: String },
}

impl MeshError {
    /// Which failure class this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            MeshError::AttributeMissing { .. } => ErrorCategory::AttributeMissing,
            MeshError::ShareMismatch { .. } => ErrorCategory::ShareMismatch,
            MeshError::CommError { .. }
            | MeshError::ExchangeTimeout { .. }
            | MeshError::MalformedMessage { .. } => ErrorCategory::ExchangeFailure,
            _ => ErrorCategory::StructuralInconsistency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_follow_taxonomy() {
        let e = MeshError::AttributeMissing { face: 3, cell: 0 };
        assert_eq!(e.category(), ErrorCategory::AttributeMissing);
        let e = MeshError::ExchangeTimeout {
            neighbor: 1,
            millis: 10,
        };
        assert_eq!(e.category(), ErrorCategory::ExchangeFailure);
        let e = MeshError::NonManifoldFace { face: 2, cells: 3 };
        assert_eq!(e.category(), ErrorCategory::StructuralInconsistency);
    }

    #[test]
    fn messages_name_the_offender() {
        let e = MeshError::ShareMismatch {
            neighbor: 4,
            face: 17,
            reason: "no record".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("rank 4"));
        assert!(msg.contains("face 17"));
    }
}
