//! Raw polyhedral mesh as read from the mesh document.
//!
//! Everything is stored as parallel arrays indexed by small integer ids:
//! vertices, faces and cells refer to each other only through [`Csr`] rows,
//! so there is no ownership graph to maintain.

use serde::{Deserialize, Serialize};

use crate::topology::csr::Csr;

/// Faces listed by vertex set together with one integer tag per face.
///
/// This is the reduced "boundary topology": a subset of the mesh faces,
/// identified only by their vertices, carrying the boundary-condition id the
/// user assigned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryTopology {
    /// Face → local vertex ids.
    pub faces: Csr,
    /// Boundary-condition id per boundary face.
    pub attribute: Vec<i32>,
}

/// One adjacency-set record: faces shared between a pair of partitions.
///
/// `faces[i][k]` is the local face id of the i-th shared face on partition
/// `partitions[k]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyGroup {
    pub name: String,
    pub partitions: [usize; 2],
    pub faces: Vec<[usize; 2]>,
}

impl AdjacencyGroup {
    /// Index of `rank` within `partitions`, if this group involves it.
    pub fn side_of(&self, rank: usize) -> Option<usize> {
        self.partitions.iter().position(|&p| p == rank)
    }
}

/// Unstructured polyhedral mesh of one partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolyMesh {
    /// Vertex positions.
    pub coords: Vec<[f64; 3]>,
    /// Cell → ordered face ids.
    pub cell_faces: Csr,
    /// Face → ordered vertex ids.
    pub face_vertices: Csr,
    /// Partition-independent vertex ids; identity when the input has none.
    pub global_vertex_ids: Vec<u64>,
    /// Tagged boundary faces, if the input carries any.
    pub boundary: Option<BoundaryTopology>,
    /// Faces shared with other partitions.
    pub adjacency: Vec<AdjacencyGroup>,
}

impl PolyMesh {
    #[inline]
    pub fn n_vertices(&self) -> usize {
        self.coords.len()
    }

    #[inline]
    pub fn n_faces(&self) -> usize {
        self.face_vertices.len()
    }

    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cell_faces.len()
    }

    #[inline]
    pub fn global_vertex(&self, v: usize) -> u64 {
        self.global_vertex_ids[v]
    }

    /// Order-independent key of a face: its sorted global vertex ids.
    pub fn face_key(&self, face: usize) -> Vec<u64> {
        let mut key: Vec<u64> = self
            .face_vertices
            .row(face)
            .iter()
            .map(|&v| self.global_vertex_ids[v])
            .collect();
        key.sort_unstable();
        key
    }
}
