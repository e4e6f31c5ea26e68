//! Corner numbering: one corner per (cell, incident vertex).
//!
//! A cell's vertices are taken in order of first appearance while walking its
//! faces in face order and each face's vertices in stored order; the local
//! corner id is the position in that list. No reordering happens here: the
//! solver's ordering guarantees come from face winding, not from corner ids.
//!
//! Global corner ids are `corner_offset(cell) + local`, where the offsets are
//! the exclusive prefix sum of per-cell corner counts. Corner-faces, opposite
//! corners and corner coordinates all use this single numbering.

use crate::mesh_error::MeshError;
use crate::topology::csr::Csr;
use crate::topology::mesh::PolyMesh;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CornerIndex {
    /// Cell → vertex per local corner. Its CSR offsets are the corner offsets
    /// and its flat index array maps global corner → vertex.
    pub cell_vertices: Csr,
    corner_cell: Vec<usize>,
}

impl CornerIndex {
    pub fn build(mesh: &PolyMesh) -> Self {
        let mut rows: Vec<Vec<usize>> = Vec::with_capacity(mesh.n_cells());
        for cell in 0..mesh.n_cells() {
            let mut verts: Vec<usize> = Vec::new();
            for &face in mesh.cell_faces.row(cell) {
                for &v in mesh.face_vertices.row(face) {
                    if !verts.contains(&v) {
                        verts.push(v);
                    }
                }
            }
            rows.push(verts);
        }
        let cell_vertices = Csr::from_rows(&rows);
        let corner_cell = rows
            .iter()
            .enumerate()
            .flat_map(|(cell, r)| std::iter::repeat_n(cell, r.len()))
            .collect();
        log::debug!(
            "corner index: {} corners over {} cells",
            cell_vertices.indices().len(),
            mesh.n_cells()
        );
        Self {
            cell_vertices,
            corner_cell,
        }
    }

    /// Total corner count.
    #[inline]
    pub fn n_corners_total(&self) -> usize {
        self.corner_cell.len()
    }

    #[inline]
    pub fn n_corners(&self, cell: usize) -> usize {
        self.cell_vertices.row_len(cell)
    }

    /// Global id of the first corner of `cell`.
    #[inline]
    pub fn corner_offset(&self, cell: usize) -> usize {
        self.cell_vertices.row_start(cell)
    }

    /// Exclusive prefix sum of corner counts (length `cells + 1`).
    pub fn offsets(&self) -> &[usize] {
        self.cell_vertices.offsets()
    }

    /// Vertices of `cell` in local corner order.
    pub fn vertices(&self, cell: usize) -> &[usize] {
        self.cell_vertices.row(cell)
    }

    /// Local corner id of `vertex` in `cell`.
    pub fn local_corner(&self, cell: usize, vertex: usize) -> Result<usize, MeshError> {
        self.vertices(cell)
            .iter()
            .position(|&v| v == vertex)
            .ok_or(MeshError::CornerNotInCell { cell, vertex })
    }

    /// Global corner id of `vertex` in `cell`.
    pub fn global_corner(&self, cell: usize, vertex: usize) -> Result<usize, MeshError> {
        Ok(self.corner_offset(cell) + self.local_corner(cell, vertex)?)
    }

    #[inline]
    pub fn vertex_of(&self, corner: usize) -> usize {
        self.cell_vertices.indices()[corner]
    }

    #[inline]
    pub fn cell_of(&self, corner: usize) -> usize {
        self.corner_cell[corner]
    }
}
