//! Half-face dictionary: every `(cell, local face)` pair gets an id, and
//! every face knows the one or two half-faces that reference it.
//
// Ids are assigned in cell order then local-face order, so the half-face id
// of `(cell, lf)` is simply the cell→face CSR offset of `cell` plus `lf`.
// Opposite-side lookups follow the "first owner / second owner" scheme of a
// dual-graph build: the first cell seen for a face is its owner, the second
// its neighbor, a third is a non-manifold error.

use crate::debug_invariants::DebugInvariants;
use crate::mesh_error::MeshError;
use crate::topology::mesh::PolyMesh;

/// Half-faces referencing one face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceHalves {
    pub first: Option<usize>,
    pub second: Option<usize>,
}

impl FaceHalves {
    pub fn count(&self) -> usize {
        usize::from(self.first.is_some()) + usize::from(self.second.is_some())
    }
}

/// Both half-face dictionaries.
#[derive(Debug, Clone, Default)]
pub struct HalfFaceIndex {
    /// `cell → first half-face id`; length `cells + 1`.
    cell_offsets: Vec<usize>,
    /// Owning cell per half-face.
    half_face_cell: Vec<usize>,
    /// Global face per half-face.
    half_face_face: Vec<usize>,
    /// Face → referencing half-faces.
    face_halves: Vec<FaceHalves>,
}

impl HalfFaceIndex {
    /// Build the dictionaries from the cell→face incidence of `mesh`.
    pub fn build(mesh: &PolyMesh) -> Result<Self, MeshError> {
        let n_faces = mesh.n_faces();
        let n_half = mesh.cell_faces.indices().len();
        let mut half_face_cell = Vec::with_capacity(n_half);
        let mut half_face_face = Vec::with_capacity(n_half);
        let mut face_halves = vec![FaceHalves::default(); n_faces];

        for cell in 0..mesh.n_cells() {
            for &face in mesh.cell_faces.row(cell) {
                let hf = half_face_cell.len();
                let slot = face_halves.get_mut(face).ok_or(MeshError::IndexOutOfRange {
                    what: "face",
                    index: face,
                    len: n_faces,
                })?;
                if slot.first.is_none() {
                    slot.first = Some(hf);
                } else if slot.second.is_none() {
                    slot.second = Some(hf);
                } else {
                    let cells = mesh
                        .cell_faces
                        .indices()
                        .iter()
                        .filter(|&&f| f == face)
                        .count();
                    return Err(MeshError::NonManifoldFace { face, cells });
                }
                half_face_cell.push(cell);
                half_face_face.push(face);
            }
        }

        let idx = Self {
            cell_offsets: mesh.cell_faces.offsets().to_vec(),
            half_face_cell,
            half_face_face,
            face_halves,
        };
        crate::debug_invariants!(idx.validate_invariants(), "HalfFaceIndex::build");
        log::debug!(
            "half-face index: {} half-faces over {} faces",
            idx.n_half_faces(),
            n_faces
        );
        Ok(idx)
    }

    pub fn n_half_faces(&self) -> usize {
        self.half_face_cell.len()
    }

    /// `(cell, local face) → half-face id`.
    #[inline]
    pub fn half_face(&self, cell: usize, local_face: usize) -> usize {
        self.cell_offsets[cell] + local_face
    }

    #[inline]
    pub fn cell_of(&self, hf: usize) -> usize {
        self.half_face_cell[hf]
    }

    /// Position of `hf` within its cell's face list.
    #[inline]
    pub fn local_face(&self, hf: usize) -> usize {
        hf - self.cell_offsets[self.cell_of(hf)]
    }

    #[inline]
    pub fn face_of(&self, hf: usize) -> usize {
        self.half_face_face[hf]
    }

    /// Half-faces referencing `face`.
    pub fn halves(&self, face: usize) -> FaceHalves {
        self.face_halves[face]
    }

    /// True when `face` has exactly one incident cell in this partition.
    pub fn is_boundary_face(&self, face: usize) -> bool {
        self.face_halves[face].count() == 1
    }

    /// The other half-face of an internal face.
    pub fn opposite_half_face(&self, hf: usize) -> Option<usize> {
        match self.face_halves[self.face_of(hf)] {
            FaceHalves {
                first: Some(a),
                second: Some(b),
            } => Some(if a == hf { b } else { a }),
            _ => None,
        }
    }

    /// Owner of the opposite half-face, or `None` on a boundary.
    pub fn opposite_cell(&self, hf: usize) -> Option<usize> {
        self.opposite_half_face(hf).map(|o| self.cell_of(o))
    }
}

impl DebugInvariants for HalfFaceIndex {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "HalfFaceIndex");
    }

    fn validate_invariants(&self) -> Result<(), MeshError> {
        for hf in 0..self.n_half_faces() {
            let halves = self.face_halves[self.face_of(hf)];
            if halves.first != Some(hf) && halves.second != Some(hf) {
                return Err(MeshError::IndexOutOfRange {
                    what: "half-face",
                    index: hf,
                    len: self.n_half_faces(),
                });
            }
            if let Some(o) = self.opposite_half_face(hf) {
                if self.opposite_half_face(o) != Some(hf) {
                    return Err(MeshError::NonManifoldFace {
                        face: self.face_of(hf),
                        cells: 2,
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::csr::Csr;

    /// Two cells (faces 0..3 and 3..6) sharing face 3.
    fn two_cells() -> PolyMesh {
        PolyMesh {
            cell_faces: Csr::from_rows([vec![0usize, 1, 2, 3], vec![3, 4, 5, 6]]),
            face_vertices: Csr::from_rows(vec![vec![0usize, 1, 2]; 7]),
            ..PolyMesh::default()
        }
    }

    #[test]
    fn ids_are_contiguous_in_cell_then_face_order() {
        let idx = HalfFaceIndex::build(&two_cells()).unwrap();
        assert_eq!(idx.n_half_faces(), 8);
        assert_eq!(idx.half_face(0, 3), 3);
        assert_eq!(idx.half_face(1, 0), 4);
        assert_eq!(idx.cell_of(5), 1);
        assert_eq!(idx.face_of(5), 4);
        assert_eq!(idx.local_face(5), 1);
        assert_eq!(idx.local_face(3), 3);
    }

    #[test]
    fn shared_face_sees_the_other_cell() {
        let idx = HalfFaceIndex::build(&two_cells()).unwrap();
        let a = idx.half_face(0, 3);
        let b = idx.half_face(1, 0);
        assert_eq!(idx.opposite_cell(a), Some(1));
        assert_eq!(idx.opposite_cell(b), Some(0));
        assert_eq!(idx.opposite_half_face(a), Some(b));
        assert!(!idx.is_boundary_face(3));
        assert!(idx.is_boundary_face(0));
        assert_eq!(idx.opposite_cell(idx.half_face(0, 0)), None);
    }

    #[test]
    fn third_cell_on_a_face_is_rejected() {
        let mut mesh = two_cells();
        mesh.cell_faces = Csr::from_rows([vec![0usize, 3], vec![3, 4], vec![3, 5]]);
        let err = HalfFaceIndex::build(&mesh).unwrap_err();
        assert_eq!(err, MeshError::NonManifoldFace { face: 3, cells: 3 });
    }

    #[test]
    fn dangling_face_reference_is_rejected() {
        let mut mesh = two_cells();
        mesh.cell_faces = Csr::from_rows([vec![0usize, 9]]);
        assert!(matches!(
            HalfFaceIndex::build(&mesh),
            Err(MeshError::IndexOutOfRange { what: "face", index: 9, .. })
        ));
    }
}
