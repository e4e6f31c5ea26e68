//! Structural validation of the input mesh and of the finished corner mesh.

use std::collections::BTreeSet;

use crate::algs::boundary::NO_BOUNDARY;
use crate::data::connectivity::SolverMesh;
use crate::mesh_error::MeshError;
use crate::topology::mesh::PolyMesh;
use crate::topology::orientation::outward_reversals;

/// Optional validation toggles for input checks.
#[derive(Debug, Clone, Copy)]
pub struct MeshValidationOptions {
    /// Require every face to be referenced by at least one cell.
    pub reject_orphan_faces: bool,
    /// Require every adjacency group to involve this rank.
    pub require_local_groups: bool,
}

impl Default for MeshValidationOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl MeshValidationOptions {
    /// Enable all checks.
    pub fn all() -> Self {
        Self {
            reject_orphan_faces: true,
            require_local_groups: true,
        }
    }
}

/// Validate the raw mesh of partition `rank` out of `n_ranks`.
pub fn validate_poly_mesh(mesh: &PolyMesh, rank: usize, n_ranks: usize) -> Result<(), MeshError> {
    validate_poly_mesh_with(mesh, rank, n_ranks, MeshValidationOptions::all())
}

/// [`validate_poly_mesh`] with explicit toggles.
pub fn validate_poly_mesh_with(
    mesh: &PolyMesh,
    rank: usize,
    n_ranks: usize,
    options: MeshValidationOptions,
) -> Result<(), MeshError> {
    if mesh.global_vertex_ids.len() != mesh.n_vertices() {
        return Err(MeshError::LengthMismatch {
            what: "global vertex ids",
            expected: mesh.n_vertices(),
            found: mesh.global_vertex_ids.len(),
        });
    }
    let distinct_gids: BTreeSet<u64> = mesh.global_vertex_ids.iter().copied().collect();
    if distinct_gids.len() != mesh.n_vertices() {
        return Err(MeshError::LengthMismatch {
            what: "distinct global vertex ids",
            expected: mesh.n_vertices(),
            found: distinct_gids.len(),
        });
    }

    for (face, row) in mesh.face_vertices.rows().enumerate() {
        if let Some(&v) = row.iter().find(|&&v| v >= mesh.n_vertices()) {
            return Err(MeshError::IndexOutOfRange {
                what: "face vertex",
                index: v,
                len: mesh.n_vertices(),
            });
        }
        let distinct = row.iter().collect::<BTreeSet<_>>().len();
        if distinct < 3 || distinct != row.len() {
            return Err(MeshError::FaceArity {
                face,
                vertices: distinct,
            });
        }
    }

    let mut uses = vec![0usize; mesh.n_faces()];
    for (cell, row) in mesh.cell_faces.rows().enumerate() {
        if let Some(&f) = row.iter().find(|&&f| f >= mesh.n_faces()) {
            return Err(MeshError::IndexOutOfRange {
                what: "cell face",
                index: f,
                len: mesh.n_faces(),
            });
        }
        let distinct = row.iter().collect::<BTreeSet<_>>().len();
        if distinct < 4 || distinct != row.len() {
            return Err(MeshError::CellArity {
                cell,
                faces: distinct,
            });
        }
        for &f in row {
            uses[f] += 1;
        }
    }
    for (face, &n) in uses.iter().enumerate() {
        if n > 2 {
            return Err(MeshError::NonManifoldFace { face, cells: n });
        }
        if n == 0 && options.reject_orphan_faces {
            return Err(MeshError::OrphanFace { face });
        }
    }

    if let Some(boundary) = &mesh.boundary {
        if boundary.attribute.len() != boundary.faces.len() {
            return Err(MeshError::LengthMismatch {
                what: "boundary attribute",
                expected: boundary.faces.len(),
                found: boundary.attribute.len(),
            });
        }
        if let Some(&v) = boundary
            .faces
            .indices()
            .iter()
            .find(|&&v| v >= mesh.n_vertices())
        {
            return Err(MeshError::IndexOutOfRange {
                what: "boundary face vertex",
                index: v,
                len: mesh.n_vertices(),
            });
        }
    }

    for group in &mesh.adjacency {
        let invalid = |reason: String| MeshError::InvalidAdjacency {
            group: group.name.clone(),
            rank,
            reason,
        };
        let Some(side) = group.side_of(rank) else {
            if options.require_local_groups {
                return Err(invalid(format!(
                    "partitions {:?} do not include this rank",
                    group.partitions
                )));
            }
            continue;
        };
        let nbr = group.partitions[1 - side];
        if nbr == rank {
            return Err(invalid("group names the same partition twice".into()));
        }
        if nbr >= n_ranks {
            return Err(invalid(format!(
                "neighbor {nbr} out of range for {n_ranks} rank(s)"
            )));
        }
        if let Some(pair) = group.faces.iter().find(|p| p[side] >= mesh.n_faces()) {
            return Err(invalid(format!(
                "face {} out of range ({} faces)",
                pair[side],
                mesh.n_faces()
            )));
        }
    }

    log::debug!(
        "rank {rank}: input mesh ok ({} vertices, {} faces, {} cells)",
        mesh.n_vertices(),
        mesh.n_faces(),
        mesh.n_cells()
    );
    Ok(())
}

/// Validate the finished corner mesh against the mesh it was built from.
pub fn validate_corner_mesh(mesh: &PolyMesh, solver: &SolverMesh) -> Result<(), MeshError> {
    let global = |reason: String| MeshError::CornerMeshInvalid {
        zone: usize::MAX,
        reason,
    };
    let corners = &solver.corners;
    let offsets = corners.offsets();
    let n_corners = corners.n_corners_total();

    if offsets.len() != mesh.n_cells() + 1 || offsets.first() != Some(&0) {
        return Err(global(format!(
            "corner offsets have {} entries for {} cells",
            offsets.len(),
            mesh.n_cells()
        )));
    }
    if offsets.last() != Some(&n_corners) {
        return Err(global("last corner offset is not the corner count".into()));
    }
    if n_corners > i32::MAX as usize {
        return Err(global(format!("{n_corners} corners do not fit in i32")));
    }
    if solver.coords.len() != n_corners {
        return Err(global(format!(
            "{} corner positions for {n_corners} corners",
            solver.coords.len()
        )));
    }
    if solver.zones.len() != mesh.n_cells() {
        return Err(global(format!(
            "{} zone records for {} cells",
            solver.zones.len(),
            mesh.n_cells()
        )));
    }

    for (z, rec) in solver.zones.iter().enumerate() {
        let bad = |reason: String| MeshError::CornerMeshInvalid { zone: z, reason };
        if offsets[z + 1] <= offsets[z] {
            return Err(bad("corner offsets are not strictly increasing".into()));
        }
        if rec.zone != z || rec.corner_offset != offsets[z] {
            return Err(bad(format!(
                "record says zone {} at offset {}",
                rec.zone, rec.corner_offset
            )));
        }
        if rec.n_corners != offsets[z + 1] - offsets[z] {
            return Err(bad(format!("record has {} corners", rec.n_corners)));
        }
        let n_faces = mesh.cell_faces.row_len(z);
        if rec.n_faces() != n_faces
            || rec.ncorners_on_face.len() != n_faces
            || rec.face_bcids.len() != n_faces
        {
            return Err(bad(format!("per-face arrays do not have {n_faces} entries")));
        }
        let n_corner_faces: usize = rec.ncorners_on_face.iter().sum();
        if rec.corners_local.len() != n_corner_faces || rec.corners_opp.len() != n_corner_faces {
            return Err(bad(format!(
                "per-corner-face arrays do not have {n_corner_faces} entries"
            )));
        }

        let mut seen = vec![false; rec.n_corners];
        for &c in &rec.corners_local {
            let slot = seen
                .get_mut(c)
                .ok_or_else(|| bad(format!("local corner {c} out of range")))?;
            *slot = true;
        }
        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(bad(format!("corner {missing} lies on no face")));
        }

        let face_ids = mesh.cell_faces.row(z);
        for (lf, &opp) in rec.zones_opp.iter().enumerate() {
            match opp {
                Some(o) if o >= mesh.n_cells() => {
                    return Err(bad(format!("opposite zone {o} out of range")));
                }
                Some(_) if rec.face_bcids[lf] != NO_BOUNDARY => {
                    return Err(bad(format!("internal face {lf} has a boundary id")));
                }
                Some(o) => {
                    for i in rec.face_corners(lf) {
                        match rec.corners_opp[i] {
                            Some(c) if c < n_corners && corners.cell_of(c) == o => {}
                            other => {
                                return Err(bad(format!(
                                    "face {lf}: opposite corner {other:?} is not in zone {o}"
                                )));
                            }
                        }
                    }
                }
                None if rec.face_bcids[lf] == NO_BOUNDARY => {
                    return Err(bad(format!("boundary face {lf} has no boundary id")));
                }
                None if solver.boundary.is_shared(face_ids[lf]) => {
                    if let Some(i) = rec.face_corners(lf).find(|&i| rec.corners_opp[i].is_none()) {
                        return Err(bad(format!(
                            "shared face {lf}: corner-face {i} has no opposite corner"
                        )));
                    }
                }
                None => {}
            }
        }

        let vertices = corners.vertices(z);
        let loops: Vec<Vec<usize>> = (0..n_faces)
            .map(|lf| {
                rec.face_corners(lf)
                    .map(|i| vertices[rec.corners_local[i]])
                    .collect()
            })
            .collect();
        let loops: Vec<&[usize]> = loops.iter().map(Vec::as_slice).collect();
        let reversals = outward_reversals(z, face_ids, &loops, &mesh.coords)
            .map_err(|e| bad(e.to_string()))?;
        if let Some(lf) = reversals.iter().position(|&r| r) {
            return Err(bad(format!("face {lf} is not wound clockwise seen from outside")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::NoComm;
    use crate::algs::pipeline::MeshPipeline;
    use crate::topology::csr::Csr;
    use crate::topology::mesh::{AdjacencyGroup, BoundaryTopology};

    fn tet() -> PolyMesh {
        PolyMesh {
            coords: vec![[0.0; 3]; 4],
            cell_faces: Csr::from_rows([[0usize, 1, 2, 3]]),
            face_vertices: Csr::from_rows([[0usize, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]]),
            global_vertex_ids: vec![0, 1, 2, 3],
            ..PolyMesh::default()
        }
    }

    #[test]
    fn valid_tet_passes() {
        assert_eq!(validate_poly_mesh(&tet(), 0, 1), Ok(()));
    }

    #[test]
    fn structural_errors_are_reported() {
        let mut m = tet();
        m.face_vertices = Csr::from_rows([[0usize, 2, 9], [0, 1, 3], [1, 2, 3], [0, 3, 2]]);
        assert!(matches!(
            validate_poly_mesh(&m, 0, 1),
            Err(MeshError::IndexOutOfRange { index: 9, .. })
        ));

        let mut m = tet();
        m.face_vertices = Csr::from_rows([
            vec![0usize, 2, 2],
            vec![0, 1, 3],
            vec![1, 2, 3],
            vec![0, 3, 2],
        ]);
        assert_eq!(
            validate_poly_mesh(&m, 0, 1),
            Err(MeshError::FaceArity { face: 0, vertices: 2 })
        );

        let mut m = tet();
        m.cell_faces = Csr::from_rows([[0usize, 1, 2]]);
        assert_eq!(
            validate_poly_mesh(&m, 0, 1),
            Err(MeshError::CellArity { cell: 0, faces: 3 })
        );

        let mut m = tet();
        m.cell_faces = Csr::from_rows([[0usize, 1, 2, 3], [0, 1, 2, 3], [0, 1, 2, 3]]);
        assert_eq!(
            validate_poly_mesh(&m, 0, 1),
            Err(MeshError::NonManifoldFace { face: 0, cells: 3 })
        );
    }

    #[test]
    fn orphan_faces_are_optional() {
        let mut m = tet();
        m.face_vertices =
            Csr::from_rows([[0usize, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2], [0, 1, 2]]);
        assert_eq!(
            validate_poly_mesh(&m, 0, 1),
            Err(MeshError::OrphanFace { face: 4 })
        );
        let opts = MeshValidationOptions {
            reject_orphan_faces: false,
            ..MeshValidationOptions::all()
        };
        assert_eq!(validate_poly_mesh_with(&m, 0, 1, opts), Ok(()));
    }

    #[test]
    fn boundary_attribute_length_is_checked() {
        let mut m = tet();
        m.boundary = Some(BoundaryTopology {
            faces: Csr::from_rows([[0usize, 1, 2]]),
            attribute: vec![1, 2],
        });
        assert!(matches!(
            validate_poly_mesh(&m, 0, 1),
            Err(MeshError::LengthMismatch { what: "boundary attribute", .. })
        ));
    }

    #[test]
    fn adjacency_groups_are_checked() {
        let group = |partitions: [usize; 2], face: usize| AdjacencyGroup {
            name: "g".into(),
            partitions,
            faces: vec![[face, 0]],
        };
        let mut m = tet();
        m.adjacency = vec![group([0, 1], 2)];
        assert_eq!(validate_poly_mesh(&m, 0, 2), Ok(()));
        // neighbor out of range
        assert!(matches!(
            validate_poly_mesh(&m, 0, 1),
            Err(MeshError::InvalidAdjacency { .. })
        ));
        // this rank not involved
        assert!(validate_poly_mesh(&m, 2, 3).is_err());
        // self-neighbor
        m.adjacency = vec![group([0, 0], 2)];
        assert!(validate_poly_mesh(&m, 0, 2).is_err());
        // face out of range
        m.adjacency = vec![group([0, 1], 4)];
        assert!(validate_poly_mesh(&m, 0, 2).is_err());
    }

    #[test]
    fn duplicate_global_ids_are_rejected() {
        let mut m = tet();
        m.global_vertex_ids = vec![0, 1, 1, 3];
        assert!(matches!(
            validate_poly_mesh(&m, 0, 1),
            Err(MeshError::LengthMismatch { what: "distinct global vertex ids", .. })
        ));
    }

    fn converted_tet() -> (PolyMesh, SolverMesh) {
        let mut mesh = tet();
        mesh.coords = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        mesh.boundary = Some(BoundaryTopology {
            faces: mesh.face_vertices.clone(),
            attribute: vec![1; 4],
        });
        let solver = MeshPipeline::default().convert(&mesh, &NoComm).unwrap();
        (mesh, solver)
    }

    #[test]
    fn converted_tet_passes() {
        let (mesh, solver) = converted_tet();
        assert_eq!(validate_corner_mesh(&mesh, &solver), Ok(()));
    }

    #[test]
    fn wrongly_wound_face_is_caught() {
        let (mesh, mut solver) = converted_tet();
        let zone = &mut solver.zones[0];
        let r = zone.face_corners(2);
        zone.corners_local[r].reverse();
        match validate_corner_mesh(&mesh, &solver) {
            Err(MeshError::CornerMeshInvalid { zone: 0, reason }) => {
                assert!(reason.contains("face 2"), "{reason}");
            }
            other => panic!("expected an orientation error, got {other:?}"),
        }
    }

    #[test]
    fn boundary_face_with_reserved_id_is_caught() {
        let (mesh, mut solver) = converted_tet();
        solver.zones[0].face_bcids[1] = NO_BOUNDARY;
        assert!(matches!(
            validate_corner_mesh(&mesh, &solver),
            Err(MeshError::CornerMeshInvalid { zone: 0, .. })
        ));
    }

    #[test]
    fn empty_corner_mesh_for_empty_input_is_valid() {
        assert_eq!(
            validate_corner_mesh(&PolyMesh::default(), &SolverMesh::default()),
            Ok(())
        );
    }
}
