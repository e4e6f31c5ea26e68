//! Canonical winding of the faces of a cell.
//!
//! Convention: corners of a face are listed **clockwise when viewed from
//! outside the cell**, i.e. curling the fingers of the left hand along the
//! list makes the thumb point out of the cell. The loop starts at the vertex
//! with the smallest global id. Both rules together make the result
//! independent of how the input happened to list the face.
//
// Orientation is decided per cell, not per face: every edge of a closed cell
// is shared by exactly two of its faces, which must walk it in opposite
// directions. Fixing one face and propagating that rule orients the whole
// shell; the sign of the enclosed volume then tells inward from outward.
// This holds for non-convex cells, where comparing a face normal with the
// cell centre does not.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::geometry::metrics::{EPS, centroid, dot, norm, polygon_area_vector, sub};
use crate::mesh_error::MeshError;
use crate::topology::mesh::PolyMesh;

/// For each loop of a closed cell, whether it must be reversed to run
/// clockwise seen from outside.
///
/// `face_ids` only label errors. Vertices index `coords`.
pub fn outward_reversals(
    cell: usize,
    face_ids: &[usize],
    loops: &[&[usize]],
    coords: &[[f64; 3]],
) -> Result<Vec<bool>, MeshError> {
    let open = |reason: String| MeshError::OpenCell { cell, reason };
    if loops.is_empty() {
        return Ok(Vec::new());
    }

    let mut total_area = 0.0;
    for (lf, l) in loops.iter().enumerate() {
        let pts: Vec<[f64; 3]> = l.iter().map(|&v| coords[v]).collect();
        let area = norm(polygon_area_vector(&pts));
        if area <= EPS {
            return Err(MeshError::DegenerateFace {
                cell,
                face: face_ids[lf],
            });
        }
        total_area += area;
    }

    // undirected edge -> (local face, walked from smaller to larger vertex)
    let mut edges: BTreeMap<(usize, usize), Vec<(usize, bool)>> = BTreeMap::new();
    for (lf, l) in loops.iter().enumerate() {
        for (a, b) in l.iter().copied().circular_tuple_windows() {
            edges.entry((a.min(b), a.max(b))).or_default().push((lf, a < b));
        }
    }
    if let Some(((a, b), uses)) = edges.iter().find(|(_, uses)| uses.len() != 2) {
        return Err(open(format!(
            "edge ({a}, {b}) bounds {} of its faces",
            uses.len()
        )));
    }

    let mut flips: Vec<Option<bool>> = vec![None; loops.len()];
    flips[0] = Some(false);
    let mut stack = vec![(0usize, false)];
    while let Some((lf, flip)) = stack.pop() {
        for (a, b) in loops[lf].iter().copied().circular_tuple_windows() {
            let forward = (a < b) != flip;
            let (other, other_forward) = edges
                .get(&(a.min(b), a.max(b)))
                .and_then(|uses| uses.iter().copied().find(|&(g, _)| g != lf))
                .ok_or_else(|| {
                    open(format!("face {} walks edge ({a}, {b}) twice", face_ids[lf]))
                })?;
            // the neighbor must walk the edge the other way
            let want = other_forward == forward;
            match flips[other] {
                None => {
                    flips[other] = Some(want);
                    stack.push((other, want));
                }
                Some(have) if have != want => {
                    return Err(open(format!(
                        "faces {} and {} cannot agree on edge ({a}, {b})",
                        face_ids[lf], face_ids[other]
                    )));
                }
                Some(_) => {}
            }
        }
    }
    let flips: Vec<bool> = flips
        .iter()
        .enumerate()
        .map(|(lf, f)| {
            f.ok_or_else(|| open(format!("face {} is cut off from the rest", face_ids[lf])))
        })
        .collect::<Result<_, _>>()?;

    let center = centroid(loops.iter().flat_map(|l| l.iter().map(|&v| coords[v])));
    let mut volume = 0.0;
    for (l, &flip) in loops.iter().zip(&flips) {
        let mut pts: Vec<[f64; 3]> = l.iter().map(|&v| sub(coords[v], center)).collect();
        if flip {
            pts.reverse();
        }
        volume += dot(centroid(pts.iter().copied()), polygon_area_vector(&pts)) / 6.0;
    }
    if volume.abs() <= EPS * total_area.powf(1.5) {
        return Err(open("faces enclose no volume".into()));
    }

    // right-hand loops around outward normals enclose a positive volume
    let outward_ccw = volume > 0.0;
    Ok(flips.into_iter().map(|f| f != outward_ccw).collect())
}

/// Reverse `vertices` if asked, then rotate the loop to start at the
/// smallest global id.
pub fn canonical_face_loop(vertices: &[usize], reverse: bool, global_ids: &[u64]) -> Vec<usize> {
    let mut out = vertices.to_vec();
    if reverse {
        out.reverse();
    }
    let start = out
        .iter()
        .enumerate()
        .min_by_key(|&(_, &v)| global_ids[v])
        .map_or(0, |(i, _)| i);
    out.rotate_left(start);
    out
}

/// Every face of `cell`, in local order, as a canonical loop.
pub fn oriented_cell_faces(mesh: &PolyMesh, cell: usize) -> Result<Vec<Vec<usize>>, MeshError> {
    let face_ids = mesh.cell_faces.row(cell);
    let loops: Vec<&[usize]> = face_ids.iter().map(|&f| mesh.face_vertices.row(f)).collect();
    let reversals = outward_reversals(cell, face_ids, &loops, &mesh.coords)?;
    Ok(loops
        .iter()
        .zip(reversals)
        .map(|(l, rev)| canonical_face_loop(l, rev, &mesh.global_vertex_ids))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::csr::Csr;

    /// Unit cube, faces listed in mixed directions.
    fn cube() -> (Vec<[f64; 3]>, Vec<Vec<usize>>) {
        let coords = (0..8)
            .map(|i| [(i & 1) as f64, ((i >> 1) & 1) as f64, (i >> 2) as f64])
            .collect();
        let faces = vec![
            vec![0, 1, 3, 2], // -z
            vec![4, 5, 7, 6], // +z
            vec![0, 1, 5, 4], // -y
            vec![2, 6, 7, 3], // +y
            vec![0, 4, 6, 2], // -x
            vec![1, 3, 7, 5], // +x
        ];
        (coords, faces)
    }

    /// Arrowhead (0,0) (4,2) (0,4) (3,2) extruded from z = 0 to z = 1;
    /// vertex 3 is the reflex notch.
    fn concave_prism() -> PolyMesh {
        let base = [[0.0, 0.0], [4.0, 2.0], [0.0, 4.0], [3.0, 2.0]];
        let coords = [0.0, 1.0]
            .iter()
            .flat_map(|&z| base.iter().map(move |p| [p[0], p[1], z]))
            .collect();
        PolyMesh {
            coords,
            cell_faces: Csr::from_rows([[0usize, 1, 2, 3, 4, 5]]),
            face_vertices: Csr::from_rows([
                vec![0usize, 1, 2, 3],
                vec![4, 5, 6, 7],
                vec![0, 1, 5, 4],
                vec![1, 2, 6, 5],
                vec![2, 3, 7, 6],
                vec![3, 0, 4, 7],
            ]),
            global_vertex_ids: (0..8).collect(),
            ..PolyMesh::default()
        }
    }

    fn refs(faces: &[Vec<usize>]) -> Vec<&[usize]> {
        faces.iter().map(Vec::as_slice).collect()
    }

    #[test]
    fn cube_faces_turn_clockwise_from_outside() {
        let (coords, faces) = cube();
        let ids: Vec<usize> = (0..6).collect();
        let rev = outward_reversals(0, &ids, &refs(&faces), &coords).unwrap();
        // -z as listed is counter-clockwise about +z, i.e. clockwise from below
        assert!(!rev[0]);
        assert!(rev[1]);
        let gids: Vec<u64> = (0..8).collect();
        assert_eq!(canonical_face_loop(&faces[1], rev[1], &gids), vec![4, 6, 7, 5]);
    }

    #[test]
    fn answer_does_not_depend_on_the_seed_face() {
        let (coords, mut faces) = cube();
        let ids: Vec<usize> = (0..6).collect();
        let gids: Vec<u64> = (0..8).collect();
        let loops = |faces: &[Vec<usize>]| -> Vec<Vec<usize>> {
            let rev = outward_reversals(0, &ids, &refs(faces), &coords).unwrap();
            faces
                .iter()
                .zip(rev)
                .map(|(f, r)| canonical_face_loop(f, r, &gids))
                .collect()
        };
        let before = loops(&faces);
        faces[0].reverse();
        faces[3].rotate_left(1);
        assert_eq!(loops(&faces), before);
    }

    #[test]
    fn concave_prism_faces_all_point_inward() {
        let mesh = concave_prism();
        let loops = oriented_cell_faces(&mesh, 0).unwrap();
        // outward normals: base polygon is counter-clockwise about +z, so a
        // side edge (dx, dy) faces (dy, -dx)
        let base = [0usize, 1, 2, 3];
        let mut outward = vec![[0.0, 0.0, -1.0], [0.0, 0.0, 1.0]];
        for (a, b) in base.iter().copied().circular_tuple_windows() {
            let d = sub(mesh.coords[b], mesh.coords[a]);
            outward.push([d[1], -d[0], 0.0]);
        }
        for (lf, l) in loops.iter().enumerate() {
            let pts: Vec<[f64; 3]> = l.iter().map(|&v| mesh.coords[v]).collect();
            assert!(
                dot(polygon_area_vector(&pts), outward[lf]) < 0.0,
                "face {lf} winds counter-clockwise from outside: {l:?}"
            );
        }
    }

    #[test]
    fn start_follows_global_ids() {
        let gids = [40u64, 30, 10, 20];
        assert_eq!(canonical_face_loop(&[0, 1, 2, 3], false, &gids), vec![2, 3, 0, 1]);
        assert_eq!(canonical_face_loop(&[0, 1, 2, 3], true, &gids), vec![2, 1, 0, 3]);
    }

    #[test]
    fn open_and_flat_cells_are_rejected() {
        let (coords, faces) = cube();
        let ids: Vec<usize> = (10..16).collect();
        // drop the +x face
        let err = outward_reversals(7, &ids[..5], &refs(&faces[..5]), &coords).unwrap_err();
        assert!(matches!(err, MeshError::OpenCell { cell: 7, .. }), "{err}");

        // squash the cube onto z = 0
        let flat: Vec<[f64; 3]> = coords.iter().map(|p| [p[0], p[1], 0.0]).collect();
        let err = outward_reversals(7, &ids, &refs(&faces), &flat).unwrap_err();
        assert!(matches!(err, MeshError::DegenerateFace { cell: 7, face: 12 }), "{err}");
    }

    #[test]
    fn back_to_back_triangles_enclose_nothing() {
        let coords = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let faces = vec![vec![0, 1, 2], vec![0, 1, 2]];
        let err = outward_reversals(0, &[0, 1], &refs(&faces), &coords).unwrap_err();
        assert!(matches!(err, MeshError::OpenCell { .. }), "{err}");
    }
}
