//! Reading the raw mesh from, and writing the solver arrays into, a
//! [`MeshDocument`] laid out with the paths in [`paths`].

use crate::data::connectivity::SolverMesh;
use crate::io::document::{DocArray, MeshDocument};
use crate::mesh_error::MeshError;
use crate::topology::csr::Csr;
use crate::topology::mesh::{AdjacencyGroup, BoundaryTopology, PolyMesh};

/// Document paths.
pub mod paths {
    pub const COORDS_X: &str = "coordsets/coords/values/x";
    pub const COORDS_Y: &str = "coordsets/coords/values/y";
    pub const COORDS_Z: &str = "coordsets/coords/values/z";

    pub const CELL_FACE_SIZES: &str = "topologies/mesh/elements/sizes";
    pub const CELL_FACES: &str = "topologies/mesh/elements/connectivity";
    pub const FACE_VERTEX_SIZES: &str = "topologies/mesh/subelements/sizes";
    pub const FACE_VERTICES: &str = "topologies/mesh/subelements/connectivity";

    pub const BOUNDARY_SIZES: &str = "topologies/boundary/elements/sizes";
    pub const BOUNDARY_VERTICES: &str = "topologies/boundary/elements/connectivity";
    pub const BOUNDARY_ATTRIBUTE: &str = "fields/boundary_attribute/values";
    pub const GLOBAL_VERTEX_IDS: &str = "fields/global_vertex_ids/values";

    pub const ADJSET_GROUPS: &str = "adjsets/mesh/groups";

    pub const FACE_ATTRIBUTE: &str = "fields/face_attribute/values";
    pub const CORNER_SIZES: &str = "topologies/corner/elements/sizes";
    pub const CORNER_VERTICES: &str = "topologies/corner/elements/connectivity";

    pub const SOLVER_CONNECTIVITY: &str = "solver/connectivity";
    pub const SOLVER_ZONE_OFFSETS: &str = "solver/zone_offsets";
    pub const SOLVER_CORNER_X: &str = "solver/corner_coords/x";
    pub const SOLVER_CORNER_Y: &str = "solver/corner_coords/y";
    pub const SOLVER_CORNER_Z: &str = "solver/corner_coords/z";
    pub const SOLVER_BOUNDARY_IDS: &str = "solver/boundaries/ids";
    pub const SOLVER_BOUNDARY_FACES: &str = "solver/boundaries/face_counts";
    pub const SOLVER_BOUNDARY_CORNER_FACES: &str = "solver/boundaries/corner_face_counts";
    pub const SOLVER_SHARED_ID: &str = "solver/boundaries/shared_id";
    pub const SOLVER_SHARED_RANKS: &str = "solver/boundaries/shared_ranks";
    pub const SOLVER_SHARED_FACES: &str = "solver/boundaries/shared_face_counts";
    pub const SOLVER_SHARED_CORNER_FACES: &str = "solver/boundaries/shared_corner_face_counts";

    /// `adjsets/mesh/groups/<name>/<leaf>`
    pub fn adjset(name: &str, leaf: &str) -> String {
        format!("{ADJSET_GROUPS}/{name}/{leaf}")
    }
}

/// Read a [`PolyMesh`] out of the document.
pub fn read_poly_mesh<D: MeshDocument + ?Sized>(doc: &D) -> Result<PolyMesh, MeshError> {
    let x = doc.fetch_f64(paths::COORDS_X)?;
    let y = doc.fetch_f64(paths::COORDS_Y)?;
    let z = doc.fetch_f64(paths::COORDS_Z)?;
    for other in [&y, &z] {
        if other.len() != x.len() {
            return Err(MeshError::LengthMismatch {
                what: "coordinate components",
                expected: x.len(),
                found: other.len(),
            });
        }
    }
    let coords: Vec<[f64; 3]> = x
        .iter()
        .zip(&y)
        .zip(&z)
        .map(|((&x, &y), &z)| [x, y, z])
        .collect();

    let cell_faces = Csr::from_sizes(
        "cell faces",
        &doc.fetch_indices(paths::CELL_FACE_SIZES)?,
        doc.fetch_indices(paths::CELL_FACES)?,
    )?;
    let face_vertices = Csr::from_sizes(
        "face vertices",
        &doc.fetch_indices(paths::FACE_VERTEX_SIZES)?,
        doc.fetch_indices(paths::FACE_VERTICES)?,
    )?;

    let global_vertex_ids = if doc.has_path(paths::GLOBAL_VERTEX_IDS) {
        doc.fetch_indices(paths::GLOBAL_VERTEX_IDS)?
            .into_iter()
            .map(|g| g as u64)
            .collect()
    } else {
        (0..coords.len() as u64).collect()
    };

    let boundary = if doc.has_path(paths::BOUNDARY_SIZES) {
        let faces = Csr::from_sizes(
            "boundary faces",
            &doc.fetch_indices(paths::BOUNDARY_SIZES)?,
            doc.fetch_indices(paths::BOUNDARY_VERTICES)?,
        )?;
        let attribute = doc.fetch_i32(paths::BOUNDARY_ATTRIBUTE)?;
        Some(BoundaryTopology { faces, attribute })
    } else {
        None
    };

    let mut adjacency = Vec::new();
    for name in doc.child_names(paths::ADJSET_GROUPS) {
        adjacency.push(read_adjacency_group(doc, &name)?);
    }

    Ok(PolyMesh {
        coords,
        cell_faces,
        face_vertices,
        global_vertex_ids,
        boundary,
        adjacency,
    })
}

fn read_adjacency_group<D: MeshDocument + ?Sized>(
    doc: &D,
    name: &str,
) -> Result<AdjacencyGroup, MeshError> {
    let neighbors = doc.fetch_indices(&paths::adjset(name, "neighbors"))?;
    let [a, b] = neighbors[..] else {
        return Err(MeshError::LengthMismatch {
            what: "adjacency group neighbors",
            expected: 2,
            found: neighbors.len(),
        });
    };
    let first = doc.fetch_indices(&paths::adjset(name, "values"))?;
    let second = doc.fetch_indices(&paths::adjset(name, "neighbor_values"))?;
    if first.len() != second.len() {
        return Err(MeshError::LengthMismatch {
            what: "adjacency group values",
            expected: first.len(),
            found: second.len(),
        });
    }
    Ok(AdjacencyGroup {
        name: name.to_string(),
        partitions: [a, b],
        faces: first.into_iter().zip(second).map(|(l, r)| [l, r]).collect(),
    })
}

/// Write a [`PolyMesh`] into the document (inverse of [`read_poly_mesh`]).
pub fn write_poly_mesh<D: MeshDocument + ?Sized>(doc: &mut D, mesh: &PolyMesh) {
    let component = |k: usize| mesh.coords.iter().map(|c| c[k]).collect::<Vec<f64>>();
    doc.set(paths::COORDS_X, DocArray::Float64(component(0)));
    doc.set(paths::COORDS_Y, DocArray::Float64(component(1)));
    doc.set(paths::COORDS_Z, DocArray::Float64(component(2)));

    doc.set(paths::CELL_FACE_SIZES, index_array(&mesh.cell_faces.sizes()));
    doc.set(paths::CELL_FACES, index_array(mesh.cell_faces.indices()));
    doc.set(paths::FACE_VERTEX_SIZES, index_array(&mesh.face_vertices.sizes()));
    doc.set(paths::FACE_VERTICES, index_array(mesh.face_vertices.indices()));
    doc.set(
        paths::GLOBAL_VERTEX_IDS,
        DocArray::Int64(mesh.global_vertex_ids.iter().map(|&g| g as i64).collect()),
    );

    if let Some(boundary) = &mesh.boundary {
        doc.set(paths::BOUNDARY_SIZES, index_array(&boundary.faces.sizes()));
        doc.set(paths::BOUNDARY_VERTICES, index_array(boundary.faces.indices()));
        doc.set(
            paths::BOUNDARY_ATTRIBUTE,
            DocArray::Int32(boundary.attribute.clone()),
        );
    }

    for group in &mesh.adjacency {
        doc.set(
            &paths::adjset(&group.name, "neighbors"),
            index_array(&group.partitions),
        );
        let side = |k: usize| group.faces.iter().map(|p| p[k]).collect::<Vec<usize>>();
        doc.set(&paths::adjset(&group.name, "values"), index_array(&side(0)));
        doc.set(
            &paths::adjset(&group.name, "neighbor_values"),
            index_array(&side(1)),
        );
    }
}

/// Write the expanded face attribute (−1 where unset).
pub fn write_face_attribute<D: MeshDocument + ?Sized>(doc: &mut D, attribute: &[Option<i32>]) {
    doc.set(
        paths::FACE_ATTRIBUTE,
        DocArray::Int32(attribute.iter().map(|a| a.unwrap_or(-1)).collect()),
    );
}

/// Write the corner topology and all solver arrays.
pub fn write_solver_mesh<D: MeshDocument + ?Sized>(doc: &mut D, solver: &SolverMesh) {
    doc.set(
        paths::CORNER_SIZES,
        index_array(&solver.corners.cell_vertices.sizes()),
    );
    doc.set(
        paths::CORNER_VERTICES,
        index_array(solver.corners.cell_vertices.indices()),
    );

    let (stream, offsets) = solver.flatten();
    doc.set(paths::SOLVER_CONNECTIVITY, DocArray::Int32(stream));
    doc.set(paths::SOLVER_ZONE_OFFSETS, index_array(&offsets));

    doc.set(paths::SOLVER_CORNER_X, DocArray::Float64(solver.coords.x.clone()));
    doc.set(paths::SOLVER_CORNER_Y, DocArray::Float64(solver.coords.y.clone()));
    doc.set(paths::SOLVER_CORNER_Z, DocArray::Float64(solver.coords.z.clone()));

    let summary = &solver.boundary.summary;
    doc.set(
        paths::SOLVER_BOUNDARY_IDS,
        DocArray::Int32(summary.groups.keys().copied().collect()),
    );
    doc.set(
        paths::SOLVER_BOUNDARY_FACES,
        index_array(&summary.groups.values().map(|g| g.faces.len()).collect::<Vec<_>>()),
    );
    doc.set(
        paths::SOLVER_BOUNDARY_CORNER_FACES,
        index_array(
            &summary
                .groups
                .values()
                .map(|g| g.corner_faces)
                .collect::<Vec<_>>(),
        ),
    );

    doc.set(
        paths::SOLVER_SHARED_ID,
        DocArray::Int32(vec![solver.boundary.shared_bcid()]),
    );
    doc.set(
        paths::SOLVER_SHARED_RANKS,
        index_array(&summary.shared.keys().copied().collect::<Vec<_>>()),
    );
    doc.set(
        paths::SOLVER_SHARED_FACES,
        index_array(&summary.shared.values().map(|g| g.faces.len()).collect::<Vec<_>>()),
    );
    doc.set(
        paths::SOLVER_SHARED_CORNER_FACES,
        index_array(
            &summary
                .shared
                .values()
                .map(|g| g.corner_faces)
                .collect::<Vec<_>>(),
        ),
    );
}

fn index_array(v: &[usize]) -> DocArray {
    DocArray::Int64(v.iter().map(|&i| i as i64).collect())
}
