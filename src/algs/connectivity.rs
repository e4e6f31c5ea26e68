//! Per-zone connectivity: neighbors across faces, corner-faces in canonical
//! winding, and the matching corner on the far side of every corner-face.
//!
//! Each face is walked in the winding of
//! [`oriented_cell_faces`](crate::topology::orientation::oriented_cell_faces)
//! as seen from the zone being built. Opposite corners are always found by
//! vertex identity (local vertex for internal faces, global vertex id for
//! shared faces), never by position in a loop, so the two sides agree even
//! though they walk the face in opposite directions.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::algs::boundary::{BoundaryClassification, FaceKind};
use crate::algs::corners::CornerIndex;
use crate::algs::half_face::HalfFaceIndex;
use crate::algs::shared_faces::SharedFaceMap;
use crate::data::connectivity::ZoneConnectivity;
use crate::mesh_error::MeshError;
use crate::topology::mesh::PolyMesh;
use crate::topology::orientation::oriented_cell_faces;

/// Vertices of local face `local_face` of `cell` in canonical winding.
pub fn oriented_face_vertices(
    mesh: &PolyMesh,
    cell: usize,
    local_face: usize,
) -> Result<Vec<usize>, MeshError> {
    let n_faces = mesh.cell_faces.row_len(cell);
    oriented_cell_faces(mesh, cell)?
        .into_iter()
        .nth(local_face)
        .ok_or(MeshError::IndexOutOfRange {
            what: "local face",
            index: local_face,
            len: n_faces,
        })
}

/// Everything the builder reads.
#[derive(Clone, Copy)]
pub struct ConnectivityInputs<'a> {
    pub mesh: &'a PolyMesh,
    pub halves: &'a HalfFaceIndex,
    pub corners: &'a CornerIndex,
    pub boundary: &'a BoundaryClassification,
    pub shared: &'a SharedFaceMap,
}

/// Connectivity record of one zone.
pub fn zone_connectivity(
    inputs: &ConnectivityInputs<'_>,
    zone: usize,
) -> Result<ZoneConnectivity, MeshError> {
    let ConnectivityInputs {
        mesh,
        halves,
        corners,
        boundary,
        shared,
    } = *inputs;
    let faces = mesh.cell_faces.row(zone);
    let loops = oriented_cell_faces(mesh, zone)?;

    let mut out = ZoneConnectivity {
        zone,
        corner_offset: corners.corner_offset(zone),
        n_corners: corners.n_corners(zone),
        zones_opp: Vec::with_capacity(faces.len()),
        ncorners_on_face: Vec::with_capacity(faces.len()),
        face_bcids: Vec::with_capacity(faces.len()),
        ..ZoneConnectivity::default()
    };

    for (lf, (&face, loop_vertices)) in faces.iter().zip(&loops).enumerate() {
        let hf = halves.half_face(zone, lf);
        out.ncorners_on_face.push(loop_vertices.len());
        out.face_bcids.push(boundary.bcid(face));
        for &v in loop_vertices {
            out.corners_local.push(corners.local_corner(zone, v)?);
        }

        match boundary.kind(face) {
            FaceKind::Interior => {
                let opp = halves
                    .opposite_cell(hf)
                    .ok_or(MeshError::DegenerateFace { cell: zone, face })?;
                out.zones_opp.push(Some(opp));
                for &v in loop_vertices {
                    out.corners_opp.push(Some(corners.global_corner(opp, v)?));
                }
            }
            FaceKind::External { .. } => {
                out.zones_opp.push(None);
                out.corners_opp
                    .extend(std::iter::repeat_n(None, loop_vertices.len()));
            }
            FaceKind::Shared { neighbor, .. } => {
                let remote = shared.get(face).ok_or_else(|| MeshError::ShareMismatch {
                    neighbor,
                    face,
                    reason: "no description received for this face".into(),
                })?;
                out.zones_opp.push(None);
                for &v in loop_vertices {
                    let gid = mesh.global_vertex(v);
                    let corner = remote.corner_at(gid).ok_or_else(|| MeshError::ShareMismatch {
                        neighbor,
                        face,
                        reason: format!("neighbor has no corner at global vertex {gid}"),
                    })?;
                    out.corners_opp.push(Some(corner));
                }
            }
        }
    }
    Ok(out)
}

/// Connectivity records for every zone, in zone order.
pub fn build_connectivity(
    inputs: &ConnectivityInputs<'_>,
) -> Result<Vec<ZoneConnectivity>, MeshError> {
    let n_cells = inputs.mesh.n_cells();
    #[cfg(feature = "rayon")]
    let zones: Result<Vec<_>, _> = (0..n_cells)
        .into_par_iter()
        .map(|z| zone_connectivity(inputs, z))
        .collect();
    #[cfg(not(feature = "rayon"))]
    let zones: Result<Vec<_>, _> = (0..n_cells).map(|z| zone_connectivity(inputs, z)).collect();

    let zones = zones?;
    log::debug!(
        "built connectivity for {} zones ({} corner-faces)",
        zones.len(),
        zones.iter().map(ZoneConnectivity::n_corner_faces).sum::<usize>()
    );
    Ok(zones)
}
