//! Boundary classification.
//!
//! Every face with a single incident cell in this partition is a boundary
//! face of exactly one kind:
//! * **shared** when the adjacency sets link it to a neighboring partition
//!   (regardless of any attribute value it carries), or
//! * **external** otherwise, taking its boundary-condition id from the
//!   expanded face attribute, which must be set.

use std::collections::BTreeMap;

use crate::algs::half_face::HalfFaceIndex;
use crate::mesh_error::MeshError;
use crate::overlap::overlap::Overlap;
use crate::topology::mesh::PolyMesh;

/// Boundary id reported for faces with a local cell on both sides.
pub const NO_BOUNDARY: i32 = -1;

/// Default boundary id for shared faces ("resolve via partition exchange").
pub const DEFAULT_SHARED_BOUNDARY_ID: i32 = 0;

/// Classification of one face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceKind {
    /// Two local cells.
    Interior,
    /// Physical boundary with its condition id.
    External { bcid: i32 },
    /// Partition boundary; the other cell lives on `neighbor`.
    Shared { neighbor: usize, remote_face: usize },
}

/// Faces carrying one boundary condition (or facing one neighbor).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundaryGroup {
    /// Face ids, ascending.
    pub faces: Vec<usize>,
    /// Number of corner-faces on those faces.
    pub corner_faces: usize,
}

/// Boundary faces grouped for the solver.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundarySummary {
    /// External faces keyed by condition id.
    pub groups: BTreeMap<i32, BoundaryGroup>,
    /// Shared faces keyed by neighbor rank.
    pub shared: BTreeMap<usize, BoundaryGroup>,
    /// Corner-faces on all boundary faces.
    pub corner_faces: usize,
}

/// Per-face classification.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BoundaryClassification {
    kinds: Vec<FaceKind>,
    shared_bcid: i32,
    pub summary: BoundarySummary,
}

impl BoundaryClassification {
    #[inline]
    pub fn kind(&self, face: usize) -> FaceKind {
        self.kinds[face]
    }

    /// Boundary-condition id of `face` as handed to the solver.
    pub fn bcid(&self, face: usize) -> i32 {
        match self.kinds[face] {
            FaceKind::Interior => NO_BOUNDARY,
            FaceKind::External { bcid } => bcid,
            FaceKind::Shared { .. } => self.shared_bcid,
        }
    }

    pub fn shared_bcid(&self) -> i32 {
        self.shared_bcid
    }

    pub fn is_shared(&self, face: usize) -> bool {
        matches!(self.kinds[face], FaceKind::Shared { .. })
    }

    /// Number of faces with no second local cell.
    pub fn n_boundary_faces(&self) -> usize {
        self.kinds
            .iter()
            .filter(|k| !matches!(k, FaceKind::Interior))
            .count()
    }

    /// `(face, kind)` for every boundary face, ascending.
    pub fn boundary_faces(&self) -> impl Iterator<Item = (usize, FaceKind)> + '_ {
        self.kinds
            .iter()
            .enumerate()
            .filter(|(_, k)| !matches!(k, FaceKind::Interior))
            .map(|(f, &k)| (f, k))
    }
}

/// Merge attribute-tagged and partition-shared boundary faces into one
/// face → boundary-condition mapping.
///
/// `attribute` holds one entry per face (see
/// [`expand_face_attribute`](crate::algs::attributes::expand_face_attribute)).
pub fn classify_boundary_faces(
    mesh: &PolyMesh,
    halves: &HalfFaceIndex,
    attribute: &[Option<i32>],
    overlap: &Overlap,
    shared_bcid: i32,
) -> Result<BoundaryClassification, MeshError> {
    if attribute.len() != mesh.n_faces() {
        return Err(MeshError::LengthMismatch {
            what: "face attribute",
            expected: mesh.n_faces(),
            found: attribute.len(),
        });
    }

    let mut kinds = Vec::with_capacity(mesh.n_faces());
    let mut summary = BoundarySummary::default();
    for face in 0..mesh.n_faces() {
        let n_cells = halves.halves(face).count();
        let n_corner_faces = mesh.face_vertices.row_len(face);

        if let Some(remote) = overlap.remote_of(face) {
            if n_cells != 1 {
                return Err(MeshError::SharedFaceInterior {
                    face,
                    neighbor: remote.rank,
                });
            }
            let group = summary.shared.entry(remote.rank).or_default();
            group.faces.push(face);
            group.corner_faces += n_corner_faces;
            summary.corner_faces += n_corner_faces;
            kinds.push(FaceKind::Shared {
                neighbor: remote.rank,
                remote_face: remote.remote_face,
            });
            continue;
        }

        if n_cells != 1 {
            if attribute[face].is_some() {
                log::debug!("face {face} is interior; ignoring its boundary attribute");
            }
            kinds.push(FaceKind::Interior);
            continue;
        }

        // -1 is reserved for "no boundary" and counts as unset
        let bcid = attribute[face]
            .filter(|&id| id != NO_BOUNDARY)
            .ok_or_else(|| MeshError::AttributeMissing {
            face,
                cell: halves.halves(face).first.map_or(0, |hf| halves.cell_of(hf)),
            })?;
        if bcid == shared_bcid {
            log::warn!(
                "face {face} carries boundary id {bcid}, which is also the shared-face id"
            );
        }
        let group = summary.groups.entry(bcid).or_default();
        group.faces.push(face);
        group.corner_faces += n_corner_faces;
        summary.corner_faces += n_corner_faces;
        kinds.push(FaceKind::External { bcid });
    }

    let out = BoundaryClassification {
        kinds,
        shared_bcid,
        summary,
    };
    log::debug!(
        "classified {} boundary faces ({} shared, {} condition ids)",
        out.n_boundary_faces(),
        overlap.shared_face_count(),
        out.summary.groups.len()
    );
    Ok(out)
}
