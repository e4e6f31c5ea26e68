//! Cross-partition resolution of shared faces.
//!
//! For every face on a partition boundary, the owning partition learns the
//! neighbor's corners on that face so corner-faces can later be paired by
//! global vertex id. Per neighbor rank, one message carries, for each shared
//! face: the sender's face id, its half-face id, and the sender's canonical
//! corner loop as `(global vertex, sender corner id)` pairs.
//!
//! Matching never relies on list positions: the receiver finds its own face
//! through the adjacency pair table, checks that both sides agree on the
//! face's vertex set, and later looks corners up by global vertex id.

use std::collections::BTreeMap;
use std::mem::size_of;
use std::time::Duration;

use itertools::Itertools;

use crate::algs::boundary::BoundaryClassification;
use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::connectivity::oriented_face_vertices;
use crate::algs::corners::CornerIndex;
use crate::algs::exchange::exchange_payloads;
use crate::algs::half_face::HalfFaceIndex;
use crate::algs::wire::{
    KIND_SHARED_FACES, WireCornerFace, WireCount, WireFaceHdr, WireReader, WireWriter,
};
use crate::mesh_error::MeshError;
use crate::overlap::overlap::Overlap;
use crate::topology::mesh::PolyMesh;

/// The neighbor's description of one shared face.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFace {
    pub rank: usize,
    /// Face id on the neighbor.
    pub remote_face: usize,
    /// Half-face id on the neighbor.
    pub remote_half_face: usize,
    /// `(global vertex, neighbor corner)` in the neighbor's winding.
    pub corners: Vec<(u64, usize)>,
}

impl RemoteFace {
    /// Neighbor corner sitting on global vertex `gid`.
    pub fn corner_at(&self, gid: u64) -> Option<usize> {
        self.corners
            .iter()
            .find(|&&(g, _)| g == gid)
            .map(|&(_, c)| c)
    }
}

/// Local shared face → neighbor's description.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SharedFaceMap {
    faces: BTreeMap<usize, RemoteFace>,
}

impl SharedFaceMap {
    pub fn get(&self, face: usize) -> Option<&RemoteFace> {
        self.faces.get(&face)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RemoteFace)> + '_ {
        self.faces.iter().map(|(&f, r)| (f, r))
    }
}

/// Messages to send, one per neighbor rank.
pub fn encode_shared_faces(
    mesh: &PolyMesh,
    halves: &HalfFaceIndex,
    corners: &CornerIndex,
    overlap: &Overlap,
) -> Result<BTreeMap<usize, Vec<u8>>, MeshError> {
    let mut outgoing = BTreeMap::new();
    for nbr in overlap.neighbours() {
        let links: Vec<(usize, usize)> = overlap.links_to(nbr).collect();
        let too_many = |what: &str, n: usize| MeshError::CommError {
            neighbor: nbr,
            reason: format!("{n} {what} do not fit one message"),
        };
        let mut w = WireWriter::new(KIND_SHARED_FACES);
        let count = WireCount::new(links.len()).map_err(|_| too_many("shared faces", links.len()))?;
        w.push(&count);
        for (face, _) in links {
            let hf = halves
                .halves(face)
                .first
                .ok_or(MeshError::SharedFaceInterior {
                    face,
                    neighbor: nbr,
                })?;
            let cell = halves.cell_of(hf);
            let verts = oriented_face_vertices(mesh, cell, halves.local_face(hf))?;
            let n_corners =
                u32::try_from(verts.len()).map_err(|_| too_many("face corners", verts.len()))?;
            w.push(&WireFaceHdr::new(face as u64, hf as u64, n_corners));
            for v in verts {
                let corner = corners.global_corner(cell, v)?;
                w.push(&WireCornerFace::new(mesh.global_vertex(v), corner as u64));
            }
        }
        outgoing.insert(nbr, w.finish());
    }
    Ok(outgoing)
}

/// Decode one neighbor's message and file its faces under the local face ids.
pub fn decode_shared_faces(
    mesh: &PolyMesh,
    overlap: &Overlap,
    nbr: usize,
    bytes: &[u8],
    into: &mut SharedFaceMap,
) -> Result<(), MeshError> {
    let mut r = WireReader::new(bytes, KIND_SHARED_FACES, nbr)?;
    let count: WireCount = r.read()?;
    for _ in 0..count.get() {
        let hdr: WireFaceHdr = r.read()?;
        let mut loop_corners =
            Vec::with_capacity(hdr.n_corners().min(bytes.len() / size_of::<WireCornerFace>()));
        for _ in 0..hdr.n_corners() {
            let cf: WireCornerFace = r.read()?;
            loop_corners.push((cf.vertex(), cf.corner() as usize));
        }

        let remote_face = hdr.face() as usize;
        let Some(face) = overlap.local_of(nbr, remote_face) else {
            return Err(MeshError::ShareMismatch {
                neighbor: nbr,
                face: remote_face,
                reason: format!("rank {nbr} sent its face {remote_face}, which is not shared here"),
            });
        };
        let remote_key: Vec<u64> = loop_corners
            .iter()
            .map(|&(g, _)| g)
            .sorted_unstable()
            .collect();
        if remote_key != mesh.face_key(face) {
            return Err(MeshError::ShareMismatch {
                neighbor: nbr,
                face,
                reason: format!(
                    "vertex sets differ: local {:?}, remote {remote_key:?}",
                    mesh.face_key(face)
                ),
            });
        }
        let remote = RemoteFace {
            rank: nbr,
            remote_face,
            remote_half_face: hdr.half_face() as usize,
            corners: loop_corners,
        };
        if into.faces.insert(face, remote).is_some() {
            return Err(MeshError::ShareMismatch {
                neighbor: nbr,
                face,
                reason: "face described twice".into(),
            });
        }
    }
    if !r.is_done() {
        return Err(r.malformed("trailing bytes after last face".into()));
    }
    Ok(())
}

/// Exchange shared-face descriptions with every neighbor and match them.
///
/// Blocks until every neighbor answered or `timeout` elapsed for one of them.
///
/// # Errors
/// * [`MeshError::ExchangeTimeout`] / [`MeshError::MalformedMessage`] when
///   the exchange itself fails;
/// * [`MeshError::ShareMismatch`] when the two sides disagree about which
///   faces are shared or what they look like.
pub fn resolve_shared_faces<C: Communicator>(
    mesh: &PolyMesh,
    halves: &HalfFaceIndex,
    corners: &CornerIndex,
    classification: &BoundaryClassification,
    overlap: &Overlap,
    comm: &C,
    tag: CommTag,
    timeout: Duration,
) -> Result<SharedFaceMap, MeshError> {
    let mut map = SharedFaceMap::default();
    if overlap.is_empty() {
        return Ok(map);
    }
    for nbr in overlap.neighbours() {
        if nbr >= comm.size() || nbr == comm.rank() {
            return Err(MeshError::CommError {
                neighbor: nbr,
                reason: format!(
                    "not a valid peer for rank {} in a group of {}",
                    comm.rank(),
                    comm.size()
                ),
            });
        }
    }

    let outgoing = encode_shared_faces(mesh, halves, corners, overlap)?;
    let received = exchange_payloads(&outgoing, comm, tag, timeout)?;
    for (&nbr, bytes) in &received {
        decode_shared_faces(mesh, overlap, nbr, bytes, &mut map)?;
    }

    for (face, _) in classification.boundary_faces() {
        if !classification.is_shared(face) || map.get(face).is_some() {
            continue;
        }
        let neighbor = overlap.remote_of(face).map_or(usize::MAX, |r| r.rank);
        return Err(MeshError::ShareMismatch {
            neighbor,
            face,
            reason: format!("rank {neighbor} sent no description of this face"),
        });
    }
    log::debug!(
        "rank {}: resolved {} shared faces with {} neighbor(s)",
        comm.rank(),
        map.len(),
        received.len()
    );
    Ok(map)
}
