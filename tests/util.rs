#![allow(dead_code)]
use std::collections::BTreeMap;

use corner_mesh::{
    algs::communicator::LocalComm,
    data::connectivity::SolverMesh,
    io::blueprint::write_poly_mesh,
    io::document::TreeDocument,
    topology::csr::Csr,
    topology::mesh::{AdjacencyGroup, BoundaryTopology, PolyMesh},
};

/// Local corner offsets of a unit hex, as (dx, dy, dz).
const HEX_FACES: [[[usize; 3]; 4]; 6] = [
    [[0, 0, 0], [0, 1, 0], [0, 1, 1], [0, 0, 1]], // -x
    [[1, 0, 0], [1, 1, 0], [1, 1, 1], [1, 0, 1]], // +x
    [[0, 0, 0], [1, 0, 0], [1, 0, 1], [0, 0, 1]], // -y
    [[0, 1, 0], [1, 1, 0], [1, 1, 1], [0, 1, 1]], // +y
    [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]], // -z
    [[0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1]], // +z
];

/// How exterior faces are tagged.
#[derive(Clone, Copy, Debug)]
pub enum BcTagging {
    /// Every exterior face gets the same id.
    Uniform(i32),
    /// -x, +x, -y, +y, -z, +z get 1..=6.
    PerSide,
}

/// Structured grid of unit hexahedra written out as a polyhedral mesh.
#[derive(Clone, Debug)]
pub struct HexGrid {
    pub dims: [usize; 3],
    pub bc: BcTagging,
    /// Rotate each face's vertex list by this many places (mod 4).
    pub face_rotation: usize,
    /// Reverse every face's vertex list.
    pub reverse_faces: bool,
}

impl HexGrid {
    pub fn new(dims: [usize; 3]) -> Self {
        Self {
            dims,
            bc: BcTagging::PerSide,
            face_rotation: 0,
            reverse_faces: false,
        }
    }

    pub fn uniform_bc(mut self, id: i32) -> Self {
        self.bc = BcTagging::Uniform(id);
        self
    }

    pub fn n_cells(&self) -> usize {
        self.dims.iter().product()
    }

    fn vertex_gid(&self, [i, j, k]: [usize; 3]) -> u64 {
        let [nx, ny, _] = self.dims;
        (i + (nx + 1) * (j + (ny + 1) * k)) as u64
    }

    fn cells(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let [nx, ny, nz] = self.dims;
        (0..nz).flat_map(move |k| (0..ny).flat_map(move |j| (0..nx).map(move |i| [i, j, k])))
    }

    fn on_exterior(&self, [i, j, k]: [usize; 3], side: usize) -> bool {
        let [nx, ny, nz] = self.dims;
        match side {
            0 => i == 0,
            1 => i + 1 == nx,
            2 => j == 0,
            3 => j + 1 == ny,
            4 => k == 0,
            _ => k + 1 == nz,
        }
    }

    fn side_bc(&self, side: usize) -> i32 {
        match self.bc {
            BcTagging::Uniform(id) => id,
            BcTagging::PerSide => side as i32 + 1,
        }
    }

    /// The whole grid on one rank.
    pub fn mesh(&self) -> PolyMesh {
        self.partition(|_| 0, 1).remove(0)
    }

    /// Split the grid by `owner(cell) -> rank` into `n_ranks` meshes whose
    /// adjacency groups pair up the cut faces.
    pub fn partition(&self, owner: impl Fn([usize; 3]) -> usize, n_ranks: usize) -> Vec<PolyMesh> {
        let mut meshes = Vec::with_capacity(n_ranks);
        // sorted global face key -> local face, per rank
        let mut keys: Vec<BTreeMap<Vec<u64>, usize>> = Vec::with_capacity(n_ranks);
        let mut cut: Vec<Vec<Vec<u64>>> = Vec::with_capacity(n_ranks);

        for rank in 0..n_ranks {
            let mut vertex_of: BTreeMap<u64, usize> = BTreeMap::new();
            let mut coords = Vec::new();
            let mut gids = Vec::new();
            let mut face_of: BTreeMap<Vec<u64>, usize> = BTreeMap::new();
            let mut face_rows: Vec<Vec<usize>> = Vec::new();
            let mut cell_rows: Vec<Vec<usize>> = Vec::new();
            let mut boundary_rows: Vec<Vec<usize>> = Vec::new();
            let mut boundary_attr = Vec::new();
            let mut rank_cut = Vec::new();

            for cell in self.cells().filter(|&c| owner(c) == rank) {
                let mut row = Vec::with_capacity(6);
                for (side, corners) in HEX_FACES.iter().enumerate() {
                    let mut verts = Vec::with_capacity(4);
                    let mut key = Vec::with_capacity(4);
                    for d in corners {
                        let p = [cell[0] + d[0], cell[1] + d[1], cell[2] + d[2]];
                        let gid = self.vertex_gid(p);
                        let v = *vertex_of.entry(gid).or_insert_with(|| {
                            coords.push([p[0] as f64, p[1] as f64, p[2] as f64]);
                            gids.push(gid);
                            coords.len() - 1
                        });
                        verts.push(v);
                        key.push(gid);
                    }
                    key.sort_unstable();
                    let next = face_rows.len();
                    let face = *face_of.entry(key.clone()).or_insert(next);
                    if face == next {
                        verts.rotate_left(self.face_rotation % 4);
                        if self.reverse_faces {
                            verts.reverse();
                        }
                        if self.on_exterior(cell, side) {
                            boundary_rows.push(verts.clone());
                            boundary_attr.push(self.side_bc(side));
                        } else if !self.neighbor_owned_by(cell, side, &owner, rank) {
                            rank_cut.push(key);
                        }
                        face_rows.push(verts);
                    }
                    row.push(face);
                }
                cell_rows.push(row);
            }

            meshes.push(PolyMesh {
                coords,
                cell_faces: Csr::from_rows(&cell_rows),
                face_vertices: Csr::from_rows(&face_rows),
                global_vertex_ids: gids,
                boundary: Some(BoundaryTopology {
                    faces: Csr::from_rows(&boundary_rows),
                    attribute: boundary_attr,
                }),
                adjacency: Vec::new(),
            });
            keys.push(face_of);
            cut.push(rank_cut);
        }

        for a in 0..n_ranks {
            for b in a + 1..n_ranks {
                let mut faces: Vec<[usize; 2]> = cut[a]
                    .iter()
                    .filter_map(|key| Some([keys[a][key], *keys[b].get(key)?]))
                    .collect();
                if faces.is_empty() {
                    continue;
                }
                faces.sort_unstable();
                let group = AdjacencyGroup {
                    name: format!("group_{a}_{b}"),
                    partitions: [a, b],
                    faces,
                };
                meshes[a].adjacency.push(group.clone());
                meshes[b].adjacency.push(group);
            }
        }
        meshes
    }

    fn neighbor_owned_by(
        &self,
        [i, j, k]: [usize; 3],
        side: usize,
        owner: &impl Fn([usize; 3]) -> usize,
        rank: usize,
    ) -> bool {
        let n = match side {
            0 => [i - 1, j, k],
            1 => [i + 1, j, k],
            2 => [i, j - 1, k],
            3 => [i, j + 1, k],
            4 => [i, j, k - 1],
            _ => [i, j, k + 1],
        };
        owner(n) == rank
    }
}

/// Mesh written into a fresh document.
pub fn document(mesh: &PolyMesh) -> TreeDocument {
    let mut doc = TreeDocument::new();
    write_poly_mesh(&mut doc, mesh);
    doc
}

/// Run `f(rank, comm)` on one thread per rank and collect the results in
/// rank order.
pub fn on_threads<T, F>(n_ranks: usize, f: F) -> Vec<T>
where
    T: Send + 'static,
    F: Fn(usize, LocalComm) -> T + Send + Clone + 'static,
{
    let handles: Vec<_> = LocalComm::group(n_ranks)
        .into_iter()
        .enumerate()
        .map(|(rank, comm)| {
            let f = f.clone();
            std::thread::spawn(move || f(rank, comm))
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("rank thread panicked"))
        .collect()
}

/// Global vertex ids of face `lf` of `zone`, walked in output order.
pub fn face_walk(mesh: &PolyMesh, solver: &SolverMesh, zone: usize, lf: usize) -> Vec<u64> {
    let rec = &solver.zones[zone];
    rec.face_corners(lf)
        .map(|i| mesh.global_vertex(solver.corners.vertices(zone)[rec.corners_local[i]]))
        .collect()
}
