mod util;
use util::*;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use corner_mesh::algs::communicator::NoComm;
use corner_mesh::algs::pipeline::MeshPipeline;
use corner_mesh::data::connectivity::SolverMesh;
use corner_mesh::topology::mesh::PolyMesh;

fn grid() -> impl Strategy<Value = HexGrid> {
    ([1usize..=3, 1usize..=3, 1usize..=3], 0usize..4, any::<bool>()).prop_map(
        |(dims, face_rotation, reverse_faces)| HexGrid {
            face_rotation,
            reverse_faces,
            ..HexGrid::new(dims)
        },
    )
}

fn convert(mesh: &PolyMesh) -> SolverMesh {
    MeshPipeline::default().convert(mesh, &NoComm).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn corner_offsets_are_the_exclusive_prefix_sum(g in grid()) {
        let solver = convert(&g.mesh());
        let offsets = solver.corners.offsets();
        prop_assert_eq!(offsets.len(), g.n_cells() + 1);
        prop_assert_eq!(offsets[0], 0);
        let mut acc = 0;
        for (z, zone) in solver.zones.iter().enumerate() {
            prop_assert_eq!(zone.corner_offset, acc);
            prop_assert_eq!(offsets[z], acc);
            acc += zone.n_corners;
            prop_assert!(offsets[z + 1] > offsets[z]);
        }
        prop_assert_eq!(acc, solver.n_corners());
    }

    #[test]
    fn corners_biject_with_cell_vertices(g in grid()) {
        let mesh = g.mesh();
        let solver = convert(&mesh);
        for cell in 0..mesh.n_cells() {
            let mut from_faces: Vec<usize> = mesh
                .cell_faces
                .row(cell)
                .iter()
                .flat_map(|&f| mesh.face_vertices.row(f).iter().copied())
                .collect();
            from_faces.sort_unstable();
            from_faces.dedup();
            let mut corners = solver.corners.vertices(cell).to_vec();
            corners.sort_unstable();
            prop_assert_eq!(&corners, &from_faces);
            prop_assert_eq!(corners.len(), 8);
        }
    }

    #[test]
    fn internal_neighbors_and_corners_are_mutual(g in grid()) {
        let solver = convert(&g.mesh());
        for zone in &solver.zones {
            for (lf, opp) in zone.zones_opp.iter().enumerate() {
                let Some(o) = *opp else { continue };
                let other = &solver.zones[o];
                let back = other
                    .zones_opp
                    .iter()
                    .position(|&x| x == Some(zone.zone))
                    .expect("neighbor points back");
                prop_assert_eq!(zone.ncorners_on_face[lf], other.ncorners_on_face[back]);
                for i in zone.face_corners(lf) {
                    let mine = zone.corner_offset + zone.corners_local[i];
                    let theirs = zone.corners_opp[i].unwrap();
                    let j = other
                        .face_corners(back)
                        .find(|&j| other.corner_offset + other.corners_local[j] == theirs);
                    prop_assert!(j.is_some());
                    prop_assert_eq!(other.corners_opp[j.unwrap()], Some(mine));
                }
            }
        }
    }

    #[test]
    fn boundary_ids_follow_the_attribute(g in grid()) {
        let mesh = g.mesh();
        let solver = convert(&mesh);
        for zone in &solver.zones {
            for (lf, &face) in mesh.cell_faces.row(zone.zone).iter().enumerate() {
                match zone.zones_opp[lf] {
                    Some(_) => {
                        prop_assert_eq!(zone.face_bcids[lf], -1);
                    }
                    None => {
                        prop_assert_eq!(Some(zone.face_bcids[lf]), solver.face_attribute[face]);
                    }
                }
            }
        }
    }

    #[test]
    fn reruns_are_identical(g in grid()) {
        let mesh = g.mesh();
        prop_assert_eq!(convert(&mesh).flatten(), convert(&mesh).flatten());
    }

    #[test]
    fn walks_start_at_the_smallest_global_id(g in grid(), seed in any::<u64>()) {
        let mut mesh = g.mesh();
        let mut rng = SmallRng::seed_from_u64(seed);
        mesh.global_vertex_ids.shuffle(&mut rng);
        let solver = convert(&mesh);
        let reference = convert(&g.mesh());
        for zone in 0..solver.n_zones() {
            prop_assert_eq!(&solver.zones[zone].zones_opp, &reference.zones[zone].zones_opp);
            for lf in 0..6 {
                let walk = face_walk(&mesh, &solver, zone, lf);
                prop_assert_eq!(Some(&walk[0]), walk.iter().min());
            }
        }
    }
}
