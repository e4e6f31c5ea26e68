//! End-to-end conversion of one partition: raw polyhedral mesh in the
//! document → corner mesh and solver connectivity in the document.
//!
//! Stages run in dependency order and the document is only written once all
//! of them succeeded, so a failed run leaves it untouched.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::algs::attributes::expand_face_attribute;
use crate::algs::boundary::{DEFAULT_SHARED_BOUNDARY_ID, classify_boundary_faces};
use crate::algs::communicator::{CommTag, Communicator};
use crate::algs::connectivity::{ConnectivityInputs, build_connectivity};
use crate::algs::corners::CornerIndex;
use crate::algs::half_face::HalfFaceIndex;
use crate::algs::shared_faces::resolve_shared_faces;
use crate::data::connectivity::SolverMesh;
use crate::geometry::corner_coords::corner_coordinates;
use crate::io::blueprint::{read_poly_mesh, write_face_attribute, write_solver_mesh};
use crate::io::document::MeshDocument;
use crate::mesh_error::MeshError;
use crate::overlap::overlap::Overlap;
use crate::topology::mesh::PolyMesh;
use crate::topology::validation::{validate_corner_mesh, validate_poly_mesh};

/// Base tag of the shared-face exchange (sizes use it, payloads use +1).
pub const DEFAULT_EXCHANGE_TAG: u16 = 0xC0;

/// Knobs of a conversion run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Boundary id reported for faces shared with another partition.
    pub shared_boundary_id: i32,
    /// How long to wait for any one neighbor during the exchange.
    pub exchange_timeout: Duration,
    pub exchange_tag: u16,
    pub validate_input: bool,
    pub validate_output: bool,
    /// Also write the expanded face attribute into the document.
    pub write_face_attribute: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            shared_boundary_id: DEFAULT_SHARED_BOUNDARY_ID,
            exchange_timeout: Duration::from_secs(60),
            exchange_tag: DEFAULT_EXCHANGE_TAG,
            validate_input: true,
            validate_output: true,
            write_face_attribute: true,
        }
    }
}

/// Conversion driver for one rank.
#[derive(Clone, Debug, Default)]
pub struct MeshPipeline {
    config: ConversionConfig,
}

impl MeshPipeline {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Read the mesh from `doc`, convert it, and write the results back.
    ///
    /// Every rank of `comm` that shares faces with this one must call `run`
    /// concurrently; the shared-face exchange blocks until the neighbors
    /// answer or the configured timeout expires.
    pub fn run<D, C>(&self, doc: &mut D, comm: &C) -> Result<SolverMesh, MeshError>
    where
        D: MeshDocument + ?Sized,
        C: Communicator,
    {
        let mesh = read_poly_mesh(doc)?;
        let solver = self.convert(&mesh, comm)?;
        if self.config.write_face_attribute {
            write_face_attribute(doc, &solver.face_attribute);
        }
        write_solver_mesh(doc, &solver);
        log::info!(
            "rank {}: wrote corner mesh ({} zones, {} corners)",
            comm.rank(),
            solver.n_zones(),
            solver.n_corners()
        );
        Ok(solver)
    }

    /// Convert an already loaded mesh without touching any document.
    pub fn convert<C: Communicator>(
        &self,
        mesh: &PolyMesh,
        comm: &C,
    ) -> Result<SolverMesh, MeshError> {
        let rank = comm.rank();
        if self.config.validate_input {
            validate_poly_mesh(mesh, rank, comm.size())?;
        }

        let face_attribute = match &mesh.boundary {
            Some(boundary) => expand_face_attribute(&mesh.face_vertices, boundary)?,
            None => vec![None; mesh.n_faces()],
        };

        let halves = HalfFaceIndex::build(mesh)?;
        let corners = CornerIndex::build(mesh);

        let overlap = Overlap::from_groups(&mesh.adjacency, rank)?;
        let boundary = classify_boundary_faces(
            mesh,
            &halves,
            &face_attribute,
            &overlap,
            self.config.shared_boundary_id,
        )?;

        let shared = resolve_shared_faces(
            mesh,
            &halves,
            &corners,
            &boundary,
            &overlap,
            comm,
            CommTag::new(self.config.exchange_tag),
            self.config.exchange_timeout,
        )?;

        let zones = build_connectivity(&ConnectivityInputs {
            mesh,
            halves: &halves,
            corners: &corners,
            boundary: &boundary,
            shared: &shared,
        })?;
        let coords = corner_coordinates(&corners, &mesh.coords);

        let solver = SolverMesh {
            zones,
            corners,
            coords,
            boundary,
            face_attribute,
        };
        if self.config.validate_output {
            validate_corner_mesh(mesh, &solver)?;
        }
        log::debug!(
            "rank {rank}: {} boundary faces in {} group(s), {} shared with {} neighbor(s)",
            solver.boundary.n_boundary_faces(),
            solver.boundary.summary.groups.len(),
            shared.len(),
            overlap.neighbours().count()
        );
        Ok(solver)
    }
}
