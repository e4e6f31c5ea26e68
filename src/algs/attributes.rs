//! Expand an attribute given on the boundary topology onto every mesh face.
//!
//! Faces are matched by vertex set, not by listing order: both topologies
//! are keyed by their sorted vertex ids and joined through a `BTreeMap`.

use std::collections::BTreeMap;

use itertools::Itertools;

use crate::mesh_error::MeshError;
use crate::topology::csr::Csr;
use crate::topology::mesh::BoundaryTopology;

fn vertex_key(row: &[usize]) -> Vec<usize> {
    row.iter().copied().sorted_unstable().collect()
}

/// Attribute value per face of `face_vertices`; `None` where the boundary
/// topology has no entry.
///
/// # Errors
/// * [`MeshError::LengthMismatch`] if the attribute does not have one value
///   per boundary face.
/// * [`MeshError::UnmatchedBoundaryFace`] if a boundary face matches zero or
///   several mesh faces.
/// * [`MeshError::ConflictingBoundaryAttribute`] if two boundary faces land
///   on the same mesh face with different values.
pub fn expand_face_attribute(
    face_vertices: &Csr,
    boundary: &BoundaryTopology,
) -> Result<Vec<Option<i32>>, MeshError> {
    if boundary.attribute.len() != boundary.faces.len() {
        return Err(MeshError::LengthMismatch {
            what: "boundary attribute",
            expected: boundary.faces.len(),
            found: boundary.attribute.len(),
        });
    }

    let mut by_key: BTreeMap<Vec<usize>, Vec<usize>> = BTreeMap::new();
    for (face, row) in face_vertices.rows().enumerate() {
        by_key.entry(vertex_key(row)).or_default().push(face);
    }

    let mut out = vec![None; face_vertices.len()];
    for (bface, (row, &value)) in boundary
        .faces
        .rows()
        .zip(&boundary.attribute)
        .enumerate()
    {
        let matches = by_key.get(&vertex_key(row)).map_or(&[][..], Vec::as_slice);
        let &[face] = matches else {
            return Err(MeshError::UnmatchedBoundaryFace {
                boundary_face: bface,
                matches: matches.len(),
            });
        };
        match out[face] {
            Some(prev) if prev != value => {
                return Err(MeshError::ConflictingBoundaryAttribute {
                    face,
                    first: prev,
                    second: value,
                });
            }
            _ => out[face] = Some(value),
        }
    }

    log::debug!(
        "expanded {} boundary attribute entries onto {} faces",
        boundary.attribute.len(),
        face_vertices.len()
    );
    Ok(out)
}
