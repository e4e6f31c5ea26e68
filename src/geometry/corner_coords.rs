//! Corner-ordered coordinate arrays.
//!
//! Entry `i` of each array is the position of the vertex that global corner
//! `i` derives from. This is a pure function of the corner numbering and the
//! vertex positions.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::algs::corners::CornerIndex;

/// Structure-of-arrays corner positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CornerCoords {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
}

impl CornerCoords {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn get(&self, corner: usize) -> [f64; 3] {
        [self.x[corner], self.y[corner], self.z[corner]]
    }
}

/// One position per global corner id.
pub fn corner_coordinates(corners: &CornerIndex, coords: &[[f64; 3]]) -> CornerCoords {
    let vertices = corners.cell_vertices.indices();
    let component = |k: usize| -> Vec<f64> {
        #[cfg(feature = "rayon")]
        {
            vertices.par_iter().map(|&v| coords[v][k]).collect()
        }
        #[cfg(not(feature = "rayon"))]
        {
            vertices.iter().map(|&v| coords[v][k]).collect()
        }
    };
    CornerCoords {
        x: component(0),
        y: component(1),
        z: component(2),
    }
}
