//! Compressed-sparse-row adjacency used for every raw incidence list.
//
// `offsets[i] .. offsets[i+1]` indexes row `i` of `indices`; `offsets` always
// has one more entry than there are rows and starts at zero.

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshError;

/// CSR pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Csr {
    offsets: Vec<usize>,
    indices: Vec<usize>,
}

impl Default for Csr {
    fn default() -> Self {
        Self {
            offsets: vec![0],
            indices: Vec::new(),
        }
    }
}

impl Csr {
    /// Build from per-row sizes and the concatenated indices.
    pub fn from_sizes(
        what: &'static str,
        sizes: &[usize],
        indices: Vec<usize>,
    ) -> Result<Self, MeshError> {
        let mut offsets = Vec::with_capacity(sizes.len() + 1);
        offsets.push(0);
        let mut acc = 0usize;
        for &s in sizes {
            acc += s;
            offsets.push(acc);
        }
        if acc != indices.len() {
            return Err(MeshError::LengthMismatch {
                what,
                expected: acc,
                found: indices.len(),
            });
        }
        Ok(Self { offsets, indices })
    }

    /// Build from explicit rows.
    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[usize]>,
    {
        let mut offsets = vec![0];
        let mut indices = Vec::new();
        for row in rows {
            indices.extend_from_slice(row.as_ref());
            offsets.push(indices.len());
        }
        Self { offsets, indices }
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[usize] {
        &self.indices[self.offsets[i]..self.offsets[i + 1]]
    }

    /// Start of row `i` in the concatenated index array.
    #[inline]
    pub fn row_start(&self, i: usize) -> usize {
        self.offsets[i]
    }

    #[inline]
    pub fn row_len(&self, i: usize) -> usize {
        self.offsets[i + 1] - self.offsets[i]
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Per-row sizes.
    pub fn sizes(&self) -> Vec<usize> {
        self.offsets.windows(2).map(|w| w[1] - w[0]).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[usize]> + '_ {
        (0..self.len()).map(move |i| self.row(i))
    }
}
