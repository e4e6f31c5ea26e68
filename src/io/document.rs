//! Hierarchical mesh document: typed arrays addressed by `/`-separated paths.
//!
//! [`MeshDocument`] is the only view the pipeline has of the persisted mesh;
//! [`TreeDocument`] is the in-memory implementation (serde-serializable).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mesh_error::MeshError;

/// A typed leaf array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dtype", content = "data", rename_all = "snake_case")]
pub enum DocArray {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float64(Vec<f64>),
}

impl DocArray {
    pub fn type_name(&self) -> &'static str {
        match self {
            DocArray::Int32(_) => "int32",
            DocArray::Int64(_) => "int64",
            DocArray::Float64(_) => "float64",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            DocArray::Int32(v) => v.len(),
            DocArray::Int64(v) => v.len(),
            DocArray::Float64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read/write access to a structured mesh document.
pub trait MeshDocument {
    /// Leaf array at `path`, if any.
    fn get(&self, path: &str) -> Option<&DocArray>;
    /// Replace (or create) the leaf at `path`.
    fn set(&mut self, path: &str, value: DocArray);
    /// Names of the direct children of `prefix`, sorted.
    fn child_names(&self, prefix: &str) -> Vec<String>;

    fn has_path(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Integer array at `path`, widened to `i64`.
    fn fetch_ints(&self, path: &str) -> Result<Vec<i64>, MeshError> {
        match self.get(path) {
            Some(DocArray::Int32(v)) => Ok(v.iter().map(|&x| i64::from(x)).collect()),
            Some(DocArray::Int64(v)) => Ok(v.clone()),
            Some(other) => Err(MeshError::WrongArrayType {
                path: path.to_string(),
                expected: "integer",
                found: other.type_name(),
            }),
            None => Err(MeshError::MissingPath(path.to_string())),
        }
    }

    /// Non-negative integer array at `path` as indices.
    fn fetch_indices(&self, path: &str) -> Result<Vec<usize>, MeshError> {
        self.fetch_ints(path)?
            .into_iter()
            .enumerate()
            .map(|(position, value)| {
                usize::try_from(value).map_err(|_| MeshError::NegativeIndex {
                    path: path.to_string(),
                    position,
                    value,
                })
            })
            .collect()
    }

    /// `i32` array at `path` (values must fit).
    fn fetch_i32(&self, path: &str) -> Result<Vec<i32>, MeshError> {
        self.fetch_ints(path)?
            .into_iter()
            .map(|v| {
                i32::try_from(v).map_err(|_| MeshError::WrongArrayType {
                    path: path.to_string(),
                    expected: "int32-representable",
                    found: "int64",
                })
            })
            .collect()
    }

    /// Float array at `path`.
    fn fetch_f64(&self, path: &str) -> Result<Vec<f64>, MeshError> {
        match self.get(path) {
            Some(DocArray::Float64(v)) => Ok(v.clone()),
            Some(other) => Err(MeshError::WrongArrayType {
                path: path.to_string(),
                expected: "float64",
                found: other.type_name(),
            }),
            None => Err(MeshError::MissingPath(path.to_string())),
        }
    }
}

/// In-memory document: a flat ordered map from path to leaf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeDocument {
    nodes: BTreeMap<String, DocArray>,
}

impl TreeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.keys().map(String::as_str)
    }

    pub fn set_i32(&mut self, path: &str, v: Vec<i32>) {
        self.set(path, DocArray::Int32(v));
    }

    pub fn set_i64(&mut self, path: &str, v: Vec<i64>) {
        self.set(path, DocArray::Int64(v));
    }

    pub fn set_f64(&mut self, path: &str, v: Vec<f64>) {
        self.set(path, DocArray::Float64(v));
    }
}

fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

impl MeshDocument for TreeDocument {
    fn get(&self, path: &str) -> Option<&DocArray> {
        self.nodes.get(normalize(path))
    }

    fn set(&mut self, path: &str, value: DocArray) {
        self.nodes.insert(normalize(path).to_string(), value);
    }

    fn child_names(&self, prefix: &str) -> Vec<String> {
        let prefix = format!("{}/", normalize(prefix));
        let mut names: Vec<String> = self
            .nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, _)| k[prefix.len()..].split('/').next().map(str::to_string))
            .collect();
        names.dedup();
        names
    }
}
