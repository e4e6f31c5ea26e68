//! Path-addressed mesh documents and the layout the converter reads from and
//! writes to.

pub mod blueprint;
pub mod document;

pub use document::{DocArray, MeshDocument, TreeDocument};
