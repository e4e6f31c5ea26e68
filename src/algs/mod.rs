//! Conversion stages, leaves first, plus the message-passing layer the
//! shared-face exchange runs on.

pub mod attributes;
pub mod boundary;
pub mod communicator;
pub mod connectivity;
pub mod corners;
pub mod exchange;
pub mod half_face;
pub mod pipeline;
pub mod shared_faces;
pub mod wire;

pub use pipeline::{ConversionConfig, MeshPipeline};
