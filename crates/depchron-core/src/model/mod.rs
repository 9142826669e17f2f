//! Artifact coordinates and releases.

mod artifact;
mod release;

pub use artifact::{ArtifactId, ArtifactTag, CoordinateError, split_coordinate};
pub use release::Release;
