#![forbid(unsafe_code)]
//! depchron-core library.
//!
//! Everything the temporal graph engine needs before a graph exists: the
//! artifact coordinate model, the per-artifact release catalogue with its
//! grace-window resolution rule, repository bindings, CSV ingestion of the
//! three snapshot inputs, and configuration.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums for anything a caller branches on,
//!   `anyhow::Result` at file-system boundaries.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod bindings;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod release_index;

pub use bindings::RepoBindings;
pub use error::{ErrorCode, ResolveError};
pub use model::{ArtifactId, ArtifactTag, Release};
pub use release_index::ReleaseIndex;
