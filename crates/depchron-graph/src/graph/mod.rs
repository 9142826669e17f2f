//! Dependency graph construction and traversal.
//!
//! # Overview
//!
//! ```text
//! links file
//!        ↓  ingest::load_links()
//! Vec<LinkRecord>
//!        ↓  store::GraphStore::from_links()
//! GraphStore (forward + transposed DiGraph, content hash)
//!        ↓  reach::transitive_dependencies() / transitive_dependents()
//! BTreeSet<ArtifactTag>
//! ```
//!
//! The store is built once and never mutated, so it can be shared across
//! threads by reference.

pub mod reach;
pub mod store;

pub use reach::{transitive_dependencies, transitive_dependents};
pub use store::GraphStore;
