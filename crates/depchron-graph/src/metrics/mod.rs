//! Scalar metrics over the dependency graph.
//!
//! Only [`influence`] lives here today; reachability counts come straight
//! from [`crate::graph::reach`].

pub mod influence;

pub use influence::{ATTENUATION, NEIGHBOR_CENTRALITY, influence_score};
