//! Single-hop Katz-style influence score.
//!
//! # Overview
//!
//! A cheap surrogate for Katz centrality that looks one hop out. Every
//! direct dependency of the scored tag contributes `x²` where
//!
//! ```text
//! x = ATTENUATION · 1 · NEIGHBOR_CENTRALITY + 1 = 1.185
//! ```
//!
//! and every other node of the graph (the scored tag included) contributes
//! `1² = 1`. The score is therefore
//!
//! ```text
//! succ · 1.185² + (node_count − succ)
//! ```
//!
//! It is not a true centrality measure. The exact arithmetic is kept so
//! that monthly series stay comparable with previously exported data.

use tracing::instrument;

use crate::graph::GraphStore;

/// Katz attenuation factor.
pub const ATTENUATION: f64 = 0.5;

/// Centrality assumed for every neighbor.
pub const NEIGHBOR_CENTRALITY: f64 = 0.37;

/// Per-dependency term before squaring.
#[must_use]
pub fn neighbor_weight() -> f64 {
    ATTENUATION * 1.0 * NEIGHBOR_CENTRALITY + 1.0
}

/// Influence of `tag` over the whole graph.
///
/// A tag that is not in the graph has no successors and scores
/// `node_count`.
#[must_use]
#[instrument(skip(store))]
#[allow(clippy::cast_precision_loss)]
pub fn influence_score(store: &GraphStore, tag: &str) -> f64 {
    let successors = store.out_degree(tag);
    let others = store.node_count().saturating_sub(successors);
    let x = neighbor_weight();
    (successors as f64).mul_add(x * x, others as f64)
}
