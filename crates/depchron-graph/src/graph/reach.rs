//! Transitive closure over the dependency graph.
//!
//! Both directions use the same iterative depth-first walk; dependents walk
//! the transposed graph. The start node is marked visited before the walk
//! begins, so it never appears in its own closure even when a cycle leads
//! back to it.

use std::collections::BTreeSet;

use depchron_core::ArtifactTag;
use fixedbitset::FixedBitSet;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::instrument;

use super::GraphStore;

/// Everything `tag` depends on, directly or indirectly.
#[must_use]
#[instrument(skip(store))]
pub fn transitive_dependencies(store: &GraphStore, tag: &str) -> BTreeSet<ArtifactTag> {
    store
        .node_index(tag)
        .map_or_else(BTreeSet::new, |start| closure(store.forward(), start))
}

/// Everything that depends on `tag`, directly or indirectly.
#[must_use]
#[instrument(skip(store))]
pub fn transitive_dependents(store: &GraphStore, tag: &str) -> BTreeSet<ArtifactTag> {
    store
        .node_index(tag)
        .map_or_else(BTreeSet::new, |start| closure(store.transposed(), start))
}

fn closure(graph: &DiGraph<ArtifactTag, ()>, start: NodeIndex) -> BTreeSet<ArtifactTag> {
    let mut visited = FixedBitSet::with_capacity(graph.node_count());
    visited.insert(start.index());

    let mut stack = vec![start];
    let mut reached = BTreeSet::new();

    while let Some(node) = stack.pop() {
        for next in graph.neighbors(node) {
            if !visited.put(next.index()) {
                reached.insert(graph[next].clone());
                stack.push(next);
            }
        }
    }

    reached
}
