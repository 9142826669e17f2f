//! Immutable dependency graph built from the link snapshot.
//!
//! # Overview
//!
//! Nodes are [`ArtifactTag`]s. An edge `A → B` means "A depends on B", so
//! outgoing neighbors are direct dependencies and incoming neighbors are
//! direct dependents.
//!
//! ## Transpose
//!
//! The reversed graph is materialized once, right after construction, so
//! that dependents and transitive dependents are answered with the same
//! outgoing-neighbor walk as dependencies. Both graphs share node indices.
//!
//! ## Content Hash
//!
//! [`GraphStore::content_hash`] is a BLAKE3 hash of the sorted, deduplicated
//! edge set. Two stores built from the same links (in any order, with any
//! number of duplicates) have the same hash.

#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeSet, HashMap};

use depchron_core::ArtifactTag;
use depchron_core::ingest::LinkRecord;
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{info, instrument, warn};

// ---------------------------------------------------------------------------
// GraphStore
// ---------------------------------------------------------------------------

/// Directed "depends on" graph plus its transpose.
#[derive(Debug, Clone)]
pub struct GraphStore {
    forward: DiGraph<ArtifactTag, ()>,
    transposed: DiGraph<ArtifactTag, ()>,
    node_map: HashMap<ArtifactTag, NodeIndex>,
    content_hash: String,
    rejected_self_loops: usize,
}

impl GraphStore {
    /// Build a store from `(from, to)` pairs.
    ///
    /// Self-loops are logged and skipped; their endpoints are not added as
    /// nodes unless another edge mentions them. Duplicate edges collapse into
    /// one.
    #[instrument(skip(edges))]
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (ArtifactTag, ArtifactTag)>,
    {
        let mut forward = DiGraph::<ArtifactTag, ()>::new();
        let mut node_map: HashMap<ArtifactTag, NodeIndex> = HashMap::new();
        let mut rejected_self_loops = 0;

        for (from, to) in edges {
            if from == to {
                warn!(tag = %from, "skipping self-loop dependency");
                rejected_self_loops += 1;
                continue;
            }

            let from_idx = intern(&mut forward, &mut node_map, from);
            let to_idx = intern(&mut forward, &mut node_map, to);

            // Avoid duplicate edges (petgraph allows them by default).
            if !forward.contains_edge(from_idx, to_idx) {
                forward.add_edge(from_idx, to_idx, ());
            }
        }

        let content_hash = compute_edge_hash(&forward);
        let mut transposed = forward.clone();
        transposed.reverse();

        info!(
            nodes = forward.node_count(),
            edges = forward.edge_count(),
            self_loops = rejected_self_loops,
            %content_hash,
            "dependency graph built"
        );

        Self {
            forward,
            transposed,
            node_map,
            content_hash,
            rejected_self_loops,
        }
    }

    /// Build a store from ingested link rows.
    pub fn from_links(links: impl IntoIterator<Item = LinkRecord>) -> Self {
        Self::from_edges(links.into_iter().map(|link| (link.from, link.to)))
    }

    /// Direct dependencies of `tag`. Empty if `tag` is not a node.
    #[must_use]
    pub fn successors(&self, tag: &str) -> BTreeSet<ArtifactTag> {
        self.neighbors(&self.forward, tag)
    }

    /// Direct dependents of `tag`. Empty if `tag` is not a node.
    #[must_use]
    pub fn predecessors(&self, tag: &str) -> BTreeSet<ArtifactTag> {
        self.neighbors(&self.transposed, tag)
    }

    /// Number of direct dependencies of `tag`, without allocating.
    #[must_use]
    pub fn out_degree(&self, tag: &str) -> usize {
        self.node_index(tag).map_or(0, |idx| {
            self.forward
                .neighbors_directed(idx, Direction::Outgoing)
                .count()
        })
    }

    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.node_map.contains_key(tag)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.forward.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.forward.edge_count()
    }

    /// `blake3:<hex>` fingerprint of the edge set.
    #[must_use]
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// How many self-loop rows were dropped during construction.
    #[must_use]
    pub const fn rejected_self_loops(&self) -> usize {
        self.rejected_self_loops
    }

    #[must_use]
    pub fn node_index(&self, tag: &str) -> Option<NodeIndex> {
        self.node_map.get(tag).copied()
    }

    pub(crate) const fn forward(&self) -> &DiGraph<ArtifactTag, ()> {
        &self.forward
    }

    pub(crate) const fn transposed(&self) -> &DiGraph<ArtifactTag, ()> {
        &self.transposed
    }

    fn neighbors(&self, graph: &DiGraph<ArtifactTag, ()>, tag: &str) -> BTreeSet<ArtifactTag> {
        self.node_index(tag).map_or_else(BTreeSet::new, |idx| {
            graph
                .neighbors_directed(idx, Direction::Outgoing)
                .map(|n| graph[n].clone())
                .collect()
        })
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn intern(
    graph: &mut DiGraph<ArtifactTag, ()>,
    node_map: &mut HashMap<ArtifactTag, NodeIndex>,
    tag: ArtifactTag,
) -> NodeIndex {
    if let Some(&idx) = node_map.get(&tag) {
        return idx;
    }
    let idx = graph.add_node(tag.clone());
    node_map.insert(tag, idx);
    idx
}

/// BLAKE3 over the sorted `(from, to)` list.
fn compute_edge_hash(graph: &DiGraph<ArtifactTag, ()>) -> String {
    let mut edges: Vec<(&str, &str)> = graph
        .edge_indices()
        .filter_map(|e| graph.edge_endpoints(e))
        .map(|(a, b)| (graph[a].as_str(), graph[b].as_str()))
        .collect();
    edges.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for (from, to) in edges {
        hasher.update(from.as_bytes());
        hasher.update(b"\x00");
        hasher.update(to.as_bytes());
        hasher.update(b"\x00");
    }
    format!("blake3:{}", hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn store(edges: &[(&str, &str)]) -> GraphStore {
        GraphStore::from_edges(
            edges
                .iter()
                .map(|(a, b)| (ArtifactTag::from(*a), ArtifactTag::from(*b))),
        )
    }

    fn tags(items: &[&str]) -> BTreeSet<ArtifactTag> {
        items.iter().map(|t| ArtifactTag::from(*t)).collect()
    }

    #[test]
    fn empty_store() {
        let g = store(&[]);
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
        assert!(g.content_hash().starts_with("blake3:"));
        assert!(g.successors("x:a:1").is_empty());
    }

    #[test]
    fn successors_and_predecessors() {
        let g = store(&[("x:a:1", "y:b:1"), ("x:a:1", "z:c:1"), ("y:b:1", "z:c:1")]);
        assert_eq!(g.successors("x:a:1"), tags(&["y:b:1", "z:c:1"]));
        assert_eq!(g.predecessors("z:c:1"), tags(&["x:a:1", "y:b:1"]));
        assert!(g.predecessors("x:a:1").is_empty());
        assert_eq!(g.out_degree("x:a:1"), 2);
        assert_eq!(g.out_degree("nope:n:1"), 0);
    }

    #[test]
    fn self_loops_are_dropped_without_adding_nodes() {
        let g = store(&[("x:a:1", "x:a:1"), ("y:b:1", "z:c:1")]);
        assert_eq!(g.rejected_self_loops(), 1);
        assert!(!g.contains("x:a:1"));
        assert_eq!(g.node_count(), 2);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let g = store(&[("x:a:1", "y:b:1"), ("x:a:1", "y:b:1")]);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn hash_ignores_order_and_duplicates() {
        let a = store(&[("x:a:1", "y:b:1"), ("y:b:1", "z:c:1")]);
        let b = store(&[("y:b:1", "z:c:1"), ("x:a:1", "y:b:1"), ("x:a:1", "y:b:1")]);
        let c = store(&[("x:a:1", "y:b:1")]);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn transpose_shares_node_indices() {
        let g = store(&[("x:a:1", "y:b:1")]);
        let x = g.node_index("x:a:1").unwrap();
        let y = g.node_index("y:b:1").unwrap();
        assert!(g.forward().contains_edge(x, y));
        assert!(g.transposed().contains_edge(y, x));
        assert!(!g.transposed().contains_edge(x, y));
    }
}
