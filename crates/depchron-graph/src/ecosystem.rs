//! The loaded snapshot and its query surface.
//!
//! # Overview
//!
//! [`Ecosystem`] owns the three structures built from the input files:
//!
//! - the [`ReleaseIndex`] (artifact → releases, newest first),
//! - the [`GraphStore`] (tag → tag "depends on" edges and their transpose),
//! - the [`RepoBindings`] (artifact → repository locator).
//!
//! It is built once, never mutated, and is `Send + Sync`; share it by
//! reference or behind an `Arc`.
//!
//! Per-query failures never surface as `Err` from the graph queries: unknown
//! tags produce empty sets, oracle failures are logged and ignored, and
//! [`Ecosystem::snapshot`] folds resolution failures into [`Snapshot`].

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use depchron_core::config::InputsConfig;
use depchron_core::ingest::{LoadWarning, load_bindings, load_links, load_releases};
use depchron_core::{ArtifactId, ArtifactTag, Release, ReleaseIndex, RepoBindings, ResolveError};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::dormancy::{self, DormancyOracle};
use crate::graph::{self, GraphStore};
use crate::metrics;

// ---------------------------------------------------------------------------
// Ecosystem
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Ecosystem {
    releases: ReleaseIndex,
    graph: GraphStore,
    bindings: RepoBindings,
}

/// What [`Ecosystem::load`] read, for the `stats` view and for logs.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub nodes: usize,
    pub edges: usize,
    pub self_loops: usize,
    pub artifacts: usize,
    pub releases: usize,
    pub bindings: usize,
    pub content_hash: String,
    pub warnings: Vec<LoadWarning>,
}

impl Ecosystem {
    #[must_use]
    pub const fn new(releases: ReleaseIndex, graph: GraphStore, bindings: RepoBindings) -> Self {
        Self {
            releases,
            graph,
            bindings,
        }
    }

    /// Read links, releases and bindings from `data_dir` and build the
    /// snapshot.
    ///
    /// # Errors
    ///
    /// Fails if any input cannot be opened, lacks a required column, or
    /// breaks off mid-stream. Malformed rows are not errors; they end up in
    /// [`LoadReport::warnings`].
    #[instrument(skip(inputs))]
    pub fn load(data_dir: &Path, inputs: &InputsConfig) -> Result<(Self, LoadReport)> {
        let layout = inputs.binding_layout()?;

        let links = load_links(&InputsConfig::resolve(data_dir, &inputs.links))
            .context("Failed to load dependency links")?;
        let releases = load_releases(&InputsConfig::resolve(data_dir, &inputs.releases))
            .context("Failed to load artifact releases")?;
        let bindings = load_bindings(&InputsConfig::resolve(data_dir, &inputs.bindings), &layout)
            .context("Failed to load repository bindings")?;

        let mut warnings = links.warnings;
        warnings.extend(releases.warnings);
        warnings.extend(bindings.warnings);

        let ecosystem = Self::new(
            ReleaseIndex::from_records(releases.records),
            GraphStore::from_links(links.records),
            RepoBindings::from_records(bindings.records),
        );
        let report = ecosystem.report(warnings);

        info!(
            nodes = report.nodes,
            edges = report.edges,
            artifacts = report.artifacts,
            releases = report.releases,
            bindings = report.bindings,
            warnings = report.warnings.len(),
            "ecosystem loaded"
        );

        Ok((ecosystem, report))
    }

    /// Summary counts, with the given ingestion warnings attached.
    #[must_use]
    pub fn report(&self, warnings: Vec<LoadWarning>) -> LoadReport {
        LoadReport {
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            self_loops: self.graph.rejected_self_loops(),
            artifacts: self.releases.artifact_count(),
            releases: self.releases.release_count(),
            bindings: self.bindings.len(),
            content_hash: self.graph.content_hash().to_string(),
            warnings,
        }
    }

    #[must_use]
    pub const fn releases(&self) -> &ReleaseIndex {
        &self.releases
    }

    #[must_use]
    pub const fn graph(&self) -> &GraphStore {
        &self.graph
    }

    #[must_use]
    pub const fn bindings(&self) -> &RepoBindings {
        &self.bindings
    }

    // -- single-tag queries -------------------------------------------------

    #[must_use]
    pub fn tag_exists(&self, tag: &str) -> bool {
        self.graph.contains(tag)
    }

    /// The release of `artifact` current at `date`, with its date.
    ///
    /// # Errors
    ///
    /// See [`ReleaseIndex::resolve`].
    pub fn resolve_release(
        &self,
        artifact: &ArtifactId,
        date: NaiveDate,
    ) -> Result<&Release, ResolveError> {
        self.releases.resolve(artifact, date)
    }

    /// # Errors
    ///
    /// See [`ReleaseIndex::resolve`].
    pub fn resolve_tag_at_date(
        &self,
        artifact: &ArtifactId,
        date: NaiveDate,
    ) -> Result<ArtifactTag, ResolveError> {
        self.releases.resolve_tag_at_date(artifact, date)
    }

    #[must_use]
    pub fn dependencies(&self, tag: &str) -> BTreeSet<ArtifactTag> {
        self.graph.successors(tag)
    }

    #[must_use]
    pub fn dependents(&self, tag: &str) -> BTreeSet<ArtifactTag> {
        self.graph.predecessors(tag)
    }

    #[must_use]
    pub fn transitive_dependencies(&self, tag: &str) -> BTreeSet<ArtifactTag> {
        graph::transitive_dependencies(&self.graph, tag)
    }

    #[must_use]
    pub fn transitive_dependents(&self, tag: &str) -> BTreeSet<ArtifactTag> {
        graph::transitive_dependents(&self.graph, tag)
    }

    #[must_use]
    pub fn dormant_dependencies<O>(&self, tag: &str, date: NaiveDate, oracle: &O) -> BTreeSet<ArtifactTag>
    where
        O: DormancyOracle + ?Sized,
    {
        dormancy::dormant_dependencies(&self.graph, &self.bindings, tag, date, oracle)
    }

    #[must_use]
    pub fn influence_score(&self, tag: &str) -> f64 {
        metrics::influence_score(&self.graph, tag)
    }

    // -- composite ----------------------------------------------------------

    /// Resolve `artifact` at `date` and, if its tag is in the graph, compute
    /// every metric for it.
    #[must_use]
    #[instrument(skip(self, oracle))]
    pub fn snapshot<O>(&self, artifact: &ArtifactId, date: NaiveDate, oracle: &O) -> Snapshot
    where
        O: DormancyOracle + ?Sized,
    {
        let tag = match self.resolve_tag_at_date(artifact, date) {
            Ok(tag) => tag,
            Err(reason) => return Snapshot::Unresolved { reason },
        };

        if !self.tag_exists(tag.as_str()) {
            debug!(%tag, "resolved tag has no edges in the link snapshot");
            return Snapshot::NotInGraph { tag };
        }

        let key = tag.as_str();
        let metrics = SnapshotMetrics {
            dependencies: self.dependencies(key),
            dependents: self.dependents(key),
            transitive_dependencies: self.transitive_dependencies(key),
            transitive_dependents: self.transitive_dependents(key),
            dormant_dependencies: self.dormant_dependencies(key, date, oracle),
            influence: self.influence_score(key),
        };
        Snapshot::Resolved { tag, metrics }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Outcome of [`Ecosystem::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Snapshot {
    Resolved {
        tag: ArtifactTag,
        metrics: SnapshotMetrics,
    },
    Unresolved {
        reason: ResolveError,
    },
    /// The release exists but the link snapshot never mentions it.
    NotInGraph {
        tag: ArtifactTag,
    },
}

impl Snapshot {
    #[must_use]
    pub const fn metrics(&self) -> Option<&SnapshotMetrics> {
        match self {
            Self::Resolved { metrics, .. } => Some(metrics),
            Self::Unresolved { .. } | Self::NotInGraph { .. } => None,
        }
    }

    #[must_use]
    pub const fn tag(&self) -> Option<&ArtifactTag> {
        match self {
            Self::Resolved { tag, .. } | Self::NotInGraph { tag } => Some(tag),
            Self::Unresolved { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotMetrics {
    pub dependencies: BTreeSet<ArtifactTag>,
    pub dependents: BTreeSet<ArtifactTag>,
    pub transitive_dependencies: BTreeSet<ArtifactTag>,
    pub transitive_dependents: BTreeSet<ArtifactTag>,
    pub dormant_dependencies: BTreeSet<ArtifactTag>,
    pub influence: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
