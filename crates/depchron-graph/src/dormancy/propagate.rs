use std::collections::BTreeSet;

use chrono::NaiveDate;
use depchron_core::{ArtifactTag, RepoBindings};
use tracing::{debug, instrument, warn};

use super::DormancyOracle;
use crate::graph::GraphStore;

/// Direct dependencies of `tag` whose bound repository is dormant at `date`.
///
/// Dependencies without a well-formed coordinate or without a binding are
/// skipped. Oracle errors are logged and the dependency counts as active.
/// The result is always a subset of `store.successors(tag)`.
#[must_use]
#[instrument(skip(store, bindings, oracle))]
pub fn dormant_dependencies<O>(
    store: &GraphStore,
    bindings: &RepoBindings,
    tag: &str,
    date: NaiveDate,
    oracle: &O,
) -> BTreeSet<ArtifactTag>
where
    O: DormancyOracle + ?Sized,
{
    let mut dormant = BTreeSet::new();

    for dependency in store.successors(tag) {
        let Some(artifact) = dependency.artifact_id() else {
            debug!(%dependency, "dependency tag is not a coordinate");
            continue;
        };
        let Some(locator) = bindings.locator(artifact.as_str()) else {
            debug!(%artifact, "no repository bound");
            continue;
        };

        match oracle.is_dormant(locator, date) {
            Ok(true) => {
                dormant.insert(dependency);
            }
            Ok(false) => {}
            Err(err) => {
                warn!(
                    %dependency,
                    repo = locator,
                    %date,
                    error = %err,
                    code = err.error_code().code(),
                    "dormancy check failed, treating as active"
                );
            }
        }
    }

    dormant
}
