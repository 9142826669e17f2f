//! Artifact → source repository bindings.
//!
//! The engine only cares whether a binding exists; the locator string is
//! handed verbatim to the dormancy oracle.

use std::collections::HashMap;

use tracing::warn;

use crate::ingest::BindingRecord;
use crate::model::ArtifactId;

/// Immutable mapping from artifact key to repository locator.
#[derive(Debug, Clone, Default)]
pub struct RepoBindings {
    locators: HashMap<ArtifactId, String>,
}

impl RepoBindings {
    /// Build the mapping from ingested rows. The first binding for an
    /// artifact wins; later duplicates are logged and dropped.
    pub fn from_records(records: impl IntoIterator<Item = BindingRecord>) -> Self {
        let mut locators = HashMap::new();
        for record in records {
            if let Some(existing) = locators.get(&record.artifact) {
                warn!(
                    artifact = %record.artifact,
                    kept = %existing,
                    dropped = %record.locator,
                    "duplicate repository binding"
                );
                continue;
            }
            locators.insert(record.artifact, record.locator);
        }
        Self { locators }
    }

    /// Repository locator bound to `artifact`, if any.
    #[must_use]
    pub fn locator(&self, artifact: &str) -> Option<&str> {
        self.locators.get(artifact).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    /// Bound artifact keys in sorted order.
    #[must_use]
    pub fn artifacts(&self) -> Vec<&ArtifactId> {
        let mut keys: Vec<_> = self.locators.keys().collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(artifact: &str, locator: &str) -> BindingRecord {
        BindingRecord {
            artifact: ArtifactId::new(artifact),
            locator: locator.to_string(),
        }
    }

    #[test]
    fn first_binding_wins() {
        let bindings = RepoBindings::from_records([
            binding("a:b", "https://github.com/a/b"),
            binding("a:b", "https://github.com/a/other"),
        ]);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings.locator("a:b"), Some("https://github.com/a/b"));
    }

    #[test]
    fn missing_binding_is_none() {
        let bindings = RepoBindings::from_records([binding("a:b", "a/b")]);
        assert_eq!(bindings.locator("c:d"), None);
        assert!(!bindings.is_empty());
    }
}
