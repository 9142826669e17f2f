//! Artifact identifiers and versioned artifact tags.
//!
//! An [`ArtifactId`] is the version-independent `group:name` key of a
//! package. An [`ArtifactTag`] is `group:name:version`, the unit of graph
//! nodes. Both are opaque strings: graph node labels are taken verbatim from
//! the link snapshot and are never re-normalized.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A coordinate string that does not have the `group:name:version` shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected group:name:version coordinate, got {0:?}")]
pub struct CoordinateError(pub String);

/// Split `group:name:version` into its three parts.
///
/// The version is the third segment; anything after a third colon is
/// ignored, so `g:a:1.0:jdk8` splits to `("g", "a", "1.0")`. Returns `None`
/// when fewer than three non-empty segments are present.
#[must_use]
pub fn split_coordinate(raw: &str) -> Option<(&str, &str, &str)> {
    let mut parts = raw.split(':');
    let group = parts.next().filter(|s| !s.is_empty())?;
    let name = parts.next().filter(|s| !s.is_empty())?;
    let version = parts.next().filter(|s| !s.is_empty())?;
    Some((group, name, version))
}

// ---------------------------------------------------------------------------
// ArtifactId
// ---------------------------------------------------------------------------

/// Version-independent artifact key, e.g. `org.foo:bar`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Wrap an artifact key without validation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the key from its group and name.
    #[must_use]
    pub fn from_parts(group: &str, name: &str) -> Self {
        Self(format!("{group}:{name}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tag naming `version` of this artifact.
    #[must_use]
    pub fn with_version(&self, version: &str) -> ArtifactTag {
        ArtifactTag(format!("{}:{version}", self.0))
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for ArtifactId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// ArtifactTag
// ---------------------------------------------------------------------------

/// A specific release of an artifact, e.g. `org.foo:bar:1.2.0`.
///
/// Tags coming from the link snapshot are accepted as-is (see
/// [`ArtifactTag::new`]); use [`ArtifactTag::parse`] where the three-part
/// shape is required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactTag(String);

impl ArtifactTag {
    /// Wrap a node label without validation.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Parse a `group:name:version` coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateError`] if fewer than three non-empty segments are
    /// present.
    pub fn parse(raw: &str) -> Result<Self, CoordinateError> {
        split_coordinate(raw)
            .map(|_| Self(raw.to_string()))
            .ok_or_else(|| CoordinateError(raw.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `group:name` part of the tag, if the tag is well formed.
    #[must_use]
    pub fn artifact_id(&self) -> Option<ArtifactId> {
        split_coordinate(&self.0).map(|(group, name, _)| ArtifactId::from_parts(group, name))
    }

    /// The version part of the tag, if the tag is well formed.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        split_coordinate(&self.0).map(|(_, _, version)| version)
    }
}

impl fmt::Display for ArtifactTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArtifactTag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for ArtifactTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}
