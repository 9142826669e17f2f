use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::ArtifactId;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    DataDirMissing,
    ConfigParseError,
    InputUnreadable,
    MissingColumn,
    UnknownArtifact,
    NoResolvableVersion,
    TagNotInGraph,
    MalformedInputRow,
    OracleFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::DataDirMissing => "E1001",
            Self::ConfigParseError => "E1002",
            Self::InputUnreadable => "E1003",
            Self::MissingColumn => "E1004",
            Self::UnknownArtifact => "E2001",
            Self::NoResolvableVersion => "E2002",
            Self::TagNotInGraph => "E2003",
            Self::MalformedInputRow => "E3001",
            Self::OracleFailure => "E4001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::DataDirMissing => "Data directory not found",
            Self::ConfigParseError => "Config file parse error",
            Self::InputUnreadable => "Input file unreadable",
            Self::MissingColumn => "Input file is missing a required column",
            Self::UnknownArtifact => "Artifact not in release catalogue",
            Self::NoResolvableVersion => "No release within the grace window",
            Self::TagNotInGraph => "Resolved tag absent from dependency graph",
            Self::MalformedInputRow => "Malformed input row skipped",
            Self::OracleFailure => "Dormancy oracle failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::DataDirMissing => Some("Pass --data-dir or set DEPCHRON_DATA."),
            Self::ConfigParseError => Some("Fix syntax in depchron.toml and retry."),
            Self::InputUnreadable => Some("Check the [inputs] file names and read permissions."),
            Self::MissingColumn => Some("Check the header row of the input file."),
            Self::UnknownArtifact => Some("Use the group:name key as it appears in the releases file."),
            Self::NoResolvableVersion => Some("Query a later date; every release postdates the window."),
            Self::TagNotInGraph | Self::MalformedInputRow => None,
            Self::OracleFailure => Some("Dependency counted as not dormant; check the commit log."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Why a release lookup produced no tag.
///
/// Both variants are per-query outcomes: callers record a null and move on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolveError {
    /// The artifact never appears in the release catalogue.
    #[error("artifact {artifact} not found in release catalogue")]
    UnknownArtifact { artifact: ArtifactId },

    /// Releases exist, but every one of them is dated after the grace threshold.
    #[error("artifact {artifact} has no release on or before {threshold}")]
    NoResolvableVersion {
        artifact: ArtifactId,
        threshold: NaiveDate,
    },
}

impl ResolveError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::UnknownArtifact { .. } => ErrorCode::UnknownArtifact,
            Self::NoResolvableVersion { .. } => ErrorCode::NoResolvableVersion,
        }
    }
}
