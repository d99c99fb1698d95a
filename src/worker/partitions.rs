//! Versioned partition naming
//!
//! Each controller version owns exactly two partitions,
//! `{prefix}-static-{version}` and `{prefix}-dynamic-{version}`. Any other
//! partition name found in the store is stale once that version activates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which of a version's two partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// Bootstrap assets and build-time scripts/styles
    Static,
    /// Responses captured at runtime
    Dynamic,
}

impl PartitionKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Partition names for one controller version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheNames {
    pub prefix: String,
    pub version: String,
}

impl CacheNames {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            version: version.into(),
        }
    }

    /// Name of the given partition for this version
    pub fn name(&self, kind: PartitionKind) -> String {
        format!("{}-{}-{}", self.prefix, kind.label(), self.version)
    }

    pub fn static_name(&self) -> String {
        self.name(PartitionKind::Static)
    }

    pub fn dynamic_name(&self) -> String {
        self.name(PartitionKind::Dynamic)
    }

    /// Whether `name` is one of this version's partitions
    pub fn is_current(&self, name: &str) -> bool {
        name == self.static_name() || name == self.dynamic_name()
    }

    /// Every name that is not one of this version's partitions
    ///
    /// Partitions unrelated to the prefix are included too.
    pub fn stale<'a>(&self, names: &'a [String]) -> Vec<&'a str> {
        names
            .iter()
            .map(String::as_str)
            .filter(|name| !self.is_current(name))
            .collect()
    }
}

/// A partition name broken back into its parts, for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionName {
    pub name: String,
    /// `None` for names this tool did not create
    pub parts: Option<(String, PartitionKind, String)>,
}

impl PartitionName {
    /// Parse `{prefix}-{static|dynamic}-{version}`
    pub fn parse(name: &str) -> Self {
        let parts = [PartitionKind::Static, PartitionKind::Dynamic]
            .into_iter()
            .find_map(|kind| {
                let marker = format!("-{}-", kind.label());
                let idx = name.find(&marker)?;
                let prefix = &name[..idx];
                let version = &name[idx + marker.len()..];
                if prefix.is_empty() || version.is_empty() {
                    return None;
                }
                Some((prefix.to_string(), kind, version.to_string()))
            });

        Self {
            name: name.to_string(),
            parts,
        }
    }

    pub fn kind(&self) -> Option<PartitionKind> {
        self.parts.as_ref().map(|(_, kind, _)| *kind)
    }

    pub fn version(&self) -> Option<&str> {
        self.parts.as_ref().map(|(_, _, version)| version.as_str())
    }
}
