//! Cache partition version tags.
//!
//! A [`VersionTag`] is a monotonic identifier minted at build/deploy time and
//! embedded into partition names as `{kind}-{tag}` (e.g. `static-v2`). The
//! lifecycle layer uses it to tell current partitions from stale ones; it is
//! never mutated at runtime.

use std::fmt;

/// The three partition families with independent eviction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionKind {
    /// App shell and precached assets; unbounded, replaced wholesale per version.
    Static,
    /// Photo responses; capacity and freshness bounded.
    Image,
    /// Remote API responses; capacity bounded with a short freshness window.
    Api,
}

impl PartitionKind {
    /// All partition kinds, in the order they are created at install.
    pub const ALL: [PartitionKind; 3] = [PartitionKind::Static, PartitionKind::Image, PartitionKind::Api];

    /// Stable name fragment used in partition names.
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Image => "image",
            PartitionKind::Api => "api",
        }
    }
}

/// Monotonic version identifier embedded in partition names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full partition name for a kind under this version.
    pub fn partition_name(&self, kind: PartitionKind) -> String {
        format!("{}-{}", kind.as_str(), self.0)
    }

    /// Whether a partition name belongs to this version.
    ///
    /// Matches the full `-{tag}` suffix, so `static-v12` is not owned by
    /// `v1` and dashed tags like `2024-06-01` still round-trip.
    pub fn owns(&self, partition_name: &str) -> bool {
        partition_name
            .strip_suffix(self.0.as_str())
            .is_some_and(|prefix| prefix.ends_with('-'))
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
