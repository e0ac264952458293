//! core identifiers and value types shared by the storage layer.

use std::fmt;
use std::fmt::Formatter;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Stable identity of a logical file.
///
/// Ids are handed out in creation order, so ordering by `FileId` is the
/// order in which the learner added the files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub(crate) u32);

impl FileId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// 1-based number shown to the learner
    pub fn number(&self) -> u32 {
        self.0 + 1
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.number())
    }
}

/// Identity of one content snapshot.
///
/// Two snapshots are "the same content" exactly when their ids are equal;
/// there is no structural comparison of counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlobId(pub(crate) u64);

impl BlobId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

/// Index of a commit in the repository's append-only history.
///
/// This is a non-owning handle: it is only meaningful together with the
/// repository that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CommitId(pub(crate) u32);

impl CommitId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    /// position in the commit sequence
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The checksum shown for a commit.
///
/// The toy model has no content hashing, so commits get a ULID instead.
/// The short form uses the random tail of the ULID because its leading
/// characters only encode the creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum(Ulid);

impl Checksum {
    /// length of the abbreviated checksum
    pub const SHORT_LEN: usize = 7;

    pub(crate) fn generate() -> Self {
        Self(Ulid::new())
    }

    /// abbreviated, lowercase checksum
    pub fn short(&self) -> String {
        let full = self.to_string();
        full[full.len() - Self::SHORT_LEN..].to_string()
    }

    /// check whether `candidate` names this checksum (full form or short form prefix)
    pub fn matches(&self, candidate: &str) -> bool {
        let candidate = candidate.trim().to_lowercase();
        if candidate.is_empty() {
            return false;
        }
        self.to_string() == candidate || self.short().starts_with(&candidate)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string().to_lowercase())
    }
}

impl Serialize for Checksum {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.short())
    }
}

/// The three tracked locations a file can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaKind {
    WorkingDirectory,
    StagingArea,
    Repository,
}

impl fmt::Display for AreaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WorkingDirectory => write!(f, "working directory"),
            Self::StagingArea => write!(f, "staging area"),
            Self::Repository => write!(f, "repository"),
        }
    }
}

/// the status of a file, derived by comparing two trees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    Added,
    Modified,
    Deleted,
    Unmodified,
}

impl ChangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Unmodified => "unmodified",
        }
    }

    /// single-letter marker, the way `git status --short` shows it
    pub fn marker(&self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
            Self::Unmodified => ' ',
        }
    }

    pub fn is_change(&self) -> bool {
        *self != Self::Unmodified
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// line statistics between two snapshots of a file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffStats {
    pub insertions: u32,
    pub deletions: u32,
}

impl DiffStats {
    pub const ZERO: DiffStats = DiffStats {
        insertions: 0,
        deletions: 0,
    };

    pub fn new(insertions: u32, deletions: u32) -> Self {
        Self {
            insertions,
            deletions,
        }
    }

    /// total number of changed lines
    pub fn changes(&self) -> u32 {
        self.insertions.saturating_add(self.deletions)
    }

    pub fn is_zero(&self) -> bool {
        self.insertions == 0 && self.deletions == 0
    }
}

impl fmt::Display for DiffStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} -{}", self.insertions, self.deletions)
    }
}
