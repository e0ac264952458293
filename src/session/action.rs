//! Actions: the commands a learner can issue, as plain values.
//!
//! Every action carries everything needed to apply it again. A random
//! modification is drawn once, when the action is created, so replaying a
//! journal reproduces exactly the same snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::{CommitId, FileId, Modification};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    AddFile {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    ModifyFile {
        file: FileId,
        insertions: i32,
        deletions: i32,
    },
    DeleteFile {
        file: FileId,
    },
    StageFile {
        file: FileId,
    },
    StageAllFiles,
    UnstageFile {
        file: FileId,
    },
    CreateCommit,
    RevertCommit {
        commit: CommitId,
    },
}

impl Action {
    /// the action's type tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AddFile { .. } => "ADD_FILE",
            Self::ModifyFile { .. } => "MODIFY_FILE",
            Self::DeleteFile { .. } => "DELETE_FILE",
            Self::StageFile { .. } => "STAGE_FILE",
            Self::StageAllFiles => "STAGE_ALL_FILES",
            Self::UnstageFile { .. } => "UNSTAGE_FILE",
            Self::CreateCommit => "CREATE_COMMIT",
            Self::RevertCommit { .. } => "REVERT_COMMIT",
        }
    }

    /// the file the action targets, if it targets one
    pub fn file(&self) -> Option<FileId> {
        match self {
            Self::ModifyFile { file, .. }
            | Self::DeleteFile { file }
            | Self::StageFile { file }
            | Self::UnstageFile { file } => Some(*file),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModifyFile {
                file,
                insertions,
                deletions,
            } => write!(
                f,
                "{} {} ({})",
                self.kind(),
                file,
                Modification::new(*insertions, *deletions)
            ),
            Self::RevertCommit { commit } => write!(f, "{} {}", self.kind(), commit),
            Self::AddFile { name: Some(name) } => write!(f, "{} {}", self.kind(), name),
            _ => match self.file() {
                Some(file) => write!(f, "{} {}", self.kind(), file),
                None => f.write_str(self.kind()),
            },
        }
    }
}

/// The entity an action affected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    File(FileId),
    Files(Vec<FileId>),
    Commit(CommitId),
}
