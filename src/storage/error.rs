//! Storage layer error types
//!
//! All errors that can occur while mutating the working directory, the
//! staging area or the commit history are defined here.
//! Every one of them is recoverable: a failed operation leaves the
//! repository exactly as it was before the call.

use thiserror::Error;

use crate::storage::types::{AreaKind, BlobId, FileId};

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// the file is not present in the area the operation needs it in
    #[error("file {file} not found in the {area}")]
    FileNotFound { file: FileId, area: AreaKind },

    /// no file has this name or number
    #[error("no file named {0}")]
    UnknownFile(String),

    /// the commit is unknown, or not an ancestor of head
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// the staged copy of the file is already up to date
    #[error("file {0} is already staged")]
    AlreadyStaged(FileId),

    /// the file has no changes relative to the last commit
    #[error("file {0} cannot be staged: only added, modified or deleted files can be staged")]
    NotStageable(FileId),

    /// a tree references a snapshot the blob store does not hold
    #[error("blob not found: {0}")]
    BlobNotFound(BlobId),

    /// internal error that shouldn't happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::FileNotFound { .. }
                | StorageError::UnknownFile(_)
                | StorageError::CommitNotFound(_)
        )
    }

    /// check if this error is a staging policy rejection
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StorageError::AlreadyStaged(_) | StorageError::NotStageable(_)
        )
    }

    /// check if the session can simply report this error and carry on
    pub fn is_recoverable(&self) -> bool {
        self.is_not_found() || self.is_rejection()
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
