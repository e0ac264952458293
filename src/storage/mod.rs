//! storage layer for stagecraft
//!
//! this module is the whole versioned file tree engine. The session layer
//! (commands, console, replay) uses this API and never reaches into trees
//! directly.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Repository                           │
//! │     (commands: add, modify, delete, stage, commit, revert)  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │   working   │       │   staging   │       │   commit    │
//!  │ (directory) │       │   (area)    │       │  (history)  │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!         │                     │                     │
//!         └─────────────────────┼─────────────────────┘
//!                               │
//!                               ▼
//!                 ┌───────────────────────────┐
//!                 │  tree + status + blob     │
//!                 │ (snapshots, diff, status) │
//!                 └───────────────────────────┘
//!  ```
//!
//! # Usage
//!
//! ```
//! use stagecraft::storage::{ChangeStatus, Modification, Repository};
//!
//! let mut repo = Repository::new();
//! let file = repo.add_file();
//! repo.stage_file(file.id)?;
//! let first = repo.create_commit()?;
//!
//! repo.modify_file(file.id, Modification::new(3, 1))?;
//! assert_eq!(repo.working_status(file.id), ChangeStatus::Modified);
//!
//! repo.revert_commit(first)?;
//! assert_eq!(repo.working_status(file.id), ChangeStatus::Unmodified);
//! # Ok::<(), stagecraft::storage::StorageError>(())
//! ```

mod blob;
mod commit;
mod error;
mod file;
mod repository;
mod staging;
mod status;
mod tree;
mod types;
mod working;

// Re-export public API
pub use blob::{Blob, BlobStore, Modification};
pub use commit::{Commit, CommitBuilder, History};
pub use error::{StorageError, StorageResult};
pub use file::{File, FileRegistry};
pub use repository::{CommitSummary, FileEntry, Repository, RepositorySnapshot, RepositoryStats};
pub use staging::{StagingArea, Staged};
pub use status::{Resolution, StatusResolver};
pub use tree::{Overlay, Tree, TreeHandle, TreeMutator, TreeView};
pub use types::{AreaKind, BlobId, ChangeStatus, Checksum, CommitId, DiffStats, FileId};
pub use working::WorkingDirectory;
