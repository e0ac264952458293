//! Status resolution.
//!
//! A file's status is never stored. It is derived on demand by comparing
//! the snapshot a tree holds for the file with the snapshot a reference
//! tree holds for it:
//!
//! | this tree | reference | status     |
//! |-----------|-----------|------------|
//! | absent    | any       | DELETED    |
//! | present   | absent    | ADDED      |
//! | blob `x`  | blob `x`  | UNMODIFIED |
//! | blob `x`  | blob `y`  | MODIFIED   |

use std::collections::BTreeSet;

use serde::Serialize;

use crate::storage::blob::BlobStore;
use crate::storage::error::StorageResult;
use crate::storage::tree::TreeView;
use crate::storage::types::{ChangeStatus, DiffStats, FileId};

/// status and line statistics of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub status: ChangeStatus,
    pub stats: DiffStats,
}

/// Pure functions deriving file status from two trees.
pub struct StatusResolver;

impl StatusResolver {
    /// status of `file` in `tree` relative to `reference`
    pub fn status(file: FileId, tree: &impl TreeView, reference: &impl TreeView) -> ChangeStatus {
        match (tree.get(file), reference.get(file)) {
            (None, _) => ChangeStatus::Deleted,
            (Some(_), None) => ChangeStatus::Added,
            (Some(current), Some(base)) if current == base => ChangeStatus::Unmodified,
            (Some(_), Some(_)) => ChangeStatus::Modified,
        }
    }

    /// line statistics of `file` in `tree` relative to `reference`
    ///
    /// zero whenever either side has no snapshot of the file
    pub fn stats(
        file: FileId,
        tree: &impl TreeView,
        reference: &impl TreeView,
        store: &BlobStore,
    ) -> StorageResult<DiffStats> {
        match (tree.get(file), reference.get(file)) {
            (Some(current), Some(base)) if current != base => {
                let current = store.read(current)?;
                let base = store.read(base)?;
                Ok(current.delta(base))
            }
            _ => Ok(DiffStats::ZERO),
        }
    }

    /// status and statistics together
    pub fn resolve(
        file: FileId,
        tree: &impl TreeView,
        reference: &impl TreeView,
        store: &BlobStore,
    ) -> StorageResult<Resolution> {
        Ok(Resolution {
            status: Self::status(file, tree, reference),
            stats: Self::stats(file, tree, reference, store)?,
        })
    }

    /// Files present on either side, in file order.
    ///
    /// Files only present in `reference` resolve to DELETED.
    pub fn files_in_either(tree: &impl TreeView, reference: &impl TreeView) -> Vec<FileId> {
        let mut files: BTreeSet<FileId> = tree.files().into_iter().collect();
        files.extend(reference.files());
        files.into_iter().collect()
    }

    /// files whose status is anything but UNMODIFIED
    pub fn changed_files(tree: &impl TreeView, reference: &impl TreeView) -> Vec<FileId> {
        Self::files_in_either(tree, reference)
            .into_iter()
            .filter(|file| Self::status(*file, tree, reference).is_change())
            .collect()
    }
}
