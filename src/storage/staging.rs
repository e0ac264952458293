//! The staging area.
//!
//! The staging tree only holds what changes in the next commit: copies of
//! staged snapshots, plus the set of files staged for deletion. It is
//! emptied by every commit.
//!
//! Staging copies a snapshot instead of moving it, so a file can have
//! independent versions in the working directory, the staging area and
//! the commits at the same time.

use std::collections::BTreeSet;

use tracing::debug;

use crate::storage::blob::BlobStore;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::status::StatusResolver;
use crate::storage::tree::{Overlay, Tree, TreeHandle, TreeView};
use crate::storage::types::{AreaKind, ChangeStatus, FileId};
use crate::storage::working::WorkingDirectory;

/// what staging did to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staged {
    /// a first copy of the working snapshot was staged
    Copied,
    /// an existing staged copy was replaced by the newer working snapshot
    Merged,
    /// the file's deletion was staged
    Deleted,
}

#[derive(Debug, Default, Clone)]
pub struct StagingArea {
    tree: Tree,
    deletions: BTreeSet<FileId>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// files staged for deletion
    pub fn deletions(&self) -> &BTreeSet<FileId> {
        &self.deletions
    }

    /// check if anything is staged for the file
    pub fn has_entry(&self, file: FileId) -> bool {
        self.tree.contains(file) || self.deletions.contains(&file)
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty() && self.deletions.is_empty()
    }

    /// number of staged files
    pub fn len(&self) -> usize {
        self.tree.len() + self.deletions.len()
    }

    /// the next commit's content: staged entries over `head`
    pub fn overlay<'a>(&'a self, head: Option<&'a TreeHandle>) -> Overlay<'a> {
        Overlay::new(&self.tree, &self.deletions, head)
    }

    /// Stage one file from the working directory.
    ///
    /// `head` is the tree of the last commit, the baseline deciding whether
    /// the file has anything to stage at all. All checks run before
    /// anything is touched, so a rejected call changes nothing.
    pub fn stage(
        &mut self,
        file: FileId,
        working: &mut WorkingDirectory,
        head: Option<&TreeHandle>,
        store: &mut BlobStore,
    ) -> StorageResult<Staged> {
        let working_blob = working.tree().get(file);

        if self.has_entry(file) {
            let unchanged = match self.tree.get(file) {
                Some(staged) => working_blob == Some(staged),
                None => working_blob.is_none(),
            };
            if unchanged {
                return Err(StorageError::AlreadyStaged(file));
            }
        }

        // a hidden file the last commit still has is a pending deletion
        let pending_deletion =
            working.is_hidden(file) && working_blob.is_none() && TreeView::contains(&head, file);
        if !working.is_visible(file) && !pending_deletion {
            return Err(StorageError::FileNotFound {
                file,
                area: AreaKind::WorkingDirectory,
            });
        }

        if StatusResolver::status(file, working.tree(), &head) == ChangeStatus::Unmodified {
            return Err(StorageError::NotStageable(file));
        }

        let staged = match working_blob {
            Some(source) => {
                let copy = store.write_copy(source)?;
                let kind = if self.tree.set(file, copy).is_some() {
                    Staged::Merged
                } else {
                    Staged::Copied
                };
                self.deletions.remove(&file);
                // the staged copy becomes the working baseline for further edits
                working.rebase(file, copy);
                debug!(%file, %source, staged = %copy, ?kind, "staged file");
                kind
            }
            None => {
                self.tree.remove(file);
                if TreeView::contains(&head, file) {
                    self.deletions.insert(file);
                }
                working.hide(file);
                debug!(%file, "staged deletion");
                Staged::Deleted
            }
        };

        Ok(staged)
    }

    /// Drop the staged entry of a file and give the working directory its
    /// pre-stage state back.
    pub fn unstage(
        &mut self,
        file: FileId,
        working: &mut WorkingDirectory,
        store: &BlobStore,
    ) -> StorageResult<()> {
        if let Some(staged) = self.tree.get(file) {
            // only roll back if nothing was edited after staging
            if working.tree().get(file) == Some(staged) {
                if let Some(before) = store.read(staged)?.previous() {
                    working.rebase(file, before);
                }
            }
            self.tree.remove(file);
            working.unhide(file);
            debug!(%file, "unstaged file");
            return Ok(());
        }

        if self.deletions.remove(&file) {
            working.unhide(file);
            debug!(%file, "unstaged deletion");
            return Ok(());
        }

        Err(StorageError::FileNotFound {
            file,
            area: AreaKind::StagingArea,
        })
    }

    /// drop whatever is staged for a file without touching the working
    /// directory (its content was just replaced by a revert)
    pub(crate) fn discard(&mut self, file: FileId) -> bool {
        let staged = self.tree.remove(file).is_some();
        let deleted = self.deletions.remove(&file);
        staged || deleted
    }

    /// empty the staging area (after a commit)
    pub(crate) fn clear(&mut self) {
        self.tree.clear();
        self.deletions.clear();
    }
}
