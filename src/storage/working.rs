//! The working directory area.
//!
//! Holds the learner's current version of every file. Besides its tree it
//! remembers which files it lists at all, and which of those are hidden:
//! a deleted file stays listed (as DELETED) until its deletion is staged.

use std::collections::BTreeSet;

use tracing::debug;

use crate::storage::blob::{BlobStore, Modification};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::tree::{Tree, TreeView};
use crate::storage::types::{AreaKind, BlobId, FileId};

#[derive(Debug, Default, Clone)]
pub struct WorkingDirectory {
    tree: Tree,
    listed: BTreeSet<FileId>,
    hidden: BTreeSet<FileId>,
}

impl WorkingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// check if the file is shown in the working directory
    pub fn is_visible(&self, file: FileId) -> bool {
        self.listed.contains(&file) && !self.hidden.contains(&file)
    }

    pub fn is_hidden(&self, file: FileId) -> bool {
        self.hidden.contains(&file)
    }

    /// listed, non-hidden files in file order
    pub fn visible_files(&self) -> Vec<FileId> {
        self.listed
            .iter()
            .filter(|file| !self.hidden.contains(file))
            .copied()
            .collect()
    }

    /// the current snapshot of a visible file
    pub fn blob(&self, file: FileId) -> Option<BlobId> {
        if self.is_visible(file) {
            self.tree.get(file)
        } else {
            None
        }
    }

    fn require_present(&self, file: FileId) -> StorageResult<BlobId> {
        self.blob(file).ok_or(StorageError::FileNotFound {
            file,
            area: AreaKind::WorkingDirectory,
        })
    }

    /// put a new file with its first snapshot into the tree
    pub fn add_file(&mut self, file: FileId, store: &mut BlobStore) -> BlobId {
        let blob = store.write_initial(file);
        self.tree.set(file, blob);
        self.listed.insert(file);
        self.hidden.remove(&file);
        debug!(%file, %blob, "added file to working directory");
        blob
    }

    /// replace the file's snapshot with a modified one
    pub fn modify_file(
        &mut self,
        file: FileId,
        modification: Modification,
        store: &mut BlobStore,
    ) -> StorageResult<BlobId> {
        let current = self.require_present(file)?;
        let blob = store.write_modified(current, modification)?;
        self.tree.set(file, blob);
        debug!(%file, previous = %current, %blob, "modified file");
        Ok(blob)
    }

    /// Remove the file from the tree.
    ///
    /// With `hide` the file also disappears from the listing, which is
    /// what happens to a file the next commit would not contain anyway.
    pub fn delete_file(&mut self, file: FileId, hide: bool) -> StorageResult<BlobId> {
        let current = self.require_present(file)?;
        self.tree.remove(file);
        if hide {
            self.hidden.insert(file);
        }
        debug!(%file, hidden = hide, "deleted file");
        Ok(current)
    }

    /// Set the file to `blob` (or remove it), listing it again.
    ///
    /// A file restored as absent is hidden, since nothing about it is
    /// left to display.
    pub(crate) fn restore(&mut self, file: FileId, blob: Option<BlobId>) {
        self.listed.insert(file);
        match blob {
            Some(blob) => {
                self.tree.set(file, blob);
                self.hidden.remove(&file);
            }
            None => {
                self.tree.remove(file);
                self.hidden.insert(file);
            }
        }
    }

    /// start a new diff baseline for the file after it was staged
    pub(crate) fn rebase(&mut self, file: FileId, blob: BlobId) {
        self.tree.set(file, blob);
    }

    pub(crate) fn hide(&mut self, file: FileId) {
        self.hidden.insert(file);
    }

    pub(crate) fn unhide(&mut self, file: FileId) {
        self.hidden.remove(&file);
    }
}
