//!  Trees: which snapshot of which file an area holds.
//!
//! - [`Tree`] is the mutable tree owned by the working directory and the
//!   staging area
//! - [`TreeHandle`] is the frozen tree of a commit; it has no mutators at all
//! - [`TreeMutator`] builds a new frozen tree on top of a parent one
//! - [`Overlay`] is a read-only view of staged entries laid over the head
//!   commit, i.e. what the next commit would contain
//!
//! Every kind of tree implements [`TreeView`], which is all the status
//! resolver needs.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::storage::blob::BlobStore;
use crate::storage::error::StorageResult;
use crate::storage::status::StatusResolver;
use crate::storage::types::{BlobId, ChangeStatus, DiffStats, FileId};

/// read access to a File -> Blob mapping
pub trait TreeView {
    /// the snapshot this tree holds for `file`, if any
    fn get(&self, file: FileId) -> Option<BlobId>;

    /// all files present, in file order
    fn files(&self) -> Vec<FileId>;

    fn contains(&self, file: FileId) -> bool {
        self.get(file).is_some()
    }
}

/// A missing tree (no parent commit yet) behaves like an empty one.
impl<T: TreeView> TreeView for Option<&T> {
    fn get(&self, file: FileId) -> Option<BlobId> {
        self.and_then(|tree| tree.get(file))
    }

    fn files(&self) -> Vec<FileId> {
        self.map(|tree| tree.files()).unwrap_or_default()
    }
}

/// A mutable tree owned by an area.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Tree {
    entries: BTreeMap<FileId, BlobId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// insert or replace the snapshot of `file`, returning the replaced one
    pub fn set(&mut self, file: FileId, blob: BlobId) -> Option<BlobId> {
        self.entries.insert(file, blob)
    }

    /// remove `file` from this tree
    pub fn remove(&mut self, file: FileId) -> Option<BlobId> {
        self.entries.remove(&file)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileId, BlobId)> + '_ {
        self.entries.iter().map(|(file, blob)| (*file, *blob))
    }

    /// status of `file` in this tree relative to `reference`
    pub fn diff_status(&self, file: FileId, reference: &impl TreeView) -> ChangeStatus {
        StatusResolver::status(file, self, reference)
    }

    /// line statistics of `file` in this tree relative to `reference`
    pub fn diff_stats(
        &self,
        file: FileId,
        reference: &impl TreeView,
        store: &BlobStore,
    ) -> StorageResult<DiffStats> {
        StatusResolver::stats(file, self, reference, store)
    }
}

impl TreeView for Tree {
    fn get(&self, file: FileId) -> Option<BlobId> {
        self.entries.get(&file).copied()
    }

    fn files(&self) -> Vec<FileId> {
        self.entries.keys().copied().collect()
    }
}

/// A read only handle to the frozen tree of a commit
///
/// Cloning is cheap and shares the entries, so a commit built on top of
/// this one starts from the same snapshot identities.
#[derive(Debug, Clone, Default)]
pub struct TreeHandle {
    entries: Arc<BTreeMap<FileId, BlobId>>,
}

impl TreeHandle {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileId, BlobId)> + '_ {
        self.entries.iter().map(|(file, blob)| (*file, *blob))
    }

    /// check if both trees hold exactly the same snapshots
    pub fn same_snapshots(&self, other: &TreeHandle) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || self.entries == other.entries
    }

    /// status of `file` in this tree relative to `reference`
    pub fn diff_status(&self, file: FileId, reference: &impl TreeView) -> ChangeStatus {
        StatusResolver::status(file, self, reference)
    }

    /// line statistics of `file` in this tree relative to `reference`
    pub fn diff_stats(
        &self,
        file: FileId,
        reference: &impl TreeView,
        store: &BlobStore,
    ) -> StorageResult<DiffStats> {
        StatusResolver::stats(file, self, reference, store)
    }
}

impl TreeView for TreeHandle {
    fn get(&self, file: FileId) -> Option<BlobId> {
        self.entries.get(&file).copied()
    }

    fn files(&self) -> Vec<FileId> {
        self.entries.keys().copied().collect()
    }
}

/// Builds the frozen tree of a new commit.
///
/// Starts from the parent's entries so untouched files keep their snapshot
/// identity.
#[derive(Debug, Default)]
pub struct TreeMutator {
    entries: BTreeMap<FileId, BlobId>,
}

impl TreeMutator {
    /// start from `parent`, or from nothing for the first commit
    pub fn from_tree(parent: Option<&TreeHandle>) -> Self {
        Self {
            entries: parent
                .map(|tree| tree.entries.as_ref().clone())
                .unwrap_or_default(),
        }
    }

    /// insert or replace the snapshot of a file
    pub fn upsert(&mut self, file: FileId, blob: BlobId) -> &mut Self {
        self.entries.insert(file, blob);
        self
    }

    /// drop a file from the tree being built
    pub fn delete(&mut self, file: FileId) -> &mut Self {
        self.entries.remove(&file);
        self
    }

    /// freeze the result; it can never be changed afterwards
    pub fn freeze(self) -> TreeHandle {
        TreeHandle {
            entries: Arc::new(self.entries),
        }
    }
}

/// Staged entries laid over the head commit's tree.
///
/// This is what the next commit would contain, and therefore what the
/// working directory is compared against when it is displayed.
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
    staged: &'a Tree,
    deletions: &'a BTreeSet<FileId>,
    base: Option<&'a TreeHandle>,
}

impl<'a> Overlay<'a> {
    pub fn new(staged: &'a Tree, deletions: &'a BTreeSet<FileId>, base: Option<&'a TreeHandle>) -> Self {
        Self {
            staged,
            deletions,
            base,
        }
    }
}

impl TreeView for Overlay<'_> {
    fn get(&self, file: FileId) -> Option<BlobId> {
        if let Some(blob) = self.staged.get(file) {
            return Some(blob);
        }
        if self.deletions.contains(&file) {
            return None;
        }
        self.base.get(file)
    }

    fn files(&self) -> Vec<FileId> {
        let mut files: BTreeSet<FileId> = self.base.files().into_iter().collect();
        files.retain(|file| !self.deletions.contains(file));
        files.extend(self.staged.files());
        files.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u32) -> (FileId, BlobId) {
        (FileId::new(n), BlobId::new(u64::from(n) + 100))
    }

    #[test]
    fn test_tree_set_get_remove() {
        let mut tree = Tree::new();
        let (file, blob) = ids(0);

        assert_eq!(tree.get(file), None);
        assert_eq!(tree.set(file, blob), None);
        assert_eq!(tree.get(file), Some(blob));
        assert!(tree.contains(file));
        assert_eq!(tree.len(), 1);

        assert_eq!(tree.remove(file), Some(blob));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_tree_set_replaces() {
        let mut tree = Tree::new();
        let file = FileId::new(0);
        tree.set(file, BlobId::new(1));
        assert_eq!(tree.set(file, BlobId::new(2)), Some(BlobId::new(1)));
        assert_eq!(tree.get(file), Some(BlobId::new(2)));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_files_are_ordered() {
        let mut tree = Tree::new();
        for n in [3, 1, 2] {
            let (file, blob) = ids(n);
            tree.set(file, blob);
        }
        assert_eq!(tree.files(), vec![FileId::new(1), FileId::new(2), FileId::new(3)]);
    }

    #[test]
    fn test_missing_tree_is_empty() {
        let none: Option<&TreeHandle> = None;
        assert_eq!(none.get(FileId::new(0)), None);
        assert!(none.files().is_empty());
    }

    #[test]
    fn test_mutator_keeps_parent_identities() {
        let (a, blob_a) = ids(0);
        let (b, blob_b) = ids(1);

        let mut first = TreeMutator::from_tree(None);
        first.upsert(a, blob_a).upsert(b, blob_b);
        let parent = first.freeze();

        let mut second = TreeMutator::from_tree(Some(&parent));
        second.delete(b);
        let child = second.freeze();

        assert_eq!(child.get(a), Some(blob_a));
        assert_eq!(child.get(b), None);
        // the parent is frozen and unaffected
        assert_eq!(parent.get(b), Some(blob_b));
        assert!(!child.same_snapshots(&parent));

        let unchanged = TreeMutator::from_tree(Some(&parent)).freeze();
        assert!(unchanged.same_snapshots(&parent));
    }

    #[test]
    fn test_overlay_prefers_staged_entries() {
        let (a, blob_a) = ids(0);
        let (b, blob_b) = ids(1);
        let (c, blob_c) = ids(2);

        let mut base = TreeMutator::from_tree(None);
        base.upsert(a, blob_a).upsert(b, blob_b);
        let base = base.freeze();

        let mut staged = Tree::new();
        staged.set(a, BlobId::new(999));
        staged.set(c, blob_c);
        let deletions: BTreeSet<FileId> = [b].into_iter().collect();

        let overlay = Overlay::new(&staged, &deletions, Some(&base));
        assert_eq!(overlay.get(a), Some(BlobId::new(999)));
        assert_eq!(overlay.get(b), None);
        assert_eq!(overlay.get(c), Some(blob_c));
        assert_eq!(overlay.files(), vec![a, c]);
    }

    #[test]
    fn test_tree_diff_status_delegates() {
        let (a, blob_a) = ids(0);
        let mut tree = Tree::new();
        tree.set(a, blob_a);
        let empty = Tree::new();

        assert_eq!(tree.diff_status(a, &empty), ChangeStatus::Added);
        assert_eq!(empty.diff_status(a, &tree), ChangeStatus::Deleted);
        assert_eq!(tree.diff_status(a, &tree.clone()), ChangeStatus::Unmodified);
    }
}
