//! High-level repository API.
//!
//! This is the main entry point of the storage layer. It composes the
//! working directory, the staging area and the commit history, and owns
//! the blob store every tree points into.
//!
//! Every command returns the entity it affected. Every query resolves
//! statuses from the trees at call time; nothing derived is cached.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::storage::blob::{Blob, BlobStore, Modification};
use crate::storage::commit::{self, Commit, CommitBuilder, History};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::file::{File, FileRegistry};
use crate::storage::staging::StagingArea;
use crate::storage::status::StatusResolver;
use crate::storage::tree::{Overlay, TreeHandle, TreeMutator, TreeView};
use crate::storage::types::{BlobId, ChangeStatus, CommitId, DiffStats, FileId};
use crate::storage::working::WorkingDirectory;

/// The working directory, staging area and commit history of one session.
#[derive(Debug, Default, Clone)]
pub struct Repository {
    files: FileRegistry,
    store: BlobStore,
    working: WorkingDirectory,
    staging: StagingArea,
    commits: Vec<Commit>,
    head: Option<CommitId>,
}

impl Repository {
    /// Create an empty repository (no files, no commits).
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== File Operations ====================

    /// Add a new, empty file to the working directory.
    pub fn add_file(&mut self) -> File {
        self.add_named_file(None)
    }

    /// Add a new, empty file with the given name (or a generated one).
    #[instrument(skip(self))]
    pub fn add_named_file(&mut self, name: Option<String>) -> File {
        let file = self.files.create(name);
        self.working.add_file(file.id, &mut self.store);
        info!(file = %file.id, name = %file.name, "file added");
        file
    }

    /// Modify a file in the working directory.
    ///
    /// Fails if the file is not present there.
    #[instrument(skip(self))]
    pub fn modify_file(&mut self, file: FileId, modification: Modification) -> StorageResult<FileId> {
        self.working.modify_file(file, modification, &mut self.store)?;
        info!(%file, "file modified");
        Ok(file)
    }

    /// Delete a file from the working directory.
    ///
    /// A file the next commit would not contain anyway (never committed,
    /// never staged) disappears from the listing right away.
    #[instrument(skip(self))]
    pub fn delete_file(&mut self, file: FileId) -> StorageResult<FileId> {
        let tracked = self.index().contains(file);
        self.working.delete_file(file, !tracked)?;
        info!(%file, tracked, "file deleted");
        Ok(file)
    }

    // ==================== Staging Operations ====================

    /// Stage a file.
    ///
    /// Fails with `AlreadyStaged` if the staged copy is up to date, and
    /// with `NotStageable` if the file has no changes since the last commit.
    #[instrument(skip(self))]
    pub fn stage_file(&mut self, file: FileId) -> StorageResult<FileId> {
        let head = self.head.and_then(|id| self.commits.get(id.index())).map(Commit::tree);
        let staged = self
            .staging
            .stage(file, &mut self.working, head, &mut self.store)?;
        info!(%file, ?staged, "file staged");
        Ok(file)
    }

    /// Stage every file in the working directory that can be staged.
    ///
    /// Files rejected by the staging policy are skipped; this never fails.
    /// Files a revert removed (hidden, but still in the last commit) are
    /// staged as deletions.
    #[instrument(skip(self))]
    pub fn stage_all_files(&mut self) -> Vec<FileId> {
        let mut candidates: BTreeSet<FileId> = self.working.visible_files().into_iter().collect();
        candidates.extend(
            self.head_tree()
                .files()
                .into_iter()
                .filter(|file| self.working.is_hidden(*file) && !self.staging.has_entry(*file)),
        );

        let mut staged = Vec::new();
        for file in candidates {
            match self.stage_file(file) {
                Ok(file) => staged.push(file),
                Err(e) if e.is_recoverable() => debug!(%file, reason = %e, "skipped file"),
                Err(e) => warn!(%file, error = %e, "failed to stage file"),
            }
        }
        info!(count = staged.len(), "staged all files");
        staged
    }

    /// Remove a file from the staging area.
    ///
    /// Fails if nothing is staged for the file.
    #[instrument(skip(self))]
    pub fn unstage_file(&mut self, file: FileId) -> StorageResult<FileId> {
        self.staging.unstage(file, &mut self.working, &self.store)?;
        info!(%file, "file unstaged");
        Ok(file)
    }

    // ==================== Commit Operations ====================

    /// Create a commit from the staging area.
    ///
    /// The new tree is the head tree with the staged snapshots laid over it
    /// and staged deletions removed; untouched files keep their snapshot
    /// identity. An empty staging area yields a commit identical to its
    /// parent.
    #[instrument(skip(self))]
    pub fn create_commit(&mut self) -> StorageResult<CommitId> {
        let mut mutator = TreeMutator::from_tree(self.head_tree());
        for (file, blob) in self.staging.tree().iter() {
            mutator.upsert(file, blob);
        }
        for file in self.staging.deletions() {
            mutator.delete(*file);
        }

        let id = CommitId::new(self.commits.len());
        let commit = CommitBuilder::new(id)
            .tree(mutator.freeze())
            .parent(self.head)
            .build()?;

        info!(
            commit = %commit.checksum().short(),
            staged = self.staging.len(),
            "commit created"
        );

        self.commits.push(commit);
        self.head = Some(id);
        self.staging.clear();
        Ok(id)
    }

    /// Restore the working directory to the content of `target`.
    ///
    /// Every file touched by the commits from `head` back to `target`
    /// (inclusive) gets the snapshot it has in `target`; files `target`
    /// does not contain are removed and hidden. Anything staged for a
    /// restored file is dropped, so the restored content is what shows and
    /// what can be staged next. History and `head` stay as they are.
    /// Fails if `target` is not an ancestor of `head`.
    #[instrument(skip(self))]
    pub fn revert_commit(&mut self, target: CommitId) -> StorageResult<CommitId> {
        let span = commit::span_to_ancestor(&self.commits, self.head, target)?;

        let mut touched = BTreeSet::new();
        for commit in &span {
            touched.extend(commit.tree().files());
        }

        let target_tree = self.commit(target)?.tree().clone();
        let restored: Vec<(FileId, Option<_>)> = touched
            .into_iter()
            .map(|file| (file, target_tree.get(file)))
            .collect();

        for (file, blob) in &restored {
            if self.staging.discard(*file) {
                debug!(%file, "dropped staged entry of restored file");
            }
            self.working.restore(*file, *blob);
        }

        info!(commit = %target, files = restored.len(), "working directory restored");
        Ok(target)
    }

    // ==================== Lookups ====================

    /// The most recent commit.
    pub fn head(&self) -> Option<CommitId> {
        self.head
    }

    pub fn head_commit(&self) -> Option<&Commit> {
        self.head.and_then(|id| self.commits.get(id.index()))
    }

    pub fn head_tree(&self) -> Option<&TreeHandle> {
        self.head_commit().map(Commit::tree)
    }

    /// Get a commit.
    pub fn commit(&self, id: CommitId) -> StorageResult<&Commit> {
        self.commits
            .get(id.index())
            .ok_or_else(|| StorageError::CommitNotFound(id.to_string()))
    }

    /// All commits, oldest first.
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Commits from `head` back to the root.
    pub fn history(&self) -> History<'_> {
        History::new(&self.commits, self.head)
    }

    /// Find a commit by (abbreviated) checksum.
    pub fn find_commit(&self, checksum: &str) -> StorageResult<CommitId> {
        let mut matches = self.commits.iter().filter(|c| c.checksum().matches(checksum));
        match (matches.next(), matches.next()) {
            (Some(commit), None) => Ok(commit.id()),
            (Some(_), Some(_)) => Err(StorageError::CommitNotFound(format!(
                "{} (ambiguous checksum)",
                checksum
            ))),
            _ => Err(StorageError::CommitNotFound(checksum.to_string())),
        }
    }

    pub fn file(&self, id: FileId) -> Option<&File> {
        self.files.get(id)
    }

    /// Resolve a file by name or 1-based number.
    pub fn find_file(&self, reference: &str) -> StorageResult<FileId> {
        self.files
            .resolve(reference)
            .ok_or_else(|| StorageError::UnknownFile(reference.to_string()))
    }

    pub fn files(&self) -> &FileRegistry {
        &self.files
    }

    pub fn working_directory(&self) -> &WorkingDirectory {
        &self.working
    }

    pub fn staging_area(&self) -> &StagingArea {
        &self.staging
    }

    /// Read a snapshot.
    pub fn blob(&self, id: BlobId) -> StorageResult<&Blob> {
        self.store.read(id)
    }

    /// The next commit's content: staged entries over the head tree.
    pub fn index(&self) -> Overlay<'_> {
        self.staging.overlay(self.head_tree())
    }

    // ==================== Queries ====================

    fn entry(
        &self,
        file: FileId,
        tree: &impl TreeView,
        reference: &impl TreeView,
    ) -> StorageResult<FileEntry> {
        let resolved = StatusResolver::resolve(file, tree, reference, &self.store)?;
        Ok(FileEntry {
            file,
            name: self.files.name_of(file),
            status: resolved.status,
            stats: resolved.stats,
        })
    }

    /// Status of one working directory file relative to the last commit.
    pub fn working_status(&self, file: FileId) -> ChangeStatus {
        StatusResolver::status(file, self.working.tree(), &self.head_tree())
    }

    /// Visible working directory files, compared with what the next commit
    /// would contain.
    pub fn working_directory_entries(&self) -> StorageResult<Vec<FileEntry>> {
        let index = self.index();
        self.working
            .visible_files()
            .into_iter()
            .map(|file| self.entry(file, self.working.tree(), &index))
            .collect()
    }

    /// Staged files compared with the last commit.
    pub fn staging_area_entries(&self) -> StorageResult<Vec<FileEntry>> {
        let head = self.head_tree();
        let mut entries = self
            .staging
            .tree()
            .files()
            .into_iter()
            .map(|file| self.entry(file, self.staging.tree(), &head))
            .collect::<StorageResult<Vec<_>>>()?;

        entries.extend(self.staging.deletions().iter().map(|file| FileEntry {
            file: *file,
            name: self.files.name_of(*file),
            status: ChangeStatus::Deleted,
            stats: DiffStats::ZERO,
        }));
        entries.sort_by_key(|entry| entry.file);
        Ok(entries)
    }

    /// Files of a commit compared with its parent, including the ones the
    /// commit deleted.
    pub fn commit_entries(&self, id: CommitId) -> StorageResult<Vec<FileEntry>> {
        let commit = self.commit(id)?;
        let parent = match commit.parent() {
            Some(parent) => Some(self.commit(parent)?.tree()),
            None => None,
        };

        StatusResolver::files_in_either(commit.tree(), &parent)
            .into_iter()
            .map(|file| self.entry(file, commit.tree(), &parent))
            .collect()
    }

    /// A summary of one commit.
    pub fn commit_summary(&self, id: CommitId) -> StorageResult<CommitSummary> {
        let commit = self.commit(id)?;
        Ok(CommitSummary {
            id,
            checksum: commit.checksum().short(),
            parent: commit.parent(),
            created_at: commit.created_at(),
            is_head: self.head == Some(id),
            files: self.commit_entries(id)?,
        })
    }

    /// Everything a renderer needs, resolved now.
    pub fn snapshot(&self) -> StorageResult<RepositorySnapshot> {
        Ok(RepositorySnapshot {
            working_directory: self.working_directory_entries()?,
            staging_area: self.staging_area_entries()?,
            commits: self
                .commits
                .iter()
                .map(|c| self.commit_summary(c.id()))
                .collect::<StorageResult<Vec<_>>>()?,
            head: self.head,
        })
    }

    /// Get statistics about the repository.
    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            files: self.files.len(),
            visible_files: self.working.visible_files().len(),
            staged_files: self.staging.len(),
            commits: self.commits.len(),
            blobs: self.store.len(),
        }
    }
}

/// One file as shown in an area or a commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub file: FileId,
    pub name: String,
    pub status: ChangeStatus,
    pub stats: DiffStats,
}

/// One commit with its files resolved against its parent.
#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub id: CommitId,
    pub checksum: String,
    pub parent: Option<CommitId>,
    pub created_at: DateTime<Utc>,
    pub is_head: bool,
    pub files: Vec<FileEntry>,
}

/// The resolved state of all three areas.
#[derive(Debug, Clone, Serialize)]
pub struct RepositorySnapshot {
    pub working_directory: Vec<FileEntry>,
    pub staging_area: Vec<FileEntry>,
    pub commits: Vec<CommitSummary>,
    pub head: Option<CommitId>,
}

/// Statistics about the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryStats {
    pub files: usize,
    pub visible_files: usize,
    pub staged_files: usize,
    pub commits: usize,
    pub blobs: usize,
}

impl std::fmt::Display for RepositoryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Repository Statistics:")?;
        writeln!(f, "  Files: {} ({} visible)", self.files, self.visible_files)?;
        writeln!(f, "  Staged: {}", self.staged_files)?;
        writeln!(f, "  Commits: {}", self.commits)?;
        writeln!(f, "  Snapshots: {}", self.blobs)
    }
}
