//!  Commit creation and history traversal
//!
//! commits are the only way content reaches the repository:
//! - each commit freezes a tree built from its parent plus the staged changes
//! - commits form a single linear chain through their parent links
//! - the parent link is an index into the repository's commit sequence,
//!   never an owning pointer
//!
//! this module handles commit construction and walking the history

use chrono::{DateTime, Utc};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::tree::TreeHandle;
use crate::storage::types::{Checksum, CommitId};

/// an immutable commit
#[derive(Debug, Clone)]
pub struct Commit {
    id: CommitId,
    checksum: Checksum,
    parent: Option<CommitId>,
    tree: TreeHandle,
    created_at: DateTime<Utc>,
}

impl Commit {
    pub fn id(&self) -> CommitId {
        self.id
    }

    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    /// the previous commit, `None` for the root commit
    pub fn parent(&self) -> Option<CommitId> {
        self.parent
    }

    pub fn tree(&self) -> &TreeHandle {
        &self.tree
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// check if this is the first commit of the history
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// builder for creating commits with a fluent interface
pub struct CommitBuilder {
    id: CommitId,
    tree: Option<TreeHandle>,
    parent: Option<CommitId>,
    created_at: Option<DateTime<Utc>>,
}

impl CommitBuilder {
    /// create a new CommitBuilder for the commit at position `id`
    pub fn new(id: CommitId) -> Self {
        Self {
            id,
            tree: None,
            parent: None,
            created_at: None,
        }
    }

    /// set the frozen tree for this commit
    pub fn tree(mut self, tree: TreeHandle) -> Self {
        self.tree = Some(tree);
        self
    }

    /// set the parent commit (none for the root)
    pub fn parent(mut self, parent: Option<CommitId>) -> Self {
        self.parent = parent;
        self
    }

    /// override the creation time
    pub fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// create the commit
    pub fn build(self) -> StorageResult<Commit> {
        let tree = self
            .tree
            .ok_or_else(|| StorageError::Internal("commit requires a tree".to_string()))?;

        if let Some(parent) = self.parent {
            if parent >= self.id {
                return Err(StorageError::Internal(format!(
                    "commit {} cannot have parent {}",
                    self.id, parent
                )));
            }
        }

        Ok(Commit {
            id: self.id,
            checksum: Checksum::generate(),
            parent: self.parent,
            tree,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Iterator over a commit and its ancestors, newest first.
pub struct History<'a> {
    commits: &'a [Commit],
    next: Option<CommitId>,
}

impl<'a> History<'a> {
    pub(crate) fn new(commits: &'a [Commit], start: Option<CommitId>) -> Self {
        Self {
            commits,
            next: start,
        }
    }
}

impl<'a> Iterator for History<'a> {
    type Item = &'a Commit;

    fn next(&mut self) -> Option<Self::Item> {
        let commit = self.commits.get(self.next?.index())?;
        self.next = commit.parent();
        Some(commit)
    }
}

/// Collect the commits from `head` back to `target`, inclusive.
///
/// Fails if `target` is not `head` or one of its ancestors.
pub fn span_to_ancestor(
    commits: &[Commit],
    head: Option<CommitId>,
    target: CommitId,
) -> StorageResult<Vec<&Commit>> {
    let mut span = Vec::new();
    for commit in History::new(commits, head) {
        span.push(commit);
        if commit.id() == target {
            return Ok(span);
        }
    }
    Err(StorageError::CommitNotFound(target.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tree::TreeMutator;

    fn chain(n: usize) -> Vec<Commit> {
        (0..n)
            .map(|i| {
                CommitBuilder::new(CommitId::new(i))
                    .tree(TreeMutator::from_tree(None).freeze())
                    .parent(i.checked_sub(1).map(CommitId::new))
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_builder_requires_tree() {
        let result = CommitBuilder::new(CommitId::new(0)).build();
        assert!(matches!(result, Err(StorageError::Internal(_))));
    }

    #[test]
    fn test_builder_rejects_forward_parent() {
        let result = CommitBuilder::new(CommitId::new(0))
            .tree(TreeHandle::default())
            .parent(Some(CommitId::new(3)))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_root_commit() {
        let commits = chain(1);
        assert!(commits[0].is_root());
        assert_eq!(commits[0].id(), CommitId::new(0));
    }

    #[test]
    fn test_history_walks_to_root() {
        let commits = chain(3);
        let ids: Vec<usize> = History::new(&commits, Some(CommitId::new(2)))
            .map(|c| c.id().index())
            .collect();
        assert_eq!(ids, vec![2, 1, 0]);

        assert_eq!(History::new(&commits, None).count(), 0);
    }

    #[test]
    fn test_span_to_ancestor() {
        let commits = chain(4);
        let span = span_to_ancestor(&commits, Some(CommitId::new(3)), CommitId::new(1)).unwrap();
        let ids: Vec<usize> = span.iter().map(|c| c.id().index()).collect();
        assert_eq!(ids, vec![3, 2, 1]);

        let head_only = span_to_ancestor(&commits, Some(CommitId::new(3)), CommitId::new(3)).unwrap();
        assert_eq!(head_only.len(), 1);
    }

    #[test]
    fn test_span_to_non_ancestor_fails() {
        let commits = chain(3);
        let result = span_to_ancestor(&commits, Some(CommitId::new(1)), CommitId::new(2));
        assert!(matches!(result, Err(StorageError::CommitNotFound(_))));

        let result = span_to_ancestor(&commits, None, CommitId::new(0));
        assert!(matches!(result, Err(StorageError::CommitNotFound(_))));
    }
}
