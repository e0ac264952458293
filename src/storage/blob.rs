//!  Blob snapshots and the blob store.
//!
//! A blob is one immutable snapshot of a file's content. The toy model
//! does not keep real content, only the cumulative number of inserted
//! and deleted lines, plus the snapshot it was derived from.
//!
//! Blobs are written once into the [`BlobStore`] and referenced from trees
//! by [`BlobId`]. Nothing ever rewrites a stored blob: "changing" a file
//! always writes a new snapshot.

use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::types::{BlobId, DiffStats, FileId};

/// an immutable content snapshot of one file
#[derive(Debug, Clone, Serialize)]
pub struct Blob {
    id: BlobId,
    file: FileId,
    insertions: u32,
    deletions: u32,
    previous: Option<BlobId>,
}

impl Blob {
    pub fn id(&self) -> BlobId {
        self.id
    }

    /// the file this snapshot belongs to
    pub fn file(&self) -> FileId {
        self.file
    }

    /// cumulative inserted lines
    pub fn insertions(&self) -> u32 {
        self.insertions
    }

    /// cumulative deleted lines
    pub fn deletions(&self) -> u32 {
        self.deletions
    }

    /// the snapshot this one was derived from
    pub fn previous(&self) -> Option<BlobId> {
        self.previous
    }

    pub fn counters(&self) -> DiffStats {
        DiffStats::new(self.insertions, self.deletions)
    }

    /// the delta between the cumulative counters of two snapshots
    pub fn delta(&self, other: &Blob) -> DiffStats {
        DiffStats::new(
            self.insertions.abs_diff(other.insertions),
            self.deletions.abs_diff(other.deletions),
        )
    }
}

/// Blob equality is snapshot identity, never structural.
impl PartialEq for Blob {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Blob {}

/// a change applied to a file in the working directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modification {
    pub insertions: i32,
    pub deletions: i32,
}

impl Modification {
    pub fn new(insertions: i32, deletions: i32) -> Self {
        Self {
            insertions,
            deletions,
        }
    }

    /// Draw a random modification: at least one inserted line and up to
    /// `max_deletions` deleted ones.
    pub fn random<R: Rng + ?Sized>(rng: &mut R, max_insertions: u32, max_deletions: u32) -> Self {
        let max_insertions = max_insertions.clamp(1, i32::MAX as u32) as i32;
        let max_deletions = max_deletions.min(i32::MAX as u32) as i32;
        Self {
            insertions: rng.gen_range(1..=max_insertions),
            deletions: rng.gen_range(0..=max_deletions),
        }
    }

    /// apply to cumulative counters; each running total is clamped at zero
    pub fn apply(&self, counters: DiffStats) -> DiffStats {
        DiffStats::new(
            clamp_add(counters.insertions, self.insertions),
            clamp_add(counters.deletions, self.deletions),
        )
    }
}

/// `+3 -1` for plain edits; signed counts once either delta is negative
impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.insertions >= 0 && self.deletions >= 0 {
            write!(f, "+{} -{}", self.insertions, self.deletions)
        } else {
            write!(f, "{:+} inserted, {:+} deleted", self.insertions, self.deletions)
        }
    }
}

fn clamp_add(current: u32, delta: i32) -> u32 {
    (i64::from(current) + i64::from(delta)).clamp(0, i64::from(u32::MAX)) as u32
}

/// Append-only storage for every snapshot created in a session.
#[derive(Debug, Default, Clone)]
pub struct BlobStore {
    blobs: HashMap<BlobId, Blob>,
    next_id: u64,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&mut self, file: FileId, counters: DiffStats, previous: Option<BlobId>) -> BlobId {
        let id = BlobId::new(self.next_id);
        self.next_id += 1;
        self.blobs.insert(
            id,
            Blob {
                id,
                file,
                insertions: counters.insertions,
                deletions: counters.deletions,
                previous,
            },
        );
        id
    }

    /// the empty first snapshot of a newly added file
    pub fn write_initial(&mut self, file: FileId) -> BlobId {
        self.write(file, DiffStats::ZERO, None)
    }

    /// a new snapshot derived from `previous` with `modification` applied
    pub fn write_modified(&mut self, previous: BlobId, modification: Modification) -> StorageResult<BlobId> {
        let source = self.read(previous)?;
        let file = source.file;
        let counters = modification.apply(source.counters());
        Ok(self.write(file, counters, Some(previous)))
    }

    /// a fresh snapshot with the same counters as `source`, derived from it
    pub fn write_copy(&mut self, source: BlobId) -> StorageResult<BlobId> {
        let blob = self.read(source)?;
        let (file, counters) = (blob.file, blob.counters());
        Ok(self.write(file, counters, Some(source)))
    }

    /// read a snapshot
    pub fn read(&self, id: BlobId) -> StorageResult<&Blob> {
        self.blobs.get(&id).ok_or(StorageError::BlobNotFound(id))
    }

    pub fn contains(&self, id: BlobId) -> bool {
        self.blobs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_initial_blob() {
        let mut store = BlobStore::new();
        let id = store.write_initial(FileId::new(0));
        let blob = store.read(id).unwrap();
        assert_eq!(blob.counters(), DiffStats::ZERO);
        assert_eq!(blob.previous(), None);
        assert_eq!(blob.file(), FileId::new(0));
    }

    #[test]
    fn test_modifications_accumulate() {
        let mut store = BlobStore::new();
        let v0 = store.write_initial(FileId::new(0));
        let v1 = store.write_modified(v0, Modification::new(3, 1)).unwrap();
        let v2 = store.write_modified(v1, Modification::new(2, 0)).unwrap();

        let blob = store.read(v2).unwrap();
        assert_eq!(blob.counters(), DiffStats::new(5, 1));
        assert_eq!(blob.previous(), Some(v1));
        // earlier snapshots are untouched
        assert_eq!(store.read(v1).unwrap().counters(), DiffStats::new(3, 1));
    }

    #[test]
    fn test_negative_delta_is_clamped() {
        let mut store = BlobStore::new();
        let v0 = store.write_initial(FileId::new(0));
        let v1 = store.write_modified(v0, Modification::new(2, 1)).unwrap();
        let v2 = store.write_modified(v1, Modification::new(-5, -1)).unwrap();
        assert_eq!(store.read(v2).unwrap().counters(), DiffStats::new(0, 0));
    }

    #[test]
    fn test_copy_is_a_new_identity() {
        let mut store = BlobStore::new();
        let v0 = store.write_initial(FileId::new(0));
        let v1 = store.write_modified(v0, Modification::new(4, 2)).unwrap();
        let copy = store.write_copy(v1).unwrap();

        let original = store.read(v1).unwrap().clone();
        let copied = store.read(copy).unwrap();
        assert_ne!(&original, copied);
        assert_eq!(original.counters(), copied.counters());
        assert_eq!(copied.previous(), Some(v1));
    }

    #[test]
    fn test_delta_is_absolute() {
        let mut store = BlobStore::new();
        let v0 = store.write_initial(FileId::new(0));
        let v1 = store.write_modified(v0, Modification::new(4, 2)).unwrap();
        let a = store.read(v0).unwrap();
        let b = store.read(v1).unwrap();
        assert_eq!(a.delta(b), DiffStats::new(4, 2));
        assert_eq!(b.delta(a), DiffStats::new(4, 2));
    }

    #[test]
    fn test_missing_blob() {
        let store = BlobStore::new();
        let result = store.read(BlobId::new(42));
        assert!(matches!(result, Err(StorageError::BlobNotFound(_))));
    }

    #[test]
    fn test_modification_display() {
        assert_eq!(Modification::new(3, 1).to_string(), "+3 -1");
        assert_eq!(Modification::new(0, 0).to_string(), "+0 -0");
        assert_eq!(Modification::new(-3, 1).to_string(), "-3 inserted, +1 deleted");
    }

    #[test]
    fn test_random_modification_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let m = Modification::random(&mut rng, 10, 5);
            assert!((1..=10).contains(&m.insertions));
            assert!((0..=5).contains(&m.deletions));
        }
    }

    #[test]
    fn test_random_modification_is_seeded() {
        let a = Modification::random(&mut StdRng::seed_from_u64(1), 10, 5);
        let b = Modification::random(&mut StdRng::seed_from_u64(1), 10, 5);
        assert_eq!(a, b);
    }
}
