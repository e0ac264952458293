//! File identities.
//!
//! A file's identity outlives every snapshot of its content. Deleting a
//! file only removes it from a tree; the registry keeps the identity (and
//! its name) for the whole session.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::storage::types::FileId;

/// a logical file the learner created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct File {
    pub id: FileId,
    pub name: String,
}

/// All files ever created in one repository.
#[derive(Debug, Default, Clone)]
pub struct FileRegistry {
    files: BTreeMap<FileId, File>,
}

impl FileRegistry {
    /// prefix of generated file names
    pub const DEFAULT_PREFIX: &'static str = "file";

    pub fn new() -> Self {
        Self::default()
    }

    /// register a new file, generating `file{n}` when no name is given
    pub fn create(&mut self, name: Option<String>) -> File {
        let id = FileId::new(self.files.len() as u32);
        let name = match name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("{}{}", Self::DEFAULT_PREFIX, id.number()),
        };
        let file = File { id, name };
        self.files.insert(id, file.clone());
        file
    }

    pub fn get(&self, id: FileId) -> Option<&File> {
        self.files.get(&id)
    }

    pub fn contains(&self, id: FileId) -> bool {
        self.files.contains_key(&id)
    }

    /// display name, falling back to the id for unknown files
    pub fn name_of(&self, id: FileId) -> String {
        self.files
            .get(&id)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    /// Resolve a learner-supplied reference: a file name, or its 1-based
    /// number (optionally written as `#n`).
    pub fn resolve(&self, reference: &str) -> Option<FileId> {
        let reference = reference.trim();
        if let Some(file) = self.files.values().find(|f| f.name == reference) {
            return Some(file.id);
        }

        let number: u32 = reference.trim_start_matches('#').parse().ok()?;
        let id = FileId::new(number.checked_sub(1)?);
        self.contains(id).then_some(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &File> {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_names() {
        let mut registry = FileRegistry::new();
        let a = registry.create(None);
        let b = registry.create(Some("  ".to_string()));
        assert_eq!(a.name, "file1");
        assert_eq!(b.name, "file2");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_resolve_by_name_and_number() {
        let mut registry = FileRegistry::new();
        let readme = registry.create(Some("README.md".to_string()));
        let other = registry.create(None);

        assert_eq!(registry.resolve("README.md"), Some(readme.id));
        assert_eq!(registry.resolve("2"), Some(other.id));
        assert_eq!(registry.resolve("#1"), Some(readme.id));
        assert_eq!(registry.resolve("0"), None);
        assert_eq!(registry.resolve("3"), None);
        assert_eq!(registry.resolve("missing"), None);
    }

    #[test]
    fn test_name_of_unknown_file() {
        let registry = FileRegistry::new();
        assert_eq!(registry.name_of(FileId::new(6)), "#7");
    }
}
