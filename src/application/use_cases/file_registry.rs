use std::collections::HashSet;

use parking_lot::RwLock;

use crate::domain::entities::FileRecord;
use crate::domain::value_objects::FileId;

#[derive(Default)]
struct RegistryState {
    mine: Vec<FileRecord>,
    shared: Vec<FileRecord>,
    /// Ids this session deleted, so a repeated delete can be recognised
    removed: HashSet<FileId>,
}

/// Local bookkeeping of the caller's "my files" and "shared with me" views.
///
/// Fed from pipeline results and catalog listings; never talks to the
/// transport itself.
#[derive(Default)]
pub struct FileRegistry {
    state: RwLock<RegistryState>,
}

impl FileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_mine(&self) -> Vec<FileRecord> {
        self.state.read().mine.clone()
    }

    pub fn list_shared_with_me(&self) -> Vec<FileRecord> {
        self.state.read().shared.clone()
    }

    /// Add an owned record, replacing any record with the same id
    pub fn add(&self, record: FileRecord) {
        let mut state = self.state.write();
        state.removed.remove(record.id());
        match state.mine.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => state.mine.push(record),
        }
    }

    /// Drop an owned record; no-op for unknown ids
    pub fn remove(&self, file_id: &FileId) -> Option<FileRecord> {
        let mut state = self.state.write();
        let index = state.mine.iter().position(|r| r.id() == file_id)?;
        Some(state.mine.remove(index))
    }

    /// Drop an owned record and remember that this session deleted it
    pub fn record_deletion(&self, file_id: &FileId) -> Option<FileRecord> {
        let removed = self.remove(file_id);
        self.state.write().removed.insert(file_id.clone());
        removed
    }

    pub fn was_deleted(&self, file_id: &FileId) -> bool {
        self.state.read().removed.contains(file_id)
    }

    pub fn contains_mine(&self, file_id: &FileId) -> bool {
        self.state.read().mine.iter().any(|r| r.id() == file_id)
    }

    pub fn replace_mine(&self, records: Vec<FileRecord>) {
        self.state.write().mine = records;
    }

    pub fn replace_shared(&self, records: Vec<FileRecord>) {
        self.state.write().shared = records;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Address, PublicKey};
    use chrono::Utc;

    fn record(id: &str, size: u64) -> FileRecord {
        let owner = Address::from_public_key(&PublicKey::from_bytes([1u8; 32]));
        FileRecord::new(FileId::new(id).unwrap(), owner, size, Utc::now())
    }

    #[test]
    fn test_add_replaces_same_id() {
        let registry = FileRegistry::new();
        registry.add(record("a", 1));
        registry.add(record("a", 2));
        registry.add(record("b", 3));

        let mine = registry.list_mine();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].size(), 2);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let registry = FileRegistry::new();
        registry.add(record("a", 1));

        assert!(registry.remove(&FileId::new("zzz").unwrap()).is_none());
        assert_eq!(registry.list_mine().len(), 1);
        assert!(!registry.was_deleted(&FileId::new("zzz").unwrap()));
    }

    #[test]
    fn test_record_deletion_leaves_tombstone_until_re_added() {
        let registry = FileRegistry::new();
        let id = FileId::new("a").unwrap();
        registry.add(record("a", 1));

        assert!(registry.record_deletion(&id).is_some());
        assert!(!registry.contains_mine(&id));
        assert!(registry.was_deleted(&id));

        registry.add(record("a", 1));
        assert!(!registry.was_deleted(&id));
    }

    #[test]
    fn test_shared_view_is_independent() {
        let registry = FileRegistry::new();
        registry.replace_shared(vec![record("s", 5)]);

        assert!(registry.list_mine().is_empty());
        assert_eq!(registry.list_shared_with_me().len(), 1);
    }
}
