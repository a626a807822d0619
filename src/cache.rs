//! Last-seen copies of cluster records for display consumers.
//!
//! The store stays authoritative: status always reads it and refreshes the
//! entry, writers update or drop entries they touch.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::models::ClusterRecord;

pub trait RecordCache: Send + Sync {
    fn get(&self, id: &str) -> Option<ClusterRecord>;
    fn put(&self, record: ClusterRecord);
    fn invalidate(&self, id: &str);
}

#[derive(Default)]
pub struct InMemoryRecordCache {
    entries: RwLock<HashMap<String, ClusterRecord>>,
}

impl InMemoryRecordCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordCache for InMemoryRecordCache {
    fn get(&self, id: &str) -> Option<ClusterRecord> {
        self.entries.read().get(id).cloned()
    }

    fn put(&self, record: ClusterRecord) {
        self.entries.write().insert(record.id.clone(), record);
    }

    fn invalidate(&self, id: &str) {
        self.entries.write().remove(id);
    }
}
