use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::diff::Diff;
use crate::models::resume::VersionRecord;
use crate::versioning::store::{StoreError, VersionStore};

#[derive(Default)]
struct ThreadEntry {
    current_state: Option<Value>,
    versions: Vec<VersionRecord>,
}

impl ThreadEntry {
    fn push(&mut self, thread_id: Uuid, diff: Value, title: &str) -> VersionRecord {
        let seq = self.versions.last().map_or(1, |v| v.seq + 1);
        let record = VersionRecord {
            id: Uuid::new_v4(),
            thread_id,
            seq,
            diff,
            title: title.to_string(),
            created_at: Utc::now(),
        };
        self.versions.push(record.clone());
        record
    }
}

/// In-memory version store for tests and local development.
#[derive(Default)]
pub struct MemoryVersionStore {
    threads: RwLock<HashMap<Uuid, ThreadEntry>>,
}

impl MemoryVersionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record with an arbitrary stored diff payload.
    #[cfg(test)]
    pub async fn push_raw(&self, thread_id: Uuid, diff: Value, title: &str) -> VersionRecord {
        let mut threads = self.threads.write().await;
        threads.entry(thread_id).or_default().push(thread_id, diff, title)
    }
}

#[async_trait]
impl VersionStore for MemoryVersionStore {
    async fn load_versions_for_thread(
        &self,
        thread_id: Uuid,
    ) -> Result<Vec<VersionRecord>, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads
            .get(&thread_id)
            .map(|t| t.versions.clone())
            .unwrap_or_default())
    }

    async fn append_version(
        &self,
        thread_id: Uuid,
        diff: &Diff,
        title: &str,
    ) -> Result<VersionRecord, StoreError> {
        let diff = diff.to_value()?;
        let mut threads = self.threads.write().await;
        Ok(threads.entry(thread_id).or_default().push(thread_id, diff, title))
    }

    async fn load_current_state(&self, thread_id: Uuid) -> Result<Option<Value>, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(&thread_id).and_then(|t| t.current_state.clone()))
    }

    async fn update_current_state(
        &self,
        thread_id: Uuid,
        state: &Value,
    ) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        threads.entry(thread_id).or_default().current_state = Some(state.clone());
        Ok(())
    }

    async fn commit(
        &self,
        thread_id: Uuid,
        diff: &Diff,
        title: &str,
        new_state: &Value,
    ) -> Result<VersionRecord, StoreError> {
        let diff = diff.to_value()?;
        // One write guard for both the append and the state update.
        let mut threads = self.threads.write().await;
        let entry = threads.entry(thread_id).or_default();
        let record = entry.push(thread_id, diff, title);
        entry.current_state = Some(new_state.clone());
        Ok(record)
    }
}
