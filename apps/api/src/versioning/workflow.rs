//! Save, preview and revert over a thread's version chain.
//!
//! Invariant: folding `apply_diff` over a thread's records in `seq` order,
//! starting from `{}`, yields the state saved as the last folded record.
//! Saves and reverts are the only code paths that append to the log.
//!
//! Known limitation: two concurrent saves on one thread both diff against the
//! state they read; the store serializes the appends but the later commit
//! wins the current state.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::diff::{apply_diff, apply_diffs, create_diff, Diff};
use crate::models::resume::{VersionRecord, VersionSummary};
use crate::models::sections::parse_document;
use crate::versioning::store::VersionStore;
use crate::versioning::VersioningError;

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved(VersionRecord),
    /// The new state equals the current one; nothing was written.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevertOutcome {
    /// The reconstructed state, now the thread's current state.
    pub state: Value,
    /// `None` when the thread already was at that state.
    pub record: Option<VersionRecord>,
}

#[derive(Clone)]
pub struct VersioningWorkflow {
    store: Arc<dyn VersionStore>,
}

impl VersioningWorkflow {
    pub fn new(store: Arc<dyn VersionStore>) -> Self {
        Self { store }
    }

    /// Denormalized current state. `NotFound` for a thread never saved.
    pub async fn current_state(&self, thread_id: Uuid) -> Result<Value, VersioningError> {
        self.store
            .load_current_state(thread_id)
            .await?
            .ok_or_else(|| VersioningError::NotFound(format!("Thread {thread_id} not found")))
    }

    /// Records `new_state` as the next version of the thread.
    ///
    /// A thread that has never been saved starts from `{}`.
    pub async fn save_version(
        &self,
        thread_id: Uuid,
        new_state: Value,
        title: &str,
    ) -> Result<SaveOutcome, VersioningError> {
        let title = validate_title(title)?;
        parse_document(&new_state).map_err(|e| {
            VersioningError::InvalidInput(format!("state is not a resume document: {e}"))
        })?;

        let current = self
            .store
            .load_current_state(thread_id)
            .await?
            .unwrap_or_else(|| json!({}));

        self.commit_if_changed(thread_id, &current, &new_state, title)
            .await
    }

    /// Rebuilds the state as of `version_id` without writing anything.
    pub async fn reconstruct_at_version(
        &self,
        thread_id: Uuid,
        version_id: Uuid,
    ) -> Result<Value, VersioningError> {
        let (state, _) = self.replay_to(thread_id, version_id).await?;
        Ok(state)
    }

    /// Makes the state of `version_id` current again by committing a new
    /// forward version. History is never truncated.
    pub async fn revert_to_version(
        &self,
        thread_id: Uuid,
        version_id: Uuid,
    ) -> Result<RevertOutcome, VersioningError> {
        let (target_state, target) = self.replay_to(thread_id, version_id).await?;

        let current = self
            .store
            .load_current_state(thread_id)
            .await?
            .unwrap_or_else(|| json!({}));

        let title = format!("Reverted to version {}", target.seq);
        let record = match self
            .commit_if_changed(thread_id, &current, &target_state, &title)
            .await?
        {
            SaveOutcome::Saved(record) => Some(record),
            SaveOutcome::Skipped => None,
        };

        Ok(RevertOutcome {
            state: target_state,
            record,
        })
    }

    /// Version list for the history view, oldest first.
    pub async fn history(&self, thread_id: Uuid) -> Result<Vec<VersionSummary>, VersioningError> {
        let records = self.store.load_versions_for_thread(thread_id).await?;
        Ok(records.iter().map(VersionSummary::from).collect())
    }

    async fn commit_if_changed(
        &self,
        thread_id: Uuid,
        current: &Value,
        target: &Value,
        title: &str,
    ) -> Result<SaveOutcome, VersioningError> {
        let diff = create_diff(current, target);
        if diff.is_empty() {
            info!("No changes for thread {thread_id}, skipping version '{title}'");
            return Ok(SaveOutcome::Skipped);
        }

        // Current state is stored as `target` directly.
        debug_assert_eq!(&apply_diff(current, &diff), target);
        let record = self.store.commit(thread_id, &diff, title, target).await?;
        info!(
            "Saved version {} '{}' for thread {thread_id} ({} top-level changes)",
            record.seq,
            record.title,
            diff.len()
        );
        Ok(SaveOutcome::Saved(record))
    }

    async fn replay_to(
        &self,
        thread_id: Uuid,
        version_id: Uuid,
    ) -> Result<(Value, VersionRecord), VersioningError> {
        let records = self.store.load_versions_for_thread(thread_id).await?;
        if records.is_empty() {
            return Err(VersioningError::NotFound(format!(
                "Thread {thread_id} has no versions"
            )));
        }

        let target = records
            .iter()
            .position(|r| r.id == version_id)
            .ok_or_else(|| {
                VersioningError::NotFound(format!(
                    "Version {version_id} not found in thread {thread_id}"
                ))
            })?;

        let chain = &records[..=target];
        let diffs = decode_chain(chain).map_err(|e| {
            error!("Replay of thread {thread_id} failed: {e}");
            e
        })?;

        let state = apply_diffs(&json!({}), &diffs);
        Ok((state, records[target].clone()))
    }
}

/// Decodes every diff of a chain that must start at seq 1 with no gaps.
fn decode_chain(chain: &[VersionRecord]) -> Result<Vec<Diff>, VersioningError> {
    chain
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let expected = index as i64 + 1;
            if record.seq != expected {
                return Err(VersioningError::CorruptChain {
                    version_id: record.id,
                    seq: record.seq,
                    reason: format!("expected version {expected}, found {}", record.seq),
                });
            }
            Diff::from_value(&record.diff).map_err(|e| VersioningError::CorruptChain {
                version_id: record.id,
                seq: record.seq,
                reason: e.to_string(),
            })
        })
        .collect()
}

fn validate_title(title: &str) -> Result<&str, VersioningError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(VersioningError::InvalidInput(
            "title cannot be empty".to_string(),
        ));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(VersioningError::InvalidInput(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(title)
}
