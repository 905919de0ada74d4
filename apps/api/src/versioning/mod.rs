// Resume version history.
// Every committed edit is stored as a structural diff in an append-only log
// per thread; any version is rebuilt by replaying the log from `{}`.
// Only the workflow appends to the log.

pub mod handlers;
pub mod memory_store;
pub mod pg_store;
pub mod store;
pub mod workflow;

use thiserror::Error;
use uuid::Uuid;

pub use memory_store::MemoryVersionStore;
pub use pg_store::PgVersionStore;
pub use store::{StoreError, VersionStore};
pub use workflow::{RevertOutcome, SaveOutcome, VersioningWorkflow};

#[derive(Debug, Error)]
pub enum VersioningError {
    /// The thread has no versions, or the version is not in its chain.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A record in the replay chain is missing or its diff cannot be decoded.
    #[error("Corrupt version chain at version {seq} ({version_id}): {reason}")]
    CorruptChain {
        version_id: Uuid,
        seq: i64,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
