// Resume documents around the version chain: upload ingestion, unsaved-change
// detection for editors, and markdown rendering of the typed sections.

pub mod handlers;
pub mod ingest;
pub mod prompts;
pub mod render;
pub mod session;
