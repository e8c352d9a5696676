//! On-disk state shared by hookline handlers across process invocations.
//!
//! Layout under the base data directory:
//! - `<namespace>.json`: one JSON document per global namespace
//! - `sessions/<session_id>.json`: namespace to payload map per session
//! - `events.jsonl`: append-only structured event log
//!
//! Concurrent dispatch processes may touch the same files; every mutation
//! goes through either atomic replace or a lock-guarded read-modify-write,
//! so readers always see a complete prior or complete new document.
//! Persistence failures degrade to no-ops: reads fall back to defaults,
//! writes report failure, nothing propagates as an error.

mod cache;
mod error;
mod log;
mod store;

pub use cache::CachedStore;
pub use cache::TtlCache;
pub use error::StateError;
pub use log::EventLog;
pub use log::LogEvent;
pub use log::LogRecord;
pub use store::StateStore;
pub use store::state_dir_from_env;
pub use store::STATE_DIR_ENV;
