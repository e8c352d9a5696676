//! Wire types for the hookline event boundary.
//!
//! The host delivers one JSON object per invocation on stdin and expects at
//! most one JSON object back on stdout. This crate owns both shapes: the
//! parsed [`EventContext`], the [`EventKind`] taxonomy, the response
//! envelopes, and the tool-name matcher used by route tables.

mod context;
mod error;
mod event;
mod matcher;
mod response;

pub use context::EventContext;
pub use context::SESSION_ID_ENV;
pub use error::ProtocolError;
pub use event::EventKind;
pub use event::StrategyClass;
pub use matcher::ToolMatcher;
pub use response::HookSpecificOutput;
pub use response::PermissionDecision;
pub use response::Response;
