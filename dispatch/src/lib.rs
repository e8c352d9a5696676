//! Dispatch and orchestration core for hookline.
//!
//! One process invocation handles one lifecycle event: the host's JSON
//! input becomes an [`EventContext`], the [`Registry`] yields the ordered
//! handler list for the (event kind, tool) pair, each handler runs under
//! the [`ExecutionGuard`]'s deadline, and the active [`ResultStrategy`]
//! turns the per-handler outcomes into at most one response object.
//!
//! No handler failure is allowed to reach the host boundary; the worst
//! case is an absent response.
//!
//! ## Example
//!
//! ```rust,ignore
//! use hookline_dispatch::{Registry, HandlerDescriptor, handler_fn};
//!
//! let registry = Registry::new();
//! registry.register(HandlerDescriptor::with_handler(
//!     "credential_guard",
//!     Handler::Single(handler_fn(|ctx| async move {
//!         Ok(None) // nothing to report
//!     })),
//! ));
//! registry.route(EventKind::PreToolUse, ToolMatcher::new("Bash|Edit"), ["credential_guard"]);
//! ```

mod config;
mod dispatcher;
mod error;
mod guard;
mod handler;
mod registry;
mod routing;
mod strategy;

pub use config::DispatchConfig;
pub use config::PROFILE_ENV;
pub use config::TIMEOUT_ENV;
pub use config::load_config;
pub use config::profiling_from_env;
pub use dispatcher::DISABLED_NAMESPACE;
pub use dispatcher::Dispatcher;
pub use error::DispatchError;
pub use guard::DispatchResult;
pub use guard::ExecutionGuard;
pub use guard::InvocationOutcome;
pub use handler::CustomExecutor;
pub use handler::Handler;
pub use handler::HandlerFn;
pub use handler::HandlerResult;
pub use handler::handler_fn;
pub use registry::HandlerDescriptor;
pub use registry::Registry;
pub use registry::invocation_target;
pub use routing::RouteChoice;
pub use routing::RoutingRule;
pub use strategy::MAX_MESSAGES;
pub use strategy::ResultStrategy;
pub use strategy::strategy_for;

pub use hookline_protocol::EventContext;
pub use hookline_protocol::EventKind;
pub use hookline_protocol::ToolMatcher;
