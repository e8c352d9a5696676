//! Host-facing entry point for hookline.
//!
//! One invocation handles one lifecycle event: the host writes a JSON
//! object to stdin, hookline dispatches it, and at most one JSON object
//! comes back on stdout. Exit code is 0 in every case; every failure
//! class degrades to "no output" rather than interrupting the host.
//!
//! Diagnostics go to stderr via `tracing`; stdout belongs to the response.

use std::path::PathBuf;
use std::sync::Arc;

use hookline_dispatch::DispatchConfig;
use hookline_dispatch::Dispatcher;
use hookline_dispatch::ExecutionGuard;
use hookline_dispatch::Registry;
use hookline_dispatch::profiling_from_env;
use hookline_protocol::EventContext;
use hookline_state::CachedStore;
use hookline_state::EventLog;
use hookline_state::STATE_DIR_ENV;
use hookline_state::StateStore;
use hookline_state::state_dir_from_env;
use tracing::debug;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Install the stderr tracing subscriber. Call once, before any dispatch.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

/// The registry a plain `hookline` binary starts from.
///
/// Deployments register their handlers and routes here; the framework
/// itself ships none. An empty registry makes every dispatch a silent
/// fast path.
pub fn default_registry() -> Arc<Registry> {
    Arc::new(Registry::new())
}

/// Wire up a [`Dispatcher`] from configuration.
///
/// The base data directory resolves env override first, then the config
/// file's `stateDir`, then the per-user default.
pub fn build_dispatcher(registry: Arc<Registry>, config: DispatchConfig) -> Dispatcher {
    let base = match std::env::var(STATE_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => config
            .state_dir
            .clone()
            .unwrap_or_else(state_dir_from_env),
    };
    debug!(state_dir = %base.display(), "state directory resolved");

    let store = Arc::new(CachedStore::new(StateStore::new(&base), config.cache_ttl()));
    let log = EventLog::new(&base);
    let guard = ExecutionGuard::new(config.deadline()).with_profiling(profiling_from_env());
    Dispatcher::new(registry, store, log, guard, config)
}

/// Dispatch one raw stdin payload. `None` means nothing goes to stdout.
///
/// Malformed or unrecognized input is the transport error class: logged
/// and swallowed, never surfaced to the host.
pub async fn run_event(dispatcher: &Dispatcher, input: &str) -> Option<String> {
    let context = match EventContext::parse(input) {
        Ok(context) => context,
        Err(e) => {
            warn!(error = %e, "unusable event input");
            return None;
        }
    };

    let response = dispatcher.dispatch(Arc::new(context)).await?;
    match serde_json::to_string(&response) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!(error = %e, "response serialization failed");
            None
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use hookline_dispatch::EventKind;
    use hookline_dispatch::Handler;
    use hookline_dispatch::HandlerDescriptor;
    use hookline_dispatch::ToolMatcher;
    use hookline_dispatch::handler_fn;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn guarded_dispatcher(dir: &TempDir) -> Dispatcher {
        let registry = Registry::new();
        registry.register(HandlerDescriptor::with_handler(
            "file_guard",
            Handler::Single(handler_fn(|ctx| async move {
                let path = ctx
                    .tool_input()
                    .and_then(|input| input.get("file_path"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                if path.starts_with("/etc/") {
                    Ok(Some(json!({
                        "hookSpecificOutput": {
                            "hookEventName": "PreToolUse",
                            "permissionDecision": "deny",
                            "permissionDecisionReason": "system file",
                        }
                    })))
                } else {
                    Ok(None)
                }
            })),
        ));
        registry.route(
            EventKind::PreToolUse,
            ToolMatcher::new("Write|Edit"),
            ["file_guard"],
        );

        let config = DispatchConfig {
            state_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        build_dispatcher(Arc::new(registry), config)
    }

    #[tokio::test]
    async fn protected_file_edit_is_denied_end_to_end() {
        let dir = TempDir::new().expect("tempdir");
        let dispatcher = guarded_dispatcher(&dir);

        let input = json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Edit",
            "tool_input": {"file_path": "/etc/passwd"},
        })
        .to_string();

        let output = run_event(&dispatcher, &input).await.expect("a response");
        let parsed: Value = serde_json::from_str(&output).expect("valid json");
        assert_eq!(
            parsed["hookSpecificOutput"]["permissionDecision"],
            json!("deny")
        );
        assert_eq!(
            parsed["hookSpecificOutput"]["permissionDecisionReason"],
            json!("system file")
        );
    }

    #[tokio::test]
    async fn unremarkable_edit_is_silent() {
        let dir = TempDir::new().expect("tempdir");
        let dispatcher = guarded_dispatcher(&dir);

        let input = json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Edit",
            "tool_input": {"file_path": "/home/user/notes.md"},
        })
        .to_string();

        assert_eq!(run_event(&dispatcher, &input).await, None);
    }

    #[tokio::test]
    async fn malformed_input_is_swallowed() {
        let dir = TempDir::new().expect("tempdir");
        let dispatcher = guarded_dispatcher(&dir);

        assert_eq!(run_event(&dispatcher, "{ not json").await, None);
        assert_eq!(run_event(&dispatcher, "").await, None);
        assert_eq!(run_event(&dispatcher, "[1, 2]").await, None);
        assert_eq!(
            run_event(&dispatcher, r#"{"hook_event_name": "NotAnEvent"}"#).await,
            None
        );
    }

    #[tokio::test]
    async fn empty_registry_is_silent_for_every_event() {
        let dir = TempDir::new().expect("tempdir");
        let config = DispatchConfig {
            state_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let dispatcher = build_dispatcher(default_registry(), config);

        for event in ["PreToolUse", "PostToolUse", "SessionStart", "Stop"] {
            let input = json!({"hook_event_name": event, "tool_name": "Bash"}).to_string();
            assert_eq!(run_event(&dispatcher, &input).await, None, "event {event}");
        }
    }
}
