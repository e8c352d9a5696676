use std::collections::HashSet;
use std::sync::Arc;

use hookline_protocol::EventContext;
use hookline_protocol::EventKind;
use hookline_state::CachedStore;
use hookline_state::EventLog;
use hookline_state::LogEvent;
use hookline_state::LogRecord;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

use crate::config::DispatchConfig;
use crate::guard::DispatchResult;
use crate::guard::ExecutionGuard;
use crate::guard::InvocationOutcome;
use crate::registry::Registry;
use crate::registry::invocation_target;
use crate::strategy::MAX_MESSAGES;
use crate::strategy::strategy_for;

/// Session-document namespace holding handler names disabled for that
/// session (a JSON array of strings).
pub const DISABLED_NAMESPACE: &str = "disabled_handlers";

/// The orchestrator: resolves the handler list for one event, executes
/// each handler under the deadline, applies the event kind's result
/// strategy, and produces at most one response value.
///
/// All collaborators are injected at construction; the dispatcher owns no
/// global state.
pub struct Dispatcher {
    registry: Arc<Registry>,
    store: Arc<CachedStore>,
    log: EventLog,
    guard: ExecutionGuard,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<CachedStore>,
        log: EventLog,
        guard: ExecutionGuard,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            store,
            log,
            guard,
            config,
        }
    }

    pub fn store(&self) -> &Arc<CachedStore> {
        &self.store
    }

    /// Dispatch one event. Returns the JSON object to write back to the
    /// host, or `None` when there is nothing to say.
    ///
    /// Handlers run sequentially in declared order. A handler whose result
    /// terminates the dispatch (a deny) has its raw result returned
    /// verbatim; later handlers are not invoked.
    pub async fn dispatch(&self, context: Arc<EventContext>) -> Option<Value> {
        let kind = context.kind();
        let tool = context.tool_name().map(str::to_string);
        let names = self.registry.handlers_for(kind, tool.as_deref());
        if names.is_empty() {
            // Most event/tool combinations have no interested handlers.
            debug!(event = %kind, tool = tool.as_deref().unwrap_or(""), "no handlers routed");
            return None;
        }

        let strategy = strategy_for(kind);
        let session_disabled = self.session_disabled(context.session_id());
        let mut messages: Vec<String> = Vec::new();

        for name in names {
            if self.config.is_disabled(&name) || session_disabled.contains(&name) {
                debug!(handler = %name, "handler disabled, skipping");
                self.log.append(&LogRecord::new(
                    kind.wire_name(),
                    LogEvent::HandlerSkipped {
                        handler: name.clone(),
                    },
                ));
                continue;
            }

            let Some(result) = self.invoke(kind, &name, &context).await else {
                continue;
            };
            self.record_outcome(kind, &result, tool.as_deref());

            if let InvocationOutcome::Completed(Some(raw)) = &result.outcome {
                if strategy.should_terminate(raw, &name) {
                    debug!(handler = %name, "dispatch terminated early");
                    return Some(raw.clone());
                }
                if messages.len() < MAX_MESSAGES {
                    if let Some(message) = strategy.extract_message(raw) {
                        if !message.is_empty() {
                            messages.push(message);
                        }
                    }
                }
            }
        }

        let response = strategy.build_response(kind, &messages)?;
        match serde_json::to_value(&response) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "response serialization failed");
                None
            }
        }
    }

    /// Resolve and run one handler. `None` means the handler was
    /// unavailable (resolution failed, permanently for this process).
    async fn invoke(
        &self,
        kind: EventKind,
        name: &str,
        context: &Arc<EventContext>,
    ) -> Option<DispatchResult> {
        let Some(descriptor) = self.registry.descriptor(name) else {
            warn!(handler = name, "routed handler is not registered");
            self.import_error(kind, name, "not registered");
            return None;
        };

        let handler = match descriptor.resolve() {
            Ok(handler) => handler,
            Err(error) => {
                warn!(handler = name, error, "handler resolution failed");
                self.import_error(kind, name, error);
                return None;
            }
        };

        let fut = match descriptor.executor() {
            Some(executor) => executor.invoke(name, handler, context.clone()),
            None => {
                let (func, choice) =
                    invocation_target(handler, descriptor.routing(), context.tool_name());
                debug!(handler = name, ?choice, "invocation target selected");
                func(context.clone())
            }
        };

        Some(self.guard.run(name, context.tool_name(), fut).await)
    }

    fn import_error(&self, kind: EventKind, name: &str, error: &str) {
        self.log.append(&LogRecord::new(
            kind.wire_name(),
            LogEvent::ImportError {
                handler: name.to_string(),
                error: error.to_string(),
            },
        ));
    }

    /// One timing record per invocation, plus the failure-class record for
    /// timeouts and errors.
    fn record_outcome(&self, kind: EventKind, result: &DispatchResult, tool: Option<&str>) {
        match &result.outcome {
            InvocationOutcome::TimedOut => {
                self.log.append(&LogRecord::new(
                    kind.wire_name(),
                    LogEvent::HandlerTimeout {
                        handler: result.handler.clone(),
                        timeout_s: self.guard.deadline().as_secs_f64(),
                    },
                ));
            }
            InvocationOutcome::Failed(error) => {
                self.log.append(&LogRecord::new(
                    kind.wire_name(),
                    LogEvent::HandlerError {
                        handler: result.handler.clone(),
                        error: error.clone(),
                    },
                ));
            }
            InvocationOutcome::Completed(_) => {}
        }

        self.log.append(&LogRecord::new(
            kind.wire_name(),
            LogEvent::HandlerTiming {
                handler: result.handler.clone(),
                elapsed_s: result.elapsed.as_secs_f64(),
                tool: tool.map(str::to_string),
                success: result.success(),
            },
        ));
    }

    fn session_disabled(&self, session_id: Option<&str>) -> HashSet<String> {
        let Some(session_id) = session_id else {
            return HashSet::new();
        };
        self.store
            .read(DISABLED_NAMESPACE, Some(session_id))
            .as_array()
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
