use hookline_protocol::EventKind;
use hookline_protocol::Response;
use hookline_protocol::StrategyClass;
use serde_json::Value;
use tracing::debug;

/// At most this many handler messages make it into the final response;
/// later ones are discarded.
pub const MAX_MESSAGES: usize = 3;

/// Per-event-kind result semantics.
///
/// Exactly one strategy instance is active for the lifetime of a process;
/// each process handles exactly one event.
pub trait ResultStrategy: Send + Sync {
    /// Whether this handler's raw result ends the dispatch early. The
    /// dispatcher then returns the raw result verbatim.
    fn should_terminate(&self, raw: &Value, handler: &str) -> bool;

    /// Pull a displayable message out of a handler's structured output.
    fn extract_message(&self, raw: &Value) -> Option<String>;

    /// Build the final response from the accumulated messages, or `None`
    /// when there is nothing to say.
    fn build_response(&self, kind: EventKind, messages: &[String]) -> Option<Response>;
}

/// The strategy for an event kind. One implementation per class.
pub fn strategy_for(kind: EventKind) -> &'static dyn ResultStrategy {
    match kind.strategy_class() {
        StrategyClass::DenyCapable => &DenyCapable,
        StrategyClass::MessageOnly => &MessageOnly,
        StrategyClass::PromptLevel => &PromptLevel,
    }
}

fn nested_output(raw: &Value) -> Option<&Value> {
    raw.get("hookSpecificOutput")
}

fn joined(messages: &[String], separator: &str) -> Option<String> {
    if messages.is_empty() {
        return None;
    }
    let take = messages.len().min(MAX_MESSAGES);
    Some(messages[..take].join(separator))
}

/// Events that gate an action before it happens. An explicit deny decision
/// short-circuits; absence of any deny implies allow.
struct DenyCapable;

impl ResultStrategy for DenyCapable {
    fn should_terminate(&self, raw: &Value, handler: &str) -> bool {
        let denied = nested_output(raw)
            .and_then(|out| out.get("permissionDecision"))
            .and_then(Value::as_str)
            == Some("deny");
        if denied {
            debug!(handler, "handler denied the action");
        }
        denied
    }

    fn extract_message(&self, raw: &Value) -> Option<String> {
        nested_output(raw)
            .and_then(|out| out.get("permissionDecisionReason"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn build_response(&self, kind: EventKind, messages: &[String]) -> Option<Response> {
        joined(messages, " | ").map(|reasons| Response::allow(kind, Some(reasons)))
    }
}

/// Events that react after an action already happened. Every handler runs;
/// messages are joined with a delimiter.
struct MessageOnly;

impl ResultStrategy for MessageOnly {
    fn should_terminate(&self, _raw: &Value, _handler: &str) -> bool {
        false
    }

    fn extract_message(&self, raw: &Value) -> Option<String> {
        nested_output(raw)
            .and_then(|out| out.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn build_response(&self, kind: EventKind, messages: &[String]) -> Option<Response> {
        joined(messages, " | ").map(|message| Response::message(kind, message))
    }
}

/// User-prompt events. Handlers may put the message at the top level or in
/// the nested field; joins use newlines for a conversational surface.
struct PromptLevel;

impl ResultStrategy for PromptLevel {
    fn should_terminate(&self, _raw: &Value, _handler: &str) -> bool {
        false
    }

    fn extract_message(&self, raw: &Value) -> Option<String> {
        raw.get("message")
            .or_else(|| nested_output(raw).and_then(|out| out.get("message")))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn build_response(&self, _kind: EventKind, messages: &[String]) -> Option<Response> {
        joined(messages, "\n").map(Response::prompt)
    }
}
