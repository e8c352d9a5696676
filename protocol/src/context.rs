use serde_json::Value;

use crate::error::ProtocolError;
use crate::event::EventKind;

/// Environment override for the session identifier.
pub const SESSION_ID_ENV: &str = "HOOKLINE_SESSION_ID";

/// Immutable view of one host event.
///
/// Built once per process invocation from the JSON object the host writes
/// to stdin. Fields the framework models are pulled out; everything else
/// stays reachable through [`EventContext::raw`] so handlers can read
/// event-specific extras without the framework having to know them.
#[derive(Debug, Clone)]
pub struct EventContext {
    kind: EventKind,
    tool_name: Option<String>,
    session_id: Option<String>,
    cwd: Option<String>,
    transcript_path: Option<String>,
    raw: Value,
}

impl EventContext {
    /// Parse raw host input text. Convenience over [`EventContext::from_json`]
    /// for the stdin path.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let raw: Value = serde_json::from_str(input)?;
        Self::from_json(raw)
    }

    /// Parse a host input object.
    ///
    /// The event kind is read from `hook_event_name`. A session id set via
    /// the `HOOKLINE_SESSION_ID` environment variable takes precedence over
    /// the input field.
    pub fn from_json(raw: Value) -> Result<Self, ProtocolError> {
        let obj = raw.as_object().ok_or(ProtocolError::NotAnObject)?;

        let event_name = obj
            .get("hook_event_name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let kind = EventKind::from_wire(event_name)
            .ok_or_else(|| ProtocolError::UnknownEvent(event_name.to_string()))?;

        let field = |name: &str| obj.get(name).and_then(Value::as_str).map(str::to_string);

        let session_id = std::env::var(SESSION_ID_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .or_else(|| field("session_id"));

        Ok(Self {
            kind,
            tool_name: field("tool_name"),
            session_id,
            cwd: field("cwd"),
            transcript_path: field("transcript_path"),
            raw,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name.as_deref()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }

    pub fn transcript_path(&self) -> Option<&str> {
        self.transcript_path.as_deref()
    }

    /// Nested tool parameters, when present.
    pub fn tool_input(&self) -> Option<&Value> {
        self.raw.get("tool_input")
    }

    /// Tool output for post-action events. Hosts have shipped both field
    /// names; `tool_response` wins when both are present.
    pub fn tool_response(&self) -> Option<&Value> {
        self.raw
            .get("tool_response")
            .or_else(|| self.raw.get("tool_result"))
    }

    /// The user's prompt text for prompt-level events.
    pub fn prompt(&self) -> Option<&str> {
        self.raw.get("prompt").and_then(Value::as_str)
    }

    /// The full input object as received.
    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_tool_event() {
        let ctx = EventContext::from_json(json!({
            "hook_event_name": "PreToolUse",
            "tool_name": "Edit",
            "tool_input": {"file_path": "/etc/passwd"},
            "session_id": "s-1",
            "cwd": "/work",
            "transcript_path": "/tmp/t.jsonl",
        }))
        .expect("valid input");

        assert_eq!(ctx.kind(), EventKind::PreToolUse);
        assert_eq!(ctx.tool_name(), Some("Edit"));
        assert_eq!(ctx.session_id(), Some("s-1"));
        assert_eq!(ctx.cwd(), Some("/work"));
        assert_eq!(
            ctx.tool_input().and_then(|v| v.get("file_path")),
            Some(&json!("/etc/passwd"))
        );
    }

    #[test]
    fn tool_response_falls_back_to_tool_result() {
        let ctx = EventContext::from_json(json!({
            "hook_event_name": "PostToolUse",
            "tool_name": "Bash",
            "tool_result": "ok",
        }))
        .expect("valid input");
        assert_eq!(ctx.tool_response(), Some(&json!("ok")));
    }

    #[test]
    fn rejects_unknown_event() {
        let err = EventContext::from_json(json!({"hook_event_name": "Nope"}))
            .expect_err("should reject");
        assert!(matches!(err, ProtocolError::UnknownEvent(_)));
    }

    #[test]
    fn parse_rejects_malformed_text() {
        let err = EventContext::parse("{ nope").expect_err("should reject");
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn rejects_non_object() {
        let err = EventContext::from_json(json!([1, 2])).expect_err("should reject");
        assert!(matches!(err, ProtocolError::NotAnObject));
    }
}
