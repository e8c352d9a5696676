use serde::Deserialize;
use serde::Serialize;

use crate::event::EventKind;

/// Permission decision carried in deny-capable responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionDecision {
    Allow,
    Deny,
}

/// Event-specific response payload, nested under `hookSpecificOutput`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    /// Wire name of the event this response answers.
    pub hook_event_name: String,

    /// Permission decision for deny-capable events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision: Option<PermissionDecision>,

    /// Reason accompanying the permission decision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_decision_reason: Option<String>,

    /// Free-form message for post-action events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The single JSON object written back to the host.
///
/// Deny-capable and message-only responses nest their payload under
/// `hookSpecificOutput`; prompt-level responses use a bare top-level
/// `message` for readability in a conversational surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Hook {
        #[serde(rename = "hookSpecificOutput")]
        hook_specific_output: HookSpecificOutput,
    },
    Prompt {
        message: String,
    },
}

impl Response {
    /// An allow decision, optionally carrying the joined reasons.
    pub fn allow(kind: EventKind, reason: Option<String>) -> Self {
        Self::Hook {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: kind.wire_name().to_string(),
                permission_decision: Some(PermissionDecision::Allow),
                permission_decision_reason: reason,
                message: None,
            },
        }
    }

    /// A deny decision with its reason.
    pub fn deny(kind: EventKind, reason: impl Into<String>) -> Self {
        Self::Hook {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: kind.wire_name().to_string(),
                permission_decision: Some(PermissionDecision::Deny),
                permission_decision_reason: Some(reason.into()),
                message: None,
            },
        }
    }

    /// A message-only response.
    pub fn message(kind: EventKind, message: impl Into<String>) -> Self {
        Self::Hook {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: kind.wire_name().to_string(),
                permission_decision: None,
                permission_decision_reason: None,
                message: Some(message.into()),
            },
        }
    }

    /// A prompt-level response with a top-level message field.
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn deny_response_wire_shape() {
        let response = Response::deny(EventKind::PreToolUse, "protected file");
        let actual = serde_json::to_value(&response).expect("serialize");
        let expected = json!({
            "hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": "deny",
                "permissionDecisionReason": "protected file",
            }
        });
        assert_eq!(actual, expected);
    }

    #[test]
    fn allow_response_omits_absent_reason() {
        let response = Response::allow(EventKind::PreToolUse, None);
        let actual = serde_json::to_value(&response).expect("serialize");
        let expected = json!({
            "hookSpecificOutput": {
                "hookEventName": "PreToolUse",
                "permissionDecision": "allow",
            }
        });
        assert_eq!(actual, expected);
    }

    #[test]
    fn message_response_wire_shape() {
        let response = Response::message(EventKind::PostToolUse, "A | B");
        let actual = serde_json::to_value(&response).expect("serialize");
        let expected = json!({
            "hookSpecificOutput": {
                "hookEventName": "PostToolUse",
                "message": "A | B",
            }
        });
        assert_eq!(actual, expected);
    }

    #[test]
    fn prompt_response_is_top_level() {
        let response = Response::prompt("line one\nline two");
        let actual = serde_json::to_value(&response).expect("serialize");
        assert_eq!(actual, json!({"message": "line one\nline two"}));
    }
}
