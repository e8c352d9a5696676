use serde::Deserialize;
use serde::Serialize;

/// Lifecycle moment being dispatched.
///
/// Each process invocation handles exactly one event; there is no
/// cross-kind transition within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Before a tool runs. Handlers may deny the action.
    PreToolUse,
    /// After a tool ran successfully.
    PostToolUse,
    /// User submitted a textual prompt.
    UserPromptSubmit,
    /// Session begins.
    SessionStart,
    /// Session ends.
    SessionEnd,
    /// The agent loop stopped.
    Stop,
    /// System notification surfaced to the user.
    Notification,
    /// Before context compaction.
    PreCompact,
}

/// Which result-aggregation semantics apply to an event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyClass {
    /// Gates an action before it happens; a deny short-circuits.
    DenyCapable,
    /// Reacts after the fact; every handler runs, messages are joined.
    MessageOnly,
    /// User-prompt events; top-level message shape, newline joins.
    PromptLevel,
}

impl EventKind {
    /// Parse the wire name carried in `hook_event_name`.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "PreToolUse" => Some(Self::PreToolUse),
            "PostToolUse" => Some(Self::PostToolUse),
            "UserPromptSubmit" => Some(Self::UserPromptSubmit),
            "SessionStart" => Some(Self::SessionStart),
            "SessionEnd" => Some(Self::SessionEnd),
            "Stop" => Some(Self::Stop),
            "Notification" => Some(Self::Notification),
            "PreCompact" => Some(Self::PreCompact),
            _ => None,
        }
    }

    /// Wire name as emitted in `hookEventName` response fields.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::SessionStart => "SessionStart",
            Self::SessionEnd => "SessionEnd",
            Self::Stop => "Stop",
            Self::Notification => "Notification",
            Self::PreCompact => "PreCompact",
        }
    }

    /// The result semantics for this kind.
    pub fn strategy_class(self) -> StrategyClass {
        match self {
            Self::PreToolUse => StrategyClass::DenyCapable,
            Self::UserPromptSubmit => StrategyClass::PromptLevel,
            _ => StrategyClass::MessageOnly,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}
