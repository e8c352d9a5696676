use thiserror::Error;

/// Errors raised while interpreting host input.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The input was not a JSON object.
    #[error("event input is not a JSON object")]
    NotAnObject,

    /// The input carried no recognizable event name.
    #[error("missing or unknown hook_event_name: {0}")]
    UnknownEvent(String),

    /// The input could not be parsed as JSON at all.
    #[error("malformed event input: {0}")]
    Malformed(#[from] serde_json::Error),
}
