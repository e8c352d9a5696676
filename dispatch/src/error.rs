use thiserror::Error;

/// Errors surfaced during registry setup.
///
/// Runtime handler failures never use this type; they are absorbed into
/// [`crate::InvocationOutcome`] arms so dispatch can continue.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A routing rule's default index does not fit the handler's arity.
    #[error("routing default index {default_index} out of range for {handler} (arity {arity})")]
    InvalidRoutingDefault {
        handler: String,
        default_index: usize,
        arity: usize,
    },

    /// A routing rule was attached to a single-variant handler.
    #[error("routing rule attached to single-variant handler {0}")]
    RoutingOnSingle(String),
}
