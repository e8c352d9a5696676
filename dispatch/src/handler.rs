use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use hookline_protocol::EventContext;
use serde_json::Value;

/// What one handler invocation yields: a structured result to feed the
/// result strategy, or `None` when the handler has nothing to report.
pub type HandlerResult = anyhow::Result<Option<Value>>;

/// A registered handler callable.
pub type HandlerFn =
    Arc<dyn Fn(Arc<EventContext>) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Wrap an async closure as a [`HandlerFn`].
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn
where
    F: Fn(Arc<EventContext>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(f(ctx)))
}

/// A handler's invocable: one callable, or a fixed-arity tuple of
/// variants selected by a routing rule.
///
/// The arity is part of the type; there is no runtime "is this a tuple"
/// probing anywhere downstream.
#[derive(Clone)]
pub enum Handler {
    Single(HandlerFn),
    Dual([HandlerFn; 2]),
    Triple([HandlerFn; 3]),
}

impl Handler {
    pub fn arity(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Dual(_) => 2,
            Self::Triple(_) => 3,
        }
    }

    /// The variant at `index`, if in range.
    pub fn variant(&self, index: usize) -> Option<&HandlerFn> {
        match self {
            Self::Single(f) => (index == 0).then_some(f),
            Self::Dual(fs) => fs.get(index),
            Self::Triple(fs) => fs.get(index),
        }
    }

    /// The first variant; total for every arity.
    pub fn first(&self) -> &HandlerFn {
        match self {
            Self::Single(f) => f,
            Self::Dual(fs) => &fs[0],
            Self::Triple(fs) => &fs[0],
        }
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(_) => f.write_str("Handler::Single"),
            Self::Dual(_) => f.write_str("Handler::Dual"),
            Self::Triple(_) => f.write_str("Handler::Triple"),
        }
    }
}

/// Bespoke invocation for handlers that need more than "call the resolved
/// variant", such as pre-validating the command shape before a variant is
/// even chosen. Takes precedence over routing.
pub trait CustomExecutor: Send + Sync {
    fn invoke(
        &self,
        name: &str,
        handler: &Handler,
        context: Arc<EventContext>,
    ) -> BoxFuture<'static, HandlerResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> HandlerFn {
        handler_fn(|_| async { Ok(None) })
    }

    #[test]
    fn arity_matches_variant_count() {
        assert_eq!(Handler::Single(noop()).arity(), 1);
        assert_eq!(Handler::Dual([noop(), noop()]).arity(), 2);
        assert_eq!(Handler::Triple([noop(), noop(), noop()]).arity(), 3);
    }

    #[test]
    fn variant_lookup_respects_bounds() {
        let dual = Handler::Dual([noop(), noop()]);
        assert!(dual.variant(1).is_some());
        assert!(dual.variant(2).is_none());

        let single = Handler::Single(noop());
        assert!(single.variant(0).is_some());
        assert!(single.variant(1).is_none());
    }
}
