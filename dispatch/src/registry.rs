use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use hookline_protocol::EventKind;
use hookline_protocol::ToolMatcher;
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::handler::CustomExecutor;
use crate::handler::Handler;
use crate::handler::HandlerFn;
use crate::routing::RouteChoice;
use crate::routing::RoutingRule;

/// Produces a handler's invocable on first use. Registered once at process
/// start; the (possibly expensive) load runs lazily on first resolve.
pub type HandlerFactory = Box<dyn Fn() -> anyhow::Result<Handler> + Send + Sync>;

/// Everything the registry knows about one logical handler.
///
/// Never mutated after registration completes, except lazy population of
/// the resolution cell on first use.
pub struct HandlerDescriptor {
    name: String,
    factory: HandlerFactory,
    routing: Option<RoutingRule>,
    executor: Option<Arc<dyn CustomExecutor>>,
    resolved: OnceCell<Result<Handler, String>>,
}

impl HandlerDescriptor {
    pub fn new(name: impl Into<String>, factory: HandlerFactory) -> Self {
        Self {
            name: name.into(),
            factory,
            routing: None,
            executor: None,
            resolved: OnceCell::new(),
        }
    }

    /// Descriptor for an already-constructed invocable.
    pub fn with_handler(name: impl Into<String>, handler: Handler) -> Self {
        Self::new(name, Box::new(move || Ok(handler.clone())))
    }

    pub fn routed(mut self, routing: RoutingRule) -> Self {
        self.routing = Some(routing);
        self
    }

    pub fn executed_by(mut self, executor: Arc<dyn CustomExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn routing(&self) -> Option<&RoutingRule> {
        self.routing.as_ref()
    }

    pub fn executor(&self) -> Option<&Arc<dyn CustomExecutor>> {
        self.executor.as_ref()
    }

    /// Resolve the invocable, caching the outcome for the process lifetime.
    ///
    /// A factory failure (or a routing rule that does not fit the resolved
    /// arity) is cached too: the handler is permanently unavailable and
    /// every later resolve returns the same error without re-running the
    /// factory.
    pub fn resolve(&self) -> Result<&Handler, &str> {
        let cell = self.resolved.get_or_init(|| {
            let handler = (self.factory)().map_err(|e| e.to_string())?;
            if let Some(rule) = &self.routing {
                if handler.arity() == 1 {
                    return Err(
                        crate::error::DispatchError::RoutingOnSingle(self.name.clone()).to_string()
                    );
                }
                rule.validate(&self.name, handler.arity())
                    .map_err(|e| e.to_string())?;
            }
            debug!(handler = %self.name, arity = handler.arity(), "handler resolved");
            Ok(handler)
        });
        cell.as_ref().map_err(String::as_str)
    }
}

impl std::fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("routing", &self.routing)
            .field("has_executor", &self.executor.is_some())
            .finish()
    }
}

/// Pick the callable for an invocation: routing rule if present, else the
/// sole/first variant. Custom executors bypass this entirely.
pub fn invocation_target<'h>(
    handler: &'h Handler,
    routing: Option<&RoutingRule>,
    tool: Option<&str>,
) -> (&'h HandlerFn, RouteChoice) {
    let choice = match routing {
        Some(rule) => rule.select(tool, handler.arity()),
        None => RouteChoice::Mapped(0),
    };
    let func = handler.variant(choice.index()).unwrap_or_else(|| {
        // select() already clamps; this arm only guards future arities.
        handler.first()
    });
    (func, choice)
}

/// One route-table row: tools matching `matcher` run `handlers` in order.
#[derive(Debug, Clone)]
struct RouteEntry {
    matcher: ToolMatcher,
    handlers: Vec<String>,
}

/// Handler registry and event → handler route table.
///
/// Populated by an init function at process start and frozen behind an
/// `Arc` before dispatch; only the per-descriptor resolution cells change
/// afterwards.
#[derive(Default)]
pub struct Registry {
    handlers: DashMap<String, Arc<HandlerDescriptor>>,
    routes: DashMap<EventKind, Vec<RouteEntry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler descriptor under its logical name.
    pub fn register(&self, descriptor: HandlerDescriptor) {
        debug!(handler = descriptor.name(), "registering handler");
        self.handlers
            .insert(descriptor.name().to_string(), Arc::new(descriptor));
    }

    /// Append a route-table entry. Declared order is execution order:
    /// deny-capable handlers must be routed before annotate-only ones.
    pub fn route<'a>(
        &self,
        kind: EventKind,
        matcher: ToolMatcher,
        handlers: impl IntoIterator<Item = &'a str>,
    ) {
        let handlers: Vec<String> = handlers.into_iter().map(str::to_string).collect();
        debug!(event = %kind, matcher = matcher.pattern(), count = handlers.len(), "adding route");
        self.routes
            .entry(kind)
            .or_default()
            .push(RouteEntry { matcher, handlers });
    }

    /// Ordered handler names for an (event kind, tool) pair.
    ///
    /// Duplicate names keep their first (highest-priority) position.
    pub fn handlers_for(&self, kind: EventKind, tool: Option<&str>) -> Vec<String> {
        let Some(entries) = self.routes.get(&kind) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for entry in entries.iter() {
            if !entry.matcher.matches(tool) {
                continue;
            }
            for name in &entry.handlers {
                if seen.insert(name.clone()) {
                    result.push(name.clone());
                }
            }
        }
        result
    }

    pub fn descriptor(&self, name: &str) -> Option<Arc<HandlerDescriptor>> {
        self.handlers.get(name).map(|entry| entry.value().clone())
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("handlers", &self.handlers.len())
            .field("routed_events", &self.routes.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::handler::handler_fn;

    fn tagged(tag: &'static str) -> HandlerFn {
        handler_fn(move |_| async move { Ok(Some(serde_json::json!({"tag": tag}))) })
    }

    #[test]
    fn handlers_run_in_declared_order() {
        let registry = Registry::new();
        registry.route(EventKind::PreToolUse, ToolMatcher::new("Bash"), ["deny"]);
        registry.route(EventKind::PreToolUse, ToolMatcher::any(), ["annotate"]);

        assert_eq!(
            registry.handlers_for(EventKind::PreToolUse, Some("Bash")),
            vec!["deny".to_string(), "annotate".to_string()]
        );
        assert_eq!(
            registry.handlers_for(EventKind::PreToolUse, Some("Read")),
            vec!["annotate".to_string()]
        );
        assert!(
            registry
                .handlers_for(EventKind::PostToolUse, Some("Bash"))
                .is_empty()
        );
    }

    #[test]
    fn duplicate_route_names_keep_first_position() {
        let registry = Registry::new();
        registry.route(EventKind::PostToolUse, ToolMatcher::any(), ["a", "b"]);
        registry.route(EventKind::PostToolUse, ToolMatcher::any(), ["b", "c"]);

        assert_eq!(
            registry.handlers_for(EventKind::PostToolUse, Some("Bash")),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn resolve_is_lazy_and_cached() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let descriptor = HandlerDescriptor::new(
            "lazy",
            Box::new(|| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                Ok(Handler::Single(tagged("lazy")))
            }),
        );

        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
        assert!(descriptor.resolve().is_ok());
        assert!(descriptor.resolve().is_ok());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn factory_failure_is_permanent() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let descriptor = HandlerDescriptor::new(
            "broken",
            Box::new(|| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("module missing")
            }),
        );

        assert_eq!(descriptor.resolve().unwrap_err(), "module missing");
        assert_eq!(descriptor.resolve().unwrap_err(), "module missing");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_routing_default_fails_resolution() {
        let descriptor = HandlerDescriptor::with_handler(
            "dual",
            Handler::Dual([tagged("a"), tagged("b")]),
        )
        .routed(RoutingRule::from_pairs([], 2));

        assert!(descriptor.resolve().is_err());
    }

    #[test]
    fn routing_on_single_variant_fails_resolution() {
        let descriptor = HandlerDescriptor::with_handler("solo", Handler::Single(tagged("solo")))
            .routed(RoutingRule::from_pairs([("Bash", 0)], 0));

        assert!(descriptor.resolve().is_err());
    }

    #[test]
    fn dual_handler_routing_resolution() {
        let handler = Handler::Dual([tagged("zero"), tagged("one")]);
        let rule = RoutingRule::from_pairs([("Task", 0), ("WebFetch", 1)], 0);

        let (_, choice) = invocation_target(&handler, Some(&rule), Some("Task"));
        assert_eq!(choice.index(), 0);
        let (_, choice) = invocation_target(&handler, Some(&rule), Some("WebFetch"));
        assert_eq!(choice.index(), 1);
        let (_, choice) = invocation_target(&handler, Some(&rule), Some("Grep"));
        assert_eq!(choice, RouteChoice::DefaultForUnknownTool(0));
    }

    #[tokio::test]
    async fn invocation_target_returns_routed_variant() {
        let handler = Handler::Dual([tagged("zero"), tagged("one")]);
        let rule = RoutingRule::from_pairs([("WebFetch", 1)], 0);
        let ctx = Arc::new(
            hookline_protocol::EventContext::from_json(serde_json::json!({
                "hook_event_name": "PreToolUse",
                "tool_name": "WebFetch",
            }))
            .expect("context"),
        );

        let (func, _) = invocation_target(&handler, Some(&rule), Some("WebFetch"));
        let result = func(ctx).await.expect("handler ok");
        assert_eq!(result, Some(serde_json::json!({"tag": "one"})));
    }
}
