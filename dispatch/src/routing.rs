use std::collections::HashMap;

use crate::error::DispatchError;

/// Tool-name → variant-index routing for multi-arity handlers.
#[derive(Debug, Clone)]
pub struct RoutingRule {
    by_tool: HashMap<String, usize>,
    default_index: usize,
}

/// How a variant index was chosen. The fallback chain is deterministic and
/// total: every choice yields a callable, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteChoice {
    /// The tool name was present in the rule's mapping.
    Mapped(usize),
    /// Unknown (or absent) tool name; the rule's default index applies.
    DefaultForUnknownTool(usize),
    /// The chosen index exceeded the handler's arity; index 0 applies.
    ClampedOutOfRange,
}

impl RouteChoice {
    pub fn index(self) -> usize {
        match self {
            Self::Mapped(i) | Self::DefaultForUnknownTool(i) => i,
            Self::ClampedOutOfRange => 0,
        }
    }
}

impl RoutingRule {
    pub fn new(by_tool: HashMap<String, usize>, default_index: usize) -> Self {
        Self {
            by_tool,
            default_index,
        }
    }

    /// Convenience constructor from `(tool, index)` pairs.
    pub fn from_pairs<'a>(
        pairs: impl IntoIterator<Item = (&'a str, usize)>,
        default_index: usize,
    ) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(tool, index)| (tool.to_string(), index))
                .collect(),
            default_index,
        )
    }

    /// The default index must address a real variant.
    pub fn validate(&self, handler: &str, arity: usize) -> Result<(), DispatchError> {
        if self.default_index >= arity {
            return Err(DispatchError::InvalidRoutingDefault {
                handler: handler.to_string(),
                default_index: self.default_index,
                arity,
            });
        }
        Ok(())
    }

    /// Pick the variant index for `tool` against a handler of `arity`.
    pub fn select(&self, tool: Option<&str>, arity: usize) -> RouteChoice {
        let choice = match tool.and_then(|t| self.by_tool.get(t)) {
            Some(&index) => RouteChoice::Mapped(index),
            None => RouteChoice::DefaultForUnknownTool(self.default_index),
        };
        if choice.index() >= arity {
            RouteChoice::ClampedOutOfRange
        } else {
            choice
        }
    }
}
