use regex::Regex;
use tracing::debug;

/// Tool-name pattern for a route-table entry.
///
/// Supported forms:
/// - empty or `*` matches every tool
/// - plain alphanumeric text is an exact match
/// - pipe-separated alternatives (`Write|Edit|Bash`) match any listed name
/// - anything else is treated as a regex; an invalid regex matches nothing
#[derive(Debug, Clone)]
pub struct ToolMatcher {
    pattern: String,
}

impl ToolMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    /// Match-all pattern.
    pub fn any() -> Self {
        Self::new("*")
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether this matcher accepts `tool`.
    ///
    /// Events without a tool name (session boundaries, prompts) pass
    /// `None`; every matcher accepts those so declared handlers always run.
    pub fn matches(&self, tool: Option<&str>) -> bool {
        let Some(tool) = tool else {
            return true;
        };

        let pattern = self.pattern.trim();
        if pattern.is_empty() || pattern == "*" {
            return true;
        }

        if is_literal(pattern) {
            if pattern.contains('|') {
                return pattern.split('|').map(str::trim).any(|p| p == tool);
            }
            return pattern == tool;
        }

        match Regex::new(pattern) {
            Ok(re) => re.is_match(tool),
            Err(e) => {
                debug!(pattern, error = %e, "invalid tool matcher regex");
                false
            }
        }
    }
}

/// A pattern with no regex metacharacters, matchable by string equality.
fn is_literal(pattern: &str) -> bool {
    pattern
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '|' || c == ' ')
}
