//! Dispatch configuration.
//!
//! Loaded from JSON in priority order:
//! 1. Project: `{cwd}/.hookline/config.json`
//! 2. User: `~/.hookline/config.json`
//!
//! A missing file means defaults; a malformed file is logged and also
//! means defaults. Configuration problems never break a dispatch.
//!
//! ```json
//! {
//!   "disableAllHandlers": false,
//!   "disabledHandlers": ["desktop_notify"],
//!   "timeoutMs": 1000,
//!   "cacheTtlSecs": 5,
//!   "stateDir": "/var/lib/hookline"
//! }
//! ```

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

/// Deadline override in milliseconds.
pub const TIMEOUT_ENV: &str = "HOOKLINE_TIMEOUT_MS";

/// When set (non-empty, not "0"), per-handler timing goes to stderr.
pub const PROFILE_ENV: &str = "HOOKLINE_PROFILE";

const CONFIG_DIR: &str = ".hookline";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchConfig {
    /// Global kill switch.
    #[serde(default)]
    pub disable_all_handlers: bool,

    /// Handler names disabled for every session.
    #[serde(default)]
    pub disabled_handlers: Vec<String>,

    /// Per-handler deadline in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// TTL for the in-process state read memo, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Base data directory override.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    5
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            disable_all_handlers: false,
            disabled_handlers: Vec::new(),
            timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            state_dir: None,
        }
    }
}

impl DispatchConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn is_disabled(&self, handler: &str) -> bool {
        self.disable_all_handlers || self.disabled_handlers.iter().any(|name| name == handler)
    }

    /// Apply environment overrides on top of file configuration.
    pub fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
            match raw.parse::<u64>() {
                Ok(ms) if ms > 0 => self.timeout_ms = ms,
                _ => warn!(value = %raw, "ignoring unparseable {TIMEOUT_ENV}"),
            }
        }
    }
}

/// Whether per-handler profiling output is enabled.
pub fn profiling_from_env() -> bool {
    std::env::var(PROFILE_ENV)
        .map(|v| !v.is_empty() && v != "0")
        .unwrap_or(false)
}

/// Load configuration, project file first, then the user file.
pub fn load_config(cwd: &Path) -> DispatchConfig {
    let project = cwd.join(CONFIG_DIR).join(CONFIG_FILE);
    if project.exists() {
        debug!(path = %project.display(), "loading project config");
        return load_from_file(&project);
    }

    if let Some(home) = dirs::home_dir() {
        let user = home.join(CONFIG_DIR).join(CONFIG_FILE);
        if user.exists() {
            debug!(path = %user.display(), "loading user config");
            return load_from_file(&user);
        }
    }

    debug!("no config file found, using defaults");
    DispatchConfig::default()
}

fn load_from_file(path: &Path) -> DispatchConfig {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read config, using defaults");
            return DispatchConfig::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse config, using defaults");
            DispatchConfig::default()
        }
    }
}
