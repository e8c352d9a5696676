use std::fs::File;
use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;

use fs2::FileExt;
use serde_json::Value;
use serde_json::json;
use tempfile::NamedTempFile;
use tracing::debug;
use tracing::warn;

use crate::error::StateError;

/// Environment override for the base data directory.
pub const STATE_DIR_ENV: &str = "HOOKLINE_STATE_DIR";

const SESSIONS_DIR: &str = "sessions";

/// Resolve the base data directory.
///
/// `HOOKLINE_STATE_DIR` wins; otherwise `~/.hookline`, falling back to a
/// relative `.hookline` when no home directory is known.
pub fn state_dir_from_env() -> PathBuf {
    if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".hookline"))
        .unwrap_or_else(|| PathBuf::from(".hookline"))
}

/// Namespaced key-value persistence with global and session-scoped variants.
///
/// Global namespaces are one JSON document per file, replaced atomically.
/// Session documents hold a namespace → payload map per session id and are
/// mutated whole-document under an exclusive advisory lock.
#[derive(Debug, Clone)]
pub struct StateStore {
    base: PathBuf,
}

impl StateStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Directory for a handler-owned cache domain, created on demand.
    ///
    /// `None` when the directory cannot be created; callers treat that the
    /// same as any other persistence degradation.
    pub fn cache_dir(&self, domain: &str) -> Option<PathBuf> {
        let dir = self.base.join("cache").join(safe_component(domain));
        match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(dir),
            Err(e) => {
                warn!(domain, error = %e, "cache domain directory unavailable");
                None
            }
        }
    }

    /// Read a namespace document. Global when `session_id` is `None`.
    ///
    /// Missing files and read failures return an empty object; the failure
    /// is logged, never raised.
    pub fn read(&self, namespace: &str, session_id: Option<&str>) -> Value {
        let result = match session_id {
            None => self.load_document(&self.global_path(namespace)),
            Some(sid) => self
                .load_document(&self.session_path(sid))
                .map(|doc| doc.get(namespace).cloned().unwrap_or_else(|| json!({}))),
        };
        match result {
            Ok(doc) => doc,
            Err(e) => {
                warn!(namespace, session = ?session_id, error = %e, "state read degraded to default");
                json!({})
            }
        }
    }

    /// Replace a namespace document. Returns whether the write landed.
    pub fn write(&self, namespace: &str, document: &Value, session_id: Option<&str>) -> bool {
        let result = match session_id {
            None => self.replace_locked(&self.global_path(namespace), |doc| {
                *doc = document.clone();
            }),
            Some(sid) => self.replace_locked(&self.session_path(sid), |doc| {
                ensure_object(doc);
                doc[namespace] = document.clone();
            }),
        };
        if let Err(e) = &result {
            warn!(namespace, session = ?session_id, error = %e, "state write dropped");
        }
        result.is_ok()
    }

    /// Read-modify-write a namespace document under an exclusive lock.
    pub fn update(
        &self,
        namespace: &str,
        session_id: Option<&str>,
        updater: impl FnOnce(&mut Value),
    ) -> bool {
        let result = match session_id {
            None => self.replace_locked(&self.global_path(namespace), updater),
            Some(sid) => self.replace_locked(&self.session_path(sid), |doc| {
                ensure_object(doc);
                let slot = doc
                    .as_object_mut()
                    .map(|map| map.entry(namespace.to_string()).or_insert(json!({})));
                if let Some(payload) = slot {
                    updater(payload);
                }
            }),
        };
        if let Err(e) = &result {
            warn!(namespace, session = ?session_id, error = %e, "state update dropped");
        }
        result.is_ok()
    }

    fn global_path(&self, namespace: &str) -> PathBuf {
        self.base.join(format!("{}.json", safe_component(namespace)))
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.base
            .join(SESSIONS_DIR)
            .join(format!("{}.json", safe_component(session_id)))
    }

    fn load_document(&self, path: &Path) -> Result<Value, StateError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(json!({})),
            Err(e) => return Err(StateError::io(path, e)),
        };
        serde_json::from_str(&content).map_err(|source| StateError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Lock, load, mutate, then atomically replace `path`.
    ///
    /// The lock is taken on a sibling `.lock` file so the rename never
    /// invalidates the locked descriptor. A crash mid-write leaves the
    /// original document intact: the new content goes to a temp file in
    /// the same directory and lands via rename.
    fn replace_locked(
        &self,
        path: &Path,
        mutate: impl FnOnce(&mut Value),
    ) -> Result<(), StateError> {
        let dir = path.parent().unwrap_or(&self.base);
        std::fs::create_dir_all(dir).map_err(|e| StateError::io(dir, e))?;

        let _guard = LockGuard::acquire(&path.with_extension("lock"))?;

        let mut doc = self.load_document(path)?;
        mutate(&mut doc);

        let tmp = NamedTempFile::new_in(dir).map_err(|e| StateError::io(dir, e))?;
        serde_json::to_writer_pretty(&tmp, &doc)?;
        tmp.persist(path)
            .map_err(|e| StateError::io(path, e.error))?;
        debug!(path = %path.display(), "state document replaced");
        Ok(())
    }
}

fn ensure_object(doc: &mut Value) {
    if !doc.is_object() {
        *doc = json!({});
    }
}

/// Restrict namespace and session components to a single path segment.
fn safe_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Advisory exclusive lock held for the lifetime of the guard.
pub(crate) struct LockGuard {
    file: File,
}

impl LockGuard {
    pub(crate) fn acquire(path: &Path) -> Result<Self, StateError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)
            .map_err(|e| StateError::io(path, e))?;
        file.lock_exclusive().map_err(|e| StateError::io(path, e))?;
        Ok(Self { file })
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // Released even on error paths; close would drop it anyway.
        let _ = FileExt::unlock(&self.file);
    }
}
