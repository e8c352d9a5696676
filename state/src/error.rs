use std::path::PathBuf;

use thiserror::Error;

/// Failures inside the persistence layer.
///
/// These never cross the dispatch boundary; callers observe them only as
/// default reads or `false` write results. The variants exist so the
/// degradation paths can log what actually went wrong.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
