//! Persisted run state: the seen-set of surfaced listing ids and the append-only match journal.

mod journal;
mod seen;

pub use journal::{JournalEntry, JsonLinesJournal, MatchJournal, MemoryJournal};
pub use seen::{JsonSeenStore, MemorySeenStore, SeenSet, SeenSetStore};

use std::path::PathBuf;

/// Storage failure. Fatal to a run: the dedup guarantee depends on persisted state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
