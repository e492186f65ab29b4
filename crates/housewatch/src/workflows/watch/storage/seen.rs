use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::super::domain::ListingId;
use super::StoreError;

/// Ids of every listing already considered by an earlier run. Only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeenSet {
    ids: BTreeSet<ListingId>,
    last_updated: Option<DateTime<Utc>>,
}

impl SeenSet {
    pub fn is_new(&self, id: &ListingId) -> bool {
        !self.ids.contains(id)
    }

    /// Equivalent to marking each id individually; order and duplicates are irrelevant.
    pub fn mark_seen<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = ListingId>,
    {
        self.ids.extend(ids);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListingId> {
        self.ids.iter()
    }

    /// Timestamp of the persisted document this set was loaded from, if any.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}

impl FromIterator<ListingId> for SeenSet {
    fn from_iter<T: IntoIterator<Item = ListingId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
            last_updated: None,
        }
    }
}

/// Durable home of the seen-set. Single writer; callers must not run concurrently.
pub trait SeenSetStore: Send + Sync {
    /// Never fails: missing or unreadable state yields an empty set.
    fn load(&self) -> SeenSet;
    /// Replaces the stored set with `seen` in full.
    fn persist(&self, seen: &SeenSet) -> Result<(), StoreError>;
}

/// Seen-set kept as a pretty-printed JSON document, rewritten atomically on persist.
#[derive(Debug, Clone)]
pub struct JsonSeenStore {
    path: PathBuf,
}

impl JsonSeenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Serialize)]
struct SeenDocumentOut<'a> {
    seen_listings: &'a BTreeSet<ListingId>,
    last_updated: DateTime<Utc>,
}

#[derive(Deserialize)]
struct SeenDocumentIn {
    #[serde(default, alias = "seen_houses")]
    seen_listings: StoredIds,
    #[serde(default)]
    last_updated: Option<String>,
}

/// Current documents store a list; the older format keyed ids to their address.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredIds {
    List(Vec<String>),
    Keyed(BTreeMap<String, serde_json::Value>),
}

impl Default for StoredIds {
    fn default() -> Self {
        StoredIds::List(Vec::new())
    }
}

impl StoredIds {
    fn into_ids(self) -> BTreeSet<ListingId> {
        match self {
            StoredIds::List(ids) => ids.into_iter().map(ListingId::new).collect(),
            StoredIds::Keyed(map) => map.into_keys().map(ListingId::new).collect(),
        }
    }
}

impl SeenSetStore for JsonSeenStore {
    fn load(&self) -> SeenSet {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no seen-set yet, starting empty");
                return SeenSet::default();
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "seen-set unreadable, starting empty");
                return SeenSet::default();
            }
        };

        match serde_json::from_str::<SeenDocumentIn>(&raw) {
            Ok(document) => {
                let last_updated = document
                    .last_updated
                    .as_deref()
                    .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
                    .map(|value| value.with_timezone(&Utc));
                let seen = SeenSet {
                    ids: document.seen_listings.into_ids(),
                    last_updated,
                };
                debug!(path = %self.path.display(), count = seen.len(), "seen-set loaded");
                seen
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "seen-set corrupt, starting empty");
                SeenSet::default()
            }
        }
    }

    fn persist(&self, seen: &SeenSet) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|err| StoreError::io(&dir, err))?;

        let mut staged =
            tempfile::NamedTempFile::new_in(&dir).map_err(|err| StoreError::io(&dir, err))?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            let document = SeenDocumentOut {
                seen_listings: &seen.ids,
                last_updated: Utc::now(),
            };
            serde_json::to_writer_pretty(&mut writer, &document).map_err(|source| {
                StoreError::Encode {
                    path: self.path.clone(),
                    source,
                }
            })?;
            writer
                .flush()
                .map_err(|err| StoreError::io(&self.path, err))?;
        }
        staged
            .as_file()
            .sync_all()
            .map_err(|err| StoreError::io(&self.path, err))?;
        staged
            .persist(&self.path)
            .map_err(|err| StoreError::io(&self.path, err.error))?;

        debug!(path = %self.path.display(), count = seen.len(), "seen-set persisted");
        Ok(())
    }
}

/// Process-local store for demos and tests.
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    state: Mutex<SeenSet>,
}

impl MemorySeenStore {
    pub fn with_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = ListingId>,
    {
        Self {
            state: Mutex::new(ids.into_iter().collect()),
        }
    }

    pub fn snapshot(&self) -> SeenSet {
        self.state
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl SeenSetStore for MemorySeenStore {
    fn load(&self) -> SeenSet {
        self.snapshot()
    }

    fn persist(&self, seen: &SeenSet) -> Result<(), StoreError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| StoreError::Unavailable("seen-set mutex poisoned".to_string()))?;
        *guard = seen.clone();
        guard.last_updated = Some(Utc::now());
        Ok(())
    }
}
