use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::super::domain::{Listing, ListingId, SchoolsByTier};
use super::StoreError;

/// One matched listing as recorded at detection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub listing_id: ListingId,
    pub address: String,
    pub price: u64,
    pub year_built: Option<i32>,
    pub schools: SchoolsByTier,
    pub url: String,
    pub detected_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn from_listing(listing: &Listing, detected_at: DateTime<Utc>) -> Self {
        Self {
            listing_id: listing.id().clone(),
            address: listing.full_address(),
            price: listing.price,
            year_built: listing.year_built,
            schools: listing.schools.clone(),
            url: listing.url.clone(),
            detected_at,
        }
    }
}

/// Append-only record of every match ever detected. Entries are never rewritten.
pub trait MatchJournal: Send + Sync {
    fn append(&self, entries: &[JournalEntry]) -> Result<(), StoreError>;
    /// All entries in append order.
    fn entries(&self) -> Result<Vec<JournalEntry>, StoreError>;
}

/// Journal stored as JSON lines, one entry per line.
#[derive(Debug, Clone)]
pub struct JsonLinesJournal {
    path: PathBuf,
}

impl JsonLinesJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MatchJournal for JsonLinesJournal {
    fn append(&self, entries: &[JournalEntry]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| StoreError::io(parent, err))?;
        }

        // Encode everything first so a serialization failure leaves the file untouched.
        let mut buffer = Vec::new();
        for entry in entries {
            serde_json::to_writer(&mut buffer, entry).map_err(|source| StoreError::Encode {
                path: self.path.clone(),
                source,
            })?;
            buffer.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| StoreError::io(&self.path, err))?;
        if ends_mid_line(&mut file).map_err(|err| StoreError::io(&self.path, err))? {
            warn!(path = %self.path.display(), "journal ends in a torn line, starting a fresh one");
            buffer.insert(0, b'\n');
        }
        file.write_all(&buffer)
            .map_err(|err| StoreError::io(&self.path, err))?;
        file.sync_data()
            .map_err(|err| StoreError::io(&self.path, err))?;

        debug!(path = %self.path.display(), appended = entries.len(), "journal appended");
        Ok(())
    }

    fn entries(&self) -> Result<Vec<JournalEntry>, StoreError> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::io(&self.path, err)),
        };

        let mut entries = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|err| StoreError::io(&self.path, err))?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!(path = %self.path.display(), line = idx + 1, error = %err, "skipping malformed journal line");
                }
            }
        }
        Ok(entries)
    }
}

/// True when the file is non-empty and its last byte is not a newline.
fn ends_mid_line(file: &mut fs::File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MatchJournal for MemoryJournal {
    fn append(&self, entries: &[JournalEntry]) -> Result<(), StoreError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("journal mutex poisoned".to_string()))?;
        guard.extend_from_slice(entries);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<JournalEntry>, StoreError> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable("journal mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }
}
