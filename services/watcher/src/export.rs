use crate::cli::StorageArgs;
use crate::infra::load_config;
use clap::Args;
use housewatch::error::AppError;
use housewatch::workflows::watch::{JournalEntry, JsonLinesJournal, MatchJournal};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct JournalListArgs {
    #[command(flatten)]
    pub(crate) storage: StorageArgs,
    /// Only show the most recent N entries
    #[arg(long)]
    pub(crate) limit: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct JournalExportArgs {
    #[command(flatten)]
    pub(crate) storage: StorageArgs,
    /// Destination CSV file
    #[arg(long)]
    pub(crate) csv: PathBuf,
}

#[derive(Debug, Serialize)]
struct JournalRow<'a> {
    listing_id: &'a str,
    detected_at: String,
    address: &'a str,
    price: u64,
    year_built: Option<i32>,
    elementary: String,
    middle: String,
    high: String,
    url: &'a str,
}

impl<'a> From<&'a JournalEntry> for JournalRow<'a> {
    fn from(entry: &'a JournalEntry) -> Self {
        Self {
            listing_id: entry.listing_id.as_str(),
            detected_at: entry.detected_at.to_rfc3339(),
            address: &entry.address,
            price: entry.price,
            year_built: entry.year_built,
            elementary: entry.schools.elementary.join("; "),
            middle: entry.schools.middle.join("; "),
            high: entry.schools.high.join("; "),
            url: &entry.url,
        }
    }
}

fn open_journal(storage: &StorageArgs) -> Result<JsonLinesJournal, AppError> {
    let config = load_config(storage)?;
    Ok(JsonLinesJournal::new(config.storage.journal_path()))
}

pub(crate) fn list_journal(args: JournalListArgs) -> Result<(), AppError> {
    let journal = open_journal(&args.storage)?;
    let mut entries = journal.entries()?;
    if let Some(limit) = args.limit {
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
    }

    if entries.is_empty() {
        println!("No matches recorded in {}", journal.path().display());
        return Ok(());
    }

    for entry in &entries {
        let year = entry
            .year_built
            .map(|year| year.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "{}  {}  ${}  built {}  {}",
            entry.detected_at.format("%Y-%m-%d %H:%M"),
            entry.address,
            entry.price,
            year,
            entry.url
        );
    }
    Ok(())
}

pub(crate) fn export_journal(args: JournalExportArgs) -> Result<(), AppError> {
    let journal = open_journal(&args.storage)?;
    let entries = journal.entries()?;
    let file = std::fs::File::create(&args.csv)?;
    write_csv(&entries, file)?;
    println!("Exported {} entries to {}", entries.len(), args.csv.display());
    Ok(())
}

pub(crate) fn write_csv<W: Write>(entries: &[JournalEntry], writer: W) -> std::io::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for entry in entries {
        writer.serialize(JournalRow::from(entry))?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use housewatch::workflows::watch::{Listing, ListingId};

    fn entry() -> JournalEntry {
        let mut listing = Listing::new(ListingId::new("mock_001"), 750_000);
        listing.address = "123 Main Street".to_string();
        listing.city = "Naperville".to_string();
        listing.state = "IL".to_string();
        listing.zip = "60540".to_string();
        listing.year_built = Some(1995);
        listing.url = "https://www.redfin.com/mock-001".to_string();
        listing.schools.elementary = vec!["Highlands Elementary School".to_string()];
        listing.schools.high = vec![
            "Naperville North High School".to_string(),
            "Naperville Central High School".to_string(),
        ];
        let detected_at = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp");
        JournalEntry::from_listing(&listing, detected_at)
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("matches.csv");
        let file = std::fs::File::create(&path).expect("create csv");

        write_csv(&[entry()], file).expect("export succeeds");

        let written = std::fs::read_to_string(&path).expect("read csv");
        let mut lines = written.lines();
        assert_eq!(
            lines.next(),
            Some("listing_id,detected_at,address,price,year_built,elementary,middle,high,url")
        );
        let row = lines.next().expect("one data row");
        assert!(row.starts_with("mock_001,2026-03-01T12:00:00+00:00,"));
        assert!(row.contains("\"123 Main Street, Naperville, IL 60540\""));
        assert!(row.contains("Naperville North High School; Naperville Central High School"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_journal_exports_nothing() {
        let mut buffer = Vec::new();
        write_csv(&[], &mut buffer).expect("export succeeds");
        assert!(buffer.is_empty());
    }
}
