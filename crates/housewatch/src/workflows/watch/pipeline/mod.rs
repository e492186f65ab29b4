//! One ingestion run: fetch, parse, dedup against the seen-set, enrich, match, persist.

mod report;
mod shutdown;
mod throttle;

pub use report::{EnrichmentFailure, PartitionFailure, RunReport, RunState};
pub use shutdown::{ShutdownSignal, ShutdownTrigger};
pub use throttle::RequestGate;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::criteria::{Criteria, CriteriaMatcher, MatchOutcome};
use super::domain::{DetailRecord, Listing, ListingId, RawRecord};
use super::sources::{DetailSource, ListingSource, QueryPartition, SourceError};
use super::storage::{JournalEntry, MatchJournal, SeenSetStore, StoreError};

/// Per-listing detail lookup policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentSettings {
    pub enabled: bool,
    /// Upper bound on detail lookups in flight at once; never below 1.
    pub concurrency: usize,
    /// Minimum spacing between successive lookup dispatches.
    pub min_interval: Duration,
    pub timeout: Duration,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            concurrency: 4,
            min_interval: Duration::from_millis(1000),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub partitions: Vec<QueryPartition>,
    pub enrichment: EnrichmentSettings,
}

/// Failure that ends a run in [`RunState::Failed`]. Partition, record and enrichment
/// failures never surface here; they are recorded on the [`RunReport`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no query target configured: set search.partitions, region_id, latitude/longitude or market")]
    NoQueryTarget,
    #[error("could not load seen-set: {0}")]
    SeenLoad(#[source] StoreError),
    #[error("could not persist seen-set: {0}")]
    SeenPersistence(#[source] StoreError),
    #[error("could not append to match journal: {0}")]
    JournalAppend(#[source] StoreError),
}

impl PipelineError {
    /// Stage the run was in when it failed.
    pub fn failed_in(&self) -> RunState {
        match self {
            PipelineError::NoQueryTarget => RunState::Idle,
            PipelineError::SeenLoad(_) => RunState::Deduplicating,
            PipelineError::SeenPersistence(_) => RunState::Persisting,
            PipelineError::JournalAppend(_) => RunState::NotifyingHandoff,
        }
    }
}

enum Enrichment {
    Ready(Listing),
    Degraded(Listing, EnrichmentFailure),
    Abandoned(ListingId),
}

#[derive(Debug)]
enum LookupError {
    NoUrl,
    Source(SourceError),
    TimedOut(Duration),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::NoUrl => write!(f, "listing has no detail url"),
            LookupError::Source(err) => write!(f, "{err}"),
            LookupError::TimedOut(after) => write!(f, "timed out after {}ms", after.as_millis()),
        }
    }
}

/// Orchestrates runs against one seen-set. Runs must not overlap; [`crate::workflows::watch::WatchService`]
/// enforces that for callers sharing a pipeline.
pub struct IngestionPipeline {
    listings: Arc<dyn ListingSource>,
    details: Arc<dyn DetailSource>,
    seen: Arc<dyn SeenSetStore>,
    journal: Arc<dyn MatchJournal>,
    matcher: CriteriaMatcher,
    settings: PipelineSettings,
    gate: RequestGate,
}

impl IngestionPipeline {
    pub fn new(
        listings: Arc<dyn ListingSource>,
        details: Arc<dyn DetailSource>,
        seen: Arc<dyn SeenSetStore>,
        journal: Arc<dyn MatchJournal>,
        criteria: Criteria,
        mut settings: PipelineSettings,
    ) -> Self {
        settings.enrichment.concurrency = settings.enrichment.concurrency.max(1);
        let gate = RequestGate::new(settings.enrichment.min_interval);
        Self {
            listings,
            details,
            seen,
            journal,
            matcher: CriteriaMatcher::new(criteria),
            settings,
            gate,
        }
    }

    pub fn criteria(&self) -> &Criteria {
        self.matcher.criteria()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn journal(&self) -> Arc<dyn MatchJournal> {
        Arc::clone(&self.journal)
    }

    pub fn seen_store(&self) -> Arc<dyn SeenSetStore> {
        Arc::clone(&self.seen)
    }

    /// Executes one run. Returned matches keep the order the source produced them in.
    pub async fn run(&self, shutdown: &ShutdownSignal) -> Result<RunReport, PipelineError> {
        if self.settings.partitions.is_empty() {
            error!("no query target configured, aborting run before any fetch");
            return Err(PipelineError::NoQueryTarget);
        }

        let mut report = RunReport::begin(self.settings.partitions.len());

        report.advance(RunState::Fetching);
        let raw = self.fetch_all(&mut report).await;

        report.advance(RunState::Parsing);
        let parsed = parse_all(raw, &mut report);

        report.advance(RunState::Deduplicating);
        let store = Arc::clone(&self.seen);
        let mut seen = on_blocking_pool(move || Ok(store.load()))
            .await
            .map_err(|err| {
                error!(error = %err, "seen-set load did not complete");
                PipelineError::SeenLoad(err)
            })?;
        let fresh: Vec<Listing> = parsed
            .into_iter()
            .filter(|listing| seen.is_new(listing.id()))
            .collect();
        report.new_listings = fresh.len();
        report.already_seen = report.parsed - fresh.len();
        info!(
            new = report.new_listings,
            already_seen = report.already_seen,
            "deduplicated against seen-set"
        );

        report.advance(RunState::Matching);
        let considered = self.enrich_all(fresh, shutdown, &mut report).await;

        let mut matches = Vec::new();
        for listing in &considered {
            match self.matcher.evaluate(listing) {
                MatchOutcome::Matched => {
                    info!(listing_id = %listing.id(), address = %listing.full_address(), "listing matched");
                    matches.push(listing.clone());
                }
                MatchOutcome::Rejected(reason) => {
                    debug!(listing_id = %listing.id(), reason = %reason.summary(), "listing rejected");
                    report.rejected += 1;
                }
            }
        }
        report.considered = considered.len();

        report.advance(RunState::Persisting);
        seen.mark_seen(considered.iter().map(|listing| listing.id().clone()));
        let store = Arc::clone(&self.seen);
        if let Err(err) = on_blocking_pool(move || store.persist(&seen)).await {
            error!(error = %err, "seen-set persistence failed");
            return Err(PipelineError::SeenPersistence(err));
        }

        report.advance(RunState::NotifyingHandoff);
        let detected_at = Utc::now();
        let entries: Vec<JournalEntry> = matches
            .iter()
            .map(|listing| JournalEntry::from_listing(listing, detected_at))
            .collect();
        let journal = Arc::clone(&self.journal);
        if let Err(err) = on_blocking_pool(move || journal.append(&entries)).await {
            error!(error = %err, "match journal append failed");
            return Err(PipelineError::JournalAppend(err));
        }

        report.matches = matches;
        report.advance(RunState::Done);
        info!(
            matches = report.matches.len(),
            considered = report.considered,
            partition_failures = report.partition_failures.len(),
            parse_failures = report.parse_failures.len(),
            abandoned = report.abandoned.len(),
            "run complete"
        );
        Ok(report)
    }

    async fn fetch_all(&self, report: &mut RunReport) -> Vec<RawRecord> {
        let mut identifiers = HashSet::new();
        let mut records = Vec::new();

        for partition in &self.settings.partitions {
            match self.listings.search(partition).await {
                Ok(batch) => {
                    debug!(partition = %partition, records = batch.len(), "partition fetched");
                    for record in batch {
                        report.fetched += 1;
                        let first_sighting = match record.identifier() {
                            Some(id) => identifiers.insert(id.to_string()),
                            None => true,
                        };
                        if first_sighting {
                            records.push(record);
                        } else {
                            report.duplicates += 1;
                        }
                    }
                }
                Err(err) => {
                    warn!(partition = %partition, error = %err, "partition fetch failed, skipping");
                    report.partition_failures.push(PartitionFailure {
                        partition: partition.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            unique = records.len(),
            duplicates = report.duplicates,
            "fetch complete"
        );
        records
    }

    async fn enrich_all(
        &self,
        fresh: Vec<Listing>,
        shutdown: &ShutdownSignal,
        report: &mut RunReport,
    ) -> Vec<Listing> {
        if !self.settings.enrichment.enabled {
            return fresh;
        }

        let outcomes: Vec<Enrichment> = stream::iter(fresh)
            .map(|listing| self.enrich_one(listing, shutdown))
            .buffered(self.settings.enrichment.concurrency)
            .collect()
            .await;

        let mut considered = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Enrichment::Ready(listing) => considered.push(listing),
                Enrichment::Degraded(listing, failure) => {
                    report.enrichment_failures.push(failure);
                    considered.push(listing);
                }
                Enrichment::Abandoned(id) => report.abandoned.push(id),
            }
        }
        if !report.abandoned.is_empty() {
            report.cancelled = true;
            warn!(
                abandoned = report.abandoned.len(),
                "shutdown raised, abandoned listings stay unseen"
            );
        }
        considered
    }

    async fn enrich_one(&self, mut listing: Listing, shutdown: &ShutdownSignal) -> Enrichment {
        if shutdown.is_raised() {
            return Enrichment::Abandoned(listing.id().clone());
        }

        let lookup = tokio::select! {
            biased;
            _ = shutdown.cancelled() => None,
            result = self.lookup(&listing.url) => Some(result),
        };

        match lookup {
            None => {
                debug!(listing_id = %listing.id(), "detail lookup abandoned");
                Enrichment::Abandoned(listing.id().clone())
            }
            Some(Ok(detail)) => {
                listing.apply_detail(detail);
                Enrichment::Ready(listing)
            }
            Some(Err(err)) => {
                warn!(listing_id = %listing.id(), url = %listing.url, error = %err, "detail lookup failed, matching without school data");
                listing.apply_detail(DetailRecord::default());
                let failure = EnrichmentFailure {
                    listing_id: listing.id().clone(),
                    error: err.to_string(),
                };
                Enrichment::Degraded(listing, failure)
            }
        }
    }

    async fn lookup(&self, url: &str) -> Result<DetailRecord, LookupError> {
        if url.trim().is_empty() {
            return Err(LookupError::NoUrl);
        }

        self.gate.wait().await;
        let timeout = self.settings.enrichment.timeout;
        match tokio::time::timeout(timeout, self.details.fetch_detail(url)).await {
            Ok(Ok(detail)) => Ok(detail),
            Ok(Err(err)) => Err(LookupError::Source(err)),
            Err(_) => Err(LookupError::TimedOut(timeout)),
        }
    }
}

/// Store calls do synchronous file I/O and fsync; keep them off the async workers.
async fn on_blocking_pool<T, F>(task: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| StoreError::Unavailable(format!("storage task did not complete: {err}")))?
}

fn parse_all(raw: Vec<RawRecord>, report: &mut RunReport) -> Vec<Listing> {
    let mut listings = Vec::with_capacity(raw.len());
    for record in raw {
        match Listing::from_raw(record) {
            Ok(listing) => listings.push(listing),
            Err(err) => {
                warn!(error = %err, "dropping malformed record");
                report.parse_failures.push(err.to_string());
            }
        }
    }
    report.parsed = listings.len();
    listings
}
