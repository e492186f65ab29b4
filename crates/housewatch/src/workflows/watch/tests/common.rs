use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;

use crate::workflows::watch::criteria::{Criteria, PropertyRules};
use crate::workflows::watch::domain::{
    DetailRecord, Listing, ListingId, RawRecord, SchoolTier, SchoolsByTier,
};
use crate::workflows::watch::notify::{Notifier, NotifyError};
use crate::workflows::watch::pipeline::{EnrichmentSettings, IngestionPipeline, PipelineSettings};
use crate::workflows::watch::sources::{DetailSource, ListingSource, QueryPartition, SourceError};
use crate::workflows::watch::storage::{
    JournalEntry, MatchJournal, MemoryJournal, MemorySeenStore, SeenSet, SeenSetStore, StoreError,
};

pub(super) const HIGHLANDS: &str = "Highlands Elementary School";
pub(super) const KENNEDY: &str = "Kennedy Junior High School";
pub(super) const NAPERVILLE_NORTH: &str = "Naperville North High School";

pub(super) fn required_schools() -> SchoolsByTier {
    schools(&[HIGHLANDS], &[KENNEDY], &[NAPERVILLE_NORTH])
}

pub(super) fn schools(elementary: &[&str], middle: &[&str], high: &[&str]) -> SchoolsByTier {
    let mut schools = SchoolsByTier::default();
    for (tier, names) in [
        (SchoolTier::Elementary, elementary),
        (SchoolTier::Middle, middle),
        (SchoolTier::High, high),
    ] {
        for name in names {
            schools.push(tier, *name);
        }
    }
    schools
}

pub(super) fn criteria() -> Criteria {
    Criteria {
        property: PropertyRules::default(),
        schools: required_schools(),
    }
}

/// A listing passing every default property rule, with the required schools observed.
pub(super) fn passing_listing(id: &str) -> Listing {
    let mut listing = Listing::new(ListingId::new(id), 750_000);
    listing.address = "123 Main Str".to_string();
    listing.city = "Naperville".to_string();
    listing.state = "IL".to_string();
    listing.zip = "60540".to_string();
    listing.property_type = "Single-Family".to_string();
    listing.year_built = Some(1995);
    listing.schools = schools(
        &["Highlands Elementary"],
        &["Kennedy Jr High"],
        &["North High (Naperville)"],
    );
    listing.url = format!("https://listings.test/{id}");
    listing
}

/// Raw search record whose detail page (served by [`DetailStub`]) lists `schools`.
pub(super) fn raw_record(id: &str, price: i64) -> RawRecord {
    RawRecord {
        source_id: Some(id.to_string()),
        price: Some(price),
        address: Some(format!("{id} Main Str")),
        city: Some("Naperville".to_string()),
        state: Some("IL".to_string()),
        zip: Some("60540".to_string()),
        property_type: Some("Single-Family".to_string()),
        url: Some(format!("https://listings.test/{id}")),
        year_built: Some(1995),
        ..RawRecord::default()
    }
}

pub(super) fn detail_url(id: &str) -> String {
    format!("https://listings.test/{id}")
}

pub(super) fn partition(name: &str) -> QueryPartition {
    QueryPartition::Market {
        market: name.to_string(),
    }
}

/// Search source answering each partition from a script; unknown partitions are empty.
#[derive(Default)]
pub(super) struct ScriptedSource {
    responses: HashMap<String, Result<Vec<RawRecord>, String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedSource {
    pub(super) fn with(mut self, partition: &QueryPartition, records: Vec<RawRecord>) -> Self {
        self.responses.insert(partition.to_string(), Ok(records));
        self
    }

    pub(super) fn failing(mut self, partition: &QueryPartition, error: &str) -> Self {
        self.responses
            .insert(partition.to_string(), Err(error.to_string()));
        self
    }

    pub(super) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl ListingSource for ScriptedSource {
    async fn search(&self, partition: &QueryPartition) -> Result<Vec<RawRecord>, SourceError> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(partition.to_string());
        match self.responses.get(&partition.to_string()) {
            Some(Ok(records)) => Ok(records.clone()),
            Some(Err(error)) => Err(SourceError::Unavailable(error.clone())),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Clone)]
pub(super) enum DetailBehavior {
    Serve(DetailRecord),
    Fail,
    Hang,
}

/// Detail source keyed by URL. Unknown URLs fail.
#[derive(Default)]
pub(super) struct DetailStub {
    pages: HashMap<String, DetailBehavior>,
    requested: Mutex<Vec<String>>,
}

impl DetailStub {
    pub(super) fn serve(mut self, id: &str, schools: SchoolsByTier) -> Self {
        self.pages.insert(
            detail_url(id),
            DetailBehavior::Serve(DetailRecord {
                schools,
                ..DetailRecord::default()
            }),
        );
        self
    }

    pub(super) fn behave(mut self, id: &str, behavior: DetailBehavior) -> Self {
        self.pages.insert(detail_url(id), behavior);
        self
    }

    pub(super) fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("detail mutex poisoned").clone()
    }
}

#[async_trait]
impl DetailSource for DetailStub {
    async fn fetch_detail(&self, url: &str) -> Result<DetailRecord, SourceError> {
        self.requested
            .lock()
            .expect("detail mutex poisoned")
            .push(url.to_string());
        match self.pages.get(url).cloned() {
            Some(DetailBehavior::Serve(record)) => Ok(record),
            Some(DetailBehavior::Hang) => std::future::pending().await,
            Some(DetailBehavior::Fail) | None => {
                Err(SourceError::Unavailable(format!("no page at {url}")))
            }
        }
    }
}

pub(super) fn fast_enrichment() -> EnrichmentSettings {
    EnrichmentSettings {
        enabled: true,
        concurrency: 2,
        min_interval: Duration::ZERO,
        timeout: Duration::from_secs(2),
    }
}

pub(super) struct Harness {
    pub(super) listings: Arc<ScriptedSource>,
    pub(super) details: Arc<DetailStub>,
    pub(super) seen: Arc<MemorySeenStore>,
    pub(super) journal: Arc<MemoryJournal>,
}

impl Harness {
    pub(super) fn new(listings: ScriptedSource, details: DetailStub) -> Self {
        Self {
            listings: Arc::new(listings),
            details: Arc::new(details),
            seen: Arc::new(MemorySeenStore::default()),
            journal: Arc::new(MemoryJournal::new()),
        }
    }

    pub(super) fn pipeline(&self, partitions: Vec<QueryPartition>) -> IngestionPipeline {
        self.pipeline_with(partitions, fast_enrichment())
    }

    pub(super) fn pipeline_with(
        &self,
        partitions: Vec<QueryPartition>,
        enrichment: EnrichmentSettings,
    ) -> IngestionPipeline {
        IngestionPipeline::new(
            self.listings.clone(),
            self.details.clone(),
            self.seen.clone(),
            self.journal.clone(),
            criteria(),
            PipelineSettings {
                partitions,
                enrichment,
            },
        )
    }

    pub(super) fn seen_ids(&self) -> Vec<String> {
        self.seen
            .snapshot()
            .iter()
            .map(|id| id.as_str().to_string())
            .collect()
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    deliveries: Mutex<Vec<Vec<ListingId>>>,
}

impl RecordingNotifier {
    pub(super) fn deliveries(&self) -> Vec<Vec<ListingId>> {
        self.deliveries.lock().expect("notifier mutex poisoned").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, matches: &[Listing]) -> Result<(), NotifyError> {
        self.deliveries
            .lock()
            .expect("notifier mutex poisoned")
            .push(matches.iter().map(|listing| listing.id().clone()).collect());
        Ok(())
    }
}

pub(super) struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn notify(&self, _matches: &[Listing]) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected {
            status: 503,
            body: "mail relay down".to_string(),
        })
    }
}

pub(super) struct ReadOnlySeenStore;

impl SeenSetStore for ReadOnlySeenStore {
    fn load(&self) -> SeenSet {
        SeenSet::default()
    }

    fn persist(&self, _seen: &SeenSet) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }
}

/// Records which thread each store call ran on.
#[derive(Default)]
pub(super) struct ThreadTracingSeenStore {
    inner: MemorySeenStore,
    threads: Mutex<Vec<std::thread::ThreadId>>,
}

impl ThreadTracingSeenStore {
    pub(super) fn threads(&self) -> Vec<std::thread::ThreadId> {
        self.threads.lock().expect("thread log poisoned").clone()
    }

    fn record(&self) {
        self.threads
            .lock()
            .expect("thread log poisoned")
            .push(std::thread::current().id());
    }
}

impl SeenSetStore for ThreadTracingSeenStore {
    fn load(&self) -> SeenSet {
        self.record();
        self.inner.load()
    }

    fn persist(&self, seen: &SeenSet) -> Result<(), StoreError> {
        self.record();
        self.inner.persist(seen)
    }
}

pub(super) struct PanickingSeenStore;

impl SeenSetStore for PanickingSeenStore {
    fn load(&self) -> SeenSet {
        panic!("seen-set backend crashed")
    }

    fn persist(&self, _seen: &SeenSet) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(super) struct ReadOnlyJournal;

impl MatchJournal for ReadOnlyJournal {
    fn append(&self, _entries: &[JournalEntry]) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }

    fn entries(&self) -> Result<Vec<JournalEntry>, StoreError> {
        Err(StoreError::Unavailable("disk full".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
