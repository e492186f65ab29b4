//! Listing watch workflow: ingest listings from a search source, drop the ones already
//! considered in earlier runs, match the rest against buyer criteria and hand new matches
//! to a notifier.
//!
//! A listing is marked seen (and the seen-set persisted) before any notification is
//! attempted, so it is offered at most once even when delivery fails.

pub mod criteria;
pub mod domain;
pub mod notify;
pub mod pipeline;
pub mod router;
pub mod service;
pub mod sources;
pub mod storage;

#[cfg(test)]
mod tests;

pub use criteria::{
    tokens_match, Criteria, CriteriaMatcher, MatchOutcome, PropertyRules, RejectionReason,
};
pub use domain::{
    DetailRecord, Listing, ListingId, ListingParseError, RawRecord, SchoolTier, SchoolsByTier,
};
pub use notify::{EmailNotifier, EmailSettings, LogNotifier, Notifier, NotifyError};
pub use pipeline::{
    EnrichmentFailure, EnrichmentSettings, IngestionPipeline, PartitionFailure, PipelineError,
    PipelineSettings, RequestGate, RunReport, RunState, ShutdownSignal, ShutdownTrigger,
};
pub use router::watch_router;
pub use service::{NotificationStatus, RunSummary, WatchService, WatchServiceError};
pub use sources::redfin::SearchFilters;
pub use sources::{
    DetailSource, FixtureSource, ListingSource, QueryPartition, RedfinClient, SourceError,
};
pub use storage::{
    JournalEntry, JsonLinesJournal, JsonSeenStore, MatchJournal, MemoryJournal, MemorySeenStore,
    SeenSet, SeenSetStore, StoreError,
};
