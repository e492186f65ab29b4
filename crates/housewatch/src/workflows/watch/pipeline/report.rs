use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::workflows::watch::domain::{Listing, ListingId};

/// Stage of a run. `Failed` may follow any other stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Fetching,
    Parsing,
    Deduplicating,
    Matching,
    Persisting,
    NotifyingHandoff,
    Done,
    Failed,
}

impl RunState {
    pub fn label(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Fetching => "fetching",
            RunState::Parsing => "parsing",
            RunState::Deduplicating => "deduplicating",
            RunState::Matching => "matching",
            RunState::Persisting => "persisting",
            RunState::NotifyingHandoff => "notifying_handoff",
            RunState::Done => "done",
            RunState::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionFailure {
    pub partition: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichmentFailure {
    pub listing_id: ListingId,
    pub error: String,
}

/// What one run did, including every failure it contained.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: RunState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub partitions: usize,
    pub partition_failures: Vec<PartitionFailure>,
    /// Raw records returned across all partitions, before per-run dedup.
    pub fetched: usize,
    /// Records dropped because an earlier partition already returned the same id.
    pub duplicates: usize,
    pub parsed: usize,
    pub parse_failures: Vec<String>,
    pub already_seen: usize,
    pub new_listings: usize,
    pub considered: usize,
    pub rejected: usize,
    pub enrichment_failures: Vec<EnrichmentFailure>,
    pub abandoned: Vec<ListingId>,
    pub cancelled: bool,
    pub matches: Vec<Listing>,
}

impl RunReport {
    pub(crate) fn begin(partitions: usize) -> Self {
        Self {
            state: RunState::Idle,
            started_at: Utc::now(),
            finished_at: None,
            partitions,
            partition_failures: Vec::new(),
            fetched: 0,
            duplicates: 0,
            parsed: 0,
            parse_failures: Vec::new(),
            already_seen: 0,
            new_listings: 0,
            considered: 0,
            rejected: 0,
            enrichment_failures: Vec::new(),
            abandoned: Vec::new(),
            cancelled: false,
            matches: Vec::new(),
        }
    }

    pub(crate) fn advance(&mut self, next: RunState) {
        debug!(from = self.state.label(), to = next.label(), "run state");
        self.state = next;
        if matches!(next, RunState::Done | RunState::Failed) {
            self.finished_at = Some(Utc::now());
        }
    }

    pub fn match_ids(&self) -> Vec<&ListingId> {
        self.matches.iter().map(Listing::id).collect()
    }
}
