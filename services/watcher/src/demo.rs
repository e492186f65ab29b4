use crate::infra::print_summary;
use clap::Args;
use housewatch::error::AppError;
use housewatch::workflows::watch::{
    Criteria, EnrichmentSettings, FixtureSource, IngestionPipeline, LogNotifier, MemoryJournal,
    MemorySeenStore, PipelineSettings, QueryPartition, SchoolsByTier, ShutdownSignal,
    WatchService,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of consecutive runs; every run after the first should find nothing new.
    #[arg(long, default_value_t = 2)]
    pub(crate) rounds: usize,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self { rounds: 2 }
    }
}

pub(crate) fn demo_criteria() -> Criteria {
    Criteria {
        schools: SchoolsByTier {
            elementary: vec!["Highlands Elementary School".to_string()],
            middle: vec!["Kennedy Junior High School".to_string()],
            high: vec!["Naperville North High School".to_string()],
        },
        ..Criteria::default()
    }
}

pub(crate) fn demo_service() -> WatchService {
    let fixture = Arc::new(FixtureSource::demo());
    let pipeline = IngestionPipeline::new(
        fixture.clone(),
        fixture,
        Arc::new(MemorySeenStore::default()),
        Arc::new(MemoryJournal::new()),
        demo_criteria(),
        PipelineSettings {
            partitions: vec![QueryPartition::Market {
                market: "chicago".to_string(),
            }],
            enrichment: EnrichmentSettings {
                enabled: true,
                concurrency: 2,
                min_interval: Duration::ZERO,
                timeout: Duration::from_secs(5),
            },
        },
    );
    WatchService::new(
        Arc::new(pipeline),
        Arc::new(LogNotifier),
        ShutdownSignal::never(),
    )
}

/// Offline walkthrough over built-in sample listings with in-memory stores.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = demo_service();

    for round in 1..=args.rounds.max(1) {
        println!("=== Round {round} ===");
        let summary = service.run_once().await?;
        print_summary(&summary);
        println!();
    }

    let history = service.history(None)?;
    println!("Journal holds {} entries", history.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_round_finds_nothing_new() {
        let service = demo_service();

        let first = service.run_once().await.expect("first round");
        let first = first.report.expect("report present");
        let ids: Vec<&str> = first.matches.iter().map(|l| l.id().as_str()).collect();
        assert_eq!(ids, vec!["mock_001"]);

        let second = service.run_once().await.expect("second round");
        let second = second.report.expect("report present");
        assert_eq!(second.new_listings, 0);
        assert!(second.matches.is_empty());

        assert_eq!(service.history(None).expect("journal readable").len(), 1);
    }
}
