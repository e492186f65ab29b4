use crate::cli::StorageArgs;
use housewatch::config::{AppConfig, SourceSettings, WatchSettings};
use housewatch::error::AppError;
use housewatch::workflows::watch::{
    DetailSource, EmailNotifier, FixtureSource, IngestionPipeline, JsonLinesJournal,
    JsonSeenStore, ListingSource, LogNotifier, Notifier, PipelineSettings, RedfinClient,
    RunSummary, ShutdownSignal, WatchService,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads process configuration and applies command-line overrides.
pub(crate) fn load_config(storage: &StorageArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = storage.config.clone() {
        config.settings_path = path;
    }
    if let Some(dir) = storage.data_dir.clone() {
        config.storage.data_dir = dir;
    }
    Ok(config)
}

fn build_sources(
    settings: &WatchSettings,
) -> Result<(Arc<dyn ListingSource>, Arc<dyn DetailSource>), AppError> {
    match &settings.source {
        SourceSettings::Redfin => {
            let client = Arc::new(RedfinClient::new(
                settings.search.filters.clone(),
                settings.search.timeout(),
                settings.search.user_agent.as_deref(),
            )?);
            let listings: Arc<dyn ListingSource> = client.clone();
            let details: Arc<dyn DetailSource> = client;
            Ok((listings, details))
        }
        SourceSettings::Fixture { path } => {
            info!(path = %path.display(), "using fixture listing source");
            let fixture = Arc::new(FixtureSource::from_path(path)?);
            let listings: Arc<dyn ListingSource> = fixture.clone();
            let details: Arc<dyn DetailSource> = fixture;
            Ok((listings, details))
        }
    }
}

pub(crate) fn build_notifier(settings: &WatchSettings) -> Result<Arc<dyn Notifier>, AppError> {
    match &settings.email {
        Some(email) => Ok(Arc::new(EmailNotifier::new(email.clone())?)),
        None => {
            info!("no email settings configured, matches will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Wires file-backed stores, the configured source and notifier into a service.
pub(crate) fn build_service(
    config: &AppConfig,
    settings: WatchSettings,
    shutdown: ShutdownSignal,
) -> Result<WatchService, AppError> {
    let partitions = settings.search.resolve_partitions();
    if partitions.is_empty() {
        warn!("settings define no search region, bounding box or market");
    }

    let (listings, details) = build_sources(&settings)?;
    let notifier = build_notifier(&settings)?;
    let seen = Arc::new(JsonSeenStore::new(config.storage.seen_path()));
    let journal = Arc::new(JsonLinesJournal::new(config.storage.journal_path()));

    let pipeline = IngestionPipeline::new(
        listings,
        details,
        seen,
        journal,
        settings.criteria,
        PipelineSettings {
            partitions,
            enrichment: settings.enrichment.to_settings(),
        },
    );

    Ok(WatchService::new(Arc::new(pipeline), notifier, shutdown))
}

pub(crate) fn print_summary(summary: &RunSummary) {
    println!(
        "Run finished at {} ({})",
        summary.finished_at.to_rfc3339(),
        summary.state.label()
    );

    if let Some(error) = &summary.error {
        println!("  error: {error}");
    }

    if let Some(report) = &summary.report {
        println!(
            "  fetched {} ({} duplicates), parsed {}, already seen {}, new {}",
            report.fetched,
            report.duplicates,
            report.parsed,
            report.already_seen,
            report.new_listings
        );
        if !report.partition_failures.is_empty() {
            println!("  failed partitions:");
            for failure in &report.partition_failures {
                println!("    - {}: {}", failure.partition, failure.error);
            }
        }
        if !report.enrichment_failures.is_empty() {
            println!(
                "  {} detail lookups failed",
                report.enrichment_failures.len()
            );
        }
        if report.cancelled {
            println!(
                "  cancelled; {} listings left for the next run",
                report.abandoned.len()
            );
        }
        if report.matches.is_empty() {
            println!("  no new matches");
        } else {
            println!("  {} new matches:", report.matches.len());
            for listing in &report.matches {
                println!(
                    "    - {} {} {}",
                    listing.formatted_price(),
                    listing.full_address(),
                    listing.url
                );
            }
        }
    }

    println!("  notification: {:?}", summary.notification);
}
