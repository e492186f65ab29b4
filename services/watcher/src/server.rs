use crate::cli::{RunArgs, WatchArgs};
use crate::infra::{build_service, load_config, print_summary, AppState};
use crate::routes::with_watch_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use housewatch::config::WatchSettings;
use housewatch::error::AppError;
use housewatch::telemetry;
use housewatch::workflows::watch::{ShutdownSignal, ShutdownTrigger, WatchService, WatchServiceError};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Single run, then exit. Ctrl-C stops pending detail lookups but the run still records
/// whatever it completed.
pub(crate) async fn run_once(args: RunArgs) -> Result<(), AppError> {
    let config = load_config(&args.storage)?;
    telemetry::init(&config.telemetry)?;

    let settings = WatchSettings::from_path(&config.settings_path)?;
    let (trigger, shutdown) = ShutdownSignal::new();
    let service = build_service(&config, settings, shutdown)?;
    tokio::spawn(forward_ctrl_c(trigger));

    let summary = service.run_once().await?;
    print_summary(&summary);
    Ok(())
}

pub(crate) async fn watch(mut args: WatchArgs) -> Result<(), AppError> {
    let mut config = load_config(&args.storage)?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(secs) = args.interval_secs.filter(|secs| *secs > 0) {
        config.schedule.interval = Duration::from_secs(secs);
    }

    telemetry::init(&config.telemetry)?;
    let settings = WatchSettings::from_path(&config.settings_path)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let (trigger, shutdown) = ShutdownSignal::new();
    let service = Arc::new(build_service(&config, settings, shutdown.clone())?);

    let app = with_watch_routes(service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        interval_secs = config.schedule.interval.as_secs(),
        "listing watcher ready"
    );

    let scheduler = tokio::spawn(schedule_runs(
        service,
        config.schedule.interval,
        shutdown.clone(),
    ));
    tokio::spawn(forward_ctrl_c(trigger));

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    readiness_flag.store(false, Ordering::Release);

    if let Err(err) = scheduler.await {
        warn!(error = %err, "scheduler task ended abnormally");
    }
    info!("listing watcher stopped");
    Ok(())
}

async fn forward_ctrl_c(trigger: ShutdownTrigger) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("shutdown requested");
            trigger.trigger();
        }
        Err(err) => error!(error = %err, "could not listen for ctrl-c"),
    }
}

/// Fires the first run immediately, then once per period until shutdown. Ticks that
/// arrive while a run is still active are skipped.
async fn schedule_runs(service: Arc<WatchService>, period: Duration, shutdown: ShutdownSignal) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match service.run_once().await {
            Ok(summary) => {
                let matches = summary
                    .report
                    .as_ref()
                    .map(|report| report.matches.len())
                    .unwrap_or(0);
                info!(state = summary.state.label(), matches, "scheduled run finished");
            }
            Err(WatchServiceError::RunInProgress) => {
                info!("previous run still active, skipping tick");
            }
            Err(err) => error!(error = %err, "scheduled run failed"),
        }
    }
}
