mod config;

use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use memwall_api::{AppState, AppStateInner, Dispatcher, analytics};
use memwall_db::{Store, seed};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memwall=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    info!(
        seed = config.seed,
        interval_secs = config.analytics_interval.as_secs(),
        utc_offset = ?config.utc_offset,
        "Config loaded"
    );

    // Init store
    let store = Store::new();
    if config.seed {
        seed::seed_demo(&store)?;
    }

    // Shared state
    let dispatcher = Dispatcher::new(config.event_capacity);
    let mut inner = AppStateInner::new(store).with_dispatcher(dispatcher.clone());
    if let Some(offset) = config.utc_offset {
        inner = inner.with_utc_offset(offset);
    }
    let state: AppState = inner.into_shared();

    tokio::spawn(log_events(dispatcher));
    let job = tokio::spawn(run_analytics_job(state, config.analytics_interval));

    info!("Memory wall running, Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    job.abort();
    info!("Shutting down");
    Ok(())
}

/// Regenerate the weekly report every `period`, starting immediately.
async fn run_analytics_job(state: AppState, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let state = state.clone();
        let result =
            tokio::task::spawn_blocking(move || analytics::generate_and_save_analytics(&state))
                .await;

        match result {
            Ok(Ok(report)) => debug!(id = %report.id, "Analytics tick done"),
            Ok(Err(e)) => error!("Analytics job failed: {}", e),
            Err(e) => error!("Analytics task panicked: {}", e),
        }
    }
}

async fn log_events(dispatcher: Dispatcher) {
    let mut rx = dispatcher.subscribe();
    loop {
        match rx.recv().await {
            Ok(event) => debug!(?event, "Wall event"),
            Err(RecvError::Lagged(n)) => warn!("Event log lagged, skipped {} events", n),
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memwall_db::tables;

    #[tokio::test]
    async fn analytics_job_runs_immediately_and_repeats() {
        let state = AppStateInner::new(Store::new()).into_shared();
        let job = tokio::spawn(run_analytics_job(state.clone(), Duration::from_millis(50)));

        tokio::time::sleep(Duration::from_millis(180)).await;
        job.abort();

        let reports = state.store.select(tables::ANALYTICS, &[]).unwrap();
        assert!(reports.len() >= 2, "got {} reports", reports.len());
        assert!(analytics::get_weekly_analytics(&state).unwrap().is_some());
    }
}
