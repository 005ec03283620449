//! Scheduling loop around the sync engine.
//!
//! One run fires at startup, then one per day at local midnight. A
//! `try_lock` guard makes triggers skip instead of piling up behind a slow
//! run, and a deadline stops the daemon from waiting on a stuck
//! filesystem call forever (the guard is only released when the blocking
//! run actually returns, so a stuck run is never re-entered).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::Mutex;
use tokio::time::Instant;

use certrelay_core::{config, CertificateStore, SyncConfig};
use certrelay_sync::orchestrator;

use crate::error::{io_err, DaemonError};
use crate::store_file::FileStore;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Load config, start the runtime, and block until shutdown.
pub fn start_blocking(config_path: &Path) -> Result<(), DaemonError> {
    init_tracing();
    let config = config::load_at(config_path)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the daemon loop until ctrl-c.
pub async fn run(config: SyncConfig) -> Result<(), DaemonError> {
    let store = Arc::new(FileStore::new(config.store_path.clone()));
    let guard = Arc::new(Mutex::new(()));

    trigger_run(&config, store.clone(), guard.clone(), "startup").await;

    loop {
        let pause = duration_until_next_midnight(Local::now());
        tracing::info!(sleep_secs = pause.as_secs(), "next sync at local midnight");
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                match signal {
                    Ok(()) => {
                        tracing::info!("received ctrl-c, shutting down");
                        return Ok(());
                    }
                    Err(err) => {
                        return Err(DaemonError::Runtime(format!(
                            "ctrl-c handler failed: {err}"
                        )))
                    }
                }
            }
            _ = tokio::time::sleep(pause) => {
                trigger_run(&config, store.clone(), guard.clone(), "schedule").await;
            }
        }
    }
}

/// Execute one guarded, deadline-bounded sync run.
async fn trigger_run<S>(
    config: &SyncConfig,
    store: Arc<S>,
    guard: Arc<Mutex<()>>,
    source: &'static str,
) where
    S: CertificateStore + Send + Sync + 'static,
{
    let permit = match guard.try_lock_owned() {
        Ok(permit) => permit,
        Err(_) => {
            tracing::warn!(source, "previous sync run still in flight, skipping trigger");
            return;
        }
    };

    let started = Instant::now();
    let deadline = Duration::from_secs(config.run_deadline_secs);
    let run_config = config.clone();
    let handle = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        orchestrator::run_once(store.as_ref(), &run_config)
    });

    match tokio::time::timeout(deadline, handle).await {
        Err(_) => {
            tracing::error!(
                source,
                deadline_secs = config.run_deadline_secs,
                "sync run exceeded its deadline; triggers are skipped until it returns"
            );
        }
        Ok(Err(join_err)) => {
            tracing::error!(source, error = %join_err, "sync task panicked");
        }
        Ok(Ok(Err(err))) => {
            tracing::error!(source, error = %err, "sync run aborted");
        }
        Ok(Ok(Ok(report))) => {
            tracing::info!(
                source,
                processed = report.processed,
                skipped = report.skipped,
                changed = report.changed,
                errored = report.errored,
                duration_ms = started.elapsed().as_millis() as u64,
                "sync run completed"
            );
            if let Ok(json) = serde_json::to_string(&report) {
                tracing::debug!(report = %json, "run report");
            }
        }
    }
}

/// How long to sleep from `now` until the next local midnight.
fn duration_until_next_midnight(now: DateTime<Local>) -> Duration {
    let next = now
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|naive| naive.and_local_timezone(Local).earliest());
    match next {
        Some(next) => (next - now).to_std().unwrap_or(DAY),
        None => DAY,
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
