//! Run coordination: worker pool, organizer lifecycle, termination protocol.
//!
//! The orchestrator owns the one ordering invariant that matters in this
//! pipeline: [`Notice::Done`] is sent exactly once, and only after every
//! worker has returned. Sending early would make the organizer discard
//! pending records; never sending would hang it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::Result;
use crate::harvest::{self, DeviceOutcome, Notice};
use crate::inventory;
use crate::jobs;
use crate::organize;
use crate::session::SessionFactory;

/// Smallest allowed worker pool.
pub const MIN_WORKERS: usize = 1;

/// Largest worker pool accepted without `--force`.
pub const MAX_WORKERS: usize = 25;

/// Pool size used whenever the override is absent or unusable.
pub const DEFAULT_WORKERS: usize = 10;

/// Resolve a worker-count override.
///
/// Unparseable or out-of-range input is logged and replaced by
/// [`DEFAULT_WORKERS`], never treated as fatal. `force` lifts the upper
/// bound only; a pool below [`MIN_WORKERS`] makes no sense either way.
pub fn resolve_workers(input: Option<&str>, force: bool) -> usize {
    let Some(input) = input else {
        return DEFAULT_WORKERS;
    };
    match input.trim().parse::<i64>() {
        Ok(n) if n < MIN_WORKERS as i64 => {
            warn!("worker count {n} is below {MIN_WORKERS}, using default of {DEFAULT_WORKERS}");
            DEFAULT_WORKERS
        }
        Ok(n) if n > MAX_WORKERS as i64 && !force => {
            warn!(
                "worker count {n} is above {MAX_WORKERS}, using default of {DEFAULT_WORKERS} \
                 (--force overrides)"
            );
            DEFAULT_WORKERS
        }
        Ok(n) => n as usize,
        Err(_) => {
            warn!("worker count {input:?} is not a number, using default of {DEFAULT_WORKERS}");
            DEFAULT_WORKERS
        }
    }
}

/// Inputs for one harvest run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Inventory table of devices and credentials.
    pub inventory: PathBuf,

    /// Directory holding `shows_<device_type>.txt` command lists.
    pub shows_dir: PathBuf,

    /// Parent for the timestamped run root.
    pub output_dir: PathBuf,

    /// Worker pool size (already resolved/clamped).
    pub workers: usize,
}

/// Totals for a completed run.
#[derive(Debug)]
pub struct RunSummary {
    /// The timestamped run root all results ended up under.
    pub root: PathBuf,

    /// Devices submitted to the pool (plus those skipped for a missing
    /// command list).
    pub devices: usize,

    /// Devices whose session ran to the end of its command list.
    pub completed: usize,

    /// Devices that failed outright.
    pub failed: usize,

    /// Result files harvested and reported across all devices.
    pub files: usize,

    pub elapsed: Duration,
}

/// Execute one full harvest run.
///
/// Startup problems (unreadable inventory, uncreatable run root) are fatal;
/// everything after the pool starts is per-device and only logged.
pub async fn run<F>(options: RunOptions, factory: F) -> Result<RunSummary>
where
    F: SessionFactory + 'static,
{
    let start = Instant::now();

    let devices = inventory::load(&options.inventory)?;
    info!(
        "harvesting {} devices with {} workers",
        devices.len(),
        options.workers
    );

    let run_root = prepare_run_root(&options.output_dir)?;
    info!("writing results under {}", run_root.display());

    let command_lists = jobs::preload(
        &options.shows_dir,
        devices.iter().map(|d| d.device_type.as_str()),
    );

    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let organizer = tokio::spawn(organize::organize(run_root.clone(), notice_rx));

    let semaphore = Arc::new(Semaphore::new(options.workers));
    let factory = Arc::new(factory);
    let mut pool = JoinSet::new();

    let mut devices_total = 0usize;
    let mut failed = 0usize;
    for descriptor in devices {
        devices_total += 1;
        let Some(commands) = command_lists.get(&descriptor.device_type).cloned() else {
            warn!(
                "{}: no command list for device type {:?}, skipping",
                descriptor.host, descriptor.device_type
            );
            failed += 1;
            continue;
        };

        let semaphore = semaphore.clone();
        let factory = factory.clone();
        let notices = notice_tx.clone();
        let root = run_root.clone();
        pool.spawn(async move {
            // One permit per device: held for the whole harvest, released
            // when the task returns.
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("worker pool semaphore closed");
            harvest::harvest(factory.as_ref(), descriptor, commands, &root, notices).await
        });
    }

    let mut completed = 0usize;
    let mut files = 0usize;
    while let Some(joined) = pool.join_next().await {
        match joined {
            Ok(report) => match report.outcome {
                DeviceOutcome::Completed {
                    hostname,
                    harvested,
                    failed: skipped,
                } => {
                    completed += 1;
                    files += harvested;
                    info!(
                        "{}: finished as {hostname:?} ({harvested} collected, {skipped} failed)",
                        report.host
                    );
                }
                DeviceOutcome::SessionFailed(err) => {
                    failed += 1;
                    warn!("{}: failed: {err}", report.host);
                }
            },
            Err(err) => {
                failed += 1;
                warn!("harvest task panicked: {err}");
            }
        }
    }

    // Every worker has returned, so nothing can race with the sentinel.
    if notice_tx.send(Notice::Done).is_err() {
        warn!("organizer stopped before the run ended");
    }
    drop(notice_tx);
    match organizer.await {
        Ok(summary) => debug!(
            "organizer moved {} files, skipped {}",
            summary.moved, summary.skipped
        ),
        Err(err) => warn!("organizer task failed: {err}"),
    }

    let elapsed = start.elapsed();
    info!("time elapsed: {:.2}s", elapsed.as_secs_f64());

    Ok(RunSummary {
        root: run_root,
        devices: devices_total,
        completed,
        failed,
        files,
        elapsed,
    })
}

/// Create `<output_dir>/<YYYY-MM-DD HH.MM>/` for this run.
fn prepare_run_root(output_dir: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y-%m-%d %H.%M").to_string();
    let root = output_dir.join(stamp);
    std::fs::create_dir_all(&root)?;
    Ok(root)
}
