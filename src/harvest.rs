//! Per-device harvest worker.
//!
//! One worker owns one device for its whole lifetime: open a session,
//! elevate, derive the hostname from the prompt, then run every command in
//! the device's list, writing each response to a file in the run root and
//! reporting it to the organizer. A failing command is skipped; only a
//! session-level failure abandons the device.

use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::Error;
use crate::fsops;
use crate::inventory::DeviceDescriptor;
use crate::session::{platform, DeviceSession, SessionConfig, SessionFactory};

/// Completion notice for one successfully written result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestRecord {
    /// Canonical hostname, as derived from the device prompt.
    pub hostname: String,

    /// Name of the result file in the run root.
    pub filename: String,
}

/// Message passed from workers to the organizer.
#[derive(Debug)]
pub enum Notice {
    /// A result file is ready to be filed under its host's directory.
    Harvested(HarvestRecord),

    /// No more results will arrive.
    Done,
}

/// What happened to one device.
#[derive(Debug)]
pub enum DeviceOutcome {
    /// The session ran to the end of the command list.
    Completed {
        hostname: String,
        /// Files written and reported.
        harvested: usize,
        /// Commands skipped after a run or write failure.
        failed: usize,
    },

    /// The session could not be opened, elevated, or probed for its prompt.
    SessionFailed(Error),
}

/// Per-device report collected by the orchestrator.
#[derive(Debug)]
pub struct DeviceReport {
    /// The inventory host this report is about.
    pub host: String,
    pub outcome: DeviceOutcome,
}

/// Harvest one device and report every written file to the organizer.
///
/// Never returns an error: every failure mode is folded into the
/// [`DeviceReport`] so one device can never abort the batch.
pub async fn harvest<F: SessionFactory>(
    factory: &F,
    descriptor: DeviceDescriptor,
    commands: Arc<Vec<String>>,
    root: &Path,
    notices: UnboundedSender<Notice>,
) -> DeviceReport {
    let host = descriptor.host.clone();
    debug!("{host}: starting");

    let config = SessionConfig::from_descriptor(descriptor);
    let device_type = config.platform.clone();

    let mut session = match factory.open(config).await {
        Ok(session) => session,
        Err(err) => {
            warn!("{host}: session open failed: {err}");
            return DeviceReport {
                host,
                outcome: DeviceOutcome::SessionFailed(err),
            };
        }
    };

    let outcome = run_commands(&mut session, &device_type, &commands, root, &notices, &host).await;

    // The session is closed on every path once it was opened.
    if let Err(err) = session.close().await {
        debug!("{host}: close failed: {err}");
    }

    match outcome {
        Ok((hostname, harvested, failed)) => {
            debug!("{host}: finished ({harvested} collected, {failed} failed)");
            DeviceReport {
                host,
                outcome: DeviceOutcome::Completed {
                    hostname,
                    harvested,
                    failed,
                },
            }
        }
        Err(err) => {
            warn!("{host}: harvest aborted: {err}");
            DeviceReport {
                host,
                outcome: DeviceOutcome::SessionFailed(err),
            }
        }
    }
}

/// Run the command list on an open session.
///
/// Returns the derived hostname and the harvested/failed counts; an `Err`
/// here means the session itself is unusable (elevation or prompt probing),
/// not that a command failed.
async fn run_commands<S: DeviceSession>(
    session: &mut S,
    device_type: &str,
    commands: &[String],
    root: &Path,
    notices: &UnboundedSender<Notice>,
    host: &str,
) -> Result<(String, usize, usize), Error> {
    session.elevate().await?;

    let platform = platform::lookup(device_type)?;
    let prompt = session.prompt().await?;
    let hostname = platform.hostname_from_prompt(&prompt);
    debug!("{host}: hostname {hostname:?}");

    let mut harvested = 0usize;
    let mut failed = 0usize;
    for command in commands {
        let filename = fsops::sanitize_filename(&hostname, command);

        let output = match session.run(command).await {
            Ok(output) => output,
            Err(err) => {
                warn!("{host}: {command:?} failed: {err}");
                failed += 1;
                continue;
            }
        };

        if let Err(err) = tokio::fs::write(root.join(&filename), output).await {
            warn!("{host}: could not write {filename}: {err}");
            failed += 1;
            continue;
        }

        let record = HarvestRecord {
            hostname: hostname.clone(),
            filename,
        };
        if notices.send(Notice::Harvested(record)).is_err() {
            // Organizer gone; the file stays in the run root.
            warn!("{host}: organizer unavailable, result left in place");
            failed += 1;
        } else {
            harvested += 1;
        }
    }

    Ok((hostname, harvested, failed))
}
