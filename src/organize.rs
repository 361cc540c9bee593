//! Single consumer relocating harvested files into per-host folders.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::fsops;
use crate::harvest::{HarvestRecord, Notice};

/// Totals reported by the organizer when it terminates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OrganizeSummary {
    pub moved: usize,
    pub skipped: usize,
}

/// Consume notices until [`Notice::Done`], filing each record's result file
/// under `<root>/<hostname>/`.
///
/// No record is allowed to crash this loop: every failure is logged and the
/// next notice is processed. A channel that closes without `Done` also ends
/// the loop — every sender is gone, so nothing more can arrive.
pub async fn organize(root: PathBuf, mut notices: UnboundedReceiver<Notice>) -> OrganizeSummary {
    let mut summary = OrganizeSummary::default();
    while let Some(notice) = notices.recv().await {
        match notice {
            Notice::Done => {
                debug!("organizer: done");
                break;
            }
            Notice::Harvested(record) => {
                if relocate(&root, &record).await {
                    summary.moved += 1;
                } else {
                    summary.skipped += 1;
                }
            }
        }
    }
    summary
}

/// Move one result file from the run root into its host's directory, under
/// its original command-derived name.
async fn relocate(root: &Path, record: &HarvestRecord) -> bool {
    let prefix = format!("{}_", record.hostname);
    let Some(destination) = record.filename.strip_prefix(&prefix) else {
        warn!("organizer: malformed record {record:?}");
        return false;
    };

    let host_dir = fsops::ensure_dir(&root.join(&record.hostname));
    let from = root.join(&record.filename);
    let to = host_dir.join(destination);
    match tokio::fs::rename(&from, &to).await {
        Ok(()) => {
            debug!("organizer: {} -> {}", record.filename, to.display());
            true
        }
        Err(err) => {
            warn!("organizer: could not move {}: {err}", from.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn record(hostname: &str, filename: &str) -> Notice {
        Notice::Harvested(HarvestRecord {
            hostname: hostname.to_string(),
            filename: filename.to_string(),
        })
    }

    #[tokio::test]
    async fn test_moves_files_until_done() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        std::fs::write(root.join("r1_show_version.txt"), "IOS 15.2\n").unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(record("r1", "r1_show_version.txt")).unwrap();
        tx.send(Notice::Done).unwrap();

        let summary = organize(root.clone(), rx).await;
        assert_eq!(summary, OrganizeSummary { moved: 1, skipped: 0 });

        let moved = root.join("r1").join("show_version.txt");
        assert_eq!(std::fs::read_to_string(moved).unwrap(), "IOS 15.2\n");
        assert!(!root.join("r1_show_version.txt").exists());
    }

    #[tokio::test]
    async fn test_malformed_and_missing_records_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();

        let (tx, rx) = mpsc::unbounded_channel();
        // Filename does not carry the hostname prefix.
        tx.send(record("r1", "unrelated.txt")).unwrap();
        // Well-formed record, but the file was never written.
        tx.send(record("r2", "r2_show_version.txt")).unwrap();
        tx.send(Notice::Done).unwrap();

        let summary = organize(root, rx).await;
        assert_eq!(summary, OrganizeSummary { moved: 0, skipped: 2 });
    }

    #[tokio::test]
    async fn test_closed_channel_terminates_loop() {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::unbounded_channel::<Notice>();
        drop(tx);

        let summary = organize(tmp.path().to_path_buf(), rx).await;
        assert_eq!(summary, OrganizeSummary::default());
    }

    #[tokio::test]
    async fn test_records_after_done_are_ignored() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().to_path_buf();
        std::fs::write(root.join("r1_show_version.txt"), "data").unwrap();

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Notice::Done).unwrap();
        tx.send(record("r1", "r1_show_version.txt")).unwrap();

        let summary = organize(root.clone(), rx).await;
        assert_eq!(summary, OrganizeSummary::default());
        assert!(root.join("r1_show_version.txt").exists());
    }
}
