//! # Harvessh
//!
//! Async bulk CLI harvester for fleets of network devices.
//!
//! Harvessh connects to every device listed in an inventory table, runs the
//! inspection command list for the device's platform, writes each command's
//! output to a file, and organizes the results into one folder per device:
//!
//! ```text
//! Output/<YYYY-MM-DD HH.MM>/<hostname>/<command>.txt
//! ```
//!
//! The pipeline is a bounded pool of per-device harvest workers feeding a
//! single organizer task over a channel. Individual device or command
//! failures are logged and skipped; the run always completes and reports its
//! elapsed time.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use harvessh::orchestrator::{self, RunOptions};
//! use harvessh::session::SshSessionFactory;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), harvessh::Error> {
//!     let options = RunOptions {
//!         inventory: "fleet.csv".into(),
//!         shows_dir: "shows".into(),
//!         output_dir: "Output".into(),
//!         workers: 10,
//!     };
//!
//!     let summary = orchestrator::run(options, SshSessionFactory).await?;
//!     println!(
//!         "collected {} files from {} devices in {:.2}s",
//!         summary.files,
//!         summary.devices,
//!         summary.elapsed.as_secs_f64()
//!     );
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod error;
pub mod fsops;
pub mod harvest;
pub mod inventory;
pub mod jobs;
pub mod orchestrator;
pub mod organize;
pub mod session;

// Re-export main types for convenience
pub use error::Error;
pub use harvest::{DeviceOutcome, DeviceReport, HarvestRecord, Notice};
pub use inventory::DeviceDescriptor;
pub use orchestrator::{RunOptions, RunSummary};
pub use session::{DeviceSession, SessionConfig, SessionFactory, SshSessionFactory};
