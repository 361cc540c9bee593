use std::process::ExitCode;

use clap::Parser;
use log::error;

use harvessh::cli::Cli;
use harvessh::orchestrator::{self, RunOptions};
use harvessh::session::SshSessionFactory;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .format_timestamp(None)
        .init();

    let workers = orchestrator::resolve_workers(cli.threads.as_deref(), cli.force);
    let options = RunOptions {
        inventory: cli.inventory,
        shows_dir: cli.shows,
        output_dir: cli.output,
        workers,
    };

    // Per-device failures are warnings inside the run; only startup and
    // configuration problems produce a nonzero exit.
    match orchestrator::run(options, SshSessionFactory).await {
        Ok(_summary) => ExitCode::SUCCESS,
        Err(err) => {
            error!("startup failed: {err}");
            ExitCode::FAILURE
        }
    }
}
