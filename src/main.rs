mod cli;
mod config;
mod error;
mod extract;
mod filter;
mod handler;
mod model;
mod providers;
mod report;
mod team;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use cli::Command;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr so the summary line on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match cli::parse_args(&args)? {
        Command::Help => cli::print_help(),
        Command::Report(report_args) => cli::handle_report(report_args).await?,
    }

    Ok(())
}
