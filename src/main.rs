use clap::Parser;
use colored::Colorize;
use is_terminal::IsTerminal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod cli;
mod commit;
mod config;
mod credentials;
mod error;
mod git;
mod github;
mod pipeline;
mod publish;
mod remote;
mod session;
mod template;
mod workspace;

use cli::Args;
use error::ExitCategory;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // RUST_LOG wins; otherwise warnings only, or debug with --verbose
    let default_level = if args.verbose { "ginit=debug" } else { "ginit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    // Interrupt exits on the spot and leaves partial remote/local state for the user
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!();
            eprintln!("{}", "Interrupted".red().bold());
            std::process::exit(ExitCategory::Interrupted.code());
        }
    });

    info!("Starting ginit");

    match cli::run(args).await {
        Ok(code) => {
            info!(code, "ginit finished");
            std::process::exit(code);
        }
        Err(e) => {
            error!("Application error: {e:#}");
            eprintln!("{}", format!("{e:#}").red().bold());
            std::process::exit(ExitCategory::Usage.code());
        }
    }
}
