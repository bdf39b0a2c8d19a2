use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod engine;
mod models;
mod project;
mod session;
mod ui;

use cli::Cli;
use config::Config;
use engine::{Collaborators, Runtime};
use project::{BeadsCli, FsProjectManager};
use session::{Multiplexer, PaneTracker, TmuxDriver};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // logs go to a file; stderr would fight the alternate screen
    let log_dir = Config::log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {:?}", log_dir))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "devdeck.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(writer)
        .with_ansi(false)
        .init();

    let mut config = Config::load(cli.config)?;
    if let Some(root) = cli.projects_root {
        config = config.with_projects_root(root);
    }
    let config = Arc::new(config);
    tracing::info!("starting with projects root {:?}", config.projects_root);

    let mux: Arc<dyn Multiplexer> = Arc::new(TmuxDriver::new());
    let collab = Collaborators {
        config: config.clone(),
        projects: Arc::new(FsProjectManager::new(config.projects_root.clone())),
        beads: Arc::new(BeadsCli::new(config.bead_command.clone())),
        mux: mux.clone(),
        tracker: Arc::new(tokio::sync::Mutex::new(PaneTracker::new(mux))),
    };

    Runtime::new(collab).run().await
}
