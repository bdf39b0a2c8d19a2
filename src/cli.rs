use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "devdeck")]
#[command(about = "Terminal dashboard for projects, pull requests, beads, and tmux panes")]
#[command(version)]
pub struct Cli {
    /// Path to the YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the projects root directory from the config
    #[arg(long)]
    pub projects_root: Option<PathBuf>,
}
