use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use crate::models::BeadInfo;

/// Issue-tracker source: open beads for a repo or PR worktree.
#[async_trait]
pub trait BeadSource: Send + Sync {
    async fn open_beads(&self, worktree: &Path) -> Result<Vec<BeadInfo>>;
}

/// Reads beads from the `bd` CLI, which resolves its database from the
/// working directory it is invoked in.
pub struct BeadsCli {
    bin: String,
}

impl BeadsCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }
}

#[async_trait]
impl BeadSource for BeadsCli {
    async fn open_beads(&self, worktree: &Path) -> Result<Vec<BeadInfo>> {
        let output = Command::new(&self.bin)
            .args(["list", "--status", "open", "--json"])
            .current_dir(worktree)
            .output()
            .await
            .with_context(|| format!("Failed to run {} list", self.bin))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("{} list failed: {}", self.bin, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_bead_list(&stdout)
    }
}

fn parse_bead_list(json: &str) -> Result<Vec<BeadInfo>> {
    let trimmed = json.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("Failed to parse bead list JSON")
}
