use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum MuxError {
    #[error("could not run tmux {what}: {source}")]
    Spawn {
        what: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("tmux {what} failed: {detail}")]
    Failed { what: &'static str, detail: String },

    #[error("tmux split-window returned no pane id")]
    NoPaneId,

    #[error("pane cwd is not valid UTF-8: {0}")]
    BadCwd(String),
}

/// Terminal-multiplexer driver. The engine consumes this contract without
/// caring which multiplexer sits behind it; tests substitute a fake.
#[async_trait]
pub trait Multiplexer: Send + Sync {
    /// Split a new pane in `cwd` and return its pane id.
    async fn split_pane(&self, cwd: &Path) -> Result<String>;
    /// Send literal keystrokes followed by Enter.
    async fn send_line(&self, pane_id: &str, text: &str) -> Result<()>;
    async fn kill_pane(&self, pane_id: &str) -> Result<()>;
    /// Hide a pane by breaking it out into a detached window.
    async fn break_pane(&self, pane_id: &str) -> Result<()>;
    /// Restore a previously hidden pane into the current window.
    async fn join_pane(&self, pane_id: &str) -> Result<()>;
    /// Bring a pane into view as a sidebar and give it focus.
    async fn focus_pane(&self, pane_id: &str) -> Result<()>;
    /// The pruning oracle: ids of all currently live panes.
    async fn list_live_panes(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Default)]
pub struct TmuxDriver;

impl TmuxDriver {
    pub fn new() -> Self {
        Self
    }

    async fn run(args: &[&str], what: &'static str) -> Result<std::process::Output, MuxError> {
        let output = Command::new("tmux")
            .args(args)
            .output()
            .await
            .map_err(|source| MuxError::Spawn { what, source })?;

        if !output.status.success() {
            return Err(MuxError::Failed {
                what,
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output)
    }
}

#[async_trait]
impl Multiplexer for TmuxDriver {
    async fn split_pane(&self, cwd: &Path) -> Result<String> {
        let cwd_str = cwd
            .to_str()
            .ok_or_else(|| MuxError::BadCwd(cwd.display().to_string()))?;

        let output = Self::run(
            &["split-window", "-d", "-P", "-F", "#{pane_id}", "-c", cwd_str],
            "split-window",
        )
        .await?;

        let pane_id = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if pane_id.is_empty() {
            return Err(MuxError::NoPaneId.into());
        }
        Ok(pane_id)
    }

    async fn send_line(&self, pane_id: &str, text: &str) -> Result<()> {
        Self::run(&["send-keys", "-t", pane_id, text], "send-keys").await?;
        Self::run(&["send-keys", "-t", pane_id, "Enter"], "send-keys").await?;
        Ok(())
    }

    async fn kill_pane(&self, pane_id: &str) -> Result<()> {
        Self::run(&["kill-pane", "-t", pane_id], "kill-pane").await?;
        Ok(())
    }

    async fn break_pane(&self, pane_id: &str) -> Result<()> {
        Self::run(&["break-pane", "-d", "-s", pane_id], "break-pane").await?;
        Ok(())
    }

    async fn join_pane(&self, pane_id: &str) -> Result<()> {
        Self::run(&["join-pane", "-h", "-s", pane_id], "join-pane").await?;
        Ok(())
    }

    async fn focus_pane(&self, pane_id: &str) -> Result<()> {
        // The pane may already be in the current window; the join is then a
        // no-op failure and only the select matters.
        let _ = Self::run(&["join-pane", "-h", "-s", pane_id], "join-pane").await;
        Self::run(&["select-pane", "-t", pane_id], "select-pane").await?;
        Ok(())
    }

    async fn list_live_panes(&self) -> Result<Vec<String>> {
        let output = Self::run(&["list-panes", "-a", "-F", "#{pane_id}"], "list-panes").await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mux_error_messages_name_the_subcommand() {
        let err = MuxError::Failed {
            what: "kill-pane",
            detail: "no such pane".to_string(),
        };
        assert_eq!(err.to_string(), "tmux kill-pane failed: no such pane");
    }

    #[test]
    fn bad_cwd_carries_the_path() {
        let err = MuxError::BadCwd("/tmp/weird".to_string());
        assert!(err.to_string().contains("/tmp/weird"));
    }
}
