use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;

const RULES_FILE: &str = ".devdeck-rules.md";

const WORKSPACE_RULES: &str = "\
# Workspace rules

This is a devdeck-managed git worktree for a single pull request.

- Commit to the PR head branch only; never switch branches here.
- Run the repo's own test suite before handing work back.
- Close the bead you worked on when the change is complete.
";

fn path_to_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("Path contains non-UTF8 characters: {:?}", path))
}

/// Materialize a worktree for `branch` at `wt_path`, checked out from
/// `repo_dir`. Tries the local branch first, then a tracking branch off
/// origin for branches that only exist remotely.
pub async fn add_worktree(repo_dir: &Path, wt_path: &Path, branch: &str) -> Result<()> {
    if let Some(parent) = wt_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .context("Failed to create worktrees directory")?;
    }

    // Best-effort: the branch may only exist on the remote.
    let _ = Command::new("git")
        .args(["fetch", "origin", branch])
        .current_dir(repo_dir)
        .output()
        .await;

    let wt_path_str = path_to_str(wt_path)?;

    let output = Command::new("git")
        .args(["worktree", "add", wt_path_str, branch])
        .current_dir(repo_dir)
        .output()
        .await
        .context("Failed to run git worktree add")?;

    if output.status.success() {
        return Ok(());
    }

    let output = Command::new("git")
        .args([
            "worktree",
            "add",
            wt_path_str,
            "-b",
            branch,
            &format!("origin/{}", branch),
        ])
        .current_dir(repo_dir)
        .output()
        .await
        .context("Failed to run git worktree add -b")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git worktree add failed: {}", stderr.trim());
    }

    Ok(())
}

pub async fn remove_worktree(repo_dir: &Path, wt_path: &Path) -> Result<()> {
    let wt_path_str = path_to_str(wt_path)?;

    let output = Command::new("git")
        .args(["worktree", "remove", "--force", wt_path_str])
        .current_dir(repo_dir)
        .output()
        .await
        .context("Failed to remove git worktree")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git worktree remove failed: {}", stderr.trim());
    }

    Ok(())
}

/// Drop the workspace rules file into an existing worktree. Idempotent:
/// rewriting identical content is a no-op for readers.
pub async fn inject_workspace_rules(wt_path: &Path) -> Result<()> {
    let rules_path = wt_path.join(RULES_FILE);

    if let Ok(existing) = tokio::fs::read_to_string(&rules_path).await {
        if existing == WORKSPACE_RULES {
            return Ok(());
        }
    }

    tokio::fs::write(&rules_path, WORKSPACE_RULES)
        .await
        .with_context(|| format!("Failed to write workspace rules: {:?}", rules_path))?;
    Ok(())
}
