use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::sync::Mutex;

use crate::models::{PrInfo, ResourceKey};
use crate::session::{add_worktree, inject_workspace_rules, remove_worktree};

/// Project store: projects on disk, their repos, PRs, and PR worktrees.
#[async_trait]
pub trait ProjectManager: Send + Sync {
    /// All projects with their repo counts (fast, local-only).
    async fn list_projects(&self) -> Result<Vec<(String, usize)>>;
    /// Repo names of one project (fast path, no PR data).
    async fn list_repos(&self, project: &str) -> Result<Vec<String>>;
    fn project_dir(&self, project: &str) -> PathBuf;
    fn repo_dir(&self, project: &str, repo: &str) -> PathBuf;
    async fn create_project(&self, name: &str) -> Result<()>;
    async fn delete_project(&self, name: &str) -> Result<()>;
    async fn add_repo(&self, project: &str, url: &str) -> Result<()>;
    async fn remove_repo(&self, project: &str, repo: &str) -> Result<()>;
    /// Open PRs grouped by repo name. May serve cached results.
    async fn list_prs(&self, project: &str) -> Result<HashMap<String, Vec<PrInfo>>>;
    /// Aggregated (repo_count, pr_count) for the dashboard.
    async fn project_summary(&self, project: &str) -> Result<(usize, usize)>;
    async fn clear_pr_cache(&self, project: &str);
    /// Where the worktree for a PR lives (whether or not it exists yet).
    fn pr_worktree_path(&self, project: &str, repo: &str, number: u64) -> PathBuf;
    async fn create_pr_worktree(
        &self,
        project: &str,
        repo: &str,
        number: u64,
        branch: &str,
    ) -> Result<PathBuf>;
    async fn remove_pr_worktree(&self, project: &str, repo: &str, number: u64) -> Result<()>;
    /// Every resource key of a project, for bulk teardown.
    async fn list_resource_keys(&self, project: &str) -> Result<Vec<ResourceKey>>;
}

/// Directory-of-projects layout: `<root>/<project>/<repo>` for clones and
/// `<root>/<project>/.devdeck/worktrees/<repo>-pr-<n>` for PR worktrees.
/// PR listings come from the `gh` CLI and are cached per project until
/// explicitly cleared.
pub struct FsProjectManager {
    root: PathBuf,
    pr_cache: Mutex<HashMap<String, HashMap<String, Vec<PrInfo>>>>,
}

impl FsProjectManager {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            pr_cache: Mutex::new(HashMap::new()),
        }
    }

    fn worktrees_dir(&self, project: &str) -> PathBuf {
        self.project_dir(project).join(".devdeck").join("worktrees")
    }

    async fn repo_dirs(&self, project: &str) -> Result<Vec<String>> {
        let dir = self.project_dir(project);
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .with_context(|| format!("Failed to read project directory: {:?}", dir))?;

        let mut repos = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            if path.join(".git").exists() {
                repos.push(name);
            }
        }
        repos.sort();
        Ok(repos)
    }

    async fn fetch_prs_for_repo(&self, project: &str, repo: &str) -> Vec<PrInfo> {
        let repo_dir = self.repo_dir(project, repo);
        let output = Command::new("gh")
            .args([
                "pr",
                "list",
                "--state",
                "open",
                "--json",
                "number,title,state,headRefName",
            ])
            .current_dir(&repo_dir)
            .output()
            .await;

        let output = match output {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                tracing::debug!(
                    repo,
                    "gh pr list failed: {}",
                    String::from_utf8_lossy(&o.stderr).trim()
                );
                return Vec::new();
            }
            Err(e) => {
                tracing::debug!(repo, "gh pr list could not run: {}", e);
                return Vec::new();
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        match serde_json::from_str::<Vec<PrInfo>>(stdout.trim()) {
            Ok(prs) => prs,
            Err(e) => {
                tracing::debug!(repo, "gh pr list JSON parse failed: {}", e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ProjectManager for FsProjectManager {
    async fn list_projects(&self) -> Result<Vec<(String, usize)>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // missing root degrades to an empty dashboard
            Err(_) => return Ok(Vec::new()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            names.push(name);
        }
        names.sort();

        let mut projects = Vec::with_capacity(names.len());
        for name in names {
            let repo_count = self.repo_dirs(&name).await.unwrap_or_default().len();
            projects.push((name, repo_count));
        }
        Ok(projects)
    }

    async fn list_repos(&self, project: &str) -> Result<Vec<String>> {
        self.repo_dirs(project).await
    }

    fn project_dir(&self, project: &str) -> PathBuf {
        self.root.join(project)
    }

    fn repo_dir(&self, project: &str, repo: &str) -> PathBuf {
        self.project_dir(project).join(repo)
    }

    async fn create_project(&self, name: &str) -> Result<()> {
        if name.is_empty() || name.contains('/') {
            anyhow::bail!("Invalid project name: {:?}", name);
        }
        let dir = self.project_dir(name);
        if dir.exists() {
            anyhow::bail!("Project '{}' already exists", name);
        }
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create project directory: {:?}", dir))?;
        Ok(())
    }

    async fn delete_project(&self, name: &str) -> Result<()> {
        let dir = self.project_dir(name);
        tokio::fs::remove_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to delete project directory: {:?}", dir))?;
        self.clear_pr_cache(name).await;
        Ok(())
    }

    async fn add_repo(&self, project: &str, url: &str) -> Result<()> {
        let dir = self.project_dir(project);
        let output = Command::new("git")
            .args(["clone", url])
            .current_dir(&dir)
            .output()
            .await
            .context("Failed to run git clone")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("git clone failed: {}", stderr.trim());
        }
        Ok(())
    }

    async fn remove_repo(&self, project: &str, repo: &str) -> Result<()> {
        let dir = self.repo_dir(project, repo);
        tokio::fs::remove_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to remove repo directory: {:?}", dir))?;
        self.clear_pr_cache(project).await;
        Ok(())
    }

    async fn list_prs(&self, project: &str) -> Result<HashMap<String, Vec<PrInfo>>> {
        if let Some(cached) = self.pr_cache.lock().await.get(project) {
            return Ok(cached.clone());
        }

        let repos = self.repo_dirs(project).await.unwrap_or_default();
        let fetches = repos
            .iter()
            .map(|repo| self.fetch_prs_for_repo(project, repo));
        let results = join_all(fetches).await;

        let grouped: HashMap<String, Vec<PrInfo>> =
            repos.into_iter().zip(results).collect();

        self.pr_cache
            .lock()
            .await
            .insert(project.to_string(), grouped.clone());
        Ok(grouped)
    }

    async fn project_summary(&self, project: &str) -> Result<(usize, usize)> {
        let repos = self.repo_dirs(project).await.unwrap_or_default();
        let prs = self.list_prs(project).await.unwrap_or_default();
        let pr_count = prs.values().map(|v| v.len()).sum();
        Ok((repos.len(), pr_count))
    }

    async fn clear_pr_cache(&self, project: &str) {
        self.pr_cache.lock().await.remove(project);
    }

    fn pr_worktree_path(&self, project: &str, repo: &str, number: u64) -> PathBuf {
        self.worktrees_dir(project)
            .join(format!("{}-pr-{}", repo, number))
    }

    async fn create_pr_worktree(
        &self,
        project: &str,
        repo: &str,
        number: u64,
        branch: &str,
    ) -> Result<PathBuf> {
        let repo_dir = self.repo_dir(project, repo);
        let wt_path = self.pr_worktree_path(project, repo, number);

        if !wt_path.exists() {
            add_worktree(&repo_dir, &wt_path, branch).await?;
        }
        inject_workspace_rules(&wt_path).await?;
        Ok(wt_path)
    }

    async fn remove_pr_worktree(&self, project: &str, repo: &str, number: u64) -> Result<()> {
        let repo_dir = self.repo_dir(project, repo);
        let wt_path = self.pr_worktree_path(project, repo, number);
        remove_worktree(&repo_dir, &wt_path).await
    }

    async fn list_resource_keys(&self, project: &str) -> Result<Vec<ResourceKey>> {
        let mut keys: Vec<ResourceKey> = self
            .repo_dirs(project)
            .await
            .unwrap_or_default()
            .into_iter()
            .map(ResourceKey::repo)
            .collect();

        let wt_dir = self.worktrees_dir(project);
        if let Ok(mut entries) = tokio::fs::read_dir(&wt_dir).await {
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().to_string();
                if let Some(key) = parse_worktree_dir_name(&name) {
                    keys.push(key);
                }
            }
        }

        Ok(keys)
    }
}

/// Parses `<repo>-pr-<n>` worktree directory names back into PR keys.
fn parse_worktree_dir_name(name: &str) -> Option<ResourceKey> {
    let idx = name.rfind("-pr-")?;
    let number: u64 = name[idx + 4..].parse().ok()?;
    let repo = &name[..idx];
    if repo.is_empty() {
        return None;
    }
    Some(ResourceKey::pr(repo, number))
}
