use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use super::{BeadInfo, TrackedPane};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Repo,
    Pr,
}

/// An open pull request attached to a PR resource.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PrInfo {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(rename = "headRefName")]
    pub head_branch: String,
}

/// Deterministic identity joining a resource to its tracked panes. Stable
/// and collision-free for the lifetime of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKey {
    Repo { repo: String },
    Pr { repo: String, number: u64 },
}

impl ResourceKey {
    pub fn repo(repo: impl Into<String>) -> Self {
        ResourceKey::Repo { repo: repo.into() }
    }

    pub fn pr(repo: impl Into<String>, number: u64) -> Self {
        ResourceKey::Pr {
            repo: repo.into(),
            number,
        }
    }

    pub fn is_pr(&self) -> bool {
        matches!(self, ResourceKey::Pr { .. })
    }

    pub fn repo_name(&self) -> &str {
        match self {
            ResourceKey::Repo { repo } | ResourceKey::Pr { repo, .. } => repo,
        }
    }

    /// Short form used in pane labels: `svc` or `svc-pr-42`.
    pub fn slug(&self) -> String {
        match self {
            ResourceKey::Repo { repo } => repo.clone(),
            ResourceKey::Pr { repo, number } => format!("{}-pr-{}", repo, number),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKey::Repo { repo } => write!(f, "repo:{}", repo),
            ResourceKey::Pr { repo, number } => write!(f, "pr:{}#{}", repo, number),
        }
    }
}

/// One repo or one PR within a project: the unit the engine tracks panes
/// and beads against.
///
/// Invariant: `pr` is Some iff `kind == ResourceKind::Pr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub repo_name: String,
    pub pr: Option<PrInfo>,
    /// Empty until a worktree exists or is created for this resource.
    pub worktree_path: PathBuf,
    pub beads: Vec<BeadInfo>,
    /// Display-only snapshot copied from the pane tracker.
    pub panes: Vec<TrackedPane>,
    pub loading_prs: bool,
    pub loading_beads: bool,
}

impl Resource {
    pub fn repo(name: impl Into<String>, worktree_path: PathBuf) -> Self {
        Self {
            kind: ResourceKind::Repo,
            repo_name: name.into(),
            pr: None,
            worktree_path,
            beads: Vec::new(),
            panes: Vec::new(),
            loading_prs: false,
            loading_beads: false,
        }
    }

    pub fn pull_request(repo: impl Into<String>, pr: PrInfo, worktree_path: PathBuf) -> Self {
        Self {
            kind: ResourceKind::Pr,
            repo_name: repo.into(),
            pr: Some(pr),
            worktree_path,
            beads: Vec::new(),
            panes: Vec::new(),
            loading_prs: false,
            loading_beads: false,
        }
    }

    pub fn key(&self) -> ResourceKey {
        match (&self.kind, &self.pr) {
            (ResourceKind::Pr, Some(pr)) => ResourceKey::pr(self.repo_name.clone(), pr.number),
            _ => ResourceKey::repo(self.repo_name.clone()),
        }
    }

    pub fn has_worktree(&self) -> bool {
        !self.worktree_path.as_os_str().is_empty()
    }

    pub fn open_bead_count(&self) -> usize {
        self.beads.iter().filter(|b| b.is_open()).count()
    }

    pub fn title(&self) -> String {
        match &self.pr {
            Some(pr) => format!("#{} {}", pr.number, pr.title),
            None => self.repo_name.clone(),
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn key_uniqueness_across_pr_numbers(
            repo in "[a-z][a-z0-9-]{0,20}",
            n1 in 1u64..10_000,
            n2 in 1u64..10_000,
        ) {
            if n1 != n2 {
                prop_assert_ne!(
                    ResourceKey::pr(repo.clone(), n1),
                    ResourceKey::pr(repo, n2),
                    "ResourceKey: different PR numbers must produce different keys"
                );
            }
        }

        #[test]
        fn repo_key_never_equals_pr_key(
            repo in "[a-z][a-z0-9-]{0,20}",
            n in 1u64..10_000,
        ) {
            prop_assert_ne!(
                ResourceKey::repo(repo.clone()),
                ResourceKey::pr(repo, n),
                "ResourceKey: repo and PR keys for the same repo must differ"
            );
        }
    }
}
