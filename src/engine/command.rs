use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::models::{ProjectSummary, Resource, ResourceKey};

/// What gets typed into a freshly spawned pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    Shell,
    Agent,
    Ralph,
}

/// Asynchronous effects a transition may request. The runtime executes each
/// on its own task; results come back as new messages. Transitions stay pure.
#[derive(Debug)]
pub enum Command {
    // dashboard pipeline
    LoadProjects,
    EnrichProjects {
        summaries: Vec<ProjectSummary>,
    },

    // project-detail pipeline
    LoadRepos {
        project: String,
        /// Manual refresh drops cached PR listings before the scan. In the
        /// same execution path, so the cache cannot be re-read stale by the
        /// PR fetch that follows.
        clear_cache: bool,
    },
    FetchPrs {
        project: String,
        /// Phase-1 repo resources, in display order. The merge walks this
        /// list, never the arrival order of any fetch.
        repos: Vec<Resource>,
    },
    FetchBeads {
        project: String,
        /// Length of the resource list the result will be attached to.
        total: usize,
        /// (resource index, worktree dir) for resources with a worktree.
        targets: Vec<(usize, PathBuf)>,
    },
    RefreshPanes {
        project: String,
        keys: Vec<ResourceKey>,
    },
    ScheduleTick,

    // project and resource mutations
    CreateProject {
        name: String,
    },
    DeleteProject {
        name: String,
    },
    AddRepo {
        project: String,
        url: String,
    },
    RemoveRepo {
        project: String,
        repo: String,
    },
    RemoveResource {
        project: String,
        key: ResourceKey,
    },

    // worktrees and panes
    EnsureWorktree {
        project: String,
        repo: String,
        number: u64,
        branch: String,
        launch: LaunchKind,
    },
    SpawnPane {
        project: String,
        key: ResourceKey,
        dir: PathBuf,
        launch: LaunchKind,
        /// Present for supervised agent runs; dropping the sender side stops
        /// nothing, an explicit cancel only ends progress reporting.
        cancel: Option<oneshot::Receiver<()>>,
    },
    FocusPane {
        index: usize,
    },
    HidePanes {
        key: ResourceKey,
    },
    ShowPanes {
        key: ResourceKey,
    },
}
