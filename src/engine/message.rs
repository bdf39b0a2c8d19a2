use std::collections::HashMap;
use std::path::PathBuf;

use crossterm::event::KeyEvent;

use crate::engine::LaunchKind;
use crate::models::{BeadInfo, PaneKind, ProjectSummary, Resource, ResourceKey, TrackedPane};

/// Everything the event loop can process. Each variant is handled by a
/// dedicated transition in `update`; adding one is a compile-time-checked
/// change.
#[derive(Debug)]
pub enum Msg {
    // input
    Key(KeyEvent),
    Resize(u16, u16),
    /// Periodic resync timer fired.
    Tick,

    // dashboard pipeline
    /// Phase 1: projects and repo counts, PR/bead counts still sentinels.
    ProjectsListed(Vec<ProjectSummary>),
    /// Phase 2: fully enriched summaries, replaces the list atomically.
    ProjectsEnriched(Vec<ProjectSummary>),

    // project-detail pipeline
    /// Phase 1: repo resources straight from disk.
    ReposLoaded {
        project: String,
        resources: Vec<Resource>,
    },
    /// Phase 2: repo list merged with fetched PRs, order-preserving.
    PrsMerged {
        project: String,
        resources: Vec<Resource>,
    },
    /// Phase 3: beads per resource index; empty for failures.
    BeadsAttached {
        project: String,
        beads: Vec<Vec<BeadInfo>>,
    },
    PanesRefreshed {
        project: String,
        panes: HashMap<ResourceKey, Vec<TrackedPane>>,
    },

    // project and resource mutations
    ProjectCreated {
        name: String,
        error: Option<String>,
    },
    ProjectDeleted {
        name: String,
        error: Option<String>,
    },
    RepoAdded {
        project: String,
        error: Option<String>,
    },
    RepoRemoved {
        project: String,
        repo: String,
        error: Option<String>,
    },
    ResourceRemoved {
        project: String,
        key: ResourceKey,
        error: Option<String>,
    },
    WorktreeReady {
        project: String,
        key: ResourceKey,
        launch: LaunchKind,
        result: Result<PathBuf, String>,
    },

    // panes
    PaneSpawned {
        key: ResourceKey,
        kind: PaneKind,
        result: Result<String, String>,
    },
    PaneFocused {
        index: usize,
        error: Option<String>,
    },
    PanesHidden {
        key: ResourceKey,
        count: usize,
        error: Option<String>,
    },
    PanesShown {
        key: ResourceKey,
        count: usize,
        error: Option<String>,
    },

    // agent run supervision
    AgentProgress {
        line: String,
    },
    AgentRunFinished {
        aborted: bool,
        error: Option<String>,
    },

    Status {
        text: String,
        is_error: bool,
    },
}
