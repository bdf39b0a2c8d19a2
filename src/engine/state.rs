use tokio::sync::oneshot;

use crate::config::Config;
use crate::engine::{LeaderRouter, OverlayStack};
use crate::models::{ProjectSummary, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Dashboard,
    ProjectDetail,
}

/// Explicit phase of the dashboard load pipeline. The trampoline of
/// command-issues-message-issues-command is bounded by this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DashboardPhase {
    #[default]
    Idle,
    Listing,
    Enriching,
}

#[derive(Debug, Default)]
pub struct DashboardState {
    pub projects: Vec<ProjectSummary>,
    pub selected: usize,
    pub phase: DashboardPhase,
}

impl DashboardState {
    pub fn selected_project(&self) -> Option<&ProjectSummary> {
        self.projects.get(self.selected)
    }

    pub fn move_selection(&mut self, delta: i64) {
        if self.projects.is_empty() {
            self.selected = 0;
            return;
        }
        let max = self.projects.len() as i64 - 1;
        self.selected = (self.selected as i64 + delta).clamp(0, max) as usize;
    }

    /// Replace the whole list atomically, keeping the selection in range.
    pub fn replace_projects(&mut self, projects: Vec<ProjectSummary>) {
        self.projects = projects;
        if self.selected >= self.projects.len() {
            self.selected = self.projects.len().saturating_sub(1);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailPhase {
    #[default]
    Idle,
    LoadingRepos,
    LoadingPrs,
    LoadingBeads,
}

#[derive(Debug)]
pub struct DetailState {
    pub project: String,
    pub resources: Vec<Resource>,
    /// Cursor position within the filtered view.
    pub selected: usize,
    pub phase: DetailPhase,
    pub filter: String,
    pub filtering: bool,
}

impl DetailState {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            resources: Vec::new(),
            selected: 0,
            phase: DetailPhase::LoadingRepos,
            filter: String::new(),
            filtering: false,
        }
    }

    /// Indices into `resources` that survive the current text filter.
    pub fn visible_indices(&self) -> Vec<usize> {
        if self.filter.is_empty() {
            return (0..self.resources.len()).collect();
        }
        let needle = self.filter.to_lowercase();
        self.resources
            .iter()
            .enumerate()
            .filter(|(_, r)| r.title().to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn selected_resource(&self) -> Option<&Resource> {
        let visible = self.visible_indices();
        visible.get(self.selected).map(|&i| &self.resources[i])
    }

    pub fn move_selection(&mut self, delta: i64) {
        let len = self.visible_indices().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let max = len as i64 - 1;
        self.selected = (self.selected as i64 + delta).clamp(0, max) as usize;
    }

    pub fn clamp_selection(&mut self) {
        let len = self.visible_indices().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

/// Cooperative cancel handle for an in-flight agent run. Invoking it only
/// stops progress reporting; the spawned pane keeps running.
#[derive(Debug)]
pub struct CancelHandle(oneshot::Sender<()>);

impl CancelHandle {
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self(tx), rx)
    }

    /// Consumes the handle, so it can fire at most once.
    pub fn cancel(self) {
        let _ = self.0.send(());
    }
}

/// Root application state. Exactly one instance exists per process; it is
/// mutated only inside `update`, on the event-loop task.
pub struct AppState {
    pub mode: Mode,
    pub dashboard: DashboardState,
    pub detail: Option<DetailState>,
    pub overlays: OverlayStack,
    pub status: Option<StatusLine>,
    pub agent_cancel: Option<CancelHandle>,
    pub terminal_size: (u16, u16),
    pub leader: LeaderRouter,
    pub running: bool,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: Mode::Dashboard,
            dashboard: DashboardState::default(),
            detail: None,
            overlays: OverlayStack::default(),
            status: None,
            agent_cancel: None,
            terminal_size: (80, 24),
            leader: LeaderRouter::new(config.leader_key),
            running: true,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusLine {
            text: text.into(),
            is_error,
        });
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    /// True when the result of a detail-pipeline phase still matches the
    /// project the user is looking at. Stale results are dropped silently.
    pub fn detail_matches(&self, project: &str) -> bool {
        self.mode == Mode::ProjectDetail
            && self
                .detail
                .as_ref()
                .is_some_and(|d| d.project == project)
    }
}
