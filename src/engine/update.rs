//! The single transition function. Every message lands here; the function
//! mutates state and returns the effects to run, and never does IO itself.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::engine::loader::{attach_beads, bead_targets};
use crate::engine::{
    AppState, CancelHandle, Command, ConfirmAction, DashboardPhase, DetailPhase, DetailState,
    InputPurpose, LaunchKind, LeaderAction, LeaderOutcome, Mode, Msg, Overlay, OverlayView,
};
use crate::models::{PaneKind, Resource, ResourceKind};

pub fn update(state: &mut AppState, msg: Msg) -> Vec<Command> {
    match msg {
        Msg::Key(key) => handle_key(state, key),
        Msg::Resize(w, h) => {
            state.terminal_size = (w, h);
            Vec::new()
        }
        Msg::Tick => handle_tick(state),

        Msg::ProjectsListed(summaries) => {
            state.dashboard.replace_projects(summaries.clone());
            state.dashboard.phase = DashboardPhase::Enriching;
            vec![Command::EnrichProjects { summaries }]
        }
        Msg::ProjectsEnriched(summaries) => {
            state.dashboard.replace_projects(summaries);
            state.dashboard.phase = DashboardPhase::Idle;
            Vec::new()
        }

        Msg::ReposLoaded { project, resources } => {
            if !state.detail_matches(&project) {
                return Vec::new();
            }
            let keys = resources.iter().map(Resource::key).collect();
            let Some(detail) = state.detail.as_mut() else {
                return Vec::new();
            };
            detail.resources = resources.clone();
            detail.phase = DetailPhase::LoadingPrs;
            detail.clamp_selection();
            vec![
                Command::FetchPrs {
                    project: project.clone(),
                    repos: resources,
                },
                Command::RefreshPanes { project, keys },
            ]
        }
        Msg::PrsMerged { project, resources } => {
            if !state.detail_matches(&project) {
                return Vec::new();
            }
            let keys = resources.iter().map(Resource::key).collect();
            let targets = bead_targets(&resources);
            let total = resources.len();
            let Some(detail) = state.detail.as_mut() else {
                return Vec::new();
            };
            detail.resources = resources;
            detail.phase = DetailPhase::LoadingBeads;
            detail.clamp_selection();
            vec![
                Command::FetchBeads {
                    project: project.clone(),
                    total,
                    targets,
                },
                Command::RefreshPanes { project, keys },
            ]
        }
        Msg::BeadsAttached { project, beads } => {
            if !state.detail_matches(&project) {
                return Vec::new();
            }
            let Some(detail) = state.detail.as_mut() else {
                return Vec::new();
            };
            if attach_beads(&mut detail.resources, beads) {
                detail.phase = DetailPhase::Idle;
            }
            Vec::new()
        }
        Msg::PanesRefreshed { project, panes } => {
            if !state.detail_matches(&project) {
                return Vec::new();
            }
            let Some(detail) = state.detail.as_mut() else {
                return Vec::new();
            };
            for resource in &mut detail.resources {
                resource.panes = panes.get(&resource.key()).cloned().unwrap_or_default();
            }
            Vec::new()
        }

        Msg::ProjectCreated { name, error } => match error {
            Some(e) => {
                state.set_status(format!("create {} failed: {}", name, e), true);
                Vec::new()
            }
            None => {
                state.set_status(format!("created project {}", name), false);
                state.dashboard.phase = DashboardPhase::Listing;
                vec![Command::LoadProjects]
            }
        },
        Msg::ProjectDeleted { name, error } => match error {
            Some(e) => {
                state.set_status(format!("delete {} failed: {}", name, e), true);
                Vec::new()
            }
            None => {
                state.set_status(format!("deleted project {}", name), false);
                state.dashboard.phase = DashboardPhase::Listing;
                vec![Command::LoadProjects]
            }
        },
        Msg::RepoAdded { project, error } => match error {
            Some(e) => {
                state.set_status(format!("clone failed: {}", e), true);
                Vec::new()
            }
            None => {
                state.set_status("repo added", false);
                reload_detail(state, &project)
            }
        },
        Msg::RepoRemoved {
            project,
            repo,
            error,
        } => match error {
            Some(e) => {
                state.set_status(format!("remove {} failed: {}", repo, e), true);
                Vec::new()
            }
            None => {
                state.set_status(format!("removed repo {}", repo), false);
                reload_detail(state, &project)
            }
        },
        Msg::ResourceRemoved {
            project,
            key,
            error,
        } => match error {
            Some(e) => {
                state.set_status(format!("remove {} failed: {}", key, e), true);
                Vec::new()
            }
            None => {
                state.set_status(format!("removed {}", key), false);
                reload_detail(state, &project)
            }
        },

        Msg::WorktreeReady {
            project,
            key,
            launch,
            result,
        } => match result {
            Err(e) => {
                state.set_status(format!("worktree for {} failed: {}", key, e), true);
                Vec::new()
            }
            Ok(dir) => {
                if let Some(detail) = state
                    .detail
                    .as_mut()
                    .filter(|d| d.project == project)
                {
                    if let Some(resource) =
                        detail.resources.iter_mut().find(|r| r.key() == key)
                    {
                        resource.worktree_path = dir.clone();
                    }
                }
                spawn_in(state, project, key, dir, launch)
            }
        },

        Msg::PaneSpawned { key, kind, result } => match result {
            Ok(_) => {
                state.set_status(format!("{} pane opened for {}", kind.label(), key.slug()), false);
                match state.detail.as_ref() {
                    Some(detail) => vec![Command::RefreshPanes {
                        project: detail.project.clone(),
                        keys: detail.resources.iter().map(Resource::key).collect(),
                    }],
                    None => Vec::new(),
                }
            }
            Err(e) => {
                state.set_status(format!("spawn for {} failed: {}", key.slug(), e), true);
                if kind == PaneKind::Agent {
                    state.agent_cancel = None;
                    if let Some((lines, done)) = state.overlays.top_progress_mut() {
                        lines.push(format!("failed: {}", e));
                        *done = true;
                    }
                }
                Vec::new()
            }
        },
        Msg::PaneFocused { index, error } => {
            if let Some(e) = error {
                state.set_status(format!("focus #{}: {}", index, e), true);
            }
            Vec::new()
        }
        Msg::PanesHidden { key, count, error } => {
            match error {
                Some(e) => state.set_status(format!("hide {} failed: {}", key.slug(), e), true),
                None => state.set_status(format!("hid {} pane(s) for {}", count, key.slug()), false),
            }
            Vec::new()
        }
        Msg::PanesShown { key, count, error } => {
            match error {
                Some(e) => state.set_status(format!("show {} failed: {}", key.slug(), e), true),
                None => {
                    state.set_status(format!("restored {} pane(s) for {}", count, key.slug()), false)
                }
            }
            Vec::new()
        }

        Msg::AgentProgress { line } => {
            if let Some((lines, _)) = state.overlays.top_progress_mut() {
                lines.push(line);
            }
            Vec::new()
        }
        Msg::AgentRunFinished { aborted, error } => {
            state.agent_cancel = None;
            if let Some((lines, done)) = state.overlays.top_progress_mut() {
                *done = true;
                match (&error, aborted) {
                    (Some(e), _) => lines.push(format!("run failed: {}", e)),
                    (None, true) => lines.push("run ended".to_string()),
                    (None, false) => lines.push("run finished".to_string()),
                }
            }
            match error {
                Some(e) => state.set_status(format!("agent run failed: {}", e), true),
                None => state.set_status("agent run finished", false),
            }
            Vec::new()
        }

        Msg::Status { text, is_error } => {
            state.set_status(text, is_error);
            Vec::new()
        }
    }
}

/// Reload the detail pipeline from phase 1 after a mutation. No-op when the
/// user has navigated away.
fn reload_detail(state: &mut AppState, project: &str) -> Vec<Command> {
    if !state.detail_matches(project) {
        return Vec::new();
    }
    let Some(detail) = state.detail.as_mut() else {
        return Vec::new();
    };
    detail.phase = DetailPhase::LoadingRepos;
    vec![Command::LoadRepos {
        project: project.to_string(),
        clear_cache: true,
    }]
}

fn handle_tick(state: &mut AppState) -> Vec<Command> {
    // the timer reschedules unconditionally so resync survives quiet periods
    let mut commands = vec![Command::ScheduleTick];
    if let Some(detail) = state.detail.as_ref() {
        if state.mode == Mode::ProjectDetail {
            commands.push(Command::RefreshPanes {
                project: detail.project.clone(),
                keys: detail.resources.iter().map(Resource::key).collect(),
            });
            let targets = bead_targets(&detail.resources);
            if detail.phase == DetailPhase::Idle && !targets.is_empty() {
                commands.push(Command::FetchBeads {
                    project: detail.project.clone(),
                    total: detail.resources.len(),
                    targets,
                });
            }
        }
    }
    commands
}

fn handle_key(state: &mut AppState, key: KeyEvent) -> Vec<Command> {
    if !state.overlays.is_empty() {
        // the top overlay owns all input; keys never fall through
        return handle_overlay_key(state, key);
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        state.running = false;
        return Vec::new();
    }

    state.clear_status();

    // live filter entry captures printable keys ahead of the leader router
    if state
        .detail
        .as_ref()
        .is_some_and(|d| d.filtering && state.mode == Mode::ProjectDetail)
    {
        return handle_filter_key(state, key);
    }

    match state.leader.handle_key(&key, state.mode) {
        LeaderOutcome::Fired(action) => return perform_action(state, action),
        LeaderOutcome::Pending | LeaderOutcome::Cancelled => return Vec::new(),
        LeaderOutcome::Ignored => {}
    }

    match state.mode {
        Mode::Dashboard => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                state.dashboard.move_selection(-1);
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                state.dashboard.move_selection(1);
                Vec::new()
            }
            KeyCode::Enter => open_selected_project(state),
            _ => Vec::new(),
        },
        Mode::ProjectDetail => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(detail) = state.detail.as_mut() {
                    detail.move_selection(-1);
                }
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(detail) = state.detail.as_mut() {
                    detail.move_selection(1);
                }
                Vec::new()
            }
            KeyCode::Esc => back_to_dashboard(state),
            KeyCode::Enter => perform_action(state, LeaderAction::OpenShell),
            KeyCode::Char('d') => perform_action(state, LeaderAction::RemoveResource),
            KeyCode::Char('/') => {
                if let Some(detail) = state.detail.as_mut() {
                    detail.filtering = true;
                }
                Vec::new()
            }
            _ => Vec::new(),
        },
    }
}

fn handle_filter_key(state: &mut AppState, key: KeyEvent) -> Vec<Command> {
    let Some(detail) = state.detail.as_mut() else {
        return Vec::new();
    };
    match key.code {
        KeyCode::Esc => {
            detail.filtering = false;
            detail.filter.clear();
            detail.clamp_selection();
        }
        KeyCode::Enter => {
            detail.filtering = false;
        }
        KeyCode::Backspace => {
            detail.filter.pop();
            detail.clamp_selection();
        }
        KeyCode::Char(c) => {
            detail.filter.push(c);
            detail.clamp_selection();
        }
        _ => {}
    }
    Vec::new()
}

fn handle_overlay_key(state: &mut AppState, key: KeyEvent) -> Vec<Command> {
    let Some(top) = state.overlays.peek() else {
        return Vec::new();
    };
    let dismiss = key.code == top.dismiss_key;

    match &top.view {
        OverlayView::Progress { .. } => {
            if dismiss || key.code == KeyCode::Enter {
                // first dismissal of a live run cancels the watch; only a
                // second one closes the overlay
                if let Some(handle) = state.agent_cancel.take() {
                    handle.cancel();
                    if let Some((lines, _)) = state.overlays.top_progress_mut() {
                        lines.push("stopping progress watch".to_string());
                    }
                } else {
                    state.overlays.pop();
                }
            }
            Vec::new()
        }
        OverlayView::Confirm { action, .. } => {
            let action = action.clone();
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    state.overlays.pop();
                    match action {
                        ConfirmAction::RemoveResource { project, key } => {
                            state.set_status(format!("removing {}", key), false);
                            vec![Command::RemoveResource { project, key }]
                        }
                        ConfirmAction::DeleteProject { name } => {
                            state.set_status(format!("deleting project {}", name), false);
                            vec![Command::DeleteProject { name }]
                        }
                    }
                }
                KeyCode::Char('n') | KeyCode::Char('N') => {
                    state.overlays.pop();
                    Vec::new()
                }
                _ if dismiss => {
                    state.overlays.pop();
                    Vec::new()
                }
                _ => Vec::new(),
            }
        }
        OverlayView::Input { .. } => {
            if dismiss {
                state.overlays.pop();
                return Vec::new();
            }
            let Some(Overlay {
                view: OverlayView::Input { value, purpose, .. },
                ..
            }) = state.overlays.peek_mut()
            else {
                return Vec::new();
            };
            match key.code {
                KeyCode::Char(c) => {
                    value.push(c);
                    Vec::new()
                }
                KeyCode::Backspace => {
                    value.pop();
                    Vec::new()
                }
                KeyCode::Enter => {
                    let text = value.trim().to_string();
                    let purpose = purpose.clone();
                    state.overlays.pop();
                    if text.is_empty() {
                        state.set_status("nothing entered", true);
                        return Vec::new();
                    }
                    match purpose {
                        InputPurpose::CreateProject => {
                            state.set_status(format!("creating project {}", text), false);
                            vec![Command::CreateProject { name: text }]
                        }
                        InputPurpose::AddRepo { project } => {
                            state.set_status("cloning repo", false);
                            vec![Command::AddRepo { project, url: text }]
                        }
                    }
                }
                _ => Vec::new(),
            }
        }
    }
}

fn open_selected_project(state: &mut AppState) -> Vec<Command> {
    let Some(project) = state.dashboard.selected_project().map(|p| p.name.clone()) else {
        return Vec::new();
    };
    state.mode = Mode::ProjectDetail;
    state.detail = Some(DetailState::new(project.clone()));
    vec![Command::LoadRepos {
        project,
        clear_cache: false,
    }]
}

fn back_to_dashboard(state: &mut AppState) -> Vec<Command> {
    state.mode = Mode::Dashboard;
    state.detail = None;
    state.dashboard.phase = DashboardPhase::Listing;
    vec![Command::LoadProjects]
}

fn perform_action(state: &mut AppState, action: LeaderAction) -> Vec<Command> {
    match action {
        LeaderAction::Quit => {
            state.running = false;
            Vec::new()
        }
        LeaderAction::OpenShell => launch_selected(state, LaunchKind::Shell),
        LeaderAction::LaunchAgent => launch_selected(state, LaunchKind::Agent),
        LeaderAction::LaunchRalph => launch_selected(state, LaunchKind::Ralph),
        LeaderAction::HidePanes => {
            let Some(resource) = selected_resource(state) else {
                state.set_status("no resource selected", true);
                return Vec::new();
            };
            if resource.panes.is_empty() {
                state.set_status("no panes to hide", true);
                return Vec::new();
            }
            vec![Command::HidePanes {
                key: resource.key(),
            }]
        }
        LeaderAction::ShowPanes => {
            let Some(resource) = selected_resource(state) else {
                state.set_status("no resource selected", true);
                return Vec::new();
            };
            vec![Command::ShowPanes {
                key: resource.key(),
            }]
        }
        LeaderAction::FocusPane(index) => vec![Command::FocusPane { index }],
        LeaderAction::CreateProject => {
            state
                .overlays
                .push(Overlay::input("Create project", InputPurpose::CreateProject));
            Vec::new()
        }
        LeaderAction::DeleteProject => {
            let Some(name) = state.dashboard.selected_project().map(|p| p.name.clone()) else {
                state.set_status("no project selected", true);
                return Vec::new();
            };
            state.overlays.push(Overlay::confirm(
                format!("Delete project {} and all its panes?", name),
                ConfirmAction::DeleteProject { name },
            ));
            Vec::new()
        }
        LeaderAction::SwitchProject => back_to_dashboard(state),
        LeaderAction::AddRepo => {
            let Some(project) = state.detail.as_ref().map(|d| d.project.clone()) else {
                return Vec::new();
            };
            state
                .overlays
                .push(Overlay::input("Add repo (clone URL)", InputPurpose::AddRepo { project }));
            Vec::new()
        }
        LeaderAction::RemoveRepo => {
            let Some(resource) = selected_resource(state) else {
                state.set_status("no resource selected", true);
                return Vec::new();
            };
            if resource.kind != ResourceKind::Repo {
                state.set_status("select a repo, not a PR", true);
                return Vec::new();
            }
            confirm_removal(state, resource)
        }
        LeaderAction::RemoveResource => {
            let Some(resource) = selected_resource(state) else {
                state.set_status("no resource selected", true);
                return Vec::new();
            };
            confirm_removal(state, resource)
        }
        LeaderAction::RefreshBeads => {
            let Some(detail) = state.detail.as_mut() else {
                return Vec::new();
            };
            let targets = bead_targets(&detail.resources);
            if targets.is_empty() {
                state.set_status("no worktrees to scan", true);
                return Vec::new();
            }
            for resource in &mut detail.resources {
                if resource.has_worktree() {
                    resource.loading_beads = true;
                }
            }
            detail.phase = DetailPhase::LoadingBeads;
            vec![Command::FetchBeads {
                project: detail.project.clone(),
                total: detail.resources.len(),
                targets,
            }]
        }
        LeaderAction::RefreshProject => {
            let Some(project) = state.detail.as_ref().map(|d| d.project.clone()) else {
                return Vec::new();
            };
            reload_detail(state, &project)
        }
    }
}

fn selected_resource(state: &AppState) -> Option<Resource> {
    state
        .detail
        .as_ref()
        .and_then(|d| d.selected_resource())
        .cloned()
}

fn confirm_removal(state: &mut AppState, resource: Resource) -> Vec<Command> {
    let project = state
        .detail
        .as_ref()
        .map(|d| d.project.clone())
        .unwrap_or_default();
    let key = resource.key();
    let what = match resource.kind {
        ResourceKind::Repo => format!("Remove repo {} and kill its panes?", resource.repo_name),
        ResourceKind::Pr => format!("Remove worktree {} and kill its panes?", key.slug()),
    };
    state.overlays.push(Overlay::confirm(
        what,
        ConfirmAction::RemoveResource { project, key },
    ));
    Vec::new()
}

fn launch_selected(state: &mut AppState, launch: LaunchKind) -> Vec<Command> {
    let Some(project) = state.detail.as_ref().map(|d| d.project.clone()) else {
        return Vec::new();
    };
    let Some(resource) = selected_resource(state) else {
        state.set_status("no resource selected", true);
        return Vec::new();
    };

    if launch == LaunchKind::Ralph && resource.open_bead_count() == 0 {
        state.set_status("no open beads for work loop", true);
        return Vec::new();
    }

    if resource.has_worktree() {
        return spawn_in(state, project, resource.key(), resource.worktree_path, launch);
    }

    match (&resource.kind, &resource.pr) {
        (ResourceKind::Pr, Some(pr)) => {
            if pr.head_branch.is_empty() {
                state.set_status("PR has no branch name", true);
                return Vec::new();
            }
            state.set_status(format!("creating worktree for {}", resource.key().slug()), false);
            vec![Command::EnsureWorktree {
                project,
                repo: resource.repo_name.clone(),
                number: pr.number,
                branch: pr.head_branch.clone(),
                launch,
            }]
        }
        _ => {
            state.set_status(format!("{} has no checkout", resource.repo_name), true);
            Vec::new()
        }
    }
}

/// Issue the spawn. Agent and ralph runs also open a progress overlay and
/// arm the one-shot cancel handle consumed by two-step dismissal.
fn spawn_in(
    state: &mut AppState,
    project: String,
    key: crate::models::ResourceKey,
    dir: std::path::PathBuf,
    launch: LaunchKind,
) -> Vec<Command> {
    let cancel = match launch {
        LaunchKind::Shell => None,
        LaunchKind::Agent | LaunchKind::Ralph => {
            let (handle, rx) = CancelHandle::new();
            state.agent_cancel = Some(handle);
            let title = match launch {
                LaunchKind::Ralph => format!("Work loop: {}", key.slug()),
                _ => format!("Agent: {}", key.slug()),
            };
            state
                .overlays
                .push(Overlay::progress(title, format!("starting in {}", dir.display())));
            Some(rx)
        }
    };
    vec![Command::SpawnPane {
        project,
        key,
        dir,
        launch,
        cancel,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{BeadInfo, PrInfo, ProjectSummary, ResourceKey, TrackedPane, COUNT_PENDING};
    use chrono::Utc;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn state() -> AppState {
        AppState::new(&Config::default())
    }

    fn key(code: KeyCode) -> Msg {
        Msg::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ch(c: char) -> Msg {
        key(KeyCode::Char(c))
    }

    fn pr(number: u64) -> PrInfo {
        PrInfo {
            number,
            title: "change".to_string(),
            state: "OPEN".to_string(),
            head_branch: format!("feature/{}", number),
        }
    }

    fn bead(status: &str) -> BeadInfo {
        BeadInfo {
            id: "b-1".to_string(),
            title: "t".to_string(),
            status: status.to_string(),
            issue_type: "task".to_string(),
            parent: None,
        }
    }

    fn detail_state(project: &str, resources: Vec<Resource>) -> AppState {
        let mut s = state();
        s.mode = Mode::ProjectDetail;
        let mut d = DetailState::new(project);
        d.resources = resources;
        d.phase = DetailPhase::Idle;
        s.detail = Some(d);
        s
    }

    #[test]
    fn projects_listed_replaces_and_enriches() {
        let mut s = state();
        let commands = update(
            &mut s,
            Msg::ProjectsListed(vec![ProjectSummary::pending("alpha", 2)]),
        );

        assert_eq!(s.dashboard.projects.len(), 1);
        assert_eq!(s.dashboard.projects[0].pr_count, COUNT_PENDING);
        assert_eq!(s.dashboard.phase, DashboardPhase::Enriching);
        assert!(matches!(commands[0], Command::EnrichProjects { .. }));
    }

    #[test]
    fn projects_enriched_ends_pipeline() {
        let mut s = state();
        update(
            &mut s,
            Msg::ProjectsListed(vec![ProjectSummary::pending("alpha", 2)]),
        );

        let mut enriched = ProjectSummary::pending("alpha", 2);
        enriched.pr_count = 3;
        enriched.bead_count = 1;
        let commands = update(&mut s, Msg::ProjectsEnriched(vec![enriched]));

        assert!(commands.is_empty());
        assert_eq!(s.dashboard.phase, DashboardPhase::Idle);
        assert!(s.dashboard.projects[0].is_enriched());
    }

    #[test]
    fn enter_on_dashboard_opens_project_detail() {
        let mut s = state();
        s.dashboard
            .replace_projects(vec![ProjectSummary::pending("demo", 1)]);

        let commands = update(&mut s, key(KeyCode::Enter));

        assert_eq!(s.mode, Mode::ProjectDetail);
        assert_eq!(s.detail.as_ref().unwrap().project, "demo");
        assert_eq!(s.detail.as_ref().unwrap().phase, DetailPhase::LoadingRepos);
        assert!(matches!(
            &commands[0],
            Command::LoadRepos {
                project,
                clear_cache: false,
            } if project == "demo"
        ));
    }

    #[test]
    fn esc_in_detail_returns_to_dashboard_and_reloads() {
        let mut s = detail_state("demo", Vec::new());
        let commands = update(&mut s, key(KeyCode::Esc));

        assert_eq!(s.mode, Mode::Dashboard);
        assert!(s.detail.is_none());
        assert!(matches!(commands[0], Command::LoadProjects));
    }

    #[test]
    fn repos_loaded_advances_to_pr_fetch() {
        let mut s = detail_state("demo", Vec::new());
        let commands = update(
            &mut s,
            Msg::ReposLoaded {
                project: "demo".to_string(),
                resources: vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
            },
        );

        let detail = s.detail.as_ref().unwrap();
        assert_eq!(detail.resources.len(), 1);
        assert_eq!(detail.phase, DetailPhase::LoadingPrs);
        assert!(matches!(commands[0], Command::FetchPrs { .. }));
        assert!(matches!(commands[1], Command::RefreshPanes { .. }));
    }

    #[test]
    fn stale_repos_loaded_is_dropped() {
        let mut s = detail_state("demo", Vec::new());
        let commands = update(
            &mut s,
            Msg::ReposLoaded {
                project: "other".to_string(),
                resources: vec![Resource::repo("svc", PathBuf::from("/p/other/svc"))],
            },
        );

        assert!(commands.is_empty(), "stale phase result must issue nothing");
        assert!(s.detail.as_ref().unwrap().resources.is_empty());
    }

    #[test]
    fn stale_prs_merged_is_dropped_after_navigating_away() {
        let mut s = detail_state("demo", Vec::new());
        update(&mut s, key(KeyCode::Esc));

        let commands = update(
            &mut s,
            Msg::PrsMerged {
                project: "demo".to_string(),
                resources: vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
            },
        );
        assert!(commands.is_empty());
    }

    #[test]
    fn prs_merged_fans_out_bead_fetch() {
        let mut s = detail_state("demo", Vec::new());
        let resources = vec![
            Resource::repo("svc", PathBuf::from("/p/demo/svc")),
            Resource::pull_request("svc", pr(7), PathBuf::new()),
        ];
        let commands = update(
            &mut s,
            Msg::PrsMerged {
                project: "demo".to_string(),
                resources,
            },
        );

        assert_eq!(s.detail.as_ref().unwrap().phase, DetailPhase::LoadingBeads);
        match &commands[0] {
            Command::FetchBeads { total, targets, .. } => {
                assert_eq!(*total, 2);
                assert_eq!(targets.len(), 1, "only worktree'd resources get bead fetches");
                assert_eq!(targets[0].0, 0);
            }
            other => panic!("expected FetchBeads, got {:?}", other),
        }
    }

    #[test]
    fn beads_attached_completes_the_pipeline() {
        let mut s = detail_state("demo", Vec::new());
        s.detail.as_mut().unwrap().phase = DetailPhase::LoadingBeads;
        s.detail.as_mut().unwrap().resources =
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))];

        update(
            &mut s,
            Msg::BeadsAttached {
                project: "demo".to_string(),
                beads: vec![vec![bead("open")]],
            },
        );

        let detail = s.detail.as_ref().unwrap();
        assert_eq!(detail.phase, DetailPhase::Idle);
        assert_eq!(detail.resources[0].beads.len(), 1);
    }

    #[test]
    fn beads_attached_with_wrong_length_keeps_phase() {
        let mut s = detail_state("demo", Vec::new());
        s.detail.as_mut().unwrap().phase = DetailPhase::LoadingBeads;
        s.detail.as_mut().unwrap().resources =
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))];

        update(
            &mut s,
            Msg::BeadsAttached {
                project: "demo".to_string(),
                beads: vec![Vec::new(), Vec::new()],
            },
        );

        assert_eq!(
            s.detail.as_ref().unwrap().phase,
            DetailPhase::LoadingBeads,
            "mismatched fan-out must not complete the pipeline"
        );
    }

    #[test]
    fn panes_refreshed_overwrites_display_snapshot() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        let mut panes = HashMap::new();
        panes.insert(
            ResourceKey::repo("svc"),
            vec![TrackedPane {
                pane_id: "%1".to_string(),
                key: ResourceKey::repo("svc"),
                kind: PaneKind::Shell,
                created_at: Utc::now(),
            }],
        );

        update(
            &mut s,
            Msg::PanesRefreshed {
                project: "demo".to_string(),
                panes,
            },
        );
        assert_eq!(s.detail.as_ref().unwrap().resources[0].panes.len(), 1);

        update(
            &mut s,
            Msg::PanesRefreshed {
                project: "demo".to_string(),
                panes: HashMap::new(),
            },
        );
        assert!(
            s.detail.as_ref().unwrap().resources[0].panes.is_empty(),
            "a refresh with no entry clears the snapshot"
        );
    }

    #[test]
    fn leader_quit_stops_the_loop() {
        let mut s = state();
        update(&mut s, ch(' '));
        update(&mut s, ch('q'));
        assert!(!s.running);
    }

    #[test]
    fn ctrl_c_always_quits() {
        let mut s = state();
        let msg = Msg::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        update(&mut s, msg);
        assert!(!s.running);
    }

    #[test]
    fn create_project_flow_through_input_overlay() {
        let mut s = state();
        update(&mut s, ch(' '));
        update(&mut s, ch('p'));
        update(&mut s, ch('c'));
        assert_eq!(s.overlays.len(), 1);

        for c in "demo".chars() {
            update(&mut s, ch(c));
        }
        let commands = update(&mut s, key(KeyCode::Enter));

        assert!(s.overlays.is_empty());
        assert!(matches!(&commands[0], Command::CreateProject { name } if name == "demo"));
    }

    #[test]
    fn empty_input_submits_nothing() {
        let mut s = state();
        update(&mut s, ch(' '));
        update(&mut s, ch('p'));
        update(&mut s, ch('c'));
        let commands = update(&mut s, key(KeyCode::Enter));

        assert!(commands.is_empty());
        assert!(s.overlays.is_empty());
        assert!(s.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn delete_project_requires_confirmation() {
        let mut s = state();
        s.dashboard
            .replace_projects(vec![ProjectSummary::pending("demo", 1)]);
        update(&mut s, ch(' '));
        update(&mut s, ch('p'));
        let commands = update(&mut s, ch('d'));
        assert!(commands.is_empty(), "confirm first, act second");
        assert_eq!(s.overlays.len(), 1);

        let commands = update(&mut s, ch('y'));
        assert!(matches!(&commands[0], Command::DeleteProject { name } if name == "demo"));
        assert!(s.overlays.is_empty());
    }

    #[test]
    fn confirm_overlay_n_declines() {
        let mut s = state();
        s.dashboard
            .replace_projects(vec![ProjectSummary::pending("demo", 1)]);
        update(&mut s, ch(' '));
        update(&mut s, ch('p'));
        update(&mut s, ch('d'));

        let commands = update(&mut s, ch('n'));
        assert!(commands.is_empty());
        assert!(s.overlays.is_empty());
    }

    #[test]
    fn overlay_consumes_unrelated_keys() {
        let mut s = state();
        update(&mut s, ch(' '));
        update(&mut s, ch('p'));
        update(&mut s, ch('c'));

        // 'j' must type into the input, not move any selection
        s.dashboard
            .replace_projects(vec![ProjectSummary::pending("a", 0), ProjectSummary::pending("b", 0)]);
        update(&mut s, ch('j'));
        assert_eq!(s.dashboard.selected, 0);
        match &s.overlays.peek().unwrap().view {
            OverlayView::Input { value, .. } => assert_eq!(value, "j"),
            other => panic!("expected input overlay, got {:?}", other),
        }
    }

    #[test]
    fn shell_launch_on_worktree_spawns_directly() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        let commands = update(&mut s, key(KeyCode::Enter));

        match &commands[0] {
            Command::SpawnPane { launch, cancel, .. } => {
                assert_eq!(*launch, LaunchKind::Shell);
                assert!(cancel.is_none(), "plain shells are not supervised");
            }
            other => panic!("expected SpawnPane, got {:?}", other),
        }
        assert!(s.overlays.is_empty(), "shell spawn opens no overlay");
    }

    #[test]
    fn agent_launch_opens_progress_and_arms_cancel() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        update(&mut s, ch(' '));
        let commands = update(&mut s, ch('a'));

        match &commands[0] {
            Command::SpawnPane { launch, cancel, .. } => {
                assert_eq!(*launch, LaunchKind::Agent);
                assert!(cancel.is_some());
            }
            other => panic!("expected SpawnPane, got {:?}", other),
        }
        assert!(s.agent_cancel.is_some());
        assert!(matches!(
            s.overlays.peek().unwrap().view,
            OverlayView::Progress { .. }
        ));
    }

    #[test]
    fn pr_launch_without_worktree_creates_one_first() {
        let mut s = detail_state(
            "demo",
            vec![Resource::pull_request("svc", pr(7), PathBuf::new())],
        );
        let commands = update(&mut s, key(KeyCode::Enter));

        match &commands[0] {
            Command::EnsureWorktree {
                repo,
                number,
                branch,
                launch,
                ..
            } => {
                assert_eq!(repo, "svc");
                assert_eq!(*number, 7);
                assert_eq!(branch, "feature/7");
                assert_eq!(*launch, LaunchKind::Shell);
            }
            other => panic!("expected EnsureWorktree, got {:?}", other),
        }
    }

    #[test]
    fn pr_without_branch_is_refused() {
        let mut info = pr(7);
        info.head_branch = String::new();
        let mut s = detail_state(
            "demo",
            vec![Resource::pull_request("svc", info, PathBuf::new())],
        );
        let commands = update(&mut s, key(KeyCode::Enter));

        assert!(commands.is_empty());
        assert!(s.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn ralph_refused_without_open_beads() {
        let mut resource = Resource::repo("svc", PathBuf::from("/p/demo/svc"));
        resource.beads = vec![bead("closed")];
        let mut s = detail_state("demo", vec![resource]);

        update(&mut s, ch(' '));
        let commands = update(&mut s, ch('l'));

        assert!(commands.is_empty());
        assert_eq!(s.status.as_ref().unwrap().text, "no open beads for work loop");
    }

    #[test]
    fn worktree_ready_records_path_and_spawns() {
        let mut s = detail_state(
            "demo",
            vec![Resource::pull_request("svc", pr(7), PathBuf::new())],
        );
        let dir = PathBuf::from("/p/demo/.devdeck/worktrees/svc-pr-7");
        let commands = update(
            &mut s,
            Msg::WorktreeReady {
                project: "demo".to_string(),
                key: ResourceKey::pr("svc", 7),
                launch: LaunchKind::Agent,
                result: Ok(dir.clone()),
            },
        );

        assert_eq!(
            s.detail.as_ref().unwrap().resources[0].worktree_path,
            dir,
            "worktree path must be recorded on the resource"
        );
        assert!(matches!(commands[0], Command::SpawnPane { .. }));
        assert!(s.agent_cancel.is_some());
    }

    #[test]
    fn worktree_failure_surfaces_in_status() {
        let mut s = detail_state("demo", Vec::new());
        let commands = update(
            &mut s,
            Msg::WorktreeReady {
                project: "demo".to_string(),
                key: ResourceKey::pr("svc", 7),
                launch: LaunchKind::Shell,
                result: Err("fetch failed".to_string()),
            },
        );

        assert!(commands.is_empty());
        assert!(s.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn progress_dismissal_is_two_step_while_running() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        update(&mut s, ch(' '));
        update(&mut s, ch('a'));
        assert_eq!(s.overlays.len(), 1);

        update(&mut s, key(KeyCode::Esc));
        assert_eq!(s.overlays.len(), 1, "first dismiss cancels, never closes");
        assert!(s.agent_cancel.is_none(), "cancel handle is consumed");

        update(&mut s, key(KeyCode::Esc));
        assert!(s.overlays.is_empty(), "second dismiss closes the overlay");
    }

    #[test]
    fn progress_dismissal_is_single_step_after_finish() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        update(&mut s, ch(' '));
        update(&mut s, ch('a'));
        update(
            &mut s,
            Msg::AgentRunFinished {
                aborted: false,
                error: None,
            },
        );

        update(&mut s, key(KeyCode::Esc));
        assert!(s.overlays.is_empty());
    }

    #[test]
    fn agent_progress_appends_to_top_overlay() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        update(&mut s, ch(' '));
        update(&mut s, ch('a'));

        update(
            &mut s,
            Msg::AgentProgress {
                line: "still running".to_string(),
            },
        );

        match &s.overlays.peek().unwrap().view {
            OverlayView::Progress { lines, done, .. } => {
                assert!(lines.iter().any(|l| l == "still running"));
                assert!(!*done);
            }
            other => panic!("expected progress overlay, got {:?}", other),
        }
    }

    #[test]
    fn agent_run_finished_marks_done() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        update(&mut s, ch(' '));
        update(&mut s, ch('a'));

        update(
            &mut s,
            Msg::AgentRunFinished {
                aborted: true,
                error: None,
            },
        );

        assert!(s.agent_cancel.is_none());
        match &s.overlays.peek().unwrap().view {
            OverlayView::Progress { done, .. } => assert!(*done),
            other => panic!("expected progress overlay, got {:?}", other),
        }
    }

    #[test]
    fn tick_always_reschedules() {
        let mut s = state();
        let commands = update(&mut s, Msg::Tick);
        assert_eq!(commands.len(), 1);
        assert!(matches!(commands[0], Command::ScheduleTick));
    }

    #[test]
    fn tick_resyncs_panes_and_beads_in_idle_detail() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        let commands = update(&mut s, Msg::Tick);

        assert!(matches!(commands[0], Command::ScheduleTick));
        assert!(matches!(commands[1], Command::RefreshPanes { .. }));
        assert!(matches!(commands[2], Command::FetchBeads { .. }));
    }

    #[test]
    fn tick_skips_bead_resync_mid_pipeline() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        s.detail.as_mut().unwrap().phase = DetailPhase::LoadingPrs;

        let commands = update(&mut s, Msg::Tick);
        assert!(
            !commands.iter().any(|c| matches!(c, Command::FetchBeads { .. })),
            "bead resync must not race an in-flight pipeline"
        );
    }

    #[test]
    fn resource_removed_reloads_detail() {
        let mut s = detail_state("demo", Vec::new());
        let commands = update(
            &mut s,
            Msg::ResourceRemoved {
                project: "demo".to_string(),
                key: ResourceKey::pr("svc", 7),
                error: None,
            },
        );

        assert_eq!(commands.len(), 1, "invalidation must ride the reload itself");
        assert!(matches!(
            commands[0],
            Command::LoadRepos {
                clear_cache: true,
                ..
            }
        ));
        assert_eq!(s.detail.as_ref().unwrap().phase, DetailPhase::LoadingRepos);
    }

    #[test]
    fn filter_narrows_and_escape_clears() {
        let mut s = detail_state(
            "demo",
            vec![
                Resource::repo("svc", PathBuf::from("/p/demo/svc")),
                Resource::repo("web", PathBuf::from("/p/demo/web")),
            ],
        );
        update(&mut s, ch('/'));
        assert!(s.detail.as_ref().unwrap().filtering);

        update(&mut s, ch('w'));
        assert_eq!(s.detail.as_ref().unwrap().visible_indices(), vec![1]);

        update(&mut s, key(KeyCode::Esc));
        let detail = s.detail.as_ref().unwrap();
        assert!(!detail.filtering);
        assert!(detail.filter.is_empty());
        assert_eq!(detail.visible_indices().len(), 2);
        assert_eq!(s.mode, Mode::ProjectDetail, "Esc while filtering only clears the filter");
    }

    #[test]
    fn filter_enter_keeps_the_filter() {
        let mut s = detail_state(
            "demo",
            vec![
                Resource::repo("svc", PathBuf::from("/p/demo/svc")),
                Resource::repo("web", PathBuf::from("/p/demo/web")),
            ],
        );
        update(&mut s, ch('/'));
        update(&mut s, ch('w'));
        update(&mut s, key(KeyCode::Enter));

        let detail = s.detail.as_ref().unwrap();
        assert!(!detail.filtering);
        assert_eq!(detail.filter, "w");
        assert_eq!(detail.visible_indices(), vec![1]);
    }

    #[test]
    fn hide_with_no_panes_is_refused() {
        let mut s = detail_state(
            "demo",
            vec![Resource::repo("svc", PathBuf::from("/p/demo/svc"))],
        );
        update(&mut s, ch(' '));
        let commands = update(&mut s, ch('h'));

        assert!(commands.is_empty());
        assert_eq!(s.status.as_ref().unwrap().text, "no panes to hide");
    }

    #[test]
    fn remove_repo_rejects_pr_selection() {
        let mut s = detail_state(
            "demo",
            vec![Resource::pull_request("svc", pr(7), PathBuf::new())],
        );
        update(&mut s, ch(' '));
        update(&mut s, ch('g'));
        let commands = update(&mut s, ch('d'));

        assert!(commands.is_empty());
        assert!(s.overlays.is_empty());
        assert!(s.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn resize_is_recorded_even_under_overlays() {
        let mut s = state();
        s.overlays
            .push(Overlay::input("Create project", InputPurpose::CreateProject));
        update(&mut s, Msg::Resize(120, 40));
        assert_eq!(s.terminal_size, (120, 40));
    }
}
