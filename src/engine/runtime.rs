//! Owns the terminal, the event loop, and command execution. Commands run
//! on their own tasks and report back through the message channel; the loop
//! task is the only place application state is touched.

use std::collections::HashMap;
use std::io::Stdout;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::future::join_all;
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::engine::{
    merge_prs, phase1_summaries, update, AppState, Command, DashboardPhase, LaunchKind, Msg,
};
use crate::models::{BeadInfo, PaneKind, ProjectSummary, Resource, ResourceKey};
use crate::project::{BeadSource, ProjectManager};
use crate::session::{agent_invocation, ralph_invocation, Multiplexer, PaneTracker};
use crate::ui;

/// Shared handles to everything command execution talks to. Cloned into
/// every spawned command task.
#[derive(Clone)]
pub struct Collaborators {
    pub config: Arc<Config>,
    pub projects: Arc<dyn ProjectManager>,
    pub beads: Arc<dyn BeadSource>,
    pub mux: Arc<dyn Multiplexer>,
    pub tracker: Arc<tokio::sync::Mutex<PaneTracker>>,
}

pub struct Runtime {
    state: AppState,
    collab: Collaborators,
    tx: mpsc::UnboundedSender<Msg>,
    rx: mpsc::UnboundedReceiver<Msg>,
}

impl Runtime {
    pub fn new(collab: Collaborators) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::new(&collab.config),
            collab,
            tx,
            rx,
        }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;
        let result = self.event_loop(&mut terminal).await;
        ui::restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> Result<()> {
        self.dispatch(vec![Command::LoadProjects, Command::ScheduleTick]);
        self.state.dashboard.phase = DashboardPhase::Listing;

        let mut events = EventStream::new();

        while self.state.running {
            terminal.draw(|frame| ui::draw(frame, &self.state))?;

            let msg = tokio::select! {
                maybe = events.next() => match maybe {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => Msg::Key(key),
                    Some(Ok(Event::Resize(w, h))) => Msg::Resize(w, h),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                },
                maybe = self.rx.recv() => match maybe {
                    Some(msg) => msg,
                    None => break,
                },
            };

            let commands = update(&mut self.state, msg);
            self.dispatch(commands);
        }
        Ok(())
    }

    fn dispatch(&self, commands: Vec<Command>) {
        for command in commands {
            let collab = self.collab.clone();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                execute(command, collab, tx).await;
            });
        }
    }
}

async fn execute(command: Command, collab: Collaborators, tx: mpsc::UnboundedSender<Msg>) {
    match command {
        Command::LoadProjects => match collab.projects.list_projects().await {
            Ok(listing) => {
                let _ = tx.send(Msg::ProjectsListed(phase1_summaries(listing)));
            }
            Err(e) => send_error(&tx, format!("listing projects failed: {}", e)),
        },
        Command::EnrichProjects { summaries } => {
            let enriched =
                join_all(summaries.into_iter().map(|s| enrich_one(&collab, s))).await;
            let _ = tx.send(Msg::ProjectsEnriched(enriched));
        }

        Command::LoadRepos {
            project,
            clear_cache,
        } => {
            // drop cached PR listings before anything downstream can read them
            if clear_cache {
                collab.projects.clear_pr_cache(&project).await;
            }
            match collab.projects.list_repos(&project).await {
                Ok(repos) => {
                    let resources = repos
                        .into_iter()
                        .map(|name| {
                            let dir = collab.projects.repo_dir(&project, &name);
                            let mut resource = Resource::repo(name, dir);
                            resource.loading_prs = true;
                            resource
                        })
                        .collect();
                    let _ = tx.send(Msg::ReposLoaded { project, resources });
                }
                Err(e) => send_error(&tx, format!("listing repos failed: {}", e)),
            }
        }
        Command::FetchPrs { project, repos } => {
            let prs = collab.projects.list_prs(&project).await.unwrap_or_default();
            let resources = merge_prs(&repos, &prs, |repo, number| {
                let path = collab.projects.pr_worktree_path(&project, repo, number);
                path.exists().then_some(path)
            });
            let _ = tx.send(Msg::PrsMerged { project, resources });
        }
        Command::FetchBeads {
            project,
            total,
            targets,
        } => {
            let fetches = targets.iter().map(|(_, dir)| collab.beads.open_beads(dir));
            let results = join_all(fetches).await;

            let mut beads: Vec<Vec<BeadInfo>> = vec![Vec::new(); total];
            for ((index, dir), result) in targets.into_iter().zip(results) {
                match result {
                    Ok(list) => beads[index] = list,
                    Err(e) => {
                        tracing::debug!("bead listing in {:?} failed: {}", dir, e);
                    }
                }
            }
            let _ = tx.send(Msg::BeadsAttached { project, beads });
        }
        Command::RefreshPanes { project, keys } => {
            let mut tracker = collab.tracker.lock().await;
            tracker.prune().await;
            let panes: HashMap<ResourceKey, Vec<_>> = keys
                .into_iter()
                .map(|key| {
                    let panes = tracker.panes_for(&key);
                    (key, panes)
                })
                .collect();
            let _ = tx.send(Msg::PanesRefreshed { project, panes });
        }
        Command::ScheduleTick => {
            tokio::time::sleep(collab.config.resync_interval()).await;
            let _ = tx.send(Msg::Tick);
        }

        Command::CreateProject { name } => {
            let error = collab.projects.create_project(&name).await.err();
            let _ = tx.send(Msg::ProjectCreated {
                name,
                error: error.map(|e| e.to_string()),
            });
        }
        Command::DeleteProject { name } => {
            // kill every pane the project owns before the directory goes away
            let keys = collab
                .projects
                .list_resource_keys(&name)
                .await
                .unwrap_or_default();
            for key in &keys {
                teardown_panes(&collab, key).await;
            }
            let error = collab.projects.delete_project(&name).await.err();
            let _ = tx.send(Msg::ProjectDeleted {
                name,
                error: error.map(|e| e.to_string()),
            });
        }
        Command::AddRepo { project, url } => {
            let error = collab.projects.add_repo(&project, &url).await.err();
            let _ = tx.send(Msg::RepoAdded {
                project,
                error: error.map(|e| e.to_string()),
            });
        }
        Command::RemoveRepo { project, repo } => {
            teardown_panes(&collab, &ResourceKey::repo(repo.clone())).await;
            let error = collab.projects.remove_repo(&project, &repo).await.err();
            let _ = tx.send(Msg::RepoRemoved {
                project,
                repo,
                error: error.map(|e| e.to_string()),
            });
        }
        Command::RemoveResource { project, key } => {
            teardown_panes(&collab, &key).await;
            let result = match &key {
                ResourceKey::Repo { repo } => collab.projects.remove_repo(&project, repo).await,
                ResourceKey::Pr { repo, number } => {
                    collab
                        .projects
                        .remove_pr_worktree(&project, repo, *number)
                        .await
                }
            };
            let _ = tx.send(Msg::ResourceRemoved {
                project,
                key,
                error: result.err().map(|e| e.to_string()),
            });
        }

        Command::EnsureWorktree {
            project,
            repo,
            number,
            branch,
            launch,
        } => {
            let result = collab
                .projects
                .create_pr_worktree(&project, &repo, number, &branch)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Msg::WorktreeReady {
                project,
                key: ResourceKey::pr(repo, number),
                launch,
                result,
            });
        }
        Command::SpawnPane {
            key,
            dir,
            launch,
            cancel,
            ..
        } => {
            spawn_pane(collab, tx, key, dir, launch, cancel).await;
        }
        Command::FocusPane { index } => {
            let pane = {
                let mut tracker = collab.tracker.lock().await;
                tracker.prune().await;
                tracker
                    .ordered_active_panes()
                    .into_iter()
                    .nth(index.saturating_sub(1))
            };
            let error = match pane {
                None => Some(format!("no pane #{}", index)),
                Some(pane) => collab
                    .mux
                    .focus_pane(&pane.pane_id)
                    .await
                    .err()
                    .map(|e| e.to_string()),
            };
            let _ = tx.send(Msg::PaneFocused { index, error });
        }
        Command::HidePanes { key } => {
            let panes = collab.tracker.lock().await.panes_for(&key);
            let mut count = 0;
            let mut error = None;
            for pane in panes {
                match collab.mux.break_pane(&pane.pane_id).await {
                    Ok(()) => count += 1,
                    Err(e) => error = Some(e.to_string()),
                }
            }
            let _ = tx.send(Msg::PanesHidden { key, count, error });
        }
        Command::ShowPanes { key } => {
            let panes = collab.tracker.lock().await.panes_for(&key);
            let mut count = 0;
            let mut error = None;
            for pane in panes {
                match collab.mux.join_pane(&pane.pane_id).await {
                    Ok(()) => count += 1,
                    Err(e) => error = Some(e.to_string()),
                }
            }
            let _ = tx.send(Msg::PanesShown { key, count, error });
        }
    }
}

fn send_error(tx: &mpsc::UnboundedSender<Msg>, text: String) {
    let _ = tx.send(Msg::Status {
        text,
        is_error: true,
    });
}

async fn enrich_one(collab: &Collaborators, summary: ProjectSummary) -> ProjectSummary {
    let name = summary.name.clone();
    let (repo_count, pr_count) = collab
        .projects
        .project_summary(&name)
        .await
        .unwrap_or((summary.repo_count, 0));

    // open beads across every checkout and existing worktree
    let keys = collab
        .projects
        .list_resource_keys(&name)
        .await
        .unwrap_or_default();
    let counts = join_all(keys.iter().map(|key| {
        let dir = match key {
            ResourceKey::Repo { repo } => collab.projects.repo_dir(&name, repo),
            ResourceKey::Pr { repo, number } => {
                collab.projects.pr_worktree_path(&name, repo, *number)
            }
        };
        async move {
            match collab.beads.open_beads(&dir).await {
                Ok(list) => list.iter().filter(|b| b.is_open()).count(),
                Err(e) => {
                    tracing::debug!("bead count in {:?} failed: {}", dir, e);
                    0
                }
            }
        }
    }))
    .await;

    ProjectSummary {
        name,
        repo_count,
        pr_count: pr_count as i64,
        bead_count: counts.into_iter().sum::<usize>() as i64,
    }
}

async fn teardown_panes(collab: &Collaborators, key: &ResourceKey) {
    let removed = collab.tracker.lock().await.unregister_all(key);
    for pane in removed {
        if let Err(e) = collab.mux.kill_pane(&pane.pane_id).await {
            tracing::debug!("killing pane {} failed: {}", pane.pane_id, e);
        }
    }
}

async fn spawn_pane(
    collab: Collaborators,
    tx: mpsc::UnboundedSender<Msg>,
    key: ResourceKey,
    dir: std::path::PathBuf,
    launch: LaunchKind,
    cancel: Option<tokio::sync::oneshot::Receiver<()>>,
) {
    let kind = match launch {
        LaunchKind::Shell => PaneKind::Shell,
        LaunchKind::Agent | LaunchKind::Ralph => PaneKind::Agent,
    };

    let pane_id = match collab.mux.split_pane(&dir).await {
        Ok(id) => id,
        Err(e) => {
            let _ = tx.send(Msg::PaneSpawned {
                key,
                kind,
                result: Err(e.to_string()),
            });
            return;
        }
    };

    // register before anything else can observe the pane
    collab
        .tracker
        .lock()
        .await
        .register(key.clone(), pane_id.clone(), kind);

    let line = match launch {
        LaunchKind::Shell => None,
        LaunchKind::Agent => Some(agent_invocation(&collab.config.agent_command, None)),
        LaunchKind::Ralph => {
            let (line, fallback) = ralph_invocation(&collab.config).await;
            if fallback {
                let _ = tx.send(Msg::Status {
                    text: format!(
                        "{} not found, using {} with the canned work prompt",
                        collab.config.ralph_command, collab.config.agent_command
                    ),
                    is_error: false,
                });
            }
            Some(line)
        }
    };
    if let Some(line) = line {
        if let Err(e) = collab.mux.send_line(&pane_id, &line).await {
            let _ = tx.send(Msg::PaneSpawned {
                key,
                kind,
                result: Err(format!("could not start command: {}", e)),
            });
            return;
        }
    }

    let _ = tx.send(Msg::PaneSpawned {
        key: key.clone(),
        kind,
        result: Ok(pane_id.clone()),
    });

    if let Some(cancel) = cancel {
        watch_run(collab, tx, pane_id, kind, cancel).await;
    }
}

/// Heartbeat loop behind the progress overlay. Ends when the pane dies or
/// the cancel handle fires; the pane itself is never touched.
async fn watch_run(
    collab: Collaborators,
    tx: mpsc::UnboundedSender<Msg>,
    pane_id: String,
    kind: PaneKind,
    mut cancel: tokio::sync::oneshot::Receiver<()>,
) {
    let interval = collab.config.resync_interval();
    loop {
        tokio::select! {
            _ = &mut cancel => {
                let _ = tx.send(Msg::AgentRunFinished {
                    aborted: true,
                    error: None,
                });
                return;
            }
            _ = tokio::time::sleep(interval) => {
                match collab.mux.list_live_panes().await {
                    Ok(live) if live.contains(&pane_id) => {
                        let _ = tx.send(Msg::AgentProgress {
                            line: format!("{} running in pane {}", kind.label(), pane_id),
                        });
                    }
                    Ok(_) => {
                        let _ = tx.send(Msg::AgentRunFinished {
                            aborted: false,
                            error: None,
                        });
                        return;
                    }
                    Err(e) => {
                        let _ = tx.send(Msg::AgentRunFinished {
                            aborted: false,
                            error: Some(e.to_string()),
                        });
                        return;
                    }
                }
            }
        }
    }
}
