use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::models::{PaneKind, ResourceKey, TrackedPane};
use crate::session::Multiplexer;

/// Maximum number of panes addressable by numeric quick-focus (digits 1-9).
pub const MAX_QUICK_FOCUS: usize = 9;

/// Maps resource identities to live terminal panes.
///
/// The live-pane oracle is injected at construction; `prune` compares
/// tracked pane ids against it and drops dead entries. Prune errors are
/// non-fatal and leave the tracked set unchanged.
pub struct PaneTracker {
    oracle: Arc<dyn Multiplexer>,
    panes: Vec<TrackedPane>,
}

impl PaneTracker {
    pub fn new(oracle: Arc<dyn Multiplexer>) -> Self {
        Self {
            oracle,
            panes: Vec::new(),
        }
    }

    /// Record a pane the engine just spawned. Never called speculatively.
    pub fn register(&mut self, key: ResourceKey, pane_id: String, kind: PaneKind) {
        self.panes.push(TrackedPane {
            pane_id,
            key,
            kind,
            created_at: Utc::now(),
        });
    }

    /// Drop every pane tracked against `key`. Called before any destructive
    /// action on the underlying resource.
    pub fn unregister_all(&mut self, key: &ResourceKey) -> Vec<TrackedPane> {
        let (removed, kept) = self
            .panes
            .drain(..)
            .partition(|p| &p.key == key);
        self.panes = kept;
        removed
    }

    /// Drop entries whose pane id the live-pane oracle no longer reports.
    pub async fn prune(&mut self) {
        match self.oracle.list_live_panes().await {
            Ok(live) => {
                let live: HashSet<String> = live.into_iter().collect();
                self.panes.retain(|p| live.contains(&p.pane_id));
            }
            Err(e) => {
                tracing::debug!("pane prune skipped: {}", e);
            }
        }
    }

    pub fn panes_for(&self, key: &ResourceKey) -> Vec<TrackedPane> {
        self.panes.iter().filter(|p| &p.key == key).cloned().collect()
    }

    pub fn all(&self) -> &[TrackedPane] {
        &self.panes
    }

    /// Deterministic ordering for numeric quick-focus: repo-keyed panes
    /// before PR-keyed panes, each ascending by creation time, capped at 9.
    pub fn ordered_active_panes(&self) -> Vec<TrackedPane> {
        let mut repos: Vec<TrackedPane> = self
            .panes
            .iter()
            .filter(|p| !p.key.is_pr())
            .cloned()
            .collect();
        let mut prs: Vec<TrackedPane> = self
            .panes
            .iter()
            .filter(|p| p.key.is_pr())
            .cloned()
            .collect();

        // pane_id tie-break keeps the order stable for equal timestamps
        repos.sort_by(|a, b| (a.created_at, &a.pane_id).cmp(&(b.created_at, &b.pane_id)));
        prs.sort_by(|a, b| (a.created_at, &a.pane_id).cmp(&(b.created_at, &b.pane_id)));

        repos.extend(prs);
        repos.truncate(MAX_QUICK_FOCUS);
        repos
    }
}
