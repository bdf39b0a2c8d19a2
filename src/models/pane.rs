use chrono::{DateTime, Utc};

use super::ResourceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneKind {
    Shell,
    Agent,
}

impl PaneKind {
    pub fn label(self) -> &'static str {
        match self {
            PaneKind::Shell => "shell",
            PaneKind::Agent => "agent",
        }
    }
}

/// One live terminal pane tracked against a resource. Owned by the
/// `PaneTracker`; the engine only ever reads cloned snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedPane {
    pub pane_id: String,
    pub key: ResourceKey,
    pub kind: PaneKind,
    pub created_at: DateTime<Utc>,
}

impl TrackedPane {
    /// Human-readable label derived purely from the key and pane kind.
    pub fn label(&self) -> String {
        format!("{} ({})", self.key.slug(), self.kind.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_for_repo_shell() {
        let pane = TrackedPane {
            pane_id: "%1".to_string(),
            key: ResourceKey::repo("svc"),
            kind: PaneKind::Shell,
            created_at: Utc::now(),
        };
        assert_eq!(pane.label(), "svc (shell)");
    }

    #[test]
    fn label_for_pr_agent() {
        let pane = TrackedPane {
            pane_id: "%2".to_string(),
            key: ResourceKey::pr("svc", 42),
            kind: PaneKind::Agent,
            created_at: Utc::now(),
        };
        assert_eq!(pane.label(), "svc-pr-42 (agent)");
    }
}
