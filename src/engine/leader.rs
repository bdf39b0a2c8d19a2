use crossterm::event::{KeyCode, KeyEvent};

use crate::engine::Mode;

/// What a completed leader sequence asks the dispatcher to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderAction {
    Quit,
    OpenShell,
    LaunchAgent,
    LaunchRalph,
    HidePanes,
    ShowPanes,
    FocusPane(usize),
    CreateProject,
    DeleteProject,
    SwitchProject,
    AddRepo,
    RemoveRepo,
    RemoveResource,
    RefreshBeads,
    RefreshProject,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LeaderOutcome {
    /// Not a leader interaction; let normal key handling run.
    Ignored,
    /// Partial sequence; keep waiting.
    Pending,
    Fired(LeaderAction),
    /// Consumed and reset (escape, dead end, or unmappable key).
    Cancelled,
}

struct Binding {
    /// Tokens after the leader key, e.g. `["p", "c"]`.
    sequence: Vec<String>,
    /// Modes the binding applies in; empty means all modes.
    modes: Vec<Mode>,
    description: &'static str,
    action: LeaderAction,
}

impl Binding {
    fn applies_in(&self, mode: Mode) -> bool {
        self.modes.is_empty() || self.modes.contains(&mode)
    }
}

/// Leader-key command router. A designated leader keystroke enters a
/// waiting state with an accumulating token buffer; sequences are looked
/// up against the binding table as they grow.
pub struct LeaderRouter {
    leader_token: String,
    /// Seeded with the leader token while waiting; empty otherwise.
    buffer: Vec<String>,
    bindings: Vec<Binding>,
}

fn key_token(code: KeyCode) -> Option<String> {
    match code {
        KeyCode::Char(c) => Some(c.to_string()),
        _ => None,
    }
}

fn submenu_label(token: &str) -> String {
    match token {
        "p" => "project...".to_string(),
        "g" => "repo...".to_string(),
        _ => "more...".to_string(),
    }
}

impl LeaderRouter {
    pub fn new(leader_key: char) -> Self {
        Self {
            leader_token: leader_key.to_string(),
            buffer: Vec::new(),
            bindings: default_bindings(),
        }
    }

    pub fn waiting(&self) -> bool {
        !self.buffer.is_empty()
    }

    pub fn leader_token(&self) -> &str {
        &self.leader_token
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }

    pub fn handle_key(&mut self, key: &KeyEvent, mode: Mode) -> LeaderOutcome {
        if !self.waiting() {
            match key_token(key.code) {
                Some(token) if token == self.leader_token => {
                    self.buffer.push(token);
                    LeaderOutcome::Pending
                }
                _ => LeaderOutcome::Ignored,
            }
        } else {
            if key.code == KeyCode::Esc {
                self.reset();
                return LeaderOutcome::Cancelled;
            }
            let Some(token) = key_token(key.code) else {
                self.reset();
                return LeaderOutcome::Cancelled;
            };
            self.buffer.push(token);

            let sequence = &self.buffer[1..];
            let candidates: Vec<&Binding> = self
                .bindings
                .iter()
                .filter(|b| b.applies_in(mode))
                .collect();

            if let Some(exact) = candidates.iter().find(|b| b.sequence == sequence) {
                let action = exact.action;
                self.reset();
                return LeaderOutcome::Fired(action);
            }

            let viable = candidates
                .iter()
                .any(|b| b.sequence.len() > sequence.len() && b.sequence.starts_with(sequence));
            if viable {
                LeaderOutcome::Pending
            } else {
                self.reset();
                LeaderOutcome::Cancelled
            }
        }
    }

    /// Hints for the current buffer and mode: (next key, description).
    /// A first-level key that only prefixes deeper bindings gets a generic
    /// submenu label rather than one arbitrary leaf's description.
    pub fn hints(&self, mode: Mode) -> Vec<(String, String)> {
        if !self.waiting() {
            return Vec::new();
        }
        let sequence = &self.buffer[1..];

        let mut out: Vec<(String, String)> = Vec::new();
        for binding in self.bindings.iter().filter(|b| b.applies_in(mode)) {
            if binding.sequence.len() <= sequence.len()
                || !binding.sequence.starts_with(sequence)
            {
                continue;
            }
            let next = binding.sequence[sequence.len()].clone();
            if out.iter().any(|(k, _)| *k == next) {
                continue;
            }
            let deeper = self
                .bindings
                .iter()
                .filter(|b| b.applies_in(mode))
                .filter(|b| {
                    b.sequence.len() > sequence.len()
                        && b.sequence.starts_with(sequence)
                        && b.sequence[sequence.len()] == next
                })
                .count();
            let is_leaf = binding.sequence.len() == sequence.len() + 1;
            let label = if deeper > 1 || !is_leaf {
                submenu_label(&next)
            } else {
                binding.description.to_string()
            };
            out.push((next, label));
        }
        out.sort();
        out
    }
}

fn seq(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

fn default_bindings() -> Vec<Binding> {
    let mut bindings = vec![
        Binding {
            sequence: seq(&["q"]),
            modes: vec![],
            description: "quit",
            action: LeaderAction::Quit,
        },
        Binding {
            sequence: seq(&["s"]),
            modes: vec![Mode::ProjectDetail],
            description: "open shell",
            action: LeaderAction::OpenShell,
        },
        Binding {
            sequence: seq(&["a"]),
            modes: vec![Mode::ProjectDetail],
            description: "launch agent",
            action: LeaderAction::LaunchAgent,
        },
        Binding {
            sequence: seq(&["l"]),
            modes: vec![Mode::ProjectDetail],
            description: "launch work loop",
            action: LeaderAction::LaunchRalph,
        },
        Binding {
            sequence: seq(&["h"]),
            modes: vec![Mode::ProjectDetail],
            description: "hide panes",
            action: LeaderAction::HidePanes,
        },
        Binding {
            sequence: seq(&["o"]),
            modes: vec![Mode::ProjectDetail],
            description: "show panes",
            action: LeaderAction::ShowPanes,
        },
        Binding {
            sequence: seq(&["x"]),
            modes: vec![Mode::ProjectDetail],
            description: "remove resource",
            action: LeaderAction::RemoveResource,
        },
        Binding {
            sequence: seq(&["b"]),
            modes: vec![Mode::ProjectDetail],
            description: "refresh beads",
            action: LeaderAction::RefreshBeads,
        },
        Binding {
            sequence: seq(&["u"]),
            modes: vec![Mode::ProjectDetail],
            description: "refresh project",
            action: LeaderAction::RefreshProject,
        },
        Binding {
            sequence: seq(&["p", "c"]),
            modes: vec![Mode::Dashboard],
            description: "create project",
            action: LeaderAction::CreateProject,
        },
        Binding {
            sequence: seq(&["p", "d"]),
            modes: vec![Mode::Dashboard],
            description: "delete project",
            action: LeaderAction::DeleteProject,
        },
        Binding {
            sequence: seq(&["p", "p"]),
            modes: vec![Mode::ProjectDetail],
            description: "switch project",
            action: LeaderAction::SwitchProject,
        },
        Binding {
            sequence: seq(&["g", "a"]),
            modes: vec![Mode::ProjectDetail],
            description: "add repo",
            action: LeaderAction::AddRepo,
        },
        Binding {
            sequence: seq(&["g", "d"]),
            modes: vec![Mode::ProjectDetail],
            description: "remove repo",
            action: LeaderAction::RemoveRepo,
        },
    ];

    for n in 1..=9usize {
        bindings.push(Binding {
            sequence: seq(&[&n.to_string()]),
            modes: vec![Mode::ProjectDetail],
            description: "focus pane by number",
            action: LeaderAction::FocusPane(n),
        });
    }

    bindings
}
