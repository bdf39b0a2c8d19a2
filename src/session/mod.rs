mod agent;
mod tmux;
mod tracker;
mod worktree;

pub use agent::{agent_invocation, binary_available, ralph_invocation};
pub use tmux::{Multiplexer, MuxError, TmuxDriver};
pub use tracker::PaneTracker;
pub use worktree::{add_worktree, inject_workspace_rules, remove_worktree};
