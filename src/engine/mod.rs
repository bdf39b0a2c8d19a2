mod command;
mod leader;
mod loader;
mod message;
mod overlay;
mod runtime;
mod state;
mod update;

pub use command::{Command, LaunchKind};
pub use leader::{LeaderAction, LeaderOutcome, LeaderRouter};
pub use loader::{attach_beads, bead_targets, merge_prs, phase1_summaries};
pub use message::Msg;
pub use overlay::{ConfirmAction, InputPurpose, Overlay, OverlayStack, OverlayView};
pub use runtime::{Collaborators, Runtime};
pub use state::{
    AppState, CancelHandle, DashboardPhase, DashboardState, DetailPhase, DetailState, Mode,
    StatusLine,
};
pub use update::update;
