mod bead;
mod pane;
mod project;
mod resource;

pub use bead::BeadInfo;
pub use pane::{PaneKind, TrackedPane};
pub use project::{ProjectSummary, COUNT_PENDING};
pub use resource::{PrInfo, Resource, ResourceKey, ResourceKind};
