mod beads;
mod manager;

pub use beads::{BeadSource, BeadsCli};
pub use manager::{FsProjectManager, ProjectManager};
