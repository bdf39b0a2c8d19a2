use serde::{Deserialize, Serialize};

/// One issue-tracker item ("bead") attached to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeadInfo {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(default, alias = "issue_type", alias = "type")]
    pub issue_type: String,
    #[serde(default)]
    pub parent: Option<String>,
}

impl BeadInfo {
    pub fn is_open(&self) -> bool {
        self.status.eq_ignore_ascii_case("open")
            || self.status.eq_ignore_ascii_case("in_progress")
    }
}
