use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_RALPH_PROMPT: &str =
    "Work through the open beads in this worktree one at a time. Pick the \
     highest-priority open bead, implement it, run the tests, then move on \
     to the next. Stop when no open beads remain.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one subdirectory per project, each containing its
    /// cloned repos.
    pub projects_root: PathBuf,
    /// Pane/bead resync interval while in project detail, in seconds.
    pub resync_interval_secs: u64,
    /// Leader key that opens the command-sequence input mode.
    pub leader_key: char,
    pub agent_command: String,
    pub ralph_command: String,
    /// Prompt handed to the generic agent when the ralph binary is absent.
    pub ralph_fallback_prompt: String,
    pub bead_command: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("projects"),
            resync_interval_secs: 5,
            leader_key: ' ',
            agent_command: "claude".to_string(),
            ralph_command: "ralph".to_string(),
            ralph_fallback_prompt: DEFAULT_RALPH_PROMPT.to_string(),
            bead_command: "bd".to_string(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let path = config_path.unwrap_or_else(Self::default_config_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn default_config_path() -> PathBuf {
        if let Some(config_path) = std::env::var_os("DEVDECK_CONFIG") {
            PathBuf::from(config_path)
        } else {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("devdeck")
                .join("config.yaml")
        }
    }

    pub fn log_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("devdeck")
    }

    pub fn with_projects_root(mut self, root: PathBuf) -> Self {
        self.projects_root = root;
        self
    }

    pub fn resync_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.resync_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn config_default_values() {
        let config = Config::default();
        assert_eq!(config.resync_interval_secs, 5);
        assert_eq!(config.leader_key, ' ');
        assert_eq!(config.agent_command, "claude");
        assert_eq!(config.bead_command, "bd");
    }

    #[test]
    fn config_loads_from_yaml_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.yaml");

        let yaml = r#"
projects_root: /srv/projects
resync_interval_secs: 10
leader_key: ","
agent_command: "claude"
ralph_command: "ralph"
ralph_fallback_prompt: "do the work"
bead_command: "bd"
"#;
        std::fs::write(&config_path, yaml).unwrap();

        let config = Config::load(Some(config_path)).unwrap();
        assert_eq!(config.projects_root, PathBuf::from("/srv/projects"));
        assert_eq!(config.resync_interval_secs, 10);
        assert_eq!(config.leader_key, ',');
    }

    #[test]
    fn config_load_returns_default_when_file_missing() {
        let config = Config::load(Some(PathBuf::from("/nonexistent/config.yaml"))).unwrap();
        assert_eq!(config.resync_interval_secs, 5);
    }

    #[test]
    fn resync_interval_floors_at_one_second() {
        let mut config = Config::default();
        config.resync_interval_secs = 0;
        assert_eq!(config.resync_interval(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn with_projects_root_overrides_default() {
        let config = Config::default().with_projects_root(PathBuf::from("/tmp/p"));
        assert_eq!(config.projects_root, PathBuf::from("/tmp/p"));
    }
}
