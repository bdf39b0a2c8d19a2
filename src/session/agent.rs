use tokio::process::Command;

use crate::config::Config;

/// Shell line that starts the coding agent in the current directory,
/// optionally with an initial prompt.
pub fn agent_invocation(agent_command: &str, prompt: Option<&str>) -> String {
    match prompt {
        Some(prompt) => format!("{} {}", agent_command, shell_quote(prompt)),
        None => agent_command.to_string(),
    }
}

/// Shell line for the automated work loop. Falls back to a generic agent
/// invocation with the canned prompt when the ralph binary is absent.
/// Returns the line and whether the fallback was used.
pub async fn ralph_invocation(config: &Config) -> (String, bool) {
    if binary_available(&config.ralph_command).await {
        (config.ralph_command.clone(), false)
    } else {
        (
            agent_invocation(&config.agent_command, Some(&config.ralph_fallback_prompt)),
            true,
        )
    }
}

pub async fn binary_available(name: &str) -> bool {
    Command::new("which")
        .arg(name)
        .output()
        .await
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_invocation_without_prompt_is_bare_command() {
        assert_eq!(agent_invocation("claude", None), "claude");
    }

    #[test]
    fn agent_invocation_quotes_prompt() {
        let line = agent_invocation("claude", Some("fix the login bug"));
        assert_eq!(line, "claude 'fix the login bug'");
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[tokio::test]
    async fn binary_available_false_for_nonsense_name() {
        assert!(!binary_available("devdeck-no-such-binary-xyz").await);
    }

    #[tokio::test]
    async fn ralph_invocation_falls_back_when_binary_missing() {
        let mut config = Config::default();
        config.ralph_command = "devdeck-no-such-binary-xyz".to_string();
        config.agent_command = "claude".to_string();

        let (line, fallback) = ralph_invocation(&config).await;
        assert!(fallback, "ralph_invocation: missing binary should fall back");
        assert!(line.starts_with("claude "));
        assert!(line.contains("open beads"));
    }
}
