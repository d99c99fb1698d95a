//! Whether output goes to a person or a pipeline

use std::io::IsTerminal;

/// Environment variables set by common CI runners
const CI_VARS: [&str; 6] = [
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// Interactive only when both ends are terminals and no CI runner is detected
fn interactive_from(stdout_tty: bool, stdin_tty: bool, env_set: impl Fn(&str) -> bool) -> bool {
    stdout_tty && stdin_tty && !CI_VARS.iter().any(|var| env_set(var))
}

/// Output mode for one command invocation
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    /// Approve prompts without asking (`--yes`)
    auto_yes: bool,
}

impl UiContext {
    pub fn detect() -> Self {
        let interactive = interactive_from(
            std::io::stdout().is_terminal(),
            std::io::stdin().is_terminal(),
            |var| std::env::var_os(var).is_some(),
        );
        Self {
            interactive,
            auto_yes: false,
        }
    }

    /// Plain output and default answers
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Spinners, bars and cliclack lines
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}
