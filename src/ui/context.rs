//! Terminal detection: fancy output only for a human at a TTY

use std::io::IsTerminal;

/// Environment variables set by common CI providers
const CI_VARS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

/// Decides how console output is rendered
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    auto_yes: bool,
}

impl UiContext {
    /// Detect from the current terminal and environment
    pub fn detect() -> Self {
        let tty = std::io::stdout().is_terminal() && std::io::stdin().is_terminal();
        Self {
            interactive: tty && !running_in_ci(),
            auto_yes: false,
        }
    }

    /// Plain output, prompts fall back to their defaults
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    /// Approve confirmations without asking
    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    /// Force plain output (structured logs own the terminal)
    pub fn plain(mut self, plain: bool) -> Self {
        if plain {
            self.interactive = false;
        }
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Spinners, progress bars and cliclack framing
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}

fn running_in_ci() -> bool {
    CI_VARS.iter().any(|var| std::env::var_os(var).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_context() {
        let ctx = UiContext::non_interactive();
        assert!(!ctx.is_interactive());
        assert!(!ctx.use_fancy_output());
        assert!(!ctx.auto_yes());
    }

    #[test]
    fn plain_overrides_detection() {
        let ctx = UiContext::detect().plain(true);
        assert!(!ctx.use_fancy_output());
    }

    #[test]
    fn with_auto_yes() {
        assert!(UiContext::non_interactive().with_auto_yes(true).auto_yes());
    }
}
