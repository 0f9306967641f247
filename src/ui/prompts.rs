//! Confirmation prompt with non-interactive fallback

use super::context::UiContext;
use crate::error::{KilnError, KilnResult};

/// Ask a yes/no question.
///
/// `--yes` approves immediately; without a terminal the default is used.
pub async fn confirm(ctx: &UiContext, message: &str, default: bool) -> KilnResult<bool> {
    if ctx.auto_yes() {
        return Ok(true);
    }
    if !ctx.is_interactive() {
        return Ok(default);
    }

    let message = message.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        cliclack::confirm(&message).initial_value(default).interact()
    })
    .await
    .map_err(|e| KilnError::Internal(format!("prompt task failed: {}", e)))?;

    answer.map_err(|e| KilnError::User(format!("Prompt cancelled: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn auto_yes_approves() {
        let ctx = UiContext::non_interactive().with_auto_yes(true);
        assert!(confirm(&ctx, "Clear?", false).await.unwrap());
    }

    #[tokio::test]
    async fn non_interactive_uses_default() {
        let ctx = UiContext::non_interactive();
        assert!(confirm(&ctx, "Clear?", true).await.unwrap());
        assert!(!confirm(&ctx, "Clear?", false).await.unwrap());
    }
}
