//! Cache command - inspect or clear the style usage cache

use crate::cache::StyleUsageCache;
use crate::cli::args::{CacheAction, CacheArgs};
use crate::config::Config;
use crate::error::KilnResult;
use crate::ui::{self, UiContext};
use std::path::Path;

/// Tokens shown per script before eliding
const PREVIEW_TOKENS: usize = 6;

/// Execute the cache command
pub async fn execute(args: CacheArgs, config: &Config, project_root: &Path) -> KilnResult<()> {
    let cache = StyleUsageCache::new(project_root.join(&config.cache.path));

    match args.action {
        None | Some(CacheAction::Show) => show_cache(&cache).await,
        Some(CacheAction::Clear { yes }) => {
            let ctx = UiContext::detect().with_auto_yes(yes);
            clear_cache(&ctx, &cache).await
        }
    }
}

async fn show_cache(cache: &StyleUsageCache) -> KilnResult<()> {
    let usage = cache.snapshot().await;
    if usage.is_empty() {
        println!("No class usage recorded at {}", cache.path().display());
        return Ok(());
    }

    let width = usage.keys().map(String::len).max().unwrap_or(0).max("SCRIPT".len());
    println!("{:<width$}  {:>6}  CLASSES", "SCRIPT", "COUNT", width = width);
    for (script, tokens) in &usage {
        println!(
            "{:<width$}  {:>6}  {}",
            script,
            tokens.len(),
            preview(tokens.iter().map(String::as_str)),
            width = width
        );
    }
    println!();
    println!("Total: {} script(s)", usage.len());
    Ok(())
}

async fn clear_cache(ctx: &UiContext, cache: &StyleUsageCache) -> KilnResult<()> {
    let prompt = format!("Delete {}?", cache.path().display());
    if !ui::confirm(ctx, &prompt, false).await? {
        ui::remark(ctx, "Cancelled");
        return Ok(());
    }

    if cache.clear().await? {
        ui::step_ok(ctx, "Style usage cache cleared");
    } else {
        ui::remark(ctx, "Nothing to clear");
    }
    Ok(())
}

fn preview<'a>(tokens: impl ExactSizeIterator<Item = &'a str>) -> String {
    let total = tokens.len();
    let shown: Vec<&str> = tokens.take(PREVIEW_TOKENS).collect();
    if total > shown.len() {
        format!("{} (+{} more)", shown.join(" "), total - shown.len())
    } else {
        shown.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TokenSet;
    use tempfile::TempDir;

    #[test]
    fn preview_elides_long_sets() {
        let tokens: Vec<String> = (0..8).map(|i| format!("c{i}")).collect();
        assert_eq!(
            preview(tokens.iter().map(String::as_str)),
            "c0 c1 c2 c3 c4 c5 (+2 more)"
        );
        assert_eq!(preview(["a", "b"].into_iter()), "a b");
    }

    #[tokio::test]
    async fn clear_with_yes_removes_file() {
        let temp = TempDir::new().unwrap();
        let cache = StyleUsageCache::new(temp.path().join(".kiln/style-usage.json"));
        let tokens: TokenSet = ["flex".to_string()].into_iter().collect();
        cache.has_changed("src/a.tsx", &tokens).await.unwrap();
        assert!(cache.path().exists());

        clear_cache(&UiContext::non_interactive().with_auto_yes(true), &cache)
            .await
            .unwrap();
        assert!(!cache.path().exists());
    }

    #[tokio::test]
    async fn clear_without_confirmation_keeps_file() {
        let temp = TempDir::new().unwrap();
        let cache = StyleUsageCache::new(temp.path().join("usage.json"));
        let tokens: TokenSet = ["flex".to_string()].into_iter().collect();
        cache.has_changed("src/a.tsx", &tokens).await.unwrap();

        // Without a terminal the default answer is no
        clear_cache(&UiContext::non_interactive(), &cache)
            .await
            .unwrap();
        assert!(cache.path().exists());
    }
}
