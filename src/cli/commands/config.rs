//! Config command - show or initialize configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::KilnResult;
use crate::ui::{self, UiContext};

/// Execute the config command.
///
/// `manager` is where the effective config was read from; `init_target`
/// is where `config init` writes.
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
    init_target: &ConfigManager,
) -> KilnResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config),
        Some(ConfigAction::Path) => {
            println!("{}", manager.path().display());
            Ok(())
        }
        Some(ConfigAction::Init { force }) => init_config(init_target, force).await,
    }
}

fn show_config(config: &Config) -> KilnResult<()> {
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> KilnResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn(
            &ctx,
            &format!(
                "Config already exists at {} (use --force to overwrite)",
                path.display()
            ),
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_writes_defaults_once() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("kiln.toml"));

        init_config(&manager, false).await.unwrap();
        assert!(manager.path().exists());

        std::fs::write(manager.path(), "[project]\nout_dir = \"build\"\n").unwrap();
        init_config(&manager, false).await.unwrap();
        let kept = manager.load().await.unwrap();
        assert_eq!(kept.project.out_dir, "build");

        init_config(&manager, true).await.unwrap();
        let reset = manager.load().await.unwrap();
        assert_eq!(reset.project.out_dir, "dist");
    }
}
