//! Console presentation
//!
//! `cliclack` framing and `indicatif` progress at an interactive terminal,
//! plain prefixed lines in CI. The hot-reload notifier writes its own
//! single status line per partial build.
//!
//! # Example
//!
//! ```rust,ignore
//! use kiln::ui::{self, UiContext};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "kiln build");
//! ui::step_ok_detail(&ctx, "Built 12 modules", "840ms");
//! ui::outro_success(&ctx, "Done");
//! ```

mod context;
pub mod notifier;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use notifier::HotReloadNotifier;
pub use output::{
    intro, key_value, outro_error, outro_success, remark, section, step_error_detail, step_info,
    step_ok, step_ok_detail, step_warn,
};
pub use progress::{BuildProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, KilnTheme};
