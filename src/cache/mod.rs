//! Style-class usage cache
//!
//! Tracks which style-class tokens each script references so a partial
//! build can tell whether an edit changed class usage. A change cascades
//! into recompiling every stylesheet.
//!
//! # Storage
//!
//! | Property | Value |
//! |----------|-------|
//! | Format | JSON object, path -> sorted token array |
//! | Default location | `.kiln/style-usage.json` |
//! | Missing/corrupt | Treated as empty, never an error |
//! | Writes | Atomic (temp file + rename), serialized by one mutex |

pub mod tokens;
pub mod usage;

pub use tokens::{extract_tokens, TokenSet};
pub use usage::{StyleUsageCache, UsageMap};
