//! Hot-reload status line
//!
//! One line per partial build. The first change to a path starts a new
//! line; repeats return the cursor to column 0, clear the line and rewrite
//! it so rapid rebuilds of one file do not scroll the log.

use chrono::{DateTime, Local};
use console::style;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Carriage return plus ANSI "erase entire line"
const REWRITE_LINE: &str = "\r\x1b[2K";

/// Writes hot-reload status lines
pub struct HotReloadNotifier {
    writer: Mutex<Box<dyn Write + Send>>,
    colored: bool,
}

impl HotReloadNotifier {
    /// Notifier writing to stdout, colored when stdout is a terminal
    pub fn stdout() -> Self {
        Self {
            writer: Mutex::new(Box::new(std::io::stdout())),
            colored: console::colors_enabled(),
        }
    }

    /// Notifier writing plain text to `writer`
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            colored: false,
        }
    }

    /// Message text for one partial build, without cursor control
    pub fn render(output_path: &Path, sequence: u32, timestamp: &DateTime<Local>, ok: bool) -> String {
        let verb = if ok { "reloaded" } else { "failed" };
        let mut line = format!(
            "[{}] {} {}",
            timestamp.format("%H:%M:%S"),
            verb,
            output_path.display()
        );
        if sequence > 0 {
            line.push_str(&format!(" (x{})", sequence.saturating_add(1)));
        }
        line
    }

    /// Write the status line for a finished partial build
    pub fn notify(&self, output_path: &Path, sequence: u32, timestamp: DateTime<Local>, ok: bool) {
        let text = Self::render(output_path, sequence, &timestamp, ok);
        let text = match (self.colored, ok) {
            (false, _) => text,
            (true, true) => style(text).green().to_string(),
            (true, false) => style(text).red().to_string(),
        };
        let prefix = if sequence == 0 { "\n" } else { REWRITE_LINE };

        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = write!(writer, "{}{}", prefix, text).and_then(|_| writer.flush()) {
            debug!("Could not write reload status: {}", e);
        }
    }
}

/// In-memory writer shared between a notifier and a test
#[cfg(test)]
#[derive(Clone, Default)]
pub(crate) struct SharedBuffer(std::sync::Arc<Mutex<Vec<u8>>>);

#[cfg(test)]
impl SharedBuffer {
    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[cfg(test)]
impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
