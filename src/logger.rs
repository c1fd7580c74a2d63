//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `Progress` for a single in-place counter line during long phases
//! - `WatchStatus` for the overwriting single-line serve-mode status

use colored::{ColoredString, Colorize};
use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType, size},
};
use std::{
    io::{Write, stdout},
    sync::{
        Mutex, OnceLock,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Cached terminal width (fetched once on first use)
static TERMINAL_WIDTH: OnceLock<u16> = OnceLock::new();

/// Get terminal width, cached after first call.
/// Falls back to 120 columns if detection fails.
fn terminal_width() -> usize {
    *TERMINAL_WIDTH.get_or_init(|| size().map(|(w, _)| w).unwrap_or(120)) as usize
}

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix, truncated to the terminal
/// width. Multiline messages are printed untruncated.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();

    if message.contains('\n') {
        writeln!(stdout, "{prefix} {message}").ok();
    } else {
        let max_msg_len = terminal_width().saturating_sub(module.len() + 3);
        writeln!(stdout, "{prefix} {}", truncate_str(message, max_msg_len)).ok();
    }

    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module {
        "serve" => prefix.bright_blue().bold(),
        "watch" => prefix.bright_green().bold(),
        "error" => prefix.bright_red().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Truncate a string to fit within `max_len` bytes on a char boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        return s;
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Single in-place counter line: `[render] 42/100`.
///
/// Safe to increment from rayon workers; the line is redrawn under a
/// mutex. Call `finish()` (or drop) to clear it.
pub struct Progress {
    module: &'static str,
    total: usize,
    current: AtomicUsize,
    lock: Mutex<()>,
}

impl Progress {
    pub fn new(module: &'static str, total: usize) -> Self {
        Self {
            module,
            total,
            current: AtomicUsize::new(0),
            lock: Mutex::new(()),
        }
    }

    /// Increment the counter and redraw the line.
    pub fn inc(&self) {
        let current = self.current.fetch_add(1, Ordering::Relaxed) + 1;
        let _guard = self.lock.lock().ok();

        let mut stdout = stdout().lock();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(
            stdout,
            "\r{} {current}/{}",
            colorize_prefix(self.module),
            self.total
        )
        .ok();
        stdout.flush().ok();
    }

    /// Clear the counter line.
    pub fn finish(&self) {
        let _guard = self.lock.lock().ok();
        let mut stdout = stdout().lock();
        execute!(stdout, Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "\r").ok();
        stdout.flush().ok();
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Single-line status display for watch mode.
///
/// Each message overwrites the previous one, keeping the terminal clean
/// across repeated rebuilds.
pub struct WatchStatus {
    /// Lines of previous output to clear
    last_lines: usize,
}

impl WatchStatus {
    pub const fn new() -> Self {
        Self { last_lines: 0 }
    }

    /// Display success message (✓ prefix, green).
    pub fn success(&mut self, message: &str) {
        self.display(&"✓".green().to_string(), message);
    }

    /// Display error message (✗ prefix, red) with optional detail.
    pub fn error(&mut self, summary: &str, detail: &str) {
        let message = if detail.is_empty() {
            summary.to_string()
        } else {
            format!("{summary}\n{detail}")
        };
        self.display(&"✗".red().to_string(), &message);
    }

    fn display(&mut self, symbol: &str, message: &str) {
        let mut stdout = stdout().lock();

        if self.last_lines > 0 {
            #[allow(clippy::cast_possible_truncation)]
            let lines = self.last_lines as u16;
            execute!(stdout, cursor::MoveUp(lines)).ok();
            execute!(stdout, Clear(ClearType::FromCursorDown)).ok();
        }

        let timestamp = format!("[{}]", now_hms()).dimmed();
        writeln!(stdout, "{timestamp} {symbol} {message}").ok();
        stdout.flush().ok();

        self.last_lines = message.matches('\n').count() + 1;
    }
}

impl Default for WatchStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Current local time formatted as HH:MM:SS.
fn now_hms() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
