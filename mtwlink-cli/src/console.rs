//! Line output that works with the terminal in raw mode.

use std::fmt::Display;
use std::io::{self, Write};

use crossterm::terminal;

/// Line terminator for the current terminal mode.
///
/// Raw mode disables output post-processing, so a bare `\n` would not
/// return the cursor to column zero.
pub fn line_ending() -> &'static str {
    if terminal::is_raw_mode_enabled().unwrap_or(false) {
        "\r\n"
    } else {
        "\n"
    }
}

/// Print one line to stdout and flush it.
pub fn line(text: impl Display) {
    let mut stdout = io::stdout().lock();
    let _ = write!(stdout, "{}{}", text, line_ending());
    let _ = stdout.flush();
}
