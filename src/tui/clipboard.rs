//! Clipboard helper for copying agent output to the system clipboard
//!
//! Uses `arboard` crate for cross-platform support (Windows, macOS, Linux).
//! The clipboard is created fresh each time to avoid holding resources.
//! Callers run this off the event loop; some platforms block briefly.

use super::text::strip_ansi;
use anyhow::{Context, Result};
use arboard::Clipboard;

/// Copy rendered rows to the clipboard as plain text.
///
/// Styling is stripped and trailing padding removed from every row.
/// Common failure cases: no display server (headless Linux), permission denied.
pub fn copy_rows(rows: &[String]) -> Result<usize> {
    let text = plain_text(rows);
    let mut clipboard = Clipboard::new().context("Failed to access clipboard")?;
    clipboard
        .set_text(text)
        .context("Failed to set clipboard text")?;
    Ok(rows.len())
}

/// Styled rows to clipboard-ready text
pub fn plain_text(rows: &[String]) -> String {
    rows.iter()
        .map(|row| strip_ansi(row).trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_strips_styling_and_padding() {
        let rows = vec!["\x1b[1mhello\x1b[0m   ".to_string(), "  world  ".to_string()];
        assert_eq!(plain_text(&rows), "hello\n  world");
    }
}
