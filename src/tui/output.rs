//! Per-worktree output log
//!
//! Agent output streams in one raw markdown line at a time. Re-rendering the
//! whole log on every line would make each append cost the length of the log,
//! so rows are kept per finished block: a blank line outside a code fence
//! closes the open block, and only the open block is rendered again when a
//! line arrives. A block that grows past `MAX_OPEN_LINES` is closed early; if
//! it was inside a fence, the next block re-opens the fence so the code keeps
//! its styling.
//!
//! `relayout` replays every raw line through the same block splitting, so a
//! resize or theme swap produces exactly the rows streaming would have.

use super::markdown::MarkdownRenderer;
use crate::theme::Theme;

/// Longest run of lines rendered as one block
const MAX_OPEN_LINES: usize = 64;

/// An open code fence: its marker run ("```", "~~~~") and the full opener line
#[derive(Debug, Clone)]
struct Fence {
    marker: String,
    opener: String,
}

/// How rendering is done for a given log
pub struct RenderContext<'a> {
    pub markdown: &'a dyn MarkdownRenderer,
    pub theme: &'a Theme,
    pub width: usize,
}

#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    raw: Vec<String>,
    rows: Vec<String>,
    /// Rows belonging to closed blocks; everything after is the open block
    sealed_rows: usize,
    /// First raw line of the open block
    open_start: usize,
    /// The open block follows a blank line (and gets a spacer row)
    open_gap: bool,
    /// Fence opener carried into the open block after an early close
    open_prefix: Option<String>,
    fence: Option<Fence>,
    /// `raw.len()` when history was requested; later lines survive the reply
    history_mark: Option<usize>,
}

impl OutputLog {
    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Remember where streamed output stood when history was requested
    pub fn mark_history_request(&mut self) {
        self.history_mark = Some(self.raw.len());
    }

    /// Append one streamed line, re-rendering only the open block
    pub fn push(&mut self, line: String, ctx: &RenderContext<'_>) {
        self.feed(line, ctx, true);
    }

    /// Put history in front of the output that streamed in after the request.
    ///
    /// Lines that arrived before the request are assumed to be part of the
    /// history. A reply nobody asked for keeps every streamed line.
    pub fn apply_history(&mut self, history: Vec<String>, ctx: &RenderContext<'_>) {
        let mark = self.history_mark.take().unwrap_or(0).min(self.raw.len());
        let streamed = self.raw.split_off(mark);
        self.raw = history;
        self.raw.extend(streamed);
        self.relayout(ctx);
    }

    /// Rebuild every row from the raw lines
    pub fn relayout(&mut self, ctx: &RenderContext<'_>) {
        let raw = std::mem::take(&mut self.raw);
        self.rows.clear();
        self.sealed_rows = 0;
        self.open_start = 0;
        self.open_gap = false;
        self.open_prefix = None;
        self.fence = None;
        for line in raw {
            self.feed(line, ctx, false);
        }
        self.render_open(ctx);
    }

    /// Take one line. With `eager`, rows are current on return.
    fn feed(&mut self, line: String, ctx: &RenderContext<'_>, eager: bool) {
        let blank = line.trim().is_empty();
        self.track_fence(&line);
        self.raw.push(line);

        if blank && self.fence.is_none() {
            // A blank line renders nothing, so eager rows are already current
            if !eager {
                self.render_open(ctx);
            }
            self.seal(true);
            return;
        }

        if eager {
            self.render_open(ctx);
        }
        if self.raw.len() - self.open_start >= MAX_OPEN_LINES {
            if !eager {
                self.render_open(ctx);
            }
            self.seal(false);
        }
    }

    fn seal(&mut self, gap: bool) {
        let had_content = self.rows.len() > self.sealed_rows;
        self.sealed_rows = self.rows.len();
        self.open_start = self.raw.len();
        self.open_prefix = self.fence.as_ref().map(|f| f.opener.clone());
        // Runs of blank lines still produce a single spacer
        self.open_gap = if had_content { gap } else { self.open_gap || gap };
    }

    fn render_open(&mut self, ctx: &RenderContext<'_>) {
        self.rows.truncate(self.sealed_rows);
        let lines = &self.raw[self.open_start..];
        if lines.iter().all(|l| l.trim().is_empty()) {
            return;
        }

        let mut text = String::new();
        if let Some(opener) = &self.open_prefix {
            text.push_str(opener);
            text.push('\n');
        }
        text.push_str(&lines.join("\n"));

        let rendered = ctx.markdown.render(&text, ctx.width.max(1), ctx.theme);
        if rendered.is_empty() {
            return;
        }
        if self.open_gap && self.sealed_rows > 0 {
            self.rows.push(String::new());
        }
        self.rows.extend(rendered.split('\n').map(str::to_string));
    }

    fn track_fence(&mut self, line: &str) {
        let Some(marker) = fence_marker(line) else {
            return;
        };
        match &self.fence {
            None => {
                self.fence = Some(Fence {
                    marker: marker.to_string(),
                    opener: line.to_string(),
                });
            }
            Some(open) => {
                let rest = line.trim_start()[marker.len()..].trim();
                if marker.starts_with(open.marker.as_str()) && rest.is_empty() {
                    self.fence = None;
                }
            }
        }
    }
}

/// The backtick or tilde run opening a fence line, if any
fn fence_marker(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = trimmed.chars().take_while(|c| *c == ch).count();
    (run >= 3).then(|| &trimmed[..run])
}
