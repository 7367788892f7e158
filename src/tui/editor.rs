//! Multi-line text editor widget
//!
//! Used for task prompts and follow-ups. The buffer is a UTF-8 `String` with a
//! cursor measured in chars (runes), never bytes. Visual rows and the cursor's
//! row/column are always derived from `(text, cursor, width)` on demand.
//!
//! The editor owns a three-way focus ring: the text field, a primary button
//! (submit) and a secondary button (cancel). `Tab`/`Shift+Tab` cycle it and
//! wrap at both ends.

use super::text::{char_width, fit_to_width};
use crate::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Which part of the editor receives keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EditorFocus {
    #[default]
    Field,
    Primary,
    Secondary,
}

impl EditorFocus {
    pub fn next(self) -> Self {
        match self {
            Self::Field => Self::Primary,
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Field,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Field => Self::Secondary,
            Self::Primary => Self::Field,
            Self::Secondary => Self::Primary,
        }
    }
}

/// What the owner should do after a key was fed to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorOutcome {
    /// Consumed, state may have changed
    Handled,
    /// User asked to submit the buffer
    Submit,
    /// User asked to abandon the buffer
    Cancel,
    /// Force-quit gesture, bypasses everything
    Quit,
    /// Not an editor key
    Unhandled,
}

/// One wrapped terminal row of the buffer, as a char range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualRow {
    /// Index of the logical (newline-separated) line this row belongs to
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

/// Editable multi-line buffer with cursor, word wrap and focus ring
#[derive(Debug, Clone)]
pub struct TextEditor {
    text: String,
    /// Char index, always kept in `[0, char_count]`
    cursor: usize,
    focus: EditorFocus,
    /// Total columns available to the editor
    width: usize,
    /// First visible visual row
    scroll: usize,
    min_height: usize,
    max_height: usize,
    placeholder: String,
    primary_label: String,
    secondary_label: String,
}

impl TextEditor {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            cursor: 0,
            focus: EditorFocus::Field,
            width: 40,
            scroll: 0,
            min_height: 3,
            max_height: 10,
            placeholder: placeholder.into(),
            primary_label: "Submit".to_string(),
            secondary_label: "Cancel".to_string(),
        }
    }

    /// Bound the number of visible text rows
    pub fn with_heights(mut self, min_height: usize, max_height: usize) -> Self {
        self.min_height = min_height.max(1);
        self.max_height = max_height.max(self.min_height);
        self
    }

    pub fn with_labels(mut self, primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        self.primary_label = primary.into();
        self.secondary_label = secondary.into();
        self
    }

    // ─────────────────────────────────────────────────────────────
    // Buffer access
    // ─────────────────────────────────────────────────────────────

    pub fn value(&self) -> &str {
        &self.text
    }

    /// True when the buffer holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Replace the buffer, cursor moves to the end
    pub fn set_value(&mut self, text: &str) {
        self.text = normalize_newlines(text);
        self.cursor = self.char_count();
        self.scroll = 0;
        self.ensure_cursor_visible();
    }

    /// Clear buffer, cursor, scroll and focus
    pub fn reset(&mut self) {
        self.text.clear();
        self.cursor = 0;
        self.scroll = 0;
        self.focus = EditorFocus::Field;
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Cursor position in chars, clamped against the current buffer
    pub fn cursor(&self) -> usize {
        self.cursor.min(self.char_count())
    }

    pub fn set_cursor(&mut self, pos: usize) {
        self.cursor = pos.min(self.char_count());
        self.ensure_cursor_visible();
    }

    pub fn focus(&self) -> EditorFocus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: EditorFocus) {
        self.focus = focus;
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn set_width(&mut self, width: usize) {
        self.width = width.max(2);
        self.ensure_cursor_visible();
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(b, _)| b)
            .unwrap_or(self.text.len())
    }

    // ─────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────

    pub fn insert_char(&mut self, c: char) {
        let cursor = self.cursor();
        let at = self.byte_offset(cursor);
        self.text.insert(at, c);
        self.cursor = cursor + 1;
        self.ensure_cursor_visible();
    }

    /// Insert a pasted string at the cursor
    pub fn insert_str(&mut self, s: &str) {
        let s = normalize_newlines(s).replace('\t', "    ");
        let cursor = self.cursor();
        let at = self.byte_offset(cursor);
        self.text.insert_str(at, &s);
        self.cursor = cursor + s.chars().count();
        self.ensure_cursor_visible();
    }

    /// Delete the char before the cursor. Returns false at buffer start.
    pub fn delete_backward(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor == 0 {
            return false;
        }
        let at = self.byte_offset(cursor - 1);
        self.text.remove(at);
        self.cursor = cursor - 1;
        self.ensure_cursor_visible();
        true
    }

    /// Delete the char under the cursor. Returns false at buffer end.
    pub fn delete_forward(&mut self) -> bool {
        let cursor = self.cursor();
        if cursor >= self.char_count() {
            return false;
        }
        let at = self.byte_offset(cursor);
        self.text.remove(at);
        self.cursor = cursor;
        self.ensure_cursor_visible();
        true
    }

    /// Remove the char range `[start, end)`, cursor lands on `start`
    fn delete_range(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let from = self.byte_offset(start);
        let to = self.byte_offset(end);
        self.text.replace_range(from..to, "");
        self.cursor = start;
        self.ensure_cursor_visible();
    }

    pub fn delete_to_line_start(&mut self) {
        let (start, _) = self.line_bounds();
        self.delete_range(start, self.cursor());
    }

    pub fn delete_to_line_end(&mut self) {
        let (_, end) = self.line_bounds();
        self.delete_range(self.cursor(), end);
    }

    /// Delete the word (and any spaces) before the cursor
    pub fn delete_word_backward(&mut self) {
        let cursor = self.cursor();
        let chars: Vec<char> = self.text.chars().collect();
        let mut start = cursor;
        while start > 0 && chars[start - 1] == ' ' {
            start -= 1;
        }
        while start > 0 && chars[start - 1] != ' ' && chars[start - 1] != '\n' {
            start -= 1;
        }
        self.delete_range(start, cursor);
    }

    // ─────────────────────────────────────────────────────────────
    // Cursor motion
    // ─────────────────────────────────────────────────────────────

    pub fn move_left(&mut self) {
        self.cursor = self.cursor().saturating_sub(1);
        self.ensure_cursor_visible();
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor() + 1).min(self.char_count());
        self.ensure_cursor_visible();
    }

    pub fn move_line_start(&mut self) {
        self.cursor = self.line_bounds().0;
        self.ensure_cursor_visible();
    }

    pub fn move_line_end(&mut self) {
        self.cursor = self.line_bounds().1;
        self.ensure_cursor_visible();
    }

    pub fn move_up(&mut self) {
        let (row, col) = self.cursor_visual();
        if row == 0 {
            self.cursor = 0;
        } else {
            self.cursor = self.position_in_row(row - 1, col);
        }
        self.ensure_cursor_visible();
    }

    pub fn move_down(&mut self) {
        let rows = self.visual_rows();
        let (row, col) = self.cursor_visual();
        if row + 1 >= rows.len() {
            self.cursor = self.char_count();
        } else {
            self.cursor = self.position_in_row(row + 1, col);
        }
        self.ensure_cursor_visible();
    }

    /// Char range `[start, end)` of the logical line holding the cursor
    fn line_bounds(&self) -> (usize, usize) {
        let cursor = self.cursor();
        let mut start = 0;
        for (i, c) in self.text.chars().enumerate() {
            if c == '\n' {
                if i >= cursor {
                    return (start, i);
                }
                start = i + 1;
            }
        }
        (start, self.char_count())
    }

    /// Char index in visual row `row` closest to column `col`
    fn position_in_row(&self, row: usize, col: usize) -> usize {
        let rows = self.visual_rows();
        let Some(target) = rows.get(row) else {
            return self.char_count();
        };
        let continues = rows
            .get(row + 1)
            .is_some_and(|next| next.line == target.line);

        let mut pos = target.start;
        let mut width = 0;
        for c in self.text.chars().skip(target.start).take(target.end - target.start) {
            let w = char_width(c);
            if width + w > col {
                break;
            }
            width += w;
            pos += 1;
        }
        // The end of a wrapped row is the start of the next one
        if continues && pos >= target.end && target.end > target.start {
            pos = target.end - 1;
        }
        pos
    }

    // ─────────────────────────────────────────────────────────────
    // Layout
    // ─────────────────────────────────────────────────────────────

    /// Columns available for text; one column is kept free for the cursor
    fn layout_width(&self) -> usize {
        self.width.saturating_sub(1).max(1)
    }

    /// Word-wrap every logical line to the layout width.
    ///
    /// An empty buffer is exactly one empty row. Spaces may hang past the
    /// right edge instead of starting a row of their own.
    pub fn visual_rows(&self) -> Vec<VisualRow> {
        let chars: Vec<char> = self.text.chars().collect();
        let width = self.layout_width();
        let mut rows = Vec::new();
        let mut line = 0;
        let mut line_start = 0;

        for i in 0..=chars.len() {
            if i == chars.len() || chars[i] == '\n' {
                wrap_line(&chars[line_start..i], line_start, line, width, &mut rows);
                line += 1;
                line_start = i + 1;
            }
        }
        rows
    }

    /// Visual (row, column) of the cursor
    pub fn cursor_visual(&self) -> (usize, usize) {
        let rows = self.visual_rows();
        let cursor = self.cursor();
        let row = rows
            .iter()
            .rposition(|r| r.start <= cursor && cursor <= r.end)
            .unwrap_or(0);
        let start = rows.get(row).map(|r| r.start).unwrap_or(0);
        let col = self
            .text
            .chars()
            .skip(start)
            .take(cursor.saturating_sub(start))
            .map(char_width)
            .sum();
        (row, col)
    }

    /// Number of text rows shown, bounded by min/max height
    pub fn visible_height(&self) -> usize {
        self.visual_rows()
            .len()
            .clamp(self.min_height, self.max_height)
    }

    /// Total rendered height including the button row
    pub fn rendered_height(&self) -> usize {
        self.visible_height() + 2
    }

    /// Scroll so the cursor row is inside the viewport
    fn ensure_cursor_visible(&mut self) {
        self.scroll = self.scroll_for_cursor();
    }

    fn scroll_for_cursor(&self) -> usize {
        let height = self.visible_height();
        let total = self.visual_rows().len();
        let (row, _) = self.cursor_visual();
        let mut scroll = self.scroll.min(total.saturating_sub(height));
        if row < scroll {
            scroll = row;
        } else if row >= scroll + height {
            scroll = row + 1 - height;
        }
        scroll
    }

    // ─────────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────────

    /// Interpret a key event
    pub fn handle_key(&mut self, key: KeyEvent) -> EditorOutcome {
        if key.kind == KeyEventKind::Release {
            return EditorOutcome::Unhandled;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('c') if ctrl => return EditorOutcome::Quit,
            KeyCode::Char('s') if ctrl => return EditorOutcome::Submit,
            KeyCode::Esc => return EditorOutcome::Cancel,
            KeyCode::Tab => {
                self.focus_next();
                return EditorOutcome::Handled;
            }
            KeyCode::BackTab => {
                self.focus_prev();
                return EditorOutcome::Handled;
            }
            KeyCode::Enter => {
                return match self.focus {
                    EditorFocus::Field => {
                        if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                            self.insert_char('\n');
                            EditorOutcome::Handled
                        } else if self.is_blank() {
                            EditorOutcome::Handled
                        } else {
                            EditorOutcome::Submit
                        }
                    }
                    EditorFocus::Primary => EditorOutcome::Submit,
                    EditorFocus::Secondary => EditorOutcome::Cancel,
                };
            }
            _ => {}
        }

        if self.focus != EditorFocus::Field {
            return match key.code {
                KeyCode::Left | KeyCode::Right => {
                    self.focus = match self.focus {
                        EditorFocus::Primary => EditorFocus::Secondary,
                        _ => EditorFocus::Primary,
                    };
                    EditorOutcome::Handled
                }
                _ => EditorOutcome::Unhandled,
            };
        }

        match key.code {
            KeyCode::Char('j') if ctrl => self.insert_char('\n'),
            KeyCode::Char('a') if ctrl => self.move_line_start(),
            KeyCode::Char('e') if ctrl => self.move_line_end(),
            KeyCode::Char('u') if ctrl => self.delete_to_line_start(),
            KeyCode::Char('k') if ctrl => self.delete_to_line_end(),
            KeyCode::Char('w') if ctrl => self.delete_word_backward(),
            KeyCode::Char(c) if !ctrl && !alt => self.insert_char(c),
            KeyCode::Backspace => {
                self.delete_backward();
            }
            KeyCode::Delete => {
                self.delete_forward();
            }
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::Home => self.move_line_start(),
            KeyCode::End => self.move_line_end(),
            _ => return EditorOutcome::Unhandled,
        }
        EditorOutcome::Handled
    }

    // ─────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────

    /// Render the visible text rows, a spacer and the button row.
    ///
    /// `active` is false when another widget owns input; the cursor is then
    /// hidden. Every returned row is exactly `width` columns.
    pub fn render(&self, theme: &Theme, active: bool) -> String {
        let rows = self.visual_rows();
        let height = self.visible_height();
        let scroll = self.scroll_for_cursor();
        let (cursor_row, cursor_col) = self.cursor_visual();
        let show_cursor = active && self.focus == EditorFocus::Field;
        let chars: Vec<char> = self.text.chars().collect();

        let mut out = Vec::with_capacity(height + 2);

        if self.text.is_empty() {
            let cursor = if show_cursor { theme.reverse(" ") } else { " ".to_string() };
            let line = format!("{}{}", cursor, theme.muted(&self.placeholder));
            out.push(fit_to_width(&line, self.width));
            for _ in 1..height {
                out.push(" ".repeat(self.width));
            }
        } else {
            for idx in scroll..scroll + height {
                let Some(row) = rows.get(idx) else {
                    out.push(" ".repeat(self.width));
                    continue;
                };
                let text: String = chars[row.start..row.end.min(chars.len())].iter().collect();
                let line = if show_cursor && idx == cursor_row {
                    with_cursor(&text, cursor_col, theme)
                } else {
                    text
                };
                out.push(fit_to_width(&line, self.width));
            }
        }

        out.push(" ".repeat(self.width));
        out.push(fit_to_width(&self.render_buttons(theme, active), self.width));
        out.join("\n")
    }

    fn render_buttons(&self, theme: &Theme, active: bool) -> String {
        let button = |label: &str, focused: bool| {
            let text = format!("[ {} ]", label);
            if active && focused {
                theme.reverse(&text)
            } else {
                theme.muted(&text)
            }
        };
        format!(
            "{}  {}",
            button(&self.primary_label, self.focus == EditorFocus::Primary),
            button(&self.secondary_label, self.focus == EditorFocus::Secondary)
        )
    }
}

fn normalize_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

/// Wrap one logical line (`chars`, starting at global char `offset`)
fn wrap_line(chars: &[char], offset: usize, line: usize, width: usize, rows: &mut Vec<VisualRow>) {
    let mut start = 0;
    let mut used = 0;
    let mut last_space: Option<usize> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == ' ' {
            last_space = Some(i);
            used += 1;
            i += 1;
            continue;
        }
        let w = char_width(c);
        if used + w > width && i > start {
            let brk = match last_space {
                Some(sp) if sp >= start => sp + 1,
                _ => i,
            };
            rows.push(VisualRow {
                line,
                start: offset + start,
                end: offset + brk,
            });
            start = brk;
            used = chars[start..i].iter().map(|&c| char_width(c)).sum();
            last_space = None;
            continue;
        }
        used += w;
        i += 1;
    }

    rows.push(VisualRow {
        line,
        start: offset + start,
        end: offset + chars.len(),
    });
}

/// Draw a reverse-video cursor cell at visual column `col` of `text`
fn with_cursor(text: &str, col: usize, theme: &Theme) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut width = 0;
    let mut placed = false;
    for c in text.chars() {
        if !placed && width >= col {
            out.push_str(&theme.reverse(&c.to_string()));
            placed = true;
            width += char_width(c);
            continue;
        }
        out.push(c);
        width += char_width(c);
    }
    if !placed {
        out.push_str(&theme.reverse(" "));
    }
    out
}
