//! Escape- and width-aware text primitives
//!
//! Every frame in the TUI is a plain `String` that may contain SGR escape
//! sequences and wide glyphs (CJK, emoji). These helpers measure, cut, pad and
//! splice such strings by *visual column*, never by byte or char index, and
//! never split an escape sequence or a multi-byte glyph.
//!
//! Only the escapes we emit ourselves need to round-trip: CSI sequences
//! (`ESC [ ... final`), OSC sequences (`ESC ] ... BEL` / `ESC ] ... ESC \`)
//! and two-byte `ESC x` sequences.

use unicode_width::UnicodeWidthChar;

/// Full SGR reset, appended whenever a cut would leave styling open
pub const RESET: &str = "\x1b[0m";

/// Marker appended by `truncate_to_width` when content was dropped
pub const ELLIPSIS: &str = "...";

const ESC: char = '\x1b';

// ═══════════════════════════════════════════════════════════════════════════
// Tokenizer
// ═══════════════════════════════════════════════════════════════════════════

/// A single visual unit of a styled string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// A complete escape sequence (zero width)
    Escape(&'a str),
    /// One char and the number of terminal columns it occupies
    Glyph(char, usize),
}

/// Iterator over the tokens of a styled string
pub struct Tokens<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokens<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Byte length of the escape sequence starting at `start` (which is ESC)
    fn escape_len(&self, start: usize) -> usize {
        let bytes = self.src.as_bytes();
        let mut i = start + 1;
        match bytes.get(i) {
            // CSI: parameters and intermediates, then one final byte 0x40..=0x7E
            Some(b'[') => {
                i += 1;
                while let Some(&b) = bytes.get(i) {
                    i += 1;
                    if (0x40..=0x7E).contains(&b) {
                        return i - start;
                    }
                }
                bytes.len() - start
            }
            // OSC: terminated by BEL or ST (ESC \)
            Some(b']') => {
                i += 1;
                while let Some(&b) = bytes.get(i) {
                    if b == 0x07 {
                        return i + 1 - start;
                    }
                    if b == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                        return i + 2 - start;
                    }
                    i += 1;
                }
                bytes.len() - start
            }
            // Two-byte escape; the second char may be multi-byte
            Some(_) => {
                let rest = &self.src[i..];
                let second = rest.chars().next().map(char::len_utf8).unwrap_or(0);
                1 + second
            }
            None => 1,
        }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.src[self.pos..];
        let c = rest.chars().next()?;
        if c == ESC {
            let len = self.escape_len(self.pos);
            let seq = &self.src[self.pos..self.pos + len];
            self.pos += len;
            return Some(Token::Escape(seq));
        }
        self.pos += c.len_utf8();
        Some(Token::Glyph(c, char_width(c)))
    }
}

/// Tokenize a styled string
pub fn tokens(s: &str) -> Tokens<'_> {
    Tokens::new(s)
}

/// Column width of a single char. Control chars occupy nothing.
pub fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

fn is_sgr(seq: &str) -> bool {
    seq.starts_with("\x1b[") && seq.ends_with('m')
}

fn is_sgr_reset(seq: &str) -> bool {
    seq == "\x1b[0m" || seq == "\x1b[m"
}

// ═══════════════════════════════════════════════════════════════════════════
// Measuring
// ═══════════════════════════════════════════════════════════════════════════

/// Visual column count of `s`, ignoring escapes. Wide glyphs count as 2.
///
/// For multi-line input this is the width of the widest line.
pub fn measure_width(s: &str) -> usize {
    s.split('\n').map(line_width).max().unwrap_or(0)
}

fn line_width(line: &str) -> usize {
    tokens(line)
        .map(|t| match t {
            Token::Glyph(_, w) => w,
            Token::Escape(_) => 0,
        })
        .sum()
}

/// Remove every escape sequence, leaving only printable content
pub fn strip_ansi(s: &str) -> String {
    tokens(s)
        .filter_map(|t| match t {
            Token::Glyph(c, _) => Some(c),
            Token::Escape(_) => None,
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Cutting and padding
// ═══════════════════════════════════════════════════════════════════════════

/// Longest prefix of a single line whose width is at most `max_cols`.
///
/// Escapes met before the cut point are kept. If any SGR escape was kept the
/// result is closed with a reset so the cut never leaks styling.
/// Returns the prefix and its visual width.
pub fn cut_to_width(line: &str, max_cols: usize) -> (String, usize) {
    let mut out = String::with_capacity(line.len().min(max_cols * 4 + 8));
    let mut width = 0;
    let mut styled = false;
    let mut cut = false;

    for token in tokens(line) {
        match token {
            Token::Escape(seq) => {
                if cut {
                    continue;
                }
                styled |= is_sgr(seq) && !is_sgr_reset(seq);
                if is_sgr_reset(seq) {
                    styled = false;
                }
                out.push_str(seq);
            }
            Token::Glyph(c, w) => {
                if cut {
                    continue;
                }
                if width + w > max_cols {
                    cut = true;
                    continue;
                }
                out.push(c);
                width += w;
            }
        }
    }

    if cut && styled {
        out.push_str(RESET);
    }
    (out, width)
}

/// Truncate `s` so that it measures at most `max_cols`.
///
/// When content is dropped and `max_cols > 3` the result ends in `...`.
/// For `max_cols <= 3` the result is the best prefix that fits, no ellipsis.
pub fn truncate_to_width(s: &str, max_cols: usize) -> String {
    if measure_width(s) <= max_cols {
        return s.to_string();
    }
    if max_cols <= ELLIPSIS.len() {
        let (prefix, _) = cut_to_width(first_line(s), max_cols);
        return prefix;
    }
    let (mut prefix, _) = cut_to_width(first_line(s), max_cols - ELLIPSIS.len());
    prefix.push_str(ELLIPSIS);
    prefix
}

fn first_line(s: &str) -> &str {
    s.split('\n').next().unwrap_or("")
}

/// Pad a single line with trailing spaces up to `width` columns
pub fn pad_to_width(line: &str, width: usize) -> String {
    let current = line_width(line);
    if current >= width {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + width - current);
    out.push_str(line);
    out.extend(std::iter::repeat(' ').take(width - current));
    out
}

/// Cut or pad a single line to exactly `width` columns (no ellipsis)
pub fn fit_to_width(line: &str, width: usize) -> String {
    let (cut, _) = cut_to_width(line, width);
    // A wide glyph at the edge can leave the cut one column short
    pad_to_width(&cut, width)
}

/// Normalize a multi-line block to exactly `height` lines of exactly `width`
/// columns each. Used before panes are joined side by side.
pub fn pad_or_truncate(block: &str, width: usize, height: usize) -> String {
    let mut lines: Vec<String> = block
        .split('\n')
        .take(height)
        .map(|line| fit_to_width(line, width))
        .collect();
    while lines.len() < height {
        lines.push(" ".repeat(width));
    }
    lines.join("\n")
}

/// Join equally tall blocks side by side, line by line
pub fn join_horizontal(blocks: &[String]) -> String {
    let split: Vec<Vec<&str>> = blocks.iter().map(|b| b.split('\n').collect()).collect();
    let height = split.iter().map(Vec::len).max().unwrap_or(0);
    let mut rows = Vec::with_capacity(height);
    for row in 0..height {
        let mut line = String::new();
        for block in &split {
            line.push_str(block.get(row).copied().unwrap_or(""));
        }
        rows.push(line);
    }
    rows.join("\n")
}

// ═══════════════════════════════════════════════════════════════════════════
// Splicing
// ═══════════════════════════════════════════════════════════════════════════

/// Replace `base` from visual column `col` onward with `overlay`.
///
/// The prefix (with its escapes) is preserved. If `base` is narrower than
/// `col` it is padded with spaces. A wide glyph straddling `col` is replaced
/// by a single space so the overlay lands on the right column.
pub fn splice_at(base: &str, overlay: &str, col: usize) -> String {
    let mut out = String::with_capacity(base.len() + overlay.len() + 8);
    let mut width = 0;
    let mut styled = false;

    for token in tokens(base) {
        if width >= col {
            break;
        }
        match token {
            Token::Escape(seq) => {
                if is_sgr_reset(seq) {
                    styled = false;
                } else if is_sgr(seq) {
                    styled = true;
                }
                out.push_str(seq);
            }
            Token::Glyph(c, w) => {
                if width + w > col {
                    // Straddles the splice column
                    out.push(' ');
                    width += 1;
                    break;
                }
                out.push(c);
                width += w;
            }
        }
    }

    if styled {
        out.push_str(RESET);
    }
    if width < col {
        out.extend(std::iter::repeat(' ').take(col - width));
    }
    out.push_str(overlay);
    out
}

/// The part of `line` from visual column `col` onward.
///
/// Styling active at the cut is replayed at the start of the result. A wide
/// glyph straddling `col` becomes a single space.
pub fn skip_to_width(line: &str, col: usize) -> String {
    let mut active = String::new();
    let mut out = String::new();
    let mut width = 0;
    let mut started = col == 0;

    for token in tokens(line) {
        match token {
            Token::Escape(seq) => {
                if started {
                    out.push_str(seq);
                } else if is_sgr_reset(seq) {
                    active.clear();
                } else if is_sgr(seq) {
                    active.push_str(seq);
                }
            }
            Token::Glyph(c, w) => {
                if started {
                    out.push(c);
                    continue;
                }
                width += w;
                if width > col {
                    out.push_str(&active);
                    out.push(' ');
                    started = true;
                } else if width == col {
                    out.push_str(&active);
                    started = true;
                }
            }
        }
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════
// Wrapping
// ═══════════════════════════════════════════════════════════════════════════

/// Word-wrap a styled string to `width` columns.
///
/// Breaks at the last space when possible and hard-splits words longer than
/// the width. Active SGR styling is closed at the end of each row and reopened
/// at the start of the next, so every returned row is self-contained.
pub fn wrap_to_width(s: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return s.split('\n').map(str::to_string).collect();
    }

    let mut rows = Vec::new();
    let mut active = String::new();
    let mut row = String::new();
    let mut row_width = 0;
    // (byte index of the space in `row`, width before it, styling active at it)
    let mut last_space: Option<(usize, usize, String)> = None;

    let finish = |row: &mut String, active: &str, rows: &mut Vec<String>| {
        if !active.is_empty() {
            row.push_str(RESET);
        }
        rows.push(std::mem::take(row));
    };

    for token in tokens(s) {
        match token {
            Token::Escape(seq) => {
                if is_sgr_reset(seq) {
                    active.clear();
                } else if is_sgr(seq) {
                    active.push_str(seq);
                }
                row.push_str(seq);
            }
            Token::Glyph('\n', _) => {
                finish(&mut row, &active, &mut rows);
                row.push_str(&active);
                row_width = 0;
                last_space = None;
            }
            Token::Glyph(c, w) => {
                if row_width + w > width && row_width > 0 {
                    if c == ' ' {
                        finish(&mut row, &active, &mut rows);
                        row.push_str(&active);
                        row_width = 0;
                        last_space = None;
                        continue;
                    }
                    match last_space.take() {
                        Some((idx, before, style_at)) => {
                            let tail = row[idx + 1..].to_string();
                            row.truncate(idx);
                            finish(&mut row, &style_at, &mut rows);
                            row.push_str(&style_at);
                            row.push_str(&tail);
                            row_width -= before + 1;
                        }
                        None => {
                            finish(&mut row, &active, &mut rows);
                            row.push_str(&active);
                            row_width = 0;
                        }
                    }
                }
                if c == ' ' {
                    last_space = Some((row.len(), row_width, active.clone()));
                }
                row.push(c);
                row_width += w;
            }
        }
    }
    finish(&mut row, &active, &mut rows);
    rows
}

/// Left text, right text, gap filled with spaces; right side wins on overflow
pub fn spread(left: &str, right: &str, width: usize) -> String {
    let right_width = measure_width(right);
    if right_width == 0 {
        return fit_to_width(left, width);
    }
    let left_width = width.saturating_sub(right_width + 1);
    let left = fit_to_width(&truncate_to_width(left, left_width), left_width);
    fit_to_width(&format!("{} {}", left, right), width)
}
