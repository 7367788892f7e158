//! Virtualized scrollback over an unbounded output log
//!
//! Lines are ordered oldest to newest. `offset` counts lines scrolled back
//! from the newest: 0 means pinned to latest. When scrolled back, one row is
//! reserved for each edge indicator that is actually shown.

use crate::theme::Theme;

/// The slice of lines a viewport shows, plus its edge indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// First visible line (inclusive)
    pub start: usize,
    /// Last visible line (exclusive)
    pub end: usize,
    /// Offset after clamping
    pub offset: usize,
    pub top_indicator: bool,
    pub bottom_indicator: bool,
}

impl Window {
    fn plain(start: usize, end: usize, offset: usize) -> Self {
        Self {
            start,
            end,
            offset,
            top_indicator: false,
            bottom_indicator: false,
        }
    }

    /// Total rows the window occupies including indicators
    pub fn rows(&self) -> usize {
        (self.end - self.start) + self.top_indicator as usize + self.bottom_indicator as usize
    }
}

/// Largest offset that still changes the window
pub fn max_offset(total: usize, height: usize) -> usize {
    if height < 3 {
        total.saturating_sub(height)
    } else {
        total.saturating_sub(height - 2)
    }
}

/// Compute the visible window for `total` lines in a viewport of `height` rows
pub fn window(total: usize, offset: usize, height: usize) -> Window {
    if total == 0 || height == 0 {
        return Window::plain(0, 0, 0);
    }

    if offset == 0 {
        let shown = height.min(total);
        return Window::plain(total - shown, total, 0);
    }

    // Too short for indicators: plain window
    if height < 3 {
        let shown = height.min(total);
        let offset = offset.min(total - shown);
        let end = total - offset;
        return Window::plain(end - shown, end, offset);
    }

    let mut capacity = height - 2;
    let mut offset = offset.min(total.saturating_sub(capacity));
    let mut end = total - offset;
    let mut start = end.saturating_sub(capacity);

    if start == 0 {
        // Top indicator not needed: give its row back to content
        capacity = height - 1;
        offset = offset.min(total.saturating_sub(capacity));
        end = total - offset;
        start = 0;
    }

    Window {
        start,
        end,
        offset,
        top_indicator: start > 0,
        bottom_indicator: end < total,
    }
}

/// Render the window over `lines` as newline-joined rows
pub fn render(lines: &[String], offset: usize, height: usize, theme: &Theme) -> String {
    let total = lines.len();
    let win = window(total, offset, height);
    if win.start == win.end {
        return String::new();
    }

    let mut out = Vec::with_capacity(win.rows());
    if win.top_indicator {
        out.push(theme.muted(&format!("▲ {} more", win.start)));
    }
    out.extend(lines[win.start..win.end].iter().cloned());
    if win.bottom_indicator {
        out.push(theme.muted(&format!("▼ {} more", total - win.end)));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::text::strip_ansi;

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {}", i)).collect()
    }

    fn visible(out: &str) -> Vec<String> {
        strip_ansi(out).split('\n').map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        let theme = Theme::hardcoded_default();
        assert_eq!(render(&[], 0, 10, &theme), "");
        assert_eq!(render(&[], 5, 10, &theme), "");
    }

    #[test]
    fn test_pinned_shows_latest_without_indicators() {
        // 11 content rows plus two indicator rows
        let win = window(50, 0, 13);
        assert_eq!((win.start, win.end), (37, 50));
        assert!(!win.top_indicator && !win.bottom_indicator);

        let theme = Theme::hardcoded_default();
        let rows = visible(&render(&numbered(50), 0, 13, &theme));
        for i in 39..50 {
            assert!(rows.contains(&format!("line {}", i)));
        }
        assert!(rows.iter().all(|r| !r.contains("more")));
    }

    #[test]
    fn test_scrolled_middle_shows_both_indicators() {
        let theme = Theme::hardcoded_default();
        let rows = visible(&render(&numbered(50), 20, 13, &theme));
        assert!(rows.contains(&"line 25".to_string()));
        assert!(!rows.contains(&"line 49".to_string()));
        assert_eq!(rows.first().map(String::as_str), Some("▲ 19 more"));
        assert_eq!(rows.last().map(String::as_str), Some("▼ 20 more"));
        assert_eq!(rows.len(), 13);
    }

    #[test]
    fn test_scrolled_to_top_reclaims_indicator_row() {
        let theme = Theme::hardcoded_default();
        assert_eq!(max_offset(50, 13), 39);
        for offset in [39, 40, 100] {
            let rows = visible(&render(&numbered(50), offset, 13, &theme));
            assert_eq!(rows[0], "line 0");
            assert!(rows.iter().all(|r| !r.starts_with('▲')));
            assert!(rows.last().is_some_and(|r| r.starts_with('▼')));
            assert_eq!(rows.len(), 13);
        }
    }

    #[test]
    fn test_clamp_is_idempotent() {
        for (total, height) in [(50, 13), (50, 11), (20, 4), (7, 5), (3, 10)] {
            let max = max_offset(total, height);
            let at_max = window(total, max, height);
            for offset in max..max + 20 {
                if offset == 0 {
                    continue;
                }
                assert_eq!(window(total, offset, height), at_max, "total={} height={}", total, height);
            }
        }
    }

    #[test]
    fn test_scrolling_up_reveals_older_lines() {
        for (total, height) in [(50, 13), (50, 11), (30, 3), (100, 7)] {
            let max = max_offset(total, height);
            // Offset 0 has no indicator rows; see test_first_step_back_reserves_indicator_rows
            let mut last_start = usize::MAX;
            for offset in 1..=max {
                let start = window(total, offset, height).start;
                assert!(start <= last_start, "offset {} moved down", offset);
                last_start = start;
            }
        }
    }

    #[test]
    fn test_first_step_back_reserves_indicator_rows() {
        // Pinned shows `height` lines. One step back hides the newest line and
        // spends two rows on indicators, so the first visible line moves down.
        let pinned = window(50, 0, 13);
        assert_eq!((pinned.start, pinned.end), (37, 50));

        let back = window(50, 1, 13);
        assert_eq!((back.start, back.end), (38, 49));
        assert!(back.top_indicator && back.bottom_indicator);
        assert!(back.start > pinned.start);

        // From there on each step reveals one older line
        assert_eq!(window(50, 2, 13).start, 37);
    }

    #[test]
    fn test_max_offset_never_shows_top_indicator() {
        for (total, height) in [(50, 13), (12, 5), (200, 40)] {
            let win = window(total, max_offset(total, height), height);
            assert!(!win.top_indicator);
            assert_eq!(win.start, 0);
        }
    }

    #[test]
    fn test_window_never_exceeds_height() {
        for total in 0..30 {
            for height in 0..12 {
                for offset in 0..35 {
                    let win = window(total, offset, height);
                    assert!(win.rows() <= height, "{} {} {}", total, height, offset);
                    assert!(win.end <= total);
                }
            }
        }
    }

    #[test]
    fn test_short_content_ignores_offset() {
        let win = window(5, 3, 13);
        assert_eq!((win.start, win.end, win.offset), (0, 5, 0));
        assert!(!win.top_indicator && !win.bottom_indicator);
    }
}
