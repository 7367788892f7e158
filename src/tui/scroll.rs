// Scroll state for the output pane
//
// The output log grows at the bottom, so the offset counts lines scrolled back
// from the newest line. Offset 0 is "pinned": the view follows new output.
// Scrolling back unpins; returning to 0 re-pins.
//
// Each viewed source (a worktree's output) remembers its own offset, so
// switching away and back lands where the user left off.

use super::scrollback::max_offset;
use std::collections::HashMap;
use std::hash::Hash;

/// Scroll position of one viewport over a bottom-anchored log
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrollWindow {
    /// Lines scrolled back from newest (0 = pinned)
    offset: usize,

    /// Total lines in the content
    total: usize,

    /// Rows available for the window (including indicator rows)
    viewport: usize,
}

impl ScrollWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a remembered offset
    pub fn at(offset: usize) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }

    /// Update content and viewport sizes, clamping the offset
    pub fn update_dimensions(&mut self, total: usize, viewport: usize) {
        self.total = total;
        self.viewport = viewport;
        self.clamp();
    }

    /// New lines arrived at the bottom.
    ///
    /// Pinned windows keep following; scrolled-back windows keep showing the
    /// same lines.
    pub fn on_append(&mut self, added: usize) {
        self.total += added;
        if self.offset > 0 {
            self.offset += added;
        }
        self.clamp();
    }

    /// Scroll toward older lines
    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = self.offset.saturating_add(lines);
        self.clamp();
    }

    /// Scroll toward newer lines; reaching 0 re-pins
    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page());
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page());
    }

    /// Jump to the oldest line
    pub fn scroll_to_top(&mut self) {
        self.offset = self.max_offset();
    }

    /// Pin to the newest line
    pub fn pin(&mut self) {
        self.offset = 0;
    }

    pub fn is_pinned(&self) -> bool {
        self.offset == 0
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    fn page(&self) -> usize {
        // Leave room for the two indicator rows
        self.viewport.saturating_sub(2).max(1)
    }

    fn max_offset(&self) -> usize {
        max_offset(self.total, self.viewport)
    }

    fn clamp(&mut self) {
        // Unknown sizes: render will clamp
        if self.viewport == 0 {
            return;
        }
        self.offset = self.offset.min(self.max_offset());
    }
}

/// Per-source scroll offsets, in memory only
#[derive(Debug, Clone)]
pub struct ScrollMemory<K> {
    offsets: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> ScrollMemory<K> {
    pub fn new() -> Self {
        Self {
            offsets: HashMap::new(),
        }
    }

    /// Switch the viewed source from `from` to `to`.
    ///
    /// Saves the current window's offset under `from` and returns the window
    /// to use for `to`: its remembered offset, or pinned for a new source.
    /// The returned window has no dimensions yet; the caller sizes it for the
    /// new source's content.
    pub fn switch(&mut self, from: Option<&K>, current: &ScrollWindow, to: &K) -> ScrollWindow {
        if let Some(from) = from {
            self.offsets.insert(from.clone(), current.offset());
        }
        ScrollWindow::at(self.offsets.get(to).copied().unwrap_or(0))
    }

    pub fn remembered(&self, key: &K) -> Option<usize> {
        self.offsets.get(key).copied()
    }

    /// Forget sources that no longer exist
    pub fn retain(&mut self, keep: impl Fn(&K) -> bool) {
        self.offsets.retain(|k, _| keep(k));
    }
}

impl<K: Eq + Hash + Clone> Default for ScrollMemory<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_window_is_pinned() {
        let mut scroll = ScrollWindow::new();
        scroll.update_dimensions(100, 10);
        assert!(scroll.is_pinned());
        scroll.on_append(5);
        assert!(scroll.is_pinned());
        assert_eq!(scroll.total(), 105);
    }

    #[test]
    fn test_scrolled_back_window_holds_position() {
        let mut scroll = ScrollWindow::new();
        scroll.update_dimensions(100, 10);
        scroll.scroll_up(20);
        scroll.on_append(5);
        assert_eq!(scroll.offset(), 25);
    }

    #[test]
    fn test_scroll_clamps_to_oldest() {
        let mut scroll = ScrollWindow::new();
        scroll.update_dimensions(50, 13);
        scroll.scroll_up(1000);
        assert_eq!(scroll.offset(), 39);
        scroll.scroll_to_top();
        assert_eq!(scroll.offset(), 39);
    }

    #[test]
    fn test_scroll_down_repins() {
        let mut scroll = ScrollWindow::new();
        scroll.update_dimensions(50, 13);
        scroll.page_up();
        assert_eq!(scroll.offset(), 11);
        scroll.scroll_down(100);
        assert!(scroll.is_pinned());
    }

    #[test]
    fn test_shrinking_content_clamps() {
        let mut scroll = ScrollWindow::new();
        scroll.update_dimensions(50, 13);
        scroll.scroll_up(30);
        scroll.update_dimensions(20, 13);
        assert_eq!(scroll.offset(), 9);
    }

    #[test]
    fn test_memory_restores_per_source() {
        let mut memory: ScrollMemory<String> = ScrollMemory::new();
        let a = "main".to_string();
        let b = "feature".to_string();

        let mut current = ScrollWindow::new();
        current.update_dimensions(100, 10);
        current.scroll_up(12);

        // a -> b: b is new, so pinned
        let at_b = memory.switch(Some(&a), &current, &b);
        assert!(at_b.is_pinned());
        assert_eq!(memory.remembered(&a), Some(12));

        // b -> a: a's offset comes back
        let at_a = memory.switch(Some(&b), &at_b, &a);
        assert_eq!(at_a.offset(), 12);
    }
}
