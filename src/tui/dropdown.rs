//! Filterable single-select list
//!
//! Backs every picker in the UI: worktree picker, task-flow step one, the
//! session browser and the theme list in settings.
//!
//! Selection is always an index into the *effective* list: the filtered view
//! while a filter is active, the full backing list otherwise. The filter is an
//! optional ordered list of full-list indices, so mapping between the two is
//! a single lookup.

use super::text::{fit_to_width, measure_width, spread, truncate_to_width};
use crate::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// One row in a [`SelectionList`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectableItem {
    /// Stable identity, unique within a list
    pub id: String,
    pub label: String,
    pub subtitle: Option<String>,
    pub icon: Option<String>,
    pub badge: Option<String>,
    pub is_separator: bool,
}

impl SelectableItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            subtitle: None,
            icon: None,
            badge: None,
            is_separator: false,
        }
    }

    /// Non-selectable group heading
    pub fn separator(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            id: format!("--{}", label),
            label,
            subtitle: None,
            icon: None,
            badge: None,
            is_separator: true,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }
}

/// Result of feeding a key to a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    Handled,
    /// Enter pressed; the owner reads `selected_item()`
    Confirm,
    /// Escape with no filter to clear
    Dismiss,
    Unhandled,
}

#[derive(Debug, Clone)]
pub struct SelectionList {
    title: String,
    items: Vec<SelectableItem>,
    query: String,
    /// Full-list indices of matches, `None` when unfiltered
    filter: Option<Vec<usize>>,
    /// Index into the effective list, `None` when nothing is selectable
    selected: Option<usize>,
    /// Full-list selection at the moment filtering started
    anchor: Option<usize>,
    scroll: usize,
    open: bool,
    capacity: usize,
}

impl SelectionList {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
            query: String::new(),
            filter: None,
            selected: None,
            anchor: None,
            scroll: 0,
            open: false,
            capacity: 8,
        }
    }

    pub fn with_items(mut self, items: Vec<SelectableItem>) -> Self {
        self.set_items(items);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Replace the backing list wholesale. Clears the filter and clamps the
    /// selection onto the nearest selectable row.
    pub fn set_items(&mut self, items: Vec<SelectableItem>) {
        let previous = self.full_index();
        self.items = items;
        self.query.clear();
        self.filter = None;
        self.anchor = None;
        self.selected = previous
            .map(|i| i.min(self.items.len().saturating_sub(1)))
            .and_then(|i| self.nearest_selectable(i))
            .or_else(|| self.nearest_selectable(0));
        self.ensure_visible();
    }

    pub fn items(&self) -> &[SelectableItem] {
        &self.items
    }

    // ─────────────────────────────────────────────────────────────
    // Open / close
    // ─────────────────────────────────────────────────────────────

    pub fn open(&mut self) {
        self.clear_filter();
        self.open = true;
        if self.selected.is_none() {
            self.selected = self.nearest_selectable(0);
        }
        self.ensure_visible();
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    // ─────────────────────────────────────────────────────────────
    // Effective list
    // ─────────────────────────────────────────────────────────────

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_filtered(&self) -> bool {
        self.filter.is_some()
    }

    pub fn effective_len(&self) -> usize {
        match &self.filter {
            Some(indices) => indices.len(),
            None => self.items.len(),
        }
    }

    /// Map an effective index to its full-list index
    fn to_full(&self, effective: usize) -> Option<usize> {
        match &self.filter {
            Some(indices) => indices.get(effective).copied(),
            None => (effective < self.items.len()).then_some(effective),
        }
    }

    fn effective_item(&self, effective: usize) -> Option<&SelectableItem> {
        self.to_full(effective).and_then(|i| self.items.get(i))
    }

    /// Items in the effective list, in display order
    pub fn effective_items(&self) -> Vec<&SelectableItem> {
        (0..self.effective_len())
            .filter_map(|i| self.effective_item(i))
            .collect()
    }

    fn is_separator_at(&self, effective: usize) -> bool {
        self.effective_item(effective)
            .map(|item| item.is_separator)
            .unwrap_or(true)
    }

    /// First selectable effective index at or after `from`, else before it
    fn nearest_selectable(&self, from: usize) -> Option<usize> {
        let len = self.effective_len();
        (from..len)
            .find(|&i| !self.is_separator_at(i))
            .or_else(|| (0..from.min(len)).rev().find(|&i| !self.is_separator_at(i)))
    }

    // ─────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────

    /// Selected index into the effective list
    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    fn full_index(&self) -> Option<usize> {
        self.selected.and_then(|s| self.to_full(s))
    }

    pub fn selected_item(&self) -> Option<&SelectableItem> {
        self.full_index()
            .and_then(|i| self.items.get(i))
            .filter(|item| !item.is_separator)
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_item().map(|item| item.id.as_str())
    }

    /// Step `delta` selectable rows through the effective list.
    ///
    /// Separators are skipped in the direction of travel; movement stops at
    /// either end.
    pub fn move_selection(&mut self, delta: isize) {
        let Some(current) = self.selected else {
            self.selected = self.nearest_selectable(0);
            self.ensure_visible();
            return;
        };
        let len = self.effective_len() as isize;
        let dir = delta.signum();
        let mut target = current as isize;

        for _ in 0..delta.unsigned_abs() {
            let mut next = target + dir;
            while next >= 0 && next < len && self.is_separator_at(next as usize) {
                next += dir;
            }
            if next < 0 || next >= len {
                break;
            }
            target = next;
        }

        self.selected = Some(target as usize);
        self.ensure_visible();
    }

    pub fn select_first(&mut self) {
        self.selected = self.nearest_selectable(0);
        self.ensure_visible();
    }

    pub fn select_last(&mut self) {
        self.selected = self.nearest_selectable(self.effective_len().saturating_sub(1));
        self.ensure_visible();
    }

    /// Select by stable id. The filter is cleared first, since ids resolve
    /// against the full list.
    pub fn select_by_id(&mut self, id: &str) -> bool {
        self.clear_filter();
        match self
            .items
            .iter()
            .position(|item| item.id == id && !item.is_separator)
        {
            Some(index) => {
                self.selected = Some(index);
                self.ensure_visible();
                true
            }
            None => false,
        }
    }

    /// Select a row of the full list by position
    pub fn select_by_index(&mut self, index: usize) -> bool {
        self.clear_filter();
        match self.items.get(index) {
            Some(item) if !item.is_separator => {
                self.selected = Some(index);
                self.ensure_visible();
                true
            }
            _ => false,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Filtering
    // ─────────────────────────────────────────────────────────────

    pub fn append_filter_char(&mut self, c: char) {
        if self.filter.is_none() {
            self.anchor = self.full_index();
        }
        self.query.push(c);
        self.refilter();
    }

    pub fn backspace_filter(&mut self) {
        if self.filter.is_none() {
            return;
        }
        self.query.pop();
        if self.query.is_empty() {
            self.clear_filter();
        } else {
            self.refilter();
        }
    }

    /// Drop the filter, keeping the selected item selected in the full list
    pub fn clear_filter(&mut self) {
        let Some(indices) = self.filter.take() else {
            self.query.clear();
            return;
        };
        self.query.clear();
        self.selected = self
            .selected
            .and_then(|s| indices.get(s).copied())
            .or(self.anchor)
            .filter(|&i| i < self.items.len())
            .or_else(|| self.nearest_selectable(0));
        self.anchor = None;
        self.ensure_visible();
    }

    fn refilter(&mut self) {
        let needle = self.query.to_lowercase();
        let indices: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_separator && item.label.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        self.selected = if indices.is_empty() { None } else { Some(0) };
        self.filter = Some(indices);
        self.scroll = 0;
    }

    // ─────────────────────────────────────────────────────────────
    // Viewport
    // ─────────────────────────────────────────────────────────────

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        self.ensure_visible();
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    fn ensure_visible(&mut self) {
        let max_scroll = self.effective_len().saturating_sub(self.capacity);
        if let Some(selected) = self.selected {
            if selected < self.scroll {
                self.scroll = selected;
            } else if selected >= self.scroll + self.capacity {
                self.scroll = selected + 1 - self.capacity;
            }
        }
        self.scroll = self.scroll.min(max_scroll);
    }

    // ─────────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────────

    pub fn handle_key(&mut self, key: KeyEvent) -> ListOutcome {
        if key.kind == KeyEventKind::Release {
            return ListOutcome::Unhandled;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let page = self.capacity.max(1) as isize;

        match key.code {
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Char('p') if ctrl => self.move_selection(-1),
            KeyCode::Char('n') if ctrl => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-page),
            KeyCode::PageDown => self.move_selection(page),
            KeyCode::Home => self.select_first(),
            KeyCode::End => self.select_last(),
            KeyCode::Enter => return ListOutcome::Confirm,
            KeyCode::Esc => {
                if self.is_filtered() {
                    self.clear_filter();
                } else {
                    return ListOutcome::Dismiss;
                }
            }
            KeyCode::Backspace => self.backspace_filter(),
            KeyCode::Char(c) if !ctrl => self.append_filter_char(c),
            _ => return ListOutcome::Unhandled,
        }
        ListOutcome::Handled
    }

    // ─────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────

    /// Rows this list renders to: filter line plus the item window
    pub fn rendered_height(&self) -> usize {
        1 + self.effective_len().clamp(1, self.capacity)
    }

    /// Render the filter line and the visible window, each row `width` wide
    pub fn render(&self, theme: &Theme, width: usize) -> String {
        let mut out = Vec::with_capacity(self.capacity + 1);

        let prompt = if self.query.is_empty() {
            theme.muted("type to filter")
        } else {
            format!("{} {}", theme.paint("/", theme.accent), self.query)
        };
        let count = theme.muted(&format!("{}/{}", self.effective_len(), self.items.len()));
        out.push(spread(&prompt, &count, width));

        if self.effective_len() == 0 {
            out.push(fit_to_width(&theme.muted("  no matches"), width));
            return out.join("\n");
        }

        let end = (self.scroll + self.capacity).min(self.effective_len());
        for effective in self.scroll..end {
            let Some(item) = self.effective_item(effective) else {
                continue;
            };
            out.push(self.render_row(item, self.selected == Some(effective), theme, width));
        }
        out.join("\n")
    }

    fn render_row(&self, item: &SelectableItem, selected: bool, theme: &Theme, width: usize) -> String {
        if item.is_separator {
            let label = format!("── {} ", item.label);
            let fill = width.saturating_sub(measure_width(&label));
            return fit_to_width(&theme.muted(&format!("{}{}", label, "─".repeat(fill))), width);
        }

        let marker = if selected { "› " } else { "  " };
        let icon = item.icon.as_deref().map(|i| format!("{} ", i)).unwrap_or_default();
        let badge = item.badge.as_deref().unwrap_or("");
        let body_width = width.saturating_sub(measure_width(badge) + 1);

        if selected {
            let mut plain = format!("{}{}{}", marker, icon, item.label);
            if let Some(subtitle) = &item.subtitle {
                plain.push_str("  ");
                plain.push_str(subtitle);
            }
            let body = fit_to_width(&truncate_to_width(&plain, body_width), body_width);
            let row = fit_to_width(&format!("{} {}", body, badge), width);
            return theme.selected(&row);
        }

        let mut body = format!("{}{}{}", marker, icon, item.label);
        if let Some(subtitle) = &item.subtitle {
            body.push_str("  ");
            body.push_str(&theme.muted(subtitle));
        }
        spread(&body, &theme.muted(badge), width)
    }
}
