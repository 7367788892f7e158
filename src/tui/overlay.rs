//! Frame composition
//!
//! Places rendered sub-frames (modals, toasts, dropdowns) on top of a base
//! frame. Overlays never grow the base: rows that fall below the last base row
//! are dropped.

use super::text::{fit_to_width, measure_width, skip_to_width, splice_at, truncate_to_width};
use crate::theme::Theme;
use crossterm::style::Color;

/// Replace each base row from column `x` onward with the matching overlay row
pub fn overlay_at(base: &str, overlay: &str, x: usize, y: usize) -> String {
    let mut rows: Vec<String> = base.split('\n').map(str::to_string).collect();
    for (i, line) in overlay.split('\n').enumerate() {
        if let Some(row) = rows.get_mut(y + i) {
            *row = splice_at(row, line, x);
        }
    }
    rows.join("\n")
}

/// Like [`overlay_at`], but the base content right of the overlay survives.
///
/// Each overlay row is padded to the overlay's width so the splice covers a
/// rectangle.
pub fn float_at(base: &str, overlay: &str, x: usize, y: usize) -> String {
    let width = measure_width(overlay);
    let mut rows: Vec<String> = base.split('\n').map(str::to_string).collect();
    for (i, line) in overlay.split('\n').enumerate() {
        if let Some(row) = rows.get_mut(y + i) {
            let tail = skip_to_width(row, x + width);
            let mut spliced = splice_at(row, &fit_to_width(line, width), x);
            spliced.push_str(&tail);
            *row = spliced;
        }
    }
    rows.join("\n")
}

/// Top-left position that centres a `w`x`h` block inside `outer_w`x`outer_h`
pub fn centered(outer_w: usize, outer_h: usize, w: usize, h: usize) -> (usize, usize) {
    (outer_w.saturating_sub(w) / 2, outer_h.saturating_sub(h) / 2)
}

/// Float `overlay` centred on `base`
pub fn float_centered(base: &str, overlay: &str, width: usize, height: usize) -> String {
    let overlay_h = overlay.split('\n').count();
    let (x, y) = centered(width, height, measure_width(overlay), overlay_h);
    float_at(base, overlay, x, y)
}

/// Draw a rounded border around `content`, with an optional title in the top
/// edge. `inner_width` is the content width; the box is two columns wider.
pub fn boxed(content: &str, title: &str, inner_width: usize, border: Color, theme: &Theme) -> String {
    let edge = |s: &str| theme.paint(s, border);

    let title = if title.is_empty() {
        String::new()
    } else {
        truncate_to_width(&format!(" {} ", title), inner_width)
    };
    let fill = inner_width.saturating_sub(measure_width(&title));

    let mut out = Vec::new();
    out.push(format!(
        "{}{}{}{}",
        edge("╭"),
        theme.strong(&title, theme.accent),
        edge(&"─".repeat(fill)),
        edge("╮")
    ));
    for line in content.split('\n') {
        out.push(format!("{}{}{}", edge("│"), fit_to_width(line, inner_width), edge("│")));
    }
    out.push(format!("{}{}{}", edge("╰"), edge(&"─".repeat(inner_width)), edge("╯")));
    out.join("\n")
}
