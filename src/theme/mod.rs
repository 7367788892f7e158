// Theme system for the TUI
//
// A theme is pure data: a name plus one colour per semantic role. The
// controller holds the active theme by value and every render pass reads it,
// so swapping themes at runtime takes effect on the next frame.
//
// Theme loading priority:
// 1. External TOML themes from ~/.config/agentdeck/themes/*.toml
// 2. Bundled themes (compiled into the binary)
// 3. Fallback to hardcoded default

mod bundled;
mod toml_format;

pub use toml_format::TomlTheme;

use crossterm::style::{Color, Stylize};
use std::path::PathBuf;

/// Complete resolved theme ready for use in the TUI.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,

    // ─── UI Chrome ───────────────────────────────────────────
    pub foreground: Color,
    pub border: Color,
    pub accent: Color,
    pub dim: Color,
    pub error: Color,
    pub warning: Color,

    // ─── Selection ───────────────────────────────────────────
    pub selection: Color,
    pub selection_fg: Color,

    // ─── Session Status ──────────────────────────────────────
    pub running: Color,
    pub idle: Color,
    pub pending: Color,
    pub done: Color,
}

impl Theme {
    /// Load theme by name (external file, then bundled, then fallback)
    pub fn by_name(name: &str) -> Self {
        if let Some(theme) = Self::load_external(name) {
            return theme;
        }
        if let Some(theme) = Self::load_bundled(name) {
            return theme;
        }
        tracing::debug!("Theme '{}' not found, using fallback", name);
        Self::hardcoded_default()
    }

    /// Names of all bundled themes, in display order
    pub fn bundled_names() -> Vec<String> {
        bundled::BUNDLED_THEMES
            .iter()
            .filter_map(|t| TomlTheme::from_str(t.content).ok())
            .map(|t| t.meta.name)
            .collect()
    }

    fn load_external(name: &str) -> Option<Self> {
        let dir = Self::themes_dir()?;
        for candidate in [name.to_string(), name.replace(' ', "_")] {
            let path = dir.join(format!("{}.toml", candidate));
            if !path.exists() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(contents) => match TomlTheme::from_str(&contents) {
                    Ok(toml_theme) => return Some(Self::from_toml(toml_theme)),
                    Err(e) => tracing::warn!("Failed to parse {}: {}", path.display(), e),
                },
                Err(e) => tracing::warn!("Failed to read {}: {}", path.display(), e),
            }
        }
        None
    }

    fn load_bundled(name: &str) -> Option<Self> {
        let filename = format!("{}.toml", name.replace(' ', "_"));
        bundled::BUNDLED_THEMES
            .iter()
            .find(|t| t.filename.eq_ignore_ascii_case(&filename))
            .and_then(|t| TomlTheme::from_str(t.content).ok())
            .map(Self::from_toml)
    }

    /// Get themes directory path
    fn themes_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".config").join("agentdeck").join("themes"))
    }

    /// Create theme from native TOML format
    fn from_toml(toml: TomlTheme) -> Self {
        let parse = TomlTheme::parse_color;
        let pending = parse(&toml.status.pending);

        Self {
            name: toml.meta.name.clone(),
            foreground: parse(&toml.ui.foreground),
            border: parse(&toml.ui.border),
            accent: parse(&toml.ui.accent),
            dim: parse(&toml.ui.dim),
            error: parse(&toml.ui.error),
            warning: toml.ui.warning.as_deref().map(parse).unwrap_or(pending),
            selection: parse(&toml.ui.selection_bg),
            selection_fg: parse(&toml.ui.selection_fg),
            running: parse(&toml.status.running),
            idle: parse(&toml.status.idle),
            pending,
            done: parse(&toml.status.done),
        }
    }

    /// Hardcoded fallback when no themes can be loaded
    pub fn hardcoded_default() -> Self {
        Self {
            name: "Agentdeck Dark (Fallback)".to_string(),
            foreground: Color::Rgb { r: 220, g: 223, b: 228 },
            border: Color::Rgb { r: 92, g: 99, b: 112 },
            accent: Color::Rgb { r: 97, g: 175, b: 239 },
            dim: Color::Rgb { r: 127, g: 132, b: 142 },
            error: Color::Rgb { r: 224, g: 108, b: 117 },
            warning: Color::Rgb { r: 229, g: 192, b: 123 },
            selection: Color::Rgb { r: 62, g: 68, b: 81 },
            selection_fg: Color::Rgb { r: 220, g: 223, b: 228 },
            running: Color::Rgb { r: 152, g: 195, b: 121 },
            idle: Color::Rgb { r: 127, g: 132, b: 142 },
            pending: Color::Rgb { r: 229, g: 192, b: 123 },
            done: Color::Rgb { r: 86, g: 182, b: 194 },
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Painting helpers - every styled string in the UI goes through these
    // ─────────────────────────────────────────────────────────────

    /// Foreground-color `text`
    pub fn paint(&self, text: &str, color: Color) -> String {
        if text.is_empty() {
            return String::new();
        }
        text.with(color).to_string()
    }

    /// Bold foreground-colored `text`
    pub fn strong(&self, text: &str, color: Color) -> String {
        if text.is_empty() {
            return String::new();
        }
        text.with(color).bold().to_string()
    }

    /// Selection highlight (theme selection colors)
    pub fn selected(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        text.with(self.selection_fg).on(self.selection).to_string()
    }

    /// Reverse video, used for the editor cursor and focused buttons
    pub fn reverse(&self, text: &str) -> String {
        text.reverse().to_string()
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(text, self.dim)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::by_name("Agentdeck Dark")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::text::{measure_width, strip_ansi};

    #[test]
    fn test_bundled_themes_parse() {
        for bundled in bundled::BUNDLED_THEMES {
            assert!(
                TomlTheme::from_str(bundled.content).is_ok(),
                "{} should parse",
                bundled.filename
            );
        }
    }

    #[test]
    fn test_bundled_names_match_loader() {
        let names = Theme::bundled_names();
        assert!(names.len() >= 5);
        for name in names {
            let theme = Theme::load_bundled(&name).expect("bundled theme loads by name");
            assert_eq!(theme.name, name);
        }
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let theme = Theme::by_name("definitely-not-a-theme");
        assert!(theme.name.contains("Fallback"));
    }

    #[test]
    fn test_paint_is_width_neutral() {
        let theme = Theme::hardcoded_default();
        let painted = theme.paint("hello", theme.accent);
        assert_ne!(painted, "hello");
        assert_eq!(strip_ansi(&painted), "hello");
        assert_eq!(measure_width(&painted), 5);
        assert_eq!(theme.paint("", theme.accent), "");
    }
}
