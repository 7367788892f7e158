// TOML theme format parser
//
// This is the native theme format for agentdeck. Each theme names a colour
// for every semantic role the UI paints - no automatic mapping from palette
// slots.
//
// Format version: 1

use crossterm::style::Color;
use serde::Deserialize;

/// Root structure for TOML theme files
#[derive(Debug, Clone, Deserialize)]
pub struct TomlTheme {
    pub meta: ThemeMeta,
    pub ui: UiColors,
    pub status: StatusColors,
}

/// Theme metadata
#[derive(Debug, Clone, Deserialize)]
pub struct ThemeMeta {
    pub name: String,
    #[allow(dead_code)] // For future schema evolution
    pub version: u32,
    #[serde(default)]
    #[allow(dead_code)] // Metadata for theme attribution
    pub author: Option<String>,
}

/// Base UI chrome colors
#[derive(Debug, Clone, Deserialize)]
pub struct UiColors {
    pub foreground: String,
    pub border: String,
    pub accent: String,
    pub dim: String,
    pub error: String,
    pub selection_bg: String,
    pub selection_fg: String,
    /// Optional warning color (falls back to the pending status color)
    pub warning: Option<String>,
}

/// Session lifecycle colors
#[derive(Debug, Clone, Deserialize)]
pub struct StatusColors {
    pub running: String,
    pub idle: String,
    pub pending: String,
    pub done: String,
}

impl TomlTheme {
    /// Parse a TOML theme from string
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Parse a color string to a crossterm Color
    /// Supports:
    /// - Hex format: #RRGGBB
    /// - ANSI format: ansi:0-15, ansi:fg (for terminal-native colors)
    pub fn parse_color(value: &str) -> Color {
        if let Some(ansi) = value.strip_prefix("ansi:") {
            return match ansi {
                "0" => Color::Black,
                "1" => Color::DarkRed,
                "2" => Color::DarkGreen,
                "3" => Color::DarkYellow,
                "4" => Color::DarkBlue,
                "5" => Color::DarkMagenta,
                "6" => Color::DarkCyan,
                "7" => Color::Grey,
                "8" => Color::DarkGrey,
                "9" => Color::Red,
                "10" => Color::Green,
                "11" => Color::Yellow,
                "12" => Color::Blue,
                "13" => Color::Magenta,
                "14" => Color::Cyan,
                "15" => Color::White,
                "fg" | "bg" => Color::Reset,
                _ => Color::White,
            };
        }

        let hex = value.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Color::White; // fallback
        }
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);
        Color::Rgb { r, g, b }
    }
}
