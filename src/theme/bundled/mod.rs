//! Bundled TOML themes (compiled into binary)
//!
//! Users can drop a modified copy into ~/.config/agentdeck/themes/ to
//! override any of them by name.
//!
//! Each theme lives in its own module file for easy editing.

mod agentdeck_dark;
mod gruvbox_dark;
mod nord;
mod terminal_ansi;
mod tokyo_night;

/// Bundled theme: file name and TOML content
pub struct BundledTheme {
    pub filename: &'static str,
    pub content: &'static str,
}

/// All bundled themes, default first
pub const BUNDLED_THEMES: &[BundledTheme] = &[
    BundledTheme {
        filename: "Agentdeck_Dark.toml",
        content: agentdeck_dark::THEME,
    },
    BundledTheme {
        filename: "Nord.toml",
        content: nord::THEME,
    },
    BundledTheme {
        filename: "Gruvbox_Dark.toml",
        content: gruvbox_dark::THEME,
    },
    BundledTheme {
        filename: "Tokyo_Night.toml",
        content: tokyo_night::THEME,
    },
    BundledTheme {
        filename: "Terminal_ANSI.toml",
        content: terminal_ansi::THEME,
    },
];
