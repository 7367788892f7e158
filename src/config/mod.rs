//! Configuration for the agentdeck console
//!
//! Configuration is loaded in order of precedence:
//! 1. Environment variables (highest priority)
//! 2. Config file (~/.config/agentdeck/config.toml)
//! 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Submodules
// ─────────────────────────────────────────────────────────────────────────────

mod interface;
mod observability;
mod serialization;

#[cfg(test)]
mod tests;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (maintain public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use interface::{
    EditorConfig, FileEditorConfig, FileRefreshConfig, FileToastConfig, RefreshConfig, ToastConfig,
};
pub use observability::{FileLogging, LogRotation, LoggingConfig};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Theme used when neither the environment nor the file names one
pub const DEFAULT_THEME: &str = "Agentdeck Dark";

pub const ENV_THEME: &str = "AGENTDECK_THEME";
pub const ENV_DEMO: &str = "AGENTDECK_DEMO";
pub const ENV_LOG: &str = "AGENTDECK_LOG";

// ─────────────────────────────────────────────────────────────────────────────
// Application Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Theme name: bundled ("Agentdeck Dark", "Nord", ...) or a file in the themes dir
    pub theme: String,

    /// Run against the in-process demo backend
    pub demo_mode: bool,

    /// Status refresh cadences
    pub refresh: RefreshConfig,

    /// Toast stack size and lifetime
    pub toasts: ToastConfig,

    /// Prompt editor height bounds
    pub editor: EditorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: DEFAULT_THEME.to_string(),
            demo_mode: false,
            refresh: RefreshConfig::default(),
            toasts: ToastConfig::default(),
            editor: EditorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File Configuration (deserialization layer)
// ─────────────────────────────────────────────────────────────────────────────

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
pub(crate) struct FileConfig {
    pub theme: Option<String>,

    /// Optional [refresh] section
    pub refresh: Option<FileRefreshConfig>,

    /// Optional [toasts] section
    pub toasts: Option<FileToastConfig>,

    /// Optional [editor] section
    pub editor: Option<FileEditorConfig>,

    /// Optional [logging] section
    pub logging: Option<FileLogging>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Loading
// ─────────────────────────────────────────────────────────────────────────────

impl Config {
    /// Get the config file path: ~/.config/agentdeck/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("agentdeck").join("config.toml"))
    }

    /// Create config file with defaults if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        if path.exists() {
            return;
        }

        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // config is optional
            }
        }

        let _ = std::fs::write(&path, Self::default().to_toml());
    }

    /// Parse config file contents
    pub(crate) fn parse_file_config(contents: &str) -> Result<FileConfig, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Load file config if it exists
    ///
    /// A file that cannot be read or parsed is reported on stderr and the
    /// defaults are used instead. Logging is not up yet at this point.
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::parse_file_config(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: ignoring invalid config file {}", path.display());
                    eprintln!("  {}", e.to_string().trim_end());
                    eprintln!("  Using built-in defaults. Run `agentdeck config --show` to compare.");
                    FileConfig::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FileConfig::default(),
            Err(e) => {
                eprintln!("Warning: cannot read config file {}: {}", path.display(), e);
                FileConfig::default()
            }
        }
    }

    /// Load configuration: env vars > file > defaults
    pub fn from_env() -> Self {
        Self::from_sources(Self::load_file_config(), |key| std::env::var(key).ok())
    }

    /// Merge a parsed file with an environment lookup
    pub(crate) fn from_sources(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        // Theme: env > file > default
        let theme = env(ENV_THEME)
            .filter(|v| !v.trim().is_empty())
            .or(file.theme)
            .unwrap_or_else(|| DEFAULT_THEME.to_string());

        // Demo mode: env only (runtime flag, also set by --demo)
        let demo_mode = env(ENV_DEMO)
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let refresh = RefreshConfig::from_file(file.refresh);
        let toasts = ToastConfig::from_file(file.toasts);
        let editor = EditorConfig::from_file(file.editor);

        // Log level: env > file > default (RUST_LOG still wins at filter time)
        let mut logging = LoggingConfig::from_file(file.logging);
        if let Some(level) = env(ENV_LOG).filter(|v| !v.trim().is_empty()) {
            logging.level = level;
        }

        Self {
            theme,
            demo_mode,
            refresh,
            toasts,
            editor,
            logging,
        }
    }
}
