//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Render the effective configuration as a commented config file
    pub fn to_toml(&self) -> String {
        format!(
            r#"# agentdeck configuration

# Theme: Agentdeck Dark, Nord, Gruvbox Dark, Tokyo Night, Terminal ANSI,
# or the name of a file in ~/.config/agentdeck/themes/
# Switch at runtime from the settings view (press 's')
theme = "{theme}"

# Status refresh cadences, in milliseconds
[refresh]
local_status_ms = {local_ms}    # worktrees and sessions
remote_status_ms = {remote_ms}  # pull requests and checks

# Notifications in the bottom-right corner
[toasts]
max = {toast_max}
ttl_ms = {toast_ttl}

# Prompt editor height, in rows
[editor]
min_height = {editor_min}
max_height = {editor_max}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
# JSON file logging (in addition to the in-memory buffer)
file_enabled = {log_file_enabled}
file_dir = "{log_file_dir}"
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = "{log_file_prefix}"
"#,
            theme = escape(&self.theme),
            local_ms = self.refresh.local_status_ms,
            remote_ms = self.refresh.remote_status_ms,
            toast_max = self.toasts.max,
            toast_ttl = self.toasts.ttl_ms,
            editor_min = self.editor.min_height,
            editor_max = self.editor.max_height,
            log_level = escape(&self.logging.level),
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = escape(&self.logging.file_dir.display().to_string()),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = escape(&self.logging.file_prefix),
        )
    }
}

/// Escape a value for a basic TOML string
fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
