//! Agentdeck Dark - the default theme, tuned for long output panes

pub const THEME: &str = r##"# Agentdeck Dark theme
# Default theme: muted chrome so agent output stays the focus

[meta]
name = "Agentdeck Dark"
version = 1
author = "agentdeck"

[ui]
foreground = "#dcdfe4"
border = "#5c6370"
accent = "#61afef"
dim = "#7f848e"
error = "#e06c75"
warning = "#e5c07b"
selection_bg = "#3e4451"
selection_fg = "#dcdfe4"

[status]
running = "#98c379"
idle = "#7f848e"
pending = "#e5c07b"
done = "#56b6c2"
"##;
