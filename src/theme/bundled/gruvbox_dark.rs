//! Gruvbox Dark - Retro groove color scheme

pub const THEME: &str = r##"# Gruvbox Dark theme for agentdeck
# Retro groove color scheme

[meta]
name = "Gruvbox Dark"
version = 1
author = "iTerm2-Color-Schemes"

[ui]
foreground = "#ebdbb2"
border = "#665c54"
accent = "#689d6a"
dim = "#928374"
error = "#fb4934"
warning = "#fabd2f"
selection_bg = "#665c54"
selection_fg = "#ebdbb2"

[status]
running = "#b8bb26"
idle = "#928374"
pending = "#fabd2f"
done = "#83a598"
"##;
