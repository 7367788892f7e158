//! Tokyo Night - A clean dark theme inspired by Tokyo's night lights

pub const THEME: &str = r##"# Tokyo Night theme for agentdeck

[meta]
name = "Tokyo Night"
version = 1
author = "iTerm2-Color-Schemes"

[ui]
foreground = "#c0caf5"
border = "#414868"
accent = "#7aa2f7"
dim = "#565f89"
error = "#f7768e"
warning = "#e0af68"
selection_bg = "#33467c"
selection_fg = "#c0caf5"

[status]
running = "#9ece6a"
idle = "#565f89"
pending = "#e0af68"
done = "#7dcfff"
"##;
