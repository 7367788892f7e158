//! Nord - Arctic, bluish color palette

pub const THEME: &str = r##"# Nord theme for agentdeck
# Arctic, bluish color palette

[meta]
name = "Nord"
version = 1
author = "iTerm2-Color-Schemes"

[ui]
foreground = "#d8dee9"
border = "#4c566a"
accent = "#88c0d0"
dim = "#616e88"
error = "#bf616a"
warning = "#ebcb8b"
selection_bg = "#eceff4"
selection_fg = "#2e3440"

[status]
running = "#a3be8c"
idle = "#616e88"
pending = "#ebcb8b"
done = "#81a1c1"
"##;
