//! Terminal ANSI - Uses your terminal's native ANSI colors
//! Perfect for users who have carefully crafted their terminal theme

pub const THEME: &str = r##"# Terminal ANSI theme for agentdeck
# Uses your terminal's native ANSI colors - adapts to your terminal theme!
#
# This theme uses "ansi:X" syntax instead of hex colors:
# - ansi:0-7 = standard colors (black, red, green, yellow, blue, magenta, cyan, white)
# - ansi:8-15 = bright variants
# - ansi:fg = terminal's default foreground

[meta]
name = "Terminal ANSI"
version = 1
author = "agentdeck"

[ui]
foreground = "ansi:fg"
border = "ansi:8"
accent = "ansi:6"
dim = "ansi:8"
error = "ansi:1"
warning = "ansi:3"
selection_bg = "ansi:8"
selection_fg = "ansi:fg"

[status]
running = "ansi:2"
idle = "ansi:8"
pending = "ansi:3"
done = "ansi:4"
"##;
