/// Responsive layout for the main frame.
///
/// Single source of truth for width thresholds and region sizes - no magic
/// numbers scattered in render code.

/// Smallest frame that gets the full layout
pub const MIN_WIDTH: usize = 20;
pub const MIN_HEIGHT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    /// < 60 cols: output only, worktree list hidden
    Compact,
    /// 60-99 cols: narrow sidebar
    Normal,
    /// 100-139 cols: full sidebar
    Wide,
    /// 140+ cols: ultrawide monitor
    UltraWide,
}

impl Breakpoint {
    pub fn from_width(width: usize) -> Self {
        match width {
            0..=59 => Breakpoint::Compact,
            60..=99 => Breakpoint::Normal,
            100..=139 => Breakpoint::Wide,
            _ => Breakpoint::UltraWide,
        }
    }

    /// Check if at least this breakpoint (inclusive)
    pub fn at_least(&self, min: Breakpoint) -> bool {
        self.ordinal() >= min.ordinal()
    }

    fn ordinal(&self) -> u8 {
        match self {
            Breakpoint::Compact => 0,
            Breakpoint::Normal => 1,
            Breakpoint::Wide => 2,
            Breakpoint::UltraWide => 3,
        }
    }

    fn sidebar_width(&self) -> usize {
        match self {
            Breakpoint::Compact => 0,
            Breakpoint::Normal => 24,
            Breakpoint::Wide => 30,
            Breakpoint::UltraWide => 36,
        }
    }
}

/// True when the terminal is too small for anything but a notice
pub fn is_degenerate(width: usize, height: usize) -> bool {
    width < MIN_WIDTH || height < MIN_HEIGHT
}

/// Region sizes of the main frame: header row, sidebar | output, footer row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    pub width: usize,
    pub height: usize,
    pub breakpoint: Breakpoint,
    /// Rows between header and footer
    pub body_height: usize,
    /// Worktree list width (0 when hidden)
    pub sidebar_width: usize,
    /// Output pane width, after the 1-column divider
    pub output_width: usize,
}

impl FrameLayout {
    pub fn new(width: usize, height: usize) -> Self {
        let breakpoint = Breakpoint::from_width(width);
        let sidebar_width = breakpoint.sidebar_width();
        let divider = usize::from(sidebar_width > 0);
        Self {
            width,
            height,
            breakpoint,
            body_height: height.saturating_sub(2),
            sidebar_width,
            output_width: width.saturating_sub(sidebar_width + divider),
        }
    }

    pub fn has_sidebar(&self) -> bool {
        self.sidebar_width > 0
    }

    /// Width for centred modals
    pub fn modal_width(&self) -> usize {
        let preferred = if self.breakpoint.at_least(Breakpoint::Wide) { 72 } else { 56 };
        preferred.min(self.width.saturating_sub(4)).max(MIN_WIDTH - 4)
    }

    /// Height budget for modal content (box borders excluded)
    pub fn modal_height(&self) -> usize {
        self.height.saturating_sub(6).max(1)
    }
}
