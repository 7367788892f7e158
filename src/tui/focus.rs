//! Focus routing
//!
//! Exactly one target receives keyboard input at a time. Open gestures are
//! only honoured from the main output view; closing returns to the main view
//! unless the target was opened with [`Focus::open_remembering`], in which
//! case the remembered target comes back. One remembered level is enough:
//! only help reopens "wherever the user was".

use crate::backend::SessionId;

/// Which step of the new-task flow is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStep {
    PickWorktree,
    WritePrompt,
}

/// What a single-key confirmation is asking about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    StopSession(SessionId),
    Quit { active: usize },
}

/// The widget currently receiving input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FocusTarget {
    #[default]
    MainOutput,
    /// Follow-up prompt editor for a session
    TextInput(SessionId),
    WorktreePicker,
    TaskFlow(TaskStep),
    Help,
    Confirm(ConfirmAction),
    SessionBrowser,
    Settings,
}

impl FocusTarget {
    /// Short name for the footer
    pub fn label(&self) -> &'static str {
        match self {
            Self::MainOutput => "output",
            Self::TextInput(_) => "follow-up",
            Self::WorktreePicker => "worktrees",
            Self::TaskFlow(_) => "new task",
            Self::Help => "help",
            Self::Confirm(_) => "confirm",
            Self::SessionBrowser => "sessions",
            Self::Settings => "settings",
        }
    }
}

/// Current focus plus one remembered target to restore on close
#[derive(Debug, Clone, Default)]
pub struct Focus {
    current: FocusTarget,
    remembered: Option<FocusTarget>,
}

impl Focus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &FocusTarget {
        &self.current
    }

    pub fn is_main(&self) -> bool {
        self.current == FocusTarget::MainOutput
    }

    /// The target that will come back when the current one closes
    pub fn remembered(&self) -> Option<&FocusTarget> {
        self.remembered.as_ref()
    }

    /// Open `target` from the main view. Returns false (and changes nothing)
    /// when something else already has focus.
    pub fn open(&mut self, target: FocusTarget) -> bool {
        if !self.is_main() {
            return false;
        }
        tracing::debug!(to = target.label(), "focus open");
        self.current = target;
        true
    }

    /// Open `target` from anywhere, remembering the current target
    pub fn open_remembering(&mut self, target: FocusTarget) {
        if self.current == target {
            return;
        }
        let previous = std::mem::replace(&mut self.current, target);
        self.remembered = Some(previous);
    }

    /// Move within a flow (e.g. task step one to step two)
    pub fn replace(&mut self, target: FocusTarget) {
        self.current = target;
    }

    /// Close the current target
    pub fn close(&mut self) {
        self.current = self.remembered.take().unwrap_or_default();
        tracing::debug!(to = self.current.label(), "focus close");
    }

    /// Drop everything and return to the main view
    pub fn reset(&mut self) {
        self.current = FocusTarget::MainOutput;
        self.remembered = None;
    }
}
