// Interaction controller
//
// Owns every piece of UI state. The host feeds it one `Event` at a time and
// executes the `Request`s it returns; results come back later as more events.
// Nothing in here blocks, spawns, or touches the terminal, so the whole
// interaction model is testable by feeding events and inspecting requests
// and rendered frames.
//
// Failure policy: user mistakes become toasts, failed background fetches are
// dropped (stale data keeps rendering until the next tick), and nothing here
// ends the process except an explicit quit.

use super::dropdown::{ListOutcome, SelectionList};
use super::editor::{EditorOutcome, TextEditor};
use super::focus::{ConfirmAction, Focus, FocusTarget, TaskStep};
use super::layout::{is_degenerate, FrameLayout};
use super::markdown::MarkdownRenderer;
use super::output::{OutputLog, RenderContext};
use super::overlay::{boxed, float_at, float_centered};
use super::scheduler::{RefreshScheduler, Schedule, TimerKind};
use super::scroll::{ScrollMemory, ScrollWindow};
use super::scrollback;
use super::text::{join_horizontal, measure_width, pad_or_truncate};
use super::toast::{Severity, ToastQueue};
use super::views;
use crate::backend::{
    RemoteStatus, SessionEvent, SessionId, SessionStatus, Snapshot, WorktreeId,
};
use crate::theme::Theme;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Tunables taken from the config file
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub local_refresh: Duration,
    pub remote_refresh: Duration,
    pub toast_max: usize,
    pub toast_ttl: Duration,
    pub editor_min_height: usize,
    pub editor_max_height: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            local_refresh: Duration::from_millis(2000),
            remote_refresh: Duration::from_millis(30_000),
            toast_max: 3,
            toast_ttl: Duration::from_millis(3000),
            editor_min_height: 3,
            editor_max_height: 10,
        }
    }
}

/// A user command sent to the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(WorktreeId),
    Stop(SessionId),
    FollowUp(SessionId),
}

/// Everything the controller reacts to
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Paste(String),
    Resize { width: usize, height: usize },
    Timer { kind: TimerKind, generation: u64 },
    Snapshot(Snapshot),
    SnapshotFailed(String),
    /// Finished fan-out of remote status fetches (failed worktrees omitted)
    RemoteStatus(HashMap<WorktreeId, RemoteStatus>),
    History { worktree: WorktreeId, lines: Vec<String> },
    HistoryFailed { worktree: WorktreeId, error: String },
    Backend(SessionEvent),
    /// The backend event stream ended
    BackendClosed,
    CommandDone(Command),
    CommandFailed { command: Command, error: String },
    Copied(usize),
    CopyFailed(String),
}

/// Work the host performs on the controller's behalf
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Deliver `Event::Timer` after the delay
    Schedule(Schedule),
    FetchSnapshot,
    FetchRemoteStatus(Vec<WorktreeId>),
    FetchHistory(WorktreeId),
    /// Wait for exactly one more backend event
    NextBackendEvent,
    StartSession { worktree: WorktreeId, prompt: String },
    StopSession(SessionId),
    FollowUp { session: SessionId, prompt: String },
    Copy(Vec<String>),
    Quit,
}

pub struct Controller {
    config: ControllerConfig,
    theme: Theme,
    markdown: Box<dyn MarkdownRenderer>,
    width: usize,
    height: usize,

    focus: Focus,
    snapshot: Snapshot,
    /// Keyed by worktree identity; entries for vanished worktrees are harmless
    remote: HashMap<WorktreeId, RemoteStatus>,
    remote_started: bool,

    /// The viewed source
    selected: Option<WorktreeId>,
    outputs: HashMap<WorktreeId, OutputLog>,
    history_requested: HashSet<WorktreeId>,
    scroll: ScrollWindow,
    scroll_memory: ScrollMemory<WorktreeId>,

    toasts: ToastQueue,
    refresh: RefreshScheduler,

    task_editor: TextEditor,
    follow_up_editor: TextEditor,
    task_worktree: Option<WorktreeId>,
    picker: SelectionList,
    browser: SelectionList,
    settings: SelectionList,
    help_scroll: usize,

    quitting: bool,
}

impl Controller {
    pub fn new(config: ControllerConfig, theme: Theme, markdown: Box<dyn MarkdownRenderer>) -> Self {
        let heights = (config.editor_min_height, config.editor_max_height);
        let mut controller = Self {
            toasts: ToastQueue::new(config.toast_max, config.toast_ttl),
            refresh: RefreshScheduler::new(config.local_refresh, config.remote_refresh),
            config,
            theme,
            markdown,
            width: 80,
            height: 24,
            focus: Focus::new(),
            snapshot: Snapshot::default(),
            remote: HashMap::new(),
            remote_started: false,
            selected: None,
            outputs: HashMap::new(),
            history_requested: HashSet::new(),
            scroll: ScrollWindow::new(),
            scroll_memory: ScrollMemory::new(),
            task_editor: TextEditor::new("Describe the task for the agent…")
                .with_heights(heights.0, heights.1)
                .with_labels("Start", "Back"),
            follow_up_editor: TextEditor::new("Ask a follow-up…")
                .with_heights(heights.0, heights.1)
                .with_labels("Send", "Cancel"),
            task_worktree: None,
            picker: SelectionList::new("Worktrees"),
            browser: SelectionList::new("Sessions"),
            settings: SelectionList::new("Theme"),
            help_scroll: 0,
            quitting: false,
        };
        controller.apply_size();
        controller
    }

    // ─────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────

    pub fn focus(&self) -> &FocusTarget {
        self.focus.current()
    }

    pub fn selected_worktree(&self) -> Option<&WorktreeId> {
        self.selected.as_ref()
    }

    pub fn scroll(&self) -> &ScrollWindow {
        &self.scroll
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn should_quit(&self) -> bool {
        self.quitting
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Rendered rows of a worktree's output, oldest first
    pub fn output_rows(&self, worktree: &WorktreeId) -> &[String] {
        self.outputs.get(worktree).map(OutputLog::rows).unwrap_or(&[])
    }

    // ─────────────────────────────────────────────────────────────
    // Event entry points
    // ─────────────────────────────────────────────────────────────

    /// Requests to issue once, before the first event
    pub fn start(&mut self) -> Vec<Request> {
        let mut out = Vec::new();
        if self.refresh.refresh_now(TimerKind::LocalStatus) {
            out.push(Request::FetchSnapshot);
        }
        out.push(Request::NextBackendEvent);
        out
    }

    pub fn handle_event(&mut self, event: Event) -> Vec<Request> {
        self.handle_event_at(event, Instant::now())
    }

    /// Apply one event against an explicit clock
    pub fn handle_event_at(&mut self, event: Event, now: Instant) -> Vec<Request> {
        match event {
            Event::Key(key) => self.on_key(key, now),
            Event::Paste(text) => {
                if let Some(editor) = self.active_editor() {
                    editor.insert_str(&text);
                }
                Vec::new()
            }
            Event::Resize { width, height } => {
                self.width = width;
                self.height = height;
                self.apply_size();
                Vec::new()
            }
            Event::Timer { kind, generation } => self.on_timer(kind, generation, now),
            Event::Snapshot(snapshot) => self.on_snapshot(snapshot, now),
            Event::SnapshotFailed(error) => {
                tracing::debug!("snapshot failed, keeping stale data: {}", error);
                self.refresh
                    .on_complete(TimerKind::LocalStatus, now)
                    .map(Request::Schedule)
                    .into_iter()
                    .collect()
            }
            Event::RemoteStatus(statuses) => {
                tracing::debug!(count = statuses.len(), "remote status refreshed");
                self.remote.extend(statuses);
                self.refresh
                    .on_complete(TimerKind::RemoteStatus, now)
                    .map(Request::Schedule)
                    .into_iter()
                    .collect()
            }
            Event::History { worktree, lines } => {
                self.on_history(worktree, lines);
                Vec::new()
            }
            Event::HistoryFailed { worktree, error } => {
                tracing::debug!(%worktree, "history fetch failed: {}", error);
                self.history_requested.remove(&worktree);
                Vec::new()
            }
            Event::Backend(event) => {
                let mut out = self.on_backend(event, now);
                out.push(Request::NextBackendEvent);
                out
            }
            Event::BackendClosed => {
                tracing::warn!("backend event stream closed");
                Vec::new()
            }
            Event::CommandDone(command) => self.on_command_done(command, now),
            Event::CommandFailed { command, error } => {
                tracing::warn!(?command, "command failed: {}", error);
                let what = match command {
                    Command::Start(_) => "start task",
                    Command::Stop(_) => "stop session",
                    Command::FollowUp(_) => "send follow-up",
                };
                self.toast(format!("Could not {}: {}", what, error), Severity::Error, now)
            }
            Event::Copied(rows) => self.toast(format!("Copied {} lines", rows), Severity::Success, now),
            Event::CopyFailed(error) => self.toast(format!("Copy failed: {}", error), Severity::Error, now),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Async results
    // ─────────────────────────────────────────────────────────────

    fn on_timer(&mut self, kind: TimerKind, generation: u64, now: Instant) -> Vec<Request> {
        match kind {
            TimerKind::Toasts => self
                .toasts
                .on_timer(generation, now)
                .map(Request::Schedule)
                .into_iter()
                .collect(),
            TimerKind::LocalStatus => {
                if self.refresh.on_timer(kind, generation) {
                    vec![Request::FetchSnapshot]
                } else {
                    Vec::new()
                }
            }
            TimerKind::RemoteStatus => {
                if self.refresh.on_timer(kind, generation) {
                    vec![Request::FetchRemoteStatus(self.worktree_ids())]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_snapshot(&mut self, snapshot: Snapshot, now: Instant) -> Vec<Request> {
        self.snapshot = snapshot;
        let mut out: Vec<Request> = self
            .refresh
            .on_complete(TimerKind::LocalStatus, now)
            .map(Request::Schedule)
            .into_iter()
            .collect();

        let present: HashSet<WorktreeId> = self.worktree_ids().into_iter().collect();
        self.scroll_memory.retain(|id| present.contains(id));
        self.outputs.retain(|id, _| present.contains(id));
        self.history_requested.retain(|id| present.contains(id));

        let still_there = self.selected.as_ref().is_some_and(|id| present.contains(id));
        if !still_there {
            self.selected = None;
            self.scroll = ScrollWindow::new();
            if let Some(first) = self.snapshot.worktrees.first().map(|w| w.id.clone()) {
                out.extend(self.switch_source(first));
            }
        }

        if !self.remote_started && !present.is_empty() {
            self.remote_started = true;
            if self.refresh.refresh_now(TimerKind::RemoteStatus) {
                out.push(Request::FetchRemoteStatus(self.worktree_ids()));
            }
        }
        out
    }

    fn on_history(&mut self, worktree: WorktreeId, lines: Vec<String>) {
        let ctx = RenderContext {
            markdown: self.markdown.as_ref(),
            theme: &self.theme,
            width: self.output_width(),
        };
        self.outputs
            .entry(worktree.clone())
            .or_default()
            .apply_history(lines, &ctx);
        if self.selected.as_ref() == Some(&worktree) {
            self.sync_scroll();
        }
    }

    fn on_backend(&mut self, event: SessionEvent, now: Instant) -> Vec<Request> {
        match event {
            SessionEvent::Started(session) => {
                tracing::info!(session = %session.id, worktree = %session.worktree, "session started");
                match self.snapshot.sessions.iter_mut().find(|s| s.id == session.id) {
                    Some(existing) => *existing = session,
                    None => self.snapshot.sessions.push(session),
                }
                Vec::new()
            }
            SessionEvent::StatusChanged { session, status } => {
                if let Some(existing) = self.snapshot.sessions.iter_mut().find(|s| s.id == session) {
                    existing.status = status;
                }
                Vec::new()
            }
            SessionEvent::Output { worktree, line, .. } => {
                self.append_output(worktree, line);
                Vec::new()
            }
            SessionEvent::Exited { session, code } => {
                let Some(existing) = self.snapshot.sessions.iter_mut().find(|s| s.id == session) else {
                    return Vec::new();
                };
                if existing.status.is_terminal() {
                    return Vec::new();
                }
                existing.status = match code {
                    Some(0) => SessionStatus::Done,
                    Some(_) => SessionStatus::Failed,
                    None => SessionStatus::Stopped,
                };
                tracing::info!(%session, ?code, "session exited");
                if existing.status == SessionStatus::Failed {
                    let worktree = existing.worktree.clone();
                    let name = self.worktree_name(&worktree);
                    return self.toast(format!("Session on {} failed", name), Severity::Warning, now);
                }
                Vec::new()
            }
        }
    }

    fn append_output(&mut self, worktree: WorktreeId, line: String) {
        let ctx = RenderContext {
            markdown: self.markdown.as_ref(),
            theme: &self.theme,
            width: self.output_width(),
        };
        let log = self.outputs.entry(worktree.clone()).or_default();
        let before = log.rows().len();
        log.push(line, &ctx);
        let added = log.rows().len().saturating_sub(before);

        if self.selected.as_ref() == Some(&worktree) {
            self.scroll.on_append(added);
            self.sync_scroll();
        }
    }

    fn on_command_done(&mut self, command: Command, now: Instant) -> Vec<Request> {
        let message = match &command {
            Command::Start(worktree) => format!("Started task on {}", self.worktree_name(worktree)),
            Command::Stop(_) => "Stop requested".to_string(),
            Command::FollowUp(_) => "Follow-up sent".to_string(),
        };
        let mut out = self.toast(message, Severity::Success, now);
        if self.refresh.refresh_now(TimerKind::LocalStatus) {
            out.push(Request::FetchSnapshot);
        }
        out
    }

    // ─────────────────────────────────────────────────────────────
    // Key routing
    // ─────────────────────────────────────────────────────────────

    fn on_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Request> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            tracing::info!("force quit");
            return self.quit();
        }
        if key.code == KeyCode::F(1) && self.focus.current() != &FocusTarget::Help {
            self.open_help();
            return Vec::new();
        }

        match self.focus.current().clone() {
            FocusTarget::MainOutput => self.on_main_key(key, now),
            FocusTarget::TextInput(session) => self.on_follow_up_key(session, key, now),
            FocusTarget::WorktreePicker => self.on_picker_key(key, now),
            FocusTarget::TaskFlow(step) => self.on_task_key(step, key, now),
            FocusTarget::Help => {
                self.on_help_key(key);
                Vec::new()
            }
            FocusTarget::Confirm(action) => self.on_confirm_key(action, key),
            FocusTarget::SessionBrowser => self.on_browser_key(key, now),
            FocusTarget::Settings => self.on_settings_key(key, now),
        }
    }

    fn on_main_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Request> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.scroll.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.scroll.scroll_down(1),
            KeyCode::PageUp => self.scroll.page_up(),
            KeyCode::PageDown => self.scroll.page_down(),
            KeyCode::Home | KeyCode::Char('g') => self.scroll.scroll_to_top(),
            KeyCode::End | KeyCode::Char('G') => self.scroll.pin(),
            KeyCode::Tab => return self.cycle_worktree(1),
            KeyCode::BackTab => return self.cycle_worktree(-1),
            KeyCode::Char(c @ '1'..='9') => {
                let index = c as usize - '1' as usize;
                return self.quick_select(index, now);
            }
            KeyCode::Char('n') => return self.open_task_flow(now),
            KeyCode::Char('f') => return self.open_follow_up(now),
            KeyCode::Char('x') => return self.confirm_stop(now),
            KeyCode::Char('w') => return self.open_picker(now),
            KeyCode::Char('b') => return self.open_browser(now),
            KeyCode::Char('s') => self.open_settings(),
            KeyCode::Char('?') => self.open_help(),
            KeyCode::Char('y') => return self.copy_visible(now),
            KeyCode::Char('q') => return self.request_quit(),
            _ => {}
        }
        Vec::new()
    }

    fn on_follow_up_key(&mut self, session: SessionId, key: KeyEvent, now: Instant) -> Vec<Request> {
        match self.follow_up_editor.handle_key(key) {
            EditorOutcome::Submit => {
                if self.follow_up_editor.is_blank() {
                    return self.toast("Nothing to send", Severity::Warning, now);
                }
                let prompt = self.follow_up_editor.value().trim().to_string();
                self.follow_up_editor.reset();
                self.focus.close();
                tracing::info!(%session, "follow-up");
                vec![Request::FollowUp { session, prompt }]
            }
            EditorOutcome::Cancel => {
                self.follow_up_editor.reset();
                self.focus.close();
                Vec::new()
            }
            EditorOutcome::Quit => self.quit(),
            EditorOutcome::Handled | EditorOutcome::Unhandled => Vec::new(),
        }
    }

    fn on_task_key(&mut self, step: TaskStep, key: KeyEvent, now: Instant) -> Vec<Request> {
        match step {
            TaskStep::PickWorktree => match self.picker.handle_key(key) {
                ListOutcome::Confirm => {
                    let Some(id) = self.picker.selected_id().map(WorktreeId::from) else {
                        return self.toast("No worktree selected", Severity::Warning, now);
                    };
                    self.task_worktree = Some(id);
                    self.focus.replace(FocusTarget::TaskFlow(TaskStep::WritePrompt));
                    Vec::new()
                }
                ListOutcome::Dismiss => {
                    self.picker.close();
                    self.task_worktree = None;
                    self.focus.close();
                    Vec::new()
                }
                ListOutcome::Handled | ListOutcome::Unhandled => Vec::new(),
            },
            TaskStep::WritePrompt => match self.task_editor.handle_key(key) {
                EditorOutcome::Submit => {
                    if self.task_editor.is_blank() {
                        return self.toast("Describe the task first", Severity::Warning, now);
                    }
                    let Some(worktree) = self.task_worktree.take() else {
                        self.focus.replace(FocusTarget::TaskFlow(TaskStep::PickWorktree));
                        return self.toast("No worktree selected", Severity::Warning, now);
                    };
                    let prompt = self.task_editor.value().trim().to_string();
                    self.task_editor.reset();
                    self.picker.close();
                    self.focus.close();
                    tracing::info!(%worktree, "starting task");
                    vec![Request::StartSession { worktree, prompt }]
                }
                EditorOutcome::Cancel => {
                    self.focus.replace(FocusTarget::TaskFlow(TaskStep::PickWorktree));
                    Vec::new()
                }
                EditorOutcome::Quit => self.quit(),
                EditorOutcome::Handled | EditorOutcome::Unhandled => Vec::new(),
            },
        }
    }

    fn on_picker_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Request> {
        match self.picker.handle_key(key) {
            ListOutcome::Confirm => {
                let Some(id) = self.picker.selected_id().map(WorktreeId::from) else {
                    return self.toast("No worktree selected", Severity::Warning, now);
                };
                self.picker.close();
                self.focus.close();
                self.switch_source(id)
            }
            ListOutcome::Dismiss => {
                self.picker.close();
                self.focus.close();
                Vec::new()
            }
            ListOutcome::Handled | ListOutcome::Unhandled => Vec::new(),
        }
    }

    fn on_browser_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Request> {
        match self.browser.handle_key(key) {
            ListOutcome::Confirm => {
                let worktree = self
                    .browser
                    .selected_id()
                    .and_then(|id| self.snapshot.session(&SessionId::from(id)))
                    .map(|s| s.worktree.clone());
                let Some(worktree) = worktree else {
                    return self.toast("No session selected", Severity::Warning, now);
                };
                self.browser.close();
                self.focus.close();
                self.switch_source(worktree)
            }
            ListOutcome::Dismiss => {
                self.browser.close();
                self.focus.close();
                Vec::new()
            }
            ListOutcome::Handled | ListOutcome::Unhandled => Vec::new(),
        }
    }

    fn on_settings_key(&mut self, key: KeyEvent, now: Instant) -> Vec<Request> {
        match self.settings.handle_key(key) {
            ListOutcome::Confirm => {
                let Some(name) = self.settings.selected_id().map(str::to_string) else {
                    return self.toast("No theme selected", Severity::Warning, now);
                };
                self.settings.close();
                self.focus.close();
                self.apply_theme(&name);
                self.toast(format!("Theme: {}", self.theme.name), Severity::Success, now)
            }
            ListOutcome::Dismiss => {
                self.settings.close();
                self.focus.close();
                Vec::new()
            }
            ListOutcome::Handled | ListOutcome::Unhandled => Vec::new(),
        }
    }

    fn on_help_key(&mut self, key: KeyEvent) {
        let max = self.help_max_scroll();
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::F(1) | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.focus.close();
            }
            KeyCode::Up | KeyCode::Char('k') => self.help_scroll = self.help_scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => self.help_scroll = (self.help_scroll + 1).min(max),
            KeyCode::PageUp => self.help_scroll = self.help_scroll.saturating_sub(self.help_page()),
            KeyCode::PageDown => self.help_scroll = (self.help_scroll + self.help_page()).min(max),
            KeyCode::Home => self.help_scroll = 0,
            KeyCode::End => self.help_scroll = max,
            _ => {}
        }
    }

    /// Single-key confirmation: the affirmative (or a repeated quit gesture)
    /// confirms, any other key cancels and clears the arm
    fn on_confirm_key(&mut self, action: ConfirmAction, key: KeyEvent) -> Vec<Request> {
        let affirmative = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
        match action {
            ConfirmAction::Quit { .. } if affirmative || key.code == KeyCode::Char('q') => {
                self.focus.reset();
                return self.quit();
            }
            ConfirmAction::StopSession(session) if affirmative => {
                self.focus.close();
                tracing::info!(%session, "stopping session");
                return vec![Request::StopSession(session)];
            }
            _ => {}
        }
        tracing::debug!("confirmation cancelled");
        self.focus.close();
        Vec::new()
    }

    // ─────────────────────────────────────────────────────────────
    // Actions
    // ─────────────────────────────────────────────────────────────

    fn request_quit(&mut self) -> Vec<Request> {
        let active = self.snapshot.active_count();
        if active == 0 {
            return self.quit();
        }
        tracing::debug!(active, "quit armed");
        self.focus.open(FocusTarget::Confirm(ConfirmAction::Quit { active }));
        Vec::new()
    }

    fn quit(&mut self) -> Vec<Request> {
        self.quitting = true;
        vec![Request::Quit]
    }

    fn cycle_worktree(&mut self, delta: isize) -> Vec<Request> {
        let count = self.snapshot.worktrees.len();
        if count == 0 {
            return Vec::new();
        }
        let current = self
            .selected
            .as_ref()
            .and_then(|id| self.snapshot.worktrees.iter().position(|w| &w.id == id));
        let next = match current {
            Some(i) => (i as isize + delta).rem_euclid(count as isize) as usize,
            None => 0,
        };
        let id = self.snapshot.worktrees[next].id.clone();
        self.switch_source(id)
    }

    fn quick_select(&mut self, index: usize, now: Instant) -> Vec<Request> {
        match self.snapshot.worktrees.get(index).map(|w| w.id.clone()) {
            Some(id) => self.switch_source(id),
            None => self.toast(format!("No worktree {}", index + 1), Severity::Warning, now),
        }
    }

    /// Change the viewed source, saving and restoring per-source scroll
    fn switch_source(&mut self, to: WorktreeId) -> Vec<Request> {
        if self.selected.as_ref() == Some(&to) {
            return Vec::new();
        }
        tracing::debug!(worktree = %to, "switch source");
        self.scroll = self.scroll_memory.switch(self.selected.as_ref(), &self.scroll, &to);
        self.selected = Some(to.clone());
        self.sync_scroll();

        if self.history_requested.insert(to.clone()) {
            self.outputs.entry(to.clone()).or_default().mark_history_request();
            vec![Request::FetchHistory(to)]
        } else {
            Vec::new()
        }
    }

    fn open_task_flow(&mut self, now: Instant) -> Vec<Request> {
        if self.snapshot.worktrees.is_empty() {
            return self.toast("No worktrees to start a task in", Severity::Warning, now);
        }
        self.picker.set_title("New task · choose a worktree");
        self.picker.set_items(views::worktree_items(&self.snapshot));
        self.picker.open();
        if let Some(id) = self.selected.clone() {
            self.picker.select_by_id(&id.0);
        }
        self.task_editor.reset();
        self.task_worktree = None;
        self.focus.open(FocusTarget::TaskFlow(TaskStep::PickWorktree));
        Vec::new()
    }

    fn open_follow_up(&mut self, now: Instant) -> Vec<Request> {
        let session = self
            .selected
            .as_ref()
            .and_then(|id| self.snapshot.session_for(id))
            .map(|s| (s.id.clone(), s.status));
        match session {
            None => self.toast("No session here. Press n to start one", Severity::Warning, now),
            Some((_, status)) if status.is_terminal() => {
                self.toast(format!("Session is {}", status.label()), Severity::Warning, now)
            }
            Some((id, _)) => {
                self.follow_up_editor.reset();
                self.focus.open(FocusTarget::TextInput(id));
                Vec::new()
            }
        }
    }

    fn confirm_stop(&mut self, now: Instant) -> Vec<Request> {
        let live = self
            .selected
            .as_ref()
            .and_then(|id| self.snapshot.session_for(id))
            .filter(|s| !s.status.is_terminal())
            .map(|s| s.id.clone());
        match live {
            Some(id) => {
                self.focus.open(FocusTarget::Confirm(ConfirmAction::StopSession(id)));
                Vec::new()
            }
            None => self.toast("No running session to stop", Severity::Warning, now),
        }
    }

    fn open_picker(&mut self, now: Instant) -> Vec<Request> {
        if self.snapshot.worktrees.is_empty() {
            return self.toast("No worktrees yet", Severity::Info, now);
        }
        self.picker.set_title("Worktrees");
        self.picker.set_items(views::worktree_items(&self.snapshot));
        self.picker.open();
        if let Some(id) = self.selected.clone() {
            self.picker.select_by_id(&id.0);
        }
        self.focus.open(FocusTarget::WorktreePicker);
        Vec::new()
    }

    fn open_browser(&mut self, now: Instant) -> Vec<Request> {
        if self.snapshot.sessions.is_empty() {
            return self.toast("No sessions yet", Severity::Info, now);
        }
        self.browser
            .set_items(views::session_items(&self.snapshot, chrono::Utc::now()));
        self.browser.open();
        let current = self
            .selected
            .as_ref()
            .and_then(|id| self.snapshot.session_for(id))
            .map(|s| s.id.0.clone());
        if let Some(id) = current {
            self.browser.select_by_id(&id);
        }
        self.focus.open(FocusTarget::SessionBrowser);
        Vec::new()
    }

    fn open_settings(&mut self) {
        self.settings.set_items(views::theme_items(&self.theme.name));
        self.settings.open();
        let name = self.theme.name.clone();
        self.settings.select_by_id(&name);
        self.focus.open(FocusTarget::Settings);
    }

    fn open_help(&mut self) {
        self.help_scroll = 0;
        self.focus.open_remembering(FocusTarget::Help);
    }

    fn copy_visible(&mut self, now: Instant) -> Vec<Request> {
        let rows = self.visible_output_rows();
        if rows.is_empty() {
            return self.toast("Nothing to copy", Severity::Info, now);
        }
        vec![Request::Copy(rows)]
    }

    /// Swap the palette; output is re-styled on the spot
    pub fn apply_theme(&mut self, name: &str) {
        tracing::info!(theme = name, "theme changed");
        self.theme = Theme::by_name(name);
        self.relayout_outputs();
    }

    fn toast(&mut self, message: impl Into<String>, severity: Severity, now: Instant) -> Vec<Request> {
        self.toasts
            .push(message, severity, now)
            .map(Request::Schedule)
            .into_iter()
            .collect()
    }

    // ─────────────────────────────────────────────────────────────
    // Geometry helpers
    // ─────────────────────────────────────────────────────────────

    fn layout(&self) -> FrameLayout {
        FrameLayout::new(self.width, self.height)
    }

    fn output_width(&self) -> usize {
        self.layout().output_width
    }

    fn modal_inner_width(&self) -> usize {
        self.layout().modal_width().saturating_sub(2).max(1)
    }

    fn apply_size(&mut self) {
        let layout = self.layout();
        let inner = self.modal_inner_width();
        self.task_editor.set_width(inner);
        self.follow_up_editor.set_width(inner);
        let capacity = layout.modal_height().saturating_sub(1).clamp(1, 10);
        for list in [&mut self.picker, &mut self.browser, &mut self.settings] {
            list.set_capacity(capacity);
        }
        self.help_scroll = self.help_scroll.min(self.help_max_scroll());
        self.relayout_outputs();
    }

    fn relayout_outputs(&mut self) {
        let ctx = RenderContext {
            markdown: self.markdown.as_ref(),
            theme: &self.theme,
            width: self.output_width(),
        };
        for log in self.outputs.values_mut() {
            log.relayout(&ctx);
        }
        self.sync_scroll();
    }

    fn sync_scroll(&mut self) {
        let total = self
            .selected
            .as_ref()
            .map(|id| self.output_rows(id).len())
            .unwrap_or(0);
        let viewport = self.layout().body_height;
        self.scroll.update_dimensions(total, viewport);
    }

    /// Output rows currently on screen, indicator rows excluded
    pub fn visible_output_rows(&self) -> Vec<String> {
        let Some(id) = self.selected.as_ref() else {
            return Vec::new();
        };
        let rows = self.output_rows(id);
        let window = scrollback::window(rows.len(), self.scroll.offset(), self.layout().body_height);
        rows[window.start..window.end].to_vec()
    }

    fn help_page(&self) -> usize {
        self.layout().modal_height().saturating_sub(1).max(1)
    }

    fn help_max_scroll(&self) -> usize {
        let lines = views::help_lines(&self.theme, self.modal_inner_width()).len();
        lines.saturating_sub(self.layout().modal_height())
    }

    fn worktree_ids(&self) -> Vec<WorktreeId> {
        self.snapshot.worktrees.iter().map(|w| w.id.clone()).collect()
    }

    fn worktree_name(&self, id: &WorktreeId) -> String {
        self.snapshot
            .worktree(id)
            .map(|w| w.name.clone())
            .unwrap_or_else(|| id.0.clone())
    }

    fn active_editor(&mut self) -> Option<&mut TextEditor> {
        match self.focus.current() {
            FocusTarget::TextInput(_) => Some(&mut self.follow_up_editor),
            FocusTarget::TaskFlow(TaskStep::WritePrompt) => Some(&mut self.task_editor),
            _ => None,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────

    /// The full frame: exactly `height` rows of exactly `width` columns
    pub fn render(&self) -> String {
        let (width, height) = (self.width, self.height);
        if is_degenerate(width, height) {
            return views::too_small(width, height);
        }
        let layout = self.layout();
        let theme = &self.theme;

        let header = views::header(
            theme,
            &self.snapshot,
            self.selected.as_ref(),
            self.selected.as_ref().and_then(|id| self.remote.get(id)),
            width,
        );

        let output = self.render_output(&layout);
        let body = if layout.has_sidebar() {
            let sidebar = views::worktree_list(
                theme,
                &self.snapshot,
                self.selected.as_ref(),
                &self.remote,
                layout.sidebar_width,
                layout.body_height,
            );
            let divider = vec![theme.paint("│", theme.border); layout.body_height].join("\n");
            join_horizontal(&[sidebar, divider, output])
        } else {
            output
        };

        let note = if self.scroll.is_pinned() {
            String::new()
        } else {
            format!("↑{}", self.scroll.offset())
        };
        let footer = views::footer(theme, self.focus.current(), &note, width);

        let mut frame = format!("{}\n{}\n{}", header, body, footer);

        if let Some(modal) = self.render_modal(&layout) {
            frame = float_centered(&frame, &modal, width, height);
        }

        let toast_width = (width / 2).clamp(24.min(width), width);
        if let Some(toasts) = self.toasts.render(theme, toast_width) {
            let toast_height = toasts.split('\n').count();
            let x = width.saturating_sub(measure_width(&toasts) + 1);
            let y = height.saturating_sub(toast_height + 1);
            frame = float_at(&frame, &toasts, x, y);
        }

        pad_or_truncate(&frame, width, height)
    }

    fn render_output(&self, layout: &FrameLayout) -> String {
        let rows = self
            .selected
            .as_ref()
            .map(|id| self.output_rows(id))
            .unwrap_or(&[]);
        let content = if rows.is_empty() {
            views::empty_output(&self.theme, self.selected.is_some(), layout.output_width)
        } else {
            scrollback::render(rows, self.scroll.offset(), layout.body_height, &self.theme)
        };
        pad_or_truncate(&content, layout.output_width, layout.body_height)
    }

    /// The boxed overlay for the focused modal, if any
    fn render_modal(&self, layout: &FrameLayout) -> Option<String> {
        let theme = &self.theme;
        let inner = self.modal_inner_width();
        let (title, content, border) = match self.focus.current() {
            FocusTarget::MainOutput => return None,
            FocusTarget::TextInput(session) => {
                let worktree = self
                    .snapshot
                    .session(session)
                    .map(|s| self.worktree_name(&s.worktree))
                    .unwrap_or_else(|| session.0.clone());
                (
                    format!("Follow-up · {}", worktree),
                    self.follow_up_editor.render(theme, true),
                    theme.accent,
                )
            }
            FocusTarget::TaskFlow(TaskStep::PickWorktree) | FocusTarget::WorktreePicker => {
                (self.picker.title().to_string(), self.picker.render(theme, inner), theme.border)
            }
            FocusTarget::TaskFlow(TaskStep::WritePrompt) => {
                let worktree = self
                    .task_worktree
                    .as_ref()
                    .map(|id| self.worktree_name(id))
                    .unwrap_or_default();
                (
                    format!("New task · {}", worktree),
                    self.task_editor.render(theme, true),
                    theme.accent,
                )
            }
            FocusTarget::SessionBrowser => {
                (self.browser.title().to_string(), self.browser.render(theme, inner), theme.border)
            }
            FocusTarget::Settings => {
                (self.settings.title().to_string(), self.settings.render(theme, inner), theme.border)
            }
            FocusTarget::Help => {
                let lines = views::help_lines(theme, inner);
                let visible = layout.modal_height();
                let start = self.help_scroll.min(lines.len().saturating_sub(visible));
                let end = (start + visible).min(lines.len());
                ("Keys".to_string(), lines[start..end].join("\n"), theme.border)
            }
            FocusTarget::Confirm(action) => {
                let body = views::confirm_prompt(theme, action, &self.snapshot);
                return Some(boxed(&body, "Confirm", inner.min(48), theme.warning, theme));
            }
        };
        Some(boxed(&content, &title, inner, border, theme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Session, Worktree};
    use crate::tui::markdown::TermMarkdown;
    use crate::tui::text::strip_ansi;
    use chrono::Utc;
    use std::path::PathBuf;

    fn worktree(id: &str) -> Worktree {
        Worktree {
            id: id.into(),
            name: id.to_string(),
            branch: format!("{}-branch", id),
            path: PathBuf::from(format!("/repo/{}", id)),
        }
    }

    fn session(id: &str, worktree: &str, status: SessionStatus) -> Session {
        Session {
            id: id.into(),
            worktree: worktree.into(),
            agent: "claude".to_string(),
            status,
            started_at: Utc::now(),
            prompt: "do things".to_string(),
        }
    }

    fn snapshot(feat_status: SessionStatus) -> Snapshot {
        Snapshot {
            worktrees: vec![worktree("main"), worktree("feat")],
            sessions: vec![session("s1", "feat", feat_status)],
        }
    }

    fn controller_with(snap: Snapshot) -> Controller {
        let mut c = Controller::new(
            ControllerConfig::default(),
            Theme::hardcoded_default(),
            Box::new(TermMarkdown),
        );
        c.start();
        c.handle_event(Event::Snapshot(snap));
        c
    }

    fn press(c: &mut Controller, code: KeyCode) -> Vec<Request> {
        c.handle_event(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn ctrl(c: &mut Controller, ch: char) -> Vec<Request> {
        c.handle_event(Event::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)))
    }

    fn type_str(c: &mut Controller, s: &str) {
        for ch in s.chars() {
            press(c, KeyCode::Char(ch));
        }
    }

    fn lines(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {}", i)).collect()
    }

    fn has_toast_schedule(requests: &[Request]) -> bool {
        requests
            .iter()
            .any(|r| matches!(r, Request::Schedule(s) if s.kind == TimerKind::Toasts))
    }

    #[test]
    fn test_quit_is_immediate_without_live_sessions() {
        let mut c = controller_with(snapshot(SessionStatus::Done));
        let requests = press(&mut c, KeyCode::Char('q'));
        assert_eq!(requests, vec![Request::Quit]);
        assert!(c.should_quit());
    }

    #[test]
    fn test_quit_with_live_session_asks_first() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        let first = press(&mut c, KeyCode::Char('q'));
        assert!(!first.contains(&Request::Quit));
        assert!(!c.should_quit());
        assert_eq!(c.focus(), &FocusTarget::Confirm(ConfirmAction::Quit { active: 1 }));

        let second = press(&mut c, KeyCode::Char('q'));
        assert_eq!(second, vec![Request::Quit]);
        assert!(c.should_quit());
    }

    #[test]
    fn test_affirmative_confirms_quit() {
        let mut c = controller_with(snapshot(SessionStatus::Idle));
        press(&mut c, KeyCode::Char('q'));
        assert_eq!(press(&mut c, KeyCode::Char('y')), vec![Request::Quit]);
    }

    #[test]
    fn test_other_key_cancels_armed_quit() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        press(&mut c, KeyCode::Char('q'));
        let requests = press(&mut c, KeyCode::Char('j'));
        assert!(requests.is_empty());
        assert!(!c.should_quit());
        assert_eq!(c.focus(), &FocusTarget::MainOutput);

        // The arm was cleared: the next quit asks again
        press(&mut c, KeyCode::Char('q'));
        assert!(matches!(c.focus(), FocusTarget::Confirm(_)));
        assert!(!c.should_quit());
    }

    #[test]
    fn test_ctrl_c_bypasses_confirmation() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        press(&mut c, KeyCode::Char('n'));
        assert_eq!(ctrl(&mut c, 'c'), vec![Request::Quit]);
        assert!(c.should_quit());
    }

    #[test]
    fn test_first_snapshot_selects_and_schedules() {
        let mut c = Controller::new(
            ControllerConfig::default(),
            Theme::hardcoded_default(),
            Box::new(TermMarkdown),
        );
        let start = c.start();
        assert_eq!(start, vec![Request::FetchSnapshot, Request::NextBackendEvent]);

        let requests = c.handle_event(Event::Snapshot(snapshot(SessionStatus::Running)));
        assert_eq!(c.selected_worktree(), Some(&WorktreeId::from("main")));
        assert!(requests.contains(&Request::FetchHistory("main".into())));
        assert!(requests
            .iter()
            .any(|r| matches!(r, Request::Schedule(s) if s.kind == TimerKind::LocalStatus)));
        assert!(requests.contains(&Request::FetchRemoteStatus(vec!["main".into(), "feat".into()])));
    }

    #[test]
    fn test_local_refresh_rearms_only_after_completion() {
        let mut c = Controller::new(
            ControllerConfig::default(),
            Theme::hardcoded_default(),
            Box::new(TermMarkdown),
        );
        c.start();
        let requests = c.handle_event(Event::SnapshotFailed("boom".to_string()));
        let Some(Request::Schedule(schedule)) = requests.first().cloned() else {
            panic!("expected a schedule, got {:?}", requests);
        };
        assert_eq!(schedule.kind, TimerKind::LocalStatus);

        // Stale generation is ignored
        let stale = c.handle_event(Event::Timer {
            kind: TimerKind::LocalStatus,
            generation: schedule.generation + 7,
        });
        assert!(stale.is_empty());

        let fired = c.handle_event(Event::Timer {
            kind: TimerKind::LocalStatus,
            generation: schedule.generation,
        });
        assert_eq!(fired, vec![Request::FetchSnapshot]);

        // The same fire delivered twice does nothing
        let again = c.handle_event(Event::Timer {
            kind: TimerKind::LocalStatus,
            generation: schedule.generation,
        });
        assert!(again.is_empty());
    }

    #[test]
    fn test_quick_select_out_of_range_toasts() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        let requests = press(&mut c, KeyCode::Char('9'));
        assert!(has_toast_schedule(&requests));
        assert_eq!(c.toasts().len(), 1);
        assert_eq!(c.selected_worktree(), Some(&WorktreeId::from("main")));

        press(&mut c, KeyCode::Char('2'));
        assert_eq!(c.selected_worktree(), Some(&WorktreeId::from("feat")));
    }

    #[test]
    fn test_help_reopens_prior_target() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        press(&mut c, KeyCode::Char('s'));
        assert_eq!(c.focus(), &FocusTarget::Settings);

        press(&mut c, KeyCode::F(1));
        assert_eq!(c.focus(), &FocusTarget::Help);

        press(&mut c, KeyCode::Esc);
        assert_eq!(c.focus(), &FocusTarget::Settings);
    }

    #[test]
    fn test_open_gestures_only_from_main() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        press(&mut c, KeyCode::Char('w'));
        assert_eq!(c.focus(), &FocusTarget::WorktreePicker);
        // 's' is filter text here, not the settings gesture
        press(&mut c, KeyCode::Char('s'));
        assert_eq!(c.focus(), &FocusTarget::WorktreePicker);
    }

    #[test]
    fn test_scroll_memory_per_worktree() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        c.handle_event(Event::History {
            worktree: "main".into(),
            lines: lines(100),
        });
        c.handle_event(Event::History {
            worktree: "feat".into(),
            lines: lines(100),
        });

        for _ in 0..5 {
            press(&mut c, KeyCode::Up);
        }
        assert_eq!(c.scroll().offset(), 5);

        press(&mut c, KeyCode::Tab);
        assert_eq!(c.selected_worktree(), Some(&WorktreeId::from("feat")));
        assert!(c.scroll().is_pinned());

        press(&mut c, KeyCode::Tab);
        assert_eq!(c.selected_worktree(), Some(&WorktreeId::from("main")));
        assert_eq!(c.scroll().offset(), 5);
    }

    #[test]
    fn test_backend_events_are_pulled_one_at_a_time() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        let requests = c.handle_event(Event::Backend(SessionEvent::Output {
            session: "s0".into(),
            worktree: "main".into(),
            line: "hello from the agent".to_string(),
        }));
        assert_eq!(requests, vec![Request::NextBackendEvent]);
        assert!(!c.output_rows(&"main".into()).is_empty());

        assert!(c.handle_event(Event::BackendClosed).is_empty());
    }

    fn output(worktree: &str, line: &str) -> Event {
        Event::Backend(SessionEvent::Output {
            session: "s1".into(),
            worktree: worktree.into(),
            line: line.to_string(),
        })
    }

    fn plain_rows(c: &Controller, worktree: &str) -> Vec<String> {
        c.output_rows(&worktree.into()).iter().map(|r| strip_ansi(r)).collect()
    }

    #[test]
    fn test_history_reply_keeps_output_streamed_after_request() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        let requests = press(&mut c, KeyCode::Char('2'));
        assert_eq!(requests, vec![Request::FetchHistory("feat".into())]);

        c.handle_event(output("feat", "LIVE LINE"));
        c.handle_event(Event::History {
            worktree: "feat".into(),
            lines: vec!["old 1".to_string(), "old 2".to_string()],
        });
        assert_eq!(plain_rows(&c, "feat"), vec!["old 1", "old 2", "LIVE LINE"]);
    }

    #[test]
    fn test_output_before_history_request_is_not_duplicated() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        c.handle_event(output("feat", "early line"));
        press(&mut c, KeyCode::Char('2'));
        c.handle_event(Event::History {
            worktree: "feat".into(),
            lines: vec!["old".to_string(), "early line".to_string()],
        });
        assert_eq!(plain_rows(&c, "feat"), vec!["old", "early line"]);
    }

    #[test]
    fn test_resize_rewraps_streamed_output() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        let long = "word ".repeat(30);
        c.handle_event(output("main", "intro"));
        c.handle_event(output("main", ""));
        c.handle_event(output("main", long.trim_end()));
        let wide = c.output_rows(&"main".into()).len();

        c.handle_event(Event::Resize { width: 40, height: 24 });
        let narrow = plain_rows(&c, "main");
        assert!(narrow.len() > wide);
        assert_eq!(narrow[0], "intro");
        assert_eq!(narrow[1], "");
    }

    #[test]
    fn test_exit_updates_status_and_active_count() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        assert_eq!(c.snapshot().active_count(), 1);
        c.handle_event(Event::Backend(SessionEvent::Exited {
            session: "s1".into(),
            code: Some(0),
        }));
        assert_eq!(c.snapshot().active_count(), 0);
        assert_eq!(press(&mut c, KeyCode::Char('q')), vec![Request::Quit]);
    }

    #[test]
    fn test_pinned_view_follows_output_and_scrolled_view_holds() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        c.handle_event(Event::History {
            worktree: "main".into(),
            lines: lines(60),
        });
        press(&mut c, KeyCode::Up);
        press(&mut c, KeyCode::Up);
        let before = c.visible_output_rows();

        c.handle_event(Event::Backend(SessionEvent::Output {
            session: "s0".into(),
            worktree: "main".into(),
            line: "new line".to_string(),
        }));
        assert_eq!(c.visible_output_rows(), before);

        press(&mut c, KeyCode::Char('G'));
        let pinned = c.visible_output_rows();
        assert!(strip_ansi(pinned.last().map(String::as_str).unwrap_or("")).contains("new line"));
    }

    #[test]
    fn test_task_flow_starts_session() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        press(&mut c, KeyCode::Char('n'));
        assert_eq!(c.focus(), &FocusTarget::TaskFlow(TaskStep::PickWorktree));

        press(&mut c, KeyCode::Down);
        press(&mut c, KeyCode::Enter);
        assert_eq!(c.focus(), &FocusTarget::TaskFlow(TaskStep::WritePrompt));

        type_str(&mut c, "fix the flaky test");
        let requests = ctrl(&mut c, 's');
        assert_eq!(
            requests,
            vec![Request::StartSession {
                worktree: "feat".into(),
                prompt: "fix the flaky test".to_string(),
            }]
        );
        assert_eq!(c.focus(), &FocusTarget::MainOutput);
    }

    #[test]
    fn test_task_flow_rejects_empty_prompt_and_steps_back() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        press(&mut c, KeyCode::Char('n'));
        press(&mut c, KeyCode::Enter);

        let requests = ctrl(&mut c, 's');
        assert!(has_toast_schedule(&requests));
        assert_eq!(c.focus(), &FocusTarget::TaskFlow(TaskStep::WritePrompt));

        press(&mut c, KeyCode::Esc);
        assert_eq!(c.focus(), &FocusTarget::TaskFlow(TaskStep::PickWorktree));
        press(&mut c, KeyCode::Esc);
        assert_eq!(c.focus(), &FocusTarget::MainOutput);
    }

    #[test]
    fn test_follow_up_needs_a_session() {
        let mut c = controller_with(snapshot(SessionStatus::Idle));
        let requests = press(&mut c, KeyCode::Char('f'));
        assert!(has_toast_schedule(&requests));
        assert_eq!(c.focus(), &FocusTarget::MainOutput);

        press(&mut c, KeyCode::Tab);
        press(&mut c, KeyCode::Char('f'));
        assert_eq!(c.focus(), &FocusTarget::TextInput("s1".into()));

        c.handle_event(Event::Paste("and add tests".to_string()));
        let requests = press(&mut c, KeyCode::Enter);
        assert!(matches!(requests.as_slice(), [Request::FollowUp { .. }]));
        assert_eq!(c.focus(), &FocusTarget::MainOutput);
    }

    #[test]
    fn test_follow_up_submits_prompt() {
        let mut c = controller_with(snapshot(SessionStatus::Idle));
        press(&mut c, KeyCode::Char('2'));
        press(&mut c, KeyCode::Char('f'));
        type_str(&mut c, "and add tests");
        let requests = press(&mut c, KeyCode::Enter);
        assert_eq!(
            requests,
            vec![Request::FollowUp {
                session: "s1".into(),
                prompt: "and add tests".to_string(),
            }]
        );
    }

    #[test]
    fn test_stop_asks_for_confirmation() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        press(&mut c, KeyCode::Char('2'));
        assert!(press(&mut c, KeyCode::Char('x')).is_empty());
        assert_eq!(
            c.focus(),
            &FocusTarget::Confirm(ConfirmAction::StopSession("s1".into()))
        );
        assert_eq!(press(&mut c, KeyCode::Char('y')), vec![Request::StopSession("s1".into())]);
        assert_eq!(c.focus(), &FocusTarget::MainOutput);
    }

    #[test]
    fn test_settings_swaps_theme() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        press(&mut c, KeyCode::Char('s'));
        type_str(&mut c, "nord");
        let requests = press(&mut c, KeyCode::Enter);
        assert_eq!(c.theme().name, "Nord");
        assert!(has_toast_schedule(&requests));
        assert_eq!(c.focus(), &FocusTarget::MainOutput);
    }

    #[test]
    fn test_session_browser_switches_source() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        press(&mut c, KeyCode::Char('b'));
        assert_eq!(c.focus(), &FocusTarget::SessionBrowser);
        press(&mut c, KeyCode::Enter);
        assert_eq!(c.selected_worktree(), Some(&WorktreeId::from("feat")));
    }

    #[test]
    fn test_stale_remote_status_is_harmless() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        let mut statuses = HashMap::new();
        statuses.insert(
            WorktreeId::from("deleted-long-ago"),
            RemoteStatus {
                pr_number: Some(9),
                ..RemoteStatus::default()
            },
        );
        c.handle_event(Event::RemoteStatus(statuses));
        let frame = c.render();
        assert!(!strip_ansi(&frame).contains("#9"));
    }

    #[test]
    fn test_frame_is_exact_size() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        c.handle_event(Event::History {
            worktree: "main".into(),
            lines: lines(40),
        });
        press(&mut c, KeyCode::Char('9'));

        for (width, height) in [(80, 24), (40, 10), (150, 40), (20, 5)] {
            c.handle_event(Event::Resize { width, height });
            for open in [None, Some(KeyCode::Char('?')), Some(KeyCode::Char('w'))] {
                if let Some(code) = open {
                    press(&mut c, code);
                }
                let frame = c.render();
                let rows: Vec<&str> = frame.split('\n').collect();
                assert_eq!(rows.len(), height, "{}x{}", width, height);
                for row in rows {
                    assert_eq!(measure_width(row), width, "{}x{}: {:?}", width, height, row);
                }
                press(&mut c, KeyCode::Esc);
            }
        }
    }

    #[test]
    fn test_tiny_terminal_degrades() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        c.handle_event(Event::Resize { width: 12, height: 3 });
        let frame = c.render();
        assert_eq!(frame.split('\n').count(), 3);
        assert!(strip_ansi(&frame).starts_with("Terminal"));
    }

    #[test]
    fn test_copy_requests_visible_rows() {
        let mut c = controller_with(snapshot(SessionStatus::Running));
        let empty = press(&mut c, KeyCode::Char('y'));
        assert!(has_toast_schedule(&empty));

        c.handle_event(Event::History {
            worktree: "main".into(),
            lines: lines(3),
        });
        let requests = press(&mut c, KeyCode::Char('y'));
        let Some(Request::Copy(rows)) = requests.first() else {
            panic!("expected copy, got {:?}", requests);
        };
        assert!(rows.iter().any(|r| strip_ansi(r).contains("line 2")));
    }
}
