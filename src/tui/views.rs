// Frame painters
//
// Pure functions from controller data to styled rows. Nothing here owns
// state; the controller decides what is visible and calls these to draw it.
// Every painter returns rows no wider than the width it was given.

use super::dropdown::SelectableItem;
use super::focus::{ConfirmAction, FocusTarget, TaskStep};
use super::text::{fit_to_width, pad_or_truncate, spread, truncate_to_width};
use crate::backend::{CheckState, RemoteStatus, SessionStatus, Snapshot, WorktreeId};
use crate::theme::Theme;
use chrono::{DateTime, Utc};
use crossterm::style::Color;
use std::collections::HashMap;

// ─────────────────────────────────────────────────────────────
// Status decoration
// ─────────────────────────────────────────────────────────────

/// One-cell glyph for a session status (`None` = no session yet)
pub fn status_glyph(status: Option<SessionStatus>) -> &'static str {
    match status {
        None => "·",
        Some(SessionStatus::Pending) => "○",
        Some(SessionStatus::Running) => "●",
        Some(SessionStatus::Idle) => "◐",
        Some(SessionStatus::Done) => "✓",
        Some(SessionStatus::Failed) => "✗",
        Some(SessionStatus::Stopped) => "■",
    }
}

pub fn status_color(theme: &Theme, status: Option<SessionStatus>) -> Color {
    match status {
        None => theme.dim,
        Some(SessionStatus::Pending) => theme.pending,
        Some(SessionStatus::Running) => theme.running,
        Some(SessionStatus::Idle) => theme.idle,
        Some(SessionStatus::Done) => theme.done,
        Some(SessionStatus::Failed) => theme.error,
        Some(SessionStatus::Stopped) => theme.dim,
    }
}

/// Compact age like "42s", "5m", "3h", "2d"
pub fn age(started_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - started_at).num_seconds().max(0);
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m", secs / 60),
        3600..=86_399 => format!("{}h", secs / 3600),
        _ => format!("{}d", secs / 86_400),
    }
}

/// "PR #12 open ✓" style summary; empty when nothing is known
pub fn remote_badge(theme: &Theme, remote: &RemoteStatus) -> String {
    let mut parts = Vec::new();
    if let Some(number) = remote.pr_number {
        let state = remote.pr_state.as_deref().unwrap_or("");
        parts.push(theme.muted(format!("PR #{} {}", number, state).trim_end()));
    }
    match remote.checks {
        Some(CheckState::Passing) => parts.push(theme.paint("✓", theme.done)),
        Some(CheckState::Failing) => parts.push(theme.paint("✗", theme.error)),
        Some(CheckState::Pending) => parts.push(theme.paint("…", theme.pending)),
        None => {}
    }
    parts.join(" ")
}

// ─────────────────────────────────────────────────────────────
// Main view regions
// ─────────────────────────────────────────────────────────────

/// Top row: app name, viewed worktree, its session, remote status, active count
pub fn header(
    theme: &Theme,
    snapshot: &Snapshot,
    selected: Option<&WorktreeId>,
    remote: Option<&RemoteStatus>,
    width: usize,
) -> String {
    let mut left = theme.strong("agentdeck", theme.accent);

    if let Some(worktree) = selected.and_then(|id| snapshot.worktree(id)) {
        left.push_str(&theme.muted(" · "));
        left.push_str(&theme.strong(&worktree.name, theme.foreground));
        left.push_str(&theme.muted(&format!(" ({})", worktree.branch)));

        if let Some(session) = snapshot.session_for(&worktree.id) {
            let status = Some(session.status);
            left.push_str(&theme.muted(" · "));
            left.push_str(&theme.paint(
                &format!("{} {} {}", status_glyph(status), session.agent, session.status.label()),
                status_color(theme, status),
            ));
        }
        if let Some(badge) = remote.map(|r| remote_badge(theme, r)).filter(|b| !b.is_empty()) {
            left.push_str(&theme.muted(" · "));
            left.push_str(&badge);
        }
    }

    let active = snapshot.active_count();
    let right = if active == 0 {
        theme.muted("idle")
    } else {
        theme.paint(&format!("{} active", active), theme.running)
    };
    spread(&left, &right, width)
}

/// Left pane: numbered worktrees with session status and PR badge
pub fn worktree_list(
    theme: &Theme,
    snapshot: &Snapshot,
    selected: Option<&WorktreeId>,
    remote: &HashMap<WorktreeId, RemoteStatus>,
    width: usize,
    height: usize,
) -> String {
    let mut rows = Vec::with_capacity(snapshot.worktrees.len());
    for (i, worktree) in snapshot.worktrees.iter().enumerate() {
        let status = snapshot.session_for(&worktree.id).map(|s| s.status);
        let number = if i < 9 { format!("{}", i + 1) } else { " ".to_string() };
        let pr = remote
            .get(&worktree.id)
            .and_then(|r| r.pr_number)
            .map(|n| format!("#{}", n))
            .unwrap_or_default();

        if selected == Some(&worktree.id) {
            let plain = format!("{} {} {}", status_glyph(status), number, worktree.name);
            rows.push(theme.selected(&spread(&plain, &pr, width)));
        } else {
            let left = format!(
                "{} {} {}",
                theme.paint(status_glyph(status), status_color(theme, status)),
                theme.muted(&number),
                worktree.name
            );
            rows.push(spread(&left, &theme.muted(&pr), width));
        }
    }
    if rows.is_empty() {
        rows.push(theme.muted("no worktrees"));
    }
    pad_or_truncate(&rows.join("\n"), width, height)
}

/// Placeholder for an output pane with nothing to show yet
pub fn empty_output(theme: &Theme, has_worktree: bool, width: usize) -> String {
    let text = if has_worktree {
        "No output yet. Press n to start a task."
    } else {
        "Waiting for worktrees..."
    };
    theme.muted(&truncate_to_width(text, width))
}

/// Bottom row: key hints for the focused target plus a right-aligned note
pub fn footer(theme: &Theme, target: &FocusTarget, note: &str, width: usize) -> String {
    let hints = theme.muted(hints_for(target));
    let label = theme.strong(target.label(), theme.accent);
    let right = if note.is_empty() {
        label
    } else {
        format!("{} {}", theme.paint(note, theme.warning), label)
    };
    spread(&hints, &right, width)
}

pub fn hints_for(target: &FocusTarget) -> &'static str {
    match target {
        FocusTarget::MainOutput => {
            "n new  f follow-up  x stop  w worktrees  b sessions  s settings  y copy  ? help  q quit"
        }
        FocusTarget::TextInput(_) | FocusTarget::TaskFlow(TaskStep::WritePrompt) => {
            "ctrl-s send  tab buttons  shift-enter newline  esc back"
        }
        FocusTarget::WorktreePicker
        | FocusTarget::SessionBrowser
        | FocusTarget::Settings
        | FocusTarget::TaskFlow(TaskStep::PickWorktree) => "type to filter  ↑↓ move  enter choose  esc close",
        FocusTarget::Help => "↑↓ scroll  esc close",
        FocusTarget::Confirm(_) => "y confirm  any other key cancels",
    }
}

// ─────────────────────────────────────────────────────────────
// Modal content
// ─────────────────────────────────────────────────────────────

const HELP: &[(&str, &str)] = &[
    ("", "Output"),
    ("↑ / k", "Scroll up one line"),
    ("↓ / j", "Scroll down one line"),
    ("PgUp / PgDn", "Scroll by a page"),
    ("g", "Jump to oldest output"),
    ("G / End", "Pin to latest output"),
    ("y", "Copy visible output"),
    ("", "Worktrees"),
    ("Tab / Shift-Tab", "Next / previous worktree"),
    ("1-9", "Quick-select worktree"),
    ("w", "Worktree picker"),
    ("b", "Session browser"),
    ("", "Sessions"),
    ("n", "Start a new task"),
    ("f", "Send a follow-up prompt"),
    ("x", "Stop the selected session"),
    ("", "Prompt editor"),
    ("Ctrl-S", "Send"),
    ("Enter", "Send (or press the focused button)"),
    ("Shift-Enter / Ctrl-J", "Insert newline"),
    ("Tab", "Cycle text / buttons"),
    ("Esc", "Back"),
    ("", "General"),
    ("s", "Settings (theme)"),
    ("? / F1", "This help"),
    ("q", "Quit (asks when sessions are running)"),
    ("Ctrl-C", "Quit immediately"),
];

/// Key reference rows for the help overlay
pub fn help_lines(theme: &Theme, width: usize) -> Vec<String> {
    HELP.iter()
        .map(|(key, description)| {
            if key.is_empty() {
                theme.strong(description, theme.accent)
            } else {
                let key = fit_to_width(key, 22);
                fit_to_width(&format!("  {}{}", theme.paint(&key, theme.foreground), theme.muted(description)), width)
            }
        })
        .collect()
}

/// Body of the single-key confirmation box
pub fn confirm_prompt(theme: &Theme, action: &ConfirmAction, snapshot: &Snapshot) -> String {
    let question = match action {
        ConfirmAction::Quit { active } => {
            let noun = if *active == 1 { "session is" } else { "sessions are" };
            format!("{} {} still running. Quit anyway?", active, noun)
        }
        ConfirmAction::StopSession(id) => match snapshot.session(id) {
            Some(session) => {
                let worktree = snapshot
                    .worktree(&session.worktree)
                    .map(|w| w.name.as_str())
                    .unwrap_or(session.worktree.0.as_str());
                format!("Stop {} on {}?", session.agent, worktree)
            }
            None => format!("Stop session {}?", id),
        },
    };
    let keys = match action {
        ConfirmAction::Quit { .. } => "y / q quit    any other key cancels",
        ConfirmAction::StopSession(_) => "y stop    any other key cancels",
    };
    format!("{}\n\n{}", question, theme.muted(keys))
}

/// Minimal frame for terminals below the usable size
pub fn too_small(width: usize, height: usize) -> String {
    if width == 0 || height == 0 {
        return String::new();
    }
    let notice = format!("Terminal too small ({}x{})", width, height);
    pad_or_truncate(&truncate_to_width(&notice, width), width, height)
}

// ─────────────────────────────────────────────────────────────
// List items
// ─────────────────────────────────────────────────────────────

/// Worktrees for the picker and the task flow
pub fn worktree_items(snapshot: &Snapshot) -> Vec<SelectableItem> {
    snapshot
        .worktrees
        .iter()
        .map(|worktree| {
            let status = snapshot.session_for(&worktree.id).map(|s| s.status);
            SelectableItem::new(worktree.id.0.clone(), worktree.name.clone())
                .with_icon(status_glyph(status))
                .with_subtitle(worktree.branch.clone())
        })
        .collect()
}

/// Every session grouped by worktree, newest first within a group
pub fn session_items(snapshot: &Snapshot, now: DateTime<Utc>) -> Vec<SelectableItem> {
    let mut items = Vec::new();
    for worktree in &snapshot.worktrees {
        let mut sessions: Vec<_> = snapshot
            .sessions
            .iter()
            .filter(|s| s.worktree == worktree.id)
            .collect();
        if sessions.is_empty() {
            continue;
        }
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        items.push(SelectableItem::separator(worktree.name.clone()));
        for session in sessions {
            items.push(
                SelectableItem::new(session.id.0.clone(), format!("{}/{}", worktree.name, session.agent))
                    .with_icon(status_glyph(Some(session.status)))
                    .with_subtitle(session.status.label())
                    .with_badge(age(session.started_at, now)),
            );
        }
    }
    items
}

/// Bundled theme names, the active one marked
pub fn theme_items(current: &str) -> Vec<SelectableItem> {
    Theme::bundled_names()
        .into_iter()
        .map(|name| {
            let item = SelectableItem::new(name.clone(), name.clone());
            if name == current {
                item.with_badge("active")
            } else {
                item
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Session, Worktree};
    use crate::tui::text::{measure_width, strip_ansi};
    use chrono::Duration;
    use std::path::PathBuf;

    fn snapshot() -> Snapshot {
        let now = Utc::now();
        Snapshot {
            worktrees: vec![
                Worktree {
                    id: "main".into(),
                    name: "main".to_string(),
                    branch: "main".to_string(),
                    path: PathBuf::from("/repo"),
                },
                Worktree {
                    id: "feat".into(),
                    name: "feat".to_string(),
                    branch: "feat/login".to_string(),
                    path: PathBuf::from("/repo-feat"),
                },
            ],
            sessions: vec![
                Session {
                    id: "s1".into(),
                    worktree: "feat".into(),
                    agent: "claude".to_string(),
                    status: SessionStatus::Running,
                    started_at: now - Duration::minutes(5),
                    prompt: "fix login".to_string(),
                },
                Session {
                    id: "s0".into(),
                    worktree: "feat".into(),
                    agent: "claude".to_string(),
                    status: SessionStatus::Done,
                    started_at: now - Duration::hours(2),
                    prompt: "plan".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_age_units() {
        let now = Utc::now();
        assert_eq!(age(now - Duration::seconds(42), now), "42s");
        assert_eq!(age(now - Duration::minutes(5), now), "5m");
        assert_eq!(age(now - Duration::hours(3), now), "3h");
        assert_eq!(age(now - Duration::days(2), now), "2d");
        assert_eq!(age(now + Duration::seconds(5), now), "0s");
    }

    #[test]
    fn test_header_fits_width() {
        let theme = Theme::hardcoded_default();
        let snap = snapshot();
        let feat = WorktreeId::from("feat");
        let remote = RemoteStatus {
            pr_number: Some(12),
            pr_state: Some("open".to_string()),
            checks: Some(CheckState::Passing),
        };
        for width in [20, 60, 120] {
            let row = header(&theme, &snap, Some(&feat), Some(&remote), width);
            assert_eq!(measure_width(&row), width);
        }
        let wide = strip_ansi(&header(&theme, &snap, Some(&feat), Some(&remote), 120));
        assert!(wide.contains("feat/login"));
        assert!(wide.contains("PR #12 open"));
        assert!(wide.contains("1 active"));
    }

    #[test]
    fn test_worktree_list_is_exact_block() {
        let theme = Theme::hardcoded_default();
        let snap = snapshot();
        let list = worktree_list(&theme, &snap, None, &HashMap::new(), 24, 6);
        let rows: Vec<&str> = list.split('\n').collect();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| measure_width(r) == 24));
        assert!(strip_ansi(rows[1]).contains("● 2 feat"));
    }

    #[test]
    fn test_session_items_grouped_newest_first() {
        let items = session_items(&snapshot(), Utc::now());
        assert_eq!(items.len(), 3);
        assert!(items[0].is_separator);
        assert_eq!(items[1].id, "s1");
        assert_eq!(items[2].id, "s0");
        assert_eq!(items[1].label, "feat/claude");
        assert_eq!(items[2].badge.as_deref(), Some("2h"));
    }

    #[test]
    fn test_confirm_prompt_wording() {
        let theme = Theme::hardcoded_default();
        let snap = snapshot();
        let quit = strip_ansi(&confirm_prompt(&theme, &ConfirmAction::Quit { active: 1 }, &snap));
        assert!(quit.starts_with("1 session is still running"));
        let stop = strip_ansi(&confirm_prompt(&theme, &ConfirmAction::StopSession("s1".into()), &snap));
        assert!(stop.starts_with("Stop claude on feat?"));
    }

    #[test]
    fn test_too_small_respects_size() {
        let frame = too_small(12, 3);
        let rows: Vec<&str> = frame.split('\n').collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| measure_width(r) == 12));
        assert_eq!(too_small(0, 3), "");
    }

    #[test]
    fn test_theme_items_mark_active() {
        let items = theme_items("Nord");
        let nord = items.iter().find(|i| i.id == "Nord").map(|i| i.badge.clone());
        assert_eq!(nord, Some(Some("active".to_string())));
    }
}
