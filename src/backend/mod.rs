// Session/worktree backend interface
//
// The TUI never touches processes, git or the network directly. Everything it
// knows about worktrees and agent sessions comes through `SessionBackend`:
// a cheap synchronous snapshot, async commands and queries, and a lifecycle
// event stream consumed one message at a time.

pub mod demo;

pub use demo::DemoBackend;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Stable identity of a git worktree
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorktreeId(pub String);

/// Stable identity of an agent session
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for WorktreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorktreeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worktree {
    pub id: WorktreeId,
    pub name: String,
    pub branch: String,
    pub path: PathBuf,
}

/// Lifecycle state of an agent session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Pending,
    Running,
    /// Waiting for user input
    Idle,
    Done,
    Failed,
    Stopped,
}

impl SessionStatus {
    /// Terminal sessions will never change state again
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Stopped)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Idle => "idle",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Stopped => "stopped",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub worktree: WorktreeId,
    /// Agent name, e.g. "claude"
    pub agent: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub prompt: String,
}

/// Point-in-time view of every worktree and session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub worktrees: Vec<Worktree>,
    pub sessions: Vec<Session>,
}

impl Snapshot {
    /// Sessions that have not reached a terminal state
    pub fn active_count(&self) -> usize {
        self.sessions.iter().filter(|s| !s.status.is_terminal()).count()
    }

    /// The session to show for a worktree: newest live one, else newest overall
    pub fn session_for(&self, worktree: &WorktreeId) -> Option<&Session> {
        let mut sessions: Vec<&Session> = self
            .sessions
            .iter()
            .filter(|s| &s.worktree == worktree)
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        sessions
            .iter()
            .rev()
            .find(|s| !s.status.is_terminal())
            .or_else(|| sessions.last())
            .copied()
    }

    pub fn worktree(&self, id: &WorktreeId) -> Option<&Worktree> {
        self.worktrees.iter().find(|w| &w.id == id)
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| &s.id == id)
    }
}

/// CI check rollup for a PR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckState {
    Passing,
    Failing,
    Pending,
}

/// Network-side status of a worktree's branch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub pr_number: Option<u32>,
    /// "open", "draft", "merged", ...
    pub pr_state: Option<String>,
    pub checks: Option<CheckState>,
}

/// Lifecycle change pushed by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started(Session),
    StatusChanged {
        session: SessionId,
        status: SessionStatus,
    },
    /// One line of agent output (markdown)
    Output {
        session: SessionId,
        worktree: WorktreeId,
        line: String,
    },
    Exited {
        session: SessionId,
        code: Option<i32>,
    },
}

/// Everything the TUI consumes from the session/worktree layer
pub trait SessionBackend: Send + Sync {
    /// Current worktrees and sessions
    fn snapshot(&self) -> anyhow::Result<Snapshot>;

    fn remote_status(&self, worktree: WorktreeId) -> BoxFuture<'static, anyhow::Result<RemoteStatus>>;

    /// Persisted output lines for a worktree, oldest first
    fn history(&self, worktree: WorktreeId) -> BoxFuture<'static, anyhow::Result<Vec<String>>>;

    fn start(&self, worktree: WorktreeId, prompt: String) -> BoxFuture<'static, anyhow::Result<SessionId>>;

    fn stop(&self, session: SessionId) -> BoxFuture<'static, anyhow::Result<()>>;

    fn follow_up(&self, session: SessionId, prompt: String) -> BoxFuture<'static, anyhow::Result<()>>;

    /// Lifecycle event stream. Only one subscriber is supported.
    fn subscribe(&self) -> mpsc::Receiver<SessionEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(id: &str, worktree: &str, status: SessionStatus, age_mins: i64) -> Session {
        Session {
            id: id.into(),
            worktree: worktree.into(),
            agent: "claude".to_string(),
            status,
            started_at: Utc::now() - Duration::minutes(age_mins),
            prompt: String::new(),
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(SessionStatus::Done.is_terminal());
        assert!(SessionStatus::Failed.is_terminal());
        assert!(SessionStatus::Stopped.is_terminal());
        assert!(!SessionStatus::Running.is_terminal());
        assert!(!SessionStatus::Idle.is_terminal());
        assert!(!SessionStatus::Pending.is_terminal());
    }

    #[test]
    fn test_session_for_prefers_live_session() {
        let snapshot = Snapshot {
            worktrees: Vec::new(),
            sessions: vec![
                session("old", "main", SessionStatus::Running, 30),
                session("new", "main", SessionStatus::Done, 5),
                session("other", "feat", SessionStatus::Idle, 1),
            ],
        };
        let main = WorktreeId::from("main");
        assert_eq!(snapshot.session_for(&main).map(|s| s.id.0.as_str()), Some("old"));
        assert_eq!(snapshot.active_count(), 2);
    }

    #[test]
    fn test_session_for_falls_back_to_newest() {
        let snapshot = Snapshot {
            worktrees: Vec::new(),
            sessions: vec![
                session("a", "main", SessionStatus::Done, 30),
                session("b", "main", SessionStatus::Failed, 5),
            ],
        };
        let main = WorktreeId::from("main");
        assert_eq!(snapshot.session_for(&main).map(|s| s.id.0.as_str()), Some("b"));
        assert!(snapshot.session_for(&WorktreeId::from("none")).is_none());
    }
}
