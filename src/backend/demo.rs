// Demo backend: an in-memory stand-in for real agents and worktrees
//
// Seeds a few worktrees and sessions with history, then simulates agents by
// streaming scripted markdown output line by line. Used by `--demo` and by
// the runtime tests.
//
// Run with: AGENTDECK_DEMO=1 cargo run --release

use super::{
    CheckState, RemoteStatus, Session, SessionBackend, SessionEvent, SessionId, SessionStatus,
    Snapshot, Worktree, WorktreeId,
};
use anyhow::{anyhow, bail, Result};
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Event channel depth; the UI pulls one event at a time
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Default)]
struct DemoState {
    worktrees: Vec<Worktree>,
    sessions: Vec<Session>,
    history: HashMap<WorktreeId, Vec<String>>,
    next_id: u64,
}

impl DemoState {
    fn session_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| &s.id == id)
    }

    fn next_session_id(&mut self) -> SessionId {
        self.next_id += 1;
        SessionId(format!("s{}", self.next_id))
    }
}

/// In-process backend with simulated agents
pub struct DemoBackend {
    state: Arc<Mutex<DemoState>>,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<SessionEvent>>>,
    /// Delay between streamed output lines
    line_delay: Duration,
}

impl DemoBackend {
    pub fn new() -> Self {
        Self::with_line_delay(Duration::from_millis(120))
    }

    /// Faster or slower agents (tests use a near-zero delay)
    pub fn with_line_delay(line_delay: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            state: Arc::new(Mutex::new(seed())),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            line_delay,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, DemoState>> {
        self.state.lock().map_err(|_| anyhow!("demo state lock poisoned"))
    }
}

impl Default for DemoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBackend for DemoBackend {
    fn snapshot(&self) -> Result<Snapshot> {
        let state = self.lock()?;
        Ok(Snapshot {
            worktrees: state.worktrees.clone(),
            sessions: state.sessions.clone(),
        })
    }

    fn remote_status(&self, worktree: WorktreeId) -> BoxFuture<'static, Result<RemoteStatus>> {
        let state = self.state.clone();
        let delay = self.line_delay * 4;
        Box::pin(async move {
            // Pretend to talk to the forge
            sleep(delay).await;
            let state = state.lock().map_err(|_| anyhow!("demo state lock poisoned"))?;
            let index = state
                .worktrees
                .iter()
                .position(|w| w.id == worktree)
                .ok_or_else(|| anyhow!("unknown worktree {}", worktree))?;
            if index == 0 {
                // Default branch has no PR
                return Ok(RemoteStatus::default());
            }
            let checks = match index % 3 {
                0 => CheckState::Failing,
                1 => CheckState::Passing,
                _ => CheckState::Pending,
            };
            Ok(RemoteStatus {
                pr_number: Some(400 + index as u32 * 7),
                pr_state: Some(if index % 2 == 0 { "draft" } else { "open" }.to_string()),
                checks: Some(checks),
            })
        })
    }

    fn history(&self, worktree: WorktreeId) -> BoxFuture<'static, Result<Vec<String>>> {
        let state = self.state.clone();
        Box::pin(async move {
            let state = state.lock().map_err(|_| anyhow!("demo state lock poisoned"))?;
            Ok(state.history.get(&worktree).cloned().unwrap_or_default())
        })
    }

    fn start(&self, worktree: WorktreeId, prompt: String) -> BoxFuture<'static, Result<SessionId>> {
        let state = self.state.clone();
        let tx = self.events_tx.clone();
        let delay = self.line_delay;
        Box::pin(async move {
            let session = {
                let mut guard = state.lock().map_err(|_| anyhow!("demo state lock poisoned"))?;
                if !guard.worktrees.iter().any(|w| w.id == worktree) {
                    bail!("unknown worktree {}", worktree);
                }
                let session = Session {
                    id: guard.next_session_id(),
                    worktree: worktree.clone(),
                    agent: "claude".to_string(),
                    status: SessionStatus::Pending,
                    started_at: Utc::now(),
                    prompt: prompt.clone(),
                };
                guard.sessions.push(session.clone());
                guard
                    .history
                    .entry(worktree.clone())
                    .or_default()
                    .push(format!("> {}", prompt));
                session
            };

            tracing::info!(session = %session.id, worktree = %worktree, "demo session started");
            let id = session.id.clone();
            let _ = tx.send(SessionEvent::Started(session)).await;
            tokio::spawn(stream_reply(state, tx, id.clone(), worktree, prompt, delay));
            Ok(id)
        })
    }

    fn stop(&self, session: SessionId) -> BoxFuture<'static, Result<()>> {
        let state = self.state.clone();
        let tx = self.events_tx.clone();
        Box::pin(async move {
            {
                let mut guard = state.lock().map_err(|_| anyhow!("demo state lock poisoned"))?;
                let entry = guard
                    .session_mut(&session)
                    .ok_or_else(|| anyhow!("unknown session {}", session))?;
                if entry.status.is_terminal() {
                    bail!("session {} already finished", session);
                }
                entry.status = SessionStatus::Stopped;
            }
            tracing::info!(session = %session, "demo session stopped");
            let _ = tx
                .send(SessionEvent::StatusChanged {
                    session: session.clone(),
                    status: SessionStatus::Stopped,
                })
                .await;
            let _ = tx.send(SessionEvent::Exited { session, code: None }).await;
            Ok(())
        })
    }

    fn follow_up(&self, session: SessionId, prompt: String) -> BoxFuture<'static, Result<()>> {
        let state = self.state.clone();
        let tx = self.events_tx.clone();
        let delay = self.line_delay;
        Box::pin(async move {
            let worktree = {
                let mut guard = state.lock().map_err(|_| anyhow!("demo state lock poisoned"))?;
                let entry = guard
                    .session_mut(&session)
                    .ok_or_else(|| anyhow!("unknown session {}", session))?;
                match entry.status {
                    SessionStatus::Idle => {}
                    SessionStatus::Running | SessionStatus::Pending => {
                        bail!("agent is still working")
                    }
                    _ => bail!("session {} already finished", session),
                }
                entry.status = SessionStatus::Pending;
                let worktree = entry.worktree.clone();
                guard
                    .history
                    .entry(worktree.clone())
                    .or_default()
                    .push(format!("> {}", prompt));
                worktree
            };
            tokio::spawn(stream_reply(state, tx, session, worktree, prompt, delay));
            Ok(())
        })
    }

    fn subscribe(&self) -> mpsc::Receiver<SessionEvent> {
        let taken = self.events_rx.lock().ok().and_then(|mut rx| rx.take());
        match taken {
            Some(rx) => rx,
            None => {
                tracing::warn!("demo backend already has a subscriber");
                // Closed channel: the caller sees end-of-stream immediately
                mpsc::channel(1).1
            }
        }
    }
}

/// Simulate an agent working on `prompt`
async fn stream_reply(
    state: Arc<Mutex<DemoState>>,
    tx: mpsc::Sender<SessionEvent>,
    session: SessionId,
    worktree: WorktreeId,
    prompt: String,
    delay: Duration,
) {
    sleep(delay).await;
    if !set_status(&state, &session, SessionStatus::Running) {
        return;
    }
    let _ = tx
        .send(SessionEvent::StatusChanged {
            session: session.clone(),
            status: SessionStatus::Running,
        })
        .await;

    for line in scripted_reply(&prompt) {
        // Stopped mid-stream
        let live = state
            .lock()
            .ok()
            .map(|mut s| {
                let running = s
                    .sessions
                    .iter()
                    .any(|x| x.id == session && x.status == SessionStatus::Running);
                if running {
                    s.history.entry(worktree.clone()).or_default().push(line.clone());
                }
                running
            })
            .unwrap_or(false);
        if !live {
            return;
        }
        if tx
            .send(SessionEvent::Output {
                session: session.clone(),
                worktree: worktree.clone(),
                line,
            })
            .await
            .is_err()
        {
            return;
        }
        sleep(delay).await;
    }

    if set_status(&state, &session, SessionStatus::Idle) {
        let _ = tx
            .send(SessionEvent::StatusChanged {
                session,
                status: SessionStatus::Idle,
            })
            .await;
    }
}

/// Move a live session to `status`. Returns false if it is gone or finished.
fn set_status(state: &Arc<Mutex<DemoState>>, session: &SessionId, status: SessionStatus) -> bool {
    let Ok(mut guard) = state.lock() else {
        return false;
    };
    match guard.session_mut(session) {
        Some(entry) if !entry.status.is_terminal() => {
            entry.status = status;
            true
        }
        _ => false,
    }
}

fn scripted_reply(prompt: &str) -> Vec<String> {
    let topic = prompt.lines().next().unwrap_or("the task").trim();
    [
        format!("Looking into **{}**.", topic),
        String::new(),
        "## Plan".to_string(),
        "- Read the modules involved".to_string(),
        "- Make the change behind the existing interface".to_string(),
        "- Run the test suite".to_string(),
        String::new(),
        "Reading `src/lib.rs` and `src/worker.rs`...".to_string(),
        String::new(),
        "```rust".to_string(),
        "pub fn retry_delay(attempt: u32) -> Duration {".to_string(),
        "    Duration::from_millis(100 * 2u64.pow(attempt.min(6)))".to_string(),
        "}".to_string(),
        "```".to_string(),
        String::new(),
        "> cargo test: 128 passed, 0 failed".to_string(),
        String::new(),
        "Done. The change is ready for review.".to_string(),
    ]
    .to_vec()
}

/// Initial worktrees, sessions and history
fn seed() -> DemoState {
    let root = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("src")
        .join("shipyard");
    let worktree = |id: &str, branch: &str| Worktree {
        id: WorktreeId::from(id),
        name: id.to_string(),
        branch: branch.to_string(),
        path: if id == "main" {
            root.clone()
        } else {
            root.join(".worktrees").join(id)
        },
    };

    let worktrees = vec![
        worktree("main", "main"),
        worktree("auth-refresh", "feature/auth-refresh"),
        worktree("flaky-tests", "fix/flaky-tests"),
        worktree("docs-pass", "docs/api-pass"),
    ];

    let now = Utc::now();
    let sessions = vec![
        Session {
            id: SessionId::from("s-auth"),
            worktree: WorktreeId::from("auth-refresh"),
            agent: "claude".to_string(),
            status: SessionStatus::Idle,
            started_at: now - ChronoDuration::minutes(42),
            prompt: "Refresh expired OAuth tokens transparently".to_string(),
        },
        Session {
            id: SessionId::from("s-flaky"),
            worktree: WorktreeId::from("flaky-tests"),
            agent: "codex".to_string(),
            status: SessionStatus::Done,
            started_at: now - ChronoDuration::hours(3),
            prompt: "Find why integration tests flake on CI".to_string(),
        },
    ];

    let mut history = HashMap::new();
    history.insert(
        WorktreeId::from("auth-refresh"),
        [
            "> Refresh expired OAuth tokens transparently",
            "",
            "The client currently surfaces `401` to callers. I added a",
            "refresh step in `TokenStore::get` guarded by a mutex so only",
            "one refresh runs at a time.",
            "",
            "- `src/auth/store.rs`: refresh on expiry",
            "- `src/auth/client.rs`: retry once after refresh",
            "",
            "Want me to add a test for concurrent refreshes?",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>(),
    );
    history.insert(
        WorktreeId::from("flaky-tests"),
        (1..=60)
            .map(|i| match i % 10 {
                0 => format!("## Run {}", i / 10),
                3 => "```".to_string(),
                6 => "```".to_string(),
                _ => format!("test worker::pool_{} ... ok", i),
            })
            .collect(),
    );

    DemoState {
        worktrees,
        sessions,
        history,
        next_id: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> DemoBackend {
        DemoBackend::with_line_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_seed_snapshot() {
        let backend = fast();
        let snapshot = backend.snapshot().unwrap();
        assert_eq!(snapshot.worktrees.len(), 4);
        assert_eq!(snapshot.active_count(), 1);
    }

    #[tokio::test]
    async fn test_history_for_unknown_worktree_is_empty() {
        let backend = fast();
        let lines = backend.history(WorktreeId::from("nope")).await.unwrap();
        assert!(lines.is_empty());
        let lines = backend.history(WorktreeId::from("auth-refresh")).await.unwrap();
        assert!(!lines.is_empty());
    }

    #[tokio::test]
    async fn test_start_streams_output_then_idles() {
        let backend = fast();
        let mut events = backend.subscribe();
        let id = backend
            .start(WorktreeId::from("main"), "add retries".to_string())
            .await
            .unwrap();

        let mut outputs = 0;
        loop {
            match events.recv().await {
                Some(SessionEvent::Output { session, .. }) => {
                    assert_eq!(session, id);
                    outputs += 1;
                }
                Some(SessionEvent::StatusChanged {
                    status: SessionStatus::Idle,
                    ..
                }) => break,
                Some(_) => {}
                None => panic!("event stream closed"),
            }
        }
        assert_eq!(outputs, scripted_reply("add retries").len());
        let snapshot = backend.snapshot().unwrap();
        assert_eq!(snapshot.session(&id).map(|s| s.status), Some(SessionStatus::Idle));
    }

    #[tokio::test]
    async fn test_stop_twice_fails() {
        let backend = fast();
        backend.stop(SessionId::from("s-auth")).await.unwrap();
        assert!(backend.stop(SessionId::from("s-auth")).await.is_err());
    }

    #[tokio::test]
    async fn test_start_on_unknown_worktree_fails() {
        let backend = fast();
        let result = backend.start(WorktreeId::from("ghost"), "x".to_string()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_second_subscriber_sees_closed_stream() {
        let backend = fast();
        let _first = backend.subscribe();
        let mut second = backend.subscribe();
        assert!(second.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_remote_status_for_default_branch_is_empty() {
        let backend = fast();
        let main = backend.remote_status(WorktreeId::from("main")).await.unwrap();
        assert!(main.pr_number.is_none());
        let feature = backend
            .remote_status(WorktreeId::from("auth-refresh"))
            .await
            .unwrap();
        assert!(feature.pr_number.is_some());
    }
}
