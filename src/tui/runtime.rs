// Host runtime
//
// Puts the controller in a real terminal. One loop task owns the controller
// and applies events strictly one at a time; everything slow (backend calls,
// timers, clipboard, reading the terminal) runs in spawned tasks that report
// back through a single channel.
//
//   input reader ─┐
//   timers ───────┤
//   fetches ──────┼──> inbox ──> loop: handle_event -> requests -> Host::execute
//   commands ─────┤
//   backend ──────┘ (pulled one event at a time)
//
// A watch channel carries cancellation. Ctrl-C from outside (SIGINT) or a
// controller quit flips it, which unblocks any pending wait immediately.

use super::clipboard;
use super::controller::{Command, Controller, Event, Request};
use super::text::RESET;
use crate::backend::{RemoteStatus, SessionBackend, SessionEvent, WorktreeId};
use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, DisableBracketedPaste, EnableBracketedPaste, KeyEventKind},
    execute, queue,
    style::Print,
    terminal::{
        self, disable_raw_mode, enable_raw_mode, BeginSynchronizedUpdate, Clear, ClearType,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use futures::future::join_all;
use std::collections::HashMap;
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};

/// Depth of the controller's inbox
const INBOX_DEPTH: usize = 256;

/// How often the input reader re-checks the cancellation flag
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Run the controller in the terminal until it quits or is cancelled
pub async fn run(mut controller: Controller, backend: Arc<dyn SessionBackend>) -> Result<()> {
    let mut screen = Screen::enter()?;

    let (tx, mut inbox) = mpsc::channel(INBOX_DEPTH);
    let (cancel_tx, mut cancel_rx) = watch::channel(false);

    spawn_input_reader(tx.clone(), cancel_rx.clone());
    spawn_signal_watcher(cancel_tx.clone());

    let (width, height) = terminal::size().context("Failed to read terminal size")?;
    controller.handle_event(Event::Resize {
        width: width as usize,
        height: height as usize,
    });

    let mut host = Host::new(backend, tx, cancel_tx.clone());
    for request in controller.start() {
        host.execute(request);
    }

    let result = async {
        loop {
            screen.draw(&controller.render())?;
            let Some(event) = host.next_event(&mut inbox, &mut cancel_rx).await else {
                break;
            };
            for request in controller.handle_event(event) {
                host.execute(request);
            }
            if controller.should_quit() {
                break;
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    // Stops the input reader and any stragglers
    let _ = cancel_tx.send(true);
    screen.restore()?;
    tracing::info!("terminal restored");
    result
}

// ─────────────────────────────────────────────────────────────
// Request execution
// ─────────────────────────────────────────────────────────────

/// Executes controller requests and funnels their results into the inbox
pub struct Host {
    backend: Arc<dyn SessionBackend>,
    events: mpsc::Sender<Event>,
    backend_events: mpsc::Receiver<SessionEvent>,
    /// The controller asked for one more backend event
    want_backend: bool,
    cancel: watch::Sender<bool>,
}

impl Host {
    pub fn new(backend: Arc<dyn SessionBackend>, events: mpsc::Sender<Event>, cancel: watch::Sender<bool>) -> Self {
        let backend_events = backend.subscribe();
        Self {
            backend,
            events,
            backend_events,
            want_backend: false,
            cancel,
        }
    }

    /// Start the work for one request. Never blocks.
    pub fn execute(&mut self, request: Request) {
        match request {
            Request::Schedule(schedule) => {
                let tx = self.events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(schedule.after).await;
                    let _ = tx
                        .send(Event::Timer {
                            kind: schedule.kind,
                            generation: schedule.generation,
                        })
                        .await;
                });
            }
            Request::FetchSnapshot => {
                let backend = self.backend.clone();
                self.deliver(async move {
                    match tokio::task::spawn_blocking(move || backend.snapshot()).await {
                        Ok(Ok(snapshot)) => Event::Snapshot(snapshot),
                        Ok(Err(e)) => Event::SnapshotFailed(format!("{:#}", e)),
                        Err(e) => Event::SnapshotFailed(e.to_string()),
                    }
                });
            }
            Request::FetchRemoteStatus(worktrees) => {
                let backend = self.backend.clone();
                self.deliver(async move { Event::RemoteStatus(fetch_remote(backend, worktrees).await) });
            }
            Request::FetchHistory(worktree) => {
                let fetch = self.backend.history(worktree.clone());
                self.deliver(async move {
                    match fetch.await {
                        Ok(lines) => Event::History { worktree, lines },
                        Err(e) => Event::HistoryFailed {
                            worktree,
                            error: format!("{:#}", e),
                        },
                    }
                });
            }
            Request::NextBackendEvent => self.want_backend = true,
            Request::StartSession { worktree, prompt } => {
                let fetch = self.backend.start(worktree.clone(), prompt);
                self.command(Command::Start(worktree), async move { fetch.await.map(|_| ()) });
            }
            Request::StopSession(session) => {
                let fetch = self.backend.stop(session.clone());
                self.command(Command::Stop(session), fetch);
            }
            Request::FollowUp { session, prompt } => {
                let fetch = self.backend.follow_up(session.clone(), prompt);
                self.command(Command::FollowUp(session), fetch);
            }
            Request::Copy(rows) => {
                self.deliver(async move {
                    match tokio::task::spawn_blocking(move || clipboard::copy_rows(&rows)).await {
                        Ok(Ok(count)) => Event::Copied(count),
                        Ok(Err(e)) => Event::CopyFailed(format!("{:#}", e)),
                        Err(e) => Event::CopyFailed(e.to_string()),
                    }
                });
            }
            Request::Quit => {
                let _ = self.cancel.send(true);
            }
        }
    }

    /// Wait for the next event for the controller. `None` once cancelled.
    pub async fn next_event(
        &mut self,
        inbox: &mut mpsc::Receiver<Event>,
        cancel: &mut watch::Receiver<bool>,
    ) -> Option<Event> {
        if *cancel.borrow() {
            return None;
        }
        tokio::select! {
            _ = cancel.changed() => None,
            Some(event) = inbox.recv() => Some(event),
            backend = self.backend_events.recv(), if self.want_backend => {
                self.want_backend = false;
                Some(match backend {
                    Some(event) => Event::Backend(event),
                    None => Event::BackendClosed,
                })
            }
            else => None,
        }
    }

    /// Spawn `work` and send its result event to the loop
    fn deliver<F>(&self, work: F)
    where
        F: std::future::Future<Output = Event> + Send + 'static,
    {
        let tx = self.events.clone();
        tokio::spawn(async move {
            let event = work.await;
            // Receiver gone means the loop has exited
            let _ = tx.send(event).await;
        });
    }

    fn command<F>(&self, command: Command, work: F)
    where
        F: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        self.deliver(async move {
            match work.await {
                Ok(()) => Event::CommandDone(command),
                Err(e) => Event::CommandFailed {
                    command,
                    error: format!("{:#}", e),
                },
            }
        });
    }
}

/// Fetch remote status for every worktree concurrently.
///
/// Each task writes into a shared map; only the finished map is returned.
/// Worktrees whose fetch failed are left out.
async fn fetch_remote(
    backend: Arc<dyn SessionBackend>,
    worktrees: Vec<WorktreeId>,
) -> HashMap<WorktreeId, RemoteStatus> {
    let results = Arc::new(Mutex::new(HashMap::new()));
    let tasks = worktrees.into_iter().map(|worktree| {
        let fetch = backend.remote_status(worktree.clone());
        let results = results.clone();
        async move {
            match fetch.await {
                Ok(status) => {
                    results.lock().await.insert(worktree, status);
                }
                Err(e) => tracing::debug!(%worktree, "remote status failed: {:#}", e),
            }
        }
    });
    join_all(tasks).await;
    let mut results = results.lock().await;
    std::mem::take(&mut *results)
}

// ─────────────────────────────────────────────────────────────
// Terminal plumbing
// ─────────────────────────────────────────────────────────────

/// Forward terminal input into the inbox from a blocking thread
fn spawn_input_reader(tx: mpsc::Sender<Event>, cancel: watch::Receiver<bool>) {
    tokio::task::spawn_blocking(move || {
        while !*cancel.borrow() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    tracing::warn!("terminal poll failed: {}", e);
                    break;
                }
            }
            let forwarded = match event::read() {
                Ok(event::Event::Key(key)) if key.kind != KeyEventKind::Release => Some(Event::Key(key)),
                Ok(event::Event::Resize(width, height)) => Some(Event::Resize {
                    width: width as usize,
                    height: height as usize,
                }),
                Ok(event::Event::Paste(text)) => Some(Event::Paste(text)),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("terminal read failed: {}", e);
                    break;
                }
            };
            if let Some(event) = forwarded {
                if tx.blocking_send(event).is_err() {
                    break;
                }
            }
        }
        tracing::debug!("input reader stopped");
    });
}

/// SIGINT from outside the terminal (raw mode turns Ctrl-C into a key)
fn spawn_signal_watcher(cancel: watch::Sender<bool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupted");
            let _ = cancel.send(true);
        }
    });
}

/// Raw-mode alternate screen that frames are written to
struct Screen {
    out: Stdout,
    last_frame: String,
}

impl Screen {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, EnableBracketedPaste, Hide).context("Failed to setup terminal")?;
        Ok(Self {
            out,
            last_frame: String::new(),
        })
    }

    /// Write a full frame, row by row. Identical frames are skipped.
    fn draw(&mut self, frame: &str) -> Result<()> {
        if frame == self.last_frame {
            return Ok(());
        }
        queue!(self.out, BeginSynchronizedUpdate)?;
        for (y, row) in frame.split('\n').enumerate() {
            queue!(
                self.out,
                MoveTo(0, y as u16),
                Print(row),
                Print(RESET),
                Clear(ClearType::UntilNewLine)
            )?;
        }
        queue!(self.out, Clear(ClearType::FromCursorDown), EndSynchronizedUpdate)?;
        self.out.flush().context("Failed to draw frame")?;
        self.last_frame = frame.to_string();
        Ok(())
    }

    fn restore(mut self) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(self.out, Show, DisableBracketedPaste, LeaveAlternateScreen)
            .context("Failed to restore terminal")?;
        Ok(())
    }
}
