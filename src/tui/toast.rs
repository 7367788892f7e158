//! Toast notifications
//!
//! Non-blocking messages that auto-dismiss. The queue keeps only the most
//! recent few (oldest evicted) and owns a single timer armed for the earliest
//! pending expiry, rather than one timer per toast.

use super::overlay::boxed;
use super::scheduler::{Schedule, TimerKind, TimerSlot};
use super::text::{measure_width, truncate_to_width};
use crate::theme::Theme;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn icon(self) -> &'static str {
        match self {
            Self::Info => "•",
            Self::Success => "✓",
            Self::Warning => "!",
            Self::Error => "✗",
        }
    }
}

/// A toast notification that auto-dismisses
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub severity: Severity,
    created_at: Instant,
    ttl: Duration,
}

impl Toast {
    pub fn new(message: impl Into<String>, severity: Severity, now: Instant, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            severity,
            created_at: now,
            ttl,
        }
    }

    pub fn expires_at(&self) -> Instant {
        self.created_at + self.ttl
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }
}

/// Bounded toast queue with one rearming expiry timer
#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    max: usize,
    ttl: Duration,
    timer: TimerSlot,
}

impl ToastQueue {
    pub fn new(max: usize, ttl: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            max: max.max(1),
            ttl,
            timer: TimerSlot::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// Add a toast. Returns a timer request if the expiry timer moved.
    pub fn push(&mut self, message: impl Into<String>, severity: Severity, now: Instant) -> Option<Schedule> {
        let message = message.into();
        tracing::debug!(?severity, "toast: {}", message);
        self.toasts.push_back(Toast::new(message, severity, now, self.ttl));
        while self.toasts.len() > self.max {
            self.toasts.pop_front();
        }
        self.rearm(now)
    }

    /// The expiry timer fired: sweep and re-arm if anything is left
    pub fn on_timer(&mut self, generation: u64, now: Instant) -> Option<Schedule> {
        if !self.timer.fire(generation) {
            return None;
        }
        self.sweep(now);
        self.rearm(now)
    }

    /// Drop every expired toast
    pub fn sweep(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.is_expired(now));
    }

    /// Point the timer at the earliest pending expiry.
    ///
    /// Linear scan; the queue holds a handful of entries at most.
    fn rearm(&mut self, now: Instant) -> Option<Schedule> {
        let Some(earliest) = self.toasts.iter().map(Toast::expires_at).min() else {
            self.timer.disarm();
            return None;
        };
        if self.timer.deadline() == Some(earliest) {
            return None;
        }
        let generation = self.timer.arm(earliest);
        Some(Schedule {
            kind: TimerKind::Toasts,
            after: earliest.saturating_duration_since(now),
            generation,
        })
    }

    /// Render the live toasts as one bordered block, newest last.
    ///
    /// Returns `None` when there is nothing to show.
    pub fn render(&self, theme: &Theme, max_width: usize) -> Option<String> {
        if self.toasts.is_empty() || max_width < 8 {
            return None;
        }
        let inner_max = max_width - 2;
        let lines: Vec<String> = self
            .toasts
            .iter()
            .map(|toast| {
                let color = match toast.severity {
                    Severity::Info => theme.accent,
                    Severity::Success => theme.running,
                    Severity::Warning => theme.warning,
                    Severity::Error => theme.error,
                };
                let text = format!(" {} {} ", toast.severity.icon(), toast.message);
                theme.paint(&truncate_to_width(&text, inner_max), color)
            })
            .collect();
        let inner = lines.iter().map(|l| measure_width(l)).max().unwrap_or(0);
        Some(boxed(&lines.join("\n"), "", inner, theme.border, theme))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::text::strip_ansi;

    const TTL: Duration = Duration::from_millis(3000);

    #[test]
    fn test_queue_evicts_oldest() {
        let now = Instant::now();
        let mut queue = ToastQueue::new(3, TTL);
        for i in 0..5 {
            queue.push(format!("toast {}", i), Severity::Info, now);
        }
        let messages: Vec<&str> = queue.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["toast 2", "toast 3", "toast 4"]);
    }

    #[test]
    fn test_single_timer_tracks_earliest_expiry() {
        let now = Instant::now();
        let mut queue = ToastQueue::new(3, TTL);

        let first = queue.push("first", Severity::Info, now).expect("timer armed");
        assert_eq!(first.after, TTL);

        // A later toast does not move the earliest expiry
        let later = now + Duration::from_millis(500);
        assert!(queue.push("second", Severity::Info, later).is_none());
    }

    #[test]
    fn test_eviction_moves_timer() {
        let now = Instant::now();
        let mut queue = ToastQueue::new(1, TTL);
        queue.push("first", Severity::Info, now);
        let later = now + Duration::from_millis(1000);
        let moved = queue.push("second", Severity::Info, later).expect("timer moved");
        assert_eq!(moved.after, TTL);
    }

    #[test]
    fn test_timer_sweeps_and_rearms() {
        let now = Instant::now();
        let mut queue = ToastQueue::new(3, TTL);
        let first = queue.push("a", Severity::Info, now).expect("armed");
        queue.push("b", Severity::Info, now + Duration::from_millis(1000));

        let fired_at = now + TTL;
        let next = queue.on_timer(first.generation, fired_at).expect("re-armed for b");
        assert_eq!(queue.len(), 1);
        assert_eq!(next.after, Duration::from_millis(1000));

        let done = queue.on_timer(next.generation, fired_at + Duration::from_millis(1000));
        assert!(done.is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_stale_timer_is_ignored() {
        let now = Instant::now();
        let mut queue = ToastQueue::new(1, TTL);
        let first = queue.push("a", Severity::Info, now).expect("armed");
        queue.push("b", Severity::Info, now + Duration::from_millis(10));
        assert!(queue.on_timer(first.generation, now + TTL).is_none());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_render_fits_width() {
        let theme = Theme::hardcoded_default();
        let now = Instant::now();
        let mut queue = ToastQueue::new(3, TTL);
        assert!(queue.render(&theme, 40).is_none());

        queue.push("a fairly long message that will not fit", Severity::Warning, now);
        let out = queue.render(&theme, 20).expect("rendered");
        for row in out.split('\n') {
            assert!(measure_width(row) <= 20);
        }
        assert!(strip_ansi(&out).contains('!'));
    }
}
