//! One-shot timers and refresh cadences
//!
//! Timers are never free-running. Each arm bumps a generation number and the
//! host delivers the generation back when the sleep ends; a fire whose
//! generation is not the current one is stale and ignored. Re-arming therefore
//! implicitly cancels whatever was pending for the same purpose.
//!
//! Periodic refreshes re-arm only after their fetch completes, so a slow
//! fetch can never overlap the next one.

use std::time::{Duration, Instant};

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Toast expiry sweep
    Toasts,
    /// Session status from the local backend
    LocalStatus,
    /// PR/CI status from the network
    RemoteStatus,
}

/// A request for the host to deliver a timer event after `after`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub kind: TimerKind,
    pub after: Duration,
    pub generation: u64,
}

/// A single one-shot timer identity
#[derive(Debug, Clone, Default)]
pub struct TimerSlot {
    generation: u64,
    deadline: Option<Instant>,
}

impl TimerSlot {
    /// Arm for `deadline`, superseding any pending fire. Returns the new generation.
    pub fn arm(&mut self, deadline: Instant) -> u64 {
        self.generation += 1;
        self.deadline = Some(deadline);
        self.generation
    }

    pub fn disarm(&mut self) {
        self.generation += 1;
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Accept a fire for `generation`. Stale or unarmed fires return false.
    pub fn fire(&mut self, generation: u64) -> bool {
        if self.deadline.is_some() && generation == self.generation {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

/// One refresh cadence: a timer plus an in-flight flag
#[derive(Debug, Clone)]
struct Cadence {
    every: Duration,
    timer: TimerSlot,
    in_flight: bool,
}

impl Cadence {
    fn new(every: Duration) -> Self {
        Self {
            every,
            timer: TimerSlot::default(),
            in_flight: false,
        }
    }
}

/// Drives the local and remote status refresh cadences
#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    local: Cadence,
    remote: Cadence,
}

impl RefreshScheduler {
    pub fn new(local_every: Duration, remote_every: Duration) -> Self {
        Self {
            local: Cadence::new(local_every),
            remote: Cadence::new(remote_every),
        }
    }

    fn cadence(&mut self, kind: TimerKind) -> Option<&mut Cadence> {
        match kind {
            TimerKind::LocalStatus => Some(&mut self.local),
            TimerKind::RemoteStatus => Some(&mut self.remote),
            TimerKind::Toasts => None,
        }
    }

    fn arm(&mut self, kind: TimerKind, now: Instant) -> Option<Schedule> {
        let cadence = self.cadence(kind)?;
        let generation = cadence.timer.arm(now + cadence.every);
        Some(Schedule {
            kind,
            after: cadence.every,
            generation,
        })
    }

    /// A timer fired. Returns true when the caller should dispatch the fetch.
    pub fn on_timer(&mut self, kind: TimerKind, generation: u64) -> bool {
        let Some(cadence) = self.cadence(kind) else {
            return false;
        };
        if !cadence.timer.fire(generation) || cadence.in_flight {
            return false;
        }
        cadence.in_flight = true;
        true
    }

    /// Skip the wait and fetch now. Returns false if a fetch is already running.
    pub fn refresh_now(&mut self, kind: TimerKind) -> bool {
        let Some(cadence) = self.cadence(kind) else {
            return false;
        };
        if cadence.in_flight {
            return false;
        }
        cadence.timer.disarm();
        cadence.in_flight = true;
        true
    }

    /// A fetch finished (successfully or not). Re-arms the cadence.
    pub fn on_complete(&mut self, kind: TimerKind, now: Instant) -> Option<Schedule> {
        let cadence = self.cadence(kind)?;
        if !cadence.in_flight {
            return None;
        }
        cadence.in_flight = false;
        self.arm(kind, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_generation_is_ignored() {
        let now = Instant::now();
        let mut slot = TimerSlot::default();
        let first = slot.arm(now + Duration::from_secs(1));
        let second = slot.arm(now + Duration::from_secs(2));
        assert!(!slot.fire(first));
        assert!(slot.fire(second));
        // One-shot: the same generation cannot fire twice
        assert!(!slot.fire(second));
    }

    #[test]
    fn test_disarm_invalidates_pending() {
        let mut slot = TimerSlot::default();
        let generation = slot.arm(Instant::now());
        slot.disarm();
        assert!(slot.deadline().is_none());
        assert!(!slot.fire(generation));
    }

    /// First fetch dispatched immediately, then re-armed on completion
    fn armed(scheduler: &mut RefreshScheduler, kind: TimerKind, now: Instant) -> Schedule {
        assert!(scheduler.refresh_now(kind));
        scheduler.on_complete(kind, now).expect("armed after first fetch")
    }

    #[test]
    fn test_each_cadence_uses_its_own_period() {
        let now = Instant::now();
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(2), Duration::from_secs(30));
        let local = armed(&mut scheduler, TimerKind::LocalStatus, now);
        let remote = armed(&mut scheduler, TimerKind::RemoteStatus, now);
        assert_eq!(local.kind, TimerKind::LocalStatus);
        assert_eq!(local.after, Duration::from_secs(2));
        assert_eq!(remote.kind, TimerKind::RemoteStatus);
        assert_eq!(remote.after, Duration::from_secs(30));
    }

    #[test]
    fn test_rearm_only_after_completion() {
        let now = Instant::now();
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(2), Duration::from_secs(30));
        let local = armed(&mut scheduler, TimerKind::LocalStatus, now);

        assert!(scheduler.on_timer(TimerKind::LocalStatus, local.generation));
        // Replayed fire while the fetch runs does nothing
        assert!(!scheduler.on_timer(TimerKind::LocalStatus, local.generation));
        assert!(!scheduler.refresh_now(TimerKind::LocalStatus));

        let next = scheduler
            .on_complete(TimerKind::LocalStatus, now)
            .expect("re-armed after completion");
        assert!(next.generation > local.generation);
        assert!(scheduler.on_complete(TimerKind::LocalStatus, now).is_none());
    }

    #[test]
    fn test_refresh_now_supersedes_pending_timer() {
        let now = Instant::now();
        let mut scheduler = RefreshScheduler::new(Duration::from_secs(2), Duration::from_secs(30));
        let remote = armed(&mut scheduler, TimerKind::RemoteStatus, now);
        assert!(scheduler.refresh_now(TimerKind::RemoteStatus));
        assert!(!scheduler.on_timer(TimerKind::RemoteStatus, remote.generation));
    }
}
