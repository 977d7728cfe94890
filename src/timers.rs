//! Virtual-time timers.
//!
//! The page script is driven entirely by `setTimeout`/`setInterval`. Here the
//! timer queue is explicit: each controller owns a [`Scheduler`] of its own
//! task type, and whoever owns the clock (the [`App`](crate::app::App))
//! advances it. Nothing sleeps, so the whole page can be stepped
//! deterministically in tests.
//!
//! Timers that share a due time fire in scheduling order.
//!
//! [`Throttle`] and [`Debounce`] are the two rate gates the page uses for
//! scroll and resize events.

use std::collections::BTreeMap;

/// Milliseconds since page start.
pub type Millis = u64;

/// Handle returned by [`Scheduler::schedule`]; pass it to
/// [`Scheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due: Millis,
    seq: u64,
}

impl TimerId {
    pub fn due(&self) -> Millis {
        self.due
    }
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: Millis,
    seq: u64,
    queue: BTreeMap<TimerId, T>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            now: 0,
            seq: 0,
            queue: BTreeMap::new(),
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// Move the clock. Time never runs backwards; earlier values are ignored.
    pub fn set_now(&mut self, now: Millis) {
        self.now = self.now.max(now);
    }

    /// Run `task` once, `delay` ms from now.
    pub fn schedule(&mut self, delay: Millis, task: T) -> TimerId {
        self.schedule_at(self.now.saturating_add(delay), task)
    }

    /// Run `task` once at an absolute time. Past times fire on the next pop.
    pub fn schedule_at(&mut self, due: Millis, task: T) -> TimerId {
        let id = TimerId { due, seq: self.seq };
        self.seq += 1;
        self.queue.insert(id, task);
        id
    }

    /// Drop a pending timer. Returns `false` if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.queue.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.contains_key(&id)
    }

    /// Due time of the earliest pending timer.
    pub fn next_due(&self) -> Option<Millis> {
        self.queue.keys().next().map(TimerId::due)
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self) -> Option<(TimerId, T)> {
        let first = *self.queue.keys().next()?;
        if first.due > self.now {
            return None;
        }
        self.queue.remove(&first).map(|task| (first, task))
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Lets at most one call through per window; calls inside the window are
/// dropped, not queued.
#[derive(Debug, Clone)]
pub struct Throttle {
    window: Millis,
    open_at: Option<Millis>,
}

impl Throttle {
    pub fn new(window: Millis) -> Self {
        Self {
            window,
            open_at: None,
        }
    }

    /// `true` if the caller may run now. Starts a new window when it does.
    pub fn try_pass(&mut self, now: Millis) -> bool {
        match self.open_at {
            Some(open_at) if now < open_at => false,
            _ => {
                self.open_at = Some(now.saturating_add(self.window));
                true
            }
        }
    }
}

/// Coalesces bursts: only the last trigger within the quiet period fires.
///
/// The caller owns the timer queue; `Debounce` only remembers which pending
/// timer is the live one.
#[derive(Debug, Clone)]
pub struct Debounce {
    delay: Millis,
    pending: Option<TimerId>,
}

impl Debounce {
    pub fn new(delay: Millis) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Cancel the pending run (if any) and schedule `task` after the quiet
    /// period.
    pub fn trigger<T>(&mut self, scheduler: &mut Scheduler<T>, task: T) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
        self.pending = Some(scheduler.schedule(self.delay, task));
    }

    /// Mark the timer `id` as fired. Returns `true` if it was the live one.
    pub fn fire(&mut self, id: TimerId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_in_due_order_then_fifo() {
        let mut s = Scheduler::new();
        s.schedule(300, "c");
        s.schedule(100, "a");
        s.schedule(100, "b");
        s.set_now(1000);
        let fired: Vec<_> = std::iter::from_fn(|| s.pop_due().map(|(_, t)| t)).collect();
        assert_eq!(fired, vec!["a", "b", "c"]);
    }

    #[test]
    fn nothing_fires_early() {
        let mut s = Scheduler::new();
        s.schedule(50, ());
        s.set_now(49);
        assert!(s.pop_due().is_none());
        assert_eq!(s.next_due(), Some(50));
        s.set_now(50);
        assert!(s.pop_due().is_some());
    }

    #[test]
    fn cancel_removes_timer() {
        let mut s = Scheduler::new();
        let id = s.schedule(10, 1);
        assert!(s.is_pending(id));
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        s.set_now(100);
        assert!(s.pop_due().is_none());
    }

    #[test]
    fn clock_is_monotonic() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.set_now(500);
        s.set_now(100);
        assert_eq!(s.now(), 500);
    }

    #[test]
    fn throttle_drops_calls_inside_window() {
        let mut t = Throttle::new(16);
        assert!(t.try_pass(0));
        assert!(!t.try_pass(5));
        assert!(!t.try_pass(15));
        assert!(t.try_pass(16));
        assert!(!t.try_pass(20));
        assert!(t.try_pass(100));
    }

    #[test]
    fn debounce_keeps_only_last_trigger() {
        let mut s = Scheduler::new();
        let mut d = Debounce::new(250);
        d.trigger(&mut s, 1);
        s.set_now(100);
        d.trigger(&mut s, 2);
        s.set_now(300);
        assert!(s.pop_due().is_none());
        s.set_now(350);
        let (id, task) = s.pop_due().unwrap();
        assert_eq!(task, 2);
        assert!(d.fire(id));
        assert_eq!(s.pending(), 0);
    }
}
