//! The timebase: one-shot and recurring timers for the control task.
//!
//! A timer never runs code of its own. Each one is a small tokio task that
//! sleeps and then sends its `TimerId` to the control task, which *claims*
//! the id to learn what the timer was for. Cancelling removes the entry from
//! the slot map and aborts the task, so a fire that was already queued when
//! the timer was cancelled can no longer be claimed.

use crate::common::TimerId;
use slotmap::SlotMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

struct TimerEntry<W> {
    wake: W,
    recurring: bool,
    task: AbortHandle,
}

/// Schedules wake-ups of type `W` for a single consumer.
pub struct Timebase<W> {
    timers: SlotMap<TimerId, TimerEntry<W>>,
    fire_sender: mpsc::UnboundedSender<TimerId>,
}

impl<W: Copy + std::fmt::Debug> Timebase<W> {
    /// Creates a timebase whose fires are delivered on `fire_sender`.
    pub fn new(fire_sender: mpsc::UnboundedSender<TimerId>) -> Self {
        Self {
            timers: SlotMap::with_key(),
            fire_sender,
        }
    }

    /// Fires `wake` once, `delay` from now.
    pub fn after(&mut self, delay: Duration, wake: W) -> TimerId {
        let deadline = Instant::now() + delay;
        let sender = self.fire_sender.clone();
        let id = self.timers.insert_with_key(|id| {
            let task = tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                sender.send(id).ok();
            });
            TimerEntry {
                wake,
                recurring: false,
                task: task.abort_handle(),
            }
        });
        trace!(?id, ?wake, ?delay, "timer scheduled");
        id
    }

    /// Fires `wake` every `period`, first one `period` from now.
    pub fn every(&mut self, period: Duration, wake: W) -> TimerId {
        let start = Instant::now() + period;
        let sender = self.fire_sender.clone();
        let id = self.timers.insert_with_key(|id| {
            let task = tokio::spawn(async move {
                let mut ticker = tokio::time::interval_at(start, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if sender.send(id).is_err() {
                        break;
                    }
                }
            });
            TimerEntry {
                wake,
                recurring: true,
                task: task.abort_handle(),
            }
        });
        trace!(?id, ?wake, ?period, "recurring timer scheduled");
        id
    }

    /// Cancels a timer. Unknown or already-finished ids are a no-op.
    ///
    /// Returns `true` if a live timer was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.timers.remove(id) {
            Some(entry) => {
                entry.task.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every outstanding timer.
    pub fn cancel_all(&mut self) {
        for (_, entry) in self.timers.drain() {
            entry.task.abort();
        }
    }

    /// Resolves a fired id to its wake payload.
    ///
    /// One-shot timers are consumed by the claim. Returns `None` for ids that
    /// were cancelled after the fire was queued.
    pub fn claim(&mut self, id: TimerId) -> Option<W> {
        let entry = self.timers.get(id)?;
        if entry.recurring {
            return Some(entry.wake);
        }
        self.timers.remove(id).map(|entry| entry.wake)
    }

    /// Number of live timers.
    pub fn pending(&self) -> usize {
        self.timers.len()
    }
}

impl<W> Drop for Timebase<W> {
    fn drop(&mut self) {
        for (_, entry) in self.timers.drain() {
            entry.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Wake {
        A,
        B,
    }

    #[tokio::test(start_paused = true)]
    async fn one_shot_fires_once_and_is_consumed() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tb = Timebase::new(tx);
        let started = Instant::now();
        let id = tb.after(Duration::from_millis(250), Wake::A);

        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, id);
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert_eq!(tb.claim(fired), Some(Wake::A));
        assert_eq!(tb.claim(fired), None);
        assert_eq!(tb.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn recurring_timer_keeps_firing_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tb = Timebase::new(tx);
        let id = tb.every(Duration::from_millis(100), Wake::B);

        for _ in 0..3 {
            let fired = rx.recv().await.unwrap();
            assert_eq!(tb.claim(fired), Some(Wake::B));
        }
        assert!(tb.cancel(id));
        assert_eq!(tb.claim(id), None);
        assert!(!tb.cancel(id));
    }

    #[tokio::test(start_paused = true)]
    async fn queued_fire_is_stale_after_cancel() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tb = Timebase::new(tx);
        let id = tb.after(Duration::from_millis(10), Wake::A);
        tokio::time::sleep(Duration::from_millis(20)).await;

        tb.cancel_all();
        let fired = rx.recv().await.unwrap();
        assert_eq!(fired, id);
        assert_eq!(tb.claim(fired), None);
    }
}
