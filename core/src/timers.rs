//! Deferred execution expressed as scheduled payloads instead of callbacks.
//!
//! Components never block. They ask a [`Scheduler`] to deliver a payload later
//! and keep the returned [`TimerHandle`] so the request can be cancelled. The
//! owner of the [`TimerQueue`] advances it once per frame and dispatches each
//! due payload to the component that scheduled it.

use std::time::Duration;

use crate::ZombieId;

/// Shortest interval a repeating timer may use.
pub const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

/// Payloads delivered by the simulation's timer queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Timer {
    /// Spawn manager interval elapsed.
    SpawnTick,
    /// Build break between waves elapsed.
    WaveBreakElapsed,
    /// A zombie's decision cycle is due.
    ZombieDecision(ZombieId),
    /// A zombie's freeze wore off.
    FreezeExpired(ZombieId),
}

/// Cancellable reference to a scheduled payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Schedules payloads for later delivery.
pub trait Scheduler<T> {
    /// Current simulation time as seen by the scheduler.
    fn now(&self) -> Duration;

    /// Delivers `payload` once after `delay`.
    fn schedule_once(&mut self, delay: Duration, payload: T) -> TimerHandle;

    /// Delivers `payload` every `interval` until cancelled.
    fn schedule_repeating(&mut self, interval: Duration, payload: T) -> TimerHandle;

    /// Cancels a pending timer. Returns `false` if it was no longer scheduled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    /// Reports whether the timer will still fire.
    fn is_scheduled(&self, handle: TimerHandle) -> bool;
}

#[derive(Clone, Debug)]
struct TimerEntry<T> {
    handle: TimerHandle,
    due: Duration,
    interval: Option<Duration>,
    payload: T,
}

/// Deterministic single-threaded timer queue.
///
/// Payloads become due when the horizon set by [`TimerQueue::advance`] passes
/// their due time. They are handed out one at a time by
/// [`TimerQueue::pop_due`], earliest first and in scheduling order for equal
/// due times. `now()` follows the due time of the payload being dispatched, so
/// anything scheduled while dispatching is anchored at the correct instant.
#[derive(Clone, Debug)]
pub struct TimerQueue<T> {
    now: Duration,
    horizon: Duration,
    next_handle: u64,
    entries: Vec<TimerEntry<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
            horizon: Duration::ZERO,
            next_handle: 0,
            entries: Vec::new(),
        }
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Creates an empty queue at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the firing horizon forward by `dt`.
    pub fn advance(&mut self, dt: Duration) {
        self.horizon = self.horizon.saturating_add(dt);
    }

    /// Pops the earliest payload due at or before the horizon.
    ///
    /// Repeating timers are re-armed before their payload is returned. Once no
    /// payload is due, the clock catches up with the horizon.
    pub fn pop_due(&mut self) -> Option<T> {
        let index = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= self.horizon)
            .min_by_key(|(_, entry)| (entry.due, entry.handle))
            .map(|(index, _)| index);

        let Some(index) = index else {
            self.now = self.horizon;
            return None;
        };

        let due = self.entries[index].due;
        self.now = self.now.max(due);
        match self.entries[index].interval {
            Some(interval) => {
                let entry = &mut self.entries[index];
                entry.due = due.saturating_add(interval);
                Some(entry.payload.clone())
            }
            None => Some(self.entries.remove(index).payload),
        }
    }

    /// Number of timers still scheduled.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no timer is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, delay: Duration, interval: Option<Duration>, payload: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.entries.push(TimerEntry {
            handle,
            due: self.now.saturating_add(delay),
            interval,
            payload,
        });
        handle
    }
}

impl<T: Clone> Scheduler<T> for TimerQueue<T> {
    fn now(&self) -> Duration {
        self.now
    }

    fn schedule_once(&mut self, delay: Duration, payload: T) -> TimerHandle {
        self.insert(delay, None, payload)
    }

    fn schedule_repeating(&mut self, interval: Duration, payload: T) -> TimerHandle {
        let interval = interval.max(MIN_REPEAT_INTERVAL);
        self.insert(interval, Some(interval), payload)
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|entry| entry.handle == handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(queue: &mut TimerQueue<u32>) -> Vec<u32> {
        let mut fired = Vec::new();
        while let Some(payload) = queue.pop_due() {
            fired.push(payload);
        }
        fired
    }

    #[test]
    fn once_fires_after_delay_only() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_once(Duration::from_secs(2), 7);

        queue.advance(Duration::from_secs(1));
        assert!(drain(&mut queue).is_empty());
        assert!(queue.is_scheduled(handle));

        queue.advance(Duration::from_secs(1));
        assert_eq!(drain(&mut queue), vec![7]);
        assert!(!queue.is_scheduled(handle));
        assert_eq!(queue.now(), Duration::from_secs(2));
    }

    #[test]
    fn repeating_fires_once_per_elapsed_interval() {
        let mut queue = TimerQueue::new();
        let _ = queue.schedule_repeating(Duration::from_millis(500), 1);

        queue.advance(Duration::from_millis(1_600));
        assert_eq!(drain(&mut queue), vec![1, 1, 1]);
    }

    #[test]
    fn equal_due_times_fire_in_scheduling_order() {
        let mut queue = TimerQueue::new();
        let _ = queue.schedule_once(Duration::from_secs(1), 2);
        let _ = queue.schedule_once(Duration::from_secs(1), 1);
        let _ = queue.schedule_once(Duration::from_millis(500), 3);

        queue.advance(Duration::from_secs(1));
        assert_eq!(drain(&mut queue), vec![3, 2, 1]);
    }

    #[test]
    fn cancel_is_idempotent_and_prevents_firing() {
        let mut queue = TimerQueue::new();
        let handle = queue.schedule_repeating(Duration::from_secs(1), 4);

        assert!(queue.cancel(handle));
        assert!(!queue.cancel(handle));

        queue.advance(Duration::from_secs(5));
        assert!(drain(&mut queue).is_empty());
    }

    #[test]
    fn cancel_between_pops_suppresses_later_payloads() {
        let mut queue = TimerQueue::new();
        let _ = queue.schedule_once(Duration::from_secs(1), 1);
        let doomed = queue.schedule_once(Duration::from_secs(2), 2);

        queue.advance(Duration::from_secs(3));
        assert_eq!(queue.pop_due(), Some(1));
        assert!(queue.cancel(doomed));
        assert_eq!(queue.pop_due(), None);
    }

    #[test]
    fn scheduling_while_dispatching_anchors_at_due_time() {
        let mut queue = TimerQueue::new();
        let _ = queue.schedule_once(Duration::from_secs(1), 1);

        queue.advance(Duration::from_secs(3));
        assert_eq!(queue.pop_due(), Some(1));
        assert_eq!(queue.now(), Duration::from_secs(1));

        let _ = queue.schedule_once(Duration::from_secs(1), 2);
        assert_eq!(queue.pop_due(), Some(2));
        assert_eq!(queue.now(), Duration::from_secs(2));
        assert_eq!(queue.pop_due(), None);
        assert_eq!(queue.now(), Duration::from_secs(3));
    }

    #[test]
    fn zero_interval_is_clamped() {
        let mut queue = TimerQueue::new();
        let _ = queue.schedule_repeating(Duration::ZERO, 9);

        queue.advance(Duration::from_millis(3));
        assert_eq!(drain(&mut queue), vec![9, 9, 9]);
    }
}
