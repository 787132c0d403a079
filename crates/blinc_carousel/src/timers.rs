//! Deadline timers driven by the host's frame clock
//!
//! Nothing here sleeps or spawns. The host passes the current [`Instant`]
//! into [`Timers::fire_due`] from its frame loop and receives the payloads
//! of every timer that came due.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use tracing::trace;

new_key_type! {
    /// Handle for a scheduled timer
    pub struct TimerId;
}

#[derive(Debug)]
struct Timer<T> {
    deadline: Instant,
    /// `Some` for repeating timers
    period: Option<Duration>,
    payload: T,
}

/// Timeouts, intervals and keyed debounces
#[derive(Debug)]
pub struct Timers<T> {
    timers: SlotMap<TimerId, Timer<T>>,
    debounced: FxHashMap<&'static str, TimerId>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            timers: SlotMap::with_key(),
            debounced: FxHashMap::default(),
        }
    }
}

impl<T: Clone> Timers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `payload` once after `delay`
    pub fn set_timeout(&mut self, now: Instant, delay: Duration, payload: T) -> TimerId {
        self.timers.insert(Timer {
            deadline: now + delay,
            period: None,
            payload,
        })
    }

    /// Fire `payload` every `period`, first after one period
    pub fn set_interval(&mut self, now: Instant, period: Duration, payload: T) -> TimerId {
        self.timers.insert(Timer {
            deadline: now + period,
            period: Some(period),
            payload,
        })
    }

    /// Fire `payload` once `wait` has passed without another call for `key`
    ///
    /// A pending debounce with the same key is superseded.
    pub fn debounce(&mut self, key: &'static str, now: Instant, wait: Duration, payload: T) -> TimerId {
        if let Some(previous) = self.debounced.remove(key) {
            if self.timers.remove(previous).is_some() {
                trace!(key, "debounce superseded");
            }
        }
        let id = self.set_timeout(now, wait, payload);
        self.debounced.insert(key, id);
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        self.debounced.retain(|_, pending| *pending != id);
        self.timers.remove(id).map(|timer| timer.payload)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    pub fn clear(&mut self) {
        self.timers.clear();
        self.debounced.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Collect payloads of every timer due at `now`, earliest first
    ///
    /// Intervals fire at most once per call; missed periods are skipped.
    pub fn fire_due(&mut self, now: Instant) -> Vec<T> {
        let mut due: Vec<(Instant, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.deadline <= now)
            .map(|(id, timer)| (timer.deadline, id))
            .collect();
        due.sort_by_key(|(deadline, _)| *deadline);

        let mut fired = Vec::with_capacity(due.len());
        for (_, id) in due {
            let Some(timer) = self.timers.get_mut(id) else {
                continue;
            };
            let period = timer.period;
            match period {
                Some(period) if !period.is_zero() => {
                    fired.push(timer.payload.clone());
                    while timer.deadline <= now {
                        timer.deadline += period;
                    }
                }
                _ => {
                    self.debounced.retain(|_, pending| *pending != id);
                    if let Some(timer) = self.timers.remove(id) {
                        fired.push(timer.payload);
                    }
                }
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_timeout_fires_once() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.set_timeout(t0, ms(100), "a");
        assert!(timers.fire_due(t0 + ms(99)).is_empty());
        assert_eq!(timers.fire_due(t0 + ms(100)), vec!["a"]);
        assert!(timers.fire_due(t0 + ms(500)).is_empty());
        assert!(timers.is_empty());
    }

    #[test]
    fn test_interval_repeats() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        let id = timers.set_interval(t0, ms(100), 1);
        assert_eq!(timers.fire_due(t0 + ms(100)), vec![1]);
        assert!(timers.fire_due(t0 + ms(150)).is_empty());
        assert_eq!(timers.fire_due(t0 + ms(200)), vec![1]);
        // A long stall fires once and skips the missed periods
        assert_eq!(timers.fire_due(t0 + ms(1000)), vec![1]);
        assert!(timers.is_pending(id));
        assert_eq!(timers.cancel(id), Some(1));
        assert!(!timers.is_pending(id));
    }

    #[test]
    fn test_debounce_supersedes() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.debounce("wheel", t0, ms(500), 1);
        timers.debounce("wheel", t0 + ms(300), ms(500), 2);
        assert_eq!(timers.len(), 1);
        assert!(timers.fire_due(t0 + ms(500)).is_empty());
        assert_eq!(timers.fire_due(t0 + ms(800)), vec![2]);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_debounce_keys_are_independent() {
        let t0 = Instant::now();
        let mut timers = Timers::new();
        timers.debounce("a", t0, ms(100), 'a');
        timers.debounce("b", t0, ms(50), 'b');
        assert_eq!(timers.fire_due(t0 + ms(100)), vec!['b', 'a']);
    }
}
