//! Keyed, cancellable deferred timers
//!
//! Replaces fire-and-forget timeouts with an explicit registry: each key owns at most one
//! pending timer, and a timer only fires if its handle is still the one registered under
//! its key. Timers are advanced by the simulation clock between update passes, so a
//! callback can never interleave with a tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque identity of one scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Pending<K> {
    handle: TimerHandle,
    key: K,
    due_ms: f64,
}

/// Timer registry driven by an external clock (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerQueue<K: Ord> {
    now_ms: f64,
    next_handle: u64,
    #[serde(with = "registry_pairs")]
    registry: BTreeMap<K, TimerHandle>,
    pending: Vec<Pending<K>>,
}

/// Registry keys are enums with payloads, which JSON maps cannot key on
mod registry_pairs {
    use super::*;

    pub fn serialize<K: Serialize, S: Serializer>(
        map: &BTreeMap<K, TimerHandle>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeMap<K, TimerHandle>, D::Error>
    where
        K: Deserialize<'de> + Ord,
        D: Deserializer<'de>,
    {
        let pairs: Vec<(K, TimerHandle)> = Vec::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

impl<K: Ord + Clone> Default for TimerQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> TimerQueue<K> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            next_handle: 1,
            registry: BTreeMap::new(),
            pending: Vec::new(),
        }
    }

    /// Current clock reading
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Schedule `key` to fire `delay_ms` from now, cancelling any timer already under `key`
    pub fn schedule(&mut self, key: K, delay_ms: f64) -> TimerHandle {
        self.cancel(&key);
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.registry.insert(key.clone(), handle);
        self.pending.push(Pending {
            handle,
            key,
            due_ms: self.now_ms + delay_ms.max(0.0),
        });
        handle
    }

    /// Remove and invalidate the timer under `key`
    pub fn cancel(&mut self, key: &K) -> Option<TimerHandle> {
        let handle = self.registry.remove(key)?;
        self.pending.retain(|p| p.handle != handle);
        Some(handle)
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.registry.clear();
        self.pending.clear();
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.registry.contains_key(key)
    }

    /// True if `handle` is still the live timer for `key`
    pub fn is_current(&self, key: &K, handle: TimerHandle) -> bool {
        self.registry.get(key) == Some(&handle)
    }

    pub fn handle(&self, key: &K) -> Option<TimerHandle> {
        self.registry.get(key).copied()
    }

    /// Milliseconds until `key` fires
    pub fn remaining(&self, key: &K) -> Option<f64> {
        let handle = self.registry.get(key)?;
        self.pending
            .iter()
            .find(|p| p.handle == *handle)
            .map(|p| (p.due_ms - self.now_ms).max(0.0))
    }

    /// Keys with a live timer, in key order
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.registry.keys()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Move the clock forward. Never moves backwards.
    pub fn advance_to(&mut self, now_ms: f64) {
        if now_ms > self.now_ms {
            self.now_ms = now_ms;
        }
    }

    /// Pop the earliest due timer (ties in scheduling order)
    ///
    /// Callers loop on this so a fired callback may schedule or cancel other timers
    /// before the next one is considered.
    pub fn pop_due(&mut self) -> Option<(K, TimerHandle)> {
        loop {
            let idx = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, p)| p.due_ms <= self.now_ms)
                .min_by(|(_, a), (_, b)| {
                    a.due_ms
                        .total_cmp(&b.due_ms)
                        .then(a.handle.cmp(&b.handle))
                })
                .map(|(i, _)| i)?;
            let fired = self.pending.remove(idx);
            // Superseded handles are dropped silently
            if self.is_current(&fired.key, fired.handle) {
                self.registry.remove(&fired.key);
                return Some((fired.key, fired.handle));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_delay() {
        let mut timers = TimerQueue::new();
        timers.schedule("revert", 100.0);
        timers.advance_to(99.0);
        assert!(timers.pop_due().is_none());
        timers.advance_to(100.0);
        assert_eq!(timers.pop_due().map(|(k, _)| k), Some("revert"));
        assert!(timers.pop_due().is_none());
        assert!(!timers.is_pending(&"revert"));
    }

    #[test]
    fn test_reschedule_cancels_previous() {
        let mut timers = TimerQueue::new();
        let first = timers.schedule("decay", 100.0);
        timers.advance_to(50.0);
        let second = timers.schedule("decay", 100.0);
        assert_ne!(first, second);
        assert!(!timers.is_current(&"decay", first));
        assert_eq!(timers.len(), 1);

        timers.advance_to(120.0);
        assert!(timers.pop_due().is_none());
        timers.advance_to(150.0);
        assert_eq!(timers.pop_due(), Some(("decay", second)));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut timers = TimerQueue::new();
        timers.schedule(1u8, 10.0);
        assert!(timers.cancel(&1).is_some());
        assert!(timers.cancel(&1).is_none());
        timers.advance_to(1000.0);
        assert!(timers.pop_due().is_none());
    }

    #[test]
    fn test_due_order_then_scheduling_order() {
        let mut timers = TimerQueue::new();
        timers.schedule('c', 30.0);
        timers.schedule('a', 10.0);
        timers.schedule('b', 10.0);
        timers.advance_to(100.0);
        let order: Vec<char> = std::iter::from_fn(|| timers.pop_due().map(|(k, _)| k)).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_serializes_with_payload_keys() {
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
        enum Key {
            Transition(u32),
        }
        let mut timers = TimerQueue::new();
        timers.schedule(Key::Transition(2), 1000.0);
        let json = serde_json::to_string(&timers).unwrap();
        let mut restored: TimerQueue<Key> = serde_json::from_str(&json).unwrap();
        restored.advance_to(1000.0);
        assert_eq!(restored.pop_due().map(|(k, _)| k), Some(Key::Transition(2)));
    }

    #[test]
    fn test_remaining_and_monotonic_clock() {
        let mut timers = TimerQueue::new();
        timers.advance_to(500.0);
        timers.schedule("t", 200.0);
        timers.advance_to(100.0);
        assert_eq!(timers.now(), 500.0);
        assert_eq!(timers.remaining(&"t"), Some(200.0));
    }
}
