//! A small, bounded record of recent spelling results.
//!
//! Entries are keyed by capture time in wall-clock milliseconds, so two
//! results recorded within the same millisecond overwrite each other. Every
//! insert and every clear bumps a version counter; consumers compare it with
//! the version they last read to decide whether to look again.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use quill_protocol::payload::SpellingResult;
use tokio::sync::watch;

use crate::clock::Clock;

/// Number of entries kept before the least recently used one is evicted.
pub const TRACE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(capacity) => capacity,
    None => NonZeroUsize::MIN,
};

/// One recorded result.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry<T> {
    /// Capture time in wall-clock milliseconds.
    pub captured_at_ms: i64,
    /// The word the result belongs to.
    pub word: String,
    /// The recorded result.
    pub result: T,
}

/// Bounded LRU trace with a change counter.
pub struct DebugTrace<T = SpellingResult> {
    entries: Mutex<LruCache<i64, TraceEntry<T>>>,
    version: watch::Sender<u64>,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> DebugTrace<T> {
    /// Creates an empty trace holding [`TRACE_CAPACITY`] entries.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            entries: Mutex::new(LruCache::new(TRACE_CAPACITY)),
            version,
            clock,
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<i64, TraceEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn bump(&self) {
        self.version.send_modify(|version| *version += 1);
    }

    /// Records `result` for `word` under the current time.
    pub fn record(&self, word: impl Into<String>, result: T) {
        let captured_at_ms = self.clock.wall_millis();
        let entry = TraceEntry {
            captured_at_ms,
            word: word.into(),
            result,
        };
        self.entries().put(captured_at_ms, entry);
        self.bump();
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries().clear();
        self.bump();
    }

    /// Current version.
    #[must_use]
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Receiver that observes version changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Entries, most recently used first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TraceEntry<T>> {
        self.entries().iter().map(|(_, entry)| entry.clone()).collect()
    }

    /// Reads the entry captured at `captured_at_ms`, marking it as used.
    #[must_use]
    pub fn get(&self, captured_at_ms: i64) -> Option<TraceEntry<T>> {
        self.entries().get(&captured_at_ms).cloned()
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether the trace holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rstest::{fixture, rstest};

    use super::*;
    use crate::clock::ManualClock;

    struct Harness {
        clock: Arc<ManualClock>,
        trace: DebugTrace<u32>,
    }

    impl Harness {
        fn record_tick(&self, word: &str, result: u32) -> i64 {
            self.clock.advance(Duration::from_millis(1));
            self.trace.record(word, result);
            self.clock.wall_millis()
        }
    }

    #[fixture]
    fn harness() -> Harness {
        let clock = Arc::new(ManualClock::new(0));
        let trace = DebugTrace::new(Arc::clone(&clock) as Arc<dyn Clock>);
        Harness { clock, trace }
    }

    #[rstest]
    fn evicts_the_least_recently_used_entry(harness: Harness) {
        let keys: Vec<i64> = (0..10)
            .map(|index| harness.record_tick(&format!("w{index}"), index))
            .collect();
        // Touch the oldest so the second oldest becomes the eviction victim.
        let oldest = keys.first().copied().expect("ten keys");
        assert!(harness.trace.get(oldest).is_some());

        harness.record_tick("w10", 10);

        assert_eq!(harness.trace.len(), 10);
        assert!(harness.trace.get(oldest).is_some());
        let second = keys.get(1).copied().expect("ten keys");
        assert!(harness.trace.get(second).is_none());
        assert_eq!(harness.trace.version(), 11);

        harness.trace.clear();
        assert!(harness.trace.is_empty());
        assert_eq!(harness.trace.version(), 12);
    }

    #[rstest]
    fn same_millisecond_records_overwrite(harness: Harness) {
        harness.trace.record("teh", 1);
        harness.trace.record("the", 2);

        let entries = harness.trace.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries.first().map(|entry| entry.word.as_str()), Some("the"));
        assert_eq!(harness.trace.version(), 2);
    }

    #[rstest]
    fn snapshot_lists_most_recent_first(harness: Harness) {
        harness.record_tick("first", 1);
        harness.record_tick("second", 2);

        let words: Vec<String> = harness
            .trace
            .snapshot()
            .into_iter()
            .map(|entry| entry.word)
            .collect();
        assert_eq!(words, vec!["second", "first"]);
    }

    #[rstest]
    #[tokio::test]
    async fn subscribers_observe_version_changes(harness: Harness) {
        let mut versions = harness.trace.subscribe();
        harness.record_tick("word", 1);

        versions.changed().await.expect("trace alive");
        assert_eq!(*versions.borrow_and_update(), 1);
    }
}
