//! FIFO Tracker Module
//!
//! Tracks insertion order for first-in-first-out eviction.

use std::collections::BTreeMap;

// == FIFO Tracker ==
/// Orders keys by a monotonic insertion sequence.
///
/// Lowest sequence = oldest insertion. Lookups never reorder keys; only a
/// re-insertion does.
#[derive(Debug)]
pub struct FifoTracker<K> {
    /// Keys indexed by insertion sequence
    order: BTreeMap<u64, K>,
    /// Next sequence number to hand out
    next_seq: u64,
}

impl<K: Clone> FifoTracker<K> {
    // == Constructor ==
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self {
            order: BTreeMap::new(),
            next_seq: 0,
        }
    }

    // == Push ==
    /// Records `key` as the newest insertion and returns its sequence.
    pub fn push(&mut self, key: K) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, key);
        seq
    }

    // == Remove ==
    /// Forgets the insertion with sequence `seq`.
    pub fn remove(&mut self, seq: u64) -> Option<K> {
        self.order.remove(&seq)
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest insertion.
    ///
    /// Returns None if tracker is empty.
    pub fn pop_oldest(&mut self) -> Option<(u64, K)> {
        self.order.pop_first()
    }

    // == Peek Oldest ==
    /// Returns the oldest insertion without removing it.
    pub fn peek_oldest(&self) -> Option<(u64, &K)> {
        self.order.first_key_value().map(|(seq, key)| (*seq, key))
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.values()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

impl<K: Clone> Default for FifoTracker<K> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_new() {
        let fifo: FifoTracker<String> = FifoTracker::new();
        assert!(fifo.is_empty());
        assert_eq!(fifo.len(), 0);
    }

    #[test]
    fn test_fifo_push_orders_oldest_first() {
        let mut fifo = FifoTracker::new();

        fifo.push("key1");
        fifo.push("key2");
        fifo.push("key3");

        assert_eq!(fifo.len(), 3);
        assert_eq!(fifo.peek_oldest().map(|(_, k)| *k), Some("key1"));
        assert_eq!(fifo.iter().copied().collect::<Vec<_>>(), vec!["key1", "key2", "key3"]);
    }

    #[test]
    fn test_fifo_sequences_strictly_increase() {
        let mut fifo = FifoTracker::new();

        let a = fifo.push("a");
        let b = fifo.push("b");
        fifo.remove(b);
        let c = fifo.push("c");

        assert!(a < b && b < c);
    }

    #[test]
    fn test_fifo_reinsert_moves_to_back() {
        let mut fifo = FifoTracker::new();

        let seq1 = fifo.push("key1");
        fifo.push("key2");

        fifo.remove(seq1);
        fifo.push("key1");

        assert_eq!(fifo.peek_oldest().map(|(_, k)| *k), Some("key2"));
    }

    #[test]
    fn test_fifo_pop_oldest() {
        let mut fifo = FifoTracker::new();

        fifo.push("key1");
        fifo.push("key2");

        assert_eq!(fifo.pop_oldest().map(|(_, k)| k), Some("key1"));
        assert_eq!(fifo.pop_oldest().map(|(_, k)| k), Some("key2"));
        assert_eq!(fifo.pop_oldest(), None);
    }

    #[test]
    fn test_fifo_remove_unknown_sequence() {
        let mut fifo = FifoTracker::new();

        fifo.push("key1");

        assert_eq!(fifo.remove(42), None);
        assert_eq!(fifo.len(), 1);
    }
}
