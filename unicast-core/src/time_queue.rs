use crate::OutboundMessage;
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
    time::Instant,
};

/// Min-heap of [`OutboundMessage`] keyed by release time.
///
/// Messages with the same release time come out in insertion order.
pub struct TimeQueue {
    map: BinaryHeap<Reverse<Entry>>,
    sequence: u64,
}

struct Entry {
    release_time: Instant,
    sequence: u64,
    msg: OutboundMessage,
}

impl TimeQueue {
    pub fn new() -> Self {
        Self {
            map: BinaryHeap::new(),
            sequence: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// release time of the soonest message, if any
    #[inline]
    pub fn time_to_next_msg(&self) -> Option<Instant> {
        self.map.peek().map(|Reverse(entry)| entry.release_time)
    }

    pub fn push(&mut self, msg: OutboundMessage) {
        let entry = Entry {
            release_time: msg.release_time(),
            sequence: self.sequence,
            msg,
        };
        self.sequence = self.sequence.wrapping_add(1);
        self.map.push(Reverse(entry))
    }

    /// Pop the soonest message if its release time is at or before `now`.
    pub fn pop_ready(&mut self, now: Instant) -> Option<OutboundMessage> {
        if self.time_to_next_msg()? > now {
            return None;
        }
        self.map.pop().map(|Reverse(entry)| entry.msg)
    }

    /// Pop every message whose release time is at or before `now`, soonest
    /// first.
    pub fn pop_all_elapsed(&mut self, now: Instant) -> impl Iterator<Item = OutboundMessage> + '_ {
        std::iter::from_fn(move || self.pop_ready(now))
    }

    /// Empty the queue regardless of release times.
    pub fn drain(&mut self) -> impl Iterator<Item = OutboundMessage> + '_ {
        self.map.drain().map(|Reverse(entry)| entry.msg)
    }
}

impl Default for TimeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release_time
            .cmp(&other.release_time)
            .then_with(|| self.sequence.cmp(&other.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Address, ProcessId, ProcessIdentity};
    use std::time::Duration;

    fn msg(enqueued_at: Instant, delay_ms: u64, payload: &str) -> OutboundMessage {
        OutboundMessage::with_enqueued_at(
            enqueued_at,
            ProcessId::new(1),
            ProcessIdentity::new(ProcessId::new(2), Address::new("localhost", 9002)),
            Duration::from_millis(delay_ms),
            payload.as_bytes(),
        )
    }

    #[test]
    fn empty() {
        let mut c = TimeQueue::new();

        assert!(c.is_empty());
        assert_eq!(c.len(), 0);
        assert!(c.time_to_next_msg().is_none());
        assert!(c.pop_ready(Instant::now()).is_none());
    }

    #[test]
    fn passed_entry() {
        let now = Instant::now();
        let mut c = TimeQueue::new();

        c.push(msg(now, 0, "a"));

        assert!(!c.is_empty());
        assert_eq!(c.len(), 1);
        assert!(c.pop_ready(now).is_some());
        assert!(c.is_empty());
    }

    #[test]
    fn future_entry() {
        let now = Instant::now();
        let mut c = TimeQueue::new();

        c.push(msg(now, 500, "a"));

        assert!(c.pop_ready(now).is_none());
        assert!(c.pop_ready(now + Duration::from_millis(499)).is_none());
        assert_eq!(c.len(), 1);
        assert!(c.pop_ready(now + Duration::from_millis(500)).is_some());
    }

    #[test]
    fn release_order() {
        let now = Instant::now();
        let mut c = TimeQueue::new();

        c.push(msg(now, 500, "slow"));
        c.push(msg(now, 50, "fast"));
        c.push(msg(now, 200, "medium"));

        assert_eq!(c.time_to_next_msg(), Some(now + Duration::from_millis(50)));

        let released: Vec<Box<[u8]>> = c
            .pop_all_elapsed(now + Duration::from_secs(1))
            .map(OutboundMessage::into_payload)
            .collect();
        assert_eq!(
            released,
            vec![
                Box::from(&b"fast"[..]),
                Box::from(&b"medium"[..]),
                Box::from(&b"slow"[..])
            ]
        );
    }

    #[test]
    fn same_release_time_keeps_insertion_order() {
        let now = Instant::now();
        let mut c = TimeQueue::new();

        for payload in ["1", "2", "3", "4"] {
            c.push(msg(now, 10, payload));
        }

        let released: Vec<Box<[u8]>> = c
            .pop_all_elapsed(now + Duration::from_millis(10))
            .map(OutboundMessage::into_payload)
            .collect();
        assert_eq!(released.concat(), b"1234");
    }

    #[test]
    fn pop_all_elapsed_stops_at_now() {
        let now = Instant::now();
        let mut c = TimeQueue::new();

        c.push(msg(now, 10, "a"));
        c.push(msg(now, 20, "b"));
        c.push(msg(now, 30, "c"));

        assert_eq!(c.pop_all_elapsed(now + Duration::from_millis(20)).count(), 2);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn drain() {
        let now = Instant::now();
        let mut c = TimeQueue::new();

        c.push(msg(now, 1_000, "a"));
        c.push(msg(now, 2_000, "b"));

        assert_eq!(c.drain().count(), 2);
        assert!(c.is_empty());
    }
}
